//! EIP-712 Type Definitions
//!
//! Core data structures for EIP-712 typed data: addresses, field types,
//! struct definitions and the typed values a message is made of.

use ethers_core::types::U256;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use subtle::{Choice, ConstantTimeEq};

use crate::utils::crypto::to_checksum_address;

/// A 32-byte keccak256 output
pub type Digest = [u8; 32];

/// A 20-byte account or contract address
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Address(pub [u8; 20]);

impl Address {
    pub const ZERO: Address = Address([0u8; 20]);

    /// Build an address from exactly 20 bytes
    pub fn from_slice(bytes: &[u8]) -> Result<Self, Eip712Error> {
        let raw: [u8; 20] = bytes.try_into().map_err(|_| {
            Eip712Error::InvalidAddress(format!("expected 20 bytes, got {}", bytes.len()))
        })?;
        Ok(Self(raw))
    }

    /// The address left-padded to a 32-byte ABI word
    pub fn to_word(&self) -> [u8; 32] {
        let mut word = [0u8; 32];
        word[12..].copy_from_slice(&self.0);
        word
    }

    /// EIP-55 mixed-case representation
    pub fn to_checksum(&self) -> String {
        to_checksum_address(&self.0)
    }
}

impl ConstantTimeEq for Address {
    fn ct_eq(&self, other: &Self) -> Choice {
        self.0.ct_eq(&other.0)
    }
}

impl FromStr for Address {
    type Err = Eip712Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let hex_part = s
            .strip_prefix("0x")
            .or_else(|| s.strip_prefix("0X"))
            .unwrap_or(s);

        if hex_part.len() != 40 {
            return Err(Eip712Error::InvalidAddress(format!(
                "invalid length: expected 40 hex chars, got {}",
                hex_part.len()
            )));
        }

        let bytes = hex::decode(hex_part)
            .map_err(|e| Eip712Error::InvalidAddress(format!("invalid hex: {}", e)))?;
        Self::from_slice(&bytes)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_checksum())
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self.to_checksum())
    }
}

impl From<[u8; 20]> for Address {
    fn from(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// The type of a struct member, as written in an EIP-712 type string
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FieldType {
    Address,
    Bool,
    /// `uintN`, N in bits
    Uint(u16),
    /// `intN`, N in bits
    Int(u16),
    /// `bytesN`, N in bytes
    FixedBytes(u8),
    Bytes,
    String,
    /// Reference to another struct definition by name
    Struct(String),
    /// `T[]` when `length` is `None`, `T[k]` otherwise
    Array {
        element: Box<FieldType>,
        length: Option<usize>,
    },
}

impl FieldType {
    /// Name of the struct this type refers to, looking through arrays
    pub fn struct_name(&self) -> Option<&str> {
        match self {
            FieldType::Struct(name) => Some(name),
            FieldType::Array { element, .. } => element.struct_name(),
            _ => None,
        }
    }

    /// Whether every width is one EIP-712 allows
    pub fn is_valid(&self) -> bool {
        match self {
            FieldType::Uint(bits) | FieldType::Int(bits) => {
                *bits > 0 && *bits <= 256 && *bits % 8 == 0
            }
            FieldType::FixedBytes(size) => *size > 0 && *size <= 32,
            FieldType::Array { element, .. } => element.is_valid(),
            _ => true,
        }
    }

    pub fn array_of(element: FieldType) -> Self {
        FieldType::Array {
            element: Box::new(element),
            length: None,
        }
    }
}

impl FromStr for FieldType {
    type Err = Eip712Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let unsupported = || Eip712Error::UnsupportedType(s.to_string());

        if let Some(stripped) = s.strip_suffix(']') {
            let open = stripped.rfind('[').ok_or_else(unsupported)?;
            let element: FieldType = stripped[..open].parse()?;
            let length = match &stripped[open + 1..] {
                "" => None,
                digits => Some(digits.parse::<usize>().map_err(|_| unsupported())?),
            };
            return Ok(FieldType::Array {
                element: Box::new(element),
                length,
            });
        }

        match s {
            "address" => return Ok(FieldType::Address),
            "bool" => return Ok(FieldType::Bool),
            "string" => return Ok(FieldType::String),
            "bytes" => return Ok(FieldType::Bytes),
            _ => {}
        }

        for (prefix, signed) in [("uint", false), ("int", true)] {
            if let Some(bits) = s.strip_prefix(prefix) {
                if bits.is_empty() {
                    return Err(unsupported());
                }
                if bits.bytes().all(|b| b.is_ascii_digit()) {
                    if bits.starts_with('0') {
                        return Err(unsupported());
                    }
                    let n: u16 = bits.parse().map_err(|_| unsupported())?;
                    let parsed = if signed { FieldType::Int(n) } else { FieldType::Uint(n) };
                    if !parsed.is_valid() {
                        return Err(unsupported());
                    }
                    return Ok(parsed);
                }
            }
        }

        if let Some(size) = s.strip_prefix("bytes") {
            if size.bytes().all(|b| b.is_ascii_digit()) {
                if size.starts_with('0') {
                    return Err(unsupported());
                }
                let n: u8 = size.parse().map_err(|_| unsupported())?;
                if !FieldType::FixedBytes(n).is_valid() {
                    return Err(unsupported());
                }
                return Ok(FieldType::FixedBytes(n));
            }
        }

        if is_identifier(s) {
            Ok(FieldType::Struct(s.to_string()))
        } else {
            Err(unsupported())
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldType::Address => f.write_str("address"),
            FieldType::Bool => f.write_str("bool"),
            FieldType::Uint(bits) => write!(f, "uint{}", bits),
            FieldType::Int(bits) => write!(f, "int{}", bits),
            FieldType::FixedBytes(size) => write!(f, "bytes{}", size),
            FieldType::Bytes => f.write_str("bytes"),
            FieldType::String => f.write_str("string"),
            FieldType::Struct(name) => f.write_str(name),
            FieldType::Array { element, length: Some(n) } => write!(f, "{}[{}]", element, n),
            FieldType::Array { element, length: None } => write!(f, "{}[]", element),
        }
    }
}

impl Serialize for FieldType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for FieldType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' || c == '$' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}

/// A field in a struct type definition
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TypedField {
    /// The name of the field
    pub name: String,
    /// The type of the field (e.g., "address", "uint256", "bytes32")
    #[serde(rename = "type")]
    pub field_type: FieldType,
}

impl TypedField {
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
        }
    }

    /// Build a field from a type string such as `"uint256"`
    pub fn parse(name: impl Into<String>, type_name: &str) -> Result<Self, Eip712Error> {
        Ok(Self::new(name, type_name.parse()?))
    }
}

/// A named struct with its ordered members
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StructDefinition {
    pub type_name: String,
    pub fields: Vec<TypedField>,
}

impl StructDefinition {
    pub fn new(type_name: impl Into<String>, fields: Vec<TypedField>) -> Self {
        Self {
            type_name: type_name.into(),
            fields,
        }
    }

    /// Parse a single struct signature: `Name(type1 name1,type2 name2)`
    pub fn parse(signature: &str) -> Result<Self, Eip712Error> {
        let malformed = || Eip712Error::UnsupportedType(signature.to_string());

        let open = signature.find('(').ok_or_else(malformed)?;
        let body = signature[open + 1..].strip_suffix(')').ok_or_else(malformed)?;
        let type_name = &signature[..open];
        if !is_identifier(type_name) {
            return Err(malformed());
        }

        let mut fields = Vec::new();
        if !body.is_empty() {
            for member in body.split(',') {
                let (field_type, name) = member.rsplit_once(' ').ok_or_else(malformed)?;
                if !is_identifier(name) {
                    return Err(malformed());
                }
                fields.push(TypedField::parse(name, field_type)?);
            }
        }

        Ok(Self::new(type_name, fields))
    }

    pub fn field(&self, name: &str) -> Option<&TypedField> {
        self.fields.iter().find(|f| f.name == name)
    }
}

impl fmt::Display for StructDefinition {
    /// Formats as `Name(type1 name1,type2 name2,...)`
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.type_name)?;
        for (i, field) in self.fields.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{} {}", field.field_type, field.name)?;
        }
        f.write_str(")")
    }
}

/// A typed value held by a message field
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Address(Address),
    Bool(bool),
    Uint(U256),
    /// Signed integer as sign and magnitude
    Int { negative: bool, magnitude: U256 },
    FixedBytes(Vec<u8>),
    Bytes(Vec<u8>),
    String(String),
    Struct(Message),
    Array(Vec<Value>),
}

impl Value {
    pub fn bytes(data: impl Into<Vec<u8>>) -> Self {
        Value::Bytes(data.into())
    }

    pub fn fixed_bytes(data: impl Into<Vec<u8>>) -> Self {
        Value::FixedBytes(data.into())
    }

    pub fn int(n: i128) -> Self {
        Value::Int {
            negative: n < 0,
            magnitude: U256::from(n.unsigned_abs()),
        }
    }

    /// Short name of the value kind, used in error messages
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Address(_) => "address",
            Value::Bool(_) => "bool",
            Value::Uint(_) => "unsigned integer",
            Value::Int { .. } => "signed integer",
            Value::FixedBytes(_) => "fixed bytes",
            Value::Bytes(_) => "bytes",
            Value::String(_) => "string",
            Value::Struct(_) => "struct",
            Value::Array(_) => "array",
        }
    }
}

impl From<Address> for Value {
    fn from(a: Address) -> Self {
        Value::Address(a)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<u64> for Value {
    fn from(n: u64) -> Self {
        Value::Uint(U256::from(n))
    }
}

impl From<U256> for Value {
    fn from(n: U256) -> Self {
        Value::Uint(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<Message> for Value {
    fn from(m: Message) -> Self {
        Value::Struct(m)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::Array(items)
    }
}

/// Field values of one struct instance, keyed by field name.
///
/// Encoding walks the struct definition, so the order in which values were
/// inserted here never affects a hash.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Message {
    values: BTreeMap<String, Value>,
}

impl Message {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.values.insert(name.into(), value.into())
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.values.remove(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.values.iter()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Message {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut message = Message::new();
        for (name, value) in iter {
            message.insert(name, value);
        }
        message
    }
}

/// Errors that can occur during EIP-712 operations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Eip712Error {
    #[error("Invalid JSON: {0}")]
    InvalidJson(String),

    #[error("Missing field: {0}")]
    MissingField(String),

    #[error("Type mismatch for {field}: expected {expected}, got {found}")]
    TypeMismatch {
        field: String,
        expected: String,
        found: String,
    },

    #[error("Unsupported type: {0}")]
    UnsupportedType(String),

    #[error("Invalid signature: {0}")]
    InvalidSignature(String),

    #[error("Malformed domain: {0}")]
    MalformedDomain(String),

    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Signing error: {0}")]
    SigningError(String),
}
