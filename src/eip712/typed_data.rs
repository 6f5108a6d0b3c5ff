//! Typed Data Documents
//!
//! Reads the JSON document wallets receive through `eth_signTypedData_v4`:
//!
//! ```json
//! {
//!   "types": { "EIP712Domain": [...], "Mail": [...] },
//!   "primaryType": "Mail",
//!   "domain": { "name": "...", "version": "1", "chainId": 1, "verifyingContract": "0x..." },
//!   "message": { ... }
//! }
//! ```
//!
//! Message values are converted to typed [`Value`]s by walking the declared
//! struct definitions, so conversion errors carry the field path.

use ethers_core::types::U256;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::domain::{check_domain_fields, Domain, EIP712_DOMAIN_NAME};
use super::encoder::TypeRegistry;
use super::hasher::{typed_data_pre_image, Eip712PreImage};
use super::types::*;
use super::verifier::Verifier;
use crate::utils::crypto::{decode_hex, strip_hex_prefix};

/// A member declaration as written in the document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JsonField {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
}

/// A complete `eth_signTypedData_v4` document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "RawTypedData")]
pub struct TypedData {
    /// Type definitions (struct name -> fields)
    pub types: BTreeMap<String, Vec<JsonField>>,

    /// The name of the primary type being signed
    pub primary_type: String,

    /// The EIP-712 domain
    pub domain: Domain,

    /// The message data, still in JSON form
    pub message: serde_json::Value,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawTypedData {
    types: BTreeMap<String, Vec<JsonField>>,
    primary_type: String,
    domain: serde_json::Value,
    message: serde_json::Value,
}

impl TryFrom<RawTypedData> for TypedData {
    type Error = Eip712Error;

    fn try_from(raw: RawTypedData) -> Result<Self, Self::Error> {
        let domain: Domain = serde_json::from_value(raw.domain)
            .map_err(|e| Eip712Error::MalformedDomain(e.to_string()))?;
        Ok(Self {
            types: raw.types,
            primary_type: raw.primary_type,
            domain,
            message: raw.message,
        })
    }
}

impl TypedData {
    /// Parse typed data from a JSON string
    pub fn from_json(json: &str) -> Result<Self, Eip712Error> {
        let raw: RawTypedData =
            serde_json::from_str(json).map_err(|e| Eip712Error::InvalidJson(e.to_string()))?;
        Self::try_from(raw)
    }

    /// Serialize to JSON string
    pub fn to_json(&self) -> Result<String, Eip712Error> {
        serde_json::to_string_pretty(self).map_err(|e| Eip712Error::InvalidJson(e.to_string()))
    }

    /// The declared struct definitions, `EIP712Domain` excluded.
    ///
    /// A declared `EIP712Domain` must have the standard four-field layout,
    /// and every struct reference must resolve.
    pub fn registry(&self) -> Result<TypeRegistry, Eip712Error> {
        let mut registry = TypeRegistry::new();

        for (type_name, fields) in &self.types {
            let parsed = fields
                .iter()
                .map(|f| TypedField::parse(f.name.clone(), &f.type_name))
                .collect::<Result<Vec<_>, _>>()?;

            if type_name == EIP712_DOMAIN_NAME {
                check_domain_fields(&parsed)?;
            } else {
                registry.insert(StructDefinition::new(type_name.clone(), parsed));
            }
        }

        registry.validate()?;
        if !registry.contains(&self.primary_type) {
            return Err(Eip712Error::UnsupportedType(self.primary_type.clone()));
        }
        Ok(registry)
    }

    /// The message converted to typed values
    pub fn message(&self) -> Result<Message, Eip712Error> {
        let registry = self.registry()?;
        json_to_message(&registry, &self.primary_type, &self.message, &self.primary_type)
    }

    /// Domain separator, struct hash and digest of the document
    pub fn pre_image(&self) -> Result<Eip712PreImage, Eip712Error> {
        let registry = self.registry()?;
        let message = json_to_message(&registry, &self.primary_type, &self.message, &self.primary_type)?;
        typed_data_pre_image(&self.domain, &registry, &self.primary_type, &message)
    }

    pub fn digest(&self) -> Result<Digest, Eip712Error> {
        self.pre_image().map(|p| p.digest)
    }

    /// A verifier for this document's domain and types
    pub fn verifier(&self) -> Result<Verifier, Eip712Error> {
        Ok(Verifier::new(self.domain.clone(), self.registry()?))
    }
}

/// Convert a JSON object into a message of `type_name`.
///
/// Members not declared on the struct are ignored.
pub fn json_to_message(
    registry: &TypeRegistry,
    type_name: &str,
    json: &serde_json::Value,
    path: &str,
) -> Result<Message, Eip712Error> {
    let definition = registry
        .get(type_name)
        .ok_or_else(|| Eip712Error::UnsupportedType(type_name.to_string()))?;

    let object = json.as_object().ok_or_else(|| Eip712Error::TypeMismatch {
        field: path.to_string(),
        expected: type_name.to_string(),
        found: json_kind(json).to_string(),
    })?;

    let mut message = Message::new();
    for field in &definition.fields {
        let field_path = format!("{}.{}", path, field.name);
        let raw = object
            .get(&field.name)
            .ok_or_else(|| Eip712Error::MissingField(field_path.clone()))?;
        message.insert(field.name.clone(), json_to_value(registry, &field.field_type, raw, &field_path)?);
    }
    Ok(message)
}

fn json_to_value(
    registry: &TypeRegistry,
    field_type: &FieldType,
    json: &serde_json::Value,
    path: &str,
) -> Result<Value, Eip712Error> {
    use serde_json::Value as Json;

    let mismatch = || Eip712Error::TypeMismatch {
        field: path.to_string(),
        expected: field_type.to_string(),
        found: json_kind(json).to_string(),
    };

    match (field_type, json) {
        (FieldType::Address, Json::String(s)) => s
            .parse()
            .map(Value::Address)
            .map_err(|e: Eip712Error| Eip712Error::TypeMismatch {
                field: path.to_string(),
                expected: field_type.to_string(),
                found: e.to_string(),
            }),
        (FieldType::Bool, Json::Bool(b)) => Ok(Value::Bool(*b)),

        (FieldType::Uint(_), _) => match parse_integer(json).ok_or_else(mismatch)? {
            (false, magnitude) => Ok(Value::Uint(magnitude)),
            (true, magnitude) if magnitude.is_zero() => Ok(Value::Uint(magnitude)),
            (true, _) => Err(Eip712Error::TypeMismatch {
                field: path.to_string(),
                expected: field_type.to_string(),
                found: "negative integer".to_string(),
            }),
        },

        (FieldType::Int(_), _) => {
            let (negative, magnitude) = parse_integer(json).ok_or_else(mismatch)?;
            Ok(Value::Int {
                negative: negative && !magnitude.is_zero(),
                magnitude,
            })
        }

        (FieldType::FixedBytes(_), Json::String(s)) => {
            Ok(Value::FixedBytes(decode_hex(s).map_err(|_| mismatch())?))
        }
        (FieldType::Bytes, Json::String(s)) => Ok(Value::Bytes(decode_hex(s).map_err(|_| mismatch())?)),
        (FieldType::String, Json::String(s)) => Ok(Value::String(s.clone())),

        (FieldType::Struct(name), Json::Object(_)) => {
            Ok(Value::Struct(json_to_message(registry, name, json, path)?))
        }

        (FieldType::Array { element, .. }, Json::Array(items)) => items
            .iter()
            .enumerate()
            .map(|(i, item)| json_to_value(registry, element, item, &format!("{}[{}]", path, i)))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),

        _ => Err(mismatch()),
    }
}

/// Sign and magnitude of a JSON integer: a number, a decimal string, or a
/// `0x` hex string, each optionally negative.
fn parse_integer(json: &serde_json::Value) -> Option<(bool, U256)> {
    match json {
        serde_json::Value::Number(n) => {
            if let Some(u) = n.as_u64() {
                Some((false, U256::from(u)))
            } else {
                n.as_i64().map(|i| (i < 0, U256::from(i.unsigned_abs())))
            }
        }
        serde_json::Value::String(s) => {
            let trimmed = s.trim();
            let (negative, digits) = match trimmed.strip_prefix('-') {
                Some(rest) => (true, rest),
                None => (false, trimmed),
            };
            if digits.is_empty() {
                return None;
            }
            let magnitude = if digits.starts_with("0x") || digits.starts_with("0X") {
                let hex_digits = strip_hex_prefix(digits);
                if hex_digits.is_empty() || hex_digits.len() > 64 {
                    return None;
                }
                U256::from_str_radix(hex_digits, 16).ok()?
            } else {
                if !digits.bytes().all(|b| b.is_ascii_digit()) {
                    return None;
                }
                U256::from_dec_str(digits).ok()?
            };
            Some((negative, magnitude))
        }
        _ => None,
    }
}

fn json_kind(json: &serde_json::Value) -> &'static str {
    match json {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "bool",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}
