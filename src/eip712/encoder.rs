//! EIP-712 Type Encoding
//!
//! Implements `encodeType`, `typeHash`, `encodeData` and `hashStruct` over a
//! registry of declarative struct definitions.

use ethers_core::types::U256;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use super::types::*;
use crate::utils::crypto::keccak256;

/// The set of struct definitions a message type may reference
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeRegistry {
    structs: BTreeMap<String, StructDefinition>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    pub fn with(mut self, definition: StructDefinition) -> Self {
        self.insert(definition);
        self
    }

    /// Add a definition, replacing any previous one of the same name
    pub fn insert(&mut self, definition: StructDefinition) -> Option<StructDefinition> {
        self.structs.insert(definition.type_name.clone(), definition)
    }

    pub fn get(&self, type_name: &str) -> Option<&StructDefinition> {
        self.structs.get(type_name)
    }

    pub fn contains(&self, type_name: &str) -> bool {
        self.structs.contains_key(type_name)
    }

    pub fn definitions(&self) -> impl Iterator<Item = &StructDefinition> {
        self.structs.values()
    }

    fn lookup(&self, type_name: &str) -> Result<&StructDefinition, Eip712Error> {
        self.get(type_name)
            .ok_or_else(|| Eip712Error::UnsupportedType(type_name.to_string()))
    }

    /// Check that every struct reference resolves and every width is legal
    pub fn validate(&self) -> Result<(), Eip712Error> {
        for definition in self.structs.values() {
            check_widths(definition)?;
            for field in &definition.fields {
                if let Some(referenced) = field.field_type.struct_name() {
                    self.lookup(referenced)?;
                }
            }
        }
        Ok(())
    }

    /// All structs reachable from `type_name`, excluding itself
    pub fn dependencies(&self, type_name: &str) -> Result<BTreeSet<String>, Eip712Error> {
        let mut found = BTreeSet::new();
        let mut to_visit = vec![type_name.to_string()];

        while let Some(current) = to_visit.pop() {
            let definition = self.lookup(&current)?;
            for field in &definition.fields {
                if let Some(referenced) = field.field_type.struct_name() {
                    if referenced != type_name && found.insert(referenced.to_string()) {
                        to_visit.push(referenced.to_string());
                    }
                }
            }
        }

        Ok(found)
    }

    /// Encode a type string for a struct type.
    ///
    /// Format: `Primary(type1 name1,...)` followed by every referenced struct
    /// sorted by name.
    pub fn encode_type(&self, type_name: &str) -> Result<String, Eip712Error> {
        let primary = self.lookup(type_name)?;
        check_widths(primary)?;
        let mut result = primary.to_string();
        for dependency in self.dependencies(type_name)? {
            let definition = self.lookup(&dependency)?;
            check_widths(definition)?;
            result.push_str(&definition.to_string());
        }
        Ok(result)
    }

    /// typeHash = keccak256(encodeType(typeOf(s)))
    pub fn type_hash(&self, type_name: &str) -> Result<Digest, Eip712Error> {
        Ok(keccak256(self.encode_type(type_name)?.as_bytes()))
    }

    /// typeHash || enc(field1) || enc(field2) || ...
    pub fn encode_data(&self, type_name: &str, message: &Message) -> Result<Vec<u8>, Eip712Error> {
        self.encode_data_at(type_name, message, type_name)
    }

    /// hashStruct(s) = keccak256(typeHash || encodeData(s))
    pub fn hash_struct(&self, type_name: &str, message: &Message) -> Result<Digest, Eip712Error> {
        Ok(keccak256(&self.encode_data(type_name, message)?))
    }

    fn encode_data_at(
        &self,
        type_name: &str,
        message: &Message,
        path: &str,
    ) -> Result<Vec<u8>, Eip712Error> {
        // Resolves the whole type graph before touching any value
        let type_hash = self.type_hash(type_name)?;
        let definition = self.lookup(type_name)?;

        let mut encoded = Vec::with_capacity(32 * (definition.fields.len() + 1));
        encoded.extend_from_slice(&type_hash);

        for field in &definition.fields {
            let field_path = format!("{}.{}", path, field.name);
            let value = message
                .get(&field.name)
                .ok_or_else(|| Eip712Error::MissingField(field_path.clone()))?;
            encoded.extend_from_slice(&self.encode_field(&field.field_type, value, &field_path)?);
        }

        Ok(encoded)
    }

    /// Encode one value into its 32-byte slot
    fn encode_field(
        &self,
        field_type: &FieldType,
        value: &Value,
        path: &str,
    ) -> Result<[u8; 32], Eip712Error> {
        let mismatch = |found: &str| Eip712Error::TypeMismatch {
            field: path.to_string(),
            expected: field_type.to_string(),
            found: found.to_string(),
        };

        match (field_type, value) {
            (FieldType::Address, Value::Address(address)) => Ok(address.to_word()),

            (FieldType::Bool, Value::Bool(b)) => {
                let mut word = [0u8; 32];
                word[31] = u8::from(*b);
                Ok(word)
            }

            (FieldType::Uint(bits), Value::Uint(n)) => {
                if n.bits() > usize::from(*bits) {
                    return Err(mismatch(&format!("{} (out of range)", n)));
                }
                Ok(u256_word(n))
            }

            (FieldType::Int(bits), Value::Int { negative, magnitude }) => {
                let limit = U256::one() << (usize::from(*bits) - 1);
                let in_range = if *negative { *magnitude <= limit } else { *magnitude < limit };
                if !in_range {
                    let sign = if *negative { "-" } else { "" };
                    return Err(mismatch(&format!("{}{} (out of range)", sign, magnitude)));
                }
                let raw = if *negative {
                    // two's complement
                    (!*magnitude).overflowing_add(U256::one()).0
                } else {
                    *magnitude
                };
                Ok(u256_word(&raw))
            }

            (FieldType::FixedBytes(size), Value::FixedBytes(data) | Value::Bytes(data)) => {
                if data.len() != usize::from(*size) {
                    return Err(mismatch(&format!("{} bytes", data.len())));
                }
                let mut word = [0u8; 32];
                word[..data.len()].copy_from_slice(data);
                Ok(word)
            }

            // Dynamic types are hashed
            (FieldType::Bytes, Value::Bytes(data) | Value::FixedBytes(data)) => Ok(keccak256(data)),
            (FieldType::String, Value::String(s)) => Ok(keccak256(s.as_bytes())),

            // Struct references are encoded as their own struct hash
            (FieldType::Struct(name), Value::Struct(nested)) => {
                Ok(keccak256(&self.encode_data_at(name, nested, path)?))
            }

            (FieldType::Array { element, length }, Value::Array(items)) => {
                if let Some(expected) = length {
                    if items.len() != *expected {
                        return Err(mismatch(&format!("{} elements", items.len())));
                    }
                }
                let mut encoded = Vec::with_capacity(32 * items.len());
                for (i, item) in items.iter().enumerate() {
                    let item_path = format!("{}[{}]", path, i);
                    encoded.extend_from_slice(&self.encode_field(element, item, &item_path)?);
                }
                Ok(keccak256(&encoded))
            }

            (_, other) => Err(mismatch(other.kind())),
        }
    }
}

impl FromIterator<StructDefinition> for TypeRegistry {
    fn from_iter<I: IntoIterator<Item = StructDefinition>>(iter: I) -> Self {
        let mut registry = TypeRegistry::new();
        for definition in iter {
            registry.insert(definition);
        }
        registry
    }
}

/// Struct hash of a self-contained definition.
///
/// The definition may not reference other structs; use a [`TypeRegistry`]
/// for nested types.
pub fn struct_hash(definition: &StructDefinition, message: &Message) -> Result<Digest, Eip712Error> {
    TypeRegistry::new()
        .with(definition.clone())
        .hash_struct(&definition.type_name, message)
}

/// typeHash of a self-contained definition
pub fn type_hash(definition: &StructDefinition) -> Result<Digest, Eip712Error> {
    TypeRegistry::new()
        .with(definition.clone())
        .type_hash(&definition.type_name)
}

/// Hand-built field types can carry widths the parser would refuse
fn check_widths(definition: &StructDefinition) -> Result<(), Eip712Error> {
    match definition.fields.iter().find(|f| !f.field_type.is_valid()) {
        Some(field) => Err(Eip712Error::UnsupportedType(field.field_type.to_string())),
        None => Ok(()),
    }
}

fn u256_word(n: &U256) -> [u8; 32] {
    let mut word = [0u8; 32];
    n.to_big_endian(&mut word);
    word
}
