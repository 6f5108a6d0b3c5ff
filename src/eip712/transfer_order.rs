//! TransferOrder
//!
//! The transfer authorization signed by the EIP-712 demo contract:
//!
//! `TransferOrder(address to,uint256 amount,bytes data,uint256 timestamp)`

use ethers_core::types::U256;
use serde::{Deserialize, Serialize};

use super::domain::Domain;
use super::encoder::TypeRegistry;
use super::hasher::signing_digest;
use super::types::*;
use super::verifier::Verifier;

/// Struct name of the order
pub const TRANSFER_ORDER_TYPE: &str = "TransferOrder";

/// An order to move `amount` to `to`, with opaque `data` attached
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferOrder {
    pub to: Address,
    pub amount: U256,
    #[serde(with = "hex_bytes")]
    pub data: Vec<u8>,
    /// Unix seconds
    pub timestamp: u64,
}

impl TransferOrder {
    pub fn new(to: Address, amount: impl Into<U256>, data: impl Into<Vec<u8>>, timestamp: u64) -> Self {
        Self {
            to,
            amount: amount.into(),
            data: data.into(),
            timestamp,
        }
    }

    pub fn definition() -> StructDefinition {
        StructDefinition::new(
            TRANSFER_ORDER_TYPE,
            vec![
                TypedField::new("to", FieldType::Address),
                TypedField::new("amount", FieldType::Uint(256)),
                TypedField::new("data", FieldType::Bytes),
                TypedField::new("timestamp", FieldType::Uint(256)),
            ],
        )
    }

    pub fn registry() -> TypeRegistry {
        TypeRegistry::new().with(Self::definition())
    }

    /// A verifier for orders under `domain`
    pub fn verifier(domain: Domain) -> Verifier {
        Verifier::new(domain, Self::registry())
    }

    pub fn to_message(&self) -> Message {
        Message::new()
            .with("to", self.to)
            .with("amount", self.amount)
            .with("data", Value::bytes(self.data.clone()))
            .with("timestamp", self.timestamp)
    }

    pub fn struct_hash(&self) -> Result<Digest, Eip712Error> {
        Self::registry().hash_struct(TRANSFER_ORDER_TYPE, &self.to_message())
    }

    /// The digest a wallet signs for this order
    pub fn transfer_hash(&self, domain: &Domain) -> Result<Digest, Eip712Error> {
        Ok(signing_digest(&domain.separator(), &self.struct_hash()?))
    }
}

mod hex_bytes {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format!("0x{}", hex::encode(bytes)))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(deserializer)?;
        crate::utils::crypto::decode_hex(&s).map_err(serde::de::Error::custom)
    }
}
