//! EIP-712 Domain Separator
//!
//! The domain binds a signature to one application, version, chain and
//! verifying contract. Only the four-field domain layout is supported:
//!
//! `EIP712Domain(string name,string version,uint256 chainId,address verifyingContract)`

use ethers_core::types::U256;
use serde::{Deserialize, Serialize};

use super::types::{Address, Digest, Eip712Error, FieldType, TypedField};
use crate::utils::crypto::{keccak256, keccak256_concat, strip_hex_prefix};

/// Canonical type string of the domain struct
pub const EIP712_DOMAIN_TYPE: &str =
    "EIP712Domain(string name,string version,uint256 chainId,address verifyingContract)";

/// Name under which typed-data documents declare the domain struct
pub const EIP712_DOMAIN_NAME: &str = "EIP712Domain";

/// The EIP-712 signing domain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "RawDomain")]
pub struct Domain {
    /// The human-readable name of the signing domain
    pub name: String,
    /// The current major version of the signing domain
    pub version: String,
    /// The EIP-155 chain ID
    #[serde(serialize_with = "serialize_chain_id")]
    pub chain_id: U256,
    /// The address of the contract that will verify the signature
    pub verifying_contract: Address,
}

impl Domain {
    pub fn new(
        name: impl Into<String>,
        version: impl Into<String>,
        chain_id: impl Into<U256>,
        verifying_contract: Address,
    ) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            chain_id: chain_id.into(),
            verifying_contract,
        }
    }

    /// Build a domain from textual inputs.
    ///
    /// `chain_id` may be decimal or `0x`-prefixed hex.
    pub fn parse(
        name: impl Into<String>,
        version: impl Into<String>,
        chain_id: &str,
        verifying_contract: &str,
    ) -> Result<Self, Eip712Error> {
        let chain_id = parse_chain_id(chain_id)?;
        let verifying_contract = verifying_contract
            .parse::<Address>()
            .map_err(|e| Eip712Error::MalformedDomain(format!("verifyingContract: {}", e)))?;
        Ok(Self::new(name, version, chain_id, verifying_contract))
    }

    /// The domain separator hash
    pub fn separator(&self) -> Digest {
        domain_separator(self)
    }

    /// Field list of the domain struct, as a typed-data document declares it
    pub fn fields() -> Vec<TypedField> {
        vec![
            TypedField::new("name", FieldType::String),
            TypedField::new("version", FieldType::String),
            TypedField::new("chainId", FieldType::Uint(256)),
            TypedField::new("verifyingContract", FieldType::Address),
        ]
    }
}

/// Calculate the domain separator hash
///
/// domainSeparator = keccak256(typeHash || keccak256(name) || keccak256(version)
///                             || chainId || verifyingContract)
pub fn domain_separator(domain: &Domain) -> Digest {
    let type_hash = keccak256(EIP712_DOMAIN_TYPE.as_bytes());
    let name_hash = keccak256(domain.name.as_bytes());
    let version_hash = keccak256(domain.version.as_bytes());

    let mut chain_id = [0u8; 32];
    domain.chain_id.to_big_endian(&mut chain_id);

    keccak256_concat(&[
        &type_hash[..],
        &name_hash[..],
        &version_hash[..],
        &chain_id[..],
        &domain.verifying_contract.to_word()[..],
    ])
}

/// Check that a declared `EIP712Domain` type matches the supported layout
pub fn check_domain_fields(fields: &[TypedField]) -> Result<(), Eip712Error> {
    if fields != Domain::fields().as_slice() {
        let declared: Vec<String> = fields
            .iter()
            .map(|f| format!("{} {}", f.field_type, f.name))
            .collect();
        return Err(Eip712Error::MalformedDomain(format!(
            "unsupported domain layout ({}), expected {}",
            declared.join(","),
            EIP712_DOMAIN_TYPE
        )));
    }
    Ok(())
}

fn parse_chain_id(s: &str) -> Result<U256, Eip712Error> {
    let malformed = |detail: String| Eip712Error::MalformedDomain(format!("chainId: {}", detail));

    let trimmed = s.trim();
    if trimmed.is_empty() {
        return Err(malformed("empty".to_string()));
    }
    if trimmed.starts_with("0x") || trimmed.starts_with("0X") {
        let digits = strip_hex_prefix(trimmed);
        if digits.is_empty() || digits.len() > 64 {
            return Err(malformed(format!("invalid hex {}", trimmed)));
        }
        U256::from_str_radix(digits, 16).map_err(|e| malformed(format!("{:?}", e)))
    } else {
        U256::from_dec_str(trimmed).map_err(|e| malformed(format!("{:?}", e)))
    }
}

fn serialize_chain_id<S: serde::Serializer>(chain_id: &U256, serializer: S) -> Result<S::Ok, S::Error> {
    if *chain_id <= U256::from(u64::MAX) {
        serializer.serialize_u64(chain_id.as_u64())
    } else {
        serializer.collect_str(chain_id)
    }
}

/// Wire form of a domain before validation
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawDomain {
    name: String,
    version: String,
    chain_id: serde_json::Value,
    verifying_contract: String,
}

impl TryFrom<RawDomain> for Domain {
    type Error = Eip712Error;

    fn try_from(raw: RawDomain) -> Result<Self, Self::Error> {
        let chain_id = match &raw.chain_id {
            serde_json::Value::Number(n) => n
                .as_u64()
                .map(U256::from)
                .ok_or_else(|| Eip712Error::MalformedDomain(format!("chainId: {}", n)))?,
            serde_json::Value::String(s) => parse_chain_id(s)?,
            other => {
                return Err(Eip712Error::MalformedDomain(format!("chainId: {}", other)));
            }
        };
        let verifying_contract = raw
            .verifying_contract
            .parse::<Address>()
            .map_err(|e| Eip712Error::MalformedDomain(format!("verifyingContract: {}", e)))?;
        Ok(Domain::new(raw.name, raw.version, chain_id, verifying_contract))
    }
}
