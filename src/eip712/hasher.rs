//! EIP-712 Hashing
//!
//! Combines the domain separator and the struct hash into the digest that
//! actually gets signed.

use serde::{Deserialize, Serialize};

use super::domain::{domain_separator, Domain};
use super::encoder::TypeRegistry;
use super::types::*;
use crate::utils::crypto::keccak256_concat;

/// Magic prefix for EIP-712 encoding
pub const EIP712_PREFIX: [u8; 2] = [0x19, 0x01];

/// EIP-191 prefix applied by `eth_sign`/`personal_sign` to a 32-byte payload
pub const ETH_SIGNED_DIGEST_PREFIX: &[u8] = b"\x19Ethereum Signed Message:\n32";

/// hash = keccak256("\x19\x01" || domainSeparator || hashStruct(message))
pub fn signing_digest(domain_hash: &Digest, struct_hash: &Digest) -> Digest {
    keccak256_concat(&[&EIP712_PREFIX[..], &domain_hash[..], &struct_hash[..]])
}

/// keccak256("\x19Ethereum Signed Message:\n32" || digest)
///
/// This is what wallets sign when a raw digest goes through `eth_sign`.
pub fn eth_signed_message_hash(digest: &Digest) -> Digest {
    keccak256_concat(&[ETH_SIGNED_DIGEST_PREFIX, &digest[..]])
}

/// Pre-image components (for external signing)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Eip712PreImage {
    #[serde(with = "hex_digest")]
    pub domain_separator: Digest,
    #[serde(with = "hex_digest")]
    pub struct_hash: Digest,
    #[serde(with = "hex_digest")]
    pub digest: Digest,
}

/// Calculate the pre-image components for a message of `primary_type`
pub fn typed_data_pre_image(
    domain: &Domain,
    types: &TypeRegistry,
    primary_type: &str,
    message: &Message,
) -> Result<Eip712PreImage, Eip712Error> {
    let struct_hash = types.hash_struct(primary_type, message)?;
    let domain_separator = domain_separator(domain);

    Ok(Eip712PreImage {
        domain_separator,
        struct_hash,
        digest: signing_digest(&domain_separator, &struct_hash),
    })
}

/// Calculate the final EIP-712 hash for signing
pub fn hash_typed_data(
    domain: &Domain,
    types: &TypeRegistry,
    primary_type: &str,
    message: &Message,
) -> Result<Digest, Eip712Error> {
    typed_data_pre_image(domain, types, primary_type, message).map(|p| p.digest)
}

pub(crate) mod hex_digest {
    use crate::utils::crypto::{decode_hex32, to_hex_prefixed};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(digest: &[u8; 32], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&to_hex_prefixed(digest))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<[u8; 32], D::Error> {
        let s = String::deserialize(deserializer)?;
        decode_hex32(&s).map_err(serde::de::Error::custom)
    }
}
