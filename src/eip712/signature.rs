//! ECDSA Signature Components
//!
//! `(r, s, v)` signatures as produced by Ethereum wallets, plus the secp256k1
//! order constants needed to reason about malleability.

use ethers_core::types::U256;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use super::types::Eip712Error;
use crate::utils::crypto::decode_hex;

/// secp256k1 group order n
pub const SECP256K1_ORDER: [u8; 32] = [
    0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xfe,
    0xba, 0xae, 0xdc, 0xe6, 0xaf, 0x48, 0xa0, 0x3b, 0xbf, 0xd2, 0x5e, 0x8c, 0xd0, 0x36, 0x41, 0x41,
];

/// floor(n / 2); the largest `s` a low-s signature may carry
pub const SECP256K1_HALF_ORDER: [u8; 32] = [
    0x7f, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff,
    0x5d, 0x57, 0x6e, 0x73, 0x57, 0xa4, 0x50, 0x1d, 0xdf, 0xe9, 0x2f, 0x46, 0x68, 0x1b, 0x20, 0xa0,
];

/// ECDSA signature components
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Signature {
    /// r component (32 bytes)
    pub r: [u8; 32],
    /// s component (32 bytes)
    pub s: [u8; 32],
    /// v component (recovery id, typically 27 or 28)
    pub v: u8,
}

impl Signature {
    /// Create from raw components
    pub fn new(r: [u8; 32], s: [u8; 32], v: u8) -> Self {
        Self { r, s, v }
    }

    /// Create from 65-byte signature (r || s || v)
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, Eip712Error> {
        if bytes.len() != 65 {
            return Err(Eip712Error::InvalidSignature(format!(
                "expected 65 bytes, got {}",
                bytes.len()
            )));
        }

        let mut r = [0u8; 32];
        let mut s = [0u8; 32];
        r.copy_from_slice(&bytes[0..32]);
        s.copy_from_slice(&bytes[32..64]);
        Ok(Self { r, s, v: bytes[64] })
    }

    /// Convert to 65-byte representation (r || s || v)
    pub fn to_bytes(&self) -> [u8; 65] {
        let mut bytes = [0u8; 65];
        bytes[0..32].copy_from_slice(&self.r);
        bytes[32..64].copy_from_slice(&self.s);
        bytes[64] = self.v;
        bytes
    }

    /// Convert to hex string
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.to_bytes()))
    }

    /// Recovery id in {0, 1}.
    ///
    /// Accepts the Ethereum 27/28 convention, and raw 0/1 when
    /// `accept_raw` is set.
    pub fn recovery_id(&self, accept_raw: bool) -> Result<u8, Eip712Error> {
        match self.v {
            27 | 28 => Ok(self.v - 27),
            0 | 1 if accept_raw => Ok(self.v),
            other => Err(Eip712Error::InvalidSignature(format!(
                "unsupported v value {}",
                other
            ))),
        }
    }

    /// Whether `s` is in the lower half of the curve order
    pub fn is_low_s(&self) -> bool {
        self.s <= SECP256K1_HALF_ORDER
    }

    /// The other valid signature for the same key and digest: `s' = n - s`
    /// with the recovery id flipped.
    ///
    /// Only meaningful for `0 < s < n`.
    pub fn malleable_twin(&self) -> Self {
        let n = U256::from_big_endian(&SECP256K1_ORDER);
        let s = U256::from_big_endian(&self.s);
        let mut flipped = [0u8; 32];
        n.overflowing_sub(s).0.to_big_endian(&mut flipped);

        let v = match self.v {
            27 => 28,
            28 => 27,
            0 => 1,
            1 => 0,
            other => other,
        };
        Self { r: self.r, s: flipped, v }
    }

    /// Same signature with `s` normalized to the lower half
    pub fn to_low_s(&self) -> Self {
        if self.is_low_s() {
            *self
        } else {
            self.malleable_twin()
        }
    }
}

impl FromStr for Signature {
    type Err = Eip712Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = decode_hex(s.trim())
            .map_err(|e| Eip712Error::InvalidSignature(format!("invalid hex: {}", e)))?;
        Self::from_bytes(&bytes)
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl Serialize for Signature {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Signature {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod signature_tests {
    use super::*;

    #[test]
    fn test_signature_conversion() {
        let sig = Signature::new([1u8; 32], [2u8; 32], 27);
        let recovered = Signature::from_bytes(&sig.to_bytes()).unwrap();
        assert_eq!(sig, recovered);

        let hex = sig.to_hex();
        assert!(hex.starts_with("0x"));
        assert_eq!(hex.len(), 132); // 0x + 65 bytes * 2
        assert_eq!(hex.parse::<Signature>().unwrap(), sig);
    }

    #[test]
    fn test_wrong_length_rejected() {
        assert!(matches!(
            Signature::from_bytes(&[0u8; 64]),
            Err(Eip712Error::InvalidSignature(_))
        ));
        assert!("0x1234".parse::<Signature>().is_err());
    }

    #[test]
    fn test_recovery_id() {
        let mut sig = Signature::new([1u8; 32], [1u8; 32], 27);
        assert_eq!(sig.recovery_id(false).unwrap(), 0);
        sig.v = 28;
        assert_eq!(sig.recovery_id(false).unwrap(), 1);
        sig.v = 1;
        assert_eq!(sig.recovery_id(true).unwrap(), 1);
        assert!(sig.recovery_id(false).is_err());
        sig.v = 37;
        assert!(sig.recovery_id(true).is_err());
    }

    #[test]
    fn test_half_order_is_half_of_order() {
        let n = U256::from_big_endian(&SECP256K1_ORDER);
        let half = U256::from_big_endian(&SECP256K1_HALF_ORDER);
        assert_eq!(n / 2, half);
    }

    #[test]
    fn test_malleable_twin() {
        let sig = Signature::new([7u8; 32], [1u8; 32], 27);
        assert!(sig.is_low_s());

        let twin = sig.malleable_twin();
        assert!(!twin.is_low_s());
        assert_eq!(twin.v, 28);
        assert_eq!(twin.malleable_twin(), sig);
        assert_eq!(twin.to_low_s(), sig);
    }
}
