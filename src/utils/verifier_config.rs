//! Verifier Configuration
//!
//! Signature acceptance rules and signing scheme selection, with presets:
//! - `strict` (default): low-s only, raw 0/1 recovery ids accepted
//! - `permissive`: any `s` below the curve order

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How the signed payload is derived from the EIP-712 digest
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SigningScheme {
    /// The EIP-712 digest is signed as is (`eth_signTypedData`)
    #[default]
    Eip712,
    /// The digest is wrapped with the EIP-191 prefix first (`eth_sign`)
    EthSign,
}

impl fmt::Display for SigningScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SigningScheme::Eip712 => f.write_str("eip712"),
            SigningScheme::EthSign => f.write_str("eth-sign"),
        }
    }
}

impl FromStr for SigningScheme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "eip712" | "eip-712" => Ok(SigningScheme::Eip712),
            "eth-sign" | "ethsign" | "eip191" | "eip-191" => Ok(SigningScheme::EthSign),
            other => Err(format!("unknown signing scheme: {}", other)),
        }
    }
}

/// Rules a signature must satisfy before recovery is attempted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignaturePolicy {
    /// Reject `s > n/2` (EIP-2)
    pub reject_high_s: bool,
    /// Accept `v` in {0, 1} in addition to {27, 28}
    pub accept_raw_recovery_id: bool,
}

impl Default for SignaturePolicy {
    fn default() -> Self {
        Self::strict()
    }
}

impl SignaturePolicy {
    pub fn strict() -> Self {
        Self {
            reject_high_s: true,
            accept_raw_recovery_id: true,
        }
    }

    pub fn permissive() -> Self {
        Self {
            reject_high_s: false,
            accept_raw_recovery_id: true,
        }
    }
}

/// Settings for a verification service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VerifierConfig {
    pub policy: SignaturePolicy,
    pub scheme: SigningScheme,
}

impl VerifierConfig {
    pub fn with_policy(mut self, policy: SignaturePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_scheme(mut self, scheme: SigningScheme) -> Self {
        self.scheme = scheme;
        self
    }
}
