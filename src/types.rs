//! Output types for the command-line surface
//!
//! Every command result can be printed as text or wrapped in the
//! `{success, data, error}` JSON envelope.

use serde::{Deserialize, Serialize};
use std::fmt;
use zeroize::Zeroizing;

use crate::eip712::{Address, Eip712PreImage, Signature};
use crate::error::VerifierError;
use crate::utils::crypto::to_hex_prefixed;
use crate::utils::verifier_config::SigningScheme;

// =============================================================================
// Command Reports
// =============================================================================

/// Hashes of a typed-data document
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DigestReport {
    pub primary_type: String,
    #[serde(flatten)]
    pub pre_image: Eip712PreImage,
}

impl fmt::Display for DigestReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Primary type:     {}", self.primary_type)?;
        writeln!(f, "Domain separator: {}", to_hex_prefixed(&self.pre_image.domain_separator))?;
        writeln!(f, "Struct hash:      {}", to_hex_prefixed(&self.pre_image.struct_hash))?;
        write!(f, "Digest:           {}", to_hex_prefixed(&self.pre_image.digest))
    }
}

/// Result of signing a document
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignReport {
    pub signer: Address,
    pub scheme: SigningScheme,
    pub signature: Signature,
}

impl fmt::Display for SignReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Signer:    {}", self.signer)?;
        writeln!(f, "Scheme:    {}", self.scheme)?;
        write!(f, "Signature: {}", self.signature)
    }
}

/// Address recovered from a signature
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecoverReport {
    pub signer: Address,
    pub scheme: SigningScheme,
}

impl fmt::Display for RecoverReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Recovered signer: {} ({})", self.signer, self.scheme)
    }
}

/// Outcome of checking a signature against an expected signer
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyReport {
    pub valid: bool,
    pub expected: Address,
    pub recovered: Address,
    pub scheme: SigningScheme,
}

impl fmt::Display for VerifyReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let status = if self.valid { "VALID" } else { "INVALID" };
        writeln!(f, "Signature: {}", status)?;
        writeln!(f, "Expected:  {}", self.expected)?;
        write!(f, "Recovered: {}", self.recovered)
    }
}

/// A freshly generated key
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeygenReport {
    pub private_key: Zeroizing<String>,
    pub address: Address,
}

impl fmt::Display for KeygenReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Private key (hex): {}", self.private_key.as_str())?;
        write!(f, "Address:           {}", self.address)
    }
}

// =============================================================================
// API Response Wrapper
// =============================================================================

/// Standard response wrapper for JSON output
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<VerifierError>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn err(error: VerifierError) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error),
        }
    }
}

impl<T: Serialize> ApiResponse<T> {
    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|_| {
            r#"{"success":false,"error":{"code":"internal","message":"Serialization failed"}}"#.to_string()
        })
    }
}
