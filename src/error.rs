//! Application error types
//!
//! Library code returns [`Eip712Error`]; the CLI and JSON output convert it
//! into [`VerifierError`], which carries a stable machine-readable code.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::eip712::Eip712Error;

/// Serializable error reported by the command-line surface
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifierError {
    pub code: ErrorCode,
    pub message: String,
    pub details: Option<String>,
}

impl VerifierError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    // Convenience constructors
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidInput, msg)
    }

    pub fn invalid_private_key(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidPrivateKey, msg)
    }
}

impl fmt::Display for VerifierError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.message)?;
        if let Some(ref details) = self.details {
            write!(f, " ({})", details)?;
        }
        Ok(())
    }
}

impl std::error::Error for VerifierError {}

/// Error codes for categorization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    // Input errors
    InvalidInput,
    InvalidAddress,
    InvalidPrivateKey,
    MissingField,
    TypeMismatch,
    UnsupportedType,
    MalformedDomain,

    // Signature errors
    InvalidSignature,
    SigningFailed,

    // Parse errors
    JsonError,
    HexError,

    // Internal
    Internal,
}

/// Result type alias for CLI operations
pub type VerifierResult<T> = Result<T, VerifierError>;

// Conversions from common error types

impl From<Eip712Error> for VerifierError {
    fn from(e: Eip712Error) -> Self {
        let code = match &e {
            Eip712Error::InvalidJson(_) => ErrorCode::JsonError,
            Eip712Error::MissingField(_) => ErrorCode::MissingField,
            Eip712Error::TypeMismatch { .. } => ErrorCode::TypeMismatch,
            Eip712Error::UnsupportedType(_) => ErrorCode::UnsupportedType,
            Eip712Error::InvalidSignature(_) => ErrorCode::InvalidSignature,
            Eip712Error::MalformedDomain(_) => ErrorCode::MalformedDomain,
            Eip712Error::InvalidAddress(_) => ErrorCode::InvalidAddress,
            Eip712Error::SigningError(_) => ErrorCode::SigningFailed,
        };
        VerifierError::new(code, e.to_string())
    }
}

impl From<serde_json::Error> for VerifierError {
    fn from(e: serde_json::Error) -> Self {
        VerifierError::new(ErrorCode::JsonError, e.to_string())
    }
}

impl From<hex::FromHexError> for VerifierError {
    fn from(e: hex::FromHexError) -> Self {
        VerifierError::new(ErrorCode::HexError, e.to_string())
    }
}

impl From<std::io::Error> for VerifierError {
    fn from(e: std::io::Error) -> Self {
        VerifierError::new(ErrorCode::Internal, e.to_string())
    }
}
