//! EIP-712 Verifier Library
//!
//! Hashing, signing and signer recovery for EIP-712 typed structured data.
//!
//! # Architecture
//!
//! This crate provides:
//! - **eip712**: domain separator, type encoding, digest composition,
//!   signature recovery and verification
//! - **types**: report types and the JSON response envelope used by the CLI
//! - **error**: serializable application errors
//! - **utils**: hashing helpers, logging, verifier configuration
//!
//! # Security
//!
//! Private keys are zeroed when dropped. Signatures with `s` in the upper
//! half of the curve order are rejected unless the permissive policy is
//! selected, and signer comparison is constant-time.
//!
//! # Example
//!
//! ```rust,ignore
//! use eip712_verifier::eip712::{Domain, TransferOrder, LocalKeySigner, SigningOracle};
//!
//! let signer = LocalKeySigner::random();
//! let digest = order.transfer_hash(&domain)?;
//! let signature = signer.sign_digest(&digest)?;
//! assert!(TransferOrder::verifier(domain)
//!     .verify("TransferOrder", &order.to_message(), &signature, &signer.address())?);
//! ```

pub mod eip712;
pub mod error;
pub mod types;
pub mod utils;

// Re-export key types for convenience
pub use error::{ErrorCode, VerifierError, VerifierResult};
pub use types::*;

pub use eip712::{
    domain_separator, hash_typed_data, recover_signer, recover_signer_with, signing_digest,
    struct_hash, type_hash, verify, Address, Digest, Domain, Eip712Error, FieldType,
    LocalKeySigner, Message, Signature, SigningOracle, StructDefinition, TransferOrder,
    TypeRegistry, TypedData, TypedField, Value, Verifier,
};
pub use utils::verifier_config::{SignaturePolicy, SigningScheme, VerifierConfig};

// Re-export crypto utilities for binaries
pub use utils::crypto::{keccak256, to_checksum_address};
