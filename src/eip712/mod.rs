//! EIP-712 Typed Data Signing and Verification
//!
//! Implementation of EIP-712 typed structured data hashing, signing and
//! signer recovery.
//!
//! # Reference
//! - <https://eips.ethereum.org/EIPS/eip-712>
//!
//! # Example
//! ```rust,ignore
//! use eip712_verifier::eip712::{Domain, LocalKeySigner, SigningOracle, TransferOrder};
//!
//! let domain = Domain::parse("EIP712 Domain", "1", "1", contract)?;
//! let digest = order.transfer_hash(&domain)?;
//! let signature = signer.sign_digest(&digest)?;
//! let valid = TransferOrder::verifier(domain)
//!     .verify("TransferOrder", &order.to_message(), &signature, &signer.address())?;
//! ```

pub mod types;
pub mod domain;
pub mod encoder;
pub mod hasher;
pub mod signature;
pub mod recovery;
pub mod signer;
pub mod verifier;
pub mod transfer_order;
pub mod typed_data;

pub use types::*;
pub use domain::*;
pub use encoder::*;
pub use hasher::*;
pub use signature::*;
pub use recovery::*;
pub use signer::*;
pub use verifier::{verify, Verifier};
pub use transfer_order::*;
pub use typed_data::*;

#[cfg(test)]
mod tests;
