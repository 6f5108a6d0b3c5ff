//! Signature Verification
//!
//! Recomputes the digest for a typed message and checks that a signature
//! recovers to the expected signer. A well-formed signature from someone
//! else is `Ok(false)`; only malformed input is an error.

use subtle::ConstantTimeEq;

use super::domain::Domain;
use super::encoder::TypeRegistry;
use super::hasher::{eth_signed_message_hash, signing_digest};
use super::recovery::recover_signer_with;
use super::signature::Signature;
use super::types::*;
use crate::log_debug;
use crate::utils::crypto::to_hex_prefixed;
use crate::utils::verifier_config::{SigningScheme, VerifierConfig};

const MODULE: &str = "eip712::verifier";

/// Verify a single-struct message against an expected signer
///
/// `definition` must not reference other structs.
pub fn verify(
    domain: &Domain,
    definition: &StructDefinition,
    message: &Message,
    signature: &Signature,
    expected_signer: &Address,
) -> Result<bool, Eip712Error> {
    let types = TypeRegistry::new().with(definition.clone());
    Verifier::new(domain.clone(), types).verify(&definition.type_name, message, signature, expected_signer)
}

/// Verification service bound to one domain and one set of types
#[derive(Debug, Clone)]
pub struct Verifier {
    domain: Domain,
    domain_separator: Digest,
    types: TypeRegistry,
    config: VerifierConfig,
}

impl Verifier {
    pub fn new(domain: Domain, types: TypeRegistry) -> Self {
        let domain_separator = domain.separator();
        Self {
            domain,
            domain_separator,
            types,
            config: VerifierConfig::default(),
        }
    }

    pub fn with_config(mut self, config: VerifierConfig) -> Self {
        self.config = config;
        self
    }

    pub fn domain(&self) -> &Domain {
        &self.domain
    }

    pub fn domain_separator(&self) -> &Digest {
        &self.domain_separator
    }

    pub fn types(&self) -> &TypeRegistry {
        &self.types
    }

    pub fn config(&self) -> &VerifierConfig {
        &self.config
    }

    /// EIP-712 digest of a message of type `primary_type`
    pub fn digest(&self, primary_type: &str, message: &Message) -> Result<Digest, Eip712Error> {
        let struct_hash = self.types.hash_struct(primary_type, message)?;
        Ok(signing_digest(&self.domain_separator, &struct_hash))
    }

    /// The hash the signer actually signed under the configured scheme
    pub fn signed_hash(&self, primary_type: &str, message: &Message) -> Result<Digest, Eip712Error> {
        let digest = self.digest(primary_type, message)?;
        Ok(match self.config.scheme {
            SigningScheme::Eip712 => digest,
            SigningScheme::EthSign => eth_signed_message_hash(&digest),
        })
    }

    /// Recover the address that signed `message`
    pub fn recover(
        &self,
        primary_type: &str,
        message: &Message,
        signature: &Signature,
    ) -> Result<Address, Eip712Error> {
        let hash = self.signed_hash(primary_type, message)?;
        let signer = recover_signer_with(&hash, signature, &self.config.policy)?;

        log_debug!(
            MODULE,
            "signer recovered",
            primary_type = primary_type,
            scheme = self.config.scheme,
            digest = to_hex_prefixed(&hash),
            recovered = signer,
        );
        Ok(signer)
    }

    /// Whether `signature` over `message` was made by `expected_signer`
    pub fn verify(
        &self,
        primary_type: &str,
        message: &Message,
        signature: &Signature,
        expected_signer: &Address,
    ) -> Result<bool, Eip712Error> {
        let recovered = self.recover(primary_type, message, signature)?;
        let matches: bool = recovered.ct_eq(expected_signer).into();

        log_debug!(
            MODULE,
            "signature checked",
            expected = expected_signer,
            valid = matches,
        );
        Ok(matches)
    }
}
