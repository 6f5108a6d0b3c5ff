//! EIP-712 Signing
//!
//! Signing goes through the [`SigningOracle`] trait so key custody stays
//! outside the hashing and verification code. [`LocalKeySigner`] keeps a
//! secp256k1 key in process; an ethers-signers `LocalWallet` works too.

use ethers_core::types::H256;
use ethers_signers::{LocalWallet, Signer};
use secp256k1::{PublicKey, Secp256k1, SecretKey};
use zeroize::Zeroizing;

use super::encoder::TypeRegistry;
use super::hasher::{eth_signed_message_hash, hash_typed_data};
use super::domain::Domain;
use super::recovery::public_key_to_address;
use super::signature::Signature;
use super::types::*;
use crate::utils::crypto::decode_hex;
use crate::utils::verifier_config::SigningScheme;

/// Something that can sign a 32-byte digest on behalf of one address
pub trait SigningOracle {
    /// The address signatures will recover to
    fn address(&self) -> Address;

    /// Sign the digest as is; no prefix is applied
    fn sign_digest(&self, digest: &Digest) -> Result<Signature, Eip712Error>;
}

/// Sign an EIP-712 digest with the given scheme
pub fn sign_with_scheme<O: SigningOracle + ?Sized>(
    oracle: &O,
    digest: &Digest,
    scheme: SigningScheme,
) -> Result<Signature, Eip712Error> {
    match scheme {
        SigningScheme::Eip712 => oracle.sign_digest(digest),
        SigningScheme::EthSign => oracle.sign_digest(&eth_signed_message_hash(digest)),
    }
}

/// Sign EIP-712 typed data
///
/// Returns a signature with v, r, s components.
pub fn sign_typed_data<O: SigningOracle + ?Sized>(
    oracle: &O,
    domain: &Domain,
    types: &TypeRegistry,
    primary_type: &str,
    message: &Message,
) -> Result<Signature, Eip712Error> {
    let digest = hash_typed_data(domain, types, primary_type, message)?;
    oracle.sign_digest(&digest)
}

/// In-process secp256k1 key
pub struct LocalKeySigner {
    secret_key: SecretKey,
    address: Address,
}

impl LocalKeySigner {
    pub fn from_bytes(private_key: &[u8]) -> Result<Self, Eip712Error> {
        if private_key.len() != 32 {
            return Err(Eip712Error::SigningError(format!(
                "invalid private key length: expected 32, got {}",
                private_key.len()
            )));
        }

        let secret_key = SecretKey::from_slice(private_key)
            .map_err(|e| Eip712Error::SigningError(e.to_string()))?;
        Ok(Self::from_secret_key(secret_key))
    }

    /// Parse a hex private key, with or without `0x`
    pub fn from_hex(private_key: &str) -> Result<Self, Eip712Error> {
        let bytes = Zeroizing::new(
            decode_hex(private_key.trim())
                .map_err(|e| Eip712Error::SigningError(format!("invalid key hex: {}", e)))?,
        );
        Self::from_bytes(&bytes)
    }

    /// Fresh key from the OS RNG
    pub fn random() -> Self {
        let secret_key = SecretKey::new(&mut rand::rngs::OsRng);
        Self::from_secret_key(secret_key)
    }

    fn from_secret_key(secret_key: SecretKey) -> Self {
        let secp = Secp256k1::signing_only();
        let public_key = PublicKey::from_secret_key(&secp, &secret_key);
        Self {
            secret_key,
            address: public_key_to_address(&public_key),
        }
    }

    /// Hex of the private key; the caller owns keeping it secret
    pub fn secret_hex(&self) -> Zeroizing<String> {
        let bytes = Zeroizing::new(self.secret_key.secret_bytes());
        Zeroizing::new(hex::encode(&bytes[..]))
    }
}

impl SigningOracle for LocalKeySigner {
    fn address(&self) -> Address {
        self.address
    }

    fn sign_digest(&self, digest: &Digest) -> Result<Signature, Eip712Error> {
        let secp = Secp256k1::signing_only();
        let message = secp256k1::Message::from_digest(*digest);

        let (recovery_id, compact) = secp
            .sign_ecdsa_recoverable(&message, &self.secret_key)
            .serialize_compact();

        let mut r = [0u8; 32];
        let mut s = [0u8; 32];
        r.copy_from_slice(&compact[0..32]);
        s.copy_from_slice(&compact[32..64]);

        // v is recovery_id + 27 (Ethereum standard)
        let v = recovery_id.to_i32() as u8 + 27;

        Ok(Signature::new(r, s, v))
    }
}

impl Drop for LocalKeySigner {
    fn drop(&mut self) {
        self.secret_key.non_secure_erase();
    }
}

impl std::fmt::Debug for LocalKeySigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalKeySigner")
            .field("address", &self.address)
            .finish_non_exhaustive()
    }
}

impl SigningOracle for LocalWallet {
    fn address(&self) -> Address {
        Address(Signer::address(self).0)
    }

    fn sign_digest(&self, digest: &Digest) -> Result<Signature, Eip712Error> {
        let signature = self
            .sign_hash(H256::from(*digest))
            .map_err(|e| Eip712Error::SigningError(e.to_string()))?;

        let mut r = [0u8; 32];
        let mut s = [0u8; 32];
        signature.r.to_big_endian(&mut r);
        signature.s.to_big_endian(&mut s);
        let v = u8::try_from(signature.v)
            .map_err(|_| Eip712Error::SigningError(format!("unexpected v {}", signature.v)))?;

        Ok(Signature::new(r, s, v))
    }
}
