//! Signer Recovery
//!
//! secp256k1 public-key recovery from `(r, s, v)` and Ethereum address
//! derivation.

use secp256k1::ecdsa::{RecoverableSignature, RecoveryId};
use secp256k1::{Message, PublicKey, Secp256k1};

use super::signature::{Signature, SECP256K1_ORDER};
use super::types::{Address, Digest, Eip712Error};
use crate::utils::crypto::keccak256;
use crate::utils::verifier_config::SignaturePolicy;

/// Recover the signer's address under the default (strict) policy
pub fn recover_signer(digest: &Digest, signature: &Signature) -> Result<Address, Eip712Error> {
    recover_signer_with(digest, signature, &SignaturePolicy::default())
}

/// Recover the signer's address from a signature
pub fn recover_signer_with(
    digest: &Digest,
    signature: &Signature,
    policy: &SignaturePolicy,
) -> Result<Address, Eip712Error> {
    let recovery_id = check_signature(signature, policy)?;
    let public_key = recover_public_key(digest, signature, recovery_id)?;
    Ok(public_key_to_address(&public_key))
}

/// Structural checks; returns the normalized recovery id
pub fn check_signature(signature: &Signature, policy: &SignaturePolicy) -> Result<u8, Eip712Error> {
    if signature.r == [0u8; 32] {
        return Err(Eip712Error::InvalidSignature("r is zero".to_string()));
    }
    if signature.s == [0u8; 32] {
        return Err(Eip712Error::InvalidSignature("s is zero".to_string()));
    }
    // Big-endian arrays compare numerically
    if signature.r >= SECP256K1_ORDER {
        return Err(Eip712Error::InvalidSignature("r exceeds curve order".to_string()));
    }
    if signature.s >= SECP256K1_ORDER {
        return Err(Eip712Error::InvalidSignature("s exceeds curve order".to_string()));
    }
    if policy.reject_high_s && !signature.is_low_s() {
        return Err(Eip712Error::InvalidSignature(
            "s is in the upper half of the curve order".to_string(),
        ));
    }

    signature.recovery_id(policy.accept_raw_recovery_id)
}

fn recover_public_key(
    digest: &Digest,
    signature: &Signature,
    recovery_id: u8,
) -> Result<PublicKey, Eip712Error> {
    let secp = Secp256k1::verification_only();

    let recovery_id = RecoveryId::from_i32(i32::from(recovery_id))
        .map_err(|e| Eip712Error::InvalidSignature(e.to_string()))?;

    let mut compact = [0u8; 64];
    compact[..32].copy_from_slice(&signature.r);
    compact[32..].copy_from_slice(&signature.s);

    let recoverable = RecoverableSignature::from_compact(&compact, recovery_id)
        .map_err(|e| Eip712Error::InvalidSignature(e.to_string()))?;

    let message = Message::from_digest(*digest);

    secp.recover_ecdsa(&message, &recoverable)
        .map_err(|e| Eip712Error::InvalidSignature(format!("recovery failed: {}", e)))
}

/// Convert a secp256k1 public key to an Ethereum address
pub fn public_key_to_address(public_key: &PublicKey) -> Address {
    // Uncompressed key is 0x04 || X || Y; the address hashes X || Y
    let uncompressed = public_key.serialize_uncompressed();
    let hash = keccak256(&uncompressed[1..]);

    let mut address = [0u8; 20];
    address.copy_from_slice(&hash[12..]);
    Address(address)
}

#[cfg(test)]
mod recovery_tests {
    use super::*;
    use secp256k1::SecretKey;

    fn sign(digest: &Digest, key: &[u8; 32]) -> (Signature, Address) {
        let secp = Secp256k1::new();
        let secret = SecretKey::from_slice(key).unwrap();
        let (rec_id, compact) = secp
            .sign_ecdsa_recoverable(&Message::from_digest(*digest), &secret)
            .serialize_compact();

        let mut r = [0u8; 32];
        let mut s = [0u8; 32];
        r.copy_from_slice(&compact[..32]);
        s.copy_from_slice(&compact[32..]);

        let public = PublicKey::from_secret_key(&secp, &secret);
        (
            Signature::new(r, s, rec_id.to_i32() as u8 + 27),
            public_key_to_address(&public),
        )
    }

    #[test]
    fn test_known_key_address() {
        // Private key 1 -> generator point
        let mut key = [0u8; 32];
        key[31] = 1;
        let secp = Secp256k1::new();
        let public = PublicKey::from_secret_key(&secp, &SecretKey::from_slice(&key).unwrap());
        assert_eq!(
            public_key_to_address(&public).to_string(),
            "0x7E5F4552091A69125d5DfCb7b8C2659029395Bdf"
        );
    }

    #[test]
    fn test_recover_roundtrip() {
        let digest = keccak256(b"digest");
        let (signature, address) = sign(&digest, &[0x42u8; 32]);
        assert_eq!(recover_signer(&digest, &signature).unwrap(), address);

        let raw = Signature { v: signature.v - 27, ..signature };
        assert_eq!(recover_signer(&digest, &raw).unwrap(), address);
    }

    #[test]
    fn test_zero_components_rejected() {
        let digest = keccak256(b"digest");
        let (signature, _) = sign(&digest, &[0x42u8; 32]);

        let zero_r = Signature { r: [0u8; 32], ..signature };
        let zero_s = Signature { s: [0u8; 32], ..signature };
        assert!(matches!(recover_signer(&digest, &zero_r), Err(Eip712Error::InvalidSignature(_))));
        assert!(matches!(recover_signer(&digest, &zero_s), Err(Eip712Error::InvalidSignature(_))));
    }

    #[test]
    fn test_out_of_range_components_rejected() {
        let digest = keccak256(b"digest");
        let (signature, _) = sign(&digest, &[0x42u8; 32]);

        let big_r = Signature { r: SECP256K1_ORDER, ..signature };
        assert!(matches!(
            recover_signer_with(&digest, &big_r, &SignaturePolicy::permissive()),
            Err(Eip712Error::InvalidSignature(_))
        ));
    }

    #[test]
    fn test_high_s_policy() {
        let digest = keccak256(b"digest");
        let (signature, address) = sign(&digest, &[0x42u8; 32]);
        assert!(signature.is_low_s());

        let twin = signature.malleable_twin();
        assert!(matches!(recover_signer(&digest, &twin), Err(Eip712Error::InvalidSignature(_))));
        assert_eq!(
            recover_signer_with(&digest, &twin, &SignaturePolicy::permissive()).unwrap(),
            address
        );
    }

    #[test]
    fn test_bad_v_rejected() {
        let digest = keccak256(b"digest");
        let (signature, _) = sign(&digest, &[0x42u8; 32]);
        let bad_v = Signature { v: 29, ..signature };
        assert!(matches!(recover_signer(&digest, &bad_v), Err(Eip712Error::InvalidSignature(_))));
    }
}
