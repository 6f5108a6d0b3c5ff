//! EIP-712 Test Suite
//!
//! End-to-end tests across hashing, signing and verification.

use super::*;
use crate::utils::verifier_config::{SignaturePolicy, SigningScheme, VerifierConfig};
use ethers_core::types::U256;

// Hardhat account #0 (DO NOT USE IN PRODUCTION)
const OWNER_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
const OWNER_ADDRESS: &str = "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266";
// Hardhat account #1
const OTHER_KEY: &str = "0x59c6995e998f97a5a0044966f0945389dc9e86dae88c7a8412f4603b6b78690d";
const OTHER_ADDRESS: &str = "0x70997970C51812dc3A010C7d01b50e0d17dc79C8";
const CONTRACT: &str = "0x5FbDB2315678afecb367f032d93F642f64180aa3";

fn transfer_domain() -> Domain {
    Domain::parse("EIP712 Domain", "1", "1", CONTRACT).unwrap()
}

/// `"blue"` right-padded to 32 bytes
fn blue_data() -> Vec<u8> {
    let mut data = b"blue".to_vec();
    data.resize(32, 0);
    data
}

fn transfer_order() -> TransferOrder {
    TransferOrder::new(OTHER_ADDRESS.parse().unwrap(), 1u64, blue_data(), 1_690_815_265)
}

fn signed_transfer() -> (Verifier, Message, Signature, Address) {
    let owner = LocalKeySigner::from_hex(OWNER_KEY).unwrap();
    let order = transfer_order();
    let signature = owner.sign_digest(&order.transfer_hash(&transfer_domain()).unwrap()).unwrap();
    (
        TransferOrder::verifier(transfer_domain()),
        order.to_message(),
        signature,
        owner.address(),
    )
}

/// Test the canonical Mail example from EIP-712 specification
#[test]
fn test_eip712_mail_example() {
    let types = TypeRegistry::new()
        .with(StructDefinition::parse("Person(string name,address wallet)").unwrap())
        .with(StructDefinition::parse("Mail(Person from,Person to,string contents)").unwrap());

    let person = |name: &str, wallet: &str| {
        Message::new()
            .with("name", name)
            .with("wallet", wallet.parse::<Address>().unwrap())
    };
    let mail = Message::new()
        .with("from", person("Cow", "0xCD2a3d9F938E13CD947Ec05AbC7FE734Df8DD826"))
        .with("to", person("Bob", "0xbBbBBBBbbBBBbbbBbbBbbbbBBbBbbbbBbBbbBBbB"))
        .with("contents", "Hello, Bob!");

    let domain = Domain::parse(
        "Ether Mail",
        "1",
        "1",
        "0xCcCCccccCCCCcCCCCCCcCcCccCcCCCcCcccccccC",
    )
    .unwrap();

    assert_eq!(
        types.encode_type("Mail").unwrap(),
        "Mail(Person from,Person to,string contents)Person(string name,address wallet)"
    );

    // Expected hash from EIP-712 specification
    let hash = hash_typed_data(&domain, &types, "Mail", &mail).unwrap();
    assert_eq!(
        hex::encode(hash),
        "be609aee343fb3c4b28e1df9e632fca64fcfaede20f02e86244efddf30957bd2"
    );
}

/// Test Uniswap-style Permit message read from JSON
#[test]
fn test_eip712_permit() {
    let json = r#"{
        "types": {
            "EIP712Domain": [
                {"name": "name", "type": "string"},
                {"name": "version", "type": "string"},
                {"name": "chainId", "type": "uint256"},
                {"name": "verifyingContract", "type": "address"}
            ],
            "Permit": [
                {"name": "owner", "type": "address"},
                {"name": "spender", "type": "address"},
                {"name": "value", "type": "uint256"},
                {"name": "nonce", "type": "uint256"},
                {"name": "deadline", "type": "uint256"}
            ]
        },
        "primaryType": "Permit",
        "domain": {
            "name": "Uniswap V2",
            "version": "1",
            "chainId": 1,
            "verifyingContract": "0x7a250d5630B4cF539739dF2C5dAcb4c659F2488D"
        },
        "message": {
            "owner": "0x1234567890123456789012345678901234567890",
            "spender": "0x0987654321098765432109876543210987654321",
            "value": "1000000000000000000",
            "nonce": 0,
            "deadline": 1893456000
        }
    }"#;

    let typed_data = TypedData::from_json(json).unwrap();
    let message = typed_data.message().unwrap();
    assert_eq!(
        message.get("value"),
        Some(&Value::Uint(U256::exp10(18)))
    );

    // Same message built by hand
    let types = TypeRegistry::new().with(
        StructDefinition::parse(
            "Permit(address owner,address spender,uint256 value,uint256 nonce,uint256 deadline)",
        )
        .unwrap(),
    );
    let manual = Message::new()
        .with("owner", "0x1234567890123456789012345678901234567890".parse::<Address>().unwrap())
        .with("spender", "0x0987654321098765432109876543210987654321".parse::<Address>().unwrap())
        .with("value", U256::exp10(18))
        .with("nonce", 0u64)
        .with("deadline", 1_893_456_000u64);

    assert_eq!(
        typed_data.digest().unwrap(),
        hash_typed_data(&typed_data.domain, &types, "Permit", &manual).unwrap()
    );
}

/// Test with nested struct arrays
#[test]
fn test_eip712_struct_arrays() {
    let types = TypeRegistry::new()
        .with(StructDefinition::parse("Item(uint256 id,string name)").unwrap())
        .with(StructDefinition::parse("Order(Item[] items,address buyer)").unwrap());

    let item = |id: u64, name: &str| Value::Struct(Message::new().with("id", id).with("name", name));
    let order = Message::new()
        .with("items", vec![item(1, "Widget"), item(2, "Gadget")])
        .with("buyer", Address([0x12; 20]));

    let item_type_hash = keccak256(b"Item(uint256 id,string name)");
    let item_hash = |id: u8, name: &str| {
        let mut id_word = [0u8; 32];
        id_word[31] = id;
        crate::utils::crypto::keccak256_concat(&[&item_type_hash[..], &id_word[..], &keccak256(name.as_bytes())[..]])
    };
    let items_hash = crate::utils::crypto::keccak256_concat(&[&item_hash(1, "Widget")[..], &item_hash(2, "Gadget")[..]]);
    let expected = crate::utils::crypto::keccak256_concat(&[
        &keccak256(b"Order(Item[] items,address buyer)Item(uint256 id,string name)")[..],
        &items_hash[..],
        &Address([0x12; 20]).to_word()[..],
    ]);

    assert_eq!(types.hash_struct("Order", &order).unwrap(), expected);
}

/// Test invalid primary type
#[test]
fn test_eip712_invalid_primary_type() {
    let types = TransferOrder::registry();
    let result = types.hash_struct("NonExistent", &Message::new());
    assert!(matches!(result, Err(Eip712Error::UnsupportedType(ref t)) if t == "NonExistent"));
}

/// The signing flow of the demo contract: owner signs, anyone verifies
#[test]
fn test_transfer_order_end_to_end() {
    let (verifier, message, signature, owner) = signed_transfer();
    assert_eq!(owner.to_string(), OWNER_ADDRESS);
    assert_eq!(blue_data().len(), 32);

    assert_eq!(verifier.verify(TRANSFER_ORDER_TYPE, &message, &signature, &owner), Ok(true));
    assert_eq!(verifier.recover(TRANSFER_ORDER_TYPE, &message, &signature), Ok(owner));
    assert_eq!(
        verifier.digest(TRANSFER_ORDER_TYPE, &message).unwrap(),
        transfer_order().transfer_hash(&transfer_domain()).unwrap()
    );

    // Free function over a single definition agrees
    assert_eq!(
        verify(&transfer_domain(), &TransferOrder::definition(), &message, &signature, &owner),
        Ok(true)
    );
}

/// Changing any field breaks the signature
#[test]
fn test_transfer_order_field_changes() {
    let (verifier, message, signature, owner) = signed_transfer();

    let mut data = blue_data();
    data[4] = 1;
    let changed = [
        message.clone().with("to", owner),
        message.clone().with("amount", 2u64),
        message.clone().with("data", Value::bytes(data)),
        message.clone().with("data", Value::bytes(b"blue".to_vec())),
        message.clone().with("timestamp", 1_690_815_266u64),
    ];

    for (i, variant) in changed.iter().enumerate() {
        assert_eq!(
            verifier.verify(TRANSFER_ORDER_TYPE, variant, &signature, &owner),
            Ok(false),
            "variant {} still verified",
            i
        );
    }
}

/// Another key's signature is a clean `false`
#[test]
fn test_transfer_order_wrong_signer() {
    let (verifier, message, _, owner) = signed_transfer();
    let other = LocalKeySigner::from_hex(OTHER_KEY).unwrap();
    assert_eq!(other.address().to_string(), OTHER_ADDRESS);

    let digest = verifier.digest(TRANSFER_ORDER_TYPE, &message).unwrap();
    let forged = other.sign_digest(&digest).unwrap();

    assert_eq!(verifier.verify(TRANSFER_ORDER_TYPE, &message, &forged, &owner), Ok(false));
    assert_eq!(verifier.verify(TRANSFER_ORDER_TYPE, &message, &forged, &other.address()), Ok(true));
}

#[test]
fn test_zero_r_or_s_is_invalid() {
    let (verifier, message, signature, owner) = signed_transfer();

    for broken in [
        Signature { r: [0u8; 32], ..signature },
        Signature { s: [0u8; 32], ..signature },
    ] {
        assert!(matches!(
            verifier.verify(TRANSFER_ORDER_TYPE, &message, &broken, &owner),
            Err(Eip712Error::InvalidSignature(_))
        ));
    }
}

/// No single flipped bit in any byte keeps the signature valid
#[test]
fn test_signature_byte_mutation() {
    let (verifier, message, signature, owner) = signed_transfer();
    let bytes = signature.to_bytes();

    for i in 0..bytes.len() {
        for bit in [0x01u8, 0x80] {
            let mut mutated = bytes;
            mutated[i] ^= bit;
            let mutated = Signature::from_bytes(&mutated).unwrap();

            match verifier.verify(TRANSFER_ORDER_TYPE, &message, &mutated, &owner) {
                Ok(false) | Err(Eip712Error::InvalidSignature(_)) => {}
                other => panic!("byte {} bit {:#x}: unexpected {:?}", i, bit, other),
            }
        }
    }
}

/// Wallets going through `eth_sign` sign the prefixed digest
#[test]
fn test_eth_sign_scheme() {
    let owner = LocalKeySigner::from_hex(OWNER_KEY).unwrap();
    let domain = transfer_domain();
    let message = transfer_order().to_message();
    let digest = transfer_order().transfer_hash(&domain).unwrap();

    let eth_signed = sign_with_scheme(&owner, &digest, SigningScheme::EthSign).unwrap();
    let typed_signed = sign_with_scheme(&owner, &digest, SigningScheme::Eip712).unwrap();

    let typed = TransferOrder::verifier(domain.clone());
    let eth = TransferOrder::verifier(domain)
        .with_config(VerifierConfig::default().with_scheme(SigningScheme::EthSign));

    assert_eq!(typed.verify(TRANSFER_ORDER_TYPE, &message, &typed_signed, &owner.address()), Ok(true));
    assert_eq!(typed.verify(TRANSFER_ORDER_TYPE, &message, &eth_signed, &owner.address()), Ok(false));
    assert_eq!(eth.verify(TRANSFER_ORDER_TYPE, &message, &eth_signed, &owner.address()), Ok(true));
    assert_eq!(eth.verify(TRANSFER_ORDER_TYPE, &message, &typed_signed, &owner.address()), Ok(false));
}

#[test]
fn test_malleable_signature_policy() {
    let (verifier, message, signature, owner) = signed_transfer();
    let twin = signature.malleable_twin();

    assert!(matches!(
        verifier.verify(TRANSFER_ORDER_TYPE, &message, &twin, &owner),
        Err(Eip712Error::InvalidSignature(_))
    ));

    let permissive = verifier.with_config(VerifierConfig::default().with_policy(SignaturePolicy::permissive()));
    assert_eq!(permissive.verify(TRANSFER_ORDER_TYPE, &message, &twin, &owner), Ok(true));
    assert_eq!(permissive.verify(TRANSFER_ORDER_TYPE, &message, &signature, &owner), Ok(true));
}

/// Signatures from an ethers-signers wallet verify like local ones
#[test]
fn test_ethers_wallet_signature() {
    let wallet: ethers_signers::LocalWallet = OWNER_KEY.trim_start_matches("0x").parse().unwrap();
    let order = transfer_order();
    let signature = sign_typed_data(
        &wallet,
        &transfer_domain(),
        &TransferOrder::registry(),
        TRANSFER_ORDER_TYPE,
        &order.to_message(),
    )
    .unwrap();

    let owner: Address = OWNER_ADDRESS.parse().unwrap();
    assert_eq!(SigningOracle::address(&wallet), owner);
    assert_eq!(
        TransferOrder::verifier(transfer_domain()).verify(TRANSFER_ORDER_TYPE, &order.to_message(), &signature, &owner),
        Ok(true)
    );
}

/// Test signing roundtrip through a typed-data document
#[test]
fn test_signing_roundtrip() {
    let json = r#"{
        "types": {
            "Note": [
                {"name": "content", "type": "string"},
                {"name": "delta", "type": "int256"}
            ]
        },
        "primaryType": "Note",
        "domain": {
            "name": "Test",
            "version": "2",
            "chainId": "0x89",
            "verifyingContract": "0x0000000000000000000000000000000000000000"
        },
        "message": {
            "content": "Hello World",
            "delta": "-42"
        }
    }"#;

    let typed_data = TypedData::from_json(json).unwrap();
    assert_eq!(typed_data.domain.chain_id, U256::from(137));

    let signer = LocalKeySigner::from_hex(OTHER_KEY).unwrap();
    let pre_image = typed_data.pre_image().unwrap();
    let signature = signer.sign_digest(&pre_image.digest).unwrap();

    let verifier = typed_data.verifier().unwrap();
    let message = typed_data.message().unwrap();
    assert_eq!(verifier.verify("Note", &message, &signature, &signer.address()), Ok(true));
    assert_eq!(verifier.verify("Note", &message, &signature, &Address::ZERO), Ok(false));
}

fn keccak256(data: &[u8]) -> Digest {
    crate::utils::crypto::keccak256(data)
}
