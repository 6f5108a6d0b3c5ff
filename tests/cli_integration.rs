use eip712_verifier::{LocalKeySigner, SigningOracle, TypedData};
use serde_json::Value;
use std::path::PathBuf;
use std::process::{Command, Output};

// Hardhat account #0 (DO NOT USE IN PRODUCTION)
const OWNER_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
const OWNER_ADDRESS: &str = "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266";
const OTHER_ADDRESS: &str = "0x70997970C51812dc3A010C7d01b50e0d17dc79C8";

const TRANSFER_ORDER_JSON: &str = r#"{
    "types": {
        "EIP712Domain": [
            {"name": "name", "type": "string"},
            {"name": "version", "type": "string"},
            {"name": "chainId", "type": "uint256"},
            {"name": "verifyingContract", "type": "address"}
        ],
        "TransferOrder": [
            {"name": "to", "type": "address"},
            {"name": "amount", "type": "uint256"},
            {"name": "data", "type": "bytes"},
            {"name": "timestamp", "type": "uint256"}
        ]
    },
    "primaryType": "TransferOrder",
    "domain": {
        "name": "EIP712 Domain",
        "version": "1",
        "chainId": 1,
        "verifyingContract": "0x5FbDB2315678afecb367f032d93F642f64180aa3"
    },
    "message": {
        "to": "0x70997970C51812dc3A010C7d01b50e0d17dc79C8",
        "amount": 1,
        "data": "0x626c756500000000000000000000000000000000000000000000000000000000",
        "timestamp": 1690815265
    }
}"#;

/// Typed-data file that is removed when dropped
struct TempDocument(PathBuf);

impl TempDocument {
    fn new(name: &str, contents: &str) -> Self {
        let path = std::env::temp_dir().join(format!(
            "eip712-cli-{}-{}.json",
            name,
            std::process::id()
        ));
        std::fs::write(&path, contents).expect("temp file written");
        Self(path)
    }

    fn path(&self) -> &str {
        self.0.to_str().expect("temp path is utf8")
    }
}

impl Drop for TempDocument {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.0);
    }
}

fn cli() -> Command {
    let mut command = Command::new(assert_cmd::cargo::cargo_bin!("eip712-verifier"));
    command.env_remove("PRIVATE_KEY");
    command
}

fn json_output(output: &Output) -> Value {
    let stdout = String::from_utf8(output.stdout.clone()).expect("stdout is utf8");
    serde_json::from_str(&stdout).expect("stdout is valid json")
}

fn sign_document(doc: &TempDocument, scheme: &str) -> String {
    let output = cli()
        .args(["--json", "sign", "--typed-data", doc.path(), "--scheme", scheme])
        .env("PRIVATE_KEY", OWNER_KEY)
        .output()
        .expect("cli runs");
    assert!(output.status.success(), "sign failed: {:?}", output);

    let json = json_output(&output);
    assert_eq!(json["data"]["signer"], OWNER_ADDRESS);
    json["data"]["signature"].as_str().expect("signature string").to_string()
}

#[test]
fn cli_digest_matches_library() {
    let doc = TempDocument::new("digest", TRANSFER_ORDER_JSON);
    let output = cli()
        .args(["--json", "digest", "--typed-data", doc.path()])
        .output()
        .expect("cli runs");
    assert!(output.status.success(), "cli exited unsuccessfully: {:?}", output);

    let json = json_output(&output);
    assert_eq!(json["success"], true);
    assert_eq!(json["data"]["primaryType"], "TransferOrder");

    let expected = TypedData::from_json(TRANSFER_ORDER_JSON).unwrap().pre_image().unwrap();
    assert_eq!(json["data"]["digest"], format!("0x{}", hex::encode(expected.digest)));
    assert_eq!(
        json["data"]["domainSeparator"],
        format!("0x{}", hex::encode(expected.domain_separator))
    );
}

#[test]
fn cli_sign_then_verify() {
    let doc = TempDocument::new("sign-verify", TRANSFER_ORDER_JSON);
    let signature = sign_document(&doc, "eip712");

    let output = cli()
        .args([
            "--json", "verify", "--typed-data", doc.path(),
            "--signature", &signature, "--expected", OWNER_ADDRESS,
        ])
        .output()
        .expect("cli runs");
    assert!(output.status.success(), "verify failed: {:?}", output);
    let json = json_output(&output);
    assert_eq!(json["data"]["valid"], true);
    assert_eq!(json["data"]["recovered"], OWNER_ADDRESS);

    // Same signature, wrong expected signer: exit 1 with a clean report
    let output = cli()
        .args([
            "--json", "verify", "--typed-data", doc.path(),
            "--signature", &signature, "--expected", OTHER_ADDRESS,
        ])
        .output()
        .expect("cli runs");
    assert_eq!(output.status.code(), Some(1));
    let json = json_output(&output);
    assert_eq!(json["success"], true);
    assert_eq!(json["data"]["valid"], false);
    assert_eq!(json["data"]["recovered"], OWNER_ADDRESS);

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("WARN [cli] signer mismatch"), "stderr: {}", stderr);
}

#[test]
fn cli_recover_respects_scheme() {
    let doc = TempDocument::new("recover", TRANSFER_ORDER_JSON);
    let signature = sign_document(&doc, "eth-sign");

    let output = cli()
        .args([
            "--json", "recover", "--typed-data", doc.path(),
            "--signature", &signature, "--scheme", "eth-sign",
        ])
        .output()
        .expect("cli runs");
    assert!(output.status.success(), "recover failed: {:?}", output);
    assert_eq!(json_output(&output)["data"]["signer"], OWNER_ADDRESS);

    let output = cli()
        .args(["--json", "recover", "--typed-data", doc.path(), "--signature", &signature])
        .output()
        .expect("cli runs");
    assert!(output.status.success());
    assert_ne!(json_output(&output)["data"]["signer"], OWNER_ADDRESS);
}

#[test]
fn cli_rejects_zero_signature() {
    let doc = TempDocument::new("zero-sig", TRANSFER_ORDER_JSON);
    let zero = format!("0x{}1b", "00".repeat(64));

    let output = cli()
        .args([
            "--json", "verify", "--typed-data", doc.path(),
            "--signature", &zero, "--expected", OWNER_ADDRESS,
        ])
        .output()
        .expect("cli runs");
    assert_eq!(output.status.code(), Some(2));

    let json = json_output(&output);
    assert_eq!(json["success"], false);
    assert_eq!(json["error"]["code"], "invalid_signature");
}

#[test]
fn cli_sign_requires_key_env() {
    let doc = TempDocument::new("no-key", TRANSFER_ORDER_JSON);
    let output = cli()
        .args(["--json", "sign", "--typed-data", doc.path()])
        .output()
        .expect("cli runs");

    assert_eq!(output.status.code(), Some(2));
    assert_eq!(json_output(&output)["error"]["code"], "invalid_private_key");
}

#[test]
fn cli_reports_missing_field() {
    let broken = TRANSFER_ORDER_JSON.replace(r#""timestamp": 1690815265"#, r#""stamp": 1690815265"#);
    let doc = TempDocument::new("missing-field", &broken);

    let output = cli()
        .args(["--json", "digest", "--typed-data", doc.path()])
        .output()
        .expect("cli runs");
    assert_eq!(output.status.code(), Some(2));

    let json = json_output(&output);
    assert_eq!(json["error"]["code"], "missing_field");
    assert!(json["error"]["message"].as_str().unwrap().contains("TransferOrder.timestamp"));
}

#[test]
fn cli_keygen_emits_consistent_key() {
    let output = cli().args(["--json", "keygen"]).output().expect("cli runs");
    assert!(output.status.success());

    let json = json_output(&output);
    let private_key = json["data"]["privateKey"].as_str().expect("private key");
    let address = json["data"]["address"].as_str().expect("address");

    let signer = LocalKeySigner::from_hex(private_key).expect("key parses");
    assert_eq!(signer.address().to_string(), address);

    // The key goes to stdout only
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("INFO [cli] key generated"), "stderr: {}", stderr);
    assert!(!stderr.contains(private_key));
}
