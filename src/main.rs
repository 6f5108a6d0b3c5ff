//! `eip712-verifier` command-line tool
//!
//! Computes digests for typed-data documents, signs them with a key taken
//! from the environment, and recovers or verifies signers.
//!
//! Exit codes: 0 on success, 1 when `verify` finds a different signer,
//! 2 on any error.

use clap::{Parser, Subcommand};
use serde::Serialize;
use std::env;
use std::fmt::Display;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use subtle::ConstantTimeEq;
use zeroize::Zeroizing;

use eip712_verifier::eip712::{sign_with_scheme, LocalKeySigner, SigningOracle, TypedData};
use eip712_verifier::utils::{load_typed_data, logging};
use eip712_verifier::{
    log_debug, log_error, log_info, log_warn, Address, ApiResponse, DigestReport, KeygenReport,
    RecoverReport, SignReport, Signature, SignaturePolicy, SigningScheme, VerifierConfig,
    VerifierError, VerifierResult, VerifyReport,
};

const MODULE: &str = "cli";

#[derive(Parser, Debug)]
#[command(name = "eip712-verifier", author, version, about, long_about = None)]
struct Cli {
    /// Print results as a JSON envelope
    #[arg(long, global = true)]
    json: bool,

    /// Enable debug logging on stderr
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the domain separator, struct hash and digest of a document
    Digest {
        /// Typed-data JSON file (`-` for stdin)
        #[arg(long)]
        typed_data: PathBuf,
    },

    /// Sign a document with the key held in an environment variable
    Sign {
        /// Typed-data JSON file (`-` for stdin)
        #[arg(long)]
        typed_data: PathBuf,

        /// eip712 signs the digest; eth-sign signs it with the EIP-191 prefix
        #[arg(long, default_value_t = SigningScheme::Eip712)]
        scheme: SigningScheme,

        /// Environment variable holding the hex private key
        #[arg(long, default_value = "PRIVATE_KEY")]
        key_env: String,
    },

    /// Recover the signer of a document
    Recover {
        /// Typed-data JSON file (`-` for stdin)
        #[arg(long)]
        typed_data: PathBuf,

        /// 65-byte signature as hex (r || s || v)
        #[arg(long)]
        signature: String,

        #[arg(long, default_value_t = SigningScheme::Eip712)]
        scheme: SigningScheme,

        /// Accept signatures with s in the upper half of the curve order
        #[arg(long)]
        allow_high_s: bool,
    },

    /// Check that a document was signed by the expected address
    Verify {
        /// Typed-data JSON file (`-` for stdin)
        #[arg(long)]
        typed_data: PathBuf,

        /// 65-byte signature as hex (r || s || v)
        #[arg(long)]
        signature: String,

        /// Address the signature must recover to
        #[arg(long)]
        expected: String,

        #[arg(long, default_value_t = SigningScheme::Eip712)]
        scheme: SigningScheme,

        /// Accept signatures with s in the upper half of the curve order
        #[arg(long)]
        allow_high_s: bool,
    },

    /// Generate a fresh secp256k1 key
    Keygen,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    if cli.verbose {
        logging::enable_debug();
    }

    match cli.command {
        Command::Digest { typed_data } => emit(cli.json, digest(&typed_data)),
        Command::Sign {
            typed_data,
            scheme,
            key_env,
        } => emit(cli.json, sign(&typed_data, scheme, &key_env)),
        Command::Recover {
            typed_data,
            signature,
            scheme,
            allow_high_s,
        } => emit(
            cli.json,
            recover(&typed_data, &signature, config(scheme, allow_high_s)),
        ),
        Command::Verify {
            typed_data,
            signature,
            expected,
            scheme,
            allow_high_s,
        } => {
            let result = verify(&typed_data, &signature, &expected, config(scheme, allow_high_s));
            let mismatch = matches!(result, Ok(VerifyReport { valid: false, .. }));
            let code = emit(cli.json, result);
            if mismatch {
                ExitCode::from(1)
            } else {
                code
            }
        }
        Command::Keygen => emit(cli.json, Ok(keygen())),
    }
}

fn config(scheme: SigningScheme, allow_high_s: bool) -> VerifierConfig {
    let policy = if allow_high_s {
        SignaturePolicy::permissive()
    } else {
        SignaturePolicy::strict()
    };
    VerifierConfig::default().with_scheme(scheme).with_policy(policy)
}

/// Print a result and map it to an exit code
fn emit<T: Serialize + Display>(json: bool, result: VerifierResult<T>) -> ExitCode {
    match result {
        Ok(report) => {
            if json {
                println!("{}", ApiResponse::ok(report).to_json());
            } else {
                println!("{}", report);
            }
            ExitCode::SUCCESS
        }
        Err(error) => {
            if json {
                println!("{}", ApiResponse::<T>::err(error).to_json());
            } else {
                log_error!(MODULE, "command failed", code = format!("{:?}", error.code));
                eprintln!("Error: {}", error);
            }
            ExitCode::from(2)
        }
    }
}

fn load(path: &Path) -> VerifierResult<TypedData> {
    let typed_data = load_typed_data(path)?;
    log_debug!(
        MODULE,
        "typed data loaded",
        primary_type = typed_data.primary_type,
        domain_name = typed_data.domain.name,
    );
    Ok(typed_data)
}

fn digest(path: &Path) -> VerifierResult<DigestReport> {
    let typed_data = load(path)?;
    Ok(DigestReport {
        pre_image: typed_data.pre_image()?,
        primary_type: typed_data.primary_type,
    })
}

fn sign(path: &Path, scheme: SigningScheme, key_env: &str) -> VerifierResult<SignReport> {
    let typed_data = load(path)?;

    let key = Zeroizing::new(env::var(key_env).map_err(|_| {
        VerifierError::invalid_private_key(format!("environment variable {} is not set", key_env))
    })?);
    let signer = LocalKeySigner::from_hex(&key)
        .map_err(|e| VerifierError::invalid_private_key(e.to_string()))?;

    let digest = typed_data.digest()?;
    let signature = sign_with_scheme(&signer, &digest, scheme)?;
    log_info!(MODULE, "document signed", signer = signer.address(), scheme = scheme);

    Ok(SignReport {
        signer: signer.address(),
        scheme,
        signature,
    })
}

fn recover(path: &Path, signature: &str, config: VerifierConfig) -> VerifierResult<RecoverReport> {
    let typed_data = load(path)?;
    let signature: Signature = signature.parse()?;

    let verifier = typed_data.verifier()?.with_config(config);
    let signer = verifier.recover(&typed_data.primary_type, &typed_data.message()?, &signature)?;

    Ok(RecoverReport {
        signer,
        scheme: config.scheme,
    })
}

fn verify(
    path: &Path,
    signature: &str,
    expected: &str,
    config: VerifierConfig,
) -> VerifierResult<VerifyReport> {
    let typed_data = load(path)?;
    let signature: Signature = signature.parse()?;
    let expected: Address = expected.parse()?;

    let verifier = typed_data.verifier()?.with_config(config);
    let message = typed_data.message()?;
    let recovered = verifier.recover(&typed_data.primary_type, &message, &signature)?;
    let valid: bool = recovered.ct_eq(&expected).into();
    if !valid {
        log_warn!(MODULE, "signer mismatch", expected = expected, recovered = recovered);
    }

    Ok(VerifyReport {
        valid,
        expected,
        recovered,
        scheme: config.scheme,
    })
}

fn keygen() -> KeygenReport {
    let signer = LocalKeySigner::random();
    log_info!(MODULE, "key generated", address = signer.address());
    KeygenReport {
        private_key: signer.secret_hex(),
        address: signer.address(),
    }
}
