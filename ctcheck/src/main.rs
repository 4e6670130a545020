//! ctcheck: check certificate chains the way a Certificate Transparency log
//! does before accepting a submission.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use ctcheck_lib::{
    Cert, CertChain, CertChecker, ChainKind, CheckError, CheckReport, SharedCertChecker,
    SignedEnvelope,
};
use rayon::prelude::*;
use std::io::Read;
use std::path::{Path, PathBuf};

/// Maximum input size (10 MiB). Chains and CMS envelopes are far smaller.
const MAX_INPUT_BYTES: u64 = 10 * 1024 * 1024;

#[derive(Parser)]
#[command(
    name = "ctcheck",
    about = "Check certificate chains for submission to a Certificate Transparency log",
    long_about = "ctcheck checks that every certificate in a chain is signed by the next\n\
                  one and that the chain ends at a trusted root. Validity dates,\n\
                  revocation and policy are deliberately not checked.\n\n\
                  Set RUST_LOG=debug to see why a chain was rejected.",
    after_help = "EXAMPLES:\n\
                  \n  ctcheck check --roots roots.pem chain.pem\
                  \n  ctcheck check --roots roots.pem --precert --json precert-chain.pem\
                  \n  ctcheck signed-by --signer ca.pem envelope.der\
                  \n  ctcheck unpack --signer ca.pem --out cert.pem envelope.der\
                  \n  ctcheck roots roots.pem more-roots.pem"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check PEM chains against trusted roots (exit 0 = all accepted, 1 = any rejected)
    #[command(after_help = "Each CHAIN is a PEM file with the leaf first. Files are checked\n\
                      in parallel and reported in the order given.\n\
                      \nEXAMPLES:\n\
                      \n  ctcheck check --roots roots.pem chain.pem\
                      \n  ctcheck check --roots roots.pem --roots legacy.pem a.pem b.pem\
                      \n  ctcheck check --roots roots.pem --precert precert.pem")]
    Check {
        /// PEM chain files
        #[arg(required = true)]
        chains: Vec<PathBuf>,
        /// PEM file of trusted roots (repeatable)
        #[arg(long, required = true, value_name = "FILE")]
        roots: Vec<PathBuf>,
        /// Treat the chains as precertificate chains
        #[arg(long)]
        precert: bool,
        /// Output one JSON object per chain
        #[arg(long)]
        json: bool,
        /// Only print rejected chains
        #[arg(long)]
        failures_only: bool,
    },
    /// Report whether a DER CMS envelope was signed by a certificate
    SignedBy {
        /// DER CMS SignedData file. Reads from stdin if omitted.
        file: Option<PathBuf>,
        /// PEM certificate of the expected signer
        #[arg(long, value_name = "FILE")]
        signer: PathBuf,
    },
    /// Extract the certificate from a signed DER CMS envelope
    Unpack {
        /// DER CMS SignedData file. Reads from stdin if omitted.
        file: Option<PathBuf>,
        /// PEM certificate of the expected signer
        #[arg(long, value_name = "FILE")]
        signer: PathBuf,
        /// Write the unpacked certificate here as PEM
        #[arg(long, value_name = "FILE")]
        out: Option<PathBuf>,
    },
    /// Load trusted root files and list what was loaded
    Roots {
        /// PEM files of trusted roots
        #[arg(required = true)]
        files: Vec<PathBuf>,
        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },
}

fn read_input(file: Option<&PathBuf>) -> Result<Vec<u8>> {
    match file {
        Some(path) => {
            let meta = std::fs::metadata(path)
                .with_context(|| format!("Failed to stat file: {}", path.display()))?;
            if meta.len() > MAX_INPUT_BYTES {
                anyhow::bail!(
                    "File too large ({} bytes, max {} bytes): {}",
                    meta.len(),
                    MAX_INPUT_BYTES,
                    path.display()
                );
            }
            std::fs::read(path).with_context(|| format!("Failed to read file: {}", path.display()))
        }
        None => {
            let mut buf = Vec::new();
            std::io::stdin()
                .take(MAX_INPUT_BYTES)
                .read_to_end(&mut buf)
                .context("Failed to read from stdin")?;
            Ok(buf)
        }
    }
}

fn load_signer(path: &Path) -> Result<Cert> {
    let data = std::fs::read(path)
        .with_context(|| format!("Failed to read signer file: {}", path.display()))?;
    Cert::from_pem(&data).with_context(|| format!("Invalid signer certificate: {}", path.display()))
}

fn load_roots(files: &[PathBuf]) -> Result<SharedCertChecker> {
    let checker = SharedCertChecker::new(CertChecker::new());
    for path in files {
        let added = checker
            .load_trusted_certificates_from_file(path)
            .with_context(|| format!("Failed to load trusted roots: {}", path.display()))?;
        log::info!("{}: {} new root(s)", path.display(), added);
    }
    Ok(checker)
}

/// Check one chain file and describe the outcome.
fn check_file(checker: &SharedCertChecker, path: &Path, precert: bool) -> CheckReport {
    let label = path.display().to_string();
    let kind = if precert {
        ChainKind::Precert
    } else {
        ChainKind::Plain
    };

    let data = match std::fs::read(path) {
        Ok(d) => d,
        Err(e) => return CheckReport::rejected(&label, &CheckError::from(e)),
    };
    let chain = match CertChain::from_pem(kind, &data) {
        Ok(c) => c,
        Err(e) => return CheckReport::rejected(&label, &e),
    };

    let report = if precert {
        checker
            .check_precert_chain(chain)
            .and_then(|check| CheckReport::accepted_precert(&label, &check))
    } else {
        checker
            .check_cert_chain(chain)
            .and_then(|chain| CheckReport::accepted(&label, &chain))
    };
    report.unwrap_or_else(|e| CheckReport::rejected(&label, &e))
}

/// Check chain files in parallel, print the reports in input order.
///
/// Returns the number of rejected chains.
fn run_batch(
    checker: &SharedCertChecker,
    files: &[PathBuf],
    precert: bool,
    json: bool,
    failures_only: bool,
) -> Result<usize> {
    let reports: Vec<CheckReport> = files
        .par_iter()
        .map(|f| check_file(checker, f, precert))
        .collect();

    let mut failures = 0;
    for report in &reports {
        if !report.accepted {
            failures += 1;
        }
        if failures_only && report.accepted {
            continue;
        }
        if json {
            println!("{}", report.to_json()?);
        } else if report.accepted {
            println!("{}", report);
        } else {
            eprintln!("{}", report);
        }
    }
    Ok(failures)
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match &cli.command {
        Commands::Check {
            chains,
            roots,
            precert,
            json,
            failures_only,
        } => {
            let checker = load_roots(roots)?;
            let failures = run_batch(&checker, chains, *precert, *json, *failures_only)?;
            if failures > 0 {
                std::process::exit(1);
            }
        }
        Commands::SignedBy { file, signer } => {
            let input = read_input(file.as_ref())?;
            let signer = load_signer(signer)?;
            let envelope = SignedEnvelope::from_der(&input).context("Invalid CMS envelope")?;
            let signed = CertChecker::new()
                .is_cms_signed_by_cert(&envelope, &signer)
                .context("Cannot check CMS signature")?;
            println!("{}", signed);
            if !signed {
                std::process::exit(1);
            }
        }
        Commands::Unpack { file, signer, out } => {
            let input = read_input(file.as_ref())?;
            let signer = load_signer(signer)?;
            let Some(cert) =
                CertChecker::new().unpack_cms_signed_certificate_der(&input, &signer)
            else {
                eprintln!("no certificate signed by {}", signer.subject_name());
                std::process::exit(1);
            };

            println!("{}", cert.subject_name());
            if let Some(out) = out {
                std::fs::write(out, cert.to_pem())
                    .with_context(|| format!("Failed to write {}", out.display()))?;
            }
        }
        Commands::Roots { files, json } => {
            let checker = load_roots(files)?;
            for (i, cert) in checker.trusted_certificates().iter().enumerate() {
                if *json {
                    let entry = serde_json::json!({
                        "index": i,
                        "subject": cert.subject_name(),
                        "spki_sha256": hex::encode(cert.spki_sha256_digest()?),
                    });
                    println!("{}", entry);
                } else {
                    println!("{}: {}", i, cert.subject_name());
                }
            }
        }
    }

    Ok(())
}
