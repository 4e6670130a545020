//! Human- and machine-readable summaries of a check.

use crate::{CertChain, CheckError, ErrorKind, PrecertCheck};
use serde::Serialize;
use sha2::{Digest, Sha256};

/// Outcome of checking one submission.
#[derive(Debug, Clone, Serialize)]
pub struct CheckReport {
    /// Where the submission came from (usually a file name).
    pub source: String,
    /// Whether the chain was accepted.
    pub accepted: bool,
    /// `invalid_argument`, `failed_precondition` or `internal` on failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// The resolved chain, leaf first. Empty on failure.
    pub chain: Vec<ChainCertInfo>,
    /// Hex SHA-256 of the issuing CA's key, for precertificates.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issuer_key_hash: Option<String>,
}

/// A certificate in a resolved chain.
#[derive(Debug, Clone, Serialize)]
pub struct ChainCertInfo {
    /// Position in chain (0 = leaf).
    pub depth: usize,
    pub subject: String,
    pub issuer: String,
    pub signature_algorithm: String,
    /// SHA-256 of the DER certificate as colon-separated uppercase hex.
    pub fingerprint: String,
}

impl CheckReport {
    /// Report for an accepted certificate chain.
    pub fn accepted(source: &str, chain: &CertChain) -> Result<Self, CheckError> {
        Ok(CheckReport {
            source: source.to_string(),
            accepted: true,
            error_kind: None,
            error: None,
            chain: describe_chain(chain)?,
            issuer_key_hash: None,
        })
    }

    /// Report for an accepted precertificate chain.
    pub fn accepted_precert(source: &str, check: &PrecertCheck) -> Result<Self, CheckError> {
        let mut report = Self::accepted(source, &check.chain)?;
        report.issuer_key_hash = Some(hex::encode(check.issuer_key_hash));
        Ok(report)
    }

    /// Report for a rejected submission.
    pub fn rejected(source: &str, error: &CheckError) -> Self {
        let kind = match error.kind() {
            ErrorKind::InvalidArgument => "invalid_argument",
            ErrorKind::FailedPrecondition => "failed_precondition",
            ErrorKind::Internal => "internal",
        };
        CheckReport {
            source: source.to_string(),
            accepted: false,
            error_kind: Some(kind.to_string()),
            error: Some(error.to_string()),
            chain: Vec::new(),
            issuer_key_hash: None,
        }
    }

    pub fn to_json(&self) -> Result<String, CheckError> {
        serde_json::to_string(self)
            .map_err(|e| CheckError::Internal(format!("failed to serialize report: {}", e)))
    }
}

impl std::fmt::Display for CheckReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Format: [source]: [OK/FAIL], [leaf subject or reason]
        write!(f, "{}: ", self.source)?;
        if self.accepted {
            write!(f, "OK")?;
            if let Some(leaf) = self.chain.first() {
                write!(f, ", {}", leaf.subject)?;
            }
            if let Some(root) = self.chain.last() {
                write!(f, " -> {}", root.subject)?;
            }
        } else {
            write!(f, "FAIL")?;
            if let Some(error) = &self.error {
                write!(f, ", {}", error)?;
            }
        }
        Ok(())
    }
}

fn describe_chain(chain: &CertChain) -> Result<Vec<ChainCertInfo>, CheckError> {
    chain
        .certs()
        .iter()
        .enumerate()
        .map(|(depth, cert)| {
            Ok(ChainCertInfo {
                depth,
                subject: cert.subject_name().to_string(),
                issuer: cert.issuer_name()?,
                signature_algorithm: cert.signature_algorithm_name()?,
                fingerprint: hex_colon_upper(&Sha256::digest(cert.der())),
            })
        })
        .collect()
}

/// Format bytes as colon-separated uppercase hex (e.g., "AB:CD:EF").
fn hex_colon_upper(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{:02X}", b))
        .collect::<Vec<_>>()
        .join(":")
}
