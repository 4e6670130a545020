//! PEM bundle splitting.

use crate::CheckError;
use x509_parser::pem::Pem;

/// Labels accepted as certificate blocks.
const CERTIFICATE_LABELS: &[&str] = &["CERTIFICATE", "TRUSTED CERTIFICATE", "X509 CERTIFICATE"];

/// Split concatenated PEM input into DER-encoded certificates.
///
/// Blocks with other labels (keys, parameters) are skipped. Unlike a
/// best-effort bundle reader, a damaged block anywhere in the input fails the
/// whole call: trust anchors and submissions are both all-or-nothing.
pub(crate) fn split_certificates(input: &[u8]) -> Result<Vec<Vec<u8>>, CheckError> {
    let mut certs = Vec::new();

    for pem_result in Pem::iter_from_buffer(input) {
        let pem = pem_result.map_err(|e| CheckError::Pem(format!("failed to parse PEM: {}", e)))?;
        if CERTIFICATE_LABELS.contains(&pem.label.as_str()) {
            certs.push(pem.contents);
        }
    }

    if certs.is_empty() {
        return Err(CheckError::Pem("no certificates found in PEM input".into()));
    }

    Ok(certs)
}

/// Encode DER bytes as a single PEM block with 64-character lines.
pub(crate) fn encode(label: &str, der: &[u8]) -> String {
    use base64::Engine;

    let encoded = base64::engine::general_purpose::STANDARD.encode(der);
    let body = encoded
        .as_bytes()
        .chunks(64)
        .filter_map(|c| std::str::from_utf8(c).ok())
        .collect::<Vec<_>>()
        .join("\n");
    format!("-----BEGIN {label}-----\n{body}\n-----END {label}-----\n")
}
