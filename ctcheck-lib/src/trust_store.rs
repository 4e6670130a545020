//! The operator-controlled set of trusted roots.
//!
//! Certificates are indexed by the DER encoding of their subject name. One
//! name may map to several certificates (an "issuer collision"), kept in the
//! order they were loaded so that resolution is deterministic.

use crate::{pem, Cert, CheckError};
use std::collections::HashMap;
use std::path::Path;

/// A set of trusted certificates keyed by subject name.
pub struct TrustStore {
    /// Map from raw DER-encoded subject name to certificates, in load order.
    certs_by_subject: HashMap<Vec<u8>, Vec<Cert>>,
    /// Every certificate in load order, for listing.
    order: Vec<Cert>,
}

impl std::fmt::Debug for TrustStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrustStore")
            .field("count", &self.order.len())
            .finish()
    }
}

impl TrustStore {
    /// Create an empty trust store.
    pub fn new() -> Self {
        TrustStore {
            certs_by_subject: HashMap::new(),
            order: Vec::new(),
        }
    }

    /// Load every certificate from a PEM file.
    ///
    /// All or nothing: if the file cannot be read, holds no certificate, or
    /// any certificate block fails to parse, the store is left untouched.
    /// Returns how many certificates were new; duplicates are skipped.
    pub fn load_from_file(&mut self, path: &Path) -> Result<usize, CheckError> {
        let data = std::fs::read(path).map_err(|e| {
            CheckError::Io(std::io::Error::new(
                e.kind(),
                format!("{}: {}", path.display(), e),
            ))
        })?;
        self.load_pem_bundle(&data).map_err(|e| {
            log::warn!("rejected trusted certificates in {}: {}", path.display(), e);
            e
        })
    }

    /// Load certificates from in-memory PEM strings, all or nothing.
    pub fn load_from_memory<S: AsRef<str>>(&mut self, pems: &[S]) -> Result<usize, CheckError> {
        let mut joined = String::new();
        for pem in pems {
            joined.push_str(pem.as_ref());
            joined.push('\n');
        }
        self.load_pem_bundle(joined.as_bytes())
    }

    /// Parse a PEM bundle and add the certificates not already present.
    pub fn load_pem_bundle(&mut self, pem_data: &[u8]) -> Result<usize, CheckError> {
        let mut pending: Vec<Cert> = Vec::new();
        for der in pem::split_certificates(pem_data)? {
            let cert = Cert::from_der(&der)?;
            if !self.contains(&cert) && !pending.contains(&cert) {
                pending.push(cert);
            }
        }

        let added = pending.len();
        for cert in pending {
            self.insert(cert);
        }
        log::info!(
            "added {} new trusted certificate(s), {} total",
            added,
            self.len()
        );
        Ok(added)
    }

    /// Add one certificate. Returns `false` if an identical one is present.
    pub fn add(&mut self, cert: Cert) -> bool {
        if self.contains(&cert) {
            return false;
        }
        self.insert(cert);
        true
    }

    fn insert(&mut self, cert: Cert) {
        self.certs_by_subject
            .entry(cert.subject_der().to_vec())
            .or_default()
            .push(cert.clone());
        self.order.push(cert);
    }

    /// Remove every trusted certificate.
    pub fn clear(&mut self) {
        self.certs_by_subject.clear();
        self.order.clear();
    }

    /// All trusted certificates with the given DER-encoded subject, in load order.
    pub fn lookup(&self, subject_der: &[u8]) -> &[Cert] {
        self.certs_by_subject
            .get(subject_der)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Number of certificates in the store.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Check if a byte-identical certificate is in the store.
    pub fn contains(&self, cert: &Cert) -> bool {
        self.lookup(cert.subject_der()).contains(cert)
    }

    /// Trusted certificates in load order.
    pub fn iter(&self) -> impl Iterator<Item = &Cert> {
        self.order.iter()
    }
}

impl Default for TrustStore {
    fn default() -> Self {
        Self::new()
    }
}
