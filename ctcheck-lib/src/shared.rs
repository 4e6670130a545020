//! A [`CertChecker`] shared between threads.

use crate::{Cert, CertChain, CertChecker, CheckError, PrecertCheck, SignedEnvelope};
use parking_lot::RwLock;
use std::path::Path;
use std::sync::Arc;

/// Cloneable handle to one [`CertChecker`].
///
/// Loading and clearing roots take the write lock; checks only take the read
/// lock, so any number of chains can be checked in parallel between
/// reconfigurations.
#[derive(Debug, Clone, Default)]
pub struct SharedCertChecker {
    inner: Arc<RwLock<CertChecker>>,
}

impl SharedCertChecker {
    pub fn new(checker: CertChecker) -> Self {
        SharedCertChecker {
            inner: Arc::new(RwLock::new(checker)),
        }
    }

    pub fn load_trusted_certificates_from_file(
        &self,
        path: impl AsRef<Path>,
    ) -> Result<usize, CheckError> {
        self.inner.write().load_trusted_certificates_from_file(path)
    }

    pub fn load_trusted_certificates<S: AsRef<str>>(&self, pems: &[S]) -> Result<usize, CheckError> {
        self.inner.write().load_trusted_certificates(pems)
    }

    pub fn clear_trusted_certificates(&self) {
        self.inner.write().clear_trusted_certificates();
    }

    pub fn num_trusted_certificates(&self) -> usize {
        self.inner.read().num_trusted_certificates()
    }

    /// Snapshot of the trusted certificates, in load order.
    pub fn trusted_certificates(&self) -> Vec<Cert> {
        self.inner.read().trusted_certificates().iter().cloned().collect()
    }

    pub fn check_cert_chain(&self, chain: CertChain) -> Result<CertChain, CheckError> {
        self.inner.read().check_cert_chain(chain)
    }

    pub fn check_precert_chain(&self, chain: CertChain) -> Result<PrecertCheck, CheckError> {
        self.inner.read().check_precert_chain(chain)
    }

    pub fn is_cms_signed_by_cert(
        &self,
        envelope: &SignedEnvelope,
        cert: &Cert,
    ) -> Result<bool, CheckError> {
        self.inner.read().is_cms_signed_by_cert(envelope, cert)
    }

    pub fn unpack_cms_signed_certificate_der(&self, der: &[u8], verify_cert: &Cert) -> Option<Cert> {
        self.inner.read().unpack_cms_signed_certificate_der(der, verify_cert)
    }
}
