//! Submitted certificate chains.

use crate::{pem, Cert, CheckError, CtExtensions};

/// Which entry point a chain is meant for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainKind {
    /// An ordinary certificate chain.
    Plain,
    /// A precertificate chain: the leaf carries the CT poison extension.
    Precert,
}

/// An ordered certificate chain, leaf first.
///
/// Nothing about signing order is assumed on construction; that is what the
/// checker establishes.
#[derive(Debug, Clone)]
pub struct CertChain {
    kind: ChainKind,
    certs: Vec<Cert>,
}

impl CertChain {
    /// Parse concatenated PEM certificates into a chain of the given kind.
    pub fn from_pem(kind: ChainKind, input: &[u8]) -> Result<Self, CheckError> {
        let certs = pem::split_certificates(input)?
            .iter()
            .map(|der| Cert::from_der(der))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(CertChain { kind, certs })
    }

    /// Build a chain from already parsed certificates.
    pub fn from_certs(kind: ChainKind, certs: Vec<Cert>) -> Self {
        CertChain { kind, certs }
    }

    pub fn kind(&self) -> ChainKind {
        self.kind
    }

    /// Whether the chain holds at least one certificate.
    pub fn is_loaded(&self) -> bool {
        !self.certs.is_empty()
    }

    pub fn len(&self) -> usize {
        self.certs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.certs.is_empty()
    }

    pub fn cert_at(&self, index: usize) -> Option<&Cert> {
        self.certs.get(index)
    }

    pub fn leaf(&self) -> Option<&Cert> {
        self.certs.first()
    }

    pub fn last_cert(&self) -> Option<&Cert> {
        self.certs.last()
    }

    pub fn certs(&self) -> &[Cert] {
        &self.certs
    }

    pub fn push(&mut self, cert: Cert) {
        self.certs.push(cert);
    }

    pub fn into_certs(self) -> Vec<Cert> {
        self.certs
    }

    /// Swap the final certificate for `cert`. No-op on an empty chain.
    pub(crate) fn replace_last(&mut self, cert: Cert) {
        if let Some(last) = self.certs.last_mut() {
            *last = cert;
        }
    }

    /// Drop trailing certificates identical to the one before them.
    pub(crate) fn trim_repeated_roots(&mut self) -> usize {
        let mut removed = 0;
        while let [.., prev, last] = self.certs.as_slice() {
            if prev != last {
                break;
            }
            self.certs.pop();
            removed += 1;
        }
        removed
    }

    /// Whether element 1 is a Precertificate Signing Certificate.
    pub fn uses_precert_signing_certificate(
        &self,
        ext: &CtExtensions,
    ) -> Result<bool, CheckError> {
        match self.certs.get(1) {
            Some(cert) => cert.has_extended_key_usage(ext.precert_signing_eku),
            None => Ok(false),
        }
    }

    /// The certificate that signed the precertificate, if present.
    pub fn precert_issuing_cert(&self) -> Option<&Cert> {
        self.certs.get(1)
    }

    /// Structural rules for a precertificate chain.
    ///
    /// The leaf must carry the poison as a critical extension. If element 1 is
    /// a Precertificate Signing Certificate and the leaf has an Authority Key
    /// Identifier, the signing certificate must have one as well, since it is
    /// copied into the reconstructed TBS.
    pub fn is_well_formed(&self, ext: &CtExtensions) -> Result<bool, CheckError> {
        let Some(leaf) = self.certs.first() else {
            return Ok(false);
        };
        if !leaf.has_critical_extension(ext.poison)? {
            return Ok(false);
        }
        if !self.uses_precert_signing_certificate(ext)? {
            return Ok(true);
        }
        if !leaf.has_authority_key_identifier()? {
            return Ok(true);
        }
        match self.certs.get(1) {
            Some(signer) => signer.has_authority_key_identifier(),
            None => Ok(false),
        }
    }
}
