//! Chain acceptance for certificate and precertificate submissions.
//!
//! Both entry points share the same two steps. The issuer walk checks that
//! every certificate in the submission is signed by the one after it. Root
//! resolution then makes sure the chain ends at a certificate in the trust
//! store. A self-signed final certificate is matched by identity. Anything
//! else gets its issuer looked up by name and verified against every
//! candidate in load order.

use crate::cms::SignedEnvelope;
use crate::{precert, Cert, CertChain, ChainKind, CheckError, CtExtensions, TrustStore};
use std::io::Read;
use std::path::Path;

/// Result of a successful precertificate chain check.
#[derive(Debug, Clone)]
pub struct PrecertCheck {
    /// The checked chain, ending at a trusted root.
    pub chain: CertChain,
    /// SHA-256 of the SubjectPublicKeyInfo of the CA that will issue the
    /// final certificate.
    pub issuer_key_hash: [u8; 32],
    /// DER TBSCertificate of the final certificate.
    pub tbs_certificate: Vec<u8>,
}

/// Checks submitted chains against a set of trusted roots.
#[derive(Debug, Default)]
pub struct CertChecker {
    trust_store: TrustStore,
    extensions: CtExtensions,
}

impl CertChecker {
    /// A checker with an empty trust store and the standard CT extensions.
    pub fn new() -> Self {
        Self::with_extensions(CtExtensions::STANDARD)
    }

    pub fn with_extensions(extensions: CtExtensions) -> Self {
        CertChecker {
            trust_store: TrustStore::new(),
            extensions,
        }
    }

    pub fn extensions(&self) -> &CtExtensions {
        &self.extensions
    }

    /// Add every certificate in a PEM file to the trust store, all or nothing.
    ///
    /// Returns the number of certificates that were not already trusted.
    pub fn load_trusted_certificates_from_file(
        &mut self,
        path: impl AsRef<Path>,
    ) -> Result<usize, CheckError> {
        self.trust_store.load_from_file(path.as_ref())
    }

    /// Add PEM certificates held in memory to the trust store, all or nothing.
    pub fn load_trusted_certificates<S: AsRef<str>>(
        &mut self,
        pems: &[S],
    ) -> Result<usize, CheckError> {
        self.trust_store.load_from_memory(pems)
    }

    pub fn clear_trusted_certificates(&mut self) {
        self.trust_store.clear();
        log::info!("cleared trusted certificates");
    }

    pub fn num_trusted_certificates(&self) -> usize {
        self.trust_store.len()
    }

    pub fn trusted_certificates(&self) -> &TrustStore {
        &self.trust_store
    }

    /// Check an ordinary certificate chain.
    ///
    /// On success the returned chain has repeated trailing roots removed and
    /// ends with the trust store's copy of its root, which is appended when
    /// the submission stopped short of it.
    ///
    /// Malformed submissions (wrong kind, broken signature links, non-CA
    /// issuers) are `InvalidArgument`. A chain that cannot be tied to any
    /// trusted root is `FailedPrecondition`.
    pub fn check_cert_chain(&self, mut chain: CertChain) -> Result<CertChain, CheckError> {
        let Some(leaf) = chain.leaf() else {
            return Err(CheckError::InvalidArgument(
                "certificate chain is empty".into(),
            ));
        };
        if chain.kind() != ChainKind::Plain {
            return Err(CheckError::InvalidArgument(
                "precertificate chain submitted as a certificate chain".into(),
            ));
        }
        if leaf.has_critical_extension(self.extensions.poison)? {
            return Err(CheckError::InvalidArgument(format!(
                "{} carries the precertificate poison",
                leaf.subject_name()
            )));
        }

        trim_repeated_roots(&mut chain);
        self.check_issuer_chain(&chain)?;
        self.resolve_trusted_root(chain)
    }

    /// Check a precertificate chain and derive what the log entry needs.
    ///
    /// The leaf must carry a critical poison extension. If element 1 is a
    /// Precertificate Signing Certificate, the issuing CA is element 2 and
    /// the reconstructed TBS takes its issuer name and Authority Key
    /// Identifier from the signing certificate.
    pub fn check_precert_chain(&self, mut chain: CertChain) -> Result<PrecertCheck, CheckError> {
        if !chain.is_loaded() {
            return Err(CheckError::InvalidArgument(
                "precertificate chain is empty".into(),
            ));
        }
        if chain.kind() != ChainKind::Precert {
            return Err(CheckError::InvalidArgument(
                "certificate chain submitted as a precertificate chain".into(),
            ));
        }
        if !chain.is_well_formed(&self.extensions)? {
            return Err(CheckError::InvalidArgument(
                "precertificate chain is not well formed".into(),
            ));
        }

        trim_repeated_roots(&mut chain);
        self.check_issuer_chain(&chain)?;
        let chain = self.resolve_trusted_root(chain)?;

        let uses_pre_issuer = chain.uses_precert_signing_certificate(&self.extensions)?;
        let issuer_index = if uses_pre_issuer { 2 } else { 1 };
        // A precertificate that is itself trusted has no issuing CA.
        let issuer = chain.cert_at(issuer_index).ok_or_else(|| {
            CheckError::InvalidArgument(format!(
                "precertificate chain has no issuing CA at position {}",
                issuer_index
            ))
        })?;
        let issuer_key_hash = issuer.spki_sha256_digest()?;

        let Some(leaf) = chain.leaf() else {
            return Err(CheckError::Internal("resolved chain lost its leaf".into()));
        };
        let signing_cert = if uses_pre_issuer {
            chain.precert_issuing_cert()
        } else {
            None
        };
        let tbs_certificate = precert::reconstruct_tbs(leaf, signing_cert, &self.extensions)?;

        log::debug!(
            "accepted precertificate {} issued by {}",
            leaf.subject_name(),
            issuer.subject_name()
        );
        Ok(PrecertCheck {
            chain,
            issuer_key_hash,
            tbs_certificate,
        })
    }

    /// Verify every link of the submitted chain.
    ///
    /// Each issuer must be named by its subject, must be a CA, and must have
    /// produced the subject's signature. Repeated roots must already be
    /// trimmed. A self-signed final certificate is exempt from the CA
    /// requirement here; root resolution only accepts it by identity with a
    /// trusted certificate.
    fn check_issuer_chain(&self, chain: &CertChain) -> Result<(), CheckError> {
        let certs = chain.certs();
        let last = certs.last();

        for pair in certs.windows(2) {
            let [subject, issuer] = pair else {
                continue;
            };

            if subject.issuer_der() != issuer.subject_der() {
                log::debug!(
                    "{} does not name {} as its issuer",
                    subject.subject_name(),
                    issuer.subject_name()
                );
                return Err(CheckError::InvalidArgument(
                    "chain is not a valid signature chain".into(),
                ));
            }

            let exempt = Some(issuer) == last && issuer.is_self_signed()?;
            if !exempt && !issuer.has_basic_constraint_ca_true()? {
                return Err(CheckError::InvalidArgument(format!(
                    "issuer {} is not a CA",
                    issuer.subject_name()
                )));
            }

            if !subject.is_signed_by(issuer)? {
                log::debug!(
                    "signature on {} does not verify with key of {}",
                    subject.subject_name(),
                    issuer.subject_name()
                );
                return Err(CheckError::InvalidArgument(
                    "chain is not a valid signature chain".into(),
                ));
            }
        }
        Ok(())
    }

    /// Make the chain end at a trusted certificate.
    fn resolve_trusted_root(&self, mut chain: CertChain) -> Result<CertChain, CheckError> {
        let Some(last) = chain.last_cert().cloned() else {
            return Err(CheckError::InvalidArgument(
                "certificate chain is empty".into(),
            ));
        };

        if last.is_self_signed()? {
            if let Some(root) = self
                .trust_store
                .lookup(last.subject_der())
                .iter()
                .find(|root| **root == last)
            {
                log::debug!("chain ends at trusted root {}", root.subject_name());
                chain.replace_last(root.clone());
                return Ok(chain);
            }
            log::debug!(
                "self-signed {} is not trusted, trying its issuer",
                last.subject_name()
            );
        }

        // From here `last` needs an issuer; if it also signed the certificate
        // before it, it must be a CA.
        if chain.len() > 1 && !last.has_basic_constraint_ca_true()? {
            return Err(CheckError::InvalidArgument(format!(
                "issuer {} is not a CA",
                last.subject_name()
            )));
        }

        let candidates = self.trust_store.lookup(last.issuer_der());
        if candidates.is_empty() {
            log::debug!("no trusted certificate issued {}", last.subject_name());
            return Err(CheckError::FailedPrecondition(
                "chain does not terminate in a trusted root".into(),
            ));
        }

        for candidate in candidates {
            if last.is_signed_by(candidate)? {
                log::debug!(
                    "{} is signed by trusted root {}",
                    last.subject_name(),
                    candidate.subject_name()
                );
                chain.push(candidate.clone());
                return Ok(chain);
            }
        }

        log::debug!(
            "none of {} trusted candidate(s) signed {}",
            candidates.len(),
            last.subject_name()
        );
        Err(CheckError::FailedPrecondition(
            "chain does not terminate in a trusted root".into(),
        ))
    }

    /// Whether `envelope` carries a valid signature by `cert`.
    ///
    /// Only the signer identity and the signature are checked, never the
    /// payload. An envelope without signer information is an error.
    pub fn is_cms_signed_by_cert(
        &self,
        envelope: &SignedEnvelope,
        cert: &Cert,
    ) -> Result<bool, CheckError> {
        envelope.is_signed_by(cert)
    }

    /// Read a DER CMS envelope, verify it was signed by `verify_cert` and
    /// parse the payload as a certificate.
    ///
    /// Every failure yields `None`. The reader is only read, never closed.
    pub fn unpack_cms_signed_certificate<R: Read>(
        &self,
        reader: &mut R,
        verify_cert: &Cert,
    ) -> Option<Cert> {
        let mut der = Vec::new();
        if let Err(e) = reader.read_to_end(&mut der) {
            log::debug!("failed to read CMS input: {}", e);
            return None;
        }
        self.unpack_cms_signed_certificate_der(&der, verify_cert)
    }

    /// [`CertChecker::unpack_cms_signed_certificate`] over a byte slice.
    pub fn unpack_cms_signed_certificate_der(&self, der: &[u8], verify_cert: &Cert) -> Option<Cert> {
        match SignedEnvelope::from_der(der).and_then(|env| env.unpack_certificate(verify_cert)) {
            Ok(cert) => Some(cert),
            Err(e) => {
                log::debug!("CMS unpack failed: {}", e);
                None
            }
        }
    }
}

/// Drop trailing copies of the final certificate so that a root appended
/// more than once is walked as a single root.
fn trim_repeated_roots(chain: &mut CertChain) {
    let trimmed = chain.trim_repeated_roots();
    if trimmed > 0 {
        log::debug!("dropped {} repeated root(s)", trimmed);
    }
}
