//! A parsed X.509 certificate handle.
//!
//! [`Cert`] owns the DER bytes behind an [`Arc`], so chains and the trust
//! store can share one certificate without copying it. Anything beyond the
//! The fields the chain checks consult on every link are extracted once at
//! parse time. Signatures and anything else are read by re-parsing those
//! bytes with `x509-parser` on demand.

use crate::{oid, pem, CheckError};
use sha2::{Digest, Sha256};
use std::fmt;
use std::sync::Arc;
use x509_parser::error::X509Error;
use x509_parser::prelude::*;

/// One parsed X.509 certificate.
///
/// Equality is byte-for-byte equality of the DER encoding.
#[derive(Clone)]
pub struct Cert {
    inner: Arc<CertData>,
}

struct CertData {
    der: Vec<u8>,
    subject: Vec<u8>,
    issuer: Vec<u8>,
    subject_name: String,
    /// (OID, critical) for every extension, in certificate order.
    extensions: Vec<(String, bool)>,
    /// `cA` from basic constraints, or why the extension could not be read.
    ca: Result<bool, String>,
    /// Extended key usage purposes, or why the extension could not be read.
    eku: Result<Vec<String>, String>,
    subject_key_id: Option<Vec<u8>>,
    self_signed: bool,
}

impl Cert {
    /// Parse a single DER-encoded certificate. Trailing bytes are rejected.
    pub fn from_der(der: &[u8]) -> Result<Self, CheckError> {
        let (rem, x509) =
            X509Certificate::from_der(der).map_err(|e| CheckError::Der(format!("{}", e)))?;
        if !rem.is_empty() {
            return Err(CheckError::Der(format!(
                "{} trailing byte(s) after certificate",
                rem.len()
            )));
        }

        let subject = x509.subject().as_raw().to_vec();
        let issuer = x509.issuer().as_raw().to_vec();
        let subject_key_id = subject_key_id(&x509).map(<[u8]>::to_vec);
        let self_signed = subject == issuer
            && match (authority_key_id(&x509), subject_key_id.as_deref()) {
                (Some(aki), Some(ski)) => aki == ski,
                _ => true,
            };
        let ca = x509
            .basic_constraints()
            .map(|bc| bc.is_some_and(|bc| bc.value.ca))
            .map_err(|e| e.to_string());
        let eku = x509
            .extended_key_usage()
            .map(|eku| {
                eku.map(|eku| eku.value.other.iter().map(|o| o.to_id_string()).collect())
                    .unwrap_or_default()
            })
            .map_err(|e| e.to_string());

        let data = CertData {
            der: der.to_vec(),
            subject,
            issuer,
            subject_name: x509.subject().to_string(),
            extensions: x509
                .extensions()
                .iter()
                .map(|ext| (ext.oid.to_id_string(), ext.critical))
                .collect(),
            ca,
            eku,
            subject_key_id,
            self_signed,
        };
        Ok(Cert {
            inner: Arc::new(data),
        })
    }

    /// Parse exactly one PEM-encoded certificate.
    pub fn from_pem(input: &[u8]) -> Result<Self, CheckError> {
        let ders = pem::split_certificates(input)?;
        match ders.as_slice() {
            [der] => Self::from_der(der),
            _ => Err(CheckError::Pem(format!(
                "expected a single certificate, found {}",
                ders.len()
            ))),
        }
    }

    pub fn der(&self) -> &[u8] {
        &self.inner.der
    }

    /// DER encoding of the subject name.
    pub fn subject_der(&self) -> &[u8] {
        &self.inner.subject
    }

    /// DER encoding of the issuer name.
    pub fn issuer_der(&self) -> &[u8] {
        &self.inner.issuer
    }

    /// Subject name in one-line form, for messages and reports.
    pub fn subject_name(&self) -> &str {
        &self.inner.subject_name
    }

    /// PEM encoding of this certificate.
    pub fn to_pem(&self) -> String {
        pem::encode("CERTIFICATE", &self.inner.der)
    }

    /// Borrow a full parse of the certificate.
    ///
    /// The bytes were accepted by [`Cert::from_der`], so a failure here is
    /// not the submitter's fault.
    pub(crate) fn x509(&self) -> Result<X509Certificate<'_>, CheckError> {
        X509Certificate::from_der(&self.inner.der)
            .map(|(_, x509)| x509)
            .map_err(|e| {
                log::error!("re-parse of {} failed: {}", self.subject_name(), e);
                CheckError::Internal(format!("failed to re-parse certificate: {}", e))
            })
    }

    /// Issuer name in one-line form.
    pub fn issuer_name(&self) -> Result<String, CheckError> {
        Ok(self.x509()?.issuer().to_string())
    }

    /// Serial number as the content octets of the DER INTEGER.
    pub fn raw_serial(&self) -> Result<Vec<u8>, CheckError> {
        Ok(self.x509()?.raw_serial().to_vec())
    }

    /// Name of the algorithm the issuer used to sign this certificate.
    pub fn signature_algorithm_name(&self) -> Result<String, CheckError> {
        let x509 = self.x509()?;
        let oid_str = x509.signature_algorithm.algorithm.to_id_string();
        Ok(match oid_str.as_str() {
            oid::MD2_WITH_RSA => "md2WithRSAEncryption".into(),
            oid::MD5_WITH_RSA => "md5WithRSAEncryption".into(),
            oid::SHA1_WITH_RSA => "sha1WithRSAEncryption".into(),
            oid::SHA256_WITH_RSA => "sha256WithRSAEncryption".into(),
            oid::SHA384_WITH_RSA => "sha384WithRSAEncryption".into(),
            oid::SHA512_WITH_RSA => "sha512WithRSAEncryption".into(),
            oid::RSA_PSS => "rsassaPss".into(),
            oid::ECDSA_WITH_SHA1 => "ecdsa-with-SHA1".into(),
            oid::ECDSA_WITH_SHA256 => "ecdsa-with-SHA256".into(),
            oid::ECDSA_WITH_SHA384 => "ecdsa-with-SHA384".into(),
            oid::ECDSA_WITH_SHA512 => "ecdsa-with-SHA512".into(),
            oid::ED25519 => "Ed25519".into(),
            _ => oid_str,
        })
    }

    /// Subject equals issuer, and the key identifiers agree where both exist.
    ///
    /// The signature is not checked: legacy roots signed with digests the
    /// verifier refuses must still be recognized as roots.
    pub fn is_self_signed(&self) -> Result<bool, CheckError> {
        Ok(self.inner.self_signed)
    }

    /// Whether basic constraints are present with `cA` set.
    pub fn has_basic_constraint_ca_true(&self) -> Result<bool, CheckError> {
        self.inner.ca.clone().map_err(|e| {
            CheckError::InvalidArgument(format!(
                "bad basic constraints in {}: {}",
                self.subject_name(),
                e
            ))
        })
    }

    /// Whether an extension with the given OID is present.
    pub fn has_extension(&self, oid_str: &str) -> Result<bool, CheckError> {
        Ok(self.inner.extensions.iter().any(|(oid, _)| oid == oid_str))
    }

    /// Whether an extension with the given OID is present and marked critical.
    pub fn has_critical_extension(&self, oid_str: &str) -> Result<bool, CheckError> {
        Ok(self
            .inner
            .extensions
            .iter()
            .any(|(oid, critical)| *critical && oid == oid_str))
    }

    /// Whether the extended key usage extension lists the given purpose.
    pub fn has_extended_key_usage(&self, oid_str: &str) -> Result<bool, CheckError> {
        match &self.inner.eku {
            Ok(purposes) => Ok(purposes.iter().any(|p| p == oid_str)),
            Err(e) => Err(CheckError::InvalidArgument(format!(
                "bad extended key usage in {}: {}",
                self.subject_name(),
                e
            ))),
        }
    }

    pub fn has_authority_key_identifier(&self) -> Result<bool, CheckError> {
        self.has_extension(oid::EXT_AUTHORITY_KEY_ID)
    }

    pub fn subject_key_identifier(&self) -> Result<Option<Vec<u8>>, CheckError> {
        Ok(self.inner.subject_key_id.clone())
    }

    /// SHA-256 of the DER SubjectPublicKeyInfo.
    pub fn spki_sha256_digest(&self) -> Result<[u8; 32], CheckError> {
        let x509 = self.x509()?;
        Ok(Sha256::digest(x509.public_key().raw).into())
    }

    /// Check that `issuer`'s key produced this certificate's signature.
    ///
    /// `Ok(false)` means the signature does not verify. An algorithm the
    /// verifier does not implement (MD2, MD5 and friends) is an error: such a
    /// link can never be established cryptographically.
    pub fn is_signed_by(&self, issuer: &Cert) -> Result<bool, CheckError> {
        let child = self.x509()?;
        let parent = issuer.x509()?;
        match child.verify_signature(Some(parent.public_key())) {
            Ok(()) => Ok(true),
            Err(X509Error::SignatureUnsupportedAlgorithm) => {
                Err(CheckError::InvalidArgument(format!(
                    "unsupported signature algorithm {} on {}",
                    self.signature_algorithm_name()?,
                    self.subject_name()
                )))
            }
            Err(e) => {
                log::trace!(
                    "{} is not signed by {}: {}",
                    self.subject_name(),
                    issuer.subject_name(),
                    e
                );
                Ok(false)
            }
        }
    }
}

fn subject_key_id<'a>(x509: &X509Certificate<'a>) -> Option<&'a [u8]> {
    x509
        .extensions()
        .iter()
        .find_map(|ext| match ext.parsed_extension() {
            ParsedExtension::SubjectKeyIdentifier(kid) => Some(kid.0),
            _ => None,
        })
}

fn authority_key_id<'a>(x509: &X509Certificate<'a>) -> Option<&'a [u8]> {
    x509
        .extensions()
        .iter()
        .find_map(|ext| match ext.parsed_extension() {
            ParsedExtension::AuthorityKeyIdentifier(aki) => {
                aki.key_identifier.as_ref().map(|kid| kid.0)
            }
            _ => None,
        })
}

impl PartialEq for Cert {
    fn eq(&self, other: &Self) -> bool {
        self.inner.der == other.inner.der
    }
}

impl Eq for Cert {}

impl fmt::Debug for Cert {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cert")
            .field("subject", &self.inner.subject_name)
            .field("len", &self.inner.der.len())
            .finish()
    }
}
