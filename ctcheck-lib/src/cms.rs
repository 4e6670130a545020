//! CMS SignedData envelopes (RFC 5652) wrapping a certificate.
//!
//! Some submitters send their certificate inside a SignedData envelope
//! signed by a known key. [`SignedEnvelope`] checks who signed it and hands
//! back the encapsulated bytes. The payload itself is never trusted here.

use crate::{oid, Cert, CheckError};
use cms::content_info::ContentInfo;
use cms::signed_data::{SignedAttributes, SignedData, SignerIdentifier, SignerInfo};
use der::asn1::{ObjectIdentifier, OctetString};
use der::{Decode, Encode};
use digest::Digest;
use ring::signature::{self, UnparsedPublicKey};

fn der_error(context: &str, e: der::Error) -> CheckError {
    CheckError::Der(format!("{}: {}", context, e))
}

/// Digest algorithms accepted for CMS signer infos.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DigestAlgorithm {
    Sha1,
    Sha256,
    Sha384,
    Sha512,
}

impl DigestAlgorithm {
    fn from_oid(oid_str: &str) -> Option<Self> {
        match oid_str {
            oid::DIGEST_SHA1 => Some(Self::Sha1),
            oid::DIGEST_SHA256 => Some(Self::Sha256),
            oid::DIGEST_SHA384 => Some(Self::Sha384),
            oid::DIGEST_SHA512 => Some(Self::Sha512),
            _ => None,
        }
    }

    fn digest(self, data: &[u8]) -> Vec<u8> {
        match self {
            Self::Sha1 => sha1::Sha1::digest(data).to_vec(),
            Self::Sha256 => sha2::Sha256::digest(data).to_vec(),
            Self::Sha384 => sha2::Sha384::digest(data).to_vec(),
            Self::Sha512 => sha2::Sha512::digest(data).to_vec(),
        }
    }
}

/// A parsed CMS ContentInfo whose content is SignedData.
#[derive(Debug, Clone)]
pub struct SignedEnvelope {
    signed_data: SignedData,
}

impl SignedEnvelope {
    /// Parse a DER ContentInfo. Content types other than signed-data are
    /// rejected.
    pub fn from_der(der: &[u8]) -> Result<Self, CheckError> {
        let content_info =
            ContentInfo::from_der(der).map_err(|e| der_error("bad CMS ContentInfo", e))?;
        let content_type = content_info.content_type.to_string();
        if content_type != oid::CMS_SIGNED_DATA {
            return Err(CheckError::InvalidArgument(format!(
                "CMS content type {} is not signed-data",
                content_type
            )));
        }

        let signed_data_bytes = content_info
            .content
            .to_der()
            .map_err(|e| der_error("bad CMS content", e))?;
        let signed_data = SignedData::from_der(&signed_data_bytes)
            .map_err(|e| der_error("bad CMS SignedData", e))?;
        Ok(SignedEnvelope { signed_data })
    }

    /// Number of SignerInfo entries.
    pub fn signer_count(&self) -> usize {
        self.signed_data.signer_infos.0.len()
    }

    /// Type of the encapsulated content, as a dotted OID.
    pub fn payload_type(&self) -> String {
        self.signed_data.encap_content_info.econtent_type.to_string()
    }

    /// The encapsulated content octets.
    ///
    /// Fails for detached signatures, which carry no content.
    pub fn payload(&self) -> Result<Vec<u8>, CheckError> {
        let econtent = self
            .signed_data
            .encap_content_info
            .econtent
            .as_ref()
            .ok_or_else(|| {
                CheckError::InvalidArgument("CMS envelope has no encapsulated content".into())
            })?;
        let encoded = econtent
            .to_der()
            .map_err(|e| der_error("bad encapsulated content", e))?;
        let octets = OctetString::from_der(&encoded)
            .map_err(|e| der_error("encapsulated content is not an OCTET STRING", e))?;
        Ok(octets.as_bytes().to_vec())
    }

    /// Whether `cert` is a declared signer and its signature verifies.
    ///
    /// `Ok(false)` covers a signer that is not `cert` as well as a signature
    /// or message digest that does not match. An envelope without signer
    /// information, or one using algorithms that cannot be verified, is an
    /// error.
    pub fn is_signed_by(&self, cert: &Cert) -> Result<bool, CheckError> {
        let signer_infos = &self.signed_data.signer_infos.0;
        if signer_infos.is_empty() {
            return Err(CheckError::InvalidArgument(
                "CMS envelope has no signer information".into(),
            ));
        }

        let mut signer = None;
        for info in signer_infos.iter() {
            if signer_matches(info, cert)? {
                signer = Some(info);
                break;
            }
        }
        let Some(signer) = signer else {
            log::debug!("{} is not a signer of the CMS envelope", cert.subject_name());
            return Ok(false);
        };

        let content = self.payload()?;
        let digest_oid = signer.digest_alg.oid.to_string();
        let digest_alg = DigestAlgorithm::from_oid(&digest_oid).ok_or_else(|| {
            CheckError::InvalidArgument(format!("unsupported CMS digest algorithm {}", digest_oid))
        })?;

        let signed_bytes = match &signer.signed_attrs {
            Some(attrs) => {
                if !self.content_type_matches(attrs)? {
                    log::debug!("CMS content-type attribute does not match the content");
                    return Ok(false);
                }
                if message_digest(attrs)? != digest_alg.digest(&content) {
                    log::debug!("CMS message digest does not match the content");
                    return Ok(false);
                }
                attrs
                    .to_der()
                    .map_err(|e| der_error("bad signed attributes", e))?
            }
            None => content,
        };

        verify_signer_signature(signer, digest_alg, cert, &signed_bytes)
    }

    /// Verify the envelope against `cert` and parse the payload as a
    /// certificate.
    pub fn unpack_certificate(&self, cert: &Cert) -> Result<Cert, CheckError> {
        if !self.is_signed_by(cert)? {
            return Err(CheckError::InvalidArgument(format!(
                "CMS envelope is not signed by {}",
                cert.subject_name()
            )));
        }
        Cert::from_der(&self.payload()?)
    }

    fn content_type_matches(&self, attrs: &SignedAttributes) -> Result<bool, CheckError> {
        let expected = self.payload_type();
        for attr in attrs.iter() {
            if attr.oid.to_string() != oid::CMS_ATTR_CONTENT_TYPE {
                continue;
            }
            let Some(value) = attr.values.iter().next() else {
                return Ok(false);
            };
            let encoded = value
                .to_der()
                .map_err(|e| der_error("bad content-type attribute", e))?;
            let declared = ObjectIdentifier::from_der(&encoded)
                .map_err(|e| der_error("content-type attribute is not an OID", e))?;
            return Ok(declared.to_string() == expected);
        }
        // A signer with signed attributes must declare the content type.
        Ok(false)
    }
}

/// Whether the SignerInfo identifies `cert`.
fn signer_matches(info: &SignerInfo, cert: &Cert) -> Result<bool, CheckError> {
    match &info.sid {
        SignerIdentifier::IssuerAndSerialNumber(issuer_and_serial) => {
            let issuer = issuer_and_serial
                .issuer
                .to_der()
                .map_err(|e| der_error("bad signer issuer", e))?;
            if issuer != cert.issuer_der() {
                return Ok(false);
            }
            let serial = cert.raw_serial()?;
            Ok(strip_leading_zeros(issuer_and_serial.serial_number.as_bytes())
                == strip_leading_zeros(&serial))
        }
        SignerIdentifier::SubjectKeyIdentifier(ski) => {
            Ok(cert.subject_key_identifier()?.as_deref() == Some(ski.0.as_bytes()))
        }
    }
}

fn strip_leading_zeros(bytes: &[u8]) -> &[u8] {
    let start = bytes.iter().position(|b| *b != 0).unwrap_or(bytes.len());
    bytes.get(start..).unwrap_or_default()
}

/// The messageDigest signed attribute.
fn message_digest(attrs: &SignedAttributes) -> Result<Vec<u8>, CheckError> {
    for attr in attrs.iter() {
        if attr.oid.to_string() != oid::CMS_ATTR_MESSAGE_DIGEST {
            continue;
        }
        let value = attr.values.iter().next().ok_or_else(|| {
            CheckError::InvalidArgument("empty message digest attribute".into())
        })?;
        let encoded = value
            .to_der()
            .map_err(|e| der_error("bad message digest attribute", e))?;
        let octets = OctetString::from_der(&encoded)
            .map_err(|e| der_error("message digest is not an OCTET STRING", e))?;
        return Ok(octets.as_bytes().to_vec());
    }
    Err(CheckError::InvalidArgument(
        "signed attributes lack a message digest".into(),
    ))
}

/// Check the SignerInfo signature over `signed_bytes` with `cert`'s key.
fn verify_signer_signature(
    info: &SignerInfo,
    digest_alg: DigestAlgorithm,
    cert: &Cert,
    signed_bytes: &[u8],
) -> Result<bool, CheckError> {
    let x509 = cert.x509()?;
    let spki = x509.public_key();
    let curve = spki
        .algorithm
        .parameters
        .as_ref()
        .and_then(|p| p.as_oid().ok())
        .map(|o| o.to_id_string());
    let sig_oid = info.signature_algorithm.oid.to_string();

    let Some(ring_algo) = verification_algorithm(&sig_oid, digest_alg, curve.as_deref()) else {
        return Err(CheckError::InvalidArgument(format!(
            "unsupported CMS signature algorithm {} with digest {:?}",
            sig_oid, digest_alg
        )));
    };

    log::trace!("verifying CMS signature with {}", sig_oid);
    let key_bytes: &[u8] = &spki.subject_public_key.data;
    let key = UnparsedPublicKey::new(ring_algo, key_bytes);
    match key.verify(signed_bytes, info.signature.as_bytes()) {
        Ok(()) => Ok(true),
        Err(_) => {
            log::debug!("CMS signature does not verify with {}", cert.subject_name());
            Ok(false)
        }
    }
}

/// Map a SignerInfo signature algorithm onto a ring verifier.
///
/// RSA signers commonly declare plain rsaEncryption and leave the hash to
/// the digest algorithm field. EC verifiers depend on the signer's curve.
fn verification_algorithm(
    sig_oid: &str,
    digest_alg: DigestAlgorithm,
    curve: Option<&str>,
) -> Option<&'static dyn signature::VerificationAlgorithm> {
    use DigestAlgorithm::*;

    let rsa = |d: DigestAlgorithm| -> &'static dyn signature::VerificationAlgorithm {
        match d {
            Sha1 => &signature::RSA_PKCS1_2048_8192_SHA1_FOR_LEGACY_USE_ONLY,
            Sha256 => &signature::RSA_PKCS1_2048_8192_SHA256,
            Sha384 => &signature::RSA_PKCS1_2048_8192_SHA384,
            Sha512 => &signature::RSA_PKCS1_2048_8192_SHA512,
        }
    };
    let ecdsa = |d: DigestAlgorithm| -> Option<&'static dyn signature::VerificationAlgorithm> {
        match (curve?, d) {
            (oid::CURVE_P256, Sha256) => Some(&signature::ECDSA_P256_SHA256_ASN1),
            (oid::CURVE_P256, Sha384) => Some(&signature::ECDSA_P256_SHA384_ASN1),
            (oid::CURVE_P384, Sha256) => Some(&signature::ECDSA_P384_SHA256_ASN1),
            (oid::CURVE_P384, Sha384) => Some(&signature::ECDSA_P384_SHA384_ASN1),
            _ => None,
        }
    };

    match sig_oid {
        oid::RSA_ENCRYPTION => Some(rsa(digest_alg)),
        oid::SHA1_WITH_RSA => Some(rsa(Sha1)),
        oid::SHA256_WITH_RSA => Some(rsa(Sha256)),
        oid::SHA384_WITH_RSA => Some(rsa(Sha384)),
        oid::SHA512_WITH_RSA => Some(rsa(Sha512)),
        oid::EC_PUBLIC_KEY => ecdsa(digest_alg),
        oid::ECDSA_WITH_SHA256 => ecdsa(Sha256),
        oid::ECDSA_WITH_SHA384 => ecdsa(Sha384),
        oid::ED25519 => Some(&signature::ED25519),
        _ => None,
    }
}
