//! Reconstruction of the TBSCertificate a precertificate stands for.
//!
//! The log signs over the certificate the CA will eventually issue, so the
//! poison extension comes out. When a Precertificate Signing Certificate
//! signed the precert, the final certificate will be issued by that
//! certificate's parent: the issuer name and the Authority Key Identifier are
//! taken from the signing certificate (RFC 6962, section 3.1).

use crate::{oid, Cert, CheckError, CtExtensions};
use der::asn1::ObjectIdentifier;
use der::{Decode, Encode};
use x509_cert::ext::Extension;
use x509_cert::Certificate;

fn internal(context: &str, e: impl std::fmt::Display) -> CheckError {
    log::error!("{}: {}", context, e);
    CheckError::Internal(format!("{}: {}", context, e))
}

fn find_extension<'a>(exts: &'a [Extension], id: &ObjectIdentifier) -> Option<&'a Extension> {
    exts.iter().find(|e| &e.extn_id == id)
}

/// DER TBSCertificate of `precert` with the poison removed.
///
/// `signing_cert` is the Precertificate Signing Certificate, when one was
/// used.
pub(crate) fn reconstruct_tbs(
    precert: &Cert,
    signing_cert: Option<&Cert>,
    ext: &CtExtensions,
) -> Result<Vec<u8>, CheckError> {
    let poison_oid =
        ObjectIdentifier::new(ext.poison).map_err(|e| internal("bad poison OID", e))?;
    let aki_oid = ObjectIdentifier::new(oid::EXT_AUTHORITY_KEY_ID)
        .map_err(|e| internal("bad AKI OID", e))?;

    let cert = Certificate::from_der(precert.der())
        .map_err(|e| internal("failed to decode precertificate", e))?;
    let mut tbs = cert.tbs_certificate;

    let mut extensions = tbs.extensions.take().unwrap_or_default();
    let before = extensions.len();
    extensions.retain(|e| e.extn_id != poison_oid);
    if extensions.len() == before {
        return Err(CheckError::Internal(
            "poison extension not found in precertificate".into(),
        ));
    }

    if let Some(signer) = signing_cert {
        let signer = Certificate::from_der(signer.der())
            .map_err(|e| internal("failed to decode precert signing certificate", e))?;
        tbs.issuer = signer.tbs_certificate.issuer.clone();

        if let Some(aki) = extensions.iter_mut().find(|e| e.extn_id == aki_oid) {
            let signer_exts = signer.tbs_certificate.extensions.as_deref().unwrap_or_default();
            let signer_aki = find_extension(signer_exts, &aki_oid).ok_or_else(|| {
                CheckError::Internal(
                    "precert signing certificate has no authority key identifier".into(),
                )
            })?;
            aki.extn_value = signer_aki.extn_value.clone();
        }
    }

    tbs.extensions = if extensions.is_empty() {
        None
    } else {
        Some(extensions)
    };

    tbs.to_der()
        .map_err(|e| internal("failed to encode reconstructed TBSCertificate", e))
}
