#![allow(
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::panic,
    clippy::indexing_slicing
)]
//! CMS SignedData envelopes produced by `openssl cms -sign` (see
//! `testdata/generate.sh`).
//!
//! - `cms_test2.der`: content that is not a certificate, signed by the CA.
//! - `cms_test3.der`: `cms-embedded-cert.pem`, signed by the CA.
//! - `cms_test4.der`: `cms-embedded-cert.pem`, signed by the intermediate.
//! - `cms_test5.der`: `cms-embedded-int-cert.pem`, signed by the intermediate.
//! - `cms_test6.der`: as 3, with the signer named by subject key identifier.

use cms::content_info::ContentInfo;
use cms::signed_data::SignedData;
use ctcheck_lib::*;
use der::asn1::SetOfVec;
use der::{Any, Decode, Encode};
use std::path::PathBuf;

fn testdata(name: &str) -> PathBuf {
    let mut p = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    p.pop(); // up from ctcheck-lib to workspace root
    p.push("testdata");
    p.push(name);
    p
}

fn read(name: &str) -> Vec<u8> {
    std::fs::read(testdata(name)).unwrap()
}

fn cert(name: &str) -> Cert {
    Cert::from_pem(&read(name)).unwrap()
}

fn envelope(name: &str) -> SignedEnvelope {
    SignedEnvelope::from_der(&read(name)).unwrap()
}

/// Re-encode an envelope with its SignerInfos emptied.
fn strip_signer_infos(der: &[u8]) -> Vec<u8> {
    let info = ContentInfo::from_der(der).unwrap();
    let mut signed = SignedData::from_der(&info.content.to_der().unwrap()).unwrap();
    signed.signer_infos.0 = SetOfVec::new();
    ContentInfo {
        content_type: info.content_type,
        content: Any::encode_from(&signed).unwrap(),
    }
    .to_der()
    .unwrap()
}

const EXPECTED_SUBJECT: &str = "?.example.com";

#[test]
fn test_envelope_structure() {
    let env = envelope("cms_test3.der");
    assert_eq!(env.signer_count(), 1);
    assert_eq!(env.payload_type(), "1.2.840.113549.1.7.1");
    assert_eq!(env.payload().unwrap(), cert("cms-embedded-cert.pem").der());
}

#[test]
fn test_signed_by_checks_signer_identity() {
    let checker = CertChecker::new();
    let ca = cert("ca-cert.pem");
    let intermediate = cert("intermediate-cert.pem");

    let env = envelope("cms_test3.der");
    assert!(checker.is_cms_signed_by_cert(&env, &ca).unwrap());
    assert!(!checker.is_cms_signed_by_cert(&env, &intermediate).unwrap());

    let env = envelope("cms_test4.der");
    assert!(checker.is_cms_signed_by_cert(&env, &intermediate).unwrap());
    assert!(!checker.is_cms_signed_by_cert(&env, &ca).unwrap());
}

#[test]
fn test_signed_by_does_not_look_at_payload() {
    let checker = CertChecker::new();
    let env = envelope("cms_test2.der");
    assert!(checker
        .is_cms_signed_by_cert(&env, &cert("ca-cert.pem"))
        .unwrap());
}

#[test]
fn test_signer_by_subject_key_identifier() {
    let checker = CertChecker::new();
    let env = envelope("cms_test6.der");
    assert!(checker
        .is_cms_signed_by_cert(&env, &cert("ca-cert.pem"))
        .unwrap());
    assert!(!checker
        .is_cms_signed_by_cert(&env, &cert("intermediate-cert.pem"))
        .unwrap());

    let unpacked = checker
        .unpack_cms_signed_certificate_der(&read("cms_test6.der"), &cert("ca-cert.pem"))
        .unwrap();
    assert_eq!(unpacked, cert("cms-embedded-cert.pem"));
}

#[test]
fn test_envelope_without_signers_is_an_error() {
    let checker = CertChecker::new();
    let ca = cert("ca-cert.pem");
    let der = strip_signer_infos(&read("cms_test3.der"));

    let env = SignedEnvelope::from_der(&der).unwrap();
    assert_eq!(env.signer_count(), 0);
    let err = checker.is_cms_signed_by_cert(&env, &ca).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    assert!(checker.unpack_cms_signed_certificate_der(&der, &ca).is_none());
}

#[test]
fn test_tampered_signature() {
    let checker = CertChecker::new();
    let mut der = read("cms_test3.der");
    let last = der.len() - 1;
    der[last] ^= 0x01;

    let env = SignedEnvelope::from_der(&der).unwrap();
    assert!(!checker
        .is_cms_signed_by_cert(&env, &cert("ca-cert.pem"))
        .unwrap());
    assert!(checker
        .unpack_cms_signed_certificate_der(&der, &cert("ca-cert.pem"))
        .is_none());
}

#[test]
fn test_unpack_non_certificate_payload() {
    let checker = CertChecker::new();
    assert!(checker
        .unpack_cms_signed_certificate_der(&read("cms_test2.der"), &cert("ca-cert.pem"))
        .is_none());
}

#[test]
fn test_unpack_valid_signature_right_cert() {
    let checker = CertChecker::new();
    let unpacked = checker
        .unpack_cms_signed_certificate_der(&read("cms_test3.der"), &cert("ca-cert.pem"))
        .unwrap();
    assert!(unpacked.subject_name().contains(EXPECTED_SUBJECT));
    assert_eq!(unpacked, cert("cms-embedded-cert.pem"));
}

#[test]
fn test_unpack_valid_signature_wrong_cert() {
    let checker = CertChecker::new();
    assert!(checker
        .unpack_cms_signed_certificate_der(&read("cms_test3.der"), &cert("intermediate-cert.pem"))
        .is_none());
    assert!(checker
        .unpack_cms_signed_certificate_der(&read("cms_test4.der"), &cert("ca-cert.pem"))
        .is_none());
}

#[test]
fn test_unpack_signed_by_intermediate() {
    let checker = CertChecker::new();
    let intermediate = cert("intermediate-cert.pem");

    let unpacked = checker
        .unpack_cms_signed_certificate_der(&read("cms_test4.der"), &intermediate)
        .unwrap();
    assert_eq!(unpacked, cert("cms-embedded-cert.pem"));

    let unpacked = checker
        .unpack_cms_signed_certificate_der(&read("cms_test5.der"), &intermediate)
        .unwrap();
    assert!(unpacked.subject_name().contains(EXPECTED_SUBJECT));
    assert_eq!(unpacked, cert("cms-embedded-int-cert.pem"));
}

#[test]
fn test_unpack_from_reader() {
    let checker = CertChecker::new();
    let mut file = std::fs::File::open(testdata("cms_test3.der")).unwrap();
    let unpacked = checker
        .unpack_cms_signed_certificate(&mut file, &cert("ca-cert.pem"))
        .unwrap();
    assert_eq!(unpacked, cert("cms-embedded-cert.pem"));
}

#[test]
fn test_unpacked_cert_checks_against_its_issuer() {
    let checker = {
        let mut c = CertChecker::new();
        c.load_trusted_certificates_from_file(testdata("ca-cert.pem"))
            .unwrap();
        c
    };
    let unpacked = checker
        .unpack_cms_signed_certificate_der(&read("cms_test3.der"), &cert("ca-cert.pem"))
        .unwrap();
    let result = checker
        .check_cert_chain(CertChain::from_certs(ChainKind::Plain, vec![unpacked]))
        .unwrap();
    assert_eq!(result.len(), 2);
}

#[test]
fn test_garbage_input() {
    let checker = CertChecker::new();
    let ca = cert("ca-cert.pem");

    assert!(checker
        .unpack_cms_signed_certificate_der(b"not a CMS envelope", &ca)
        .is_none());
    assert!(checker.unpack_cms_signed_certificate_der(&[], &ca).is_none());

    let err = SignedEnvelope::from_der(b"\x30\x03\x02\x01\x00").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);

    // A certificate is valid DER but not a ContentInfo.
    assert!(SignedEnvelope::from_der(ca.der()).is_err());
}
