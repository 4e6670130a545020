#![no_main]

use ctcheck_lib::{Cert, CertChecker, SignedEnvelope};
use libfuzzer_sys::fuzz_target;
use std::sync::OnceLock;

const SIGNER: &[u8] = include_bytes!("../../testdata/ca-cert.pem");

fn signer() -> Option<&'static Cert> {
    static SIGNER_CERT: OnceLock<Option<Cert>> = OnceLock::new();
    SIGNER_CERT.get_or_init(|| Cert::from_pem(SIGNER).ok()).as_ref()
}

fuzz_target!(|data: &[u8]| {
    let Some(signer) = signer() else {
        return;
    };
    let checker = CertChecker::new();

    if let Ok(envelope) = SignedEnvelope::from_der(data) {
        let _ = envelope.payload();
        let _ = checker.is_cms_signed_by_cert(&envelope, signer);
    }
    // Unpacking reports every failure as None.
    let _ = checker.unpack_cms_signed_certificate_der(data, signer);
});
