#![no_main]

use ctcheck_lib::{CertChain, CertChecker, ChainKind};
use libfuzzer_sys::fuzz_target;
use std::sync::OnceLock;

const ROOT: &str = include_str!("../../testdata/ca-cert.pem");

fn checker() -> &'static CertChecker {
    static CHECKER: OnceLock<CertChecker> = OnceLock::new();
    CHECKER.get_or_init(|| {
        let mut checker = CertChecker::new();
        let _ = checker.load_trusted_certificates(&[ROOT]);
        checker
    })
}

fuzz_target!(|data: &[u8]| {
    // Submitted chains are attacker-controlled; checking must never panic.
    for kind in [ChainKind::Plain, ChainKind::Precert] {
        let Ok(chain) = CertChain::from_pem(kind, data) else {
            continue;
        };
        let _ = chain.is_well_formed(checker().extensions());
        match kind {
            ChainKind::Plain => {
                let _ = checker().check_cert_chain(chain);
            }
            ChainKind::Precert => {
                let _ = checker().check_precert_chain(chain);
            }
        }
    }

    // Raw DER as a single certificate.
    if let Ok(cert) = ctcheck_lib::Cert::from_der(data) {
        let _ = cert.is_self_signed();
        let _ = cert.has_basic_constraint_ca_true();
        let _ = cert.spki_sha256_digest();
        let _ = cert.signature_algorithm_name();
        let _ = checker().check_cert_chain(CertChain::from_certs(ChainKind::Plain, vec![cert]));
    }
});
