//! ctcheck-lib: submission checks for a Certificate Transparency log.
//!
//! This is not a PKI validator. Validity dates, revocation and policy are
//! deliberately ignored so that expired or otherwise invalid certificates can
//! still be logged. What is checked is that every certificate in a submitted
//! chain is signed by the next one and that the chain ends at a certificate
//! the operator trusts.
//!
//! The entry points are on [`CertChecker`]: [`CertChecker::check_cert_chain`],
//! [`CertChecker::check_precert_chain`] and the CMS helpers
//! [`CertChecker::is_cms_signed_by_cert`] and
//! [`CertChecker::unpack_cms_signed_certificate`].

mod cert;
mod chain;
mod checker;
mod cms;
mod extensions;
mod oid;
mod pem;
mod precert;
mod report;
mod shared;
mod trust_store;

pub use cert::Cert;
pub use chain::{CertChain, ChainKind};
pub use checker::{CertChecker, PrecertCheck};
pub use cms::SignedEnvelope;
pub use extensions::CtExtensions;
pub use report::{ChainCertInfo, CheckReport};
pub use shared::SharedCertChecker;
pub use trust_store::TrustStore;

/// Coarse classification of a [`CheckError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The submission is structurally wrong for the requested check.
    InvalidArgument,
    /// The submission is well formed but cannot be anchored to a trusted root.
    FailedPrecondition,
    /// Something failed that cannot be blamed on the submitted data.
    Internal,
}

/// Errors returned by ctcheck-lib.
#[derive(Debug, thiserror::Error)]
pub enum CheckError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("failed precondition: {0}")]
    FailedPrecondition(String),

    #[error("internal error: {0}")]
    Internal(String),

    #[error("Invalid PEM format: {0}")]
    Pem(String),

    #[error("Invalid DER format: {0}")]
    Der(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CheckError {
    /// Map this error onto the three verdict classes callers act on.
    ///
    /// Malformed PEM or DER is the submitter's fault and counts as an invalid
    /// argument; an unreadable file is an environment problem.
    pub fn kind(&self) -> ErrorKind {
        match self {
            CheckError::InvalidArgument(_) | CheckError::Pem(_) | CheckError::Der(_) => {
                ErrorKind::InvalidArgument
            }
            CheckError::FailedPrecondition(_) | CheckError::Io(_) => ErrorKind::FailedPrecondition,
            CheckError::Internal(_) => ErrorKind::Internal,
        }
    }
}
