//! Certificate Transparency extension configuration.

use crate::oid;

/// The CT-specific extensions the checker recognizes.
///
/// This is immutable, process-wide configuration: build it once (usually
/// [`CtExtensions::STANDARD`]) and hand it to [`CertChecker`](crate::CertChecker),
/// which passes it by reference to every chain predicate that needs it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CtExtensions {
    /// Critical extension that makes a certificate unusable as a final
    /// certificate (the precertificate "poison").
    pub poison: &'static str,
    /// Extended key usage marking a Precertificate Signing Certificate.
    pub precert_signing_eku: &'static str,
}

impl CtExtensions {
    /// The RFC 6962 extension set.
    pub const STANDARD: CtExtensions = CtExtensions {
        poison: oid::EXT_CT_POISON,
        precert_signing_eku: oid::EKU_CT_PRECERT_SIGNING,
    };
}

impl Default for CtExtensions {
    fn default() -> Self {
        Self::STANDARD
    }
}
