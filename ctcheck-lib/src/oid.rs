//! Centralized OID string constants used throughout ctcheck-lib.
//!
//! Certificate-side checks compare against `Oid::to_id_string()` from
//! x509-parser; the TBS rewrite converts the few it needs into
//! `der::asn1::ObjectIdentifier` at the point of use.

// ── Signature algorithms ─────────────────────────────────────────────────

pub const MD2_WITH_RSA: &str = "1.2.840.113549.1.1.2";
pub const MD5_WITH_RSA: &str = "1.2.840.113549.1.1.4";
pub const SHA1_WITH_RSA: &str = "1.2.840.113549.1.1.5";
pub const SHA256_WITH_RSA: &str = "1.2.840.113549.1.1.11";
pub const SHA384_WITH_RSA: &str = "1.2.840.113549.1.1.12";
pub const SHA512_WITH_RSA: &str = "1.2.840.113549.1.1.13";
pub const RSA_PSS: &str = "1.2.840.113549.1.1.10";
pub const ECDSA_WITH_SHA1: &str = "1.2.840.10045.4.1";
pub const ECDSA_WITH_SHA256: &str = "1.2.840.10045.4.3.2";
pub const ECDSA_WITH_SHA384: &str = "1.2.840.10045.4.3.3";
pub const ECDSA_WITH_SHA512: &str = "1.2.840.10045.4.3.4";
pub const ED25519: &str = "1.3.101.112";

// ── Public key types and named curves ────────────────────────────────────

pub const RSA_ENCRYPTION: &str = "1.2.840.113549.1.1.1";
pub const EC_PUBLIC_KEY: &str = "1.2.840.10045.2.1";
pub const CURVE_P256: &str = "1.2.840.10045.3.1.7";
pub const CURVE_P384: &str = "1.3.132.0.34";

// ── Digest algorithms ────────────────────────────────────────────────────

pub const DIGEST_SHA1: &str = "1.3.14.3.2.26";
pub const DIGEST_SHA256: &str = "2.16.840.1.101.3.4.2.1";
pub const DIGEST_SHA384: &str = "2.16.840.1.101.3.4.2.2";
pub const DIGEST_SHA512: &str = "2.16.840.1.101.3.4.2.3";

// ── X.509v3 extensions (RFC 5280 Section 4.2) ───────────────────────────

pub const EXT_AUTHORITY_KEY_ID: &str = "2.5.29.35";

// ── Certificate Transparency (RFC 6962) ──────────────────────────────────

pub const EXT_CT_POISON: &str = "1.3.6.1.4.1.11129.2.4.3";
pub const EKU_CT_PRECERT_SIGNING: &str = "1.3.6.1.4.1.11129.2.4.4";

// ── CMS (RFC 5652) ───────────────────────────────────────────────────────

pub const CMS_SIGNED_DATA: &str = "1.2.840.113549.1.7.2";
pub const CMS_ATTR_CONTENT_TYPE: &str = "1.2.840.113549.1.9.3";
pub const CMS_ATTR_MESSAGE_DIGEST: &str = "1.2.840.113549.1.9.4";
