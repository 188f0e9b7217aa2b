//! The static cipher-suite catalog.
//!
//! Each descriptor carries a requirement bitmask: the protocol floor,
//! hash functions and symmetric algorithms the suite needs, and its
//! key-exchange family. The catalog order is the server's priority
//! order, used when the operator configures no explicit list and when
//! server preference is enforced during selection.

use crate::enums::{CipherSuite, ProtocolVersion};

/// Suite requires TLS 1.2.
pub const REQ_TLS12: u16 = 1 << 0;
/// Suite requires SHA-1.
pub const REQ_SHA1: u16 = 1 << 1;
/// Suite requires SHA-256.
pub const REQ_SHA256: u16 = 1 << 2;
/// Suite requires SHA-384.
pub const REQ_SHA384: u16 = 1 << 3;
/// Suite requires AES in CBC mode.
pub const REQ_AES_CBC: u16 = 1 << 4;
/// Suite requires AES in GCM mode.
pub const REQ_AES_GCM: u16 = 1 << 5;
/// Suite requires 3DES in CBC mode.
pub const REQ_3DES_CBC: u16 = 1 << 6;
/// Key exchange is ephemeral ECDH, RSA-signed.
pub const REQ_ECDHE_RSA: u16 = 1 << 7;
/// Key exchange is ephemeral ECDH, ECDSA-signed.
pub const REQ_ECDHE_ECDSA: u16 = 1 << 8;
/// Key exchange is static ECDH from an RSA-signed certificate.
pub const REQ_ECDH_RSA: u16 = 1 << 9;
/// Key exchange is static ECDH from an ECDSA-signed certificate.
pub const REQ_ECDH_ECDSA: u16 = 1 << 10;

/// How a suite establishes the shared secret. Plain-RSA suites carry
/// no key-exchange flag; everything else maps from its `REQ_*` bit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyExchangeAlgorithm {
    /// RSA-encrypted premaster secret.
    Rsa,
    /// Ephemeral ECDH authenticated by an RSA signature.
    EcdheRsa,
    /// Ephemeral ECDH authenticated by an ECDSA signature.
    EcdheEcdsa,
    /// Static ECDH; requires an RSA-signed EC certificate.
    EcdhRsa,
    /// Static ECDH; requires an ECDSA-signed EC certificate.
    EcdhEcdsa,
}

/// A cipher suite known to the catalog.
#[derive(Debug)]
pub struct CipherSuiteDescriptor {
    /// The TLS enumeration naming this cipher suite.
    pub suite: CipherSuite,
    /// Short human-readable name.
    pub name: &'static str,
    /// Requirement bitmask (`REQ_*`).
    pub req: u16,
}

impl CipherSuiteDescriptor {
    /// Whether `flag` (one of the `REQ_*` bits) is required.
    pub fn requires(&self, flag: u16) -> bool {
        self.req & flag != 0
    }

    /// The suite's key-exchange family.
    pub fn kx(&self) -> KeyExchangeAlgorithm {
        if self.requires(REQ_ECDHE_RSA) {
            KeyExchangeAlgorithm::EcdheRsa
        } else if self.requires(REQ_ECDHE_ECDSA) {
            KeyExchangeAlgorithm::EcdheEcdsa
        } else if self.requires(REQ_ECDH_RSA) {
            KeyExchangeAlgorithm::EcdhRsa
        } else if self.requires(REQ_ECDH_ECDSA) {
            KeyExchangeAlgorithm::EcdhEcdsa
        } else {
            KeyExchangeAlgorithm::Rsa
        }
    }
}

impl PartialEq for CipherSuiteDescriptor {
    fn eq(&self, other: &Self) -> bool {
        self.suite == other.suite
    }
}

macro_rules! suite {
    ($suite:ident, $name:literal, $req:expr) => {
        CipherSuiteDescriptor {
            suite: CipherSuite::$suite,
            name: $name,
            req: $req,
        }
    };
}

/// Every suite the catalog knows, in server priority order.
pub static ALL_CIPHER_SUITES: &[CipherSuiteDescriptor] = &[
    suite!(
        TLS_ECDHE_ECDSA_WITH_AES_128_GCM_SHA256,
        "ECDHE_ECDSA_AES_128_GCM_SHA256",
        REQ_TLS12 | REQ_SHA256 | REQ_AES_GCM | REQ_ECDHE_ECDSA
    ),
    suite!(
        TLS_ECDHE_RSA_WITH_AES_128_GCM_SHA256,
        "ECDHE_RSA_AES_128_GCM_SHA256",
        REQ_TLS12 | REQ_SHA256 | REQ_AES_GCM | REQ_ECDHE_RSA
    ),
    suite!(
        TLS_ECDHE_ECDSA_WITH_AES_256_GCM_SHA384,
        "ECDHE_ECDSA_AES_256_GCM_SHA384",
        REQ_TLS12 | REQ_SHA384 | REQ_AES_GCM | REQ_ECDHE_ECDSA
    ),
    suite!(
        TLS_ECDHE_RSA_WITH_AES_256_GCM_SHA384,
        "ECDHE_RSA_AES_256_GCM_SHA384",
        REQ_TLS12 | REQ_SHA384 | REQ_AES_GCM | REQ_ECDHE_RSA
    ),
    suite!(
        TLS_ECDHE_ECDSA_WITH_AES_128_CBC_SHA256,
        "ECDHE_ECDSA_AES_128_CBC_SHA256",
        REQ_TLS12 | REQ_SHA256 | REQ_AES_CBC | REQ_ECDHE_ECDSA
    ),
    suite!(
        TLS_ECDHE_RSA_WITH_AES_128_CBC_SHA256,
        "ECDHE_RSA_AES_128_CBC_SHA256",
        REQ_TLS12 | REQ_SHA256 | REQ_AES_CBC | REQ_ECDHE_RSA
    ),
    suite!(
        TLS_ECDHE_ECDSA_WITH_AES_256_CBC_SHA384,
        "ECDHE_ECDSA_AES_256_CBC_SHA384",
        REQ_TLS12 | REQ_SHA384 | REQ_AES_CBC | REQ_ECDHE_ECDSA
    ),
    suite!(
        TLS_ECDHE_RSA_WITH_AES_256_CBC_SHA384,
        "ECDHE_RSA_AES_256_CBC_SHA384",
        REQ_TLS12 | REQ_SHA384 | REQ_AES_CBC | REQ_ECDHE_RSA
    ),
    suite!(
        TLS_ECDHE_ECDSA_WITH_AES_128_CBC_SHA,
        "ECDHE_ECDSA_AES_128_CBC_SHA",
        REQ_SHA1 | REQ_AES_CBC | REQ_ECDHE_ECDSA
    ),
    suite!(
        TLS_ECDHE_RSA_WITH_AES_128_CBC_SHA,
        "ECDHE_RSA_AES_128_CBC_SHA",
        REQ_SHA1 | REQ_AES_CBC | REQ_ECDHE_RSA
    ),
    suite!(
        TLS_ECDHE_ECDSA_WITH_AES_256_CBC_SHA,
        "ECDHE_ECDSA_AES_256_CBC_SHA",
        REQ_SHA1 | REQ_AES_CBC | REQ_ECDHE_ECDSA
    ),
    suite!(
        TLS_ECDHE_RSA_WITH_AES_256_CBC_SHA,
        "ECDHE_RSA_AES_256_CBC_SHA",
        REQ_SHA1 | REQ_AES_CBC | REQ_ECDHE_RSA
    ),
    suite!(
        TLS_ECDH_ECDSA_WITH_AES_128_GCM_SHA256,
        "ECDH_ECDSA_AES_128_GCM_SHA256",
        REQ_TLS12 | REQ_SHA256 | REQ_AES_GCM | REQ_ECDH_ECDSA
    ),
    suite!(
        TLS_ECDH_RSA_WITH_AES_128_GCM_SHA256,
        "ECDH_RSA_AES_128_GCM_SHA256",
        REQ_TLS12 | REQ_SHA256 | REQ_AES_GCM | REQ_ECDH_RSA
    ),
    suite!(
        TLS_ECDH_ECDSA_WITH_AES_256_GCM_SHA384,
        "ECDH_ECDSA_AES_256_GCM_SHA384",
        REQ_TLS12 | REQ_SHA384 | REQ_AES_GCM | REQ_ECDH_ECDSA
    ),
    suite!(
        TLS_ECDH_RSA_WITH_AES_256_GCM_SHA384,
        "ECDH_RSA_AES_256_GCM_SHA384",
        REQ_TLS12 | REQ_SHA384 | REQ_AES_GCM | REQ_ECDH_RSA
    ),
    suite!(
        TLS_ECDH_ECDSA_WITH_AES_128_CBC_SHA256,
        "ECDH_ECDSA_AES_128_CBC_SHA256",
        REQ_TLS12 | REQ_SHA256 | REQ_AES_CBC | REQ_ECDH_ECDSA
    ),
    suite!(
        TLS_ECDH_RSA_WITH_AES_128_CBC_SHA256,
        "ECDH_RSA_AES_128_CBC_SHA256",
        REQ_TLS12 | REQ_SHA256 | REQ_AES_CBC | REQ_ECDH_RSA
    ),
    suite!(
        TLS_ECDH_ECDSA_WITH_AES_256_CBC_SHA384,
        "ECDH_ECDSA_AES_256_CBC_SHA384",
        REQ_TLS12 | REQ_SHA384 | REQ_AES_CBC | REQ_ECDH_ECDSA
    ),
    suite!(
        TLS_ECDH_RSA_WITH_AES_256_CBC_SHA384,
        "ECDH_RSA_AES_256_CBC_SHA384",
        REQ_TLS12 | REQ_SHA384 | REQ_AES_CBC | REQ_ECDH_RSA
    ),
    suite!(
        TLS_ECDH_ECDSA_WITH_AES_128_CBC_SHA,
        "ECDH_ECDSA_AES_128_CBC_SHA",
        REQ_SHA1 | REQ_AES_CBC | REQ_ECDH_ECDSA
    ),
    suite!(
        TLS_ECDH_RSA_WITH_AES_128_CBC_SHA,
        "ECDH_RSA_AES_128_CBC_SHA",
        REQ_SHA1 | REQ_AES_CBC | REQ_ECDH_RSA
    ),
    suite!(
        TLS_ECDH_ECDSA_WITH_AES_256_CBC_SHA,
        "ECDH_ECDSA_AES_256_CBC_SHA",
        REQ_SHA1 | REQ_AES_CBC | REQ_ECDH_ECDSA
    ),
    suite!(
        TLS_ECDH_RSA_WITH_AES_256_CBC_SHA,
        "ECDH_RSA_AES_256_CBC_SHA",
        REQ_SHA1 | REQ_AES_CBC | REQ_ECDH_RSA
    ),
    suite!(
        TLS_RSA_WITH_AES_128_GCM_SHA256,
        "RSA_AES_128_GCM_SHA256",
        REQ_TLS12 | REQ_SHA256 | REQ_AES_GCM
    ),
    suite!(
        TLS_RSA_WITH_AES_256_GCM_SHA384,
        "RSA_AES_256_GCM_SHA384",
        REQ_TLS12 | REQ_SHA384 | REQ_AES_GCM
    ),
    suite!(
        TLS_RSA_WITH_AES_128_CBC_SHA256,
        "RSA_AES_128_CBC_SHA256",
        REQ_TLS12 | REQ_SHA256 | REQ_AES_CBC
    ),
    suite!(
        TLS_RSA_WITH_AES_256_CBC_SHA256,
        "RSA_AES_256_CBC_SHA256",
        REQ_TLS12 | REQ_SHA256 | REQ_AES_CBC
    ),
    suite!(
        TLS_RSA_WITH_AES_128_CBC_SHA,
        "RSA_AES_128_CBC_SHA",
        REQ_SHA1 | REQ_AES_CBC
    ),
    suite!(
        TLS_RSA_WITH_AES_256_CBC_SHA,
        "RSA_AES_256_CBC_SHA",
        REQ_SHA1 | REQ_AES_CBC
    ),
    suite!(
        TLS_ECDHE_ECDSA_WITH_3DES_EDE_CBC_SHA,
        "ECDHE_ECDSA_3DES_EDE_CBC_SHA",
        REQ_SHA1 | REQ_3DES_CBC | REQ_ECDHE_ECDSA
    ),
    suite!(
        TLS_ECDHE_RSA_WITH_3DES_EDE_CBC_SHA,
        "ECDHE_RSA_3DES_EDE_CBC_SHA",
        REQ_SHA1 | REQ_3DES_CBC | REQ_ECDHE_RSA
    ),
    suite!(
        TLS_ECDH_ECDSA_WITH_3DES_EDE_CBC_SHA,
        "ECDH_ECDSA_3DES_EDE_CBC_SHA",
        REQ_SHA1 | REQ_3DES_CBC | REQ_ECDH_ECDSA
    ),
    suite!(
        TLS_ECDH_RSA_WITH_3DES_EDE_CBC_SHA,
        "ECDH_RSA_3DES_EDE_CBC_SHA",
        REQ_SHA1 | REQ_3DES_CBC | REQ_ECDH_RSA
    ),
    suite!(
        TLS_RSA_WITH_3DES_EDE_CBC_SHA,
        "RSA_3DES_EDE_CBC_SHA",
        REQ_SHA1 | REQ_3DES_CBC
    ),
];

/// Find the catalog entry for `suite`.
pub fn lookup(suite: CipherSuite) -> Option<&'static CipherSuiteDescriptor> {
    ALL_CIPHER_SUITES
        .iter()
        .find(|descriptor| descriptor.suite == suite)
}

/// The requirement bitmask for `suite`, if the catalog knows it.
pub fn requirements_of(suite: CipherSuite) -> Option<u16> {
    lookup(suite).map(|descriptor| descriptor.req)
}

/// The suites usable under a `max_version` ceiling, in catalog
/// priority order. This is the default suite list when the operator
/// configures none.
pub fn default_suite_list(max_version: ProtocolVersion) -> Vec<&'static CipherSuiteDescriptor> {
    ALL_CIPHER_SUITES
        .iter()
        .filter(|descriptor| {
            !descriptor.requires(REQ_TLS12)
                || u16::from(max_version) >= u16::from(ProtocolVersion::TLSv1_2)
        })
        .collect()
}

/// Find a suite by name, accepting either the short catalog name or
/// the IANA `TLS_..._WITH_...` form, case-insensitively.
pub fn find_suite(name: &str) -> Option<&'static CipherSuiteDescriptor> {
    ALL_CIPHER_SUITES.iter().find(|descriptor| {
        descriptor.name.eq_ignore_ascii_case(name)
            || descriptor
                .suite
                .as_str()
                .is_some_and(|iana| iana.eq_ignore_ascii_case(name))
    })
}
