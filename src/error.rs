//! Error reporting for startup and per-connection failures.

use std::error::Error as StdError;
use std::fmt;
use std::io;

/// unitls reports failures using this type.
///
/// Startup failures (key decoding, certificate decoding, configuration
/// validation, binding the listening socket) are fatal to the process:
/// the caller is expected to abort with a diagnostic. Per-connection
/// failures (`NoSuiteAgreement`, `Crypto`) abort only the current
/// handshake; the dispatch loop keeps accepting.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The private-key encoding could not be decoded.
    /// The parameter carries the underlying decoder failure.
    KeyDecode(KeyDecodeError),

    /// A PEM container held no block labeled as a private key.
    NoKeyFound,

    /// The leaf certificate could not be decoded far enough to
    /// classify its issuer's key type.
    CertificateDecode(String),

    /// No resolved listening address could be bound.
    Bind(io::ErrorKind),

    /// Accepting a client connection failed. This terminates the
    /// dispatch loop: the single-slot design has nothing to retry
    /// into.
    Accept(io::ErrorKind),

    /// No offered cipher suite is compatible with the configured key
    /// and certificate chain.
    NoSuiteAgreement,

    /// A signing or key-exchange primitive failed.
    Crypto(CryptoFailure),

    /// The option set failed pre-flight validation.
    InvalidConfig(String),

    /// A catch-all error for unlikely errors.
    General(String),
}

/// Detail for [`Error::KeyDecode`].
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyDecodeError {
    /// The buffer is not a well-formed ASN.1 private-key structure.
    Asn1(String),

    /// The key algorithm is recognized by no decoder. Carries the
    /// algorithm OID in dotted form.
    UnsupportedKeyType(String),

    /// The EC key names a curve outside the known set. Carries the
    /// curve OID in dotted form.
    UnsupportedCurve(String),
}

/// Detail for [`Error::Crypto`].
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CryptoFailure {
    /// The hash identifier does not map to a known hash function.
    UnknownHash(crate::enums::HashAlgorithm),

    /// The destination buffer cannot hold the result.
    BufferTooSmall {
        /// Bytes the operation needs.
        needed: usize,
        /// Bytes the caller provided.
        available: usize,
    },

    /// The peer's public point is not a valid curve point.
    InvalidPoint,

    /// The private scalar is out of range for the curve.
    InvalidScalar,

    /// The key's curve has no arithmetic backend.
    UnsupportedCurve(crate::enums::NamedCurve),

    /// PKCS#1 v1.5 padding did not check out after decryption.
    InvalidPadding,

    /// The input length does not match the RSA modulus length.
    InputLength,

    /// The message does not fit under the RSA modulus.
    MessageTooLong,

    /// The underlying signing primitive failed.
    SigningFailed,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::KeyDecode(why) => write!(f, "cannot decode private key: {}", why),
            Self::NoKeyFound => write!(f, "no private key found in PEM container"),
            Self::CertificateDecode(why) => {
                write!(f, "cannot decode server certificate: {}", why)
            }
            Self::Bind(kind) => write!(f, "cannot bind listening socket: {:?}", kind),
            Self::Accept(kind) => write!(f, "cannot accept client connection: {:?}", kind),
            Self::NoSuiteAgreement => write!(f, "no mutually acceptable cipher suite"),
            Self::Crypto(why) => write!(f, "cryptographic operation failed: {}", why),
            Self::InvalidConfig(why) => write!(f, "invalid configuration: {}", why),
            Self::General(why) => write!(f, "unexpected error: {}", why),
        }
    }
}

impl fmt::Display for KeyDecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Asn1(why) => write!(f, "malformed ASN.1: {}", why),
            Self::UnsupportedKeyType(oid) => write!(f, "unsupported key algorithm {}", oid),
            Self::UnsupportedCurve(oid) => write!(f, "unsupported curve {}", oid),
        }
    }
}

impl fmt::Display for CryptoFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownHash(alg) => write!(f, "unknown hash function {:?}", alg),
            Self::BufferTooSmall { needed, available } => {
                write!(f, "buffer too small ({} needed, {} available)", needed, available)
            }
            Self::InvalidPoint => write!(f, "invalid curve point"),
            Self::InvalidScalar => write!(f, "invalid private scalar"),
            Self::UnsupportedCurve(curve) => write!(f, "unsupported curve {:?}", curve),
            Self::InvalidPadding => write!(f, "bad PKCS#1 padding"),
            Self::InputLength => write!(f, "input length does not match modulus"),
            Self::MessageTooLong => write!(f, "message too long for modulus"),
            Self::SigningFailed => write!(f, "signing primitive failed"),
        }
    }
}

impl StdError for Error {}

impl From<KeyDecodeError> for Error {
    fn from(e: KeyDecodeError) -> Self {
        Self::KeyDecode(e)
    }
}

impl From<CryptoFailure> for Error {
    fn from(e: CryptoFailure) -> Self {
        Self::Crypto(e)
    }
}
