//! Owned key and certificate material.

use core::fmt;

use crate::enums::{NamedCurve, SignatureAlgorithm};

/// A decoded private key, held by value for the process lifetime.
///
/// All parameter buffers are exclusively owned; dropping the key
/// releases them. The variant determines which server-side operations
/// the key supports (RSA decryption and PKCS#1 signing, or EC point
/// multiplication and ECDSA signing).
#[derive(Clone, PartialEq, Eq)]
pub enum PrivateKey {
    /// An RSA private key in CRT form.
    Rsa(RsaKey),
    /// An EC private key on a named curve.
    Ec(EcKey),
}

impl PrivateKey {
    /// The signature algorithm this key supports.
    pub fn algorithm(&self) -> SignatureAlgorithm {
        match self {
            Self::Rsa(_) => SignatureAlgorithm::RSA,
            Self::Ec(_) => SignatureAlgorithm::ECDSA,
        }
    }
}

/// The five CRT parameters of an RSA private key, plus the bit length
/// of the modulus they imply.
///
/// Parameters are unsigned big-endian byte strings with no leading
/// zero bytes. `n_bitlen` is taken from the decoded modulus and is not
/// re-verified against the primes.
#[derive(Clone, PartialEq, Eq)]
pub struct RsaKey {
    /// Bit length of the modulus `n`.
    pub n_bitlen: u32,
    /// First prime factor.
    pub p: Vec<u8>,
    /// Second prime factor.
    pub q: Vec<u8>,
    /// `d mod (p-1)`.
    pub dp: Vec<u8>,
    /// `d mod (q-1)`.
    pub dq: Vec<u8>,
    /// `q^-1 mod p`.
    pub iq: Vec<u8>,
}

impl RsaKey {
    /// Length in bytes of the modulus, and therefore of any signature
    /// or ciphertext under this key.
    pub fn modulus_len(&self) -> usize {
        (self.n_bitlen as usize + 7) / 8
    }
}

/// An EC private scalar on a named curve.
#[derive(Clone, PartialEq, Eq)]
pub struct EcKey {
    /// The curve the scalar lives on.
    pub curve: NamedCurve,
    /// The private scalar, unsigned big-endian.
    pub x: Vec<u8>,
}

// Debug output names the key shape but never the secret parameters.
impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rsa(key) => f
                .debug_struct("RsaKey")
                .field("n_bitlen", &key.n_bitlen)
                .finish_non_exhaustive(),
            Self::Ec(key) => f
                .debug_struct("EcKey")
                .field("curve", &key.curve)
                .finish_non_exhaustive(),
        }
    }
}

/// This type contains a single certificate by value.
///
/// The certificate must be in ASN.1 DER form; the
/// [`pemfile`](crate::pemfile) module can extract certificates from
/// PEM files.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Certificate(pub Vec<u8>);
