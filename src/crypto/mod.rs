//! Server-side cryptographic operations over the decoded private key.
//!
//! Only the operations the handshake actually requests live here; the
//! heavy lifting is delegated to the RustCrypto arithmetic crates.

pub(crate) mod ec;
pub(crate) mod rsa;

use crate::enums::HashAlgorithm;

/// Worst-case length of a DER-encoded ECDSA signature over the
/// supported curves (matches the engine's output bound).
pub(crate) const ECDSA_MAX_SIG_LEN: usize = 139;

/// Digest output length in bytes, for the hash identifiers usable in
/// handshake signatures.
pub(crate) fn digest_len(alg: HashAlgorithm) -> Option<usize> {
    match alg {
        HashAlgorithm::MD5 => Some(16),
        HashAlgorithm::SHA1 => Some(20),
        HashAlgorithm::SHA224 => Some(28),
        HashAlgorithm::SHA256 => Some(32),
        HashAlgorithm::SHA384 => Some(48),
        HashAlgorithm::SHA512 => Some(64),
        _ => None,
    }
}

/// The DigestInfo prefix for a PKCS#1 v1.5 signature: everything of
/// the encoded structure that precedes the raw digest bytes.
pub(crate) fn pkcs1_digest_info_prefix(alg: HashAlgorithm) -> Option<&'static [u8]> {
    match alg {
        HashAlgorithm::MD5 => Some(&[
            0x30, 0x20, 0x30, 0x0c, 0x06, 0x08, 0x2a, 0x86, 0x48, 0x86, 0xf7, 0x0d, 0x02, 0x05,
            0x05, 0x00, 0x04, 0x10,
        ]),
        HashAlgorithm::SHA1 => Some(&[
            0x30, 0x21, 0x30, 0x09, 0x06, 0x05, 0x2b, 0x0e, 0x03, 0x02, 0x1a, 0x05, 0x00, 0x04,
            0x14,
        ]),
        HashAlgorithm::SHA224 => Some(&[
            0x30, 0x2d, 0x30, 0x0d, 0x06, 0x09, 0x60, 0x86, 0x48, 0x01, 0x65, 0x03, 0x04, 0x02,
            0x04, 0x05, 0x00, 0x04, 0x1c,
        ]),
        HashAlgorithm::SHA256 => Some(&[
            0x30, 0x31, 0x30, 0x0d, 0x06, 0x09, 0x60, 0x86, 0x48, 0x01, 0x65, 0x03, 0x04, 0x02,
            0x01, 0x05, 0x00, 0x04, 0x20,
        ]),
        HashAlgorithm::SHA384 => Some(&[
            0x30, 0x41, 0x30, 0x0d, 0x06, 0x09, 0x60, 0x86, 0x48, 0x01, 0x65, 0x03, 0x04, 0x02,
            0x02, 0x05, 0x00, 0x04, 0x30,
        ]),
        HashAlgorithm::SHA512 => Some(&[
            0x30, 0x51, 0x30, 0x0d, 0x06, 0x09, 0x60, 0x86, 0x48, 0x01, 0x65, 0x03, 0x04, 0x02,
            0x03, 0x05, 0x00, 0x04, 0x40,
        ]),
        _ => None,
    }
}
