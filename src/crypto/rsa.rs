//! Raw RSA private-key operations over the CRT parameters.
//!
//! The decoded key holds only the five CRT parameters and the modulus
//! bit length, so the private operation is computed directly:
//! `m1 = c^dp mod p`, `m2 = c^dq mod q`,
//! `h = iq*(m1 - m2) mod p`, `m = m2 + q*h`. The modulus is
//! reconstructed as `p*q` when a range check needs it.

use num_bigint_dig::BigUint;

use crate::crypto;
use crate::enums::HashAlgorithm;
use crate::error::CryptoFailure;
use crate::key::RsaKey;

/// The RSA private operation: `input^d mod n`, with `input` and the
/// result both exactly `modulus_len` bytes.
pub(crate) fn private_op(key: &RsaKey, input: &[u8]) -> Result<Vec<u8>, CryptoFailure> {
    let k = key.modulus_len();
    if input.len() != k {
        return Err(CryptoFailure::InputLength);
    }

    let p = BigUint::from_bytes_be(&key.p);
    let q = BigUint::from_bytes_be(&key.q);
    let dp = BigUint::from_bytes_be(&key.dp);
    let dq = BigUint::from_bytes_be(&key.dq);
    let iq = BigUint::from_bytes_be(&key.iq);
    let n = &p * &q;

    let c = BigUint::from_bytes_be(input);
    if c >= n {
        return Err(CryptoFailure::InputLength);
    }

    let m1 = c.modpow(&dp, &p);
    let m2 = c.modpow(&dq, &q);
    let h = ((&m1 + &p - (&m2 % &p)) * &iq) % &p;
    let m = &m2 + &q * &h;

    let bytes = m.to_bytes_be();
    debug_assert!(bytes.len() <= k);
    let mut out = vec![0u8; k];
    out[k - bytes.len()..].copy_from_slice(&bytes);
    Ok(out)
}

/// Decrypt a PKCS#1 v1.5 type-2 encrypted premaster secret, returning
/// the payload. Constant-time treatment of the padding verdict is the
/// caller's concern; this reports failure outright.
pub(crate) fn ssl_decrypt(key: &RsaKey, ciphertext: &[u8]) -> Result<Vec<u8>, CryptoFailure> {
    let em = private_op(key, ciphertext)?;

    if em.len() < 11 || em[0] != 0x00 || em[1] != 0x02 {
        return Err(CryptoFailure::InvalidPadding);
    }
    let zero = em[2..]
        .iter()
        .position(|&b| b == 0x00)
        .ok_or(CryptoFailure::InvalidPadding)?;
    if zero < 8 {
        return Err(CryptoFailure::InvalidPadding);
    }
    Ok(em[2 + zero + 1..].to_vec())
}

/// Produce a PKCS#1 v1.5 signature over `hash_value`.
///
/// `HashAlgorithm::NONE` is the legacy pre-TLS1.2 form: the value is
/// the raw MD5‖SHA-1 concatenation and is embedded with no DigestInfo
/// wrapper.
pub(crate) fn pkcs1_sign(
    key: &RsaKey,
    hash: HashAlgorithm,
    hash_value: &[u8],
) -> Result<Vec<u8>, CryptoFailure> {
    let t = match hash {
        HashAlgorithm::NONE => hash_value.to_vec(),
        _ => {
            let prefix =
                crypto::pkcs1_digest_info_prefix(hash).ok_or(CryptoFailure::UnknownHash(hash))?;
            let expected = crypto::digest_len(hash).unwrap();
            if hash_value.len() != expected {
                return Err(CryptoFailure::InputLength);
            }
            let mut t = Vec::with_capacity(prefix.len() + hash_value.len());
            t.extend_from_slice(prefix);
            t.extend_from_slice(hash_value);
            t
        }
    };

    let k = key.modulus_len();
    if k < t.len() + 11 {
        return Err(CryptoFailure::MessageTooLong);
    }

    let mut em = vec![0xff; k];
    em[0] = 0x00;
    em[1] = 0x01;
    em[k - t.len() - 1] = 0x00;
    em[k - t.len()..].copy_from_slice(&t);

    private_op(key, &em)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::key::PrivateKey;
    use crate::keys;
    use sha2::{Digest, Sha256};

    fn test_key() -> RsaKey {
        let key = keys::decode_private_key(include_bytes!("../../testdata/rsa2048.pem")).unwrap();
        match key {
            PrivateKey::Rsa(rsa) => rsa,
            _ => panic!("expected an RSA key"),
        }
    }

    fn public_parts(key: &RsaKey) -> (BigUint, BigUint) {
        let n = BigUint::from_bytes_be(&key.p) * BigUint::from_bytes_be(&key.q);
        (n, BigUint::from(65537u32))
    }

    #[test]
    fn signature_verifies_under_the_public_exponent() {
        let key = test_key();
        let digest = Sha256::digest(b"hello world");
        let sig = pkcs1_sign(&key, HashAlgorithm::SHA256, &digest).unwrap();
        assert_eq!(sig.len(), 256);

        let (n, e) = public_parts(&key);
        let recovered = BigUint::from_bytes_be(&sig).modpow(&e, &n).to_bytes_be();
        // the encoded message, sans its single leading zero byte
        assert_eq!(recovered[0], 0x01);
        let prefix = crypto::pkcs1_digest_info_prefix(HashAlgorithm::SHA256).unwrap();
        assert!(recovered.ends_with(
            &[prefix, digest.as_slice()].concat()
        ));
    }

    #[test]
    fn legacy_signature_embeds_the_raw_value() {
        let key = test_key();
        let hv = [0x5a; 36];
        let sig = pkcs1_sign(&key, HashAlgorithm::NONE, &hv).unwrap();

        let (n, e) = public_parts(&key);
        let recovered = BigUint::from_bytes_be(&sig).modpow(&e, &n).to_bytes_be();
        assert!(recovered.ends_with(&hv));
    }

    #[test]
    fn decrypt_inverts_a_public_encryption() {
        let key = test_key();
        let (n, e) = public_parts(&key);

        // build a type-2 encrypted message by hand
        let mut em = vec![0u8; 256];
        em[1] = 0x02;
        for byte in em.iter_mut().take(2 + 205).skip(2) {
            *byte = 0xa5;
        }
        let secret = b"premaster secret bytes, 48 of them, more or less";
        em[2 + 205] = 0x00;
        em[2 + 205 + 1..].copy_from_slice(secret);

        let c = BigUint::from_bytes_be(&em).modpow(&e, &n).to_bytes_be();
        let mut ciphertext = vec![0u8; 256];
        ciphertext[256 - c.len()..].copy_from_slice(&c);

        let plain = ssl_decrypt(&key, &ciphertext).unwrap();
        assert_eq!(plain, secret);
    }

    #[test]
    fn wrong_length_ciphertext_is_rejected() {
        let key = test_key();
        assert_eq!(
            ssl_decrypt(&key, &[0u8; 255]).unwrap_err(),
            CryptoFailure::InputLength
        );
    }

    #[test]
    fn bad_padding_is_rejected() {
        let key = test_key();
        // decrypts to a structurally random message
        let err = ssl_decrypt(&key, &[0x01; 256]).unwrap_err();
        assert!(matches!(
            err,
            CryptoFailure::InvalidPadding | CryptoFailure::InputLength
        ));
    }

    #[test]
    fn digest_length_is_enforced() {
        let key = test_key();
        assert_eq!(
            pkcs1_sign(&key, HashAlgorithm::SHA256, &[0u8; 20]).unwrap_err(),
            CryptoFailure::InputLength
        );
    }
}
