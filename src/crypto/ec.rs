//! Elliptic-curve operations: point multiplication for the ECDH
//! families, and ASN.1 ECDSA signing.
//!
//! Arithmetic comes from the per-curve RustCrypto crates; the curves
//! with a backend here are P-256 and P-384. ECDSA nonces are the
//! deterministic RFC 6979 kind, so signing needs no entropy source.

use p256::elliptic_curve::sec1::{FromEncodedPoint, ToEncodedPoint};
use signature::hazmat::PrehashSigner;

use crate::error::CryptoFailure;
use crate::NamedCurve;

/// Whether this module can do arithmetic on `curve`.
pub(crate) fn curve_supported(curve: NamedCurve) -> bool {
    matches!(curve, NamedCurve::secp256r1 | NamedCurve::secp384r1)
}

/// Multiply the peer's public `point` (SEC1-encoded) by the private
/// `scalar`, returning the product as an uncompressed SEC1 point.
pub(crate) fn point_mul(
    curve: NamedCurve,
    point: &[u8],
    scalar: &[u8],
) -> Result<Vec<u8>, CryptoFailure> {
    match curve {
        NamedCurve::secp256r1 => mul_p256(point, scalar),
        NamedCurve::secp384r1 => mul_p384(point, scalar),
        other => Err(CryptoFailure::UnsupportedCurve(other)),
    }
}

/// ECDSA-sign the externally computed `hash_value`, returning the
/// DER-encoded signature.
pub(crate) fn sign_asn1(
    curve: NamedCurve,
    scalar: &[u8],
    hash_value: &[u8],
) -> Result<Vec<u8>, CryptoFailure> {
    match curve {
        NamedCurve::secp256r1 => sign_p256(scalar, hash_value),
        NamedCurve::secp384r1 => sign_p384(scalar, hash_value),
        other => Err(CryptoFailure::UnsupportedCurve(other)),
    }
}

/// Left-pad a scalar to the curve's field length, rejecting values
/// that cannot fit.
fn left_pad(scalar: &[u8], len: usize) -> Result<Vec<u8>, CryptoFailure> {
    let scalar = match scalar.iter().position(|&b| b != 0) {
        Some(first) => &scalar[first..],
        None => return Err(CryptoFailure::InvalidScalar),
    };
    if scalar.len() > len {
        return Err(CryptoFailure::InvalidScalar);
    }
    let mut out = vec![0u8; len];
    out[len - scalar.len()..].copy_from_slice(scalar);
    Ok(out)
}

fn mul_p256(point: &[u8], scalar: &[u8]) -> Result<Vec<u8>, CryptoFailure> {
    let encoded =
        p256::EncodedPoint::from_bytes(point).map_err(|_| CryptoFailure::InvalidPoint)?;
    let affine = Option::<p256::AffinePoint>::from(p256::AffinePoint::from_encoded_point(&encoded))
        .ok_or(CryptoFailure::InvalidPoint)?;
    let secret = p256::SecretKey::from_slice(&left_pad(scalar, 32)?)
        .map_err(|_| CryptoFailure::InvalidScalar)?;

    let product = p256::ProjectivePoint::from(affine) * *secret.to_nonzero_scalar();
    let out = product.to_affine().to_encoded_point(false);
    if out.as_bytes().len() != 65 {
        return Err(CryptoFailure::InvalidPoint);
    }
    Ok(out.as_bytes().to_vec())
}

fn mul_p384(point: &[u8], scalar: &[u8]) -> Result<Vec<u8>, CryptoFailure> {
    let encoded =
        p384::EncodedPoint::from_bytes(point).map_err(|_| CryptoFailure::InvalidPoint)?;
    let affine = Option::<p384::AffinePoint>::from(p384::AffinePoint::from_encoded_point(&encoded))
        .ok_or(CryptoFailure::InvalidPoint)?;
    let secret = p384::SecretKey::from_slice(&left_pad(scalar, 48)?)
        .map_err(|_| CryptoFailure::InvalidScalar)?;

    let product = p384::ProjectivePoint::from(affine) * *secret.to_nonzero_scalar();
    let out = product.to_affine().to_encoded_point(false);
    if out.as_bytes().len() != 97 {
        return Err(CryptoFailure::InvalidPoint);
    }
    Ok(out.as_bytes().to_vec())
}

fn sign_p256(scalar: &[u8], hash_value: &[u8]) -> Result<Vec<u8>, CryptoFailure> {
    let key = p256::ecdsa::SigningKey::from_slice(&left_pad(scalar, 32)?)
        .map_err(|_| CryptoFailure::InvalidScalar)?;
    let signature: p256::ecdsa::Signature = key
        .sign_prehash(hash_value)
        .map_err(|_| CryptoFailure::SigningFailed)?;
    Ok(signature.to_der().as_bytes().to_vec())
}

fn sign_p384(scalar: &[u8], hash_value: &[u8]) -> Result<Vec<u8>, CryptoFailure> {
    let key = p384::ecdsa::SigningKey::from_slice(&left_pad(scalar, 48)?)
        .map_err(|_| CryptoFailure::InvalidScalar)?;
    let signature: p384::ecdsa::Signature = key
        .sign_prehash(hash_value)
        .map_err(|_| CryptoFailure::SigningFailed)?;
    Ok(signature.to_der().as_bytes().to_vec())
}
