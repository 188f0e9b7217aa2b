//! Just enough X.509 to classify a certificate's signer.
//!
//! The dispatcher needs to know whether the leaf certificate was
//! signed with an RSA or an EC key (the fixed-ECDH suite families
//! constrain the issuer's key type). Rather than pull in a full
//! certificate parser for one field, this reads the outer
//! `Certificate` SEQUENCE and picks the `signatureAlgorithm` OID out
//! of it; everything else in the certificate is skipped unparsed.

use der::asn1::{AnyRef, ObjectIdentifier};
use der::Reader;
use pkcs8::spki::AlgorithmIdentifierRef;

use crate::enums::SignatureAlgorithm;
use crate::error::Error;
use crate::key::Certificate;

const RSA_SIGNATURE_OIDS: &[ObjectIdentifier] = &[
    // md2/md5/sha1/sha256/sha384/sha512/sha224 WithRSAEncryption
    ObjectIdentifier::new_unwrap("1.2.840.113549.1.1.2"),
    ObjectIdentifier::new_unwrap("1.2.840.113549.1.1.4"),
    ObjectIdentifier::new_unwrap("1.2.840.113549.1.1.5"),
    ObjectIdentifier::new_unwrap("1.2.840.113549.1.1.11"),
    ObjectIdentifier::new_unwrap("1.2.840.113549.1.1.12"),
    ObjectIdentifier::new_unwrap("1.2.840.113549.1.1.13"),
    ObjectIdentifier::new_unwrap("1.2.840.113549.1.1.14"),
];

const ECDSA_SIGNATURE_OIDS: &[ObjectIdentifier] = &[
    // ecdsa-with-SHA1, ecdsa-with-SHA224/256/384/512
    ObjectIdentifier::new_unwrap("1.2.840.10045.4.1"),
    ObjectIdentifier::new_unwrap("1.2.840.10045.4.3.1"),
    ObjectIdentifier::new_unwrap("1.2.840.10045.4.3.2"),
    ObjectIdentifier::new_unwrap("1.2.840.10045.4.3.3"),
    ObjectIdentifier::new_unwrap("1.2.840.10045.4.3.4"),
];

/// Classify the key type of the authority that signed `cert`.
pub(crate) fn signer_key_type(cert: &Certificate) -> Result<SignatureAlgorithm, Error> {
    let oid = signature_algorithm_oid(&cert.0)
        .map_err(|e| Error::CertificateDecode(e.to_string()))?;

    if RSA_SIGNATURE_OIDS.contains(&oid) {
        Ok(SignatureAlgorithm::RSA)
    } else if ECDSA_SIGNATURE_OIDS.contains(&oid) {
        Ok(SignatureAlgorithm::ECDSA)
    } else {
        Err(Error::CertificateDecode(format!(
            "unrecognized signature algorithm {}",
            oid
        )))
    }
}

fn signature_algorithm_oid(cert: &[u8]) -> der::Result<ObjectIdentifier> {
    // Certificate ::= SEQUENCE { tbsCertificate, signatureAlgorithm,
    // signature }; only the middle element is of interest.
    let mut reader = der::SliceReader::new(cert)?;
    let [_tbs, algorithm, _signature]: [AnyRef<'_>; 3] = reader.decode()?;
    let algorithm = algorithm.decode_as::<AlgorithmIdentifierRef<'_>>()?;
    reader.finish(algorithm.oid)
}
