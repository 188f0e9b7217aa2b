//! Suite selection and the server-side private-key operations.
//!
//! The handshake engine consults a [`ServerPolicy`] at two points: once
//! to pick a cipher suite for the client's offer, then once more to
//! perform the operation the chosen suite implies — RSA decryption of
//! the encrypted premaster, or a handshake signature, or a static-ECDH
//! point multiplication.

use std::sync::Arc;

use log::{debug, warn};

use crate::crypto;
use crate::enums::{CipherSuite, HashAlgorithm, ProtocolVersion, SignatureAlgorithm};
use crate::error::{CryptoFailure, Error};
use crate::key::{Certificate, PrivateKey};
use crate::suites::{self, CipherSuiteDescriptor, KeyExchangeAlgorithm};
use crate::x509;

/// The client-side parameters a suite decision is made against, as
/// collected by the engine from the ClientHello. One of these exists
/// per connection attempt and is discarded when the handshake ends.
#[derive(Debug)]
pub struct NegotiationContext<'a> {
    /// Suites acceptable to both peers, in the client's preference
    /// order.
    pub offered: &'a [CipherSuite],

    /// Bitmask of hash functions supported by both peers, indexed by
    /// hash identifier (bit `1 << id`).
    pub client_hashes: u32,

    /// The protocol version ceiling the client advertised.
    pub client_max_version: ProtocolVersion,
}

/// The outcome of suite selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SuiteChoice {
    /// The selected cipher suite.
    pub suite: CipherSuite,

    /// For the ECDHE families, the hash to use for the ServerKeyExchange
    /// signature. Unset for suites that sign nothing.
    pub sig_hash: Option<HashAlgorithm>,
}

/// The capability the handshake engine negotiates against: pick a
/// suite, then perform the one private-key operation the suite needs.
///
/// Implementations are consulted from a single connection at a time
/// but hold no per-connection state, so sharing one instance across
/// the process lifetime is the norm.
pub trait ServerPolicy: Send + Sync {
    /// Select a mutually compatible cipher suite, or signal that no
    /// agreement exists ([`Error::NoSuiteAgreement`]). The engine
    /// surfaces disagreement as a handshake failure; it is not fatal
    /// to the process.
    fn select_suite(&self, ctx: &NegotiationContext<'_>) -> Result<SuiteChoice, Error>;

    /// Perform the key-exchange operation in place over `share`:
    /// decrypt an RSA-encrypted premaster secret, or multiply a peer
    /// public point by the private scalar. Returns the number of
    /// result bytes now at the front of `share`.
    fn key_exchange(&self, share: &mut [u8]) -> Result<usize, Error>;

    /// Sign `hash_value` into `output`, returning the signature
    /// length. `hash` identifies how the value was computed;
    /// [`HashAlgorithm::NONE`] is the legacy MD5‖SHA-1 concatenation
    /// used by pre-TLS1.2 signatures.
    fn sign(
        &self,
        hash: HashAlgorithm,
        hash_value: &[u8],
        output: &mut [u8],
    ) -> Result<usize, Error>;
}

/// The standard policy: one private key and one certificate chain,
/// fixed for the process lifetime.
///
/// Immutable after construction and shared read-only across all
/// connections, so no synchronization is needed around it.
#[derive(Debug)]
pub struct SingleKeyPolicy {
    key: PrivateKey,
    chain: Vec<Certificate>,
    issuer_key_type: SignatureAlgorithm,
    suites: Vec<&'static CipherSuiteDescriptor>,
    prefer_server_order: bool,
    verbose: bool,
}

impl SingleKeyPolicy {
    /// Build a policy around `key` and `chain` (leaf first).
    ///
    /// Decodes the leaf far enough to classify the issuing CA's key
    /// type, which the fixed-ECDH suite families constrain. Fails on
    /// an empty chain, an undecodable leaf, or an EC key on a curve
    /// without an arithmetic backend; all of these are startup
    /// errors.
    pub fn new(key: PrivateKey, chain: Vec<Certificate>) -> Result<Self, Error> {
        let leaf = chain
            .first()
            .ok_or_else(|| Error::CertificateDecode("empty certificate chain".to_string()))?;
        let issuer_key_type = x509::signer_key_type(leaf)?;

        if let PrivateKey::Ec(ec) = &key {
            if !crypto::ec::curve_supported(ec.curve) {
                return Err(Error::InvalidConfig(format!(
                    "private key curve {:?} is not supported",
                    ec.curve
                )));
            }
        }

        Ok(Self {
            key,
            chain,
            issuer_key_type,
            suites: suites::default_suite_list(ProtocolVersion::TLSv1_2),
            prefer_server_order: false,
            verbose: false,
        })
    }

    /// Replace the server's own suite list (priority order).
    pub fn with_suites(mut self, suites: Vec<&'static CipherSuiteDescriptor>) -> Self {
        self.suites = suites;
        self
    }

    /// Walk the server's priority order during selection instead of
    /// the client's.
    pub fn with_server_preference(mut self, enforce: bool) -> Self {
        self.prefer_server_order = enforce;
        self
    }

    /// Narrate each client offer at debug level.
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// The certificate chain this policy presents, leaf first.
    pub fn chain(&self) -> &[Certificate] {
        &self.chain
    }

    /// The key type of the authority that signed the leaf.
    pub fn issuer_key_type(&self) -> SignatureAlgorithm {
        self.issuer_key_type
    }

    /// Wrap into the shared handle the engine registration wants.
    pub fn into_shared(self) -> Arc<dyn ServerPolicy> {
        Arc::new(self)
    }

    fn describe_offer(&self, ctx: &NegotiationContext<'_>) {
        debug!("client parameters:");
        debug!(
            "   maximum version: {}",
            ctx.client_max_version
                .as_str()
                .unwrap_or("unknown")
        );
        debug!("   compatible cipher suites:");
        for suite in ctx.offered {
            match suites::lookup(*suite) {
                Some(descriptor) => debug!("      {}", descriptor.name),
                None => debug!("      {:?}", suite),
            }
        }
        debug!("   common hash functions: {:?}", common_hashes(ctx.client_hashes));
    }
}

/// Hash identifiers usable for handshake signatures, strongest first.
/// MD5 alone is never picked.
const SIGNATURE_HASHES: [HashAlgorithm; 5] = [
    HashAlgorithm::SHA512,
    HashAlgorithm::SHA384,
    HashAlgorithm::SHA256,
    HashAlgorithm::SHA224,
    HashAlgorithm::SHA1,
];

fn strongest_hash(mask: u32) -> Option<HashAlgorithm> {
    SIGNATURE_HASHES
        .iter()
        .copied()
        .find(|&alg| mask & (1 << u8::from(alg)) != 0)
}

fn common_hashes(mask: u32) -> Vec<HashAlgorithm> {
    SIGNATURE_HASHES
        .iter()
        .rev()
        .copied()
        .filter(|&alg| mask & (1 << u8::from(alg)) != 0)
        .collect()
}

impl ServerPolicy for SingleKeyPolicy {
    fn select_suite(&self, ctx: &NegotiationContext<'_>) -> Result<SuiteChoice, Error> {
        if self.verbose {
            self.describe_offer(ctx);
        }

        let sig_hash = strongest_hash(ctx.client_hashes);
        let is_rsa = self.key.algorithm() == SignatureAlgorithm::RSA;
        let is_ec = self.key.algorithm() == SignatureAlgorithm::ECDSA;

        let candidates: Vec<CipherSuite> = if self.prefer_server_order {
            self.suites
                .iter()
                .map(|descriptor| descriptor.suite)
                .filter(|suite| ctx.offered.contains(suite))
                .collect()
        } else {
            ctx.offered.to_vec()
        };

        for suite in candidates {
            let Some(descriptor) = suites::lookup(suite) else {
                continue;
            };
            let choice = match descriptor.kx() {
                KeyExchangeAlgorithm::Rsa if is_rsa => SuiteChoice {
                    suite,
                    sig_hash: None,
                },
                KeyExchangeAlgorithm::EcdheRsa if is_rsa && sig_hash.is_some() => SuiteChoice {
                    suite,
                    sig_hash,
                },
                KeyExchangeAlgorithm::EcdheEcdsa if is_ec && sig_hash.is_some() => SuiteChoice {
                    suite,
                    sig_hash,
                },
                KeyExchangeAlgorithm::EcdhRsa
                    if is_ec && self.issuer_key_type == SignatureAlgorithm::RSA =>
                {
                    SuiteChoice {
                        suite,
                        sig_hash: None,
                    }
                }
                KeyExchangeAlgorithm::EcdhEcdsa
                    if is_ec && self.issuer_key_type == SignatureAlgorithm::ECDSA =>
                {
                    SuiteChoice {
                        suite,
                        sig_hash: None,
                    }
                }
                _ => continue,
            };
            if self.verbose {
                debug!("using: {}", descriptor.name);
            }
            return Ok(choice);
        }

        warn!("no cipher suite in common with the client");
        Err(Error::NoSuiteAgreement)
    }

    fn key_exchange(&self, share: &mut [u8]) -> Result<usize, Error> {
        let result = match &self.key {
            PrivateKey::Rsa(key) => crypto::rsa::ssl_decrypt(key, share)?,
            PrivateKey::Ec(key) => crypto::ec::point_mul(key.curve, share, &key.x)?,
        };
        if result.len() > share.len() {
            return Err(Error::Crypto(CryptoFailure::BufferTooSmall {
                needed: result.len(),
                available: share.len(),
            }));
        }
        share[..result.len()].copy_from_slice(&result);
        Ok(result.len())
    }

    fn sign(
        &self,
        hash: HashAlgorithm,
        hash_value: &[u8],
        output: &mut [u8],
    ) -> Result<usize, Error> {
        match &self.key {
            PrivateKey::Rsa(key) => {
                if hash != HashAlgorithm::NONE && crypto::digest_len(hash).is_none() {
                    return Err(Error::Crypto(CryptoFailure::UnknownHash(hash)));
                }
                let sig_len = key.modulus_len();
                if output.len() < sig_len {
                    return Err(Error::Crypto(CryptoFailure::BufferTooSmall {
                        needed: sig_len,
                        available: output.len(),
                    }));
                }
                let signature = crypto::rsa::pkcs1_sign(key, hash, hash_value)?;
                output[..sig_len].copy_from_slice(&signature);
                Ok(sig_len)
            }
            PrivateKey::Ec(key) => {
                if crypto::digest_len(hash).is_none() {
                    return Err(Error::Crypto(CryptoFailure::UnknownHash(hash)));
                }
                if output.len() < crypto::ECDSA_MAX_SIG_LEN {
                    return Err(Error::Crypto(CryptoFailure::BufferTooSmall {
                        needed: crypto::ECDSA_MAX_SIG_LEN,
                        available: output.len(),
                    }));
                }
                let signature = crypto::ec::sign_asn1(key.curve, &key.x, hash_value)?;
                output[..signature.len()].copy_from_slice(&signature);
                Ok(signature.len())
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::keys;
    use std::path::Path;

    fn rsa_policy() -> SingleKeyPolicy {
        let key = keys::decode_private_key(include_bytes!("../testdata/rsa2048.pem")).unwrap();
        let chain = keys::load_certificates(Path::new("testdata/rsa-selfsigned.pem")).unwrap();
        SingleKeyPolicy::new(key, chain).unwrap()
    }

    fn ec_policy_rsa_issuer() -> SingleKeyPolicy {
        let key = keys::decode_private_key(include_bytes!("../testdata/p256.pem")).unwrap();
        let chain = keys::load_certificates(Path::new("testdata/chain-ec-rsa.pem")).unwrap();
        SingleKeyPolicy::new(key, chain).unwrap()
    }

    fn ec_policy_ec_issuer() -> SingleKeyPolicy {
        let key = keys::decode_private_key(include_bytes!("../testdata/p256.pem")).unwrap();
        let chain = keys::load_certificates(Path::new("testdata/ec-selfsigned.pem")).unwrap();
        SingleKeyPolicy::new(key, chain).unwrap()
    }

    const SHA256_BIT: u32 = 1 << 4;
    const SHA1_BIT: u32 = 1 << 2;

    fn ctx(offered: &[CipherSuite], hashes: u32) -> NegotiationContext<'_> {
        NegotiationContext {
            offered,
            client_hashes: hashes,
            client_max_version: ProtocolVersion::TLSv1_2,
        }
    }

    #[test]
    fn rsa_key_never_selects_an_ecdsa_suite() {
        let policy = rsa_policy();
        let offered = [
            CipherSuite::TLS_ECDHE_ECDSA_WITH_AES_128_GCM_SHA256,
            CipherSuite::TLS_ECDH_ECDSA_WITH_AES_128_GCM_SHA256,
            CipherSuite::TLS_RSA_WITH_AES_128_CBC_SHA,
        ];
        let choice = policy.select_suite(&ctx(&offered, SHA256_BIT)).unwrap();
        assert_eq!(choice.suite, CipherSuite::TLS_RSA_WITH_AES_128_CBC_SHA);
        assert_eq!(choice.sig_hash, None);
    }

    #[test]
    fn ec_key_never_selects_a_plain_rsa_suite() {
        let policy = ec_policy_rsa_issuer();
        let offered = [
            CipherSuite::TLS_RSA_WITH_AES_128_GCM_SHA256,
            CipherSuite::TLS_ECDH_ECDSA_WITH_AES_128_GCM_SHA256,
            CipherSuite::TLS_ECDH_RSA_WITH_AES_128_GCM_SHA256,
        ];
        // the RSA-signed EC certificate admits ECDH_RSA, not ECDH_ECDSA
        let choice = policy.select_suite(&ctx(&offered, SHA256_BIT)).unwrap();
        assert_eq!(
            choice.suite,
            CipherSuite::TLS_ECDH_RSA_WITH_AES_128_GCM_SHA256
        );
    }

    #[test]
    fn fixed_ecdh_follows_the_issuer_key_type() {
        let policy = ec_policy_ec_issuer();
        let offered = [
            CipherSuite::TLS_ECDH_RSA_WITH_AES_128_GCM_SHA256,
            CipherSuite::TLS_ECDH_ECDSA_WITH_AES_128_GCM_SHA256,
        ];
        let choice = policy.select_suite(&ctx(&offered, SHA256_BIT)).unwrap();
        assert_eq!(
            choice.suite,
            CipherSuite::TLS_ECDH_ECDSA_WITH_AES_128_GCM_SHA256
        );
    }

    #[test]
    fn client_order_wins_by_default() {
        let policy = rsa_policy();
        let offered = [
            CipherSuite::TLS_ECDHE_RSA_WITH_AES_256_GCM_SHA384,
            CipherSuite::TLS_ECDHE_RSA_WITH_AES_128_GCM_SHA256,
        ];
        let choice = policy.select_suite(&ctx(&offered, SHA256_BIT)).unwrap();
        assert_eq!(
            choice.suite,
            CipherSuite::TLS_ECDHE_RSA_WITH_AES_256_GCM_SHA384
        );
    }

    #[test]
    fn server_preference_walks_the_catalog_order() {
        let policy = rsa_policy().with_server_preference(true);
        // client prefers AES-256; the catalog ranks AES-128-GCM first
        let offered = [
            CipherSuite::TLS_ECDHE_RSA_WITH_AES_256_GCM_SHA384,
            CipherSuite::TLS_ECDHE_RSA_WITH_AES_128_GCM_SHA256,
        ];
        let choice = policy.select_suite(&ctx(&offered, SHA256_BIT)).unwrap();
        assert_eq!(
            choice.suite,
            CipherSuite::TLS_ECDHE_RSA_WITH_AES_128_GCM_SHA256
        );
    }

    #[test]
    fn ecdhe_picks_the_strongest_common_hash() {
        let policy = rsa_policy();
        let offered = [CipherSuite::TLS_ECDHE_RSA_WITH_AES_128_GCM_SHA256];
        let choice = policy
            .select_suite(&ctx(&offered, SHA256_BIT | SHA1_BIT))
            .unwrap();
        assert_eq!(choice.sig_hash, Some(HashAlgorithm::SHA256));
    }

    #[test]
    fn ecdhe_needs_a_common_hash() {
        let policy = rsa_policy();
        let offered = [
            CipherSuite::TLS_ECDHE_RSA_WITH_AES_128_GCM_SHA256,
            CipherSuite::TLS_RSA_WITH_AES_128_GCM_SHA256,
        ];
        // no common hash: the ECDHE candidate is skipped, plain RSA works
        let choice = policy.select_suite(&ctx(&offered, 0)).unwrap();
        assert_eq!(choice.suite, CipherSuite::TLS_RSA_WITH_AES_128_GCM_SHA256);
    }

    #[test]
    fn disagreement_is_signaled() {
        let policy = rsa_policy();
        let offered = [CipherSuite::TLS_ECDHE_ECDSA_WITH_AES_128_GCM_SHA256];
        assert_eq!(
            policy.select_suite(&ctx(&offered, SHA256_BIT)).unwrap_err(),
            Error::NoSuiteAgreement
        );
    }

    #[test]
    fn rsa_signature_length_and_buffer_bound() {
        let policy = rsa_policy();
        let hv = [0x5a; 36];

        let mut output = [0u8; 256];
        let written = policy
            .sign(HashAlgorithm::NONE, &hv, &mut output)
            .unwrap();
        assert_eq!(written, 256);

        let mut short = [0u8; 255];
        let err = policy.sign(HashAlgorithm::NONE, &hv, &mut short).unwrap_err();
        assert_eq!(
            err,
            Error::Crypto(CryptoFailure::BufferTooSmall {
                needed: 256,
                available: 255
            })
        );
    }

    #[test]
    fn unknown_hash_fails_without_writing() {
        let policy = ec_policy_ec_issuer();
        let mut output = [0u8; 256];
        let err = policy
            .sign(HashAlgorithm::from(9), &[0u8; 32], &mut output)
            .unwrap_err();
        assert_eq!(err, Error::Crypto(CryptoFailure::UnknownHash(HashAlgorithm::from(9))));
        assert_eq!(output, [0u8; 256]);
    }

    #[test]
    fn p521_keys_are_rejected_at_construction() {
        let key = keys::decode_private_key(include_bytes!("../testdata/p521.pem")).unwrap();
        let chain = keys::load_certificates(Path::new("testdata/ec-selfsigned.pem")).unwrap();
        assert!(matches!(
            SingleKeyPolicy::new(key, chain).unwrap_err(),
            Error::InvalidConfig(_)
        ));
    }

    #[test]
    fn empty_chain_is_rejected() {
        let key = keys::decode_private_key(include_bytes!("../testdata/rsa2048.pem")).unwrap();
        assert!(matches!(
            SingleKeyPolicy::new(key, Vec::new()).unwrap_err(),
            Error::CertificateDecode(_)
        ));
    }
}
