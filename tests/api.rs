//! Crate-level tests: the decode pipeline feeding the policy, the
//! policy feeding the engine boundary, and the dispatch loop over real
//! loopback sockets.

use std::io;
use std::net::{TcpStream, ToSocketAddrs};
use std::path::Path;
use std::sync::Arc;
use std::thread;

use num_bigint_dig::BigUint;
use sha2::{Digest, Sha256};

use unitls::config::{self, ServerOptions};
use unitls::engine::{HandshakeEngine, SessionMemoryCache, StoresSessions};
use unitls::keys;
use unitls::suites;
use unitls::{
    CipherSuite, Dispatcher, Error, HashAlgorithm, NegotiationContext, PrivateKey,
    ProtocolVersion, ServerPolicy, SingleKeyPolicy,
};

const SHA256_BIT: u32 = 1 << 4;

fn rsa_policy() -> SingleKeyPolicy {
    let key = keys::load_private_key(Path::new("testdata/rsa2048.pem")).unwrap();
    let chain = keys::load_certificates(Path::new("testdata/rsa-selfsigned.pem")).unwrap();
    SingleKeyPolicy::new(key, chain).unwrap()
}

fn rsa_public_parts() -> (BigUint, BigUint) {
    let key = keys::load_private_key(Path::new("testdata/rsa2048.pem")).unwrap();
    let PrivateKey::Rsa(rsa) = key else {
        panic!("expected an RSA key");
    };
    let n = BigUint::from_bytes_be(&rsa.p) * BigUint::from_bytes_be(&rsa.q);
    (n, BigUint::from(65537u32))
}

#[test]
fn rsa2048_ecdhe_gcm_sha256_end_to_end() {
    let _ = env_logger::builder().is_test(true).try_init();

    let policy = rsa_policy().with_verbose(true);
    let offered = [CipherSuite::TLS_ECDHE_RSA_WITH_AES_128_GCM_SHA256];
    let choice = policy
        .select_suite(&NegotiationContext {
            offered: &offered,
            client_hashes: SHA256_BIT,
            client_max_version: ProtocolVersion::TLSv1_2,
        })
        .unwrap();

    assert_eq!(
        choice.suite,
        CipherSuite::TLS_ECDHE_RSA_WITH_AES_128_GCM_SHA256
    );
    assert_eq!(choice.sig_hash, Some(HashAlgorithm::SHA256));

    // then the engine asks for the ServerKeyExchange signature
    let digest = Sha256::digest(b"client random, server random, curve params");
    let mut output = [0u8; 512];
    let written = policy
        .sign(choice.sig_hash.unwrap(), &digest, &mut output)
        .unwrap();
    assert_eq!(written, 256);

    // and the result verifies under the public exponent
    let (n, e) = rsa_public_parts();
    let recovered = BigUint::from_bytes_be(&output[..written])
        .modpow(&e, &n)
        .to_bytes_be();
    assert!(recovered.ends_with(digest.as_slice()));
}

#[test]
fn rsa_key_exchange_decrypts_in_place() {
    let policy = rsa_policy();
    let (n, e) = rsa_public_parts();

    // a type-2 padded premaster, encrypted to the server's public key
    let premaster = [0x17u8; 48];
    let mut em = vec![0xbbu8; 256];
    em[0] = 0x00;
    em[1] = 0x02;
    em[256 - 48 - 1] = 0x00;
    em[256 - 48..].copy_from_slice(&premaster);

    let c = BigUint::from_bytes_be(&em).modpow(&e, &n).to_bytes_be();
    let mut share = vec![0u8; 256];
    share[256 - c.len()..].copy_from_slice(&c);

    let written = policy.key_exchange(&mut share).unwrap();
    assert_eq!(written, 48);
    assert_eq!(&share[..written], &premaster);
}

#[test]
fn ec_key_exchange_multiplies_the_peer_point() {
    use p256::elliptic_curve::sec1::ToEncodedPoint;

    let key = keys::load_private_key(Path::new("testdata/p256.pem")).unwrap();
    let chain = keys::load_certificates(Path::new("testdata/ec-selfsigned.pem")).unwrap();
    let policy = SingleKeyPolicy::new(key.clone(), chain).unwrap();

    // with the generator as the peer share, the product is the public
    // key matching the private scalar
    let PrivateKey::Ec(ec) = key else {
        panic!("expected an EC key");
    };
    let expected = p256::SecretKey::from_slice(&ec.x)
        .unwrap()
        .public_key()
        .to_encoded_point(false);

    let generator = p256::AffinePoint::GENERATOR.to_encoded_point(false);
    let mut share = [0u8; 80];
    share[..65].copy_from_slice(generator.as_bytes());

    let written = policy.key_exchange(&mut share[..65]).unwrap();
    assert_eq!(written, 65);
    assert_eq!(&share[..written], expected.as_bytes());
}

#[test]
fn options_build_a_working_policy() {
    let options = ServerOptions {
        suites: Some(config::lookup_suites(&["ECDHE_RSA_AES_128_GCM_SHA256"]).unwrap()),
        prefer_server_order: true,
        ..Default::default()
    };
    options.validate().unwrap();

    let key = keys::load_private_key(Path::new("testdata/rsa2048.pem")).unwrap();
    let chain = keys::load_certificates(Path::new("testdata/rsa-selfsigned.pem")).unwrap();
    let policy = SingleKeyPolicy::new(key, chain)
        .unwrap()
        .with_suites(options.effective_suites())
        .with_server_preference(options.prefer_server_order);

    // the configured list constrains server-preference selection
    let offered = [
        CipherSuite::TLS_RSA_WITH_AES_128_CBC_SHA,
        CipherSuite::TLS_ECDHE_RSA_WITH_AES_128_GCM_SHA256,
    ];
    let choice = policy
        .select_suite(&NegotiationContext {
            offered: &offered,
            client_hashes: SHA256_BIT,
            client_max_version: ProtocolVersion::TLSv1_2,
        })
        .unwrap();
    assert_eq!(
        choice.suite,
        CipherSuite::TLS_ECDHE_RSA_WITH_AES_128_GCM_SHA256
    );
}

/// An engine stand-in that plays back a scripted status per
/// connection and records the registration calls.
struct ScriptedEngine {
    statuses: Vec<i32>,
    resets: usize,
    saw_policy: bool,
    saw_cache: bool,
}

impl ScriptedEngine {
    fn new(statuses: &[i32]) -> Self {
        Self {
            statuses: statuses.to_vec(),
            resets: 0,
            saw_policy: false,
            saw_cache: false,
        }
    }
}

impl HandshakeEngine for ScriptedEngine {
    fn set_policy(&mut self, _policy: Arc<dyn ServerPolicy>) {
        self.saw_policy = true;
    }

    fn set_session_cache(&mut self, _cache: Arc<dyn StoresSessions>) {
        self.saw_cache = true;
    }

    fn reset(&mut self) {
        self.resets += 1;
    }

    fn run(&mut self, socket: TcpStream) -> i32 {
        drop(socket);
        self.statuses.remove(0)
    }
}

#[test]
fn run_loop_tolerates_warnings_and_stops_on_fatal() {
    let dispatcher = Dispatcher::bind(Some("127.0.0.1"), 0).unwrap();
    let addr = dispatcher.local_addr().unwrap();

    let client = thread::spawn(move || {
        for _ in 0..3 {
            let _ = TcpStream::connect(addr).unwrap();
        }
    });

    let mut engine = ScriptedEngine::new(&[0, -1, -2]);
    let err = dispatcher
        .serve(
            &mut engine,
            rsa_policy().into_shared(),
            SessionMemoryCache::new(config::DEFAULT_SESSION_CACHE_BYTES),
        )
        .unwrap_err();

    client.join().unwrap();
    assert!(matches!(err, Error::General(_)));
    assert!(engine.saw_policy);
    assert!(engine.saw_cache);
    // one reset per accepted connection, warning included
    assert_eq!(engine.resets, 3);
}

#[test]
fn wildcard_bind_on_the_default_port() {
    match Dispatcher::bind(None, config::DEFAULT_PORT) {
        Ok(dispatcher) => {
            let addr = dispatcher.local_addr().unwrap();
            assert!(addr.ip().is_unspecified());
            assert_eq!(addr.port(), 4433);
        }
        // the environment may already be using 4433; that is the only
        // acceptable failure
        Err(Error::Bind(kind)) => assert_eq!(kind, io::ErrorKind::AddrInUse),
        Err(other) => panic!("unexpected error: {}", other),
    }
}

#[test]
fn resolved_bind_addresses_reach_the_listener() {
    let dispatcher = Dispatcher::bind(Some("localhost"), 0).unwrap();
    let port = dispatcher.local_addr().unwrap().port();

    let resolved: Vec<_> = ("localhost", port).to_socket_addrs().unwrap().collect();
    assert!(!resolved.is_empty());

    let client = thread::spawn(move || TcpStream::connect(("localhost", port)).unwrap());
    let accepted = dispatcher.accept_one().unwrap();
    assert!(accepted.peer_addr().unwrap().ip().is_loopback());
    client.join().unwrap();
}

#[test]
fn default_suite_list_matches_the_catalog_order() {
    let options = ServerOptions::default();
    let effective = options.effective_suites();
    let catalog: Vec<_> = suites::ALL_CIPHER_SUITES.iter().collect();
    assert_eq!(effective, catalog);
}
