//! # unitls
//!
//! Server-side decision logic for a TLS terminator: private-key
//! decoding, cipher-suite selection against a configured key and
//! certificate chain, the server-side cryptographic operations the
//! handshake needs (RSA decryption and PKCS#1 signing, EC point
//! multiplication, ECDSA signing), and a deliberately single-slot
//! accept loop that serves one client connection to completion before
//! accepting the next.
//!
//! The TLS record and handshake state machine itself is *not* here: it
//! is an external collaborator reached through the
//! [`engine::HandshakeEngine`] trait, which this crate's
//! [`server::Dispatcher`] drives once per accepted connection. The
//! policy side of the boundary is the [`policy::ServerPolicy`] trait;
//! [`policy::SingleKeyPolicy`] is the standard implementation holding
//! one private key and one certificate chain for the process lifetime.
//!
//! ## Overview
//!
//! * [`keys`] turns an on-disk key encoding (DER, or a labeled PEM
//!   container) into a typed [`key::PrivateKey`].
//! * [`suites`] is the static cipher-suite catalog: identifiers,
//!   requirement flags and key-exchange family classification.
//! * [`policy`] selects a mutually compatible suite for a client offer
//!   and performs the corresponding private-key operation.
//! * [`server`] binds a listening socket and serializes handshakes,
//!   one connection in flight at a time.
//! * [`config`] models the operator-facing option set and its
//!   documented defaults, and validates it before startup.

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    elided_lifetimes_in_paths,
    trivial_numeric_casts,
    unused_import_braces,
    unused_qualifications
)]

#[macro_use]
mod macros;

pub mod config;
mod crypto;
pub mod engine;
pub mod enums;
pub mod error;
pub mod key;
pub mod keys;
pub mod pemfile;
pub mod policy;
pub mod server;
pub mod suites;
mod x509;

pub use crate::enums::{CipherSuite, HashAlgorithm, NamedCurve, ProtocolVersion, SignatureAlgorithm};
pub use crate::error::Error;
pub use crate::key::{Certificate, PrivateKey};
pub use crate::policy::{NegotiationContext, ServerPolicy, SingleKeyPolicy, SuiteChoice};
pub use crate::server::Dispatcher;
