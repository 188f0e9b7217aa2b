//! The operator-facing option set and its documented defaults.
//!
//! These are plain data: a front-end collects them (command line,
//! config file, whatever) and this module validates the combination
//! before anything binds or negotiates. Every option carries a
//! documented default.

use std::path::PathBuf;

use crate::enums::{HashAlgorithm, ProtocolVersion};
use crate::error::Error;
use crate::suites::{
    self, CipherSuiteDescriptor, REQ_SHA1, REQ_SHA256, REQ_SHA384, REQ_TLS12,
};

/// The default listening port.
pub const DEFAULT_PORT: u16 = 4433;

/// Default byte budget for the session cache.
pub const DEFAULT_SESSION_CACHE_BYTES: usize = 5000;

/// Engine I/O buffer size for bidirectional buffering.
pub const BUFSIZE_BIDI: usize = 33178;

/// Engine I/O buffer size for monodirectional buffering.
pub const BUFSIZE_MONO: usize = 16709;

/// Bitmask covering every hash function the engine can enable.
pub const ALL_HASHES: u32 = (1 << 1) | (1 << 2) | (1 << 3) | (1 << 4) | (1 << 5) | (1 << 6);

/// Everything the operator can configure, with the documented
/// defaults filled in by [`Default`].
#[derive(Debug, Clone)]
pub struct ServerOptions {
    /// Address or host name to bind; `None` means every interface.
    pub bind_host: Option<String>,
    /// Port to bind.
    pub port: u16,
    /// Minimum protocol version offered.
    pub min_version: ProtocolVersion,
    /// Maximum protocol version offered.
    pub max_version: ProtocolVersion,
    /// Explicit cipher-suite list, server priority order. `None`
    /// selects the catalog default filtered by `max_version`.
    pub suites: Option<Vec<&'static CipherSuiteDescriptor>>,
    /// Bitmask of enabled hash functions, indexed by hash identifier.
    pub hashes: u32,
    /// Explicit engine I/O buffer length. `None` sizes it from
    /// `bidirectional`.
    pub io_buffer: Option<usize>,
    /// Whether the engine buffers both directions at once.
    pub bidirectional: bool,
    /// Byte budget for the session cache.
    pub session_cache_bytes: usize,
    /// Walk the server's suite order during selection instead of the
    /// client's.
    pub prefer_server_order: bool,
    /// Narrate negotiation decisions.
    pub verbose: bool,
    /// Path of the certificate chain file.
    pub cert_file: Option<PathBuf>,
    /// Path of the private key file.
    pub key_file: Option<PathBuf>,
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self {
            bind_host: None,
            port: DEFAULT_PORT,
            min_version: ProtocolVersion::TLSv1_0,
            max_version: ProtocolVersion::TLSv1_2,
            suites: None,
            hashes: ALL_HASHES,
            io_buffer: None,
            bidirectional: true,
            session_cache_bytes: DEFAULT_SESSION_CACHE_BYTES,
            prefer_server_order: false,
            verbose: false,
            cert_file: None,
            key_file: None,
        }
    }
}

impl ServerOptions {
    /// The suite list selection will use: the explicit one, or the
    /// catalog default under the version ceiling.
    pub fn effective_suites(&self) -> Vec<&'static CipherSuiteDescriptor> {
        match &self.suites {
            Some(list) => list.clone(),
            None => suites::default_suite_list(self.max_version),
        }
    }

    /// The engine I/O buffer length implied by the options.
    pub fn io_buffer_len(&self) -> usize {
        self.io_buffer.unwrap_or(if self.bidirectional {
            BUFSIZE_BIDI
        } else {
            BUFSIZE_MONO
        })
    }

    fn hash_enabled(&self, alg: HashAlgorithm) -> bool {
        self.hashes & (1 << u8::from(alg)) != 0
    }

    /// Check the option combination the way startup does: a usable
    /// version range, hash support for the version floor, and every
    /// selected suite's requirements satisfiable.
    pub fn validate(&self) -> Result<(), Error> {
        if u16::from(self.max_version) < u16::from(self.min_version) {
            return Err(Error::InvalidConfig(
                "impossible minimum/maximum protocol version combination".to_string(),
            ));
        }

        if u16::from(self.min_version) <= u16::from(ProtocolVersion::TLSv1_1) {
            if !self.hash_enabled(HashAlgorithm::MD5) {
                return Err(Error::InvalidConfig(
                    "TLS 1.0 and 1.1 need MD5".to_string(),
                ));
            }
            if !self.hash_enabled(HashAlgorithm::SHA1) {
                return Err(Error::InvalidConfig(
                    "TLS 1.0 and 1.1 need SHA-1".to_string(),
                ));
            }
        }

        let tls12_ok = u16::from(self.max_version) >= u16::from(ProtocolVersion::TLSv1_2);
        for descriptor in self.effective_suites() {
            if descriptor.requires(REQ_TLS12) && !tls12_ok {
                return Err(Error::InvalidConfig(format!(
                    "cipher suite {} requires TLS 1.2",
                    descriptor.name
                )));
            }
            for (flag, alg, name) in [
                (REQ_SHA1, HashAlgorithm::SHA1, "SHA-1"),
                (REQ_SHA256, HashAlgorithm::SHA256, "SHA-256"),
                (REQ_SHA384, HashAlgorithm::SHA384, "SHA-384"),
            ] {
                if descriptor.requires(flag) && !self.hash_enabled(alg) {
                    return Err(Error::InvalidConfig(format!(
                        "cipher suite {} requires {}",
                        descriptor.name, name
                    )));
                }
            }
        }

        Ok(())
    }
}

/// Look up a protocol version by its usual spelling.
pub fn lookup_version(name: &str) -> Option<ProtocolVersion> {
    match name.to_ascii_lowercase().as_str() {
        "ssl3.0" | "sslv3" => Some(ProtocolVersion::SSLv3),
        "tls1.0" | "tls10" => Some(ProtocolVersion::TLSv1_0),
        "tls1.1" | "tls11" => Some(ProtocolVersion::TLSv1_1),
        "tls1.2" | "tls12" => Some(ProtocolVersion::TLSv1_2),
        _ => None,
    }
}

/// Look up a hash function by name.
pub fn lookup_hash(name: &str) -> Option<HashAlgorithm> {
    match name.to_ascii_lowercase().as_str() {
        "md5" => Some(HashAlgorithm::MD5),
        "sha1" => Some(HashAlgorithm::SHA1),
        "sha224" => Some(HashAlgorithm::SHA224),
        "sha256" => Some(HashAlgorithm::SHA256),
        "sha384" => Some(HashAlgorithm::SHA384),
        "sha512" => Some(HashAlgorithm::SHA512),
        _ => None,
    }
}

/// Resolve a comma-or-list of suite names into descriptors, erring on
/// the first name the catalog does not know.
pub fn lookup_suites<S: AsRef<str>>(
    names: &[S],
) -> Result<Vec<&'static CipherSuiteDescriptor>, Error> {
    let mut out = Vec::with_capacity(names.len());
    for name in names {
        match suites::find_suite(name.as_ref()) {
            Some(descriptor) => out.push(descriptor),
            None => {
                return Err(Error::InvalidConfig(format!(
                    "unrecognized cipher suite name '{}'",
                    name.as_ref()
                )))
            }
        }
    }
    Ok(out)
}

/// Collapse a list of hash functions into the enabled-hash bitmask.
pub fn hash_mask(hashes: &[HashAlgorithm]) -> u32 {
    hashes
        .iter()
        .fold(0, |mask, &alg| mask | (1 << u8::from(alg)))
}
