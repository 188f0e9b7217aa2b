//! The boundary to the external handshake/record engine.
//!
//! Everything that actually speaks TLS on the wire lives behind
//! [`HandshakeEngine`]. The dispatcher registers the policy and the
//! session cache once at startup, then drives `reset`/`run` once per
//! accepted connection.

use std::collections::HashMap;
use std::net::TcpStream;
use std::sync::{Arc, Mutex};

use crate::policy::ServerPolicy;

/// `run` statuses at or above this value mean the connection completed
/// cleanly; exactly one below it is a warning. Anything lower is fatal
/// to the process.
pub const STATUS_WARNING: i32 = -1;

/// The handshake/record engine contract.
///
/// `run` drives one connection to completion and reports a signed
/// status: zero or positive for a clean close, −1 for completion with
/// a warning, and anything below −1 for a failure the process must not
/// paper over.
pub trait HandshakeEngine {
    /// Register the policy consulted during negotiation. Called once,
    /// before any connection is accepted.
    fn set_policy(&mut self, policy: Arc<dyn ServerPolicy>);

    /// Register the store for resumable session state. Called once,
    /// before any connection is accepted.
    fn set_session_cache(&mut self, cache: Arc<dyn StoresSessions>);

    /// Return the engine to its initial state. Called once per
    /// accepted connection, before `run`.
    fn reset(&mut self);

    /// Run the handshake and data relay over `socket` to completion.
    /// Dropping the socket (and thereby closing it) is the engine's
    /// side of the bargain.
    fn run(&mut self, socket: TcpStream) -> i32;
}

/// Something which can store and recall sessions by identifier, so a
/// returning client can skip the full handshake.
pub trait StoresSessions: Send + Sync {
    /// Store `value` under `id`. Returns false when the store declined
    /// to keep it.
    fn put(&self, id: Vec<u8>, value: Vec<u8>) -> bool;

    /// Recall the value stored under `id`, refreshing its place in any
    /// eviction order.
    fn get(&self, id: &[u8]) -> Option<Vec<u8>>;

    /// Remove and return the value stored under `id`.
    fn take(&self, id: &[u8]) -> Option<Vec<u8>>;
}

/// An in-memory [`StoresSessions`] bounded by a byte budget.
///
/// Entries are evicted least-recently-used first once the budget would
/// be exceeded. An entry larger than the whole budget is refused.
pub struct SessionMemoryCache {
    inner: Mutex<CacheInner>,
}

struct CacheInner {
    capacity: usize,
    used: usize,
    entries: HashMap<Vec<u8>, Vec<u8>>,
    order: Vec<Vec<u8>>,
}

impl SessionMemoryCache {
    /// Make a new cache holding at most `capacity` bytes of ids plus
    /// values.
    pub fn new(capacity: usize) -> Arc<Self> {
        Arc::new(Self {
            inner: Mutex::new(CacheInner {
                capacity,
                used: 0,
                entries: HashMap::new(),
                order: Vec::new(),
            }),
        })
    }
}

impl CacheInner {
    fn touch(&mut self, id: &[u8]) {
        if let Some(at) = self.order.iter().position(|entry| entry == id) {
            let entry = self.order.remove(at);
            self.order.push(entry);
        }
    }

    fn remove(&mut self, id: &[u8]) -> Option<Vec<u8>> {
        let value = self.entries.remove(id)?;
        self.used -= id.len() + value.len();
        if let Some(at) = self.order.iter().position(|entry| entry == id) {
            self.order.remove(at);
        }
        Some(value)
    }
}

impl StoresSessions for SessionMemoryCache {
    fn put(&self, id: Vec<u8>, value: Vec<u8>) -> bool {
        let mut inner = self.inner.lock().unwrap();
        let cost = id.len() + value.len();
        if cost > inner.capacity {
            return false;
        }
        inner.remove(&id);
        while inner.used + cost > inner.capacity {
            let oldest = inner.order[0].clone();
            inner.remove(&oldest);
        }
        inner.used += cost;
        inner.order.push(id.clone());
        inner.entries.insert(id, value);
        true
    }

    fn get(&self, id: &[u8]) -> Option<Vec<u8>> {
        let mut inner = self.inner.lock().unwrap();
        let value = inner.entries.get(id).cloned()?;
        inner.touch(id);
        Some(value)
    }

    fn take(&self, id: &[u8]) -> Option<Vec<u8>> {
        self.inner.lock().unwrap().remove(id)
    }
}
