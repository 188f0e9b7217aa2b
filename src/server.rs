//! The single-slot connection dispatcher.
//!
//! One client is served to completion before the next is accepted;
//! nothing here multiplexes. The surrounding tool relays a single
//! connection's plaintext to process-level streams, so a second
//! in-flight connection would have nowhere to go.

use std::io;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr, TcpListener, TcpStream, ToSocketAddrs};
use std::sync::Arc;

use log::{debug, error, warn};

use crate::engine::{HandshakeEngine, StoresSessions, STATUS_WARNING};
use crate::error::Error;
use crate::policy::ServerPolicy;

/// Owns the listening socket and serializes client handshakes.
pub struct Dispatcher {
    listener: TcpListener,
}

impl Dispatcher {
    /// Resolve `host` (or the wildcard address when absent) and bind
    /// the first candidate that accepts us, with address reuse
    /// applied. Failure of every candidate is fatal to the process.
    pub fn bind(host: Option<&str>, port: u16) -> Result<Self, Error> {
        let candidates: Vec<SocketAddr> = match host {
            Some(host) => (host, port)
                .to_socket_addrs()
                .map_err(|e| Error::Bind(e.kind()))?
                .collect(),
            None => vec![
                SocketAddr::new(IpAddr::V6(Ipv6Addr::UNSPECIFIED), port),
                SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), port),
            ],
        };

        let mut last_kind = io::ErrorKind::AddrNotAvailable;
        for addr in candidates {
            debug!("binding to: {}", addr);
            match TcpListener::bind(addr) {
                Ok(listener) => return Ok(Self { listener }),
                Err(e) => {
                    warn!("bind {} failed: {}", addr, e);
                    last_kind = e.kind();
                }
            }
        }
        error!("failed to bind any address");
        Err(Error::Bind(last_kind))
    }

    /// The address the listener actually bound.
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Block until one client connects. The accepted socket is
    /// switched to non-blocking mode before it is returned, since the
    /// engine organizes its own I/O readiness polling from there on.
    pub fn accept_one(&self) -> Result<TcpStream, Error> {
        let (socket, peer) = self
            .listener
            .accept()
            .map_err(|e| Error::Accept(e.kind()))?;
        debug!("accepting connection from: {}", peer);
        socket
            .set_nonblocking(true)
            .map_err(|e| Error::Accept(e.kind()))?;
        Ok(socket)
    }

    /// Register `policy` and `cache` with the engine, then run the
    /// dispatch loop until something fatal happens.
    pub fn serve(
        &self,
        engine: &mut dyn HandshakeEngine,
        policy: Arc<dyn ServerPolicy>,
        cache: Arc<dyn StoresSessions>,
    ) -> Result<(), Error> {
        engine.set_policy(policy);
        engine.set_session_cache(cache);
        self.run_loop(engine)
    }

    /// Accept clients forever, one at a time: accept, reset the
    /// engine, hand over the socket, repeat. A warning-level status
    /// from the engine is logged and the loop continues; a status
    /// below the warning level terminates the loop, as does any
    /// accept failure.
    pub fn run_loop(&self, engine: &mut dyn HandshakeEngine) -> Result<(), Error> {
        loop {
            let socket = self.accept_one()?;
            engine.reset();
            let status = engine.run(socket);
            if status < STATUS_WARNING {
                error!("engine reported fatal status {}", status);
                return Err(Error::General(format!(
                    "handshake engine failed with status {}",
                    status
                )));
            }
            if status == STATUS_WARNING {
                warn!("connection closed with a warning");
            } else {
                debug!("connection closed (status {})", status);
            }
        }
    }
}
