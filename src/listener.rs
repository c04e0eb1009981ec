//! UDP listener for OSC messages from the synth patch
//!
//! # Lifecycle
//!
//! ```text
//! OscListener::bind()   Unstarted -> Bound    (bind failure is fatal)
//! OscListener::serve()  Bound     -> Serving  (never returns)
//! process exit          Serving   -> Stopped
//! ```
//!
//! The receive loop blocks on its socket with no timeout. Decode errors,
//! receive errors and handler errors are logged and the loop moves on to the
//! next datagram. There is no shutdown flag: the listener runs on a detached
//! thread for the life of the process.

use crate::error::{Error, Result};
use crate::router::{DispatchStats, Router};
use std::net::{SocketAddr, UdpSocket};
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Maximum UDP payload; smaller buffers truncate long datagrams
const MAX_DATAGRAM_SIZE: usize = 65536;

/// Pause after a failed receive so a persistent socket error cannot spin
const RECV_ERROR_BACKOFF: Duration = Duration::from_millis(10);

/// Bound OSC listener
pub struct OscListener {
    socket: UdpSocket,
    local_addr: SocketAddr,
    router: Router,
}

impl OscListener {
    /// Bind the local endpoint (`host:port`)
    pub fn bind(addr: &str, router: Router) -> Result<Self> {
        let socket = UdpSocket::bind(addr).map_err(|source| Error::Bind {
            addr: addr.to_string(),
            source,
        })?;
        let local_addr = socket.local_addr()?;

        log::info!("Listening on {} for synth settings", local_addr);

        Ok(Self {
            socket,
            local_addr,
            router,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Decode one datagram and dispatch it through the route table
    pub fn handle_datagram(&mut self, bytes: &[u8]) -> DispatchStats {
        match rosc::decoder::decode_udp(bytes) {
            Ok((_, packet)) => self.router.dispatch(&packet),
            Err(e) => {
                log::warn!("Failed to decode OSC datagram ({} bytes): {:?}", bytes.len(), e);
                DispatchStats::default()
            }
        }
    }

    /// Serve forever
    pub fn serve(mut self) {
        log::info!("OSC listener started on {}", self.local_addr);

        let mut buffer = vec![0u8; MAX_DATAGRAM_SIZE];

        loop {
            let (len, src) = match self.socket.recv_from(&mut buffer) {
                Ok(result) => result,
                Err(e) => {
                    if let Some(delay) = recv_error_delay(&e) {
                        log::error!("UDP recv error: {}", e);
                        thread::sleep(delay);
                    }
                    continue;
                }
            };

            log::trace!("Received {} bytes from {}", len, src);
            self.handle_datagram(&buffer[..len]);
        }
    }

    /// Run [`serve`](Self::serve) on a named background thread
    ///
    /// The returned handle may be dropped; the thread is never joined.
    pub fn spawn_detached(self) -> Result<JoinHandle<()>> {
        let handle = thread::Builder::new()
            .name("osc-listener".to_string())
            .spawn(move || self.serve())?;
        Ok(handle)
    }
}

/// Delay before retrying after a receive error; `None` retries at once
fn recv_error_delay(err: &std::io::Error) -> Option<Duration> {
    match err.kind() {
        std::io::ErrorKind::Interrupted => None,
        _ => Some(RECV_ERROR_BACKOFF),
    }
}
