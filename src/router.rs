//! Route table for inbound OSC packets
//!
//! Maps an exact address pattern to a handler. Each message is looked up
//! once; bundles are flattened and their messages dispatched in order.
//! Messages on unknown routes are ignored.

use crate::error::Result;
use rosc::{OscMessage, OscPacket};
use std::collections::HashMap;

/// Handler invoked for every message on its route
pub type Handler = Box<dyn FnMut(&OscMessage) -> Result<()> + Send>;

/// Result of dispatching one packet
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DispatchStats {
    /// Messages whose handler succeeded
    pub handled: usize,
    /// Messages whose handler returned an error
    pub failed: usize,
    /// Messages with no matching route
    pub ignored: usize,
}

#[derive(Default)]
pub struct Router {
    routes: HashMap<String, Handler>,
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler, replacing any previous one for the same address
    pub fn route<F>(mut self, addr: &str, handler: F) -> Self
    where
        F: FnMut(&OscMessage) -> Result<()> + Send + 'static,
    {
        self.routes.insert(addr.to_string(), Box::new(handler));
        self
    }

    /// Dispatch every message in a packet
    ///
    /// Handler errors are logged and counted; they never stop dispatch of the
    /// remaining messages.
    pub fn dispatch(&mut self, packet: &OscPacket) -> DispatchStats {
        let mut stats = DispatchStats::default();
        self.dispatch_into(packet, &mut stats);
        stats
    }

    fn dispatch_into(&mut self, packet: &OscPacket, stats: &mut DispatchStats) {
        match packet {
            OscPacket::Message(msg) => match self.routes.get_mut(&msg.addr) {
                Some(handler) => match handler(msg) {
                    Ok(()) => stats.handled += 1,
                    Err(e) => {
                        log::error!("Handler for {} failed: {}", msg.addr, e);
                        stats.failed += 1;
                    }
                },
                None => {
                    log::trace!("Ignoring message on unmapped route {}", msg.addr);
                    stats.ignored += 1;
                }
            },
            OscPacket::Bundle(bundle) => {
                for inner in &bundle.content {
                    self.dispatch_into(inner, stats);
                }
            }
        }
    }
}
