//! Error types for the synth bridge

use crate::config::ConfigError;
use std::net::SocketAddr;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Bridge error types
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Configuration could not be loaded or failed validation
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Listener could not bind its UDP endpoint
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    /// Host name did not resolve to any socket address
    #[error("Could not resolve {0}")]
    Resolve(String),

    /// OSC packet could not be encoded or decoded
    #[error("OSC error: {0}")]
    Osc(String),

    /// Outbound datagram was only partially sent
    #[error("Short send to {target}: {sent} of {len} bytes")]
    ShortSend {
        target: SocketAddr,
        sent: usize,
        len: usize,
    },
}

impl From<rosc::OscError> for Error {
    fn from(e: rosc::OscError) -> Self {
        Error::Osc(format!("{:?}", e))
    }
}
