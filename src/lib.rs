//! Synth Bridge - OSC bridge between a Max/MSP synth patch and a settings log
//!
//! ## Protocol Architecture
//!
//! - **UDP inbound (`max_receive_port`)**: `/synth_settings [flag, p1..pk]`
//!   parameter snapshots, appended to a CSV log
//! - **UDP outbound (`max_send_port`)**: `/random <1..=100>` commands,
//!   fire-and-forget
//!
//! The listener runs on a detached background thread for the life of the
//! process; the emitter runs a bounded loop on the main thread.

pub mod app;
pub mod codec;
pub mod config;
pub mod emitter;
pub mod error;
pub mod listener;
pub mod logger;
pub mod router;
pub mod shutdown;

// Re-export commonly used types
pub use config::{BridgeConfig, ConfigError};
pub use emitter::{CommandEmitter, CommandSink, EmitReport, EmitterTiming, UdpCommandSink};
pub use error::{Error, Result};
pub use listener::OscListener;
pub use logger::SettingsLogger;
pub use router::Router;
pub use shutdown::{ShutdownSignal, ShutdownTrigger, shutdown_channel};
