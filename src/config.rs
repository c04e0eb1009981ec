//! Configuration for the synth bridge
//!
//! Loads the bridge settings from a YAML file (`config.yml` by default):
//!
//! ```yaml
//! synth_params: [freq, amp, cutoff]
//! max_ip: 127.0.0.1
//! max_send_port: 7400
//! max_receive_port: 7401
//! max_randomizations: 100
//! log_file_path: synth_settings.csv
//! ```
//!
//! The snapshot is validated once at load time and is never mutated
//! afterwards; the listener and emitter share it read-only.

use serde::Deserialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Default configuration file, relative to the working directory
pub const DEFAULT_CONFIG_PATH: &str = "config.yml";

/// Configuration load errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Config file '{0}' not found")]
    NotFound(PathBuf),

    #[error("Failed to read '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Error parsing config file: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("Invalid value for '{field}': {reason}")]
    Invalid { field: &'static str, reason: String },
}

impl ConfigError {
    fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        ConfigError::Invalid {
            field,
            reason: reason.into(),
        }
    }
}

/// Bridge settings
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct BridgeConfig {
    /// Ordered synth parameter names; also the CSV column order
    pub synth_params: Vec<String>,

    /// Host running the Max patch (used for both send and receive)
    pub max_ip: String,

    /// UDP port the Max patch listens on for `/random`
    pub max_send_port: u16,

    /// Local UDP port receiving `/synth_settings`
    pub max_receive_port: u16,

    /// Number of randomization commands to send before exiting
    pub max_randomizations: u32,

    /// CSV file that settings records are appended to
    pub log_file_path: PathBuf,
}

impl BridgeConfig {
    /// Load and validate configuration from a YAML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::NotFound(path.to_path_buf())
            } else {
                ConfigError::Read {
                    path: path.to_path_buf(),
                    source: e,
                }
            }
        })?;
        Self::from_yaml(&contents)
    }

    /// Parse and validate from a YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        let config: BridgeConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Field-level validation
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.synth_params.is_empty() {
            return Err(ConfigError::invalid("synth_params", "must not be empty"));
        }

        let mut seen = HashSet::with_capacity(self.synth_params.len());
        for name in &self.synth_params {
            if name.trim().is_empty() {
                return Err(ConfigError::invalid(
                    "synth_params",
                    "parameter names must not be blank",
                ));
            }
            if !seen.insert(name.as_str()) {
                return Err(ConfigError::invalid(
                    "synth_params",
                    format!("duplicate parameter name '{}'", name),
                ));
            }
        }

        if self.max_ip.trim().is_empty() {
            return Err(ConfigError::invalid("max_ip", "must not be empty"));
        }
        if self.max_send_port == 0 {
            return Err(ConfigError::invalid("max_send_port", "must be non-zero"));
        }
        if self.max_receive_port == 0 {
            return Err(ConfigError::invalid("max_receive_port", "must be non-zero"));
        }
        if self.log_file_path.as_os_str().is_empty() {
            return Err(ConfigError::invalid("log_file_path", "must not be empty"));
        }

        Ok(())
    }

    /// `host:port` of the Max patch's command input
    pub fn send_endpoint(&self) -> String {
        join_host_port(&self.max_ip, self.max_send_port)
    }

    /// `host:port` the listener binds to
    pub fn receive_endpoint(&self) -> String {
        join_host_port(&self.max_ip, self.max_receive_port)
    }
}

/// Bracket bare IPv6 literals so the result parses as a socket address
fn join_host_port(host: &str, port: u16) -> String {
    if host.contains(':') && !host.starts_with('[') {
        format!("[{}]:{}", host, port)
    } else {
        format!("{}:{}", host, port)
    }
}
