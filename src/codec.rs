//! OSC message codec
//!
//! Converts the argument list of an inbound `/synth_settings` message into a
//! [`SettingsRecord`], and builds the outbound `/random` packet.
//!
//! # Inbound framing
//!
//! ```text
//! /synth_settings  [flag, param_1, param_2, ..., param_k]
//!                   ^^^^
//!                   framing artifact of the patch's trigger, discarded
//! ```
//!
//! The remaining arguments are zipped positionally against the configured
//! parameter names. When the counts differ the shorter side wins: trailing
//! names without a value are left out of the record and trailing values
//! without a name are dropped. Malformed input degrades to a shorter record,
//! it never fails.

use crate::error::Result;
use chrono::{DateTime, Local};
use rosc::{OscMessage, OscPacket, OscType};
use std::fmt;

/// Route carrying synth parameter snapshots from the patch
pub const SETTINGS_ROUTE: &str = "/synth_settings";

/// Route carrying randomization commands to the patch
pub const RANDOM_ROUTE: &str = "/random";

/// Timestamp format used in the log (one second granularity)
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A received parameter value
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    Text(String),
    Bool(bool),
    Nil,
    /// Any other OSC type, rendered through its debug form
    Other(String),
}

impl From<&OscType> for ParamValue {
    fn from(arg: &OscType) -> Self {
        match arg {
            OscType::Int(v) => ParamValue::Int(*v),
            OscType::Long(v) => ParamValue::Long(*v),
            OscType::Float(v) => ParamValue::Float(*v),
            OscType::Double(v) => ParamValue::Double(*v),
            OscType::String(s) => ParamValue::Text(s.clone()),
            OscType::Char(c) => ParamValue::Text(c.to_string()),
            OscType::Bool(b) => ParamValue::Bool(*b),
            OscType::Nil => ParamValue::Nil,
            other => ParamValue::Other(format!("{:?}", other)),
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Int(v) => write!(f, "{}", v),
            ParamValue::Long(v) => write!(f, "{}", v),
            ParamValue::Float(v) => write!(f, "{}", v),
            ParamValue::Double(v) => write!(f, "{}", v),
            ParamValue::Text(s) | ParamValue::Other(s) => f.write_str(s),
            ParamValue::Bool(b) => write!(f, "{}", b),
            ParamValue::Nil => Ok(()),
        }
    }
}

/// One snapshot of synth parameters, in configured order
#[derive(Debug, Clone, PartialEq)]
pub struct SettingsRecord {
    /// Capture time, formatted with [`TIMESTAMP_FORMAT`]
    pub timestamp: String,
    /// `(name, value)` pairs; a prefix of the configured parameter list
    pub values: Vec<(String, ParamValue)>,
}

impl SettingsRecord {
    /// Value for a parameter name, if the message supplied one
    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.values
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Format a capture time for the log
pub fn format_timestamp(time: &DateTime<Local>) -> String {
    time.format(TIMESTAMP_FORMAT).to_string()
}

/// Decode a `/synth_settings` argument list, stamped with the current time
pub fn decode_settings(args: &[OscType], names: &[String]) -> SettingsRecord {
    decode_settings_at(args, names, format_timestamp(&Local::now()))
}

/// Decode a `/synth_settings` argument list with an explicit timestamp
pub fn decode_settings_at(
    args: &[OscType],
    names: &[String],
    timestamp: String,
) -> SettingsRecord {
    let values = names
        .iter()
        .zip(args.iter().skip(1))
        .map(|(name, arg)| (name.clone(), ParamValue::from(arg)))
        .collect();

    SettingsRecord { timestamp, values }
}

/// Encode a randomization command as an OSC datagram
pub fn encode_random(value: i32) -> Result<Vec<u8>> {
    let packet = OscPacket::Message(OscMessage {
        addr: RANDOM_ROUTE.to_string(),
        args: vec![OscType::Int(value)],
    });
    Ok(rosc::encoder::encode(&packet)?)
}
