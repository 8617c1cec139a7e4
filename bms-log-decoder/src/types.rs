//! Core types for the BMS log decoder library
//!
//! This module defines the fundamental types that flow through the decoding
//! pipeline: raw frames extracted from a capture, decoded frames produced from
//! the signal database, and the typed reasons a line can be skipped.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Timestamp type used throughout the decoder (seconds, as written in the capture)
pub type Timestamp = f64;

/// Result type for decoder operations
pub type Result<T> = std::result::Result<T, DecoderError>;

/// Raw CAN frame extracted from one capture line
///
/// This represents a single CAN frame as read from the log file,
/// before any signal decoding or message interpretation.
#[derive(Debug, Clone, PartialEq)]
pub struct CanFrame {
    /// Timestamp in seconds relative to the capture start
    pub timestamp: Timestamp,
    /// Logger channel number as written in the capture (typically 1-based)
    pub channel: u32,
    /// CAN message ID (extended flag already stripped)
    pub can_id: u32,
    /// Data length code as written in the capture
    pub dlc: u32,
    /// Frame data bytes
    pub data: Vec<u8>,
}

impl CanFrame {
    /// Frame identifier in the capture's notation (upper-case hex, no prefix)
    pub fn id_hex(&self) -> String {
        format!("{:X}", self.can_id)
    }

    /// Payload in the capture's notation (space separated upper-case hex pairs)
    pub fn data_hex(&self) -> String {
        self.data
            .iter()
            .map(|b| format!("{:02X}", b))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Errors that can occur during decoding
#[derive(Debug, thiserror::Error)]
pub enum DecoderError {
    #[error("Failed to parse log line: {0}")]
    LogParseError(String),

    #[error("Failed to parse DBC file: {0}")]
    DbcParseError(String),

    #[error("Message not found: CAN ID 0x{0:X}")]
    MessageNotFound(u32),

    #[error("Invalid signal definition: {0}")]
    InvalidSignalDefinition(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),
}

/// A CAN frame decoded against its message definition
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedFrame {
    /// Timestamp copied from the capture line
    pub timestamp: Timestamp,
    /// Logger channel number
    pub channel: u32,
    /// CAN message ID
    pub can_id: u32,
    /// Message name from the DBC
    pub message_name: String,
    /// All signals active in this frame
    pub signals: Vec<DecodedSignal>,
    /// Active multiplexer value (if message is multiplexed)
    pub multiplexer_value: Option<u64>,
}

impl DecodedFrame {
    /// Look up a decoded signal by name
    pub fn signal(&self, name: &str) -> Option<&DecodedSignal> {
        self.signals.iter().find(|s| s.name == name)
    }

    /// Physical value of a signal, if it was decoded in this frame
    pub fn value(&self, name: &str) -> Option<f64> {
        self.signal(name).map(|s| s.value.as_f64())
    }
}

/// A decoded signal with its current value
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedSignal {
    /// Signal name from the DBC
    pub name: String,
    /// Decoded physical value
    pub value: SignalValue,
    /// Engineering unit (e.g., "%", "A", "V")
    pub unit: Option<String>,
    /// Raw value before scaling (useful for debugging)
    pub raw_value: i64,
}

/// Signal value types supported by the decoder
#[derive(Debug, Clone, PartialEq)]
pub enum SignalValue {
    /// Signed integer value
    Integer(i64),
    /// Floating-point value (after scaling/offset)
    Float(f64),
    /// Boolean value (single unscaled bit)
    Boolean(bool),
}

impl fmt::Display for SignalValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SignalValue::Integer(v) => write!(f, "{}", v),
            SignalValue::Float(v) => write!(f, "{:.3}", v),
            SignalValue::Boolean(v) => write!(f, "{}", if *v { "true" } else { "false" }),
        }
    }
}

impl SignalValue {
    /// Convert signal value to f64 for accumulation and plotting
    pub fn as_f64(&self) -> f64 {
        match self {
            SignalValue::Integer(v) => *v as f64,
            SignalValue::Float(v) => *v,
            SignalValue::Boolean(v) => if *v { 1.0 } else { 0.0 },
        }
    }
}

/// Why a capture line did not contribute to the signal series
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// Line does not have the frame record shape
    NoRecord,
    /// Line has the record shape but a numeric field failed to parse
    MalformedLine,
    /// Frame rejected by the channel or message filter
    Filtered,
    /// No message in the database claims the frame identifier
    UnknownFrame,
    /// Payload does not fit the message definition
    DecodeError,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::NoRecord => write!(f, "no record"),
            SkipReason::MalformedLine => write!(f, "malformed line"),
            SkipReason::Filtered => write!(f, "filtered"),
            SkipReason::UnknownFrame => write!(f, "unknown frame"),
            SkipReason::DecodeError => write!(f, "decode error"),
        }
    }
}

impl SkipReason {
    /// Classify a per-frame decode failure
    pub fn from_decode_error(err: &DecoderError) -> Self {
        match err {
            DecoderError::MessageNotFound(_) => SkipReason::UnknownFrame,
            _ => SkipReason::DecodeError,
        }
    }
}

/// Character encoding a capture was read with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextEncoding {
    Utf8,
    Latin1,
}

impl fmt::Display for TextEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TextEncoding::Utf8 => write!(f, "UTF-8"),
            TextEncoding::Latin1 => write!(f, "Latin-1"),
        }
    }
}
