//! BMS Log Decoder Library
//!
//! A stateless library for decoding battery-management signals out of textual
//! CAN captures (Vector ASC receive rows) with signal definitions from a DBC
//! file.
//!
//! # Architecture
//!
//! The library is a single synchronous pipeline:
//! - Reads the capture as UTF-8, falling back to Latin-1
//! - Extracts `(timestamp, id, payload)` records line by line
//! - Decodes each record against the signal database
//! - Accumulates the configured target signals into per-signal series
//!
//! Lines that are not records, or whose frame cannot be decoded, are skipped
//! and counted; they never abort the run.
//!
//! The library does NOT:
//! - Render charts
//! - Read configuration files
//! - Write output files
//!
//! All presentation is in the application layer (bms-log-cli).
//!
//! # Example Usage
//!
//! ```no_run
//! use bms_log_decoder::{Decoder, DecoderConfig};
//! use std::path::Path;
//!
//! let mut decoder = Decoder::new();
//! decoder.add_dbc(Path::new("bms.dbc")).unwrap();
//!
//! let config = DecoderConfig::new().with_channel_filter(vec![1]);
//! let decoded = decoder.decode_file(Path::new("drive.asc"), &config).unwrap();
//!
//! if let Some(soc) = decoded.series.get("B2V_SOC") {
//!     for (t, v) in soc.points() {
//!         println!("{:.3}s  {}", t, v);
//!     }
//! }
//! ```

// Public modules
pub mod config;
pub mod decoder;
pub mod formats;
pub mod series;
pub mod signals;
pub mod types;

// Re-export main types for convenience
pub use config::{DecoderConfig, BMS_TARGET_SIGNALS};
pub use decoder::{decode_capture, CaptureDecode, DecodeStats, Decoder, DecodingIterator, LineOutcome};
pub use formats::{parse_line, ASC_RECORD_PATTERN};
pub use message_decoder::decode_frame;
pub use series::{SignalAccumulator, SignalSeries};
pub use signals::{DatabaseStats, SignalDatabase};
pub use text::decode_text;
pub use types::{
    CanFrame, DecodedFrame, DecodedSignal, DecoderError, Result, SignalValue, SkipReason,
    TextEncoding, Timestamp,
};

// Internal modules (not exposed in public API)
mod message_decoder;
mod text;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
