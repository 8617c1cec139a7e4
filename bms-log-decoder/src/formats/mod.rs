//! Log file format parsers
//!
//! Captures are read fully into memory and walked line by line. Each parser
//! yields one item per line so that callers can account for every skipped line.

pub mod asc;

// Re-export parser types
pub use asc::{parse_line, AscFrameIterator, AscParser, CaptureLine, ASC_RECORD_PATTERN};
