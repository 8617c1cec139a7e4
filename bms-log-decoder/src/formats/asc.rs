//! ASC (Vector ASCII log) frame record parser
//!
//! Recognises the receive-frame rows of a textual capture:
//!
//! ```text
//! 0.500000 1 123x Rx d 8 01 02 03 04 05 06 07 08
//! ```
//!
//! i.e. `<timestamp> <channel> <hex-id>x Rx d <dlc> <hex-byte>+`. Anything
//! after the byte run is ignored. Lines of any other shape (headers,
//! comments, Tx rows, error frames) are not records.

use crate::text::{split_lines, Lines};
use crate::types::{CanFrame, DecoderError, Result};
use regex::Regex;
use std::sync::LazyLock;

/// Pattern of one frame record line, anchored at the start of the line only
pub const ASC_RECORD_PATTERN: &str =
    r"^\s*(\d+\.\d+)\s+(\d+)\s+([0-9A-Fa-f]+)x\s+Rx\s+d\s+(\d+)\s+((?:[0-9A-Fa-f]{2}\s*)+)";

static ASC_RECORD_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(ASC_RECORD_PATTERN).expect("Invalid regex pattern"));

/// Extract a frame record from one capture line
///
/// Returns `Ok(None)` when the line does not have the record shape. A line
/// that has the shape but carries an unparsable numeric field fails as a
/// whole with [`DecoderError::LogParseError`].
pub fn parse_line(line: &str) -> Result<Option<CanFrame>> {
    let Some(caps) = ASC_RECORD_REGEX.captures(line) else {
        return Ok(None);
    };

    let timestamp = caps[1]
        .parse::<f64>()
        .map_err(|e| malformed("timestamp", &caps[1], e))?;
    let channel = caps[2]
        .parse::<u32>()
        .map_err(|e| malformed("channel", &caps[2], e))?;
    let can_id =
        u32::from_str_radix(&caps[3], 16).map_err(|e| malformed("frame id", &caps[3], e))?;
    let dlc = caps[4]
        .parse::<u32>()
        .map_err(|e| malformed("dlc", &caps[4], e))?;
    let data = caps[5]
        .split_whitespace()
        .map(|byte| u8::from_str_radix(byte, 16).map_err(|e| malformed("data byte", byte, e)))
        .collect::<Result<Vec<u8>>>()?;

    Ok(Some(CanFrame {
        timestamp,
        channel,
        can_id,
        dlc,
        data,
    }))
}

fn malformed(field: &str, text: &str, err: impl std::fmt::Display) -> DecoderError {
    DecoderError::LogParseError(format!("invalid {} '{}': {}", field, text, err))
}

/// One line of a capture after record extraction
#[derive(Debug)]
pub struct CaptureLine {
    /// 1-based line number within the capture
    pub number: usize,
    /// Extracted record, `Ok(None)` for non-record lines
    pub record: Result<Option<CanFrame>>,
}

/// ASC capture parser
pub struct AscParser;

impl AscParser {
    /// Walk every line of an in-memory capture
    pub fn parse(text: &str) -> AscFrameIterator<'_> {
        AscFrameIterator {
            lines: split_lines(text),
            line_number: 0,
        }
    }
}

/// Iterator over the lines of a capture, in capture order
pub struct AscFrameIterator<'a> {
    lines: Lines<'a>,
    line_number: usize,
}

impl Iterator for AscFrameIterator<'_> {
    type Item = CaptureLine;

    fn next(&mut self) -> Option<Self::Item> {
        let line = self.lines.next()?;
        self.line_number += 1;

        Some(CaptureLine {
            number: self.line_number,
            record: parse_line(line),
        })
    }
}
