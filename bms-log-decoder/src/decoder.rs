//! Main decoder API
//!
//! This module provides the primary interface for the decoder library.
//! The Decoder struct is the entry point for loading signal definitions and
//! decoding captures into per-signal series.

use crate::config::DecoderConfig;
use crate::formats::{AscFrameIterator, AscParser};
use crate::message_decoder::decode_frame;
use crate::series::SignalAccumulator;
use crate::signals::{DatabaseStats, SignalDatabase};
use crate::text::decode_text;
use crate::types::{DecodedFrame, DecoderError, Result, SkipReason, TextEncoding};
use serde::Serialize;
use std::path::Path;

/// The main decoder struct - entry point for all decoding operations
#[derive(Debug, Default)]
pub struct Decoder {
    /// Internal signal database (loaded from DBC files)
    signal_db: SignalDatabase,
}

impl Decoder {
    /// Create a new decoder instance
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a DBC file and add its definitions to the signal database
    ///
    /// # Example
    /// ```no_run
    /// use bms_log_decoder::Decoder;
    /// use std::path::Path;
    ///
    /// let mut decoder = Decoder::new();
    /// decoder.add_dbc(Path::new("bms.dbc")).unwrap();
    /// ```
    pub fn add_dbc(&mut self, path: &Path) -> Result<()> {
        log::info!("Loading DBC file: {:?}", path);

        let messages = crate::signals::dbc::parse_dbc_file(path)?;
        for message in messages {
            self.signal_db.add_message(message);
        }

        log::info!("DBC file loaded successfully: {:?}", path);
        Ok(())
    }

    /// Load DBC definitions from text already in memory
    pub fn add_dbc_str(&mut self, content: &str, source: &str) -> Result<()> {
        let messages = crate::signals::dbc::parse_dbc_str(content, source)?;
        for message in messages {
            self.signal_db.add_message(message);
        }
        Ok(())
    }

    /// Read a capture file and decode it
    ///
    /// The file is decoded as UTF-8, falling back to Latin-1.
    ///
    /// # Example
    /// ```no_run
    /// use bms_log_decoder::{Decoder, DecoderConfig};
    /// use std::path::Path;
    ///
    /// let mut decoder = Decoder::new();
    /// decoder.add_dbc(Path::new("bms.dbc")).unwrap();
    /// let decoded = decoder
    ///     .decode_file(Path::new("drive.asc"), &DecoderConfig::new())
    ///     .unwrap();
    ///
    /// for (name, series) in decoded.series.iter() {
    ///     println!("{}: {} samples", name, series.len());
    /// }
    /// ```
    pub fn decode_file(&self, path: &Path, config: &DecoderConfig) -> Result<CaptureDecode> {
        log::info!("Decoding log file: {:?}", path);

        let bytes = std::fs::read(path).map_err(|e| {
            DecoderError::LogParseError(format!("Failed to read file {:?}: {}", path, e))
        })?;

        let (text, encoding) = decode_text(bytes);
        let mut decoded = decode_capture(&text, &self.signal_db, config);
        decoded.encoding = encoding;

        log::info!(
            "Decoded {} of {} frame records ({} samples)",
            decoded.stats.frames_decoded,
            decoded.stats.records,
            decoded.series.total_samples()
        );

        Ok(decoded)
    }

    /// Decode capture text already in memory
    pub fn decode_str(&self, text: &str, config: &DecoderConfig) -> CaptureDecode {
        decode_capture(text, &self.signal_db, config)
    }

    /// Per-line decoding outcomes, in capture order
    pub fn decode_lines<'a>(
        &'a self,
        text: &'a str,
        config: &'a DecoderConfig,
    ) -> DecodingIterator<'a> {
        DecodingIterator::new(AscParser::parse(text), &self.signal_db, config)
    }

    /// The loaded signal database
    pub fn database(&self) -> &SignalDatabase {
        &self.signal_db
    }

    /// Get statistics about the loaded signal database
    pub fn database_stats(&self) -> DatabaseStats {
        self.signal_db.stats()
    }
}

/// Decode a whole capture into per-signal series
///
/// Pure with respect to its inputs: lines that are not frame records,
/// malformed lines, filtered frames, unknown frames and frames that fail to
/// decode are skipped and counted; every other frame contributes its target
/// signals in capture order.
pub fn decode_capture(text: &str, db: &SignalDatabase, config: &DecoderConfig) -> CaptureDecode {
    let mut series = SignalAccumulator::new(config.target_signals.iter().cloned());
    let mut stats = DecodeStats::default();

    for outcome in DecodingIterator::new(AscParser::parse(text), db, config) {
        stats.lines += 1;
        match outcome {
            LineOutcome::Decoded(frame) => {
                stats.records += 1;
                stats.frames_decoded += 1;
                stats.samples += series.accumulate(&frame);
            }
            LineOutcome::Skipped { reason, .. } => {
                if reason != SkipReason::NoRecord && reason != SkipReason::MalformedLine {
                    stats.records += 1;
                }
                stats.record_skip(reason);
            }
        }
    }

    CaptureDecode {
        series,
        stats,
        encoding: TextEncoding::Utf8,
    }
}

/// Result of decoding one capture
#[derive(Debug, Clone)]
pub struct CaptureDecode {
    /// Accumulated target signal series
    pub series: SignalAccumulator,
    /// Line and frame counters
    pub stats: DecodeStats,
    /// Encoding the capture text was read with
    pub encoding: TextEncoding,
}

/// Counters collected while decoding a capture
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DecodeStats {
    /// Lines seen
    pub lines: usize,
    /// Lines parsed into a frame record
    pub records: usize,
    /// Frames decoded against the database
    pub frames_decoded: usize,
    /// Samples appended to target series
    pub samples: usize,
    pub no_record: usize,
    pub malformed: usize,
    pub filtered: usize,
    pub unknown_frame: usize,
    pub decode_error: usize,
}

impl DecodeStats {
    /// Count one skipped line
    pub fn record_skip(&mut self, reason: SkipReason) {
        match reason {
            SkipReason::NoRecord => self.no_record += 1,
            SkipReason::MalformedLine => self.malformed += 1,
            SkipReason::Filtered => self.filtered += 1,
            SkipReason::UnknownFrame => self.unknown_frame += 1,
            SkipReason::DecodeError => self.decode_error += 1,
        }
    }

    /// Number of lines skipped for a reason
    pub fn skipped(&self, reason: SkipReason) -> usize {
        match reason {
            SkipReason::NoRecord => self.no_record,
            SkipReason::MalformedLine => self.malformed,
            SkipReason::Filtered => self.filtered,
            SkipReason::UnknownFrame => self.unknown_frame,
            SkipReason::DecodeError => self.decode_error,
        }
    }
}

/// What happened to one capture line
#[derive(Debug, Clone, PartialEq)]
pub enum LineOutcome {
    /// The line was a frame record and decoded successfully
    Decoded(DecodedFrame),
    /// The line did not produce a decoded frame
    Skipped {
        /// 1-based line number
        line: usize,
        reason: SkipReason,
    },
}

/// Iterator that decodes capture lines into line outcomes
///
/// This iterator wraps a capture line iterator and processes each line:
/// 1. Not a record / malformed → skipped
/// 2. Rejected by channel or message filter → skipped
/// 3. Look up and decode against the signal database → decoded or skipped
pub struct DecodingIterator<'a> {
    lines: AscFrameIterator<'a>,
    signal_db: &'a SignalDatabase,
    config: &'a DecoderConfig,
}

impl<'a> DecodingIterator<'a> {
    fn new(
        lines: AscFrameIterator<'a>,
        signal_db: &'a SignalDatabase,
        config: &'a DecoderConfig,
    ) -> Self {
        Self {
            lines,
            signal_db,
            config,
        }
    }
}

impl Iterator for DecodingIterator<'_> {
    type Item = LineOutcome;

    fn next(&mut self) -> Option<Self::Item> {
        let line = self.lines.next()?;
        let skipped = |reason| LineOutcome::Skipped {
            line: line.number,
            reason,
        };

        let frame = match line.record {
            Ok(Some(frame)) => frame,
            Ok(None) => return Some(skipped(SkipReason::NoRecord)),
            Err(e) => {
                log::debug!("Line {}: {}", line.number, e);
                return Some(skipped(SkipReason::MalformedLine));
            }
        };

        if !self.config.should_process_frame(frame.channel, frame.can_id) {
            log::trace!("Line {}: frame 0x{:X} filtered", line.number, frame.can_id);
            return Some(skipped(SkipReason::Filtered));
        }

        match decode_frame(&frame, self.signal_db) {
            Ok(decoded) => Some(LineOutcome::Decoded(decoded)),
            Err(e) => {
                let reason = SkipReason::from_decode_error(&e);
                match reason {
                    SkipReason::UnknownFrame => log::trace!("Line {}: {}", line.number, e),
                    _ => log::debug!("Line {}: {}", line.number, e),
                }
                Some(skipped(reason))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DBC: &str = r#"
VERSION ""

NS_ :

BS_:

BU_: BMS VCU

BO_ 291 BMS_Status: 8 BMS
 SG_ B2V_SOC : 0|8@1+ (1,0) [0|100] "%" VCU
"#;

    fn decoder() -> Decoder {
        let mut decoder = Decoder::new();
        decoder.add_dbc_str(DBC, "bms.dbc").unwrap();
        decoder
    }

    #[test]
    fn test_decoder_creation() {
        let decoder = Decoder::new();
        let stats = decoder.database_stats();
        assert_eq!(stats.num_messages, 0);
        assert_eq!(stats.num_signals, 0);
    }

    #[test]
    fn test_line_outcomes_distinguish_skip_reasons() {
        let decoder = decoder();
        let config = DecoderConfig::new();
        let capture = "\
date Mon Jan 1 10:00:00 am 2024
0.100000 1 123x Rx d 8 50 00 00 00 00 00 00 00
0.200000 1 456x Rx d 8 50 00 00 00 00 00 00 00
0.300000 1 123x Rx d 2 50 00
0.400000 1 FFFFFFFFFx Rx d 1 00
";

        let outcomes: Vec<LineOutcome> = decoder.decode_lines(capture, &config).collect();
        assert_eq!(outcomes.len(), 5);
        assert_eq!(
            outcomes[0],
            LineOutcome::Skipped { line: 1, reason: SkipReason::NoRecord }
        );
        assert!(matches!(outcomes[1], LineOutcome::Decoded(ref f) if f.value("B2V_SOC") == Some(80.0)));
        assert_eq!(
            outcomes[2],
            LineOutcome::Skipped { line: 3, reason: SkipReason::UnknownFrame }
        );
        assert_eq!(
            outcomes[3],
            LineOutcome::Skipped { line: 4, reason: SkipReason::DecodeError }
        );
        assert_eq!(
            outcomes[4],
            LineOutcome::Skipped { line: 5, reason: SkipReason::MalformedLine }
        );
    }

    #[test]
    fn test_stats_account_for_every_line() {
        let decoder = decoder();
        let config = DecoderConfig::new().with_channel_filter(vec![1]);
        let capture = "\
0.100000 1 123x Rx d 8 50 00 00 00 00 00 00 00
0.150000 2 123x Rx d 8 51 00 00 00 00 00 00 00
0.200000 1 456x Rx d 8 50 00 00 00 00 00 00 00
0.300000 1 123x Rx d 2 50 00
0.400000 1 FFFFFFFFFx Rx d 1 00
End TriggerBlock";

        let decoded = decoder.decode_str(capture, &config);
        let stats = decoded.stats;

        assert_eq!(stats.lines, 6);
        assert_eq!(stats.records, 4);
        assert_eq!(stats.frames_decoded, 1);
        assert_eq!(stats.samples, 1);
        assert_eq!(stats.skipped(SkipReason::Filtered), 1);
        assert_eq!(stats.skipped(SkipReason::UnknownFrame), 1);
        assert_eq!(stats.skipped(SkipReason::DecodeError), 1);
        assert_eq!(stats.skipped(SkipReason::MalformedLine), 1);
        assert_eq!(stats.skipped(SkipReason::NoRecord), 1);
        assert_eq!(decoded.encoding, TextEncoding::Utf8);
    }

    #[test]
    fn test_missing_capture_file() {
        let decoder = decoder();
        let result = decoder.decode_file(Path::new("/nonexistent/drive.asc"), &DecoderConfig::new());
        assert!(matches!(result, Err(DecoderError::LogParseError(_))));
    }
}
