//! Line-by-line capture decoding tool
//!
//! Prints what happened to every line of an ASC capture: the decoded target
//! signals, or the reason the line was skipped.
//!
//! Usage:
//!   decode_capture <capture.asc> --dbc <file.dbc> [--limit <count>] [--all]
//!
//! Example:
//!   decode_capture drive.asc --dbc bms.dbc --limit 200

use bms_log_decoder::{Decoder, DecoderConfig, LineOutcome, SkipReason};
use std::collections::HashMap;
use std::env;
use std::path::PathBuf;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        eprintln!("Usage: {} <capture.asc> --dbc <file.dbc> [--limit <count>] [--all]", args[0]);
        std::process::exit(1);
    }

    let capture = PathBuf::from(&args[1]);
    let mut dbc: Option<PathBuf> = None;
    let mut limit: Option<usize> = None;
    let mut show_all = false;

    let mut i = 2;
    while i < args.len() {
        match args[i].as_str() {
            "--dbc" => {
                i += 1;
                dbc = args.get(i).map(PathBuf::from);
            }
            "--limit" => {
                i += 1;
                if i < args.len() {
                    limit = Some(args[i].parse()?);
                }
            }
            "--all" => show_all = true,
            other => {
                eprintln!("Unknown argument: {}", other);
                std::process::exit(1);
            }
        }
        i += 1;
    }

    let Some(dbc) = dbc else {
        eprintln!("A DBC file is required (--dbc <file.dbc>)");
        std::process::exit(1);
    };

    let mut decoder = Decoder::new();
    decoder.add_dbc(&dbc)?;

    let (text, encoding) = bms_log_decoder::decode_text(std::fs::read(&capture)?);
    println!("=== {:?} ({}) ===", capture, encoding);

    let config = DecoderConfig::new();
    let mut skipped: HashMap<SkipReason, usize> = HashMap::new();

    for outcome in decoder.decode_lines(&text, &config).take(limit.unwrap_or(usize::MAX)) {
        match outcome {
            LineOutcome::Decoded(frame) => {
                let targets: Vec<String> = config
                    .target_signals
                    .iter()
                    .filter_map(|name| frame.signal(name))
                    .map(|s| format!("{}={} {}", s.name, s.value, s.unit.as_deref().unwrap_or("")))
                    .collect();
                println!(
                    "[{:.6}s] CH{} 0x{:03X} {}  {}",
                    frame.timestamp,
                    frame.channel,
                    frame.can_id,
                    frame.message_name,
                    targets.join("  ")
                );
            }
            LineOutcome::Skipped { line, reason } => {
                *skipped.entry(reason).or_default() += 1;
                if show_all && reason != SkipReason::NoRecord {
                    println!("line {}: skipped ({})", line, reason);
                }
            }
        }
    }

    println!("\n=== SKIPPED ===");
    for (reason, count) in &skipped {
        println!("  {}: {}", reason, count);
    }

    Ok(())
}
