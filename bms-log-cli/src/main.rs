//! BMS Log Viewer CLI Application
//!
//! Command-line front end for the bms-log-decoder library. It adds:
//! - Command line and TOML configuration
//! - Logging setup
//! - Dual-axis SVG chart rendering
//! - JSON export of the decoded series

use anyhow::{Context, Result};
use bms_log_decoder::{CaptureDecode, Decoder, SkipReason};
use clap::Parser;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

mod chart;
mod config;
mod export;

use chart::ChartLayout;
use config::AppConfig;

/// BMS Log Viewer - Chart battery signals from ASC captures
#[derive(Parser, Debug)]
#[command(name = "bms-log-cli")]
#[command(about = "Decode BMS signals from an ASC/LOG capture with a DBC and chart them", long_about = None)]
#[command(version)]
struct Args {
    /// Path to the ASC/LOG capture to decode
    #[arg(short, long, value_name = "FILE")]
    log: Option<PathBuf>,

    /// Path to the DBC file
    #[arg(long, value_name = "FILE")]
    dbc: Option<PathBuf>,

    /// Output file for the SVG chart (default: stdout)
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Also write the decoded series as JSON
    #[arg(long, value_name = "FILE")]
    export_json: Option<PathBuf>,

    /// Path to configuration file (TOML)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Signal to extract (can be repeated; replaces the BMS defaults)
    #[arg(long = "signal", value_name = "NAME")]
    signals: Vec<String>,

    /// Verbosity level (can be repeated: -v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long)]
    quiet: bool,
}

fn main() {
    let args = Args::parse();

    init_logging(args.verbose, args.quiet);

    log::debug!("BMS Log Viewer CLI v{}", env!("CARGO_PKG_VERSION"));
    log::debug!("Using decoder library v{}", bms_log_decoder::VERSION);

    // Any failure of the run ends here as one message
    if let Err(e) = run(&args) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run(args: &Args) -> Result<()> {
    let app_config = match &args.config {
        Some(path) => {
            log::info!("Loading configuration from: {:?}", path);
            config::load_config(path)?
        }
        None => AppConfig::default(),
    };

    let log_path = args.log.as_ref().or(app_config.input.log.as_ref());
    let dbc_path = args.dbc.as_ref().or(app_config.input.dbc.as_ref());

    let (Some(log_path), Some(dbc_path)) = (log_path, dbc_path) else {
        println!("BMS Log Viewer - both a capture and a DBC file are needed");
        println!("\nQuick Start:");
        println!("  bms-log-cli --log drive.asc --dbc bms.dbc -o chart.svg");
        println!("\nWith a configuration file:");
        println!("  bms-log-cli --config bms.toml");
        println!("\nUse --help for more options");
        return Ok(());
    };

    let mut decoder = Decoder::new();
    decoder
        .add_dbc(dbc_path)
        .with_context(|| format!("Failed to load DBC {:?}", dbc_path))?;

    let db_stats = decoder.database_stats();
    log::info!(
        "Signal database: {} messages, {} signals",
        db_stats.num_messages,
        db_stats.num_signals
    );

    let mut decoder_config = app_config.decoder_config();
    if !args.signals.is_empty() {
        decoder_config = decoder_config.with_target_signals(args.signals.iter().cloned());
    }

    for target in &decoder_config.target_signals {
        if decoder.database().find_signal(target).is_empty() {
            log::warn!("Signal {} is not defined in {:?}", target, dbc_path);
        }
    }

    let decoded = decoder
        .decode_file(log_path, &decoder_config)
        .with_context(|| format!("Failed to decode capture {:?}", log_path))?;

    print_summary(&decoded);

    let layout = ChartLayout::bms()
        .with_title(app_config.chart.title.clone())
        .with_size(app_config.chart.width, app_config.chart.height);
    let svg = chart::render_svg(&layout, &decoded.series)?;
    write_chart(args.output.as_deref(), &svg)?;

    if let Some(export_path) = &args.export_json {
        let document = export::ExportDocument::new(&decoded, log_path, dbc_path);
        export::write_json(export_path, &document)?;
    }

    Ok(())
}

fn write_chart(output: Option<&Path>, svg: &str) -> Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, svg)
                .with_context(|| format!("Failed to write chart: {:?}", path))?;
            log::info!("Chart written to {:?}", path);
        }
        None => {
            let mut stdout = io::stdout().lock();
            stdout.write_all(svg.as_bytes())?;
            writeln!(stdout)?;
        }
    }
    Ok(())
}

/// Log what was decoded and what was skipped
fn print_summary(decoded: &CaptureDecode) {
    let stats = &decoded.stats;

    log::info!(
        "Lines: {} ({})  records: {}  decoded frames: {}",
        stats.lines,
        decoded.encoding,
        stats.records,
        stats.frames_decoded
    );
    for reason in [
        SkipReason::MalformedLine,
        SkipReason::Filtered,
        SkipReason::UnknownFrame,
        SkipReason::DecodeError,
    ] {
        let count = stats.skipped(reason);
        if count > 0 {
            log::info!("  skipped ({}): {}", reason, count);
        }
    }

    if decoded.series.is_empty() {
        log::warn!("No target signal was found in the capture");
    }
    for (name, series) in decoded.series.iter() {
        log::info!("  {}: {} samples", name, series.len());
    }
}

/// Initialize logging based on verbosity level
fn init_logging(verbose: u8, quiet: bool) {
    use env_logger::Builder;
    use log::LevelFilter;

    let level = if quiet {
        LevelFilter::Error
    } else {
        match verbose {
            0 => LevelFilter::Info,
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    };

    Builder::new()
        .filter_level(level)
        .format(|buf, record| {
            writeln!(
                buf,
                "[{} {}] {}",
                record.level(),
                record.target(),
                record.args()
            )
        })
        .init();
}
