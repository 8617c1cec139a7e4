//! JSON export of the decoded series

use anyhow::{Context, Result};
use bms_log_decoder::{CaptureDecode, DecodeStats, SignalSeries, TextEncoding};
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

#[derive(Debug, Serialize)]
pub struct ExportDocument<'a> {
    pub generated_at: String,
    pub log_file: &'a Path,
    pub dbc_file: &'a Path,
    pub encoding: TextEncoding,
    pub stats: DecodeStats,
    pub signals: Vec<ExportedSignal<'a>>,
}

#[derive(Debug, Serialize)]
pub struct ExportedSignal<'a> {
    pub name: &'a str,
    pub samples: usize,
    #[serde(flatten)]
    pub series: &'a SignalSeries,
}

impl<'a> ExportDocument<'a> {
    pub fn new(decoded: &'a CaptureDecode, log_file: &'a Path, dbc_file: &'a Path) -> Self {
        Self {
            generated_at: chrono::Utc::now().to_rfc3339(),
            log_file,
            dbc_file,
            encoding: decoded.encoding,
            stats: decoded.stats,
            signals: decoded
                .series
                .iter()
                .map(|(name, series)| ExportedSignal {
                    name,
                    samples: series.len(),
                    series,
                })
                .collect(),
        }
    }
}

/// Write the export document as pretty-printed JSON
pub fn write_json(path: &Path, document: &ExportDocument<'_>) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("Failed to create export file: {:?}", path))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, document)
        .with_context(|| format!("Failed to write export file: {:?}", path))?;
    writer.flush()?;
    log::info!("Exported {} signals to {:?}", document.signals.len(), path);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use bms_log_decoder::Decoder;
    use tempfile::NamedTempFile;

    const DBC: &str = r#"
VERSION ""

NS_ :

BS_:

BU_: BMS VCU

BO_ 291 BMS_Status: 8 BMS
 SG_ B2V_SOC : 0|8@1+ (1,0) [0|100] "%" VCU
 SG_ B2V_TotalI : 8|16@1- (0.1,0) [-3276.8|3276.7] "A" VCU
"#;

    #[test]
    fn test_export_document_shape() {
        let mut decoder = Decoder::new();
        decoder.add_dbc_str(DBC, "bms.dbc").unwrap();
        let decoded = decoder.decode_str(
            "0.5 1 123x Rx d 8 50 CC FF 00 00 00 00 00\nnoise\n",
            &bms_log_decoder::DecoderConfig::new(),
        );

        let document = ExportDocument::new(&decoded, Path::new("drive.asc"), Path::new("bms.dbc"));
        let file = NamedTempFile::new().unwrap();
        write_json(file.path(), &document).unwrap();

        let text = std::fs::read_to_string(file.path()).unwrap();
        let json: serde_json::Value = serde_json::from_str(&text).unwrap();

        assert_eq!(json["encoding"], "utf8");
        assert_eq!(json["stats"]["lines"], 2);
        assert_eq!(json["stats"]["no_record"], 1);
        assert_eq!(json["signals"][0]["name"], "B2V_SOC");
        assert_eq!(json["signals"][0]["samples"], 1);
        assert_eq!(json["signals"][0]["values"][0], 80.0);
        assert_eq!(json["signals"][1]["name"], "B2V_TotalI");
        assert!(json["signals"][1]["values"][0].as_f64().unwrap() < 0.0);
    }
}
