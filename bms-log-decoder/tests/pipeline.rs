//! End-to-end tests for the capture decoding pipeline

use bms_log_decoder::{
    decode_capture, parse_line, Decoder, DecoderConfig, SignalAccumulator, SkipReason,
    TextEncoding,
};
use std::io::Write;
use tempfile::NamedTempFile;

const BMS_DBC: &str = r#"
VERSION ""

NS_ :
    NS_DESC_
    CM_
    BA_DEF_
    BA_
    VAL_

BS_:

BU_: BMS VCU

BO_ 291 BMS_Status: 8 BMS
 SG_ B2V_SOC : 0|8@1+ (1,0) [0|100] "%" VCU
 SG_ B2V_TotalI : 8|16@1- (0.1,0) [-3276.8|3276.7] "A" VCU
 SG_ B2V_AccuChrgAh : 24|16@1+ (0.01,0) [0|655.35] "Ah" VCU
 SG_ B2V_Fault : 40|8@1+ (1,0) [0|255] "" VCU

BO_ 2147484416 BMS_Cells: 8 BMS
 SG_ B2V_MaxCellV : 7|16@0+ (0.001,0) [0|5] "V" VCU
 SG_ B2V_MinCellV : 23|16@0+ (0.001,0) [0|5] "V" VCU
 SG_ B2V_MaxCellT : 32|8@1+ (1,-40) [-40|215] "C" VCU
 SG_ B2V_MinCellT : 40|8@1+ (1,-40) [-40|215] "C" VCU
"#;

fn decoder() -> Decoder {
    let mut decoder = Decoder::new();
    decoder.add_dbc_str(BMS_DBC, "bms.dbc").unwrap();
    decoder
}

fn write_temp(bytes: &[u8]) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(bytes).unwrap();
    file.flush().unwrap();
    file
}

#[test]
fn soc_point_from_first_byte() {
    let decoder = decoder();
    let capture = "0.500000 1 123x Rx d 8 01 02 03 04 05 06 07 08\n";

    let decoded = decoder.decode_str(capture, &DecoderConfig::new());
    let soc = decoded.series.get("B2V_SOC").unwrap();

    assert_eq!(soc.timestamps(), &[0.5]);
    assert_eq!(soc.values(), &[1.0]);
}

#[test]
fn extended_dbc_id_matches_capture_id() {
    let decoder = decoder();
    // 0x0E10 = 3600 mV, 0x0CE4 = 3300 mV
    let capture = "1.000000 1 300x Rx d 8 0E 10 0C E4 41 3C 00 00\n";

    let decoded = decoder.decode_str(capture, &DecoderConfig::new());
    let series = &decoded.series;

    assert!((series.get("B2V_MaxCellV").unwrap().values()[0] - 3.6).abs() < 1e-9);
    assert!((series.get("B2V_MinCellV").unwrap().values()[0] - 3.3).abs() < 1e-9);
    assert_eq!(series.get("B2V_MaxCellT").unwrap().values(), &[25.0]);
    assert_eq!(series.get("B2V_MinCellT").unwrap().values(), &[20.0]);
}

#[test]
fn series_has_one_entry_per_decodable_line_in_order() {
    let decoder = decoder();
    let capture = "\
date Tue Mar 5 09:12:44.123 am 2024
base hex  timestamps absolute
internal events logged
Begin Triggerblock Tue Mar 5 09:12:44.123 am 2024
   0.000000 Start of measurement
   0.010000 1 123x Rx d 8 50 00 00 00 00 00 00 00
   0.020000 1 7FFx Rx d 8 00 00 00 00 00 00 00 00
   0.030000 1 123x Rx d 8 4F 00 00 00 00 00 00 00
   0.035000 1 123x Rx d 3 4E 00 00
   0.040000 1 ErrorFrame
   0.050000 1 123x Rx d 8 4E 00 00 00 00 00 00 00
End TriggerBlock
";

    let decoded = decoder.decode_str(capture, &DecoderConfig::new());
    let soc = decoded.series.get("B2V_SOC").unwrap();

    assert_eq!(soc.len(), 3);
    assert_eq!(soc.timestamps(), &[0.01, 0.03, 0.05]);
    assert_eq!(soc.values(), &[80.0, 79.0, 78.0]);
    assert_eq!(decoded.stats.skipped(SkipReason::UnknownFrame), 1);
    assert_eq!(decoded.stats.skipped(SkipReason::DecodeError), 1);
}

#[test]
fn non_target_signals_are_ignored() {
    let decoder = decoder();
    let capture = "0.5 1 123x Rx d 8 50 CC FF 10 27 07 00 00\n";

    let decoded = decoder.decode_str(capture, &DecoderConfig::new());
    assert!(decoded.series.get("B2V_Fault").is_none());
    assert_eq!(decoded.series.iter().count(), 3);

    let only_soc = DecoderConfig::new().with_target_signals(["B2V_SOC"]);
    let decoded = decoder.decode_str(capture, &only_soc);
    assert_eq!(decoded.series.iter().count(), 1);
    assert!(decoded.series.get("B2V_TotalI").is_none());
}

#[test]
fn negative_current_is_stored_raw() {
    let decoder = decoder();
    let capture = "0.5 1 123x Rx d 8 50 CC FF 00 00 00 00 00\n";

    let decoded = decoder.decode_str(capture, &DecoderConfig::new());
    let current = decoded.series.get("B2V_TotalI").unwrap().values()[0];
    assert!((current - -5.2).abs() < 1e-9);
}

#[test]
fn non_record_line_leaves_accumulator_unchanged() {
    let line = "   0.040000 1 ErrorFrame";
    assert!(parse_line(line).unwrap().is_none());

    let decoder = decoder();
    let config = DecoderConfig::new();
    let decoded = decode_capture(line, decoder.database(), &config);

    let empty = SignalAccumulator::new(config.target_signals.iter().cloned());
    assert!(decoded.series.is_empty());
    assert_eq!(decoded.series.total_samples(), empty.total_samples());
    assert_eq!(decoded.stats.skipped(SkipReason::NoRecord), 1);
}

#[test]
fn latin1_capture_decodes_after_fallback() {
    let decoder = decoder();
    let mut bytes = b"// Aufzeichnung \xfcber Kanal 1 \xb0C\n".to_vec();
    bytes.extend_from_slice(b"0.500000 1 123x Rx d 8 01 02 03 04 05 06 07 08\n");
    bytes.extend_from_slice(b"0.600000 1 123x Rx d 8 02 02 03 04 05 06 07 08\n");
    let file = write_temp(&bytes);

    let decoded = decoder.decode_file(file.path(), &DecoderConfig::new()).unwrap();

    assert_eq!(decoded.encoding, TextEncoding::Latin1);
    assert_eq!(decoded.series.get("B2V_SOC").unwrap().values(), &[1.0, 2.0]);
}

#[test]
fn utf8_capture_file() {
    let decoder = decoder();
    let file = write_temp("// Temp °C\r\n0.5 1 123x Rx d 8 01 00 00 00 00 00 00 00\r\n".as_bytes());

    let decoded = decoder.decode_file(file.path(), &DecoderConfig::new()).unwrap();
    assert_eq!(decoded.encoding, TextEncoding::Utf8);
    assert_eq!(decoded.series.get("B2V_SOC").unwrap().len(), 1);
}

#[test]
fn unparsable_dbc_is_an_error() {
    let mut decoder = Decoder::new();
    assert!(decoder.add_dbc_str("this is not a dbc", "broken.dbc").is_err());
}

const TEMPS_DBC: &str = r#"
VERSION ""

NS_ :

BS_:

BU_: BMS VCU

BO_ 512 BMS_Temps: 8 BMS
 SG_ Page M : 0|8@1+ (1,0) [0|3] "" VCU
 SG_ B2V_MinCellT m0 : 8|8@1+ (1,-40) [-40|215] "C" VCU
 SG_ B2V_MaxCellT m1 : 8|8@1+ (1,-40) [-40|215] "C" VCU
 SG_ B2V_SOC : 16|8@1+ (1,0) [0|100] "%" VCU
"#;

fn temps_decoder() -> Decoder {
    let mut decoder = Decoder::new();
    decoder.add_dbc_str(TEMPS_DBC, "temps.dbc").unwrap();
    decoder
}

#[test]
fn multiplexed_pages_reach_their_own_series() {
    let decoder = temps_decoder();
    let capture = "\
0.5 1 200x Rx d 8 00 3C 32 00 00 00 00 00
1.0 1 200x Rx d 8 01 41 31 00 00 00 00 00
1.5 1 200x Rx d 8 00 3D 30 00 00 00 00 00
";

    let decoded = decoder.decode_str(capture, &DecoderConfig::new());
    let series = &decoded.series;

    // A page's signal is only sampled on frames that select the page
    assert_eq!(series.get("B2V_MinCellT").unwrap().timestamps(), &[0.5, 1.5]);
    assert_eq!(series.get("B2V_MinCellT").unwrap().values(), &[20.0, 21.0]);
    assert_eq!(series.get("B2V_MaxCellT").unwrap().timestamps(), &[1.0]);
    assert_eq!(series.get("B2V_MaxCellT").unwrap().values(), &[25.0]);
    assert_eq!(series.get("B2V_SOC").unwrap().values(), &[50.0, 49.0, 48.0]);
    assert_eq!(decoded.stats.frames_decoded, 3);
}

#[test]
fn undefined_multiplexor_page_drops_the_whole_frame() {
    let decoder = temps_decoder();
    let capture = "\
0.5 1 200x Rx d 8 07 41 32 00 00 00 00 00
1.0 1 200x Rx d 8 00 41 31 00 00 00 00 00
";

    let decoded = decoder.decode_str(capture, &DecoderConfig::new());

    // The page 7 frame contributes nothing, not even its unpaged SOC
    assert_eq!(decoded.series.get("B2V_SOC").unwrap().timestamps(), &[1.0]);
    assert_eq!(decoded.series.get("B2V_MinCellT").unwrap().timestamps(), &[1.0]);
    assert_eq!(decoded.stats.skipped(SkipReason::DecodeError), 1);
}

#[test]
fn page_only_capture_leaves_other_page_without_series() {
    let decoder = temps_decoder();
    let capture = "0.5 1 200x Rx d 8 00 3C 32 00 00 00 00 00\n";
    let decoded = decoder.decode_str(capture, &DecoderConfig::new());

    assert_eq!(decoder.database().find_signal("B2V_MaxCellT").len(), 1);
    assert!(decoded.series.get("B2V_MaxCellT").is_none());
    assert_eq!(decoded.series.get("B2V_MinCellT").unwrap().values(), &[20.0]);
}

#[test]
fn float_cell_voltages_decode_as_ieee() {
    let dbc = r#"
VERSION ""

NS_ :

BS_:

BU_: BMS VCU

BO_ 291 BMS_Cells: 8 BMS
 SG_ B2V_MaxCellV : 0|32@1- (1,0) [0|5] "V" VCU
 SG_ B2V_MinCellV : 32|32@1- (1,0) [0|5] "V" VCU

SIG_VALTYPE_ 291 B2V_MaxCellV : 1;
SIG_VALTYPE_ 291 B2V_MinCellV : 1;
"#;
    let mut decoder = Decoder::new();
    decoder.add_dbc_str(dbc, "cells.dbc").unwrap();

    // 3.5f32 = 40 60 00 00, 3.25f32 = 40 50 00 00 (little-endian on the wire)
    let capture = "0.5 1 123x Rx d 8 00 00 60 40 00 00 50 40\n";
    let decoded = decoder.decode_str(capture, &DecoderConfig::new());

    assert_eq!(decoded.series.get("B2V_MaxCellV").unwrap().values(), &[3.5]);
    assert_eq!(decoded.series.get("B2V_MinCellV").unwrap().values(), &[3.25]);
}

#[test]
fn redefined_message_uses_last_layout() {
    let dbc = r#"
VERSION ""

NS_ :

BS_:

BU_: BMS VCU

BO_ 291 BMS_Status: 8 BMS
 SG_ B2V_SOC : 0|8@1+ (1,0) [0|100] "%" VCU

BO_ 291 BMS_Status_v2: 8 BMS
 SG_ B2V_SOC : 8|8@1+ (1,0) [0|100] "%" VCU
"#;
    let mut decoder = Decoder::new();
    decoder.add_dbc_str(dbc, "bms.dbc").unwrap();

    let capture = "0.5 1 123x Rx d 8 01 02 03 04 05 06 07 08\n";
    let decoded = decoder.decode_str(capture, &DecoderConfig::new());
    assert_eq!(decoded.series.get("B2V_SOC").unwrap().values(), &[2.0]);
}

#[test]
fn capture_id_with_high_bit_is_unknown() {
    let decoder = decoder();
    let capture = "0.5 1 80000123x Rx d 8 01 02 03 04 05 06 07 08\n";
    let decoded = decoder.decode_str(capture, &DecoderConfig::new());

    assert!(decoded.series.is_empty());
    assert_eq!(decoded.stats.skipped(SkipReason::UnknownFrame), 1);
}
