//! DBC file parser
//!
//! Parses Vector DBC files and converts them into our internal signal database format.

use crate::signals::database::{
    ByteOrder, MessageDefinition, MultiplexerInfo, SignalDefinition, ValueType,
};
use crate::text::decode_text;
use crate::types::{DecoderError, Result};
use std::path::Path;

/// Parse a DBC file and return message definitions
pub fn parse_dbc_file(path: &Path) -> Result<Vec<MessageDefinition>> {
    log::info!("Parsing DBC file: {:?}", path);

    // Read the DBC file as bytes first (handle non-UTF8 encodings)
    let bytes = std::fs::read(path).map_err(|e| {
        DecoderError::DbcParseError(format!("Failed to read file {:?}: {}", path, e))
    })?;

    let (dbc_content, encoding) = decode_text(bytes);
    log::debug!("DBC file {:?} decoded as {}", path, encoding);

    let source_filename = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("unknown.dbc");

    parse_dbc_str(&dbc_content, source_filename)
}

/// Parse DBC text that is already in memory
///
/// `source` names where the text came from and is recorded on every message.
pub fn parse_dbc_str(content: &str, source: &str) -> Result<Vec<MessageDefinition>> {
    let dbc = can_dbc::DBC::from_slice(content.as_bytes()).map_err(|e| {
        DecoderError::DbcParseError(format!("Failed to parse DBC {}: {:?}", source, e))
    })?;

    let messages = dbc
        .messages()
        .iter()
        .map(|dbc_msg| convert_message(&dbc, dbc_msg, source))
        .collect::<Result<Vec<_>>>()?;

    log::info!("Parsed {} messages from {}", messages.len(), source);

    Ok(messages)
}

fn convert_message(
    dbc: &can_dbc::DBC,
    dbc_msg: &can_dbc::Message,
    source: &str,
) -> Result<MessageDefinition> {
    let multiplexer_signal = dbc_msg
        .signals()
        .iter()
        .find(|sig| *sig.multiplexer_indicator() == can_dbc::MultiplexIndicator::Multiplexor)
        .map(|sig| sig.name().to_string());

    let signals = dbc_msg
        .signals()
        .iter()
        .map(|dbc_sig| {
            let float_type =
                dbc.extended_value_type_for_signal(*dbc_msg.message_id(), dbc_sig.name());
            convert_signal(dbc_sig, float_type, multiplexer_signal.as_deref())
        })
        .collect::<Result<Vec<_>>>()?;

    let raw_id = dbc_msg.message_id().0;

    Ok(MessageDefinition {
        id: raw_id,
        is_extended: raw_id & 0x8000_0000 != 0,
        name: dbc_msg.message_name().to_string(),
        size: *dbc_msg.message_size() as usize,
        signals,
        multiplexer_signal,
        source: source.to_string(),
    })
}

/// `extended_type` is the signal's `SIG_VALTYPE_` entry, if any.
fn convert_signal(
    dbc_sig: &can_dbc::Signal,
    extended_type: Option<&can_dbc::SignalExtendedValueType>,
    multiplexer_signal: Option<&str>,
) -> Result<SignalDefinition> {
    let name = dbc_sig.name();
    let length = *dbc_sig.signal_size();
    if length == 0 || length > 64 {
        return Err(DecoderError::InvalidSignalDefinition(format!(
            "Signal '{}' has unsupported length {}",
            name, length
        )));
    }

    let byte_order = match dbc_sig.byte_order() {
        can_dbc::ByteOrder::LittleEndian => ByteOrder::LittleEndian,
        can_dbc::ByteOrder::BigEndian => ByteOrder::BigEndian,
    };

    let value_type = match (extended_type, dbc_sig.value_type()) {
        (Some(can_dbc::SignalExtendedValueType::IEEEfloat32Bit), _) => ValueType::Float32,
        (Some(can_dbc::SignalExtendedValueType::IEEEdouble64bit), _) => ValueType::Float64,
        (_, can_dbc::ValueType::Signed) => ValueType::Signed,
        (_, can_dbc::ValueType::Unsigned) => ValueType::Unsigned,
    };

    let float_width = match value_type {
        ValueType::Float32 => Some(32),
        ValueType::Float64 => Some(64),
        _ => None,
    };
    if let Some(width) = float_width {
        if length != width {
            return Err(DecoderError::InvalidSignalDefinition(format!(
                "Float signal '{}' is {} bits wide, expected {}",
                name, length, width
            )));
        }
    }

    let multiplexer_info = match *dbc_sig.multiplexer_indicator() {
        can_dbc::MultiplexIndicator::MultiplexedSignal(page) => {
            let switch = multiplexer_signal.ok_or_else(|| {
                DecoderError::InvalidSignalDefinition(format!(
                    "Signal '{}' is multiplexed but its message has no multiplexor",
                    name
                ))
            })?;
            Some(MultiplexerInfo {
                multiplexer_signal: switch.to_string(),
                multiplexer_values: vec![page],
            })
        }
        _ => None,
    };

    let unit = dbc_sig.unit();

    Ok(SignalDefinition {
        name: name.to_string(),
        start_bit: *dbc_sig.start_bit() as u16,
        length: length as u16,
        byte_order,
        value_type,
        factor: *dbc_sig.factor(),
        offset: *dbc_sig.offset(),
        unit: (!unit.is_empty()).then(|| unit.to_string()),
        multiplexer_info,
    })
}
