//! Message Decoding Engine
//!
//! Extracts signal values from raw CAN frames based on signal definitions
//! from the signal database. Handles bit extraction, endianness, multiplexing,
//! and physical value conversion.

use crate::signals::database::{ByteOrder, MessageDefinition, SignalDatabase, SignalDefinition, ValueType};
use crate::types::{CanFrame, DecodedFrame, DecodedSignal, DecoderError, Result, SignalValue};

/// Look up the frame's message in the database and decode it
///
/// Fails with [`DecoderError::MessageNotFound`] when no message claims the
/// identifier and with [`DecoderError::InvalidData`] when the payload does not
/// fit the message definition. A failed frame yields no partial results.
pub fn decode_frame(frame: &CanFrame, db: &SignalDatabase) -> Result<DecodedFrame> {
    let message_def = db
        .get_message(frame.can_id)
        .ok_or(DecoderError::MessageNotFound(frame.can_id))?;

    MessageDecoder::decode_message(frame, message_def)
}

/// Message decoder - extracts signals from CAN frames
pub struct MessageDecoder;

impl MessageDecoder {
    /// Decode a CAN frame against its message definition
    ///
    /// # Arguments
    /// * `frame` - Raw CAN frame
    /// * `message_def` - Message definition from signal database
    ///
    /// # Returns
    /// * `Ok(DecodedFrame)` with every active signal
    /// * `Err(DecoderError::InvalidData)` if the payload is too short or the
    ///   multiplexor selects a page the message does not define
    pub fn decode_message(frame: &CanFrame, message_def: &MessageDefinition) -> Result<DecodedFrame> {
        if frame.data.len() < message_def.size {
            return Err(DecoderError::InvalidData(format!(
                "Message '{}' (0x{:X}) expects {} bytes but frame has {}",
                message_def.name,
                frame.can_id,
                message_def.size,
                frame.data.len()
            )));
        }

        let mut multiplexer_value: Option<u64> = None;

        // For multiplexed messages, first extract the multiplexer signal value
        if let Some(ref mux_signal_name) = message_def.multiplexer_signal {
            if let Some(mux_signal) = message_def.signals.iter().find(|s| s.name == *mux_signal_name) {
                multiplexer_value = Some(Self::extract_signal_value(&frame.data, mux_signal)? as u64);
            }
        }

        if let Some(current) = multiplexer_value {
            let mut pages = message_def
                .signals
                .iter()
                .filter_map(|s| s.multiplexer_info.as_ref())
                .peekable();
            let has_pages = pages.peek().is_some();
            if has_pages && !pages.any(|mux| mux.multiplexer_values.contains(&current)) {
                return Err(DecoderError::InvalidData(format!(
                    "Message '{}' (0x{:X}) has no page for multiplexor value {}",
                    message_def.name, frame.can_id, current
                )));
            }
        }

        let mut decoded_signals = Vec::with_capacity(message_def.signals.len());

        for signal in &message_def.signals {
            if let Some(ref mux_info) = signal.multiplexer_info {
                match multiplexer_value {
                    Some(current) if mux_info.multiplexer_values.contains(&current) => {}
                    // Inactive page, or no multiplexor to select one
                    _ => continue,
                }
            }

            decoded_signals.push(Self::decode_signal(&frame.data, signal)?);
        }

        Ok(DecodedFrame {
            timestamp: frame.timestamp,
            channel: frame.channel,
            can_id: frame.can_id,
            message_name: message_def.name.clone(),
            signals: decoded_signals,
            multiplexer_value,
        })
    }

    /// Decode a single signal from CAN frame data
    fn decode_signal(data: &[u8], signal: &SignalDefinition) -> Result<DecodedSignal> {
        let bits = Self::extract_raw_bits(data, signal)?;
        let raw_value = Self::interpret_bits(bits, signal);

        let raw_number = match signal.value_type {
            ValueType::Float32 => f32::from_bits(bits as u32) as f64,
            ValueType::Float64 => f64::from_bits(bits),
            ValueType::Signed | ValueType::Unsigned => raw_value as f64,
        };

        // Apply physical value conversion (factor and offset)
        let physical_value = signal.offset + signal.factor * raw_number;

        let is_float = matches!(signal.value_type, ValueType::Float32 | ValueType::Float64);
        let value = if is_float {
            SignalValue::Float(physical_value)
        } else if signal.factor == 1.0 && signal.offset == 0.0 && signal.length == 1 {
            // Boolean signal (single bit, no scaling)
            SignalValue::Boolean(raw_value != 0)
        } else if signal.factor != 1.0 || signal.offset != 0.0 {
            SignalValue::Float(physical_value)
        } else {
            SignalValue::Integer(raw_value)
        };

        Ok(DecodedSignal {
            name: signal.name.clone(),
            value,
            unit: signal.unit.clone(),
            raw_value,
        })
    }

    /// Extract a signal as an integer (sign-extended when signed)
    fn extract_signal_value(data: &[u8], signal: &SignalDefinition) -> Result<i64> {
        Ok(Self::interpret_bits(Self::extract_raw_bits(data, signal)?, signal))
    }

    /// Integer view of the raw bits; float signals keep their bit pattern
    fn interpret_bits(bits: u64, signal: &SignalDefinition) -> i64 {
        match signal.value_type {
            ValueType::Signed => Self::sign_extend(bits, signal.length as usize),
            ValueType::Unsigned | ValueType::Float32 | ValueType::Float64 => bits as i64,
        }
    }

    /// Extract the raw bits of a signal, honouring its byte order
    fn extract_raw_bits(data: &[u8], signal: &SignalDefinition) -> Result<u64> {
        let start_bit = signal.start_bit as usize;
        let length = signal.length as usize;

        // Position of the last bit touched, in linear numbering for either layout
        let (first_bit, end_bit) = match signal.byte_order {
            ByteOrder::LittleEndian => (start_bit, start_bit + length),
            ByteOrder::BigEndian => {
                let msb = Self::motorola_to_linear(start_bit);
                (msb, msb + length)
            }
        };

        let required_bytes = end_bit.div_ceil(8);
        if required_bytes > data.len() {
            return Err(DecoderError::InvalidData(format!(
                "Signal '{}' requires {} bytes but frame only has {} bytes",
                signal.name,
                required_bytes,
                data.len()
            )));
        }

        Ok(match signal.byte_order {
            ByteOrder::LittleEndian => Self::extract_little_endian(data, first_bit, length),
            ByteOrder::BigEndian => Self::extract_big_endian(data, first_bit, length),
        })
    }

    /// Convert a DBC Motorola start bit (sawtooth numbering) to a linear
    /// position where bit 0 is the MSB of byte 0.
    fn motorola_to_linear(start_bit: usize) -> usize {
        (start_bit / 8) * 8 + (7 - start_bit % 8)
    }

    /// Extract signal with little-endian (Intel) byte order
    ///
    /// Little-endian format:
    /// - Start bit points to the LSB (least significant bit)
    /// - Bits are numbered from LSB to MSB within each byte
    /// - Byte 0 is the first byte in the CAN frame
    fn extract_little_endian(data: &[u8], start_bit: usize, length: usize) -> u64 {
        let mut result: u64 = 0;

        for i in 0..length {
            let bit_pos = start_bit + i;
            let byte_idx = bit_pos / 8;
            let bit_in_byte = bit_pos % 8;

            if byte_idx < data.len() {
                let bit_value = (data[byte_idx] >> bit_in_byte) & 0x01;
                result |= (bit_value as u64) << i;
            }
        }

        result
    }

    /// Extract signal with big-endian (Motorola) byte order
    ///
    /// `msb_pos` is a linear position (bit 0 = MSB of byte 0); the signal
    /// continues towards higher linear positions.
    fn extract_big_endian(data: &[u8], msb_pos: usize, length: usize) -> u64 {
        let mut result: u64 = 0;

        for i in 0..length {
            let bit_pos = msb_pos + i;
            let byte_idx = bit_pos / 8;
            let bit_in_byte = 7 - (bit_pos % 8);

            if byte_idx < data.len() {
                let bit_value = (data[byte_idx] >> bit_in_byte) & 0x01;
                result |= (bit_value as u64) << (length - 1 - i);
            }
        }

        result
    }

    /// Sign-extend a value from N bits to 64 bits
    fn sign_extend(value: u64, bit_length: usize) -> i64 {
        if bit_length >= 64 {
            return value as i64;
        }

        let sign_bit = 1u64 << (bit_length - 1);
        if (value & sign_bit) != 0 {
            let mask = !0u64 << bit_length;
            (value | mask) as i64
        } else {
            value as i64
        }
    }
}
