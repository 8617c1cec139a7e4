//! Signal database
//!
//! Holds the message and signal definitions loaded from a DBC file in a
//! form that can be queried by frame identifier or by signal name.

use std::collections::HashMap;

/// Mask for the 29 identifier bits of a CAN frame
pub const CAN_ID_MASK: u32 = 0x1FFF_FFFF;

/// A complete CAN message definition
#[derive(Debug, Clone)]
pub struct MessageDefinition {
    /// CAN message ID (extended flag stripped)
    pub id: u32,
    /// True if the DBC declares this as an extended (29-bit) frame
    pub is_extended: bool,
    /// Message name
    pub name: String,
    /// Message size in bytes
    pub size: usize,
    /// All signals in this message
    pub signals: Vec<SignalDefinition>,
    /// Multiplexer signal name (if multiplexed)
    pub multiplexer_signal: Option<String>,
    /// Source file name
    pub source: String,
}

/// A CAN signal definition
#[derive(Debug, Clone)]
pub struct SignalDefinition {
    /// Signal name
    pub name: String,
    /// Start bit as written in the DBC (LSB for Intel, MSB for Motorola)
    pub start_bit: u16,
    /// Length in bits
    pub length: u16,
    pub byte_order: ByteOrder,
    pub value_type: ValueType,
    /// Scale factor to convert raw value to physical value
    pub factor: f64,
    /// Offset to add after scaling
    pub offset: f64,
    /// Engineering unit (e.g., "%", "A", "V")
    pub unit: Option<String>,
    /// Multiplexer info (None if not multiplexed)
    pub multiplexer_info: Option<MultiplexerInfo>,
}

/// Byte order for signal extraction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteOrder {
    /// Little-endian (Intel format)
    LittleEndian,
    /// Big-endian (Motorola format)
    BigEndian,
}

/// How the raw bits of a signal are interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueType {
    Signed,
    Unsigned,
    /// IEEE 754 single precision (`SIG_VALTYPE_ ... : 1`)
    Float32,
    /// IEEE 754 double precision (`SIG_VALTYPE_ ... : 2`)
    Float64,
}

/// Multiplexer information for multiplexed signals
#[derive(Debug, Clone)]
pub struct MultiplexerInfo {
    /// Name of the multiplexer signal that controls this signal
    pub multiplexer_signal: String,
    /// Multiplexer value(s) for which this signal is active
    pub multiplexer_values: Vec<u64>,
}

/// The signal database
///
/// Built once per run and read-only afterwards.
#[derive(Debug, Default)]
pub struct SignalDatabase {
    /// Message definitions by CAN ID (extended flag stripped)
    messages: HashMap<u32, MessageDefinition>,

    /// Signal name lookup for quick access
    /// Key: Signal name, Value: List of (CAN ID, signal index) tuples
    signal_lookup: HashMap<String, Vec<(u32, usize)>>,
}

impl SignalDatabase {
    /// Create a new empty signal database
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a message definition to the database
    ///
    /// A later definition for the same identifier replaces the earlier one.
    pub fn add_message(&mut self, mut message: MessageDefinition) {
        message.id &= CAN_ID_MASK;
        let can_id = message.id;

        if let Some(previous) = self.messages.get(&can_id) {
            log::warn!(
                "Message '{}' (0x{:X}) from {} replaces '{}' from {}",
                message.name,
                can_id,
                message.source,
                previous.name,
                previous.source
            );
            for locations in self.signal_lookup.values_mut() {
                locations.retain(|(id, _)| *id != can_id);
            }
            self.signal_lookup.retain(|_, locations| !locations.is_empty());
        }

        for (sig_idx, signal) in message.signals.iter().enumerate() {
            self.signal_lookup
                .entry(signal.name.clone())
                .or_default()
                .push((can_id, sig_idx));
        }

        self.messages.insert(can_id, message);
    }

    /// Get the message definition for a frame identifier
    pub fn get_message(&self, can_id: u32) -> Option<&MessageDefinition> {
        self.messages.get(&can_id)
    }

    /// Find all messages containing a specific signal name
    pub fn find_signal(&self, signal_name: &str) -> Vec<(u32, &SignalDefinition)> {
        self.signal_lookup
            .get(signal_name)
            .map(|locations| {
                locations
                    .iter()
                    .filter_map(|(can_id, sig_idx)| {
                        self.get_message(*can_id)
                            .and_then(|msg| msg.signals.get(*sig_idx))
                            .map(|sig| (*can_id, sig))
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Get database statistics
    pub fn stats(&self) -> DatabaseStats {
        let num_messages = self.messages.len();
        let num_signals: usize = self.messages.values().map(|msg| msg.signals.len()).sum();

        DatabaseStats {
            num_messages,
            num_signals,
        }
    }
}

/// Database statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DatabaseStats {
    /// Total number of message definitions
    pub num_messages: usize,
    /// Total number of signal definitions
    pub num_signals: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn soc_signal() -> SignalDefinition {
        SignalDefinition {
            name: "B2V_SOC".to_string(),
            start_bit: 0,
            length: 8,
            byte_order: ByteOrder::LittleEndian,
            value_type: ValueType::Unsigned,
            factor: 1.0,
            offset: 0.0,
            unit: Some("%".to_string()),
            multiplexer_info: None,
        }
    }

    fn status_message(id: u32) -> MessageDefinition {
        MessageDefinition {
            id,
            is_extended: id & 0x8000_0000 != 0,
            name: "BMS_Status".to_string(),
            size: 8,
            signals: vec![soc_signal()],
            multiplexer_signal: None,
            source: "test.dbc".to_string(),
        }
    }

    #[test]
    fn test_empty_database() {
        let db = SignalDatabase::new();
        let stats = db.stats();
        assert_eq!(stats.num_messages, 0);
        assert_eq!(stats.num_signals, 0);
        assert!(db.get_message(0x123).is_none());
    }

    #[test]
    fn test_add_message() {
        let mut db = SignalDatabase::new();
        db.add_message(status_message(0x123));

        let stats = db.stats();
        assert_eq!(stats.num_messages, 1);
        assert_eq!(stats.num_signals, 1);

        let msg = db.get_message(0x123).unwrap();
        assert_eq!(msg.name, "BMS_Status");
        assert_eq!(msg.signals[0].name, "B2V_SOC");

        let found = db.find_signal("B2V_SOC");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].0, 0x123);
        assert!(db.find_signal("B2V_TotalI").is_empty());
    }

    #[test]
    fn test_extended_flag_is_masked() {
        let mut db = SignalDatabase::new();
        db.add_message(status_message(0x8000_0123));

        let msg = db.get_message(0x123).unwrap();
        assert_eq!(msg.id, 0x123);
        assert!(msg.is_extended);
        assert_eq!(db.find_signal("B2V_SOC")[0].0, 0x123);
    }

    #[test]
    fn test_frame_id_is_not_masked_on_lookup() {
        let mut db = SignalDatabase::new();
        db.add_message(status_message(0x123));

        assert!(db.get_message(0x123).is_some());
        assert!(db.get_message(0x8000_0123).is_none());
    }

    #[test]
    fn test_last_definition_wins() {
        let mut db = SignalDatabase::new();
        db.add_message(status_message(0x123));
        let mut other = status_message(0x123);
        other.name = "BMS_Status_v2".to_string();
        other.signals[0].start_bit = 8;
        db.add_message(other);

        let msg = db.get_message(0x123).unwrap();
        assert_eq!(msg.name, "BMS_Status_v2");
        assert_eq!(msg.signals[0].start_bit, 8);
        assert_eq!(db.stats().num_messages, 1);
        assert_eq!(db.stats().num_signals, 1);

        let found = db.find_signal("B2V_SOC");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].1.start_bit, 8);
    }
}
