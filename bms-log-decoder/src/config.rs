//! Decoder configuration types
//!
//! The target signal list and frame filters are passed into the pipeline
//! explicitly through [`DecoderConfig`]; nothing is read from globals.

use serde::{Deserialize, Serialize};

/// Battery-management signals extracted by default
pub const BMS_TARGET_SIGNALS: [&str; 7] = [
    "B2V_SOC",
    "B2V_MaxCellV",
    "B2V_MinCellV",
    "B2V_TotalI",
    "B2V_AccuChrgAh",
    "B2V_MinCellT",
    "B2V_MaxCellT",
];

/// Configuration for the decoding pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecoderConfig {
    /// Signals to accumulate; every other decoded signal is ignored
    #[serde(default = "default_target_signals")]
    pub target_signals: Vec<String>,

    /// Optional: only decode frames from these logger channels
    #[serde(default)]
    pub channel_filter: Option<Vec<u32>>,

    /// Optional: only decode these specific CAN message IDs
    #[serde(default)]
    pub message_filter: Option<Vec<u32>>,
}

fn default_target_signals() -> Vec<String> {
    BMS_TARGET_SIGNALS.iter().map(|s| s.to_string()).collect()
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            target_signals: default_target_signals(),
            channel_filter: None,
            message_filter: None,
        }
    }
}

impl DecoderConfig {
    /// Create a new decoder configuration with the BMS target signals
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method: replace the target signal list
    pub fn with_target_signals<I, S>(mut self, signals: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.target_signals = signals.into_iter().map(Into::into).collect();
        self
    }

    /// Builder method: set channel filter
    pub fn with_channel_filter(mut self, channels: Vec<u32>) -> Self {
        self.channel_filter = Some(channels);
        self
    }

    /// Builder method: set message filter
    pub fn with_message_filter(mut self, messages: Vec<u32>) -> Self {
        self.message_filter = Some(messages);
        self
    }

    /// Check if a channel should be processed
    pub fn should_process_channel(&self, channel: u32) -> bool {
        match &self.channel_filter {
            Some(channels) => channels.contains(&channel),
            None => true,
        }
    }

    /// Check if a message ID should be processed
    pub fn should_process_message(&self, can_id: u32) -> bool {
        match &self.message_filter {
            Some(messages) => messages.contains(&can_id),
            None => true,
        }
    }

    /// Check if a frame should be processed based on filters
    pub fn should_process_frame(&self, channel: u32, can_id: u32) -> bool {
        self.should_process_channel(channel) && self.should_process_message(can_id)
    }
}
