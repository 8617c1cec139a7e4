//! Per-signal time series accumulation

use crate::types::{DecodedFrame, Timestamp};
use serde::Serialize;
use std::collections::HashMap;

/// Timestamps and values of one signal, in capture order
///
/// Both sequences only grow together through [`SignalSeries::push`], so they
/// always have the same length and matching indices.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SignalSeries {
    timestamps: Vec<Timestamp>,
    values: Vec<f64>,
}

impl SignalSeries {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one sample
    pub fn push(&mut self, timestamp: Timestamp, value: f64) {
        self.timestamps.push(timestamp);
        self.values.push(value);
    }

    pub fn timestamps(&self) -> &[Timestamp] {
        &self.timestamps
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    /// (timestamp, value) pairs in capture order
    pub fn points(&self) -> impl Iterator<Item = (Timestamp, f64)> + '_ {
        self.timestamps.iter().copied().zip(self.values.iter().copied())
    }
}

/// Collects the target signals of decoded frames into series
///
/// A target that never appears in a decoded frame has no series.
#[derive(Debug, Clone)]
pub struct SignalAccumulator {
    targets: Vec<String>,
    series: HashMap<String, SignalSeries>,
}

impl SignalAccumulator {
    /// Create an accumulator for the given target signals
    ///
    /// Duplicate names are collapsed, keeping the first occurrence's position.
    pub fn new<I, S>(targets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut unique: Vec<String> = Vec::new();
        for target in targets {
            let target = target.into();
            if !unique.contains(&target) {
                unique.push(target);
            }
        }

        Self {
            targets: unique,
            series: HashMap::new(),
        }
    }

    /// Append every target signal present in `frame`
    ///
    /// Returns the number of samples appended.
    pub fn accumulate(&mut self, frame: &DecodedFrame) -> usize {
        let mut appended = 0;

        for name in &self.targets {
            if let Some(value) = frame.value(name) {
                self.series
                    .entry(name.clone())
                    .or_default()
                    .push(frame.timestamp, value);
                appended += 1;
            }
        }

        appended
    }

    /// Target signal names in configured order
    pub fn targets(&self) -> &[String] {
        &self.targets
    }

    /// Series of one signal, if it received at least one sample
    pub fn get(&self, name: &str) -> Option<&SignalSeries> {
        self.series.get(name)
    }

    /// Series that received samples, in target order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &SignalSeries)> + '_ {
        self.targets
            .iter()
            .filter_map(|name| self.series.get(name).map(|s| (name.as_str(), s)))
    }

    /// True if no target signal received a sample
    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    /// Total number of samples across all series
    pub fn total_samples(&self) -> usize {
        self.series.values().map(SignalSeries::len).sum()
    }
}
