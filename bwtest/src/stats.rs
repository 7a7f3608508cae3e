//
// Copyright 2024 Signal Messenger, LLC
// SPDX-License-Identifier: AGPL-3.0-only
//

//! Time-series statistics aggregation.
//!
//! [`StatisticsAggregate`] accumulates (timestamp, value) samples for a
//! single metric and derives the summary numbers the report is built
//! from: running average, peak, and the ramp-up duration until a
//! configured threshold is first reached. Bandwidth and RTT share this
//! one structure; only the bandwidth aggregate carries a threshold.

use serde::Serialize;

/// A single recorded measurement. Timestamps come from the stats
/// provider's own clock and are not required to be monotonic.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Sample {
    pub timestamp_ms: i64,
    pub value: f64,
}

/// Accumulates samples for one metric in arrival order.
#[derive(Debug, Default)]
pub struct StatisticsAggregate {
    samples: Vec<Sample>,
    ramp_up_threshold: Option<f64>,
}

impl StatisticsAggregate {
    pub fn new() -> Self {
        Self::default()
    }

    /// An aggregate that also tracks how long the metric took to first
    /// reach `threshold` (e.g. 75% of the target bitrate).
    pub fn with_ramp_up_threshold(threshold: f64) -> Self {
        Self {
            samples: Vec::new(),
            ramp_up_threshold: Some(threshold),
        }
    }

    /// Appends a sample. Non-finite or negative values are rejected and
    /// never stored; the return value tells the caller so it can log
    /// the discard.
    pub fn add(&mut self, timestamp_ms: i64, value: f64) -> bool {
        if !value.is_finite() || value < 0.0 {
            return false;
        }
        self.samples.push(Sample {
            timestamp_ms,
            value,
        });
        true
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Arithmetic mean of all recorded values, or 0.0 when empty.
    pub fn average(&self) -> f64 {
        if self.samples.is_empty() {
            return 0.0;
        }
        let sum: f64 = self.samples.iter().map(|s| s.value).sum();
        sum / self.samples.len() as f64
    }

    /// Maximum recorded value, or 0.0 when empty.
    pub fn max(&self) -> f64 {
        self.samples
            .iter()
            .map(|s| s.value)
            .fold(0.0, f64::max)
    }

    /// Elapsed time from the first sample to the first sample at or
    /// above the configured threshold. `None` when no threshold was
    /// configured or the threshold was never reached. Clamped at zero
    /// so a provider clock running backwards cannot produce a negative
    /// duration.
    ///
    /// Sample counts are bounded (duration / step), so a linear scan
    /// is all this needs.
    pub fn ramp_up_time_ms(&self) -> Option<i64> {
        let threshold = self.ramp_up_threshold?;
        let first = self.samples.first()?;
        let crossing = self.samples.iter().find(|s| s.value >= threshold)?;
        Some((crossing.timestamp_ms - first.timestamp_ms).max(0))
    }
}
