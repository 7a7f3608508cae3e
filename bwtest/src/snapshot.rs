//
// Copyright 2024 Signal Messenger, LLC
// SPDX-License-Identifier: AGPL-3.0-only
//

//! Raw stats snapshot schema and the normalizer that maps it into a
//! canonical per-poll record.
//!
//! Two report schema families are recognized, both observed in the
//! wild from real stats providers:
//!
//! - "legacy keyed-report": a `bweforvideo` report carrying
//!   `googAvailableSendBandwidth`, and `ssrc` reports carrying
//!   `googRtt`, sent frame dimensions, and packet loss;
//! - "RTP-transceiver-style": `outbound_rtcp_video_0` carrying
//!   `mozRtt` and packet loss, and `outbound_rtp_video_0` carrying
//!   aggregate bitrate and frame-rate statistics. This family does
//!   not expose the sent resolution.
//!
//! Classification is purely structural, from the shape of the
//! snapshot itself. Nothing here queries the host environment, which
//! keeps [`normalize`] a pure function testable with literal JSON
//! fixtures.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::stats::Sample;

/// A point-in-time bundle of report entries retrieved from the
/// connection collaborator. The entry set and field names vary by
/// provider; values may be JSON numbers or stringly-typed counters.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct RawSnapshot {
    pub reports: Vec<RawReport>,
}

/// One report entry within a snapshot.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct RawReport {
    pub id: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    /// Wall-clock timestamp from the provider's own report clock.
    #[serde(rename = "timestamp")]
    pub timestamp_ms: i64,
    #[serde(flatten)]
    pub values: serde_json::Map<String, Value>,
}

impl RawReport {
    /// Reads a numeric field, accepting both JSON numbers and numeric
    /// strings (the legacy provider reports counters as strings).
    fn number(&self, key: &str) -> Option<f64> {
        match self.values.get(key)? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }
}

/// The schema family a snapshot was classified as.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum StatsProvider {
    LegacyKeyed,
    RtpTransceiver,
}

/// A canonical field value. `Unsupported` marks a field the active
/// provider does not expose (or did not carry in this snapshot),
/// distinct from a genuine zero measurement.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum Metric<T> {
    Value(T),
    #[default]
    Unsupported,
}

impl<T> Metric<T> {
    pub fn value(&self) -> Option<&T> {
        match self {
            Metric::Value(v) => Some(v),
            Metric::Unsupported => None,
        }
    }

    pub fn is_value(&self) -> bool {
        matches!(self, Metric::Value(_))
    }
}

impl<T> From<Option<T>> for Metric<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => Metric::Value(v),
            None => Metric::Unsupported,
        }
    }
}

/// Canonical per-poll record produced by [`normalize`].
#[derive(Clone, Debug, PartialEq)]
pub struct NormalizedSnapshot {
    pub provider: StatsProvider,
    pub bandwidth_estimate_bps: Metric<Sample>,
    pub rtt_ms: Metric<Sample>,
    pub frame_width: Metric<u32>,
    pub frame_height: Metric<u32>,
    pub packets_lost: Metric<i64>,
    pub bitrate_mean: Metric<f64>,
    pub bitrate_std_dev: Metric<f64>,
    pub frame_rate_mean: Metric<f64>,
}

impl NormalizedSnapshot {
    fn new(provider: StatsProvider) -> Self {
        Self {
            provider,
            bandwidth_estimate_bps: Metric::Unsupported,
            rtt_ms: Metric::Unsupported,
            frame_width: Metric::Unsupported,
            frame_height: Metric::Unsupported,
            packets_lost: Metric::Unsupported,
            bitrate_mean: Metric::Unsupported,
            bitrate_std_dev: Metric::Unsupported,
            frame_rate_mean: Metric::Unsupported,
        }
    }
}

/// The non-series fields retained across polls, last-write-wins per
/// field: a later `Value` overwrites, an `Unsupported` never erases an
/// earlier measurement. This matches how a provider that intermittently
/// omits a report entry should be read.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LastSnapshot {
    pub provider: Option<StatsProvider>,
    pub frame_width: Metric<u32>,
    pub frame_height: Metric<u32>,
    pub packets_lost: Metric<i64>,
    pub bitrate_mean: Metric<f64>,
    pub bitrate_std_dev: Metric<f64>,
    pub frame_rate_mean: Metric<f64>,
}

impl LastSnapshot {
    pub fn update(&mut self, snapshot: &NormalizedSnapshot) {
        self.provider = Some(snapshot.provider);
        if snapshot.frame_width.is_value() {
            self.frame_width = snapshot.frame_width;
        }
        if snapshot.frame_height.is_value() {
            self.frame_height = snapshot.frame_height;
        }
        if snapshot.packets_lost.is_value() {
            self.packets_lost = snapshot.packets_lost;
        }
        if snapshot.bitrate_mean.is_value() {
            self.bitrate_mean = snapshot.bitrate_mean;
        }
        if snapshot.bitrate_std_dev.is_value() {
            self.bitrate_std_dev = snapshot.bitrate_std_dev;
        }
        if snapshot.frame_rate_mean.is_value() {
            self.frame_rate_mean = snapshot.frame_rate_mean;
        }
    }
}

/// The snapshot matched neither known schema family.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
#[error("only legacy keyed-report and RTP-transceiver stats providers are supported")]
pub struct UnsupportedStatsProvider;

// Legacy keyed-report schema.
const LEGACY_BWE_REPORT_ID: &str = "bweforvideo";
const LEGACY_SSRC_REPORT_TYPE: &str = "ssrc";
const LEGACY_SEND_BANDWIDTH: &str = "googAvailableSendBandwidth";
const LEGACY_RTT: &str = "googRtt";
const LEGACY_FRAME_WIDTH: &str = "googFrameWidthSent";
const LEGACY_FRAME_HEIGHT: &str = "googFrameHeightSent";

// RTP-transceiver-style schema.
const RTP_RTCP_REPORT_ID: &str = "outbound_rtcp_video_0";
const RTP_RTP_REPORT_ID: &str = "outbound_rtp_video_0";
const RTP_RTT: &str = "mozRtt";
const RTP_BITRATE_MEAN: &str = "bitrateMean";
const RTP_BITRATE_STD_DEV: &str = "bitrateStdDev";
const RTP_FRAME_RATE_MEAN: &str = "framerateMean";

// Both schemas.
const PACKETS_LOST: &str = "packetsLost";

fn classify(snapshot: &RawSnapshot) -> Result<StatsProvider, UnsupportedStatsProvider> {
    for report in &snapshot.reports {
        if report.id == LEGACY_BWE_REPORT_ID || report.kind == LEGACY_SSRC_REPORT_TYPE {
            return Ok(StatsProvider::LegacyKeyed);
        }
        if report.id == RTP_RTP_REPORT_ID || report.id == RTP_RTCP_REPORT_ID {
            return Ok(StatsProvider::RtpTransceiver);
        }
    }
    Err(UnsupportedStatsProvider)
}

/// Maps a raw snapshot into the canonical record, or fails when the
/// producing schema is not recognized.
pub fn normalize(snapshot: &RawSnapshot) -> Result<NormalizedSnapshot, UnsupportedStatsProvider> {
    let provider = classify(snapshot)?;
    let mut normalized = NormalizedSnapshot::new(provider);

    match provider {
        StatsProvider::LegacyKeyed => {
            for report in &snapshot.reports {
                if report.id == LEGACY_BWE_REPORT_ID {
                    normalized.bandwidth_estimate_bps = report
                        .number(LEGACY_SEND_BANDWIDTH)
                        .map(|value| Sample {
                            timestamp_ms: report.timestamp_ms,
                            value,
                        })
                        .into();
                } else if report.kind == LEGACY_SSRC_REPORT_TYPE {
                    normalized.rtt_ms = report
                        .number(LEGACY_RTT)
                        .map(|value| Sample {
                            timestamp_ms: report.timestamp_ms,
                            value,
                        })
                        .into();
                    normalized.frame_width =
                        report.number(LEGACY_FRAME_WIDTH).map(|v| v as u32).into();
                    normalized.frame_height =
                        report.number(LEGACY_FRAME_HEIGHT).map(|v| v as u32).into();
                    normalized.packets_lost =
                        report.number(PACKETS_LOST).map(|v| v as i64).into();
                }
            }
        }
        StatsProvider::RtpTransceiver => {
            for report in &snapshot.reports {
                if report.id == RTP_RTCP_REPORT_ID {
                    normalized.rtt_ms = report
                        .number(RTP_RTT)
                        .map(|value| Sample {
                            timestamp_ms: report.timestamp_ms,
                            value,
                        })
                        .into();
                    normalized.packets_lost =
                        report.number(PACKETS_LOST).map(|v| v as i64).into();
                } else if report.id == RTP_RTP_REPORT_ID {
                    // This provider never reports the sent resolution;
                    // frame_width/frame_height stay Unsupported.
                    normalized.bitrate_mean = report.number(RTP_BITRATE_MEAN).into();
                    normalized.bitrate_std_dev = report.number(RTP_BITRATE_STD_DEV).into();
                    normalized.frame_rate_mean = report.number(RTP_FRAME_RATE_MEAN).into();
                }
            }
        }
    }

    Ok(normalized)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn snapshot_from(value: serde_json::Value) -> RawSnapshot {
        serde_json::from_value(value).expect("valid snapshot fixture")
    }

    #[test]
    fn normalizes_legacy_keyed_reports() {
        let snapshot = snapshot_from(json!({
            "reports": [
                {
                    "id": "bweforvideo",
                    "type": "VideoBwe",
                    "timestamp": 1_000,
                    "googAvailableSendBandwidth": "1500000"
                },
                {
                    "id": "ssrc_12345_send",
                    "type": "ssrc",
                    "timestamp": 1_000,
                    "googRtt": "40",
                    "googFrameWidthSent": "1280",
                    "googFrameHeightSent": "720",
                    "packetsLost": "3"
                }
            ]
        }));

        let normalized = normalize(&snapshot).unwrap();
        assert_eq!(normalized.provider, StatsProvider::LegacyKeyed);
        assert_eq!(
            normalized.bandwidth_estimate_bps,
            Metric::Value(Sample {
                timestamp_ms: 1_000,
                value: 1_500_000.0
            })
        );
        assert_eq!(
            normalized.rtt_ms,
            Metric::Value(Sample {
                timestamp_ms: 1_000,
                value: 40.0
            })
        );
        assert_eq!(normalized.frame_width, Metric::Value(1280));
        assert_eq!(normalized.frame_height, Metric::Value(720));
        assert_eq!(normalized.packets_lost, Metric::Value(3));
        // Fields this provider does not report stay marked, not zeroed.
        assert_eq!(normalized.bitrate_mean, Metric::Unsupported);
        assert_eq!(normalized.frame_rate_mean, Metric::Unsupported);
    }

    #[test]
    fn normalizes_rtp_transceiver_reports() {
        let snapshot = snapshot_from(json!({
            "reports": [
                {
                    "id": "outbound_rtcp_video_0",
                    "type": "outboundrtp",
                    "timestamp": 2_000,
                    "mozRtt": 35,
                    "packetsLost": 2,
                    "jitter": 0.004
                },
                {
                    "id": "outbound_rtp_video_0",
                    "type": "outboundrtp",
                    "timestamp": 2_000,
                    "bitrateMean": 950_000.5,
                    "bitrateStdDev": 120_000.0,
                    "framerateMean": 29.9
                }
            ]
        }));

        let normalized = normalize(&snapshot).unwrap();
        assert_eq!(normalized.provider, StatsProvider::RtpTransceiver);
        assert_eq!(
            normalized.rtt_ms,
            Metric::Value(Sample {
                timestamp_ms: 2_000,
                value: 35.0
            })
        );
        assert_eq!(normalized.packets_lost, Metric::Value(2));
        assert_eq!(normalized.bitrate_mean, Metric::Value(950_000.5));
        assert_eq!(normalized.bitrate_std_dev, Metric::Value(120_000.0));
        assert_eq!(normalized.frame_rate_mean, Metric::Value(29.9));
        // Resolution is structurally unsupported under this schema.
        assert_eq!(normalized.frame_width, Metric::Unsupported);
        assert_eq!(normalized.frame_height, Metric::Unsupported);
        assert_eq!(normalized.bandwidth_estimate_bps, Metric::Unsupported);
    }

    #[test]
    fn unknown_schema_fails_normalization() {
        let snapshot = snapshot_from(json!({
            "reports": [
                {
                    "id": "candidate-pair-1",
                    "type": "candidate-pair",
                    "timestamp": 3_000,
                    "availableOutgoingBitrate": 800_000
                }
            ]
        }));
        assert_eq!(normalize(&snapshot), Err(UnsupportedStatsProvider));
    }

    #[test]
    fn empty_snapshot_fails_normalization() {
        assert_eq!(
            normalize(&RawSnapshot::default()),
            Err(UnsupportedStatsProvider)
        );
    }

    #[test]
    fn last_snapshot_keeps_earlier_values_when_a_poll_omits_them() {
        let full = snapshot_from(json!({
            "reports": [
                {
                    "id": "ssrc_1_send",
                    "type": "ssrc",
                    "timestamp": 100,
                    "googRtt": "40",
                    "googFrameWidthSent": "1280",
                    "googFrameHeightSent": "720",
                    "packetsLost": "1"
                }
            ]
        }));
        let partial = snapshot_from(json!({
            "reports": [
                {
                    "id": "bweforvideo",
                    "type": "VideoBwe",
                    "timestamp": 200,
                    "googAvailableSendBandwidth": "900000"
                }
            ]
        }));

        let mut last = LastSnapshot::default();
        last.update(&normalize(&full).unwrap());
        last.update(&normalize(&partial).unwrap());
        assert_eq!(last.frame_width, Metric::Value(1280));
        assert_eq!(last.frame_height, Metric::Value(720));
        assert_eq!(last.packets_lost, Metric::Value(1));
        assert_eq!(last.provider, Some(StatsProvider::LegacyKeyed));
    }

    #[test]
    fn missing_fields_within_a_known_schema_stay_unsupported() {
        let snapshot = snapshot_from(json!({
            "reports": [
                {
                    "id": "ssrc_1_send",
                    "type": "ssrc",
                    "timestamp": 500,
                    "googRtt": "12"
                }
            ]
        }));
        let normalized = normalize(&snapshot).unwrap();
        assert_eq!(normalized.provider, StatsProvider::LegacyKeyed);
        assert!(normalized.rtt_ms.is_value());
        assert_eq!(normalized.frame_width, Metric::Unsupported);
        assert_eq!(normalized.bandwidth_estimate_bps, Metric::Unsupported);
    }
}
