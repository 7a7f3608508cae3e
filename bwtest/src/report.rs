//
// Copyright 2024 Signal Messenger, LLC
// SPDX-License-Identifier: AGPL-3.0-only
//

//! Final diagnostic report and the builder that derives it from the
//! accumulated run state.
//!
//! Building is a pure function of that state (plus the appended
//! summary log lines), so it can be exercised with synthetic
//! aggregates and no connection collaborator.

use serde::Serialize;

use crate::common::{push_entry, LogEntry, LogLevel};
use crate::config::{MediaConstraints, TestConfig};
use crate::error::TestError;
use crate::snapshot::{LastSnapshot, StatsProvider, UnsupportedStatsProvider};
use crate::stats::StatisticsAggregate;

/// Sentinel for "the bandwidth estimate never reached the ramp-up
/// threshold within the sampling window".
pub const RAMP_UP_NOT_REACHED_MS: i64 = -1;

/// Summary metrics. Optional fields are emitted only when the active
/// stats provider supports them; an absent field is never a
/// zero-valued placeholder. RTT and packet-loss fields are
/// provider-independent and always present.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportStats {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolution: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bps_avg: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bps_max: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ramp_up_time_ms: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bitrate_mean: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bitrate_std_dev: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frame_rate_mean: Option<f64>,
    pub rtt_average: f64,
    pub rtt_max: f64,
    pub lost_packets: i64,
}

/// The diagnostic result of one test run: the full log trail, the
/// summary stats, and the capture constraints the run used.
#[derive(Clone, Debug, Serialize)]
pub struct Report {
    pub log: Vec<LogEntry>,
    pub stats: ReportStats,
    pub constraints: MediaConstraints,
}

/// Derives the final report from the accumulated state, and the data
/// quality verdict: `None` means the measurement is usable (possibly
/// degraded), `Some` names the reason it is not.
pub fn build_report(
    config: &TestConfig,
    mut log: Vec<LogEntry>,
    bwe_stats: &StatisticsAggregate,
    rtt_stats: &StatisticsAggregate,
    last: &LastSnapshot,
    saw_unsupported_provider: bool,
    constraints: MediaConstraints,
) -> (Report, Option<TestError>) {
    let mut stats = ReportStats::default();
    let mut verdict = None;

    match last.provider {
        Some(StatsProvider::LegacyKeyed) => {
            let width = last.frame_width.value().copied().unwrap_or(0);
            let height = last.frame_height.value().copied().unwrap_or(0);
            // Some cameras report a placeholder like 2x2 right after
            // start while failing to deliver frames.
            if width < config.min_usable_dimension && height < config.min_usable_dimension {
                push_entry(
                    &mut log,
                    LogLevel::Fatal,
                    format!(
                        "Camera failure: {}x{}. Cannot test bandwidth without a working camera.",
                        width, height
                    ),
                );
                verdict = Some(TestError::DegenerateCameraOutput { width, height });
            } else {
                let resolution = format!("{}x{}", width, height);
                let bps_avg = bwe_stats.average();
                let bps_max = bwe_stats.max();
                let ramp_up_time_ms = bwe_stats
                    .ramp_up_time_ms()
                    .unwrap_or(RAMP_UP_NOT_REACHED_MS);
                push_entry(
                    &mut log,
                    LogLevel::Info,
                    format!("Video resolution: {}", resolution),
                );
                push_entry(
                    &mut log,
                    LogLevel::Info,
                    format!("Send bandwidth estimate average: {} bps", bps_avg),
                );
                push_entry(
                    &mut log,
                    LogLevel::Info,
                    format!("Send bandwidth estimate max: {} bps", bps_max),
                );
                push_entry(
                    &mut log,
                    LogLevel::Info,
                    format!("Send bandwidth ramp-up time: {} ms", ramp_up_time_ms),
                );
                stats.resolution = Some(resolution);
                stats.bps_avg = Some(bps_avg);
                stats.bps_max = Some(bps_max);
                stats.ramp_up_time_ms = Some(ramp_up_time_ms);
            }
        }
        Some(StatsProvider::RtpTransceiver) => {
            match last.frame_rate_mean.value() {
                Some(&frame_rate) if frame_rate > 0.0 => {
                    push_entry(
                        &mut log,
                        LogLevel::Success,
                        format!("Frame rate mean: {}", frame_rate.round() as i64),
                    );
                }
                _ => {
                    push_entry(
                        &mut log,
                        LogLevel::Error,
                        "Frame rate mean is 0, cannot test bandwidth without a working camera.",
                    );
                }
            }
            stats.frame_rate_mean = last.frame_rate_mean.value().copied();
            stats.bitrate_mean = last.bitrate_mean.value().copied();
            stats.bitrate_std_dev = last.bitrate_std_dev.value().copied();
            if let Some(bitrate_mean) = stats.bitrate_mean {
                push_entry(
                    &mut log,
                    LogLevel::Info,
                    format!("Send bitrate mean: {} bps", bitrate_mean),
                );
            }
            if let Some(bitrate_std_dev) = stats.bitrate_std_dev {
                push_entry(
                    &mut log,
                    LogLevel::Info,
                    format!("Send bitrate standard deviation: {} bps", bitrate_std_dev),
                );
            }
        }
        None => {
            if saw_unsupported_provider {
                verdict = Some(TestError::from(UnsupportedStatsProvider));
            }
        }
    }

    stats.rtt_average = rtt_stats.average();
    stats.rtt_max = rtt_stats.max();
    stats.lost_packets = last.packets_lost.value().copied().unwrap_or(0);
    push_entry(
        &mut log,
        LogLevel::Info,
        format!("RTT average: {} ms", stats.rtt_average),
    );
    push_entry(
        &mut log,
        LogLevel::Info,
        format!("RTT max: {} ms", stats.rtt_max),
    );
    push_entry(
        &mut log,
        LogLevel::Info,
        format!("Lost packets: {}", stats.lost_packets),
    );

    (
        Report {
            log,
            stats,
            constraints,
        },
        verdict,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::IceConfig;
    use crate::snapshot::Metric;

    fn config() -> TestConfig {
        TestConfig::new(IceConfig::default())
    }

    fn rtt_stats() -> StatisticsAggregate {
        let mut rtt = StatisticsAggregate::new();
        rtt.add(0, 40.0);
        rtt.add(100, 50.0);
        rtt
    }

    fn legacy_last(width: u32, height: u32) -> LastSnapshot {
        LastSnapshot {
            provider: Some(StatsProvider::LegacyKeyed),
            frame_width: Metric::Value(width),
            frame_height: Metric::Value(height),
            packets_lost: Metric::Value(3),
            ..LastSnapshot::default()
        }
    }

    #[test]
    fn legacy_provider_reports_bandwidth_and_resolution() {
        let mut bwe = StatisticsAggregate::with_ramp_up_threshold(1_500_000.0);
        bwe.add(0, 500_000.0);
        bwe.add(100, 1_000_000.0);
        bwe.add(200, 1_600_000.0);

        let (report, verdict) = build_report(
            &config(),
            vec![],
            &bwe,
            &rtt_stats(),
            &legacy_last(1280, 720),
            false,
            config().media_constraints(),
        );
        assert!(verdict.is_none());
        assert_eq!(report.stats.resolution.as_deref(), Some("1280x720"));
        assert_eq!(report.stats.bps_max, Some(1_600_000.0));
        assert_eq!(report.stats.bps_avg, Some(3_100_000.0 / 3.0));
        assert_eq!(report.stats.ramp_up_time_ms, Some(200));
        assert_eq!(report.stats.rtt_average, 45.0);
        assert_eq!(report.stats.rtt_max, 50.0);
        assert_eq!(report.stats.lost_packets, 3);
    }

    #[test]
    fn ramp_up_never_reached_uses_sentinel() {
        let mut bwe = StatisticsAggregate::with_ramp_up_threshold(1_500_000.0);
        bwe.add(0, 100_000.0);
        bwe.add(100, 200_000.0);

        let (report, verdict) = build_report(
            &config(),
            vec![],
            &bwe,
            &rtt_stats(),
            &legacy_last(640, 480),
            false,
            config().media_constraints(),
        );
        assert!(verdict.is_none());
        assert_eq!(report.stats.ramp_up_time_ms, Some(RAMP_UP_NOT_REACHED_MS));
    }

    #[test]
    fn degenerate_resolution_omits_bandwidth_but_keeps_rtt() {
        let mut bwe = StatisticsAggregate::with_ramp_up_threshold(1_500_000.0);
        bwe.add(0, 1_600_000.0);

        let (report, verdict) = build_report(
            &config(),
            vec![],
            &bwe,
            &rtt_stats(),
            &legacy_last(1, 1),
            false,
            config().media_constraints(),
        );
        assert!(matches!(
            verdict,
            Some(TestError::DegenerateCameraOutput {
                width: 1,
                height: 1
            })
        ));
        assert!(report
            .log
            .iter()
            .any(|e| e.level == LogLevel::Fatal && e.message.starts_with("Camera failure: 1x1")));
        assert_eq!(report.stats.resolution, None);
        assert_eq!(report.stats.bps_avg, None);
        assert_eq!(report.stats.bps_max, None);
        assert_eq!(report.stats.ramp_up_time_ms, None);
        assert_eq!(report.stats.rtt_average, 45.0);
        assert_eq!(report.stats.rtt_max, 50.0);
    }

    #[test]
    fn rtp_provider_reports_bitrate_statistics() {
        let last = LastSnapshot {
            provider: Some(StatsProvider::RtpTransceiver),
            packets_lost: Metric::Value(2),
            bitrate_mean: Metric::Value(950_000.5),
            bitrate_std_dev: Metric::Value(120_000.0),
            frame_rate_mean: Metric::Value(29.9),
            ..LastSnapshot::default()
        };

        let (report, verdict) = build_report(
            &config(),
            vec![],
            &StatisticsAggregate::new(),
            &rtt_stats(),
            &last,
            false,
            config().media_constraints(),
        );
        assert!(verdict.is_none());
        assert!(report
            .log
            .iter()
            .any(|e| e.level == LogLevel::Success && e.message == "Frame rate mean: 30"));
        assert_eq!(report.stats.bitrate_mean, Some(950_000.5));
        assert_eq!(report.stats.bitrate_std_dev, Some(120_000.0));
        assert_eq!(report.stats.frame_rate_mean, Some(29.9));
        assert_eq!(report.stats.resolution, None);
        assert_eq!(report.stats.bps_avg, None);
    }

    #[test]
    fn zero_frame_rate_is_degraded_not_fatal() {
        let last = LastSnapshot {
            provider: Some(StatsProvider::RtpTransceiver),
            bitrate_mean: Metric::Value(0.0),
            frame_rate_mean: Metric::Value(0.0),
            ..LastSnapshot::default()
        };

        let (report, verdict) = build_report(
            &config(),
            vec![],
            &StatisticsAggregate::new(),
            &rtt_stats(),
            &last,
            false,
            config().media_constraints(),
        );
        assert!(verdict.is_none());
        assert!(report
            .log
            .iter()
            .any(|e| e.level == LogLevel::Error && e.message.starts_with("Frame rate mean is 0")));
    }

    #[test]
    fn unsupported_provider_yields_rtt_only_verdict() {
        let (report, verdict) = build_report(
            &config(),
            vec![],
            &StatisticsAggregate::new(),
            &rtt_stats(),
            &LastSnapshot::default(),
            true,
            config().media_constraints(),
        );
        assert!(matches!(
            verdict,
            Some(TestError::UnsupportedStatsProvider(_))
        ));
        assert_eq!(report.stats.bps_avg, None);
        assert_eq!(report.stats.rtt_average, 45.0);
    }

    #[test]
    fn absent_fields_are_omitted_from_serialized_stats() {
        let (report, _) = build_report(
            &config(),
            vec![],
            &StatisticsAggregate::new(),
            &rtt_stats(),
            &legacy_last(1, 1),
            false,
            config().media_constraints(),
        );
        let value = serde_json::to_value(&report.stats).unwrap();
        let object = value.as_object().unwrap();
        assert!(!object.contains_key("bpsAvg"));
        assert!(!object.contains_key("resolution"));
        assert!(object.contains_key("rttAverage"));
        assert!(object.contains_key("rttMax"));
        assert!(object.contains_key("lostPackets"));
    }
}
