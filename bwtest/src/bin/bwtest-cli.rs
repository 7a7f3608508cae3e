//
// Copyright 2024 Signal Messenger, LLC
// SPDX-License-Identifier: AGPL-3.0-only
//

//! Runs the video bandwidth test against the simulated media stack and
//! prints the diagnostic report as JSON. Useful for exercising the
//! sampling loop and report shape without a real camera or relay.

use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use fern::Dispatch;
use log::*;

use bwtest::config::{IceConfig, IceServer, TestConfig};
use bwtest::snapshot::RawSnapshot;
use bwtest::webrtc::peer_connection::StatsError;
use bwtest::webrtc::sim::media::SimMediaSource;
use bwtest::webrtc::sim::peer_connection::SimPeerConnection;
use bwtest::VideoBandwidthTest;

#[derive(Parser, Debug)]
struct Args {
    /// Relay (TURN) server URLs. At least one is required.
    #[arg(long)]
    relay_servers: Vec<String>,

    #[arg(long, default_value = "")]
    relay_username: String,

    #[arg(long, default_value = "")]
    relay_password: String,

    /// The bitrate ceiling applied to the video sender.
    #[arg(long, default_value = "2000")]
    max_video_bitrate_kbps: u32,

    /// Length of the sampling window, measured from connection
    /// establishment.
    #[arg(long, default_value = "40000")]
    duration_ms: u64,

    /// Interval between stats polls.
    #[arg(long, default_value = "100")]
    stat_step_ms: u64,

    /// Pins a specific capture device.
    #[arg(long)]
    device_id: Option<String>,

    /// If set, specifies the file to use for logging.
    #[arg(long)]
    log_file: Option<String>,

    /// If set, writes the JSON report here instead of stdout.
    #[arg(long)]
    report_file: Option<String>,
}

/// Synthesizes a legacy keyed-report snapshot stream whose bandwidth
/// estimate ramps toward the configured ceiling.
fn synthetic_snapshot(
    index: usize,
    step_ms: u64,
    max_video_bitrate_kbps: u32,
) -> Result<RawSnapshot, StatsError> {
    let timestamp_ms = (index as u64 * step_ms) as i64;
    let ceiling_bps = max_video_bitrate_kbps as i64 * 1000;
    // Exponential approach: ~95% of the ceiling after 30 polls.
    let bandwidth_bps = ceiling_bps - ceiling_bps * 9 / (10 + index as i64 * 3);
    let rtt_ms = 40 + (index % 5) as i64;
    serde_json::from_value(serde_json::json!({
        "reports": [
            {
                "id": "bweforvideo",
                "type": "VideoBwe",
                "timestamp": timestamp_ms,
                "googAvailableSendBandwidth": bandwidth_bps.to_string()
            },
            {
                "id": "ssrc_1_send",
                "type": "ssrc",
                "timestamp": timestamp_ms,
                "googRtt": rtt_ms.to_string(),
                "googFrameWidthSent": "1280",
                "googFrameHeightSent": "720",
                "packetsLost": "0"
            }
        ]
    }))
    .map_err(|e| StatsError(e.to_string()))
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let fern_logger = Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "[{} {} {}] {}",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f"),
                record.level(),
                record.target(),
                message
            ))
        })
        .level(LevelFilter::Debug);

    if let Some(log_file) = &args.log_file {
        fern_logger.chain(fern::log_file(log_file)?).apply()?;
    } else {
        fern_logger.chain(std::io::stdout()).apply()?;
    }

    let servers = if args.relay_servers.is_empty() {
        vec![]
    } else {
        info!("Setting relay servers: {:?}", args.relay_servers);
        vec![IceServer {
            urls: args.relay_servers.clone(),
            username: args.relay_username.clone(),
            password: args.relay_password.clone(),
        }]
    };

    let mut config = TestConfig::new(IceConfig { servers });
    config.max_video_bitrate_kbps = args.max_video_bitrate_kbps;
    config.duration = Duration::from_millis(args.duration_ms);
    config.stat_step = Duration::from_millis(args.stat_step_ms);
    config.media_options.video_device_id = args.device_id.clone();

    let step_ms = args.stat_step_ms;
    let max_kbps = args.max_video_bitrate_kbps;
    let mut media = SimMediaSource::with_camera("Simulated HD Camera");
    let mut connection = SimPeerConnection::with_generator(move |index| {
        synthetic_snapshot(index, step_ms, max_kbps)
    });

    let outcome = VideoBandwidthTest::new(config)
        .run(&mut media, &mut connection)
        .await;
    let (report, failure) = match &outcome {
        Ok(report) => (report, None),
        Err(failure) => (&failure.report, Some(&failure.error)),
    };

    let json = serde_json::to_string_pretty(report)?;
    if let Some(report_file) = &args.report_file {
        std::fs::write(report_file, &json)?;
        info!("Report written to {}", report_file);
    } else {
        println!("{}", json);
    }

    match failure {
        None => Ok(()),
        Some(error) => Err(anyhow::anyhow!("bandwidth test failed: {}", error)),
    }
}
