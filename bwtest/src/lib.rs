//
// Copyright 2024 Signal Messenger, LLC
// SPDX-License-Identifier: AGPL-3.0-only
//

//! # bwtest -- Video Bandwidth Diagnostics
//!
//! Measures outbound video bandwidth ramp-up, sustained throughput,
//! and round-trip latency over an active peer connection, producing a
//! structured diagnostic [`report::Report`].
//!
//! The measurement pipeline polls connection statistics on a fixed
//! cadence, normalizes the provider-specific report schemas into one
//! canonical shape, accumulates bandwidth/RTT time series, and derives
//! the summary metrics used to judge whether the network path is
//! adequate. Media acquisition and connection negotiation are host
//! concerns, consumed through the [`webrtc`] collaborator traits.

pub mod common;
pub mod config;
pub mod error;
pub mod report;
pub mod snapshot;
pub mod stats;

/// Collaborator interfaces around the host media stack, plus their
/// in-memory simulation.
pub mod webrtc {
    pub mod media;
    pub mod peer_connection;

    pub mod sim {
        pub mod media;
        pub mod peer_connection;
    }
}

pub use bandwidth_test::{StopHandle, TestPhase, VideoBandwidthTest};
pub use config::{IceConfig, IceServer, TestConfig};
pub use error::{TestError, TestFailure};
pub use report::Report;
