//
// Copyright 2024 Signal Messenger, LLC
// SPDX-License-Identifier: AGPL-3.0-only
//

//! Error taxonomy for a bandwidth test run.

use thiserror::Error;

use crate::report::Report;
use crate::snapshot::UnsupportedStatsProvider;
use crate::webrtc::media::MediaError;
use crate::webrtc::peer_connection::{ConnectionError, StatsError};

/// What went wrong. Setup-phase variants are terminal; per-poll
/// variants are recovered locally by logging and continuing the loop,
/// and only surface here when they poison the whole run's data.
#[derive(Clone, Debug, Error)]
pub enum TestError {
    /// No relay servers configured. Pre-flight, nothing acquired yet.
    #[error("no ICE servers were provided")]
    Configuration,
    /// Camera/mic unavailable or denied. Aborts before connection
    /// setup.
    #[error("failed to get access to local media: {0}")]
    MediaAcquisition(MediaError),
    /// Negotiation failure. Aborts sampling.
    #[error("{0}")]
    Connection(ConnectionError),
    /// A single stats poll failed. Transient; the loop logs this and
    /// continues, so it never terminates a run on its own.
    #[error(transparent)]
    StatsRetrieval(#[from] StatsError),
    /// No snapshot matched a known schema, so the run produced
    /// RTT-only data at best.
    #[error(transparent)]
    UnsupportedStatsProvider(#[from] UnsupportedStatsProvider),
    /// The camera reported a placeholder resolution and never
    /// delivered usable frames; bandwidth numbers would be
    /// meaningless.
    #[error("camera failure: {width}x{height}; cannot test bandwidth without a working camera")]
    DegenerateCameraOutput { width: u32, height: u32 },
    /// The run was stopped externally.
    #[error("test cancelled")]
    Cancelled,
}

/// A failed run. Carries the report built from whatever log and
/// partial stats were accumulated, so callers can distinguish "no
/// usable measurement" from "measurement degraded" by the log trail.
#[derive(Debug, Error)]
#[error("{error}")]
pub struct TestFailure {
    pub error: TestError,
    pub report: Report,
}

impl TestFailure {
    pub fn new(error: TestError, report: Report) -> Self {
        Self { error, report }
    }
}
