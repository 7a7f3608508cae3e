//
// Copyright 2024 Signal Messenger, LLC
// SPDX-License-Identifier: AGPL-3.0-only
//

//! Simulation peer connection.
//!
//! Serves scripted stats snapshots (a fixed queue or a generator
//! closure) and records every configuration call and teardown so
//! tests can assert the contract the sampling loop must honor.

use std::collections::VecDeque;

use crate::snapshot::RawSnapshot;
use crate::webrtc::media::{MediaStream, VideoTrack};
use crate::webrtc::peer_connection::{
    ConnectionError, IceCandidateFilter, PeerConnection, StatsError,
};

type SnapshotFn = Box<dyn FnMut(usize) -> Result<RawSnapshot, StatsError> + Send>;

/// An in-memory peer connection.
pub struct SimPeerConnection {
    script: VecDeque<Result<RawSnapshot, StatsError>>,
    generator: Option<SnapshotFn>,
    establish_error: Option<ConnectionError>,
    candidate_filter: Option<IceCandidateFilter>,
    video_fec_disabled: bool,
    max_video_bitrate_kbps: Option<u32>,
    local_streams: Vec<MediaStream>,
    established: bool,
    get_stats_count: usize,
    close_count: usize,
}

impl Default for SimPeerConnection {
    fn default() -> Self {
        Self::new()
    }
}

impl SimPeerConnection {
    pub fn new() -> Self {
        Self {
            script: VecDeque::new(),
            generator: None,
            establish_error: None,
            candidate_filter: None,
            video_fec_disabled: false,
            max_video_bitrate_kbps: None,
            local_streams: Vec::new(),
            established: false,
            get_stats_count: 0,
            close_count: 0,
        }
    }

    /// Serves the given snapshot results in order; when the queue runs
    /// out, further polls fail with a transient stats error.
    pub fn with_snapshots(
        snapshots: impl IntoIterator<Item = Result<RawSnapshot, StatsError>>,
    ) -> Self {
        Self {
            script: snapshots.into_iter().collect(),
            ..Self::new()
        }
    }

    /// Serves snapshots from a generator, called with the zero-based
    /// poll index.
    pub fn with_generator(
        generator: impl FnMut(usize) -> Result<RawSnapshot, StatsError> + Send + 'static,
    ) -> Self {
        Self {
            generator: Some(Box::new(generator)),
            ..Self::new()
        }
    }

    /// Makes `establish()` fail with the given error.
    pub fn failing_establish(error: ConnectionError) -> Self {
        Self {
            establish_error: Some(error),
            ..Self::new()
        }
    }

    pub fn candidate_filter(&self) -> Option<IceCandidateFilter> {
        self.candidate_filter
    }

    pub fn video_fec_disabled(&self) -> bool {
        self.video_fec_disabled
    }

    pub fn max_video_bitrate_kbps(&self) -> Option<u32> {
        self.max_video_bitrate_kbps
    }

    pub fn local_streams(&self) -> &[MediaStream] {
        &self.local_streams
    }

    pub fn established(&self) -> bool {
        self.established
    }

    pub fn get_stats_count(&self) -> usize {
        self.get_stats_count
    }

    pub fn close_count(&self) -> usize {
        self.close_count
    }
}

impl PeerConnection for SimPeerConnection {
    fn set_ice_candidate_filter(&mut self, filter: IceCandidateFilter) {
        self.candidate_filter = Some(filter);
    }

    fn disable_video_fec(&mut self) {
        self.video_fec_disabled = true;
    }

    fn constrain_video_bitrate(&mut self, max_kbps: u32) {
        self.max_video_bitrate_kbps = Some(max_kbps);
    }

    fn add_local_stream(&mut self, stream: &MediaStream) {
        self.local_streams.push(stream.clone());
    }

    async fn establish(&mut self) -> Result<(), ConnectionError> {
        if let Some(error) = &self.establish_error {
            return Err(error.clone());
        }
        self.established = true;
        Ok(())
    }

    async fn get_stats(&mut self, _track: &VideoTrack) -> Result<RawSnapshot, StatsError> {
        let index = self.get_stats_count;
        self.get_stats_count += 1;
        if let Some(generator) = &mut self.generator {
            return generator(index);
        }
        self.script
            .pop_front()
            .unwrap_or_else(|| Err(StatsError("no snapshot available".to_string())))
    }

    fn close(&mut self) {
        self.close_count += 1;
        self.established = false;
    }
}
