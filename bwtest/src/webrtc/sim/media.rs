//
// Copyright 2024 Signal Messenger, LLC
// SPDX-License-Identifier: AGPL-3.0-only
//

//! Simulation media source.

use crate::config::MediaConstraints;
use crate::webrtc::media::{MediaError, MediaSource, MediaStream, VideoTrack};

/// An in-memory media source that either delivers a single-track
/// stream for a named camera or fails with a scripted error. Records
/// every acquisition attempt so tests can assert the pre-flight
/// short-circuit never touched media.
#[derive(Debug, Default)]
pub struct SimMediaSource {
    camera_label: Option<String>,
    fail_with: Option<MediaError>,
    acquire_count: usize,
    last_constraints: Option<MediaConstraints>,
}

impl SimMediaSource {
    pub fn with_camera(label: impl Into<String>) -> Self {
        Self {
            camera_label: Some(label.into()),
            ..Self::default()
        }
    }

    pub fn failing(error: MediaError) -> Self {
        Self {
            fail_with: Some(error),
            ..Self::default()
        }
    }

    pub fn acquire_count(&self) -> usize {
        self.acquire_count
    }

    pub fn last_constraints(&self) -> Option<&MediaConstraints> {
        self.last_constraints.as_ref()
    }
}

impl MediaSource for SimMediaSource {
    async fn acquire(
        &mut self,
        constraints: &MediaConstraints,
    ) -> Result<MediaStream, MediaError> {
        self.acquire_count += 1;
        self.last_constraints = Some(constraints.clone());
        if let Some(error) = &self.fail_with {
            return Err(error.clone());
        }
        let label = self.camera_label.clone().unwrap_or_default();
        Ok(MediaStream::with_video_track(VideoTrack::new(label)))
    }
}
