//
// Copyright 2024 Signal Messenger, LLC
// SPDX-License-Identifier: AGPL-3.0-only
//

//! Media collaborator interface.
//!
//! Acquiring a camera stream is host-provided plumbing, out of core
//! scope; the measurement only depends on this boundary.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use thiserror::Error;

use crate::config::MediaConstraints;

/// Failure to acquire local media (device missing, permission denied).
/// `name` is the host error identifier, surfaced verbatim in the log.
#[derive(Clone, Debug, Error)]
#[error("{name}: {message}")]
pub struct MediaError {
    pub name: String,
    pub message: String,
}

impl MediaError {
    pub fn new(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            message: message.into(),
        }
    }
}

/// A local video capture track.
#[derive(Clone, Debug)]
pub struct VideoTrack {
    label: String,
    stopped: Arc<AtomicBool>,
}

impl VideoTrack {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            stopped: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Device name of the capturing camera.
    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn stop(&self) {
        self.stopped.store(true, Ordering::SeqCst);
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }
}

/// A stream of local capture tracks, as delivered by the media
/// collaborator.
#[derive(Clone, Debug, Default)]
pub struct MediaStream {
    video_tracks: Vec<VideoTrack>,
}

impl MediaStream {
    pub fn new(video_tracks: Vec<VideoTrack>) -> Self {
        Self { video_tracks }
    }

    pub fn with_video_track(track: VideoTrack) -> Self {
        Self::new(vec![track])
    }

    pub fn video_tracks(&self) -> &[VideoTrack] {
        &self.video_tracks
    }

    pub fn first_video_track(&self) -> Option<&VideoTrack> {
        self.video_tracks.first()
    }

    /// Stops every track; part of test teardown.
    pub fn stop_tracks(&self) {
        for track in &self.video_tracks {
            track.stop();
        }
    }
}

/// Acquires local media for a test run.
#[allow(async_fn_in_trait)]
pub trait MediaSource {
    async fn acquire(
        &mut self,
        constraints: &MediaConstraints,
    ) -> Result<MediaStream, MediaError>;
}
