//
// Copyright 2024 Signal Messenger, LLC
// SPDX-License-Identifier: AGPL-3.0-only
//

//! Connection collaborator interface.
//!
//! The peer connection itself (negotiation, ICE, codecs) is
//! host-provided; the measurement consumes it through this boundary.
//! Candidate filtering, FEC, and the bitrate constraint are pre-start
//! configuration, consumed once before [`PeerConnection::establish`].

use thiserror::Error;

use super::media::{MediaStream, VideoTrack};
use crate::snapshot::RawSnapshot;

/// Connection negotiation failed; terminal for a test run.
#[derive(Clone, Debug, Error)]
#[error("connection failed: {0}")]
pub struct ConnectionError(pub String);

/// A single stats poll failed; recoverable, the loop continues.
#[derive(Clone, Debug, Error)]
#[error("{0}")]
pub struct StatsError(pub String);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CandidateType {
    Host,
    ServerReflexive,
    Relay,
}

/// A connectivity candidate, as seen by the candidate filter.
#[derive(Clone, Debug)]
pub struct IceCandidate {
    pub candidate_type: CandidateType,
}

/// Predicate deciding which candidates the connection may use.
pub type IceCandidateFilter = fn(&IceCandidate) -> bool;

/// Restricts the connection to relayed candidates, so the measurement
/// exercises the relay path the test is validating.
pub fn is_relay(candidate: &IceCandidate) -> bool {
    candidate.candidate_type == CandidateType::Relay
}

/// The peer connection the test measures over.
#[allow(async_fn_in_trait)]
pub trait PeerConnection {
    fn set_ice_candidate_filter(&mut self, filter: IceCandidateFilter);
    fn disable_video_fec(&mut self);
    fn constrain_video_bitrate(&mut self, max_kbps: u32);
    fn add_local_stream(&mut self, stream: &MediaStream);

    /// Negotiates the connection; suspends until established.
    async fn establish(&mut self) -> Result<(), ConnectionError>;

    /// Retrieves one raw stats snapshot for the given send track.
    async fn get_stats(&mut self, track: &VideoTrack) -> Result<RawSnapshot, StatsError>;

    /// Closes the connection. Implementations may be called at most
    /// once per connection by the test.
    fn close(&mut self);
}
