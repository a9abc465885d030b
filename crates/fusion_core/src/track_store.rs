//! Track lifecycle management: a confirm/lost/terminate state machine over
//! the track memory, driven by consecutive hit/miss counts.

use contracts::{KalmanState, TrackMemory, TrackStatus};

use crate::candidate::Candidate;
use crate::kalman;

/// Hits (while `Init`) required before a track is promoted to `Confirmed`.
pub const CONFIRM_HITS: u32 = 2;
/// Consecutive misses before a `Confirmed` track is demoted to `Lost`.
pub const LOST_MISSES: u32 = 2;
/// Consecutive misses (from first miss) before a track is dropped entirely.
pub const TERMINATE_MISSES: u32 = 4;

/// Confidence multiplier applied on a miss.
const MISS_CONFIDENCE_DECAY: f64 = 0.85;
/// Weight given to the prior confidence on a hit; the remainder goes to the
/// matched candidate's confidence.
const HIT_CONFIDENCE_RETENTION: f64 = 0.7;

pub struct TrackStore {
    tracks: Vec<TrackMemory>,
    next_id: u64,
}

impl TrackStore {
    pub fn new() -> Self {
        Self { tracks: Vec::new(), next_id: 0 }
    }

    pub fn tracks(&self) -> &[TrackMemory] {
        &self.tracks
    }

    pub fn predicted_positions(&self, reference_time: f64) -> Vec<(f64, f64)> {
        self.tracks
            .iter()
            .map(|t| {
                let dt = (reference_time - t.timestamp).max(0.0);
                kalman::predict(&t.kalman, dt).position()
            })
            .collect()
    }

    fn fresh_id(&mut self) -> String {
        let id = format!("track-{}", self.next_id);
        self.next_id += 1;
        id
    }

    /// Advance a matched track: predict to `reference_time`, Kalman-update
    /// with the candidate position, bump hits/reset misses, blend
    /// confidence, and promote out of `Init` after [`CONFIRM_HITS`] hits.
    pub fn apply_hit(&mut self, index: usize, candidate: &Candidate, reference_time: f64) {
        let track = &mut self.tracks[index];
        let dt = (reference_time - track.timestamp).max(0.0);
        let predicted = kalman::predict(&track.kalman, dt);
        track.kalman = kalman::update(&predicted, candidate.position, candidate.uncertainty);
        track.timestamp = reference_time;
        track.hits += 1;
        track.misses = 0;
        track.confidence =
            HIT_CONFIDENCE_RETENTION * track.confidence + (1.0 - HIT_CONFIDENCE_RETENTION) * candidate.confidence;

        if track.status == TrackStatus::Init && track.hits >= CONFIRM_HITS {
            track.status = TrackStatus::Confirmed;
        } else if track.status == TrackStatus::Lost {
            track.status = TrackStatus::Confirmed;
        }
    }

    /// Advance an unmatched track: predict position forward, bump misses,
    /// decay confidence, demote/terminate per the lifecycle thresholds.
    /// Returns `false` if the track should be dropped.
    pub fn apply_miss(&mut self, index: usize, reference_time: f64) -> bool {
        let track = &mut self.tracks[index];
        let dt = (reference_time - track.timestamp).max(0.0);
        track.kalman = kalman::predict(&track.kalman, dt);
        track.timestamp = reference_time;
        track.misses += 1;
        track.confidence *= MISS_CONFIDENCE_DECAY;

        if track.misses >= TERMINATE_MISSES {
            return false;
        }
        if track.misses >= LOST_MISSES {
            track.status = TrackStatus::Lost;
        }
        true
    }

    pub fn spawn(&mut self, candidate: &Candidate) {
        let track_id = self.fresh_id();
        let kalman = kalman::init_state(candidate.position, candidate.uncertainty);
        self.tracks.push(TrackMemory {
            track_id,
            timestamp: candidate.timestamp,
            kalman,
            confidence: candidate.confidence,
            status: TrackStatus::Init,
            hits: 1,
            misses: 0,
        });
    }

    pub fn retain_index(&mut self, keep: &[bool]) {
        let mut iter = keep.iter();
        self.tracks.retain(|_| *iter.next().unwrap_or(&true));
    }

    #[cfg(test)]
    pub fn kalman_at(&self, index: usize) -> KalmanState {
        self.tracks[index].kalman
    }
}

impl Default for TrackStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(position: (f64, f64), timestamp: f64) -> Candidate {
        Candidate { timestamp, position, uncertainty: (1.0, 1.0), confidence: 0.9 }
    }

    #[test]
    fn test_spawn_creates_init_track() {
        let mut store = TrackStore::new();
        store.spawn(&candidate((1.0, 2.0), 0.0));
        assert_eq!(store.tracks().len(), 1);
        assert_eq!(store.tracks()[0].status, TrackStatus::Init);
        assert_eq!(store.tracks()[0].hits, 1);
    }

    #[test]
    fn test_confirm_after_enough_hits() {
        let mut store = TrackStore::new();
        store.spawn(&candidate((0.0, 0.0), 0.0));
        store.apply_hit(0, &candidate((0.1, 0.1), 1.0), 1.0);
        assert_eq!(store.tracks()[0].status, TrackStatus::Confirmed);
    }

    #[test]
    fn test_lost_then_terminated() {
        let mut store = TrackStore::new();
        store.spawn(&candidate((0.0, 0.0), 0.0));
        store.apply_hit(0, &candidate((0.0, 0.0), 1.0), 1.0);
        assert!(store.apply_miss(0, 2.0));
        assert_eq!(store.tracks()[0].status, TrackStatus::Confirmed);
        assert!(store.apply_miss(0, 3.0));
        assert_eq!(store.tracks()[0].status, TrackStatus::Lost);
        assert!(store.apply_miss(0, 4.0));
        assert!(!store.apply_miss(0, 5.0));
    }

    #[test]
    fn test_init_track_demotes_to_lost_on_misses() {
        // A freshly spawned track that never gets confirmed must still
        // demote to Lost once it accrues LOST_MISSES consecutive misses,
        // not stay stuck in Init.
        let mut store = TrackStore::new();
        store.spawn(&candidate((0.0, 0.0), 0.0));
        assert_eq!(store.tracks()[0].status, TrackStatus::Init);
        assert!(store.apply_miss(0, 1.0));
        assert_eq!(store.tracks()[0].status, TrackStatus::Init);
        assert!(store.apply_miss(0, 2.0));
        assert_eq!(store.tracks()[0].status, TrackStatus::Lost);
    }
}
