//! Global nearest-neighbor track-to-candidate association.
//!
//! Predicted track positions and candidates are matched by solving a
//! square, gated assignment problem with a true Hungarian solve, rather
//! than a greedy nearest-available-track heuristic, for a globally optimal
//! match.

use crate::hungarian;
use crate::kalman::GATE_METERS;

/// Cost assigned to a track/candidate pairing beyond [`GATE_METERS`] — large
/// enough that the solver avoids it when any in-gate pairing exists, while
/// keeping the matrix well-formed for a square solve.
const GATING_COST: f64 = 10.0 * GATE_METERS;

/// Padding cost for the extra rows/columns added to square the matrix.
/// Strictly greater than [`GATING_COST`] so a real gated pairing is always
/// preferred over a padding slot.
const SENTINEL_COST: f64 = GATING_COST + 1.0;

#[derive(Debug, PartialEq, Eq)]
pub enum Assignment {
    /// Track index matched to candidate index.
    Matched { track: usize, candidate: usize },
    /// Track had no in-gate candidate this tick (a miss).
    TrackUnmatched { track: usize },
    /// Candidate had no in-gate track (a new track).
    CandidateUnmatched { candidate: usize },
}

/// Associate `n` predicted track positions against `m` candidate positions.
/// Builds an `n x m` euclidean-distance cost matrix, gates pairs beyond
/// [`GATE_METERS`] to [`SENTINEL_COST`], pads to a square matrix with
/// sentinel cost, and solves with the Hungarian
/// algorithm. Any assignment landing on a padded row/column or a
/// beyond-gate pairing is reported unmatched instead.
pub fn associate(tracks: &[(f64, f64)], candidates: &[(f64, f64)]) -> Vec<Assignment> {
    let n = tracks.len();
    let m = candidates.len();

    if n == 0 && m == 0 {
        return Vec::new();
    }
    if n == 0 {
        return (0..m).map(|candidate| Assignment::CandidateUnmatched { candidate }).collect();
    }
    if m == 0 {
        return (0..n).map(|track| Assignment::TrackUnmatched { track }).collect();
    }

    let size = n.max(m);
    let mut cost = vec![vec![SENTINEL_COST; size]; size];
    for (i, track) in tracks.iter().enumerate() {
        for (j, candidate) in candidates.iter().enumerate() {
            let distance = crate::kalman::euclidean_distance(*track, *candidate);
            cost[i][j] = if distance <= GATE_METERS { distance } else { GATING_COST };
        }
    }

    let assignment = hungarian::solve(&cost);

    let mut matched_candidates = vec![false; m];
    let mut results = Vec::with_capacity(n + m);

    for track in 0..n {
        let col = assignment[track];
        if col < m && cost[track][col] <= GATE_METERS {
            matched_candidates[col] = true;
            results.push(Assignment::Matched { track, candidate: col });
        } else {
            results.push(Assignment::TrackUnmatched { track });
        }
    }
    for (candidate, matched) in matched_candidates.iter().enumerate() {
        if !matched {
            results.push(Assignment::CandidateUnmatched { candidate });
        }
    }

    results
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_track_single_candidate_in_gate() {
        let tracks = vec![(0.0, 0.0)];
        let candidates = vec![(1.0, 0.0)];
        let result = associate(&tracks, &candidates);
        assert_eq!(result, vec![Assignment::Matched { track: 0, candidate: 0 }]);
    }

    #[test]
    fn test_out_of_gate_pair_is_unmatched() {
        let tracks = vec![(0.0, 0.0)];
        let candidates = vec![(10.0, 0.0)];
        let result = associate(&tracks, &candidates);
        assert_eq!(
            result,
            vec![Assignment::TrackUnmatched { track: 0 }, Assignment::CandidateUnmatched { candidate: 0 }]
        );
    }

    #[test]
    fn test_two_targets_disambiguated_by_nearest() {
        // Global-optimal match should not cross-assign even when a greedy
        // scan (nearest-first) would get it wrong.
        let tracks = vec![(0.0, 0.0), (10.0, 0.0)];
        let candidates = vec![(0.5, 0.0), (10.5, 0.0)];
        let result = associate(&tracks, &candidates);
        assert!(result.contains(&Assignment::Matched { track: 0, candidate: 0 }));
        assert!(result.contains(&Assignment::Matched { track: 1, candidate: 1 }));
    }

    #[test]
    fn test_empty_tracks_all_candidates_new() {
        let result = associate(&[], &[(1.0, 1.0), (2.0, 2.0)]);
        assert_eq!(
            result,
            vec![
                Assignment::CandidateUnmatched { candidate: 0 },
                Assignment::CandidateUnmatched { candidate: 1 }
            ]
        );
    }
}
