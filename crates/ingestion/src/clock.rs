//! Per-source clock-drift smoothing
//!
//! Each exporter-backed parser maintains a smoothed offset initialized from
//! config. On every fetch it nudges the offset toward the observed drift
//! rather than jumping straight to it, so a single noisy sample can't throw
//! off downstream synchronization.

/// Exponentially-smoothed clock offset tracker.
///
/// Configured per source via `clock_offset_seconds`,
/// `clock_drift_tolerance_seconds`, `max_clock_offset_seconds`, and
/// `drift_smoothing`; a deliberately simpler three-step update than a full
/// Kalman filter (see DESIGN.md for why).
#[derive(Debug, Clone, Copy)]
pub struct ClockDriftFilter {
    offset: f64,
    tolerance: f64,
    max_offset: f64,
    alpha: f64,
}

impl ClockDriftFilter {
    pub fn new(initial_offset: f64, tolerance: f64, max_offset: f64, alpha: f64) -> Self {
        Self {
            offset: initial_offset,
            tolerance,
            max_offset,
            alpha: alpha.clamp(0.0, 1.0),
        }
    }

    pub fn offset(&self) -> f64 {
        self.offset
    }

    /// Correct a raw timestamp against `fetch_time`, updating the smoothed
    /// offset in place when the observed drift exceeds tolerance but stays
    /// within `max_offset` once applied.
    pub fn correct(&mut self, raw_ts: f64, fetch_time: f64) -> f64 {
        let mut corrected = raw_ts + self.offset;
        let drift = fetch_time - corrected;
        if drift.abs() > self.tolerance && (self.offset + drift).abs() <= self.max_offset {
            self.offset = (1.0 - self.alpha) * self.offset + self.alpha * (self.offset + drift);
            corrected = raw_ts + self.offset;
        }
        corrected
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_correction_within_tolerance() {
        let mut filter = ClockDriftFilter::new(0.0, 2.0, 300.0, 0.25);
        let corrected = filter.correct(100.0, 101.0);
        assert_eq!(corrected, 100.0);
        assert_eq!(filter.offset(), 0.0);
    }

    #[test]
    fn test_drift_beyond_tolerance_smooths_offset() {
        let mut filter = ClockDriftFilter::new(0.0, 2.0, 300.0, 0.25);
        // drift = 10, exceeds tolerance 2, within max_offset
        let corrected = filter.correct(100.0, 110.0);
        // offset <- 0*0.75 + 0.25*10 = 2.5
        assert!((filter.offset() - 2.5).abs() < 1e-9);
        assert!((corrected - 102.5).abs() < 1e-9);
    }

    #[test]
    fn test_drift_beyond_max_offset_rejected() {
        let mut filter = ClockDriftFilter::new(290.0, 2.0, 300.0, 0.25);
        let before = filter.offset();
        // drift would push offset + drift past max_offset
        let corrected = filter.correct(100.0, 500.0);
        assert_eq!(filter.offset(), before);
        assert_eq!(corrected, 100.0 + before);
    }
}
