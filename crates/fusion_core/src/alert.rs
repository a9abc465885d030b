//! Alert tier classification
//!
//! A track's signals this tick (mmWave presence, corroborating vision,
//! Wi-Fi anomaly flag, BLE-only presence) are reduced to a single severity
//! tier via a fixed precedence table — not scored, so there's no tie to
//! break.

use contracts::AlertTier;

#[derive(Clone, Copy, Debug, Default)]
pub struct TrackSignals {
    pub mmwave: bool,
    pub vision: bool,
    pub wifi_anomaly: bool,
    pub ble: bool,
}

/// Alert tier table, checked most-severe first:
/// mmWave+vision -> red, mmWave+wifi-anomaly -> orange, mmWave alone ->
/// yellow, wifi-anomaly alone -> orange, BLE alone -> blue, else none.
pub fn classify(signals: TrackSignals) -> AlertTier {
    if signals.mmwave && signals.vision {
        AlertTier::Red
    } else if signals.mmwave && signals.wifi_anomaly {
        AlertTier::Orange
    } else if signals.mmwave {
        AlertTier::Yellow
    } else if signals.wifi_anomaly {
        AlertTier::Orange
    } else if signals.ble {
        AlertTier::Blue
    } else {
        AlertTier::None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mmwave_and_vision_is_red() {
        let tier = classify(TrackSignals { mmwave: true, vision: true, ..Default::default() });
        assert_eq!(tier, AlertTier::Red);
    }

    #[test]
    fn test_mmwave_and_wifi_anomaly_is_orange() {
        let tier = classify(TrackSignals { mmwave: true, wifi_anomaly: true, ..Default::default() });
        assert_eq!(tier, AlertTier::Orange);
    }

    #[test]
    fn test_mmwave_alone_is_yellow() {
        let tier = classify(TrackSignals { mmwave: true, ..Default::default() });
        assert_eq!(tier, AlertTier::Yellow);
    }

    #[test]
    fn test_wifi_anomaly_alone_is_orange() {
        let tier = classify(TrackSignals { wifi_anomaly: true, ..Default::default() });
        assert_eq!(tier, AlertTier::Orange);
    }

    #[test]
    fn test_ble_alone_is_blue() {
        let tier = classify(TrackSignals { ble: true, ..Default::default() });
        assert_eq!(tier, AlertTier::Blue);
    }

    #[test]
    fn test_no_signals_is_none() {
        assert_eq!(classify(TrackSignals::default()), AlertTier::None);
    }

    #[test]
    fn test_classify_is_total() {
        for mmwave in [false, true] {
            for vision in [false, true] {
                for wifi_anomaly in [false, true] {
                    for ble in [false, true] {
                        let _ = classify(TrackSignals { mmwave, vision, wifi_anomaly, ble });
                    }
                }
            }
        }
    }
}
