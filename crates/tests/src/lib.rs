//! # Integration tests
//!
//! End-to-end scenarios and cross-cutting properties, exercised against the
//! real crate boundaries (sync buffer, fusion core, retention scheduler,
//! dispatcher) rather than any single crate's unit tests.

#[cfg(test)]
mod contract_tests {
    #[test]
    fn test_contracts_compile() {
        let _ = contracts::AlertTier::None;
    }
}

#[cfg(test)]
mod fusion_scenarios {
    use contracts::{
        Detection, FusionInput, MmWaveEventType, MmWaveMeasurement, SensorCalibration, SpaceConfig,
        TrackState, WiFiMeasurement,
    };
    use fusion_core::FusionCore;

    fn space() -> SpaceConfig {
        SpaceConfig { width_meters: 10.0, height_meters: 10.0, coordinate_origin: (0.0, 0.0) }
    }

    fn detection(camera_id: &str, t: f64, cx: f64, cy: f64) -> Detection {
        Detection {
            timestamp: t,
            camera_id: camera_id.into(),
            bbox: contracts::BBox { x_min: cx - 0.01, y_min: cy - 0.01, x_max: cx + 0.01, y_max: cy + 0.01 },
            confidence: 0.9,
            keypoints: None,
        }
    }

    fn nearest_track<'a>(tracks: &'a [TrackState], target: (f64, f64)) -> &'a TrackState {
        tracks
            .iter()
            .min_by(|a, b| {
                let da = (a.position.0 - target.0).hypot(a.position.1 - target.1);
                let db = (b.position.0 - target.0).hypot(b.position.1 - target.1);
                da.partial_cmp(&db).unwrap()
            })
            .expect("at least one track")
    }

    /// scenario 2: a single AP + a moving camera detection should
    /// track continuously under one id with no anomaly/mmwave/ble present.
    #[test]
    fn test_track_continuity_single_target() {
        let mut core = FusionCore::new(space(), SensorCalibration::default());
        let mut first_id = None;
        for i in 0..5 {
            let t = i as f64 * 0.1;
            let cx = 0.5 + 0.01 * i as f64;
            let cy = 0.5 + 0.005 * i as f64;
            let input = FusionInput { vision: vec![detection("cam-1", t, cx, cy)], ..Default::default() };
            let tick = core.fuse(&input, true, Some(t)).unwrap();
            assert_eq!(tick.tracks.len(), 1, "tick {i} should carry exactly one track");
            assert_eq!(tick.alert_tier(), contracts::AlertTier::None);
            match &first_id {
                None => first_id = Some(tick.tracks[0].track_id.clone()),
                Some(id) => assert_eq!(&tick.tracks[0].track_id, id, "track id must be stable across ticks"),
            }
        }
    }

    /// scenario 3: two well-separated targets, one occluded for a
    /// single tick, must keep distinct ids and the id nearest to each
    /// target at the end must match the id nearest to it at the start.
    #[test]
    fn test_two_target_disambiguation_with_occlusion() {
        let mut core = FusionCore::new(space(), SensorCalibration::default());
        let ticks = [0.0, 0.2, 0.4, 0.6];

        let mut id_near_b_at_start = None;
        let mut final_tracks: Vec<TrackState> = Vec::new();

        for (i, &t) in ticks.iter().enumerate() {
            let frac = i as f64 / 3.0;
            let (ax, ay) = (0.25 + 0.10 * frac, 0.25 + 0.10 * frac);
            let (bx, by) = (0.75 - 0.10 * frac, 0.25 + 0.10 * frac);

            let mut vision = vec![detection("cam-1", t, ax, ay)];
            if i != 2 {
                // occlude target B at t=0.4
                vision.push(detection("cam-1", t, bx, by));
            }

            let tick = core.fuse(&FusionInput { vision, ..Default::default() }, true, Some(t)).unwrap();
            assert_eq!(tick.tracks.len(), 2, "both tracks must survive tick {i}, including the occluded one");

            if i == 0 {
                let b_world = (bx * space().width_meters, by * space().height_meters);
                id_near_b_at_start = Some(nearest_track(&tick.tracks, b_world).track_id.clone());
            }
            if i == ticks.len() - 1 {
                final_tracks = tick.tracks.clone();
            }
        }

        let b_world_final = (0.65 * space().width_meters, 0.35 * space().height_meters);
        let id_near_b_at_end = nearest_track(&final_tracks, b_world_final).track_id.clone();

        assert_eq!(
            Some(id_near_b_at_end),
            id_near_b_at_start,
            "the track nearest target B at the end must be the same id assigned to B at the start"
        );
    }

    /// scenario 4: alert tier is a pure function of which
    /// modalities corroborate the tick.
    #[test]
    fn test_alert_escalation_across_modality_mixes() {
        let mut core = FusionCore::new(space(), SensorCalibration::default());

        let mmwave_presence = MmWaveMeasurement {
            timestamp: 0.0,
            sensor_id: "radar-1".into(),
            confidence: 0.9,
            event_type: MmWaveEventType::Presence,
            range_meters: Some(2.0),
            angle_radians: Some(0.1),
            metadata: None,
        };

        // mmWave + vision -> red
        let red = core
            .fuse(
                &FusionInput {
                    mmwave: vec![mmwave_presence.clone()],
                    vision: vec![detection("cam-1", 0.0, 0.5, 0.5)],
                    ..Default::default()
                },
                true,
                Some(0.0),
            )
            .unwrap();
        assert_eq!(red.alert_tier(), contracts::AlertTier::Red);

        // mmWave alone -> yellow
        let yellow = core
            .fuse(
                &FusionInput { mmwave: vec![mmwave_presence.clone()], ..Default::default() },
                true,
                Some(1.0),
            )
            .unwrap();
        assert_eq!(yellow.alert_tier(), contracts::AlertTier::Yellow);

        // wifi anomaly, no mmwave -> orange
        let mut anomaly_metadata = contracts::Metadata::new();
        anomaly_metadata.insert("anomaly_score".into(), serde_json::json!(0.8));
        let orange = core
            .fuse(
                &FusionInput {
                    wifi: vec![WiFiMeasurement {
                        timestamp: 2.0,
                        access_point_id: "ap-1".into(),
                        rssi: -50.0,
                        csi: None,
                        channel: None,
                        band: None,
                        metadata: Some(anomaly_metadata),
                    }],
                    ..Default::default()
                },
                true,
                Some(2.0),
            )
            .unwrap();
        assert_eq!(orange.alert_tier(), contracts::AlertTier::Orange);

        // ble only -> blue
        let blue = core
            .fuse(
                &FusionInput {
                    ble: vec![contracts::BleMeasurement {
                        timestamp: 3.0,
                        rssi: -60.0,
                        device_id: Some("device-1".into()),
                        hashed_identifier: None,
                        channel: None,
                        manufacturer_data: None,
                    }],
                    ..Default::default()
                },
                true,
                Some(3.0),
            )
            .unwrap();
        assert_eq!(blue.alert_tier(), contracts::AlertTier::Blue);
    }
}

#[cfg(test)]
mod sync_buffer_scenarios {
    use contracts::{Detection, SyncStrategy, WiFiMeasurement};
    use sync_engine::SynchronizationBuffer;

    fn detection(t: f64) -> Detection {
        Detection {
            timestamp: t,
            camera_id: "cam-1".into(),
            bbox: contracts::BBox { x_min: 0.4, y_min: 0.4, x_max: 0.6, y_max: 0.6 },
            confidence: 0.9,
            keypoints: None,
        }
    }

    fn wifi(t: f64) -> WiFiMeasurement {
        WiFiMeasurement {
            timestamp: t,
            access_point_id: "ap-1".into(),
            rssi: -40.0,
            csi: None,
            channel: None,
            band: None,
            metadata: None,
        }
    }

    /// scenario 5: stale records outside `max_latency_seconds` of
    /// the reference time are dropped; the nearest in-window record per
    /// modality is kept.
    #[test]
    fn test_sync_drop_stale_literal_scenario() {
        let mut buffer = SynchronizationBuffer::new(0.2, 0.1, SyncStrategy::Nearest);
        buffer.add_wifi(vec![wifi(0.0), wifi(0.09), wifi(0.11)]);
        buffer.add_vision(vec![detection(0.02), detection(0.18)]);

        let batch = buffer.emit(Some(0.2)).expect("non-empty aligned batch");

        assert_eq!(batch.fusion_input.wifi.len(), 1);
        assert!((batch.fusion_input.wifi[0].timestamp - 0.11).abs() < 1e-9);
        assert_eq!(batch.fusion_input.vision.len(), 1);
        assert!((batch.fusion_input.vision[0].timestamp - 0.18).abs() < 1e-9);

        assert_eq!(batch.status.dropped_wifi, 2);
        assert_eq!(batch.status.dropped_vision, 1);
    }
}

#[cfg(test)]
mod hungarian_properties {
    use fusion_core::{assignment_cost, solve_assignment};

    fn brute_force_min_cost(cost: &[Vec<f64>]) -> f64 {
        let n = cost.len();
        let mut perm: Vec<usize> = (0..n).collect();
        let mut best = f64::INFINITY;
        permute(&mut perm, 0, cost, &mut best);
        best
    }

    fn permute(perm: &mut Vec<usize>, k: usize, cost: &[Vec<f64>], best: &mut f64) {
        if k == perm.len() {
            let total: f64 = perm.iter().enumerate().map(|(r, &c)| cost[r][c]).sum();
            if total < *best {
                *best = total;
            }
            return;
        }
        for i in k..perm.len() {
            perm.swap(k, i);
            permute(perm, k + 1, cost, best);
            perm.swap(k, i);
        }
    }

    /// for any N×N non-negative cost matrix, the Hungarian
    /// solver's assignment cost is optimal (matches brute-force search over
    /// all permutations for small N).
    #[test]
    fn test_hungarian_matches_brute_force_optimum() {
        let matrices: Vec<Vec<Vec<f64>>> = vec![
            vec![vec![4.0, 1.0, 3.0], vec![2.0, 0.0, 5.0], vec![3.0, 2.0, 2.0]],
            vec![vec![1.0, 2.0], vec![3.0, 4.0]],
            vec![vec![0.0, 0.0, 0.0], vec![0.0, 0.0, 0.0], vec![0.0, 0.0, 0.0]],
            vec![
                vec![9.0, 2.0, 7.0, 8.0],
                vec![6.0, 4.0, 3.0, 7.0],
                vec![5.0, 8.0, 1.0, 8.0],
                vec![7.0, 6.0, 9.0, 4.0],
            ],
        ];

        for cost in matrices {
            let assignment = solve_assignment(&cost);
            let solver_cost = assignment_cost(&cost, &assignment);
            let optimum = brute_force_min_cost(&cost);
            assert!(
                (solver_cost - optimum).abs() < 1e-6,
                "solver cost {solver_cost} should match brute-force optimum {optimum}"
            );
        }
    }
}

#[cfg(test)]
mod clock_drift_properties {
    use ingestion::ClockDriftFilter;

    /// under a systematic one-sided raw-clock offset, the smoothed
    /// offset should converge monotonically toward the true drift.
    #[test]
    fn test_clock_offset_converges_monotonically_under_systematic_drift() {
        let true_drift = 12.0;
        let mut filter = ClockDriftFilter::new(0.0, 0.5, 300.0, 0.2);

        let mut last_gap = f64::INFINITY;
        let mut fetch_time = 0.0;
        for _ in 0..25 {
            fetch_time += 1.0;
            let raw_ts = fetch_time - true_drift;
            filter.correct(raw_ts, fetch_time);
            let gap = (filter.offset() - true_drift).abs();
            assert!(gap <= last_gap + 1e-9, "offset gap should shrink or hold, not grow");
            last_gap = gap;
        }
        assert!(last_gap < 0.5, "offset should have converged close to the true drift, got gap {last_gap}");
    }
}

#[cfg(test)]
mod retention_integration {
    use std::sync::Arc;

    use contracts::{SensorCalibration, SpaceConfig, SyncStrategy, WiFiMeasurement};
    use fusion_core::FusionCore;
    use retention::{RetentionScheduler, RetentionSettings};
    use sync_engine::SynchronizationBuffer;
    use tokio::sync::Mutex;

    fn space() -> SpaceConfig {
        SpaceConfig { width_meters: 10.0, height_meters: 10.0, coordinate_origin: (0.0, 0.0) }
    }

    /// Retention scheduler sweeps against the same buffer the sync/fusion
    /// path writes to, not a private copy.
    #[tokio::test]
    async fn test_retention_scheduler_prunes_shared_buffer() {
        let buffer = Arc::new(Mutex::new(SynchronizationBuffer::new(10.0, 10.0, SyncStrategy::Nearest)));
        let fusion = Arc::new(Mutex::new(FusionCore::new(space(), SensorCalibration::default())));

        {
            let mut b = buffer.lock().await;
            b.add_wifi(vec![WiFiMeasurement {
                timestamp: 0.0,
                access_point_id: "ap-1".into(),
                rssi: -40.0,
                csi: None,
                channel: None,
                band: None,
                metadata: None,
            }]);
        }

        let scheduler = RetentionScheduler::new(
            Arc::clone(&buffer),
            Arc::clone(&fusion),
            RetentionSettings {
                measurement_ttl_seconds: Some(1.0),
                log_ttl_seconds: None,
                cleanup_interval_seconds: 60.0,
            },
        );

        let swept = scheduler.run_once(Some(100.0), 100.0).await;
        assert_eq!(swept.wifi, 1);

        let emitted = buffer.lock().await.emit(Some(100.0));
        assert!(emitted.is_none(), "pruned record should no longer be emittable");
    }
}

#[cfg(test)]
mod dispatcher_integration {
    use std::collections::HashMap;

    use contracts::{BandSummary, EmittedTick, SinkConfig, SinkType};
    use dispatcher::create_dispatcher;
    use tokio::sync::mpsc;

    /// The dispatcher fans out emitted ticks to every configured sink.
    #[tokio::test]
    async fn test_dispatcher_fans_out_emitted_ticks() {
        let (tx, rx) = mpsc::channel::<EmittedTick>(10);

        let sink_configs = vec![
            SinkConfig { name: "log1".to_string(), sink_type: SinkType::Log, queue_capacity: 50, params: HashMap::new() },
            SinkConfig { name: "log2".to_string(), sink_type: SinkType::Log, queue_capacity: 50, params: HashMap::new() },
        ];

        let dispatcher = create_dispatcher(sink_configs, rx).await.unwrap();
        assert_eq!(dispatcher.metrics().len(), 2);

        let handle = dispatcher.spawn();

        for _ in 0..5 {
            let tick = EmittedTick {
                tracks: Vec::new(),
                emitters: Vec::new(),
                sensor_health: Vec::new(),
                band_summary: BandSummary::default(),
            };
            tx.send(tick).await.unwrap();
        }

        drop(tx);
        let _ = tokio::time::timeout(std::time::Duration::from_secs(2), handle).await;
    }
}
