// ABOUTME: Integration tests for the stats, extra-stream and peak processors
// ABOUTME: Streams live in the in-memory stream store; failures must land as sync errors
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod helpers;

use helpers::{activity, assert_close, athlete, config, march, seconds, stream};
use trainload::constants::sync;
use trainload::metrics::data::recommended_time_gaps;
use trainload::metrics::peaks::{PeakKind, PeakPeriods};
use trainload::metrics::{TimeGaps, TimeGapsCache};
use trainload::models::{Activity, ActivityId, ActivityStreams, BaseType, StreamKind, StreamRecord};
use trainload::processors::{
    compute_activity_stats, process_activity_stats, process_extra_streams, process_peaks,
};
use trainload::storage::{MemoryStreamStore, StreamStore};

async fn store_with(records: Vec<StreamRecord>) -> MemoryStreamStore {
    let store = MemoryStreamStore::new();
    store.put_many(records).await.unwrap();
    store
}

fn gaps_of(streams: &ActivityStreams) -> Option<TimeGaps> {
    streams
        .get(StreamKind::Time)
        .and_then(recommended_time_gaps)
}

fn constant_ride(id: u64, watts: f64) -> (Activity, Vec<StreamRecord>) {
    let ride = activity(id, march(5, 9), BaseType::Ride);
    let times = seconds(3600);
    let records = vec![
        stream(&ride, StreamKind::Watts, vec![watts; times.len()]),
        stream(&ride, StreamKind::Time, times),
    ];
    (ride, records)
}

#[tokio::test]
async fn test_threshold_hour_scores_one_hundred() {
    let (ride, records) = constant_ride(1, 200.0);
    let store = store_with(records).await;
    let mut activities = vec![ride];

    process_activity_stats(
        &store,
        &mut activities,
        &athlete(),
        &config(),
        &mut TimeGapsCache::new(),
    )
    .await
    .unwrap();

    let stats = activities[0].stats.clone().unwrap();
    assert_close(stats.active_time, 3600.0, 1e-9);
    assert_close(stats.power.unwrap(), 200.0, 1.0);
    assert_close(stats.np.unwrap(), 200.0, 1e-6);
    assert_close(stats.intensity.unwrap(), 1.0, 1e-6);
    assert_close(stats.tss.unwrap(), 100.0, 1e-3);
    assert_eq!(activities[0].tss(), stats.tss);
    assert_eq!(
        activities[0]
            .sync_state(sync::ACTIVITY_STATS)
            .and_then(|s| s.version),
        Some(1)
    );
}

#[tokio::test]
async fn test_malformed_stream_is_recorded_and_batch_continues() {
    let (good, mut records) = constant_ride(1, 180.0);
    let broken = activity(2, march(6, 9), BaseType::Ride);
    records.push(stream(&broken, StreamKind::Time, seconds(600)));
    records.push(stream(&broken, StreamKind::Watts, vec![150.0; 10]));
    let store = store_with(records).await;
    let mut activities = vec![good, broken];

    process_activity_stats(
        &store,
        &mut activities,
        &athlete(),
        &config(),
        &mut TimeGapsCache::new(),
    )
    .await
    .unwrap();

    assert!(activities[0].stats.is_some());
    assert!(!activities[0].has_sync_error(sync::ACTIVITY_STATS));
    assert!(activities[1].stats.is_none());
    assert!(activities[1].has_sync_error(sync::ACTIVITY_STATS));
    let state = activities[1].sync_state(sync::ACTIVITY_STATS).unwrap();
    assert_eq!(state.error_count, 1);
    assert!(state.error_message.as_deref().unwrap().contains("watts"));
}

#[tokio::test]
async fn test_activity_without_time_stream_is_untouched() {
    let ride = activity(1, march(5, 9), BaseType::Ride);
    let store = store_with(vec![stream(&ride, StreamKind::Watts, vec![200.0; 60])]).await;
    let mut activities = vec![ride.clone()];

    process_activity_stats(
        &store,
        &mut activities,
        &athlete(),
        &config(),
        &mut TimeGapsCache::new(),
    )
    .await
    .unwrap();

    assert_eq!(activities[0], ride);
}

#[tokio::test]
async fn test_time_gaps_come_from_caller_cache() {
    let (ride, records) = constant_ride(1, 200.0);
    let times = seconds(3600);
    let store = store_with(records).await;
    let mut activities = vec![ride];
    let mut gaps = TimeGapsCache::new();

    process_activity_stats(&store, &mut activities, &athlete(), &config(), &mut gaps)
        .await
        .unwrap();

    assert_eq!(gaps.len(), 1);
    assert_eq!(gaps.get(ActivityId(1), &times), recommended_time_gaps(&times));
    let stats = activities[0].stats.clone().unwrap();
    assert_close(stats.active_time, 3600.0, 1e-9);
    assert_close(stats.kj.unwrap(), 720.0, 1e-6);
}

#[test]
fn test_same_gaps_drive_active_time_and_power() {
    let ride = activity(1, march(5, 9), BaseType::Ride);
    // 1s samples with one 10s dropout
    let mut times = seconds(600);
    for t in &mut times[301..] {
        *t += 9.0;
    }
    let mut streams = ActivityStreams::new();
    streams.insert(StreamKind::Watts, vec![200.0; times.len()]);
    streams.insert(StreamKind::Time, times);

    let tight = TimeGaps {
        ideal: 1.0,
        max: 4.0,
    };
    let loose = TimeGaps {
        ideal: 1.0,
        max: 20.0,
    };
    let stopped = compute_activity_stats(&ride, &streams, &athlete(), Some(tight), 3.0)
        .unwrap()
        .unwrap();
    let rolling = compute_activity_stats(&ride, &streams, &athlete(), Some(loose), 3.0)
        .unwrap()
        .unwrap();

    assert_close(stopped.active_time, 600.0, 1e-9);
    assert_close(rolling.active_time, 610.0, 1e-9);
    assert!(stopped.kj.unwrap() < rolling.kj.unwrap());
}

#[test]
fn test_heart_rate_at_threshold_for_an_hour() {
    let ride = activity(1, march(5, 9), BaseType::Ride);
    let times = seconds(3600);
    let mut streams = ActivityStreams::new();
    streams.insert(StreamKind::Heartrate, vec![160.0; times.len()]);
    streams.insert(StreamKind::Time, times);

    let stats = compute_activity_stats(&ride, &streams, &athlete(), gaps_of(&streams), 3.0)
        .unwrap()
        .unwrap();

    assert_close(stats.hr_tss.unwrap(), 100.0, 1e-9);
    assert!(stats.tss.is_none());
    assert_eq!(ride.tss(), None);
}

#[test]
fn test_altitude_gain_ignores_small_noise() {
    let ride = activity(1, march(5, 9), BaseType::Ride);
    let mut streams = ActivityStreams::new();
    streams.insert(StreamKind::Time, seconds(6));
    streams.insert(
        StreamKind::Altitude,
        vec![100.0, 102.0, 104.0, 103.0, 110.0, 90.0, 95.0],
    );

    let stats = compute_activity_stats(&ride, &streams, &athlete(), gaps_of(&streams), 3.0)
        .unwrap()
        .unwrap();

    assert_eq!(stats.altitude_gain, Some(15.0));
    assert!(stats.power.is_none());
}

#[tokio::test]
async fn test_run_power_comes_from_synthesized_stream() {
    let run = activity(1, march(5, 9), BaseType::Run);
    let ride = activity(2, march(5, 12), BaseType::Ride);
    let times = seconds(1200);
    let gad: Vec<f64> = times.iter().map(|t| t * 3.0).collect();
    let store = store_with(vec![
        stream(&run, StreamKind::Time, times.clone()),
        stream(&run, StreamKind::GradeAdjustedDistance, gad.clone()),
        stream(&ride, StreamKind::Time, times),
        stream(&ride, StreamKind::GradeAdjustedDistance, gad),
    ])
    .await;
    let mut activities = vec![run, ride];

    let created = process_extra_streams(&store, &mut activities, &athlete())
        .await
        .unwrap();

    assert_eq!(created.len(), 1);
    assert_eq!(created[0].stream, StreamKind::WattsCalc);
    assert_eq!(store.write_count(), 2);

    process_activity_stats(
        &store,
        &mut activities,
        &athlete(),
        &config(),
        &mut TimeGapsCache::new(),
    )
    .await
    .unwrap();
    let run_power = activities[0].stats.as_ref().and_then(|s| s.power);
    assert!(run_power.is_some_and(|watts| watts > 0.0));
    assert!(activities[0].tss().is_some());
    assert!(activities[1].stats.as_ref().unwrap().power.is_none());
}

#[tokio::test]
async fn test_active_stream_follows_moving_and_trainer_power() {
    let mut trainer = activity(1, march(5, 9), BaseType::Ride);
    trainer.trainer = true;
    let outdoor = activity(2, march(5, 12), BaseType::Ride);
    let times = seconds(600);
    let watts: Vec<f64> = (0..times.len())
        .map(|i| if i <= 300 { 150.0 } else { 0.0 })
        .collect();
    let moving: Vec<f64> = (0..times.len())
        .map(|i| if i >= 450 { 1.0 } else { 0.0 })
        .collect();
    let mut records = Vec::new();
    for ride in [&trainer, &outdoor] {
        records.push(stream(ride, StreamKind::Time, times.clone()));
        records.push(stream(ride, StreamKind::Watts, watts.clone()));
        records.push(stream(ride, StreamKind::Moving, moving.clone()));
    }
    let store = store_with(records).await;
    let mut activities = vec![trainer, outdoor];

    let created = process_extra_streams(&store, &mut activities, &athlete())
        .await
        .unwrap();

    assert_eq!(created.len(), 2);
    assert!(created.iter().all(|r| r.stream == StreamKind::Active));
    process_activity_stats(
        &store,
        &mut activities,
        &athlete(),
        &config(),
        &mut TimeGapsCache::new(),
    )
    .await
    .unwrap();
    assert_close(activities[0].stats.as_ref().unwrap().active_time, 451.0, 1e-9);
    assert_close(activities[1].stats.as_ref().unwrap().active_time, 151.0, 1e-9);
    assert_eq!(
        activities[0]
            .sync_state(sync::EXTRA_STREAMS)
            .and_then(|s| s.version),
        Some(1)
    );
}

#[tokio::test]
async fn test_moving_stream_length_mismatch_is_recorded() {
    let ride = activity(1, march(5, 9), BaseType::Ride);
    let store = store_with(vec![
        stream(&ride, StreamKind::Time, seconds(60)),
        stream(&ride, StreamKind::Moving, vec![1.0; 10]),
    ])
    .await;
    let mut activities = vec![ride];

    let created = process_extra_streams(&store, &mut activities, &athlete())
        .await
        .unwrap();

    assert!(created.is_empty());
    assert!(activities[0].has_sync_error(sync::EXTRA_STREAMS));
}

#[tokio::test]
async fn test_peaks_found_per_activity_with_failures_annotated() {
    let (ride, mut records) = constant_ride(1, 250.0);
    let broken = activity(2, march(6, 9), BaseType::Ride);
    records.push(stream(&broken, StreamKind::Time, seconds(600)));
    records.push(stream(&broken, StreamKind::Watts, vec![150.0; 3]));
    let store = store_with(records).await;
    let mut activities = vec![ride, broken];
    let periods = PeakPeriods {
        periods: vec![60.0, 1200.0],
        np_periods: vec![1200.0],
        distances: Vec::new(),
    };

    let found = process_peaks(&store, &mut activities, &periods)
        .await
        .unwrap();

    assert_eq!(found.len(), 1);
    let power: Vec<f64> = found[0]
        .peaks
        .iter()
        .filter(|p| p.kind == PeakKind::Power)
        .map(|p| p.value)
        .collect();
    assert_eq!(power.len(), 2);
    for value in power {
        assert_close(value, 250.0, 1e-9);
    }
    assert!(activities[1].has_sync_error(sync::PEAKS));
    assert!(!activities[0].has_sync_error(sync::PEAKS));
}
