// ABOUTME: Integration tests for the debounced intake scheduler on a paused clock
// ABOUTME: Quiet-period, size-cap, deadline, flush and cancel releases plus ordering
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod helpers;

use std::sync::Arc;
use std::time::Duration;

use helpers::{activity_with_tss, march};
use tokio::task::JoinHandle;
use tokio::time::{sleep, Instant};
use trainload::config::IntakeOptions;
use trainload::models::ActivityId;
use trainload::processors::IntakeScheduler;

fn options(min_ms: u64, max_ms: u64, max_size: usize) -> IntakeOptions {
    IntakeOptions {
        min_wait: Duration::from_millis(min_ms),
        max_wait: Duration::from_millis(max_ms),
        max_size,
    }
}

/// Enqueue one activity every 500ms until cancelled
fn spawn_trickle(intake: Arc<IntakeScheduler>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut id = 0;
        while !intake.is_cancelled() {
            id += 1;
            intake
                .put_incoming([activity_with_tss(id, march(1, 0), 10.0)])
                .await;
            sleep(Duration::from_millis(500)).await;
        }
    })
}

#[tokio::test(start_paused = true)]
async fn test_steady_trickle_releases_once_within_deadline() {
    let intake = Arc::new(IntakeScheduler::new());
    let started = Instant::now();
    let producer = spawn_trickle(intake.clone());

    let batch = intake.next_batch(&options(1000, 5000, 10)).await.unwrap();

    assert!(started.elapsed() <= Duration::from_millis(5000));
    assert!(!batch.is_empty());
    assert!(batch.len() <= 10);
    intake.cancel();
    producer.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_deadline_forces_release_when_size_never_settles() {
    let intake = Arc::new(IntakeScheduler::new());
    let started = Instant::now();
    let producer = spawn_trickle(intake.clone());

    let batch = intake
        .next_batch(&options(1000, 5000, 1000))
        .await
        .unwrap();

    let waited = started.elapsed();
    assert!(waited >= Duration::from_millis(4500), "released after {waited:?}");
    assert!(waited <= Duration::from_millis(5000), "released after {waited:?}");
    assert!(batch.len() >= 9);
    intake.cancel();
    producer.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_quiet_period_releases_after_size_holds() {
    let intake = IntakeScheduler::new();
    intake
        .put_incoming((1..=3).map(|id| activity_with_tss(id, march(1, 0), 10.0)))
        .await;
    let started = Instant::now();

    let batch = intake.next_batch(&options(1000, 60_000, 50)).await.unwrap();

    assert_eq!(batch.len(), 3);
    assert_eq!(started.elapsed(), Duration::from_millis(2000));
    assert_eq!(intake.incoming_len().await, 0);
}

#[tokio::test(start_paused = true)]
async fn test_size_cap_releases_without_waiting() {
    let intake = IntakeScheduler::new();
    intake
        .put_incoming((1..=5).map(|id| activity_with_tss(id, march(1, 0), 10.0)))
        .await;
    let started = Instant::now();

    let batch = intake.next_batch(&options(1000, 60_000, 5)).await.unwrap();

    assert_eq!(batch.len(), 5);
    assert_eq!(started.elapsed(), Duration::ZERO);
}

#[tokio::test(start_paused = true)]
async fn test_flush_releases_immediately_in_timestamp_order() {
    let intake = IntakeScheduler::new();
    intake
        .put_incoming([
            activity_with_tss(3, march(3, 0), 10.0),
            activity_with_tss(1, march(1, 0), 10.0),
            activity_with_tss(2, march(2, 0), 10.0),
        ])
        .await;
    intake.flush();
    let started = Instant::now();

    let batch = intake.next_batch(&IntakeOptions::default()).await.unwrap();

    assert_eq!(started.elapsed(), Duration::ZERO);
    let ids: Vec<ActivityId> = batch.iter().map(|a| a.id).collect();
    assert_eq!(ids, vec![ActivityId(1), ActivityId(2), ActivityId(3)]);
}

#[tokio::test(start_paused = true)]
async fn test_requeued_activity_replaces_queued_copy() {
    let intake = IntakeScheduler::new();
    intake
        .put_incoming([
            activity_with_tss(1, march(1, 0), 10.0),
            activity_with_tss(2, march(2, 0), 10.0),
        ])
        .await;
    intake
        .put_incoming([activity_with_tss(1, march(3, 0), 35.0)])
        .await;
    assert_eq!(intake.incoming_len().await, 2);
    assert_eq!(intake.pending_len().await, 2);
    intake.flush();

    let batch = intake.next_batch(&IntakeOptions::default()).await.unwrap();

    let ids: Vec<ActivityId> = batch.iter().map(|a| a.id).collect();
    assert_eq!(ids, vec![ActivityId(2), ActivityId(1)]);
    assert_eq!(batch[1].tss(), Some(35.0));
}

#[tokio::test(start_paused = true)]
async fn test_flush_with_empty_queue_ends_input() {
    let intake = IntakeScheduler::new();
    intake.flush();
    assert!(intake.next_batch(&IntakeOptions::default()).await.is_none());
}

#[tokio::test(start_paused = true)]
async fn test_cancel_wakes_waiting_consumer() {
    let intake = Arc::new(IntakeScheduler::new());
    intake
        .put_incoming([activity_with_tss(1, march(1, 0), 10.0)])
        .await;
    let consumer = {
        let intake = intake.clone();
        tokio::spawn(async move { intake.next_batch(&IntakeOptions::default()).await })
    };
    sleep(Duration::from_millis(100)).await;
    intake.cancel();

    assert!(consumer.await.unwrap().is_none());
    assert!(intake.next_batch(&IntakeOptions::default()).await.is_none());
    assert_eq!(intake.incoming_len().await, 1);
}

#[tokio::test(start_paused = true)]
async fn test_pending_tracks_unfinished_activities() {
    let intake = IntakeScheduler::new();
    intake
        .put_incoming([
            activity_with_tss(1, march(1, 0), 10.0),
            activity_with_tss(2, march(2, 0), 10.0),
        ])
        .await;
    intake.flush();

    let batch = intake.next_batch(&IntakeOptions::default()).await.unwrap();
    assert_eq!(intake.incoming_len().await, 0);
    assert_eq!(intake.pending_len().await, 2);

    intake.mark_finished(&batch[..1]).await;
    assert_eq!(intake.pending_len().await, 1);
    intake.mark_finished(&batch).await;
    assert_eq!(intake.pending_len().await, 0);
}
