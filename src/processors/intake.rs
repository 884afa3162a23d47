// ABOUTME: Debounced batch intake that coalesces bursts of newly synced activities
// ABOUTME: Releases on quiet period, size cap, hard deadline, explicit flush, or stops on cancel
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Intake scheduler
//!
//! Activities are queued in timestamp order. [`IntakeScheduler::next_batch`]
//! keeps re-arming a short timer while the queue keeps growing and releases the
//! whole queue once the size holds steady for `min_wait`, reaches `max_size`, or
//! `max_wait` has passed. A flush releases immediately (or reports the end of
//! input when nothing is queued); a cancel releases nothing.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::future;
use std::mem;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::{watch, Mutex};
use tokio::time::{sleep, Instant};
use tracing::debug;

use crate::config::IntakeOptions;
use crate::models::{Activity, ActivityId};

#[derive(Debug, Default)]
struct IntakeQueue {
    incoming: BTreeMap<(DateTime<Utc>, u64), Activity>,
    queued: HashMap<ActivityId, (DateTime<Utc>, u64)>,
    pending: HashSet<ActivityId>,
    seq: u64,
}

/// Debounced, timestamp-ordered activity queue
#[derive(Debug)]
pub struct IntakeScheduler {
    queue: Mutex<IntakeQueue>,
    size: watch::Sender<usize>,
    flush: watch::Sender<bool>,
    cancel: watch::Sender<bool>,
}

impl Default for IntakeScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl IntakeScheduler {
    /// Empty scheduler
    #[must_use]
    pub fn new() -> Self {
        Self {
            queue: Mutex::new(IntakeQueue::default()),
            size: watch::Sender::new(0),
            flush: watch::Sender::new(false),
            cancel: watch::Sender::new(false),
        }
    }

    /// Queue activities for the next release
    ///
    /// An activity already queued under the same id is replaced by the newer copy.
    pub async fn put_incoming(&self, activities: impl IntoIterator<Item = Activity>) {
        let mut queue = self.queue.lock().await;
        for activity in activities {
            queue.seq += 1;
            let key = (activity.ts, queue.seq);
            if let Some(previous) = queue.queued.insert(activity.id, key) {
                queue.incoming.remove(&previous);
                debug!(activity_id = %activity.id, "Replaced queued activity");
            }
            queue.pending.insert(activity.id);
            queue.incoming.insert(key, activity);
        }
        self.size.send_replace(queue.incoming.len());
    }

    /// Release whatever is queued now
    pub fn flush(&self) {
        self.flush.send_replace(true);
    }

    /// Stop releasing; a waiting or future `next_batch` returns `None`
    pub fn cancel(&self) {
        self.cancel.send_replace(true);
    }

    /// True once [`cancel`](Self::cancel) has been called
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        *self.cancel.borrow()
    }

    /// Activities queued but not yet released
    pub async fn incoming_len(&self) -> usize {
        self.queue.lock().await.incoming.len()
    }

    /// Activities enqueued whose processing has not been reported finished
    pub async fn pending_len(&self) -> usize {
        self.queue.lock().await.pending.len()
    }

    /// Report a released batch as fully processed
    pub async fn mark_finished(&self, activities: &[Activity]) {
        let mut queue = self.queue.lock().await;
        for activity in activities {
            queue.pending.remove(&activity.id);
        }
    }

    async fn take_all(&self) -> Vec<Activity> {
        let mut queue = self.queue.lock().await;
        let batch: Vec<Activity> = mem::take(&mut queue.incoming).into_values().collect();
        queue.queued.clear();
        self.size.send_replace(0);
        batch
    }

    /// Wait for the next debounced batch
    ///
    /// Returns `None` when cancelled, or when flushed with nothing queued.
    pub async fn next_batch(&self, options: &IntakeOptions) -> Option<Vec<Activity>> {
        let mut cancel_rx = self.cancel.subscribe();
        let mut flush_rx = self.flush.subscribe();
        let mut size_rx = self.size.subscribe();
        let max_size = options.max_size;
        let mut deadline = deadline_after(options.max_wait);
        let mut last_size: Option<usize> = None;
        loop {
            let nap = nap_duration(options, deadline);
            tokio::select! {
                _ = cancel_rx.wait_for(|cancelled| *cancelled) => {}
                _ = flush_rx.wait_for(|flushed| *flushed) => {}
                _ = size_rx.wait_for(|size| max_size > 0 && *size >= max_size) => {}
                () = nap_or_forever(nap) => {}
            }
            if self.is_cancelled() {
                debug!("Intake cancelled");
                return None;
            }
            let size = self.incoming_len().await;
            if *self.flush.borrow() {
                if size == 0 {
                    debug!("Intake flushed with nothing queued");
                    return None;
                }
            } else if last_size != Some(size)
                && (max_size == 0 || size < max_size)
                && deadline.is_some_and(|at| Instant::now() < at)
            {
                last_size = Some(size);
                continue;
            }
            deadline = deadline_after(options.max_wait);
            if size == 0 {
                continue;
            }
            self.flush.send_replace(false);
            let batch = self.take_all().await;
            debug!(size = batch.len(), "Intake released batch");
            return Some(batch);
        }
    }
}

fn deadline_after(max_wait: Duration) -> Option<Instant> {
    (!max_wait.is_zero()).then(|| Instant::now() + max_wait)
}

fn nap_duration(options: &IntakeOptions, deadline: Option<Instant>) -> Option<Duration> {
    match (options.min_wait.is_zero(), deadline) {
        (false, Some(at)) => Some(
            options
                .min_wait
                .min(at.saturating_duration_since(Instant::now())),
        ),
        (false, None) => Some(options.min_wait),
        (true, Some(_)) => Some(options.max_wait),
        (true, None) => None,
    }
}

async fn nap_or_forever(nap: Option<Duration>) {
    match nap {
        Some(duration) => sleep(duration).await,
        None => future::pending().await,
    }
}
