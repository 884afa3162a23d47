// ABOUTME: Incremental ATL/CTL aggregation over an athlete's activities, one batch at a time
// ABOUTME: Recovers a seed from history, drains gap days and walks forward day by day
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Training load
//!
//! A batch of activities is folded into the athlete's day-bucketed training
//! load series:
//!
//! 1. Batches whose TSS values all match the last processed values are skipped.
//! 2. Every stored activity from the oldest batch member onward joins the batch.
//! 3. Walking backward, same-day activities and earlier activities without a
//!    training record are absorbed until one on an earlier day with a record
//!    is found; that record seeds ATL/CTL (zero otherwise).
//! 4. Days between the seed and the oldest activity decay with zero stress.
//! 5. Walking forward one day at a time, each day's summed TSS updates ATL/CTL
//!    once and every activity of that day receives the result.
//!
//! Failing to consume every activity in the forward walk is an invariant
//! violation; the batch is abandoned rather than persisted.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, Utc};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};
use trainload_metrics::load::{calc_atl, calc_ctl};

use super::intake::IntakeScheduler;
use crate::config::{IntakeOptions, ProcessingConfig};
use crate::constants::sync;
use crate::errors::{AppError, AppResult};
use crate::logging::PipelineLogger;
use crate::models::{Activity, ActivityId, AthleteId, TrainingLoad};
use crate::storage::{ActivityStore, KeyQuery};

/// What a call to [`TrainingLoadAggregator::process`] did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchOutcome {
    /// Every TSS matched the previous run; nothing was read or written
    Skipped,
    /// Training loads were recomputed
    Updated {
        /// Activities that received a training record, batch members included
        processed: usize,
        /// Activities outside the batch that changed and were saved
        external_saved: usize,
    },
}

impl BatchOutcome {
    /// True when training loads were recomputed
    #[must_use]
    pub const fn is_updated(&self) -> bool {
        matches!(self, Self::Updated { .. })
    }
}

#[derive(Debug)]
struct Entry {
    activity: Activity,
    day: NaiveDate,
    external: bool,
    changed: bool,
}

/// Per-athlete ATL/CTL accumulator
///
/// Holds the TSS each activity had when it was last folded in, so an unchanged
/// batch is a no-op. One instance must serve exactly one sequential loop.
#[derive(Debug)]
pub struct TrainingLoadAggregator {
    athlete: AthleteId,
    utc_offset: FixedOffset,
    forward_days: i64,
    completed_with: HashMap<ActivityId, Option<f64>>,
}

impl TrainingLoadAggregator {
    /// Aggregator for one athlete
    #[must_use]
    pub fn new(athlete: AthleteId, config: &ProcessingConfig) -> Self {
        Self {
            athlete,
            utc_offset: config.utc_offset,
            forward_days: config.forward_days,
            completed_with: HashMap::new(),
        }
    }

    /// Athlete served by this aggregator
    #[must_use]
    pub const fn athlete(&self) -> AthleteId {
        self.athlete
    }

    /// TSS recorded when the activity was last processed
    #[must_use]
    pub fn completed_with(&self, id: ActivityId) -> Option<Option<f64>> {
        self.completed_with.get(&id).copied()
    }

    fn entry(&self, activity: Activity, external: bool) -> Entry {
        Entry {
            day: activity.local_day(self.utc_offset),
            activity,
            external,
            changed: false,
        }
    }

    fn count_unseen(&self, batch: &[Activity]) -> (usize, usize) {
        batch.iter().fold((0, 0), |(seen, unseen), activity| {
            match self.completed_with.get(&activity.id) {
                Some(prior) if *prior == activity.tss() => (seen + 1, unseen),
                _ => (seen, unseen + 1),
            }
        })
    }

    /// Fold a batch into the athlete's training load series
    ///
    /// `batch` is reduced to one copy per activity id (the last one wins), sorted,
    /// and its members receive their training records in place; saving them is left to the caller. Stored activities outside the
    /// batch whose record changed are saved here.
    ///
    /// # Errors
    ///
    /// Returns `InvariantViolation` when the backward or forward walk produces an
    /// inconsistent sequence, and the store's error when a read or write fails.
    /// Nothing is saved in either case and the batch is discarded.
    pub async fn process(
        &mut self,
        store: &dyn ActivityStore,
        batch: &mut Vec<Activity>,
        now: DateTime<Utc>,
    ) -> AppResult<BatchOutcome> {
        dedup_latest(batch);
        batch.sort_by(|a, b| (a.ts, a.id).cmp(&(b.ts, b.id)));
        let Some(first) = batch.first() else {
            return Ok(BatchOutcome::Skipped);
        };
        let oldest_ts = first.ts;

        let (seen, unseen) = self.count_unseen(batch);
        if unseen == 0 {
            debug!(athlete_id = %self.athlete, seen, "No training load updates required");
            return Ok(BatchOutcome::Skipped);
        }
        info!(
            athlete_id = %self.athlete,
            seen,
            unseen,
            batch = batch.len(),
            "Updating training loads"
        );

        let mut ordered = self.load_ordered(store, batch, oldest_ts).await?;
        let seed = self.rewind_to_seed(store, &mut ordered).await?;
        let (mut atl, mut ctl) = seed.map_or((0.0, 0.0), |(_, load)| (load.atl, load.ctl));

        let Some(oldest_day) = ordered.front().map(|entry| entry.day) else {
            return Err(AppError::invariant("training load batch emptied during rewind"));
        };
        if let Some((seed_day, _)) = seed {
            let gap_days = (oldest_day - seed_day).num_days() - 1;
            if gap_days > 0 {
                let zeros = vec![0.0; gap_days as usize];
                atl = calc_atl(&zeros, atl);
                ctl = calc_ctl(&zeros, ctl);
            }
        }

        let entries = ordered.make_contiguous();
        let horizon = (now + Duration::days(self.forward_days))
            .with_timezone(&self.utc_offset)
            .date_naive();
        let consumed = Self::walk_forward(entries, oldest_day, horizon, atl, ctl);
        if consumed < entries.len() {
            error!(
                athlete_id = %self.athlete,
                consumed,
                total = entries.len(),
                "Forward walk did not consume every activity"
            );
            return Err(AppError::invariant(format!(
                "forward walk consumed {consumed} of {} activities",
                entries.len()
            ))
            .with_resource_id(self.athlete.to_string()));
        }
        for entry in &*entries {
            self.completed_with
                .insert(entry.activity.id, entry.activity.tss());
        }

        let processed = entries.len();
        let mut external = Vec::new();
        let mut members = Vec::new();
        for entry in ordered {
            if entry.external {
                if entry.changed {
                    external.push(entry.activity);
                }
            } else {
                members.push(entry.activity);
            }
        }
        store.save_many(&external).await?;
        *batch = members;
        Ok(BatchOutcome::Updated {
            processed,
            external_saved: external.len(),
        })
    }

    /// Batch members merged with every stored activity from `oldest_ts` onward, in `(ts, id)` order
    async fn load_ordered(
        &self,
        store: &dyn ActivityStore,
        batch: &mut Vec<Activity>,
        oldest_ts: DateTime<Utc>,
    ) -> AppResult<VecDeque<Entry>> {
        let members: HashSet<ActivityId> = batch.iter().map(|a| a.id).collect();
        let ordered_ids = store
            .keys_for_athlete(self.athlete, KeyQuery::ascending_from(oldest_ts))
            .await?;
        let need: Vec<ActivityId> = ordered_ids
            .into_iter()
            .filter(|id| !members.contains(id))
            .collect();
        let externals = store.get_many(&need).await?;

        let mut entries: Vec<Entry> = batch
            .drain(..)
            .map(|activity| self.entry(activity, false))
            .chain(externals.into_iter().map(|activity| self.entry(activity, true)))
            .collect();
        entries.sort_by(|a, b| (a.activity.ts, a.activity.id).cmp(&(b.activity.ts, b.activity.id)));
        Ok(entries.into())
    }

    /// Walk backward from the oldest entry, absorbing activities until a seed is found
    async fn rewind_to_seed(
        &self,
        store: &dyn ActivityStore,
        ordered: &mut VecDeque<Entry>,
    ) -> AppResult<Option<(NaiveDate, TrainingLoad)>> {
        let Some(front) = ordered.front() else {
            return Ok(None);
        };
        let mut cursor = (front.activity.ts, front.activity.id);
        loop {
            let Some(prev) = store.prev_sibling(self.athlete, cursor.0, cursor.1).await? else {
                return Ok(None);
            };
            cursor = (prev.ts, prev.id);
            let Some(oldest) = ordered.front() else {
                return Ok(None);
            };
            let prev_day = prev.local_day(self.utc_offset);
            if prev_day != oldest.day {
                if let Some(load) = prev.training {
                    return Ok(Some((prev_day, load)));
                }
                // Missing record on an earlier day; keep searching
                ordered.push_front(self.entry(prev, true));
            } else if prev.id != oldest.activity.id {
                // Same day as the oldest; days always compute jointly
                ordered.push_front(self.entry(prev, true));
            } else {
                error!(
                    athlete_id = %self.athlete,
                    activity_id = %prev.id,
                    "Sibling search returned the current oldest activity"
                );
                return Err(AppError::invariant(
                    "sibling search produced the current oldest activity",
                )
                .with_resource_id(prev.id.to_string()));
            }
        }
    }

    /// Apply one decay step per day from `start` until every entry is consumed or `horizon` is reached
    ///
    /// Returns the number of entries consumed.
    fn walk_forward(
        entries: &mut [Entry],
        start: NaiveDate,
        horizon: NaiveDate,
        mut atl: f64,
        mut ctl: f64,
    ) -> usize {
        let mut i = 0;
        let mut day = start;
        while i < entries.len() && day < horizon {
            let first = i;
            let mut tss = 0.0;
            while i < entries.len() && entries[i].day == day {
                tss += entries[i].activity.tss().unwrap_or(0.0);
                i += 1;
            }
            atl = calc_atl(&[tss], atl);
            ctl = calc_ctl(&[tss], ctl);
            let load = TrainingLoad { atl, ctl };
            for entry in &mut entries[first..i] {
                if entry.activity.training != Some(load) {
                    entry.activity.training = Some(load);
                    entry.changed = true;
                }
            }
            let Some(next) = day.succ_opt() else {
                break;
            };
            day = next;
        }
        i
    }
}

/// Keep only the last copy of each activity id, preserving arrival order otherwise
fn dedup_latest(batch: &mut Vec<Activity>) {
    let mut last: HashMap<ActivityId, usize> = HashMap::with_capacity(batch.len());
    for (index, activity) in batch.iter().enumerate() {
        last.insert(activity.id, index);
    }
    if last.len() == batch.len() {
        return;
    }
    let mut index = 0;
    batch.retain(|activity| {
        let keep = last.get(&activity.id) == Some(&index);
        index += 1;
        keep
    });
}

/// Long-running training-load loop for one athlete
///
/// Pulls debounced batches from the intake scheduler, folds them in, saves the
/// batch and publishes it on the finished channel.
pub struct TrainingLoadProcessor {
    aggregator: TrainingLoadAggregator,
    store: Arc<dyn ActivityStore>,
    intake: Arc<IntakeScheduler>,
    options: IntakeOptions,
    finished: mpsc::Sender<Vec<Activity>>,
}

impl TrainingLoadProcessor {
    /// Processor plus the receiving end of its finished-batch channel
    #[must_use]
    pub fn new(
        athlete: AthleteId,
        store: Arc<dyn ActivityStore>,
        intake: Arc<IntakeScheduler>,
        config: &ProcessingConfig,
    ) -> (Self, mpsc::Receiver<Vec<Activity>>) {
        let (finished, receiver) = mpsc::channel(16);
        let processor = Self {
            aggregator: TrainingLoadAggregator::new(athlete, config),
            store,
            intake,
            options: config.intake,
            finished,
        };
        (processor, receiver)
    }

    /// Process batches until the intake is cancelled or flushed empty
    ///
    /// # Errors
    ///
    /// Returns the first processing error; the failing batch is not saved or published.
    pub async fn run(mut self) -> AppResult<()> {
        let athlete = self.aggregator.athlete();
        while let Some(mut batch) = self.intake.next_batch(&self.options).await {
            let started = Instant::now();
            let outcome = self
                .aggregator
                .process(self.store.as_ref(), &mut batch, Utc::now())
                .await?;
            if outcome.is_updated() {
                self.store.save_many(&batch).await?;
            }
            PipelineLogger::log_batch(
                sync::TRAINING_LOAD,
                athlete,
                batch.len(),
                started.elapsed().as_millis() as u64,
            );
            self.intake.mark_finished(&batch).await;
            if self.finished.send(batch).await.is_err() {
                warn!(athlete_id = %athlete, "Finished-batch receiver dropped; stopping");
                break;
            }
        }
        debug!(athlete_id = %athlete, "Training load processor stopped");
        Ok(())
    }
}

/// Fold `activities` into the athlete's series and save them with any changed history
///
/// Returns the activities with their training records, in `(ts, id)` order.
///
/// # Errors
///
/// Returns `InvariantViolation` on an inconsistent walk and the store's error on I/O failure.
pub async fn update_training_loads(
    store: &dyn ActivityStore,
    athlete: AthleteId,
    activities: Vec<Activity>,
    config: &ProcessingConfig,
) -> AppResult<Vec<Activity>> {
    let mut aggregator = TrainingLoadAggregator::new(athlete, config);
    let mut batch = activities;
    let outcome = aggregator.process(store, &mut batch, Utc::now()).await?;
    if outcome.is_updated() {
        store.save_many(&batch).await?;
    }
    Ok(batch)
}
