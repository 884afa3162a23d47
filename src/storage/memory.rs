// ABOUTME: In-memory activity and stream stores with (timestamp, id) ordering per athlete
// ABOUTME: Shared state behind Arc<RwLock>; counts write batches so callers can verify no-op runs
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::collections::{BTreeSet, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tracing::debug;

use super::{ActivityStore, Direction, KeyQuery, StreamKey, StreamStore};
use crate::errors::AppResult;
use crate::models::{Activity, ActivityId, AthleteId, StreamRecord};

type IndexKey = (AthleteId, DateTime<Utc>, ActivityId);

#[derive(Debug, Default)]
struct ActivityTable {
    rows: HashMap<ActivityId, Activity>,
    index: BTreeSet<IndexKey>,
}

impl ActivityTable {
    fn upsert(&mut self, activity: Activity) {
        if let Some(old) = self.rows.get(&activity.id) {
            self.index.remove(&(old.athlete, old.ts, old.id));
        }
        self.index
            .insert((activity.athlete, activity.ts, activity.id));
        self.rows.insert(activity.id, activity);
    }

    fn athlete_range(&self, athlete: AthleteId) -> impl DoubleEndedIterator<Item = &IndexKey> + '_ {
        self.index.range(
            (athlete, DateTime::<Utc>::MIN_UTC, ActivityId(0))
                ..=(athlete, DateTime::<Utc>::MAX_UTC, ActivityId(u64::MAX)),
        )
    }
}

/// Activity store held entirely in memory
///
/// Clones share the same table.
#[derive(Clone, Default)]
pub struct MemoryActivityStore {
    table: Arc<RwLock<ActivityTable>>,
    writes: Arc<AtomicUsize>,
}

impl MemoryActivityStore {
    /// Empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of `save_many` calls that wrote at least one activity
    #[must_use]
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Number of stored activities
    pub async fn len(&self) -> usize {
        self.table.read().await.rows.len()
    }

    /// True when nothing is stored
    pub async fn is_empty(&self) -> bool {
        self.table.read().await.rows.is_empty()
    }

    /// Every activity of `athlete` in `(ts, id)` order
    pub async fn activities_for_athlete(&self, athlete: AthleteId) -> Vec<Activity> {
        let table = self.table.read().await;
        table
            .athlete_range(athlete)
            .filter_map(|(_, _, id)| table.rows.get(id).cloned())
            .collect()
    }
}

#[async_trait]
impl ActivityStore for MemoryActivityStore {
    async fn keys_for_athlete(
        &self,
        athlete: AthleteId,
        query: KeyQuery,
    ) -> AppResult<Vec<ActivityId>> {
        let table = self.table.read().await;
        let range = table.athlete_range(athlete);
        let keys = match query.direction {
            Direction::Ascending => range
                .filter(|(_, ts, _)| query.start.is_none_or(|start| *ts >= start))
                .map(|(_, _, id)| *id)
                .collect(),
            Direction::Descending => range
                .rev()
                .filter(|(_, ts, _)| query.start.is_none_or(|start| *ts <= start))
                .map(|(_, _, id)| *id)
                .collect(),
        };
        Ok(keys)
    }

    async fn get(&self, id: ActivityId) -> AppResult<Option<Activity>> {
        Ok(self.table.read().await.rows.get(&id).cloned())
    }

    async fn get_many(&self, ids: &[ActivityId]) -> AppResult<Vec<Activity>> {
        let table = self.table.read().await;
        Ok(ids
            .iter()
            .filter_map(|id| table.rows.get(id).cloned())
            .collect())
    }

    async fn prev_sibling(
        &self,
        athlete: AthleteId,
        ts: DateTime<Utc>,
        id: ActivityId,
    ) -> AppResult<Option<Activity>> {
        let table = self.table.read().await;
        let prev = table
            .index
            .range((athlete, DateTime::<Utc>::MIN_UTC, ActivityId(0))..(athlete, ts, id))
            .next_back()
            .and_then(|(_, _, prev_id)| table.rows.get(prev_id).cloned());
        Ok(prev)
    }

    async fn save_many(&self, activities: &[Activity]) -> AppResult<()> {
        if activities.is_empty() {
            return Ok(());
        }
        let mut table = self.table.write().await;
        for activity in activities {
            table.upsert(activity.clone());
        }
        drop(table);
        self.writes.fetch_add(1, Ordering::SeqCst);
        debug!(count = activities.len(), "Saved activities");
        Ok(())
    }
}

/// Stream store held entirely in memory
#[derive(Clone, Default)]
pub struct MemoryStreamStore {
    streams: Arc<RwLock<HashMap<StreamKey, StreamRecord>>>,
    writes: Arc<AtomicUsize>,
}

impl MemoryStreamStore {
    /// Empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of `put_many` calls that wrote at least one stream
    #[must_use]
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl StreamStore for MemoryStreamStore {
    async fn get_many(&self, keys: &[StreamKey]) -> AppResult<Vec<Option<StreamRecord>>> {
        let streams = self.streams.read().await;
        Ok(keys.iter().map(|key| streams.get(key).cloned()).collect())
    }

    async fn put_many(&self, records: Vec<StreamRecord>) -> AppResult<()> {
        if records.is_empty() {
            return Ok(());
        }
        let count = records.len();
        let mut streams = self.streams.write().await;
        for record in records {
            let key = StreamKey {
                activity: record.activity,
                stream: record.stream,
            };
            streams.insert(key, record);
        }
        drop(streams);
        self.writes.fetch_add(1, Ordering::SeqCst);
        debug!(count, "Saved streams");
        Ok(())
    }
}
