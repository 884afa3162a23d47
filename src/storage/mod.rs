// ABOUTME: Storage abstraction for activities and their numeric streams
// ABOUTME: Async traits consumed by the processors plus ordered key query options
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Storage
//!
//! The processors only ever talk to these traits. Activities are ordered per
//! athlete by `(ts, id)`; every ordered query and sibling lookup uses that key.

/// In-memory stores backed by `tokio::sync::RwLock`
pub mod memory;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::errors::AppResult;
use crate::models::{Activity, ActivityId, AthleteId, StreamKind, StreamRecord};

pub use memory::{MemoryActivityStore, MemoryStreamStore};

/// Ordering of a key query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    /// Oldest first
    #[default]
    Ascending,
    /// Newest first
    Descending,
}

/// Options for [`ActivityStore::keys_for_athlete`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct KeyQuery {
    /// Inclusive bound: ascending queries start at it, descending queries end at it
    pub start: Option<DateTime<Utc>>,
    /// Result ordering
    pub direction: Direction,
}

impl KeyQuery {
    /// Ascending from `start` (inclusive)
    #[must_use]
    pub const fn ascending_from(start: DateTime<Utc>) -> Self {
        Self {
            start: Some(start),
            direction: Direction::Ascending,
        }
    }

    /// Descending from `start` (inclusive)
    #[must_use]
    pub const fn descending_from(start: DateTime<Utc>) -> Self {
        Self {
            start: Some(start),
            direction: Direction::Descending,
        }
    }
}

/// Identifies one stream of one activity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StreamKey {
    /// Owning activity
    pub activity: ActivityId,
    /// Stream name
    pub stream: StreamKind,
}

/// Activity persistence used by the processors
#[async_trait]
pub trait ActivityStore: Send + Sync {
    /// Activity ids of `athlete` ordered by `(ts, id)`
    async fn keys_for_athlete(&self, athlete: AthleteId, query: KeyQuery)
        -> AppResult<Vec<ActivityId>>;

    /// Point lookup
    async fn get(&self, id: ActivityId) -> AppResult<Option<Activity>>;

    /// Batched lookup in the order requested; unknown ids are skipped
    async fn get_many(&self, ids: &[ActivityId]) -> AppResult<Vec<Activity>>;

    /// The athlete's activity immediately before position `(ts, id)`
    ///
    /// The position does not need to belong to a stored activity.
    async fn prev_sibling(
        &self,
        athlete: AthleteId,
        ts: DateTime<Utc>,
        id: ActivityId,
    ) -> AppResult<Option<Activity>>;

    /// Insert or replace activities as one batch
    async fn save_many(&self, activities: &[Activity]) -> AppResult<()>;
}

/// Stream persistence used by the processors
#[async_trait]
pub trait StreamStore: Send + Sync {
    /// Batched lookup; the result is aligned with `keys`
    async fn get_many(&self, keys: &[StreamKey]) -> AppResult<Vec<Option<StreamRecord>>>;

    /// Insert or replace streams as one batch
    async fn put_many(&self, records: Vec<StreamRecord>) -> AppResult<()>;
}
