// ABOUTME: Activity model with derived stats, training-load record and sync annotations
// ABOUTME: ActivityId, BaseType, ActivityStats, TrainingLoad and SyncState definitions
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::AthleteId;

/// Unique activity identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActivityId(pub u64);

impl fmt::Display for ActivityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Broad sport family used to choose a power source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum BaseType {
    /// Cycling (real or virtual)
    Ride,
    /// Running or walking
    Run,
    /// Swimming
    Swim,
    /// Anything else
    #[default]
    Other,
}

/// Per-activity derived statistics, written once per processing pass
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActivityStats {
    /// Seconds of active (moving) time
    pub active_time: f64,
    /// Total mechanical energy in kilojoules
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kj: Option<f64>,
    /// Average power over active time (watts)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub power: Option<f64>,
    /// Normalized power (watts)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub np: Option<f64>,
    /// Cross power (watts)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub xp: Option<f64>,
    /// Power-based training stress score
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tss: Option<f64>,
    /// Intensity factor relative to FTP
    #[serde(skip_serializing_if = "Option::is_none")]
    pub intensity: Option<f64>,
    /// Heart-rate based training stress score
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hr_tss: Option<f64>,
    /// Total ascent in meters
    #[serde(skip_serializing_if = "Option::is_none")]
    pub altitude_gain: Option<f64>,
}

/// Acute and chronic training load as of the end of the activity's day
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TrainingLoad {
    /// Acute training load (fatigue)
    pub atl: f64,
    /// Chronic training load (fitness)
    pub ctl: f64,
}

/// Progress and error bookkeeping for one named processor
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SyncState {
    /// Last completed processor version
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<u32>,
    /// Number of failures recorded; survives `clear_sync_error` for backoff
    #[serde(default)]
    pub error_count: u32,
    /// When the most recent failure happened
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_ts: Option<DateTime<Utc>>,
    /// Message of the most recent failure
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

/// One recorded workout
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Activity {
    /// Activity identifier
    pub id: ActivityId,
    /// Owning athlete
    pub athlete: AthleteId,
    /// Start time
    pub ts: DateTime<Utc>,
    /// Sport family
    #[serde(default)]
    pub base_type: BaseType,
    /// Recorded on an indoor trainer
    #[serde(default)]
    pub trainer: bool,
    /// Derived statistics, absent until the stats processor has run
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stats: Option<ActivityStats>,
    /// Training load record, absent until the training-load processor has run
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub training: Option<TrainingLoad>,
    /// Per-processor sync state keyed by processor name
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub sync_state: HashMap<String, SyncState>,
}

impl Activity {
    /// Create a bare activity with no derived fields
    #[must_use]
    pub fn new(id: ActivityId, athlete: AthleteId, ts: DateTime<Utc>, base_type: BaseType) -> Self {
        Self {
            id,
            athlete,
            ts,
            base_type,
            trainer: false,
            stats: None,
            training: None,
            sync_state: HashMap::new(),
        }
    }

    /// Calendar day of the activity start in the athlete's local offset
    #[must_use]
    pub fn local_day(&self, offset: FixedOffset) -> NaiveDate {
        self.ts.with_timezone(&offset).date_naive()
    }

    /// Training stress: power TSS when known, otherwise heart-rate TSS
    #[must_use]
    pub fn tss(&self) -> Option<f64> {
        self.stats
            .as_ref()
            .and_then(|stats| stats.tss.or(stats.hr_tss))
    }

    /// Record a processor failure, bumping the error count used for backoff
    pub fn set_sync_error(&mut self, name: &str, error: impl fmt::Display) {
        let state = self.sync_state.entry(name.to_owned()).or_default();
        state.error_count += 1;
        state.error_ts = Some(Utc::now());
        state.error_message = Some(error.to_string());
    }

    /// Clear the most recent failure but keep the error count
    pub fn clear_sync_error(&mut self, name: &str) {
        let state = self.sync_state.entry(name.to_owned()).or_default();
        state.error_ts = None;
        state.error_message = None;
    }

    /// True when the named processor has an uncleared failure
    #[must_use]
    pub fn has_sync_error(&self, name: &str) -> bool {
        self.sync_state
            .get(name)
            .is_some_and(|state| state.error_ts.is_some())
    }

    /// Record the processor version that last completed for this activity
    pub fn set_sync_version(&mut self, name: &str, version: u32) {
        self.sync_state.entry(name.to_owned()).or_default().version = Some(version);
    }

    /// Sync state for the named processor, if any
    #[must_use]
    pub fn sync_state(&self, name: &str) -> Option<&SyncState> {
        self.sync_state.get(name)
    }
}
