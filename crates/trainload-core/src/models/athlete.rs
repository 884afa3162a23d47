// ABOUTME: Athlete profile with time-varying FTP and weight history
// ABOUTME: AthleteId, HistoryValue, HrZones and Gender definitions
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Unique athlete identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AthleteId(pub u64);

impl fmt::Display for AthleteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A value that became effective at a point in time
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HistoryValue {
    /// When the value took effect
    pub ts: DateTime<Utc>,
    /// The value itself (watts for FTP, kilograms for weight)
    pub value: f64,
}

/// Upper bounds of heart-rate zones (bpm)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HrZones {
    /// Zone 1 ceiling
    pub z1: f64,
    /// Zone 2 ceiling
    pub z2: f64,
    /// Zone 3 ceiling
    pub z3: f64,
    /// Zone 4 ceiling
    pub z4: f64,
}

impl HrZones {
    /// Lactate threshold heart rate, taken as the midpoint of zones 3 and 4
    #[must_use]
    pub fn lactate_threshold(&self) -> f64 {
        (self.z3 + self.z4) / 2.0
    }
}

/// Athlete gender, used only for informational output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    /// Male
    #[default]
    Male,
    /// Female
    Female,
}

/// Athlete profile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Athlete {
    /// Athlete identifier
    pub id: AthleteId,
    /// FTP history, sorted ascending by `ts`
    #[serde(default)]
    pub ftp_history: Vec<HistoryValue>,
    /// Weight history, sorted ascending by `ts`
    #[serde(default)]
    pub weight_history: Vec<HistoryValue>,
    /// Heart-rate zone ceilings
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hr_zones: Option<HrZones>,
    /// Gender
    #[serde(default)]
    pub gender: Gender,
}

impl Athlete {
    /// Create an athlete with no history
    #[must_use]
    pub const fn new(id: AthleteId) -> Self {
        Self {
            id,
            ftp_history: Vec::new(),
            weight_history: Vec::new(),
            hr_zones: None,
            gender: Gender::Male,
        }
    }

    /// FTP in effect at `ts`
    #[must_use]
    pub fn ftp_at(&self, ts: DateTime<Utc>) -> Option<f64> {
        value_at(&self.ftp_history, ts)
    }

    /// Weight in effect at `ts`
    #[must_use]
    pub fn weight_at(&self, ts: DateTime<Utc>) -> Option<f64> {
        value_at(&self.weight_history, ts)
    }

    /// Record a new FTP value
    pub fn set_ftp_at(&mut self, value: f64, ts: DateTime<Utc>) {
        insert_sorted(&mut self.ftp_history, HistoryValue { ts, value });
    }

    /// Record a new weight value
    pub fn set_weight_at(&mut self, value: f64, ts: DateTime<Utc>) {
        insert_sorted(&mut self.weight_history, HistoryValue { ts, value });
    }
}

// Latest entry at or before ts; earlier timestamps fall back to the first entry.
fn value_at(history: &[HistoryValue], ts: DateTime<Utc>) -> Option<f64> {
    let first = history.first()?;
    Some(
        history
            .iter()
            .take_while(|entry| entry.ts <= ts)
            .last()
            .unwrap_or(first)
            .value,
    )
}

fn insert_sorted(history: &mut Vec<HistoryValue>, entry: HistoryValue) {
    let idx = history.partition_point(|existing| existing.ts <= entry.ts);
    history.insert(idx, entry);
}
