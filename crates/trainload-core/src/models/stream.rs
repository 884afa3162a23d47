// ABOUTME: Named per-activity numeric streams and their storage records
// ABOUTME: StreamKind, StreamRecord and the ActivityStreams lookup bundle
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::{ActivityId, AthleteId};

/// Stream names understood by the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StreamKind {
    /// Seconds from activity start
    Time,
    /// Measured power (watts)
    Watts,
    /// Estimated power for runs (watts)
    WattsCalc,
    /// Heart rate (bpm)
    Heartrate,
    /// Cumulative distance (meters)
    Distance,
    /// Cumulative grade-adjusted distance (meters)
    GradeAdjustedDistance,
    /// Altitude (meters)
    Altitude,
    /// Active flag per sample (non-zero = active)
    Active,
    /// Cadence (rpm or spm)
    Cadence,
    /// Moving flag per sample (non-zero = moving)
    Moving,
}

impl StreamKind {
    /// Storage name
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Time => "time",
            Self::Watts => "watts",
            Self::WattsCalc => "watts_calc",
            Self::Heartrate => "heartrate",
            Self::Distance => "distance",
            Self::GradeAdjustedDistance => "grade_adjusted_distance",
            Self::Altitude => "altitude",
            Self::Active => "active",
            Self::Cadence => "cadence",
            Self::Moving => "moving",
        }
    }
}

impl fmt::Display for StreamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One stored stream
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamRecord {
    /// Owning activity
    pub activity: ActivityId,
    /// Owning athlete
    pub athlete: AthleteId,
    /// Stream name
    pub stream: StreamKind,
    /// Samples
    pub data: Vec<f64>,
}

/// The streams loaded for a single activity
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActivityStreams {
    streams: HashMap<StreamKind, Vec<f64>>,
}

impl ActivityStreams {
    /// Empty bundle
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a stream
    pub fn insert(&mut self, kind: StreamKind, data: Vec<f64>) {
        self.streams.insert(kind, data);
    }

    /// Borrow a stream if present
    #[must_use]
    pub fn get(&self, kind: StreamKind) -> Option<&[f64]> {
        self.streams.get(&kind).map(Vec::as_slice)
    }

    /// True when the stream is present
    #[must_use]
    pub fn contains(&self, kind: StreamKind) -> bool {
        self.streams.contains_key(&kind)
    }
}
