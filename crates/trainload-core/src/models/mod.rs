// ABOUTME: Core data models for the trainload pipeline
// ABOUTME: Re-exports Activity, Athlete, StreamKind and training-load records
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Data Models
//!
//! - `Activity`: one recorded workout with its derived stats and training record
//! - `Athlete`: profile with time-varying FTP and weight history
//! - `StreamKind` / `StreamRecord`: named numeric arrays belonging to an activity

mod activity;
mod athlete;
mod stream;

pub use activity::{
    Activity, ActivityId, ActivityStats, BaseType, SyncState, TrainingLoad,
};
pub use athlete::{Athlete, AthleteId, Gender, HistoryValue, HrZones};
pub use stream::{ActivityStreams, StreamKind, StreamRecord};
