// ABOUTME: Rolling window metrics engine for irregularly sampled activity streams
// ABOUTME: Power, pace and average windows, best-window search, NP/XP/TSS and ATL/CTL
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![deny(unsafe_code)]

//! # Trainload Metrics
//!
//! Pure, synchronous computations over one activity's decoded streams. Nothing
//! in this crate performs I/O or holds shared mutable state, so every function
//! may run in parallel across activities.
//!
//! ## Modules
//!
//! - **data**: stream helpers (`sum`, `mode`, `median`, active time, time-gap heuristics)
//! - **rolling**: the generic [`rolling::Window`] capability, `RollingAverage` and best-window search
//! - **power**: `PowerWindow` with pad/zero gap filling and inline NP/XP, batch NP/XP and TSS
//! - **pace**: distance-indexed `PaceWindow`, best pace and running work
//! - **load**: ATL/CTL exponential decay
//! - **altitude**: ascent with hysteresis thresholding
//! - **peaks**: parallel multi-period peak search across activities

/// Stream helpers and time-gap heuristics
pub mod data;

/// Generic sliding window and rolling average
pub mod rolling;

/// Power windows, normalized and cross power, training stress
pub mod power;

/// Distance-indexed pace windows
pub mod pace;

/// Acute/chronic training load decay
pub mod load;

/// Altitude gain
pub mod altitude;

/// Parallel peak search
pub mod peaks;

pub use data::{TimeGaps, TimeGapsCache};
pub use pace::PaceWindow;
pub use power::PowerWindow;
pub use rolling::{import_reduce, RollingAverage, SampleValue, Samples, Window};
