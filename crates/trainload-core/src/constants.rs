// ABOUTME: Constants module with domain-separated organization
// ABOUTME: Window thresholds, training-load time constants and pipeline defaults
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Constants module
//!
//! Constants are grouped into logical domains rather than being in a single flat list.

/// Power analysis thresholds
pub mod power {
    /// Minimum elapsed seconds before NP is reported
    pub const NP_MIN_TIME_SECS: f64 = 300.0;
    /// Minimum elapsed seconds before XP is reported
    pub const XP_MIN_TIME_SECS: f64 = 300.0;
    /// Rolling average span used by NP
    pub const NP_ROLLING_SECS: f64 = 30.0;
    /// Decay horizon used by XP
    pub const XP_WINDOW_SECS: f64 = 25.0;
    /// XP catch-up tolerance on the sample interval
    pub const XP_EPSILON: f64 = 0.1;
    /// Weighted XP value below which decay catch-up stops
    pub const XP_NEGLIGIBLE: f64 = 0.1;
    /// Multiplier applied to max(ideal, median) gap to derive the hard-stop gap
    pub const MAX_GAP_MULTIPLIER: f64 = 4.0;
    /// Seconds in one hour, used by the TSS formula
    pub const SECONDS_PER_HOUR: f64 = 3600.0;
}

/// Running work estimate
pub mod pace {
    /// Metabolic cost factor for running
    pub const RUN_COST: f64 = 4.35;
    /// Metabolic cost factor for walking
    pub const WALK_COST: f64 = 2.0;
    /// Human mechanical efficiency
    pub const MECHANICAL_EFFICIENCY: f64 = 0.24;
}

/// Training load (ATL/CTL) time constants
pub mod training_load {
    /// Acute training load time constant in days
    pub const ATL_DAYS: f64 = 7.0;
    /// Chronic training load time constant in days
    pub const CTL_DAYS: f64 = 42.0;
    /// Days beyond "now" the forward walk may extend
    pub const DEFAULT_FORWARD_DAYS: i64 = 7;
}

/// Debounced intake defaults
pub mod intake {
    /// Quiet period before the first release
    pub const DEFAULT_MIN_WAIT_MS: u64 = 10_000;
    /// Hard deadline for a release
    pub const DEFAULT_MAX_WAIT_MS: u64 = 90_000;
    /// Batch-size cap that forces a release
    pub const DEFAULT_MAX_SIZE: usize = 50;
}

/// Sync manifest names used for per-activity error annotations
pub mod sync {
    /// Activity stats processor
    pub const ACTIVITY_STATS: &str = "activity-stats";
    /// Extra stream synthesis processor
    pub const EXTRA_STREAMS: &str = "extra-streams";
    /// Peak search processor
    pub const PEAKS: &str = "peaks";
    /// Training load processor
    pub const TRAINING_LOAD: &str = "training-load";
}

/// Peak search defaults
pub mod peaks {
    /// Periods (seconds) searched for peak power and heart rate
    pub const DEFAULT_PERIODS: &[f64] = &[
        5.0, 15.0, 30.0, 60.0, 120.0, 300.0, 600.0, 1200.0, 1800.0, 3600.0, 10800.0,
    ];
    /// Periods (seconds) searched for peak NP and XP
    pub const DEFAULT_NP_PERIODS: &[f64] = &[300.0, 600.0, 1200.0, 1800.0, 3600.0, 10800.0];
    /// Distances (meters) searched for best pace
    pub const DEFAULT_DISTANCES: &[f64] = &[
        400.0, 1000.0, 1609.344, 3000.0, 5000.0, 10000.0, 21097.5, 42195.0,
    ];
}

/// Altitude analysis defaults
pub mod altitude {
    /// Hysteresis (meters) applied before counting an ascent
    pub const DEFAULT_HYSTERESIS_M: f64 = 3.0;
}

/// Service identity used in structured logs
pub mod service_names {
    /// Service name
    pub const TRAINLOAD: &str = "trainload";
}
