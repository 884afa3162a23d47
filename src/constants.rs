// ABOUTME: Pipeline constants and the environment variable names read by configuration
// ABOUTME: Numeric defaults live in trainload-core and are re-exported here
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

pub use trainload_core::constants::*;

/// Environment variables read by [`crate::config::ProcessingConfig::from_env`]
pub mod env_config {
    /// Quiet period before the first intake release (milliseconds)
    pub const INTAKE_MIN_WAIT_MS: &str = "TRAINLOAD_INTAKE_MIN_WAIT_MS";
    /// Hard deadline for an intake release (milliseconds)
    pub const INTAKE_MAX_WAIT_MS: &str = "TRAINLOAD_INTAKE_MAX_WAIT_MS";
    /// Batch-size cap for an intake release
    pub const INTAKE_MAX_SIZE: &str = "TRAINLOAD_INTAKE_MAX_SIZE";
    /// Athlete-local day boundary as minutes east of UTC
    pub const UTC_OFFSET_MINUTES: &str = "TRAINLOAD_UTC_OFFSET_MINUTES";
    /// Days beyond now the forward walk may extend
    pub const FORWARD_DAYS: &str = "TRAINLOAD_FORWARD_DAYS";
    /// Altitude hysteresis in meters
    pub const ALTITUDE_HYSTERESIS_M: &str = "TRAINLOAD_ALTITUDE_HYSTERESIS_M";
}
