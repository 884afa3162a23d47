// ABOUTME: Environment configuration for intake thresholds, local day offset and forward horizon
// ABOUTME: Parses TRAINLOAD_* variables with typed defaults and reports unparseable values
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::env;
use std::str::FromStr;
use std::time::Duration;

use chrono::{FixedOffset, Offset, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::constants::{altitude, env_config, intake, training_load};
use crate::errors::{AppError, AppResult};

/// Thresholds governing when the intake scheduler releases a batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntakeOptions {
    /// Quiet period the pending size must hold before a release
    pub min_wait: Duration,
    /// Hard deadline measured from the first wait after the previous release
    pub max_wait: Duration,
    /// Pending size that forces a release
    pub max_size: usize,
}

impl Default for IntakeOptions {
    fn default() -> Self {
        Self {
            min_wait: Duration::from_millis(intake::DEFAULT_MIN_WAIT_MS),
            max_wait: Duration::from_millis(intake::DEFAULT_MAX_WAIT_MS),
            max_size: intake::DEFAULT_MAX_SIZE,
        }
    }
}

/// Settings for the processors and the training-load loop
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessingConfig {
    /// Debounce thresholds
    pub intake: IntakeOptions,
    /// Offset used to bucket activities into athlete-local days
    pub utc_offset: FixedOffset,
    /// Days beyond now the forward walk may extend
    pub forward_days: i64,
    /// Hysteresis applied to altitude gain
    pub altitude_hysteresis_m: f64,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            intake: IntakeOptions::default(),
            utc_offset: Utc.fix(),
            forward_days: training_load::DEFAULT_FORWARD_DAYS,
            altitude_hysteresis_m: altitude::DEFAULT_HYSTERESIS_M,
        }
    }
}

impl ProcessingConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns `ConfigInvalid` naming the variable when a value cannot be parsed
    /// or is out of range.
    pub fn from_env() -> AppResult<Self> {
        let defaults = Self::default();
        let min_wait_ms: u64 = env_parse_or(
            env_config::INTAKE_MIN_WAIT_MS,
            intake::DEFAULT_MIN_WAIT_MS,
        )?;
        let max_wait_ms: u64 = env_parse_or(
            env_config::INTAKE_MAX_WAIT_MS,
            intake::DEFAULT_MAX_WAIT_MS,
        )?;
        let max_size: usize = env_parse_or(env_config::INTAKE_MAX_SIZE, intake::DEFAULT_MAX_SIZE)?;
        if max_size == 0 {
            return Err(AppError::config_invalid(env_config::INTAKE_MAX_SIZE, "0"));
        }

        let offset_minutes: i32 = env_parse_or(env_config::UTC_OFFSET_MINUTES, 0)?;
        let utc_offset = offset_minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
            .ok_or_else(|| {
                AppError::config_invalid(env_config::UTC_OFFSET_MINUTES, &offset_minutes.to_string())
            })?;

        let forward_days: i64 = env_parse_or(env_config::FORWARD_DAYS, defaults.forward_days)?;
        if forward_days < 0 {
            return Err(AppError::config_invalid(
                env_config::FORWARD_DAYS,
                &forward_days.to_string(),
            ));
        }

        let altitude_hysteresis_m: f64 = env_parse_or(
            env_config::ALTITUDE_HYSTERESIS_M,
            defaults.altitude_hysteresis_m,
        )?;
        if !altitude_hysteresis_m.is_finite() {
            return Err(AppError::config_invalid(
                env_config::ALTITUDE_HYSTERESIS_M,
                &altitude_hysteresis_m.to_string(),
            ));
        }

        let config = Self {
            intake: IntakeOptions {
                min_wait: Duration::from_millis(min_wait_ms),
                max_wait: Duration::from_millis(max_wait_ms),
                max_size,
            },
            utc_offset,
            forward_days,
            altitude_hysteresis_m,
        };
        info!(
            min_wait_ms,
            max_wait_ms,
            max_size,
            utc_offset = %config.utc_offset,
            forward_days,
            "Loaded processing configuration"
        );
        Ok(config)
    }
}

/// Parse an environment variable, falling back to `default` when it is unset or blank
fn env_parse_or<T: FromStr>(key: &str, default: T) -> AppResult<T> {
    match env::var(key) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map_err(|_| AppError::config_invalid(key, &raw)),
        _ => Ok(default),
    }
}
