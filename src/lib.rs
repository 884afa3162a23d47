// ABOUTME: Main library entry point for the trainload activity metrics pipeline
// ABOUTME: Storage seams, processors, debounced intake, configuration and logging
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![deny(unsafe_code)]

//! # Trainload
//!
//! Turns irregularly sampled activity streams into derived metrics and keeps
//! each athlete's acute/chronic training load (ATL/CTL) series current as new
//! activities arrive.
//!
//! ## Architecture
//!
//! - **`trainload_core`**: errors, models and constants shared by every crate
//! - **`trainload_metrics`**: pure rolling-window math (power, pace, NP/XP, TSS, decay)
//! - **storage**: async activity and stream store traits with in-memory implementations
//! - **processors**: activity stats, extra streams, peaks and the training-load aggregator
//! - **intake**: debounced batch release that feeds the training-load loop
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use trainload::config::ProcessingConfig;
//! use trainload::errors::AppResult;
//!
//! fn main() -> AppResult<()> {
//!     let config = ProcessingConfig::from_env()?;
//!     println!("forward walk extends {} days", config.forward_days);
//!     Ok(())
//! }
//! ```

/// Environment-driven processing configuration
pub mod config;

/// Shared constants plus environment variable names
pub mod constants;

/// Unified error handling
pub mod errors;

/// JSON activity bundle import
pub mod import;

/// Structured logging setup
pub mod logging;

/// Domain models
pub mod models;

/// Activity and training-load processors
pub mod processors;

/// Activity and stream storage seams
pub mod storage;

pub use trainload_metrics as metrics;
