// ABOUTME: Core types and constants for the trainload activity metrics pipeline
// ABOUTME: Foundation crate with error handling, domain models, and constants
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![deny(unsafe_code)]

//! # Trainload Core
//!
//! Foundation crate providing shared types and constants for the trainload
//! workspace. This crate is designed to change infrequently, enabling
//! incremental compilation benefits in the workspace.
//!
//! ## Modules
//!
//! - **errors**: Unified error handling with `AppError`, `ErrorCode`, and `AppResult`
//! - **constants**: Numeric constants shared by the metrics and pipeline crates
//! - **models**: Activities, athletes, stream kinds and per-activity derived fields

/// Unified error handling system with standard error codes
pub mod errors;

/// Application constants organized by domain
pub mod constants;

/// Core data models (Activity, Athlete, StreamKind, TrainingLoad)
pub mod models;
