// ABOUTME: Configuration module for the processing pipeline
// ABOUTME: Environment-only settings for intake debounce, day boundaries and altitude analysis
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Configuration is read from environment variables only; there is no config file.

/// Environment-variable backed processing configuration
pub mod environment;

pub use environment::{IntakeOptions, ProcessingConfig};
