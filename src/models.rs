// ABOUTME: Re-exports domain models from trainload-core
// ABOUTME: Activity, Athlete and stream types used across the pipeline
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

pub use trainload_core::models::*;
