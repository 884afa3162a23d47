// ABOUTME: Re-exports the unified error type from trainload-core
// ABOUTME: Lets binaries and tests use trainload::errors without naming the core crate
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

pub use trainload_core::errors::*;
