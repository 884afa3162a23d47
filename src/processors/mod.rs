// ABOUTME: Activity processors: stats, extra streams, peaks and training load
// ABOUTME: Shared stream loading and per-activity sync-error bookkeeping
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Processors
//!
//! Each processor takes a batch of one athlete's activities. Per-activity failures
//! are recorded on the activity as a sync error and the batch continues; only
//! storage failures and invariant violations abort a batch.

/// Derived activity statistics
pub mod activity_stats;

/// Synthesized streams (running power)
pub mod extra_streams;

/// Debounced batch intake
pub mod intake;

/// Multi-period peak search
pub mod peaks;

/// ATL/CTL aggregation
pub mod training_load;

use std::collections::HashMap;

use crate::errors::{AppError, AppResult};
use crate::logging::PipelineLogger;
use crate::models::{Activity, ActivityId, ActivityStreams, StreamKind};
use crate::storage::{StreamKey, StreamStore};

pub use activity_stats::{compute_activity_stats, process_activity_stats};
pub use extra_streams::process_extra_streams;
pub use intake::IntakeScheduler;
pub use peaks::process_peaks;
pub use training_load::{
    update_training_loads, BatchOutcome, TrainingLoadAggregator, TrainingLoadProcessor,
};

/// Load the named streams of every activity in one batched read
///
/// Every activity gets an entry, possibly empty.
///
/// # Errors
///
/// Returns the stream store's error.
pub async fn get_activities_streams(
    store: &dyn StreamStore,
    activities: &[Activity],
    kinds: &[StreamKind],
) -> AppResult<HashMap<ActivityId, ActivityStreams>> {
    let keys: Vec<StreamKey> = activities
        .iter()
        .flat_map(|activity| {
            kinds.iter().map(|&stream| StreamKey {
                activity: activity.id,
                stream,
            })
        })
        .collect();
    let records = store.get_many(&keys).await?;
    let mut out: HashMap<ActivityId, ActivityStreams> = activities
        .iter()
        .map(|activity| (activity.id, ActivityStreams::new()))
        .collect();
    for record in records.into_iter().flatten() {
        if let Some(streams) = out.get_mut(&record.activity) {
            streams.insert(record.stream, record.data);
        }
    }
    Ok(out)
}

/// Reject a stream whose length differs from the time stream or that holds non-finite samples
pub(crate) fn validate_stream(kind: StreamKind, data: &[f64], expected_len: usize) -> AppResult<()> {
    if data.len() != expected_len {
        return Err(AppError::invalid_format(format!(
            "{kind} stream has {} samples, time stream has {expected_len}",
            data.len()
        )));
    }
    if let Some(idx) = data.iter().position(|v| !v.is_finite()) {
        return Err(AppError::invalid_format(format!(
            "{kind} stream has a non-finite sample at index {idx}"
        )));
    }
    Ok(())
}

/// Record a per-activity failure under `processor` and log it
pub(crate) fn record_failure(processor: &str, activity: &mut Activity, error: &AppError) {
    PipelineLogger::log_activity_failure(processor, activity.id, error);
    activity.set_sync_error(processor, error);
}
