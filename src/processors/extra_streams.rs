// ABOUTME: Synthesizes active-flag streams from movement and running power from grade-adjusted distance
// ABOUTME: Persists the new active and watts_calc streams and annotates failing activities with sync errors
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::time::Instant;

use trainload_metrics::data::active_stream;
use trainload_metrics::pace::running_watts;

use super::{get_activities_streams, record_failure, validate_stream};
use crate::constants::sync;
use crate::errors::AppResult;
use crate::logging::PipelineLogger;
use crate::models::{Activity, ActivityStreams, Athlete, BaseType, StreamKind, StreamRecord};
use crate::storage::StreamStore;

const EXTRA_STREAMS_VERSION: u32 = 1;

const SOURCE_STREAMS: &[StreamKind] = &[
    StreamKind::Time,
    StreamKind::Moving,
    StreamKind::Cadence,
    StreamKind::Watts,
    StreamKind::GradeAdjustedDistance,
];

fn active_for(activity: &Activity, streams: &ActivityStreams, moving: &[f64]) -> AppResult<StreamRecord> {
    let expected = streams.get(StreamKind::Time).map_or(moving.len(), <[f64]>::len);
    validate_stream(StreamKind::Moving, moving, expected)?;
    let watts = streams.get(StreamKind::Watts);
    let cadence = streams.get(StreamKind::Cadence);
    for (kind, data) in [(StreamKind::Watts, watts), (StreamKind::Cadence, cadence)] {
        if let Some(data) = data {
            validate_stream(kind, data, expected)?;
        }
    }
    Ok(StreamRecord {
        activity: activity.id,
        athlete: activity.athlete,
        stream: StreamKind::Active,
        data: active_stream(moving, watts, cadence, activity.trainer),
    })
}

fn watts_calc_for(activity: &Activity, times: &[f64], gad: &[f64], weight: f64) -> AppResult<StreamRecord> {
    validate_stream(StreamKind::GradeAdjustedDistance, gad, times.len())?;
    Ok(StreamRecord {
        activity: activity.id,
        athlete: activity.athlete,
        stream: StreamKind::WattsCalc,
        data: running_watts(times, gad, weight)?,
    })
}

/// Create `active` and `watts_calc` streams and persist them
///
/// Any activity with a moving stream gets an active stream. Runs also get a
/// running power estimate when they have a time stream, a grade-adjusted
/// distance stream and an athlete weight at the activity start.
///
/// # Errors
///
/// Returns the stream store's error; per-activity failures are recorded as sync errors.
pub async fn process_extra_streams(
    streams: &dyn StreamStore,
    activities: &mut [Activity],
    athlete: &Athlete,
) -> AppResult<Vec<StreamRecord>> {
    let started = Instant::now();
    let loaded = get_activities_streams(streams, activities, SOURCE_STREAMS).await?;
    let mut created = Vec::new();
    for activity in activities.iter_mut() {
        let Some(activity_streams) = loaded.get(&activity.id) else {
            continue;
        };
        let mut results = Vec::new();
        if let Some(moving) = activity_streams.get(StreamKind::Moving) {
            results.push(active_for(activity, activity_streams, moving));
        }
        if activity.base_type == BaseType::Run {
            if let (Some(times), Some(gad), Some(weight)) = (
                activity_streams.get(StreamKind::Time),
                activity_streams.get(StreamKind::GradeAdjustedDistance),
                athlete.weight_at(activity.ts),
            ) {
                results.push(watts_calc_for(activity, times, gad, weight));
            }
        }
        if results.is_empty() {
            continue;
        }
        let mut failed = false;
        for result in results {
            match result {
                Ok(record) => created.push(record),
                Err(e) => {
                    failed = true;
                    record_failure(sync::EXTRA_STREAMS, activity, &e);
                }
            }
        }
        if !failed {
            activity.clear_sync_error(sync::EXTRA_STREAMS);
            activity.set_sync_version(sync::EXTRA_STREAMS, EXTRA_STREAMS_VERSION);
        }
    }
    streams.put_many(created.clone()).await?;
    PipelineLogger::log_batch(
        sync::EXTRA_STREAMS,
        athlete.id,
        activities.len(),
        started.elapsed().as_millis() as u64,
    );
    Ok(created)
}
