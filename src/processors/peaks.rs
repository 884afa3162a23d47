// ABOUTME: Runs the multi-period peak search for a batch of activities on the blocking pool
// ABOUTME: Rayon parallelizes across activities; per-activity failures become sync errors
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use tokio::task;
use trainload_metrics::peaks::{find_peaks_parallel, ActivityPeaks, PeakInput, PeakPeriods};

use super::activity_stats::power_source;
use super::{get_activities_streams, record_failure};
use crate::constants::sync;
use crate::errors::{AppError, AppResult};
use crate::models::{Activity, StreamKind};
use crate::storage::StreamStore;

const PEAK_STREAMS: &[StreamKind] = &[
    StreamKind::Time,
    StreamKind::Watts,
    StreamKind::WattsCalc,
    StreamKind::Distance,
    StreamKind::Heartrate,
];

/// Find peaks for every activity that has a time stream
///
/// # Errors
///
/// Returns the stream store's error, or `InternalError` if the search task
/// panicked; per-activity failures are recorded as sync errors.
pub async fn process_peaks(
    streams: &dyn StreamStore,
    activities: &mut [Activity],
    periods: &PeakPeriods,
) -> AppResult<Vec<ActivityPeaks>> {
    let loaded = get_activities_streams(streams, activities, PEAK_STREAMS).await?;
    let inputs: Vec<PeakInput> = activities
        .iter()
        .filter_map(|activity| {
            let activity_streams = loaded.get(&activity.id)?;
            let times = activity_streams.get(StreamKind::Time)?;
            Some(PeakInput {
                activity: activity.id,
                times: times.to_vec(),
                watts: power_source(activity, activity_streams).map(|(_, watts)| watts.to_vec()),
                distance: activity_streams.get(StreamKind::Distance).map(<[f64]>::to_vec),
                heartrate: activity_streams
                    .get(StreamKind::Heartrate)
                    .map(<[f64]>::to_vec),
            })
        })
        .collect();

    let periods = periods.clone();
    let results = task::spawn_blocking(move || find_peaks_parallel(&inputs, &periods))
        .await
        .map_err(|e| AppError::internal(format!("peak search task failed: {e}")))?;

    let mut found = Vec::with_capacity(results.len());
    for (id, result) in results {
        match result {
            Ok(peaks) => {
                if let Some(activity) = activities.iter_mut().find(|a| a.id == id) {
                    activity.clear_sync_error(sync::PEAKS);
                }
                found.push(peaks);
            }
            Err(e) => {
                if let Some(activity) = activities.iter_mut().find(|a| a.id == id) {
                    record_failure(sync::PEAKS, activity, &e);
                }
            }
        }
    }
    Ok(found)
}
