// ABOUTME: Computes per-activity stats: active time, energy, power, NP/XP, TSS, HR stress, ascent
// ABOUTME: Bad streams become sync errors on the activity and never abort the batch
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::time::Instant;

use tracing::debug;
use trainload_metrics::altitude::altitude_gain;
use trainload_metrics::data::{active_time_with_gaps, TimeGaps, TimeGapsCache};
use trainload_metrics::load::hr_tss;
use trainload_metrics::power::{calc_tss, corrected_power};

use super::{get_activities_streams, record_failure, validate_stream};
use crate::config::ProcessingConfig;
use crate::constants::sync;
use crate::errors::AppResult;
use crate::logging::PipelineLogger;
use crate::models::{
    Activity, ActivityId, ActivityStats, ActivityStreams, Athlete, BaseType, StreamKind,
};
use crate::storage::StreamStore;

const STATS_VERSION: u32 = 1;

const STATS_STREAMS: &[StreamKind] = &[
    StreamKind::Time,
    StreamKind::Heartrate,
    StreamKind::Active,
    StreamKind::Watts,
    StreamKind::WattsCalc,
    StreamKind::Altitude,
];

/// Measured power, or the running estimate for runs
pub(crate) fn power_source<'a>(
    activity: &Activity,
    streams: &'a ActivityStreams,
) -> Option<(StreamKind, &'a [f64])> {
    if let Some(watts) = streams.get(StreamKind::Watts) {
        return Some((StreamKind::Watts, watts));
    }
    if activity.base_type == BaseType::Run {
        return streams
            .get(StreamKind::WattsCalc)
            .map(|watts| (StreamKind::WattsCalc, watts));
    }
    None
}

/// Stats for one activity from its loaded streams
///
/// `gaps` are the time gaps derived from this activity's time stream; active
/// time, corrected power and heart-rate stress all use them. `Ok(None)` when
/// there is no time stream.
///
/// # Errors
///
/// Returns `InvalidFormat` when a stream's length differs from the time stream
/// or it holds non-finite samples.
pub fn compute_activity_stats(
    activity: &Activity,
    streams: &ActivityStreams,
    athlete: &Athlete,
    gaps: Option<TimeGaps>,
    altitude_hysteresis_m: f64,
) -> AppResult<Option<ActivityStats>> {
    let Some(times) = streams.get(StreamKind::Time) else {
        return Ok(None);
    };
    validate_stream(StreamKind::Time, times, times.len())?;
    let active = streams.get(StreamKind::Active);
    if let Some(flags) = active {
        validate_stream(StreamKind::Active, flags, times.len())?;
    }

    let mut stats = ActivityStats {
        active_time: active_time_with_gaps(times, active, gaps),
        ..ActivityStats::default()
    };

    if let Some((kind, watts)) = power_source(activity, streams) {
        validate_stream(kind, watts, times.len())?;
        let window = gaps
            .map(|gaps| corrected_power(times, watts, Some(gaps.ideal), Some(gaps.max)))
            .transpose()?
            .flatten();
        if let Some(window) = window {
            let kj = window.kj();
            stats.kj = Some(kj);
            stats.power = (stats.active_time > 0.0).then(|| kj * 1000.0 / stats.active_time);
            stats.np = window.np();
            stats.xp = window.xp();
            if let Some(ftp) = athlete.ftp_at(activity.ts).filter(|ftp| *ftp > 0.0) {
                if let Some(effort) = stats.np.or(stats.power) {
                    stats.tss = Some(calc_tss(effort, stats.active_time, ftp));
                    stats.intensity = Some(effort / ftp);
                }
            }
        }
    }

    if let (Some(heartrate), Some(zones)) = (streams.get(StreamKind::Heartrate), athlete.hr_zones) {
        validate_stream(StreamKind::Heartrate, heartrate, times.len())?;
        stats.hr_tss = hr_tss(
            heartrate,
            active,
            stats.active_time,
            zones.lactate_threshold(),
        );
    }

    if let Some(altitude) = streams.get(StreamKind::Altitude) {
        validate_stream(StreamKind::Altitude, altitude, times.len())?;
        stats.altitude_gain = altitude_gain(altitude, altitude_hysteresis_m);
    }

    Ok(Some(stats))
}

/// Compute and attach stats for every activity in the batch
///
/// Time gaps come from `gaps`, which the caller owns and may share with later
/// passes over the same activities. Activities without a time stream are left
/// untouched.
///
/// # Errors
///
/// Returns the stream store's error; per-activity failures are recorded as sync errors.
pub async fn process_activity_stats(
    streams: &dyn StreamStore,
    activities: &mut [Activity],
    athlete: &Athlete,
    config: &ProcessingConfig,
    gaps: &mut TimeGapsCache<ActivityId>,
) -> AppResult<()> {
    let started = Instant::now();
    let loaded = get_activities_streams(streams, activities, STATS_STREAMS).await?;
    for activity in activities.iter_mut() {
        let Some(activity_streams) = loaded.get(&activity.id) else {
            continue;
        };
        let activity_gaps = activity_streams
            .get(StreamKind::Time)
            .and_then(|times| gaps.get(activity.id, times));
        match compute_activity_stats(
            activity,
            activity_streams,
            athlete,
            activity_gaps,
            config.altitude_hysteresis_m,
        ) {
            Ok(Some(stats)) => {
                activity.stats = Some(stats);
                activity.clear_sync_error(sync::ACTIVITY_STATS);
                activity.set_sync_version(sync::ACTIVITY_STATS, STATS_VERSION);
            }
            Ok(None) => {
                debug!(activity_id = %activity.id, "No time stream; skipping stats");
            }
            Err(e) => record_failure(sync::ACTIVITY_STATS, activity, &e),
        }
    }
    PipelineLogger::log_batch(
        sync::ACTIVITY_STATS,
        athlete.id,
        activities.len(),
        started.elapsed().as_millis() as u64,
    );
    Ok(())
}
