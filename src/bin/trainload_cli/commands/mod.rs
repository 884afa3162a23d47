// ABOUTME: Command implementations for trainload-cli
// ABOUTME: Each command loads a bundle, runs processors and returns a JSON report
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::path::Path;

use serde_json::{json, Value};
use trainload::config::ProcessingConfig;
use trainload::constants::power::NP_MIN_TIME_SECS;
use trainload::errors::AppResult;
use trainload::import::{ActivityBundle, LoadedBundle};
use trainload::metrics::peaks::PeakPeriods;
use trainload::metrics::TimeGapsCache;
use trainload::processors::{
    process_activity_stats, process_extra_streams, process_peaks, update_training_loads,
};
use trainload::storage::ActivityStore;

/// Load the bundle and attach stats to every activity
async fn load_with_stats(path: &Path, config: &ProcessingConfig) -> AppResult<LoadedBundle> {
    let mut loaded = ActivityBundle::from_path(path).await?.into_stores().await?;
    process_extra_streams(&loaded.stream_store, &mut loaded.activities, &loaded.athlete).await?;
    let mut gaps = TimeGapsCache::new();
    process_activity_stats(
        &loaded.stream_store,
        &mut loaded.activities,
        &loaded.athlete,
        config,
        &mut gaps,
    )
    .await?;
    loaded.activity_store.save_many(&loaded.activities).await?;
    Ok(loaded)
}

pub async fn stats(path: &Path, config: &ProcessingConfig) -> AppResult<Value> {
    let loaded = load_with_stats(path, config).await?;
    let rows: Vec<Value> = loaded
        .activities
        .iter()
        .map(|activity| {
            json!({
                "id": activity.id,
                "ts": activity.ts,
                "stats": activity.stats,
                "tss": activity.tss(),
                "sync_state": activity.sync_state,
            })
        })
        .collect();
    Ok(Value::Array(rows))
}

pub async fn load(path: &Path, config: &ProcessingConfig) -> AppResult<Value> {
    let loaded = load_with_stats(path, config).await?;
    let updated = update_training_loads(
        &loaded.activity_store,
        loaded.athlete.id,
        loaded.activities,
        config,
    )
    .await?;
    let rows: Vec<Value> = updated
        .iter()
        .map(|activity| {
            json!({
                "id": activity.id,
                "ts": activity.ts,
                "tss": activity.tss(),
                "training": activity.training,
            })
        })
        .collect();
    Ok(Value::Array(rows))
}

pub async fn peaks(
    path: &Path,
    periods: Option<Vec<f64>>,
    distances: Option<Vec<f64>>,
) -> AppResult<Value> {
    let mut loaded = ActivityBundle::from_path(path).await?.into_stores().await?;
    process_extra_streams(&loaded.stream_store, &mut loaded.activities, &loaded.athlete).await?;
    let mut search = PeakPeriods::default();
    if let Some(periods) = periods {
        search.np_periods = periods.iter().copied().filter(|p| *p >= NP_MIN_TIME_SECS).collect();
        search.periods = periods;
    }
    if let Some(distances) = distances {
        search.distances = distances;
    }
    let found = process_peaks(&loaded.stream_store, &mut loaded.activities, &search).await?;
    Ok(serde_json::to_value(found)?)
}
