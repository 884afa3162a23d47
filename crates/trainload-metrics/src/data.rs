// ABOUTME: Stream helpers: sum, average, mode, median, active time and time-gap heuristics
// ABOUTME: Includes the explicit TimeGapsCache keyed by caller key and stream fingerprint
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::collections::HashMap;
use std::hash::Hash;

use serde::{Deserialize, Serialize};
use trainload_core::constants::power::MAX_GAP_MULTIPLIER;

/// Sum of all values
#[must_use]
pub fn sum(data: &[f64]) -> f64 {
    data.iter().sum()
}

/// Arithmetic mean, `None` for an empty slice
#[must_use]
pub fn avg(data: &[f64]) -> Option<f64> {
    if data.is_empty() {
        return None;
    }
    Some(sum(data) / data.len() as f64)
}

/// Largest value, `None` for an empty slice
#[must_use]
pub fn max(data: &[f64]) -> Option<f64> {
    data.iter().copied().reduce(f64::max)
}

/// Smallest value, `None` for an empty slice
#[must_use]
pub fn min(data: &[f64]) -> Option<f64> {
    data.iter().copied().reduce(f64::min)
}

/// Most frequent value
///
/// Ties resolve to the value that first reached the winning count. The scan
/// stops early once one value holds more than half of the samples.
#[must_use]
pub fn mode(data: &[f64]) -> Option<f64> {
    let half = data.len() as f64 / 2.0;
    let mut counts: HashMap<u64, usize> = HashMap::new();
    let mut leader: Option<(usize, f64)> = None;
    for &value in data {
        let count = counts.entry(value.to_bits()).or_insert(0);
        *count += 1;
        let count = *count;
        if leader.is_none_or(|(best, _)| best < count) {
            leader = Some((count, value));
            if count as f64 > half {
                break;
            }
        }
    }
    leader.map(|(_, value)| value)
}

/// Median; even-length input averages the middle pair
#[must_use]
pub fn median(data: &[f64]) -> Option<f64> {
    if data.is_empty() {
        return None;
    }
    let mut sorted = data.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 1 {
        Some(sorted[mid])
    } else {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    }
}

/// Sampling gap heuristics derived from a time stream
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeGaps {
    /// Expected interval between samples (mode of the observed gaps)
    pub ideal: f64,
    /// Gap above which a dropout is a hard stop rather than a hiccup
    pub max: f64,
}

/// Derive ideal and max gaps from a time stream
///
/// `ideal` is the most common gap (1 when that is zero), `max` is four times the
/// rounded larger of `ideal` and the median gap. Fewer than two samples yield `None`.
#[must_use]
pub fn recommended_time_gaps(times: &[f64]) -> Option<TimeGaps> {
    if times.len() < 2 {
        return None;
    }
    let gaps: Vec<f64> = times.windows(2).map(|pair| pair[1] - pair[0]).collect();
    let ideal = mode(&gaps).filter(|gap| *gap != 0.0).unwrap_or(1.0);
    let median = median(&gaps)?;
    Some(TimeGaps {
        ideal,
        max: ideal.max(median).round() * MAX_GAP_MULTIPLIER,
    })
}

/// Seconds of activity in a time stream
///
/// With an `active` stream only deltas ending on an active sample count;
/// otherwise deltas above the recommended max gap are treated as stops.
#[must_use]
pub fn active_time(times: &[f64], active: Option<&[f64]>) -> f64 {
    let gaps = match active {
        Some(_) => None,
        None => recommended_time_gaps(times),
    };
    active_time_with_gaps(times, active, gaps)
}

/// [`active_time`] with gaps the caller already derived for `times`
///
/// `gaps` is ignored when an `active` stream is given.
#[must_use]
pub fn active_time_with_gaps(times: &[f64], active: Option<&[f64]>, gaps: Option<TimeGaps>) -> f64 {
    if times.len() < 2 {
        return 0.0;
    }
    let max_gap = gaps.map(|gaps| gaps.max);
    times
        .windows(2)
        .enumerate()
        .filter(|(idx, pair)| {
            let delta = pair[1] - pair[0];
            match (active, max_gap) {
                (Some(flags), _) => flags.get(idx + 1).is_some_and(|flag| *flag != 0.0),
                (None, Some(max)) => delta <= max,
                (None, None) => true,
            }
        })
        .map(|(_, pair)| pair[1] - pair[0])
        .sum()
}

/// Per-sample active flags (1 active, 0 stopped) derived from a moving stream
///
/// Trainer rides rarely report movement, so for them a sample with positive
/// power or cadence is active as well.
#[must_use]
pub fn active_stream(
    moving: &[f64],
    watts: Option<&[f64]>,
    cadence: Option<&[f64]>,
    trainer: bool,
) -> Vec<f64> {
    let positive =
        |stream: Option<&[f64]>, idx: usize| stream.and_then(|s| s.get(idx)).is_some_and(|v| *v > 0.0);
    moving
        .iter()
        .enumerate()
        .map(|(idx, flag)| {
            let active = *flag != 0.0 || (trainer && (positive(watts, idx) || positive(cadence, idx)));
            if active {
                1.0
            } else {
                0.0
            }
        })
        .collect()
}

/// Inclusive overlap length of two ranges, `None` when they are disjoint
#[must_use]
pub fn overlap(a: (f64, f64), b: (f64, f64)) -> Option<f64> {
    let start = a.0.max(b.0);
    let end = a.1.min(b.1);
    let span = end - start;
    if span < 0.0 {
        None
    } else {
        Some(span + 1.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Fingerprint {
    len: usize,
    first: u64,
    last: u64,
}

impl Fingerprint {
    fn of(times: &[f64]) -> Self {
        Self {
            len: times.len(),
            first: times.first().map_or(0, |t| t.to_bits()),
            last: times.last().map_or(0, |t| t.to_bits()),
        }
    }
}

/// Explicit cache for [`recommended_time_gaps`]
///
/// Entries are keyed by a caller-chosen key (for example an activity id) and
/// validated against a (length, first, last) fingerprint of the stream, so a key
/// reused for different content recomputes instead of returning stale gaps.
#[derive(Debug, Clone)]
pub struct TimeGapsCache<K> {
    entries: HashMap<K, (Fingerprint, Option<TimeGaps>)>,
}

impl<K> Default for TimeGapsCache<K> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }
}

impl<K: Hash + Eq> TimeGapsCache<K> {
    /// Empty cache
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Gaps for `times`, computed on a miss or fingerprint mismatch
    pub fn get(&mut self, key: K, times: &[f64]) -> Option<TimeGaps> {
        let fingerprint = Fingerprint::of(times);
        let entry = self
            .entries
            .entry(key)
            .or_insert_with(|| (fingerprint, recommended_time_gaps(times)));
        if entry.0 != fingerprint {
            *entry = (fingerprint, recommended_time_gaps(times));
        }
        entry.1
    }

    /// Drop a single entry
    pub fn invalidate(&mut self, key: &K) {
        self.entries.remove(key);
    }

    /// Drop every entry
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Number of cached streams
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when nothing is cached
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
