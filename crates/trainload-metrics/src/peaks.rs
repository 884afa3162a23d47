// ABOUTME: Multi-period peak search over power, pace and heart rate streams
// ABOUTME: Activities are independent, so batches are searched in parallel with rayon
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;
use trainload_core::constants::peaks::{DEFAULT_DISTANCES, DEFAULT_NP_PERIODS, DEFAULT_PERIODS};
use trainload_core::errors::AppResult;
use trainload_core::models::ActivityId;

use crate::data::recommended_time_gaps;
use crate::pace::best_pace;
use crate::power::{peak_np, peak_power, peak_xp};
use crate::rolling::{peak_average, Window};

/// Metric a peak was ranked by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PeakKind {
    /// Average power over a period (watts)
    Power,
    /// Normalized power over a period (watts)
    Np,
    /// Cross power over a period (watts)
    Xp,
    /// Pace over a distance (seconds per meter)
    Pace,
    /// Average heart rate over a period (bpm)
    Heartrate,
}

/// Best window found for one metric and period
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Peak {
    /// Ranked metric
    pub kind: PeakKind,
    /// Seconds, or meters for pace
    pub period: f64,
    /// Metric value of the winning window
    pub value: f64,
    /// First real sample time of the window
    pub start: f64,
    /// Last real sample time of the window
    pub end: f64,
}

/// All peaks of one activity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityPeaks {
    /// Activity searched
    pub activity: ActivityId,
    /// Peaks found, in search order
    pub peaks: Vec<Peak>,
}

/// Periods and distances to search
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeakPeriods {
    /// Periods (seconds) for power and heart rate
    pub periods: Vec<f64>,
    /// Periods (seconds) for NP and XP
    pub np_periods: Vec<f64>,
    /// Distances (meters) for pace
    pub distances: Vec<f64>,
}

impl Default for PeakPeriods {
    fn default() -> Self {
        Self {
            periods: DEFAULT_PERIODS.to_vec(),
            np_periods: DEFAULT_NP_PERIODS.to_vec(),
            distances: DEFAULT_DISTANCES.to_vec(),
        }
    }
}

/// Streams of one activity handed to the search
#[derive(Debug, Clone)]
pub struct PeakInput {
    /// Activity the streams belong to
    pub activity: ActivityId,
    /// Time stream
    pub times: Vec<f64>,
    /// Power stream (measured or estimated)
    pub watts: Option<Vec<f64>>,
    /// Cumulative distance stream
    pub distance: Option<Vec<f64>>,
    /// Heart rate stream
    pub heartrate: Option<Vec<f64>>,
}

fn peak_of<W: Window>(
    kind: PeakKind,
    period: f64,
    window: Option<W>,
    metric: impl Fn(&W) -> Option<f64>,
) -> Option<Peak> {
    let window = window?;
    let value = metric(&window)?;
    let samples = window.samples();
    Some(Peak {
        kind,
        period,
        value,
        start: samples.first_time(true).or_else(|| window.first_time())?,
        end: samples.last_time(true).or_else(|| window.last_time())?,
    })
}

/// Search every configured period and distance for one activity
///
/// # Errors
///
/// Returns `InvalidInput` when a stream's length differs from the time stream.
pub fn find_peaks(input: &PeakInput, periods: &PeakPeriods) -> AppResult<ActivityPeaks> {
    let times = input.times.as_slice();
    let gaps = recommended_time_gaps(times);
    let mut peaks = Vec::new();
    if let Some(watts) = input.watts.as_deref() {
        for &period in &periods.periods {
            let window = peak_power(period, times, watts, gaps)?;
            peaks.extend(peak_of(PeakKind::Power, period, window, |w| w.avg()));
        }
        for &period in &periods.np_periods {
            let window = peak_np(period, times, watts, gaps)?;
            peaks.extend(peak_of(PeakKind::Np, period, window, |w| w.np()));
            let window = peak_xp(period, times, watts, gaps)?;
            peaks.extend(peak_of(PeakKind::Xp, period, window, |w| w.xp()));
        }
    }
    if let Some(distance) = input.distance.as_deref() {
        for &meters in &periods.distances {
            let window = best_pace(meters, times, distance)?;
            peaks.extend(peak_of(PeakKind::Pace, meters, window, |w| w.avg()));
        }
    }
    if let Some(heartrate) = input.heartrate.as_deref() {
        for &period in &periods.periods {
            let window = peak_average(period, times, heartrate, true, true)?;
            peaks.extend(peak_of(PeakKind::Heartrate, period, window, |w| {
                Some(w.active_avg())
            }));
        }
    }
    debug!(activity_id = %input.activity, peaks = peaks.len(), "peak search complete");
    Ok(ActivityPeaks {
        activity: input.activity,
        peaks,
    })
}

/// Search many activities in parallel; each activity reports its own result
#[must_use]
pub fn find_peaks_parallel(
    inputs: &[PeakInput],
    periods: &PeakPeriods,
) -> Vec<(ActivityId, AppResult<ActivityPeaks>)> {
    inputs
        .par_iter()
        .map(|input| (input.activity, find_peaks(input, periods)))
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;

    fn input(id: u64, watts: f64) -> PeakInput {
        let times: Vec<f64> = (0..=700).map(f64::from).collect();
        PeakInput {
            activity: ActivityId(id),
            watts: Some(vec![watts; times.len()]),
            distance: Some(times.iter().map(|t| t * 3.0).collect()),
            heartrate: Some(vec![150.0; times.len()]),
            times,
        }
    }

    #[test]
    fn test_find_peaks_reports_each_metric() {
        let periods = PeakPeriods {
            periods: vec![60.0],
            np_periods: vec![600.0],
            distances: vec![1000.0],
        };
        let found = find_peaks(&input(1, 250.0), &periods).unwrap();
        let kinds: Vec<PeakKind> = found.peaks.iter().map(|p| p.kind).collect();
        assert_eq!(
            kinds,
            vec![
                PeakKind::Power,
                PeakKind::Np,
                PeakKind::Xp,
                PeakKind::Pace,
                PeakKind::Heartrate
            ]
        );
        let power = &found.peaks[0];
        assert!((power.value - 250.0).abs() < 1e-9);
        assert!((power.end - power.start - 60.0).abs() < 1e-9);
        assert!((found.peaks[1].value - 250.0).abs() < 1e-6);
    }

    #[test]
    fn test_parallel_keeps_per_activity_errors() {
        let mut broken = input(2, 200.0);
        broken.watts = Some(vec![200.0; 3]);
        let results = find_peaks_parallel(&[input(1, 250.0), broken], &PeakPeriods::default());
        assert_eq!(results.len(), 2);
        assert!(results[0].1.is_ok());
        assert_eq!(results[1].0, ActivityId(2));
        assert!(results[1].1.is_err());
    }
}
