// ABOUTME: Distance-indexed pace window, best-pace search and running work estimate
// ABOUTME: Synthesizes a running power stream from grade-adjusted distance and body weight
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use trainload_core::constants::pace::{MECHANICAL_EFFICIENCY, RUN_COST, WALK_COST};
use trainload_core::errors::{AppError, AppResult};

use crate::rolling::{import_reduce, le, SampleValue, Samples, Window};

/// Window over a cumulative distance stream, full once it covers `period` meters
#[derive(Debug, Clone)]
pub struct PaceWindow {
    period: f64,
    samples: Samples,
}

impl PaceWindow {
    /// Window covering `period` meters
    #[must_use]
    pub fn new(period: f64) -> Self {
        Self {
            period,
            samples: Samples::new(),
        }
    }

    /// Configured distance
    #[must_use]
    pub const fn period(&self) -> f64 {
        self.period
    }

    /// Meters covered from the first in-window sample (plus `lookahead`) to the last
    #[must_use]
    pub fn distance_ahead(&self, lookahead: usize) -> Option<f64> {
        let start = self
            .samples
            .value_at(self.samples.offset() + lookahead)?
            .value();
        let end = self.samples.values().last()?.value();
        Some(end - start)
    }

    /// Meters covered by the window
    #[must_use]
    pub fn distance(&self) -> Option<f64> {
        self.distance_ahead(0)
    }

    /// Pace in seconds per meter; lower is faster
    #[must_use]
    pub fn avg(&self) -> Option<f64> {
        let distance = self.distance()?;
        let elapsed = self.elapsed();
        if distance == 0.0 || elapsed == 0.0 {
            return None;
        }
        Some(elapsed / distance)
    }
}

impl Window for PaceWindow {
    fn samples(&self) -> &Samples {
        &self.samples
    }

    fn is_full(&self, lookahead: usize) -> bool {
        self.distance_ahead(lookahead)
            .is_some_and(|distance| distance >= self.period)
    }

    fn push_sample(&mut self, ts: f64, value: SampleValue) {
        self.samples.push(ts, value);
    }

    fn shift(&mut self) {
        self.samples.advance();
    }

    fn pop(&mut self) {
        self.samples.pop_back();
    }

    fn copy(&self) -> Self {
        let (samples, _) = self.samples.tail_copy();
        Self {
            period: self.period,
            samples,
        }
    }
}

/// Fastest window covering `distance` meters
///
/// # Errors
///
/// Returns `InvalidInput` when `times` and `distances` differ in length.
pub fn best_pace(distance: f64, times: &[f64], distances: &[f64]) -> AppResult<Option<PaceWindow>> {
    if times.len() < 2 {
        return Ok(None);
    }
    import_reduce(PaceWindow::new(distance), times, distances, |cur, lead| {
        le(cur.avg(), lead.avg())
    })
}

/// Mechanical work in kilojoules for moving `weight` kg over `distance` meters
#[must_use]
pub fn work(weight: f64, distance: f64, is_walking: bool) -> f64 {
    let cost = if is_walking { WALK_COST } else { RUN_COST };
    let joules = cost * weight * distance;
    joules * MECHANICAL_EFFICIENCY / 1000.0
}

/// Estimated running power from a grade-adjusted distance stream
///
/// The first sample is 0; each later sample is the work of its interval divided
/// by the interval duration. Zero-length intervals yield 0.
///
/// # Errors
///
/// Returns `InvalidInput` when the streams differ in length or the weight is not positive.
pub fn running_watts(times: &[f64], distances: &[f64], weight: f64) -> AppResult<Vec<f64>> {
    if times.len() != distances.len() {
        return Err(AppError::invalid_input(format!(
            "time and distance streams differ in length ({} vs {})",
            times.len(),
            distances.len()
        )));
    }
    if !(weight.is_finite() && weight > 0.0) {
        return Err(AppError::invalid_input(format!("invalid weight: {weight}")));
    }
    if times.is_empty() {
        return Ok(Vec::new());
    }
    let mut watts = Vec::with_capacity(times.len());
    watts.push(0.0);
    watts.extend(times.windows(2).zip(distances.windows(2)).map(|(t, d)| {
        let elapsed = t[1] - t[0];
        if elapsed > 0.0 {
            work(weight, d[1] - d[0], false) * 1000.0 / elapsed
        } else {
            0.0
        }
    }));
    Ok(watts)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn test_best_pace_prefers_fast_section() {
        // 4 m/s for 100s, then 5 m/s for 100s
        let times: Vec<f64> = (0..=200).map(f64::from).collect();
        let distances: Vec<f64> = times
            .iter()
            .map(|&t| if t <= 100.0 { t * 4.0 } else { 400.0 + (t - 100.0) * 5.0 })
            .collect();
        let best = best_pace(400.0, &times, &distances).unwrap().unwrap();
        assert!((best.avg().unwrap() - 0.2).abs() < 1e-9);
        assert!(best.distance().unwrap() >= 400.0);
    }

    #[test]
    fn test_best_pace_too_short() {
        assert!(best_pace(1000.0, &[0.0], &[0.0]).unwrap().is_none());
        let none = best_pace(1000.0, &[0.0, 10.0], &[0.0, 50.0]).unwrap();
        assert!(none.is_none());
    }

    #[test]
    fn test_work_walking_costs_less() {
        assert!((work(70.0, 1000.0, false) - 73.08).abs() < 1e-9);
        assert!(work(70.0, 1000.0, true) < work(70.0, 1000.0, false));
    }

    #[test]
    fn test_running_watts() {
        let watts = running_watts(&[0.0, 1.0, 1.0, 3.0], &[0.0, 3.0, 3.0, 9.0], 70.0).unwrap();
        assert_eq!(watts.len(), 4);
        assert!(watts[0].abs() < f64::EPSILON);
        assert!((watts[1] - 219.24).abs() < 1e-9);
        assert!(watts[2].abs() < f64::EPSILON);
        assert!((watts[3] - 219.24).abs() < 1e-9);
        assert!(running_watts(&[0.0], &[0.0, 1.0], 70.0).is_err());
    }
}
