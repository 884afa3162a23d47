// ABOUTME: Generic time-indexed sliding window with lazy eviction and best-window search
// ABOUTME: Window trait, Samples buffer, SampleValue tags, RollingAverage, peak_average and smooth
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Rolling windows
//!
//! A window holds `(timestamp, value)` samples plus a logical offset marking the
//! first in-window sample. Eviction is lazy: `shift` only advances the offset, so
//! the evicted sample remains available to compute elapsed time at the boundary.
//!
//! Every window type implements [`Window`]. The generic [`import_reduce`] feeds a
//! stream through any window and keeps a copy of the best full window according
//! to a caller-supplied comparator, which covers peak power, peak NP/XP and best
//! pace with one algorithm.

use trainload_core::errors::{AppError, AppResult};

/// A recorded sample value
///
/// Synthetic samples fill sampling gaps: `Pad` repeats a real value across a
/// short hiccup, `Zero` penalizes a long dropout.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SampleValue {
    /// Measured value
    Real(f64),
    /// Synthetic value repeating a real sample
    Pad(f64),
    /// Synthetic zero inserted across a dropout
    Zero,
}

impl SampleValue {
    /// Numeric value of the sample
    #[must_use]
    pub const fn value(self) -> f64 {
        match self {
            Self::Real(v) | Self::Pad(v) => v,
            Self::Zero => 0.0,
        }
    }

    /// True for `Pad` and `Zero`
    #[must_use]
    pub const fn is_synthetic(self) -> bool {
        !matches!(self, Self::Real(_))
    }
}

/// Ordered sample buffer shared by every window type
#[derive(Debug, Clone, Default)]
pub struct Samples {
    times: Vec<f64>,
    values: Vec<SampleValue>,
    offset: usize,
}

impl Samples {
    /// Empty buffer
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of in-window samples
    #[must_use]
    pub fn len(&self) -> usize {
        self.times.len() - self.offset
    }

    /// True when no sample is in the window
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Index of the first in-window sample within the retained buffer
    #[must_use]
    pub const fn offset(&self) -> usize {
        self.offset
    }

    /// In-window timestamps
    #[must_use]
    pub fn times(&self) -> &[f64] {
        &self.times[self.offset..]
    }

    /// In-window values
    #[must_use]
    pub fn values(&self) -> &[SampleValue] {
        &self.values[self.offset..]
    }

    /// In-window values as plain numbers
    #[must_use]
    pub fn numeric_values(&self) -> Vec<f64> {
        self.values().iter().map(|v| v.value()).collect()
    }

    /// Timestamp at a retained-buffer index, evicted samples included
    #[must_use]
    pub fn time_at(&self, idx: usize) -> Option<f64> {
        self.times.get(idx).copied()
    }

    /// Value at a retained-buffer index, evicted samples included
    #[must_use]
    pub fn value_at(&self, idx: usize) -> Option<SampleValue> {
        self.values.get(idx).copied()
    }

    /// Time between the first in-window sample (plus `lookahead`) and the last
    ///
    /// Returns 0 when fewer than two samples remain past the lookahead.
    #[must_use]
    pub fn elapsed(&self, lookahead: usize) -> f64 {
        let start = self.offset + lookahead;
        let len = self.times.len();
        if len < start + 2 {
            return 0.0;
        }
        self.times[len - 1] - self.times[start]
    }

    /// First in-window timestamp, optionally skipping synthetic samples
    #[must_use]
    pub fn first_time(&self, no_pad: bool) -> Option<f64> {
        self.times()
            .iter()
            .zip(self.values())
            .find(|(_, v)| !no_pad || !v.is_synthetic())
            .map(|(t, _)| *t)
    }

    /// Last in-window timestamp, optionally skipping synthetic samples
    #[must_use]
    pub fn last_time(&self, no_pad: bool) -> Option<f64> {
        self.times()
            .iter()
            .zip(self.values())
            .rev()
            .find(|(_, v)| !no_pad || !v.is_synthetic())
            .map(|(t, _)| *t)
    }

    /// Most recent timestamp in the retained buffer, evicted samples included
    #[must_use]
    pub fn last_retained_time(&self) -> Option<f64> {
        self.times.last().copied()
    }

    pub(crate) fn push(&mut self, ts: f64, value: SampleValue) {
        self.times.push(ts);
        self.values.push(value);
    }

    /// Advance the offset, returning the evicted index
    pub(crate) fn advance(&mut self) -> Option<usize> {
        if self.is_empty() {
            return None;
        }
        self.offset += 1;
        Some(self.offset - 1)
    }

    /// Remove the newest sample, returning its index and value
    pub(crate) fn pop_back(&mut self) -> Option<(usize, SampleValue)> {
        if self.is_empty() {
            return None;
        }
        self.times.pop();
        let value = self.values.pop()?;
        Some((self.values.len(), value))
    }

    /// Copy keeping at most one evicted sample; returns the copy and the
    /// retained-buffer index it starts from
    pub(crate) fn tail_copy(&self) -> (Self, usize) {
        let start = self.offset.saturating_sub(1);
        let copy = Self {
            times: self.times[start..].to_vec(),
            values: self.values[start..].to_vec(),
            offset: usize::from(self.offset > 0),
        };
        (copy, start)
    }
}

/// Sliding-window capability shared by average, power and pace windows
pub trait Window: Sized {
    /// Sample buffer
    fn samples(&self) -> &Samples;

    /// Window-full predicate evaluated `lookahead` samples past the offset
    fn is_full(&self, lookahead: usize) -> bool;

    /// Record a sample and update running state
    fn push_sample(&mut self, ts: f64, value: SampleValue);

    /// Evict the first in-window sample
    fn shift(&mut self);

    /// Remove the newest sample
    fn pop(&mut self);

    /// Cheap copy preserving at most one evicted sample
    #[must_use]
    fn copy(&self) -> Self;

    /// Append a sample then evict from the front while the window would stay full
    fn append(&mut self, ts: f64, value: SampleValue) {
        self.push_sample(ts, value);
        while self.samples().len() > 1 && self.is_full(1) {
            self.shift();
        }
    }

    /// Add a real sample, returning the value unmodified
    fn add(&mut self, ts: f64, value: f64) -> f64 {
        self.append(ts, SampleValue::Real(value));
        value
    }

    /// True when the window spans its whole period
    fn full(&self) -> bool {
        self.is_full(0)
    }

    /// Seconds spanned by the window
    fn elapsed(&self) -> f64 {
        self.samples().elapsed(0)
    }

    /// Number of in-window samples
    fn size(&self) -> usize {
        self.samples().len()
    }

    /// First in-window timestamp
    fn first_time(&self) -> Option<f64> {
        self.samples().first_time(false)
    }

    /// Last in-window timestamp
    fn last_time(&self) -> Option<f64> {
        self.samples().last_time(false)
    }

    /// Copy trimmed to the inclusive time range `[start, end]`
    #[must_use]
    fn slice(&self, start: f64, end: f64) -> Self {
        let mut copy = self.copy();
        while copy.first_time().is_some_and(|t| t < start) {
            copy.shift();
        }
        while copy.last_time().is_some_and(|t| t > end) {
            copy.pop();
        }
        copy
    }

    /// Feed an entire stream into the window
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` when `times` and `values` differ in length.
    fn import_data(&mut self, times: &[f64], values: &[f64]) -> AppResult<()> {
        check_lengths(times, values)?;
        for (&ts, &value) in times.iter().zip(values) {
            self.add(ts, value);
        }
        Ok(())
    }
}

fn check_lengths(times: &[f64], values: &[f64]) -> AppResult<()> {
    if times.len() == values.len() {
        Ok(())
    } else {
        Err(AppError::invalid_input(format!(
            "times and values not same length ({} vs {})",
            times.len(),
            values.len()
        )))
    }
}

/// Best full window of a stream
///
/// Samples are fed one at a time; whenever the window is full and `better`
/// ranks it at least as good as the current leader, a copy becomes the new
/// leader. Streams too short to ever fill the window yield `None`.
///
/// # Errors
///
/// Returns `InvalidInput` when `times` and `values` differ in length.
pub fn import_reduce<W, F>(
    mut window: W,
    times: &[f64],
    values: &[f64],
    mut better: F,
) -> AppResult<Option<W>>
where
    W: Window,
    F: FnMut(&W, &W) -> bool,
{
    check_lengths(times, values)?;
    let mut leader: Option<W> = None;
    for (&ts, &value) in times.iter().zip(values) {
        window.add(ts, value);
        if window.full() && leader.as_ref().is_none_or(|lead| better(&window, lead)) {
            leader = Some(window.copy());
        }
    }
    Ok(leader)
}

/// `a >= b`, false when either side is undefined
#[must_use]
pub fn ge(a: Option<f64>, b: Option<f64>) -> bool {
    matches!((a, b), (Some(a), Some(b)) if a >= b)
}

/// `a <= b`, false when either side is undefined
#[must_use]
pub fn le(a: Option<f64>, b: Option<f64>) -> bool {
    matches!((a, b), (Some(a), Some(b)) if a <= b)
}

/// Time window over arbitrary values with a running sum
#[derive(Debug, Clone)]
pub struct RollingAverage {
    period: f64,
    samples: Samples,
    sum: f64,
    ignore_zeros: bool,
    zeros: usize,
}

impl RollingAverage {
    /// Window spanning `period` seconds
    #[must_use]
    pub fn new(period: f64) -> Self {
        Self {
            period,
            samples: Samples::new(),
            sum: 0.0,
            ignore_zeros: false,
            zeros: 0,
        }
    }

    /// Exclude zero samples from the active average
    #[must_use]
    pub const fn ignore_zeros(mut self) -> Self {
        self.ignore_zeros = true;
        self
    }

    /// Configured period
    #[must_use]
    pub const fn period(&self) -> f64 {
        self.period
    }

    /// Running sum of in-window values
    #[must_use]
    pub const fn sum(&self) -> f64 {
        self.sum
    }

    /// Mean over in-window samples (non-zero samples when zeros are ignored)
    #[must_use]
    pub fn active_avg(&self) -> f64 {
        let count = self.samples.len() - self.zeros;
        if count == 0 {
            0.0
        } else {
            self.sum / count as f64
        }
    }

    /// Time-weighted mean: the sum excluding the first sample divided by elapsed time
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` when the window ignores zeros.
    pub fn elapsed_avg(&self) -> AppResult<Option<f64>> {
        if self.ignore_zeros {
            return Err(AppError::invalid_input(
                "elapsed average unsupported when zeros are ignored",
            ));
        }
        let elapsed = self.elapsed();
        if elapsed <= 0.0 {
            return Ok(None);
        }
        let first = self
            .samples
            .value_at(self.samples.offset())
            .map_or(0.0, SampleValue::value);
        Ok(Some((self.sum - first) / elapsed))
    }

    /// Active or elapsed average
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` for an elapsed average when zeros are ignored.
    pub fn avg(&self, active: bool) -> AppResult<Option<f64>> {
        if active {
            Ok(Some(self.active_avg()))
        } else {
            self.elapsed_avg()
        }
    }

    fn forget(&mut self, value: f64) {
        self.sum -= value;
        if self.ignore_zeros && value == 0.0 {
            self.zeros -= 1;
        }
    }
}

impl Window for RollingAverage {
    fn samples(&self) -> &Samples {
        &self.samples
    }

    fn is_full(&self, lookahead: usize) -> bool {
        self.samples.elapsed(lookahead) >= self.period
    }

    fn push_sample(&mut self, ts: f64, value: SampleValue) {
        let v = value.value();
        self.sum += v;
        if self.ignore_zeros && v == 0.0 {
            self.zeros += 1;
        }
        self.samples.push(ts, value);
    }

    fn shift(&mut self) {
        if let Some(idx) = self.samples.advance() {
            let value = self.samples.value_at(idx).map_or(0.0, SampleValue::value);
            self.forget(value);
        }
    }

    fn pop(&mut self) {
        if let Some((_, value)) = self.samples.pop_back() {
            self.forget(value.value());
        }
    }

    fn copy(&self) -> Self {
        let (samples, _) = self.samples.tail_copy();
        Self {
            period: self.period,
            samples,
            sum: self.sum,
            ignore_zeros: self.ignore_zeros,
            zeros: self.zeros,
        }
    }
}

/// Highest-average window of `period` seconds
///
/// `active` ranks by the sample mean, otherwise by the time-weighted mean.
///
/// # Errors
///
/// Returns `InvalidInput` on mismatched stream lengths, or when ranking by
/// time-weighted mean while ignoring zeros.
pub fn peak_average(
    period: f64,
    times: &[f64],
    values: &[f64],
    active: bool,
    ignore_zeros: bool,
) -> AppResult<Option<RollingAverage>> {
    let mut window = RollingAverage::new(period);
    if ignore_zeros {
        if !active {
            return Err(AppError::invalid_input(
                "elapsed average unsupported when zeros are ignored",
            ));
        }
        window = window.ignore_zeros();
    }
    import_reduce(window, times, values, |cur, lead| {
        if active {
            cur.active_avg() >= lead.active_avg()
        } else {
            ge(
                cur.elapsed_avg().ok().flatten(),
                lead.elapsed_avg().ok().flatten(),
            )
        }
    })
}

/// Rolling active average of `values` over `period` samples
///
/// Samples before the first full period are pre-averaged with the values that
/// follow them to soften the leading edge. Without `times`, the sample index is
/// used as the timestamp.
#[must_use]
pub fn smooth(period: usize, times: Option<&[f64]>, values: &[f64]) -> Vec<f64> {
    let mut window = RollingAverage::new(period as f64);
    let lead_in = period.saturating_sub(1);
    values
        .iter()
        .enumerate()
        .map(|(i, &v)| {
            let ts = times.and_then(|t| t.get(i).copied()).unwrap_or(i as f64);
            if i < lead_in {
                let end = lead_in.min(values.len());
                let mut weighted = values[i..end].to_vec();
                weighted.push(v);
                let n = weighted.len() as f64;
                window.add(ts, weighted.iter().sum::<f64>() / n);
            } else {
                window.add(ts, v);
            }
            window.active_avg()
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;

    fn seconds(n: usize) -> Vec<f64> {
        (0..n).map(|i| i as f64).collect()
    }

    #[test]
    fn test_add_evicts_with_lookahead() {
        let mut roll = RollingAverage::new(3.0);
        for (ts, v) in seconds(10).into_iter().zip(1..) {
            roll.add(ts, f64::from(v));
            assert!(roll.elapsed() <= 3.0);
        }
        assert_eq!(roll.size(), 4);
        assert!((roll.sum() - (7.0 + 8.0 + 9.0 + 10.0)).abs() < 1e-9);
        assert!(roll.full());
    }

    #[test]
    fn test_copy_keeps_one_evicted_sample() {
        let mut roll = RollingAverage::new(3.0);
        roll.import_data(&seconds(10), &seconds(10)).unwrap();
        let copy = roll.copy();
        assert_eq!(copy.samples().offset(), 1);
        assert_eq!(copy.size(), roll.size());
        assert!((copy.elapsed() - roll.elapsed()).abs() < f64::EPSILON);
        assert!((copy.active_avg() - roll.active_avg()).abs() < f64::EPSILON);
        assert_eq!(
            copy.elapsed_avg().unwrap(),
            roll.elapsed_avg().unwrap()
        );
    }

    #[test]
    fn test_slice_trims_inclusive_range() {
        let mut roll = RollingAverage::new(100.0);
        roll.import_data(&seconds(20), &seconds(20)).unwrap();
        let sliced = roll.slice(5.0, 9.0);
        assert_eq!(sliced.first_time(), Some(5.0));
        assert_eq!(sliced.last_time(), Some(9.0));
        assert!((sliced.sum() - 35.0).abs() < 1e-9);
    }

    #[test]
    fn test_import_reduce_short_input_yields_none() {
        let found = import_reduce(RollingAverage::new(5.0), &[1.0], &[10.0], |_, _| true).unwrap();
        assert!(found.is_none());
        let found = import_reduce(RollingAverage::new(5.0), &[], &[], |_, _| true).unwrap();
        assert!(found.is_none());
    }

    #[test]
    fn test_import_reduce_rejects_mismatched_lengths() {
        let result = import_reduce(RollingAverage::new(5.0), &[1.0, 2.0], &[10.0], |_, _| true);
        assert!(result.is_err());
    }

    #[test]
    fn test_peak_average_finds_max_block() {
        let times = seconds(30);
        let mut values = vec![100.0; 30];
        for v in &mut values[10..16] {
            *v = 300.0;
        }
        let peak = peak_average(5.0, &times, &values, true, false).unwrap().unwrap();
        assert!((peak.active_avg() - 300.0).abs() < 1e-9);
    }

    #[test]
    fn test_ignore_zeros() {
        let mut roll = RollingAverage::new(10.0).ignore_zeros();
        roll.import_data(&seconds(4), &[10.0, 0.0, 20.0, 0.0]).unwrap();
        assert!((roll.active_avg() - 15.0).abs() < 1e-9);
        assert!(roll.elapsed_avg().is_err());
        assert!(peak_average(2.0, &seconds(4), &[1.0; 4], false, true).is_err());
    }

    #[test]
    fn test_smooth_constant_stream_is_flat() {
        let smoothed = smooth(3, None, &[5.0; 8]);
        assert_eq!(smoothed.len(), 8);
        assert!(smoothed.iter().all(|v| (v - 5.0).abs() < 1e-9));
    }

    #[test]
    fn test_first_last_time_skip_pads() {
        let mut samples = Samples::new();
        samples.push(0.0, SampleValue::Zero);
        samples.push(1.0, SampleValue::Real(3.0));
        samples.push(2.0, SampleValue::Pad(3.0));
        assert_eq!(samples.first_time(true), Some(1.0));
        assert_eq!(samples.last_time(true), Some(1.0));
        assert_eq!(samples.first_time(false), Some(0.0));
        assert_eq!(samples.last_time(false), Some(2.0));
    }
}
