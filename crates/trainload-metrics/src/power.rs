// ABOUTME: Power window with pad/zero gap filling, running energy and inline NP/XP accumulators
// ABOUTME: Batch NP/XP formulas, TSS, peak power/NP/XP search and whole-activity corrected power
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Power windows
//!
//! [`PowerWindow`] fills sampling gaps before accumulating: a gap above the max
//! gap is filled with [`SampleValue::Zero`] samples at the ideal spacing, a gap
//! above the ideal gap with [`SampleValue::Pad`] samples repeating the new value.
//!
//! Running state (energy, NP and XP quartic totals) is updated per sample and
//! each sample's contribution is recorded, so `shift` and `pop` subtract exactly
//! what `add` added and the totals always match the retained samples.
//!
//! ## Formulas
//!
//! - NP: `(mean(rolling_30s_avg^4))^0.25`
//! - XP: `(mean(ewma_25s^4))^0.25`
//! - TSS: `(power * duration * (power / ftp)) / (ftp * 3600) * 100`

use trainload_core::constants::power::{
    NP_MIN_TIME_SECS, NP_ROLLING_SECS, SECONDS_PER_HOUR, XP_EPSILON, XP_MIN_TIME_SECS,
    XP_NEGLIGIBLE, XP_WINDOW_SECS,
};
use trainload_core::errors::AppResult;

use crate::data::{recommended_time_gaps, TimeGaps};
use crate::rolling::{ge, import_reduce, SampleValue, Samples, Window};

#[inline]
fn quartic(x: f64) -> f64 {
    let sq = x * x;
    sq * sq
}

/// What one sample added to the running state
#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct Contribution {
    joules: f64,
    np_quartic: f64,
    np_displaced: f64,
    xp_total: f64,
    xp_count: usize,
    xp_prev_weighted: f64,
    xp_prev_time: f64,
}

#[derive(Debug, Clone)]
struct InlineNp {
    roll_size: usize,
    slot: usize,
    ring: Vec<f64>,
    roll_sum: f64,
    seen: usize,
    total: f64,
}

impl InlineNp {
    fn new(sample_interval: f64) -> Self {
        let roll_size = ((NP_ROLLING_SECS / sample_interval).round() as usize).max(1);
        Self {
            roll_size,
            slot: 0,
            ring: vec![0.0; roll_size],
            roll_sum: 0.0,
            seen: 0,
            total: 0.0,
        }
    }

    fn push(&mut self, value: f64, entry: &mut Contribution) {
        self.slot = (self.slot + 1) % self.roll_size;
        let displaced = self.ring[self.slot];
        self.roll_sum += value - displaced;
        self.ring[self.slot] = value;
        self.seen += 1;
        let npa = self.roll_sum / self.roll_size.min(self.seen) as f64;
        let q = quartic(npa);
        self.total += q;
        entry.np_quartic = q;
        entry.np_displaced = displaced;
    }

    fn undo(&mut self, value: f64, entry: &Contribution) {
        self.total -= entry.np_quartic;
        self.roll_sum -= value - entry.np_displaced;
        self.ring[self.slot] = entry.np_displaced;
        self.slot = (self.slot + self.roll_size - 1) % self.roll_size;
        self.seen = self.seen.saturating_sub(1);
    }
}

#[derive(Debug, Clone)]
struct InlineXp {
    sample_interval: f64,
    attenuation: f64,
    sample_weight: f64,
    origin: Option<f64>,
    prev_time: f64,
    weighted: f64,
    total: f64,
    count: usize,
}

impl InlineXp {
    fn new(sample_interval: f64) -> Self {
        let samples_per_window = XP_WINDOW_SECS / sample_interval;
        Self {
            sample_interval,
            attenuation: samples_per_window / (samples_per_window + sample_interval),
            sample_weight: sample_interval / (samples_per_window + sample_interval),
            origin: None,
            prev_time: 0.0,
            weighted: 0.0,
            total: 0.0,
            count: 0,
        }
    }

    fn push(&mut self, ts: f64, value: f64, entry: &mut Contribution) {
        entry.xp_prev_weighted = self.weighted;
        entry.xp_prev_time = self.prev_time;
        let time = ts - *self.origin.get_or_insert(ts);
        let mut total = 0.0;
        let mut count = 0;
        // Decay across real time not covered by samples
        while self.weighted > XP_NEGLIGIBLE
            && time > self.prev_time + self.sample_interval + XP_EPSILON
        {
            self.weighted *= self.attenuation;
            self.prev_time += self.sample_interval;
            total += quartic(self.weighted);
            count += 1;
        }
        self.weighted = self.weighted.mul_add(self.attenuation, self.sample_weight * value);
        self.prev_time = time;
        total += quartic(self.weighted);
        count += 1;
        self.total += total;
        self.count += count;
        entry.xp_total = total;
        entry.xp_count = count;
    }

    fn forget(&mut self, entry: &Contribution) {
        self.total -= entry.xp_total;
        self.count = self.count.saturating_sub(entry.xp_count);
    }

    fn undo(&mut self, entry: &Contribution) {
        self.forget(entry);
        self.weighted = entry.xp_prev_weighted;
        self.prev_time = entry.xp_prev_time;
    }
}

/// Time window over a power stream
#[derive(Debug, Clone)]
pub struct PowerWindow {
    period: Option<f64>,
    ideal_gap: Option<f64>,
    max_gap: Option<f64>,
    samples: Samples,
    contributions: Vec<Contribution>,
    joules: f64,
    inline_np: Option<InlineNp>,
    inline_xp: Option<InlineXp>,
}

impl PowerWindow {
    /// New window
    ///
    /// `period` of `None` never fills, which is how a whole activity is ingested.
    /// Without an `ideal_gap` no gap filling happens; without a `max_gap` every gap
    /// is padded rather than zero-filled. `max_gap` is raised to at least `ideal_gap`.
    #[must_use]
    pub fn new(period: Option<f64>, ideal_gap: Option<f64>, max_gap: Option<f64>) -> Self {
        let ideal_gap = ideal_gap.filter(|gap| gap.is_finite() && *gap > 0.0);
        let max_gap = max_gap
            .filter(|gap| *gap > 0.0)
            .map(|gap| ideal_gap.map_or(gap, |ideal| gap.max(ideal)));
        Self {
            period,
            ideal_gap,
            max_gap,
            samples: Samples::new(),
            contributions: Vec::new(),
            joules: 0.0,
            inline_np: None,
            inline_xp: None,
        }
    }

    /// Window with gaps derived from `times` when not supplied
    ///
    /// Returns `None` when `times` has fewer than two samples.
    #[must_use]
    pub fn for_stream(period: Option<f64>, times: &[f64], gaps: Option<TimeGaps>) -> Option<Self> {
        if times.len() < 2 {
            return None;
        }
        let gaps = match gaps {
            Some(gaps) => gaps,
            None => recommended_time_gaps(times)?,
        };
        Some(Self::new(period, Some(gaps.ideal), Some(gaps.max)))
    }

    /// Accumulate NP inline; call before adding samples
    #[must_use]
    pub fn with_inline_np(mut self) -> Self {
        self.inline_np = Some(InlineNp::new(self.sample_interval()));
        self
    }

    /// Accumulate XP inline; call before adding samples
    #[must_use]
    pub fn with_inline_xp(mut self) -> Self {
        self.inline_xp = Some(InlineXp::new(self.sample_interval()));
        self
    }

    /// Configured period
    #[must_use]
    pub const fn period(&self) -> Option<f64> {
        self.period
    }

    /// Expected sampling interval, if known
    #[must_use]
    pub const fn ideal_gap(&self) -> Option<f64> {
        self.ideal_gap
    }

    /// Zero-fill threshold, if any
    #[must_use]
    pub const fn max_gap(&self) -> Option<f64> {
        self.max_gap
    }

    /// Interval used by the NP/XP formulas (1s when no ideal gap is known)
    #[must_use]
    pub fn sample_interval(&self) -> f64 {
        self.ideal_gap.unwrap_or(1.0)
    }

    /// Energy over the window in joules
    #[must_use]
    pub const fn joules(&self) -> f64 {
        self.joules
    }

    /// Energy over the window in kilojoules
    #[must_use]
    pub fn kj(&self) -> f64 {
        self.joules / 1000.0
    }

    /// Average power (`joules / elapsed`), `None` for an empty span
    #[must_use]
    pub fn avg(&self) -> Option<f64> {
        let elapsed = self.elapsed();
        (elapsed > 0.0).then(|| self.joules / elapsed)
    }

    /// Normalized power; inline when enabled, otherwise the batch formula
    #[must_use]
    pub fn np(&self) -> Option<f64> {
        let Some(state) = &self.inline_np else {
            return self.np_external();
        };
        let size = self.size();
        if self.elapsed() < NP_MIN_TIME_SECS || size == 0 {
            return None;
        }
        Some((state.total.max(0.0) / size as f64).powf(0.25))
    }

    /// Normalized power from the batch formula over the in-window samples
    #[must_use]
    pub fn np_external(&self) -> Option<f64> {
        calc_np(&self.samples.numeric_values(), 1.0 / self.sample_interval())
    }

    /// Cross power; inline when enabled, otherwise the batch formula
    #[must_use]
    pub fn xp(&self) -> Option<f64> {
        let Some(state) = &self.inline_xp else {
            return self.xp_external();
        };
        if self.elapsed() < XP_MIN_TIME_SECS || state.count == 0 {
            return None;
        }
        Some((state.total.max(0.0) / state.count as f64).powf(0.25))
    }

    /// Cross power from the batch formula over the in-window samples
    #[must_use]
    pub fn xp_external(&self) -> Option<f64> {
        calc_xp(&self.samples.numeric_values(), 1.0 / self.sample_interval())
    }

    fn fill_gap(&mut self, prev: f64, gap: f64, ideal: f64, fill: SampleValue) {
        let mut step: u64 = 1;
        loop {
            let offset = step as f64 * ideal;
            if offset >= gap {
                break;
            }
            self.append(prev + offset, fill);
            step += 1;
        }
    }

    #[cfg(test)]
    fn recorded_totals(&self) -> (f64, f64, f64, usize) {
        let offset = self.samples.offset();
        let in_window = &self.contributions[offset..];
        let joules = in_window.iter().skip(1).map(|c| c.joules).sum();
        let np = in_window.iter().map(|c| c.np_quartic).sum();
        let xp = in_window.iter().map(|c| c.xp_total).sum();
        let count = in_window.iter().map(|c| c.xp_count).sum();
        (joules, np, xp, count)
    }
}

impl Window for PowerWindow {
    fn samples(&self) -> &Samples {
        &self.samples
    }

    fn is_full(&self, lookahead: usize) -> bool {
        self.period
            .is_some_and(|period| self.samples.elapsed(lookahead) >= period)
    }

    fn push_sample(&mut self, ts: f64, value: SampleValue) {
        let v = value.value();
        let gap = self.samples.last_time(false).map_or(0.0, |prev| ts - prev);
        let mut entry = Contribution {
            joules: v * gap,
            ..Contribution::default()
        };
        self.joules += entry.joules;
        if let Some(state) = self.inline_np.as_mut() {
            state.push(v, &mut entry);
        }
        if let Some(state) = self.inline_xp.as_mut() {
            state.push(ts, v, &mut entry);
        }
        self.contributions.push(entry);
        self.samples.push(ts, value);
    }

    fn shift(&mut self) {
        let Some(idx) = self.samples.advance() else {
            return;
        };
        // The new first sample's energy no longer falls inside the window
        if let Some(next) = self.contributions.get(idx + 1) {
            self.joules -= next.joules;
        }
        let Some(evicted) = self.contributions.get(idx).copied() else {
            return;
        };
        if let Some(state) = self.inline_np.as_mut() {
            state.total -= evicted.np_quartic;
        }
        if let Some(state) = self.inline_xp.as_mut() {
            state.forget(&evicted);
        }
    }

    fn pop(&mut self) {
        let offset = self.samples.offset();
        let Some((idx, value)) = self.samples.pop_back() else {
            return;
        };
        let Some(entry) = self.contributions.pop() else {
            return;
        };
        if idx > offset {
            self.joules -= entry.joules;
        }
        if let Some(state) = self.inline_np.as_mut() {
            state.undo(value.value(), &entry);
        }
        if let Some(state) = self.inline_xp.as_mut() {
            state.undo(&entry);
        }
    }

    fn copy(&self) -> Self {
        let (samples, start) = self.samples.tail_copy();
        Self {
            period: self.period,
            ideal_gap: self.ideal_gap,
            max_gap: self.max_gap,
            samples,
            contributions: self.contributions[start..].to_vec(),
            joules: self.joules,
            inline_np: self.inline_np.clone(),
            inline_xp: self.inline_xp.clone(),
        }
    }

    fn add(&mut self, ts: f64, value: f64) -> f64 {
        if let (Some(prev), Some(ideal)) = (self.samples.last_retained_time(), self.ideal_gap) {
            let gap = ts - prev;
            if self.max_gap.is_some_and(|max| gap > max) {
                self.fill_gap(prev, gap, ideal, SampleValue::Zero);
            } else if gap > ideal {
                self.fill_gap(prev, gap, ideal, SampleValue::Pad(value));
            }
        }
        self.append(ts, SampleValue::Real(value));
        value
    }
}

/// Normalized power of an evenly sampled stream
///
/// `None` when the stream covers less than five minutes or the sample rate is
/// too low to hold two samples in a 30 second rolling window.
#[must_use]
pub fn calc_np(values: &[f64], sample_rate: f64) -> Option<f64> {
    let rate = if sample_rate.is_finite() && sample_rate > 0.0 {
        sample_rate
    } else {
        1.0
    };
    if (values.len() as f64) / rate < NP_MIN_TIME_SECS {
        return None;
    }
    let rolling_size = (NP_ROLLING_SECS * rate).round() as usize;
    if rolling_size < 2 {
        return None;
    }
    let mut rolling = vec![0.0; rolling_size];
    let mut sum = 0.0;
    let mut total = 0.0;
    for (count, &watts) in values.iter().enumerate() {
        let slot = count % rolling_size;
        sum += watts - rolling[slot];
        rolling[slot] = watts;
        total += quartic(sum / rolling_size.min(count + 1) as f64);
    }
    Some((total / values.len() as f64).powf(0.25))
}

/// Cross power of an evenly sampled stream
///
/// `None` when the stream covers less than five minutes.
#[must_use]
pub fn calc_xp(values: &[f64], sample_rate: f64) -> Option<f64> {
    let rate = if sample_rate.is_finite() && sample_rate > 0.0 {
        sample_rate
    } else {
        1.0
    };
    if (values.len() as f64) / rate < XP_MIN_TIME_SECS {
        return None;
    }
    let sample_interval = 1.0 / rate;
    let samples_per_window = XP_WINDOW_SECS / sample_interval;
    let attenuation = samples_per_window / (samples_per_window + sample_interval);
    let sample_weight = sample_interval / (samples_per_window + sample_interval);
    let mut prev_time = 0.0;
    let mut weighted: f64 = 0.0;
    let mut total = 0.0;
    let mut count: usize = 0;
    for (i, &watts) in values.iter().enumerate() {
        let time = i as f64 * sample_interval;
        while weighted > XP_NEGLIGIBLE && time > prev_time + sample_interval + XP_EPSILON {
            weighted *= attenuation;
            prev_time += sample_interval;
            total += quartic(weighted);
            count += 1;
        }
        weighted = weighted.mul_add(attenuation, sample_weight * watts);
        prev_time = time;
        total += quartic(weighted);
        count += 1;
    }
    if count == 0 {
        return Some(0.0);
    }
    Some((total / count as f64).powf(0.25))
}

/// Training stress score
#[must_use]
pub fn calc_tss(power: f64, duration: f64, ftp: f64) -> f64 {
    let joules = power * duration;
    let ftp_hour_joules = ftp * SECONDS_PER_HOUR;
    let intensity = power / ftp;
    ((joules * intensity) / ftp_hour_joules) * 100.0
}

/// Highest average power window of `period` seconds
///
/// Gaps are derived from `times` when not supplied.
///
/// # Errors
///
/// Returns `InvalidInput` when `times` and `watts` differ in length.
pub fn peak_power(
    period: f64,
    times: &[f64],
    watts: &[f64],
    gaps: Option<TimeGaps>,
) -> AppResult<Option<PowerWindow>> {
    let Some(window) = PowerWindow::for_stream(Some(period), times, gaps) else {
        return Ok(None);
    };
    import_reduce(window, times, watts, |cur, lead| ge(cur.avg(), lead.avg()))
}

/// Highest normalized power window of `period` seconds
///
/// # Errors
///
/// Returns `InvalidInput` when `times` and `watts` differ in length.
pub fn peak_np(
    period: f64,
    times: &[f64],
    watts: &[f64],
    gaps: Option<TimeGaps>,
) -> AppResult<Option<PowerWindow>> {
    let Some(window) = PowerWindow::for_stream(Some(period), times, gaps) else {
        return Ok(None);
    };
    import_reduce(window.with_inline_np(), times, watts, |cur, lead| {
        ge(cur.np(), lead.np())
    })
}

/// Highest cross power window of `period` seconds
///
/// # Errors
///
/// Returns `InvalidInput` when `times` and `watts` differ in length.
pub fn peak_xp(
    period: f64,
    times: &[f64],
    watts: &[f64],
    gaps: Option<TimeGaps>,
) -> AppResult<Option<PowerWindow>> {
    let Some(window) = PowerWindow::for_stream(Some(period), times, gaps) else {
        return Ok(None);
    };
    import_reduce(window.with_inline_xp(), times, watts, |cur, lead| {
        ge(cur.xp(), lead.xp())
    })
}

/// Ingest a whole activity's power stream into one gap-corrected window
///
/// Missing gaps are derived from `times`. `None` for fewer than two samples.
///
/// # Errors
///
/// Returns `InvalidInput` when `times` and `watts` differ in length.
pub fn corrected_power(
    times: &[f64],
    watts: &[f64],
    ideal_gap: Option<f64>,
    max_gap: Option<f64>,
) -> AppResult<Option<PowerWindow>> {
    if times.len() < 2 {
        return Ok(None);
    }
    let (ideal, max) = match (ideal_gap, max_gap) {
        (Some(ideal), Some(max)) => (ideal, max),
        _ => {
            let Some(gaps) = recommended_time_gaps(times) else {
                return Ok(None);
            };
            (ideal_gap.unwrap_or(gaps.ideal), max_gap.unwrap_or(gaps.max))
        }
    };
    let mut window = PowerWindow::new(None, Some(ideal), Some(max));
    window.import_data(times, watts)?;
    Ok(Some(window))
}
