// ABOUTME: Acute and chronic training load (ATL/CTL) exponential decay over daily stress
// ABOUTME: Also provides heart-rate based training stress for activities without power
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Training load
//!
//! Daily stress feeds two exponentially weighted averages:
//!
//! `new = old + (tss - old) * (1 - exp(-1 / days))`
//!
//! with 7 days for ATL (fatigue) and 42 days for CTL (fitness). A day without
//! training is a day with zero stress, so gaps drain both loads.

use trainload_core::constants::training_load::{ATL_DAYS, CTL_DAYS};

/// One day of decay toward `tss` with time constant `days`
#[must_use]
pub fn decay(prev: f64, tss: f64, days: f64) -> f64 {
    (tss - prev).mul_add(1.0 - (-1.0 / days).exp(), prev)
}

/// Acute training load after applying each day's stress in order, starting from `seed`
#[must_use]
pub fn calc_atl(daily_tss: &[f64], seed: f64) -> f64 {
    daily_tss
        .iter()
        .fold(seed, |load, &tss| decay(load, tss, ATL_DAYS))
}

/// Chronic training load after applying each day's stress in order, starting from `seed`
#[must_use]
pub fn calc_ctl(daily_tss: &[f64], seed: f64) -> f64 {
    daily_tss
        .iter()
        .fold(seed, |load, &tss| decay(load, tss, CTL_DAYS))
}

/// Heart-rate training stress
///
/// `hours * (avg_hr / lthr)^2 * 100`, with the average taken over active
/// samples and `active_secs` the activity's active time (see
/// [`active_time`](crate::data::active_time)). `None` without usable data.
#[must_use]
pub fn hr_tss(heartrate: &[f64], active: Option<&[f64]>, active_secs: f64, lthr: f64) -> Option<f64> {
    if lthr <= 0.0 {
        return None;
    }
    let is_active = |idx: usize| active.is_none_or(|flags| flags.get(idx).is_some_and(|f| *f != 0.0));
    let (sum, count) = heartrate
        .iter()
        .enumerate()
        .filter(|(idx, hr)| is_active(*idx) && **hr > 0.0)
        .fold((0.0, 0_usize), |(sum, count), (_, hr)| (sum + hr, count + 1));
    if count == 0 {
        return None;
    }
    let avg_hr = sum / count as f64;
    let hours = active_secs / 3600.0;
    let ratio = avg_hr / lthr;
    Some(hours * ratio * ratio * 100.0)
}
