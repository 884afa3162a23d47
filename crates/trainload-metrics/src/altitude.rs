// ABOUTME: Altitude gain with hysteresis thresholding to ignore small elevation noise
// ABOUTME: Returns cumulative ascent per sample and the total gain for an activity
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

/// Cumulative ascent at each sample
///
/// A climb is only counted once altitude rises `hysteresis_m` above the current
/// reference; a drop of the same amount moves the reference down. A non-positive
/// hysteresis counts every positive step.
#[must_use]
pub fn cumulative_ascent(altitude: &[f64], hysteresis_m: f64) -> Vec<f64> {
    let Some(&first) = altitude.first() else {
        return Vec::new();
    };
    let threshold = hysteresis_m.max(0.0);
    let mut out = Vec::with_capacity(altitude.len());
    let mut gain = 0.0;
    let mut reference = first;
    let mut previous = first;
    out.push(0.0);
    for &z in &altitude[1..] {
        if threshold <= 0.0 {
            if z > previous {
                gain += z - previous;
            }
        } else if z >= reference + threshold {
            gain += z - reference;
            reference = z;
        } else if z <= reference - threshold {
            reference = z;
        }
        previous = z;
        out.push(gain);
    }
    out
}

/// Total ascent in meters, `None` for an empty stream
#[must_use]
pub fn altitude_gain(altitude: &[f64], hysteresis_m: f64) -> Option<f64> {
    cumulative_ascent(altitude, hysteresis_m).last().copied()
}
