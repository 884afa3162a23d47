// ABOUTME: Criterion benchmarks for the rolling window searches
// ABOUTME: Measures peak power, peak NP, corrected power and parallel peak search on hour-long streams
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Criterion benchmarks for window searches over synthetic power streams.

#![allow(clippy::missing_docs_in_private_items, missing_docs)]

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use trainload::metrics::data::recommended_time_gaps;
use trainload::metrics::peaks::{find_peaks_parallel, PeakInput, PeakPeriods};
use trainload::metrics::power::{corrected_power, peak_np, peak_power};
use trainload::models::ActivityId;

/// One hour at 1Hz with a dropout every ten minutes
fn hour_stream() -> (Vec<f64>, Vec<f64>) {
    let mut times = Vec::with_capacity(3600);
    let mut watts = Vec::with_capacity(3600);
    let mut t = 0.0;
    for i in 0..3600_u32 {
        t += if i % 600 == 599 { 12.0 } else { 1.0 };
        times.push(t);
        let base = 220.0 + 60.0 * (f64::from(i) / 45.0).sin();
        watts.push(if i % 300 < 40 { base + 180.0 } else { base });
    }
    (times, watts)
}

fn bench_peak_power(c: &mut Criterion) {
    let (times, watts) = hour_stream();
    let gaps = recommended_time_gaps(&times);
    let mut group = c.benchmark_group("peak_power");
    group.throughput(Throughput::Elements(times.len() as u64));
    for period in [5.0, 60.0, 1200.0] {
        group.bench_with_input(BenchmarkId::from_parameter(period), &period, |b, &period| {
            b.iter(|| peak_power(black_box(period), black_box(&times), black_box(&watts), gaps));
        });
    }
    group.finish();
}

fn bench_peak_np(c: &mut Criterion) {
    let (times, watts) = hour_stream();
    let gaps = recommended_time_gaps(&times);
    c.bench_function("peak_np_1200", |b| {
        b.iter(|| peak_np(black_box(1200.0), black_box(&times), black_box(&watts), gaps));
    });
}

fn bench_corrected_power(c: &mut Criterion) {
    let (times, watts) = hour_stream();
    c.bench_function("corrected_power_hour", |b| {
        b.iter(|| corrected_power(black_box(&times), black_box(&watts), None, None));
    });
}

fn bench_parallel_peaks(c: &mut Criterion) {
    let (times, watts) = hour_stream();
    let inputs: Vec<PeakInput> = (0..16)
        .map(|id| PeakInput {
            activity: ActivityId(id),
            times: times.clone(),
            watts: Some(watts.clone()),
            distance: None,
            heartrate: None,
        })
        .collect();
    let periods = PeakPeriods {
        periods: vec![5.0, 60.0, 300.0, 1200.0],
        np_periods: vec![1200.0],
        distances: Vec::new(),
    };
    let mut group = c.benchmark_group("parallel_peaks");
    group.throughput(Throughput::Elements(inputs.len() as u64));
    group.sample_size(10);
    group.bench_function("16_activities", |b| {
        b.iter(|| find_peaks_parallel(black_box(&inputs), black_box(&periods)));
    });
    group.finish();
}

criterion_group!(
    benches,
    bench_peak_power,
    bench_peak_np,
    bench_corrected_power,
    bench_parallel_peaks
);
criterion_main!(benches);
