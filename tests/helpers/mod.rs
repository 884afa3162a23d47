// ABOUTME: Shared fixtures for integration tests
// ABOUTME: Athletes, activities with preset TSS and synthetic activity streams
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};
use trainload::config::ProcessingConfig;
use trainload::models::{
    Activity, ActivityId, ActivityStats, Athlete, AthleteId, BaseType, HistoryValue, HrZones,
    StreamKind, StreamRecord,
};

pub const ATHLETE: AthleteId = AthleteId(7);

/// UTC timestamp on a day of March 2024
pub fn march(day: u32, hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, day, hour, 0, 0).unwrap()
}

/// Athlete with FTP 200, weight 70kg and LTHR 160
pub fn athlete() -> Athlete {
    let mut athlete = Athlete::new(ATHLETE);
    let since = Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap();
    athlete.ftp_history.push(HistoryValue {
        ts: since,
        value: 200.0,
    });
    athlete.weight_history.push(HistoryValue {
        ts: since,
        value: 70.0,
    });
    athlete.hr_zones = Some(HrZones {
        z1: 120.0,
        z2: 140.0,
        z3: 150.0,
        z4: 170.0,
    });
    athlete
}

pub fn activity(id: u64, ts: DateTime<Utc>, base_type: BaseType) -> Activity {
    Activity::new(ActivityId(id), ATHLETE, ts, base_type)
}

/// Ride whose stats already carry a power TSS
pub fn activity_with_tss(id: u64, ts: DateTime<Utc>, tss: f64) -> Activity {
    let mut a = activity(id, ts, BaseType::Ride);
    a.stats = Some(ActivityStats {
        active_time: 3600.0,
        tss: Some(tss),
        ..ActivityStats::default()
    });
    a
}

/// 1Hz time stream covering `seconds`
pub fn seconds(seconds: u32) -> Vec<f64> {
    (0..=seconds).map(f64::from).collect()
}

pub fn stream(activity: &Activity, stream: StreamKind, data: Vec<f64>) -> StreamRecord {
    StreamRecord {
        activity: activity.id,
        athlete: activity.athlete,
        stream,
        data,
    }
}

/// Default configuration in UTC with the standard forward horizon
pub fn config() -> ProcessingConfig {
    ProcessingConfig::default()
}

pub fn assert_close(actual: f64, expected: f64, tolerance: f64) {
    assert!(
        (actual - expected).abs() <= tolerance,
        "expected {expected}, got {actual}"
    );
}
