// ABOUTME: Integration tests for loading JSON activity bundles into in-memory stores
// ABOUTME: Exercises file reading, athlete validation and stream fan-out
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

use std::io::Write;

use serde_json::json;
use tempfile::NamedTempFile;
use trainload::errors::ErrorCode;
use trainload::import::ActivityBundle;
use trainload::models::{ActivityId, AthleteId, BaseType, StreamKind};
use trainload::storage::{ActivityStore, StreamKey, StreamStore};

fn bundle_json(second_athlete: u64) -> String {
    json!({
        "athlete": {
            "id": 7,
            "ftp_history": [{"ts": "2024-01-01T00:00:00Z", "value": 250.0}],
            "weight_history": [{"ts": "2024-01-01T00:00:00Z", "value": 68.0}]
        },
        "activities": [
            {
                "id": 1,
                "athlete": 7,
                "ts": "2024-03-01T08:00:00Z",
                "base_type": "ride",
                "streams": {
                    "time": [0.0, 1.0, 2.0],
                    "watts": [200.0, 210.0, 190.0]
                }
            },
            {
                "id": 2,
                "athlete": second_athlete,
                "ts": "2024-03-02T08:00:00Z",
                "base_type": "run"
            }
        ]
    })
    .to_string()
}

#[tokio::test]
async fn test_bundle_file_populates_both_stores() {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(bundle_json(7).as_bytes()).unwrap();

    let bundle = ActivityBundle::from_path(file.path()).await.unwrap();
    assert_eq!(bundle.athlete.id, AthleteId(7));
    let loaded = bundle.into_stores().await.unwrap();

    assert_eq!(loaded.activities.len(), 2);
    assert_eq!(loaded.activities[1].base_type, BaseType::Run);
    assert_eq!(
        loaded.athlete.ftp_at(loaded.activities[0].ts),
        Some(250.0)
    );
    let stored = loaded
        .activity_store
        .get(ActivityId(1))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored, loaded.activities[0]);

    let streams = loaded
        .stream_store
        .get_many(&[StreamKey {
            activity: ActivityId(1),
            stream: StreamKind::Watts,
        }])
        .await
        .unwrap();
    assert_eq!(
        streams[0].as_ref().map(|r| r.data.clone()),
        Some(vec![200.0, 210.0, 190.0])
    );
}

#[test]
fn test_foreign_activity_is_rejected() {
    let err = ActivityBundle::from_json(&bundle_json(8)).unwrap_err();
    assert_eq!(err.code, ErrorCode::InvalidInput);
    assert_eq!(err.context.resource_id.as_deref(), Some("2"));
}

#[test]
fn test_malformed_json_is_a_serialization_error() {
    let err = ActivityBundle::from_json("{\"athlete\": ").unwrap_err();
    assert_eq!(err.code, ErrorCode::SerializationError);
}

#[tokio::test]
async fn test_missing_file_is_a_storage_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = ActivityBundle::from_path(&dir.path().join("absent.json"))
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::StorageError);
}
