// ABOUTME: JSON activity bundle import: one athlete, their activities and raw streams
// ABOUTME: Loads a bundle from disk and materializes populated in-memory stores
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Bundle format:
//!
//! ```json
//! {
//!   "athlete": { "id": 1, "ftp_history": [{ "ts": "2024-01-01T00:00:00Z", "value": 250 }] },
//!   "activities": [
//!     { "id": 10, "athlete": 1, "ts": "2024-03-01T08:00:00Z", "base_type": "ride",
//!       "streams": { "time": [0, 1, 2], "watts": [200, 210, 205] } }
//!   ]
//! }
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tokio::fs;
use tracing::info;

use crate::errors::{AppError, AppResult};
use crate::models::{Activity, Athlete, StreamKind, StreamRecord};
use crate::storage::{ActivityStore, MemoryActivityStore, MemoryStreamStore, StreamStore};

/// One activity of a bundle with its raw streams
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BundleActivity {
    /// Activity fields
    #[serde(flatten)]
    pub activity: Activity,
    /// Raw streams keyed by name
    #[serde(default)]
    pub streams: BTreeMap<StreamKind, Vec<f64>>,
}

/// One athlete's activities and streams
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityBundle {
    /// Athlete profile
    pub athlete: Athlete,
    /// Activities with streams
    #[serde(default)]
    pub activities: Vec<BundleActivity>,
}

/// A bundle loaded into in-memory stores
pub struct LoadedBundle {
    /// Athlete profile
    pub athlete: Athlete,
    /// Activities in bundle order
    pub activities: Vec<Activity>,
    /// Store holding every activity
    pub activity_store: MemoryActivityStore,
    /// Store holding every stream
    pub stream_store: MemoryStreamStore,
}

impl ActivityBundle {
    /// Parse a bundle from JSON text
    ///
    /// # Errors
    ///
    /// Returns `SerializationError` for malformed JSON and `InvalidInput` when an
    /// activity belongs to a different athlete.
    pub fn from_json(text: &str) -> AppResult<Self> {
        let bundle: Self = serde_json::from_str(text)?;
        bundle.validate()?;
        Ok(bundle)
    }

    /// Read and parse a bundle file
    ///
    /// # Errors
    ///
    /// Returns `StorageError` when the file cannot be read, plus the errors of [`Self::from_json`].
    pub async fn from_path(path: &Path) -> AppResult<Self> {
        let text = fs::read_to_string(path).await.map_err(|e| {
            AppError::storage(format!("failed to read bundle {}: {e}", path.display())).with_source(e)
        })?;
        Self::from_json(&text)
    }

    fn validate(&self) -> AppResult<()> {
        if let Some(stray) = self
            .activities
            .iter()
            .find(|entry| entry.activity.athlete != self.athlete.id)
        {
            return Err(AppError::invalid_input(format!(
                "activity {} belongs to athlete {}, bundle is for athlete {}",
                stray.activity.id, stray.activity.athlete, self.athlete.id
            ))
            .with_resource_id(stray.activity.id.to_string()));
        }
        Ok(())
    }

    /// Populate fresh in-memory stores with the bundle contents
    ///
    /// # Errors
    ///
    /// Returns the stores' errors.
    pub async fn into_stores(self) -> AppResult<LoadedBundle> {
        let activity_store = MemoryActivityStore::new();
        let stream_store = MemoryStreamStore::new();
        let mut activities = Vec::with_capacity(self.activities.len());
        let mut records = Vec::new();
        for entry in self.activities {
            for (stream, data) in entry.streams {
                records.push(StreamRecord {
                    activity: entry.activity.id,
                    athlete: entry.activity.athlete,
                    stream,
                    data,
                });
            }
            activities.push(entry.activity);
        }
        activity_store.save_many(&activities).await?;
        let stream_count = records.len();
        stream_store.put_many(records).await?;
        info!(
            athlete_id = %self.athlete.id,
            activities = activities.len(),
            streams = stream_count,
            "Loaded activity bundle"
        );
        Ok(LoadedBundle {
            athlete: self.athlete,
            activities,
            activity_store,
            stream_store,
        })
    }
}
