//! Repository for `job.json`.
//!
//! Reads used by the lifecycle are best-effort: a missing or corrupt record
//! degrades to defaults so a half-written predecessor never blocks the next
//! write. Writes go through [`write_json_atomic`].

use std::path::Path;

use serde_json::Value;
use surface_core::paths::{JobLocation, SurfaceLayout};
use surface_core::status::JobStatus;
use surface_core::types::{self, JsonMap};

use crate::atomic::write_json_atomic;
use crate::error::StoreError;
use crate::models::job::{JobRecord, JobState};

/// Provides read/write operations for job records.
pub struct JobRepo;

impl JobRepo {
    /// Carry-forward state of a job: `created_at`, `params`, `artifacts`.
    ///
    /// Never fails. A missing, unreadable, or malformed record yields a fresh
    /// `created_at` and empty maps; individual bad fields fall back the same
    /// way. A present `created_at` string is carried verbatim, even when it
    /// does not parse.
    pub fn read_state(layout: &SurfaceLayout, location: &JobLocation) -> JobState {
        let path = layout.job_json_path(location);
        let Some(doc) = read_object(&path) else {
            return JobState::fresh(types::now());
        };

        let created_at = match doc.get("created_at").and_then(Value::as_str) {
            Some(raw) if !raw.trim().is_empty() => {
                if types::parse_timestamp(raw).is_none() {
                    tracing::warn!(
                        path = %path.display(),
                        created_at = raw,
                        "Job record created_at is not a timestamp; keeping it as written",
                    );
                }
                raw.to_string()
            }
            _ => {
                tracing::warn!(path = %path.display(), "Job record has no created_at");
                types::format_timestamp(types::now())
            }
        };

        JobState {
            created_at,
            params: object_field(&doc, "params"),
            artifacts: object_field(&doc, "artifacts"),
        }
    }

    /// Declared `status` of a job record, as its last writer claimed it.
    ///
    /// A missing, unreadable, or malformed file, or a blank status, reads as
    /// `queued`. An unrecognized status string yields `None`.
    pub fn read_declared_status(job_json: &Path) -> Option<JobStatus> {
        let Some(doc) = read_object(job_json) else {
            return Some(JobStatus::Queued);
        };
        match doc.get("status").and_then(Value::as_str).map(str::trim) {
            None | Some("") => Some(JobStatus::Queued),
            Some(raw) => match raw.parse() {
                Ok(status) => Some(status),
                Err(e) => {
                    tracing::debug!(path = %job_json.display(), error = %e, "Unrecognized job status");
                    None
                }
            },
        }
    }

    /// Strict read of a job record. `Ok(None)` if the file does not exist.
    pub fn find(
        layout: &SurfaceLayout,
        location: &JobLocation,
    ) -> Result<Option<JobRecord>, StoreError> {
        let path = layout.job_json_path(location);
        let bytes = match std::fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(StoreError::io(&path, e)),
        };
        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|e| StoreError::json(&path, e))
    }

    /// Replace the job record atomically.
    pub fn write(
        layout: &SurfaceLayout,
        location: &JobLocation,
        record: &JobRecord,
    ) -> Result<(), StoreError> {
        let path = layout.job_json_path(location);
        write_json_atomic(&path, record)?;
        tracing::debug!(
            job_id = %location.job_id,
            subfolder = location.subfolder_label(),
            status = %record.status,
            "Job record written",
        );
        Ok(())
    }
}

/// Parse `path` as a JSON object, or `None` on any failure.
fn read_object(path: &Path) -> Option<JsonMap> {
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) => {
            if e.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!(path = %path.display(), error = %e, "Job record unreadable");
            }
            return None;
        }
    };
    match serde_json::from_slice::<Value>(&bytes) {
        Ok(Value::Object(map)) => Some(map),
        Ok(_) => {
            tracing::warn!(path = %path.display(), "Job record is not a JSON object");
            None
        }
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Job record is malformed");
            None
        }
    }
}

fn object_field(doc: &JsonMap, key: &str) -> JsonMap {
    doc.get(key)
        .and_then(Value::as_object)
        .cloned()
        .unwrap_or_default()
}
