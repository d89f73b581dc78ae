//! The `job.json` record.

use serde::{Deserialize, Serialize};
use surface_core::status::JobStatus;
use surface_core::types::{self, JsonMap, Timestamp};

/// Error code recorded when processing fails for any reason.
pub const ERROR_CODE_WORKER_EXCEPTION: &str = "worker_exception";

/// Detail recorded alongside [`ERROR_CODE_WORKER_EXCEPTION`].
pub const ERROR_DETAIL_WORKER_LOOP: &str = "worker loop failed";

/// The `error` object of a failed job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobFailure {
    pub message: String,
    pub code: String,
    pub detail: String,
}

impl JobFailure {
    /// Failure raised while the worker was processing the job.
    pub fn worker_exception(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code: ERROR_CODE_WORKER_EXCEPTION.to_string(),
            detail: ERROR_DETAIL_WORKER_LOOP.to_string(),
        }
    }
}

/// Full contents of `job.json`.
///
/// `created_at` is kept as the text the job-creation API wrote, so rewrites
/// never change its format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobRecord {
    pub status: JobStatus,
    pub created_at: String,
    pub updated_at: Timestamp,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<Timestamp>,
    #[serde(default)]
    pub params: JsonMap,
    #[serde(default)]
    pub artifacts: JsonMap,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<JobFailure>,
}

impl JobRecord {
    /// `created_at` as a timestamp, if it parses.
    pub fn created_time(&self) -> Option<Timestamp> {
        types::parse_timestamp(&self.created_at)
    }
}

/// The parts of a job record every rewrite carries forward.
#[derive(Debug, Clone, PartialEq)]
pub struct JobState {
    /// Original `created_at` text, never reformatted.
    pub created_at: String,
    pub params: JsonMap,
    pub artifacts: JsonMap,
}

impl JobState {
    /// State for a job whose record is missing or unreadable.
    pub fn fresh(now: Timestamp) -> Self {
        Self {
            created_at: types::format_timestamp(now),
            params: JsonMap::new(),
            artifacts: JsonMap::new(),
        }
    }

    fn record(&self, status: JobStatus, now: Timestamp) -> JobRecord {
        JobRecord {
            status,
            created_at: self.created_at.clone(),
            updated_at: now,
            finished_at: None,
            params: self.params.clone(),
            artifacts: self.artifacts.clone(),
            error: None,
        }
    }

    /// `queued` record, as written by the job-creation API.
    pub fn queued(&self, now: Timestamp) -> JobRecord {
        self.record(JobStatus::Queued, now)
    }

    /// `running` record; not terminal, so no `finished_at`.
    pub fn running(&self, now: Timestamp) -> JobRecord {
        self.record(JobStatus::Running, now)
    }

    /// `complete` record finished at `now`.
    pub fn complete(&self, now: Timestamp) -> JobRecord {
        JobRecord {
            finished_at: Some(now),
            ..self.record(JobStatus::Complete, now)
        }
    }

    /// `failed` record finished at `now` with the given error.
    pub fn failed(&self, now: Timestamp, failure: JobFailure) -> JobRecord {
        JobRecord {
            finished_at: Some(now),
            error: Some(failure),
            ..self.record(JobStatus::Failed, now)
        }
    }
}
