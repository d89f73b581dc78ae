//! Status inference: reconcile what the last writer declared with what is
//! physically present in the job directory.
//!
//! Job record and manifest are written separately, and a worker can die
//! between writing outputs and writing the final status. Everyone who needs
//! a job's status (the worker's discovery pass as well as external readers)
//! goes through [`infer_status`] instead of trusting the raw field.

use surface_core::artifacts;
use surface_core::paths::{JobLocation, SurfaceLayout};
use surface_core::status::JobStatus;

use crate::repositories::JobRepo;

/// Authoritative status of a job.
///
/// Only `job.json` and the required artifacts are consulted; the manifest is
/// never assumed to agree with the job record. A job with no record at all
/// reads as `queued`, so callers that care about existence must check it.
pub fn infer_status(layout: &SurfaceLayout, location: &JobLocation) -> JobStatus {
    let declared = JobRepo::read_declared_status(&layout.job_json_path(location));
    let outputs_present = artifacts::all_present(&layout.resolve_job_directory(location));
    reconcile(declared, outputs_present)
}

/// Conflict-resolution rule between a declared status (`None` when the
/// stored value is unrecognized) and artifact evidence.
///
/// - terminal declarations stand as written;
/// - `queued` or `running` with every output present is `complete`;
/// - otherwise the declaration stands, and an unrecognized one is treated
///   as in flight so no worker claims it.
pub fn reconcile(declared: Option<JobStatus>, outputs_present: bool) -> JobStatus {
    match declared {
        Some(status) if status.is_terminal() => status,
        _ if outputs_present => JobStatus::Complete,
        Some(status) => status,
        None => JobStatus::Running,
    }
}
