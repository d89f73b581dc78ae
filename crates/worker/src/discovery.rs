//! Finding queued jobs under the assets root.
//!
//! A job directory is either `<root>/<job_id>/` or
//! `<root>/<subfolder>/<job_id>/`, so `job.json` sits at depth 2 or 3.

use std::collections::HashSet;
use std::ffi::OsStr;

use surface_core::paths::{JobLocation, SurfaceLayout, JOB_JSON_FILENAME};
use surface_core::status::JobStatus;
use surface_store::infer_status;
use surface_store::repositories::JobRepo;
use walkdir::WalkDir;

/// Every job that is both declared and inferred `queued`, in walk order.
///
/// Directories whose names are not valid identifiers are skipped. A job is
/// listed at most once.
pub fn discover_queued_jobs(layout: &SurfaceLayout) -> Vec<JobLocation> {
    let mut seen = HashSet::new();
    let mut queued = Vec::new();

    let walker = WalkDir::new(layout.root())
        .min_depth(2)
        .max_depth(3)
        .sort_by_file_name();

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                tracing::debug!(error = %e, "Skipping unreadable entry during discovery");
                continue;
            }
        };
        if !entry.file_type().is_file() || entry.file_name() != OsStr::new(JOB_JSON_FILENAME) {
            continue;
        }

        let path = entry.path();
        let Some(location) = layout.locate(path) else {
            tracing::warn!(path = %path.display(), "Skipping job with unaddressable directory");
            continue;
        };

        if JobRepo::read_declared_status(path) != Some(JobStatus::Queued) {
            continue;
        }
        let inferred = infer_status(layout, &location);
        if inferred != JobStatus::Queued {
            tracing::debug!(
                job_id = %location.job_id,
                subfolder = location.subfolder_label(),
                inferred = %inferred,
                "Declared queued but inferred otherwise; skipping",
            );
            continue;
        }

        if seen.insert(location.clone()) {
            queued.push(location);
        }
    }

    queued
}
