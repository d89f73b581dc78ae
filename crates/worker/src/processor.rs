//! Processing a single job from `queued` to a terminal state.
//!
//! [`run_surface_job`] is the happy path and returns the first error it
//! hits. [`process_job`] wraps it and turns any error into a `failed`
//! record, so a job never stays `running` after the worker returns.

use std::path::Path;

use surface_core::artifacts::{self, ENCLOSURE_MESH, HEIGHTMAP, REQUIRED_ARTIFACTS};
use surface_core::config::SurfaceConfig;
use surface_core::geometry::{self, GeometryReport};
use surface_core::paths::JobLocation;
use surface_core::status::JobStatus;
use surface_core::types::{self, JsonMap};
use surface_pipeline::{GenerationRequest, SurfaceGenerator};
use surface_store::models::job::{JobFailure, JobRecord};
use surface_store::models::manifest::ManifestUpdate;
use surface_store::repositories::{JobRepo, ManifestRepo};
use surface_store::StoreError;

use crate::error::JobError;

/// Drive one job to `complete`.
///
/// Writes `running`, invokes the generator, checks that every required
/// output exists, runs the geometry gate, then writes `complete` with
/// public artifact URLs and the geometry report. The manifest is bumped
/// after each job-record write.
pub async fn run_surface_job<G: SurfaceGenerator>(
    config: &SurfaceConfig,
    generator: &G,
    location: &JobLocation,
) -> Result<JobRecord, JobError> {
    let layout = &config.layout;
    let state = JobRepo::read_state(layout, location);

    JobRepo::write(layout, location, &state.running(types::now()))?;
    bump_manifest(config, location, &state.params)?;
    tracing::info!(
        job_id = %location.job_id,
        subfolder = location.subfolder_label(),
        "Job running",
    );

    let job_dir = layout.resolve_job_directory(location);
    generator
        .generate(GenerationRequest {
            location,
            job_dir: &job_dir,
            params: &state.params,
        })
        .await?;

    if let Some(path) = artifacts::first_missing(&job_dir) {
        return Err(JobError::MissingOutput { path });
    }

    let report = check_geometry(config, &job_dir)?;
    if let Some(reason) = report.reason.filter(|_| !report.passed) {
        return Err(JobError::GeometryRejected { reason });
    }

    let public_root = layout.resolve_public_path(location);
    let mut published = state;
    for artifact in REQUIRED_ARTIFACTS {
        published.artifacts.insert(
            artifact.key.to_string(),
            artifact.public_url(&public_root).into(),
        );
    }
    published
        .artifacts
        .insert("geometry".to_string(), report.to_json());

    let record = published.complete(types::now());
    JobRepo::write(layout, location, &record)?;
    bump_manifest(config, location, &record.params)?;

    tracing::info!(
        job_id = %location.job_id,
        subfolder = location.subfolder_label(),
        triangles = report.metadata.as_ref().map_or(0, |m| m.triangles),
        "Job complete",
    );
    Ok(record)
}

/// Run a job and record any failure. Returns the job's final status.
///
/// Never propagates: if even the failure cannot be recorded, the error is
/// logged and `Failed` is still returned.
pub async fn process_job<G: SurfaceGenerator>(
    config: &SurfaceConfig,
    generator: &G,
    location: &JobLocation,
) -> JobStatus {
    match run_surface_job(config, generator, location).await {
        Ok(record) => record.status,
        Err(err) => {
            tracing::error!(
                job_id = %location.job_id,
                subfolder = location.subfolder_label(),
                error = %err,
                "Job failed",
            );
            if let Err(e) = mark_failed(config, location, &err) {
                tracing::error!(
                    job_id = %location.job_id,
                    error = %e,
                    "Failed to record job failure",
                );
            }
            JobStatus::Failed
        }
    }
}

/// Write a terminal `failed` record for `err` and bump the manifest.
///
/// Re-reads the record first so `created_at` and `params` survive whatever
/// the failed run left behind.
pub fn mark_failed(
    config: &SurfaceConfig,
    location: &JobLocation,
    err: &JobError,
) -> Result<JobRecord, StoreError> {
    let layout = &config.layout;
    let state = JobRepo::read_state(layout, location);
    let record = state.failed(types::now(), JobFailure::worker_exception(err.to_string()));
    JobRepo::write(layout, location, &record)?;
    bump_manifest(config, location, &record.params)?;
    Ok(record)
}

fn bump_manifest(
    config: &SurfaceConfig,
    location: &JobLocation,
    params: &JsonMap,
) -> Result<(), StoreError> {
    let update = ManifestUpdate::from_params(types::now(), params);
    ManifestRepo::write(&config.layout, location, &update).map(|_| ())
}

fn check_geometry(
    config: &SurfaceConfig,
    job_dir: &Path,
) -> Result<GeometryReport, JobError> {
    let thresholds = &config.geometry;
    let heightmap_range = geometry::sample_heightmap_range(
        &HEIGHTMAP.path_in(job_dir),
        thresholds.heightmap_sample_px,
    )?;
    let report = geometry::evaluate_geometry(
        &ENCLOSURE_MESH.path_in(job_dir),
        heightmap_range,
        thresholds.min_displacement_mm,
        thresholds.non_uniform_threshold,
    )?;
    tracing::debug!(
        passed = report.passed,
        reason = report.reason.map(|r| r.as_str()),
        heightmap_range = ?heightmap_range,
        "Geometry evaluated",
    );
    Ok(report)
}
