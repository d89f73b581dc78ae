//! Artifact producer interface and shared types.
//!
//! Defines [`SurfaceGenerator`], the trait every producer implements, along
//! with [`GenerationRequest`] and [`GenerationError`].

use std::io;
use std::path::{Path, PathBuf};

use surface_core::paths::JobLocation;
use surface_core::types::JsonMap;

/// Everything a producer needs to generate one job's outputs.
#[derive(Debug, Clone, Copy)]
pub struct GenerationRequest<'a> {
    pub location: &'a JobLocation,
    /// Absolute job directory; outputs go underneath it.
    pub job_dir: &'a Path,
    /// Opaque job parameters from `job.json`.
    pub params: &'a JsonMap,
}

/// Errors a producer can report.
#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error("I/O error writing {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to encode {path}: {source}")]
    Encode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("{0}")]
    Failed(String),
}

/// A step that writes a job's output files.
///
/// Contract: before returning `Ok`, every file in
/// [`REQUIRED_ARTIFACTS`](surface_core::artifacts::REQUIRED_ARTIFACTS) must
/// exist under `request.job_dir` and be non-empty. The worker re-checks this
/// itself and does not rely on the return value alone.
pub trait SurfaceGenerator: Send + Sync {
    /// Write all outputs for `request`.
    fn generate(
        &self,
        request: GenerationRequest<'_>,
    ) -> impl std::future::Future<Output = Result<(), GenerationError>> + Send;
}
