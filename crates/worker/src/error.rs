use std::path::PathBuf;

use surface_core::geometry::{GeometryError, GeometryFailure};
use surface_pipeline::GenerationError;
use surface_store::StoreError;

/// Anything that ends a processing run early. Every variant leaves the job
/// `failed`; the message is recorded verbatim.
#[derive(Debug, thiserror::Error)]
pub enum JobError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Generation failed: {0}")]
    Generation(#[from] GenerationError),

    #[error("Missing required output: {}", path.display())]
    MissingOutput { path: PathBuf },

    #[error("Geometry check failed: {0}")]
    Geometry(#[from] GeometryError),

    #[error("Geometry rejected: {}", reason.as_str())]
    GeometryRejected { reason: GeometryFailure },
}
