//! Repository for `job_manifest.json`.

use surface_core::paths::{JobLocation, SurfaceLayout};

use crate::atomic::write_json_atomic;
use crate::error::StoreError;
use crate::models::manifest::{ManifestRecord, ManifestUpdate};

/// Provides read/write operations for job manifests.
pub struct ManifestRepo;

impl ManifestRepo {
    /// Strict read of a manifest. `Ok(None)` if the file does not exist.
    pub fn find(
        layout: &SurfaceLayout,
        location: &JobLocation,
    ) -> Result<Option<ManifestRecord>, StoreError> {
        let path = layout.manifest_path(location);
        let bytes = match std::fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(StoreError::io(&path, e)),
        };
        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|e| StoreError::json(&path, e))
    }

    /// Merge `update` into the existing manifest and replace it atomically.
    ///
    /// Keys not named in the update keep their stored values, whatever their
    /// shape. Only a manifest that is not a JSON object at all is replaced
    /// rather than blocking the write. `job_id` and `public_root` are always
    /// refreshed from the job location.
    pub fn write(
        layout: &SurfaceLayout,
        location: &JobLocation,
        update: &ManifestUpdate,
    ) -> Result<ManifestRecord, StoreError> {
        let mut manifest = match Self::find(layout, location) {
            Ok(existing) => existing.unwrap_or_default(),
            Err(e) => {
                tracing::warn!(job_id = %location.job_id, error = %e, "Replacing unreadable manifest");
                ManifestRecord::default()
            }
        };

        manifest.set_identity(
            location.job_id.as_str(),
            &layout.resolve_public_path(location),
        );
        manifest.apply(update);

        write_json_atomic(&layout.manifest_path(location), &manifest)?;
        Ok(manifest)
    }
}
