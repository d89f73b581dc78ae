//! Stand-in producer that writes small, well-formed outputs.
//!
//! Previews and the texture are flat-shaded RGB PNGs, the heightmap is a
//! horizontal gray ramp, and the enclosure is a binary STL box with real
//! Z relief. Everything it writes passes the geometry gate with default
//! thresholds.

use std::fs;
use std::path::Path;
use std::time::Duration;

use image::{GrayImage, Luma, Rgb, RgbImage};
use surface_core::artifacts::{
    RequiredArtifact, ENCLOSURE_MESH, HEIGHTMAP, REQUIRED_ARTIFACTS, TEXTURE,
};
use surface_core::target::SurfaceTarget;

use crate::generator::{GenerationError, GenerationRequest, SurfaceGenerator};

/// Edge length of every PNG the placeholder writes.
const IMAGE_SIZE_PX: u32 = 64;

/// Enclosure box footprint (X and Y) in millimetres.
const BOX_FOOTPRINT_MM: f32 = 40.0;

/// Enclosure box height in millimetres.
const BOX_HEIGHT_MM: f32 = 3.0;

/// Writes placeholder outputs after an optional simulated delay.
#[derive(Debug, Clone, Default)]
pub struct PlaceholderGenerator {
    work_delay: Duration,
}

impl PlaceholderGenerator {
    pub fn new(work_delay: Duration) -> Self {
        Self { work_delay }
    }

    pub fn work_delay(&self) -> Duration {
        self.work_delay
    }
}

impl SurfaceGenerator for PlaceholderGenerator {
    async fn generate(&self, request: GenerationRequest<'_>) -> Result<(), GenerationError> {
        if !self.work_delay.is_zero() {
            tokio::time::sleep(self.work_delay).await;
        }

        let target = SurfaceTarget::from_params(request.params);
        let base = base_color(target);

        for artifact in REQUIRED_ARTIFACTS {
            let path = artifact.path_in(request.job_dir);
            ensure_parent(&path)?;
            write_artifact(*artifact, &path, base)?;
        }

        tracing::debug!(
            job_id = %request.location.job_id,
            target = target.as_str(),
            dir = %request.job_dir.display(),
            "Placeholder outputs written",
        );
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Writers
// ---------------------------------------------------------------------------

fn base_color(target: SurfaceTarget) -> [u8; 3] {
    match target {
        SurfaceTarget::Tile => [182, 160, 128],
        SurfaceTarget::Pi4bCase => [96, 120, 150],
    }
}

fn ensure_parent(path: &Path) -> Result<(), GenerationError> {
    match path.parent() {
        Some(parent) => fs::create_dir_all(parent).map_err(|source| GenerationError::Io {
            path: parent.to_path_buf(),
            source,
        }),
        None => Ok(()),
    }
}

fn write_artifact(
    artifact: RequiredArtifact,
    path: &Path,
    base: [u8; 3],
) -> Result<(), GenerationError> {
    if artifact == ENCLOSURE_MESH {
        return fs::write(path, relief_box_stl()).map_err(|source| GenerationError::Io {
            path: path.to_path_buf(),
            source,
        });
    }

    let encoded = if artifact == HEIGHTMAP {
        heightmap_image().save(path)
    } else if artifact == TEXTURE {
        shaded_image(base, 1).save(path)
    } else {
        shaded_image(base, 3).save(path)
    };
    encoded.map_err(|source| GenerationError::Encode {
        path: path.to_path_buf(),
        source,
    })
}

/// Diagonal shading over `base`; `bands` controls how many steps it has.
fn shaded_image(base: [u8; 3], bands: u32) -> RgbImage {
    RgbImage::from_fn(IMAGE_SIZE_PX, IMAGE_SIZE_PX, |x, y| {
        let band = ((x + y) * bands / (2 * IMAGE_SIZE_PX)) as u8;
        let shade = band.saturating_mul(24);
        Rgb(base.map(|c| c.saturating_sub(shade)))
    })
}

/// Left-to-right ramp from black to white.
fn heightmap_image() -> GrayImage {
    GrayImage::from_fn(IMAGE_SIZE_PX, IMAGE_SIZE_PX, |x, _| {
        Luma([(x * 255 / (IMAGE_SIZE_PX - 1)) as u8])
    })
}

/// Binary STL of an axis-aligned box, twelve triangles, zero normals.
fn relief_box_stl() -> Vec<u8> {
    let (w, h) = (BOX_FOOTPRINT_MM, BOX_HEIGHT_MM);
    let c = [
        [0.0, 0.0, 0.0],
        [w, 0.0, 0.0],
        [w, w, 0.0],
        [0.0, w, 0.0],
        [0.0, 0.0, h],
        [w, 0.0, h],
        [w, w, h],
        [0.0, w, h],
    ];
    let faces: [[usize; 3]; 12] = [
        [0, 2, 1],
        [0, 3, 2],
        [4, 5, 6],
        [4, 6, 7],
        [0, 1, 5],
        [0, 5, 4],
        [1, 2, 6],
        [1, 6, 5],
        [2, 3, 7],
        [2, 7, 6],
        [3, 0, 4],
        [3, 4, 7],
    ];
    write_binary_stl(faces.iter().map(|f| [c[f[0]], c[f[1]], c[f[2]]]))
}

fn write_binary_stl(triangles: impl ExactSizeIterator<Item = [[f32; 3]; 3]>) -> Vec<u8> {
    let count = triangles.len();
    let mut out = Vec::with_capacity(84 + count * 50);
    let mut header = [0u8; 80];
    let label = b"surface placeholder";
    header[..label.len()].copy_from_slice(label);
    out.extend_from_slice(&header);
    out.extend_from_slice(&(count as u32).to_le_bytes());
    for tri in triangles {
        out.extend_from_slice(&[0u8; 12]);
        for vertex in tri {
            for coord in vertex {
                out.extend_from_slice(&coord.to_le_bytes());
            }
        }
        out.extend_from_slice(&0u16.to_le_bytes());
    }
    out
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use surface_core::geometry::{self, GeometryThresholds};
    use surface_core::paths::JobLocation;
    use surface_core::types::JsonMap;

    use super::*;

    fn params(value: serde_json::Value) -> JsonMap {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn box_stl_has_twelve_triangles_and_relief() {
        let meta = geometry::parse_mesh_bytes(&relief_box_stl()).unwrap();
        assert_eq!(meta.triangles, 12);
        assert_eq!(meta.z_range_mm(), BOX_HEIGHT_MM);
        assert_eq!(meta.bbox_max[0], BOX_FOOTPRINT_MM);
    }

    #[test]
    fn heightmap_spans_full_range() {
        let img = heightmap_image();
        assert_eq!(img.get_pixel(0, 0).0[0], 0);
        assert_eq!(img.get_pixel(IMAGE_SIZE_PX - 1, 0).0[0], 255);
    }

    #[tokio::test]
    async fn writes_every_required_output() {
        let dir = tempfile::tempdir().unwrap();
        let loc = JobLocation::parse("placeholder_job", None).unwrap();
        let params = params(json!({"target": "pi4b_case"}));
        let generator = PlaceholderGenerator::default();

        generator
            .generate(GenerationRequest {
                location: &loc,
                job_dir: dir.path(),
                params: &params,
            })
            .await
            .unwrap();

        assert!(surface_core::artifacts::all_present(dir.path()));
        for artifact in REQUIRED_ARTIFACTS {
            let path = artifact.path_in(dir.path());
            if path.extension().is_some_and(|e| e == "png") {
                image::open(&path).unwrap();
            }
        }
    }

    #[tokio::test]
    async fn outputs_pass_geometry_gate() {
        let dir = tempfile::tempdir().unwrap();
        let loc = JobLocation::parse("gate_job", Some("tiles")).unwrap();
        let params = JsonMap::new();
        PlaceholderGenerator::default()
            .generate(GenerationRequest {
                location: &loc,
                job_dir: dir.path(),
                params: &params,
            })
            .await
            .unwrap();

        let t = GeometryThresholds::default();
        let range =
            geometry::sample_heightmap_range(&HEIGHTMAP.path_in(dir.path()), t.heightmap_sample_px)
                .unwrap();
        let report = geometry::evaluate_geometry(
            &ENCLOSURE_MESH.path_in(dir.path()),
            range,
            t.min_displacement_mm,
            t.non_uniform_threshold,
        )
        .unwrap();
        assert!(report.passed, "{:?}", report.reason);
    }
}
