//! Mesh and heightmap sanity checks used as an acceptance gate before a job
//! may be marked complete.
//!
//! Supports both STL encodings:
//!
//! - **binary**: 80-byte header, little-endian `u32` triangle count, then
//!   50-byte records (12 little-endian `f32`: normal + three vertices, plus
//!   a 2-byte attribute that is ignored);
//! - **ASCII**: line oriented, one `facet` line per triangle and
//!   `vertex x y z` lines for coordinates.
//!
//! The encoding is guessed from the first 256 bytes. If parsing under the
//! guess fails, the other encoding is tried exactly once.

use std::io;
use std::path::{Path, PathBuf};

use image::imageops::{self, FilterType};
use serde_json::json;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Minimum Z extent a mesh must have when the heightmap shows relief.
pub const DEFAULT_MIN_DISPLACEMENT_MM: f32 = 0.2;

/// Heightmap spread (in 8-bit gray levels) above which it counts as non-uniform.
pub const DEFAULT_NON_UNIFORM_THRESHOLD: f32 = 1.0;

/// Side length of the square the heightmap is downsampled to.
pub const DEFAULT_HEIGHTMAP_SAMPLE_PX: u32 = 128;

const BINARY_HEADER_LEN: usize = 80;
const BINARY_COUNT_END: usize = BINARY_HEADER_LEN + 4;
const BINARY_RECORD_LEN: usize = 50;
const SNIFF_LEN: usize = 256;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum GeometryError {
    #[error("invalid STL: zero triangles")]
    EmptyMesh,

    #[error("invalid STL: header declares {declared} triangles but no complete record follows")]
    TruncatedFile { declared: u32 },

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to decode heightmap {path}: {source}")]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}

/// Thresholds for [`evaluate_geometry`], plus the heightmap sample size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeometryThresholds {
    pub min_displacement_mm: f32,
    pub non_uniform_threshold: f32,
    pub heightmap_sample_px: u32,
}

impl Default for GeometryThresholds {
    fn default() -> Self {
        Self {
            min_displacement_mm: DEFAULT_MIN_DISPLACEMENT_MM,
            non_uniform_threshold: DEFAULT_NON_UNIFORM_THRESHOLD,
            heightmap_sample_px: DEFAULT_HEIGHTMAP_SAMPLE_PX,
        }
    }
}

/// STL encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeshFormat {
    Binary,
    Ascii,
}

impl MeshFormat {
    /// Guess the encoding: ASCII files start with `solid` and mention `facet`
    /// early on. Binary headers may also start with `solid`, so both are needed.
    pub fn sniff(bytes: &[u8]) -> Self {
        let head = &bytes[..bytes.len().min(SNIFF_LEN)];
        let has_facet = head.windows(b"facet".len()).any(|w| w == b"facet");
        if head.starts_with(b"solid") && has_facet {
            Self::Ascii
        } else {
            Self::Binary
        }
    }

    pub fn alternate(self) -> Self {
        match self {
            Self::Binary => Self::Ascii,
            Self::Ascii => Self::Binary,
        }
    }

    fn parse(self, bytes: &[u8]) -> Result<MeshMetadata, GeometryError> {
        match self {
            Self::Binary => parse_binary(bytes),
            Self::Ascii => parse_ascii(bytes),
        }
    }
}

/// Triangle count and axis-aligned bounding box of a mesh.
#[derive(Debug, Clone, PartialEq)]
pub struct MeshMetadata {
    pub triangles: u64,
    pub bbox_min: [f32; 3],
    pub bbox_max: [f32; 3],
}

impl MeshMetadata {
    pub fn z_range_mm(&self) -> f32 {
        self.bbox_max[2] - self.bbox_min[2]
    }
}

/// Why a mesh was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeometryFailure {
    NoTriangles,
    TruncatedFile,
    FlatNoDisplacement,
}

impl GeometryFailure {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NoTriangles => "no_triangles",
            Self::TruncatedFile => "truncated_file",
            Self::FlatNoDisplacement => "stl_flat_no_displacement",
        }
    }
}

/// Outcome of the acceptance gate.
#[derive(Debug, Clone, PartialEq)]
pub struct GeometryReport {
    /// `None` when the mesh could not be parsed at all.
    pub metadata: Option<MeshMetadata>,
    pub passed: bool,
    pub reason: Option<GeometryFailure>,
}

impl GeometryReport {
    fn rejected(metadata: Option<MeshMetadata>, reason: GeometryFailure) -> Self {
        Self {
            metadata,
            passed: false,
            reason: Some(reason),
        }
    }

    /// JSON form stored under `artifacts.geometry`.
    pub fn to_json(&self) -> serde_json::Value {
        let (triangles, bbox, z_range) = match &self.metadata {
            Some(m) => (
                m.triangles,
                json!({ "min": m.bbox_min, "max": m.bbox_max }),
                json!(m.z_range_mm()),
            ),
            None => (0, serde_json::Value::Null, serde_json::Value::Null),
        };
        json!({
            "triangles": triangles,
            "bbox": bbox,
            "z_range_mm": z_range,
            "passed": self.passed,
            "reason": self.reason.map(GeometryFailure::as_str),
        })
    }
}

// ---------------------------------------------------------------------------
// Mesh parsing
// ---------------------------------------------------------------------------

struct BoundingBox {
    min: [f32; 3],
    max: [f32; 3],
    seen: bool,
}

impl BoundingBox {
    fn new() -> Self {
        Self {
            min: [f32::INFINITY; 3],
            max: [f32::NEG_INFINITY; 3],
            seen: false,
        }
    }

    fn add(&mut self, p: [f32; 3]) {
        for axis in 0..3 {
            if p[axis] < self.min[axis] {
                self.min[axis] = p[axis];
            }
            if p[axis] > self.max[axis] {
                self.max[axis] = p[axis];
            }
        }
        self.seen = true;
    }

    /// A mesh without any readable vertex collapses to the origin.
    fn finish(self, triangles: u64) -> MeshMetadata {
        let (bbox_min, bbox_max) = if self.seen {
            (self.min, self.max)
        } else {
            ([0.0; 3], [0.0; 3])
        };
        MeshMetadata {
            triangles,
            bbox_min,
            bbox_max,
        }
    }
}

fn read_f32_le(bytes: &[u8], offset: usize) -> f32 {
    let mut buf = [0u8; 4];
    buf.copy_from_slice(&bytes[offset..offset + 4]);
    f32::from_le_bytes(buf)
}

/// Parse a binary STL, trusting only the records actually present.
fn parse_binary(bytes: &[u8]) -> Result<MeshMetadata, GeometryError> {
    if bytes.len() < BINARY_COUNT_END {
        return Err(GeometryError::EmptyMesh);
    }
    let mut count = [0u8; 4];
    count.copy_from_slice(&bytes[BINARY_HEADER_LEN..BINARY_COUNT_END]);
    let declared = u32::from_le_bytes(count);

    let records = bytes[BINARY_COUNT_END..].chunks_exact(BINARY_RECORD_LEN);
    let available = records.len();
    let actual = available.min(declared as usize);
    if actual == 0 {
        return Err(if declared > 0 {
            GeometryError::TruncatedFile { declared }
        } else {
            GeometryError::EmptyMesh
        });
    }

    let mut bbox = BoundingBox::new();
    for record in records.take(actual) {
        // Skip the normal (first 12 bytes); three vertices follow.
        for v in 0..3 {
            let base = 12 + v * 12;
            bbox.add([
                read_f32_le(record, base),
                read_f32_le(record, base + 4),
                read_f32_le(record, base + 8),
            ]);
        }
    }
    Ok(bbox.finish(actual as u64))
}

/// Parse an ASCII STL. Malformed vertex lines are skipped.
fn parse_ascii(bytes: &[u8]) -> Result<MeshMetadata, GeometryError> {
    let text = String::from_utf8_lossy(bytes);
    let mut triangles = 0u64;
    let mut bbox = BoundingBox::new();

    for line in text.lines() {
        let line = line.trim_start();
        if line.starts_with("facet") {
            triangles += 1;
        } else if line.starts_with("vertex") {
            let coords: Vec<f32> = line
                .split_whitespace()
                .skip(1)
                .take(3)
                .map_while(|s| s.parse().ok())
                .collect();
            if let &[x, y, z] = coords.as_slice() {
                bbox.add([x, y, z]);
            }
        }
    }

    if triangles == 0 {
        return Err(GeometryError::EmptyMesh);
    }
    Ok(bbox.finish(triangles))
}

/// Parse mesh bytes with format sniffing and a single fallback attempt.
///
/// When both attempts fail, a `TruncatedFile` from either one wins over the
/// other's `EmptyMesh`.
pub fn parse_mesh_bytes(bytes: &[u8]) -> Result<MeshMetadata, GeometryError> {
    let guess = MeshFormat::sniff(bytes);
    let first = match guess.parse(bytes) {
        Ok(meta) => return Ok(meta),
        Err(e) => e,
    };
    match guess.alternate().parse(bytes) {
        Ok(meta) => Ok(meta),
        Err(second) => match (first, second) {
            (e @ GeometryError::TruncatedFile { .. }, _) => Err(e),
            (_, e) => Err(e),
        },
    }
}

/// Read and parse the mesh at `path`.
pub fn parse_mesh_metadata(path: &Path) -> Result<MeshMetadata, GeometryError> {
    let bytes = std::fs::read(path).map_err(|source| GeometryError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_mesh_bytes(&bytes)
}

// ---------------------------------------------------------------------------
// Heightmap sampling
// ---------------------------------------------------------------------------

/// Min and max gray level of the heightmap after downsampling to a
/// `sample_px` square. `Ok(None)` when the file does not exist.
pub fn sample_heightmap_range(
    path: &Path,
    sample_px: u32,
) -> Result<Option<(f32, f32)>, GeometryError> {
    if !path.exists() {
        return Ok(None);
    }
    let img = image::open(path).map_err(|source| GeometryError::Image {
        path: path.to_path_buf(),
        source,
    })?;
    let side = sample_px.max(1);
    let gray = imageops::resize(&img.to_luma8(), side, side, FilterType::Triangle);

    let range = gray.pixels().fold(None, |acc: Option<(u8, u8)>, p| {
        let v = p.0[0];
        Some(match acc {
            Some((lo, hi)) => (lo.min(v), hi.max(v)),
            None => (v, v),
        })
    });
    Ok(range.map(|(lo, hi)| (f32::from(lo), f32::from(hi))))
}

// ---------------------------------------------------------------------------
// Acceptance gate
// ---------------------------------------------------------------------------

/// Decide whether a generated mesh is acceptable.
///
/// Fails with `no_triangles` when the mesh is empty and with
/// `stl_flat_no_displacement` when the heightmap has contrast
/// (`max - min > non_uniform_threshold`) but the mesh Z extent is below
/// `min_displacement_mm`. Parse failures become a failed report; only I/O
/// errors are returned as `Err`.
pub fn evaluate_geometry(
    mesh_path: &Path,
    heightmap_range: Option<(f32, f32)>,
    min_displacement_mm: f32,
    non_uniform_threshold: f32,
) -> Result<GeometryReport, GeometryError> {
    let metadata = match parse_mesh_metadata(mesh_path) {
        Ok(m) => m,
        Err(GeometryError::EmptyMesh) => {
            return Ok(GeometryReport::rejected(None, GeometryFailure::NoTriangles))
        }
        Err(GeometryError::TruncatedFile { .. }) => {
            return Ok(GeometryReport::rejected(None, GeometryFailure::TruncatedFile))
        }
        Err(e) => return Err(e),
    };

    if metadata.triangles == 0 {
        return Ok(GeometryReport::rejected(
            Some(metadata),
            GeometryFailure::NoTriangles,
        ));
    }

    if let Some((lo, hi)) = heightmap_range {
        if hi - lo > non_uniform_threshold && metadata.z_range_mm() < min_displacement_mm {
            return Ok(GeometryReport::rejected(
                Some(metadata),
                GeometryFailure::FlatNoDisplacement,
            ));
        }
    }

    Ok(GeometryReport {
        metadata: Some(metadata),
        passed: true,
        reason: None,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    type Tri = [[f32; 3]; 3];

    /// Binary STL with `declared` in the header and the given records.
    fn binary_stl(declared: u32, tris: &[Tri]) -> Vec<u8> {
        let mut out = vec![0u8; BINARY_HEADER_LEN];
        out.extend_from_slice(&declared.to_le_bytes());
        for tri in tris {
            out.extend_from_slice(&[0u8; 12]);
            for v in tri {
                for c in v {
                    out.extend_from_slice(&c.to_le_bytes());
                }
            }
            out.extend_from_slice(&[0u8; 2]);
        }
        out
    }

    fn flat_tri(z: f32) -> Tri {
        [[0.0, 0.0, z], [1.0, 0.0, z], [0.0, 1.0, z]]
    }

    fn write_tmp(bytes: &[u8]) -> tempfile::NamedTempFile {
        let f = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(f.path(), bytes).unwrap();
        f
    }

    const ASCII_CUBE_FACE: &str = "solid face
  facet normal 0 0 1
    outer loop
      vertex 0 0 0
      vertex 10 0 0
      vertex 0 10 2.5
    endloop
  endfacet
  facet normal 0 0 1
    outer loop
      vertex 10 0 0
      vertex 10 10 0
      vertex 0 10 2.5
    endloop
  endfacet
endsolid face
";

    #[test]
    fn sniff_distinguishes_formats() {
        assert_eq!(MeshFormat::sniff(ASCII_CUBE_FACE.as_bytes()), MeshFormat::Ascii);
        assert_eq!(MeshFormat::sniff(&binary_stl(1, &[flat_tri(0.0)])), MeshFormat::Binary);
        // `solid` alone (common in binary headers) is not enough.
        assert_eq!(MeshFormat::sniff(b"solid exported by cad\0\0\0"), MeshFormat::Binary);
    }

    #[test]
    fn parses_binary_bbox() {
        let tris = [
            [[0.0, 0.0, 0.0], [5.0, 0.0, 1.0], [0.0, 5.0, 0.5]],
            [[-2.0, 3.0, 4.0], [5.0, 7.0, 1.0], [0.0, 5.0, 0.5]],
        ];
        let meta = parse_mesh_bytes(&binary_stl(2, &tris)).unwrap();
        assert_eq!(meta.triangles, 2);
        assert_eq!(meta.bbox_min, [-2.0, 0.0, 0.0]);
        assert_eq!(meta.bbox_max, [5.0, 7.0, 4.0]);
        assert_eq!(meta.z_range_mm(), 4.0);
    }

    #[test]
    fn parses_ascii_bbox() {
        let meta = parse_mesh_bytes(ASCII_CUBE_FACE.as_bytes()).unwrap();
        assert_eq!(meta.triangles, 2);
        assert_eq!(meta.bbox_min, [0.0, 0.0, 0.0]);
        assert_eq!(meta.bbox_max, [10.0, 10.0, 2.5]);
    }

    #[test]
    fn binary_count_is_bounded_by_available_records() {
        let tris: Vec<Tri> = (0..40).map(|i| flat_tri(i as f32)).collect();
        let meta = parse_mesh_bytes(&binary_stl(1000, &tris)).unwrap();
        assert_eq!(meta.triangles, 40);
        assert_eq!(meta.z_range_mm(), 39.0);
    }

    #[test]
    fn trailing_partial_record_is_ignored() {
        let mut bytes = binary_stl(3, &[flat_tri(0.0), flat_tri(1.0)]);
        bytes.extend_from_slice(&[0u8; 20]);
        assert_eq!(parse_mesh_bytes(&bytes).unwrap().triangles, 2);
    }

    #[test]
    fn declared_triangles_without_records_is_truncated() {
        assert_matches!(
            parse_binary(&binary_stl(1000, &[])),
            Err(GeometryError::TruncatedFile { declared: 1000 })
        );
    }

    #[test]
    fn zero_triangles_is_empty() {
        assert_matches!(parse_binary(&binary_stl(0, &[])), Err(GeometryError::EmptyMesh));
        assert_matches!(
            parse_mesh_bytes(b"solid dummy\nendsolid dummy\n"),
            Err(GeometryError::EmptyMesh)
        );
        assert_matches!(parse_mesh_bytes(b""), Err(GeometryError::EmptyMesh));
    }

    #[test]
    fn falls_back_to_ascii_when_binary_guess_fails() {
        // No leading `solid`, so binary is guessed; the file is too short to
        // hold a triangle count and the ASCII parser gets its single retry.
        let bytes = b"facet\nvertex 0 0 0\nvertex 1 0 3\nvertex 0 1 0\nendfacet\n";
        assert_eq!(MeshFormat::sniff(bytes), MeshFormat::Binary);
        let meta = parse_mesh_bytes(bytes).unwrap();
        assert_eq!(meta.triangles, 1);
        assert_eq!(meta.z_range_mm(), 3.0);
    }

    #[test]
    fn falls_back_to_binary_when_ascii_guess_fails() {
        // Binary header that happens to look like ASCII.
        let mut bytes = binary_stl(1, &[flat_tri(2.0)]);
        bytes[..18].copy_from_slice(b"solid facet header");
        assert_eq!(MeshFormat::sniff(&bytes), MeshFormat::Ascii);
        let meta = parse_mesh_bytes(&bytes).unwrap();
        assert_eq!(meta.triangles, 1);
        assert_eq!(meta.bbox_min[2], 2.0);
    }

    #[test]
    fn empty_mesh_reports_no_triangles_regardless_of_heightmap() {
        let f = write_tmp(&binary_stl(0, &[]));
        for range in [None, Some((0.0, 0.0)), Some((10.0, 200.0))] {
            let report = evaluate_geometry(f.path(), range, 0.2, 1.0).unwrap();
            assert!(!report.passed);
            assert_eq!(report.reason, Some(GeometryFailure::NoTriangles));
        }
    }

    #[test]
    fn flat_mesh_with_relief_heightmap_is_rejected() {
        let tris = [[[0.0, 0.0, 0.0], [1.0, 0.0, 0.05], [0.0, 1.0, 0.0]]];
        let f = write_tmp(&binary_stl(1, &tris));
        let report = evaluate_geometry(
            f.path(),
            Some((10.0, 200.0)),
            DEFAULT_MIN_DISPLACEMENT_MM,
            DEFAULT_NON_UNIFORM_THRESHOLD,
        )
        .unwrap();
        assert!(!report.passed);
        assert_eq!(report.reason, Some(GeometryFailure::FlatNoDisplacement));
        assert_eq!(report.to_json()["reason"], "stl_flat_no_displacement");
    }

    #[test]
    fn flat_mesh_with_uniform_heightmap_passes() {
        let f = write_tmp(&binary_stl(1, &[flat_tri(0.0)]));
        let report = evaluate_geometry(f.path(), Some((128.0, 128.5)), 0.2, 1.0).unwrap();
        assert!(report.passed);
        assert_eq!(report.reason, None);

        let report = evaluate_geometry(f.path(), None, 0.2, 1.0).unwrap();
        assert!(report.passed);
    }

    #[test]
    fn truncated_header_survives_ascii_fallback() {
        assert_matches!(
            parse_mesh_bytes(&binary_stl(12, &[])),
            Err(GeometryError::TruncatedFile { declared: 12 })
        );
    }

    #[test]
    fn truncated_mesh_is_a_gate_failure() {
        let f = write_tmp(&binary_stl(12, &[]));
        let report = evaluate_geometry(f.path(), None, 0.2, 1.0).unwrap();
        assert_eq!(report.reason, Some(GeometryFailure::TruncatedFile));
    }

    #[test]
    fn missing_mesh_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        assert_matches!(
            evaluate_geometry(&dir.path().join("nope.stl"), None, 0.2, 1.0),
            Err(GeometryError::Io { .. })
        );
    }

    #[test]
    fn heightmap_missing_is_absent() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(
            sample_heightmap_range(&dir.path().join("heightmap.png"), 16).unwrap(),
            None
        );
    }

    #[test]
    fn heightmap_range_spans_gradient() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("heightmap.png");
        let img = image::GrayImage::from_fn(64, 64, |x, _| image::Luma([(x * 4) as u8]));
        img.save(&path).unwrap();

        let (lo, hi) = sample_heightmap_range(&path, 16).unwrap().unwrap();
        assert!(lo < 20.0, "lo = {lo}");
        assert!(hi > 230.0, "hi = {hi}");
    }

    #[test]
    fn heightmap_uniform_has_no_spread() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("heightmap.png");
        image::GrayImage::from_pixel(32, 32, image::Luma([90])).save(&path).unwrap();
        assert_eq!(sample_heightmap_range(&path, 8).unwrap(), Some((90.0, 90.0)));
    }

    #[test]
    fn undecodable_heightmap_is_an_error() {
        let f = write_tmp(b"\x89PNG\r\n\x1a\n");
        assert_matches!(
            sample_heightmap_range(f.path(), 8),
            Err(GeometryError::Image { .. })
        );
    }
}
