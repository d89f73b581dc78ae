//! Job identifier and subfolder sanitization, plus the on-disk / public URL
//! layout of job directories.
//!
//! Every component that touches the filesystem goes through this module
//! first. A job lives at `<root>/<job_id>/` or `<root>/<subfolder>/<job_id>/`
//! and is published under `<public_prefix>[/<subfolder>]/<job_id>`.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Minimum job identifier length after trimming.
pub const MIN_JOB_ID_LEN: usize = 3;

/// Final path segment every assets root is normalized to end with.
pub const ROOT_SENTINEL: &str = "surface";

/// Job record filename inside a job directory.
pub const JOB_JSON_FILENAME: &str = "job.json";

/// Manifest filename inside a job directory.
pub const MANIFEST_FILENAME: &str = "job_manifest.json";

fn is_safe_segment(value: &str) -> bool {
    !value.is_empty()
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

// ---------------------------------------------------------------------------
// Identifiers
// ---------------------------------------------------------------------------

/// A validated, filesystem- and URL-safe job identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct JobId(String);

impl JobId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A validated single-segment subfolder name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Subfolder(String);

impl Subfolder {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Subfolder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Validate a raw job identifier.
///
/// Trims surrounding whitespace, then requires at least
/// [`MIN_JOB_ID_LEN`] characters drawn from `[A-Za-z0-9_-]`.
pub fn validate_job_id(raw: &str) -> Result<JobId, CoreError> {
    let value = raw.trim();
    if value.chars().count() < MIN_JOB_ID_LEN {
        return Err(CoreError::InvalidIdentifier(format!(
            "job_id must be at least {MIN_JOB_ID_LEN} characters"
        )));
    }
    if !is_safe_segment(value) {
        return Err(CoreError::InvalidIdentifier(
            "job_id must contain only letters, numbers, underscore, or dash".into(),
        ));
    }
    Ok(JobId(value.to_string()))
}

/// Sanitize an optional subfolder name.
///
/// Returns `None` for missing, blank, or invalid input. Invalid input is
/// not an error: the job is addressed at root level instead.
pub fn sanitize_subfolder(raw: Option<&str>) -> Option<Subfolder> {
    let value = raw?.trim();
    if !is_safe_segment(value) {
        if !value.is_empty() {
            tracing::debug!(subfolder = %value, "Ignoring invalid subfolder");
        }
        return None;
    }
    Some(Subfolder(value.to_string()))
}

/// Where a job lives: its identifier plus optional namespace.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct JobLocation {
    pub job_id: JobId,
    pub subfolder: Option<Subfolder>,
}

impl JobLocation {
    pub fn new(job_id: JobId, subfolder: Option<Subfolder>) -> Self {
        Self { job_id, subfolder }
    }

    /// Validate the job id and sanitize the subfolder in one step.
    pub fn parse(job_id: &str, subfolder: Option<&str>) -> Result<Self, CoreError> {
        Ok(Self {
            job_id: validate_job_id(job_id)?,
            subfolder: sanitize_subfolder(subfolder),
        })
    }

    /// Subfolder name for log fields, `root` when absent.
    pub fn subfolder_label(&self) -> &str {
        self.subfolder.as_ref().map_or("root", Subfolder::as_str)
    }
}

// ---------------------------------------------------------------------------
// Layout
// ---------------------------------------------------------------------------

/// Resolves job locations to directories and public URL paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SurfaceLayout {
    root: PathBuf,
    public_prefix: String,
}

impl SurfaceLayout {
    /// Build a layout from a raw assets root and public prefix.
    ///
    /// The root is made absolute and gains a trailing `surface` segment if
    /// it does not already end in one. Trailing slashes are stripped from the
    /// prefix.
    pub fn new(root: impl AsRef<Path>, public_prefix: &str) -> Self {
        let root = root.as_ref();
        let mut root = std::path::absolute(root).unwrap_or_else(|_| root.to_path_buf());
        if root.file_name().and_then(|n| n.to_str()) != Some(ROOT_SENTINEL) {
            root.push(ROOT_SENTINEL);
        }
        Self {
            root,
            public_prefix: public_prefix.trim_end_matches('/').to_string(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn public_prefix(&self) -> &str {
        &self.public_prefix
    }

    /// `<root>[/<subfolder>]/<job_id>`
    pub fn resolve_job_directory(&self, location: &JobLocation) -> PathBuf {
        let mut dir = self.root.clone();
        if let Some(sf) = &location.subfolder {
            dir.push(sf.as_str());
        }
        dir.push(location.job_id.as_str());
        dir
    }

    /// `<public_prefix>[/<subfolder>]/<job_id>`
    pub fn resolve_public_path(&self, location: &JobLocation) -> String {
        match &location.subfolder {
            Some(sf) => format!("{}/{sf}/{}", self.public_prefix, location.job_id),
            None => format!("{}/{}", self.public_prefix, location.job_id),
        }
    }

    pub fn job_json_path(&self, location: &JobLocation) -> PathBuf {
        self.resolve_job_directory(location).join(JOB_JSON_FILENAME)
    }

    pub fn manifest_path(&self, location: &JobLocation) -> PathBuf {
        self.resolve_job_directory(location).join(MANIFEST_FILENAME)
    }

    /// Invert [`resolve_job_directory`](Self::resolve_job_directory) for a
    /// `job.json` path found under the root.
    ///
    /// Returns `None` when the path is not exactly one or two levels below
    /// the root, or when any directory name is not a valid identifier.
    pub fn locate(&self, job_json: &Path) -> Option<JobLocation> {
        let job_dir = job_json.parent()?;
        let job_id = validate_job_id(job_dir.file_name()?.to_str()?).ok()?;
        let parent = job_dir.parent()?;
        if parent == self.root {
            return Some(JobLocation::new(job_id, None));
        }
        if parent.parent()? != self.root {
            return None;
        }
        let subfolder = sanitize_subfolder(parent.file_name()?.to_str())?;
        Some(JobLocation::new(job_id, Some(subfolder)))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    fn layout() -> SurfaceLayout {
        SurfaceLayout::new("/data/hexforge3d/surface", "/assets/surface/")
    }

    #[test]
    fn accepts_valid_job_ids() {
        assert_eq!(validate_job_id("abc").unwrap().as_str(), "abc");
        assert_eq!(validate_job_id("  job_01-A  ").unwrap().as_str(), "job_01-A");
    }

    #[test]
    fn rejects_short_job_ids() {
        assert_matches!(validate_job_id(""), Err(CoreError::InvalidIdentifier(_)));
        assert_matches!(validate_job_id("ab"), Err(CoreError::InvalidIdentifier(_)));
        assert_matches!(validate_job_id("  ab  "), Err(CoreError::InvalidIdentifier(_)));
    }

    #[test]
    fn rejects_unsafe_characters() {
        for raw in ["../etc", "a b c", "job.json", "job/1", "jöb", "abc$"] {
            assert_matches!(
                validate_job_id(raw),
                Err(CoreError::InvalidIdentifier(_)),
                "{raw} should be rejected"
            );
        }
    }

    #[test]
    fn subfolder_blank_or_invalid_is_absent() {
        assert_eq!(sanitize_subfolder(None), None);
        assert_eq!(sanitize_subfolder(Some("")), None);
        assert_eq!(sanitize_subfolder(Some("   ")), None);
        assert_eq!(sanitize_subfolder(Some("../x")), None);
        assert_eq!(sanitize_subfolder(Some("a/b")), None);
    }

    #[test]
    fn subfolder_allows_short_names() {
        assert_eq!(sanitize_subfolder(Some(" x ")).unwrap().as_str(), "x");
    }

    #[test]
    fn root_gains_sentinel_segment() {
        let l = SurfaceLayout::new("/data/hexforge3d", "/assets/surface");
        assert_eq!(l.root(), Path::new("/data/hexforge3d/surface"));
        assert_eq!(layout().root(), Path::new("/data/hexforge3d/surface"));
    }

    #[test]
    fn prefix_trailing_slash_is_stripped() {
        assert_eq!(layout().public_prefix(), "/assets/surface");
    }

    #[test]
    fn directory_and_public_path_mirror_each_other() {
        let l = layout();
        let plain = JobLocation::parse("job123", None).unwrap();
        let nested = JobLocation::parse("job123", Some("boards")).unwrap();

        assert_eq!(
            l.resolve_job_directory(&plain),
            Path::new("/data/hexforge3d/surface/job123")
        );
        assert_eq!(
            l.resolve_job_directory(&nested),
            Path::new("/data/hexforge3d/surface/boards/job123")
        );
        assert_eq!(l.resolve_public_path(&plain), "/assets/surface/job123");
        assert_eq!(l.resolve_public_path(&nested), "/assets/surface/boards/job123");
    }

    #[test]
    fn invalid_subfolder_resolves_to_root_level() {
        let l = layout();
        let loc = JobLocation::parse("job123", Some("../../etc")).unwrap();
        assert_eq!(loc.subfolder, None);
        assert_eq!(
            l.resolve_job_directory(&loc),
            Path::new("/data/hexforge3d/surface/job123")
        );
    }

    #[test]
    fn locate_inverts_resolution() {
        let l = layout();
        for loc in [
            JobLocation::parse("job123", None).unwrap(),
            JobLocation::parse("job123", Some("boards")).unwrap(),
        ] {
            assert_eq!(l.locate(&l.job_json_path(&loc)), Some(loc));
        }
    }

    #[test]
    fn locate_rejects_unaddressable_paths() {
        let l = layout();
        assert_eq!(l.locate(Path::new("/data/hexforge3d/surface/ab/job.json")), None);
        assert_eq!(
            l.locate(Path::new("/data/hexforge3d/surface/bad.name/job123/job.json")),
            None
        );
        assert_eq!(
            l.locate(Path::new("/data/hexforge3d/surface/a/b/job123/job.json")),
            None
        );
        assert_eq!(l.locate(Path::new("/elsewhere/job123/job.json")), None);
    }
}
