//! Artifact producer contract.
//!
//! A generation step must leave every [`REQUIRED_ARTIFACTS`] file in place
//! and non-empty before a job may be marked complete. The same list drives
//! status inference: a job whose outputs are all present is finished, no
//! matter what its record claims.

use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// Artifact constants
// ---------------------------------------------------------------------------

/// A required output file, addressed relative to the job directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequiredArtifact {
    /// Key under which the public URL is published in `job.json.artifacts`.
    pub key: &'static str,
    /// Path relative to the job directory, `/`-separated.
    pub relative_path: &'static str,
}

pub const HERO_PREVIEW: RequiredArtifact = RequiredArtifact {
    key: "hero",
    relative_path: "previews/hero.png",
};
pub const ISO_PREVIEW: RequiredArtifact = RequiredArtifact {
    key: "iso",
    relative_path: "previews/iso.png",
};
pub const TOP_PREVIEW: RequiredArtifact = RequiredArtifact {
    key: "top",
    relative_path: "previews/top.png",
};
pub const SIDE_PREVIEW: RequiredArtifact = RequiredArtifact {
    key: "side",
    relative_path: "previews/side.png",
};
pub const ENCLOSURE_MESH: RequiredArtifact = RequiredArtifact {
    key: "enclosure_stl",
    relative_path: "enclosure/enclosure.stl",
};
pub const TEXTURE: RequiredArtifact = RequiredArtifact {
    key: "texture",
    relative_path: "textures/texture.png",
};
pub const HEIGHTMAP: RequiredArtifact = RequiredArtifact {
    key: "heightmap",
    relative_path: "textures/heightmap.png",
};

/// Every file a finished job must contain.
pub const REQUIRED_ARTIFACTS: &[RequiredArtifact] = &[
    HERO_PREVIEW,
    ISO_PREVIEW,
    TOP_PREVIEW,
    SIDE_PREVIEW,
    ENCLOSURE_MESH,
    TEXTURE,
    HEIGHTMAP,
];

impl RequiredArtifact {
    /// Absolute path of this artifact inside `job_dir`.
    pub fn path_in(&self, job_dir: &Path) -> PathBuf {
        self.relative_path
            .split('/')
            .fold(job_dir.to_path_buf(), |acc, seg| acc.join(seg))
    }

    /// Public URL of this artifact under a job's public root.
    pub fn public_url(&self, public_root: &str) -> String {
        format!("{public_root}/{}", self.relative_path)
    }
}

// ---------------------------------------------------------------------------
// Presence checks
// ---------------------------------------------------------------------------

/// `true` if `path` is a regular file with non-zero length.
pub fn is_present(path: &Path) -> bool {
    std::fs::metadata(path)
        .map(|m| m.is_file() && m.len() > 0)
        .unwrap_or(false)
}

/// First required artifact that is missing or empty, if any.
pub fn first_missing(job_dir: &Path) -> Option<PathBuf> {
    REQUIRED_ARTIFACTS
        .iter()
        .map(|a| a.path_in(job_dir))
        .find(|p| !is_present(p))
}

/// `true` when every required artifact exists and is non-empty.
pub fn all_present(job_dir: &Path) -> bool {
    first_missing(job_dir).is_none()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn write_all(dir: &Path) {
        for a in REQUIRED_ARTIFACTS {
            let p = a.path_in(dir);
            std::fs::create_dir_all(p.parent().unwrap()).unwrap();
            std::fs::write(&p, b"x").unwrap();
        }
    }

    #[test]
    fn seven_required_artifacts() {
        assert_eq!(REQUIRED_ARTIFACTS.len(), 7);
    }

    #[test]
    fn empty_directory_reports_first_artifact() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(
            first_missing(dir.path()),
            Some(dir.path().join("previews").join("hero.png"))
        );
        assert!(!all_present(dir.path()));
    }

    #[test]
    fn all_written_is_present() {
        let dir = tempfile::tempdir().unwrap();
        write_all(dir.path());
        assert!(all_present(dir.path()));
    }

    #[test]
    fn zero_byte_file_counts_as_missing() {
        let dir = tempfile::tempdir().unwrap();
        write_all(dir.path());
        let heightmap = HEIGHTMAP.path_in(dir.path());
        std::fs::write(&heightmap, b"").unwrap();
        assert_eq!(first_missing(dir.path()), Some(heightmap));
    }

    #[test]
    fn public_url_appends_relative_path() {
        assert_eq!(
            ENCLOSURE_MESH.public_url("/assets/surface/boards/job123"),
            "/assets/surface/boards/job123/enclosure/enclosure.stl"
        );
    }
}
