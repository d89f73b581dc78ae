//! Repository layer.
//!
//! Each repository is a zero-sized struct providing file-backed operations
//! that accept `&SurfaceLayout` as the first argument.

pub mod job_repo;
pub mod manifest_repo;

pub use job_repo::JobRepo;
pub use manifest_repo::ManifestRepo;
