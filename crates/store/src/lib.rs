//! `surface-store` -- the filesystem job store.
//!
//! Each job directory holds two JSON documents, `job.json` and
//! `job_manifest.json`. Writes replace whole files atomically; reads are
//! best-effort where the lifecycle requires it. [`inference::infer_status`]
//! reconciles the declared status with the artifacts actually on disk.

pub mod atomic;
pub mod error;
pub mod inference;
pub mod models;
pub mod repositories;

pub use error::StoreError;
pub use inference::infer_status;
