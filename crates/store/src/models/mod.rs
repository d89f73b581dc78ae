//! On-disk document models.
//!
//! Each submodule contains a `Serialize` + `Deserialize` struct matching the
//! JSON file, plus the small helpers used to build the next revision.

pub mod job;
pub mod manifest;
