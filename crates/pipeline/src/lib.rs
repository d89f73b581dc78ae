//! `surface-pipeline` -- the seam between the worker and whatever produces
//! a job's output files.
//!
//! The real surface/mesh/texture generator lives outside this workspace and
//! plugs in through [`SurfaceGenerator`]. [`PlaceholderGenerator`] stands in
//! for it, writing small but well-formed outputs.

pub mod generator;
pub mod placeholder;

pub use generator::{GenerationError, GenerationRequest, SurfaceGenerator};
pub use placeholder::PlaceholderGenerator;
