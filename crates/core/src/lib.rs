//! `surface-core` -- identifiers, layout, configuration and output checks
//! shared by every surface engine crate. No I/O beyond reading the files
//! it is asked to inspect.

pub mod artifacts;
pub mod config;
pub mod error;
pub mod geometry;
pub mod paths;
pub mod status;
pub mod target;
pub mod types;
