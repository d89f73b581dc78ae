//! `surface-worker` library crate.
//!
//! Discovery, per-job processing, the polling loop, and the heartbeat.
//! The binary entrypoints live in `main.rs` (the loop) and
//! `bin/run_surface_job.rs` (a single job).

pub mod cli;
pub mod discovery;
pub mod error;
pub mod heartbeat;
pub mod logging;
pub mod processor;
pub mod worker_loop;

pub use error::JobError;
pub use processor::run_surface_job;
pub use worker_loop::{PassSummary, Worker};
