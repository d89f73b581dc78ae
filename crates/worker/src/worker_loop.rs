//! Background polling loop.
//!
//! Each pass discovers queued jobs, processes them one at a time, and then
//! writes the heartbeat. An empty pass sleeps for `poll_interval` before the
//! next one. Cancellation is observed between jobs and during the idle
//! sleep; a job in progress always runs to a terminal state.

use surface_core::config::SurfaceConfig;
use surface_core::status::JobStatus;
use surface_core::types;
use surface_pipeline::SurfaceGenerator;
use tokio_util::sync::CancellationToken;

use crate::discovery::discover_queued_jobs;
use crate::heartbeat::write_heartbeat;
use crate::processor::process_job;

/// Counts for one discovery-and-process pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PassSummary {
    pub discovered: usize,
    pub completed: usize,
    pub failed: usize,
}

impl PassSummary {
    pub fn is_idle(&self) -> bool {
        self.discovered == 0
    }
}

/// Long-lived worker that owns the configuration and a generator.
pub struct Worker<G> {
    config: SurfaceConfig,
    generator: G,
}

impl<G: SurfaceGenerator> Worker<G> {
    pub fn new(config: SurfaceConfig, generator: G) -> Self {
        Self { config, generator }
    }

    pub fn config(&self) -> &SurfaceConfig {
        &self.config
    }

    /// Run passes until the cancellation token is triggered.
    pub async fn run(&self, cancel: CancellationToken) {
        tracing::info!(
            root = %self.config.layout.root().display(),
            poll_interval_ms = self.config.poll_interval.as_millis() as u64,
            heartbeat = %self.config.heartbeat_path.display(),
            "Surface worker started",
        );

        loop {
            let summary = self.run_pass(&cancel).await;
            if cancel.is_cancelled() {
                break;
            }
            if !summary.is_idle() {
                continue;
            }

            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(self.config.poll_interval) => {}
            }
        }

        tracing::info!("Surface worker shutting down");
    }

    /// One pass: discover, process each job in order, write the heartbeat.
    ///
    /// Stops taking new jobs once `cancel` fires but still writes the
    /// heartbeat.
    pub async fn run_pass(&self, cancel: &CancellationToken) -> PassSummary {
        let jobs = discover_queued_jobs(&self.config.layout);
        let mut summary = PassSummary {
            discovered: jobs.len(),
            ..PassSummary::default()
        };

        for location in &jobs {
            if cancel.is_cancelled() {
                tracing::info!(
                    remaining = jobs.len() - summary.completed - summary.failed,
                    "Pass interrupted",
                );
                break;
            }
            match process_job(&self.config, &self.generator, location).await {
                JobStatus::Complete => summary.completed += 1,
                _ => summary.failed += 1,
            }
        }

        if let Err(e) = write_heartbeat(&self.config.heartbeat_path, types::now()) {
            tracing::warn!(
                path = %self.config.heartbeat_path.display(),
                error = %e,
                "Failed to write heartbeat",
            );
        }

        if !summary.is_idle() {
            tracing::info!(
                discovered = summary.discovered,
                completed = summary.completed,
                failed = summary.failed,
                "Pass finished",
            );
        }
        summary
    }
}
