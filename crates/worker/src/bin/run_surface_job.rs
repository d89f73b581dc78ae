//! `run-surface-job` -- process a single job synchronously.
//!
//! Exits 0 when the job completes, 1 when it ends `failed` or the arguments
//! are unusable, and 2 when the job id is invalid.

use std::process::ExitCode;

use surface_core::config::SurfaceConfig;
use surface_core::status::JobStatus;
use surface_pipeline::PlaceholderGenerator;
use surface_worker::cli::{self, Invocation};
use surface_worker::logging;
use surface_worker::processor::process_job;

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    logging::init_tracing();

    let location = match cli::parse_invocation(std::env::args_os()) {
        Invocation::Run(location) => location,
        Invocation::Exit { code: 0, message } => {
            print!("{message}");
            return ExitCode::SUCCESS;
        }
        Invocation::Exit { code, message } => {
            eprintln!("{}", message.trim_end());
            return ExitCode::from(code);
        }
    };

    let config = SurfaceConfig::from_env();
    let generator = PlaceholderGenerator::new(config.simulated_work);
    match process_job(&config, &generator, &location).await {
        JobStatus::Failed => ExitCode::from(cli::EXIT_FAILURE),
        _ => ExitCode::SUCCESS,
    }
}
