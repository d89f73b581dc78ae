//! Argument handling for `run-surface-job`.

use clap::Parser;
use surface_core::paths::JobLocation;

/// Job ended `failed`, or the arguments could not be parsed.
pub const EXIT_FAILURE: u8 = 1;
/// The job id did not validate.
pub const EXIT_INVALID_ID: u8 = 2;

#[derive(Debug, Parser)]
#[command(name = "run-surface-job", about = "Run one surface generation job")]
pub struct RunJobArgs {
    /// Job identifier (at least 3 characters of `[A-Za-z0-9_-]`).
    pub job_id: String,

    /// Optional namespace directory under the assets root.
    pub subfolder: Option<String>,
}

/// What the binary should do with its arguments.
#[derive(Debug)]
pub enum Invocation {
    Run(JobLocation),
    /// Print `message` and exit with `code` without touching any job.
    Exit { code: u8, message: String },
}

/// Parse argv (including the program name) into an [`Invocation`].
///
/// Usage errors exit 1 so they stay distinct from an invalid job id, which
/// exits 2 with an `ERROR:` line. `--help` and `--version` exit 0.
pub fn parse_invocation<I, T>(args: I) -> Invocation
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    let args = match RunJobArgs::try_parse_from(args) {
        Ok(args) => args,
        Err(e) => {
            let code = if e.use_stderr() { EXIT_FAILURE } else { 0 };
            return Invocation::Exit {
                code,
                message: e.to_string(),
            };
        }
    };

    match JobLocation::parse(&args.job_id, args.subfolder.as_deref()) {
        Ok(location) => Invocation::Run(location),
        Err(e) => Invocation::Exit {
            code: EXIT_INVALID_ID,
            message: format!("ERROR: {e}"),
        },
    }
}
