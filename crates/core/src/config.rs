use std::path::PathBuf;
use std::time::Duration;

use crate::geometry::{
    GeometryThresholds, DEFAULT_HEIGHTMAP_SAMPLE_PX, DEFAULT_MIN_DISPLACEMENT_MM,
    DEFAULT_NON_UNIFORM_THRESHOLD,
};
use crate::paths::SurfaceLayout;

/// Default job storage root.
pub const DEFAULT_OUTPUT_DIR: &str = "/data/hexforge3d/surface";
/// Default public URL prefix.
pub const DEFAULT_PUBLIC_PREFIX: &str = "/assets/surface";
/// Default idle sleep between empty poll passes, in seconds.
pub const DEFAULT_POLL_INTERVAL_SECS: f64 = 2.0;
/// Default duration of the placeholder generation step, in seconds.
pub const DEFAULT_SIMULATED_WORK_SECS: f64 = 2.0;
/// Heartbeat filename inside the assets root when not overridden.
pub const HEARTBEAT_FILENAME: &str = ".worker_heartbeat";

/// Engine configuration loaded once at process start.
///
/// Components never read the environment themselves; they receive this
/// struct (or the parts of it they need) by reference.
#[derive(Debug, Clone)]
pub struct SurfaceConfig {
    /// Job directory root and public URL prefix.
    pub layout: SurfaceLayout,
    /// Sleep between poll passes that found no work.
    pub poll_interval: Duration,
    /// Liveness file rewritten after every poll pass.
    pub heartbeat_path: PathBuf,
    /// How long the placeholder generator pretends to work.
    pub simulated_work: Duration,
    /// Acceptance gate thresholds.
    pub geometry: GeometryThresholds,
}

impl SurfaceConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                      | Default                       |
    /// |------------------------------|-------------------------------|
    /// | `SURFACE_OUTPUT_DIR`         | `/data/hexforge3d/surface`    |
    /// | `SURFACE_PUBLIC_PREFIX`      | `/assets/surface`             |
    /// | `HSE_WORKER_POLL_INTERVAL`   | `2` (seconds)                 |
    /// | `HSE_WORKER_HEARTBEAT`       | `<root>/.worker_heartbeat`    |
    /// | `HSE_WORKER_SIMULATED_WORK`  | `2` (seconds)                 |
    /// | `HSE_MIN_DISPLACEMENT_MM`    | `0.2`                         |
    /// | `HSE_NON_UNIFORM_THRESHOLD`  | `1.0`                         |
    /// | `HSE_HEIGHTMAP_SAMPLE_PX`    | `128`                         |
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Unparseable values fall back to
    /// their defaults with a warning.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let output_dir = get("SURFACE_OUTPUT_DIR").unwrap_or_else(|| DEFAULT_OUTPUT_DIR.into());
        let public_prefix =
            get("SURFACE_PUBLIC_PREFIX").unwrap_or_else(|| DEFAULT_PUBLIC_PREFIX.into());
        let layout = SurfaceLayout::new(output_dir.trim(), public_prefix.trim());

        let heartbeat_path = get("HSE_WORKER_HEARTBEAT")
            .map(|v| PathBuf::from(v.trim()))
            .unwrap_or_else(|| layout.root().join(HEARTBEAT_FILENAME));

        let poll_interval = seconds(
            "HSE_WORKER_POLL_INTERVAL",
            get("HSE_WORKER_POLL_INTERVAL"),
            DEFAULT_POLL_INTERVAL_SECS,
        );
        let simulated_work = seconds(
            "HSE_WORKER_SIMULATED_WORK",
            get("HSE_WORKER_SIMULATED_WORK"),
            DEFAULT_SIMULATED_WORK_SECS,
        );

        let geometry = GeometryThresholds {
            min_displacement_mm: parsed(
                "HSE_MIN_DISPLACEMENT_MM",
                get("HSE_MIN_DISPLACEMENT_MM"),
                DEFAULT_MIN_DISPLACEMENT_MM,
            ),
            non_uniform_threshold: parsed(
                "HSE_NON_UNIFORM_THRESHOLD",
                get("HSE_NON_UNIFORM_THRESHOLD"),
                DEFAULT_NON_UNIFORM_THRESHOLD,
            ),
            heightmap_sample_px: parsed(
                "HSE_HEIGHTMAP_SAMPLE_PX",
                get("HSE_HEIGHTMAP_SAMPLE_PX"),
                DEFAULT_HEIGHTMAP_SAMPLE_PX,
            ),
        };

        Self {
            layout,
            poll_interval,
            heartbeat_path,
            simulated_work,
            geometry,
        }
    }
}

fn parsed<T: std::str::FromStr + Copy>(key: &str, raw: Option<String>, default: T) -> T {
    match raw {
        None => default,
        Some(v) => v.trim().parse().unwrap_or_else(|_| {
            tracing::warn!(key, value = %v, "Unparseable config value, using default");
            default
        }),
    }
}

fn seconds(key: &str, raw: Option<String>, default: f64) -> Duration {
    let secs = parsed(key, raw, default);
    Duration::try_from_secs_f64(secs).unwrap_or_else(|_| {
        tracing::warn!(key, secs, "Negative or non-finite duration, using default");
        Duration::from_secs_f64(default)
    })
}
