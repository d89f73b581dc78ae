//! The `job_manifest.json` record: a small public summary kept next to
//! `job.json` so static readers can check freshness cheaply.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use surface_core::target::SurfaceTarget;
use surface_core::types::{self, JsonMap, Timestamp};

pub const FIELD_JOB_ID: &str = "job_id";
pub const FIELD_PUBLIC_ROOT: &str = "public_root";
pub const FIELD_UPDATED_AT: &str = "updated_at";
pub const FIELD_TARGET: &str = "target";
pub const FIELD_EMBOSS_MODE: &str = "emboss_mode";

/// Contents of `job_manifest.json`.
///
/// Held as a plain JSON object: a write patches the keys it owns and every
/// other key, whatever its shape, is written back untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ManifestRecord(JsonMap);

impl ManifestRecord {
    pub fn from_map(map: JsonMap) -> Self {
        Self(map)
    }

    pub fn as_map(&self) -> &JsonMap {
        &self.0
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    fn str_field(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    pub fn job_id(&self) -> Option<&str> {
        self.str_field(FIELD_JOB_ID)
    }

    pub fn public_root(&self) -> Option<&str> {
        self.str_field(FIELD_PUBLIC_ROOT)
    }

    /// `updated_at` parsed leniently; RFC 3339 and naive ISO both read.
    pub fn updated_at(&self) -> Option<Timestamp> {
        self.str_field(FIELD_UPDATED_AT).and_then(types::parse_timestamp)
    }

    pub fn target(&self) -> Option<&str> {
        self.str_field(FIELD_TARGET)
    }

    pub fn emboss_mode(&self) -> Option<&str> {
        self.str_field(FIELD_EMBOSS_MODE)
    }

    /// Set the identity fields every write refreshes.
    pub fn set_identity(&mut self, job_id: &str, public_root: &str) {
        self.0.insert(FIELD_JOB_ID.into(), job_id.into());
        self.0.insert(FIELD_PUBLIC_ROOT.into(), public_root.into());
    }

    pub fn apply(&mut self, update: &ManifestUpdate) {
        self.0.insert(
            FIELD_UPDATED_AT.into(),
            types::format_timestamp(update.updated_at).into(),
        );
        if let Some(target) = update.target {
            self.0.insert(FIELD_TARGET.into(), target.as_str().into());
        }
        if let Some(mode) = &update.emboss_mode {
            self.0.insert(FIELD_EMBOSS_MODE.into(), mode.as_str().into());
        }
    }
}

/// Fields refreshed by a manifest write. `None` leaves the stored value alone.
#[derive(Debug, Clone, PartialEq)]
pub struct ManifestUpdate {
    pub updated_at: Timestamp,
    pub target: Option<SurfaceTarget>,
    pub emboss_mode: Option<String>,
}

impl ManifestUpdate {
    /// Bump `updated_at` only.
    pub fn touch(updated_at: Timestamp) -> Self {
        Self {
            updated_at,
            target: None,
            emboss_mode: None,
        }
    }

    /// Bump `updated_at` and record target and emboss mode derived from params.
    pub fn from_params(updated_at: Timestamp, params: &JsonMap) -> Self {
        Self {
            updated_at,
            target: Some(SurfaceTarget::from_params(params)),
            emboss_mode: Some(surface_core::target::emboss_mode_from_params(params)),
        }
    }
}
