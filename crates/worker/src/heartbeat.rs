//! Liveness file written after every polling pass.
//!
//! The file holds a single RFC 3339 UTC timestamp followed by a newline.
//! It is replaced atomically so a monitor never sees a partial write.

use std::path::Path;

use surface_core::types::{self, Timestamp};
use surface_store::atomic::write_bytes_atomic;
use surface_store::StoreError;

/// Record `at` as the worker's last sign of life.
pub fn write_heartbeat(path: &Path, at: Timestamp) -> Result<(), StoreError> {
    let line = format!("{}\n", types::format_timestamp(at));
    write_bytes_atomic(path, line.as_bytes())
}

/// Last heartbeat time, or `None` if the file is missing or unparseable.
pub fn read_heartbeat(path: &Path) -> Option<Timestamp> {
    let raw = std::fs::read_to_string(path).ok()?;
    types::parse_timestamp(raw.trim())
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;

    #[test]
    fn written_heartbeat_reads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join(".worker_heartbeat");
        let at = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();

        write_heartbeat(&path, at).unwrap();

        assert_eq!(read_heartbeat(&path), Some(at));
        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(raw.ends_with('\n'));
    }

    #[test]
    fn garbage_heartbeat_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".worker_heartbeat");
        std::fs::write(&path, "not a time").unwrap();
        assert_eq!(read_heartbeat(&path), None);
        assert_eq!(read_heartbeat(&dir.path().join("missing")), None);
    }
}
