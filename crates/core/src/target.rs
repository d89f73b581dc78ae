//! Output target and emboss mode derived from job `params`.

use crate::types::JsonMap;

/// Emboss mode recorded when `params.emboss_mode` is absent.
pub const DEFAULT_EMBOSS_MODE: &str = "tile";

/// What the surface is generated for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SurfaceTarget {
    #[default]
    Tile,
    Pi4bCase,
}

impl SurfaceTarget {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Tile => "tile",
            Self::Pi4bCase => "pi4b_case",
        }
    }

    /// `pi4b_case` only when `params.target` says so; anything else is a tile.
    pub fn from_params(params: &JsonMap) -> Self {
        match params.get("target").and_then(|v| v.as_str()) {
            Some(t) if t.trim().eq_ignore_ascii_case("pi4b_case") => Self::Pi4bCase,
            _ => Self::Tile,
        }
    }
}

/// `params.emboss_mode` when it is a non-empty string, otherwise the default.
pub fn emboss_mode_from_params(params: &JsonMap) -> String {
    params
        .get("emboss_mode")
        .and_then(|v| v.as_str())
        .filter(|s| !s.is_empty())
        .unwrap_or(DEFAULT_EMBOSS_MODE)
        .to_string()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn params(value: serde_json::Value) -> JsonMap {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn target_defaults_to_tile() {
        assert_eq!(SurfaceTarget::from_params(&JsonMap::new()), SurfaceTarget::Tile);
        assert_eq!(
            SurfaceTarget::from_params(&params(json!({"target": "keyboard"}))),
            SurfaceTarget::Tile
        );
        assert_eq!(
            SurfaceTarget::from_params(&params(json!({"target": 7}))),
            SurfaceTarget::Tile
        );
    }

    #[test]
    fn target_recognizes_pi_case() {
        assert_eq!(
            SurfaceTarget::from_params(&params(json!({"target": " PI4B_Case "}))),
            SurfaceTarget::Pi4bCase
        );
    }

    #[test]
    fn emboss_mode_falls_back() {
        assert_eq!(emboss_mode_from_params(&JsonMap::new()), "tile");
        assert_eq!(emboss_mode_from_params(&params(json!({"emboss_mode": ""}))), "tile");
        assert_eq!(
            emboss_mode_from_params(&params(json!({"emboss_mode": "lid"}))),
            "lid"
        );
    }
}
