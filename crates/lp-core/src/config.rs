//! Editor tunables.

use serde::Deserialize;

/// Smallest document side, in pixels.
pub const MIN_DOC_SIDE: u32 = 1;
/// Largest document side, in pixels.
pub const MAX_DOC_SIDE: u32 = 4096;

/// Configuration for an editing session.
///
/// Every field has a default, so a partial JSON object is a valid config.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Raster history capacity (full-document snapshots kept). Default: **25**.
    pub history_limit: usize,
    pub min_scale: f64,
    pub max_scale: f64,
    /// Handle hit radius in document units for fine pointers. Default: **30**.
    pub handle_radius: f64,
    /// Handle hit radius once a coarse (touch) pointer has been seen. Default: **96**.
    pub touch_handle_radius: f64,
    /// Aspect-lock corner handles. Default: **true**.
    pub keep_aspect: bool,
    /// Factor for the zoom-in / zoom-out commands.
    pub zoom_step: f64,
    /// Factor for ctrl+wheel zoom.
    pub wheel_zoom_step: f64,
    /// Offset of a duplicated layer from its source.
    pub duplicate_offset: i32,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            history_limit: 25,
            min_scale: 0.1,
            max_scale: 10.0,
            handle_radius: 30.0,
            touch_handle_radius: 96.0,
            keep_aspect: true,
            zoom_step: 1.2,
            wheel_zoom_step: 1.1,
            duplicate_offset: 50,
        }
    }
}

impl EditorConfig {
    /// Parse a (possibly partial) JSON config.
    ///
    /// # Errors
    /// Returns the `serde_json` message for malformed input.
    pub fn from_json(text: &str) -> Result<Self, String> {
        let mut config: Self =
            serde_json::from_str(text).map_err(|e| format!("Config parse error: {e}"))?;
        config.history_limit = config.history_limit.max(1);
        if config.min_scale > config.max_scale {
            std::mem::swap(&mut config.min_scale, &mut config.max_scale);
        }
        Ok(config)
    }

    /// Clamp a requested document side into `MIN_DOC_SIDE..=MAX_DOC_SIDE`.
    pub fn clamp_side(n: i64) -> u32 {
        n.clamp(MIN_DOC_SIDE as i64, MAX_DOC_SIDE as i64) as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let config = EditorConfig::from_json(r#"{ "history_limit": 5 }"#).unwrap();
        assert_eq!(config.history_limit, 5);
        assert_eq!(config.max_scale, 10.0);
        assert!(config.keep_aspect);
    }

    #[test]
    fn zero_history_limit_is_raised_to_one() {
        let config = EditorConfig::from_json(r#"{ "history_limit": 0 }"#).unwrap();
        assert_eq!(config.history_limit, 1);
    }

    #[test]
    fn malformed_json_is_an_error() {
        assert!(EditorConfig::from_json("{ history_limit: }").is_err());
    }

    #[test]
    fn clamp_side_bounds() {
        assert_eq!(EditorConfig::clamp_side(0), 1);
        assert_eq!(EditorConfig::clamp_side(10_000), 4096);
        assert_eq!(EditorConfig::clamp_side(640), 640);
    }
}
