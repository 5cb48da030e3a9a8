//! Timeline Configuration
//!
//! All layout constants live here so call sites never hard-code padding,
//! zoom limits or timings. Every field has a default, so a partial JSON
//! document is a valid configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::domain::{DomainError, DomainResult};
use crate::timeline::TimeScale;

/// Upper bound for any day count in the configuration (about a century)
pub const MAX_CONFIG_DAYS: i64 = 36_500;

/// How the visible date window is derived from the data
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RangePolicy {
    /// Days shown before the earliest date
    pub pad_before_days: i64,
    /// Days shown after the latest date
    pub pad_after_days: i64,
    /// Fallback window when nothing is dated: today - N ..
    pub empty_before_days: i64,
    /// .. today + N
    pub empty_after_days: i64,
}

impl Default for RangePolicy {
    fn default() -> Self {
        Self {
            pad_before_days: 7,
            pad_after_days: 30,
            empty_before_days: 30,
            empty_after_days: 90,
        }
    }
}

/// Pixel geometry of the timeline body
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutParams {
    /// Pixels per day
    pub cell_width: f64,
    pub row_height: f64,
    pub header_height: f64,
    pub row_gap: f64,
    /// Space between header and first row
    pub padding: f64,
    /// Duration given to posts without an end date
    pub default_duration_days: i64,
    /// Milestone line height when there are no posts
    pub empty_content_height: f64,
}

impl Default for LayoutParams {
    fn default() -> Self {
        Self {
            cell_width: 150.0,
            row_height: 60.0,
            header_height: 50.0,
            row_gap: 10.0,
            padding: 10.0,
            default_duration_days: 7,
            empty_content_height: 200.0,
        }
    }
}

/// Pan/zoom behaviour
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewportParams {
    pub min_cell_width: f64,
    pub max_cell_width: f64,
    pub zoom_step: f64,
    /// Extra render margin on each side, percent of container width
    pub buffer_percent: f64,
    /// Scroll events closer together than this are dropped
    pub throttle_ms: u64,
    /// Inactivity after which `is_scrolling` clears
    pub scroll_settle_ms: u64,
    /// Cells moved by one pan step
    pub pan_cells: u32,
    /// Pointer travel before a press becomes a drag
    pub drag_threshold_px: f64,
}

impl Default for ViewportParams {
    fn default() -> Self {
        Self {
            min_cell_width: 60.0,
            max_cell_width: 300.0,
            zoom_step: 30.0,
            buffer_percent: 50.0,
            throttle_ms: 16,
            scroll_settle_ms: 150,
            pan_cells: 10,
            drag_threshold_px: 5.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TimelineConfig {
    pub range: RangePolicy,
    pub layout: LayoutParams,
    pub viewport: ViewportParams,
    pub scale: TimeScale,
}

impl TimelineConfig {
    /// Parse and validate a JSON document
    pub fn from_json_str(json: &str) -> DomainResult<Self> {
        let config: TimelineConfig = serde_json::from_str(json)
            .map_err(|e| DomainError::InvalidInput(format!("Bad timeline config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a JSON file
    pub fn load(path: &Path) -> DomainResult<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| DomainError::Internal(format!("Failed to read {}: {}", path.display(), e)))?;
        Self::from_json_str(&text)
    }

    pub fn validate(&self) -> DomainResult<()> {
        let layout = &self.layout;
        let viewport = &self.viewport;

        let positive = [
            ("layout.cell_width", layout.cell_width),
            ("layout.row_height", layout.row_height),
            ("viewport.min_cell_width", viewport.min_cell_width),
            ("viewport.max_cell_width", viewport.max_cell_width),
            ("viewport.zoom_step", viewport.zoom_step),
        ];
        for (name, value) in positive {
            if !(value > 0.0) {
                return Err(DomainError::InvalidInput(format!("{} must be positive", name)));
            }
        }

        let non_negative = [
            ("layout.header_height", layout.header_height),
            ("layout.row_gap", layout.row_gap),
            ("layout.padding", layout.padding),
            ("layout.empty_content_height", layout.empty_content_height),
            ("viewport.buffer_percent", viewport.buffer_percent),
            ("viewport.drag_threshold_px", viewport.drag_threshold_px),
        ];
        for (name, value) in non_negative {
            if !(value >= 0.0) {
                return Err(DomainError::InvalidInput(format!("{} must not be negative", name)));
            }
        }

        if viewport.min_cell_width > viewport.max_cell_width {
            return Err(DomainError::InvalidInput(
                "viewport.min_cell_width exceeds viewport.max_cell_width".to_string(),
            ));
        }

        let day_counts = [
            ("layout.default_duration_days", layout.default_duration_days),
            ("range.pad_before_days", self.range.pad_before_days),
            ("range.pad_after_days", self.range.pad_after_days),
            ("range.empty_before_days", self.range.empty_before_days),
            ("range.empty_after_days", self.range.empty_after_days),
        ];
        for (name, value) in day_counts {
            if !(0..=MAX_CONFIG_DAYS).contains(&value) {
                return Err(DomainError::InvalidInput(format!(
                    "{} must be between 0 and {}",
                    name, MAX_CONFIG_DAYS
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = TimelineConfig::default();
        assert_eq!(config.range.pad_before_days, 7);
        assert_eq!(config.range.pad_after_days, 30);
        assert_eq!(config.layout.cell_width, 150.0);
        assert_eq!(config.viewport.zoom_step, 30.0);
        assert_eq!(config.scale, TimeScale::Month);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json() {
        let config = TimelineConfig::from_json_str(
            r#"{ "scale": "week", "layout": { "cell_width": 40 }, "range": { "pad_after_days": 14 } }"#,
        )
        .unwrap();
        assert_eq!(config.scale, TimeScale::Week);
        assert_eq!(config.layout.cell_width, 40.0);
        assert_eq!(config.layout.row_height, 60.0);
        assert_eq!(config.range.pad_after_days, 14);
        assert_eq!(config.range.pad_before_days, 7);
    }

    #[test]
    fn test_invalid_zoom_bounds() {
        let err = TimelineConfig::from_json_str(
            r#"{ "viewport": { "min_cell_width": 400 } }"#,
        )
        .unwrap_err();
        assert!(matches!(err, DomainError::InvalidInput(_)));
    }

    #[test]
    fn test_day_counts_out_of_range() {
        for json in [
            r#"{ "range": { "pad_after_days": 9223372036854775807 } }"#,
            r#"{ "range": { "pad_before_days": -1 } }"#,
            r#"{ "range": { "empty_before_days": -200 } }"#,
            r#"{ "range": { "empty_after_days": -1 } }"#,
            r#"{ "range": { "empty_after_days": 36501 } }"#,
            r#"{ "layout": { "default_duration_days": 9223372036854775807 } }"#,
        ] {
            let err = TimelineConfig::from_json_str(json).unwrap_err();
            assert!(matches!(err, DomainError::InvalidInput(_)), "{}", json);
        }

        let widest = TimelineConfig::from_json_str(
            r#"{ "range": { "pad_before_days": 36500, "pad_after_days": 36500,
                 "empty_before_days": 36500, "empty_after_days": 36500 } }"#,
        )
        .unwrap();
        assert_eq!(widest.range.empty_after_days, MAX_CONFIG_DAYS);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("timeline.json");
        std::fs::write(&path, r#"{ "viewport": { "buffer_percent": 25 } }"#).unwrap();

        let config = TimelineConfig::load(&path).unwrap();
        assert_eq!(config.viewport.buffer_percent, 25.0);

        let missing = TimelineConfig::load(&dir.path().join("nope.json"));
        assert!(matches!(missing, Err(DomainError::Internal(_))));
    }
}
