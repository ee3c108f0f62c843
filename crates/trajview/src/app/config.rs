use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::trajectory::DEFAULT_SAMPLE_SPACING;

use super::loop_runner::LoopConfig;
use super::rendering::{Background, DEFAULT_FIELD_SIZE};
use super::theme::ColorScheme;
use super::z_index::DEFAULT_TAG_HIERARCHY;

/// Viewer settings, usually read from a JSON file. Every field is optional.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ViewerConfig {
    pub window_title: String,
    pub window_width: u32,
    pub window_height: u32,
    pub target_tps: u32,
    pub max_elapsed_ms: u64,
    pub metrics_log_interval_ms: u64,
    pub rate_smoothing: f32,
    /// Real-world side length of the square field.
    pub field_size: f64,
    pub background: Background,
    pub color_scheme: ColorScheme,
    pub sample_spacing: f64,
    pub show_overlay: bool,
    pub tag_hierarchy: Vec<String>,
    /// Relative paths resolve against the project root.
    pub export_dir: PathBuf,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        let loop_defaults = LoopConfig::default();
        Self {
            window_title: "trajview".to_string(),
            window_width: 1280,
            window_height: 720,
            target_tps: loop_defaults.target_tps,
            max_elapsed_ms: loop_defaults.max_elapsed.as_millis() as u64,
            metrics_log_interval_ms: loop_defaults.metrics_log_interval.as_millis() as u64,
            rate_smoothing: loop_defaults.rate_smoothing,
            field_size: DEFAULT_FIELD_SIZE,
            background: Background::default(),
            color_scheme: ColorScheme::default(),
            sample_spacing: DEFAULT_SAMPLE_SPACING,
            show_overlay: true,
            tag_hierarchy: DEFAULT_TAG_HIERARCHY
                .iter()
                .map(|tag| tag.to_string())
                .collect(),
            export_dir: PathBuf::from("exports"),
        }
    }
}

impl ViewerConfig {
    pub fn loop_config(&self) -> LoopConfig {
        LoopConfig {
            target_tps: self.target_tps.max(1),
            max_elapsed: Duration::from_millis(self.max_elapsed_ms),
            metrics_log_interval: Duration::from_millis(self.metrics_log_interval_ms),
            rate_smoothing: self.rate_smoothing,
        }
    }

    /// Spacing used by the segment renderer; non-positive values fall back to
    /// the default.
    pub fn effective_sample_spacing(&self) -> f64 {
        if self.sample_spacing.is_finite() && self.sample_spacing > 0.0 {
            self.sample_spacing
        } else {
            DEFAULT_SAMPLE_SPACING
        }
    }
}
