//! Canvas configuration and its persistence
//!
//! Provides the tunables of the master canvas and functions for loading and
//! saving them to disk. Only configuration is stored, never view state.

use directories::ProjectDirs;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

use crate::error::ConfigError;
use crate::gesture::GestureConfig;
use crate::occlusion::DEFAULT_OVERLAP_THRESHOLD;

/// Tunables of the master canvas
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CanvasConfig {
    /// Float years shown top to bottom before any zoom
    pub base_domain: [f64; 2],
    /// Allowed zoom factors
    pub scale_extent: [f64; 2],
    /// Float years the viewport may pan across
    pub translate_extent_years: [f64; 2],
    /// X of the first lane
    pub lane_origin: f64,
    /// Horizontal distance between lanes
    pub lane_spacing: f64,
    /// Offset of item labels inside a lane
    pub events_left: f64,
    pub overlap_threshold: f64,
    pub hover_debounce_ms: u64,
    /// Gap between an item label and its popup
    pub popup_margin: f64,
    /// Capacity of the bounded input and event queues
    pub queue_capacity: usize,
    /// Pointer travel below which a press/release counts as a click
    pub click_slop: f64,
    pub draw_debug_axes: bool,
    pub gesture: GestureConfig,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            base_domain: [1850.0, 2050.0],
            scale_extent: [0.4, 60.0],
            translate_extent_years: [1400.0, 2300.0],
            lane_origin: 80.0,
            lane_spacing: 390.0,
            events_left: 50.0,
            overlap_threshold: DEFAULT_OVERLAP_THRESHOLD,
            hover_debounce_ms: 550,
            popup_margin: 12.0,
            queue_capacity: 64,
            click_slop: 3.0,
            draw_debug_axes: false,
            gesture: GestureConfig::default(),
        }
    }
}

/// Get the base configuration directory for all viewers
pub fn config_dir() -> Option<PathBuf> {
    ProjectDirs::from("com", "media-lanes", "viewers").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the configuration file path for a specific viewer
pub fn config_path(viewer_name: &str) -> Option<PathBuf> {
    config_dir().map(|dir| dir.join(format!("{}.toml", viewer_name)))
}

/// Load configuration for a specific viewer
///
/// Returns `None` if the config file doesn't exist yet.
/// Returns an error if the file exists but can't be parsed.
pub fn load_config<T: DeserializeOwned>(viewer_name: &str) -> Result<Option<T>, ConfigError> {
    let path = config_path(viewer_name).ok_or(ConfigError::NoConfigDir)?;

    if !path.exists() {
        return Ok(None);
    }

    let contents = fs::read_to_string(&path)?;
    let config: T = toml::from_str(&contents)?;
    Ok(Some(config))
}

/// Save configuration for a specific viewer
pub fn save_config<T: Serialize>(viewer_name: &str, config: &T) -> Result<(), ConfigError> {
    let path = config_path(viewer_name).ok_or(ConfigError::NoConfigDir)?;

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let contents = toml::to_string_pretty(config)?;
    fs::write(&path, contents)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_path() {
        let path = config_path("test_viewer");
        assert!(path.is_some());
        let path = path.unwrap();
        assert!(path.to_string_lossy().contains("test_viewer.toml"));
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: CanvasConfig = toml::from_str(
            r#"
            scale_extent = [1.0, 10.0]

            [gesture]
            wheel_zoom_speed = 0.004
            "#,
        )
        .unwrap();
        assert_eq!(config.scale_extent, [1.0, 10.0]);
        assert_eq!(config.base_domain, [1850.0, 2050.0]);
        assert_eq!(config.gesture.wheel_zoom_speed, 0.004);
        assert_eq!(config.gesture.pinch_zoom_speed, 0.016);
    }

    #[test]
    fn test_round_trip_through_toml() {
        let config = CanvasConfig::default();
        let text = toml::to_string_pretty(&config).unwrap();
        let back: CanvasConfig = toml::from_str(&text).unwrap();
        assert_eq!(back, config);
    }
}
