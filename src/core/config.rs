use crate::errors::{MarkerError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub browser: BrowserConfig,
    pub marker: MarkerConfig,
    pub session: SessionConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserConfig {
    pub headless: bool,
    pub viewport: Viewport,
    pub user_agent: Option<String>,
    pub args: Vec<String>,
    pub timeout_ms: u64,
}

/// Appearance of the border and badge drawn around each marked element.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MarkerConfig {
    pub border_color: String,
    pub border_width: f64,
    /// Outset of the border around the element box.
    pub border_epsilon: f64,
    pub border_z_index: i32,
    pub label_color: String,
    pub label_background: String,
    pub label_font_size: String,
    pub label_padding: String,
    pub label_opacity: String,
    pub label_z_index: i32,
    /// How far left of the box the badge is anchored, before clamping to 0.
    pub label_left_offset: f64,
    pub label_top_offset: f64,
    /// Color used to single out the element about to be acted on.
    pub emphasis_color: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub navigation_timeout_ms: u64,
    pub script_timeout_ms: u64,
    pub install_file_chooser_override: bool,
    /// Remove overlays left by an earlier pass before marking again.
    pub clean_before_marking: bool,
    /// Passes to rerun when the page drops captured elements mid-pass.
    pub stale_retries: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
    pub device_scale_factor: f64,
}

impl Config {
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)?;
        serde_json::from_str(&raw).map_err(|e| {
            MarkerError::ConfigurationError(format!("{}: {}", path.display(), e))
        })
    }
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: true,
            viewport: Viewport::default(),
            user_agent: None,
            args: vec![],
            timeout_ms: 30000,
        }
    }
}

impl Default for MarkerConfig {
    fn default() -> Self {
        Self {
            border_color: "green".to_string(),
            border_width: 2.0,
            border_epsilon: 2.0,
            border_z_index: 9999,
            label_color: "white".to_string(),
            label_background: "green".to_string(),
            label_font_size: "15.5px".to_string(),
            label_padding: "2px 4px".to_string(),
            label_opacity: "0.8".to_string(),
            label_z_index: 10000,
            label_left_offset: 16.0,
            label_top_offset: 2.0,
            emphasis_color: "red".to_string(),
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            navigation_timeout_ms: 5000,
            script_timeout_ms: 10000,
            install_file_chooser_override: true,
            clean_before_marking: true,
            stale_retries: 1,
        }
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1600,
            height: 900,
            device_scale_factor: 1.0,
        }
    }
}
