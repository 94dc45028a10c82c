//! Configuration file management.
//!
//! Handles loading user preferences from `~/.track-viz.toml`.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

use crate::error::{Result, VizError};

const CONFIG_TEMPLATE: &str = r#"# track-viz configuration file

# =============================================================================
# Window
# =============================================================================

# fps = 60                  # Target frame rate
# width = 900
# height = 600

# =============================================================================
# Playback
# =============================================================================

# controls = "full"         # "full" shows play/pause/stop and keeps running
#                           # after the track ends, "minimal" exits on completion
# autoplay = true           # Start playing as soon as the window opens
# seek_step_secs = 5.0      # Left/Right arrow seek distance

# =============================================================================
# Visuals
# =============================================================================

# dream_on_start = false    # Open in dream mode
# particles = 48            # Background particle count
# mesh_cols = 36            # Wave mesh grid size
# mesh_rows = 14
# trail_retain = 0.90       # Dream trail fade per frame (0-1, higher = longer trails)
# trail_zoom = 1.004        # Dream trail outward drift per frame
# particle_seed = 1234      # Fixed seed for reproducible particle layouts
"#;

#[derive(Serialize, Deserialize, Default, Clone, Debug, PartialEq)]
pub struct Config {
    pub fps: Option<u32>,
    pub width: Option<u32>,
    pub height: Option<u32>,

    pub controls: Option<String>,
    pub autoplay: Option<bool>,
    pub seek_step_secs: Option<f64>,

    pub dream_on_start: Option<bool>,
    pub particles: Option<usize>,
    pub mesh_cols: Option<usize>,
    pub mesh_rows: Option<usize>,
    pub trail_retain: Option<f32>,
    pub trail_zoom: Option<f32>,
    pub particle_seed: Option<u64>,
}

impl Config {
    fn path() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(".track-viz.toml"))
    }

    /// Load from the home directory, writing the template on first run.
    /// Unreadable or malformed files fall back to defaults.
    pub fn load() -> Self {
        let path = match Self::path() {
            Some(p) => p,
            None => return Self::default(),
        };

        if !path.exists() {
            match fs::write(&path, CONFIG_TEMPLATE) {
                Ok(()) => log::info!("Created config template at {:?}", path),
                Err(e) => log::debug!("Could not write config template {:?}: {}", path, e),
            }
        }

        let content = match fs::read_to_string(&path) {
            Ok(s) => s,
            Err(e) => {
                log::warn!("Could not read {:?}: {}; using defaults", path, e);
                return Self::default();
            }
        };

        match Self::from_toml_str(&content) {
            Ok(config) => config,
            Err(e) => {
                log::warn!("{}; using defaults", e);
                Self::default()
            }
        }
    }

    pub fn from_toml_str(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|e| VizError::Config(e.to_string()))
    }

    pub fn fps(&self) -> u32 {
        self.fps.unwrap_or(60).clamp(1, 240)
    }
    pub fn width(&self) -> u32 {
        self.width.unwrap_or(900).max(1)
    }
    pub fn height(&self) -> u32 {
        self.height.unwrap_or(600).max(1)
    }

    /// True unless `controls = "minimal"`
    pub fn full_controls(&self) -> bool {
        !matches!(self.controls.as_deref(), Some(c) if c.eq_ignore_ascii_case("minimal"))
    }
    pub fn autoplay(&self) -> bool {
        self.autoplay.unwrap_or(true)
    }
    pub fn seek_step_secs(&self) -> f64 {
        self.seek_step_secs.unwrap_or(5.0).abs()
    }

    pub fn dream_on_start(&self) -> bool {
        self.dream_on_start.unwrap_or(false)
    }
    pub fn particles(&self) -> usize {
        self.particles.unwrap_or(48)
    }
    pub fn mesh_cols(&self) -> usize {
        self.mesh_cols.unwrap_or(36)
    }
    pub fn mesh_rows(&self) -> usize {
        self.mesh_rows.unwrap_or(14)
    }
    pub fn trail_retain(&self) -> f32 {
        self.trail_retain.unwrap_or(0.90).clamp(0.0, 1.0)
    }
    pub fn trail_zoom(&self) -> f32 {
        self.trail_zoom.unwrap_or(1.004).clamp(0.9, 1.1)
    }
}
