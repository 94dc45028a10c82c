//! Command-line argument parsing.

use std::path::PathBuf;

use clap::Parser;
use track_viz_core::Config;

/// Command line arguments
#[derive(Parser, Debug)]
#[command(name = "track-viz")]
#[command(about = "Spectrum visualizer for a single audio file", long_about = None)]
pub struct Cli {
    /// Audio file to play; opens a file picker when omitted
    pub input: Option<PathBuf>,

    /// Seek bar and time label only; exit when the track ends
    #[arg(long)]
    pub minimal: bool,

    /// Start in dream mode
    #[arg(long)]
    pub dream: bool,

    /// Target frame rate
    #[arg(long, value_name = "FPS")]
    pub fps: Option<u32>,

    #[arg(long, value_name = "PIXELS")]
    pub width: Option<u32>,

    #[arg(long, value_name = "PIXELS")]
    pub height: Option<u32>,
}

impl Cli {
    /// Override config values with the flags that were given.
    pub fn apply(&self, config: &mut Config) {
        if self.minimal {
            config.controls = Some("minimal".to_string());
        }
        if self.dream {
            config.dream_on_start = Some(true);
        }
        if let Some(fps) = self.fps {
            config.fps = Some(fps);
        }
        if let Some(width) = self.width {
            config.width = Some(width);
        }
        if let Some(height) = self.height {
            config.height = Some(height);
        }
    }
}
