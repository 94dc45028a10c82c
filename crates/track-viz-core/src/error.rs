//! Error taxonomy for loading audio and driving the output device.
//!
//! Silent windows and out-of-range seek arithmetic are not errors: the
//! spectrum falls back to all zeros and positions are clamped in place.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Transport command that an audio device can reject.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceCommand {
    Load,
    Play,
    Pause,
    Stop,
}

impl fmt::Display for DeviceCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DeviceCommand::Load => "load",
            DeviceCommand::Play => "play",
            DeviceCommand::Pause => "pause",
            DeviceCommand::Stop => "stop",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
pub enum VizError {
    #[error("unsupported audio format: {0}")]
    UnsupportedFormat(String),

    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("audio file contains no samples")]
    EmptyAudio,

    #[error("audio device rejected {command}: {reason}")]
    Device {
        command: DeviceCommand,
        reason: String,
    },

    #[error("invalid config: {0}")]
    Config(String),
}

impl VizError {
    pub fn device(command: DeviceCommand, reason: impl Into<String>) -> Self {
        VizError::Device {
            command,
            reason: reason.into(),
        }
    }

    /// True for errors that prevent a session from starting.
    pub fn is_load_failure(&self) -> bool {
        matches!(
            self,
            VizError::UnsupportedFormat(_) | VizError::Io { .. } | VizError::EmptyAudio
        )
    }
}

pub type Result<T> = std::result::Result<T, VizError>;
