//! Frame-synchronous spectral visualization engine.
//!
//! Everything here is independent of the window system and the audio
//! backend: the binary supplies an [`AudioDevice`] and a [`Surface`]
//! implementation and drives a [`Session`] once per frame.

pub mod audio;
pub mod config;
pub mod draw;
pub mod error;
pub mod geometry;
pub mod input;
pub mod layers;
pub mod session;
pub mod transport;

pub use audio::{Spectrum, SpectrumExtractor, Waveform, CHUNK_SIZE, NUM_BARS};
pub use config::Config;
pub use draw::{Color, DrawCommand, NullSurface, RecordingSurface, Surface};
pub use error::{DeviceCommand, Result, VizError};
pub use geometry::{pt, Bounds, Point};
pub use input::{Action, InputEvent};
pub use layers::{LayerStack, RenderTargets, VisualMode};
pub use session::{ControlsVariant, FrameClock, LoopStatus, Session};
pub use transport::{AudioDevice, ManualDevice, PlaybackState, PlaybackStatus, PlaybackView, Transport};
