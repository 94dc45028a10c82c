mod spectrum;
mod waveform;

pub use spectrum::{Spectrum, SpectrumExtractor, CHUNK_SIZE, NUM_BARS};
pub use waveform::Waveform;
