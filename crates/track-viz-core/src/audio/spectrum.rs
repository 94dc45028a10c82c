//! FFT spectrum extraction.
//!
//! Turns the sample window under the playhead into a fixed number of
//! log-compressed magnitude bins, normalized so the loudest bin is 1.0.

use num_complex::Complex;
use rustfft::{Fft, FftPlanner};
use std::sync::Arc;

use super::Waveform;

/// Samples per analysis window
pub const CHUNK_SIZE: usize = 1024;

/// Number of spectrum bins handed to the layers
pub const NUM_BARS: usize = 100;

// Bins are taken from the non-negative half of the transform.
const _: () = assert!(NUM_BARS <= CHUNK_SIZE / 2);

/// Normalized magnitudes, always exactly `NUM_BARS` long.
#[derive(Clone, Debug, PartialEq)]
pub struct Spectrum {
    bins: [f32; NUM_BARS],
}

impl Default for Spectrum {
    fn default() -> Self {
        Self::silent()
    }
}

impl Spectrum {
    pub fn silent() -> Self {
        Self {
            bins: [0.0; NUM_BARS],
        }
    }

    /// Build from raw values; each is clamped into [0, 1] and non-finite values become 0.
    pub fn from_bins(bins: [f32; NUM_BARS]) -> Self {
        let mut bins = bins;
        for b in bins.iter_mut() {
            *b = if b.is_finite() { b.clamp(0.0, 1.0) } else { 0.0 };
        }
        Self { bins }
    }

    pub fn bins(&self) -> &[f32; NUM_BARS] {
        &self.bins
    }

    pub fn len(&self) -> usize {
        NUM_BARS
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    /// Bin value, 0.0 for out-of-range indices
    pub fn get(&self, idx: usize) -> f32 {
        self.bins.get(idx).copied().unwrap_or(0.0)
    }

    pub fn peak(&self) -> f32 {
        self.bins.iter().cloned().fold(0.0f32, f32::max)
    }

    pub fn sum(&self) -> f32 {
        self.bins.iter().sum()
    }

    /// Average magnitude (0-1)
    pub fn mean(&self) -> f32 {
        self.sum() / NUM_BARS as f32
    }

    pub fn is_silent(&self) -> bool {
        self.bins.iter().all(|&b| b == 0.0)
    }

    /// Bin index for grid column `column` of `columns`, spreading the
    /// spectrum evenly across the grid with nearest-index rounding.
    pub fn column_index(column: usize, columns: usize) -> usize {
        if columns < 2 {
            return 0;
        }
        let t = column.min(columns - 1) as f32 / (columns - 1) as f32;
        ((t * (NUM_BARS - 1) as f32).round() as usize).min(NUM_BARS - 1)
    }

    /// Magnitude at grid column `column` of `columns`.
    pub fn at_column(&self, column: usize, columns: usize) -> f32 {
        self.bins[Self::column_index(column, columns)]
    }
}

/// Spectrum extractor with a pre-planned FFT and reusable buffers.
///
/// The buffers are scratch space only; the result depends on nothing but
/// the input window.
pub struct SpectrumExtractor {
    fft: Arc<dyn Fft<f32>>,
    fft_buffer: Vec<Complex<f32>>,
    window: Vec<f32>,
}

impl Default for SpectrumExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl SpectrumExtractor {
    pub fn new() -> Self {
        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(CHUNK_SIZE);

        Self {
            fft,
            fft_buffer: vec![Complex::new(0.0, 0.0); CHUNK_SIZE],
            window: vec![0.0; CHUNK_SIZE],
        }
    }

    /// Spectrum for the instant `seconds` into the track.
    pub fn extract_at(&mut self, waveform: &Waveform, seconds: f64) -> Spectrum {
        let center = waveform.index_at(seconds);
        let mut window = std::mem::take(&mut self.window);
        waveform.read_window_into(center, &mut window);
        let spectrum = self.extract(&window);
        self.window = window;
        spectrum
    }

    /// Spectrum of a sample window. Shorter windows are zero-padded to
    /// `CHUNK_SIZE`, longer ones are truncated.
    pub fn extract(&mut self, samples: &[f32]) -> Spectrum {
        let sample_count = samples.len().min(CHUNK_SIZE);

        for i in 0..CHUNK_SIZE {
            let s = if i < sample_count { samples[i] } else { 0.0 };
            let s = if s.is_finite() { s } else { 0.0 };
            self.fft_buffer[i] = Complex::new(s, 0.0);
        }

        self.fft.process(&mut self.fft_buffer);

        let mut bins = [0.0f32; NUM_BARS];
        for (bin, c) in bins.iter_mut().zip(self.fft_buffer.iter()) {
            let mag = c.norm();
            *bin = if mag.is_finite() { mag.ln_1p() } else { 0.0 };
        }

        // Silent window: leave everything at zero instead of dividing by zero
        let peak = bins.iter().cloned().fold(0.0f32, f32::max);
        if peak > 0.0 {
            for bin in bins.iter_mut() {
                *bin /= peak;
            }
        }

        Spectrum::from_bins(bins)
    }
}
