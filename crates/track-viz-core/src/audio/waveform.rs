//! Decoded mono waveform and bounds-safe windowed reads.

use crate::error::{Result, VizError};

/// Fully decoded mono track. Immutable once built.
#[derive(Clone, Debug)]
pub struct Waveform {
    samples: Vec<f32>,
    sample_rate: u32,
    duration: f64,
}

impl Waveform {
    /// Build from normalized samples. Duration is derived from the sample count.
    /// Samples are clamped into [-1, 1] and non-finite values are zeroed.
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Result<Self> {
        if sample_rate == 0 {
            return Err(VizError::UnsupportedFormat("sample rate of 0 Hz".into()));
        }
        if samples.is_empty() {
            return Err(VizError::EmptyAudio);
        }

        let samples: Vec<f32> = samples
            .into_iter()
            .map(|s| if s.is_finite() { s.clamp(-1.0, 1.0) } else { 0.0 })
            .collect();
        let duration = samples.len() as f64 / sample_rate as f64;

        Ok(Self {
            samples,
            sample_rate,
            duration,
        })
    }

    /// A silent track, mostly for tests and demos.
    pub fn silent(sample_rate: u32, seconds: f64) -> Result<Self> {
        let len = (seconds.max(0.0) * sample_rate as f64).round() as usize;
        Self::new(vec![0.0; len], sample_rate)
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Total length in seconds
    pub fn duration(&self) -> f64 {
        self.duration
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Sample index for a playback offset, truncated. Negative offsets map to 0.
    pub fn index_at(&self, seconds: f64) -> usize {
        if !seconds.is_finite() || seconds <= 0.0 {
            return 0;
        }
        (seconds * self.sample_rate as f64) as usize
    }

    /// `length` samples centered on `center`, zero-padded wherever the window
    /// hangs off either end of the buffer.
    pub fn read_window(&self, center: usize, length: usize) -> Vec<f32> {
        let mut out = vec![0.0; length];
        self.read_window_into(center, &mut out);
        out
    }

    /// Same as [`read_window`](Self::read_window) into a caller-owned buffer.
    pub fn read_window_into(&self, center: usize, out: &mut [f32]) {
        out.fill(0.0);

        let len = out.len() as i64;
        let start = i64::try_from(center).unwrap_or(i64::MAX) - len / 2;
        let end = start.saturating_add(len);

        let src_start = start.max(0);
        let src_end = end.min(self.samples.len() as i64);
        if src_start >= src_end {
            return;
        }

        let dst_start = (src_start - start) as usize;
        let count = (src_end - src_start) as usize;
        out[dst_start..dst_start + count]
            .copy_from_slice(&self.samples[src_start as usize..src_end as usize]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp(len: usize) -> Waveform {
        let samples = (0..len).map(|i| i as f32 / len as f32).collect();
        Waveform::new(samples, 1000).unwrap()
    }

    #[test]
    fn test_duration_from_sample_count() {
        let w = Waveform::silent(44100, 2.5).unwrap();
        assert_eq!(w.len(), 110250);
        assert!((w.duration() - 2.5).abs() < 1e-9);
    }

    #[test]
    fn test_rejects_empty_and_zero_rate() {
        assert!(matches!(Waveform::new(vec![], 44100), Err(VizError::EmptyAudio)));
        assert!(Waveform::new(vec![0.0], 0).is_err());
    }

    #[test]
    fn test_samples_are_clamped() {
        let w = Waveform::new(vec![2.0, -3.0, f32::NAN, 0.5], 10).unwrap();
        assert_eq!(w.samples(), &[1.0, -1.0, 0.0, 0.5]);
    }

    #[test]
    fn test_interior_window_is_exact() {
        let w = ramp(100);
        let win = w.read_window(50, 10);
        assert_eq!(win.len(), 10);
        assert_eq!(win[0], w.samples()[45]);
        assert_eq!(win[9], w.samples()[54]);
    }

    #[test]
    fn test_tail_is_zero_padded() {
        let w = ramp(100);
        let win = w.read_window(98, 10);
        assert_eq!(win.len(), 10);
        assert_eq!(win[0], w.samples()[93]);
        assert_eq!(win[6], w.samples()[99]);
        assert!(win[7..].iter().all(|&s| s == 0.0));
    }

    #[test]
    fn test_head_is_zero_padded() {
        let w = ramp(100);
        let win = w.read_window(2, 10);
        assert!(win[..3].iter().all(|&s| s == 0.0));
        assert_eq!(win[3], w.samples()[0]);
    }

    #[test]
    fn test_far_out_of_range_is_all_zero() {
        let w = ramp(100);
        let win = w.read_window(usize::MAX / 4, 1024);
        assert_eq!(win.len(), 1024);
        assert!(win.iter().all(|&s| s == 0.0));
    }

    #[test]
    fn test_window_longer_than_buffer() {
        let w = ramp(4);
        let win = w.read_window(2, 16);
        assert_eq!(win.len(), 16);
        assert_eq!(&win[6..10], w.samples());
    }

    #[test]
    fn test_huge_center_is_all_padding() {
        let w = ramp(100);
        for center in [usize::MAX, usize::MAX / 2 + 1, 1 << 40] {
            assert_eq!(w.read_window(center, 8), vec![0.0; 8]);
        }
    }

    #[test]
    fn test_index_at_truncates() {
        let w = Waveform::silent(1000, 1.0).unwrap();
        assert_eq!(w.index_at(0.0015), 1);
        assert_eq!(w.index_at(-3.0), 0);
        assert_eq!(w.index_at(f64::NAN), 0);
    }
}
