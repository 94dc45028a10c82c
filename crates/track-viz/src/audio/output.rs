//! Audio output devices.
//!
//! [`CpalDevice`] plays a decoded waveform from memory through the default
//! output device. [`Output`] falls back to a silent clock when no device can
//! be opened so the visuals still run.

use std::cell::Cell;
use std::sync::{Arc, Mutex};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{FromSample, Sample, SizedSample};
use track_viz_core::{AudioDevice, DeviceCommand, ManualDevice, Result, VizError, Waveform};

/// Shared between the UI thread and the audio callback.
#[derive(Default)]
struct Playhead {
    samples: Arc<Vec<f32>>,
    source_rate: f64,
    /// Fractional read position in source samples
    cursor: f64,
    /// Cursor value at the most recent `play`
    start_index: f64,
    active: bool,
}

impl Playhead {
    /// Next mono sample, advancing by `step` source samples.
    fn next(&mut self, step: f64) -> f32 {
        if !self.active {
            return 0.0;
        }
        let idx = self.cursor as usize;
        match self.samples.get(idx) {
            Some(&s) => {
                self.cursor += step;
                s
            }
            None => {
                self.cursor = self.samples.len() as f64;
                self.active = false;
                0.0
            }
        }
    }

    /// Jump to `seconds` and start playing. False when that is past the end.
    fn start_at(&mut self, seconds: f64) -> bool {
        let index = (seconds.max(0.0) * self.source_rate).min(self.samples.len() as f64);
        self.cursor = index;
        self.start_index = index;
        self.active = index < self.samples.len() as f64;
        self.active
    }

    fn rewind(&mut self) {
        self.active = false;
        self.cursor = 0.0;
        self.start_index = 0.0;
    }

    fn elapsed_ms(&self) -> f64 {
        if self.source_rate <= 0.0 {
            return 0.0;
        }
        (self.cursor - self.start_index).max(0.0) / self.source_rate * 1000.0
    }
}

fn write_frames<T>(data: &mut [T], channels: usize, device_rate: f64, playhead: &Mutex<Playhead>)
where
    T: SizedSample + FromSample<f32>,
{
    let mut head = match playhead.lock() {
        Ok(head) => head,
        Err(_) => {
            data.fill(T::EQUILIBRIUM);
            return;
        }
    };
    let step = head.source_rate / device_rate;
    for frame in data.chunks_mut(channels) {
        let value = T::from_sample(head.next(step));
        frame.fill(value);
    }
}

/// Memory-backed playback through cpal.
pub struct CpalDevice {
    _stream: cpal::Stream,
    device_rate: f64,
    playhead: Arc<Mutex<Playhead>>,
    // Last values read, returned when the callback holds the lock
    last_active: Cell<bool>,
    last_elapsed_ms: Cell<f64>,
}

impl CpalDevice {
    /// Open the default output device and start an idle stream.
    pub fn open() -> Result<Self> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or_else(|| VizError::device(DeviceCommand::Load, "no audio output device found"))?;
        let supported = device
            .default_output_config()
            .map_err(|e| VizError::device(DeviceCommand::Load, e.to_string()))?;

        log::info!(
            "Audio: {} @ {}Hz",
            device.name().unwrap_or_else(|_| "Unknown".to_string()),
            supported.sample_rate().0
        );

        let device_rate = supported.sample_rate().0 as f64;
        let playhead = Arc::new(Mutex::new(Playhead::default()));
        let stream = match supported.sample_format() {
            cpal::SampleFormat::F32 => build_stream::<f32>(&device, &supported.config(), &playhead),
            cpal::SampleFormat::I16 => build_stream::<i16>(&device, &supported.config(), &playhead),
            cpal::SampleFormat::U16 => build_stream::<u16>(&device, &supported.config(), &playhead),
            other => Err(VizError::device(
                DeviceCommand::Load,
                format!("unsupported output sample format {:?}", other),
            )),
        }?;
        stream
            .play()
            .map_err(|e| VizError::device(DeviceCommand::Play, e.to_string()))?;

        Ok(Self {
            _stream: stream,
            device_rate,
            playhead,
            last_active: Cell::new(false),
            last_elapsed_ms: Cell::new(0.0),
        })
    }

    fn with_head<R>(&self, command: DeviceCommand, f: impl FnOnce(&mut Playhead) -> R) -> Result<R> {
        let mut head = self
            .playhead
            .lock()
            .map_err(|_| VizError::device(command, "audio thread panicked"))?;
        Ok(f(&mut head))
    }
}

fn build_stream<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    playhead: &Arc<Mutex<Playhead>>,
) -> Result<cpal::Stream>
where
    T: SizedSample + FromSample<f32>,
{
    let channels = config.channels.max(1) as usize;
    let device_rate = config.sample_rate.0 as f64;
    let playhead = Arc::clone(playhead);

    device
        .build_output_stream(
            config,
            move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
                write_frames(data, channels, device_rate, &playhead);
            },
            |err| log::error!("Audio stream error: {}", err),
            None,
        )
        .map_err(|e| VizError::device(DeviceCommand::Load, e.to_string()))
}

impl AudioDevice for CpalDevice {
    fn load(&mut self, waveform: &Waveform) -> Result<()> {
        log::debug!(
            "Output: loading {} samples at {}Hz (device {}Hz)",
            waveform.len(),
            waveform.sample_rate(),
            self.device_rate
        );
        self.with_head(DeviceCommand::Load, |head| {
            *head = Playhead {
                samples: Arc::new(waveform.samples().to_vec()),
                source_rate: waveform.sample_rate() as f64,
                ..Playhead::default()
            };
        })
    }

    // Each transition refreshes the cached reads, since the callback may
    // hold the lock on the next `is_active`/`elapsed_ms`.
    fn play(&mut self, start_seconds: f64) -> Result<()> {
        let active = self.with_head(DeviceCommand::Play, |head| head.start_at(start_seconds))?;
        self.last_active.set(active);
        self.last_elapsed_ms.set(0.0);
        Ok(())
    }

    fn pause(&mut self) -> Result<()> {
        let elapsed = self.with_head(DeviceCommand::Pause, |head| {
            head.active = false;
            head.elapsed_ms()
        })?;
        self.last_active.set(false);
        self.last_elapsed_ms.set(elapsed);
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        self.with_head(DeviceCommand::Stop, Playhead::rewind)?;
        self.last_active.set(false);
        self.last_elapsed_ms.set(0.0);
        Ok(())
    }

    fn is_active(&self) -> bool {
        if let Ok(head) = self.playhead.try_lock() {
            self.last_active.set(head.active);
        }
        self.last_active.get()
    }

    fn elapsed_ms(&self) -> f64 {
        if let Ok(head) = self.playhead.try_lock() {
            self.last_elapsed_ms.set(head.elapsed_ms());
        }
        self.last_elapsed_ms.get()
    }
}

/// Whichever output could be opened.
pub enum Output {
    Cpal(CpalDevice),
    /// No sound; the clock advances with the frame loop
    Silent(ManualDevice),
}

impl Output {
    /// Try the real device, falling back to a silent clock.
    pub fn open() -> Self {
        match CpalDevice::open() {
            Ok(device) => Output::Cpal(device),
            Err(e) => {
                log::warn!("{}; continuing without sound", e);
                Output::Silent(ManualDevice::new())
            }
        }
    }

    /// Advance the silent clock. Real devices keep their own time.
    pub fn tick(&mut self, seconds: f64) {
        if let Output::Silent(device) = self {
            device.tick(seconds);
        }
    }
}

impl AudioDevice for Output {
    fn load(&mut self, waveform: &Waveform) -> Result<()> {
        match self {
            Output::Cpal(d) => d.load(waveform),
            Output::Silent(d) => d.load(waveform),
        }
    }

    fn play(&mut self, start_seconds: f64) -> Result<()> {
        match self {
            Output::Cpal(d) => d.play(start_seconds),
            Output::Silent(d) => d.play(start_seconds),
        }
    }

    fn pause(&mut self) -> Result<()> {
        match self {
            Output::Cpal(d) => d.pause(),
            Output::Silent(d) => d.pause(),
        }
    }

    fn stop(&mut self) -> Result<()> {
        match self {
            Output::Cpal(d) => d.stop(),
            Output::Silent(d) => d.stop(),
        }
    }

    fn is_active(&self) -> bool {
        match self {
            Output::Cpal(d) => d.is_active(),
            Output::Silent(d) => d.is_active(),
        }
    }

    fn elapsed_ms(&self) -> f64 {
        match self {
            Output::Cpal(d) => d.elapsed_ms(),
            Output::Silent(d) => d.elapsed_ms(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn head(samples: &[f32], rate: f64) -> Playhead {
        Playhead {
            samples: Arc::new(samples.to_vec()),
            source_rate: rate,
            active: true,
            ..Playhead::default()
        }
    }

    #[test]
    fn test_playhead_runs_out_and_goes_idle() {
        let mut h = head(&[0.1, 0.2, 0.3], 1000.0);
        let out: Vec<f32> = (0..5).map(|_| h.next(1.0)).collect();
        assert_eq!(out, vec![0.1, 0.2, 0.3, 0.0, 0.0]);
        assert!(!h.active);
        assert_eq!(h.elapsed_ms(), 3.0);
    }

    #[test]
    fn test_playhead_resamples_by_nearest() {
        // Device runs twice as fast as the source
        let mut h = head(&[1.0, 2.0], 1000.0);
        let out: Vec<f32> = (0..4).map(|_| h.next(0.5)).collect();
        assert_eq!(out, vec![1.0, 1.0, 2.0, 2.0]);
    }

    #[test]
    fn test_start_at_seeks_and_measures_from_there() {
        let samples: Vec<f32> = (0..10).map(|i| i as f32).collect();
        let mut h = head(&samples, 1.0);
        h.active = false;
        assert!(h.start_at(4.0));
        assert_eq!(h.next(1.0), 4.0);
        assert_eq!(h.next(1.0), 5.0);
        assert_eq!(h.elapsed_ms(), 2000.0);

        // Starting at or past the end never goes active
        assert!(!h.start_at(10.0));
        assert!(!h.start_at(50.0));
        assert!(!h.active);
        assert_eq!(h.elapsed_ms(), 0.0);
    }

    #[test]
    fn test_rewind_goes_idle_at_zero() {
        let mut h = head(&[0.1, 0.2, 0.3], 1000.0);
        h.next(1.0);
        h.rewind();
        assert!(!h.active);
        assert_eq!(h.cursor, 0.0);
        assert_eq!(h.elapsed_ms(), 0.0);
        assert_eq!(h.next(1.0), 0.0);
    }

    #[test]
    fn test_write_frames_fans_out_channels() {
        let playhead = Mutex::new(head(&[0.5, -0.5], 100.0));
        let mut data = [0.0f32; 6];
        write_frames(&mut data, 2, 100.0, &playhead);
        assert_eq!(data, [0.5, 0.5, -0.5, -0.5, 0.0, 0.0]);
    }

    #[test]
    fn test_silent_output_follows_ticks() {
        let wave = Waveform::silent(1000, 2.0).unwrap();
        let mut out = Output::Silent(ManualDevice::new());
        out.load(&wave).unwrap();
        out.play(0.5).unwrap();
        out.tick(0.25);
        assert!(out.is_active());
        assert!((out.elapsed_ms() - 250.0).abs() < 1e-9);
    }
}
