//! Playback state machine.
//!
//! Owns the audio device and reconciles play/pause/stop/seek commands with the
//! device's reported elapsed time into one authoritative playback position.
//! The frame loop only ever calls [`Transport::advance`]; it never queries the
//! device itself.

use crate::error::{DeviceCommand, Result, VizError};

/// Tolerance for treating a position as "at the end of the track"
pub const END_EPSILON_SECS: f64 = 0.05;

/// How long the device may sit inactive away from the end before playback is
/// considered stalled.
const STALL_TIMEOUT_SECS: f64 = 0.5;

/// External audio output.
///
/// Implementations must accept repeated `play` calls as re-seeks, and
/// `elapsed_ms` must return immediately with the best value it has.
pub trait AudioDevice {
    /// Hand the device the samples to play.
    fn load(&mut self, waveform: &crate::audio::Waveform) -> Result<()>;

    /// Start (or restart) playback at `start_seconds`.
    fn play(&mut self, start_seconds: f64) -> Result<()>;

    fn pause(&mut self) -> Result<()>;

    fn stop(&mut self) -> Result<()>;

    /// Whether audio is currently coming out.
    fn is_active(&self) -> bool;

    /// Milliseconds of audio played since the most recent `play`.
    fn elapsed_ms(&self) -> f64;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackStatus {
    Stopped,
    Playing,
    Paused,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaybackState {
    pub status: PlaybackStatus,
    /// Last known playback offset, always within [0, duration]
    pub position_seconds: f64,
    /// Device elapsed time seen on the previous frame, to spot clock resets
    pub last_reported_device_ms: f64,
}

impl Default for PlaybackState {
    fn default() -> Self {
        Self {
            status: PlaybackStatus::Stopped,
            position_seconds: 0.0,
            last_reported_device_ms: 0.0,
        }
    }
}

/// What happened during one [`Transport::advance`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportEvent {
    None,
    /// Playback reached the end of the track
    Completed,
    /// Device went quiet mid-track; playback was paused in place
    Stalled,
}

/// Read-only snapshot for layers and the UI.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaybackView {
    pub status: PlaybackStatus,
    pub position: f64,
    pub duration: f64,
}

impl PlaybackView {
    /// Fraction of the track played, 0-1
    pub fn progress(&self) -> f64 {
        if self.duration > 0.0 {
            (self.position / self.duration).clamp(0.0, 1.0)
        } else {
            0.0
        }
    }
}

struct Scrub {
    /// Position before the drag started, restored if the final seek fails
    origin: f64,
}

pub struct Transport<D: AudioDevice> {
    device: D,
    state: PlaybackState,
    duration: f64,
    /// Track offset the device was last told to play from
    segment_start: f64,
    scrub: Option<Scrub>,
    inactive_for: f64,
}

impl<D: AudioDevice> Transport<D> {
    pub fn new(device: D, duration: f64) -> Self {
        let duration = if duration.is_finite() {
            duration.max(0.0)
        } else {
            0.0
        };
        Self {
            device,
            state: PlaybackState::default(),
            duration,
            segment_start: 0.0,
            scrub: None,
            inactive_for: 0.0,
        }
    }

    pub fn device(&self) -> &D {
        &self.device
    }

    pub fn device_mut(&mut self) -> &mut D {
        &mut self.device
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn status(&self) -> PlaybackStatus {
        self.state.status
    }

    pub fn position(&self) -> f64 {
        self.state.position_seconds
    }

    pub fn duration(&self) -> f64 {
        self.duration
    }

    pub fn is_scrubbing(&self) -> bool {
        self.scrub.is_some()
    }

    pub fn view(&self) -> PlaybackView {
        PlaybackView {
            status: self.state.status,
            position: self.state.position_seconds,
            duration: self.duration,
        }
    }

    fn clamp(&self, seconds: f64) -> f64 {
        if seconds.is_finite() {
            seconds.clamp(0.0, self.duration)
        } else {
            0.0
        }
    }

    fn at_end(&self, seconds: f64) -> bool {
        seconds >= self.duration - END_EPSILON_SECS
    }

    /// Tell the device to play from `seconds` and record the new segment.
    /// State is untouched if the device refuses.
    fn start_segment(&mut self, seconds: f64) -> Result<()> {
        self.device.play(seconds)?;
        self.segment_start = seconds;
        self.state.position_seconds = seconds;
        self.state.last_reported_device_ms = 0.0;
        self.inactive_for = 0.0;
        Ok(())
    }

    /// Start or resume playback. A no-op while already playing.
    pub fn play(&mut self) -> Result<()> {
        let start = match self.state.status {
            PlaybackStatus::Playing => return Ok(()),
            PlaybackStatus::Paused => self.state.position_seconds,
            PlaybackStatus::Stopped => {
                if self.at_end(self.state.position_seconds) {
                    0.0
                } else {
                    self.state.position_seconds
                }
            }
        };

        // Resume re-issues a seek-play; not every device can resume in place.
        self.start_segment(start)?;
        self.state.status = PlaybackStatus::Playing;
        log::debug!("Transport: playing from {:.2}s", start);
        Ok(())
    }

    pub fn pause(&mut self) -> Result<()> {
        if self.state.status != PlaybackStatus::Playing {
            return Ok(());
        }
        self.device.pause()?;
        self.state.status = PlaybackStatus::Paused;
        log::debug!("Transport: paused at {:.2}s", self.state.position_seconds);
        Ok(())
    }

    pub fn toggle_play_pause(&mut self) -> Result<()> {
        match self.state.status {
            PlaybackStatus::Playing => self.pause(),
            PlaybackStatus::Paused | PlaybackStatus::Stopped => self.play(),
        }
    }

    /// Halt playback and rewind to 0.
    pub fn stop(&mut self) -> Result<()> {
        if self.state.status != PlaybackStatus::Stopped {
            self.device.stop()?;
            log::debug!("Transport: stopped");
        }
        self.state.status = PlaybackStatus::Stopped;
        self.state.position_seconds = 0.0;
        self.state.last_reported_device_ms = 0.0;
        self.segment_start = 0.0;
        self.scrub = None;
        Ok(())
    }

    /// Jump to `seconds` (clamped). Playback restarts there if currently
    /// playing; paused and stopped transports only move the position.
    pub fn seek(&mut self, seconds: f64) -> Result<()> {
        let target = self.clamp(seconds);
        if self.state.status == PlaybackStatus::Playing {
            self.start_segment(target)?;
        } else {
            self.state.position_seconds = target;
        }
        log::debug!("Transport: seek to {:.2}s", target);
        Ok(())
    }

    /// Seek to a fraction (clamped to 0-1) of the track.
    pub fn seek_to_fraction(&mut self, fraction: f64) -> Result<()> {
        self.seek(clamp_fraction(fraction) * self.duration)
    }

    /// Relative seek, used by keyboard shortcuts.
    pub fn seek_by(&mut self, delta_seconds: f64) -> Result<()> {
        self.seek(self.state.position_seconds + delta_seconds)
    }

    /// Start dragging the seek handle. Device time stops overwriting the
    /// position until [`end_scrub`](Self::end_scrub).
    pub fn begin_scrub(&mut self, fraction: f64) {
        if self.scrub.is_none() {
            self.scrub = Some(Scrub {
                origin: self.state.position_seconds,
            });
        }
        self.scrub_to(fraction);
    }

    /// Move the previewed position while dragging.
    pub fn scrub_to(&mut self, fraction: f64) {
        if self.scrub.is_some() {
            self.state.position_seconds = clamp_fraction(fraction) * self.duration;
        }
    }

    /// Release the handle and seek to where it was dropped.
    pub fn end_scrub(&mut self, fraction: f64) -> Result<()> {
        let Some(scrub) = self.scrub.take() else {
            return Ok(());
        };
        let result = self.seek_to_fraction(fraction);
        if result.is_err() {
            self.state.position_seconds = scrub.origin;
        }
        result
    }

    /// Per-frame update. While playing, the device clock overwrites the
    /// position; paused and stopped transports hold their value.
    pub fn advance(&mut self, frame_dt: f64) -> TransportEvent {
        if self.state.status != PlaybackStatus::Playing || self.scrub.is_some() {
            return TransportEvent::None;
        }

        let reported = self.device.elapsed_ms();
        if reported.is_finite() {
            if reported < self.state.last_reported_device_ms {
                // Device restarted its clock behind our back; keep position continuous.
                log::debug!(
                    "Transport: device clock reset ({:.0}ms -> {:.0}ms)",
                    self.state.last_reported_device_ms,
                    reported
                );
                self.segment_start = self.state.position_seconds - reported / 1000.0;
            }
            self.state.last_reported_device_ms = reported;
            self.state.position_seconds = self.clamp(self.segment_start + reported / 1000.0);
        }

        if self.device.is_active() {
            self.inactive_for = 0.0;
            return TransportEvent::None;
        }

        if self.at_end(self.state.position_seconds) {
            self.state.status = PlaybackStatus::Stopped;
            self.state.position_seconds = self.duration;
            log::debug!("Transport: reached end of track");
            return TransportEvent::Completed;
        }

        if frame_dt.is_finite() && frame_dt > 0.0 {
            self.inactive_for += frame_dt;
        }
        if self.inactive_for >= STALL_TIMEOUT_SECS {
            self.inactive_for = 0.0;
            self.state.status = PlaybackStatus::Paused;
            log::warn!(
                "Audio device went idle at {:.2}s; pausing",
                self.state.position_seconds
            );
            return TransportEvent::Stalled;
        }

        TransportEvent::None
    }

    /// Stop the device on the way out, logging instead of failing.
    pub fn shutdown(&mut self) {
        if let Err(e) = self.stop() {
            log::warn!("Failed to stop audio on exit: {}", e);
        }
    }
}

/// Clamp a seek fraction into 0-1; NaN maps to 0.
pub fn clamp_fraction(fraction: f64) -> f64 {
    if fraction.is_nan() {
        0.0
    } else {
        fraction.clamp(0.0, 1.0)
    }
}

/// Scriptable device for tests and headless runs.
///
/// Time only moves when [`ManualDevice::tick`] is called, so frame-by-frame
/// sequences are reproducible.
#[derive(Debug, Default)]
pub struct ManualDevice {
    duration_ms: f64,
    start_ms: f64,
    elapsed_ms: f64,
    active: bool,
    /// Commands to reject, one per failure
    pub fail_next: Vec<DeviceCommand>,
    /// Every accepted command, in order
    pub log: Vec<(DeviceCommand, f64)>,
}

impl ManualDevice {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance the device clock by `seconds` of played audio.
    pub fn tick(&mut self, seconds: f64) {
        if !self.active {
            return;
        }
        self.elapsed_ms += seconds * 1000.0;
        // Sub-microsecond slack so accumulated frame ticks land on the end
        if self.start_ms + self.elapsed_ms >= self.duration_ms - 1e-6 {
            self.elapsed_ms = (self.duration_ms - self.start_ms).max(0.0);
            self.active = false;
        }
    }

    /// Make the device report a fresh clock without a `play` call.
    pub fn reset_clock(&mut self) {
        self.start_ms += self.elapsed_ms;
        self.elapsed_ms = 0.0;
    }

    /// Go silent without reaching the end.
    pub fn go_idle(&mut self) {
        self.active = false;
    }

    fn check(&mut self, command: DeviceCommand) -> Result<()> {
        if let Some(idx) = self.fail_next.iter().position(|c| *c == command) {
            self.fail_next.remove(idx);
            return Err(VizError::device(command, "rejected by test device"));
        }
        Ok(())
    }
}

impl AudioDevice for ManualDevice {
    fn load(&mut self, waveform: &crate::audio::Waveform) -> Result<()> {
        self.check(DeviceCommand::Load)?;
        self.duration_ms = waveform.duration() * 1000.0;
        self.log.push((DeviceCommand::Load, 0.0));
        Ok(())
    }

    fn play(&mut self, start_seconds: f64) -> Result<()> {
        self.check(DeviceCommand::Play)?;
        self.start_ms = start_seconds * 1000.0;
        self.elapsed_ms = 0.0;
        self.active = self.start_ms < self.duration_ms;
        self.log.push((DeviceCommand::Play, start_seconds));
        Ok(())
    }

    fn pause(&mut self) -> Result<()> {
        self.check(DeviceCommand::Pause)?;
        self.active = false;
        self.log.push((DeviceCommand::Pause, 0.0));
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        self.check(DeviceCommand::Stop)?;
        self.active = false;
        self.elapsed_ms = 0.0;
        self.log.push((DeviceCommand::Stop, 0.0));
        Ok(())
    }

    fn is_active(&self) -> bool {
        self.active
    }

    fn elapsed_ms(&self) -> f64 {
        self.elapsed_ms
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::Waveform;
    use approx::assert_relative_eq;

    fn transport(seconds: f64) -> Transport<ManualDevice> {
        let wave = Waveform::silent(1000, seconds).unwrap();
        let mut device = ManualDevice::new();
        device.load(&wave).unwrap();
        Transport::new(device, wave.duration())
    }

    #[test]
    fn test_starts_stopped_at_zero() {
        let t = transport(10.0);
        assert_eq!(t.status(), PlaybackStatus::Stopped);
        assert_eq!(t.position(), 0.0);
    }

    #[test]
    fn test_device_clock_drives_position() {
        let mut t = transport(10.0);
        t.play().unwrap();
        t.device_mut().tick(1.5);
        t.advance(1.5);
        assert_relative_eq!(t.position(), 1.5);
    }

    #[test]
    fn test_pause_freezes_position() {
        let mut t = transport(10.0);
        t.play().unwrap();
        t.device_mut().tick(2.0);
        t.advance(2.0);
        t.pause().unwrap();
        t.device_mut().tick(3.0);
        t.advance(3.0);
        assert_eq!(t.status(), PlaybackStatus::Paused);
        assert_relative_eq!(t.position(), 2.0);
    }

    #[test]
    fn test_resume_reissues_seek_play() {
        let mut t = transport(10.0);
        t.play().unwrap();
        t.device_mut().tick(2.0);
        t.advance(2.0);
        t.pause().unwrap();
        t.play().unwrap();
        let last = t.device().log.last().copied().unwrap();
        assert_eq!(last.0, DeviceCommand::Play);
        assert_relative_eq!(last.1, 2.0);

        t.device_mut().tick(0.5);
        t.advance(0.5);
        assert_relative_eq!(t.position(), 2.5);
    }

    #[test]
    fn test_stop_rewinds() {
        let mut t = transport(10.0);
        t.play().unwrap();
        t.device_mut().tick(4.0);
        t.advance(4.0);
        t.stop().unwrap();
        assert_eq!(t.status(), PlaybackStatus::Stopped);
        assert_eq!(t.position(), 0.0);
    }

    #[test]
    fn test_failed_play_keeps_prior_state() {
        let mut t = transport(10.0);
        t.device_mut().fail_next.push(DeviceCommand::Play);
        let err = t.play().unwrap_err();
        assert!(matches!(err, VizError::Device { command: DeviceCommand::Play, .. }));
        assert_eq!(t.status(), PlaybackStatus::Stopped);
        assert_eq!(t.position(), 0.0);
    }

    #[test]
    fn test_failed_pause_keeps_playing() {
        let mut t = transport(10.0);
        t.play().unwrap();
        t.device_mut().fail_next.push(DeviceCommand::Pause);
        assert!(t.pause().is_err());
        assert_eq!(t.status(), PlaybackStatus::Playing);
    }

    #[test]
    fn test_failed_seek_while_playing_keeps_position() {
        let mut t = transport(10.0);
        t.play().unwrap();
        t.device_mut().tick(3.0);
        t.advance(3.0);
        t.device_mut().fail_next.push(DeviceCommand::Play);
        assert!(t.seek(8.0).is_err());
        assert_relative_eq!(t.position(), 3.0);
        assert_eq!(t.status(), PlaybackStatus::Playing);
    }

    #[test]
    fn test_seek_is_clamped() {
        let mut t = transport(10.0);
        t.seek(25.0).unwrap();
        assert_eq!(t.position(), 10.0);
        t.seek(-4.0).unwrap();
        assert_eq!(t.position(), 0.0);
        t.seek(f64::NAN).unwrap();
        assert_eq!(t.position(), 0.0);
    }

    #[test]
    fn test_seek_while_paused_does_not_touch_device() {
        let mut t = transport(10.0);
        t.play().unwrap();
        t.pause().unwrap();
        let commands = t.device().log.len();
        t.seek_to_fraction(0.25).unwrap();
        assert_eq!(t.device().log.len(), commands);
        assert_eq!(t.status(), PlaybackStatus::Paused);
        assert_relative_eq!(t.position(), 2.5);
    }

    #[test]
    fn test_seek_by_moves_relative() {
        let mut t = transport(10.0);
        t.seek(4.0).unwrap();
        t.seek_by(5.0).unwrap();
        assert_relative_eq!(t.position(), 9.0);
        t.seek_by(5.0).unwrap();
        assert_relative_eq!(t.position(), 10.0);
    }

    #[test]
    fn test_scrub_suppresses_device_clock() {
        let mut t = transport(10.0);
        t.play().unwrap();
        t.begin_scrub(0.6);
        t.device_mut().tick(1.0);
        t.advance(1.0);
        assert_relative_eq!(t.position(), 6.0);

        t.scrub_to(0.7);
        assert_relative_eq!(t.position(), 7.0);

        t.end_scrub(0.7).unwrap();
        assert!(!t.is_scrubbing());
        t.device_mut().tick(0.5);
        t.advance(0.5);
        assert_relative_eq!(t.position(), 7.5);
    }

    #[test]
    fn test_failed_scrub_release_restores_origin() {
        let mut t = transport(10.0);
        t.play().unwrap();
        t.device_mut().tick(2.0);
        t.advance(2.0);
        t.begin_scrub(0.9);
        t.device_mut().fail_next.push(DeviceCommand::Play);
        assert!(t.end_scrub(0.9).is_err());
        assert_relative_eq!(t.position(), 2.0);
    }

    #[test]
    fn test_natural_end_stops_at_duration() {
        let mut t = transport(2.0);
        t.play().unwrap();
        t.device_mut().tick(2.5);
        assert_eq!(t.advance(2.5), TransportEvent::Completed);
        assert_eq!(t.status(), PlaybackStatus::Stopped);
        assert_eq!(t.position(), 2.0);
        assert_eq!(t.view().progress(), 1.0);
    }

    #[test]
    fn test_play_after_completion_restarts() {
        let mut t = transport(2.0);
        t.play().unwrap();
        t.device_mut().tick(2.0);
        t.advance(2.0);
        t.play().unwrap();
        assert_eq!(t.position(), 0.0);
        assert_eq!(t.status(), PlaybackStatus::Playing);
    }

    #[test]
    fn test_device_clock_reset_keeps_position_continuous() {
        let mut t = transport(10.0);
        t.play().unwrap();
        t.device_mut().tick(3.0);
        t.advance(3.0);
        t.device_mut().reset_clock();
        t.device_mut().tick(0.25);
        t.advance(0.25);
        assert_relative_eq!(t.position(), 3.25);
    }

    #[test]
    fn test_idle_device_mid_track_stalls_to_paused() {
        let mut t = transport(10.0);
        t.play().unwrap();
        t.device_mut().tick(1.0);
        t.advance(1.0);
        t.device_mut().go_idle();
        let mut event = TransportEvent::None;
        for _ in 0..60 {
            event = t.advance(1.0 / 60.0);
            if event != TransportEvent::None {
                break;
            }
        }
        assert_eq!(event, TransportEvent::Stalled);
        assert_eq!(t.status(), PlaybackStatus::Paused);
        assert_relative_eq!(t.position(), 1.0);
    }

    #[test]
    fn test_stop_when_stopped_only_rewinds() {
        let mut t = transport(10.0);
        t.seek(5.0).unwrap();
        t.stop().unwrap();
        assert!(t.device().log.iter().all(|(c, _)| *c != DeviceCommand::Stop));
        assert_eq!(t.position(), 0.0);
    }
}
