//! Frame loop driver.
//!
//! A [`Session`] owns everything one visualization run needs: the waveform,
//! the transport (and through it the audio device), the spectrum extractor and
//! the layer stack. The host calls [`Session::step`] once per frame with the
//! input gathered since the previous frame, then [`Session::render`].

use crate::audio::{Spectrum, SpectrumExtractor, Waveform};
use crate::config::Config;
use crate::error::Result;
use crate::geometry::Bounds;
use crate::input::{Action, InputEvent};
use crate::layers::{
    BarResponse, ButtonKind, FrameContext, LayerSettings, LayerStack, RenderTargets, VisualMode,
};
use crate::transport::{AudioDevice, PlaybackView, Transport, TransportEvent};

/// Longest frame step fed to the simulation, in seconds
pub const MAX_FRAME_DT: f64 = 0.25;
/// How long a notification stays on screen
const NOTICE_SECS: f32 = 3.0;
/// Notifications fade out over their final second
const NOTICE_FADE_SECS: f32 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ControlsVariant {
    /// Time label and seek bar only; the loop ends with the track
    Minimal,
    /// Adds play/pause/stop buttons; the loop outlives the track
    #[default]
    Full,
}

impl ControlsVariant {
    pub fn from_config(config: &Config) -> Self {
        if config.full_controls() {
            ControlsVariant::Full
        } else {
            ControlsVariant::Minimal
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopStatus {
    Running,
    StoppedByUser,
    StoppedByCompletion,
}

/// Converts host frame intervals into simulation steps.
#[derive(Debug, Clone)]
pub struct FrameClock {
    interval: f64,
    frames: u64,
}

impl FrameClock {
    pub fn new(fps: u32) -> Self {
        Self {
            interval: 1.0 / fps.max(1) as f64,
            frames: 0,
        }
    }

    /// Target seconds per frame
    pub fn interval(&self) -> f64 {
        self.interval
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Step for a frame that took `since_last` seconds. The very first frame
    /// (or a bogus interval) counts as one target interval; long stalls are
    /// capped at [`MAX_FRAME_DT`].
    pub fn tick(&mut self, since_last: f64) -> f64 {
        self.frames += 1;
        if !since_last.is_finite() || since_last <= 0.0 {
            return self.interval;
        }
        since_last.min(MAX_FRAME_DT)
    }
}

struct Notice {
    text: String,
    remaining: f32,
}

pub struct Session<D: AudioDevice> {
    waveform: Waveform,
    transport: Transport<D>,
    extractor: SpectrumExtractor,
    layers: LayerStack,
    variant: ControlsVariant,
    autoplay: bool,

    spectrum: Spectrum,
    bounds: Bounds,
    clock: f64,
    dt: f64,
    frames: u64,
    status: LoopStatus,
    notice: Option<Notice>,
}

impl<D: AudioDevice> Session<D> {
    /// Hand the waveform to the device and build the layer stack.
    pub fn new(waveform: Waveform, mut device: D, config: &Config, variant: ControlsVariant) -> Result<Self> {
        device.load(&waveform)?;
        let transport = Transport::new(device, waveform.duration());
        let layers = LayerStack::new(&LayerSettings::from_config(config, variant));
        let bounds = Bounds::from_w_h(config.width() as f32, config.height() as f32);

        Ok(Self {
            waveform,
            transport,
            extractor: SpectrumExtractor::new(),
            layers,
            variant,
            autoplay: config.autoplay(),
            spectrum: Spectrum::silent(),
            bounds,
            clock: 0.0,
            dt: 0.0,
            frames: 0,
            status: LoopStatus::Running,
            notice: None,
        })
    }

    /// Begin playback from the top if autoplay is on.
    pub fn start(&mut self) {
        if self.autoplay {
            let r = self.transport.play();
            self.report(r);
        }
    }

    pub fn waveform(&self) -> &Waveform {
        &self.waveform
    }

    pub fn transport(&self) -> &Transport<D> {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut Transport<D> {
        &mut self.transport
    }

    pub fn layers(&self) -> &LayerStack {
        &self.layers
    }

    pub fn variant(&self) -> ControlsVariant {
        self.variant
    }

    pub fn spectrum(&self) -> &Spectrum {
        &self.spectrum
    }

    pub fn playback(&self) -> PlaybackView {
        self.transport.view()
    }

    pub fn mode(&self) -> VisualMode {
        self.layers.mode()
    }

    pub fn status(&self) -> LoopStatus {
        self.status
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn clock(&self) -> f64 {
        self.clock
    }

    pub fn notice(&self) -> Option<&str> {
        self.notice.as_ref().map(|n| n.text.as_str())
    }

    /// Show a message at the top of the frame for a few seconds.
    pub fn notify(&mut self, text: impl Into<String>) {
        self.notice = Some(Notice {
            text: text.into(),
            remaining: NOTICE_SECS,
        });
    }

    /// Device failures are non-fatal: log, show, keep rendering.
    fn report(&mut self, result: Result<()>) {
        if let Err(e) = result {
            log::warn!("{}", e);
            self.notify(e.to_string());
        }
    }

    pub fn handle_event(&mut self, event: InputEvent) {
        match event {
            InputEvent::Action(action) => self.handle_action(action),
            InputEvent::PointerDown(p) => {
                let response = self.layers.transport_bar_mut().pointer_down(p);
                self.apply_bar(response);
            }
            InputEvent::PointerMoved(p) => {
                let response = self.layers.transport_bar_mut().pointer_moved(p);
                self.apply_bar(response);
            }
            InputEvent::PointerUp(p) => {
                let response = self.layers.transport_bar_mut().pointer_up(p);
                self.apply_bar(response);
            }
        }
    }

    fn handle_action(&mut self, action: Action) {
        let result = match action {
            Action::Quit => {
                log::info!("Quit requested");
                self.status = LoopStatus::StoppedByUser;
                Ok(())
            }
            Action::TogglePlayPause => self.transport.toggle_play_pause(),
            Action::Play => self.transport.play(),
            Action::Pause => self.transport.pause(),
            Action::Stop => self.transport.stop(),
            Action::ToggleDream => {
                self.layers.toggle_mode();
                Ok(())
            }
            Action::SeekBy(delta) => self.transport.seek_by(delta),
        };
        self.report(result);
    }

    fn apply_bar(&mut self, response: BarResponse) {
        let result = match response {
            BarResponse::None => Ok(()),
            BarResponse::BeginScrub(f) => {
                self.transport.begin_scrub(f);
                Ok(())
            }
            BarResponse::Scrub(f) => {
                self.transport.scrub_to(f);
                Ok(())
            }
            BarResponse::EndScrub(f) => self.transport.end_scrub(f),
            BarResponse::Button(ButtonKind::Play) => self.transport.play(),
            BarResponse::Button(ButtonKind::Pause) => self.transport.pause(),
            BarResponse::Button(ButtonKind::Stop) => self.transport.stop(),
        };
        self.report(result);
    }

    /// Run one frame: apply input, advance the transport, extract the
    /// spectrum at the new position and update the active layers.
    pub fn step<I>(&mut self, events: I, dt: f64, bounds: Bounds) -> LoopStatus
    where
        I: IntoIterator<Item = InputEvent>,
    {
        if self.status != LoopStatus::Running {
            return self.status;
        }

        let dt = if dt.is_finite() { dt.clamp(0.0, MAX_FRAME_DT) } else { 0.0 };
        self.bounds = bounds;
        self.layers.transport_bar_mut().relayout(bounds);

        for event in events {
            self.handle_event(event);
            if self.status != LoopStatus::Running {
                return self.status;
            }
        }

        match self.transport.advance(dt) {
            TransportEvent::Completed => {
                log::info!("Playback finished");
                if self.variant == ControlsVariant::Minimal {
                    self.status = LoopStatus::StoppedByCompletion;
                }
            }
            TransportEvent::Stalled => self.notify("Audio output went idle; paused"),
            TransportEvent::None => {}
        }

        self.spectrum = self
            .extractor
            .extract_at(&self.waveform, self.transport.position());

        self.clock += dt;
        self.dt = dt;
        self.frames += 1;

        if let Some(n) = &mut self.notice {
            n.remaining -= dt as f32;
            if n.remaining <= 0.0 {
                self.notice = None;
            }
        }

        let ctx = frame_context(
            &self.spectrum,
            self.clock,
            self.dt,
            self.bounds,
            self.transport.view(),
            self.notice.as_ref(),
        );
        self.layers.update(&ctx);

        self.status
    }

    /// Emit this frame's drawing calls, back to front.
    pub fn render(&self, targets: &mut RenderTargets) {
        let ctx = frame_context(
            &self.spectrum,
            self.clock,
            self.dt,
            self.bounds,
            self.transport.view(),
            self.notice.as_ref(),
        );
        self.layers.render(&ctx, targets);
    }

    /// Stop the device on the way out.
    pub fn shutdown(&mut self) {
        self.transport.shutdown();
    }
}

fn frame_context<'a>(
    spectrum: &'a Spectrum,
    clock: f64,
    dt: f64,
    bounds: Bounds,
    playback: PlaybackView,
    notice: Option<&'a Notice>,
) -> FrameContext<'a> {
    FrameContext {
        spectrum,
        clock: clock as f32,
        dt: dt as f32,
        bounds,
        playback,
        notice: notice.map(|n| {
            let alpha = (n.remaining / NOTICE_FADE_SECS).clamp(0.0, 1.0);
            (n.text.as_str(), alpha)
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DeviceCommand;
    use crate::geometry::pt;
    use crate::transport::{ManualDevice, PlaybackStatus};
    use approx::assert_relative_eq;

    const FRAME: f64 = 1.0 / 60.0;

    fn bounds() -> Bounds {
        Bounds::from_w_h(900.0, 600.0)
    }

    fn session(seconds: f64, variant: ControlsVariant) -> Session<ManualDevice> {
        let wave = Waveform::silent(8000, seconds).unwrap();
        let mut s = Session::new(wave, ManualDevice::new(), &Config::default(), variant).unwrap();
        s.start();
        s
    }

    fn frame(s: &mut Session<ManualDevice>, events: Vec<InputEvent>) -> LoopStatus {
        s.transport_mut().device_mut().tick(FRAME);
        s.step(events, FRAME, bounds())
    }

    #[test]
    fn test_frame_clock_clamps() {
        let mut clock = FrameClock::new(60);
        assert_relative_eq!(clock.tick(0.0), 1.0 / 60.0);
        assert_relative_eq!(clock.tick(0.02), 0.02);
        assert_relative_eq!(clock.tick(3.0), MAX_FRAME_DT);
        assert_relative_eq!(clock.tick(f64::NAN), 1.0 / 60.0);
        assert_eq!(clock.frames(), 4);
    }

    #[test]
    fn test_autoplay_starts_playing() {
        let s = session(5.0, ControlsVariant::Full);
        assert_eq!(s.playback().status, PlaybackStatus::Playing);
    }

    #[test]
    fn test_autoplay_off_stays_stopped() {
        let wave = Waveform::silent(8000, 5.0).unwrap();
        let config = Config::from_toml_str("autoplay = false").unwrap();
        let mut s = Session::new(wave, ManualDevice::new(), &config, ControlsVariant::Full).unwrap();
        s.start();
        assert_eq!(s.playback().status, PlaybackStatus::Stopped);
    }

    #[test]
    fn test_load_failure_is_returned() {
        let wave = Waveform::silent(8000, 1.0).unwrap();
        let mut device = ManualDevice::new();
        device.fail_next.push(DeviceCommand::Load);
        assert!(Session::new(wave, device, &Config::default(), ControlsVariant::Full).is_err());
    }

    #[test]
    fn test_quit_stops_loop_immediately() {
        let mut s = session(5.0, ControlsVariant::Full);
        frame(&mut s, vec![]);
        let status = frame(&mut s, vec![Action::Quit.into()]);
        assert_eq!(status, LoopStatus::StoppedByUser);
        assert_eq!(s.frames(), 1);
        assert_eq!(frame(&mut s, vec![]), LoopStatus::StoppedByUser);
    }

    #[test]
    fn test_keyboard_transport() {
        let mut s = session(30.0, ControlsVariant::Full);
        frame(&mut s, vec![Action::TogglePlayPause.into()]);
        assert_eq!(s.playback().status, PlaybackStatus::Paused);

        frame(&mut s, vec![Action::SeekBy(5.0).into()]);
        assert_relative_eq!(s.playback().position, 5.0);

        frame(&mut s, vec![Action::Stop.into()]);
        assert_eq!(s.playback().status, PlaybackStatus::Stopped);
        assert_eq!(s.playback().position, 0.0);
    }

    #[test]
    fn test_device_failure_becomes_notice() {
        let mut s = session(30.0, ControlsVariant::Full);
        frame(&mut s, vec![Action::Pause.into()]);
        s.transport_mut().device_mut().fail_next.push(DeviceCommand::Play);
        frame(&mut s, vec![Action::Play.into()]);
        assert_eq!(s.playback().status, PlaybackStatus::Paused);
        assert!(s.notice().is_some());

        for _ in 0..(60.0 * NOTICE_SECS) as usize + 1 {
            frame(&mut s, vec![]);
        }
        assert!(s.notice().is_none());
    }

    #[test]
    fn test_stop_button_click() {
        let mut s = session(30.0, ControlsVariant::Full);
        frame(&mut s, vec![]);
        let stop = s
            .layers()
            .transport_bar()
            .buttons()
            .iter()
            .find(|b| b.kind == ButtonKind::Stop)
            .map(|b| b.region.center())
            .unwrap();
        frame(&mut s, vec![InputEvent::PointerDown(stop), InputEvent::PointerUp(stop)]);
        assert_eq!(s.playback().status, PlaybackStatus::Stopped);
    }

    #[test]
    fn test_drag_holds_preview_until_release() {
        let mut s = session(200.0, ControlsVariant::Minimal);
        frame(&mut s, vec![]);
        let track = s.layers().transport_bar().layout().unwrap().track;

        frame(&mut s, vec![InputEvent::PointerDown(pt(track.left(), track.y))]);
        frame(&mut s, vec![InputEvent::PointerMoved(pt(track.x, track.y))]);
        for _ in 0..10 {
            frame(&mut s, vec![]);
        }
        assert_relative_eq!(s.playback().position, 100.0);
        assert!(s.transport().is_scrubbing());

        frame(&mut s, vec![InputEvent::PointerUp(pt(track.x, track.y))]);
        assert!(!s.transport().is_scrubbing());
        assert!((s.playback().position - 100.0).abs() <= FRAME + 1e-9);
    }

    #[test]
    fn test_render_routes_layers() {
        let mut s = session(5.0, ControlsVariant::Full);
        frame(&mut s, vec![]);
        let mut scene = crate::draw::RecordingSurface::new();
        let mut trail = crate::draw::RecordingSurface::new();
        let mut hud = crate::draw::RecordingSurface::new();
        s.render(&mut RenderTargets {
            scene: &mut scene,
            trail: &mut trail,
            hud: &mut hud,
        });
        assert!(!scene.is_empty());
        assert!(trail.is_empty());
        assert!(hud.texts().any(|t| t == "00:00 / 00:05"));
    }
}
