use approx::assert_relative_eq;
use track_viz_core::{
    Action, AudioDevice, Config, ControlsVariant, ManualDevice, PlaybackStatus, Session,
    SpectrumExtractor, Transport, VisualMode, Waveform,
};

const FRAME: f64 = 1.0 / 60.0;

fn loaded(seconds: f64) -> Transport<ManualDevice> {
    let wave = Waveform::silent(1000, seconds).unwrap();
    let mut device = ManualDevice::new();
    device.load(&wave).unwrap();
    Transport::new(device, wave.duration())
}

/// Run `frames` frames, returning the position after each.
fn run(t: &mut Transport<ManualDevice>, frames: usize) -> Vec<f64> {
    (0..frames)
        .map(|_| {
            t.device_mut().tick(FRAME);
            t.advance(FRAME);
            t.position()
        })
        .collect()
}

fn non_decreasing(xs: &[f64]) -> bool {
    xs.windows(2).all(|w| w[1] >= w[0])
}

#[test]
fn play_pause_resume_stop_sequence() {
    let mut t = loaded(60.0);
    let mut visited = vec![t.status()];

    t.play().unwrap();
    visited.push(t.status());
    let first = run(&mut t, 90);
    assert!(non_decreasing(&first));

    t.pause().unwrap();
    visited.push(t.status());
    let frozen = t.position();
    let paused = run(&mut t, 45);
    assert!(paused.iter().all(|&p| p == frozen));

    t.play().unwrap();
    visited.push(t.status());
    let second = run(&mut t, 90);
    assert!(non_decreasing(&second));
    assert!(second[0] >= frozen);

    t.stop().unwrap();
    visited.push(t.status());
    assert_eq!(t.position(), 0.0);

    use PlaybackStatus::*;
    assert_eq!(visited, vec![Stopped, Playing, Paused, Playing, Stopped]);
}

#[test]
fn seek_to_half_of_long_track() {
    let mut t = loaded(200.0);
    t.play().unwrap();
    run(&mut t, 30);

    t.begin_scrub(0.2);
    t.scrub_to(0.5);
    t.end_scrub(0.5).unwrap();
    assert_relative_eq!(t.position(), 100.0);

    run(&mut t, 1);
    assert!((t.position() - 100.0).abs() <= FRAME + 1e-9);
}

#[test]
fn seek_then_return_reproduces_spectrum() {
    // Deterministic broadband signal
    let samples: Vec<f32> = (0..48_000u32)
        .map(|i| ((i.wrapping_mul(2_654_435_761) >> 16) as f32 / 65_535.0) * 2.0 - 1.0)
        .collect();
    let wave = Waveform::new(samples, 16_000).unwrap();
    let mut device = ManualDevice::new();
    device.load(&wave).unwrap();
    let mut t = Transport::new(device, wave.duration());
    let mut extractor = SpectrumExtractor::new();

    let original = SpectrumExtractor::new().extract_at(&wave, 0.0);

    t.seek(0.0).unwrap();
    let at_start = extractor.extract_at(&wave, t.position());
    t.seek(wave.duration() - 1e-3).unwrap();
    let near_end = extractor.extract_at(&wave, t.position());
    t.seek(0.0).unwrap();
    let back = extractor.extract_at(&wave, t.position());

    assert_eq!(at_start, original);
    assert_eq!(back, original);
    assert_ne!(near_end, original);
    assert_eq!(original.peak(), 1.0);
}

#[test]
fn dream_toggle_leaves_playback_alone() {
    let wave = Waveform::silent(8000, 20.0).unwrap();
    let mut s = Session::new(wave, ManualDevice::new(), &Config::default(), ControlsVariant::Full).unwrap();
    s.start();
    let bounds = track_viz_core::Bounds::from_w_h(900.0, 600.0);

    for _ in 0..30 {
        s.transport_mut().device_mut().tick(FRAME);
        s.step(Vec::new(), FRAME, bounds);
    }
    let before = s.transport().state();

    s.step(vec![Action::ToggleDream.into()], 0.0, bounds);
    assert_eq!(s.mode(), VisualMode::Dream);
    assert_eq!(s.transport().state(), before);

    s.step(vec![Action::ToggleDream.into()], 0.0, bounds);
    assert_eq!(s.mode(), VisualMode::Default);
    assert_eq!(s.transport().state(), before);
}
