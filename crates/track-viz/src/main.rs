mod audio;
mod cli;
mod renderer;
mod ui;

use std::cell::RefCell;
use std::path::Path;
use std::sync::OnceLock;

use anyhow::Context;
use clap::Parser;
use nannou::prelude::*;
use track_viz_core::{
    pt, Bounds, Config, ControlsVariant, FrameClock, InputEvent, LoopStatus, ManualDevice,
    RenderTargets, Session, VizError, Waveform,
};

use audio::{load_waveform, Output};
use cli::Cli;
use renderer::{NannouSurface, TrailRenderer};
use ui::bindings::parse_key;
use ui::picker::pick_audio_file;

const WINDOW_TITLE: &str = "Universal Music Visualizer";

/// Handed from `main` to the nannou model function.
struct Launch {
    config: Config,
    waveform: Waveform,
}

/// Set once in `main` before the event loop starts. The model function is a
/// plain `fn` pointer, and the picker and decoder have to finish (or fail)
/// before any window opens.
static LAUNCH: OnceLock<Launch> = OnceLock::new();

/// Decode the track and pair it with the resolved config.
fn prepare_launch(path: &Path, config: Config) -> anyhow::Result<Launch> {
    log::info!("Loading: {}", path.display());
    let waveform =
        load_waveform(path).with_context(|| format!("could not load {}", path.display()))?;
    log::info!(
        "Sample rate: {} Hz, Duration: {:.2} sec",
        waveform.sample_rate(),
        waveform.duration()
    );
    Ok(Launch { config, waveform })
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let cli = Cli::parse();
    let mut config = Config::load();
    cli.apply(&mut config);

    let path = match cli.input {
        Some(path) => path,
        None => match pick_audio_file() {
            Some(path) => path,
            None => {
                println!("No file selected.");
                return Ok(());
            }
        },
    };

    let launch = prepare_launch(&path, config)?;
    if LAUNCH.set(launch).is_err() {
        anyhow::bail!("track was already loaded");
    }

    nannou::app(model).update(update).exit(exit).run();
    Ok(())
}

struct Model {
    session: Session<Output>,
    frame_clock: FrameClock,
    /// Input gathered since the last update
    pending: Vec<InputEvent>,
    trail: RefCell<TrailRenderer>,
    seek_step: f64,
}

/// Open the output and hand it the track, going silent if the device refuses.
fn open_session(waveform: Waveform, config: &Config) -> Result<Session<Output>, VizError> {
    let variant = ControlsVariant::from_config(config);
    match Session::new(waveform.clone(), Output::open(), config, variant) {
        Ok(session) => Ok(session),
        Err(e) => {
            log::warn!("{}; continuing without sound", e);
            Session::new(waveform, Output::Silent(ManualDevice::new()), config, variant)
        }
    }
}

fn model(app: &App) -> Model {
    let Launch { config, waveform } = LAUNCH.get().expect("track is loaded before the app starts");

    app.set_exit_on_escape(false);
    app.set_loop_mode(LoopMode::rate_fps(config.fps() as f64));

    let window_id = app
        .new_window()
        .title(WINDOW_TITLE)
        .size(config.width(), config.height())
        .view(view)
        .key_pressed(key_pressed)
        .mouse_pressed(mouse_pressed)
        .mouse_released(mouse_released)
        .mouse_moved(mouse_moved)
        .resized(resized)
        .closed(closed)
        .build()
        .unwrap();

    let window = app.window(window_id).unwrap();
    let device = window.device();
    let size = window.inner_size_pixels();
    log::info!(
        "Window size: {}x{} (requested: {}x{})",
        size.0,
        size.1,
        config.width(),
        config.height()
    );

    let trail = TrailRenderer::new(
        device,
        [size.0, size.1],
        config.trail_zoom(),
        window.msaa_samples(),
        Frame::TEXTURE_FORMAT,
    );

    let mut session =
        open_session(waveform.clone(), config).expect("silent output accepts any track");
    session.start();

    Model {
        session,
        frame_clock: FrameClock::new(config.fps()),
        pending: Vec::new(),
        trail: RefCell::new(trail),
        seek_step: config.seek_step_secs(),
    }
}

fn to_bounds(rect: Rect) -> Bounds {
    Bounds::new(rect.x(), rect.y(), rect.w(), rect.h())
}

fn update(app: &App, model: &mut Model, update: Update) {
    let dt = model.frame_clock.tick(update.since_last.as_secs_f64());
    model.session.transport_mut().device_mut().tick(dt);

    let events = std::mem::take(&mut model.pending);
    match model.session.step(events, dt, to_bounds(app.window_rect())) {
        LoopStatus::Running => {}
        LoopStatus::StoppedByCompletion => {
            log::info!("Track finished after {} frames", model.session.frames());
            app.quit();
        }
        LoopStatus::StoppedByUser => app.quit(),
    }
}

fn view(app: &App, model: &Model, frame: Frame) {
    let window = app.main_window();

    // `app.draw()` hands out clones of one shared draw, so the trail and the
    // controls each get their own command list
    let scene_draw = app.draw();
    // Trail textures are in physical pixels
    let trail_draw = Draw::new().scale(window.scale_factor());
    let hud_draw = Draw::new();

    let retain = {
        let mut scene = NannouSurface::new(&scene_draw);
        let mut trail = NannouSurface::new(&trail_draw);
        let mut hud = NannouSurface::new(&hud_draw);
        model.session.render(&mut RenderTargets {
            scene: &mut scene,
            trail: &mut trail,
            hud: &mut hud,
        });
        trail.fade_requested()
    };

    if let Err(e) = scene_draw.to_frame(app, &frame) {
        log::error!("Failed to draw scene: {:?}", e);
    }

    // Only dream mode asks for a fade; otherwise the trail starts fresh next time
    {
        let mut trail = model.trail.borrow_mut();
        match retain {
            Some(retain) => {
                let mut encoder = frame.command_encoder();
                trail.render(
                    window.device(),
                    window.queue(),
                    &mut encoder,
                    &trail_draw,
                    retain,
                    frame.texture_view(),
                );
            }
            None => trail.reset(),
        }
    }

    if let Err(e) = hud_draw.to_frame(app, &frame) {
        log::error!("Failed to draw controls: {:?}", e);
    }
}

fn key_pressed(_app: &App, model: &mut Model, key: Key) {
    if let Some(action) = parse_key(key, model.seek_step) {
        model.pending.push(action.into());
    }
}

fn mouse_pressed(app: &App, model: &mut Model, button: MouseButton) {
    if button == MouseButton::Left {
        let p = app.mouse.position();
        model.pending.push(InputEvent::PointerDown(pt(p.x, p.y)));
    }
}

fn mouse_released(app: &App, model: &mut Model, button: MouseButton) {
    if button == MouseButton::Left {
        let p = app.mouse.position();
        model.pending.push(InputEvent::PointerUp(pt(p.x, p.y)));
    }
}

fn mouse_moved(_app: &App, model: &mut Model, pos: Point2) {
    model.pending.push(InputEvent::PointerMoved(pt(pos.x, pos.y)));
}

fn resized(app: &App, model: &mut Model, _size: Vec2) {
    let window = app.main_window();
    let (w, h) = window.inner_size_pixels();
    model.trail.borrow_mut().resize(window.device(), [w, h]);
}

fn closed(_app: &App, model: &mut Model) {
    model.pending.push(track_viz_core::Action::Quit.into());
}

fn exit(_app: &App, mut model: Model) {
    model.session.shutdown();
    log::info!("Rendered {} frames", model.session.frames());
}
