//! Visual layer stack.
//!
//! Layers are composited back to front in a fixed order: background, wave
//! mesh, the active radial/bar variant, then the transport bar. The default
//! and dream variants are interchangeable sets behind the same [`Layer`]
//! trait, selected by [`VisualMode`].

mod background;
mod bars;
mod dream;
mod radial;
pub mod transport_bar;
mod wave_mesh;

pub use background::Background;
pub use bars::Bars3d;
pub use dream::{DreamBars, DreamRadial};
pub use radial::RadialSpectrum;
pub use transport_bar::{BarResponse, ButtonKind, TransportBar, TransportButton};
pub use wave_mesh::WaveMesh;

use crate::audio::Spectrum;
use crate::config::Config;
use crate::draw::Surface;
use crate::geometry::Bounds;
use crate::session::ControlsVariant;
use crate::transport::PlaybackView;

/// Everything a layer may read for one frame.
#[derive(Clone, Copy)]
pub struct FrameContext<'a> {
    pub spectrum: &'a Spectrum,
    /// Monotonic session clock in seconds
    pub clock: f32,
    /// Seconds since the previous frame
    pub dt: f32,
    pub bounds: Bounds,
    pub playback: PlaybackView,
    /// Transient status message and its opacity (0-1)
    pub notice: Option<(&'a str, f32)>,
}

/// Which target a layer draws onto.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pass {
    /// Cleared every frame
    Scene,
    /// Persistent surface faded a little each frame
    Trail,
    /// Drawn last, above the trail
    Hud,
}

/// Drawing targets for one frame. The binary composites trail over scene,
/// then hud on top.
pub struct RenderTargets<'a> {
    pub scene: &'a mut dyn Surface,
    pub trail: &'a mut dyn Surface,
    pub hud: &'a mut dyn Surface,
}

impl<'a> RenderTargets<'a> {
    fn for_pass(&mut self, pass: Pass) -> &mut dyn Surface {
        match pass {
            Pass::Scene => &mut *self.scene,
            Pass::Trail => &mut *self.trail,
            Pass::Hud => &mut *self.hud,
        }
    }
}

/// One independently composable visual effect.
pub trait Layer {
    fn name(&self) -> &'static str;

    fn pass(&self) -> Pass {
        Pass::Scene
    }

    /// Advance persistent state. Only called while the layer is active.
    fn update(&mut self, _ctx: &FrameContext) {}

    /// Emit drawing calls. Must not panic on any spectrum or bounds; a layer
    /// that cannot lay itself out simply draws nothing this frame.
    fn draw(&self, ctx: &FrameContext, surface: &mut dyn Surface);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VisualMode {
    #[default]
    Default,
    Dream,
}

impl VisualMode {
    pub fn toggled(self) -> Self {
        match self {
            VisualMode::Default => VisualMode::Dream,
            VisualMode::Dream => VisualMode::Default,
        }
    }
}

/// Construction parameters for the stack.
#[derive(Debug, Clone)]
pub struct LayerSettings {
    pub particles: usize,
    pub particle_seed: Option<u64>,
    pub mesh_cols: usize,
    pub mesh_rows: usize,
    pub trail_retain: f32,
    pub controls: ControlsVariant,
    pub mode: VisualMode,
}

impl LayerSettings {
    pub fn from_config(config: &Config, controls: ControlsVariant) -> Self {
        Self {
            particles: config.particles(),
            particle_seed: config.particle_seed,
            mesh_cols: config.mesh_cols(),
            mesh_rows: config.mesh_rows(),
            trail_retain: config.trail_retain(),
            controls,
            mode: if config.dream_on_start() {
                VisualMode::Dream
            } else {
                VisualMode::Default
            },
        }
    }
}

impl Default for LayerSettings {
    fn default() -> Self {
        Self::from_config(&Config::default(), ControlsVariant::Full)
    }
}

pub struct LayerStack {
    /// Layers drawn in every mode, back to front
    scene: Vec<Box<dyn Layer>>,
    default_variant: Vec<Box<dyn Layer>>,
    dream_variant: Vec<Box<dyn Layer>>,
    transport_bar: TransportBar,
    mode: VisualMode,
    trail_retain: f32,
}

impl LayerStack {
    pub fn new(settings: &LayerSettings) -> Self {
        let background = match settings.particle_seed {
            Some(seed) => Background::with_seed(settings.particles, seed),
            None => Background::new(settings.particles),
        };

        Self {
            scene: vec![
                Box::new(background),
                Box::new(WaveMesh::new(settings.mesh_cols, settings.mesh_rows)),
            ],
            default_variant: vec![Box::new(RadialSpectrum::new()), Box::new(Bars3d::new())],
            dream_variant: vec![Box::new(DreamRadial::new()), Box::new(DreamBars::new())],
            transport_bar: TransportBar::new(settings.controls),
            mode: settings.mode,
            trail_retain: settings.trail_retain,
        }
    }

    pub fn mode(&self) -> VisualMode {
        self.mode
    }

    pub fn toggle_mode(&mut self) -> VisualMode {
        self.mode = self.mode.toggled();
        log::debug!("Visual mode: {:?}", self.mode);
        self.mode
    }

    /// Fraction of the trail kept from one frame to the next
    pub fn trail_retain(&self) -> f32 {
        self.trail_retain
    }

    pub fn transport_bar(&self) -> &TransportBar {
        &self.transport_bar
    }

    pub fn transport_bar_mut(&mut self) -> &mut TransportBar {
        &mut self.transport_bar
    }

    fn variant(&self) -> &[Box<dyn Layer>] {
        match self.mode {
            VisualMode::Default => &self.default_variant,
            VisualMode::Dream => &self.dream_variant,
        }
    }

    /// Names of the layers that will draw this frame, back to front.
    pub fn active_layer_names(&self) -> Vec<&'static str> {
        self.scene
            .iter()
            .chain(self.variant())
            .map(|l| l.name())
            .chain(std::iter::once(self.transport_bar.name()))
            .collect()
    }

    pub fn update(&mut self, ctx: &FrameContext) {
        for layer in self.scene.iter_mut() {
            layer.update(ctx);
        }
        let variant = match self.mode {
            VisualMode::Default => &mut self.default_variant,
            VisualMode::Dream => &mut self.dream_variant,
        };
        for layer in variant.iter_mut() {
            layer.update(ctx);
        }
        self.transport_bar.update(ctx);
    }

    pub fn render(&self, ctx: &FrameContext, targets: &mut RenderTargets) {
        for layer in &self.scene {
            layer.draw(ctx, targets.for_pass(layer.pass()));
        }

        if self.mode == VisualMode::Dream {
            targets.trail.fade(self.trail_retain);
        }
        for layer in self.variant() {
            layer.draw(ctx, targets.for_pass(layer.pass()));
        }

        self.transport_bar
            .draw(ctx, targets.for_pass(self.transport_bar.pass()));
    }
}
