//! Transport bar: seek track, fill, draggable handle, time label and
//! (in the full controls variant) play/pause/stop buttons.
//!
//! Layout and hit-testing are pure functions of the surface bounds so the
//! same geometry is used for drawing and for pointer handling.

use super::{FrameContext, Layer, Pass};
use crate::draw::{Color, Surface};
use crate::geometry::{pt, Bounds, Point};
use crate::session::ControlsVariant;
use crate::transport::clamp_fraction;

const MARGIN: f32 = 20.0;
const BAR_Y_OFFSET: f32 = 30.0;
const TRACK_H: f32 = 6.0;
/// Vertical reach of the track hit-region
const GRAB_H: f32 = 22.0;
const BUTTON: f32 = 28.0;
const BUTTON_GAP: f32 = 8.0;
const LABEL_W: f32 = 130.0;
const LABEL_SIZE: u32 = 14;
/// Narrowest usable track before the whole bar is hidden
const MIN_TRACK_W: f32 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonKind {
    Play,
    Pause,
    Stop,
}

const BUTTON_ORDER: [ButtonKind; 3] = [ButtonKind::Play, ButtonKind::Pause, ButtonKind::Stop];

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransportButton {
    pub kind: ButtonKind,
    pub region: Bounds,
    pub pressed: bool,
}

/// Geometry of the bar for one surface size.
#[derive(Debug, Clone, PartialEq)]
pub struct BarLayout {
    /// The visible track
    pub track: Bounds,
    /// Track grown vertically for easier grabbing
    pub grab: Bounds,
    pub buttons: Vec<(ButtonKind, Bounds)>,
    pub label: Point,
}

/// What a pointer event asks the transport to do.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BarResponse {
    None,
    BeginScrub(f64),
    Scrub(f64),
    EndScrub(f64),
    Button(ButtonKind),
}

/// `MM:SS`; minutes keep counting past 59. Negative or non-finite reads 00:00.
pub fn format_time(seconds: f64) -> String {
    let total = if seconds.is_finite() && seconds > 0.0 {
        seconds as u64
    } else {
        0
    };
    format!("{:02}:{:02}", total / 60, total % 60)
}

/// `elapsed / total` label
pub fn time_label(position: f64, duration: f64) -> String {
    format!("{} / {}", format_time(position), format_time(duration))
}

/// Fraction along `track` for pointer x, clamped to 0-1.
pub fn seek_fraction(x: f32, track: Bounds) -> f64 {
    if track.w <= 0.0 || !track.w.is_finite() {
        return 0.0;
    }
    clamp_fraction(((x - track.left()) / track.w) as f64)
}

/// Lay out the bar along the bottom of `bounds`. None when there is no room.
pub fn layout(bounds: Bounds, variant: ControlsVariant) -> Option<BarLayout> {
    if bounds.is_degenerate() || bounds.h < BAR_Y_OFFSET * 2.0 {
        return None;
    }
    let y = bounds.bottom() + BAR_Y_OFFSET;

    let mut buttons = Vec::new();
    let mut track_left = bounds.left() + MARGIN;
    if variant == ControlsVariant::Full {
        for (i, kind) in BUTTON_ORDER.iter().enumerate() {
            let x = track_left + BUTTON / 2.0 + i as f32 * (BUTTON + BUTTON_GAP);
            buttons.push((*kind, Bounds::new(x, y, BUTTON, BUTTON)));
        }
        track_left += BUTTON_ORDER.len() as f32 * (BUTTON + BUTTON_GAP) + BUTTON_GAP;
    }

    let track_right = bounds.right() - MARGIN - LABEL_W;
    let track_w = track_right - track_left;
    if track_w < MIN_TRACK_W {
        return None;
    }
    let track_x = (track_left + track_right) / 2.0;

    Some(BarLayout {
        track: Bounds::new(track_x, y, track_w, TRACK_H),
        grab: Bounds::new(track_x, y, track_w, GRAB_H),
        buttons,
        label: pt(track_right + LABEL_W / 2.0 + MARGIN / 2.0, y),
    })
}

pub struct TransportBar {
    variant: ControlsVariant,
    layout: Option<BarLayout>,
    buttons: Vec<TransportButton>,
    dragging: bool,
}

impl TransportBar {
    pub fn new(variant: ControlsVariant) -> Self {
        Self {
            variant,
            layout: None,
            buttons: Vec::new(),
            dragging: false,
        }
    }

    pub fn variant(&self) -> ControlsVariant {
        self.variant
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    pub fn buttons(&self) -> &[TransportButton] {
        &self.buttons
    }

    pub fn layout(&self) -> Option<&BarLayout> {
        self.layout.as_ref()
    }

    /// Recompute geometry for `bounds`, keeping pressed flags.
    pub fn relayout(&mut self, bounds: Bounds) {
        self.layout = layout(bounds, self.variant);
        let regions = self
            .layout
            .as_ref()
            .map(|l| l.buttons.clone())
            .unwrap_or_default();

        let pressed = self.pressed();
        self.buttons = regions
            .into_iter()
            .map(|(kind, region)| TransportButton {
                kind,
                region,
                pressed: pressed == Some(kind),
            })
            .collect();
    }

    fn pressed(&self) -> Option<ButtonKind> {
        self.buttons.iter().find(|b| b.pressed).map(|b| b.kind)
    }

    fn release_all(&mut self) {
        for b in self.buttons.iter_mut() {
            b.pressed = false;
        }
    }

    pub fn pointer_down(&mut self, p: Point) -> BarResponse {
        let Some(layout) = &self.layout else {
            return BarResponse::None;
        };

        let hit = self.buttons.iter().position(|b| b.region.contains(p));
        for (i, b) in self.buttons.iter_mut().enumerate() {
            b.pressed = Some(i) == hit;
        }
        if hit.is_some() {
            return BarResponse::None;
        }

        if layout.grab.contains(p) {
            self.dragging = true;
            return BarResponse::BeginScrub(seek_fraction(p.x, layout.track));
        }
        BarResponse::None
    }

    pub fn pointer_moved(&mut self, p: Point) -> BarResponse {
        match &self.layout {
            Some(layout) if self.dragging => BarResponse::Scrub(seek_fraction(p.x, layout.track)),
            _ => BarResponse::None,
        }
    }

    /// Ends a drag, or fires the pressed button if released over it. Always
    /// leaves every button unpressed.
    pub fn pointer_up(&mut self, p: Point) -> BarResponse {
        if self.dragging {
            self.dragging = false;
            self.release_all();
            let fraction = match &self.layout {
                Some(layout) => seek_fraction(p.x, layout.track),
                None => return BarResponse::EndScrub(0.0),
            };
            return BarResponse::EndScrub(fraction);
        }

        let released = self
            .buttons
            .iter()
            .find(|b| b.pressed && b.region.contains(p))
            .map(|b| b.kind);
        self.release_all();
        released.map_or(BarResponse::None, BarResponse::Button)
    }

    fn draw_button(surface: &mut dyn Surface, button: &TransportButton) {
        let r = button.region;
        let c = r.center();
        let face = if button.pressed {
            Color::rgba(0.55, 0.75, 1.0, 0.9)
        } else {
            Color::rgba(0.2, 0.22, 0.35, 0.85)
        };
        surface.rect(c, r.w, r.h, face);

        let s = r.w * 0.22;
        let icon = Color::WHITE;
        match button.kind {
            ButtonKind::Play => {
                surface.polygon(&[pt(c.x - s, c.y - s), pt(c.x - s, c.y + s), pt(c.x + s, c.y)], icon)
            }
            ButtonKind::Pause => {
                surface.rect(pt(c.x - s * 0.5, c.y), s * 0.6, s * 2.0, icon);
                surface.rect(pt(c.x + s * 0.5, c.y), s * 0.6, s * 2.0, icon);
            }
            ButtonKind::Stop => surface.rect(c, s * 2.0, s * 2.0, icon),
        }
    }
}

impl Layer for TransportBar {
    fn name(&self) -> &'static str {
        "transport_bar"
    }

    fn pass(&self) -> Pass {
        Pass::Hud
    }

    fn update(&mut self, ctx: &FrameContext) {
        self.relayout(ctx.bounds);
    }

    fn draw(&self, ctx: &FrameContext, surface: &mut dyn Surface) {
        let b = ctx.bounds;

        if let Some((text, alpha)) = ctx.notice {
            if !b.is_degenerate() && alpha > 0.0 {
                let color = Color::rgba(1.0, 0.85, 0.4, alpha.min(1.0));
                surface.text(text, pt(b.x, b.top() - MARGIN), LABEL_SIZE, color);
            }
        }

        // Recomputed here too so a resize shows up before the next update
        let Some(layout) = layout(b, self.variant) else {
            return;
        };
        let track = layout.track;
        let progress = ctx.playback.progress() as f32;

        surface.rect(track.center(), track.w, track.h, Color::rgba(1.0, 1.0, 1.0, 0.18));

        let fill_w = track.w * progress;
        if fill_w > 0.0 {
            surface.rect(
                pt(track.left() + fill_w / 2.0, track.y),
                fill_w,
                track.h,
                Color::rgb(0.4, 0.85, 1.0),
            );
        }

        let handle = pt(track.left() + fill_w, track.y);
        let handle_r = if self.dragging { 9.0 } else { 7.0 };
        surface.circle(handle, handle_r, Color::WHITE);

        surface.text(
            &time_label(ctx.playback.position, ctx.playback.duration),
            layout.label,
            LABEL_SIZE,
            Color::WHITE,
        );

        for (kind, region) in &layout.buttons {
            let pressed = self.buttons.iter().any(|b| b.kind == *kind && b.pressed);
            Self::draw_button(
                surface,
                &TransportButton {
                    kind: *kind,
                    region: *region,
                    pressed,
                },
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;
    use crate::audio::Spectrum;
    use crate::draw::RecordingSurface;

    fn bar(variant: ControlsVariant) -> TransportBar {
        let mut bar = TransportBar::new(variant);
        bar.relayout(Bounds::from_w_h(900.0, 600.0));
        bar
    }

    fn button_center(bar: &TransportBar, kind: ButtonKind) -> Point {
        bar.buttons()
            .iter()
            .find(|b| b.kind == kind)
            .map(|b| b.region.center())
            .unwrap()
    }

    #[test]
    fn test_format_time() {
        assert_eq!(format_time(0.0), "00:00");
        assert_eq!(format_time(59.9), "00:59");
        assert_eq!(format_time(200.0), "03:20");
        assert_eq!(format_time(3725.0), "62:05");
        assert_eq!(format_time(-3.0), "00:00");
        assert_eq!(format_time(f64::NAN), "00:00");
        assert_eq!(time_label(10.0, 10.0), "00:10 / 00:10");
    }

    #[test]
    fn test_seek_fraction_clamps() {
        let track = Bounds::new(0.0, 0.0, 200.0, 6.0);
        assert_eq!(seek_fraction(0.0, track), 0.5);
        assert_eq!(seek_fraction(-500.0, track), 0.0);
        assert_eq!(seek_fraction(500.0, track), 1.0);
    }

    #[test]
    fn test_minimal_has_no_buttons() {
        assert!(bar(ControlsVariant::Minimal).buttons().is_empty());
        assert_eq!(bar(ControlsVariant::Full).buttons().len(), 3);
    }

    #[test]
    fn test_layout_is_inside_bounds() {
        let bounds = Bounds::from_w_h(900.0, 600.0);
        for variant in [ControlsVariant::Minimal, ControlsVariant::Full] {
            let l = layout(bounds, variant).unwrap();
            assert!(l.track.left() >= bounds.left() && l.track.right() <= bounds.right());
            assert!(bounds.contains(l.label));
            for (_, r) in &l.buttons {
                assert!(r.left() >= bounds.left() && r.right() < l.track.left());
            }
        }
    }

    #[test]
    fn test_no_layout_when_cramped() {
        assert!(layout(Bounds::from_w_h(200.0, 600.0), ControlsVariant::Full).is_none());
        assert!(layout(Bounds::from_w_h(900.0, 40.0), ControlsVariant::Minimal).is_none());
        for b in tiny_bounds() {
            assert!(layout(b, ControlsVariant::Full).is_none());
        }
    }

    #[test]
    fn test_drag_reports_fractions() {
        let mut bar = bar(ControlsVariant::Minimal);
        let track = bar.layout().unwrap().track;
        let mid = track.center();

        assert_eq!(bar.pointer_down(mid), BarResponse::BeginScrub(0.5));
        assert!(bar.is_dragging());
        assert_eq!(
            bar.pointer_moved(pt(track.right() + 50.0, mid.y + 80.0)),
            BarResponse::Scrub(1.0)
        );
        assert_eq!(bar.pointer_up(pt(track.left(), 0.0)), BarResponse::EndScrub(0.0));
        assert!(!bar.is_dragging());
        assert_eq!(bar.pointer_moved(mid), BarResponse::None);
    }

    #[test]
    fn test_click_button_fires_on_release() {
        let mut bar = bar(ControlsVariant::Full);
        let stop = button_center(&bar, ButtonKind::Stop);
        assert_eq!(bar.pointer_down(stop), BarResponse::None);
        assert_eq!(bar.buttons().iter().filter(|b| b.pressed).count(), 1);
        assert_eq!(bar.pointer_up(stop), BarResponse::Button(ButtonKind::Stop));
        assert!(bar.buttons().iter().all(|b| !b.pressed));
    }

    #[test]
    fn test_release_elsewhere_does_not_stick() {
        let mut bar = bar(ControlsVariant::Full);
        let play = button_center(&bar, ButtonKind::Play);
        let pause = button_center(&bar, ButtonKind::Pause);

        bar.pointer_down(play);
        assert_eq!(bar.pointer_up(pause), BarResponse::None);
        assert!(bar.buttons().iter().all(|b| !b.pressed));

        bar.pointer_down(play);
        bar.pointer_down(pause);
        assert_eq!(bar.buttons().iter().filter(|b| b.pressed).count(), 1);
        assert_eq!(bar.pointer_up(pt(0.0, 250.0)), BarResponse::None);
        assert!(bar.buttons().iter().all(|b| !b.pressed));
    }

    #[test]
    fn test_drag_clears_stale_press() {
        let mut bar = bar(ControlsVariant::Full);
        let play = button_center(&bar, ButtonKind::Play);
        let mid = bar.layout().unwrap().track.center();

        // Press lands on Play but the release happens outside the window
        bar.pointer_down(play);
        assert!(matches!(bar.pointer_down(mid), BarResponse::BeginScrub(_)));
        assert!(bar.buttons().iter().all(|b| !b.pressed));

        bar.pointer_moved(pt(mid.x + 10.0, mid.y));
        assert!(matches!(bar.pointer_up(pt(mid.x + 10.0, mid.y)), BarResponse::EndScrub(_)));
        assert!(bar.buttons().iter().all(|b| !b.pressed));
    }

    #[test]
    fn test_pressed_survives_relayout() {
        let mut bar = bar(ControlsVariant::Full);
        let pause = button_center(&bar, ButtonKind::Pause);
        bar.pointer_down(pause);
        bar.relayout(Bounds::from_w_h(1200.0, 800.0));
        let pressed: Vec<_> = bar.buttons().iter().filter(|b| b.pressed).map(|b| b.kind).collect();
        assert_eq!(pressed, vec![ButtonKind::Pause]);
    }

    #[test]
    fn test_draws_label_and_notice() {
        let bar = bar(ControlsVariant::Full);
        let spectrum = Spectrum::silent();
        let mut c = ctx(&spectrum, Bounds::from_w_h(900.0, 600.0), 0.0);
        c.notice = Some(("Audio device error", 0.5));
        let mut s = RecordingSurface::new();
        bar.draw(&c, &mut s);
        let texts: Vec<_> = s.texts().collect();
        assert_eq!(texts, vec!["Audio device error", "00:30 / 02:00"]);
        assert!(s.within(c.bounds, 0.0));
    }
}
