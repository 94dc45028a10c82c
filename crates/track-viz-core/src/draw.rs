//! Drawing surface capability used by every layer.
//!
//! Layers never talk to a graphics backend directly. They issue immediate-mode
//! calls against a [`Surface`]; the binary implements it over `nannou::Draw`
//! and tests use [`RecordingSurface`].

use crate::geometry::{Bounds, Point};

/// RGBA color, 0.0-1.0 range
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    pub const BLACK: Color = Color::rgb(0.0, 0.0, 0.0);
    pub const WHITE: Color = Color::rgb(1.0, 1.0, 1.0);

    pub fn with_alpha(self, a: f32) -> Self {
        Self { a, ..self }
    }

    /// Hue in degrees (wrapped), saturation and value in 0-1.
    pub fn hsv(hue: f32, saturation: f32, value: f32) -> Self {
        let hue = if hue.is_finite() {
            hue.rem_euclid(360.0)
        } else {
            0.0
        };
        let saturation = saturation.clamp(0.0, 1.0);
        let value = value.clamp(0.0, 1.0);

        let c = value * saturation;
        let x = c * (1.0 - ((hue / 60.0) % 2.0 - 1.0).abs());
        let m = value - c;

        let (r1, g1, b1) = if hue < 60.0 {
            (c, x, 0.0)
        } else if hue < 120.0 {
            (x, c, 0.0)
        } else if hue < 180.0 {
            (0.0, c, x)
        } else if hue < 240.0 {
            (0.0, x, c)
        } else if hue < 300.0 {
            (x, 0.0, c)
        } else {
            (c, 0.0, x)
        };

        Self::rgb(r1 + m, g1 + m, b1 + m)
    }

    pub fn lerp(self, other: Color, t: f32) -> Self {
        let t = t.clamp(0.0, 1.0);
        Self {
            r: self.r + (other.r - self.r) * t,
            g: self.g + (other.g - self.g) * t,
            b: self.b + (other.b - self.b) * t,
            a: self.a + (other.a - self.a) * t,
        }
    }

    /// Brighten toward white by `amount` (0-1), keeping alpha.
    pub fn lighten(self, amount: f32) -> Self {
        Color { a: self.a, ..self.lerp(Color::WHITE, amount) }
    }

    /// Scale rgb toward black by `amount` (0-1), keeping alpha.
    pub fn darken(self, amount: f32) -> Self {
        Color { a: self.a, ..self.lerp(Color::BLACK, amount) }
    }
}

/// Immediate-mode drawing target.
pub trait Surface {
    /// Fill the whole surface
    fn background(&mut self, color: Color);

    fn line(&mut self, start: Point, end: Point, weight: f32, color: Color);

    /// Filled polygon
    fn polygon(&mut self, points: &[Point], color: Color);

    /// Filled axis-aligned rectangle around `center`
    fn rect(&mut self, center: Point, w: f32, h: f32, color: Color);

    /// Filled circle
    fn circle(&mut self, center: Point, radius: f32, color: Color);

    /// Stroked circle
    fn ring(&mut self, center: Point, radius: f32, weight: f32, color: Color);

    fn text(&mut self, text: &str, center: Point, size: u32, color: Color);

    /// Multiply what is already on a persistent surface by `retain` (0-1).
    /// Surfaces that are cleared every frame ignore it.
    fn fade(&mut self, _retain: f32) {}
}

/// One recorded surface call.
#[derive(Clone, Debug, PartialEq)]
pub enum DrawCommand {
    Background(Color),
    Line {
        start: Point,
        end: Point,
        weight: f32,
        color: Color,
    },
    Polygon {
        points: Vec<Point>,
        color: Color,
    },
    Rect {
        center: Point,
        w: f32,
        h: f32,
        color: Color,
    },
    Circle {
        center: Point,
        radius: f32,
        color: Color,
    },
    Ring {
        center: Point,
        radius: f32,
        weight: f32,
        color: Color,
    },
    Text {
        text: String,
        center: Point,
        size: u32,
        color: Color,
    },
    Fade(f32),
}

/// Surface that keeps every call, for tests and headless runs.
#[derive(Default, Debug)]
pub struct RecordingSurface {
    pub commands: Vec<DrawCommand>,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.commands.clear();
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.commands.iter().filter_map(|c| match c {
            DrawCommand::Text { text, .. } => Some(text.as_str()),
            _ => None,
        })
    }

    /// Every point any command touches, used to check layout stays on screen.
    pub fn points(&self) -> Vec<Point> {
        let mut out = Vec::new();
        for c in &self.commands {
            match c {
                DrawCommand::Line { start, end, .. } => {
                    out.push(*start);
                    out.push(*end);
                }
                DrawCommand::Polygon { points, .. } => out.extend_from_slice(points),
                DrawCommand::Rect { center, .. }
                | DrawCommand::Circle { center, .. }
                | DrawCommand::Ring { center, .. }
                | DrawCommand::Text { center, .. } => out.push(*center),
                DrawCommand::Background(_) | DrawCommand::Fade(_) => {}
            }
        }
        out
    }

    /// True when every recorded coordinate is a finite number.
    pub fn all_finite(&self) -> bool {
        self.points().iter().all(|p| p.x.is_finite() && p.y.is_finite())
    }

    /// True when every recorded coordinate lies within `bounds` grown by `margin`.
    pub fn within(&self, bounds: Bounds, margin: f32) -> bool {
        let grown = Bounds::new(bounds.x, bounds.y, bounds.w + margin * 2.0, bounds.h + margin * 2.0);
        self.points().iter().all(|p| grown.contains(*p))
    }
}

impl Surface for RecordingSurface {
    fn background(&mut self, color: Color) {
        self.commands.push(DrawCommand::Background(color));
    }

    fn line(&mut self, start: Point, end: Point, weight: f32, color: Color) {
        self.commands.push(DrawCommand::Line {
            start,
            end,
            weight,
            color,
        });
    }

    fn polygon(&mut self, points: &[Point], color: Color) {
        self.commands.push(DrawCommand::Polygon {
            points: points.to_vec(),
            color,
        });
    }

    fn rect(&mut self, center: Point, w: f32, h: f32, color: Color) {
        self.commands.push(DrawCommand::Rect { center, w, h, color });
    }

    fn circle(&mut self, center: Point, radius: f32, color: Color) {
        self.commands.push(DrawCommand::Circle {
            center,
            radius,
            color,
        });
    }

    fn ring(&mut self, center: Point, radius: f32, weight: f32, color: Color) {
        self.commands.push(DrawCommand::Ring {
            center,
            radius,
            weight,
            color,
        });
    }

    fn text(&mut self, text: &str, center: Point, size: u32, color: Color) {
        self.commands.push(DrawCommand::Text {
            text: text.to_string(),
            center,
            size,
            color,
        });
    }

    fn fade(&mut self, retain: f32) {
        self.commands.push(DrawCommand::Fade(retain));
    }
}

/// Surface that drops everything.
#[derive(Default, Debug, Clone, Copy)]
pub struct NullSurface;

impl Surface for NullSurface {
    fn background(&mut self, _color: Color) {}
    fn line(&mut self, _start: Point, _end: Point, _weight: f32, _color: Color) {}
    fn polygon(&mut self, _points: &[Point], _color: Color) {}
    fn rect(&mut self, _center: Point, _w: f32, _h: f32, _color: Color) {}
    fn circle(&mut self, _center: Point, _radius: f32, _color: Color) {}
    fn ring(&mut self, _center: Point, _radius: f32, _weight: f32, _color: Color) {}
    fn text(&mut self, _text: &str, _center: Point, _size: u32, _color: Color) {}
}
