//! Spectrum-driven 3D wave mesh.
//!
//! A `cols × rows` grid laid out on a floor plane receding toward a horizon.
//! Each point rises and falls with the spectrum bin under its column and a
//! travelling sine, then the grid is projected and stitched together with
//! lines.

use super::{FrameContext, Layer};
use crate::draw::{Color, Surface};
use crate::geometry::{pt, Bounds, Point};

/// Wave phase speed (radians per second)
const SPEED: f32 = 2.2;
/// Phase offset between neighbouring columns
const COL_PHASE: f32 = 0.35;
/// Phase offset between neighbouring rows
const ROW_PHASE: f32 = 0.55;
/// Peak displacement as a fraction of surface height
const AMPLITUDE: f32 = 0.12;
/// How strongly depth shrinks the far rows
const PERSPECTIVE: f32 = 1.6;

pub struct WaveMesh {
    cols: usize,
    rows: usize,
}

impl WaveMesh {
    pub fn new(cols: usize, rows: usize) -> Self {
        Self { cols, rows }
    }

    /// Vertical displacement factor for one grid point, in [-1, 1] × magnitude.
    pub fn displacement(magnitude: f32, clock: f32, col: usize, row: usize) -> f32 {
        magnitude * (clock * SPEED + col as f32 * COL_PHASE + row as f32 * ROW_PHASE).sin()
    }

    /// Project grid point (`col`, `row`) with the given displacement.
    fn project(&self, b: Bounds, col: usize, row: usize, displacement: f32) -> Point {
        let gx = col as f32 / (self.cols - 1) as f32 * 2.0 - 1.0;
        let depth = if self.rows > 1 {
            row as f32 / (self.rows - 1) as f32
        } else {
            0.0
        };
        let scale = 1.0 / (1.0 + depth * PERSPECTIVE);

        let x = b.x + gx * b.w * 0.48 * scale;
        let floor = b.y - b.h * 0.15 + depth * b.h * 0.35;
        let y = floor + displacement * AMPLITUDE * b.h * scale;
        pt(x, y)
    }
}

impl Layer for WaveMesh {
    fn name(&self) -> &'static str {
        "wave_mesh"
    }

    fn draw(&self, ctx: &FrameContext, surface: &mut dyn Surface) {
        let b = ctx.bounds;
        if self.cols < 2 || self.rows == 0 || b.is_degenerate() || !ctx.clock.is_finite() {
            return;
        }

        let cols = self.cols;
        let mut points = Vec::with_capacity(cols * self.rows);
        let mut mags = Vec::with_capacity(cols * self.rows);
        for row in 0..self.rows {
            for col in 0..cols {
                let mag = ctx.spectrum.at_column(col, cols);
                let d = Self::displacement(mag, ctx.clock, col, row);
                points.push(self.project(b, col, row, d));
                mags.push(mag);
            }
        }

        // Far rows first so the front of the mesh paints over them
        for row in (0..self.rows).rev() {
            let depth = if self.rows > 1 {
                row as f32 / (self.rows - 1) as f32
            } else {
                0.0
            };
            let alpha = 0.9 - depth * 0.6;
            let weight = 1.6 - depth;

            for col in 0..cols {
                let i = row * cols + col;
                let mag = mags[i];
                let hue = ctx.clock * 20.0
                    + col as f32 / cols as f32 * 120.0
                    + depth * 60.0
                    + mag * 90.0;
                let color = Color::hsv(hue, 0.75, 0.45 + 0.55 * mag).with_alpha(alpha);

                if col + 1 < cols {
                    surface.line(points[i], points[i + 1], weight, color);
                }
                if row + 1 < self.rows {
                    surface.line(points[i], points[i + cols], weight, color);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;
    use crate::audio::{Spectrum, NUM_BARS};
    use crate::draw::RecordingSurface;

    #[test]
    fn test_silence_gives_flat_mesh() {
        for clock in [0.0, 1.3, 97.0] {
            for col in 0..8 {
                assert_eq!(WaveMesh::displacement(0.0, clock, col, 3), 0.0);
            }
        }
    }

    #[test]
    fn test_displacement_bounded_by_magnitude() {
        for col in 0..36 {
            let d = WaveMesh::displacement(0.5, 4.2, col, 7);
            assert!(d.abs() <= 0.5);
        }
    }

    #[test]
    fn test_line_count() {
        let mesh = WaveMesh::new(4, 3);
        let spectrum = Spectrum::silent();
        let mut s = RecordingSurface::new();
        mesh.draw(&ctx(&spectrum, Bounds::from_w_h(400.0, 300.0), 0.0), &mut s);
        // 3 rows of 3 horizontal segments, 4 columns of 2 vertical segments
        assert_eq!(s.len(), 3 * 3 + 4 * 2);
    }

    #[test]
    fn test_stays_inside_bounds_at_full_magnitude() {
        let mesh = WaveMesh::new(36, 14);
        let spectrum = Spectrum::from_bins([1.0; NUM_BARS]);
        let bounds = Bounds::from_w_h(900.0, 600.0);
        for clock in [0.0, 0.7, 2.9] {
            let mut s = RecordingSurface::new();
            mesh.draw(&ctx(&spectrum, bounds, clock), &mut s);
            assert!(s.within(bounds, 0.0));
        }
    }

    #[test]
    fn test_single_column_draws_nothing() {
        let mesh = WaveMesh::new(1, 10);
        let spectrum = Spectrum::silent();
        let mut s = RecordingSurface::new();
        mesh.draw(&ctx(&spectrum, Bounds::from_w_h(400.0, 300.0), 0.0), &mut s);
        assert!(s.is_empty());
    }

    #[test]
    fn test_edge_columns_follow_edge_bins() {
        let mut bins = [0.0; NUM_BARS];
        bins[NUM_BARS - 1] = 1.0;
        let spectrum = Spectrum::from_bins(bins);
        assert_eq!(spectrum.at_column(0, 36), 0.0);
        assert_eq!(spectrum.at_column(35, 36), 1.0);
    }
}
