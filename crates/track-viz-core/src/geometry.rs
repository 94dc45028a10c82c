//! Window-space geometry: centered rectangles with y pointing up.

#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

pub const fn pt(x: f32, y: f32) -> Point {
    Point::new(x, y)
}

/// Surface bounds (window rect)
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Bounds {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Bounds {
    pub fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }
    }

    pub fn from_w_h(w: f32, h: f32) -> Self {
        Self { x: 0.0, y: 0.0, w, h }
    }

    pub fn left(&self) -> f32 {
        self.x - self.w * 0.5
    }

    pub fn right(&self) -> f32 {
        self.x + self.w * 0.5
    }

    pub fn top(&self) -> f32 {
        self.y + self.h * 0.5
    }

    pub fn bottom(&self) -> f32 {
        self.y - self.h * 0.5
    }

    pub fn center(&self) -> Point {
        pt(self.x, self.y)
    }

    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.left() && p.x <= self.right() && p.y >= self.bottom() && p.y <= self.top()
    }

    /// Too small (or non-finite) to lay anything out in.
    pub fn is_degenerate(&self) -> bool {
        !(self.w.is_finite() && self.h.is_finite()) || self.w < 1.0 || self.h < 1.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edges() {
        let b = Bounds::new(10.0, -5.0, 100.0, 50.0);
        assert_eq!(b.left(), -40.0);
        assert_eq!(b.right(), 60.0);
        assert_eq!(b.top(), 20.0);
        assert_eq!(b.bottom(), -30.0);
    }

    #[test]
    fn test_contains_is_inclusive() {
        let b = Bounds::from_w_h(10.0, 10.0);
        assert!(b.contains(pt(5.0, -5.0)));
        assert!(!b.contains(pt(5.1, 0.0)));
    }

    #[test]
    fn test_degenerate() {
        assert!(Bounds::from_w_h(0.0, 600.0).is_degenerate());
        assert!(Bounds::from_w_h(f32::NAN, 600.0).is_degenerate());
        assert!(!Bounds::from_w_h(900.0, 600.0).is_degenerate());
    }
}
