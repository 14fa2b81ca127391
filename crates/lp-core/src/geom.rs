//! Integer rectangles, resize handles, and pixel rounding.
//!
//! Layer placement and crop windows live on the integer pixel grid, while
//! pointer positions are `kurbo::Point` (f64) in document coordinates.
//! Every conversion from float to grid goes through [`round_px`] so the
//! whole workspace rounds the same way.

use kurbo::Point;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Round a document-space coordinate to the pixel grid.
///
/// Halves round toward positive infinity (`-2.5 → -2`, `2.5 → 3`), which keeps
/// a rect's width stable when it is dragged across the origin.
pub fn round_px(v: f64) -> i32 {
    (v + 0.5).floor() as i32
}

/// Round `n` and clamp it into `[min, max]`. Inverted bounds are swapped.
pub fn clamp_int(n: f64, min: i32, max: i32) -> i32 {
    let (lo, hi) = if min > max { (max, min) } else { (min, max) };
    round_px(n).clamp(lo, hi)
}

/// Float clamp that never panics on inverted bounds (`lo` wins).
pub fn clamp_f(v: f64, lo: f64, hi: f64) -> f64 {
    lo.max(hi.min(v))
}

/// Axis-aligned rectangle on the pixel grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct IRect {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

impl IRect {
    pub const fn new(x: i32, y: i32, w: i32, h: i32) -> Self {
        Self { x, y, w, h }
    }

    /// Rect covering a `w × h` buffer from the origin.
    pub fn of_size(w: u32, h: u32) -> Self {
        Self::new(0, 0, w as i32, h as i32)
    }

    pub fn right(&self) -> i32 {
        self.x + self.w
    }

    pub fn bottom(&self) -> i32 {
        self.y + self.h
    }

    pub fn center(&self) -> Point {
        Point::new(
            self.x as f64 + self.w as f64 / 2.0,
            self.y as f64 + self.h as f64 / 2.0,
        )
    }

    /// Inclusive containment: points on the right/bottom edge hit.
    pub fn contains(&self, pt: Point) -> bool {
        pt.x >= self.x as f64
            && pt.x <= self.right() as f64
            && pt.y >= self.y as f64
            && pt.y <= self.bottom() as f64
    }

    /// Overlap with another rect, or `None` when they are disjoint.
    pub fn intersect(&self, other: &IRect) -> Option<IRect> {
        let x0 = self.x.max(other.x);
        let y0 = self.y.max(other.y);
        let x1 = self.right().min(other.right());
        let y1 = self.bottom().min(other.bottom());
        (x1 > x0 && y1 > y0).then(|| IRect::new(x0, y0, x1 - x0, y1 - y0))
    }

    pub fn to_kurbo(&self) -> kurbo::Rect {
        kurbo::Rect::new(
            self.x as f64,
            self.y as f64,
            self.right() as f64,
            self.bottom() as f64,
        )
    }
}

impl fmt::Display for IRect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {}×{})", self.x, self.y, self.w, self.h)
    }
}

/// One of the eight draggable control points around a rect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Handle {
    NW,
    NE,
    SW,
    SE,
    N,
    S,
    W,
    E,
}

impl Handle {
    /// Hit-test order: corners first, then edge midpoints.
    pub const ALL: [Handle; 8] = [
        Handle::NW,
        Handle::NE,
        Handle::SW,
        Handle::SE,
        Handle::N,
        Handle::S,
        Handle::W,
        Handle::E,
    ];

    pub fn is_corner(self) -> bool {
        matches!(self, Handle::NW | Handle::NE | Handle::SW | Handle::SE)
    }

    pub fn has_north(self) -> bool {
        matches!(self, Handle::NW | Handle::NE | Handle::N)
    }

    pub fn has_south(self) -> bool {
        matches!(self, Handle::SW | Handle::SE | Handle::S)
    }

    pub fn has_west(self) -> bool {
        matches!(self, Handle::NW | Handle::SW | Handle::W)
    }

    pub fn has_east(self) -> bool {
        matches!(self, Handle::NE | Handle::SE | Handle::E)
    }

    /// The corner that stays fixed while this corner is dragged.
    /// Edge handles return `None`.
    pub fn opposite_corner(self, r: &IRect) -> Option<Point> {
        let (x0, y0) = (r.x as f64, r.y as f64);
        let (x1, y1) = (r.right() as f64, r.bottom() as f64);
        match self {
            Handle::NW => Some(Point::new(x1, y1)),
            Handle::NE => Some(Point::new(x0, y1)),
            Handle::SW => Some(Point::new(x1, y0)),
            Handle::SE => Some(Point::new(x0, y0)),
            _ => None,
        }
    }

    /// Position of this handle on `r`.
    pub fn point_on(self, r: &IRect) -> Point {
        let (x0, y0) = (r.x as f64, r.y as f64);
        let (x1, y1) = (r.right() as f64, r.bottom() as f64);
        let (mx, my) = (x0 + r.w as f64 / 2.0, y0 + r.h as f64 / 2.0);
        match self {
            Handle::NW => Point::new(x0, y0),
            Handle::NE => Point::new(x1, y0),
            Handle::SW => Point::new(x0, y1),
            Handle::SE => Point::new(x1, y1),
            Handle::N => Point::new(mx, y0),
            Handle::S => Point::new(mx, y1),
            Handle::W => Point::new(x0, my),
            Handle::E => Point::new(x1, my),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Handle::NW => "nw",
            Handle::NE => "ne",
            Handle::SW => "sw",
            Handle::SE => "se",
            Handle::N => "n",
            Handle::S => "s",
            Handle::W => "w",
            Handle::E => "e",
        }
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// All eight handle positions of `r`, in [`Handle::ALL`] order.
pub fn handle_points(r: &IRect) -> [(Handle, Point); 8] {
    Handle::ALL.map(|h| (h, h.point_on(r)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_px_rounds_halves_up() {
        assert_eq!(round_px(2.5), 3);
        assert_eq!(round_px(-2.5), -2);
        assert_eq!(round_px(-2.6), -3);
        assert_eq!(round_px(7.49), 7);
    }

    #[test]
    fn clamp_int_swaps_inverted_bounds() {
        assert_eq!(clamp_int(12.0, 10, 1), 10);
        assert_eq!(clamp_int(-4.0, 1, 10), 1);
        assert_eq!(clamp_int(4.4, 1, 10), 4);
    }

    #[test]
    fn contains_is_inclusive_on_far_edges() {
        let r = IRect::new(10, 10, 20, 20);
        assert!(r.contains(Point::new(30.0, 30.0)));
        assert!(r.contains(Point::new(10.0, 10.0)));
        assert!(!r.contains(Point::new(30.1, 15.0)));
    }

    #[test]
    fn opposite_corner_of_nw_is_se() {
        let r = IRect::new(100, 100, 200, 100);
        assert_eq!(
            Handle::NW.opposite_corner(&r),
            Some(Point::new(300.0, 200.0))
        );
        assert_eq!(Handle::E.opposite_corner(&r), None);
    }

    #[test]
    fn intersect_disjoint_is_none() {
        let a = IRect::new(0, 0, 10, 10);
        assert_eq!(a.intersect(&IRect::new(10, 0, 5, 5)), None);
        assert_eq!(
            a.intersect(&IRect::new(5, 5, 10, 10)),
            Some(IRect::new(5, 5, 5, 5))
        );
    }
}
