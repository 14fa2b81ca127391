//! Brush painting seam.
//!
//! The editor maps document-space pointer positions into the target's pixel
//! space and hands each segment to a [`Brush`]. What the brush does with the
//! pixels is its own business; the editor only snapshots around the stroke.

use kurbo::Point;
use lp_core::raster::Raster;

pub trait Brush {
    /// Paint one segment. `from`/`to` are in `target` pixel coordinates and
    /// `scale` is target pixels per document unit, so a brush can keep a
    /// constant on-document width when painting into a scaled layer.
    fn stroke(&mut self, target: &mut Raster, from: Point, to: Point, scale: f64);
}

/// Solid round brush: stamps discs along the segment.
#[derive(Debug, Clone)]
pub struct RoundBrush {
    pub color: [u8; 4],
    /// Diameter in document units.
    pub width: f64,
}

impl Default for RoundBrush {
    fn default() -> Self {
        Self {
            color: [0, 0, 0, 255],
            width: 8.0,
        }
    }
}

impl RoundBrush {
    pub fn new(color: [u8; 4], width: f64) -> Self {
        Self { color, width }
    }

    fn stamp(&self, target: &mut Raster, center: Point, radius: f64) {
        let r2 = radius * radius;
        let x0 = (center.x - radius).floor().max(0.0) as i64;
        let y0 = (center.y - radius).floor().max(0.0) as i64;
        let x1 = ((center.x + radius).ceil() as i64).min(target.width() as i64 - 1);
        let y1 = ((center.y + radius).ceil() as i64).min(target.height() as i64 - 1);
        for y in y0..=y1 {
            for x in x0..=x1 {
                let dx = x as f64 + 0.5 - center.x;
                let dy = y as f64 + 0.5 - center.y;
                if dx * dx + dy * dy <= r2 {
                    target.blend_pixel(x as u32, y as u32, self.color);
                }
            }
        }
    }
}

impl Brush for RoundBrush {
    fn stroke(&mut self, target: &mut Raster, from: Point, to: Point, scale: f64) {
        let radius = (self.width * scale).max(1.0) / 2.0;
        let len = (to - from).hypot();
        // One stamp per half radius keeps the line solid
        let steps = ((len / (radius / 2.0).max(0.5)).ceil() as usize).max(1);
        for i in 0..=steps {
            let t = i as f64 / steps as f64;
            self.stamp(target, from.lerp(to, t), radius);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const INK: [u8; 4] = [10, 20, 30, 255];

    #[test]
    fn stroke_paints_along_segment() {
        let mut r = Raster::new(20, 5);
        let mut brush = RoundBrush::new(INK, 2.0);
        brush.stroke(&mut r, Point::new(2.5, 2.5), Point::new(17.5, 2.5), 1.0);
        assert_eq!(r.pixel(2, 2), Some(INK));
        assert_eq!(r.pixel(10, 2), Some(INK));
        assert_eq!(r.pixel(17, 2), Some(INK));
        assert_eq!(r.pixel(10, 0), Some([0, 0, 0, 0]));
    }

    #[test]
    fn stroke_outside_target_is_clipped() {
        let mut r = Raster::new(4, 4);
        let mut brush = RoundBrush::new(INK, 4.0);
        brush.stroke(&mut r, Point::new(-10.0, -10.0), Point::new(-5.0, -5.0), 1.0);
        assert!(r.is_blank());
    }
}
