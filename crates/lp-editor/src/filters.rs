//! Per-pixel filter seam.
//!
//! Filters mutate a raster in place; the editor snapshots the result. Only
//! independent per-pixel passes belong here.

use lp_core::raster::Raster;

pub trait PixelFilter {
    fn name(&self) -> &str;

    fn apply(&self, target: &mut Raster);
}

/// Brightness / contrast / saturation, each in `-100..=100` with 0 neutral.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Adjustments {
    pub brightness: f32,
    pub contrast: f32,
    pub saturation: f32,
}

impl Adjustments {
    pub fn is_identity(&self) -> bool {
        self.brightness == 0.0 && self.contrast == 0.0 && self.saturation == 0.0
    }
}

const LUMA: [f32; 3] = [0.2126, 0.7152, 0.0722];

impl PixelFilter for Adjustments {
    fn name(&self) -> &str {
        "adjustments"
    }

    fn apply(&self, target: &mut Raster) {
        if self.is_identity() {
            return;
        }
        let offset = self.brightness.clamp(-100.0, 100.0) / 100.0 * 255.0;
        // 100 would divide by zero
        let k = self.contrast.clamp(-100.0, 99.0);
        let contrast = (259.0 * (k + 100.0)) / (255.0 * (100.0 - k));
        let sat = self.saturation.clamp(-100.0, 100.0) / 100.0 + 1.0;
        let inv = 1.0 - sat;

        for px in target.data_mut().chunks_exact_mut(4) {
            let mut rgb = [0.0f32; 3];
            for (out, &v) in rgb.iter_mut().zip(px.iter()) {
                *out = clamp_byte(contrast * (v as f32 - 128.0) + 128.0 + offset);
            }
            let lum = LUMA[0] * rgb[0] + LUMA[1] * rgb[1] + LUMA[2] * rgb[2];
            for (dst, v) in px.iter_mut().zip(rgb) {
                *dst = clamp_byte(lum * inv + v * sat).round() as u8;
            }
        }
    }
}

fn clamp_byte(v: f32) -> f32 {
    v.clamp(0.0, 255.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_leaves_pixels_alone() {
        let mut r = Raster::filled(2, 2, [10, 20, 30, 255]);
        Adjustments::default().apply(&mut r);
        assert_eq!(r.pixel(1, 1), Some([10, 20, 30, 255]));
    }

    #[test]
    fn full_brightness_saturates_to_white() {
        let mut r = Raster::filled(1, 1, [10, 20, 30, 200]);
        let f = Adjustments {
            brightness: 100.0,
            ..Default::default()
        };
        f.apply(&mut r);
        assert_eq!(r.pixel(0, 0), Some([255, 255, 255, 200]));
    }

    #[test]
    fn desaturate_makes_gray() {
        let mut r = Raster::filled(1, 1, [200, 50, 50, 255]);
        let f = Adjustments {
            saturation: -100.0,
            ..Default::default()
        };
        f.apply(&mut r);
        let p = r.pixel(0, 0).unwrap();
        assert_eq!(p[0], p[1]);
        assert_eq!(p[1], p[2]);
    }
}
