//! RGBA8 pixel buffers.
//!
//! The document and every layer own a `Raster`. Buffers are shared as
//! `Arc<Raster>` between the live scene and history snapshots; mutation goes
//! through `Arc::make_mut`, so a snapshot never observes later edits.

use crate::geom::{IRect, round_px};
use image::imageops::{self, FilterType};
use image::{Pixel, Rgba, RgbaImage};
use serde::{Deserialize, Serialize};

/// Quarter-turn rotations supported by document and layer rotate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Rotation {
    /// 90° clockwise on screen (y grows downward).
    Cw90,
    /// 90° counter-clockwise.
    Ccw90,
    /// 180°.
    Half,
}

impl Rotation {
    /// Whether width and height trade places.
    pub fn swaps_axes(self) -> bool {
        !matches!(self, Rotation::Half)
    }

    /// Rotate an offset from a rotation center.
    pub fn rotate_offset(self, dx: f64, dy: f64) -> (f64, f64) {
        match self {
            Rotation::Cw90 => (-dy, dx),
            Rotation::Ccw90 => (dy, -dx),
            Rotation::Half => (-dx, -dy),
        }
    }

    /// Signed angle in degrees, clockwise positive.
    pub fn degrees(self) -> i32 {
        match self {
            Rotation::Cw90 => 90,
            Rotation::Ccw90 => -90,
            Rotation::Half => 180,
        }
    }
}

/// A `width × height` RGBA8 buffer, row-major, unpremultiplied.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RasterData", into = "RasterData")]
pub struct Raster {
    img: RgbaImage,
}

/// Wire shape of a [`Raster`]. Decoding goes back through
/// [`Raster::from_rgba`], so a record whose byte count disagrees with its
/// size never becomes a buffer.
#[derive(Serialize, Deserialize)]
struct RasterData {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl TryFrom<RasterData> for Raster {
    type Error = String;

    fn try_from(raw: RasterData) -> Result<Self, String> {
        Raster::from_rgba(raw.width, raw.height, raw.data)
    }
}

impl From<Raster> for RasterData {
    fn from(raster: Raster) -> Self {
        Self {
            width: raster.width(),
            height: raster.height(),
            data: raster.img.into_raw(),
        }
    }
}

impl std::fmt::Debug for Raster {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Raster({}×{})", self.width(), self.height())
    }
}

impl Raster {
    /// Fully transparent buffer.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            img: RgbaImage::new(width, height),
        }
    }

    /// Buffer where every pixel is `rgba`.
    pub fn filled(width: u32, height: u32, rgba: [u8; 4]) -> Self {
        Self {
            img: RgbaImage::from_pixel(width, height, Rgba(rgba)),
        }
    }

    /// Wrap raw RGBA bytes. The length must be exactly `width * height * 4`.
    pub fn from_rgba(width: u32, height: u32, data: Vec<u8>) -> Result<Self, String> {
        let expected = width as usize * height as usize * 4;
        let got = data.len();
        if got != expected {
            return Err(format!("raster {width}×{height} needs {expected} bytes, got {got}"));
        }
        RgbaImage::from_raw(width, height, data)
            .map(|img| Self { img })
            .ok_or_else(|| format!("raster {width}×{height} needs {expected} bytes, got {got}"))
    }

    pub fn width(&self) -> u32 {
        self.img.width()
    }

    pub fn height(&self) -> u32 {
        self.img.height()
    }

    pub fn bounds(&self) -> IRect {
        IRect::of_size(self.width(), self.height())
    }

    pub fn data(&self) -> &[u8] {
        self.img.as_raw()
    }

    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.img
    }

    pub fn as_image(&self) -> &RgbaImage {
        &self.img
    }

    fn contains(&self, x: u32, y: u32) -> bool {
        x < self.width() && y < self.height()
    }

    /// Pixel at `(x, y)`, or `None` outside the buffer.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        self.contains(x, y).then(|| self.img.get_pixel(x, y).0)
    }

    /// Overwrite the pixel at `(x, y)`. Out-of-bounds writes are ignored.
    pub fn put_pixel(&mut self, x: u32, y: u32, rgba: [u8; 4]) {
        if self.contains(x, y) {
            self.img.put_pixel(x, y, Rgba(rgba));
        }
    }

    /// Source-over blend `rgba` onto the pixel at `(x, y)`.
    pub fn blend_pixel(&mut self, x: u32, y: u32, rgba: [u8; 4]) {
        if !self.contains(x, y) || rgba[3] == 0 {
            return;
        }
        if rgba[3] == 255 {
            self.img.put_pixel(x, y, Rgba(rgba));
        } else {
            self.img.get_pixel_mut(x, y).blend(&Rgba(rgba));
        }
    }

    pub fn clear(&mut self) {
        self.data_mut().fill(0);
    }

    /// True when every pixel is fully transparent.
    pub fn is_blank(&self) -> bool {
        self.img.pixels().all(|p| p.0[3] == 0)
    }

    /// Copy of the pixels under `rect`. Parts outside the buffer are transparent.
    pub fn sub_image(&self, rect: IRect) -> Raster {
        let mut out = RgbaImage::new(rect.w.max(0) as u32, rect.h.max(0) as u32);
        imageops::replace(&mut out, &self.img, -(rect.x as i64), -(rect.y as i64));
        Self { img: out }
    }

    pub fn rotated(&self, rotation: Rotation) -> Raster {
        let img = match rotation {
            Rotation::Cw90 => imageops::rotate90(&self.img),
            Rotation::Ccw90 => imageops::rotate270(&self.img),
            Rotation::Half => imageops::rotate180(&self.img),
        };
        Self { img }
    }

    pub fn flipped(&self, horizontal: bool, vertical: bool) -> Raster {
        let mut img = self.img.clone();
        if horizontal {
            imageops::flip_horizontal_in_place(&mut img);
        }
        if vertical {
            imageops::flip_vertical_in_place(&mut img);
        }
        Self { img }
    }

    /// Nearest-neighbour resample of the whole buffer to `width × height`.
    pub fn resampled(&self, width: u32, height: u32) -> Raster {
        if self.width() == 0 || self.height() == 0 || width == 0 || height == 0 {
            return Raster::new(width, height);
        }
        Self {
            img: imageops::resize(&self.img, width, height, FilterType::Nearest),
        }
    }

    /// Draw `src_rect` of `src` scaled into `dest` on this buffer (source-over,
    /// nearest sampling). The destination is clipped to this buffer.
    pub fn blend_scaled(&mut self, src: &Raster, src_rect: IRect, dest: IRect) {
        let Some(src_rect) = src_rect.intersect(&src.bounds()) else {
            return;
        };
        if dest.w <= 0 || dest.h <= 0 || dest.intersect(&self.bounds()).is_none() {
            return;
        }
        let piece = imageops::crop_imm(
            &src.img,
            src_rect.x as u32,
            src_rect.y as u32,
            src_rect.w as u32,
            src_rect.h as u32,
        )
        .to_image();
        let (dw, dh) = (dest.w as u32, dest.h as u32);
        let (x, y) = (dest.x as i64, dest.y as i64);
        if (dw, dh) == piece.dimensions() {
            imageops::overlay(&mut self.img, &piece, x, y);
        } else {
            let scaled = imageops::resize(&piece, dw, dh, FilterType::Nearest);
            imageops::overlay(&mut self.img, &scaled, x, y);
        }
    }

    /// Re-fit this content into a new `width × height` buffer: uniformly
    /// scaled to fit, centered, never stretched.
    pub fn fitted_into(&self, width: u32, height: u32) -> Raster {
        let mut out = Raster::new(width, height);
        if self.width() == 0 || self.height() == 0 {
            return out;
        }
        let scale = (width as f64 / self.width() as f64).min(height as f64 / self.height() as f64);
        let dw = round_px(self.width() as f64 * scale).max(1);
        let dh = round_px(self.height() as f64 * scale).max(1);
        let dx = ((width as i32 - dw) as f64 / 2.0).floor() as i32;
        let dy = ((height as i32 - dh) as f64 / 2.0).floor() as i32;
        out.blend_scaled(self, self.bounds(), IRect::new(dx, dy, dw, dh));
        out
    }
}
