//! Crop marquee over the document.
//!
//! Shares the handle vocabulary of layer resize but has no aspect lock:
//! each dragged edge follows the pointer directly, clamped so the rect stays
//! inside the document and at least 1×1.

use kurbo::Point;
use lp_core::geom::{Handle, IRect, clamp_f, round_px};
use lp_render::hit::hit_handle;

/// What a marquee drag does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CropMode {
    Move,
    Resize(Handle),
}

#[derive(Debug, Clone)]
struct CropDrag {
    mode: CropMode,
    start: Point,
    origin: IRect,
}

#[derive(Debug, Clone)]
pub struct CropMarquee {
    pub active: bool,
    pub rect: IRect,
    /// Handle hit radius in document units.
    pub handle_radius: f64,
    drag: Option<CropDrag>,
}

impl CropMarquee {
    pub fn new(handle_radius: f64) -> Self {
        Self {
            active: false,
            rect: IRect::default(),
            handle_radius,
            drag: None,
        }
    }

    /// Flip visibility, or force it with `Some(on)`.
    pub fn toggle(&mut self, on: Option<bool>) {
        self.active = on.unwrap_or(!self.active);
    }

    /// Cover the whole document.
    pub fn set_to_document(&mut self, doc_w: u32, doc_h: u32) {
        self.rect = IRect::of_size(doc_w, doc_h);
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    pub fn mode(&self) -> Option<CropMode> {
        self.drag.as_ref().map(|d| d.mode)
    }

    /// Handles first, then the interior. `None` outside.
    pub fn hit_test(&self, pt: Point) -> Option<CropMode> {
        if let Some(handle) = hit_handle(&self.rect, pt, self.handle_radius) {
            return Some(CropMode::Resize(handle));
        }
        self.rect.contains(pt).then_some(CropMode::Move)
    }

    pub fn begin_drag(&mut self, mode: CropMode, start: Point) {
        self.drag = Some(CropDrag {
            mode,
            start,
            origin: self.rect,
        });
    }

    /// Recompute the rect from the drag origin. Re-delivering the same `pt`
    /// yields the same rect.
    pub fn update_drag(&mut self, pt: Point, bounds: &IRect) -> bool {
        let Some(drag) = &self.drag else {
            return false;
        };
        let o = drag.origin;
        let dx = pt.x - drag.start.x;
        let dy = pt.y - drag.start.y;
        let (bx, by) = (bounds.x as f64, bounds.y as f64);
        let (br, bb) = (bounds.right() as f64, bounds.bottom() as f64);
        let (x, y, w, h) = match drag.mode {
            CropMode::Move => {
                let (w, h) = (o.w as f64, o.h as f64);
                (
                    clamp_f(o.x as f64 + dx, bx, br - w),
                    clamp_f(o.y as f64 + dy, by, bb - h),
                    w,
                    h,
                )
            }
            CropMode::Resize(handle) => {
                let (left, top) = (o.x as f64, o.y as f64);
                let (right, bottom) = (o.right() as f64, o.bottom() as f64);
                let mut nx = if handle.has_west() { left + dx } else { left };
                let mut ny = if handle.has_north() { top + dy } else { top };
                let mut nr = if handle.has_east() { right + dx } else { right };
                let mut nb = if handle.has_south() { bottom + dy } else { bottom };
                nx = clamp_f(nx, bx, nr - 1.0);
                ny = clamp_f(ny, by, nb - 1.0);
                nr = clamp_f(nr, nx + 1.0, br);
                nb = clamp_f(nb, ny + 1.0, bb);
                (nx, ny, nr - nx, nb - ny)
            }
        };
        self.rect = IRect::new(round_px(x), round_px(y), round_px(w), round_px(h));
        log::trace!("crop {:?} -> {}", drag.mode, self.rect);
        true
    }

    pub fn end_drag(&mut self) {
        self.drag = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const DOC: IRect = IRect::new(0, 0, 800, 600);

    fn marquee(rect: IRect) -> CropMarquee {
        let mut m = CropMarquee::new(8.0);
        m.active = true;
        m.rect = rect;
        m
    }

    #[test]
    fn hit_test_prefers_handles_over_interior() {
        let m = marquee(IRect::new(100, 100, 200, 200));
        assert_eq!(
            m.hit_test(Point::new(103.0, 98.0)),
            Some(CropMode::Resize(Handle::NW))
        );
        assert_eq!(m.hit_test(Point::new(150.0, 180.0)), Some(CropMode::Move));
        assert_eq!(m.hit_test(Point::new(10.0, 10.0)), None);
    }

    #[test]
    fn move_is_confined_to_document() {
        let mut m = marquee(IRect::new(100, 100, 200, 200));
        m.begin_drag(CropMode::Move, Point::new(150.0, 150.0));
        m.update_drag(Point::new(2000.0, -500.0), &DOC);
        assert_eq!(m.rect, IRect::new(600, 0, 200, 200));
    }

    #[test]
    fn corner_follows_pointer_without_aspect_lock() {
        let mut m = marquee(IRect::new(100, 100, 200, 200));
        m.begin_drag(CropMode::Resize(Handle::SE), Point::new(300.0, 300.0));
        m.update_drag(Point::new(350.0, 320.0), &DOC);
        assert_eq!(m.rect, IRect::new(100, 100, 250, 220));
    }

    #[test]
    fn west_edge_cannot_cross_east_edge() {
        let mut m = marquee(IRect::new(100, 100, 200, 200));
        m.begin_drag(CropMode::Resize(Handle::W), Point::new(100.0, 200.0));
        m.update_drag(Point::new(900.0, 200.0), &DOC);
        assert_eq!(m.rect, IRect::new(299, 100, 1, 200));
    }

    #[test]
    fn resize_is_clamped_to_bounds() {
        let mut m = marquee(IRect::new(100, 100, 200, 200));
        m.begin_drag(CropMode::Resize(Handle::NW), Point::new(100.0, 100.0));
        m.update_drag(Point::new(-50.0, -50.0), &DOC);
        assert_eq!(m.rect, IRect::new(0, 0, 300, 300));
    }

    #[test]
    fn redelivered_move_is_idempotent() {
        let mut m = marquee(IRect::new(100, 100, 200, 200));
        m.begin_drag(CropMode::Resize(Handle::E), Point::new(300.0, 200.0));
        m.update_drag(Point::new(260.4, 200.0), &DOC);
        let once = m.rect;
        m.update_drag(Point::new(260.4, 200.0), &DOC);
        assert_eq!(m.rect, once);
        assert_eq!(once, IRect::new(100, 100, 160, 200));
    }
}
