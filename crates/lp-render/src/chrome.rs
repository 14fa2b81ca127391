//! Selection chrome geometry.
//!
//! Produces plain `kurbo::Rect`s in document units; the host paints them
//! under the viewport transform. Handle squares are divided by the zoom
//! so they keep a constant on-screen size.

use kurbo::Rect;
use lp_core::geom::{Handle, IRect, handle_points};

/// Outline and handle squares for a selected layer.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectionChrome {
    pub outline: Rect,
    pub handles: Vec<(Handle, Rect)>,
}

/// Crop marquee overlay: the marquee outline, its handles, and the dimmed
/// parts of the document outside it.
#[derive(Debug, Clone, PartialEq)]
pub struct MarqueeChrome {
    pub outline: Rect,
    pub handles: Vec<(Handle, Rect)>,
    pub dimmed: Vec<Rect>,
}

/// `handle_px` is the on-screen handle side; `scale` is the viewport zoom.
pub fn selection_chrome(rect: &IRect, handle_px: f64, scale: f64) -> SelectionChrome {
    SelectionChrome {
        outline: rect.to_kurbo(),
        handles: handle_squares(rect, handle_px, scale),
    }
}

pub fn marquee_chrome(rect: &IRect, doc: &IRect, handle_px: f64, scale: f64) -> MarqueeChrome {
    MarqueeChrome {
        outline: rect.to_kurbo(),
        handles: handle_squares(rect, handle_px, scale),
        dimmed: dim_regions(rect, doc),
    }
}

fn handle_squares(rect: &IRect, handle_px: f64, scale: f64) -> Vec<(Handle, Rect)> {
    let side = if scale > 0.0 { handle_px / scale } else { handle_px };
    let half = side / 2.0;
    handle_points(rect)
        .into_iter()
        .map(|(h, p)| (h, Rect::new(p.x - half, p.y - half, p.x + half, p.y + half)))
        .collect()
}

// Top and bottom bands span the document width; left and right bands fill
// the marquee's rows.
fn dim_regions(rect: &IRect, doc: &IRect) -> Vec<Rect> {
    let Some(inner) = rect.intersect(doc) else {
        return vec![doc.to_kurbo()];
    };
    let (dx0, dy0, dx1, dy1) = (
        doc.x as f64,
        doc.y as f64,
        doc.right() as f64,
        doc.bottom() as f64,
    );
    let (ix0, iy0, ix1, iy1) = (
        inner.x as f64,
        inner.y as f64,
        inner.right() as f64,
        inner.bottom() as f64,
    );
    [
        Rect::new(dx0, dy0, dx1, iy0),
        Rect::new(dx0, iy1, dx1, dy1),
        Rect::new(dx0, iy0, ix0, iy1),
        Rect::new(ix1, iy0, dx1, iy1),
    ]
    .into_iter()
    .filter(|r| r.width() > 0.0 && r.height() > 0.0)
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handles_shrink_as_zoom_grows() {
        let r = IRect::new(0, 0, 100, 100);
        let chrome = selection_chrome(&r, 12.0, 2.0);
        assert_eq!(chrome.handles.len(), 8);
        let (h, sq) = chrome.handles[0];
        assert_eq!(h, Handle::NW);
        assert_eq!(sq, Rect::new(-3.0, -3.0, 3.0, 3.0));
    }

    #[test]
    fn full_document_marquee_dims_nothing() {
        let doc = IRect::new(0, 0, 50, 40);
        assert!(marquee_chrome(&doc, &doc, 10.0, 1.0).dimmed.is_empty());
    }

    #[test]
    fn centered_marquee_dims_four_bands() {
        let doc = IRect::new(0, 0, 100, 100);
        let m = marquee_chrome(&IRect::new(10, 20, 30, 40), &doc, 10.0, 1.0);
        assert_eq!(
            m.dimmed,
            vec![
                Rect::new(0.0, 0.0, 100.0, 20.0),
                Rect::new(0.0, 60.0, 100.0, 100.0),
                Rect::new(0.0, 20.0, 10.0, 60.0),
                Rect::new(40.0, 20.0, 100.0, 60.0),
            ]
        );
    }
}
