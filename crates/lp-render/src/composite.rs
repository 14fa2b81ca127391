//! CPU compositing of the document and its layers.
//!
//! Each layer is drawn from its `(pixels, src, dest)` triple only, in draw
//! order, so the same output can be produced by any external rasterizer.

use lp_core::geom::IRect;
use lp_core::model::{Layer, draw_order};
use lp_core::raster::Raster;

/// Flatten `document` and `layers` into a new document-sized raster.
pub fn composite_scene(document: &Raster, layers: &[Layer]) -> Raster {
    let mut out = document.clone();
    for i in draw_order(layers) {
        let layer = &layers[i];
        log::trace!("composite {} {} <- {}", layer.id, layer.dest, layer.src);
        out.blend_scaled(&layer.pixels, layer.src, layer.dest);
    }
    out
}

/// Copy `rect` out of a composited scene. The rect is clipped to the scene;
/// `None` when nothing of it lies inside.
pub fn cut(scene: &Raster, rect: &IRect) -> Option<Raster> {
    let clipped = rect.intersect(&scene.bounds())?;
    Some(scene.sub_image(clipped))
}

#[cfg(test)]
mod tests {
    use super::*;
    use lp_core::id::LayerId;
    use std::sync::Arc;

    const WHITE: [u8; 4] = [255, 255, 255, 255];
    const RED: [u8; 4] = [255, 0, 0, 255];
    const GREEN: [u8; 4] = [0, 255, 0, 255];

    #[test]
    fn layer_is_drawn_into_dest() {
        let doc = Raster::filled(10, 10, WHITE);
        let layer = Layer::new(LayerId::new(1), Arc::new(Raster::filled(2, 2, RED)), 3, 4);
        let out = composite_scene(&doc, &[layer]);
        assert_eq!(out.pixel(3, 4), Some(RED));
        assert_eq!(out.pixel(4, 5), Some(RED));
        assert_eq!(out.pixel(5, 4), Some(WHITE));
    }

    #[test]
    fn higher_z_paints_last() {
        let doc = Raster::filled(4, 4, WHITE);
        let mut a = Layer::new(LayerId::new(1), Arc::new(Raster::filled(4, 4, RED)), 0, 0);
        let b = Layer::new(LayerId::new(2), Arc::new(Raster::filled(4, 4, GREEN)), 0, 0);
        a.z = 1;
        let out = composite_scene(&doc, &[a, b]);
        assert_eq!(out.pixel(0, 0), Some(RED));
    }

    #[test]
    fn src_crop_is_respected() {
        let mut pixels = Raster::filled(4, 1, RED);
        pixels.put_pixel(2, 0, GREEN);
        pixels.put_pixel(3, 0, GREEN);
        let mut layer = Layer::new(LayerId::new(1), Arc::new(pixels), 0, 0);
        layer.src = IRect::new(2, 0, 2, 1);
        layer.dest = IRect::new(0, 0, 2, 1);
        let out = composite_scene(&Raster::new(4, 1), &[layer]);
        assert_eq!(out.pixel(0, 0), Some(GREEN));
        assert_eq!(out.pixel(2, 0), Some([0, 0, 0, 0]));
    }

    #[test]
    fn cut_clips_to_scene() {
        let scene = Raster::filled(10, 10, WHITE);
        let piece = cut(&scene, &IRect::new(8, 8, 5, 5)).unwrap();
        assert_eq!((piece.width(), piece.height()), (2, 2));
        assert!(cut(&scene, &IRect::new(20, 20, 5, 5)).is_none());
    }
}
