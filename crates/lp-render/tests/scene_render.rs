//! Integration tests: what is painted on top is what is hit first.

use kurbo::Point;
use lp_core::geom::IRect;
use lp_core::id::LayerId;
use lp_core::model::Layer;
use lp_core::raster::Raster;
use lp_render::{composite_scene, cut, hit_test};
use pretty_assertions::assert_eq;
use std::sync::Arc;

fn solid(id: u32, rgba: [u8; 4], dest: IRect, z: i32) -> Layer {
    let mut layer = Layer::new(LayerId::new(id), Arc::new(Raster::filled(4, 4, rgba)), 0, 0);
    layer.dest = dest;
    layer.z = z;
    layer
}

#[test]
fn topmost_painted_layer_is_hit() {
    let layers = vec![
        solid(1, [255, 0, 0, 255], IRect::new(0, 0, 10, 10), 3),
        solid(2, [0, 0, 255, 255], IRect::new(5, 5, 10, 10), 0),
    ];
    let flat = composite_scene(&Raster::new(20, 20), &layers);

    // red has the higher z, so it wins the overlap both ways
    assert_eq!(flat.pixel(7, 7), Some([255, 0, 0, 255]));
    assert_eq!(hit_test(&layers, Point::new(7.0, 7.0)), Some(LayerId::new(1)));
    assert_eq!(flat.pixel(12, 12), Some([0, 0, 255, 255]));
    assert_eq!(hit_test(&layers, Point::new(12.0, 12.0)), Some(LayerId::new(2)));
}

#[test]
fn cut_clips_to_the_scene() {
    let flat = Raster::filled(10, 10, [1, 1, 1, 255]);
    let piece = cut(&flat, &IRect::new(6, -2, 10, 5)).unwrap();
    assert_eq!((piece.width(), piece.height()), (4, 3));
    assert!(cut(&flat, &IRect::new(20, 20, 5, 5)).is_none());
}
