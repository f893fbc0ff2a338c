//! Integration tests: render pass + hit testing over catalog templates.

use kurbo::Point;
use pretty_assertions::assert_eq;
use tov_core::{LayerId, LayerPatch, TemplateCatalog};
use tov_render::{Compositor, RecordedImage, RecordingRasterizer, hit_test};

const CANVAS: (u32, u32) = (300, 533);

fn raster() -> RecordingRasterizer {
    RecordingRasterizer::new(CANVAS.0, CANVAS.1)
}

#[test]
fn frame_boxes_follow_paint_order() {
    let layers = TemplateCatalog::builtin().first().seed();
    let mut raster = raster();
    let frame = Compositor::new().render(&mut raster, None, &layers, None);

    let ids: Vec<&str> = frame.boxes.iter().map(|b| b.id.as_str()).collect();
    assert_eq!(ids, vec!["layer-1", "layer-2", "layer-3"]);
    assert_eq!(raster.filled_texts(), vec!["新春快乐", "恭喜发财", "2025年"]);
    assert_eq!(frame.size, CANVAS);
}

#[test]
fn frame_hit_test_matches_live_hit_test() {
    let layers = TemplateCatalog::builtin().first().seed();
    let mut raster = raster();
    let frame = Compositor::new().render(&mut raster, None, &layers, None);

    for point in [
        Point::new(150.0, 100.0),
        Point::new(150.0, 150.0),
        Point::new(150.0, 450.0),
        Point::new(10.0, 10.0),
        Point::new(199.0, 100.0),
    ] {
        assert_eq!(
            frame.hit_test(point),
            hit_test(&mut raster, &layers, point),
            "disagreement at {point:?}"
        );
    }
}

#[test]
fn hidden_layers_are_neither_drawn_nor_hit() {
    let id = LayerId::intern("layer-1");
    let layers = TemplateCatalog::builtin()
        .first()
        .seed()
        .update(id, &LayerPatch::visible(false));
    let mut raster = raster();
    let frame = Compositor::new().render(&mut raster, None, &layers, Some(id));

    assert!(frame.box_of(id).is_none());
    assert!(raster.selection_boxes().is_empty());
    assert_eq!(hit_test(&mut raster, &layers, Point::new(150.0, 100.0)), None);
}

#[test]
fn missing_background_still_renders_layers() {
    let layers = TemplateCatalog::builtin().first().seed();
    let mut with_bg = raster();
    let mut without_bg = raster();
    let mut compositor = Compositor::new();

    let first = compositor.render(&mut with_bg, Some(&RecordedImage::new(300, 533)), &layers, None);
    let second = compositor.render(&mut without_bg, None, &layers, None);

    assert!(with_bg.drew_image());
    assert!(!without_bg.drew_image());
    assert_eq!(first.boxes, second.boxes);
    assert_eq!(second.seq, first.seq + 1);
}
