//! Integration tests: layer-set operations seeded from the stock catalog.

use pretty_assertions::assert_eq;
use tov_core::{
    CatalogError, LayerError, LayerId, LayerPatch, LayerSet, MAX_LAYERS, ProjectSnapshot,
    TemplateCatalog, TextLayer,
};

fn festival() -> LayerSet {
    TemplateCatalog::builtin().first().seed()
}

#[test]
fn operations_never_alias_their_input() {
    let before = festival();
    let id = LayerId::intern("layer-1");

    let updated = before.update(id, &LayerPatch::font_size(40));
    let removed = before.remove(id);
    let appended = before
        .append(TextLayer::new_default(LayerId::with_prefix("layer"), 300, 533))
        .unwrap();

    assert_eq!(before, festival(), "input must be left untouched");
    assert_eq!(updated.get(id).unwrap().font_size, 40);
    assert!(!removed.contains(id));
    assert_eq!(appended.len(), before.len() + 1);
}

#[test]
fn fill_to_capacity_then_reject() {
    let mut set = festival();
    while !set.is_full() {
        set = set
            .append(TextLayer::new_default(LayerId::with_prefix("fill"), 300, 533))
            .unwrap();
    }
    assert_eq!(set.len(), MAX_LAYERS);

    let overflow = TextLayer::new_default(LayerId::with_prefix("fill"), 300, 533);
    assert_eq!(
        set.append(overflow),
        Err(LayerError::CapacityExceeded { cap: MAX_LAYERS })
    );
    assert_eq!(set.len(), MAX_LAYERS);
}

#[test]
fn appended_layers_paint_on_top() {
    let added = LayerId::with_prefix("layer");
    let set = festival()
        .append(TextLayer::new_default(added, 300, 533))
        .unwrap();
    assert_eq!(set.iter().last().map(|l| l.id), Some(added));
    assert_eq!(set.renderable().next_back().map(|l| l.id), Some(added));
}

#[test]
fn hiding_a_layer_drops_it_from_rendering_and_caption() {
    let id = LayerId::intern("layer-2");
    let set = festival().update(id, &LayerPatch::visible(false));
    assert!(set.renderable().all(|l| l.id != id));
    assert_eq!(set.caption_summary(), "新春快乐, 2025年");
}

fn catalog_json(seed_size: usize) -> String {
    let layers: Vec<String> = (0..seed_size)
        .map(|i| {
            format!(
                r##"{{ "id": "crowd-{i}", "text": "#{i}", "x": 150, "y": {y}, "fontSize": 16,
                   "fontFamily": "Arial", "color": "#ffffff", "fontWeight": "normal", "visible": true }}"##,
                y = 40 + i * 40
            )
        })
        .collect();
    format!(
        r#"[{{ "id": "crowd", "name": "Crowd", "background": "crowd.png", "layers": [{}] }}]"#,
        layers.join(",")
    )
}

#[test]
fn catalog_seeds_stay_within_capacity() {
    let err = TemplateCatalog::from_json(&catalog_json(MAX_LAYERS + 1)).unwrap_err();
    assert!(matches!(err, CatalogError::TooManyLayers { count, .. } if count == MAX_LAYERS + 1));

    // A seed at the cap is accepted, and the working set it yields saves
    // and reloads as a project.
    let catalog = TemplateCatalog::from_json(&catalog_json(MAX_LAYERS)).unwrap();
    let template = catalog.first();
    let snapshot = ProjectSnapshot::new(template.id.clone(), template.seed());
    let reloaded = ProjectSnapshot::from_json(&snapshot.to_json().unwrap()).unwrap();
    assert_eq!(reloaded.layers.len(), MAX_LAYERS);
}
