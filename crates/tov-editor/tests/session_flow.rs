//! Integration tests: end-to-end editing flows (click, background, export,
//! projects) against the recording rasterizer.

use kurbo::Point;
use pretty_assertions::assert_eq;
use tov_core::{LayerId, LayerPatch, ProjectSnapshot, TemplateCatalog, TemplateId};
use tov_editor::adapters::MemoryPersistence;
use tov_editor::{EditingSession, EditorConfig, ExportError, NoticeLevel};
use tov_render::{LoadError, RecordedImage, RecordingRasterizer};

fn ready_session() -> EditingSession<RecordedImage> {
    let mut session = EditingSession::new(TemplateCatalog::builtin(), EditorConfig::default());
    let generation = session.background_request().unwrap().generation;
    session.background_loaded(generation, Ok(RecordedImage::new(300, 533)));
    session
}

fn raster() -> RecordingRasterizer {
    RecordingRasterizer::new(300, 533)
}

// ─── Pointer ────────────────────────────────────────────────────────────

#[test]
fn click_on_scaled_display_selects_layer() {
    let mut session = ready_session();
    let mut raster = raster();
    // Canvas shown at half size: (75, 50) on screen is (150, 100) on canvas.
    let hit = session.click(Point::new(75.0, 50.0), (150.0, 266.5), &mut raster);
    assert_eq!(hit, Some(LayerId::intern("layer-1")));
    assert_eq!(session.selected(), hit);
}

#[test]
fn click_on_background_keeps_selection() {
    let mut session = ready_session();
    let mut raster = raster();
    session.select_layer(LayerId::intern("layer-2"));
    assert_eq!(session.click(Point::new(5.0, 5.0), (300.0, 533.0), &mut raster), None);
    assert_eq!(session.selected(), Some(LayerId::intern("layer-2")));
}

#[test]
fn topmost_layer_wins_click() {
    let mut session = ready_session();
    let mut raster = raster();
    // Move layer-3 on top of layer-1; layer-3 paints later.
    session.update_layer(LayerId::intern("layer-3"), &LayerPatch::position(150.0, 100.0));
    let hit = session.click(Point::new(150.0, 100.0), (300.0, 533.0), &mut raster);
    assert_eq!(hit, Some(LayerId::intern("layer-3")));
}

#[test]
fn hidden_layer_is_not_clickable_or_drawn() {
    let mut session = ready_session();
    let mut raster = raster();
    let id = LayerId::intern("layer-1");
    session.toggle_visibility(id);
    assert_eq!(session.click(Point::new(150.0, 100.0), (300.0, 533.0), &mut raster), None);
    let frame = session.render_frame(&mut raster).unwrap();
    assert!(frame.box_of(id).is_none());
    assert!(!raster.filled_texts().contains(&"新春快乐"));
}

#[test]
fn selected_layer_gets_a_selection_box() {
    let mut session = ready_session();
    let mut raster = raster();
    session.select_layer(LayerId::intern("layer-2"));
    session.render_frame(&mut raster).unwrap();
    assert_eq!(raster.selection_boxes().len(), 1);
}

// ─── Background generations ─────────────────────────────────────────────

#[test]
fn stale_background_result_is_ignored() {
    let mut session = EditingSession::<RecordedImage>::new(TemplateCatalog::builtin(), EditorConfig::default());
    let first = session.background_request().unwrap().clone();
    let second = session.select_template(&TemplateId::new("2")).unwrap();
    assert!(second.generation > first.generation);

    // The slow first decode lands after the switch.
    assert!(!session.background_loaded(first.generation, Ok(RecordedImage::new(10, 10))));
    assert!(!session.has_background());
    assert!(session.render_frame(&mut raster()).is_none());

    assert!(session.background_loaded(second.generation, Ok(RecordedImage::new(300, 533))));
    assert!(session.has_background());

    // A late failure for a superseded request raises nothing.
    assert!(!session.background_loaded(first.generation, Err(LoadError::Decode("late".into()))));
    assert!(session.drain_notices().is_empty());
}

// ─── Export ─────────────────────────────────────────────────────────────

#[test]
fn export_records_and_leaves_history_alone() {
    let mut session = ready_session();
    let mut raster = raster();
    let mut adapter = MemoryPersistence::new();
    session.update_layer(LayerId::intern("layer-2"), &LayerPatch::visible(false));
    let (undo, redo) = (session.history().undo_depth(), session.history().redo_depth());
    let layers = session.layers().clone();

    let record = session.export_frame(&mut raster, &mut adapter).unwrap();
    assert!(record.file_name.starts_with("overlay_") && record.file_name.ends_with(".png"));
    assert_eq!(record.caption, "新春快乐, 2025年");
    assert_eq!(record.template_name, "Spring Festival");
    assert_eq!(adapter.saved.len(), 1);
    assert_eq!(&adapter.saved[0].1[..], &record.png[..]);

    assert_eq!(session.layers(), &layers);
    assert_eq!(session.history().undo_depth(), undo);
    assert_eq!(session.history().redo_depth(), redo);
    assert_eq!(session.exports().len(), 1);
    let notices = session.drain_notices();
    assert_eq!(notices.last().map(|n| n.level), Some(NoticeLevel::Info));
}

#[test]
fn cancelled_save_is_reported_not_recorded() {
    let mut session = ready_session();
    let mut refusing = MemoryPersistence::refusing();
    let result = session.export_frame(&mut raster(), &mut refusing);
    assert!(matches!(result, Err(ExportError::NotSaved)));
    assert!(session.exports().is_empty());
    assert_eq!(session.drain_notices().len(), 1);
}

#[test]
fn encoder_failure_is_reported() {
    let mut session = ready_session();
    let mut broken = raster().failing_encode();
    let result = session.export_frame(&mut broken, &mut MemoryPersistence::new());
    assert!(matches!(result, Err(ExportError::Render(_))));
    assert!(session.exports().is_empty());
}

#[test]
fn empty_set_has_nothing_to_export() {
    let mut session = ready_session();
    for id in ["layer-1", "layer-2", "layer-3"] {
        session.delete_layer(LayerId::intern(id));
    }
    let result = session.export_frame(&mut raster(), &mut MemoryPersistence::new());
    assert!(matches!(result, Err(ExportError::NothingToExport)));
    assert!(session.can_undo());
}

#[test]
fn export_waits_for_background() {
    let mut session = EditingSession::<RecordedImage>::new(TemplateCatalog::builtin(), EditorConfig::default());
    let result = session.export_frame(&mut raster(), &mut MemoryPersistence::new());
    assert!(matches!(result, Err(ExportError::NotReady)));
}

#[test]
fn export_history_reload_and_delete() {
    let mut session = ready_session();
    let mut adapter = MemoryPersistence::new();
    session.select_template(&TemplateId::new("3")).unwrap();
    let generation = session.background_request().unwrap().generation;
    session.background_loaded(generation, Ok(RecordedImage::new(300, 533)));
    session.update_layer(LayerId::intern("layer-1"), &LayerPatch::text("Happy birthday"));
    let record = session.export_frame(&mut raster(), &mut adapter).unwrap();

    session.select_template(&TemplateId::new("1")).unwrap();
    let request = session.reload_export(record.id).unwrap();
    assert_eq!(session.template().name, "Birthday");
    assert_eq!(request.source, session.template().background);
    // Reload goes back to the stock layers.
    assert_eq!(
        session.layers().get(LayerId::intern("layer-1")).unwrap().text,
        "生日快乐"
    );
    assert_eq!(session.exports().len(), 1, "reload keeps the export");

    assert!(session.delete_export(record.id));
    assert!(!session.delete_export(record.id));
    assert!(session.reload_export(record.id).is_none());
}

// ─── Projects ───────────────────────────────────────────────────────────

#[test]
fn snapshot_restore_roundtrip() {
    let mut session = ready_session();
    session.select_template(&TemplateId::new("4")).unwrap();
    session.update_layer(LayerId::intern("layer-2"), &LayerPatch::text("Trusted"));
    session.add_layer().unwrap();
    let json = session.snapshot().to_json().unwrap();

    let mut reopened = ready_session();
    let snapshot = ProjectSnapshot::from_json(&json).unwrap();
    let request = reopened.restore(snapshot).unwrap();
    assert_eq!(reopened.template().id, TemplateId::new("4"));
    assert_eq!(reopened.layers(), session.layers());
    assert!(!reopened.can_undo());
    assert!(reopened.background_request().is_some_and(|r| *r == request));
}

#[test]
fn restore_with_unknown_template_changes_nothing() {
    let mut session = ready_session();
    let before = session.layers().clone();
    let mut snapshot = session.snapshot();
    snapshot.template_id = TemplateId::new("retired");
    assert!(session.restore(snapshot).is_none());
    assert_eq!(session.layers(), &before);
    assert!(session.drain_notices()[0].is_error());
}

#[test]
fn save_project_hands_json_to_adapter() {
    let mut session = ready_session();
    let mut adapter = MemoryPersistence::new();
    assert!(session.save_project(&mut adapter));
    let (name, bytes) = &adapter.saved[0];
    assert!(name.starts_with("project_") && name.ends_with(".json"));
    let snapshot = ProjectSnapshot::from_json(std::str::from_utf8(bytes).unwrap()).unwrap();
    assert_eq!(&snapshot.layers, session.layers());
}
