//! WASM bridge for the text overlay editor: exposes an editing session to
//! the browser.
//!
//! Compiled via `wasm-pack build --target web`. The host page decodes
//! backgrounds (an `<img>` per [`BackgroundRequest`]), forwards pointer and
//! key events, and offers finished files for download.

mod canvas2d;

pub use canvas2d::{BackgroundImage, Canvas2dRasterizer};

use kurbo::Point;
use serde_json::{Value, json};
use tov_core::{LayerId, LayerPatch, Placement, ProjectSnapshot, TemplateCatalog, TemplateId};
use tov_editor::adapters::{FixedPicker, MemoryPersistence};
use tov_editor::{BackgroundRequest, EditingSession, EditorConfig, ShortcutAction, ShortcutMap};
use tov_render::LoadError;
use wasm_bindgen::prelude::*;
use web_sys::{HtmlCanvasElement, HtmlImageElement};

/// The main WASM-facing editor controller.
///
/// Owns the session and the canvas. Files the session saves (exports and
/// projects) queue up until the page collects them with
/// [`take_download`](Self::take_download).
#[wasm_bindgen]
pub struct TovCanvas {
    session: EditingSession<BackgroundImage>,
    raster: Canvas2dRasterizer,
    downloads: MemoryPersistence,
}

#[wasm_bindgen]
impl TovCanvas {
    /// Bind to `canvas`. `catalog_json` replaces the built-in templates and
    /// `config_json` overrides editor settings; pass `undefined` for either
    /// to keep the defaults.
    #[wasm_bindgen(constructor)]
    pub fn new(
        canvas: HtmlCanvasElement,
        catalog_json: Option<String>,
        config_json: Option<String>,
    ) -> Result<TovCanvas, JsValue> {
        console_error_panic_hook_setup();

        let catalog = match catalog_json {
            Some(json) => TemplateCatalog::from_json(&json).map_err(to_js_error)?,
            None => TemplateCatalog::builtin(),
        };
        let config = match config_json {
            Some(json) => EditorConfig::from_json(&json).map_err(to_js_error)?,
            None => EditorConfig::default(),
        };
        let (width, height) = config.canvas_size();
        let raster = Canvas2dRasterizer::new(&canvas, width, height)?;
        Ok(Self {
            session: EditingSession::new(catalog, config),
            raster,
            downloads: MemoryPersistence::new(),
        })
    }

    // ─── Templates & backgrounds ─────────────────────────────────────────

    /// All templates as JSON: `[{"id":..,"name":..,"background":..}, ..]`.
    pub fn get_templates_json(&self) -> String {
        let templates: Vec<Value> = self
            .session
            .catalog()
            .iter()
            .map(|t| json!({ "id": t.id, "name": t.name, "background": t.background }))
            .collect();
        Value::Array(templates).to_string()
    }

    pub fn current_template(&self) -> String {
        self.session.template().id.to_string()
    }

    /// Switch template. Returns the background request as JSON, or `null`
    /// if the ID is unknown.
    pub fn select_template(&mut self, id: &str) -> String {
        let request = self.session.select_template(&TemplateId::new(id));
        request_json(request.as_ref())
    }

    /// The outstanding background request as JSON, `null` when none.
    pub fn background_request_json(&self) -> String {
        request_json(self.session.background_request())
    }

    /// Use an image URL the user picked (e.g. an object URL) as background.
    pub fn choose_background(&mut self, url: &str) -> String {
        let request = self.session.choose_background(&mut FixedPicker::new(url));
        request_json(request.as_ref())
    }

    /// Deliver a decoded `<img>` for the request tagged `generation`.
    /// Returns `false` if a newer request superseded it.
    pub fn background_loaded(&mut self, generation: f64, image: HtmlImageElement) -> bool {
        self.session
            .background_loaded(generation as u64, Ok(BackgroundImage(image)))
    }

    pub fn background_failed(&mut self, generation: f64, message: &str) -> bool {
        self.session.background_loaded(
            generation as u64,
            Err(LoadError::Unavailable(message.to_string())),
        )
    }

    // ─── Layers ──────────────────────────────────────────────────────────

    /// The working layer set as JSON, in paint order.
    pub fn get_layers_json(&self) -> String {
        serde_json::to_string(self.session.layers()).unwrap_or_else(|_| "[]".to_string())
    }

    pub fn get_selected_id(&self) -> Option<String> {
        self.session.selected().map(|id| id.as_str().to_string())
    }

    pub fn select_layer(&mut self, id: &str) -> bool {
        known_layer(id).is_some_and(|id| self.session.select_layer(id))
    }

    pub fn clear_selection(&mut self) {
        self.session.clear_selection();
    }

    /// Pointer press at `(x, y)` in CSS pixels on a canvas displayed at
    /// `display_width` × `display_height`. Returns the selected layer ID.
    pub fn click(&mut self, x: f64, y: f64, display_width: f64, display_height: f64) -> Option<String> {
        self.session
            .click(Point::new(x, y), (display_width, display_height), &mut self.raster)
            .map(|id| id.as_str().to_string())
    }

    /// Merge a JSON patch (e.g. `{"text":"Hello","fontSize":30}`) into a
    /// layer. Malformed JSON and unknown IDs change nothing.
    pub fn update_layer(&mut self, id: &str, patch_json: &str) -> bool {
        let Some(id) = known_layer(id) else {
            return false;
        };
        match serde_json::from_str::<LayerPatch>(patch_json) {
            Ok(patch) => self.session.update_layer(id, &patch),
            Err(e) => {
                log::warn!("update_layer: bad patch: {e}");
                false
            }
        }
    }

    /// Append a default layer. Returns its ID, or `None` at capacity.
    pub fn add_layer(&mut self) -> Option<String> {
        self.session
            .add_layer()
            .ok()
            .map(|id| id.as_str().to_string())
    }

    pub fn delete_layer(&mut self, id: &str) -> bool {
        known_layer(id).is_some_and(|id| self.session.delete_layer(id))
    }

    pub fn toggle_visibility(&mut self, id: &str) -> bool {
        known_layer(id).is_some_and(|id| self.session.toggle_visibility(id))
    }

    /// Quick placement: `"top"`, `"middle"` or `"bottom"`.
    pub fn place_layer(&mut self, id: &str, placement: &str) -> bool {
        match (known_layer(id), placement_from_name(placement)) {
            (Some(id), Some(placement)) => self.session.place_layer(id, placement),
            _ => false,
        }
    }

    /// Wrap a slider drag so it undoes in one step.
    pub fn begin_gesture(&mut self) {
        self.session.begin_gesture();
    }

    pub fn end_gesture(&mut self) {
        self.session.end_gesture();
    }

    // ─── History ─────────────────────────────────────────────────────────

    pub fn undo(&mut self) -> bool {
        self.session.undo()
    }

    pub fn redo(&mut self) -> bool {
        self.session.redo()
    }

    pub fn can_undo(&self) -> bool {
        self.session.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.session.can_redo()
    }

    // ─── Rendering & export ──────────────────────────────────────────────

    /// Repaint the canvas. `false` while the background is still loading.
    pub fn render(&mut self) -> bool {
        self.session.render_frame(&mut self.raster).is_some()
    }

    /// Export the current frame. Returns JSON:
    /// `{"ok":true,"id":..,"fileName":".."}` or `{"ok":false,"error":".."}`.
    /// On success the PNG waits in the download queue.
    pub fn export_frame(&mut self) -> String {
        match self.session.export_frame(&mut self.raster, &mut self.downloads) {
            Ok(record) => json!({ "ok": true, "id": record.id, "fileName": record.file_name }).to_string(),
            Err(e) => json!({ "ok": false, "error": e.to_string() }).to_string(),
        }
    }

    /// Recent exports as JSON, newest first (no image bytes).
    pub fn get_exports_json(&self) -> String {
        let records: Vec<Value> = self
            .session
            .exports()
            .iter()
            .map(|r| {
                json!({
                    "id": r.id,
                    "fileName": r.file_name,
                    "timestamp": r.timestamp_ms,
                    "caption": r.caption,
                    "templateName": r.template_name,
                })
            })
            .collect();
        Value::Array(records).to_string()
    }

    /// PNG bytes of one export, for thumbnails and re-download.
    pub fn export_png(&self, id: f64) -> Option<Vec<u8>> {
        self.session.exports().get(id as u64).map(|r| r.png.to_vec())
    }

    pub fn delete_export(&mut self, id: f64) -> bool {
        self.session.delete_export(id as u64)
    }

    pub fn reload_export(&mut self, id: f64) -> String {
        let request = self.session.reload_export(id as u64);
        request_json(request.as_ref())
    }

    // ─── Projects ────────────────────────────────────────────────────────

    pub fn snapshot_json(&self) -> String {
        match self.session.snapshot().to_json() {
            Ok(json) => json,
            Err(e) => json!({ "error": e.to_string() }).to_string(),
        }
    }

    /// Reopen a project. Returns `{"ok":true,"request":{..}}` or
    /// `{"ok":false,"error":".."}`.
    pub fn restore_json(&mut self, json: &str) -> String {
        let snapshot = match ProjectSnapshot::from_json(json) {
            Ok(snapshot) => snapshot,
            Err(e) => return json!({ "ok": false, "error": e.to_string() }).to_string(),
        };
        match self.session.restore(snapshot) {
            Some(request) => json!({
                "ok": true,
                "request": { "generation": request.generation, "source": request.source },
            })
            .to_string(),
            None => json!({ "ok": false, "error": "project could not be opened" }).to_string(),
        }
    }

    /// Queue the project JSON for download.
    pub fn save_project(&mut self) -> bool {
        self.session.save_project(&mut self.downloads)
    }

    // ─── Downloads & notices ─────────────────────────────────────────────

    /// Suggested name of the oldest queued download.
    pub fn pending_download_name(&self) -> Option<String> {
        self.downloads.saved.first().map(|(name, _)| name.clone())
    }

    /// Pop the oldest queued download's bytes.
    pub fn take_download(&mut self) -> Option<Vec<u8>> {
        if self.downloads.saved.is_empty() {
            return None;
        }
        Some(self.downloads.saved.remove(0).1)
    }

    /// Notices raised since the last call, as JSON:
    /// `[{"level":"info"|"error","message":".."}, ..]`.
    pub fn drain_notices_json(&mut self) -> String {
        serde_json::to_string(&self.session.drain_notices()).unwrap_or_else(|_| "[]".to_string())
    }

    // ─── Keyboard Shortcut API ───────────────────────────────────────────

    /// Handle a keyboard event. Returns a JSON string:
    /// `{"changed":bool, "action":"<action_name>"}`
    pub fn handle_key(&mut self, key: &str, ctrl: bool, shift: bool, alt: bool, meta: bool) -> String {
        let Some(action) = ShortcutMap::resolve(key, ctrl, shift, alt, meta) else {
            return r#"{"changed":false,"action":"none"}"#.to_string();
        };
        let changed = self
            .session
            .handle_shortcut(action, &mut self.raster, &mut self.downloads);
        json!({ "changed": changed, "action": action_to_name(action) }).to_string()
    }
}

// ─── Helpers ─────────────────────────────────────────────────────────────

fn request_json(request: Option<&BackgroundRequest>) -> String {
    match request {
        Some(r) => json!({ "generation": r.generation, "source": r.source }).to_string(),
        None => "null".to_string(),
    }
}

/// IDs from JS are looked up, never interned: a name nothing has interned
/// cannot belong to any layer.
fn known_layer(id: &str) -> Option<LayerId> {
    let found = LayerId::get(id);
    if found.is_none() {
        log::debug!("unknown layer id {id:?}");
    }
    found
}

fn placement_from_name(name: &str) -> Option<Placement> {
    match name {
        "top" => Some(Placement::Top),
        "middle" => Some(Placement::Middle),
        "bottom" => Some(Placement::Bottom),
        _ => None,
    }
}

fn action_to_name(action: ShortcutAction) -> &'static str {
    match action {
        ShortcutAction::Undo => "undo",
        ShortcutAction::Redo => "redo",
        ShortcutAction::Delete => "delete",
        ShortcutAction::Save => "save",
        ShortcutAction::Export => "export",
        ShortcutAction::Deselect => "deselect",
        ShortcutAction::AddLayer => "addLayer",
    }
}

fn to_js_error(e: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&e.to_string())
}

// ─── Panic hook for WASM debugging ───────────────────────────────────────

fn console_error_panic_hook_setup() {
    #[cfg(target_arch = "wasm32")]
    {
        use std::sync::Once;
        static SET_HOOK: Once = Once::new();
        SET_HOOK.call_once(|| {
            std::panic::set_hook(Box::new(|info| {
                let msg = format!("tov WASM panic: {info}");
                web_sys::console::error_1(&msg.into());
            }));
        });
    }
}
