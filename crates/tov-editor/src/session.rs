//! Editing session: the single owner of editor state.
//!
//! Holds the active template, the working layer set, the selection, the
//! undo history, the background load state and the export history. Every
//! layer mutation is routed through [`HistoryManager`]; UI-only state
//! (selection, background) is not recorded.
//!
//! Background decoding is the host's job. Selecting a template hands out a
//! [`BackgroundRequest`] tagged with a generation number; results for any
//! generation but the latest are dropped, so a slow decode can never
//! overwrite newer state.

use crate::adapters::{FilePicker, PersistenceAdapter};
use crate::config::EditorConfig;
use crate::error::ExportError;
use crate::export::{ExportHistory, ExportRecord};
use crate::history::HistoryManager;
use crate::notice::Notice;
use crate::shortcuts::ShortcutAction;
use kurbo::Point;
use std::sync::Arc;
use tov_core::project::now_millis;
use tov_core::{
    LayerError, LayerId, LayerPatch, LayerSet, MAX_LAYERS, Placement, ProjectSnapshot, Template,
    TemplateCatalog, TemplateId, TextLayer,
};
use tov_render::{Compositor, Frame, LoadError, Rasterizer, display_to_canvas, hit_test};

/// Ask the host to decode `source` and report back with `generation`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackgroundRequest {
    pub generation: u64,
    pub source: String,
}

#[derive(Debug)]
enum Background<I> {
    Pending(BackgroundRequest),
    Ready(I),
    /// Failed to load; layers render over a blank canvas.
    Missing,
}

pub struct EditingSession<I> {
    catalog: TemplateCatalog,
    config: EditorConfig,
    template_id: TemplateId,
    layers: LayerSet,
    selected: Option<LayerId>,
    history: HistoryManager,
    background: Background<I>,
    generation: u64,
    compositor: Compositor,
    exports: ExportHistory,
    notices: Vec<Notice>,
}

impl<I> EditingSession<I> {
    /// Start on the catalog's first template. Its background request is
    /// available from [`background_request`](Self::background_request).
    pub fn new(catalog: TemplateCatalog, config: EditorConfig) -> Self {
        let first = catalog.first();
        let template_id = first.id.clone();
        let layers = first.seed();
        let request = BackgroundRequest {
            generation: 1,
            source: first.background.clone(),
        };
        Self {
            history: HistoryManager::new(config.history_depth),
            exports: ExportHistory::new(config.export_history_cap),
            catalog,
            config,
            template_id,
            layers,
            selected: None,
            background: Background::Pending(request),
            generation: 1,
            compositor: Compositor::new(),
            notices: Vec::new(),
        }
    }

    // ─── Queries ─────────────────────────────────────────────────────────

    pub fn layers(&self) -> &LayerSet {
        &self.layers
    }

    pub fn selected(&self) -> Option<LayerId> {
        self.selected
    }

    pub fn selected_layer(&self) -> Option<&TextLayer> {
        self.selected.and_then(|id| self.layers.get(id))
    }

    pub fn template(&self) -> &Template {
        self.catalog
            .get(&self.template_id)
            .unwrap_or_else(|| self.catalog.first())
    }

    pub fn catalog(&self) -> &TemplateCatalog {
        &self.catalog
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn history(&self) -> &HistoryManager {
        &self.history
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn exports(&self) -> &ExportHistory {
        &self.exports
    }

    /// The outstanding background load, if one is pending.
    pub fn background_request(&self) -> Option<&BackgroundRequest> {
        match &self.background {
            Background::Pending(request) => Some(request),
            _ => None,
        }
    }

    pub fn has_background(&self) -> bool {
        matches!(self.background, Background::Ready(_))
    }

    /// User-visible notices raised since the last drain.
    pub fn drain_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    fn notify(&mut self, notice: Notice) {
        log::debug!("notice: {notice}");
        self.notices.push(notice);
    }

    // ─── Templates & backgrounds ─────────────────────────────────────────

    /// Switch template: fresh copy of its layers, no selection, empty history.
    /// Unknown IDs raise a notice and change nothing.
    pub fn select_template(&mut self, id: &TemplateId) -> Option<BackgroundRequest> {
        let Some(template) = self.catalog.get(id) else {
            self.notify(Notice::error(format!("unknown template `{id}`")));
            return None;
        };
        let layers = template.seed();
        let source = template.background.clone();
        log::debug!("template: switch to {id} ({})", template.name);

        self.template_id = id.clone();
        self.layers = layers;
        self.selected = None;
        self.history.reset();
        Some(self.request_background(source))
    }

    /// Replace the current background with a user-picked file. Layers and
    /// history are untouched. `None` when the picker is cancelled.
    pub fn choose_background(&mut self, picker: &mut dyn FilePicker) -> Option<BackgroundRequest> {
        let source = picker.pick_file()?;
        Some(self.request_background(source))
    }

    fn request_background(&mut self, source: String) -> BackgroundRequest {
        self.generation += 1;
        let request = BackgroundRequest {
            generation: self.generation,
            source,
        };
        self.background = Background::Pending(request.clone());
        request
    }

    /// Deliver a background decode. Returns whether it was applied; results
    /// for superseded requests are ignored.
    pub fn background_loaded(&mut self, generation: u64, result: Result<I, LoadError>) -> bool {
        let pending = matches!(&self.background, Background::Pending(r) if r.generation == generation);
        if !pending {
            log::warn!(
                "background: dropping stale result for generation {generation} (current {})",
                self.generation
            );
            return false;
        }
        match result {
            Ok(image) => self.background = Background::Ready(image),
            Err(e) => {
                log::warn!("background: {e}; rendering without it");
                self.background = Background::Missing;
                self.notify(Notice::error(format!("background failed to load: {e}")));
            }
        }
        true
    }

    // ─── Selection ───────────────────────────────────────────────────────

    /// Select an existing layer. Unknown IDs are ignored.
    pub fn select_layer(&mut self, id: LayerId) -> bool {
        if !self.layers.contains(id) {
            return false;
        }
        self.selected = Some(id);
        true
    }

    pub fn clear_selection(&mut self) {
        self.selected = None;
    }

    /// Map a pointer from display to canvas pixels and select what is under
    /// it. A miss leaves the selection as it was.
    pub fn click<R: Rasterizer>(
        &mut self,
        display_point: Point,
        display_size: (f64, f64),
        raster: &mut R,
    ) -> Option<LayerId> {
        let point = display_to_canvas(display_point, display_size, self.config.canvas_size());
        let hit = hit_test(raster, &self.layers, point)?;
        self.selected = Some(hit);
        Some(hit)
    }

    // ─── Recorded mutations ──────────────────────────────────────────────

    /// Merge `patch` into layer `id`. Stale IDs and empty patches record
    /// nothing.
    pub fn update_layer(&mut self, id: LayerId, patch: &LayerPatch) -> bool {
        if !self.layers.contains(id) {
            log::debug!("update: stale layer {id:?}");
            return false;
        }
        if patch.is_empty() {
            return false;
        }
        self.layers = self
            .history
            .record_and_mutate(&self.layers, |set| set.update(id, patch));
        true
    }

    /// Append a default layer and select it.
    pub fn add_layer(&mut self) -> Result<LayerId, LayerError> {
        let id = LayerId::with_prefix("layer");
        let (width, height) = self.config.canvas_size();
        let layer = TextLayer::new_default(id, width, height);
        match self
            .history
            .try_record_and_mutate(&self.layers, |set| set.append(layer))
        {
            Ok(layers) => {
                self.layers = layers;
                self.selected = Some(id);
                Ok(id)
            }
            Err(e) => {
                let message = match e {
                    LayerError::CapacityExceeded { .. } => {
                        format!("at most {MAX_LAYERS} text layers per image")
                    }
                    LayerError::DuplicateId(_) => e.to_string(),
                };
                self.notify(Notice::error(message));
                Err(e)
            }
        }
    }

    /// Remove layer `id`, clearing the selection if it was selected.
    pub fn delete_layer(&mut self, id: LayerId) -> bool {
        if !self.layers.contains(id) {
            return false;
        }
        self.layers = self.history.record_and_mutate(&self.layers, |set| set.remove(id));
        if self.selected == Some(id) {
            self.selected = None;
        }
        true
    }

    pub fn toggle_visibility(&mut self, id: LayerId) -> bool {
        let Some(visible) = self.layers.get(id).map(|layer| layer.visible) else {
            return false;
        };
        self.update_layer(id, &LayerPatch::visible(!visible))
    }

    /// Move a layer to one of the quick-position presets.
    pub fn place_layer(&mut self, id: LayerId, placement: Placement) -> bool {
        let position = placement.position();
        self.update_layer(id, &LayerPatch::position(position.x, position.y))
    }

    pub fn begin_gesture(&mut self) {
        self.history.begin_batch();
    }

    pub fn end_gesture(&mut self) {
        self.history.end_batch();
    }

    // ─── History ─────────────────────────────────────────────────────────

    pub fn undo(&mut self) -> bool {
        match self.history.undo(&self.layers) {
            Ok(previous) => {
                self.install(previous);
                self.notify(Notice::info("undone"));
                true
            }
            Err(e) => {
                self.notify(Notice::error(e.to_string()));
                false
            }
        }
    }

    pub fn redo(&mut self) -> bool {
        match self.history.redo(&self.layers) {
            Ok(next) => {
                self.install(next);
                self.notify(Notice::info("redone"));
                true
            }
            Err(e) => {
                self.notify(Notice::error(e.to_string()));
                false
            }
        }
    }

    /// Swap in a layer set from history, dropping a selection that no
    /// longer points at anything.
    fn install(&mut self, layers: LayerSet) {
        self.layers = layers;
        if let Some(id) = self.selected
            && !self.layers.contains(id)
        {
            self.selected = None;
        }
    }

    // ─── Rendering & export ──────────────────────────────────────────────

    /// Composite the current state. `None` while the background is still
    /// loading; the host renders again once it delivers.
    pub fn render_frame<R>(&mut self, raster: &mut R) -> Option<Frame>
    where
        R: Rasterizer<Image = I>,
    {
        let background = match &self.background {
            Background::Pending(_) => return None,
            Background::Ready(image) => Some(image),
            Background::Missing => None,
        };
        Some(
            self.compositor
                .render(raster, background, &self.layers, self.selected),
        )
    }

    /// Render, encode and hand the PNG to `adapter`. Layers and history are
    /// never touched, whatever the outcome.
    pub fn export_frame<R>(
        &mut self,
        raster: &mut R,
        adapter: &mut dyn PersistenceAdapter,
    ) -> Result<ExportRecord, ExportError>
    where
        R: Rasterizer<Image = I>,
    {
        let result = self.try_export(raster, adapter);
        match &result {
            Ok(record) => {
                log::info!("exported {} ({} bytes)", record.file_name, record.png.len());
                self.notify(Notice::info(format!("saved {}", record.file_name)));
            }
            Err(e) => {
                log::warn!("export failed: {e}");
                self.notify(Notice::error(format!("export failed: {e}")));
            }
        }
        result
    }

    fn try_export<R>(
        &mut self,
        raster: &mut R,
        adapter: &mut dyn PersistenceAdapter,
    ) -> Result<ExportRecord, ExportError>
    where
        R: Rasterizer<Image = I>,
    {
        if self.layers.is_empty() {
            return Err(ExportError::NothingToExport);
        }
        self.render_frame(raster).ok_or(ExportError::NotReady)?;
        let png: Arc<[u8]> = raster.encode_png()?.into();

        let timestamp = now_millis();
        let file_name = format!("overlay_{timestamp}.png");
        if !adapter.save_bytes(&png, &file_name) {
            return Err(ExportError::NotSaved);
        }
        let caption = self.layers.caption_summary();
        let template_name = self.template().name.clone();
        Ok(self
            .exports
            .push(png, timestamp, caption, template_name, file_name)
            .clone())
    }

    pub fn delete_export(&mut self, id: u64) -> bool {
        if self.exports.remove(id).is_some() {
            self.notify(Notice::info("export deleted"));
            true
        } else {
            false
        }
    }

    /// Go back to the template an export was made from (its stock layers,
    /// not the exported edits).
    pub fn reload_export(&mut self, id: u64) -> Option<BackgroundRequest> {
        let name = self.exports.get(id)?.template_name.clone();
        let Some(template_id) = self.catalog.find_by_name(&name).map(|t| t.id.clone()) else {
            self.notify(Notice::error(format!("template `{name}` is no longer available")));
            return None;
        };
        let request = self.select_template(&template_id)?;
        self.notify(Notice::info("reloaded"));
        Some(request)
    }

    // ─── Projects ────────────────────────────────────────────────────────

    pub fn snapshot(&self) -> ProjectSnapshot {
        ProjectSnapshot::new(self.template_id.clone(), self.layers.clone())
    }

    /// Reopen a saved project: select its template, then install its layers.
    /// History starts empty.
    pub fn restore(&mut self, snapshot: ProjectSnapshot) -> Option<BackgroundRequest> {
        if snapshot.layers.len() > MAX_LAYERS {
            self.notify(Notice::error(format!(
                "project holds {} layers, at most {MAX_LAYERS} allowed",
                snapshot.layers.len()
            )));
            return None;
        }
        if let Some(id) = snapshot.layers.first_duplicate_id() {
            self.notify(Notice::error(format!("project repeats layer id `{id}`")));
            return None;
        }
        let request = self.select_template(&snapshot.template_id)?;
        self.layers = snapshot.layers;
        Some(request)
    }

    /// Serialize the project and hand it to `adapter` as `project_<millis>.json`.
    pub fn save_project(&mut self, adapter: &mut dyn PersistenceAdapter) -> bool {
        let snapshot = self.snapshot();
        let json = match snapshot.to_json() {
            Ok(json) => json,
            Err(e) => {
                self.notify(Notice::error(format!("could not save project: {e}")));
                return false;
            }
        };
        let name = format!("project_{}.json", snapshot.timestamp);
        if adapter.save_bytes(json.as_bytes(), &name) {
            self.notify(Notice::info("project saved"));
            true
        } else {
            self.notify(Notice::error("project was not saved"));
            false
        }
    }

    // ─── Shortcuts ───────────────────────────────────────────────────────

    /// Run a resolved shortcut. Returns whether it did anything.
    pub fn handle_shortcut<R>(
        &mut self,
        action: ShortcutAction,
        raster: &mut R,
        adapter: &mut dyn PersistenceAdapter,
    ) -> bool
    where
        R: Rasterizer<Image = I>,
    {
        match action {
            ShortcutAction::Undo => self.undo(),
            ShortcutAction::Redo => self.redo(),
            ShortcutAction::Delete => match self.selected {
                Some(id) => self.delete_layer(id),
                None => false,
            },
            ShortcutAction::Save => self.save_project(adapter),
            ShortcutAction::Export => self.export_frame(raster, adapter).is_ok(),
            ShortcutAction::Deselect => {
                let had = self.selected.is_some();
                self.clear_selection();
                had
            }
            ShortcutAction::AddLayer => self.add_layer().is_ok(),
        }
    }
}
