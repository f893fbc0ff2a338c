//! Undo/redo over layer-set snapshots.
//!
//! Every mutation of the working set goes through [`HistoryManager::record_and_mutate`],
//! which stores the full pre-mutation set. Undo and redo swap whole sets.
//!
//! Slider drags and similar gestures use **batching**: only the first
//! mutation inside a batch records a snapshot, so the whole gesture undoes
//! in one step.

use crate::error::HistoryError;
use tov_core::LayerSet;

/// Undo depth used when the config says nothing.
pub const DEFAULT_MAX_DEPTH: usize = 50;

#[derive(Debug, Clone)]
pub struct HistoryManager {
    undo_stack: Vec<LayerSet>,
    redo_stack: Vec<LayerSet>,
    /// Oldest entries are evicted beyond this; `None` keeps everything.
    max_depth: Option<usize>,
    /// Batch nesting depth (0 = not batching).
    batch_depth: usize,
    /// Whether the open batch already pushed its snapshot.
    batch_recorded: bool,
}

impl Default for HistoryManager {
    fn default() -> Self {
        Self::new(Some(DEFAULT_MAX_DEPTH))
    }
}

impl HistoryManager {
    pub fn new(max_depth: Option<usize>) -> Self {
        Self {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            max_depth,
            batch_depth: 0,
            batch_recorded: false,
        }
    }

    /// Record `current`, clear redo, and return `mutation(current)`.
    pub fn record_and_mutate(
        &mut self,
        current: &LayerSet,
        mutation: impl FnOnce(&LayerSet) -> LayerSet,
    ) -> LayerSet {
        let next = mutation(current);
        self.record(current);
        next
    }

    /// Like [`record_and_mutate`](Self::record_and_mutate) for mutations that
    /// can be rejected. A rejected mutation records nothing.
    pub fn try_record_and_mutate<E>(
        &mut self,
        current: &LayerSet,
        mutation: impl FnOnce(&LayerSet) -> Result<LayerSet, E>,
    ) -> Result<LayerSet, E> {
        let next = mutation(current)?;
        self.record(current);
        Ok(next)
    }

    fn record(&mut self, current: &LayerSet) {
        self.redo_stack.clear();
        if self.batch_depth > 0 {
            if self.batch_recorded {
                return;
            }
            self.batch_recorded = true;
        }
        self.undo_stack.push(current.clone());
        if let Some(max) = self.max_depth
            && self.undo_stack.len() > max
        {
            self.undo_stack.remove(0);
        }
        log::debug!("history: push (undo depth {})", self.undo_stack.len());
    }

    /// Step back: returns the previous set and remembers `current` for redo.
    pub fn undo(&mut self, current: &LayerSet) -> Result<LayerSet, HistoryError> {
        let previous = self
            .undo_stack
            .pop()
            .ok_or(HistoryError::Unavailable { action: "undo" })?;
        self.redo_stack.push(current.clone());
        self.batch_recorded = false;
        log::debug!("history: undo (undo depth {})", self.undo_stack.len());
        Ok(previous)
    }

    /// Step forward again after an undo.
    pub fn redo(&mut self, current: &LayerSet) -> Result<LayerSet, HistoryError> {
        let next = self
            .redo_stack
            .pop()
            .ok_or(HistoryError::Unavailable { action: "redo" })?;
        self.undo_stack.push(current.clone());
        self.batch_recorded = false;
        log::debug!("history: redo (redo depth {})", self.redo_stack.len());
        Ok(next)
    }

    /// Forget everything, including any open batch.
    pub fn reset(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
        self.batch_depth = 0;
        self.batch_recorded = false;
    }

    /// Start a batch. Batches nest; only the outermost one counts.
    pub fn begin_batch(&mut self) {
        if self.batch_depth == 0 {
            self.batch_recorded = false;
        }
        self.batch_depth += 1;
    }

    pub fn end_batch(&mut self) {
        if self.batch_depth == 0 {
            return;
        }
        self.batch_depth -= 1;
        if self.batch_depth == 0 {
            self.batch_recorded = false;
        }
    }

    pub fn is_batching(&self) -> bool {
        self.batch_depth > 0
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_depth(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_depth(&self) -> usize {
        self.redo_stack.len()
    }

    pub fn max_depth(&self) -> Option<usize> {
        self.max_depth
    }
}
