//! Recently exported images, newest first.

use std::collections::VecDeque;
use std::sync::Arc;

/// Default number of exports kept.
pub const DEFAULT_EXPORT_CAP: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportRecord {
    /// Unique within one history.
    pub id: u64,
    pub png: Arc<[u8]>,
    /// Milliseconds since the Unix epoch.
    pub timestamp_ms: u64,
    /// Visible layer texts, joined.
    pub caption: String,
    pub template_name: String,
    pub file_name: String,
}

#[derive(Debug, Clone)]
pub struct ExportHistory {
    records: VecDeque<ExportRecord>,
    cap: usize,
    next_id: u64,
}

impl Default for ExportHistory {
    fn default() -> Self {
        Self::new(DEFAULT_EXPORT_CAP)
    }
}

impl ExportHistory {
    pub fn new(cap: usize) -> Self {
        Self {
            records: VecDeque::with_capacity(cap.min(64)),
            cap,
            next_id: 1,
        }
    }

    /// Add a record at the front, dropping the oldest beyond the cap.
    pub fn push(
        &mut self,
        png: Arc<[u8]>,
        timestamp_ms: u64,
        caption: String,
        template_name: String,
        file_name: String,
    ) -> &ExportRecord {
        let id = self.next_id;
        self.next_id += 1;
        self.records.push_front(ExportRecord {
            id,
            png,
            timestamp_ms,
            caption,
            template_name,
            file_name,
        });
        self.records.truncate(self.cap.max(1));
        &self.records[0]
    }

    pub fn get(&self, id: u64) -> Option<&ExportRecord> {
        self.records.iter().find(|r| r.id == id)
    }

    pub fn remove(&mut self, id: u64) -> Option<ExportRecord> {
        let index = self.records.iter().position(|r| r.id == id)?;
        self.records.remove(index)
    }

    /// Newest first.
    pub fn iter(&self) -> impl Iterator<Item = &ExportRecord> + '_ {
        self.records.iter()
    }

    pub fn latest(&self) -> Option<&ExportRecord> {
        self.records.front()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn cap(&self) -> usize {
        self.cap
    }
}
