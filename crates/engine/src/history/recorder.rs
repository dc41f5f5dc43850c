// Records content edits as forward patches in a page's version window.

use chrono::Utc;
use tracing::{debug, info};

use folio_common::diff::{self, content_hash};
use folio_common::types::{EditorId, Page, VersionEntry};
use folio_common::window::DEFAULT_WINDOW_CAPACITY;

use crate::error::{EngineError, EngineResult};
use crate::history::Archive;
use crate::ids::IdSource;
use crate::store::PageStore;

/// Description stored when an edit does not supply one.
pub const DEFAULT_DESCRIPTION: &str = "Update content";

#[derive(Debug, Clone, Copy)]
pub struct VersionWindow {
    capacity: usize,
}

impl Default for VersionWindow {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW_CAPACITY)
    }
}

impl VersionWindow {
    /// A capacity of zero is treated as one.
    pub fn new(capacity: usize) -> Self {
        Self { capacity: capacity.max(1) }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Replaces the page's content with `new_content` and records the change.
    ///
    /// Returns `None` without touching the page when the content is
    /// unchanged. Otherwise the new entry is pushed into the window and any
    /// entries it evicts are written to the archive before returning; the
    /// caller persists the page itself.
    pub fn record<S, I>(
        &self,
        store: &mut S,
        ids: &I,
        page: &mut Page,
        new_content: &str,
        description: Option<&str>,
        editor_id: Option<EditorId>,
    ) -> EngineResult<Option<VersionEntry>>
    where
        S: PageStore + ?Sized,
        I: IdSource + ?Sized,
    {
        let (page_id, project_id) = (page.id, page.project_id);
        let Some(doc) = page.document_mut() else {
            return Err(EngineError::validation(format!(
                "page {page_id} is a directory and has no content"
            )));
        };

        let new_hash = content_hash(Some(new_content));
        if new_hash == doc.content_hash && doc.content == new_content {
            debug!(page_id, "content unchanged, no version recorded");
            return Ok(None);
        }

        let patch = diff::diff(&doc.content, new_content);
        if patch.is_empty() {
            return Ok(None);
        }

        let now = Utc::now();
        let entry = VersionEntry {
            version: doc.current_version + 1,
            patch: patch.to_unified(),
            description: description
                .map(str::trim)
                .filter(|text| !text.is_empty())
                .unwrap_or(DEFAULT_DESCRIPTION)
                .to_owned(),
            editor_id,
            created_at: now,
            stats: diff::stats_for_patch(&patch, &doc.content, new_content),
            content_hash: new_hash,
        };

        let evicted = doc.recent_versions.push_bounded(entry.clone(), self.capacity);
        doc.content = new_content.to_owned();
        doc.current_version = entry.version;
        doc.content_hash = entry.content_hash.clone();

        if editor_id.is_some() {
            page.updated_by = editor_id;
        }
        page.updated_at = now;

        for old in evicted {
            Archive::archive(store, ids, page_id, project_id, old)?;
        }

        info!(
            page_id,
            version = entry.version,
            added = entry.stats.added_lines,
            deleted = entry.stats.deleted_lines,
            "recorded page version"
        );
        Ok(Some(entry))
    }
}
