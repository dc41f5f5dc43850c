// Rebuilds past versions by walking reverse patches from the current content.
//
// Entries for versions `2..=current` live in exactly one of two places: the
// page's inline window (newest) or the archive (older). A reconstruction
// gathers the entries it needs from both, checks that they form an unbroken
// run ending at the current version, then reverses them newest first,
// verifying every intermediate content hash along the way.

use tracing::debug;

use folio_common::diff::{self, content_hash};
use folio_common::types::{
    DocumentState, Page, PageId, VersionEntry, VersionNo, VersionSummary, INITIAL_VERSION,
};

use crate::error::{EngineError, EngineResult};
use crate::store::PageStore;

pub struct Reconstructor;

impl Reconstructor {
    /// Full content of `page` at version `target`.
    pub fn version_at<S: PageStore + ?Sized>(
        store: &S,
        page: &Page,
        target: VersionNo,
    ) -> EngineResult<String> {
        let doc = document(page)?;
        let current = doc.current_version;
        if target == 0 || target > current {
            return Err(EngineError::VersionNotFound {
                page_id: page.id,
                version: target,
                reason: format!("valid versions are 1..={current}"),
            });
        }
        if target == current {
            return Ok(doc.content.clone());
        }

        // Entry `target` itself is only needed to check the final hash.
        let lowest = target.max(2);
        let entries = collect_entries(store, page.id, doc, lowest)?;

        let mut content = doc.content.clone();
        for entry in entries.iter().rev() {
            if entry.version == target {
                break;
            }
            check_hash(page.id, entry, &content)?;
            content = diff::reverse_patch(&content, &entry.patch).map_err(|source| {
                EngineError::PatchApplication { page_id: page.id, version: entry.version, source }
            })?;
        }
        if let Some(first) = entries.first().filter(|entry| entry.version == target) {
            check_hash(page.id, first, &content)?;
        }

        debug!(page_id = page.id, target, current, replayed = current - target, "rebuilt version");
        Ok(content)
    }

    /// Unified diff from version `from` to version `to`.
    pub fn diff_between<S: PageStore + ?Sized>(
        store: &S,
        page: &Page,
        from: VersionNo,
        to: VersionNo,
    ) -> EngineResult<String> {
        let old = Self::version_at(store, page, from)?;
        let new = Self::version_at(store, page, to)?;
        Ok(diff::unified_diff(&old, &new))
    }

    /// Every recorded version, archive then window, oldest first.
    pub fn history<S: PageStore + ?Sized>(
        store: &S,
        page: &Page,
    ) -> EngineResult<Vec<VersionSummary>> {
        let Some(doc) = page.document() else {
            return Ok(Vec::new());
        };
        let mut summaries: Vec<VersionSummary> = store
            .find_archived_versions(page.id)?
            .iter()
            .map(|row| VersionSummary::from_entry(&row.entry, true))
            .collect();
        summaries.extend(doc.recent_versions.iter().map(|e| VersionSummary::from_entry(e, false)));
        summaries.sort_by_key(|summary| summary.version);
        Ok(summaries)
    }

    /// Checks that the window and archive together hold exactly one entry
    /// for every version `2..=current`, and that every entry's hash matches
    /// the content it produces, by rebuilding version 1.
    pub fn verify_chain<S: PageStore + ?Sized>(store: &S, page: &Page) -> EngineResult<()> {
        let Some(doc) = page.document() else {
            return Ok(());
        };
        if doc.current_version <= INITIAL_VERSION {
            return Ok(());
        }
        Self::version_at(store, page, INITIAL_VERSION).map(|_| ())
    }
}

fn document(page: &Page) -> EngineResult<&DocumentState> {
    page.document().ok_or_else(|| {
        EngineError::validation(format!("page {} is a directory and has no versions", page.id))
    })
}

/// Entries for versions `lowest..=current`, oldest first, with gaps and
/// duplicates rejected.
fn collect_entries<S: PageStore + ?Sized>(
    store: &S,
    page_id: PageId,
    doc: &DocumentState,
    lowest: VersionNo,
) -> EngineResult<Vec<VersionEntry>> {
    let current = doc.current_version;

    // Archived rows are read through `current` so that a row duplicating a
    // window entry breaks the run below.
    let mut entries: Vec<VersionEntry> = store
        .find_archived_range(page_id, lowest, current)?
        .into_iter()
        .map(|row| row.entry)
        .collect();
    entries.extend(doc.recent_versions.iter().filter(|e| e.version >= lowest).cloned());

    let mut expected = lowest;
    for entry in &entries {
        if entry.version != expected {
            return Err(broken_chain(page_id, expected, entry.version));
        }
        expected += 1;
    }
    if expected != current + 1 {
        return Err(EngineError::VersionNotFound {
            page_id,
            version: expected,
            reason: format!("history has no entry for version {expected} (current is {current})"),
        });
    }
    Ok(entries)
}

fn broken_chain(page_id: PageId, expected: VersionNo, found: VersionNo) -> EngineError {
    EngineError::VersionNotFound {
        page_id,
        version: expected,
        reason: format!("history chain is broken: expected version {expected}, found {found}"),
    }
}

fn check_hash(page_id: PageId, entry: &VersionEntry, content: &str) -> EngineResult<()> {
    let actual = content_hash(Some(content));
    if actual.eq_ignore_ascii_case(&entry.content_hash) {
        return Ok(());
    }
    Err(EngineError::Integrity {
        page_id,
        version: entry.version,
        expected: entry.content_hash.clone(),
        actual,
    })
}
