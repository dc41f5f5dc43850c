// Content service: the single entry point the CLI drives.
//
// Every mutating operation runs inside one store transaction, so a page row,
// its window and any entries archived by the same edit commit together.

use std::collections::HashSet;

use tracing::{debug, info, warn};

use folio_common::types::{
    EditorId, Page, PageId, ProjectId, ProjectStatistics, TreeNode, VersionEntry, VersionNo,
    VersionSummary,
};

use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult};
use crate::history::{Reconstructor, VersionWindow};
use crate::ids::IdSource;
use crate::search::{self, SearchHit};
use crate::store::PageStore;
use crate::tree::{NewPage, PageTree};

/// Result of a content edit. `entry` is `None` when the content was
/// unchanged.
#[derive(Debug, Clone)]
pub struct EditOutcome {
    pub page: Page,
    pub entry: Option<VersionEntry>,
}

pub struct ContentService<S, I> {
    store: S,
    ids: I,
    config: EngineConfig,
    window: VersionWindow,
    tree: PageTree,
}

impl<S: PageStore, I: IdSource> ContentService<S, I> {
    pub fn new(store: S, ids: I, config: EngineConfig) -> Self {
        let window = VersionWindow::new(config.window_capacity);
        let tree = PageTree::new(config.copy_title_prefix.clone());
        Self { store, ids, config, window, tree }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Runs `op` inside a store transaction, rolling back on any error.
    ///
    /// The id source is advanced past every id already stored before `op`
    /// runs, so writers sharing one database never hand out the same id.
    fn atomically<T>(&mut self, op: impl FnOnce(&mut Self) -> EngineResult<T>) -> EngineResult<T> {
        self.store.begin()?;
        let result = self.sync_ids().and_then(|()| op(self));
        match result {
            Ok(value) => {
                self.store.commit()?;
                Ok(value)
            }
            Err(error) => {
                if let Err(rollback_error) = self.store.rollback() {
                    warn!(error = %rollback_error, "failed to roll back transaction");
                }
                Err(error)
            }
        }
    }

    fn sync_ids(&self) -> EngineResult<()> {
        if let Some(highest) = self.store.max_assigned_id()? {
            self.ids.observe(highest);
        }
        Ok(())
    }

    // ── Pages ─────────────────────────────────────────────────────

    pub fn create_page(&mut self, new: NewPage) -> EngineResult<Page> {
        self.atomically(|svc| svc.tree.create(&mut svc.store, &svc.ids, new))
    }

    pub fn page(&self, page_id: PageId) -> EngineResult<Page> {
        self.store.find_page(page_id)?.ok_or(EngineError::PageNotFound(page_id))
    }

    /// Leading characters of a document's content, per `summary_chars`.
    pub fn summary_of(&self, page: &Page) -> Option<String> {
        page.document().map(|doc| doc.summary(self.config.summary_chars))
    }

    /// Replaces a document's content, recording a version when it changed.
    pub fn update_content(
        &mut self,
        page_id: PageId,
        content: &str,
        description: Option<&str>,
        editor: Option<EditorId>,
    ) -> EngineResult<EditOutcome> {
        self.atomically(|svc| {
            let mut page = svc.page(page_id)?;
            let entry = svc.window.record(
                &mut svc.store,
                &svc.ids,
                &mut page,
                content,
                description,
                editor,
            )?;
            if entry.is_some() {
                svc.store.save_page(&page)?;
            } else {
                info!(page_id, "edit left content unchanged");
            }
            Ok(EditOutcome { page, entry })
        })
    }

    pub fn move_page(
        &mut self,
        page_id: PageId,
        new_parent: Option<PageId>,
        operator: Option<EditorId>,
    ) -> EngineResult<Page> {
        self.atomically(|svc| svc.tree.move_page(&mut svc.store, page_id, new_parent, operator))
    }

    pub fn copy_page(
        &mut self,
        page_id: PageId,
        target_parent: Option<PageId>,
        new_title: Option<&str>,
        operator: Option<EditorId>,
    ) -> EngineResult<Page> {
        self.atomically(|svc| {
            svc.tree.copy(&mut svc.store, &svc.ids, page_id, target_parent, new_title, operator)
        })
    }

    pub fn rename_page(
        &mut self,
        page_id: PageId,
        title: &str,
        operator: Option<EditorId>,
    ) -> EngineResult<Page> {
        self.atomically(|svc| svc.tree.rename(&mut svc.store, page_id, title, operator))
    }

    pub fn reorder_page(
        &mut self,
        page_id: PageId,
        sort_order: i64,
        operator: Option<EditorId>,
    ) -> EngineResult<Page> {
        self.atomically(|svc| {
            svc.tree.set_sort_order(&mut svc.store, page_id, sort_order, operator)
        })
    }

    /// Deletes a page with its subtree and archived history.
    pub fn delete_page(&mut self, page_id: PageId) -> EngineResult<usize> {
        self.atomically(|svc| svc.tree.delete_recursive(&mut svc.store, page_id))
    }

    /// Deletes every page of a project along with the project's archive.
    pub fn delete_project(&mut self, project_id: ProjectId) -> EngineResult<usize> {
        self.atomically(|svc| {
            let pages = svc.store.find_by_project(project_id)?;
            for page in &pages {
                svc.store.delete_page(page.id)?;
            }
            crate::history::Archive::purge_project(&mut svc.store, project_id)?;
            info!(project_id, deleted = pages.len(), "deleted project pages");
            Ok(pages.len())
        })
    }

    // ── History ───────────────────────────────────────────────────

    pub fn version_content(&self, page_id: PageId, version: VersionNo) -> EngineResult<String> {
        let page = self.page(page_id)?;
        Reconstructor::version_at(&self.store, &page, version)
    }

    pub fn compare_versions(
        &self,
        page_id: PageId,
        from: VersionNo,
        to: VersionNo,
    ) -> EngineResult<String> {
        let page = self.page(page_id)?;
        Reconstructor::diff_between(&self.store, &page, from, to)
    }

    pub fn history(&self, page_id: PageId) -> EngineResult<Vec<VersionSummary>> {
        let page = self.page(page_id)?;
        Reconstructor::history(&self.store, &page)
    }

    pub fn verify_history(&self, page_id: PageId) -> EngineResult<()> {
        let page = self.page(page_id)?;
        Reconstructor::verify_chain(&self.store, &page)
    }

    // ── Listings ──────────────────────────────────────────────────

    pub fn tree(&self, project_id: ProjectId) -> EngineResult<Vec<TreeNode>> {
        self.tree.tree(&self.store, project_id)
    }

    pub fn children(
        &self,
        project_id: ProjectId,
        parent_id: Option<PageId>,
    ) -> EngineResult<Vec<Page>> {
        self.tree.children(&self.store, project_id, parent_id)
    }

    /// Pages whose title contains `keyword`, ignoring case.
    pub fn search_by_title(&self, project_id: ProjectId, keyword: &str) -> EngineResult<Vec<Page>> {
        let needle = keyword.trim().to_lowercase();
        if needle.is_empty() {
            return Err(EngineError::validation("search keyword must not be empty"));
        }
        Ok(self
            .store
            .find_by_project(project_id)?
            .into_iter()
            .filter(|page| page.title.to_lowercase().contains(&needle))
            .collect())
    }

    /// Pages whose title or content contains any whitespace-separated term
    /// of `keyword`, best score first, then most recently updated.
    pub fn search_by_content(
        &self,
        project_id: ProjectId,
        keyword: &str,
    ) -> EngineResult<Vec<SearchHit>> {
        let terms = search::terms(keyword);
        if terms.is_empty() {
            return Err(EngineError::validation("search keyword must not be empty"));
        }
        let mut hits: Vec<SearchHit> = self
            .store
            .find_by_project(project_id)?
            .iter()
            .filter_map(|page| search::score_page(page, &terms, self.config.summary_chars))
            .collect();
        hits.sort_by(|a, b| {
            b.score
                .cmp(&a.score)
                .then(b.updated_at.cmp(&a.updated_at))
                .then(a.page_id.cmp(&b.page_id))
        });
        debug!(project_id, keyword, hits = hits.len(), "content search");
        Ok(hits)
    }

    /// Documents ordered by last update, newest first.
    pub fn recently_updated(&self, project_id: ProjectId, limit: usize) -> EngineResult<Vec<Page>> {
        let mut documents: Vec<Page> = self
            .store
            .find_by_project(project_id)?
            .into_iter()
            .filter(|page| !page.is_directory())
            .collect();
        documents.sort_by(|a, b| b.updated_at.cmp(&a.updated_at).then(b.id.cmp(&a.id)));
        documents.truncate(limit);
        Ok(documents)
    }

    pub fn statistics(&self, project_id: ProjectId) -> EngineResult<ProjectStatistics> {
        let pages = self.store.find_by_project(project_id)?;
        let mut stats = ProjectStatistics { project_id, ..ProjectStatistics::default() };
        let mut contributors: HashSet<EditorId> = HashSet::new();

        for page in &pages {
            stats.total_pages += 1;
            contributors.extend(page.created_by);
            contributors.extend(page.updated_by);
            match page.document() {
                Some(doc) => {
                    stats.document_count += 1;
                    stats.total_content_size += doc.size();
                    stats.total_versions += doc.recent_versions.len() as u64;
                    contributors.extend(doc.recent_versions.iter().filter_map(|e| e.editor_id));
                }
                None => stats.directory_count += 1,
            }
        }

        stats.total_versions += self.store.count_archived_by_project(project_id)?;
        stats.contributor_count = contributors.len();
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::SequentialIds;
    use crate::store::MemoryStore;

    fn service() -> ContentService<MemoryStore, SequentialIds> {
        ContentService::new(MemoryStore::new(), SequentialIds::default(), EngineConfig::default())
    }

    #[test]
    fn failed_operation_rolls_back() {
        let mut svc = service();
        let dir = svc.create_page(NewPage::directory(1, None, "Dir")).unwrap();
        let err = svc.copy_page(dir.id, Some(dir.id), None, None).unwrap_err();
        assert!(matches!(err, EngineError::InvalidMove { .. }));
        assert_eq!(svc.store().page_count(), 1);
    }

    #[test]
    fn unchanged_edit_does_not_touch_page() {
        let mut svc = service();
        let doc = svc.create_page(NewPage::document(1, None, "Doc", "same")).unwrap();
        let outcome = svc.update_content(doc.id, "same", None, Some(4)).unwrap();
        assert!(outcome.entry.is_none());
        assert_eq!(svc.page(doc.id).unwrap(), doc);
    }

    #[test]
    fn editing_a_directory_is_rejected() {
        let mut svc = service();
        let dir = svc.create_page(NewPage::directory(1, None, "Dir")).unwrap();
        assert!(matches!(
            svc.update_content(dir.id, "text", None, None),
            Err(EngineError::Validation(_))
        ));
    }

    #[test]
    fn search_is_case_insensitive() {
        let mut svc = service();
        svc.create_page(NewPage::document(1, None, "Meeting Notes", "")).unwrap();
        svc.create_page(NewPage::document(1, None, "Budget", "")).unwrap();
        svc.create_page(NewPage::document(2, None, "notes elsewhere", "")).unwrap();

        let hits = svc.search_by_title(1, "NOTES").unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].title, "Meeting Notes");
        assert!(svc.search_by_title(1, "  ").is_err());
    }

    #[test]
    fn content_search_ranks_title_hits_first() {
        let mut svc = service();
        let body = svc
            .create_page(NewPage::document(1, None, "Lab log", "we measured the Enzyme rate"))
            .unwrap();
        let titled = svc
            .create_page(NewPage::document(1, None, "Enzyme kinetics", "overview"))
            .unwrap();
        svc.create_page(NewPage::document(1, None, "Budget", "money")).unwrap();
        svc.create_page(NewPage::document(2, None, "Enzyme", "other project")).unwrap();

        let hits = svc.search_by_content(1, "enzyme").unwrap();
        assert_eq!(hits.iter().map(|h| h.page_id).collect::<Vec<_>>(), vec![titled.id, body.id]);
        assert_eq!(hits[0].score, 2);
        assert_eq!(hits[1].score, 1);
        assert_eq!(hits[1].context, "we measured the Enzyme rate");
        assert!(matches!(svc.search_by_content(1, " "), Err(EngineError::Validation(_))));
    }

    #[test]
    fn content_search_uses_configured_context_width() {
        let mut svc = ContentService::new(
            MemoryStore::new(),
            SequentialIds::default(),
            EngineConfig { summary_chars: 4, ..EngineConfig::default() },
        );
        svc.create_page(NewPage::document(1, None, "Doc", "aaaaaNEEDLEbbbbb")).unwrap();
        let hits = svc.search_by_content(1, "needle").unwrap();
        assert_eq!(hits[0].context, "...aaNEEDLEbb...");
    }

    #[test]
    fn statistics_count_pages_versions_and_contributors() {
        let mut svc = ContentService::new(
            MemoryStore::new(),
            SequentialIds::default(),
            EngineConfig { window_capacity: 2, ..EngineConfig::default() },
        );
        let dir = svc.create_page(NewPage::directory(1, None, "Dir").created_by(1)).unwrap();
        let doc = svc.create_page(NewPage::document(1, Some(dir.id), "Doc", "ab").created_by(1)).unwrap();
        for (n, editor) in [(1, 2), (2, 3), (3, 2)] {
            svc.update_content(doc.id, &format!("ab{n}"), None, Some(editor)).unwrap();
        }

        let stats = svc.statistics(1).unwrap();
        assert_eq!(stats.total_pages, 2);
        assert_eq!(stats.document_count, 1);
        assert_eq!(stats.directory_count, 1);
        assert_eq!(stats.total_content_size, 3);
        assert_eq!(stats.total_versions, 3);
        assert_eq!(stats.contributor_count, 3);
    }

    #[test]
    fn recently_updated_orders_newest_first() {
        let mut svc = service();
        let a = svc.create_page(NewPage::document(1, None, "A", "a")).unwrap();
        let b = svc.create_page(NewPage::document(1, None, "B", "b")).unwrap();
        svc.create_page(NewPage::directory(1, None, "Dir")).unwrap();
        std::thread::sleep(std::time::Duration::from_millis(5));
        svc.update_content(a.id, "a2", None, None).unwrap();

        let recent = svc.recently_updated(1, 10).unwrap();
        assert_eq!(recent.iter().map(|p| p.id).collect::<Vec<_>>(), vec![a.id, b.id]);
        assert_eq!(svc.recently_updated(1, 1).unwrap().len(), 1);
    }

    #[test]
    fn delete_project_clears_pages_and_archive() {
        let mut svc = ContentService::new(
            MemoryStore::new(),
            SequentialIds::default(),
            EngineConfig { window_capacity: 1, ..EngineConfig::default() },
        );
        let doc = svc.create_page(NewPage::document(1, None, "Doc", "0")).unwrap();
        let other = svc.create_page(NewPage::document(2, None, "Other", "0")).unwrap();
        for n in 1..=3 {
            svc.update_content(doc.id, &n.to_string(), None, None).unwrap();
        }
        assert_eq!(svc.store().archived_count(), 2);

        assert_eq!(svc.delete_project(1).unwrap(), 1);
        assert_eq!(svc.store().archived_count(), 0);
        assert!(svc.page(other.id).is_ok());
    }
}
