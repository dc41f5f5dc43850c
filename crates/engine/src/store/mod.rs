// Persistence boundary for pages and archived versions.
//
// Each page row carries its own version window inline, so a page and the
// window it owns are always written together by `save_page`.

pub mod memory;
pub mod sqlite;

use anyhow::Result;
use folio_common::types::{ArchivedVersion, Page, PageId, ProjectId, VersionNo};

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

pub trait PageStore {
    /// Insert a new page. Fails when the id is already taken.
    fn insert_page(&mut self, page: &Page) -> Result<()>;

    /// Insert or replace a page by id.
    fn save_page(&mut self, page: &Page) -> Result<()>;

    fn find_page(&self, id: PageId) -> Result<Option<Page>>;

    /// Direct children of `parent_id` (`None` for root pages), ordered by
    /// `sort_order` then id.
    fn find_children(&self, project_id: ProjectId, parent_id: Option<PageId>)
        -> Result<Vec<Page>>;

    /// Every page of a project, ordered by path.
    fn find_by_project(&self, project_id: ProjectId) -> Result<Vec<Page>>;

    fn max_sort_order(&self, project_id: ProjectId, parent_id: Option<PageId>)
        -> Result<Option<i64>>;

    /// Highest id held by any page or archived row.
    fn max_assigned_id(&self) -> Result<Option<i64>>;

    /// Returns whether a row was removed.
    fn delete_page(&mut self, id: PageId) -> Result<bool>;

    fn save_archived(&mut self, archived: &ArchivedVersion) -> Result<()>;

    /// All archived versions of a page, oldest first.
    fn find_archived_versions(&self, page_id: PageId) -> Result<Vec<ArchivedVersion>>;

    /// Archived versions in `from..=to`, oldest first.
    fn find_archived_range(
        &self,
        page_id: PageId,
        from: VersionNo,
        to: VersionNo,
    ) -> Result<Vec<ArchivedVersion>> {
        Ok(self
            .find_archived_versions(page_id)?
            .into_iter()
            .filter(|row| (from..=to).contains(&row.entry.version))
            .collect())
    }

    fn delete_archived_versions(&mut self, page_id: PageId) -> Result<usize>;

    fn delete_archived_by_project(&mut self, project_id: ProjectId) -> Result<usize>;

    fn count_archived_by_project(&self, project_id: ProjectId) -> Result<u64>;

    // ── Transactions ──────────────────────────────────────────────

    /// Opens a unit of work. Stores without transactions accept these as
    /// no-ops.
    fn begin(&mut self) -> Result<()> {
        Ok(())
    }

    fn commit(&mut self) -> Result<()> {
        Ok(())
    }

    fn rollback(&mut self) -> Result<()> {
        Ok(())
    }
}
