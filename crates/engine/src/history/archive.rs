// Archive of version entries evicted from page windows.

use anyhow::Result;
use chrono::Utc;
use tracing::{debug, info};

use folio_common::types::{ArchivedVersion, PageId, ProjectId, VersionEntry};

use crate::ids::IdSource;
use crate::store::PageStore;

/// Operations over the `archived_versions` side of a store.
pub struct Archive;

impl Archive {
    /// Persist one evicted entry for `page_id`.
    pub fn archive<S, I>(
        store: &mut S,
        ids: &I,
        page_id: PageId,
        project_id: ProjectId,
        entry: VersionEntry,
    ) -> Result<ArchivedVersion>
    where
        S: PageStore + ?Sized,
        I: IdSource + ?Sized,
    {
        let row = ArchivedVersion {
            id: ids.next_id(),
            page_id,
            project_id,
            entry,
            archived_at: Utc::now(),
        };
        store.save_archived(&row)?;
        debug!(page_id, version = row.entry.version, "archived version entry");
        Ok(row)
    }

    /// Remove every archived entry of one page.
    pub fn purge<S: PageStore + ?Sized>(store: &mut S, page_id: PageId) -> Result<usize> {
        let removed = store.delete_archived_versions(page_id)?;
        if removed > 0 {
            debug!(page_id, removed, "purged archived versions");
        }
        Ok(removed)
    }

    pub fn purge_project<S: PageStore + ?Sized>(
        store: &mut S,
        project_id: ProjectId,
    ) -> Result<usize> {
        let removed = store.delete_archived_by_project(project_id)?;
        info!(project_id, removed, "purged project archive");
        Ok(removed)
    }

    /// Archived entries of a page, oldest first.
    pub fn list<S: PageStore + ?Sized>(store: &S, page_id: PageId) -> Result<Vec<ArchivedVersion>> {
        store.find_archived_versions(page_id)
    }

    pub fn count_for_project<S: PageStore + ?Sized>(
        store: &S,
        project_id: ProjectId,
    ) -> Result<u64> {
        store.count_archived_by_project(project_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::SequentialIds;
    use crate::store::MemoryStore;
    use folio_common::types::ChangeStats;

    fn entry(version: u32) -> VersionEntry {
        VersionEntry {
            version,
            patch: String::new(),
            description: "Update content".into(),
            editor_id: None,
            created_at: Utc::now(),
            stats: ChangeStats::zero(),
            content_hash: String::new(),
        }
    }

    #[test]
    fn archive_assigns_ids_and_lists_in_order() {
        let mut store = MemoryStore::new();
        let ids = SequentialIds::starting_at(500);
        Archive::archive(&mut store, &ids, 1, 9, entry(3)).unwrap();
        let first = Archive::archive(&mut store, &ids, 1, 9, entry(2)).unwrap();
        assert_eq!(first.id, 501);

        let listed = Archive::list(&store, 1).unwrap();
        assert_eq!(listed.iter().map(|r| r.entry.version).collect::<Vec<_>>(), vec![2, 3]);
        assert_eq!(Archive::count_for_project(&store, 9).unwrap(), 2);
    }

    #[test]
    fn purge_removes_only_one_page() {
        let mut store = MemoryStore::new();
        let ids = SequentialIds::default();
        Archive::archive(&mut store, &ids, 1, 9, entry(2)).unwrap();
        Archive::archive(&mut store, &ids, 2, 9, entry(2)).unwrap();

        assert_eq!(Archive::purge(&mut store, 1).unwrap(), 1);
        assert!(Archive::list(&store, 1).unwrap().is_empty());
        assert_eq!(Archive::list(&store, 2).unwrap().len(), 1);
        assert_eq!(Archive::purge_project(&mut store, 9).unwrap(), 1);
    }
}
