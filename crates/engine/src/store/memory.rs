// In-process page store. Transactions are snapshots taken on `begin`.

use std::collections::BTreeMap;

use anyhow::{bail, Result};

use folio_common::types::{ArchivedVersion, Page, PageId, ProjectId, VersionNo};

use super::PageStore;

#[derive(Debug, Clone, Default)]
struct Tables {
    pages: BTreeMap<PageId, Page>,
    archived: BTreeMap<(PageId, VersionNo), ArchivedVersion>,
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: Tables,
    snapshot: Option<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page_count(&self) -> usize {
        self.tables.pages.len()
    }

    pub fn archived_count(&self) -> usize {
        self.tables.archived.len()
    }
}

fn by_sort_order(pages: &mut [Page]) {
    pages.sort_by(|a, b| a.sort_order.cmp(&b.sort_order).then(a.id.cmp(&b.id)));
}

impl PageStore for MemoryStore {
    fn insert_page(&mut self, page: &Page) -> Result<()> {
        if self.tables.pages.contains_key(&page.id) {
            bail!("page id {} is already taken", page.id);
        }
        self.tables.pages.insert(page.id, page.clone());
        Ok(())
    }

    fn save_page(&mut self, page: &Page) -> Result<()> {
        self.tables.pages.insert(page.id, page.clone());
        Ok(())
    }

    fn find_page(&self, id: PageId) -> Result<Option<Page>> {
        Ok(self.tables.pages.get(&id).cloned())
    }

    fn find_children(
        &self,
        project_id: ProjectId,
        parent_id: Option<PageId>,
    ) -> Result<Vec<Page>> {
        let mut children: Vec<Page> = self
            .tables
            .pages
            .values()
            .filter(|page| page.project_id == project_id && page.parent_id == parent_id)
            .cloned()
            .collect();
        by_sort_order(&mut children);
        Ok(children)
    }

    fn find_by_project(&self, project_id: ProjectId) -> Result<Vec<Page>> {
        let mut pages: Vec<Page> = self
            .tables
            .pages
            .values()
            .filter(|page| page.project_id == project_id)
            .cloned()
            .collect();
        pages.sort_by(|a, b| a.path.cmp(&b.path).then(a.id.cmp(&b.id)));
        Ok(pages)
    }

    fn max_sort_order(
        &self,
        project_id: ProjectId,
        parent_id: Option<PageId>,
    ) -> Result<Option<i64>> {
        Ok(self
            .tables
            .pages
            .values()
            .filter(|page| page.project_id == project_id && page.parent_id == parent_id)
            .map(|page| page.sort_order)
            .max())
    }

    fn max_assigned_id(&self) -> Result<Option<i64>> {
        let page_max = self.tables.pages.keys().max().copied();
        let archived_max = self.tables.archived.values().map(|row| row.id).max();
        Ok(page_max.max(archived_max))
    }

    fn delete_page(&mut self, id: PageId) -> Result<bool> {
        Ok(self.tables.pages.remove(&id).is_some())
    }

    fn save_archived(&mut self, archived: &ArchivedVersion) -> Result<()> {
        let key = (archived.page_id, archived.entry.version);
        if self.tables.archived.contains_key(&key) {
            bail!(
                "version {} of page {} is already archived",
                archived.entry.version,
                archived.page_id
            );
        }
        self.tables.archived.insert(key, archived.clone());
        Ok(())
    }

    fn find_archived_versions(&self, page_id: PageId) -> Result<Vec<ArchivedVersion>> {
        Ok(self
            .tables
            .archived
            .range((page_id, VersionNo::MIN)..=(page_id, VersionNo::MAX))
            .map(|(_, row)| row.clone())
            .collect())
    }

    fn find_archived_range(
        &self,
        page_id: PageId,
        from: VersionNo,
        to: VersionNo,
    ) -> Result<Vec<ArchivedVersion>> {
        if from > to {
            return Ok(Vec::new());
        }
        Ok(self
            .tables
            .archived
            .range((page_id, from)..=(page_id, to))
            .map(|(_, row)| row.clone())
            .collect())
    }

    fn delete_archived_versions(&mut self, page_id: PageId) -> Result<usize> {
        let before = self.tables.archived.len();
        self.tables.archived.retain(|(owner, _), _| *owner != page_id);
        Ok(before - self.tables.archived.len())
    }

    fn delete_archived_by_project(&mut self, project_id: ProjectId) -> Result<usize> {
        let before = self.tables.archived.len();
        self.tables.archived.retain(|_, row| row.project_id != project_id);
        Ok(before - self.tables.archived.len())
    }

    fn count_archived_by_project(&self, project_id: ProjectId) -> Result<u64> {
        Ok(self.tables.archived.values().filter(|row| row.project_id == project_id).count() as u64)
    }

    fn begin(&mut self) -> Result<()> {
        if self.snapshot.is_some() {
            bail!("a transaction is already open on the memory store");
        }
        self.snapshot = Some(self.tables.clone());
        Ok(())
    }

    fn commit(&mut self) -> Result<()> {
        self.snapshot = None;
        Ok(())
    }

    fn rollback(&mut self) -> Result<()> {
        if let Some(snapshot) = self.snapshot.take() {
            self.tables = snapshot;
        }
        Ok(())
    }
}
