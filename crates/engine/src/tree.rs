// Page tree maintenance: creation, moves, copies and recursive deletion.
//
// Paths are materialized on every page, so any change to a page's title or
// parent rewrites the paths of its whole subtree.

use std::collections::{HashMap, HashSet};

use chrono::Utc;
use tracing::{debug, info};

use folio_common::path::{child_path, normalize_title};
use folio_common::types::{
    DocumentState, EditorId, Page, PageBody, PageId, PageKind, ProjectId, TreeNode,
};

use crate::error::{EngineError, EngineResult};
use crate::history::Archive;
use crate::ids::IdSource;
use crate::store::PageStore;

/// Input for [`PageTree::create`].
#[derive(Debug, Clone)]
pub struct NewPage {
    pub project_id: ProjectId,
    pub parent_id: Option<PageId>,
    pub title: String,
    pub kind: PageKind,
    /// Initial content for documents. Must be `None` for directories.
    pub content: Option<String>,
    /// Explicit position among siblings; appended last when `None`.
    pub sort_order: Option<i64>,
    pub is_public: bool,
    pub creator: Option<EditorId>,
}

impl NewPage {
    pub fn directory(project_id: ProjectId, parent_id: Option<PageId>, title: &str) -> Self {
        Self {
            project_id,
            parent_id,
            title: title.to_owned(),
            kind: PageKind::Directory,
            content: None,
            sort_order: None,
            is_public: false,
            creator: None,
        }
    }

    pub fn document(
        project_id: ProjectId,
        parent_id: Option<PageId>,
        title: &str,
        content: &str,
    ) -> Self {
        Self {
            kind: PageKind::Document,
            content: Some(content.to_owned()),
            ..Self::directory(project_id, parent_id, title)
        }
    }

    pub fn created_by(mut self, editor: EditorId) -> Self {
        self.creator = Some(editor);
        self
    }
}

#[derive(Debug, Clone)]
pub struct PageTree {
    copy_title_prefix: String,
}

impl Default for PageTree {
    fn default() -> Self {
        Self::new("Copy of ")
    }
}

impl PageTree {
    pub fn new(copy_title_prefix: impl Into<String>) -> Self {
        Self { copy_title_prefix: copy_title_prefix.into() }
    }

    pub fn create<S, I>(&self, store: &mut S, ids: &I, new: NewPage) -> EngineResult<Page>
    where
        S: PageStore + ?Sized,
        I: IdSource + ?Sized,
    {
        let title = normalize_title(&new.title)?;
        let parent = match new.parent_id {
            Some(parent_id) => Some(container(store, new.project_id, parent_id)?),
            None => None,
        };

        let body = match (new.kind, new.content) {
            (PageKind::Directory, Some(_)) => {
                return Err(EngineError::validation("directories cannot hold content"));
            }
            (PageKind::Directory, None) => PageBody::Directory,
            (PageKind::Document, content) => {
                PageBody::Document(DocumentState::initial(content.unwrap_or_default()))
            }
        };

        let sort_order = match new.sort_order {
            Some(order) => order,
            None => next_sort_order(store, new.project_id, new.parent_id)?,
        };

        let now = Utc::now();
        let page = Page {
            id: ids.next_id(),
            project_id: new.project_id,
            path: child_path(parent.as_ref().map(|p| p.path.as_str()), &title),
            title,
            parent_id: new.parent_id,
            sort_order,
            body,
            is_public: new.is_public,
            created_by: new.creator,
            updated_by: new.creator,
            created_at: now,
            updated_at: now,
        };
        store.insert_page(&page)?;
        info!(
            page_id = page.id,
            project_id = page.project_id,
            path = %page.path,
            kind = %page.kind(),
            "created page"
        );
        Ok(page)
    }

    /// Re-parents `page_id` under `new_parent` (`None` moves it to the root)
    /// and recomputes the paths of the moved subtree.
    pub fn move_page<S: PageStore + ?Sized>(
        &self,
        store: &mut S,
        page_id: PageId,
        new_parent: Option<PageId>,
        operator: Option<EditorId>,
    ) -> EngineResult<Page> {
        let mut page = load(store, page_id)?;
        let parent_path = match new_parent {
            Some(target) => {
                if target == page_id {
                    return Err(EngineError::InvalidMove {
                        page_id,
                        target,
                        reason: "a page cannot be its own parent",
                    });
                }
                let parent = container(store, page.project_id, target)?;
                if is_ancestor(store, page_id, target)? {
                    return Err(EngineError::InvalidMove {
                        page_id,
                        target,
                        reason: "the target is inside the page being moved",
                    });
                }
                Some(parent.path)
            }
            None => None,
        };

        let old_path = std::mem::take(&mut page.path);
        page.path = child_path(parent_path.as_deref(), &page.title);
        page.parent_id = new_parent;
        touch(&mut page, operator);
        store.save_page(&page)?;
        let rewritten = refresh_descendant_paths(store, &page)?;

        info!(page_id, from = %old_path, to = %page.path, rewritten, "moved page");
        Ok(page)
    }

    pub fn rename<S: PageStore + ?Sized>(
        &self,
        store: &mut S,
        page_id: PageId,
        title: &str,
        operator: Option<EditorId>,
    ) -> EngineResult<Page> {
        let title = normalize_title(title)?;
        let mut page = load(store, page_id)?;
        let parent_path = match page.parent_id {
            Some(parent_id) => Some(load(store, parent_id)?.path),
            None => None,
        };

        page.path = child_path(parent_path.as_deref(), &title);
        page.title = title;
        touch(&mut page, operator);
        store.save_page(&page)?;
        refresh_descendant_paths(store, &page)?;
        Ok(page)
    }

    pub fn set_sort_order<S: PageStore + ?Sized>(
        &self,
        store: &mut S,
        page_id: PageId,
        sort_order: i64,
        operator: Option<EditorId>,
    ) -> EngineResult<Page> {
        let mut page = load(store, page_id)?;
        page.sort_order = sort_order;
        touch(&mut page, operator);
        store.save_page(&page)?;
        Ok(page)
    }

    /// Copies a page, and for directories its whole subtree, under
    /// `target_parent`. Copies start fresh at version 1 with the source's
    /// current content and no history.
    pub fn copy<S, I>(
        &self,
        store: &mut S,
        ids: &I,
        source_id: PageId,
        target_parent: Option<PageId>,
        new_title: Option<&str>,
        operator: Option<EditorId>,
    ) -> EngineResult<Page>
    where
        S: PageStore + ?Sized,
        I: IdSource + ?Sized,
    {
        let source = load(store, source_id)?;
        if let Some(target) = target_parent {
            if target == source_id || is_ancestor(store, source_id, target)? {
                return Err(EngineError::InvalidMove {
                    page_id: source_id,
                    target,
                    reason: "cannot copy a page into its own subtree",
                });
            }
        }

        let title = match new_title {
            Some(title) => title.to_owned(),
            None => format!("{}{}", self.copy_title_prefix, source.title),
        };
        let root = self.create(store, ids, copy_of(&source, target_parent, title, None, operator))?;

        let mut pending = vec![(source.id, root.id)];
        let mut copied = 1usize;
        while let Some((from_id, to_id)) = pending.pop() {
            for child in store.find_children(source.project_id, Some(from_id))? {
                let title = child.title.clone();
                let clone = self.create(
                    store,
                    ids,
                    copy_of(&child, Some(to_id), title, Some(child.sort_order), operator),
                )?;
                pending.push((child.id, clone.id));
                copied += 1;
            }
        }

        info!(source_id, copy_id = root.id, copied, "copied page subtree");
        Ok(root)
    }

    /// Deletes a page and all of its descendants, children before parents,
    /// purging each deleted page's archived versions. Returns the number of
    /// pages removed.
    pub fn delete_recursive<S: PageStore + ?Sized>(
        &self,
        store: &mut S,
        page_id: PageId,
    ) -> EngineResult<usize> {
        let root = load(store, page_id)?;

        // Pre-order collection; deleting in reverse visits children first.
        let mut order = Vec::new();
        let mut stack = vec![root];
        while let Some(page) = stack.pop() {
            stack.extend(store.find_children(page.project_id, Some(page.id))?);
            order.push(page.id);
        }

        for id in order.iter().rev() {
            Archive::purge(store, *id)?;
            store.delete_page(*id)?;
            debug!(page_id = *id, "deleted page");
        }
        info!(page_id, deleted = order.len(), "deleted page subtree");
        Ok(order.len())
    }

    pub fn children<S: PageStore + ?Sized>(
        &self,
        store: &S,
        project_id: ProjectId,
        parent_id: Option<PageId>,
    ) -> EngineResult<Vec<Page>> {
        if let Some(parent_id) = parent_id {
            load(store, parent_id)?;
        }
        Ok(store.find_children(project_id, parent_id)?)
    }

    /// Nested view of a project, siblings ordered by `sort_order` then id.
    pub fn tree<S: PageStore + ?Sized>(
        &self,
        store: &S,
        project_id: ProjectId,
    ) -> EngineResult<Vec<TreeNode>> {
        let pages = store.find_by_project(project_id)?;
        let mut by_parent: HashMap<Option<PageId>, Vec<&Page>> = HashMap::new();
        for page in &pages {
            by_parent.entry(page.parent_id).or_default().push(page);
        }
        for siblings in by_parent.values_mut() {
            siblings.sort_by(|a, b| a.sort_order.cmp(&b.sort_order).then(a.id.cmp(&b.id)));
        }
        Ok(build_nodes(&by_parent, None))
    }
}

fn build_nodes(
    by_parent: &HashMap<Option<PageId>, Vec<&Page>>,
    parent: Option<PageId>,
) -> Vec<TreeNode> {
    by_parent
        .get(&parent)
        .map(|siblings| {
            siblings
                .iter()
                .map(|page| TreeNode {
                    id: page.id,
                    title: page.title.clone(),
                    kind: page.kind(),
                    path: page.path.clone(),
                    sort_order: page.sort_order,
                    current_version: page.current_version(),
                    children: build_nodes(by_parent, Some(page.id)),
                })
                .collect()
        })
        .unwrap_or_default()
}

fn copy_of(
    source: &Page,
    parent_id: Option<PageId>,
    title: String,
    sort_order: Option<i64>,
    operator: Option<EditorId>,
) -> NewPage {
    NewPage {
        project_id: source.project_id,
        parent_id,
        title,
        kind: source.kind(),
        content: source.content().map(str::to_owned),
        sort_order,
        is_public: source.is_public,
        creator: operator,
    }
}

fn load<S: PageStore + ?Sized>(store: &S, page_id: PageId) -> EngineResult<Page> {
    store.find_page(page_id)?.ok_or(EngineError::PageNotFound(page_id))
}

/// Loads `parent_id` and checks it can hold children of `project_id`.
fn container<S: PageStore + ?Sized>(
    store: &S,
    project_id: ProjectId,
    parent_id: PageId,
) -> EngineResult<Page> {
    let parent = load(store, parent_id)?;
    if parent.project_id != project_id {
        return Err(EngineError::validation(format!(
            "parent page {parent_id} belongs to project {}, not {project_id}",
            parent.project_id
        )));
    }
    if !parent.is_directory() {
        return Err(EngineError::validation(format!(
            "parent page {parent_id} is a document; only directories have children"
        )));
    }
    Ok(parent)
}

fn next_sort_order<S: PageStore + ?Sized>(
    store: &S,
    project_id: ProjectId,
    parent_id: Option<PageId>,
) -> EngineResult<i64> {
    Ok(store.max_sort_order(project_id, parent_id)?.unwrap_or(0) + 1)
}

/// True when `ancestor` appears on the parent chain of `page_id`.
fn is_ancestor<S: PageStore + ?Sized>(
    store: &S,
    ancestor: PageId,
    page_id: PageId,
) -> EngineResult<bool> {
    let mut seen = HashSet::new();
    let mut cursor = Some(page_id);
    while let Some(id) = cursor {
        if id == ancestor {
            return Ok(true);
        }
        if !seen.insert(id) {
            return Err(EngineError::validation(format!(
                "page {id} is part of a parent cycle"
            )));
        }
        cursor = load(store, id)?.parent_id;
    }
    Ok(false)
}

fn touch(page: &mut Page, operator: Option<EditorId>) {
    if operator.is_some() {
        page.updated_by = operator;
    }
    page.updated_at = Utc::now();
}

/// Rewrites paths below `root` from its (already saved) path.
fn refresh_descendant_paths<S: PageStore + ?Sized>(
    store: &mut S,
    root: &Page,
) -> EngineResult<usize> {
    let mut rewritten = 0usize;
    let mut pending = vec![(root.id, root.path.clone())];
    while let Some((parent_id, parent_path)) = pending.pop() {
        for mut child in store.find_children(root.project_id, Some(parent_id))? {
            let path = child_path(Some(&parent_path), &child.title);
            if child.path != path {
                child.path = path;
                store.save_page(&child)?;
                rewritten += 1;
            }
            pending.push((child.id, child.path));
        }
    }
    Ok(rewritten)
}
