// CLI subcommand dispatch.

use chrono::{DateTime, Utc};
use clap::Subcommand;
use serde::{Deserialize, Serialize};

use folio_common::types::{Page, PageId, PageKind, ProjectId, VersionNo};

use crate::context::GlobalArgs;

pub mod cp;
pub mod diff;
pub mod edit;
pub mod log;
pub mod mv;
pub mod new;
pub mod recent;
pub mod rename;
pub mod rm;
pub mod search;
pub mod show;
pub mod stats;
pub mod tree;

#[derive(Subcommand)]
pub enum Command {
    /// Create a document or directory
    New(new::NewArgs),
    /// Replace a document's content, recording a version
    Edit(edit::EditArgs),
    /// Print a page's current or historical content
    Show(show::ShowArgs),
    /// List a document's recorded versions
    Log(log::LogArgs),
    /// Diff two versions of a document
    Diff(diff::DiffArgs),
    /// Move a page under another directory
    Mv(mv::MvArgs),
    /// Copy a page and its subtree
    Cp(cp::CpArgs),
    /// Delete a page and its subtree
    Rm(rm::RmArgs),
    /// Retitle a page
    Rename(rename::RenameArgs),
    /// Show a project's page tree
    Tree(tree::TreeArgs),
    /// Project statistics
    Stats(stats::StatsArgs),
    /// Find pages by title
    Search(search::SearchArgs),
    /// Recently updated documents
    Recent(recent::RecentArgs),
}

pub fn run(global: &GlobalArgs, cmd: Command) -> anyhow::Result<()> {
    match cmd {
        Command::New(args) => new::run(global, args),
        Command::Edit(args) => edit::run(global, args),
        Command::Show(args) => show::run(global, args),
        Command::Log(args) => log::run(global, args),
        Command::Diff(args) => diff::run(global, args),
        Command::Mv(args) => mv::run(global, args),
        Command::Cp(args) => cp::run(global, args),
        Command::Rm(args) => rm::run(global, args),
        Command::Rename(args) => rename::run(global, args),
        Command::Tree(args) => tree::run(global, args),
        Command::Stats(args) => stats::run(global, args),
        Command::Search(args) => search::run(global, args),
        Command::Recent(args) => recent::run(global, args),
    }
}

/// Page listing row shared by several commands; never carries full content.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageView {
    pub id: PageId,
    pub project_id: ProjectId,
    pub title: String,
    pub kind: PageKind,
    pub path: String,
    pub parent_id: Option<PageId>,
    pub sort_order: i64,
    pub current_version: VersionNo,
    pub is_public: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_size: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl PageView {
    pub fn from_page(page: &Page, summary_chars: usize) -> Self {
        Self {
            id: page.id,
            project_id: page.project_id,
            title: page.title.clone(),
            kind: page.kind(),
            path: page.path.clone(),
            parent_id: page.parent_id,
            sort_order: page.sort_order,
            current_version: page.current_version(),
            is_public: page.is_public,
            content_size: page.document().map(|doc| doc.size()),
            summary: page.document().map(|doc| doc.summary(summary_chars)),
            updated_at: page.updated_at,
        }
    }

    /// One-line rendering: `[id] path (kind, vN)`.
    pub fn line(&self) -> String {
        match self.kind {
            PageKind::Directory => format!("[{}] {}/", self.id, self.path),
            PageKind::Document => {
                format!("[{}] {} (v{})", self.id, self.path, self.current_version)
            }
        }
    }
}

pub fn render_list(pages: &[PageView], empty: &str) -> String {
    if pages.is_empty() {
        return empty.to_owned();
    }
    pages.iter().map(PageView::line).collect::<Vec<_>>().join("\n")
}
