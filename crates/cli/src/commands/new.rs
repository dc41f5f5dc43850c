// `folio new`: create a document or directory.

use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::Args;

use folio_common::types::{PageId, PageKind, ProjectId};
use folio_engine::NewPage;

use super::PageView;
use crate::context::GlobalArgs;
use crate::output::{self, OutputFormat};

#[derive(Debug, Args)]
pub struct NewArgs {
    /// Page title; becomes the last path segment.
    pub title: String,

    /// Project the page belongs to.
    #[arg(long, short, default_value_t = 1)]
    project: ProjectId,

    /// Parent directory id; omit for a root page.
    #[arg(long)]
    parent: Option<PageId>,

    /// Create a directory instead of a document.
    #[arg(long)]
    dir: bool,

    /// Initial document content.
    #[arg(long, conflicts_with = "file")]
    content: Option<String>,

    /// Read initial document content from a file.
    #[arg(long, value_name = "FILE")]
    file: Option<PathBuf>,

    /// Explicit position among siblings.
    #[arg(long)]
    sort_order: Option<i64>,

    /// Mark the page public.
    #[arg(long)]
    public: bool,

    /// Force JSON output.
    #[arg(long)]
    json: bool,
}

pub fn run(global: &GlobalArgs, args: NewArgs) -> anyhow::Result<()> {
    let format = OutputFormat::detect(args.json);
    output::emit(format, create(global, args), format_human)
}

fn create(global: &GlobalArgs, args: NewArgs) -> anyhow::Result<PageView> {
    let content = match (&args.content, &args.file) {
        (Some(text), _) => Some(text.clone()),
        (None, Some(path)) => Some(
            std::fs::read_to_string(path)
                .with_context(|| format!("failed to read `{}`", path.display()))?,
        ),
        (None, None) => None,
    };
    if args.dir && content.is_some() {
        bail!("directories cannot hold content");
    }

    let kind = if args.dir { PageKind::Directory } else { PageKind::Document };
    let new = NewPage {
        project_id: args.project,
        parent_id: args.parent,
        title: args.title,
        kind,
        content: match kind {
            PageKind::Directory => None,
            PageKind::Document => Some(content.unwrap_or_default()),
        },
        sort_order: args.sort_order,
        is_public: args.public,
        creator: global.editor,
    };

    let mut service = global.open_service()?;
    let page = service.create_page(new)?;
    Ok(PageView::from_page(&page, service.config().summary_chars))
}

fn format_human(view: &PageView) -> String {
    format!("Created {} {}", view.kind, view.line())
}
