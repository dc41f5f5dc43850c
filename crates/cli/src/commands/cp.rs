// `folio cp`: copy a page, and a directory's whole subtree.

use clap::Args;

use folio_common::types::PageId;

use super::PageView;
use crate::context::GlobalArgs;
use crate::output::{self, OutputFormat};

#[derive(Debug, Args)]
pub struct CpArgs {
    /// Page to copy.
    pub page: PageId,

    /// Destination directory id; omit to copy to the root.
    #[arg(long)]
    to: Option<PageId>,

    /// Title of the copy (defaults to the configured prefix plus the source title).
    #[arg(long)]
    title: Option<String>,

    /// Force JSON output.
    #[arg(long)]
    json: bool,
}

pub fn run(global: &GlobalArgs, args: CpArgs) -> anyhow::Result<()> {
    let format = OutputFormat::detect(args.json);
    output::emit(format, copy(global, &args), |view| format!("Copied to {}", view.line()))
}

fn copy(global: &GlobalArgs, args: &CpArgs) -> anyhow::Result<PageView> {
    let mut service = global.open_service()?;
    let page = service.copy_page(args.page, args.to, args.title.as_deref(), global.editor)?;
    Ok(PageView::from_page(&page, service.config().summary_chars))
}
