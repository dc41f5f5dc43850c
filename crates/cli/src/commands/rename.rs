// `folio rename`: retitle a page and rewrite its subtree's paths.

use clap::Args;

use folio_common::types::PageId;

use super::PageView;
use crate::context::GlobalArgs;
use crate::output::{self, OutputFormat};

#[derive(Debug, Args)]
pub struct RenameArgs {
    /// Page to rename.
    pub page: PageId,

    /// New title.
    pub title: String,

    /// Force JSON output.
    #[arg(long)]
    json: bool,
}

pub fn run(global: &GlobalArgs, args: RenameArgs) -> anyhow::Result<()> {
    let format = OutputFormat::detect(args.json);
    output::emit(format, rename(global, &args), |view| format!("Renamed to {}", view.line()))
}

fn rename(global: &GlobalArgs, args: &RenameArgs) -> anyhow::Result<PageView> {
    let mut service = global.open_service()?;
    let page = service.rename_page(args.page, &args.title, global.editor)?;
    Ok(PageView::from_page(&page, service.config().summary_chars))
}
