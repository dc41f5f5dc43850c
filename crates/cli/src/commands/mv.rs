// `folio mv`: move a page under another directory or to the root.

use clap::Args;

use folio_common::types::PageId;

use super::PageView;
use crate::context::GlobalArgs;
use crate::output::{self, OutputFormat};

#[derive(Debug, Args)]
pub struct MvArgs {
    /// Page to move.
    pub page: PageId,

    /// New parent directory id; omit to move to the root.
    #[arg(long)]
    to: Option<PageId>,

    /// Force JSON output.
    #[arg(long)]
    json: bool,
}

pub fn run(global: &GlobalArgs, args: MvArgs) -> anyhow::Result<()> {
    let format = OutputFormat::detect(args.json);
    output::emit(format, move_page(global, &args), |view| format!("Moved {}", view.line()))
}

fn move_page(global: &GlobalArgs, args: &MvArgs) -> anyhow::Result<PageView> {
    let mut service = global.open_service()?;
    let page = service.move_page(args.page, args.to, global.editor)?;
    Ok(PageView::from_page(&page, service.config().summary_chars))
}
