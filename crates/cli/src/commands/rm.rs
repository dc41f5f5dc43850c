// `folio rm`: delete a page, its subtree and their archived history.

use clap::Args;
use serde::{Deserialize, Serialize};

use folio_common::types::PageId;

use crate::context::GlobalArgs;
use crate::output::{self, OutputFormat};

#[derive(Debug, Args)]
pub struct RmArgs {
    /// Page to delete.
    pub page: PageId,

    /// Force JSON output.
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RmResult {
    pub page_id: PageId,
    pub path: String,
    pub deleted: usize,
}

pub fn run(global: &GlobalArgs, args: RmArgs) -> anyhow::Result<()> {
    let format = OutputFormat::detect(args.json);
    output::emit(format, remove(global, &args), format_human)
}

fn remove(global: &GlobalArgs, args: &RmArgs) -> anyhow::Result<RmResult> {
    let mut service = global.open_service()?;
    let path = service.page(args.page)?.path;
    let deleted = service.delete_page(args.page)?;
    Ok(RmResult { page_id: args.page, path, deleted })
}

fn format_human(result: &RmResult) -> String {
    match result.deleted {
        1 => format!("Deleted {}", result.path),
        n => format!("Deleted {} and {} descendant pages", result.path, n - 1),
    }
}
