// `folio recent`: documents ordered by last update.

use clap::Args;
use serde::{Deserialize, Serialize};

use folio_common::types::ProjectId;

use super::{render_list, PageView};
use crate::context::GlobalArgs;
use crate::output::{self, OutputFormat};

#[derive(Debug, Args)]
pub struct RecentArgs {
    /// Project to list.
    #[arg(long, short, default_value_t = 1)]
    project: ProjectId,

    /// Maximum number of documents.
    #[arg(long, short = 'n', default_value_t = 10)]
    limit: usize,

    /// Force JSON output.
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecentResult {
    pub pages: Vec<PageView>,
}

pub fn run(global: &GlobalArgs, args: RecentArgs) -> anyhow::Result<()> {
    let format = OutputFormat::detect(args.json);
    output::emit(format, recent(global, &args), |result| {
        render_list(&result.pages, "(no documents)")
    })
}

fn recent(global: &GlobalArgs, args: &RecentArgs) -> anyhow::Result<RecentResult> {
    let service = global.open_service()?;
    let summary_chars = service.config().summary_chars;
    let pages = service
        .recently_updated(args.project, args.limit)?
        .iter()
        .map(|page| PageView::from_page(page, summary_chars))
        .collect();
    Ok(RecentResult { pages })
}
