// `folio show`: print current or historical page content.

use clap::Args;
use serde::{Deserialize, Serialize};

use folio_common::types::{PageId, VersionNo};

use crate::context::GlobalArgs;
use crate::output::{self, OutputFormat};

#[derive(Debug, Args)]
pub struct ShowArgs {
    /// Document id.
    pub page: PageId,

    /// Version to rebuild; defaults to the current one.
    #[arg(long, short)]
    version: Option<VersionNo>,

    /// Force JSON output.
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShowResult {
    pub page_id: PageId,
    pub path: String,
    pub version: VersionNo,
    pub current_version: VersionNo,
    pub content: String,
}

pub fn run(global: &GlobalArgs, args: ShowArgs) -> anyhow::Result<()> {
    let format = OutputFormat::detect(args.json);
    output::emit(format, show(global, &args), |result| result.content.clone())
}

fn show(global: &GlobalArgs, args: &ShowArgs) -> anyhow::Result<ShowResult> {
    let service = global.open_service()?;
    let page = service.page(args.page)?;
    let current_version = page.current_version();
    let version = args.version.unwrap_or(current_version);
    let content = service.version_content(page.id, version)?;
    Ok(ShowResult { page_id: page.id, path: page.path, version, current_version, content })
}
