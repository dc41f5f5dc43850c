// `folio diff`: unified diff between two versions of a document.

use clap::Args;
use serde::{Deserialize, Serialize};

use folio_common::types::{PageId, VersionNo};

use crate::context::GlobalArgs;
use crate::output::{self, OutputFormat};

#[derive(Debug, Args)]
pub struct DiffArgs {
    /// Document id.
    pub page: PageId,

    /// Older version.
    pub from: VersionNo,

    /// Newer version.
    pub to: VersionNo,

    /// Force JSON output.
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiffResult {
    pub page_id: PageId,
    pub from: VersionNo,
    pub to: VersionNo,
    pub patch: String,
}

pub fn run(global: &GlobalArgs, args: DiffArgs) -> anyhow::Result<()> {
    let format = OutputFormat::detect(args.json);
    output::emit(format, diff(global, &args), format_human)
}

fn diff(global: &GlobalArgs, args: &DiffArgs) -> anyhow::Result<DiffResult> {
    let service = global.open_service()?;
    let patch = service.compare_versions(args.page, args.from, args.to)?;
    Ok(DiffResult { page_id: args.page, from: args.from, to: args.to, patch })
}

fn format_human(result: &DiffResult) -> String {
    if result.patch.is_empty() {
        format!("v{} and v{} are identical", result.from, result.to)
    } else {
        result.patch.clone()
    }
}
