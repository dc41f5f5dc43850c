// `folio log`: list a document's recorded versions.

use clap::Args;
use serde::{Deserialize, Serialize};

use folio_common::types::{PageId, VersionSummary};

use crate::context::GlobalArgs;
use crate::output::{self, OutputFormat};

#[derive(Debug, Args)]
pub struct LogArgs {
    /// Document id.
    pub page: PageId,

    /// Also check that the history chain is complete.
    #[arg(long)]
    verify: bool,

    /// Force JSON output.
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogResult {
    pub page_id: PageId,
    pub path: String,
    pub versions: Vec<VersionSummary>,
}

pub fn run(global: &GlobalArgs, args: LogArgs) -> anyhow::Result<()> {
    let format = OutputFormat::detect(args.json);
    output::emit(format, log(global, &args), format_human)
}

fn log(global: &GlobalArgs, args: &LogArgs) -> anyhow::Result<LogResult> {
    let service = global.open_service()?;
    let page = service.page(args.page)?;
    if args.verify {
        service.verify_history(page.id)?;
    }
    let mut versions = service.history(page.id)?;
    versions.reverse();
    Ok(LogResult { page_id: page.id, path: page.path, versions })
}

fn format_human(result: &LogResult) -> String {
    let mut lines = vec![format!("{} [{}]", result.path, result.page_id)];
    if result.versions.is_empty() {
        lines.push("  (no recorded edits)".into());
    }
    for version in &result.versions {
        let editor = version.editor_id.map_or_else(|| "-".to_string(), |id| id.to_string());
        let archived = if version.archived { " (archived)" } else { "" };
        lines.push(format!(
            "  v{:<4} {}  editor {editor}  +{} -{}  {}{archived}",
            version.version,
            version.created_at.format("%Y-%m-%d %H:%M:%S"),
            version.stats.added_lines,
            version.stats.deleted_lines,
            version.description,
        ));
    }
    lines.join("\n")
}
