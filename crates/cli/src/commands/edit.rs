// `folio edit`: replace a document's content and record a version.

use std::io::Read;
use std::path::PathBuf;

use anyhow::Context;
use clap::Args;
use serde::{Deserialize, Serialize};

use folio_common::types::{ChangeStats, PageId, VersionNo};

use crate::context::GlobalArgs;
use crate::output::{self, OutputFormat};

#[derive(Debug, Args)]
pub struct EditArgs {
    /// Document id.
    pub page: PageId,

    /// Read the new content from a file instead of stdin.
    #[arg(long, value_name = "FILE")]
    file: Option<PathBuf>,

    /// Change description (defaults to "Update content").
    #[arg(long, short)]
    message: Option<String>,

    /// Force JSON output.
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EditResult {
    pub page_id: PageId,
    pub changed: bool,
    pub version: VersionNo,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stats: Option<ChangeStats>,
}

pub fn run(global: &GlobalArgs, args: EditArgs) -> anyhow::Result<()> {
    let format = OutputFormat::detect(args.json);
    let result = edit(global, args);
    if let Ok(result) = &result {
        if !result.changed {
            output::print_warning(format, "UNCHANGED", "content unchanged; no version recorded");
        }
    }
    output::emit(format, result, format_human)
}

fn edit(global: &GlobalArgs, args: EditArgs) -> anyhow::Result<EditResult> {
    let content = match &args.file {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read `{}`", path.display()))?,
        None => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf).context("failed to read stdin")?;
            buf
        }
    };

    let mut service = global.open_service()?;
    let outcome =
        service.update_content(args.page, &content, args.message.as_deref(), global.editor)?;
    Ok(EditResult {
        page_id: outcome.page.id,
        changed: outcome.entry.is_some(),
        version: outcome.page.current_version(),
        description: outcome.entry.as_ref().map(|e| e.description.clone()),
        stats: outcome.entry.as_ref().map(|e| e.stats),
    })
}

fn format_human(result: &EditResult) -> String {
    match (&result.description, result.stats) {
        (Some(description), Some(stats)) => format!(
            "Page {} now at v{}: {description} (+{} -{} lines)",
            result.page_id, result.version, stats.added_lines, stats.deleted_lines
        ),
        _ => format!("Page {} unchanged at v{}", result.page_id, result.version),
    }
}
