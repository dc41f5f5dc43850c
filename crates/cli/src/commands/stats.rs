// `folio stats`: aggregate numbers for one project.

use clap::Args;

use folio_common::types::{ProjectId, ProjectStatistics};

use crate::context::GlobalArgs;
use crate::output::{self, OutputFormat};

#[derive(Debug, Args)]
pub struct StatsArgs {
    /// Project to summarize.
    #[arg(long, short, default_value_t = 1)]
    project: ProjectId,

    /// Force JSON output.
    #[arg(long)]
    json: bool,
}

pub fn run(global: &GlobalArgs, args: StatsArgs) -> anyhow::Result<()> {
    let format = OutputFormat::detect(args.json);
    let result = global.open_service().and_then(|service| Ok(service.statistics(args.project)?));
    output::emit(format, result, format_human)
}

fn format_human(stats: &ProjectStatistics) -> String {
    [
        format!("project       {}", stats.project_id),
        format!("pages         {}", stats.total_pages),
        format!("  documents   {}", stats.document_count),
        format!("  directories {}", stats.directory_count),
        format!("content size  {} chars", stats.total_content_size),
        format!("contributors  {}", stats.contributor_count),
        format!("versions      {}", stats.total_versions),
    ]
    .join("\n")
}
