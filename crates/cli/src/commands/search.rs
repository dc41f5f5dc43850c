// `folio search`: find pages by title, or by title and content with `--content`.

use clap::Args;
use serde::{Deserialize, Serialize};

use folio_common::types::{PageKind, ProjectId};
use folio_engine::SearchHit;

use super::{render_list, PageView};
use crate::context::GlobalArgs;
use crate::output::{self, OutputFormat};

#[derive(Debug, Args)]
pub struct SearchArgs {
    /// Case-insensitive keyword; with `--content`, whitespace separates terms.
    pub keyword: String,

    /// Project to search.
    #[arg(long, short, default_value_t = 1)]
    project: ProjectId,

    /// Also match page content, ranking hits and showing match context.
    #[arg(long)]
    content: bool,

    /// Force JSON output.
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    pub keyword: String,
    pub pages: Vec<PageView>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentSearchResult {
    pub keyword: String,
    pub hits: Vec<SearchHit>,
}

pub fn run(global: &GlobalArgs, args: SearchArgs) -> anyhow::Result<()> {
    let format = OutputFormat::detect(args.json);
    if args.content {
        return output::emit(format, search_content(global, args), format_hits);
    }
    output::emit(format, search(global, args), |result| render_list(&result.pages, "(no matches)"))
}

fn search(global: &GlobalArgs, args: SearchArgs) -> anyhow::Result<SearchResult> {
    let service = global.open_service()?;
    let summary_chars = service.config().summary_chars;
    let pages = service
        .search_by_title(args.project, &args.keyword)?
        .iter()
        .map(|page| PageView::from_page(page, summary_chars))
        .collect();
    Ok(SearchResult { keyword: args.keyword, pages })
}

fn search_content(global: &GlobalArgs, args: SearchArgs) -> anyhow::Result<ContentSearchResult> {
    let service = global.open_service()?;
    let hits = service.search_by_content(args.project, &args.keyword)?;
    Ok(ContentSearchResult { keyword: args.keyword, hits })
}

fn format_hits(result: &ContentSearchResult) -> String {
    if result.hits.is_empty() {
        return "(no matches)".to_owned();
    }
    result
        .hits
        .iter()
        .map(|hit| {
            let path = match hit.kind {
                PageKind::Directory => format!("{}/", hit.path),
                PageKind::Document => hit.path.clone(),
            };
            let header = format!("[{}] {path} (score {})", hit.page_id, hit.score);
            if hit.context.is_empty() {
                header
            } else {
                format!("{header}\n    {}", hit.context.replace('\n', " "))
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}
