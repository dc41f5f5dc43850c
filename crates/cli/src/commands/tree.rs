// `folio tree`: show a project's page hierarchy.

use clap::Args;
use serde::{Deserialize, Serialize};

use folio_common::types::{PageKind, ProjectId, TreeNode};

use crate::context::GlobalArgs;
use crate::output::{self, OutputFormat};

#[derive(Debug, Args)]
pub struct TreeArgs {
    /// Project to show.
    #[arg(long, short, default_value_t = 1)]
    project: ProjectId,

    /// Force JSON output.
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeResult {
    pub project_id: ProjectId,
    #[serde(default)]
    pub pages: Vec<TreeNode>,
}

pub fn run(global: &GlobalArgs, args: TreeArgs) -> anyhow::Result<()> {
    let format = OutputFormat::detect(args.json);
    let result = global
        .open_service()
        .and_then(|service| Ok(service.tree(args.project)?))
        .map(|pages| TreeResult { project_id: args.project, pages });
    output::emit(format, result, format_human)
}

fn format_human(result: &TreeResult) -> String {
    let mut lines = vec![format!("project {}", result.project_id)];
    for node in &result.pages {
        render_tree_node(&mut lines, node, 0);
    }
    lines.join("\n")
}

fn render_tree_node(lines: &mut Vec<String>, node: &TreeNode, depth: usize) {
    let indent = "  ".repeat(depth);
    let prefix = if depth == 0 { "" } else { "├─ " };
    let label = match node.kind {
        PageKind::Directory => format!("{}/", node.title),
        PageKind::Document => format!("{} (v{})", node.title, node.current_version),
    };
    lines.push(format!("{indent}{prefix}{label} [{}]", node.id));
    for child in &node.children {
        render_tree_node(lines, child, depth + 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(id: i64, title: &str, kind: PageKind, children: Vec<TreeNode>) -> TreeNode {
        TreeNode {
            id,
            title: title.into(),
            kind,
            path: format!("/{title}"),
            sort_order: id,
            current_version: 2,
            children,
        }
    }

    fn sample_result() -> TreeResult {
        TreeResult {
            project_id: 1,
            pages: vec![node(
                1,
                "Research",
                PageKind::Directory,
                vec![node(2, "Plan", PageKind::Document, vec![])],
            )],
        }
    }

    #[test]
    fn human_format_renders_tree() {
        let output = format_human(&sample_result());
        assert_eq!(output, "project 1\nResearch/ [1]\n  ├─ Plan (v2) [2]");
    }

    #[test]
    fn human_format_empty_tree() {
        let result = TreeResult { project_id: 4, pages: vec![] };
        assert_eq!(format_human(&result), "project 4");
    }

    #[test]
    fn json_format_roundtrips() {
        let mut buf = Vec::new();
        output::write_output(&mut buf, OutputFormat::Json, &sample_result(), format_human).unwrap();
        let parsed: TreeResult = serde_json::from_slice(&buf).unwrap();
        assert_eq!(parsed.pages.len(), 1);
        assert_eq!(parsed.pages[0].children.len(), 1);
    }
}
