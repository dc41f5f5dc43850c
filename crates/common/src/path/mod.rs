// Materialized page paths: `/` followed by ancestor titles joined with `/`.

pub mod normalize;

pub use normalize::{normalize_title, TitleError};

pub const SEPARATOR: char = '/';

/// Path of a page titled `title` under a parent at `parent_path`
/// (`None` for root pages).
pub fn child_path(parent_path: Option<&str>, title: &str) -> String {
    match parent_path {
        Some(parent) => format!("{}{SEPARATOR}{title}", parent.trim_end_matches(SEPARATOR)),
        None => format!("{SEPARATOR}{title}"),
    }
}

/// True when `path` is `ancestor` itself or lies beneath it.
pub fn is_within(path: &str, ancestor: &str) -> bool {
    match path.strip_prefix(ancestor) {
        Some("") => true,
        Some(rest) => rest.starts_with(SEPARATOR),
        None => false,
    }
}

/// Number of segments in the path; root pages have depth 1.
pub fn depth(path: &str) -> usize {
    path.split(SEPARATOR).filter(|segment| !segment.is_empty()).count()
}
