// Keyword search over page titles and content.
//
// A keyword is split on whitespace into terms; matching ignores case. Each
// term found in a title scores 2 and each term found in content scores 1,
// capped at `MAX_SCORE`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use folio_common::types::{EditorId, Page, PageId, PageKind};

pub const TITLE_WEIGHT: u32 = 2;
pub const CONTENT_WEIGHT: u32 = 1;
pub const MAX_SCORE: u32 = 10;

const ELLIPSIS: &str = "...";

/// One page matched by a content search.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SearchHit {
    pub page_id: PageId,
    pub title: String,
    pub path: String,
    pub kind: PageKind,
    pub score: u32,
    /// Content around the first match, or the content's opening when only
    /// the title matched.
    pub context: String,
    pub updated_by: Option<EditorId>,
    pub updated_at: DateTime<Utc>,
}

/// Case-folded search terms of `keyword`.
pub fn terms(keyword: &str) -> Vec<Vec<char>> {
    keyword.split_whitespace().map(|term| term.chars().map(fold).collect()).collect()
}

/// Scores `page` against `terms`; `None` when nothing matched.
pub fn score_page(page: &Page, terms: &[Vec<char>], context_chars: usize) -> Option<SearchHit> {
    let title: Vec<char> = page.title.chars().collect();
    let content: Vec<char> = page.content().unwrap_or_default().chars().collect();

    let score = terms
        .iter()
        .map(|term| {
            let mut points = 0;
            if find(&title, term).is_some() {
                points += TITLE_WEIGHT;
            }
            if find(&content, term).is_some() {
                points += CONTENT_WEIGHT;
            }
            points
        })
        .sum::<u32>()
        .min(MAX_SCORE);
    if score == 0 {
        return None;
    }

    Some(SearchHit {
        page_id: page.id,
        title: page.title.clone(),
        path: page.path.clone(),
        kind: page.kind(),
        score,
        context: match_context(&content, terms, context_chars),
        updated_by: page.updated_by,
        updated_at: page.updated_at,
    })
}

/// Up to `max_chars / 2` characters either side of the earliest match of any
/// term, with `...` marking cut ends. Without a match, the first `max_chars`
/// characters.
pub fn match_context(content: &[char], terms: &[Vec<char>], max_chars: usize) -> String {
    if content.is_empty() {
        return String::new();
    }

    let first_match = terms
        .iter()
        .filter_map(|term| find(content, term).map(|start| (start, start + term.len())))
        .min();

    let Some((start, end)) = first_match else {
        let mut opening: String = content.iter().take(max_chars).collect();
        if content.len() > max_chars {
            opening.push_str(ELLIPSIS);
        }
        return opening;
    };

    let half = max_chars / 2;
    let from = start.saturating_sub(half);
    let to = (end + half).min(content.len());

    let mut snippet = String::new();
    if from > 0 {
        snippet.push_str(ELLIPSIS);
    }
    snippet.extend(&content[from..to]);
    if to < content.len() {
        snippet.push_str(ELLIPSIS);
    }
    snippet
}

/// Position of the first case-insensitive occurrence of `term`.
fn find(haystack: &[char], term: &[char]) -> Option<usize> {
    if term.is_empty() || term.len() > haystack.len() {
        return None;
    }
    haystack
        .windows(term.len())
        .position(|window| window.iter().zip(term).all(|(c, t)| fold(*c) == *t))
}

/// Single-character lowercase, keeping positions aligned with the source.
fn fold(c: char) -> char {
    let mut lower = c.to_lowercase();
    match (lower.next(), lower.next()) {
        (Some(single), None) => single,
        _ => c,
    }
}
