// Core domain types shared across all Folio crates.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::window::RecentVersions;

pub type PageId = i64;
pub type ProjectId = i64;
pub type EditorId = i64;
/// Page version number. Every document starts at version 1.
pub type VersionNo = u32;

pub const INITIAL_VERSION: VersionNo = 1;

/// The two node kinds of a page tree.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum PageKind {
    Directory,
    Document,
}

impl PageKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Directory => "directory",
            Self::Document => "document",
        }
    }
}

impl fmt::Display for PageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PageKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "directory" | "dir" => Ok(Self::Directory),
            "document" | "doc" => Ok(Self::Document),
            other => Err(format!("unknown page kind `{other}` (expected directory or document)")),
        }
    }
}

/// Versioned text state carried only by document pages.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DocumentState {
    pub content: String,
    pub current_version: VersionNo,
    pub content_hash: String,
    /// The most recent edits, oldest first. Older edits live in the archive.
    pub recent_versions: RecentVersions,
}

impl DocumentState {
    /// Fresh version-1 state with an empty history window.
    pub fn initial(content: String) -> Self {
        let content_hash = crate::diff::content_hash(Some(&content));
        Self {
            content,
            current_version: INITIAL_VERSION,
            content_hash,
            recent_versions: RecentVersions::default(),
        }
    }

    /// Content length in characters.
    pub fn size(&self) -> usize {
        self.content.chars().count()
    }

    /// Leading `max_chars` characters of the content.
    pub fn summary(&self, max_chars: usize) -> String {
        self.content.chars().take(max_chars).collect()
    }
}

/// What a page holds, by kind.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PageBody {
    Directory,
    Document(DocumentState),
}

impl PageBody {
    pub fn kind(&self) -> PageKind {
        match self {
            Self::Directory => PageKind::Directory,
            Self::Document(_) => PageKind::Document,
        }
    }
}

/// A node in a per-project page tree.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Page {
    pub id: PageId,
    pub project_id: ProjectId,
    pub title: String,
    /// `None` for root pages.
    pub parent_id: Option<PageId>,
    /// Materialized ancestor path, e.g. `/Research/Notes/Week 1`.
    pub path: String,
    pub sort_order: i64,
    pub body: PageBody,
    pub is_public: bool,
    pub created_by: Option<EditorId>,
    pub updated_by: Option<EditorId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Page {
    pub fn kind(&self) -> PageKind {
        self.body.kind()
    }

    pub fn is_directory(&self) -> bool {
        matches!(self.body, PageBody::Directory)
    }

    pub fn document(&self) -> Option<&DocumentState> {
        match &self.body {
            PageBody::Document(doc) => Some(doc),
            PageBody::Directory => None,
        }
    }

    pub fn document_mut(&mut self) -> Option<&mut DocumentState> {
        match &mut self.body {
            PageBody::Document(doc) => Some(doc),
            PageBody::Directory => None,
        }
    }

    pub fn content(&self) -> Option<&str> {
        self.document().map(|doc| doc.content.as_str())
    }

    /// Current version; directories are permanently at version 1.
    pub fn current_version(&self) -> VersionNo {
        self.document().map_or(INITIAL_VERSION, |doc| doc.current_version)
    }
}

/// Line and character change counts for one edit.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChangeStats {
    pub added_lines: u32,
    pub deleted_lines: u32,
    /// `|chars(new) - chars(old)|`; not an edit distance.
    pub changed_chars: u32,
}

impl ChangeStats {
    pub const fn zero() -> Self {
        Self { added_lines: 0, deleted_lines: 0, changed_chars: 0 }
    }
}

/// One recorded change: the forward patch from `version - 1` to `version`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct VersionEntry {
    pub version: VersionNo,
    pub patch: String,
    pub description: String,
    pub editor_id: Option<EditorId>,
    pub created_at: DateTime<Utc>,
    #[serde(flatten)]
    pub stats: ChangeStats,
    /// Hash of the content this version produces.
    pub content_hash: String,
}

/// A version entry evicted from a page's window into the archive.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ArchivedVersion {
    pub id: i64,
    pub page_id: PageId,
    pub project_id: ProjectId,
    #[serde(flatten)]
    pub entry: VersionEntry,
    pub archived_at: DateTime<Utc>,
}

/// History listing row; never carries patch text or full content.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct VersionSummary {
    pub version: VersionNo,
    pub description: String,
    pub editor_id: Option<EditorId>,
    pub created_at: DateTime<Utc>,
    #[serde(flatten)]
    pub stats: ChangeStats,
    pub content_hash: String,
    pub archived: bool,
}

impl VersionSummary {
    pub fn from_entry(entry: &VersionEntry, archived: bool) -> Self {
        Self {
            version: entry.version,
            description: entry.description.clone(),
            editor_id: entry.editor_id,
            created_at: entry.created_at,
            stats: entry.stats,
            content_hash: entry.content_hash.clone(),
            archived,
        }
    }
}

/// Nested view of a project's page tree.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TreeNode {
    pub id: PageId,
    pub title: String,
    pub kind: PageKind,
    pub path: String,
    pub sort_order: i64,
    pub current_version: VersionNo,
    #[serde(default)]
    pub children: Vec<TreeNode>,
}

/// Aggregate numbers for one project's wiki.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProjectStatistics {
    pub project_id: ProjectId,
    pub total_pages: usize,
    pub document_count: usize,
    pub directory_count: usize,
    pub total_content_size: usize,
    pub contributor_count: usize,
    /// Window versions across all documents plus archived rows.
    pub total_versions: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_kind_parses_aliases() {
        assert_eq!("dir".parse::<PageKind>().unwrap(), PageKind::Directory);
        assert_eq!("Document".parse::<PageKind>().unwrap(), PageKind::Document);
        assert!("folder".parse::<PageKind>().is_err());
    }

    #[test]
    fn initial_document_state_is_version_one() {
        let doc = DocumentState::initial("hello".into());
        assert_eq!(doc.current_version, INITIAL_VERSION);
        assert!(doc.recent_versions.is_empty());
        assert_eq!(doc.content_hash, crate::diff::content_hash(Some("hello")));
    }

    #[test]
    fn summary_and_size_count_characters() {
        let doc = DocumentState::initial("héllo wörld".into());
        assert_eq!(doc.size(), 11);
        assert_eq!(doc.summary(5), "héllo");
    }

    #[test]
    fn version_entry_serializes_stats_flat() {
        let entry = VersionEntry {
            version: 2,
            patch: "@@ -0,0 +1,1 @@\n+a".into(),
            description: "Update content".into(),
            editor_id: Some(7),
            created_at: Utc::now(),
            stats: ChangeStats { added_lines: 1, deleted_lines: 0, changed_chars: 1 },
            content_hash: "abc".into(),
        };
        let value = serde_json::to_value(&entry).unwrap();
        assert_eq!(value["added_lines"], 1);
        assert_eq!(value["version"], 2);
        let parsed: VersionEntry = serde_json::from_value(value).unwrap();
        assert_eq!(parsed, entry);
    }
}
