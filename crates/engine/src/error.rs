// Engine error taxonomy.
//
// Store failures arrive as `anyhow::Error` with their context chain intact and
// are carried through `EngineError::Store` unchanged.

use folio_common::diff::PatchError;
use folio_common::path::TitleError;
use folio_common::types::{PageId, VersionNo};
use thiserror::Error;

pub type EngineResult<T> = Result<T, EngineError>;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("page {0} not found")]
    PageNotFound(PageId),

    #[error("version {version} of page {page_id} is unavailable: {reason}")]
    VersionNotFound { page_id: PageId, version: VersionNo, reason: String },

    #[error("cannot move page {page_id} under page {target}: {reason}")]
    InvalidMove { page_id: PageId, target: PageId, reason: &'static str },

    #[error(
        "history of page {page_id} is corrupt at version {version}: \
         expected hash {expected}, rebuilt content hashes to {actual}"
    )]
    Integrity { page_id: PageId, version: VersionNo, expected: String, actual: String },

    #[error("patch for version {version} of page {page_id} does not apply: {source}")]
    PatchApplication {
        page_id: PageId,
        version: VersionNo,
        #[source]
        source: PatchError,
    },

    #[error("invalid title: {0}")]
    InvalidTitle(#[from] TitleError),

    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

impl EngineError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Stable machine-readable code used by JSON output.
    pub fn code(&self) -> &'static str {
        match self {
            Self::PageNotFound(_) => "PAGE_NOT_FOUND",
            Self::VersionNotFound { .. } => "VERSION_NOT_FOUND",
            Self::InvalidMove { .. } => "INVALID_MOVE",
            Self::Integrity { .. } => "INTEGRITY",
            Self::PatchApplication { .. } => "PATCH_APPLICATION",
            Self::InvalidTitle(_) | Self::Validation(_) => "VALIDATION",
            Self::Store(_) => "STORE",
        }
    }
}
