// Title canonicalization: NFKC normalization, separator rejection, 255 char max.

use thiserror::Error;
use unicode_normalization::UnicodeNormalization;

/// Maximum allowed title length in characters.
const MAX_TITLE_CHARS: usize = 255;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TitleError {
    #[error("title is empty")]
    Empty,

    #[error("title exceeds maximum length of {MAX_TITLE_CHARS} characters")]
    TooLong,

    #[error("title contains path separator `/`")]
    Separator,

    #[error("title contains null byte")]
    NullByte,

    #[error("title contains control character {0:?}")]
    ControlChar(char),
}

/// Normalize a page title for use as a materialized path segment.
///
/// Rules:
/// - Apply Unicode NFKC normalization
/// - Trim surrounding whitespace
/// - Reject `/` (it separates path segments)
/// - Reject null bytes and other control characters
/// - Reject empty titles
/// - Enforce max 255 character limit (after normalization)
pub fn normalize_title(input: &str) -> Result<String, TitleError> {
    if input.contains('\0') {
        return Err(TitleError::NullByte);
    }

    let normalized: String = input.nfkc().collect();
    let trimmed = normalized.trim();

    if trimmed.is_empty() {
        return Err(TitleError::Empty);
    }
    if trimmed.contains('/') {
        return Err(TitleError::Separator);
    }
    if let Some(control) = trimmed.chars().find(|c| c.is_control()) {
        return Err(TitleError::ControlChar(control));
    }
    if trimmed.chars().count() > MAX_TITLE_CHARS {
        return Err(TitleError::TooLong);
    }

    Ok(trimmed.to_string())
}
