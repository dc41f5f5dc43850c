//! Line-level diff algebra for page content.
//!
//! Content is split on `\n` with trailing empty lines preserved (`"a\n"` is two
//! lines, `"a"` and `""`), and the empty string has no lines at all. Patches
//! are forward-only: [`reverse_patch`] walks history backwards by applying the
//! inverted patch, so no reverse patches are ever stored.

pub mod hash;
mod myers;
pub mod patch;

pub use hash::{content_hash, sha256_hex, verify_hash, ContentHash};
pub use patch::{Hunk, HunkLine, Patch, PatchError, CONTEXT_LINES};

use crate::types::ChangeStats;
use myers::line_edits;

/// Treats missing content as the empty document.
pub fn normalize(content: Option<&str>) -> &str {
    content.unwrap_or_default()
}

pub fn split_lines(content: &str) -> Vec<&str> {
    if content.is_empty() {
        return Vec::new();
    }
    content.split('\n').collect()
}

pub fn join_lines<S: AsRef<str>>(lines: &[S]) -> String {
    let mut out = String::new();
    for (idx, line) in lines.iter().enumerate() {
        if idx > 0 {
            out.push('\n');
        }
        out.push_str(line.as_ref());
    }
    out
}

/// Computes the forward patch from `old` to `new`.
///
/// Identical inputs short-circuit to [`Patch::empty`] without running the
/// diff search.
pub fn diff(old: &str, new: &str) -> Patch {
    if old == new {
        return Patch::empty();
    }
    let old_lines = split_lines(old);
    let new_lines = split_lines(new);
    Patch::from_edits(&line_edits(&old_lines, &new_lines), CONTEXT_LINES)
}

/// Unified diff text from `old` to `new`; `""` when they match.
pub fn unified_diff(old: &str, new: &str) -> String {
    diff(old, new).to_unified()
}

/// Applies unified diff text to `base`.
///
/// Fails when `base` has drifted from the text the patch was computed against.
pub fn apply_patch(base: &str, patch: &str) -> Result<String, PatchError> {
    let parsed = Patch::parse(patch)?;
    if parsed.is_empty() {
        return Ok(base.to_owned());
    }
    let lines = parsed.apply_lines(&split_lines(base))?;
    Ok(join_lines(&lines))
}

/// Rebuilds the text a patch was computed *from*, given the text it produced.
pub fn reverse_patch(after: &str, patch: &str) -> Result<String, PatchError> {
    let parsed = Patch::parse(patch)?;
    if parsed.is_empty() {
        return Ok(after.to_owned());
    }
    let lines = parsed.inverted().apply_lines(&split_lines(after))?;
    Ok(join_lines(&lines))
}

/// Line and character change counts between two texts.
///
/// `changed_chars` is the absolute difference in character counts, which
/// undercounts same-length replacements. Stored history depends on it.
pub fn stats(old: &str, new: &str) -> ChangeStats {
    if old == new {
        return ChangeStats::zero();
    }
    stats_for_patch(&diff(old, new), old, new)
}

/// Same as [`stats`] for a patch already computed from `old` to `new`.
pub fn stats_for_patch(patch: &Patch, old: &str, new: &str) -> ChangeStats {
    let (added_lines, deleted_lines) = patch.line_counts();
    let old_chars = old.chars().count() as i64;
    let new_chars = new.chars().count() as i64;

    ChangeStats {
        added_lines,
        deleted_lines,
        changed_chars: u32::try_from((new_chars - old_chars).unsigned_abs()).unwrap_or(u32::MAX),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_preserves_trailing_empty_lines() {
        assert_eq!(split_lines("a\n"), vec!["a", ""]);
        assert_eq!(split_lines("a\n\n"), vec!["a", "", ""]);
        assert_eq!(split_lines("\n"), vec!["", ""]);
        assert!(split_lines("").is_empty());
    }

    #[test]
    fn join_inverts_split() {
        for text in ["", "a", "a\n", "\n\n", "a\r\nb", "x\ny\nz"] {
            assert_eq!(join_lines(&split_lines(text)), text);
        }
    }

    #[test]
    fn identical_content_yields_empty_patch() {
        assert!(diff("same\ntext", "same\ntext").is_empty());
        assert_eq!(unified_diff("", ""), "");
    }

    #[test]
    fn trailing_newline_is_a_real_change() {
        let patch = unified_diff("a", "a\n");
        assert!(!patch.is_empty());
        assert_eq!(apply_patch("a", &patch).unwrap(), "a\n");
        assert_eq!(reverse_patch("a\n", &patch).unwrap(), "a");
    }

    #[test]
    fn apply_and_reverse_scenario_chain() {
        let v1 = "line1";
        let v2 = "line1\nline2";
        let v3 = "line2";

        let p2 = unified_diff(v1, v2);
        let p3 = unified_diff(v2, v3);

        assert_eq!(apply_patch(v1, &p2).unwrap(), v2);
        assert_eq!(apply_patch(v2, &p3).unwrap(), v3);
        assert_eq!(reverse_patch(v3, &p3).unwrap(), v2);
        assert_eq!(reverse_patch(v2, &p2).unwrap(), v1);
    }

    #[test]
    fn apply_to_wrong_base_fails() {
        let patch = unified_diff("alpha\nbeta", "alpha\ngamma");
        let err = apply_patch("alpha\ndelta", &patch).unwrap_err();
        assert!(matches!(err, PatchError::ContextMismatch { .. }));
    }

    #[test]
    fn empty_patch_text_is_identity() {
        assert_eq!(apply_patch("keep", "").unwrap(), "keep");
        assert_eq!(reverse_patch("keep", "").unwrap(), "keep");
    }

    #[test]
    fn stats_counts_lines_and_char_delta() {
        let stats = stats("a\nb\nc", "a\nB\nc\nd");
        assert_eq!(stats.added_lines, 2);
        assert_eq!(stats.deleted_lines, 1);
        assert_eq!(stats.changed_chars, 2);
    }

    #[test]
    fn stats_char_delta_undercounts_same_length_replacement() {
        let stats = stats("cat", "dog");
        assert_eq!(stats.added_lines, 1);
        assert_eq!(stats.deleted_lines, 1);
        assert_eq!(stats.changed_chars, 0);
    }

    #[test]
    fn stats_for_identical_content_is_zero() {
        assert_eq!(stats("x", "x"), ChangeStats::zero());
    }
}
