// Unified diff patches: construction from an edit script, text format, parsing,
// application and inversion.
//
// Text format (stable within a deployment, stored verbatim in history rows):
//
//   --- original
//   +++ modified
//   @@ -<old_start>,<old_len> +<new_start>,<new_len> @@
//    context line
//   -deleted line
//   +inserted line
//
// Starts are 1-based; a zero-length range names the line *before* the hunk
// (0 when the hunk sits at the very top). Lines are joined with `\n` and the
// patch has no trailing newline.

use std::fmt;

use thiserror::Error;

use super::myers::Edit;

/// Number of unchanged lines kept around each change.
pub const CONTEXT_LINES: usize = 3;

pub const OLD_LABEL: &str = "original";
pub const NEW_LABEL: &str = "modified";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PatchError {
    #[error("malformed patch at line {line}: {reason}")]
    Malformed { line: usize, reason: String },

    #[error(
        "hunk {hunk} does not match base text at line {line}: expected {expected:?}, found {found:?}"
    )]
    ContextMismatch { hunk: usize, line: usize, expected: String, found: Option<String> },

    #[error("hunk {hunk} overlaps the previous hunk")]
    OverlappingHunks { hunk: usize },

    #[error("hunk {hunk} should start at result line {expected} but lands at {actual}")]
    Misaligned { hunk: usize, expected: usize, actual: usize },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HunkLine {
    Context(String),
    Delete(String),
    Insert(String),
}

impl HunkLine {
    fn prefix(&self) -> char {
        match self {
            Self::Context(_) => ' ',
            Self::Delete(_) => '-',
            Self::Insert(_) => '+',
        }
    }

    fn text(&self) -> &str {
        match self {
            Self::Context(text) | Self::Delete(text) | Self::Insert(text) => text,
        }
    }

    fn inverted(&self) -> Self {
        match self {
            Self::Context(text) => Self::Context(text.clone()),
            Self::Delete(text) => Self::Insert(text.clone()),
            Self::Insert(text) => Self::Delete(text.clone()),
        }
    }
}

impl From<&Edit<'_>> for HunkLine {
    fn from(edit: &Edit<'_>) -> Self {
        match edit {
            Edit::Equal(text) => Self::Context((*text).to_owned()),
            Edit::Delete(text) => Self::Delete((*text).to_owned()),
            Edit::Insert(text) => Self::Insert((*text).to_owned()),
        }
    }
}

/// A contiguous block of changes with its surrounding context.
///
/// `old_start` / `new_start` are 0-based line indexes into the old and new
/// text where the hunk begins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hunk {
    pub old_start: usize,
    pub new_start: usize,
    pub lines: Vec<HunkLine>,
}

impl Hunk {
    pub fn old_len(&self) -> usize {
        self.lines.iter().filter(|line| !matches!(line, HunkLine::Insert(_))).count()
    }

    pub fn new_len(&self) -> usize {
        self.lines.iter().filter(|line| !matches!(line, HunkLine::Delete(_))).count()
    }

    fn inverted(&self) -> Self {
        Self {
            old_start: self.new_start,
            new_start: self.old_start,
            lines: self.lines.iter().map(HunkLine::inverted).collect(),
        }
    }

    fn header(&self) -> String {
        format!(
            "@@ -{},{} +{},{} @@",
            display_start(self.old_start, self.old_len()),
            self.old_len(),
            display_start(self.new_start, self.new_len()),
            self.new_len()
        )
    }
}

fn display_start(index: usize, len: usize) -> usize {
    if len == 0 {
        index
    } else {
        index + 1
    }
}

/// A forward line patch. The empty patch means "no change".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Patch {
    hunks: Vec<Hunk>,
}

impl Patch {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.hunks.is_empty()
    }

    pub fn hunks(&self) -> &[Hunk] {
        &self.hunks
    }

    /// Number of `(inserted, deleted)` lines across all hunks.
    pub fn line_counts(&self) -> (u32, u32) {
        let mut added = 0u32;
        let mut deleted = 0u32;
        for line in self.hunks.iter().flat_map(|hunk| hunk.lines.iter()) {
            match line {
                HunkLine::Insert(_) => added += 1,
                HunkLine::Delete(_) => deleted += 1,
                HunkLine::Context(_) => {}
            }
        }
        (added, deleted)
    }

    /// Groups an edit script into hunks, merging changes separated by at most
    /// `2 * context` unchanged lines.
    pub(crate) fn from_edits(edits: &[Edit<'_>], context: usize) -> Self {
        let mut positions = Vec::with_capacity(edits.len());
        let (mut old_idx, mut new_idx) = (0usize, 0usize);
        for edit in edits {
            positions.push((old_idx, new_idx));
            match edit {
                Edit::Equal(_) => {
                    old_idx += 1;
                    new_idx += 1;
                }
                Edit::Delete(_) => old_idx += 1,
                Edit::Insert(_) => new_idx += 1,
            }
        }

        let changes: Vec<usize> = edits
            .iter()
            .enumerate()
            .filter(|(_, edit)| !matches!(edit, Edit::Equal(_)))
            .map(|(idx, _)| idx)
            .collect();

        let mut hunks = Vec::new();
        let mut i = 0;
        while i < changes.len() {
            let first = changes[i];
            let mut last = first;
            let mut j = i + 1;
            while j < changes.len() && changes[j] - last <= 2 * context + 1 {
                last = changes[j];
                j += 1;
            }

            let start = first.saturating_sub(context);
            let end = (last + context + 1).min(edits.len());
            let (old_start, new_start) = positions[start];
            hunks.push(Hunk {
                old_start,
                new_start,
                lines: edits[start..end].iter().map(HunkLine::from).collect(),
            });
            i = j;
        }

        Self { hunks }
    }

    /// Patch that undoes this one: deletions become insertions and vice versa.
    pub fn inverted(&self) -> Self {
        Self { hunks: self.hunks.iter().map(Hunk::inverted).collect() }
    }

    /// Serializes to unified diff text. The empty patch serializes to `""`.
    pub fn to_unified(&self) -> String {
        if self.is_empty() {
            return String::new();
        }

        let mut out = Vec::new();
        out.push(format!("--- {OLD_LABEL}"));
        out.push(format!("+++ {NEW_LABEL}"));
        for hunk in &self.hunks {
            out.push(hunk.header());
            for line in &hunk.lines {
                let mut rendered = String::with_capacity(line.text().len() + 1);
                rendered.push(line.prefix());
                rendered.push_str(line.text());
                out.push(rendered);
            }
        }
        out.join("\n")
    }

    /// Parses unified diff text produced by [`Patch::to_unified`].
    ///
    /// Blank or whitespace-only input is the empty patch. Hunk bodies are read
    /// by the counts in their headers, so body lines may contain anything.
    pub fn parse(text: &str) -> Result<Self, PatchError> {
        if text.trim().is_empty() {
            return Ok(Self::empty());
        }

        let lines: Vec<&str> = text.split('\n').collect();
        let mut hunks = Vec::new();
        let mut idx = 0;

        while idx < lines.len() {
            let line = lines[idx];
            let line_no = idx + 1;

            if line.starts_with("@@") {
                let (old_start, old_len, new_start, new_len) = parse_header(line, line_no)?;
                idx += 1;

                let mut body = Vec::with_capacity(old_len.max(new_len));
                let (mut old_left, mut new_left) = (old_len, new_len);
                while old_left > 0 || new_left > 0 {
                    let Some(raw) = lines.get(idx) else {
                        return Err(malformed(idx + 1, "hunk ends before its header counts"));
                    };
                    if raw.starts_with('\\') {
                        idx += 1;
                        continue;
                    }

                    let (kind, rest) = match raw.chars().next() {
                        Some(prefix) => (prefix, &raw[prefix.len_utf8()..]),
                        // Some tools strip the single space of an empty context line.
                        None => (' ', ""),
                    };
                    let parsed = match kind {
                        ' ' => HunkLine::Context(rest.to_owned()),
                        '-' => HunkLine::Delete(rest.to_owned()),
                        '+' => HunkLine::Insert(rest.to_owned()),
                        other => {
                            return Err(malformed(
                                idx + 1,
                                &format!("unexpected hunk line prefix {other:?}"),
                            ))
                        }
                    };

                    let consumes_old = !matches!(parsed, HunkLine::Insert(_));
                    let consumes_new = !matches!(parsed, HunkLine::Delete(_));
                    if (consumes_old && old_left == 0) || (consumes_new && new_left == 0) {
                        return Err(malformed(idx + 1, "hunk is longer than its header counts"));
                    }
                    if consumes_old {
                        old_left -= 1;
                    }
                    if consumes_new {
                        new_left -= 1;
                    }
                    body.push(parsed);
                    idx += 1;
                }

                hunks.push(Hunk { old_start, new_start, lines: body });
                continue;
            }

            let is_file_header = line.starts_with("--- ") || line.starts_with("+++ ");
            if hunks.is_empty() && is_file_header {
                idx += 1;
                continue;
            }
            if line.trim().is_empty() || line.starts_with('\\') {
                idx += 1;
                continue;
            }
            return Err(malformed(line_no, "unexpected line outside of a hunk"));
        }

        Ok(Self { hunks })
    }

    /// Applies the patch to `base` lines, verifying every context and deleted
    /// line against the base text.
    pub fn apply_lines(&self, base: &[&str]) -> Result<Vec<String>, PatchError> {
        let mut out: Vec<String> = Vec::with_capacity(base.len());
        let mut cursor = 0usize;

        for (hunk_idx, hunk) in self.hunks.iter().enumerate() {
            let hunk_no = hunk_idx + 1;
            if hunk.old_start < cursor {
                return Err(PatchError::OverlappingHunks { hunk: hunk_no });
            }
            if hunk.old_start > base.len() {
                return Err(PatchError::ContextMismatch {
                    hunk: hunk_no,
                    line: hunk.old_start + 1,
                    expected: hunk.lines.first().map(|l| l.text().to_owned()).unwrap_or_default(),
                    found: None,
                });
            }

            out.extend(base[cursor..hunk.old_start].iter().map(|line| (*line).to_owned()));
            if out.len() != hunk.new_start {
                return Err(PatchError::Misaligned {
                    hunk: hunk_no,
                    expected: hunk.new_start + 1,
                    actual: out.len() + 1,
                });
            }

            let mut pos = hunk.old_start;
            for line in &hunk.lines {
                match line {
                    HunkLine::Context(text) | HunkLine::Delete(text) => {
                        match base.get(pos) {
                            Some(found) if *found == text.as_str() => {}
                            found => {
                                return Err(PatchError::ContextMismatch {
                                    hunk: hunk_no,
                                    line: pos + 1,
                                    expected: text.clone(),
                                    found: found.map(|f| (*f).to_owned()),
                                })
                            }
                        }
                        if let HunkLine::Context(text) = line {
                            out.push(text.clone());
                        }
                        pos += 1;
                    }
                    HunkLine::Insert(text) => out.push(text.clone()),
                }
            }
            cursor = pos;
        }

        out.extend(base[cursor..].iter().map(|line| (*line).to_owned()));
        Ok(out)
    }
}

impl fmt::Display for Patch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_unified())
    }
}

fn malformed(line: usize, reason: &str) -> PatchError {
    PatchError::Malformed { line, reason: reason.to_owned() }
}

/// Parses `@@ -a,b +c,d @@` (counts default to 1) into 0-based starts and lengths.
fn parse_header(line: &str, line_no: usize) -> Result<(usize, usize, usize, usize), PatchError> {
    let inner = line
        .strip_prefix("@@ ")
        .and_then(|rest| rest.split(" @@").next())
        .ok_or_else(|| malformed(line_no, "invalid hunk header"))?;

    let mut parts = inner.split_whitespace();
    let old = parts
        .next()
        .and_then(|part| part.strip_prefix('-'))
        .ok_or_else(|| malformed(line_no, "hunk header is missing the old range"))?;
    let new = parts
        .next()
        .and_then(|part| part.strip_prefix('+'))
        .ok_or_else(|| malformed(line_no, "hunk header is missing the new range"))?;

    let (old_start, old_len) = parse_range(old, line_no)?;
    let (new_start, new_len) = parse_range(new, line_no)?;
    Ok((old_start, old_len, new_start, new_len))
}

fn parse_range(range: &str, line_no: usize) -> Result<(usize, usize), PatchError> {
    let (start, len) = match range.split_once(',') {
        Some((start, len)) => (start, len),
        None => (range, "1"),
    };
    let start: usize =
        start.parse().map_err(|_| malformed(line_no, "hunk range start is not a number"))?;
    let len: usize =
        len.parse().map_err(|_| malformed(line_no, "hunk range length is not a number"))?;

    if len == 0 {
        return Ok((start, 0));
    }
    if start == 0 {
        return Err(malformed(line_no, "non-empty hunk range must start at line 1 or later"));
    }
    Ok((start - 1, len))
}
