// Myers shortest edit script over lines.
//
// The search itself is `similar`'s divide-and-conquer Myers, which keeps
// memory linear in the input size even when every line changes.

use similar::{capture_diff_slices, Algorithm, DiffTag};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Edit<'a> {
    Equal(&'a str),
    Insert(&'a str),
    Delete(&'a str),
}

/// Computes a minimal line edit script turning `old_lines` into `new_lines`.
/// Within a replaced run, deletions come before insertions.
pub(crate) fn line_edits<'a>(old_lines: &[&'a str], new_lines: &[&'a str]) -> Vec<Edit<'a>> {
    let mut edits = Vec::with_capacity(old_lines.len().max(new_lines.len()));
    for op in capture_diff_slices(Algorithm::Myers, old_lines, new_lines) {
        let (tag, old_range, new_range) = op.as_tag_tuple();
        match tag {
            DiffTag::Equal => edits.extend(old_lines[old_range].iter().copied().map(Edit::Equal)),
            DiffTag::Delete => edits.extend(old_lines[old_range].iter().copied().map(Edit::Delete)),
            DiffTag::Insert => edits.extend(new_lines[new_range].iter().copied().map(Edit::Insert)),
            DiffTag::Replace => {
                edits.extend(old_lines[old_range].iter().copied().map(Edit::Delete));
                edits.extend(new_lines[new_range].iter().copied().map(Edit::Insert));
            }
        }
    }
    edits
}

#[cfg(test)]
mod tests {
    use super::{line_edits, Edit};

    fn counts(edits: &[Edit<'_>]) -> (usize, usize, usize) {
        edits.iter().fold((0, 0, 0), |(eq, ins, del), edit| match edit {
            Edit::Equal(_) => (eq + 1, ins, del),
            Edit::Insert(_) => (eq, ins + 1, del),
            Edit::Delete(_) => (eq, ins, del + 1),
        })
    }

    #[test]
    fn identical_inputs_are_all_equal() {
        let lines = ["a", "b", "c"];
        let edits = line_edits(&lines, &lines);
        assert_eq!(counts(&edits), (3, 0, 0));
    }

    #[test]
    fn insert_into_middle_keeps_neighbours() {
        let edits = line_edits(&["a", "c"], &["a", "b", "c"]);
        assert_eq!(edits, vec![Edit::Equal("a"), Edit::Insert("b"), Edit::Equal("c")]);
    }

    #[test]
    fn replacement_is_delete_then_insert() {
        let edits = line_edits(&["hello"], &["world"]);
        assert_eq!(edits, vec![Edit::Delete("hello"), Edit::Insert("world")]);
    }

    #[test]
    fn empty_sides() {
        assert_eq!(line_edits(&[], &["x", "y"]), vec![Edit::Insert("x"), Edit::Insert("y")]);
        assert_eq!(line_edits(&["x"], &[]), vec![Edit::Delete("x")]);
        assert!(line_edits(&[], &[]).is_empty());
    }

    #[test]
    fn edit_script_is_minimal_for_interleaved_changes() {
        let old = ["a", "b", "c", "a", "b", "b", "a"];
        let new = ["c", "b", "a", "b", "a", "c"];
        let edits = line_edits(&old, &new);
        let (_, ins, del) = counts(&edits);
        // Classic Myers paper example: D = 5.
        assert_eq!(ins + del, 5);
    }

    #[test]
    fn full_rewrite_of_long_input_is_all_deletes_and_inserts() {
        let old: Vec<String> = (0..2_000).map(|i| format!("old line {i}")).collect();
        let new: Vec<String> = (0..2_000).map(|i| format!("new line {i}")).collect();
        let old_refs: Vec<&str> = old.iter().map(String::as_str).collect();
        let new_refs: Vec<&str> = new.iter().map(String::as_str).collect();

        let edits = line_edits(&old_refs, &new_refs);
        assert_eq!(counts(&edits), (0, 2_000, 2_000));
    }
}
