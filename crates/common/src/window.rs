// Bounded window of a document's most recent version entries.
//
// The window lives inline with the page row. Its bound is enforced on push
// only; entries that fall off the front are handed back to the caller, which
// is responsible for archiving them.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::types::{VersionEntry, VersionNo};

/// Default number of entries kept inline per page.
pub const DEFAULT_WINDOW_CAPACITY: usize = 10;

/// Oldest-first ring buffer of [`VersionEntry`] values.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct RecentVersions {
    entries: VecDeque<VersionEntry>,
}

impl RecentVersions {
    pub fn from_entries(entries: impl IntoIterator<Item = VersionEntry>) -> Self {
        Self { entries: entries.into_iter().collect() }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Appends `entry` and evicts from the front until at most `capacity`
    /// entries remain. Evicted entries are returned oldest first.
    pub fn push_bounded(&mut self, entry: VersionEntry, capacity: usize) -> Vec<VersionEntry> {
        self.entries.push_back(entry);
        let mut evicted = Vec::new();
        while self.entries.len() > capacity.max(1) {
            if let Some(oldest) = self.entries.pop_front() {
                evicted.push(oldest);
            }
        }
        evicted
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &VersionEntry> + ExactSizeIterator {
        self.entries.iter()
    }

    pub fn newest(&self) -> Option<&VersionEntry> {
        self.entries.back()
    }

    pub fn oldest(&self) -> Option<&VersionEntry> {
        self.entries.front()
    }

    /// Lowest version still held inline.
    pub fn oldest_version(&self) -> Option<VersionNo> {
        self.oldest().map(|entry| entry.version)
    }

    pub fn get(&self, version: VersionNo) -> Option<&VersionEntry> {
        self.entries.iter().find(|entry| entry.version == version)
    }

    /// True when versions increase by exactly one from front to back.
    pub fn is_contiguous(&self) -> bool {
        self.entries
            .iter()
            .zip(self.entries.iter().skip(1))
            .all(|(prev, next)| next.version == prev.version + 1)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::types::ChangeStats;

    fn entry(version: VersionNo) -> VersionEntry {
        VersionEntry {
            version,
            patch: format!("@@ -1,1 +1,1 @@\n-v{}\n+v{version}", version - 1),
            description: format!("edit {version}"),
            editor_id: None,
            created_at: Utc::now(),
            stats: ChangeStats::zero(),
            content_hash: format!("hash-{version}"),
        }
    }

    #[test]
    fn push_within_capacity_evicts_nothing() {
        let mut window = RecentVersions::default();
        for v in 2..=4 {
            assert!(window.push_bounded(entry(v), 3).is_empty());
        }
        assert_eq!(window.len(), 3);
        assert_eq!(window.oldest_version(), Some(2));
        assert_eq!(window.newest().map(|e| e.version), Some(4));
    }

    #[test]
    fn overflow_evicts_oldest_first() {
        let mut window = RecentVersions::default();
        for v in 2..=11 {
            window.push_bounded(entry(v), DEFAULT_WINDOW_CAPACITY);
        }
        let evicted = window.push_bounded(entry(12), DEFAULT_WINDOW_CAPACITY);
        assert_eq!(evicted.iter().map(|e| e.version).collect::<Vec<_>>(), vec![2]);
        assert_eq!(window.len(), DEFAULT_WINDOW_CAPACITY);
        assert_eq!(window.oldest_version(), Some(3));
        assert!(window.is_contiguous());
    }

    #[test]
    fn shrinking_capacity_drains_several_entries() {
        let mut window = RecentVersions::from_entries((2..=6).map(entry));
        let evicted = window.push_bounded(entry(7), 2);
        assert_eq!(evicted.iter().map(|e| e.version).collect::<Vec<_>>(), vec![2, 3, 4, 5]);
        assert_eq!(window.iter().map(|e| e.version).collect::<Vec<_>>(), vec![6, 7]);
    }

    #[test]
    fn gap_is_detected() {
        let window = RecentVersions::from_entries([entry(2), entry(4)]);
        assert!(!window.is_contiguous());
        assert!(window.get(3).is_none());
        assert!(window.get(4).is_some());
    }

    #[test]
    fn serializes_as_plain_array() {
        let window = RecentVersions::from_entries([entry(2)]);
        let value = serde_json::to_value(&window).unwrap();
        assert!(value.is_array());
        let parsed: RecentVersions = serde_json::from_value(value).unwrap();
        assert_eq!(parsed, window);
    }
}
