// Page and archive-row identifier allocation.

use std::sync::atomic::{AtomicI64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

/// 2024-01-01T00:00:00Z in unix milliseconds.
const EPOCH_MS: i64 = 1_704_067_200_000;
const NODE_BITS: u32 = 10;
const SEQUENCE_BITS: u32 = 12;
const SEQUENCE_MASK: i64 = (1 << SEQUENCE_BITS) - 1;
const NODE_MASK: i64 = (1 << NODE_BITS) - 1;

pub trait IdSource {
    /// Next identifier. Identifiers from one source never repeat.
    fn next_id(&self) -> i64;

    /// Records that `id` is already in use elsewhere; later ids are greater.
    fn observe(&self, _id: i64) {}
}

/// Time-ordered 64-bit ids: 41 bits of milliseconds since 2024, 10 bits of
/// node id, 12 bits of per-millisecond sequence.
#[derive(Debug)]
pub struct SnowflakeIds {
    node: i64,
    last: AtomicI64,
}

impl SnowflakeIds {
    pub fn new(node: u16) -> Self {
        Self { node: i64::from(node) & NODE_MASK, last: AtomicI64::new(0) }
    }

    fn now_ms() -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX))
            .unwrap_or(EPOCH_MS)
    }

    fn compose(&self, millis: i64, sequence: i64) -> i64 {
        (millis.max(0) << (NODE_BITS + SEQUENCE_BITS)) | (self.node << SEQUENCE_BITS) | sequence
    }
}

impl Default for SnowflakeIds {
    fn default() -> Self {
        Self::new(0)
    }
}

impl IdSource for SnowflakeIds {
    fn next_id(&self) -> i64 {
        let floor = self.compose(Self::now_ms() - EPOCH_MS, 0);
        loop {
            let last = self.last.load(Ordering::Acquire);
            let candidate = if floor > last {
                floor
            } else if last & SEQUENCE_MASK == SEQUENCE_MASK {
                // Sequence exhausted: borrow the next millisecond.
                self.compose((last >> (NODE_BITS + SEQUENCE_BITS)) + 1, 0)
            } else {
                last + 1
            };
            if self
                .last
                .compare_exchange(last, candidate, Ordering::AcqRel, Ordering::Acquire)
                .is_ok()
            {
                return candidate;
            }
        }
    }

    fn observe(&self, id: i64) {
        self.last.fetch_max(id, Ordering::AcqRel);
    }
}

/// Monotonic counter, mostly for tests and fixtures.
#[derive(Debug)]
pub struct SequentialIds {
    next: AtomicI64,
}

impl SequentialIds {
    pub fn starting_at(first: i64) -> Self {
        Self { next: AtomicI64::new(first) }
    }
}

impl Default for SequentialIds {
    fn default() -> Self {
        Self::starting_at(1)
    }
}

impl IdSource for SequentialIds {
    fn next_id(&self) -> i64 {
        self.next.fetch_add(1, Ordering::Relaxed)
    }

    fn observe(&self, id: i64) {
        self.next.fetch_max(id.saturating_add(1), Ordering::Relaxed);
    }
}

impl<T: IdSource + ?Sized> IdSource for &T {
    fn next_id(&self) -> i64 {
        (**self).next_id()
    }

    fn observe(&self, id: i64) {
        (**self).observe(id)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::sync::Arc;

    use super::*;

    #[test]
    fn sequential_ids_count_up() {
        let ids = SequentialIds::starting_at(100);
        assert_eq!(ids.next_id(), 100);
        assert_eq!(ids.next_id(), 101);
    }

    #[test]
    fn snowflake_ids_are_strictly_increasing() {
        let ids = SnowflakeIds::new(3);
        let mut previous = 0;
        for _ in 0..10_000 {
            let id = ids.next_id();
            assert!(id > previous, "{id} should exceed {previous}");
            previous = id;
        }
    }

    #[test]
    fn observed_ids_are_never_reissued() {
        let ids = SnowflakeIds::default();
        let foreign = ids.next_id() + 1_000_000;
        ids.observe(foreign);
        assert!(ids.next_id() > foreign);

        let seq = SequentialIds::default();
        seq.observe(41);
        assert_eq!(seq.next_id(), 42);
        seq.observe(3);
        assert_eq!(seq.next_id(), 43);
    }

    #[test]
    fn snowflake_ids_embed_node() {
        let ids = SnowflakeIds::new(5);
        let id = ids.next_id();
        assert_eq!((id >> SEQUENCE_BITS) & NODE_MASK, 5);
    }

    #[test]
    fn snowflake_ids_are_unique_across_threads() {
        let ids = Arc::new(SnowflakeIds::default());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let ids = Arc::clone(&ids);
                std::thread::spawn(move || (0..2_000).map(|_| ids.next_id()).collect::<Vec<_>>())
            })
            .collect();

        let mut seen = HashSet::new();
        for handle in handles {
            for id in handle.join().expect("id thread should finish") {
                assert!(seen.insert(id), "duplicate id {id}");
            }
        }
        assert_eq!(seen.len(), 8_000);
    }
}
