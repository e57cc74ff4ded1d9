//! Mutex-guarded in-process allocator.

use super::{
    issuable, SequenceAllocator, SequenceCounter, SequencePath, SequenceResult, EXHAUSTED_NEXT,
    FIRST_SEQUENTIAL,
};
use log::debug;
use parking_lot::Mutex;
use std::collections::BTreeMap;

/// Allocator keeping counters in process memory.
///
/// One lock guards the whole map, so a `commit` is a single critical
/// section: read, store `next + 1`, return.
#[derive(Debug, Default)]
pub struct InMemorySequenceAllocator {
    counters: Mutex<BTreeMap<SequencePath, u64>>,
}

impl InMemorySequenceAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds counters, e.g. from an export of a previous process.
    ///
    /// Seeding never moves a counter backwards. Values past `u32::MAX` seed
    /// an exhausted counter.
    pub fn with_counters(counters: impl IntoIterator<Item = SequenceCounter>) -> Self {
        let allocator = Self::new();
        {
            let mut map = allocator.counters.lock();
            for counter in counters {
                let entry = map
                    .entry(counter.path)
                    .or_insert(u64::from(FIRST_SEQUENTIAL));
                *entry = (*entry).max(counter.next.min(EXHAUSTED_NEXT));
            }
        }
        allocator
    }
}

impl SequenceAllocator for InMemorySequenceAllocator {
    fn peek_next(&self, path: &SequencePath) -> SequenceResult<u32> {
        match self.counters.lock().get(path) {
            Some(next) => issuable(path, *next),
            None => Ok(FIRST_SEQUENTIAL),
        }
    }

    fn commit(&self, path: &SequencePath) -> SequenceResult<u32> {
        let mut counters = self.counters.lock();
        let next = counters
            .entry(path.clone())
            .or_insert(u64::from(FIRST_SEQUENTIAL));
        let issued = issuable(path, *next)?;
        *next = u64::from(issued) + 1;
        debug!(
            "event=sequence_commit module=sequence status=ok store=memory path={} issued={}",
            path, issued
        );
        Ok(issued)
    }

    fn counters(&self) -> SequenceResult<Vec<SequenceCounter>> {
        Ok(self
            .counters
            .lock()
            .iter()
            .map(|(path, next)| SequenceCounter {
                path: path.clone(),
                next: *next,
            })
            .collect())
    }
}
