use std::collections::BTreeMap;

use super::types::Category;
use crate::errors::RecognitionError;

/// Highest identifier number seen per category.
///
/// `observe` raises a counter to the largest value seen and `allocate` hands
/// out the next one. `release` may only undo the latest allocation, and never
/// drops a counter below an observed identifier.
#[derive(Debug, Clone, Default)]
pub struct SequenceAllocator {
    counters: BTreeMap<Category, u64>,
    observed: BTreeMap<Category, u64>,
}

impl SequenceAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an existing identifier.
    pub fn observe(&mut self, category: &Category, number: u64) {
        let counter = self.counters.entry(category.clone()).or_insert(0);
        *counter = (*counter).max(number);
        let seen = self.observed.entry(category.clone()).or_insert(0);
        *seen = (*seen).max(number);
    }

    /// Issue the next number in `category`.
    pub fn allocate(&mut self, category: &Category) -> Result<u64, RecognitionError> {
        let counter = self.counters.entry(category.clone()).or_insert(0);
        let next = counter
            .checked_add(1)
            .ok_or_else(|| RecognitionError::SequenceExhausted {
                category: category.to_string(),
            })?;
        *counter = next;
        Ok(next)
    }

    /// Give back `number` if it was the last one issued in `category`.
    pub fn release(&mut self, category: &Category, number: u64) {
        let floor = self.observed.get(category).copied().unwrap_or(0);
        if let Some(counter) = self.counters.get_mut(category)
            && *counter == number
            && number > floor
        {
            *counter = number - 1;
        }
    }

    /// Current high-water mark for `category` (0 if never seen).
    pub fn highest(&self, category: &Category) -> u64 {
        self.counters.get(category).copied().unwrap_or(0)
    }

    /// Snapshot of every counter, ordered by category.
    pub fn counters(&self) -> &BTreeMap<Category, u64> {
        &self.counters
    }
}
