//! Local mirror of the remote customer rows and its search index.
//!
//! The cache is replaced wholesale on refresh. Mutations go through a
//! two-phase staging API: [`LocalCache::stage`] applies a change locally and
//! returns a [`Staged`] ticket that must be either settled after the remote
//! write succeeded or reverted after it failed.

use crate::models::CustomerRecord;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// A local change applied ahead of its remote commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Change {
    Append(CustomerRecord),
    /// Replace the entry with the same id.
    Replace(CustomerRecord),
    Remove(String),
}

/// Undo information for a staged [`Change`].
#[derive(Debug)]
#[must_use = "a staged change must be settled or reverted"]
pub enum Staged {
    Appended(CustomerRecord),
    Replaced {
        previous: CustomerRecord,
        next: CustomerRecord,
    },
    Removed {
        index: usize,
        record: CustomerRecord,
    },
    /// The change had no local effect (entry not cached).
    Untouched,
}

/// Result of a refresh request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    Reloaded { records: usize },
    /// Another refresh was already in flight.
    Skipped,
}

/// Single-flight guard for cache refreshes.
#[derive(Debug, Clone, Default)]
pub struct RefreshGate {
    busy: Arc<AtomicBool>,
}

/// Held while a refresh is in flight; releases the gate on drop.
#[derive(Debug)]
pub struct RefreshTicket {
    busy: Arc<AtomicBool>,
}

impl RefreshGate {
    /// Claim the gate, or `None` when a refresh is already running.
    pub fn try_begin(&self) -> Option<RefreshTicket> {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| RefreshTicket {
                busy: Arc::clone(&self.busy),
            })
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }
}

impl Drop for RefreshTicket {
    fn drop(&mut self) {
        self.busy.store(false, Ordering::Release);
    }
}

/// Ordered in-memory copy of the customer rows (oldest first).
#[derive(Debug, Default)]
pub struct LocalCache {
    records: Vec<CustomerRecord>,
    gate: RefreshGate,
}

impl LocalCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Gate guarding refreshes of this cache.
    pub fn refresh_gate(&self) -> &RefreshGate {
        &self.gate
    }

    /// Replace every entry with a freshly loaded row set.
    pub fn replace_all(&mut self, records: Vec<CustomerRecord>) {
        self.records = records;
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records in insertion order.
    pub fn records(&self) -> &[CustomerRecord] {
        &self.records
    }

    /// Entry with exactly this (normalized) id.
    pub fn get(&self, id: &str) -> Option<&CustomerRecord> {
        self.records.iter().find(|record| record.id == id)
    }

    /// Whether any entry's id equals `normalized_id` after trimming and
    /// uppercasing the cached value.
    pub fn contains_id(&self, normalized_id: &str) -> bool {
        self.records
            .iter()
            .any(|record| record.id.trim().to_uppercase() == normalized_id)
    }

    /// Records matching `query`, newest first.
    ///
    /// An empty (or whitespace) query returns every record. Otherwise the
    /// query is matched case-insensitively as a substring of id, name, or
    /// phone.
    pub fn search(&self, query: &str) -> Vec<CustomerRecord> {
        let needle = query.trim().to_lowercase();
        self.records
            .iter()
            .rev()
            .filter(|record| needle.is_empty() || record.matches(&needle))
            .cloned()
            .collect()
    }

    /// Apply `change` locally and return its undo ticket.
    pub fn stage(&mut self, change: Change) -> Staged {
        match change {
            Change::Append(record) => {
                self.records.push(record.clone());
                Staged::Appended(record)
            }
            Change::Replace(next) => match self.position(&next.id) {
                Some(index) => {
                    let previous = std::mem::replace(&mut self.records[index], next.clone());
                    Staged::Replaced { previous, next }
                }
                None => Staged::Untouched,
            },
            Change::Remove(id) => match self.position(&id) {
                Some(index) => Staged::Removed {
                    index,
                    record: self.records.remove(index),
                },
                None => Staged::Untouched,
            },
        }
    }

    /// Confirm a staged change after its remote write succeeded.
    ///
    /// A recovery refresh may have reloaded the cache between staging and
    /// settling, so the change is re-applied when it is no longer visible.
    pub fn settle(&mut self, staged: Staged) {
        match staged {
            Staged::Appended(record) => {
                if self.position(&record.id).is_none() {
                    self.records.push(record);
                }
            }
            Staged::Replaced { next, .. } => {
                if let Some(index) = self.position(&next.id) {
                    self.records[index] = next;
                }
            }
            Staged::Removed { record, .. } => {
                if let Some(index) = self.position(&record.id) {
                    self.records.remove(index);
                }
            }
            Staged::Untouched => {}
        }
    }

    /// Undo a staged change after its remote write failed.
    pub fn revert(&mut self, staged: Staged) {
        match staged {
            Staged::Appended(record) => {
                if let Some(index) = self.records.iter().rposition(|r| r.id == record.id) {
                    self.records.remove(index);
                }
            }
            Staged::Replaced { previous, next } => {
                if let Some(index) = self.position(&next.id) {
                    self.records[index] = previous;
                }
            }
            Staged::Removed { index, record } => {
                if self.position(&record.id).is_none() {
                    let index = index.min(self.records.len());
                    self.records.insert(index, record);
                }
            }
            Staged::Untouched => {}
        }
    }

    /// Settle or revert `staged` depending on the remote outcome.
    pub fn finish<T, E>(&mut self, staged: Staged, outcome: Result<T, E>) -> Result<T, E> {
        match &outcome {
            Ok(_) => self.settle(staged),
            Err(_) => self.revert(staged),
        }
        outcome
    }

    fn position(&self, id: &str) -> Option<usize> {
        self.records.iter().position(|record| record.id == id)
    }
}

#[cfg(test)]
mod tests;
