//! In-memory backends for the remote traits.
//!
//! They follow the remote APIs' observable behaviour closely enough for the
//! controllers (trimmed reads, append-after-last-row, not-found on missing
//! stores) and support failure injection per operation. Tests use them, and
//! so does the host's offline mode.

mod blob;
mod identity;
mod tabular;

pub use blob::{BlobOp, MemoryBlob};
pub use identity::MemoryIdentity;
pub use tabular::{MemoryTabular, TabularOp};

use crate::error::RemoteError;
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Mutex, MutexGuard, PoisonError};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Per-operation call counters and scripted failures.
#[derive(Debug)]
struct FaultPlan<Op> {
    calls: HashMap<Op, usize>,
    once: HashMap<Op, Vec<RemoteError>>,
    always: HashMap<Op, RemoteError>,
}

impl<Op> Default for FaultPlan<Op> {
    fn default() -> Self {
        Self {
            calls: HashMap::new(),
            once: HashMap::new(),
            always: HashMap::new(),
        }
    }
}

impl<Op: Copy + Eq + Hash> FaultPlan<Op> {
    /// Count a call and return the scripted failure for it, if any.
    fn enter(&mut self, op: Op) -> Result<(), RemoteError> {
        *self.calls.entry(op).or_insert(0) += 1;
        if let Some(queue) = self.once.get_mut(&op) {
            if !queue.is_empty() {
                return Err(queue.remove(0));
            }
        }
        match self.always.get(&op) {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    fn fail_once(&mut self, op: Op, err: RemoteError) {
        self.once.entry(op).or_default().push(err);
    }

    fn fail_always(&mut self, op: Op, err: RemoteError) {
        self.always.insert(op, err);
    }

    fn heal(&mut self, op: Op) {
        self.once.remove(&op);
        self.always.remove(&op);
    }

    fn calls(&self, op: Op) -> usize {
        self.calls.get(&op).copied().unwrap_or(0)
    }
}
