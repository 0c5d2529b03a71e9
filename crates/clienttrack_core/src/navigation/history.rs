//! Browser-style history stack abstraction.

use super::View;

/// What a back request did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackResult {
    /// The cursor moved to an entry carrying this state.
    Popped(Option<View>),
    /// The pop will be delivered later as an event.
    Pending,
    /// There was no earlier entry; navigation left the application.
    Left,
}

/// Session history of the hosting page.
///
/// Entries carry an optional view. The entry in place before the app pushed
/// anything has no view.
pub trait HistoryPort {
    /// State of the current entry.
    fn state(&self) -> Option<View>;

    /// Push a new entry, dropping any forward entries.
    fn push(&mut self, view: View);

    /// Replace the current entry's state with nothing.
    fn replace_with_floor(&mut self);

    fn back(&mut self) -> BackResult;

    /// Close the hosting window, if the host allows it.
    fn close(&mut self);
}

/// In-memory history with browser semantics.
#[derive(Debug, Clone)]
pub struct SimulatedHistory {
    entries: Vec<Option<View>>,
    cursor: usize,
    closed: bool,
    left: bool,
}

impl Default for SimulatedHistory {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedHistory {
    /// A freshly opened page with no state.
    pub fn new() -> Self {
        Self {
            entries: vec![None],
            cursor: 0,
            closed: false,
            left: false,
        }
    }

    /// A reloaded page whose current entry still carries `view`.
    pub fn reloaded(view: View) -> Self {
        Self {
            entries: vec![None, Some(view)],
            cursor: 1,
            closed: false,
            left: false,
        }
    }

    /// Every entry, oldest first.
    pub fn entries(&self) -> &[Option<View>] {
        &self.entries
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Whether a back request went past the first entry.
    pub fn has_left(&self) -> bool {
        self.left
    }
}

impl HistoryPort for SimulatedHistory {
    fn state(&self) -> Option<View> {
        self.entries.get(self.cursor).copied().flatten()
    }

    fn push(&mut self, view: View) {
        self.entries.truncate(self.cursor + 1);
        self.entries.push(Some(view));
        self.cursor = self.entries.len() - 1;
    }

    fn replace_with_floor(&mut self) {
        if let Some(entry) = self.entries.get_mut(self.cursor) {
            *entry = None;
        }
    }

    fn back(&mut self) -> BackResult {
        if self.cursor == 0 {
            self.left = true;
            return BackResult::Left;
        }
        self.cursor -= 1;
        BackResult::Popped(self.state())
    }

    fn close(&mut self) {
        self.closed = true;
    }
}
