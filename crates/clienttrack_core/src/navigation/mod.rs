//! View navigation mirrored onto a browser-style history stack.
//!
//! The controller pushes a `Search` entry on first load (the floor). Popping
//! back past it delivers an entry without a view, which is read as an intent
//! to leave and answered with an exit prompt instead.

mod history;

pub use history::{BackResult, HistoryPort, SimulatedHistory};

use crate::error::AppError;
use std::fmt;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum View {
    #[default]
    Search,
    Add,
    Details,
    Edit,
    Settings,
}

impl View {
    pub const ALL: [View; 5] = [
        View::Search,
        View::Add,
        View::Details,
        View::Edit,
        View::Settings,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            View::Search => "search",
            View::Add => "add",
            View::Details => "details",
            View::Edit => "edit",
            View::Settings => "settings",
        }
    }

    /// Parse a view name; anything unknown is the search view.
    pub fn parse(name: &str) -> View {
        let name = name.trim();
        View::ALL
            .into_iter()
            .find(|view| view.as_str().eq_ignore_ascii_case(name))
            .unwrap_or_default()
    }
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether a view change creates a history entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryMode {
    Push,
    /// State restoration; history is left alone.
    Neutral,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavMode {
    Browsing,
    /// The user popped past the floor and is being asked to confirm leaving.
    ExitPrompt,
    Exited,
}

pub struct NavigationController<H: HistoryPort> {
    history: H,
    /// Views of the app-pushed entries up to the cursor, floor first.
    stack: Vec<View>,
    current: View,
    mode: NavMode,
}

impl<H: HistoryPort> NavigationController<H> {
    pub fn new(history: H) -> Self {
        Self {
            history,
            stack: Vec::new(),
            current: View::Search,
            mode: NavMode::Browsing,
        }
    }

    pub fn history(&self) -> &H {
        &self.history
    }

    pub fn current(&self) -> View {
        self.current
    }

    pub fn mode(&self) -> NavMode {
        self.mode
    }

    pub fn exit_prompt_visible(&self) -> bool {
        self.mode == NavMode::ExitPrompt
    }

    /// True once the user has popped past the floor entry.
    pub fn below_floor(&self) -> bool {
        self.stack.is_empty()
    }

    /// Set up the initial view from the history state.
    ///
    /// Without state this is a first load: the current entry becomes the
    /// empty floor and `Search` is pushed once. With state (a reload) that
    /// view is restored and nothing is pushed.
    pub fn init(&mut self) -> View {
        match self.history.state() {
            None => {
                self.history.replace_with_floor();
                self.history.push(View::Search);
                self.stack = vec![View::Search];
                self.current = View::Search;
            }
            Some(view) => {
                self.stack = vec![view];
                self.current = view;
            }
        }
        self.mode = NavMode::Browsing;
        debug!("navigation initialised on {}", self.current);
        self.current
    }

    /// Show `view`, hiding any exit prompt.
    pub fn navigate(&mut self, view: View, mode: HistoryMode) -> View {
        if mode == HistoryMode::Push {
            let restored_floor = self.below_floor();
            if restored_floor {
                self.push(View::Search);
            }
            if !(restored_floor && view == View::Search) {
                self.push(view);
            }
        }
        self.current = view;
        self.mode = NavMode::Browsing;
        self.current
    }

    /// React to the history moving to an entry carrying `state`.
    pub fn on_pop(&mut self, state: Option<View>) -> NavMode {
        match state {
            Some(view) => {
                self.stack.pop();
                match self.stack.last_mut() {
                    Some(top) => *top = view,
                    None => self.stack.push(view),
                }
                self.current = view;
                self.mode = NavMode::Browsing;
            }
            None => {
                debug!("popped past the floor, asking before exit");
                self.stack.clear();
                self.mode = NavMode::ExitPrompt;
            }
        }
        self.mode
    }

    /// Ask the history to go back one entry.
    pub fn back(&mut self) -> NavMode {
        match self.history.back() {
            BackResult::Popped(state) => self.on_pop(state),
            BackResult::Pending => self.mode,
            BackResult::Left => {
                self.stack.clear();
                self.mode = NavMode::Exited;
                self.mode
            }
        }
    }

    /// Leave after the user confirmed the exit prompt.
    ///
    /// # Errors
    /// [`AppError::Confirmation`] when no exit prompt is showing.
    pub fn confirm_exit(&mut self) -> Result<(), AppError> {
        self.require_prompt()?;
        if self.history.back() != BackResult::Left {
            self.history.close();
        }
        self.mode = NavMode::Exited;
        Ok(())
    }

    /// Stay in the app; the floor entry is restored.
    pub fn cancel_exit(&mut self) -> Result<(), AppError> {
        self.require_prompt()?;
        self.push(View::Search);
        self.current = View::Search;
        self.mode = NavMode::Browsing;
        Ok(())
    }

    fn require_prompt(&self) -> Result<(), AppError> {
        if self.exit_prompt_visible() {
            Ok(())
        } else {
            Err(AppError::Confirmation("no exit prompt is showing".to_string()))
        }
    }

    fn push(&mut self, view: View) {
        self.history.push(view);
        self.stack.push(view);
    }
}
