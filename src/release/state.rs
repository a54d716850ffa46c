//! Release automation state.

use std::collections::BTreeSet;
use std::time::Duration;

use crate::telegram::ChatId;

/// Pauses between the steps of a release cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReleaseTimings {
    /// Wait after sending `/release <name>` before reading the answer.
    pub response_wait: Duration,

    /// Wait after picking the Pokémon before looking for the confirmation.
    pub selection_wait: Duration,

    /// Wait after confirming the release.
    pub confirm_wait: Duration,

    /// Gap between two items, also the idle period of an empty worklist.
    pub item_gap: Duration,

    /// Delay before retrying a pass that failed.
    pub retry_delay: Duration,
}

impl Default for ReleaseTimings {
    fn default() -> Self {
        Self {
            response_wait: Duration::from_secs(2),
            selection_wait: Duration::from_secs(4),
            confirm_wait: Duration::from_secs(2),
            item_gap: Duration::from_secs(3),
            retry_delay: Duration::from_secs(5),
        }
    }
}

/// Whether automation runs, where, and what is left to release.
///
/// Only one chat can be bound at a time.
#[derive(Debug, Default)]
pub struct ReleaseState {
    running: bool,
    current_chat: Option<ChatId>,
    release_list: BTreeSet<String>,
}

impl ReleaseState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn is_running(&self) -> bool {
        self.running
    }

    #[must_use]
    pub const fn current_chat(&self) -> Option<ChatId> {
        self.current_chat
    }

    /// Binds automation to `chat`. Returns false if it already runs.
    pub fn start(&mut self, chat: ChatId) -> bool {
        if self.running {
            return false;
        }
        self.running = true;
        self.current_chat = Some(chat);
        true
    }

    /// Stops automation and clears the chat binding.
    ///
    /// Returns false if nothing was running.
    pub fn stop(&mut self) -> bool {
        let was_running = self.running;
        self.running = false;
        self.current_chat = None;
        was_running
    }

    /// Adds a name to the worklist. Returns false if it was already there.
    pub fn add(&mut self, name: &str) -> bool {
        self.release_list.insert(name.to_owned())
    }

    /// Removes a name from the worklist. Returns false if it was absent.
    pub fn remove(&mut self, name: &str) -> bool {
        self.release_list.remove(name)
    }

    /// Snapshot of the worklist in alphabetical order.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        self.release_list.iter().cloned().collect()
    }
}
