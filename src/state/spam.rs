//! Per-chat spam cancellation state.
//!
//! Each chat with running spam loops owns a [`CancellationToken`] shared by
//! all of them. `stopspam` cancels and discards it, so loops started later get
//! a fresh token and a loop finishing never resets the state of another one.

use std::collections::HashMap;

use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;

use crate::telegram::ChatId;

#[derive(Debug)]
struct SpamEntry {
    token: CancellationToken,
    generation: u64,
    active: usize,
}

/// Tracks which chats are currently spamming.
#[derive(Debug, Default)]
pub struct SpamRegistry {
    chats: Mutex<HashMap<ChatId, SpamEntry>>,
    next_generation: Mutex<u64>,
}

impl SpamRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks a spam loop as running in `chat`.
    ///
    /// The loop is considered finished when the returned guard is dropped.
    pub fn start(&self, chat: ChatId) -> SpamGuard<'_> {
        let mut chats = self.chats.lock();
        let entry = chats.entry(chat).or_insert_with(|| {
            let mut next = self.next_generation.lock();
            *next += 1;
            SpamEntry {
                token: CancellationToken::new(),
                generation: *next,
                active: 0,
            }
        });
        entry.active += 1;

        SpamGuard {
            registry: self,
            chat,
            generation: entry.generation,
            token: entry.token.clone(),
        }
    }

    /// Cancels every spam loop running in `chat`. Returns true if any was running.
    pub fn stop(&self, chat: ChatId) -> bool {
        let removed = self.chats.lock().remove(&chat);
        removed.is_some_and(|entry| {
            entry.token.cancel();
            entry.active > 0
        })
    }

    /// Returns true while at least one spam loop runs in `chat`.
    pub fn is_active(&self, chat: ChatId) -> bool {
        self.chats
            .lock()
            .get(&chat)
            .is_some_and(|entry| entry.active > 0)
    }

    fn finish(&self, chat: ChatId, generation: u64) {
        let mut chats = self.chats.lock();
        if let Some(entry) = chats.get_mut(&chat)
            && entry.generation == generation
        {
            entry.active = entry.active.saturating_sub(1);
            if entry.active == 0 {
                chats.remove(&chat);
            }
        }
    }
}

/// Registration of one running spam loop.
#[derive(Debug)]
pub struct SpamGuard<'a> {
    registry: &'a SpamRegistry,
    chat: ChatId,
    generation: u64,
    token: CancellationToken,
}

impl SpamGuard<'_> {
    /// Token cancelled by `stopspam` for this chat.
    #[must_use]
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}

impl Drop for SpamGuard<'_> {
    fn drop(&mut self) {
        self.registry.finish(self.chat, self.generation);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CHAT: ChatId = ChatId(7);

    #[test]
    fn test_guard_marks_chat_active() {
        let registry = SpamRegistry::new();
        assert!(!registry.is_active(CHAT));

        let guard = registry.start(CHAT);
        assert!(registry.is_active(CHAT));
        assert!(!guard.is_cancelled());

        drop(guard);
        assert!(!registry.is_active(CHAT));
    }

    #[test]
    fn test_stop_cancels_all_loops_in_chat() {
        let registry = SpamRegistry::new();
        let first = registry.start(CHAT);
        let second = registry.start(CHAT);
        let elsewhere = registry.start(ChatId(8));

        assert!(registry.stop(CHAT));
        assert!(first.is_cancelled());
        assert!(second.is_cancelled());
        assert!(!elsewhere.is_cancelled());
        assert!(!registry.is_active(CHAT));
    }

    #[test]
    fn test_stop_without_spam() {
        let registry = SpamRegistry::new();
        assert!(!registry.stop(CHAT));
    }

    #[test]
    fn test_finishing_loop_does_not_reset_other_loop() {
        let registry = SpamRegistry::new();
        let long_running = registry.start(CHAT);
        let short = registry.start(CHAT);

        drop(short);
        assert!(registry.is_active(CHAT));
        assert!(!long_running.is_cancelled());
    }

    #[test]
    fn test_stale_guard_does_not_touch_new_generation() {
        let registry = SpamRegistry::new();
        let old = registry.start(CHAT);
        registry.stop(CHAT);

        let fresh = registry.start(CHAT);
        drop(old);
        assert!(registry.is_active(CHAT));
        assert!(!fresh.is_cancelled());
    }
}
