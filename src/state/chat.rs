//! Per-chat moderation state.

use std::collections::{HashMap, HashSet};

use tokio::sync::RwLock;

use crate::telegram::{ChatId, UserId};

/// Moderation bookkeeping for a single chat.
#[derive(Debug, Default)]
struct ChatState {
    /// Users whose incoming messages are deleted on sight.
    muted_users: HashSet<UserId>,

    /// Users this process has banned.
    banned_users: HashSet<UserId>,

    /// Users this process has promoted.
    admins: HashSet<UserId>,
}

/// Process-wide registry of per-chat moderation records.
///
/// Records are created on first write and live until the process exits.
#[derive(Debug, Default)]
pub struct ChatStateRegistry {
    chats: RwLock<HashMap<ChatId, ChatState>>,
}

impl ChatStateRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `user` to the muted set. Returns false if already muted.
    pub async fn mute(&self, chat: ChatId, user: UserId) -> bool {
        self.update(chat, |state| state.muted_users.insert(user)).await
    }

    /// Removes `user` from the muted set. Returns false if not muted.
    pub async fn unmute(&self, chat: ChatId, user: UserId) -> bool {
        self.update(chat, |state| state.muted_users.remove(&user)).await
    }

    pub async fn is_muted(&self, chat: ChatId, user: UserId) -> bool {
        self.read(chat, |state| state.muted_users.contains(&user)).await
    }

    pub async fn record_ban(&self, chat: ChatId, user: UserId) {
        self.update(chat, |state| state.banned_users.insert(user)).await;
    }

    /// Forgets a ban. Returns false if the user was not recorded as banned.
    pub async fn clear_ban(&self, chat: ChatId, user: UserId) -> bool {
        self.update(chat, |state| state.banned_users.remove(&user)).await
    }

    pub async fn is_banned(&self, chat: ChatId, user: UserId) -> bool {
        self.read(chat, |state| state.banned_users.contains(&user)).await
    }

    pub async fn record_admin(&self, chat: ChatId, user: UserId) {
        self.update(chat, |state| state.admins.insert(user)).await;
    }

    /// Forgets a promotion. Returns false if the user was not recorded as admin.
    pub async fn clear_admin(&self, chat: ChatId, user: UserId) -> bool {
        self.update(chat, |state| state.admins.remove(&user)).await
    }

    pub async fn is_admin(&self, chat: ChatId, user: UserId) -> bool {
        self.read(chat, |state| state.admins.contains(&user)).await
    }

    async fn update<T>(&self, chat: ChatId, f: impl FnOnce(&mut ChatState) -> T) -> T {
        let mut chats = self.chats.write().await;
        f(chats.entry(chat).or_default())
    }

    async fn read(&self, chat: ChatId, f: impl FnOnce(&ChatState) -> bool) -> bool {
        self.chats.read().await.get(&chat).is_some_and(f)
    }
}
