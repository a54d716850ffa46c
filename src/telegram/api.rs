//! The chat-client surface used by the command handlers.
//!
//! Handlers only talk to Telegram through [`ChatApi`], so the whole command
//! layer can run against [`TelegramBot`](super::TelegramBot) in production and
//! against an in-memory fake in tests.

use async_trait::async_trait;

use super::TelegramError;
use super::types::{AdminRights, ChatId, ChatMessage, InlineButton, MessageId, UserId};

/// Chat operations the bot needs from the messaging client.
#[async_trait]
pub trait ChatApi: Send + Sync {
    /// Sends a text message and returns its id.
    async fn send_message(&self, chat: ChatId, text: &str) -> Result<MessageId, TelegramError>;

    /// Sends a text message replying to `message`.
    async fn reply_to(
        &self,
        chat: ChatId,
        message: MessageId,
        text: &str,
    ) -> Result<MessageId, TelegramError>;

    /// Replaces the text of an existing message.
    async fn edit_message(
        &self,
        chat: ChatId,
        message: MessageId,
        text: &str,
    ) -> Result<(), TelegramError>;

    /// Deletes messages and returns how many the server reported deleted.
    async fn delete_messages(&self, chat: ChatId, ids: &[MessageId])
    -> Result<usize, TelegramError>;

    /// Fetches a single message by id.
    async fn get_message(
        &self,
        chat: ChatId,
        id: MessageId,
    ) -> Result<Option<ChatMessage>, TelegramError>;

    /// Fetches the most recent message in the chat.
    async fn latest_message(&self, chat: ChatId) -> Result<Option<ChatMessage>, TelegramError>;

    /// Ids of every message with id `>= first`, oldest first.
    async fn message_ids_since(
        &self,
        chat: ChatId,
        first: MessageId,
    ) -> Result<Vec<MessageId>, TelegramError>;

    /// Up to `limit` most recent messages authored by `sender`, newest first.
    ///
    /// Only a bounded window of recent history may be searched, so fewer
    /// than `limit` messages can come back even if older ones exist.
    async fn messages_by(
        &self,
        chat: ChatId,
        sender: UserId,
        limit: usize,
    ) -> Result<Vec<ChatMessage>, TelegramError>;

    /// Presses an inline callback button of `message`.
    async fn click_button(
        &self,
        message: &ChatMessage,
        button: &InlineButton,
    ) -> Result<(), TelegramError>;

    /// Restricts (`allowed = false`) or restores the right to view messages.
    async fn set_view_messages(
        &self,
        chat: ChatId,
        user: UserId,
        allowed: bool,
    ) -> Result<(), TelegramError>;

    /// Replaces the administrator rights of `user`.
    async fn set_admin_rights(
        &self,
        chat: ChatId,
        user: UserId,
        rights: AdminRights,
        rank: &str,
    ) -> Result<(), TelegramError>;
}
