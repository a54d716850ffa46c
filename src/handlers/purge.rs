//! Bulk message deletion.

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use crate::commands::CommandResult;
use crate::telegram::{ChatApi, ChatId, ChatMessage, MessageId, RateLimiter, TelegramError};

/// Telegram deletes at most this many messages per request.
const BATCH_SIZE: usize = 100;

const USAGE: &str = "Usage: `.purge <count>` (your messages) or reply with `.purge` (delete all till replied message)";
const NO_PERMISSION: &str = "⚠️ Error: I need 'Delete Messages' permission!";

/// Deletes message ranges in rate-limited batches.
pub struct PurgeManager {
    api: Arc<dyn ChatApi>,
    batch_pause: Duration,
    confirmation_ttl: Duration,
}

impl PurgeManager {
    #[must_use]
    pub fn new(api: Arc<dyn ChatApi>) -> Self {
        Self {
            api,
            batch_pause: Duration::from_secs(1),
            confirmation_ttl: Duration::from_secs(3),
        }
    }

    /// Handles `purge` (in reply) and `purge <count>`.
    ///
    /// Missing delete rights are reported to the user; any other failure is
    /// returned to the caller.
    pub async fn execute(
        &self,
        command: &ChatMessage,
        count: Option<u32>,
    ) -> Result<CommandResult, TelegramError> {
        let chat = command.chat;

        let anchor = match command.reply_to {
            Some(reply_id) => self.api.get_message(chat, reply_id).await?,
            None => None,
        };

        let result = if let Some(anchor) = anchor {
            info!("Purging chat {} up to message {}", chat, anchor.id);
            self.purge_from(chat, anchor.id).await
        } else if let Some(count) = count {
            if count == 0 {
                return Ok(CommandResult::error("⚠️ Count must be greater than 0.").replying());
            }
            info!("Purging {} own messages in chat {}", count, chat);
            self.purge_own(command, count).await
        } else {
            warn!("Invalid purge command usage");
            return Ok(CommandResult::error(USAGE).replying());
        };

        match result {
            Err(e) if e.is_permission_error() => {
                warn!("Purge in chat {} refused: {}", chat, e);
                Ok(CommandResult::error(NO_PERMISSION).replying())
            }
            other => other,
        }
    }

    async fn purge_from(
        &self,
        chat: ChatId,
        first: MessageId,
    ) -> Result<CommandResult, TelegramError> {
        let ids = self.api.message_ids_since(chat, first).await?;
        let deleted = self.delete_in_batches(chat, &ids).await?;

        self.confirm(
            chat,
            &format!(" Deleted {deleted} messages up to the replied message."),
        )
        .await?;
        Ok(CommandResult::silent())
    }

    async fn purge_own(
        &self,
        command: &ChatMessage,
        count: u32,
    ) -> Result<CommandResult, TelegramError> {
        let chat = command.chat;
        let Some(invoker) = command.sender else {
            warn!("Purge command {} has no sender", command.id);
            return Ok(CommandResult::silent());
        };

        let limit = usize::try_from(count).unwrap_or(usize::MAX);
        let ids: Vec<MessageId> = self
            .api
            .messages_by(chat, invoker, limit)
            .await?
            .into_iter()
            .filter(|m| m.sender == Some(invoker))
            .take(limit)
            .map(|m| m.id)
            .collect();

        let deleted = self.delete_in_batches(chat, &ids).await?;

        self.confirm(chat, &format!(" Deleted {deleted} of your messages!"))
            .await?;
        Ok(CommandResult::silent())
    }

    async fn delete_in_batches(
        &self,
        chat: ChatId,
        ids: &[MessageId],
    ) -> Result<usize, TelegramError> {
        let limiter = RateLimiter::new(self.batch_pause);

        for batch in ids.chunks(BATCH_SIZE) {
            limiter.wait_and_acquire().await;
            self.api.delete_messages(chat, batch).await?;
        }

        Ok(ids.len())
    }

    /// Posts a confirmation and removes it after a short while.
    async fn confirm(&self, chat: ChatId, text: &str) -> Result<(), TelegramError> {
        let confirmation = self.api.send_message(chat, text).await?;
        tokio::time::sleep(self.confirmation_ttl).await;
        self.api.delete_messages(chat, &[confirmation]).await?;
        Ok(())
    }
}
