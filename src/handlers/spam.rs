//! Repeated message sending with per-chat cancellation.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::commands::CommandResult;
use crate::state::SpamRegistry;
use crate::telegram::{ChatApi, ChatId, ChatMessage, TelegramError};

/// Runs `spam`, `delayspam` and `stopspam`.
pub struct SpamManager {
    api: Arc<dyn ChatApi>,
    registry: SpamRegistry,
    max_count: u32,
}

impl SpamManager {
    #[must_use]
    pub fn new(api: Arc<dyn ChatApi>, max_count: u32) -> Self {
        Self {
            api,
            registry: SpamRegistry::new(),
            max_count,
        }
    }

    /// Handles `spam` (no delay) and `delayspam`.
    ///
    /// The trigger message is deleted first; the call returns once every
    /// message was sent or the chat's spam was stopped.
    pub async fn execute(
        &self,
        command: &ChatMessage,
        count: u32,
        text: &str,
        delay: Option<Duration>,
    ) -> CommandResult {
        if count > self.max_count {
            return CommandResult::error(format!(
                "Maximum spam limit is {} messages.",
                self.max_count
            ))
            .replying();
        }

        let chat = command.chat;
        match self.api.delete_messages(chat, &[command.id]).await {
            Ok(_) => {}
            Err(e) if e.is_permission_error() => {
                if let Err(e) = self
                    .api
                    .reply_to(chat, command.id, " I don't have permission to delete messages here.")
                    .await
                {
                    warn!("Failed to report missing delete permission: {}", e);
                }
            }
            Err(e) => return CommandResult::error(format!("Error: {e}")).replying(),
        }

        match self.run(chat, text, count, delay).await {
            Ok(sent) => {
                info!("Spam in chat {} finished after {}/{} messages", chat, sent, count);
                CommandResult::silent()
            }
            Err(e) => {
                warn!("Spam in chat {} failed: {}", chat, e);
                CommandResult::error(format!("Error: {e}")).replying()
            }
        }
    }

    /// Cancels every spam loop in `chat`.
    pub fn stop(&self, chat: ChatId) -> CommandResult {
        if self.registry.stop(chat) {
            info!("Stopped spam in chat {}", chat);
        } else {
            debug!("No spam running in chat {}", chat);
        }
        CommandResult::success("Stopped all ongoing spam.").responding()
    }

    /// Sends `text` up to `count` times and returns how many were sent.
    async fn run(
        &self,
        chat: ChatId,
        text: &str,
        count: u32,
        delay: Option<Duration>,
    ) -> Result<u32, TelegramError> {
        if self.registry.is_active(chat) {
            debug!("Spam already running in chat {}, sharing its stop signal", chat);
        }
        let guard = self.registry.start(chat);
        let mut sent = 0;

        for _ in 0..count {
            if guard.is_cancelled() {
                break;
            }

            self.api.send_message(chat, text).await?;
            sent += 1;

            if let Some(delay) = delay {
                tokio::select! {
                    () = tokio::time::sleep(delay) => {}
                    () = guard.token().cancelled() => break,
                }
            }
        }

        Ok(sent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::Delivery;
    use crate::testing::{FakeChat, Op, SELF_ID};

    const CHAT: ChatId = ChatId(-400);

    fn setup() -> (Arc<FakeChat>, Arc<SpamManager>) {
        let fake = Arc::new(FakeChat::new());
        let manager = Arc::new(SpamManager::new(fake.clone(), 100));
        (fake, manager)
    }

    #[tokio::test]
    async fn test_spam_sends_exact_count() {
        let (fake, manager) = setup();
        let cmd = fake.push_message(CHAT, SELF_ID, ".spam 5 hi", None);

        let result = manager.execute(&cmd, 5, "hi", None).await;
        assert_eq!(result.delivery, Delivery::Silent);
        assert_eq!(fake.sent_texts(CHAT), vec!["hi"; 5]);
        assert_eq!(fake.deleted_ids(CHAT), vec![cmd.id]);
        assert!(!manager.registry.is_active(CHAT));
    }

    #[tokio::test]
    async fn test_spam_limit() {
        let (fake, manager) = setup();
        let cmd = fake.push_message(CHAT, SELF_ID, ".spam 101 hi", None);

        let result = manager.execute(&cmd, 101, "hi", None).await;
        assert_eq!(result.message, "Maximum spam limit is 100 messages.");
        assert_eq!(result.delivery, Delivery::Reply);
        assert!(fake.sent_texts(CHAT).is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_halts_delayed_spam() {
        let (fake, manager) = setup();
        let cmd = fake.push_message(CHAT, SELF_ID, ".delayspam 5 1 hi", None);

        let task = tokio::spawn({
            let manager = Arc::clone(&manager);
            async move {
                manager
                    .execute(&cmd, 5, "hi", Some(Duration::from_secs(1)))
                    .await
            }
        });

        tokio::time::sleep(Duration::from_millis(1500)).await;
        assert!(manager.registry.is_active(CHAT));
        let stopped = manager.stop(CHAT);
        assert_eq!(stopped.message, "Stopped all ongoing spam.");
        assert_eq!(stopped.delivery, Delivery::Respond);

        task.await.unwrap();
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(fake.sent_texts(CHAT).len(), 2);
        assert!(!manager.registry.is_active(CHAT));
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_only_affects_its_chat() {
        let (fake, manager) = setup();
        let other = ChatId(-401);
        let cmd_a = fake.push_message(CHAT, SELF_ID, ".delayspam 3 1 a", None);
        let cmd_b = fake.push_message(other, SELF_ID, ".delayspam 3 1 b", None);

        let spawn = |cmd: ChatMessage, text: &'static str| {
            let manager = Arc::clone(&manager);
            tokio::spawn(async move {
                manager
                    .execute(&cmd, 3, text, Some(Duration::from_secs(1)))
                    .await
            })
        };
        let a = spawn(cmd_a, "a");
        let b = spawn(cmd_b, "b");

        tokio::time::sleep(Duration::from_millis(500)).await;
        manager.stop(CHAT);
        a.await.unwrap();
        b.await.unwrap();

        assert_eq!(fake.sent_texts(CHAT).len(), 1);
        assert_eq!(fake.sent_texts(other).len(), 3);
    }

    #[tokio::test]
    async fn test_spam_continues_without_delete_permission() {
        let (fake, manager) = setup();
        fake.fail(Op::Delete, || TelegramError::DeleteForbidden);
        let cmd = fake.push_message(CHAT, SELF_ID, ".spam 2 hi", None);

        manager.execute(&cmd, 2, "hi", None).await;
        assert_eq!(
            fake.replies(),
            vec![" I don't have permission to delete messages here."]
        );
        assert_eq!(fake.sent_texts(CHAT).len(), 2);
    }

    #[tokio::test]
    async fn test_send_failure_is_reported() {
        let (fake, manager) = setup();
        let cmd = fake.push_message(CHAT, SELF_ID, ".spam 3 hi", None);
        fake.fail(Op::Send, || TelegramError::FloodWait(30));

        let result = manager.execute(&cmd, 3, "hi", None).await;
        assert!(!result.success);
        assert_eq!(result.message, "Error: Flood wait required: 30 seconds");
        assert!(!manager.registry.is_active(CHAT));
    }
}
