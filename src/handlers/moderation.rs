//! Mute, ban, kick and promote handling.

use std::sync::Arc;

use tracing::{debug, error, info};

use crate::commands::{CommandResult, ModerationAction};
use crate::state::ChatStateRegistry;
use crate::telegram::{AdminRights, ChatApi, ChatId, ChatMessage, TelegramError, UserId};

/// Rank given to promoted users.
const ADMIN_RANK: &str = "Admin";

/// Applies moderation commands and enforces mutes.
pub struct ModerationManager {
    api: Arc<dyn ChatApi>,
    chats: Arc<ChatStateRegistry>,
}

impl ModerationManager {
    #[must_use]
    pub fn new(api: Arc<dyn ChatApi>, chats: Arc<ChatStateRegistry>) -> Self {
        Self { api, chats }
    }

    /// Runs a moderation command issued by `command`.
    ///
    /// The target is the sender of the replied-to message, or else the
    /// explicit numeric id given with the command.
    pub async fn execute(
        &self,
        command: &ChatMessage,
        action: ModerationAction,
        explicit: Option<UserId>,
    ) -> CommandResult {
        let Some(user) = self.resolve_target(command, explicit).await else {
            return CommandResult::error(format!(
                "Reply to a user or provide a user ID to {} them!",
                action.verb()
            ));
        };
        let chat = command.chat;

        match action {
            ModerationAction::Mute => {
                self.chats.mute(chat, user).await;
                CommandResult::success("Muted!!!")
            }
            ModerationAction::Unmute => {
                if self.chats.unmute(chat, user).await {
                    CommandResult::success("Unmuted!!!")
                } else {
                    CommandResult::error("This user is not muted!")
                }
            }
            ModerationAction::Ban => self.ban(chat, user).await,
            ModerationAction::Unban => self.unban(chat, user).await,
            ModerationAction::Kick => self.kick(chat, user).await,
            ModerationAction::Promote => self.promote(chat, user).await,
            ModerationAction::Demote => self.demote(chat, user).await,
        }
    }

    /// Deletes `message` if its sender is muted in its chat.
    ///
    /// Returns true if the message was deleted.
    pub async fn enforce_mute(&self, message: &ChatMessage) -> bool {
        let Some(sender) = message.sender else {
            return false;
        };

        if !self.chats.is_muted(message.chat, sender).await {
            return false;
        }

        info!(
            "User {} is muted in chat {}, deleting message {}",
            sender, message.chat, message.id
        );
        match self.api.delete_messages(message.chat, &[message.id]).await {
            Ok(_) => {
                info!("Deleted message from muted user {}", sender);
                true
            }
            Err(e) => {
                error!("Failed to delete message from muted user {}: {}", sender, e);
                false
            }
        }
    }

    async fn resolve_target(
        &self,
        command: &ChatMessage,
        explicit: Option<UserId>,
    ) -> Option<UserId> {
        if let Some(reply_id) = command.reply_to {
            match self.api.get_message(command.chat, reply_id).await {
                Ok(Some(replied)) if replied.sender.is_some() => return replied.sender,
                Ok(_) => debug!("Replied message {} has no sender", reply_id),
                Err(e) => debug!("Could not fetch replied message {}: {}", reply_id, e),
            }
        }
        explicit
    }

    async fn ban(&self, chat: ChatId, user: UserId) -> CommandResult {
        match self.api.set_view_messages(chat, user, false).await {
            Ok(()) => {
                self.chats.record_ban(chat, user).await;
                CommandResult::success("Banned!!!")
            }
            Err(e) => failure(ModerationAction::Ban, user, &e),
        }
    }

    async fn unban(&self, chat: ChatId, user: UserId) -> CommandResult {
        if !self.chats.is_banned(chat, user).await {
            return CommandResult::error("This user is not banned!");
        }

        match self.api.set_view_messages(chat, user, true).await {
            Ok(()) => {
                self.chats.clear_ban(chat, user).await;
                CommandResult::success("Unbanned!!!")
            }
            Err(e) => failure(ModerationAction::Unban, user, &e),
        }
    }

    async fn kick(&self, chat: ChatId, user: UserId) -> CommandResult {
        let result = async {
            self.api.set_view_messages(chat, user, false).await?;
            self.api.set_view_messages(chat, user, true).await
        }
        .await;

        match result {
            Ok(()) => CommandResult::success("Kicked!!!"),
            Err(e) => failure(ModerationAction::Kick, user, &e),
        }
    }

    async fn promote(&self, chat: ChatId, user: UserId) -> CommandResult {
        match self
            .api
            .set_admin_rights(chat, user, AdminRights::moderator(), ADMIN_RANK)
            .await
        {
            Ok(()) => {
                self.chats.record_admin(chat, user).await;
                CommandResult::success("Promoted!!!")
            }
            Err(e) => failure(ModerationAction::Promote, user, &e),
        }
    }

    async fn demote(&self, chat: ChatId, user: UserId) -> CommandResult {
        if !self.chats.is_admin(chat, user).await {
            return CommandResult::error("This user is not an admin!");
        }

        match self
            .api
            .set_admin_rights(chat, user, AdminRights::none(), "")
            .await
        {
            Ok(()) => {
                self.chats.clear_admin(chat, user).await;
                CommandResult::success("Demoted!!!")
            }
            Err(e) => failure(ModerationAction::Demote, user, &e),
        }
    }
}

fn failure(action: ModerationAction, user: UserId, err: &TelegramError) -> CommandResult {
    error!("Failed to {} user {}: {}", action.verb(), user, err);
    CommandResult::error(format!("Failed to {} the user.", action.verb()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Call, FakeChat, Op, SELF_ID};

    const CHAT: ChatId = ChatId(-1001);
    const TARGET: UserId = UserId(555);

    fn setup() -> (Arc<FakeChat>, ModerationManager, Arc<ChatStateRegistry>) {
        let fake = Arc::new(FakeChat::new());
        let chats = Arc::new(ChatStateRegistry::new());
        let manager = ModerationManager::new(fake.clone(), Arc::clone(&chats));
        (fake, manager, chats)
    }

    fn command(fake: &FakeChat, text: &str) -> ChatMessage {
        fake.push_message(CHAT, SELF_ID, text, None)
    }

    #[tokio::test]
    async fn test_target_from_reply() {
        let (fake, manager, chats) = setup();
        let victim = fake.push_message(CHAT, TARGET, "spam spam", None);
        let cmd = fake.push_message(CHAT, SELF_ID, ".mute", Some(victim.id));

        let result = manager.execute(&cmd, ModerationAction::Mute, None).await;
        assert_eq!(result.message, "Muted!!!");
        assert!(chats.is_muted(CHAT, TARGET).await);
    }

    #[tokio::test]
    async fn test_reply_takes_precedence_over_argument() {
        let (fake, manager, chats) = setup();
        let victim = fake.push_message(CHAT, TARGET, "hi", None);
        let cmd = fake.push_message(CHAT, SELF_ID, ".mute 777", Some(victim.id));

        manager
            .execute(&cmd, ModerationAction::Mute, Some(UserId(777)))
            .await;
        assert!(chats.is_muted(CHAT, TARGET).await);
        assert!(!chats.is_muted(CHAT, UserId(777)).await);
    }

    #[tokio::test]
    async fn test_missing_target_shows_usage() {
        let (fake, manager, _) = setup();
        let cmd = command(&fake, ".ban");

        let result = manager.execute(&cmd, ModerationAction::Ban, None).await;
        assert!(!result.success);
        assert_eq!(
            result.message,
            "Reply to a user or provide a user ID to ban them!"
        );
        assert_eq!(fake.permission_calls(), 0);
    }

    #[tokio::test]
    async fn test_mute_then_unmute_controls_deletion() {
        let (fake, manager, _) = setup();
        let cmd = command(&fake, ".mute 555");
        manager
            .execute(&cmd, ModerationAction::Mute, Some(TARGET))
            .await;

        let noisy = fake.push_message(CHAT, TARGET, "hello", None);
        assert!(manager.enforce_mute(&noisy).await);
        assert_eq!(fake.deleted_ids(CHAT), vec![noisy.id]);

        let cmd = command(&fake, ".unmute 555");
        let result = manager
            .execute(&cmd, ModerationAction::Unmute, Some(TARGET))
            .await;
        assert_eq!(result.message, "Unmuted!!!");

        let later = fake.push_message(CHAT, TARGET, "again", None);
        assert!(!manager.enforce_mute(&later).await);
        assert_eq!(fake.deleted_ids(CHAT), vec![noisy.id]);
    }

    #[tokio::test]
    async fn test_mute_does_not_leak_into_other_chats() {
        let (fake, manager, _) = setup();
        let cmd = command(&fake, ".mute 555");
        manager
            .execute(&cmd, ModerationAction::Mute, Some(TARGET))
            .await;

        let elsewhere = fake.push_message(ChatId(-2002), TARGET, "hello", None);
        assert!(!manager.enforce_mute(&elsewhere).await);
    }

    #[tokio::test]
    async fn test_unmute_unknown_user() {
        let (fake, manager, _) = setup();
        let cmd = command(&fake, ".unmute 555");

        let result = manager
            .execute(&cmd, ModerationAction::Unmute, Some(TARGET))
            .await;
        assert_eq!(result.message, "This user is not muted!");
    }

    #[tokio::test]
    async fn test_ban_then_unban_clears_record() {
        let (fake, manager, chats) = setup();
        let cmd = command(&fake, ".ban 555");

        let result = manager
            .execute(&cmd, ModerationAction::Ban, Some(TARGET))
            .await;
        assert_eq!(result.message, "Banned!!!");
        assert!(chats.is_banned(CHAT, TARGET).await);

        let result = manager
            .execute(&cmd, ModerationAction::Unban, Some(TARGET))
            .await;
        assert_eq!(result.message, "Unbanned!!!");
        assert!(!chats.is_banned(CHAT, TARGET).await);

        assert_eq!(
            fake.calls()
                .into_iter()
                .filter(|c| matches!(c, Call::ViewMessages { .. }))
                .collect::<Vec<_>>(),
            vec![
                Call::ViewMessages {
                    chat: CHAT,
                    user: TARGET,
                    allowed: false
                },
                Call::ViewMessages {
                    chat: CHAT,
                    user: TARGET,
                    allowed: true
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_unban_untracked_user_makes_no_call() {
        let (fake, manager, _) = setup();
        let cmd = command(&fake, ".unban 555");

        let result = manager
            .execute(&cmd, ModerationAction::Unban, Some(TARGET))
            .await;
        assert_eq!(result.message, "This user is not banned!");
        assert_eq!(fake.permission_calls(), 0);
    }

    #[tokio::test]
    async fn test_failed_ban_is_reported_and_not_recorded() {
        let (fake, manager, chats) = setup();
        fake.fail(Op::ViewMessages, || TelegramError::AdminRequired);
        let cmd = command(&fake, ".ban 555");

        let result = manager
            .execute(&cmd, ModerationAction::Ban, Some(TARGET))
            .await;
        assert!(!result.success);
        assert_eq!(result.message, "Failed to ban the user.");
        assert!(!chats.is_banned(CHAT, TARGET).await);
    }

    #[tokio::test]
    async fn test_kick_bans_and_restores() {
        let (fake, manager, chats) = setup();
        let cmd = command(&fake, ".kick 555");

        let result = manager
            .execute(&cmd, ModerationAction::Kick, Some(TARGET))
            .await;
        assert_eq!(result.message, "Kicked!!!");
        assert_eq!(fake.permission_calls(), 2);
        assert!(!chats.is_banned(CHAT, TARGET).await);
    }

    #[tokio::test]
    async fn test_promote_and_demote() {
        let (fake, manager, chats) = setup();
        let cmd = command(&fake, ".promote 555");

        let result = manager
            .execute(&cmd, ModerationAction::Promote, Some(TARGET))
            .await;
        assert_eq!(result.message, "Promoted!!!");
        assert!(chats.is_admin(CHAT, TARGET).await);
        assert!(fake.calls().contains(&Call::AdminRights {
            chat: CHAT,
            user: TARGET,
            rights: AdminRights::moderator(),
            rank: "Admin".to_owned(),
        }));

        let result = manager
            .execute(&cmd, ModerationAction::Demote, Some(TARGET))
            .await;
        assert_eq!(result.message, "Demoted!!!");
        assert!(!chats.is_admin(CHAT, TARGET).await);
        assert!(fake.calls().contains(&Call::AdminRights {
            chat: CHAT,
            user: TARGET,
            rights: AdminRights::none(),
            rank: String::new(),
        }));
    }

    #[tokio::test]
    async fn test_demote_non_admin() {
        let (fake, manager, _) = setup();
        let cmd = command(&fake, ".demote 555");

        let result = manager
            .execute(&cmd, ModerationAction::Demote, Some(TARGET))
            .await;
        assert_eq!(result.message, "This user is not an admin!");
        assert_eq!(fake.permission_calls(), 0);
    }

    #[tokio::test]
    async fn test_failed_promote() {
        let (fake, manager, chats) = setup();
        fake.fail(Op::AdminRights, || {
            TelegramError::Invocation("USER_NOT_MUTUAL_CONTACT".to_owned())
        });
        let cmd = command(&fake, ".promote 555");

        let result = manager
            .execute(&cmd, ModerationAction::Promote, Some(TARGET))
            .await;
        assert_eq!(result.message, "Failed to promote the user.");
        assert!(!chats.is_admin(CHAT, TARGET).await);
    }
}
