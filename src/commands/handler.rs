//! Command dispatcher.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, info};

use super::menus::{help_menu, section_menu};
use super::types::{BotCommand, CommandResult, Delivery, MenuSection};
use crate::config::{BallCatalog, BotSettings};
use crate::handlers::{ModerationManager, PurgeManager, SpamManager, StatusReporter};
use crate::release::ReleaseManager;
use crate::state::ChatStateRegistry;
use crate::telegram::{ChatApi, ChatMessage, TelegramError};

/// Routes messages to the feature handlers and delivers their results.
pub struct CommandHandler {
    /// Command prefix (e.g. "`.`").
    prefix: String,

    api: Arc<dyn ChatApi>,
    moderation: ModerationManager,
    purge: PurgeManager,
    spam: SpamManager,
    release: ReleaseManager,
    status: StatusReporter,
}

impl CommandHandler {
    /// Creates the dispatcher and every handler behind it.
    #[must_use]
    pub fn new(api: Arc<dyn ChatApi>, settings: &BotSettings, catalog: BallCatalog) -> Self {
        let chats = Arc::new(ChatStateRegistry::new());
        let prefix = settings.command_prefix.clone();

        Self {
            moderation: ModerationManager::new(Arc::clone(&api), chats),
            purge: PurgeManager::new(Arc::clone(&api)),
            spam: SpamManager::new(Arc::clone(&api), settings.max_spam_count),
            release: ReleaseManager::new(Arc::clone(&api), prefix.clone()),
            status: StatusReporter::new(
                Arc::clone(&api),
                settings.owner_name.clone(),
                prefix.clone(),
                catalog,
            ),
            prefix,
            api,
        }
    }

    /// The release automation owned by this dispatcher.
    #[must_use]
    pub const fn release(&self) -> &ReleaseManager {
        &self.release
    }

    /// Handles one incoming update.
    ///
    /// Outgoing messages are parsed as commands; messages from others are
    /// checked against the mute list. Returns the delivered result, or
    /// `None` if the message was no command or the command failed.
    pub async fn handle(&self, message: &ChatMessage) -> Option<CommandResult> {
        if !message.outgoing {
            self.moderation.enforce_mute(message).await;
            return None;
        }

        let command = BotCommand::parse(&message.text, &self.prefix)?;
        debug!("Handling command: {}", command);
        let name = command.name();

        match self.execute(message, command).await {
            Ok(result) => {
                info!("Command {} result: success={}", name, result.success);
                self.deliver(message, &result).await;
                Some(result)
            }
            Err(e) => {
                error!("Command {} in chat {} failed: {}", name, message.chat, e);
                None
            }
        }
    }

    async fn execute(
        &self,
        message: &ChatMessage,
        command: BotCommand,
    ) -> Result<CommandResult, TelegramError> {
        let result = match command {
            BotCommand::Moderate(action, user) => {
                self.moderation.execute(message, action, user).await
            }
            BotCommand::Purge(count) => return self.purge.execute(message, count).await,
            BotCommand::Spam { count, text } => {
                self.spam.execute(message, count, &text, None).await
            }
            BotCommand::DelaySpam {
                count,
                delay_secs,
                text,
            } => {
                self.spam
                    .execute(message, count, &text, Some(Duration::from_secs(delay_secs)))
                    .await
            }
            BotCommand::StopSpam => self.spam.stop(message.chat),
            BotCommand::SpamMenu => self.menu(MenuSection::Spam),
            BotCommand::Release(action) => self.release.execute(message, &action).await,
            BotCommand::Alive => return self.status.alive(message).await,
            BotCommand::Ping => return self.status.ping(message).await,
            BotCommand::Help => CommandResult::success(help_menu(&self.prefix)),
            BotCommand::PokemonMenu => self.menu(MenuSection::Pokemon),
            BotCommand::AdminMenu => self.menu(MenuSection::Admin),
            BotCommand::List(category) => self.status.list(category.as_deref()),
        };

        Ok(result)
    }

    fn menu(&self, section: MenuSection) -> CommandResult {
        CommandResult::success(section_menu(&self.prefix, section))
    }

    /// Sends a result where its delivery says.
    ///
    /// An edit to identical text is not an error.
    async fn deliver(&self, command: &ChatMessage, result: &CommandResult) {
        let (chat, id, text) = (command.chat, command.id, result.message.as_str());

        let outcome = match result.delivery {
            Delivery::Silent => return,
            Delivery::Edit => self.api.edit_message(chat, id, text).await,
            Delivery::Reply => self.api.reply_to(chat, id, text).await.map(|_| ()),
            Delivery::Respond => self.api.send_message(chat, text).await.map(|_| ()),
        };

        match outcome {
            Ok(()) | Err(TelegramError::NotModified) => {}
            Err(e) => error!("Failed to deliver response to message {}: {}", id, e),
        }
    }
}

impl std::fmt::Debug for CommandHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandHandler")
            .field("prefix", &self.prefix)
            .finish_non_exhaustive()
    }
}
