//! `release` command family and ownership of the background loop.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::info;

use super::{ReleaseRunner, ReleaseState, ReleaseTimings};
use crate::commands::{CommandResult, MenuSection, ReleaseAction, section_menu};
use crate::telegram::{ChatApi, ChatId, ChatMessage};

struct RunningTask {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

/// Handles the `release` commands and starts or stops the release loop.
pub struct ReleaseManager {
    api: Arc<dyn ChatApi>,
    state: Arc<RwLock<ReleaseState>>,
    timings: ReleaseTimings,
    prefix: String,
    task: Mutex<Option<RunningTask>>,
}

impl ReleaseManager {
    #[must_use]
    pub fn new(api: Arc<dyn ChatApi>, prefix: impl Into<String>) -> Self {
        Self {
            api,
            state: Arc::new(RwLock::new(ReleaseState::new())),
            timings: ReleaseTimings::default(),
            prefix: prefix.into(),
            task: Mutex::new(None),
        }
    }

    /// Overrides the release loop timings.
    #[must_use]
    pub const fn with_timings(mut self, timings: ReleaseTimings) -> Self {
        self.timings = timings;
        self
    }

    pub async fn execute(&self, command: &ChatMessage, action: &ReleaseAction) -> CommandResult {
        match action {
            ReleaseAction::Menu => {
                CommandResult::success(section_menu(&self.prefix, MenuSection::Release))
            }
            ReleaseAction::On => self.start(command.chat).await,
            ReleaseAction::Off => self.stop().await,
            ReleaseAction::Add(name) => self.add(name).await,
            ReleaseAction::Remove(name) => self.remove(name).await,
            ReleaseAction::List => self.list().await,
        }
    }

    /// Starts the loop in `chat` unless it already runs somewhere.
    pub async fn start(&self, chat: ChatId) -> CommandResult {
        if !self.state.write().await.start(chat) {
            return CommandResult::error("Release is already running!");
        }

        let runner = ReleaseRunner::new(Arc::clone(&self.api), Arc::clone(&self.state), self.timings);
        let cancel = CancellationToken::new();
        let handle = tokio::spawn({
            let cancel = cancel.clone();
            async move { runner.run(cancel).await }
        });

        if let Some(previous) = self.task.lock().replace(RunningTask { cancel, handle }) {
            previous.cancel.cancel();
            previous.handle.abort();
        }

        info!("Release automation started in chat {}", chat);
        CommandResult::success("Pokémon auto-release started in this chat!")
    }

    /// Stops the loop and unbinds its chat.
    pub async fn stop(&self) -> CommandResult {
        let was_running = self.state.write().await.stop();

        if let Some(task) = self.task.lock().take() {
            task.cancel.cancel();
            task.handle.abort();
        }

        if was_running {
            info!("Release automation stopped");
            CommandResult::success("Pokémon auto-release stopped!")
        } else {
            CommandResult::error("No active release process.")
        }
    }

    async fn add(&self, name: &str) -> CommandResult {
        let Some(name) = normalize(name) else {
            return CommandResult::error(format!("**Usage:** `{}release add <pokemon>`", self.prefix));
        };
        self.state.write().await.add(&name);
        CommandResult::success(format!("**{}** added to the release list!", capitalize(&name)))
    }

    async fn remove(&self, name: &str) -> CommandResult {
        let Some(name) = normalize(name) else {
            return CommandResult::error(format!(
                "**Usage:** `{}release remove <pokemon>`",
                self.prefix
            ));
        };
        if self.state.write().await.remove(&name) {
            CommandResult::success(format!("**{}** removed from the release list!", capitalize(&name)))
        } else {
            CommandResult::error(format!("**{}** is not in the release list.", capitalize(&name)))
        }
    }

    async fn list(&self) -> CommandResult {
        let names = self.state.read().await.names();
        if names.is_empty() {
            CommandResult::success("Your release list is empty!")
        } else {
            CommandResult::success(format!("**Pokémon set for release:**\n{}", names.join(", ")))
        }
    }

    pub async fn is_running(&self) -> bool {
        self.state.read().await.is_running()
    }

    pub async fn current_chat(&self) -> Option<ChatId> {
        self.state.read().await.current_chat()
    }

    pub async fn names(&self) -> Vec<String> {
        self.state.read().await.names()
    }
}

impl std::fmt::Debug for ReleaseManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReleaseManager")
            .field("timings", &self.timings)
            .field("prefix", &self.prefix)
            .finish_non_exhaustive()
    }
}

fn normalize(name: &str) -> Option<String> {
    let name = name.trim();
    (!name.is_empty()).then(|| name.to_lowercase())
}

/// Upper-cases the first character and lower-cases the rest.
fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect()
    })
}
