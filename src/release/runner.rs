//! Release automation loop.
//!
//! Each pass walks a sorted snapshot of the worklist:
//! 1. Send `/release <name>` and wait for the game bot
//! 2. Click the first button of its answer (the Pokémon to release)
//! 3. Click the first button labelled "Release" on the confirmation
//! 4. On success drop the name from the worklist
//!
//! An answer without buttons, or a confirmation without a "Release" button,
//! leaves the name in place for the next pass. Errors abort the pass and the
//! loop retries after a flat delay until it is cancelled.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::{ReleaseState, ReleaseTimings};
use crate::telegram::{ChatApi, ChatId, TelegramError};

/// Label of the confirmation button.
const CONFIRM_LABEL: &str = "Release";

/// How a single release attempt ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Released,
    Stalled,
}

/// Drives the release cycle in the bound chat.
#[derive(Clone)]
pub struct ReleaseRunner {
    api: Arc<dyn ChatApi>,
    state: Arc<RwLock<ReleaseState>>,
    timings: ReleaseTimings,
}

impl ReleaseRunner {
    #[must_use]
    pub fn new(
        api: Arc<dyn ChatApi>,
        state: Arc<RwLock<ReleaseState>>,
        timings: ReleaseTimings,
    ) -> Self {
        Self {
            api,
            state,
            timings,
        }
    }

    /// Runs until cancelled, stopped, or left without a chat.
    pub async fn run(&self, cancel: CancellationToken) {
        info!("Release loop started");

        loop {
            let chat = {
                let state = self.state.read().await;
                if !state.is_running() {
                    break;
                }
                state.current_chat()
            };

            let Some(chat) = chat else {
                warn!("No active chat for release, stopping");
                self.state.write().await.stop();
                break;
            };

            let pass = tokio::select! {
                result = self.pass(chat) => result,
                () = cancel.cancelled() => break,
            };

            if let Err(e) = pass {
                error!("Release pass in chat {} failed: {}", chat, e);
                if !Self::pause(&cancel, self.timings.retry_delay).await {
                    break;
                }
            }
        }

        info!("Release loop stopped");
    }

    /// One walk over the worklist.
    async fn pass(&self, chat: ChatId) -> Result<(), TelegramError> {
        let names = self.state.read().await.names();

        if names.is_empty() {
            tokio::time::sleep(self.timings.item_gap).await;
            return Ok(());
        }

        for name in names {
            match self.release_one(chat, &name).await? {
                Outcome::Released => {
                    self.state.write().await.remove(&name);
                    info!("{} released", name);
                }
                Outcome::Stalled => debug!("{} kept for the next pass", name),
            }
            tokio::time::sleep(self.timings.item_gap).await;
        }

        Ok(())
    }

    async fn release_one(&self, chat: ChatId, name: &str) -> Result<Outcome, TelegramError> {
        self.api
            .send_message(chat, &format!("/release {name}"))
            .await?;
        tokio::time::sleep(self.timings.response_wait).await;

        let Some(selection) = self.api.latest_message(chat).await? else {
            return Ok(Outcome::Stalled);
        };
        let Some(pick) = selection.first_button() else {
            warn!("No buttons found for {}", name);
            return Ok(Outcome::Stalled);
        };
        self.api.click_button(&selection, pick).await?;
        tokio::time::sleep(self.timings.selection_wait).await;

        let Some(confirmation) = self.api.latest_message(chat).await? else {
            return Ok(Outcome::Stalled);
        };
        let Some(confirm) = confirmation.find_button(CONFIRM_LABEL) else {
            warn!("No \"{}\" button found for {}", CONFIRM_LABEL, name);
            return Ok(Outcome::Stalled);
        };
        self.api.click_button(&confirmation, confirm).await?;
        tokio::time::sleep(self.timings.confirm_wait).await;

        Ok(Outcome::Released)
    }

    /// Sleeps unless cancelled first. Returns false on cancellation.
    async fn pause(cancel: &CancellationToken, delay: Duration) -> bool {
        tokio::select! {
            () = tokio::time::sleep(delay) => true,
            () = cancel.cancelled() => false,
        }
    }
}

impl std::fmt::Debug for ReleaseRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReleaseRunner")
            .field("timings", &self.timings)
            .finish_non_exhaustive()
    }
}
