//! Telegram client wrapper implementing [`ChatApi`] on top of grammers.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use grammers_client::client::{LoginToken, PasswordToken, UpdateStream, UpdatesConfiguration};
use grammers_client::message::{InputMessage, Message};
use grammers_client::update::Update;
use grammers_client::{
    Client, InvocationError, SenderPool, SignInError, sender,
};
use grammers_session::storages::SqliteSession;
use grammers_session::types::PeerRef;
use grammers_tl_types as tl;
use thiserror::Error;
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::api::ChatApi;
use super::types::{AdminRights, ChatId, ChatMessage, InlineButton, MessageId, UserId};
use super::RateLimiter;
use crate::config::TelegramConfig;

/// Re-export types for external use.
pub use grammers_client::client::{LoginToken as Token, PasswordToken as PwdToken};

/// Errors that can occur during Telegram operations.
#[derive(Debug, Error)]
pub enum TelegramError {
    #[error("Sign in failed: {0}")]
    SignInFailed(String),

    #[error("Password required for 2FA")]
    PasswordRequired(PasswordToken),

    #[error("Invalid password")]
    InvalidPassword(PasswordToken),

    #[error("Admin rights are required in this chat")]
    AdminRequired,

    #[error("Deleting this message is forbidden")]
    DeleteForbidden,

    #[error("Message was not modified")]
    NotModified,

    #[error("Peer {0} has not been seen yet")]
    UnknownPeer(i64),

    #[error("Button \"{0}\" has no callback data")]
    UnsupportedButton(String),

    #[error("Flood wait required: {0} seconds")]
    FloodWait(u32),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Session error: {0}")]
    Session(String),

    #[error("API invocation error: {0}")]
    Invocation(String),
}

impl TelegramError {
    /// Returns true if the error means the account lacks moderation rights.
    #[must_use]
    pub const fn is_permission_error(&self) -> bool {
        matches!(self, Self::AdminRequired | Self::DeleteForbidden)
    }
}

impl From<InvocationError> for TelegramError {
    fn from(err: InvocationError) -> Self {
        classify_rpc_error(&err.to_string())
    }
}

/// Maps an RPC error message onto a [`TelegramError`] variant.
fn classify_rpc_error(err_str: &str) -> TelegramError {
    if (err_str.contains("FLOOD_WAIT") || err_str.contains("flood"))
        && let Some(seconds) = extract_flood_wait_seconds(err_str)
    {
        return TelegramError::FloodWait(seconds);
    }

    if err_str.contains("CHAT_ADMIN_REQUIRED") || err_str.contains("RIGHT_FORBIDDEN") {
        return TelegramError::AdminRequired;
    }
    if err_str.contains("MESSAGE_DELETE_FORBIDDEN") {
        return TelegramError::DeleteForbidden;
    }
    if err_str.contains("MESSAGE_NOT_MODIFIED") {
        return TelegramError::NotModified;
    }

    TelegramError::Invocation(err_str.to_owned())
}

/// Extracts flood wait seconds from an error message, ignoring ASCII case.
fn extract_flood_wait_seconds(err_msg: &str) -> Option<u32> {
    let lowered = err_msg.to_ascii_lowercase();

    ["flood_wait_", "flood wait "].into_iter().find_map(|pattern| {
        let start = lowered.find(pattern)? + pattern.len();
        let num_str: String = lowered[start..]
            .chars()
            .take_while(char::is_ascii_digit)
            .collect();
        num_str.parse().ok()
    })
}

/// Returns true if a callback error still means the press reached the bot.
fn click_was_delivered(err_msg: &str) -> bool {
    err_msg.contains("BOT_RESPONSE_TIMEOUT")
}

/// Upper bound on messages read while looking for one sender's messages.
const MAX_HISTORY_SCAN: usize = 3_000;

/// How many history messages to read for `limit` matches.
fn history_scan_budget(limit: usize) -> usize {
    limit.saturating_mul(20).clamp(500, MAX_HISTORY_SCAN)
}

/// Access-hash bearing references keyed by bare peer id.
///
/// The lock is only taken for map access, never while a reference is
/// being resolved.
#[derive(Debug)]
struct PeerCache<R> {
    refs: RwLock<HashMap<i64, R>>,
}

impl<R: Copy> PeerCache<R> {
    fn new() -> Self {
        Self {
            refs: RwLock::new(HashMap::new()),
        }
    }

    /// Stores every entry whose id and reference are both known.
    async fn remember(&self, resolved: impl IntoIterator<Item = (Option<i64>, Option<R>)>) {
        let entries: Vec<(i64, R)> = resolved
            .into_iter()
            .filter_map(|(id, peer)| Some((id?, peer?)))
            .collect();

        if !entries.is_empty() {
            self.refs.write().await.extend(entries);
        }
    }

    async fn get(&self, id: i64) -> Result<R, TelegramError> {
        self.refs
            .read()
            .await
            .get(&id)
            .copied()
            .ok_or(TelegramError::UnknownPeer(id))
    }
}

/// High-level Telegram client wrapper.
pub struct TelegramBot {
    /// The underlying grammers client.
    client: Client,

    /// Handle to the sender pool for disconnection.
    handle: sender::SenderPoolHandle,

    /// Spacing for outgoing sends, also absorbs flood waits.
    rate_limiter: RateLimiter,

    /// References of every chat and sender seen so far, live or fetched.
    peers: PeerCache<PeerRef>,

    /// Update stream, handed out once to the update loop.
    updates: Mutex<Option<UpdateStream>>,

    /// Background task running the sender pool.
    _pool_task: JoinHandle<()>,
}

impl TelegramBot {
    /// Connects to Telegram with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if connection fails.
    pub async fn connect(
        config: &TelegramConfig,
        min_send_interval: Duration,
    ) -> Result<Self, TelegramError> {
        info!("Connecting to Telegram...");

        let session = Arc::new(
            SqliteSession::open(&config.session_path)
                .await
                .map_err(|e| TelegramError::Session(e.to_string()))?,
        );

        let SenderPool {
            runner,
            updates,
            handle,
        } = SenderPool::new(Arc::clone(&session), config.api_id);

        let client = Client::new(handle.clone());

        // Spawn the sender pool runner
        let pool_task = tokio::spawn(async move {
            runner.run().await;
        });

        let is_authorized = client
            .is_authorized()
            .await
            .map_err(|e| TelegramError::Connection(e.to_string()))?;

        info!("Connected to Telegram. Authorized: {}", is_authorized);

        let stream = client.stream_updates(
            updates,
            UpdatesConfiguration {
                catch_up: false,
                ..Default::default()
            },
        )
        .await
        .map_err(|e| TelegramError::Connection(e.to_string()))?;

        Ok(Self {
            client,
            handle: handle.thin,
            rate_limiter: RateLimiter::new(min_send_interval),
            peers: PeerCache::new(),
            updates: Mutex::new(Some(stream)),
            _pool_task: pool_task,
        })
    }

    /// Checks if the client is authorized.
    ///
    /// # Errors
    ///
    /// Returns an error if the check fails.
    pub async fn is_authorized(&self) -> Result<bool, TelegramError> {
        self.client
            .is_authorized()
            .await
            .map_err(|e| TelegramError::Connection(e.to_string()))
    }

    /// Requests a login code to be sent to the phone number.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn request_login_code(
        &self,
        phone: &str,
        api_hash: &str,
    ) -> Result<LoginToken, TelegramError> {
        info!("Requesting login code for phone: {}...", mask_phone(phone));

        self.client
            .request_login_code(phone, api_hash)
            .await
            .map_err(|e| TelegramError::SignInFailed(e.to_string()))
    }

    /// Signs in with the login code.
    ///
    /// # Errors
    ///
    /// Returns an error if sign in fails.
    pub async fn sign_in(&self, token: &LoginToken, code: &str) -> Result<(), TelegramError> {
        info!("Signing in with login code...");

        match self.client.sign_in(token, code).await {
            Ok(_user) => {
                info!("Successfully signed in!");
                Ok(())
            }
            Err(SignInError::PasswordRequired(password_token)) => {
                debug!("2FA password required, hint: {:?}", password_token.hint());
                Err(TelegramError::PasswordRequired(password_token))
            }
            Err(SignInError::InvalidCode) => {
                Err(TelegramError::SignInFailed("Invalid code".to_owned()))
            }
            Err(e) => Err(TelegramError::SignInFailed(e.to_string())),
        }
    }

    /// Checks the 2FA password.
    ///
    /// # Errors
    ///
    /// Returns an error if the password is invalid.
    pub async fn check_password(
        &self,
        password_token: PasswordToken,
        password: &str,
    ) -> Result<(), TelegramError> {
        info!("Checking 2FA password...");

        match self.client.check_password(password_token, password).await {
            Ok(_user) => {
                info!("Successfully authenticated with 2FA!");
                Ok(())
            }
            Err(SignInError::InvalidPassword(token)) => Err(TelegramError::InvalidPassword(token)),
            Err(e) => Err(TelegramError::SignInFailed(e.to_string())),
        }
    }

    /// Waits for the next new-message update.
    ///
    /// Peers of every message are remembered so later commands can address
    /// them by bare id. Returns `Ok(None)` once the stream has been closed.
    ///
    /// # Errors
    ///
    /// Returns an error if the update stream fails.
    pub async fn next_message(&self) -> Result<Option<ChatMessage>, TelegramError> {
        let mut guard = self.updates.lock().await;
        let Some(stream) = guard.as_mut() else {
            return Ok(None);
        };

        loop {
            match stream.next().await? {
                Update::NewMessage(message) => return Ok(Some(self.adopt(&message).await)),
                other => debug!("Ignoring update: {:?}", std::mem::discriminant(&other)),
            }
        }
    }

    /// Closes the update stream; pending [`next_message`](Self::next_message) calls return `None`.
    pub async fn close_updates(&self) {
        self.updates.lock().await.take();
    }

    /// Disconnects from Telegram.
    pub fn disconnect(&self) {
        info!("Disconnecting from Telegram...");
        self.handle.quit();
    }

    /// Converts a message received from Telegram, remembering its chat and
    /// sender so they can later be addressed by bare id.
    async fn adopt(&self, message: &Message) -> ChatMessage {
        let chat_ref = match message.peer() {
            Some(peer) => peer.to_ref().await.ok().flatten(),
            None => None,
        };
        let (sender_id, sender_ref) = match message.sender() {
            Some(sender) => (sender.id().bare_id(), sender.to_ref().await.ok().flatten()),
            None => (None, None),
        };

        self.peers
            .remember([
                (message.peer_id().bare_id(), chat_ref),
                (sender_id, sender_ref),
            ])
            .await;

        to_chat_message(message)
    }

    async fn peer(&self, id: i64) -> Result<PeerRef, TelegramError> {
        self.peers.get(id).await
    }

    async fn guard_flood<T>(
        &self,
        result: Result<T, InvocationError>,
    ) -> Result<T, TelegramError> {
        match result {
            Ok(value) => Ok(value),
            Err(e) => {
                let err: TelegramError = e.into();
                if let TelegramError::FloodWait(seconds) = &err {
                    warn!("Flood wait triggered: {} seconds", seconds);
                    self.rate_limiter.handle_flood_wait(*seconds).await;
                }
                Err(err)
            }
        }
    }
}

#[async_trait]
impl ChatApi for TelegramBot {
    async fn send_message(&self, chat: ChatId, text: &str) -> Result<MessageId, TelegramError> {
        let peer = self.peer(chat.0).await?;
        self.rate_limiter.wait_and_acquire().await;

        debug!("Sending to {}: \"{}\"", chat, truncate_for_log(text, 30));
        let result = self.client.send_message(peer, text).await;
        let sent = self.guard_flood(result).await?;
        Ok(MessageId(sent.id()))
    }

    async fn reply_to(
        &self,
        chat: ChatId,
        message: MessageId,
        text: &str,
    ) -> Result<MessageId, TelegramError> {
        let peer = self.peer(chat.0).await?;
        self.rate_limiter.wait_and_acquire().await;

        let input = InputMessage::new().text(text).reply_to(Some(message.0));
        let result = self.client.send_message(peer, input).await;
        let sent = self.guard_flood(result).await?;
        Ok(MessageId(sent.id()))
    }

    async fn edit_message(
        &self,
        chat: ChatId,
        message: MessageId,
        text: &str,
    ) -> Result<(), TelegramError> {
        let peer = self.peer(chat.0).await?;
        let result = self.client.edit_message(peer, message.0, text).await;
        self.guard_flood(result).await
    }

    async fn delete_messages(
        &self,
        chat: ChatId,
        ids: &[MessageId],
    ) -> Result<usize, TelegramError> {
        let peer = self.peer(chat.0).await?;
        let raw: Vec<i32> = ids.iter().map(|id| id.0).collect();
        let result = self.client.delete_messages(peer, &raw).await;
        self.guard_flood(result).await
    }

    async fn get_message(
        &self,
        chat: ChatId,
        id: MessageId,
    ) -> Result<Option<ChatMessage>, TelegramError> {
        let peer = self.peer(chat.0).await?;
        let mut found = self.client.get_messages_by_id(peer, &[id.0]).await?;
        match found.pop().flatten() {
            Some(message) => Ok(Some(self.adopt(&message).await)),
            None => Ok(None),
        }
    }

    async fn latest_message(&self, chat: ChatId) -> Result<Option<ChatMessage>, TelegramError> {
        let peer = self.peer(chat.0).await?;
        let mut iter = self.client.iter_messages(peer).limit(1);
        match iter.next().await? {
            Some(message) => Ok(Some(self.adopt(&message).await)),
            None => Ok(None),
        }
    }

    async fn message_ids_since(
        &self,
        chat: ChatId,
        first: MessageId,
    ) -> Result<Vec<MessageId>, TelegramError> {
        let peer = self.peer(chat.0).await?;
        let mut iter = self.client.iter_messages(peer);
        let mut ids = Vec::new();

        while let Some(message) = iter.next().await? {
            if message.id() < first.0 {
                break;
            }
            ids.push(MessageId(message.id()));
        }

        ids.reverse();
        Ok(ids)
    }

    async fn messages_by(
        &self,
        chat: ChatId,
        sender: UserId,
        limit: usize,
    ) -> Result<Vec<ChatMessage>, TelegramError> {
        let peer = self.peer(chat.0).await?;
        let budget = history_scan_budget(limit);
        let mut iter = self.client.iter_messages(peer).limit(budget);
        let mut found = Vec::new();

        while found.len() < limit
            && let Some(message) = iter.next().await?
        {
            if message.sender_id().and_then(|id| id.bare_id()) == Some(sender.0) {
                found.push(self.adopt(&message).await);
            }
        }

        if found.len() < limit {
            debug!(
                "Found {}/{} messages by {} within the last {} of chat {}",
                found.len(),
                limit,
                sender,
                budget,
                chat
            );
        }
        Ok(found)
    }

    async fn click_button(
        &self,
        message: &ChatMessage,
        button: &InlineButton,
    ) -> Result<(), TelegramError> {
        let Some(data) = button.data.clone() else {
            return Err(TelegramError::UnsupportedButton(button.text.clone()));
        };
        let peer = self.peer(message.chat.0).await?;

        debug!("Clicking \"{}\" on message {}", button.text, message.id);
        let request = tl::functions::messages::GetBotCallbackAnswer {
            game: false,
            peer: peer.into(),
            msg_id: message.id.0,
            data: Some(data),
            password: None,
        };

        match self.client.invoke(&request).await {
            Ok(_answer) => Ok(()),
            Err(e) if click_was_delivered(&e.to_string()) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    async fn set_view_messages(
        &self,
        chat: ChatId,
        user: UserId,
        allowed: bool,
    ) -> Result<(), TelegramError> {
        let chat_ref = self.peer(chat.0).await?;
        let user_ref = self.peer(user.0).await?;

        self.client
            .set_banned_rights(chat_ref, user_ref)
            .view_messages(allowed)
            .await?;
        Ok(())
    }

    async fn set_admin_rights(
        &self,
        chat: ChatId,
        user: UserId,
        rights: AdminRights,
        rank: &str,
    ) -> Result<(), TelegramError> {
        let chat_ref = self.peer(chat.0).await?;
        let user_ref = self.peer(user.0).await?;

        self.client
            .set_admin_rights(chat_ref, user_ref)
            .post_messages(rights.post_messages)
            .delete_messages(rights.delete_messages)
            .ban_users(rights.ban_users)
            .invite_users(rights.invite_users)
            .change_info(rights.change_info)
            .pin_messages(rights.pin_messages)
            .rank(rank)
            .await?;
        Ok(())
    }
}

impl std::fmt::Debug for TelegramBot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramBot")
            .field("rate_limiter", &self.rate_limiter)
            .finish_non_exhaustive()
    }
}

/// Converts a grammers message into the handler-facing representation.
fn to_chat_message(message: &Message) -> ChatMessage {
    ChatMessage {
        id: MessageId(message.id()),
        chat: ChatId(message.peer_id().bare_id().unwrap_or_default()),
        sender: message
            .sender_id()
            .and_then(|id| id.bare_id())
            .map(UserId),
        text: message.text().to_owned(),
        outgoing: message.outgoing(),
        reply_to: message.reply_to_message_id().map(MessageId),
        buttons: inline_buttons(message.reply_markup()),
    }
}

fn inline_buttons(markup: Option<tl::enums::ReplyMarkup>) -> Vec<Vec<InlineButton>> {
    let Some(tl::enums::ReplyMarkup::ReplyInlineMarkup(markup)) = markup else {
        return Vec::new();
    };

    markup
        .rows
        .into_iter()
        .map(|tl::enums::KeyboardButtonRow::Row(row)| {
            row.buttons.into_iter().map(to_inline_button).collect()
        })
        .collect()
}

fn to_inline_button(button: tl::enums::KeyboardButton) -> InlineButton {
    match button {
        tl::enums::KeyboardButton::Callback(b) => InlineButton {
            text: b.text,
            data: Some(b.data),
        },
        tl::enums::KeyboardButton::Url(b) => InlineButton {
            text: b.text,
            data: None,
        },
        tl::enums::KeyboardButton::Button(b) => InlineButton {
            text: b.text,
            data: None,
        },
        _ => InlineButton {
            text: String::new(),
            data: None,
        },
    }
}

/// Masks a phone number for logging (shows last 4 digits).
fn mask_phone(phone: &str) -> String {
    let digits: String = phone.chars().filter(char::is_ascii_digit).collect();
    if digits.len() > 4 {
        format!("***{}", &digits[digits.len() - 4..])
    } else {
        "****".to_owned()
    }
}

/// Truncates a string for logging purposes.
fn truncate_for_log(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_owned()
    } else {
        format!("{}...", s.chars().take(max_len).collect::<String>())
    }
}
