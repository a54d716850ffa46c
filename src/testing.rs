//! In-memory [`ChatApi`] used by the unit tests.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::telegram::{
    AdminRights, ChatApi, ChatId, ChatMessage, InlineButton, MessageId, TelegramError, UserId,
};

/// Account the fake is logged in as.
pub const SELF_ID: UserId = UserId(1);

/// Sender of scripted bot responses.
pub const GAME_BOT_ID: UserId = UserId(999);

/// Every call the fake received, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Send { chat: ChatId, text: String },
    Reply { chat: ChatId, to: MessageId, text: String },
    Edit { chat: ChatId, message: MessageId, text: String },
    Delete { chat: ChatId, ids: Vec<MessageId> },
    Click { chat: ChatId, message: MessageId, button: String },
    ViewMessages { chat: ChatId, user: UserId, allowed: bool },
    AdminRights { chat: ChatId, user: UserId, rights: AdminRights, rank: String },
}

/// Operations that can be made to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    Send,
    Edit,
    Delete,
    Latest,
    ViewMessages,
    AdminRights,
}

/// What the scripted game bot sees.
#[derive(Debug)]
pub enum Event<'a> {
    Sent(&'a str),
    Clicked(&'a str),
}

type Responder = Box<dyn Fn(Event<'_>) -> Option<(String, Vec<Vec<InlineButton>>)> + Send + Sync>;

#[derive(Default)]
struct FakeState {
    messages: Vec<ChatMessage>,
    next_id: i32,
    calls: Vec<Call>,
    failures: HashMap<Op, fn() -> TelegramError>,
    responder: Option<Responder>,
}

/// Recording chat backend with a tiny message store.
#[derive(Default)]
pub struct FakeChat {
    state: Mutex<FakeState>,
}

impl FakeChat {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a message and returns it.
    pub fn push_message(
        &self,
        chat: ChatId,
        sender: UserId,
        text: &str,
        reply_to: Option<MessageId>,
    ) -> ChatMessage {
        let mut state = self.state.lock();
        Self::store(&mut state, chat, sender, text, reply_to, Vec::new())
    }

    /// Makes every call of `op` fail with the produced error.
    pub fn fail(&self, op: Op, err: fn() -> TelegramError) {
        self.state.lock().failures.insert(op, err);
    }

    /// Makes `op` succeed again.
    pub fn heal(&self, op: Op) {
        self.state.lock().failures.remove(&op);
    }

    /// Installs a scripted bot that answers sends and clicks.
    pub fn respond_with(
        &self,
        responder: impl Fn(Event<'_>) -> Option<(String, Vec<Vec<InlineButton>>)>
        + Send
        + Sync
        + 'static,
    ) {
        self.state.lock().responder = Some(Box::new(responder));
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().calls.clone()
    }

    pub fn sent_texts(&self, chat: ChatId) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Send { chat: c, text } if c == chat => Some(text),
                _ => None,
            })
            .collect()
    }

    pub fn deleted_ids(&self, chat: ChatId) -> Vec<MessageId> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Delete { chat: c, ids } if c == chat => Some(ids),
                _ => None,
            })
            .flatten()
            .collect()
    }

    pub fn edits(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Edit { text, .. } => Some(text),
                _ => None,
            })
            .collect()
    }

    pub fn replies(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Reply { text, .. } => Some(text),
                _ => None,
            })
            .collect()
    }

    pub fn permission_calls(&self) -> usize {
        self.calls()
            .iter()
            .filter(|call| matches!(call, Call::ViewMessages { .. } | Call::AdminRights { .. }))
            .count()
    }

    /// Messages still present in the chat, oldest first.
    pub fn messages(&self, chat: ChatId) -> Vec<ChatMessage> {
        self.state
            .lock()
            .messages
            .iter()
            .filter(|m| m.chat == chat)
            .cloned()
            .collect()
    }

    fn store(
        state: &mut FakeState,
        chat: ChatId,
        sender: UserId,
        text: &str,
        reply_to: Option<MessageId>,
        buttons: Vec<Vec<InlineButton>>,
    ) -> ChatMessage {
        state.next_id += 1;
        let message = ChatMessage {
            id: MessageId(state.next_id),
            chat,
            sender: Some(sender),
            text: text.to_owned(),
            outgoing: sender == SELF_ID,
            reply_to,
            buttons,
        };
        state.messages.push(message.clone());
        message
    }

    fn check(state: &FakeState, op: Op) -> Result<(), TelegramError> {
        state.failures.get(&op).map_or(Ok(()), |make| Err(make()))
    }

    fn run_responder(state: &mut FakeState, chat: ChatId, event: Event<'_>) {
        let answer = state.responder.as_ref().and_then(|respond| respond(event));
        if let Some((text, buttons)) = answer {
            Self::store(state, chat, GAME_BOT_ID, &text, None, buttons);
        }
    }
}

#[async_trait]
impl ChatApi for FakeChat {
    async fn send_message(&self, chat: ChatId, text: &str) -> Result<MessageId, TelegramError> {
        let mut state = self.state.lock();
        Self::check(&state, Op::Send)?;
        state.calls.push(Call::Send {
            chat,
            text: text.to_owned(),
        });
        let sent = Self::store(&mut state, chat, SELF_ID, text, None, Vec::new());
        Self::run_responder(&mut state, chat, Event::Sent(text));
        Ok(sent.id)
    }

    async fn reply_to(
        &self,
        chat: ChatId,
        message: MessageId,
        text: &str,
    ) -> Result<MessageId, TelegramError> {
        let mut state = self.state.lock();
        Self::check(&state, Op::Send)?;
        state.calls.push(Call::Reply {
            chat,
            to: message,
            text: text.to_owned(),
        });
        Ok(Self::store(&mut state, chat, SELF_ID, text, Some(message), Vec::new()).id)
    }

    async fn edit_message(
        &self,
        chat: ChatId,
        message: MessageId,
        text: &str,
    ) -> Result<(), TelegramError> {
        let mut state = self.state.lock();
        Self::check(&state, Op::Edit)?;
        state.calls.push(Call::Edit {
            chat,
            message,
            text: text.to_owned(),
        });
        if let Some(stored) = state
            .messages
            .iter_mut()
            .find(|m| m.chat == chat && m.id == message)
        {
            stored.text = text.to_owned();
        }
        Ok(())
    }

    async fn delete_messages(
        &self,
        chat: ChatId,
        ids: &[MessageId],
    ) -> Result<usize, TelegramError> {
        let mut state = self.state.lock();
        Self::check(&state, Op::Delete)?;
        state.calls.push(Call::Delete {
            chat,
            ids: ids.to_vec(),
        });
        let before = state.messages.len();
        state
            .messages
            .retain(|m| !(m.chat == chat && ids.contains(&m.id)));
        Ok(before - state.messages.len())
    }

    async fn get_message(
        &self,
        chat: ChatId,
        id: MessageId,
    ) -> Result<Option<ChatMessage>, TelegramError> {
        let state = self.state.lock();
        Ok(state
            .messages
            .iter()
            .find(|m| m.chat == chat && m.id == id)
            .cloned())
    }

    async fn latest_message(&self, chat: ChatId) -> Result<Option<ChatMessage>, TelegramError> {
        let state = self.state.lock();
        Self::check(&state, Op::Latest)?;
        Ok(state.messages.iter().rev().find(|m| m.chat == chat).cloned())
    }

    async fn message_ids_since(
        &self,
        chat: ChatId,
        first: MessageId,
    ) -> Result<Vec<MessageId>, TelegramError> {
        let state = self.state.lock();
        Ok(state
            .messages
            .iter()
            .filter(|m| m.chat == chat && m.id >= first)
            .map(|m| m.id)
            .collect())
    }

    async fn messages_by(
        &self,
        chat: ChatId,
        sender: UserId,
        limit: usize,
    ) -> Result<Vec<ChatMessage>, TelegramError> {
        let state = self.state.lock();
        Ok(state
            .messages
            .iter()
            .rev()
            .filter(|m| m.chat == chat && m.sender == Some(sender))
            .take(limit)
            .cloned()
            .collect())
    }

    async fn click_button(
        &self,
        message: &ChatMessage,
        button: &InlineButton,
    ) -> Result<(), TelegramError> {
        let mut state = self.state.lock();
        state.calls.push(Call::Click {
            chat: message.chat,
            message: message.id,
            button: button.text.clone(),
        });
        Self::run_responder(&mut state, message.chat, Event::Clicked(&button.text));
        Ok(())
    }

    async fn set_view_messages(
        &self,
        chat: ChatId,
        user: UserId,
        allowed: bool,
    ) -> Result<(), TelegramError> {
        let mut state = self.state.lock();
        Self::check(&state, Op::ViewMessages)?;
        state.calls.push(Call::ViewMessages {
            chat,
            user,
            allowed,
        });
        Ok(())
    }

    async fn set_admin_rights(
        &self,
        chat: ChatId,
        user: UserId,
        rights: AdminRights,
        rank: &str,
    ) -> Result<(), TelegramError> {
        let mut state = self.state.lock();
        Self::check(&state, Op::AdminRights)?;
        state.calls.push(Call::AdminRights {
            chat,
            user,
            rights,
            rank: rank.to_owned(),
        });
        Ok(())
    }
}
