//! Plain data types shared by the chat API and the command handlers.

use std::fmt;

/// Bare Telegram chat identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ChatId(pub i64);

/// Bare Telegram user identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct UserId(pub i64);

/// Message identifier, unique within a chat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MessageId(pub i32);

impl fmt::Display for ChatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An inline keyboard button attached to a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineButton {
    /// Label shown to the user.
    pub text: String,

    /// Callback payload; `None` for URL and other non-callback buttons.
    pub data: Option<Vec<u8>>,
}

impl InlineButton {
    /// Creates a callback button.
    #[must_use]
    pub fn callback(text: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        Self {
            text: text.into(),
            data: Some(data.into()),
        }
    }
}

/// A chat message as seen by the handlers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub id: MessageId,
    pub chat: ChatId,
    pub sender: Option<UserId>,
    pub text: String,

    /// Whether the message was sent by the logged-in account.
    pub outgoing: bool,

    /// Message this one replies to.
    pub reply_to: Option<MessageId>,

    /// Inline keyboard, row by row.
    pub buttons: Vec<Vec<InlineButton>>,
}

impl ChatMessage {
    /// Returns the first button of the first non-empty row.
    #[must_use]
    pub fn first_button(&self) -> Option<&InlineButton> {
        self.buttons.iter().flatten().next()
    }

    /// Returns the first button, scanning rows in order, whose label contains `needle`.
    #[must_use]
    pub fn find_button(&self, needle: &str) -> Option<&InlineButton> {
        self.buttons.iter().flatten().find(|b| b.text.contains(needle))
    }
}

/// Administrator rights granted by a promote call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[allow(clippy::struct_excessive_bools)]
pub struct AdminRights {
    pub post_messages: bool,
    pub delete_messages: bool,
    pub ban_users: bool,
    pub invite_users: bool,
    pub change_info: bool,
    pub pin_messages: bool,
}

impl AdminRights {
    /// The bundle granted by `promote`.
    #[must_use]
    pub const fn moderator() -> Self {
        Self {
            post_messages: true,
            delete_messages: true,
            ban_users: true,
            invite_users: true,
            change_info: true,
            pin_messages: true,
        }
    }

    /// No rights at all (used by `demote`).
    #[must_use]
    pub const fn none() -> Self {
        Self {
            post_messages: false,
            delete_messages: false,
            ban_users: false,
            invite_users: false,
            change_info: false,
            pin_messages: false,
        }
    }
}
