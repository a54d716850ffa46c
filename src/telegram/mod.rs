//! Telegram client wrapper module.
//!
//! Provides the [`ChatApi`] abstraction used by the command handlers, its
//! grammers-backed implementation, authentication helpers, and rate limiting.

mod api;
mod client;
mod rate_limiter;
mod types;

pub use api::ChatApi;
pub use client::{PwdToken as PasswordToken, TelegramBot, TelegramError, Token as LoginToken};
pub use rate_limiter::RateLimiter;
pub use types::{AdminRights, ChatId, ChatMessage, InlineButton, MessageId, UserId};
