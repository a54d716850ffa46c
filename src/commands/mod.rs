//! Command handling module.
//!
//! Parses commands typed by the account owner (default prefix `.`) and
//! dispatches them to the feature handlers.

mod handler;
mod menus;
mod types;

pub use handler::CommandHandler;
pub use menus::{help_menu, section_menu};
pub use types::{BotCommand, CommandResult, Delivery, MenuSection, ModerationAction, ReleaseAction};
