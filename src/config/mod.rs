//! Configuration module for the Pokémon userbot.
//!
//! Telegram credentials and bot settings come from the environment; the ball
//! catalog is a JSON file checked by the `validate_catalog` binary.

mod catalog;
mod settings;

pub use catalog::{BallCatalog, BallCategory, CatalogError};
pub use settings::{BotSettings, ConfigError, TelegramConfig};
