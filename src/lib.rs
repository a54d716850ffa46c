//! Pokémon User Bot Library
//!
//! A Telegram userbot for chat moderation and Pokémon game automation.
//!
//! This crate provides the core functionality for:
//! - Parsing and dispatching commands typed by the account owner
//! - Muting, banning, kicking and promoting chat members
//! - Purging and spamming messages
//! - Driving the game bot's release dialog in the background
//! - Connecting to Telegram via `MTProto`

pub mod commands;
pub mod config;
pub mod handlers;
pub mod release;
pub mod state;
pub mod telegram;

#[cfg(test)]
mod testing;
