//! Automated Pokémon release.
//!
//! A background loop drives the game bot's `/release` dialog for every name
//! on the worklist of the chat where automation was started.

mod manager;
mod runner;
mod state;

pub use manager::ReleaseManager;
pub use runner::ReleaseRunner;
pub use state::{ReleaseState, ReleaseTimings};
