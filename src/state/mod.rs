//! In-memory state shared between command invocations.
//!
//! Nothing here is persisted; every record is lost on restart.

mod chat;
mod spam;

pub use chat::ChatStateRegistry;
pub use spam::{SpamGuard, SpamRegistry};
