//! Feature handlers invoked by the command dispatcher.

mod moderation;
mod purge;
mod spam;
mod status;

pub use moderation::ModerationManager;
pub use purge::PurgeManager;
pub use spam::SpamManager;
pub use status::{HostStats, StatusReporter};
