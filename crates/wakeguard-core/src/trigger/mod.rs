mod engine;
mod session;

pub use engine::{CompletedRinging, PendingSnooze, TriggerScheduler, TriggerState};
pub use session::RingingSession;
