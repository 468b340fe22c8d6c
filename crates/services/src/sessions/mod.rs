mod plan;
mod progress;
mod service;
mod view;
mod workflow;

// Public API of the session subsystem.
pub use crate::error::SessionError;
pub use plan::SessionPlan;
pub use progress::SessionProgress;
pub use service::{FinishOutcome, SessionState, TestSession, TickOutcome};
pub use view::{SessionEvent, SessionIntent, SessionView};
pub use workflow::SessionLoopService;
