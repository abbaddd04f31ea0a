mod api;
mod progress;
mod session;
mod workflow;

pub use api::{AttemptApi, HttpAttemptApi, LocalAttemptApi, StartedAttempt, SubmissionReceipt};
pub use progress::{AttemptProgress, PaletteEntry, QuestionStatus};
pub use session::{AttemptConfig, AttemptPhase, AttemptSession};
pub use workflow::AttemptLoopService;
