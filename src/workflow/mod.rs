pub mod job_ctx;
pub mod step_machine;
pub mod step_tracker;

pub use job_ctx::JobCtx;
pub use step_machine::{JobOutcome, StepMachine};
pub use step_tracker::StepTracker;
