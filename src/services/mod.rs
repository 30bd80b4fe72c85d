pub mod actions;
pub mod failure_writer;
pub mod job_builder;
pub mod probe;
pub mod reference_matcher;

pub use actions::Actions;
pub use failure_writer::FailureWriter;
pub use job_builder::build_jobs;
pub use probe::{ElementProbe, ProbeOutcome};
pub use reference_matcher::{match_prompt, match_references};
