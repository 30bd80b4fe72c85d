pub mod event;
pub mod job;
pub mod loaders;
pub mod reference;
pub mod step;

pub use event::{EventSink, NotificationKind, PanelEvent, Tone};
pub use job::{FilePayload, JobCompletion, JobDescriptor, PromptJob, ReferenceImage};
pub use loaders::{load_batch_file, load_reference_folder, BatchFile};
pub use reference::{ReferenceFile, ReferenceLookup};
pub use step::{Phase, StepBoard, StepStatus, PHASE_COUNT};
