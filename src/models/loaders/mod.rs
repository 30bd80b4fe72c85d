pub mod batch_loader;
pub mod reference_loader;

pub use batch_loader::{load_batch_file, BatchFile};
pub use reference_loader::load_reference_folder;
