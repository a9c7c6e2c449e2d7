pub mod archive;
pub mod orchestrator;

pub use archive::Archive;
pub use orchestrator::{ImportOrchestrator, ImportReport};
