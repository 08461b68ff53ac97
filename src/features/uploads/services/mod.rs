mod orchestrator;

pub use orchestrator::{AuthorizedUpload, UploadLimits, UploadOrchestrator};
