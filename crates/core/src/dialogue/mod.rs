pub mod engine;
pub mod keywords;
pub mod matcher;

pub use engine::{DialogueEngine, EngineDeps};
pub use keywords::{classify_confirmation, ConfirmationIntent};
pub use matcher::resolve;
