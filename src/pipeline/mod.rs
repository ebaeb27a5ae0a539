//! Retrieval-augmented reply pipeline.

pub mod composer;
pub mod summarizer;
pub mod types;

pub use composer::{ComposerConfig, MEMORY_DELIMITER, ReplyComposer};
pub use summarizer::SummaryWriter;
pub use types::{InboundEmail, UNKNOWN_SENDER};
