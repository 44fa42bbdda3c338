mod error;
mod llm;
pub mod capture;
pub mod digest;
pub mod pages;
pub mod processor;
pub mod render;
pub mod subtitle;
pub mod tracing;
pub mod tts;
pub mod types;
pub mod video;

pub use error::Error;
pub use llm::composer::{ComposedPage, PageComposer};
pub use llm::openai;
pub use processor::{builder::ReelProcessorBuilder, ReelProcessor};
pub use tts::{minimax, NarrationResult, NarrationScript, Narrator, ScriptSection};
