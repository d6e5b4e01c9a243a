pub mod aggregate;
pub mod extract;
mod pipeline;
mod prompts;

pub use pipeline::{AnalysisPipeline, VisionBackend};
pub use prompts::ATTENTION_PROMPT;
