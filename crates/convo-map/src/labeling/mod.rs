//! Topic labeling: prompt construction and the batched labeling run

mod orchestrator;
mod prompt;

pub use orchestrator::{RunOutcome, TopicLabeler, RUN_FAILED_MESSAGE};
pub use prompt::PromptBuilder;
