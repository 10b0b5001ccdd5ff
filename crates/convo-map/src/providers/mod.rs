//! Provider abstractions for labeling models and label persistence
//!
//! Trait-based seams that allow switching between a local (Ollama) and a
//! hosted (OpenAI-compatible) labeling backend, and that let the orchestrator
//! run against any store.

pub mod label_store;
pub mod labeler;
pub mod ollama;
pub mod openai;

pub use label_store::LabelStore;
pub use labeler::{LabelError, LabelProvider};
pub use ollama::OllamaLabeler;
pub use openai::OpenAiLabeler;
