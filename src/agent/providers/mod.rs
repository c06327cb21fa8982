//! Concrete [`super::LlmProvider`] implementations.

pub mod openai;

pub use openai::OpenAiProvider;
