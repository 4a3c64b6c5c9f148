//! Prompt assembly for retrieval-augmented generation

mod prompt;

pub use prompt::{PromptBuilder, NO_INFORMATION_ANSWER};
