//! LLM-backed coaching: an OpenAI-compatible chat client plus the prompt
//! builders that steer the model through the strategy framework.

pub mod client;
pub mod error;
pub mod prompt;

pub use client::{ChatMessage, CoachClient};
pub use error::CoachError;
