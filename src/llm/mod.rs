//! LLM Abstraction Layer
//!
//! This module provides a provider-neutral interface for chat completions and
//! an OpenAI-compatible implementation of it.

pub mod core;
pub mod mock;
pub mod openai;

// Re-export commonly used types
pub use core::{
    config::GenerationConfig,
    error::LlmError,
    provider::{create_provider, CompletionProvider, FragmentStream},
    types::{CompletionRequest, Fragment, Message, MessageRole},
};

pub use mock::{ScriptedChunk, ScriptedProvider};
pub use openai::OpenAiClient;
