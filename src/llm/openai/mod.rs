//! OpenAI-compatible provider implementation
//!
//! Works against any endpoint that speaks the chat completions protocol,
//! such as NVIDIA's hosted inference API.

pub mod client;
pub mod mapper;
pub mod sse;
pub mod types;

// Re-export commonly used types
pub use client::OpenAiClient;
