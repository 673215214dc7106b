// HTTP server modules
pub mod handlers;
pub mod models;
pub mod routes;
pub mod sse;
pub mod state;

// Relay core
pub mod config;
pub mod error;
pub mod prompt;
pub mod relay;

// Consumer side of the relay protocol
pub mod client;

// LLM abstraction layer
pub mod llm;

pub use state::AppState;
