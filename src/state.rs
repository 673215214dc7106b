//! Read-only state shared by all requests

use std::sync::Arc;

use crate::llm::{CompletionProvider, GenerationConfig};
use crate::relay::RelaySettings;

#[derive(Clone)]
pub struct AppState {
    pub provider: Arc<dyn CompletionProvider>,
    pub generation: GenerationConfig,
    pub relay: RelaySettings,
}

impl AppState {
    pub fn new(
        provider: Arc<dyn CompletionProvider>,
        generation: GenerationConfig,
        relay: RelaySettings,
    ) -> Self {
        Self {
            provider,
            generation,
            relay,
        }
    }
}
