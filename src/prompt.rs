//! Fixed instruction template for recommendation requests

use crate::llm::{CompletionRequest, GenerationConfig, Message};

/// System instruction prepended to every request
pub const SYSTEM_PROMPT: &str = "You are a medical professional providing advice about common symptoms and over-the-counter medications. For each symptom, suggest 1-2 common medications, including dosage guidelines and precautions. Format your response with clear headings and bullet points for better readability.";

/// Prefix of the user message; the symptom text follows it
pub const USER_PROMPT_PREFIX: &str = "Suggest over-the-counter medications for: ";

/// Build the completion request for already-validated symptoms
pub fn build_request(symptoms: &str, config: &GenerationConfig) -> CompletionRequest {
    CompletionRequest {
        messages: vec![
            Message::system(SYSTEM_PROMPT),
            Message::user(format!("{}{}", USER_PROMPT_PREFIX, symptoms)),
        ],
        config: config.clone(),
    }
}
