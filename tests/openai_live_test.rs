//! Live tests against a real OpenAI-compatible endpoint
//!
//! These make real API calls. To run them:
//! 1. Copy `.env.example` to `.env` and set `LLM_API_KEY`
//! 2. Run: `cargo test --test openai_live_test -- --ignored`

use futures::StreamExt;
use symptom_relay::config::Config;
use symptom_relay::llm::{create_provider, CompletionProvider, GenerationConfig};
use symptom_relay::prompt::build_request;
use std::sync::Arc;

fn create_live_provider() -> Arc<dyn CompletionProvider> {
    dotenvy::dotenv().ok();
    let config = Config::from_env().expect("LLM_API_KEY required in .env");
    create_provider(&config.upstream).expect("Failed to create provider")
}

#[tokio::test]
#[ignore] // Run with --ignored flag
async fn test_live_completion() {
    let provider = create_live_provider();
    let request = build_request("headache", &GenerationConfig::new(200));

    let text = provider.complete(request).await.expect("Completion failed");

    println!("Response: {}", text);
    assert!(!text.is_empty());
}

#[tokio::test]
#[ignore] // Run with --ignored flag
async fn test_live_streaming() {
    let provider = create_live_provider();
    let request = build_request("sore throat", &GenerationConfig::new(200));

    let mut stream = provider
        .stream_complete(request)
        .await
        .expect("Failed to start stream");

    let mut text = String::new();
    let mut fragments = 0;
    while let Some(fragment) = stream.next().await {
        let fragment = fragment.expect("Stream error");
        assert!(!fragment.content.is_empty());
        text.push_str(&fragment.content);
        fragments += 1;
    }

    println!("Response ({} fragments): {}", fragments, text);
    assert!(fragments > 1);
}
