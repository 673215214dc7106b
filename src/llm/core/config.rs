//! Generation configuration parameters

use serde::{Deserialize, Serialize};

/// Sampling temperature used for every recommendation
pub const DEFAULT_TEMPERATURE: f32 = 0.5;

/// Output length bound used for every recommendation
pub const DEFAULT_MAX_TOKENS: u32 = 1024;

/// Parameters for controlling text generation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// Maximum number of tokens to generate
    pub max_tokens: u32,
    /// Randomness (0.0-1.0, higher = more random)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

impl GenerationConfig {
    /// Create a new configuration with the specified max tokens
    pub fn new(max_tokens: u32) -> Self {
        Self {
            max_tokens,
            temperature: None,
        }
    }

    /// Set the temperature
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_TOKENS).with_temperature(DEFAULT_TEMPERATURE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_new() {
        let config = GenerationConfig::new(2048);
        assert_eq!(config.max_tokens, 2048);
        assert!(config.temperature.is_none());
    }

    #[test]
    fn test_config_default() {
        let config = GenerationConfig::default();
        assert_eq!(config.max_tokens, 1024);
        assert_eq!(config.temperature, Some(0.5));
    }

    #[test]
    fn test_config_serialization() {
        let json = serde_json::to_string(&GenerationConfig::new(1024)).unwrap();
        assert!(json.contains("\"max_tokens\":1024"));
        assert!(!json.contains("\"temperature\""));

        let json = serde_json::to_string(&GenerationConfig::default()).unwrap();
        assert!(json.contains("\"temperature\":0.5"));
    }
}
