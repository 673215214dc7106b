// Request and response bodies of the HTTP API

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

// Request Types
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecommendationRequest {
    #[serde(default)]
    pub symptoms: Option<String>,
}

impl RecommendationRequest {
    pub fn new(symptoms: impl Into<String>) -> Self {
        Self {
            symptoms: Some(symptoms.into()),
        }
    }

    /// Trimmed symptom text, rejecting missing or blank input
    pub fn validated_symptoms(&self) -> Result<&str, ValidationError> {
        match self.symptoms.as_deref().map(str::trim) {
            Some(symptoms) if !symptoms.is_empty() => Ok(symptoms),
            _ => Err(ValidationError::MissingSymptoms),
        }
    }
}

// Response Types
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationResponse {
    pub recommendation: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: None,
        }
    }

    pub fn with_details(error: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: Some(details.into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}

impl HealthResponse {
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recommendation_request_deserialization() {
        let request: RecommendationRequest =
            serde_json::from_str(r#"{"symptoms":"headache, fever"}"#).unwrap();
        assert_eq!(request.validated_symptoms(), Ok("headache, fever"));
    }

    #[test]
    fn test_missing_symptoms_is_invalid() {
        let request: RecommendationRequest = serde_json::from_str("{}").unwrap();
        assert_eq!(
            request.validated_symptoms(),
            Err(ValidationError::MissingSymptoms)
        );

        let request: RecommendationRequest =
            serde_json::from_str(r#"{"symptoms":null}"#).unwrap();
        assert!(request.validated_symptoms().is_err());
    }

    #[test]
    fn test_blank_symptoms_are_invalid() {
        for blank in ["", " ", "\t\n  "] {
            assert!(RecommendationRequest::new(blank).validated_symptoms().is_err());
        }
    }

    #[test]
    fn test_symptoms_are_trimmed() {
        let request = RecommendationRequest::new("  sore throat \n");
        assert_eq!(request.validated_symptoms(), Ok("sore throat"));
    }

    #[test]
    fn test_non_string_symptoms_fail_to_deserialize() {
        assert!(serde_json::from_str::<RecommendationRequest>(r#"{"symptoms":42}"#).is_err());
    }

    #[test]
    fn test_error_response_serialization() {
        let value = serde_json::to_value(ErrorResponse::new("Symptoms are required")).unwrap();
        assert_eq!(value, serde_json::json!({ "error": "Symptoms are required" }));

        let value = serde_json::to_value(ErrorResponse::with_details(
            "Failed to get recommendation",
            "timeout",
        ))
        .unwrap();
        assert_eq!(value["details"], "timeout");
    }

    #[test]
    fn test_health_response_serialization() {
        let json = serde_json::to_string(&HealthResponse::ok()).unwrap();
        assert_eq!(json, r#"{"status":"ok"}"#);
    }
}
