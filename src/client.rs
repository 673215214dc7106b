//! Consumer side of the relay
//!
//! `RelayClient` talks to a running relay over HTTP. The streaming call hands
//! back the decoded event stream so callers can render fragments as they
//! arrive; `collect_recommendation` folds it into the final text.

use futures::stream::Stream;
use futures::StreamExt;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::{ClientError, FrameError};
use crate::models::{ErrorResponse, HealthResponse, RecommendationRequest, RecommendationResponse};
use crate::sse::{decode_stream, StreamEvent};

pub struct RelayClient {
    http: Client,
    base_url: String,
}

impl RelayClient {
    /// Create a client for the relay at `base_url` (e.g. `http://127.0.0.1:5202`)
    pub fn new(base_url: impl Into<String>) -> Result<Self, ClientError> {
        let http = Client::builder().build()?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/{}", self.base_url, path)
    }

    pub async fn health(&self) -> Result<HealthResponse, ClientError> {
        let response = self.http.get(self.url("health")).send().await?;
        read_json(response).await
    }

    /// Non-streaming recommendation
    pub async fn recommend(&self, symptoms: &str) -> Result<String, ClientError> {
        let response = self
            .http
            .post(self.url("recommendations"))
            .json(&RecommendationRequest::new(symptoms))
            .send()
            .await?;

        let body: RecommendationResponse = read_json(response).await?;
        Ok(body.recommendation)
    }

    /// Open a streaming recommendation and decode events as bytes arrive.
    ///
    /// A rejected request (e.g. blank symptoms) fails here, before any event.
    pub async fn stream_recommendation(
        &self,
        symptoms: &str,
    ) -> Result<impl Stream<Item = Result<StreamEvent, FrameError>>, ClientError> {
        let response = self
            .http
            .post(self.url("stream-recommendations"))
            .header(reqwest::header::ACCEPT, "text/event-stream")
            .json(&RecommendationRequest::new(symptoms))
            .send()
            .await?;

        let response = ensure_success(response).await?;
        Ok(decode_stream(response.bytes_stream()))
    }

    /// Stream a recommendation and concatenate its fragments
    pub async fn collect_recommendation(&self, symptoms: &str) -> Result<String, ClientError> {
        let events = self.stream_recommendation(symptoms).await?;
        let mut events = Box::pin(events);
        let mut text = String::new();

        while let Some(event) = events.next().await {
            match event? {
                StreamEvent::Fragment(content) => text.push_str(&content),
                StreamEvent::Done => return Ok(text),
                StreamEvent::Error(message) => return Err(ClientError::Upstream(message)),
            }
        }

        // decode_stream reports a missing terminal event itself
        Err(FrameError::UnexpectedEof.into())
    }
}

async fn ensure_success(response: Response) -> Result<Response, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await?;
    debug!(status = status.as_u16(), "relay rejected request");

    let (message, details) = match serde_json::from_str::<ErrorResponse>(&body) {
        Ok(error) => (error.error, error.details),
        Err(_) => (body, None),
    };
    Err(ClientError::Rejected {
        status: status.as_u16(),
        message,
        details,
    })
}

async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, ClientError> {
    let response = ensure_success(response).await?;
    Ok(response.json().await?)
}
