//! Transport to the generation service.
//!
//! [`GenerativeModel`] is the seam: [`Visualizer`](crate::visualize::Visualizer)
//! only knows how to build requests and read responses, and the HTTP client
//! below is the production implementation. Tests swap in a recording mock.

use super::errors::{GenerationError, classify_api_error};
use super::wire::{GenerateContentRequest, GenerateContentResponse};
use std::future::Future;
use tracing::debug;

/// Anything that can answer a `generateContent` call for a named model.
pub trait GenerativeModel: Sync {
    fn generate_content(
        &self,
        model: &str,
        request: &GenerateContentRequest,
    ) -> impl Future<Output = Result<GenerateContentResponse, GenerationError>> + Send;
}

/// HTTP client for the Gemini REST API.
pub struct GeminiClient {
    api_base: String,
    api_key: String,
    http: reqwest::Client,
}

impl GeminiClient {
    pub fn new(api_base: &str, api_key: &str) -> Self {
        Self {
            api_base: api_base.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            http: reqwest::Client::new(),
        }
    }

    fn endpoint(&self, model: &str) -> String {
        format!("{}/models/{}:generateContent", self.api_base, model)
    }
}

impl GenerativeModel for GeminiClient {
    async fn generate_content(
        &self,
        model: &str,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse, GenerationError> {
        let url = self.endpoint(model);
        debug!(
            %model,
            images = request.inline_images().len(),
            prompt_chars = request.prompt_text().len(),
            "calling generateContent"
        );

        let response = self
            .http
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| GenerationError::Transport(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| GenerationError::Transport(e.to_string()))?;

        if !status.is_success() {
            let err = classify_api_error(status.as_u16(), &body);
            debug!(status = status.as_u16(), kind = err.kind(), "generateContent failed");
            return Err(err);
        }

        serde_json::from_str(&body).map_err(|e| GenerationError::Service {
            code: i64::from(status.as_u16()),
            message: format!("unreadable response: {e}"),
        })
    }
}
