//! Failure taxonomy for generation calls.
//!
//! Every way a generation can fail ends up as one [`GenerationError`] whose
//! `Display` is the message shown to the user. Service-side errors are
//! classified from the JSON error envelope by [`classify_api_error`].

use super::wire::ApiErrorBody;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GenerationError {
    #[error(
        "The request was blocked by the AI for safety reasons: {0}. Please try a different image or prompt."
    )]
    SafetyBlocked(String),
    #[error(
        "The AI stopped generating due to: {0}. This can happen due to safety settings or if the input is unclear."
    )]
    AbnormalFinish(String),
    #[error(
        "Failed to generate image: The daily usage limit for the AI model has been reached. Please try again tomorrow."
    )]
    QuotaExhausted,
    #[error(
        "Failed to generate image: API rate limit exceeded. Please wait a moment and try again."
    )]
    RateLimited,
    #[error(
        "Image generation is not available in your region. We apologize for the inconvenience."
    )]
    RegionUnavailable,
    #[error("Image generation failed: A required condition was not met. (Status: {0})")]
    PreconditionFailed(String),
    #[error(
        "Failed to generate image: The provided API key is invalid. Please check your configuration."
    )]
    InvalidApiKey,
    #[error("AI returned text instead of an image: \"{0}\"")]
    TextInsteadOfImage(String),
    #[error(
        "The AI returned no image or text. This might be due to a safety filter or an issue with the model."
    )]
    EmptyResponse,
    #[error("The AI returned an image that could not be read: {0}")]
    MalformedImage(String),
    #[error("Failed to generate image: {message} (Code: {code})")]
    Service { code: i64, message: String },
    #[error("Failed to generate image: {0}")]
    Transport(String),
}

impl GenerationError {
    /// Broad class of the failure, for logging and output.
    pub fn kind(&self) -> &'static str {
        match self {
            GenerationError::SafetyBlocked(_) => "safety-block",
            GenerationError::AbnormalFinish(_) => "abnormal-finish",
            GenerationError::QuotaExhausted | GenerationError::RateLimited => "quota",
            GenerationError::RegionUnavailable => "region",
            GenerationError::TextInsteadOfImage(_)
            | GenerationError::EmptyResponse
            | GenerationError::MalformedImage(_) => "malformed-response",
            GenerationError::PreconditionFailed(_)
            | GenerationError::InvalidApiKey
            | GenerationError::Service { .. }
            | GenerationError::Transport(_) => "service",
        }
    }
}

/// Classify a non-2xx response from the generation service.
///
/// `http_status` is only used when the body is not the usual JSON error
/// envelope.
pub fn classify_api_error(http_status: u16, body: &str) -> GenerationError {
    let lowered = body.to_lowercase();
    if lowered.contains("api key not valid") {
        return GenerationError::InvalidApiKey;
    }
    if lowered.contains("rate limit") {
        return GenerationError::RateLimited;
    }

    let Ok(ApiErrorBody { error }) = serde_json::from_str::<ApiErrorBody>(body) else {
        let message = body.trim();
        return GenerationError::Service {
            code: i64::from(http_status),
            message: if message.is_empty() {
                format!("HTTP {http_status}")
            } else {
                message.to_string()
            },
        };
    };

    let code = error.code.unwrap_or(i64::from(http_status));
    let message = error.message.unwrap_or_default();
    let status = error.status.unwrap_or_default();
    let message_lower = message.to_lowercase();

    if status == "FAILED_PRECONDITION" || code == 412 {
        if message_lower.contains("not available in your country") {
            return GenerationError::RegionUnavailable;
        }
        return GenerationError::PreconditionFailed(status);
    }
    if status == "RESOURCE_EXHAUSTED" || message_lower.contains("quota") {
        return GenerationError::QuotaExhausted;
    }
    GenerationError::Service { code, message }
}
