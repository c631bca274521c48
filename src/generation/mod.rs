//! Client side of the image/text generation service.
//!
//! - **Wire**: serde types for `generateContent` requests and responses
//! - **Client**: [`GenerativeModel`] trait + [`GeminiClient`] over HTTPS
//! - **Response**: picking the result image out of a response
//! - **Errors**: [`GenerationError`] and service error classification
//! - **Prompts**: instruction templates

pub mod client;
pub mod errors;
pub mod prompts;
pub mod response;
pub mod wire;

pub use client::{GeminiClient, GenerativeModel};
pub use errors::{GenerationError, classify_api_error};
pub use response::extract_image;
pub use wire::{GenerateContentRequest, GenerateContentResponse};
