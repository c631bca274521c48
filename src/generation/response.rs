//! Reading an image out of a `generateContent` response.

use super::errors::GenerationError;
use super::wire::GenerateContentResponse;
use crate::imaging::ImageAsset;

/// Pick the result image from a response, or explain why there is none.
///
/// Checks, in order: prompt block reason, a finish reason other than
/// `STOP`, the first inline-image part, the first text part (the model
/// answered in words instead of pixels), and finally an empty response.
pub fn extract_image(response: &GenerateContentResponse) -> Result<ImageAsset, GenerationError> {
    if let Some(reason) = response
        .prompt_feedback
        .as_ref()
        .and_then(|f| f.block_reason.as_deref())
    {
        return Err(GenerationError::SafetyBlocked(reason.to_string()));
    }

    if let Some(reason) = response
        .candidates
        .first()
        .and_then(|c| c.finish_reason.as_deref())
        .filter(|r| *r != "STOP")
    {
        return Err(GenerationError::AbnormalFinish(reason.to_string()));
    }

    let parts = response.parts();

    if let Some(inline) = parts.iter().find_map(|p| p.inline_data.as_ref()) {
        return ImageAsset::from_base64(&inline.data, &inline.mime_type)
            .map_err(|e| GenerationError::MalformedImage(e.to_string()));
    }

    if let Some(text) = parts
        .iter()
        .filter_map(|p| p.text.as_deref())
        .find(|t| !t.trim().is_empty())
    {
        return Err(GenerationError::TextInsteadOfImage(text.trim().to_string()));
    }

    Err(GenerationError::EmptyResponse)
}
