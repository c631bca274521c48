//! Visualization and refinement against the generation service.
//!
//! # Refinement is never incremental
//!
//! A refinement does not edit the previous result. It re-runs the full
//! paving instruction against the **original** site photo with the user's
//! edit appended. Feeding each result back in compounds small framing and
//! scale changes into a visible drift (the picture slowly "zooms in") after
//! a handful of iterations; starting from the original every time keeps
//! each result one generation away from the photo.
//!
//! # Dimensions
//!
//! Whatever size the service returns, results leave this module at the
//! site photo's exact pixel dimensions (see
//! [`fit_to_dimensions`](crate::imaging::fit_to_dimensions)).

use crate::config::GenerationConfig;
use crate::generation::{
    GenerateContentRequest, GenerationError, GenerativeModel, extract_image, prompts,
};
use crate::imaging::{ImageAsset, fit_to_dimensions};
use tracing::{debug, error, warn};

/// Description used when a refinement has no usable instruction text.
pub const GENERIC_REFINEMENT_SUMMARY: &str = "Refinement applied";

/// Description used when the summarizer is unavailable.
pub fn fallback_summary(instruction: &str) -> String {
    format!("Applied refinement: \"{}\"", instruction.trim())
}

/// Generation front-end bound to one model backend.
pub struct Visualizer<M> {
    model: M,
    image_model: String,
    text_model: String,
}

impl<M: GenerativeModel> Visualizer<M> {
    pub fn new(model: M, config: &GenerationConfig) -> Self {
        Self {
            model,
            image_model: config.image_model.clone(),
            text_model: config.text_model.clone(),
        }
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    /// Re-pave the ground in `site` with the material in `swatch`.
    pub async fn generate_initial(
        &self,
        site: &ImageAsset,
        swatch: &ImageAsset,
    ) -> Result<ImageAsset, GenerationError> {
        let prompt = prompts::initial_generation(site.width(), site.height());
        let request = GenerateContentRequest::image_edit(&prompt, &[site, swatch]);
        self.run(site, &request).await
    }

    /// Re-pave `site` and apply `instruction` in the same pass.
    ///
    /// `mask`, when given, must already match the site photo's dimensions;
    /// white marks the area the instruction applies to.
    pub async fn refine(
        &self,
        site: &ImageAsset,
        swatch: &ImageAsset,
        instruction: &str,
        mask: Option<&ImageAsset>,
    ) -> Result<ImageAsset, GenerationError> {
        let prompt = prompts::refinement(site.width(), site.height(), instruction, mask.is_some());
        let mut images = vec![site, swatch];
        images.extend(mask);
        let request = GenerateContentRequest::image_edit(&prompt, &images);
        self.run(site, &request).await
    }

    /// Short past-tense description of `instruction` for captions.
    ///
    /// Never fails: any problem with the text model yields a fallback built
    /// from the instruction itself.
    pub async fn summarize_refinement(&self, instruction: &str) -> String {
        let instruction = instruction.trim();
        if instruction.is_empty() {
            return GENERIC_REFINEMENT_SUMMARY.to_string();
        }

        let request = GenerateContentRequest::text(&prompts::summarize_refinement(instruction));
        match self.model.generate_content(&self.text_model, &request).await {
            Ok(response) => {
                let text = response.text();
                let summary = text.trim().trim_matches('"').trim();
                if summary.is_empty() {
                    warn!("summarizer returned no text, using fallback");
                    fallback_summary(instruction)
                } else {
                    summary.to_string()
                }
            }
            Err(e) => {
                error!(error = %e, "failed to summarize refinement");
                fallback_summary(instruction)
            }
        }
    }

    async fn run(
        &self,
        site: &ImageAsset,
        request: &GenerateContentRequest,
    ) -> Result<ImageAsset, GenerationError> {
        let response = self
            .model
            .generate_content(&self.image_model, request)
            .await?;
        let generated = extract_image(&response)?;
        debug!(
            width = generated.width(),
            height = generated.height(),
            media_type = generated.media_type(),
            "generated image received"
        );
        match_site_dimensions(generated, site)
    }
}

fn match_site_dimensions(
    generated: ImageAsset,
    site: &ImageAsset,
) -> Result<ImageAsset, GenerationError> {
    if generated.dimensions() == site.dimensions() {
        return Ok(generated);
    }
    warn!(
        generated_width = generated.width(),
        generated_height = generated.height(),
        site_width = site.width(),
        site_height = site.height(),
        "generated dimensions mismatch site photo, resizing"
    );
    fit_to_dimensions(&generated, site.width(), site.height())
        .map_err(|e| GenerationError::MalformedImage(e.to_string()))
}
