//! Async driver for one user session.
//!
//! [`Session`] pairs the pure [`AppState`] transitions with the service
//! calls they wait on. Each method runs a `begin_*` transition, awaits the
//! service, and feeds the outcome back with the matching `finish_*`.
//! Service failures end up as the state's error message; only input
//! problems the caller can act on come back as `Err`.

use crate::catalog::{Product, ProductCatalog};
use crate::config::AppConfig;
use crate::generation::GenerativeModel;
use crate::imaging::{FitError, ImageAsset, InvalidImageError, fit_to_dimensions, ingest};
use crate::report::{self, ReportError};
use crate::state::{AppState, ValidationError};
use crate::visualize::Visualizer;
use std::path::Path;
use tracing::{debug, info};

pub struct Session<C, M> {
    state: AppState,
    catalog: C,
    visualizer: Visualizer<M>,
    report_title: String,
}

impl<C: ProductCatalog, M: GenerativeModel> Session<C, M> {
    pub fn new(catalog: C, model: M, config: &AppConfig) -> Self {
        Self {
            state: AppState::new(config.session.reset_gallery_on_new_photo),
            catalog,
            visualizer: Visualizer::new(model, &config.generation),
            report_title: config.report.title.clone(),
        }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Direct access for transitions with no service call (instruction
    /// text, gallery saves, category switches).
    pub fn state_mut(&mut self) -> &mut AppState {
        &mut self.state
    }

    pub fn catalog(&self) -> &C {
        &self.catalog
    }

    pub fn visualizer(&self) -> &Visualizer<M> {
        &self.visualizer
    }

    /// Read a site photo from disk and make it the current one.
    ///
    /// An unreadable file clears the current photo and is reported both in
    /// the state and to the caller.
    pub fn load_site_image(&mut self, path: &Path) -> Result<(), InvalidImageError> {
        match ingest::load_file(path) {
            Ok(image) => {
                info!(
                    path = %path.display(),
                    width = image.width(),
                    height = image.height(),
                    "site photo loaded"
                );
                self.state.set_site_image(Some(image));
                Ok(())
            }
            Err(e) => {
                self.state.set_site_image(None);
                self.state.report_error(e.to_string());
                Err(e)
            }
        }
    }

    pub fn set_site_image(&mut self, image: ImageAsset) {
        self.state.set_site_image(Some(image));
    }

    /// Fetch the product list. Returns the number of products loaded.
    pub async fn load_products(&mut self) -> usize {
        let outcome = self.catalog.list_products().await;
        self.state.set_products(outcome);
        self.state.products().len()
    }

    /// Pick `product` and wait for its swatch. Returns whether a swatch is
    /// selected afterwards (picking the selected product again deselects).
    pub async fn select_product(&mut self, product: &Product) -> bool {
        let Some(ticket) = self.state.begin_swatch_load(product) else {
            debug!(product = %product.name, "product deselected");
            return false;
        };
        let outcome = self.catalog.fetch_swatch(product).await;
        self.state.finish_swatch_load(ticket, outcome);
        self.state.selection().is_resolved()
    }

    /// Run the initial generation for the current photo and swatch.
    pub async fn visualize(&mut self) -> Result<(), ValidationError> {
        let job = self.state.begin_visualize()?;
        info!(paving = %job.paving_name, "generating visualization");
        let outcome = self
            .visualizer
            .generate_initial(&job.site_image, &job.swatch)
            .await;
        self.state.finish_visualize(job, outcome);
        Ok(())
    }

    /// Set the refinement mask, resized to the site photo's dimensions.
    pub fn set_mask(&mut self, mask: Option<ImageAsset>) -> Result<(), FitError> {
        let fitted = match (mask, self.state.site_image()) {
            (Some(mask), Some(site)) => Some(fit_to_dimensions(&mask, site.width(), site.height())?),
            (mask, _) => mask,
        };
        self.state.set_mask(fitted);
        Ok(())
    }

    /// Apply `instruction` to the current result.
    ///
    /// The generation always starts from the original photo. Once an image
    /// comes back, the instruction is summarized for the entry's caption.
    pub async fn refine(&mut self, instruction: &str) -> Result<(), ValidationError> {
        self.state.set_instruction(instruction);
        let job = self.state.begin_refine()?;
        info!(instruction = %job.instruction, masked = job.mask.is_some(), "refining visualization");

        let generated = self
            .visualizer
            .refine(
                &job.site_image,
                &job.swatch,
                &job.instruction,
                job.mask.as_ref(),
            )
            .await;
        let outcome = match generated {
            Ok(image) => {
                let summary = self.visualizer.summarize_refinement(&job.instruction).await;
                Ok((image, summary))
            }
            Err(e) => Err(e),
        };
        self.state.finish_refine(job, outcome);
        Ok(())
    }

    /// Write the saved gallery as a PDF report.
    pub fn export_report(&self, path: &Path) -> Result<(), ReportError> {
        report::write_pdf(self.state.gallery(), &self.report_title, path)
    }
}
