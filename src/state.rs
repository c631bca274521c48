//! Application state and its transitions.
//!
//! [`AppState`] is the single owner of everything the user is working on:
//! the site photo, the paving selection, the current result, loading flags,
//! the error message, and the session history and gallery. Every user action
//! is a method here; none of them perform I/O.
//!
//! # Two-phase actions
//!
//! Actions that need a service call are split into `begin_*` and `finish_*`.
//! `begin_*` validates, flips the loading flag, and hands back a job
//! carrying cloned inputs; the caller runs the service call and passes the
//! outcome to `finish_*`. The [`Session`](crate::session::Session) driver
//! does this sequencing for the CLI.
//!
//! # Overlap rules
//!
//! - Visualize and refine are refused while anything is in flight
//!   ([`AppState::is_busy`]). This is the only guard against overlapping
//!   generation requests; there is no queue and no cancellation.
//! - Swatch loads may overlap. Each load gets a ticket with a sequence
//!   number and only the ticket matching the latest number is applied, so
//!   the product picked last wins regardless of completion order.
//! - A new site photo or a product change abandons any generation or
//!   refinement in flight. Jobs carry the epoch they were started in and a
//!   completion from an older epoch is dropped.

use crate::catalog::{CatalogFetchError, Product, ProductCategory, SwatchFetchError};
use crate::generation::GenerationError;
use crate::imaging::ImageAsset;
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;
use tracing::warn;

/// Message shown when a swatch cannot be fetched.
pub const SWATCH_LOAD_FAILED: &str = "Could not load selected paving swatch. Please try again.";

/// Preconditions checked before any service call.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Please upload a site photo and select a paving swatch.")]
    MissingInputs,
    #[error("Cannot refine without an initial result, site image, and paving selection.")]
    NothingToRefine,
    #[error("Please provide refinement instructions to the AI.")]
    EmptyInstruction,
    #[error("Please wait for the current operation to finish.")]
    Busy,
}

/// What, if anything, is in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activity {
    Idle,
    Generating,
    Refining,
    SwatchLoading,
}

/// The chosen paving: swatch image and display name, both set once the
/// swatch has loaded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PavingSelection {
    pub swatch: Option<ImageAsset>,
    pub name: Option<String>,
}

impl PavingSelection {
    pub fn is_resolved(&self) -> bool {
        self.swatch.is_some() && self.name.is_some()
    }
}

/// One saved generation or refinement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GalleryEntry {
    pub id: String,
    /// Always the uploaded photo, never a previous result.
    pub site_image: ImageAsset,
    pub generated_image: ImageAsset,
    pub paving_name: String,
    pub description: String,
    pub is_initial: bool,
}

/// Proof of a started swatch load; hand it back to
/// [`AppState::finish_swatch_load`].
#[derive(Debug, Clone)]
pub struct SwatchTicket {
    seq: u64,
    product: Product,
}

impl SwatchTicket {
    pub fn product(&self) -> &Product {
        &self.product
    }
}

/// Inputs for one initial generation.
#[derive(Debug, Clone)]
pub struct VisualizeJob {
    pub site_image: ImageAsset,
    pub swatch: ImageAsset,
    pub paving_name: String,
    epoch: u64,
}

/// Inputs for one refinement.
#[derive(Debug, Clone)]
pub struct RefineJob {
    /// The original photo, not the currently displayed result.
    pub site_image: ImageAsset,
    pub swatch: ImageAsset,
    pub paving_name: String,
    pub instruction: String,
    pub mask: Option<ImageAsset>,
    epoch: u64,
}

#[derive(Debug, Clone)]
pub struct AppState {
    reset_gallery_on_new_photo: bool,

    products: Vec<Product>,
    catalog_error: Option<String>,
    category: ProductCategory,
    selected_product: Option<Product>,
    swatch_seq: u64,

    site_image: Option<ImageAsset>,
    selection: PavingSelection,
    result: Option<ImageAsset>,
    error: Option<String>,
    instruction: String,
    mask: Option<ImageAsset>,

    generating: bool,
    refining: bool,
    swatch_loading: bool,
    job_epoch: u64,

    history: Vec<GalleryEntry>,
    gallery: Vec<GalleryEntry>,
    current_entry: Option<GalleryEntry>,
    current_saved: bool,
    entry_counter: u64,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(true)
    }
}

impl AppState {
    /// Fresh state. `reset_gallery_on_new_photo` decides whether a new site
    /// photo also clears history and gallery.
    pub fn new(reset_gallery_on_new_photo: bool) -> Self {
        Self {
            reset_gallery_on_new_photo,
            products: Vec::new(),
            catalog_error: None,
            category: ProductCategory::Porcelain,
            selected_product: None,
            swatch_seq: 0,
            site_image: None,
            selection: PavingSelection::default(),
            result: None,
            error: None,
            instruction: String::new(),
            mask: None,
            generating: false,
            refining: false,
            swatch_loading: false,
            job_epoch: 0,
            history: Vec::new(),
            gallery: Vec::new(),
            current_entry: None,
            current_saved: false,
            entry_counter: 0,
        }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn products(&self) -> &[Product] {
        &self.products
    }

    pub fn catalog_error(&self) -> Option<&str> {
        self.catalog_error.as_deref()
    }

    pub fn category(&self) -> ProductCategory {
        self.category
    }

    pub fn selected_product(&self) -> Option<&Product> {
        self.selected_product.as_ref()
    }

    pub fn site_image(&self) -> Option<&ImageAsset> {
        self.site_image.as_ref()
    }

    pub fn selection(&self) -> &PavingSelection {
        &self.selection
    }

    pub fn result(&self) -> Option<&ImageAsset> {
        self.result.as_ref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn instruction(&self) -> &str {
        &self.instruction
    }

    pub fn mask(&self) -> Option<&ImageAsset> {
        self.mask.as_ref()
    }

    /// Every successful generation this session, oldest first.
    pub fn history(&self) -> &[GalleryEntry] {
        &self.history
    }

    /// Entries the user chose to keep, in the order they were saved.
    pub fn gallery(&self) -> &[GalleryEntry] {
        &self.gallery
    }

    /// The entry behind the currently displayed result.
    pub fn current_entry(&self) -> Option<&GalleryEntry> {
        self.current_entry.as_ref()
    }

    pub fn is_current_saved(&self) -> bool {
        self.current_saved
    }

    pub fn activity(&self) -> Activity {
        if self.generating {
            Activity::Generating
        } else if self.refining {
            Activity::Refining
        } else if self.swatch_loading {
            Activity::SwatchLoading
        } else {
            Activity::Idle
        }
    }

    pub fn is_busy(&self) -> bool {
        self.activity() != Activity::Idle
    }

    /// Whether the visualize action is currently available.
    pub fn can_visualize(&self) -> bool {
        self.site_image.is_some() && self.selection.is_resolved() && !self.is_busy()
    }

    // =========================================================================
    // Site photo and catalog
    // =========================================================================

    /// Replace the site photo. Starts a new project: any generation in
    /// flight is abandoned, the result, error, instruction and mask are
    /// cleared, and history and gallery too when configured to.
    pub fn set_site_image(&mut self, image: Option<ImageAsset>) {
        self.abandon_jobs("new site photo");
        self.site_image = image;
        self.result = None;
        self.error = None;
        self.instruction.clear();
        self.mask = None;
        self.current_entry = None;
        self.current_saved = false;
        if self.reset_gallery_on_new_photo {
            self.history.clear();
            self.gallery.clear();
        }
    }

    /// Store the outcome of loading the product list.
    pub fn set_products(&mut self, outcome: Result<Vec<Product>, CatalogFetchError>) {
        match outcome {
            Ok(products) => {
                self.products = products;
                self.catalog_error = None;
            }
            Err(e) => {
                self.products.clear();
                self.catalog_error = Some(e.to_string());
            }
        }
    }

    /// Switch the visible category. Drops the current selection and
    /// invalidates any swatch still loading.
    pub fn set_category(&mut self, category: ProductCategory) {
        self.abandon_jobs("category changed");
        self.category = category;
        self.selected_product = None;
        self.swatch_seq += 1;
        self.swatch_loading = false;
        self.clear_selection();
    }

    /// Start loading `product`'s swatch.
    ///
    /// Picking the product that is already selected deselects it and
    /// returns `None`. Otherwise the previous selection, result and error
    /// are cleared and a ticket for the new load is returned. Either way a
    /// generation still running for the old product is abandoned.
    pub fn begin_swatch_load(&mut self, product: &Product) -> Option<SwatchTicket> {
        self.abandon_jobs("paving changed");
        self.swatch_seq += 1;
        self.clear_selection();

        let reselected = self
            .selected_product
            .as_ref()
            .is_some_and(|p| p.file_id == product.file_id);
        if reselected {
            self.selected_product = None;
            self.swatch_loading = false;
            return None;
        }

        self.selected_product = Some(product.clone());
        self.swatch_loading = true;
        Some(SwatchTicket {
            seq: self.swatch_seq,
            product: product.clone(),
        })
    }

    /// Apply a finished swatch load. Returns `false` (and changes nothing)
    /// when a newer load has started since this ticket was issued.
    pub fn finish_swatch_load(
        &mut self,
        ticket: SwatchTicket,
        outcome: Result<ImageAsset, SwatchFetchError>,
    ) -> bool {
        if ticket.seq != self.swatch_seq {
            warn!(
                product = %ticket.product.name,
                "discarding stale swatch load"
            );
            return false;
        }

        self.swatch_loading = false;
        match outcome {
            Ok(swatch) => {
                self.selection = PavingSelection {
                    swatch: Some(swatch),
                    name: Some(ticket.product.name),
                };
            }
            Err(e) => {
                warn!(product = %ticket.product.name, error = %e, "swatch load failed");
                self.selected_product = None;
                self.error = Some(SWATCH_LOAD_FAILED.to_string());
            }
        }
        true
    }

    /// Drop the claim of any generation or refinement in flight. Its
    /// completion will no longer match the epoch and is ignored.
    fn abandon_jobs(&mut self, reason: &str) {
        if self.generating || self.refining {
            warn!(reason, "abandoning generation in flight");
        }
        self.job_epoch += 1;
        self.generating = false;
        self.refining = false;
    }

    fn clear_selection(&mut self) {
        self.selection = PavingSelection::default();
        self.result = None;
        self.error = None;
    }

    // =========================================================================
    // Visualize and refine
    // =========================================================================

    /// Validate and start an initial generation.
    pub fn begin_visualize(&mut self) -> Result<VisualizeJob, ValidationError> {
        if self.is_busy() {
            return Err(ValidationError::Busy);
        }
        let (Some(site_image), Some(swatch), Some(paving_name)) = (
            self.site_image.clone(),
            self.selection.swatch.clone(),
            self.selection.name.clone(),
        ) else {
            return Err(self.reject(ValidationError::MissingInputs));
        };

        self.generating = true;
        self.error = None;
        self.result = None;
        self.instruction.clear();
        self.mask = None;
        Ok(VisualizeJob {
            site_image,
            swatch,
            paving_name,
            epoch: self.job_epoch,
        })
    }

    /// Apply a finished generation. Returns `false` (and changes nothing)
    /// when the photo or paving changed after the job started.
    pub fn finish_visualize(
        &mut self,
        job: VisualizeJob,
        outcome: Result<ImageAsset, GenerationError>,
    ) -> bool {
        if job.epoch != self.job_epoch {
            warn!(paving = %job.paving_name, "discarding stale visualization");
            return false;
        }
        self.generating = false;
        match outcome {
            Ok(image) => {
                self.result = Some(image.clone());
                let description = format!("Initial visualization with {}", job.paving_name);
                self.record(job.site_image, image, job.paving_name, description, true);
            }
            Err(e) => self.error = Some(e.to_string()),
        }
        true
    }

    pub fn set_instruction(&mut self, text: &str) {
        self.instruction = text.to_string();
    }

    /// Set or clear the refinement mask. The mask should already match the
    /// site photo's dimensions.
    pub fn set_mask(&mut self, mask: Option<ImageAsset>) {
        self.mask = mask;
    }

    /// Validate and start a refinement of the current result.
    pub fn begin_refine(&mut self) -> Result<RefineJob, ValidationError> {
        if self.is_busy() {
            return Err(ValidationError::Busy);
        }
        let (true, Some(site_image), Some(swatch), Some(paving_name)) = (
            self.result.is_some(),
            self.site_image.clone(),
            self.selection.swatch.clone(),
            self.selection.name.clone(),
        ) else {
            return Err(self.reject(ValidationError::NothingToRefine));
        };
        let instruction = self.instruction.trim().to_string();
        if instruction.is_empty() {
            return Err(self.reject(ValidationError::EmptyInstruction));
        }

        self.refining = true;
        self.error = None;
        Ok(RefineJob {
            site_image,
            swatch,
            paving_name,
            instruction,
            mask: self.mask.clone(),
            epoch: self.job_epoch,
        })
    }

    /// Apply a finished refinement. On success `outcome` carries the new
    /// image and its description. On failure the previous result stays
    /// visible next to the error. Returns `false` for a stale job, as
    /// [`finish_visualize`](Self::finish_visualize) does.
    pub fn finish_refine(
        &mut self,
        job: RefineJob,
        outcome: Result<(ImageAsset, String), GenerationError>,
    ) -> bool {
        if job.epoch != self.job_epoch {
            warn!(instruction = %job.instruction, "discarding stale refinement");
            return false;
        }
        self.refining = false;
        match outcome {
            Ok((image, description)) => {
                self.result = Some(image.clone());
                self.record(job.site_image, image, job.paving_name, description, false);
                self.instruction.clear();
                self.mask = None;
            }
            Err(e) => self.error = Some(e.to_string()),
        }
        true
    }

    /// Show an error that did not come from a generation call (bad file,
    /// unreachable catalog).
    pub fn report_error(&mut self, message: impl Into<String>) {
        self.error = Some(message.into());
    }

    fn reject(&mut self, err: ValidationError) -> ValidationError {
        self.error = Some(err.to_string());
        err
    }

    fn record(
        &mut self,
        site_image: ImageAsset,
        generated_image: ImageAsset,
        paving_name: String,
        description: String,
        is_initial: bool,
    ) {
        self.entry_counter += 1;
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or_default();
        let entry = GalleryEntry {
            id: format!("session-{millis}-{}", self.entry_counter),
            site_image,
            generated_image,
            paving_name,
            description,
            is_initial,
        };
        self.history.push(entry.clone());
        self.current_entry = Some(entry);
        self.current_saved = false;
    }

    // =========================================================================
    // Gallery
    // =========================================================================

    /// Whether an entry with the same generated image is already saved.
    pub fn is_in_gallery(&self, entry: &GalleryEntry) -> bool {
        self.gallery
            .iter()
            .any(|g| g.generated_image == entry.generated_image)
    }

    /// Save the currently displayed result. Returns `false` when there is
    /// nothing to save or it was already saved.
    pub fn save_current_to_gallery(&mut self) -> bool {
        if self.current_saved {
            return false;
        }
        let Some(entry) = self.current_entry.clone() else {
            return false;
        };
        if !self.is_in_gallery(&entry) {
            self.gallery.push(entry);
        }
        self.current_saved = true;
        true
    }

    /// Copy a history entry into the gallery unless its image is already there.
    pub fn move_to_gallery(&mut self, id: &str) -> bool {
        let Some(entry) = self.history.iter().find(|e| e.id == id).cloned() else {
            return false;
        };
        if self.is_in_gallery(&entry) {
            return false;
        }
        if self.current_entry.as_ref().is_some_and(|c| c.id == entry.id) {
            self.current_saved = true;
        }
        self.gallery.push(entry);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{product, solid_png, tinted_png};

    fn stone(name: &str, id: &str) -> Product {
        product(ProductCategory::Stone, name, id)
    }

    /// State with a site photo and a resolved swatch.
    fn ready_state() -> AppState {
        let mut state = AppState::default();
        state.set_site_image(Some(tinted_png(40, 30, 1)));
        let ticket = state.begin_swatch_load(&stone("Sandstone", "f-1")).unwrap();
        assert!(state.finish_swatch_load(ticket, Ok(tinted_png(8, 8, 2))));
        state
    }

    /// State with one successful initial visualization.
    fn visualized_state() -> AppState {
        let mut state = ready_state();
        let job = state.begin_visualize().unwrap();
        state.finish_visualize(job, Ok(tinted_png(40, 30, 3)));
        state
    }

    // =========================================================================
    // Site photo
    // =========================================================================

    #[test]
    fn new_site_image_resets_result_and_error() {
        let mut state = visualized_state();
        state.report_error("something broke");
        state.set_site_image(Some(tinted_png(40, 30, 9)));

        assert!(state.result().is_none());
        assert!(state.error().is_none());
        assert!(state.current_entry().is_none());
        // The selection survives a new photo
        assert!(state.selection().is_resolved());
    }

    #[test]
    fn new_site_image_clears_gallery_when_resetting() {
        let mut state = visualized_state();
        assert!(state.save_current_to_gallery());
        state.set_site_image(Some(tinted_png(40, 30, 9)));

        assert!(state.history().is_empty());
        assert!(state.gallery().is_empty());
    }

    #[test]
    fn new_site_image_keeps_gallery_when_not_resetting() {
        let mut state = AppState::new(false);
        state.set_site_image(Some(tinted_png(40, 30, 1)));
        let ticket = state.begin_swatch_load(&stone("Sandstone", "f-1")).unwrap();
        state.finish_swatch_load(ticket, Ok(tinted_png(8, 8, 2)));
        let job = state.begin_visualize().unwrap();
        state.finish_visualize(job, Ok(tinted_png(40, 30, 3)));
        state.save_current_to_gallery();

        state.set_site_image(Some(tinted_png(40, 30, 9)));
        assert!(state.result().is_none());
        assert!(state.error().is_none());
        assert_eq!(state.history().len(), 1);
        assert_eq!(state.gallery().len(), 1);
    }

    // =========================================================================
    // Swatch loading
    // =========================================================================

    #[test]
    fn swatch_load_sets_selection() {
        let state = ready_state();
        assert_eq!(state.selection().name.as_deref(), Some("Sandstone"));
        assert_eq!(state.activity(), Activity::Idle);
        assert!(state.can_visualize());
    }

    #[test]
    fn changing_product_resets_result_but_not_site() {
        let mut state = visualized_state();
        state.begin_swatch_load(&stone("Slate", "f-2")).unwrap();

        assert!(state.result().is_none());
        assert!(state.site_image().is_some());
        assert!(!state.selection().is_resolved());
        assert_eq!(state.activity(), Activity::SwatchLoading);
    }

    #[test]
    fn last_selection_wins_when_completions_arrive_in_order() {
        let mut state = AppState::default();
        let first = state.begin_swatch_load(&stone("Sandstone", "f-1")).unwrap();
        let second = state.begin_swatch_load(&stone("Slate", "f-2")).unwrap();

        assert!(!state.finish_swatch_load(first, Ok(tinted_png(8, 8, 10))));
        assert_eq!(state.activity(), Activity::SwatchLoading);
        assert!(state.finish_swatch_load(second, Ok(tinted_png(8, 8, 20))));

        assert_eq!(state.selection().name.as_deref(), Some("Slate"));
        assert_eq!(state.selection().swatch, Some(tinted_png(8, 8, 20)));
        assert_eq!(state.selected_product().unwrap().file_id, "f-2");
    }

    #[test]
    fn last_selection_wins_when_completions_arrive_reversed() {
        let mut state = AppState::default();
        let first = state.begin_swatch_load(&stone("Sandstone", "f-1")).unwrap();
        let second = state.begin_swatch_load(&stone("Slate", "f-2")).unwrap();

        assert!(state.finish_swatch_load(second, Ok(tinted_png(8, 8, 20))));
        assert!(!state.finish_swatch_load(first, Ok(tinted_png(8, 8, 10))));

        assert_eq!(state.selection().name.as_deref(), Some("Slate"));
        assert_eq!(state.activity(), Activity::Idle);
    }

    #[test]
    fn stale_failure_does_not_clobber_newer_selection() {
        let mut state = AppState::default();
        let first = state.begin_swatch_load(&stone("Sandstone", "f-1")).unwrap();
        let second = state.begin_swatch_load(&stone("Slate", "f-2")).unwrap();
        state.finish_swatch_load(second, Ok(tinted_png(8, 8, 20)));
        state.finish_swatch_load(first, Err(SwatchFetchError::Status(500)));

        assert!(state.error().is_none());
        assert!(state.selection().is_resolved());
    }

    #[test]
    fn reselecting_same_product_deselects() {
        let mut state = ready_state();
        assert!(state.begin_swatch_load(&stone("Sandstone", "f-1")).is_none());
        assert!(state.selected_product().is_none());
        assert!(!state.selection().is_resolved());
        assert_eq!(state.activity(), Activity::Idle);
    }

    #[test]
    fn failed_swatch_load_sets_error_and_clears_product() {
        let mut state = AppState::default();
        let ticket = state.begin_swatch_load(&stone("Sandstone", "f-1")).unwrap();
        state.finish_swatch_load(ticket, Err(SwatchFetchError::Feed("gone".into())));

        assert_eq!(state.error(), Some(SWATCH_LOAD_FAILED));
        assert!(state.selected_product().is_none());
        assert_eq!(state.activity(), Activity::Idle);
    }

    #[test]
    fn category_change_invalidates_inflight_load() {
        let mut state = AppState::default();
        let ticket = state.begin_swatch_load(&stone("Sandstone", "f-1")).unwrap();
        state.set_category(ProductCategory::Clay);

        assert!(!state.finish_swatch_load(ticket, Ok(tinted_png(8, 8, 1))));
        assert!(!state.selection().is_resolved());
        assert_eq!(state.category(), ProductCategory::Clay);
        assert_eq!(state.activity(), Activity::Idle);
    }

    #[test]
    fn catalog_failure_is_kept_apart_from_main_error() {
        let mut state = AppState::default();
        state.set_products(Err(CatalogFetchError::Status(503)));
        assert!(state.catalog_error().unwrap().contains("503"));
        assert!(state.error().is_none());
        assert!(state.products().is_empty());
    }

    // =========================================================================
    // Visualize
    // =========================================================================

    #[test]
    fn visualize_requires_site_and_swatch() {
        let mut state = AppState::default();
        assert_eq!(
            state.begin_visualize().unwrap_err(),
            ValidationError::MissingInputs
        );
        assert_eq!(
            state.error(),
            Some("Please upload a site photo and select a paving swatch.")
        );
        assert_eq!(state.activity(), Activity::Idle);
    }

    #[test]
    fn visualize_disabled_while_swatch_loading() {
        let mut state = ready_state();
        state.begin_swatch_load(&stone("Slate", "f-2")).unwrap();
        assert!(!state.can_visualize());
        assert_eq!(state.begin_visualize().unwrap_err(), ValidationError::Busy);
    }

    #[test]
    fn visualize_disabled_while_generating() {
        let mut state = ready_state();
        let _job = state.begin_visualize().unwrap();
        assert_eq!(state.activity(), Activity::Generating);
        assert!(!state.can_visualize());
        assert_eq!(state.begin_visualize().unwrap_err(), ValidationError::Busy);
    }

    #[test]
    fn successful_visualize_records_initial_entry() {
        let state = visualized_state();
        assert_eq!(state.result(), Some(&tinted_png(40, 30, 3)));
        assert_eq!(state.history().len(), 1);

        let entry = &state.history()[0];
        assert!(entry.is_initial);
        assert_eq!(entry.paving_name, "Sandstone");
        assert_eq!(entry.description, "Initial visualization with Sandstone");
        assert_eq!(entry.site_image, tinted_png(40, 30, 1));
        assert!(entry.id.starts_with("session-"));
        assert!(!state.is_current_saved());
    }

    #[test]
    fn failed_visualize_stores_error_without_result() {
        let mut state = ready_state();
        let job = state.begin_visualize().unwrap();
        state.finish_visualize(job, Err(GenerationError::RegionUnavailable));

        assert!(state.result().is_none());
        assert!(state.error().unwrap().contains("not available in your region"));
        assert!(state.history().is_empty());
        assert!(state.can_visualize());
    }

    // =========================================================================
    // Refine
    // =========================================================================

    #[test]
    fn refine_requires_result() {
        let mut state = ready_state();
        state.set_instruction("add a tree");
        assert_eq!(
            state.begin_refine().unwrap_err(),
            ValidationError::NothingToRefine
        );
    }

    #[test]
    fn refine_requires_instruction() {
        let mut state = visualized_state();
        state.set_instruction("   ");
        assert_eq!(
            state.begin_refine().unwrap_err(),
            ValidationError::EmptyInstruction
        );
        assert_eq!(state.activity(), Activity::Idle);
        // The result is still there next to the validation message
        assert!(state.result().is_some());
    }

    #[test]
    fn refine_job_carries_original_photo() {
        let mut state = visualized_state();
        state.set_instruction("  add a tree ");
        let job = state.begin_refine().unwrap();

        assert_eq!(job.site_image, tinted_png(40, 30, 1));
        assert_ne!(Some(&job.site_image), state.result());
        assert_eq!(job.instruction, "add a tree");
        assert_eq!(state.activity(), Activity::Refining);
    }

    #[test]
    fn successful_refine_replaces_result_and_clears_instruction() {
        let mut state = visualized_state();
        state.set_instruction("add a tree");
        state.set_mask(Some(solid_png(40, 30)));
        let job = state.begin_refine().unwrap();
        assert!(job.mask.is_some());
        state.finish_refine(job, Ok((tinted_png(40, 30, 4), "Added a tree".into())));

        assert_eq!(state.result(), Some(&tinted_png(40, 30, 4)));
        assert_eq!(state.instruction(), "");
        assert!(state.mask().is_none());
        assert_eq!(state.history().len(), 2);

        let entry = &state.history()[1];
        assert!(!entry.is_initial);
        assert_eq!(entry.description, "Added a tree");
        assert_eq!(entry.site_image, tinted_png(40, 30, 1));
    }

    #[test]
    fn failed_refine_keeps_previous_result_visible() {
        let mut state = visualized_state();
        state.set_instruction("make it rain");
        let job = state.begin_refine().unwrap();
        state.finish_refine(job, Err(GenerationError::EmptyResponse));

        assert_eq!(state.result(), Some(&tinted_png(40, 30, 3)));
        assert!(state.error().is_some());
        assert_eq!(state.instruction(), "make it rain");
        assert_eq!(state.history().len(), 1);
    }

    #[test]
    fn new_site_image_drops_generation_in_flight() {
        let mut state = ready_state();
        let job = state.begin_visualize().unwrap();
        state.set_site_image(Some(tinted_png(64, 64, 9)));
        assert_eq!(state.activity(), Activity::Idle);

        assert!(!state.finish_visualize(job, Ok(tinted_png(40, 30, 3))));
        assert!(state.result().is_none());
        assert!(state.history().is_empty());
        assert_eq!(state.site_image().unwrap().dimensions(), (64, 64));
        assert!(state.can_visualize());
    }

    #[test]
    fn new_site_image_drops_refinement_in_flight() {
        let mut state = visualized_state();
        state.set_instruction("add a tree");
        let job = state.begin_refine().unwrap();
        state.set_site_image(Some(tinted_png(64, 64, 9)));

        assert!(!state.finish_refine(job, Ok((tinted_png(40, 30, 4), "Added a tree".into()))));
        assert!(state.result().is_none());
        assert!(state.history().is_empty());
        assert_eq!(state.activity(), Activity::Idle);
    }

    #[test]
    fn product_change_drops_generation_in_flight() {
        let mut state = ready_state();
        let job = state.begin_visualize().unwrap();
        let ticket = state.begin_swatch_load(&stone("Slate", "f-2")).unwrap();

        assert!(!state.finish_visualize(job, Ok(tinted_png(40, 30, 3))));
        assert!(state.finish_swatch_load(ticket, Ok(tinted_png(8, 8, 20))));
        assert_eq!(state.selection().name.as_deref(), Some("Slate"));
        assert!(state.result().is_none());
        assert!(state.current_entry().is_none());
        assert!(state.history().is_empty());
    }

    #[test]
    fn deselecting_drops_refinement_in_flight() {
        let mut state = visualized_state();
        state.set_instruction("add a tree");
        let job = state.begin_refine().unwrap();
        assert!(state.begin_swatch_load(&stone("Sandstone", "f-1")).is_none());

        assert!(!state.finish_refine(job, Err(GenerationError::EmptyResponse)));
        assert!(state.error().is_none());
        assert_eq!(state.history().len(), 1);
        assert_eq!(state.activity(), Activity::Idle);
    }

    #[test]
    fn new_visualize_clears_instruction() {
        let mut state = visualized_state();
        state.set_instruction("half-typed edit");
        let _job = state.begin_visualize().unwrap();
        assert_eq!(state.instruction(), "");
        assert!(state.result().is_none());
    }

    // =========================================================================
    // Gallery
    // =========================================================================

    #[test]
    fn save_current_only_once() {
        let mut state = visualized_state();
        assert!(state.save_current_to_gallery());
        assert!(!state.save_current_to_gallery());
        assert_eq!(state.gallery().len(), 1);
        assert!(state.is_current_saved());
    }

    #[test]
    fn save_without_result_does_nothing() {
        let mut state = ready_state();
        assert!(!state.save_current_to_gallery());
        assert!(state.gallery().is_empty());
    }

    #[test]
    fn move_to_gallery_dedupes_by_generated_image() {
        let mut state = visualized_state();
        let id = state.history()[0].id.clone();

        assert!(state.move_to_gallery(&id));
        assert!(!state.move_to_gallery(&id));
        assert!(!state.move_to_gallery("session-unknown"));
        assert_eq!(state.gallery().len(), 1);
        // Moving the displayed result counts as saving it
        assert!(state.is_current_saved());
    }

    #[test]
    fn entry_ids_are_unique() {
        let mut state = visualized_state();
        for text in ["a", "b", "c"] {
            state.set_instruction(text);
            let job = state.begin_refine().unwrap();
            state.finish_refine(job, Ok((tinted_png(40, 30, 5), text.into())));
        }
        let mut ids: Vec<&str> = state.history().iter().map(|e| e.id.as_str()).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 4);
    }
}
