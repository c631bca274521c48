//! # Paveviz
//!
//! Paving visualizer: take a photo of a garden, patio or driveway, pick a
//! paving product, and get back the same photo with the ground re-paved in
//! that product. Follow-up instructions refine the result, saved results
//! form a gallery, and the gallery exports as a PDF report.
//!
//! # Flow
//!
//! ```text
//! site photo ──┐
//!              ├─► Visualizer ──► result ──► history ──► gallery ──► report (PDF / HTML)
//! swatch ──────┘        ▲                        │
//!                       └──── refine(original photo + instruction)
//! ```
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`imaging`] | `ImageAsset`, file ingestion, cover-scale math, dimension correction |
//! | [`catalog`] | Product feed client: product list and lazily fetched swatches |
//! | [`generation`] | Wire types, HTTP client, error taxonomy and prompts for the generation service |
//! | [`visualize`] | Initial generation, refinement and refinement summaries |
//! | [`state`] | Pure application state transitions |
//! | [`session`] | Async driver sequencing state transitions around service calls |
//! | [`report`] | PDF report and HTML gallery export |
//! | [`config`] | `paveviz.toml` loading, merging and validation |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Refinements Start From the Original Photo
//!
//! Feeding each result back into the model compounds small framing and
//! scale shifts. Every refinement therefore re-sends the uploaded photo
//! with the full paving instruction plus the user's edit. History entries
//! always reference the uploaded photo, never an intermediate result.
//!
//! ## Results Match the Photo Pixel for Pixel
//!
//! The model is asked for the photo's exact size but may answer with any
//! size. Results are scaled to cover and center-cropped before anyone sees
//! them, so before/after comparisons line up.
//!
//! ## State Without I/O
//!
//! [`state::AppState`] owns every piece of session data and performs no
//! I/O. Actions that need a service call are split into `begin_*` and
//! `finish_*` halves, which keeps overlap rules (busy guards, last swatch
//! wins) testable without a runtime.
//!
//! ## Services Behind Traits
//!
//! The catalog and the generation service sit behind
//! [`catalog::ProductCatalog`] and [`generation::GenerativeModel`]. Tests
//! drive the whole session against recording mocks.

pub mod catalog;
pub mod config;
pub mod generation;
pub mod imaging;
pub mod output;
pub mod report;
pub mod session;
pub mod state;
pub mod visualize;

#[cfg(test)]
pub(crate) mod test_helpers;
