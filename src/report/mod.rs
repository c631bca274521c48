//! Exporting saved designs.
//!
//! - **Layout**: pure page layout of the PDF report ([`layout::layout`])
//! - **PDF**: [`render_pdf`] / [`write_pdf`]
//! - **HTML**: [`render_html`], a self-contained gallery page
//!
//! Both formats group entries by site photo, so every project shows its
//! original photo once followed by its generated variants in the order
//! they were saved.

pub mod html;
pub mod layout;
pub mod pdf;

pub use html::render_html;
pub use pdf::{render_pdf, write_pdf};

use crate::imaging::InvalidImageError;
use crate::state::GalleryEntry;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("There are no saved designs to export.")]
    EmptyGallery,
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Could not embed image: {0}")]
    Image(#[from] InvalidImageError),
    #[error("PDF error: {0}")]
    Pdf(String),
}

/// File name for downloading an entry's generated image:
/// `Indian_Sandstone_session-1700000000000-1.png` for paving
/// "Indian Sandstone".
pub fn download_file_name(entry: &GalleryEntry) -> String {
    format!(
        "{}_{}.{}",
        entry.paving_name.replace(' ', "_"),
        entry.id,
        entry.generated_image.extension()
    )
}
