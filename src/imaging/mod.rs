//! Image handling in pure Rust via the `image` crate.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Identify** | `ImageReader::with_guessed_format` + `into_dimensions` |
//! | **Data URLs** | `base64` standard engine |
//! | **Cover + crop** | `resize_exact` (Lanczos3) + `crop_imm` |
//! | **Re-encode** | `JpegEncoder` / `write_to` in the source format |
//!
//! The module is split into:
//! - **Asset**: [`ImageAsset`], the immutable encoded image passed everywhere
//! - **Ingest**: reading user files into assets
//! - **Calculations**: Pure functions for dimension math (unit testable)
//! - **Fit**: dimension correction for generated images

pub mod asset;
mod calculations;
pub mod fit;
pub mod ingest;

pub use asset::{ImageAsset, InvalidImageError};
pub use calculations::{CoverPlan, calculate_cover, scaled_height};
pub use fit::{FitError, fit_to_dimensions};
