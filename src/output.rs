//! CLI output formatting.
//!
//! # Display Contract
//!
//! Every listed entity gets a header line (3-digit positional index + name)
//! followed by indented context lines. Products, history entries and written
//! files all follow it so the CLI output reads the same everywhere.
//!
//! ## Products
//!
//! ```text
//! Porcelain
//! 001 Silver Grey
//!     File: 1aBcD
//! Stone
//! 001 Indian Sandstone
//!     File: 9xYz
//! ```
//!
//! ## Session
//!
//! ```text
//! Site photo: 1200x900 image/jpeg
//! Paving: Silver Grey
//! History
//! 001 Initial visualization with Silver Grey [saved]
//!     Paving: Silver Grey
//! 002 Added a low wall along the left edge
//!     Paving: Silver Grey
//! Error: The AI returned no image or text. …
//! ```
//!
//! # Architecture
//!
//! Each view has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure.

use crate::catalog::{CATEGORIES, Product, ProductCategory, products_in};
use crate::state::AppState;
use std::path::Path;

// ============================================================================
// Shared display helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// Truncate text to `max` characters, appending `...` if truncated.
fn truncate(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

fn title_case(category: ProductCategory) -> String {
    let name = category.as_str();
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

// ============================================================================
// Products
// ============================================================================

/// Format the catalog, grouped by category in display order.
///
/// With `only` set, just that category is listed. Empty categories are
/// skipped.
pub fn format_products(products: &[Product], only: Option<ProductCategory>) -> Vec<String> {
    let mut lines = Vec::new();
    for category in CATEGORIES {
        if only.is_some_and(|c| c != category) {
            continue;
        }
        let items = products_in(products, category);
        if items.is_empty() {
            continue;
        }
        lines.push(title_case(category));
        for (i, product) in items.iter().enumerate() {
            lines.push(format!("{} {}", format_index(i + 1), product.name));
            lines.push(format!("{}File: {}", indent(1), product.file_id));
        }
    }
    if lines.is_empty() {
        lines.push("No products found".to_string());
    }
    lines
}

pub fn print_products(products: &[Product], only: Option<ProductCategory>) {
    for line in format_products(products, only) {
        println!("{}", line);
    }
}

// ============================================================================
// Session
// ============================================================================

const DESCRIPTION_WIDTH: usize = 72;

/// Format the state of a session: inputs, history, and the current error.
pub fn format_session(state: &AppState) -> Vec<String> {
    let mut lines = Vec::new();

    match state.site_image() {
        Some(site) => lines.push(format!(
            "Site photo: {}x{} {}",
            site.width(),
            site.height(),
            site.media_type()
        )),
        None => lines.push("Site photo: none".to_string()),
    }
    match &state.selection().name {
        Some(name) => lines.push(format!("Paving: {}", name)),
        None => lines.push("Paving: none".to_string()),
    }

    if !state.history().is_empty() {
        lines.push("History".to_string());
        for (i, entry) in state.history().iter().enumerate() {
            let marker = if state.is_in_gallery(entry) {
                " [saved]"
            } else {
                ""
            };
            lines.push(format!(
                "{} {}{}",
                format_index(i + 1),
                truncate(&entry.description, DESCRIPTION_WIDTH),
                marker
            ));
            lines.push(format!("{}Paving: {}", indent(1), entry.paving_name));
        }
    }

    if let Some(error) = state.error() {
        lines.push(format!("Error: {}", error));
    }
    lines
}

pub fn print_session(state: &AppState) {
    for line in format_session(state) {
        println!("{}", line);
    }
}

// ============================================================================
// Written files
// ============================================================================

/// Format the list of files written by an export.
pub fn format_written(files: &[&Path]) -> Vec<String> {
    let mut lines = vec![format!("Wrote {} files", files.len())];
    lines.extend(
        files
            .iter()
            .map(|path| format!("{}{}", indent(1), path.display())),
    );
    lines
}

pub fn print_written(files: &[&Path]) {
    for line in format_written(files) {
        println!("{}", line);
    }
}
