//! Product catalog client.
//!
//! Paving products come from a spreadsheet-backed JSON feed. The feed has two
//! shapes on one URL:
//!
//! ```text
//! GET <feed>                 → [ { product_type, product_name, product_img_url, product_file_id }, … ]
//!                            | { "error": "…" }
//! GET <feed>?fileId=<handle> → { "product_img_dataUrl": "data:image/jpeg;base64,…" }
//!                            | { "error": "…" }
//! ```
//!
//! The list is cheap (thumbnail URLs only); the full-resolution swatch is
//! fetched lazily when a product is picked. An `error` field in either body
//! is a failure, never an empty result. List rows that do not parse as a
//! product (say an unknown `product_type`) are skipped with a warning.

use crate::imaging::ImageAsset;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::future::Future;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Error, Debug)]
pub enum CatalogFetchError {
    #[error("Network error: Failed to fetch product list ({0}).")]
    Network(String),
    #[error("Network error: Failed to fetch product list (status: {0}).")]
    Status(u16),
    #[error("An error occurred in the product feed: {0}")]
    Feed(String),
    #[error("Malformed product feed response: {0}")]
    Malformed(String),
}

#[derive(Error, Debug)]
pub enum SwatchFetchError {
    #[error("Failed to fetch swatch data ({0}).")]
    Network(String),
    #[error("Failed to fetch swatch data (status: {0}).")]
    Status(u16),
    #[error("An error occurred in the product feed: {0}")]
    Feed(String),
    #[error("Malformed swatch response: {0}")]
    Malformed(String),
}

/// Paving material family, used to group the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProductCategory {
    Porcelain,
    Stone,
    Clay,
}

/// Categories in display order.
pub const CATEGORIES: [ProductCategory; 3] = [
    ProductCategory::Porcelain,
    ProductCategory::Stone,
    ProductCategory::Clay,
];

impl ProductCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            ProductCategory::Porcelain => "porcelain",
            ProductCategory::Stone => "stone",
            ProductCategory::Clay => "clay",
        }
    }
}

impl fmt::Display for ProductCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ProductCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CATEGORIES
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown category '{s}' (expected porcelain, stone or clay)"))
    }
}

/// One catalog entry. Read-only in this application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    #[serde(rename = "product_type")]
    pub category: ProductCategory,
    #[serde(rename = "product_name")]
    pub name: String,
    /// Small preview image, for listing only.
    #[serde(rename = "product_img_url")]
    pub thumbnail_url: String,
    /// Opaque handle used to fetch the full swatch.
    #[serde(rename = "product_file_id")]
    pub file_id: String,
}

/// Products of one category, in feed order.
pub fn products_in(products: &[Product], category: ProductCategory) -> Vec<&Product> {
    products.iter().filter(|p| p.category == category).collect()
}

/// Source of paving products and their swatches.
pub trait ProductCatalog: Sync {
    fn list_products(&self) -> impl Future<Output = Result<Vec<Product>, CatalogFetchError>> + Send;

    fn fetch_swatch(
        &self,
        product: &Product,
    ) -> impl Future<Output = Result<ImageAsset, SwatchFetchError>> + Send;
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ListBody {
    Rows(Vec<serde_json::Value>),
    Error { error: String },
}

#[derive(Deserialize)]
struct SwatchBody {
    #[serde(rename = "product_img_dataUrl")]
    data_url: Option<String>,
    error: Option<String>,
}

/// Parse the body of the product list request.
pub fn parse_product_list(body: &str) -> Result<Vec<Product>, CatalogFetchError> {
    match serde_json::from_str::<ListBody>(body) {
        Ok(ListBody::Rows(rows)) => Ok(rows
            .into_iter()
            .filter_map(|row| match Product::deserialize(&row) {
                Ok(product) => Some(product),
                Err(e) => {
                    warn!(row = %row, error = %e, "skipping unreadable catalog row");
                    None
                }
            })
            .collect()),
        Ok(ListBody::Error { error }) => Err(CatalogFetchError::Feed(error)),
        Err(e) => Err(CatalogFetchError::Malformed(e.to_string())),
    }
}

/// Parse the body of a swatch request into an image.
pub fn parse_swatch(body: &str) -> Result<ImageAsset, SwatchFetchError> {
    let parsed: SwatchBody =
        serde_json::from_str(body).map_err(|e| SwatchFetchError::Malformed(e.to_string()))?;
    if let Some(error) = parsed.error {
        return Err(SwatchFetchError::Feed(error));
    }
    let data_url = parsed
        .data_url
        .ok_or_else(|| SwatchFetchError::Malformed("missing product_img_dataUrl".into()))?;
    ImageAsset::from_data_url(&data_url).map_err(|e| SwatchFetchError::Malformed(e.to_string()))
}

/// HTTP client for the spreadsheet-backed feed.
pub struct FeedClient {
    feed_url: String,
    http: reqwest::Client,
}

impl FeedClient {
    pub fn new(feed_url: &str) -> Self {
        Self {
            feed_url: feed_url.to_string(),
            http: reqwest::Client::new(),
        }
    }
}

impl ProductCatalog for FeedClient {
    async fn list_products(&self) -> Result<Vec<Product>, CatalogFetchError> {
        debug!(url = %self.feed_url, "fetching product list");
        let response = self
            .http
            .get(&self.feed_url)
            .send()
            .await
            .map_err(|e| CatalogFetchError::Network(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(CatalogFetchError::Status(status.as_u16()));
        }
        let body = response
            .text()
            .await
            .map_err(|e| CatalogFetchError::Network(e.to_string()))?;
        let products = parse_product_list(&body)?;
        debug!(count = products.len(), "product list loaded");
        Ok(products)
    }

    async fn fetch_swatch(&self, product: &Product) -> Result<ImageAsset, SwatchFetchError> {
        debug!(file_id = %product.file_id, name = %product.name, "fetching swatch");
        let response = self
            .http
            .get(&self.feed_url)
            .query(&[("fileId", product.file_id.as_str())])
            .send()
            .await
            .map_err(|e| SwatchFetchError::Network(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(SwatchFetchError::Status(status.as_u16()));
        }
        let body = response
            .text()
            .await
            .map_err(|e| SwatchFetchError::Network(e.to_string()))?;
        parse_swatch(&body)
    }
}
