//! Shared test utilities for the paveviz test suite.
//!
//! Provides in-memory image fixtures, canned service responses, and
//! recording mocks for the two service seams ([`GenerativeModel`] and
//! [`ProductCatalog`]).
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let site = solid_png(800, 600);
//! let model = MockModel::with_responses(vec![Ok(image_response(&solid_png(400, 400)))]);
//! let viz = Visualizer::new(model, &GenerationConfig::default());
//!
//! let result = viz.generate_initial(&site, &solid_png(64, 64)).await.unwrap();
//! assert_eq!(result.dimensions(), (800, 600));
//! assert_eq!(viz.model().calls().len(), 1);
//! ```

use std::collections::{HashMap, VecDeque};
use std::io::Cursor;
use std::sync::Mutex;

use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use serde_json::json;

use crate::catalog::{
    CatalogFetchError, Product, ProductCatalog, ProductCategory, SwatchFetchError,
};
use crate::generation::{
    GenerateContentRequest, GenerateContentResponse, GenerationError, GenerativeModel,
};
use crate::imaging::ImageAsset;

// =========================================================================
// Image fixtures
// =========================================================================

fn encode(img: RgbImage, format: ImageFormat) -> Vec<u8> {
    let mut buf = Vec::new();
    DynamicImage::ImageRgb8(img)
        .write_to(&mut Cursor::new(&mut buf), format)
        .unwrap();
    buf
}

/// PNG bytes of a uniform mid-grey image.
pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    encode(
        RgbImage::from_pixel(width, height, Rgb([128, 128, 128])),
        ImageFormat::Png,
    )
}

/// JPEG bytes of a uniform mid-grey image.
pub fn jpeg_bytes(width: u32, height: u32) -> Vec<u8> {
    encode(
        RgbImage::from_pixel(width, height, Rgb([128, 128, 128])),
        ImageFormat::Jpeg,
    )
}

pub fn solid_png(width: u32, height: u32) -> ImageAsset {
    ImageAsset::from_bytes(&png_bytes(width, height), "image/png").unwrap()
}

pub fn solid_jpeg(width: u32, height: u32) -> ImageAsset {
    ImageAsset::from_bytes(&jpeg_bytes(width, height), "image/jpeg").unwrap()
}

/// A PNG with a distinct fill colour, so two fixtures of equal size differ.
pub fn tinted_png(width: u32, height: u32, shade: u8) -> ImageAsset {
    let bytes = encode(
        RgbImage::from_pixel(width, height, Rgb([shade, 255 - shade, shade / 2])),
        ImageFormat::Png,
    );
    ImageAsset::from_bytes(&bytes, "image/png").unwrap()
}

/// Left half black, right half white.
pub fn two_tone_png(width: u32, height: u32) -> ImageAsset {
    let img = RgbImage::from_fn(width, height, |x, _| {
        if x < width / 2 {
            Rgb([0, 0, 0])
        } else {
            Rgb([255, 255, 255])
        }
    });
    ImageAsset::from_bytes(&encode(img, ImageFormat::Png), "image/png").unwrap()
}

// =========================================================================
// Canned generation responses
// =========================================================================

/// A successful response carrying `image` as its only part.
pub fn image_response(image: &ImageAsset) -> GenerateContentResponse {
    serde_json::from_value(json!({
        "candidates": [{
            "content": { "role": "model", "parts": [
                { "inlineData": { "mimeType": image.media_type(), "data": image.data() } }
            ]},
            "finishReason": "STOP"
        }]
    }))
    .unwrap()
}

/// A successful response carrying only text.
pub fn text_response(text: &str) -> GenerateContentResponse {
    serde_json::from_value(json!({
        "candidates": [{
            "content": { "role": "model", "parts": [ { "text": text } ] },
            "finishReason": "STOP"
        }]
    }))
    .unwrap()
}

// =========================================================================
// Mock generation service
// =========================================================================

/// One recorded `generate_content` call.
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub model: String,
    pub request: GenerateContentRequest,
}

impl RecordedCall {
    /// Base64 payloads of the inline images, in request order.
    pub fn image_payloads(&self) -> Vec<String> {
        self.request
            .inline_images()
            .into_iter()
            .map(|i| i.data.clone())
            .collect()
    }
}

/// Mock model that replays queued responses in call order and records
/// every request. Uses Mutex (not RefCell) so it is Sync.
#[derive(Default)]
pub struct MockModel {
    responses: Mutex<VecDeque<Result<GenerateContentResponse, GenerationError>>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl MockModel {
    pub fn with_responses(
        responses: Vec<Result<GenerateContentResponse, GenerationError>>,
    ) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }
}

impl GenerativeModel for MockModel {
    async fn generate_content(
        &self,
        model: &str,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse, GenerationError> {
        self.calls.lock().unwrap().push(RecordedCall {
            model: model.to_string(),
            request: request.clone(),
        });
        let next = self.responses.lock().unwrap().pop_front();
        next.unwrap_or_else(|| Err(GenerationError::Transport("no mock response queued".into())))
    }
}

// =========================================================================
// Mock catalog
// =========================================================================

pub fn product(category: ProductCategory, name: &str, file_id: &str) -> Product {
    Product {
        category,
        name: name.to_string(),
        thumbnail_url: format!("https://cdn.test/{file_id}.jpg"),
        file_id: file_id.to_string(),
    }
}

/// Mock catalog serving fixed products and per-handle swatches.
#[derive(Default)]
pub struct MockCatalog {
    pub products: Vec<Product>,
    swatches: HashMap<String, ImageAsset>,
    fetched: Mutex<Vec<String>>,
}

impl MockCatalog {
    pub fn new(products: Vec<Product>) -> Self {
        Self {
            products,
            ..Self::default()
        }
    }

    pub fn with_swatch(mut self, file_id: &str, swatch: ImageAsset) -> Self {
        self.swatches.insert(file_id.to_string(), swatch);
        self
    }

    pub fn fetched(&self) -> Vec<String> {
        self.fetched.lock().unwrap().clone()
    }
}

impl ProductCatalog for MockCatalog {
    async fn list_products(&self) -> Result<Vec<Product>, CatalogFetchError> {
        if self.products.is_empty() {
            return Err(CatalogFetchError::Feed("no products configured".into()));
        }
        Ok(self.products.clone())
    }

    async fn fetch_swatch(&self, product: &Product) -> Result<ImageAsset, SwatchFetchError> {
        self.fetched.lock().unwrap().push(product.file_id.clone());
        self.swatches
            .get(&product.file_id)
            .cloned()
            .ok_or_else(|| SwatchFetchError::Feed(format!("file {} not found", product.file_id)))
    }
}
