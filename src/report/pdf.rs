//! PDF rendering of a [`ReportLayout`].
//!
//! Uses the standard Helvetica fonts (no embedding) and embeds every image
//! as a baseline RGB JPEG.

use super::ReportError;
use super::layout::{Element, FontStyle, PAGE_HEIGHT, PAGE_WIDTH, Page, layout};
use crate::imaging::{ImageAsset, fit};
use crate::state::GalleryEntry;
use image::DynamicImage;
use image::codecs::jpeg::JpegEncoder;
use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream, StringFormat, dictionary};
use std::path::Path;
use tracing::debug;

const MM_TO_PT: f32 = 72.0 / 25.4;
const JPEG_QUALITY: u8 = 85;

/// Render `entries` as a PDF document.
pub fn render_pdf(entries: &[GalleryEntry], title: &str) -> Result<Vec<u8>, ReportError> {
    if entries.is_empty() {
        return Err(ReportError::EmptyGallery);
    }
    let report = layout(entries, title);

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let fonts = font_dictionary(&mut doc);
    let fonts_id = doc.add_object(fonts);

    let mut kids = Vec::with_capacity(report.pages.len());
    let mut image_count = 0usize;
    for page in &report.pages {
        let page_id = add_page(&mut doc, page, pages_id, fonts_id, &mut image_count)?;
        kids.push(Object::Reference(page_id));
    }

    let page_count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => page_count,
            "MediaBox" => vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Real(PAGE_WIDTH * MM_TO_PT),
                Object::Real(PAGE_HEIGHT * MM_TO_PT),
            ],
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut buf = Vec::new();
    doc.save_to(&mut buf)
        .map_err(|e| ReportError::Pdf(e.to_string()))?;
    debug!(
        pages = page_count,
        images = image_count,
        bytes = buf.len(),
        "report rendered"
    );
    Ok(buf)
}

/// Render `entries` and write the PDF to `path`.
pub fn write_pdf(entries: &[GalleryEntry], title: &str, path: &Path) -> Result<(), ReportError> {
    let bytes = render_pdf(entries, title)?;
    std::fs::write(path, bytes)?;
    Ok(())
}

fn font_dictionary(doc: &mut Document) -> Dictionary {
    let mut fonts = Dictionary::new();
    for style in [FontStyle::Bold, FontStyle::Italic] {
        let (name, base) = font_names(style);
        let id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => base,
            "Encoding" => "WinAnsiEncoding",
        });
        fonts.set(name, id);
    }
    fonts
}

fn font_names(style: FontStyle) -> (&'static str, &'static str) {
    match style {
        FontStyle::Bold => ("FB", "Helvetica-Bold"),
        FontStyle::Italic => ("FI", "Helvetica-Oblique"),
    }
}

fn add_page(
    doc: &mut Document,
    page: &Page<'_>,
    pages_id: ObjectId,
    fonts_id: ObjectId,
    image_count: &mut usize,
) -> Result<ObjectId, ReportError> {
    let mut operations = Vec::new();
    let mut xobjects = Dictionary::new();

    for element in &page.elements {
        match element {
            Element::Text {
                text,
                x,
                y,
                size,
                style,
                grey,
            } => {
                let (font, _) = font_names(*style);
                operations.extend([
                    Operation::new("g", vec![Object::Real(f32::from(*grey) / 255.0)]),
                    Operation::new("BT", vec![]),
                    Operation::new("Tf", vec![Object::Name(font.as_bytes().to_vec()), Object::Real(*size)]),
                    Operation::new("Td", vec![Object::Real(x * MM_TO_PT), Object::Real(flip(*y))]),
                    Operation::new(
                        "Tj",
                        vec![Object::String(win_ansi(text), StringFormat::Literal)],
                    ),
                    Operation::new("ET", vec![]),
                ]);
            }
            Element::Rule { x1, x2, y, grey } => {
                operations.extend([
                    Operation::new("G", vec![Object::Real(f32::from(*grey) / 255.0)]),
                    Operation::new("w", vec![Object::Real(0.6)]),
                    Operation::new("m", vec![Object::Real(x1 * MM_TO_PT), Object::Real(flip(*y))]),
                    Operation::new("l", vec![Object::Real(x2 * MM_TO_PT), Object::Real(flip(*y))]),
                    Operation::new("S", vec![]),
                ]);
            }
            Element::Image {
                image,
                x,
                y,
                width,
                height,
            } => {
                *image_count += 1;
                let name = format!("Im{image_count}");
                let image_id = doc.add_object(jpeg_xobject(image)?);
                xobjects.set(name.as_bytes(), image_id);
                operations.extend([
                    Operation::new("q", vec![]),
                    Operation::new(
                        "cm",
                        vec![
                            Object::Real(width * MM_TO_PT),
                            Object::Integer(0),
                            Object::Integer(0),
                            Object::Real(height * MM_TO_PT),
                            Object::Real(x * MM_TO_PT),
                            Object::Real(flip(y + height)),
                        ],
                    ),
                    Operation::new("Do", vec![Object::Name(name.into_bytes())]),
                    Operation::new("Q", vec![]),
                ]);
            }
        }
    }

    let content = Content { operations }
        .encode()
        .map_err(|e| ReportError::Pdf(e.to_string()))?;
    let content_id = doc.add_object(Stream::new(dictionary! {}, content));

    Ok(doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Contents" => content_id,
        "Resources" => dictionary! {
            "Font" => fonts_id,
            "XObject" => xobjects,
        },
    }))
}

/// Millimetres from the top to points from the bottom.
fn flip(y_mm: f32) -> f32 {
    (PAGE_HEIGHT - y_mm) * MM_TO_PT
}

fn jpeg_xobject(asset: &ImageAsset) -> Result<Stream, ReportError> {
    let rgb = DynamicImage::ImageRgb8(fit::decode(asset)?.to_rgb8());
    let mut data = Vec::new();
    rgb.write_with_encoder(JpegEncoder::new_with_quality(&mut data, JPEG_QUALITY))
        .map_err(|e| ReportError::Pdf(e.to_string()))?;

    Ok(Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => i64::from(rgb.width()),
            "Height" => i64::from(rgb.height()),
            "ColorSpace" => "DeviceRGB",
            "BitsPerComponent" => 8i64,
            "Filter" => "DCTDecode",
        },
        data,
    ))
}

/// Encode for WinAnsiEncoding. Latin-1 maps to itself and the typographic
/// characters WinAnsi places in 0x80..=0x9F map to their codes. Controls and
/// anything else become `?`.
fn win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| match c {
            '\u{20AC}' => 0x80,
            '\u{201A}' => 0x82,
            '\u{0192}' => 0x83,
            '\u{201E}' => 0x84,
            '\u{2026}' => 0x85,
            '\u{2020}' => 0x86,
            '\u{2021}' => 0x87,
            '\u{02C6}' => 0x88,
            '\u{2030}' => 0x89,
            '\u{0160}' => 0x8A,
            '\u{2039}' => 0x8B,
            '\u{0152}' => 0x8C,
            '\u{017D}' => 0x8E,
            '\u{2018}' => 0x91,
            '\u{2019}' => 0x92,
            '\u{201C}' => 0x93,
            '\u{201D}' => 0x94,
            '\u{2022}' => 0x95,
            '\u{2013}' => 0x96,
            '\u{2014}' => 0x97,
            '\u{02DC}' => 0x98,
            '\u{2122}' => 0x99,
            '\u{0161}' => 0x9A,
            '\u{203A}' => 0x9B,
            '\u{0153}' => 0x9C,
            '\u{017E}' => 0x9E,
            '\u{0178}' => 0x9F,
            c if c.is_control() => b'?',
            c if (c as u32) < 0x100 => c as u32 as u8,
            _ => b'?',
        })
        .collect()
}
