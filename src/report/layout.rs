//! Page layout for the PDF report.
//!
//! Pure: turns gallery entries into positioned text, rules and images on A4
//! pages. All coordinates are millimetres from the top-left corner of the
//! page; text `y` is the baseline.
//!
//! ```text
//! ┌──────────────────────────────┐
//! │    AI Paving Design Report   │  22pt bold, centered
//! │ ──────────────────────────── │
//! │ Project 1: Original Site Ph… │  14pt bold
//! │ ┌──────────────────────────┐ │
//! │ │        site photo        │ │  full content width
//! │ └──────────────────────────┘ │
//! │ ──────────────────────────── │
//! │ Generated Image #1           │
//! │ Paving: Silver Grey          │  10pt italic, grey
//! │ ┌──────────────────────────┐ │
//! │ │          result          │ │
//! ```
//!
//! Entries are grouped by site photo. Every group after the first starts on
//! a new page, and any block that would run past the bottom of the page
//! moves to the next one.

use crate::imaging::{ImageAsset, scaled_height};
use crate::state::GalleryEntry;
use sha2::{Digest, Sha256};

pub const PAGE_WIDTH: f32 = 210.0;
pub const PAGE_HEIGHT: f32 = 297.0;
pub const MARGIN: f32 = 15.0;
pub const TOP: f32 = 20.0;
pub const CONTENT_WIDTH: f32 = PAGE_WIDTH - 2.0 * MARGIN;

const TITLE_SIZE: f32 = 22.0;
const HEADING_SIZE: f32 = 14.0;
const SUBTITLE_SIZE: f32 = 10.0;
const SUBTITLE_LINE_HEIGHT: f32 = 4.0;
const SUBTITLE_GREY: u8 = 100;
const BLOCK_SPACING: f32 = 12.0;

/// Average Helvetica glyph width as a fraction of the font size.
const AVG_GLYPH_EM: f32 = 0.5;
const PT_TO_MM: f32 = 25.4 / 72.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontStyle {
    Bold,
    Italic,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Element<'a> {
    Text {
        text: String,
        x: f32,
        y: f32,
        size: f32,
        style: FontStyle,
        /// 0 is black, 255 white.
        grey: u8,
    },
    Rule {
        x1: f32,
        x2: f32,
        y: f32,
        grey: u8,
    },
    Image {
        image: &'a ImageAsset,
        x: f32,
        y: f32,
        width: f32,
        height: f32,
    },
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page<'a> {
    pub elements: Vec<Element<'a>>,
}

impl Page<'_> {
    /// Text of every element on the page, in drawing order.
    pub fn texts(&self) -> Vec<&str> {
        self.elements
            .iter()
            .filter_map(|e| match e {
                Element::Text { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn image_count(&self) -> usize {
        self.elements
            .iter()
            .filter(|e| matches!(e, Element::Image { .. }))
            .count()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReportLayout<'a> {
    pub pages: Vec<Page<'a>>,
}

/// Entries sharing one site photo, in gallery order.
#[derive(Debug)]
pub struct ProjectGroup<'a> {
    pub site_image: &'a ImageAsset,
    pub entries: Vec<&'a GalleryEntry>,
}

/// Group entries by site photo content, groups in order of first appearance.
pub fn group_by_site(entries: &[GalleryEntry]) -> Vec<ProjectGroup<'_>> {
    let mut keys: Vec<Vec<u8>> = Vec::new();
    let mut groups: Vec<ProjectGroup<'_>> = Vec::new();
    for entry in entries {
        let key = Sha256::digest(entry.site_image.data().as_bytes()).to_vec();
        match keys.iter().position(|k| *k == key) {
            Some(i) => groups[i].entries.push(entry),
            None => {
                keys.push(key);
                groups.push(ProjectGroup {
                    site_image: &entry.site_image,
                    entries: vec![entry],
                });
            }
        }
    }
    groups
}

/// Caption under a generated image's heading.
pub fn subtitle(entry: &GalleryEntry) -> String {
    if entry.is_initial {
        format!("Paving: {}", entry.paving_name)
    } else {
        format!("Change Applied: \"{}\"", entry.description)
    }
}

/// Estimated rendered width of `text` in millimetres.
pub fn text_width(text: &str, size: f32) -> f32 {
    text.chars().count() as f32 * size * AVG_GLYPH_EM * PT_TO_MM
}

/// Greedy word wrap to `max_width` millimetres. Words longer than a line
/// are kept whole.
pub fn wrap_text(text: &str, max_width: f32, size: f32) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        let candidate = if current.is_empty() {
            word.to_string()
        } else {
            format!("{current} {word}")
        };
        if text_width(&candidate, size) > max_width && !current.is_empty() {
            lines.push(std::mem::replace(&mut current, word.to_string()));
        } else {
            current = candidate;
        }
    }
    if !current.is_empty() || lines.is_empty() {
        lines.push(current);
    }
    lines
}

struct Cursor<'a> {
    pages: Vec<Page<'a>>,
    y: f32,
}

impl<'a> Cursor<'a> {
    fn push(&mut self, element: Element<'a>) {
        if let Some(page) = self.pages.last_mut() {
            page.elements.push(element);
        }
    }

    fn new_page(&mut self) {
        self.pages.push(Page::default());
        self.y = TOP;
    }

    fn rule(&mut self, inset: f32, grey: u8) {
        self.push(Element::Rule {
            x1: MARGIN + inset,
            x2: PAGE_WIDTH - MARGIN - inset,
            y: self.y,
            grey,
        });
    }

    fn image_block(&mut self, image: &'a ImageAsset, heading: String, caption: Option<String>) {
        let caption_lines = caption
            .as_deref()
            .map(|c| wrap_text(c, CONTENT_WIDTH, SUBTITLE_SIZE))
            .unwrap_or_default();
        let title_height = if caption.is_some() { 12.0 } else { 7.0 };

        let mut width = CONTENT_WIDTH;
        let mut height = scaled_height(image.dimensions(), CONTENT_WIDTH);
        // Blocks taller than a whole page are shrunk to fit one
        let max_height = PAGE_HEIGHT - TOP - title_height - BLOCK_SPACING;
        if height > max_height {
            width *= max_height / height;
            height = max_height;
        }

        if self.y + height + title_height + BLOCK_SPACING > PAGE_HEIGHT {
            self.new_page();
        }

        self.push(Element::Text {
            text: heading,
            x: MARGIN,
            y: self.y,
            size: HEADING_SIZE,
            style: FontStyle::Bold,
            grey: 0,
        });
        self.y += 6.0;

        if !caption_lines.is_empty() {
            let count = caption_lines.len();
            for (i, line) in caption_lines.into_iter().enumerate() {
                self.push(Element::Text {
                    text: line,
                    x: MARGIN,
                    y: self.y + i as f32 * SUBTITLE_LINE_HEIGHT,
                    size: SUBTITLE_SIZE,
                    style: FontStyle::Italic,
                    grey: SUBTITLE_GREY,
                });
            }
            self.y += count as f32 * SUBTITLE_LINE_HEIGHT + 2.0;
        }

        self.push(Element::Image {
            image,
            x: MARGIN,
            y: self.y,
            width,
            height,
        });
        self.y += height + BLOCK_SPACING;
    }
}

/// Lay out the report for `entries` under `title`.
pub fn layout<'a>(entries: &'a [GalleryEntry], title: &str) -> ReportLayout<'a> {
    let mut cursor = Cursor {
        pages: vec![Page::default()],
        y: TOP,
    };

    cursor.push(Element::Text {
        text: title.to_string(),
        x: (PAGE_WIDTH - text_width(title, TITLE_SIZE)) / 2.0,
        y: cursor.y,
        size: TITLE_SIZE,
        style: FontStyle::Bold,
        grey: 0,
    });
    cursor.y += 15.0;

    for (group_index, group) in group_by_site(entries).into_iter().enumerate() {
        if group_index > 0 {
            cursor.new_page();
        }
        cursor.y += 5.0;
        cursor.rule(0.0, 200);
        cursor.y += 15.0;

        cursor.image_block(
            group.site_image,
            format!("Project {}: Original Site Photo", group_index + 1),
            None,
        );

        cursor.rule(0.0, 220);
        cursor.y += 10.0;

        let count = group.entries.len();
        for (i, entry) in group.entries.into_iter().enumerate() {
            cursor.image_block(
                &entry.generated_image,
                format!("Generated Image #{}", i + 1),
                Some(subtitle(entry)),
            );
            if i + 1 < count {
                cursor.y += 5.0;
                cursor.rule(20.0, 240);
                cursor.y += 15.0;
            }
        }
    }

    ReportLayout {
        pages: cursor.pages,
    }
}
