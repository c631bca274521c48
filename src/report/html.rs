//! Standalone HTML gallery page.
//!
//! Same grouping as the PDF report, but as a single self-contained file:
//! every image is inlined as a data URL and has a download link.

use super::download_file_name;
use super::layout::{group_by_site, subtitle};
use crate::state::GalleryEntry;
use maud::{DOCTYPE, Markup, html};

const CSS: &str = include_str!("../../static/gallery.css");

/// Render the gallery page for `entries`.
pub fn render_html(entries: &[GalleryEntry], title: &str) -> String {
    let content = html! {
        h1 { (title) }
        @if entries.is_empty() {
            p.empty { "No saved designs yet." }
        }
        @for (index, group) in group_by_site(entries).into_iter().enumerate() {
            section.project {
                h2 { "Project " (index + 1) ": Original Site Photo" }
                div.project-site {
                    img src=(group.site_image.data_url()) alt="Original site photo";
                }
                div.gallery-grid {
                    @for entry in group.entries {
                        (gallery_card(entry))
                    }
                }
            }
        }
    };
    base_document(title, content).into_string()
}

fn base_document(title: &str, content: Markup) -> Markup {
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="UTF-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                title { (title) }
                style { (CSS) }
            }
            body {
                main { (content) }
            }
        }
    }
}

fn gallery_card(entry: &GalleryEntry) -> Markup {
    let data_url = entry.generated_image.data_url();
    html! {
        figure.gallery-card id=(entry.id) {
            img src=(data_url) alt=(entry.description) loading="lazy";
            figcaption.caption {
                p.description title=(entry.description) { (subtitle(entry)) }
                p.paving { "Paving: " (entry.paving_name) }
                a.download href=(data_url) download=(download_file_name(entry)) {
                    "Download"
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::tinted_png;

    fn entry(id: &str, description: &str, initial: bool) -> GalleryEntry {
        GalleryEntry {
            id: id.to_string(),
            site_image: tinted_png(20, 10, 1),
            generated_image: tinted_png(20, 10, 2),
            paving_name: "Silver Grey".to_string(),
            description: description.to_string(),
            is_initial: initial,
        }
    }

    #[test]
    fn page_is_a_complete_document() {
        let html = render_html(&[entry("session-1-1", "Initial", true)], "My Garden");
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("<title>My Garden</title>"));
        assert!(html.contains(r#"<div class="gallery-grid">"#));
    }

    #[test]
    fn cards_inline_images_with_download_names() {
        let html = render_html(&[entry("session-1-1", "Initial", true)], "Report");
        assert!(html.contains("data:image/png;base64,"));
        assert!(html.contains(r#"download="Silver_Grey_session-1-1.png""#));
        assert!(html.contains("Project 1: Original Site Photo"));
        assert!(html.contains("Paving: Silver Grey"));
    }

    #[test]
    fn refinement_descriptions_are_escaped() {
        let html = render_html(&[entry("id", "Added <b>bold</b> edging", false)], "Report");
        assert!(html.contains("Added &lt;b&gt;bold&lt;/b&gt; edging"));
        assert!(!html.contains("<b>bold</b>"));
    }

    #[test]
    fn empty_gallery_renders_placeholder() {
        let html = render_html(&[], "Report");
        assert!(html.contains("No saved designs yet."));
        assert!(!html.contains("<figure"));
    }
}
