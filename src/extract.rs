//! Structured text extraction from raw HTML.
//!
//! Pulls a title, a description, and a markdown-flavored body out of a page:
//! headings (`h1`–`h6`) become `#`-prefixed lines, paragraphs stay plain
//! text, everything else is dropped. Extraction is deterministic and never
//! fails; missing pieces fall back to fixed sentinels.

use scraper::{ElementRef, Html, Selector};

/// Sentinel returned when a page has neither a `<title>` nor an `<h1>`.
pub const NO_TITLE: &str = "No title found";

/// Sentinel returned when no meta description or paragraph is present.
pub const NO_DESCRIPTION: &str = "No description available";

/// Maximum description length before truncation.
const DESCRIPTION_LIMIT: usize = 160;

/// Structured content extracted from markup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedContent {
    pub title: String,
    pub description: String,
    pub content: String,
}

struct Selectors {
    title: Selector,
    h1: Selector,
    meta_description: Selector,
    og_description: Selector,
    first_paragraph: Selector,
    blocks: Selector,
}

impl Selectors {
    fn new() -> Self {
        Self {
            title: Selector::parse("title").expect("title selector"),
            h1: Selector::parse("h1").expect("h1 selector"),
            meta_description: Selector::parse(r#"meta[name="description"]"#)
                .expect("meta description selector"),
            og_description: Selector::parse(r#"meta[property="og:description"]"#)
                .expect("og description selector"),
            first_paragraph: Selector::parse("p").expect("p selector"),
            blocks: Selector::parse("h1, h2, h3, h4, h5, h6, p").expect("block selector"),
        }
    }
}

/// Extract `{title, description, content}` from raw markup.
///
/// Repeated calls on identical input yield identical output. Malformed
/// markup is handled by the HTML5 parser's error recovery rather than
/// surfaced as an error.
pub fn extract(markup: &str) -> ExtractedContent {
    let document = Html::parse_document(markup);
    let selectors = Selectors::new();

    ExtractedContent {
        title: extract_title(&document, &selectors),
        description: extract_description(&document, &selectors),
        content: extract_content(&document, &selectors),
    }
}

fn extract_title(document: &Html, selectors: &Selectors) -> String {
    if let Some(title) = document.select(&selectors.title).next() {
        let text = element_text(&title);
        if !text.is_empty() {
            return text;
        }
    }

    // Fall back to the first h1 when there is no usable title tag.
    if let Some(h1) = document.select(&selectors.h1).next() {
        return element_text(&h1);
    }

    NO_TITLE.to_string()
}

fn extract_description(document: &Html, selectors: &Selectors) -> String {
    for selector in [&selectors.meta_description, &selectors.og_description] {
        if let Some(meta) = document.select(selector).next() {
            if let Some(content) = meta.value().attr("content") {
                let trimmed = content.trim();
                if !trimmed.is_empty() {
                    return trimmed.to_string();
                }
            }
        }
    }

    // Fall back to the first paragraph, capped at 160 characters.
    if let Some(p) = document.select(&selectors.first_paragraph).next() {
        let text = element_text(&p);
        if text.chars().count() > DESCRIPTION_LIMIT {
            let truncated: String = text.chars().take(DESCRIPTION_LIMIT).collect();
            return format!("{}...", truncated);
        }
        return text;
    }

    NO_DESCRIPTION.to_string()
}

fn extract_content(document: &Html, selectors: &Selectors) -> String {
    let mut parts: Vec<String> = Vec::new();

    for element in document.select(&selectors.blocks) {
        let text = element_text(&element);
        if text.is_empty() {
            continue;
        }

        let tag = element.value().name();
        if let Some(level) = heading_level(tag) {
            parts.push(format!("{} {}", "#".repeat(level), text));
        } else {
            parts.push(text);
        }
    }

    parts.join("\n\n")
}

fn heading_level(tag: &str) -> Option<usize> {
    match tag {
        "h1" => Some(1),
        "h2" => Some(2),
        "h3" => Some(3),
        "h4" => Some(4),
        "h5" => Some(5),
        "h6" => Some(6),
        _ => None,
    }
}

/// Visible text of an element with runs of whitespace collapsed to a single
/// space and the ends trimmed.
fn element_text(element: &ElementRef<'_>) -> String {
    let mut raw = String::new();
    for piece in element.text() {
        raw.push_str(piece);
    }
    collapse_whitespace(&raw)
}

fn collapse_whitespace(input: &str) -> String {
    let mut buf = String::with_capacity(input.len());
    let mut last_space = false;
    for ch in input.chars() {
        if ch.is_whitespace() {
            if !last_space && !buf.is_empty() {
                buf.push(' ');
            }
            last_space = true;
        } else {
            buf.push(ch);
            last_space = false;
        }
    }
    buf.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_title_tag() {
        let result = extract("<html><head><title>  My Page </title></head><body></body></html>");
        assert_eq!(result.title, "My Page");
    }

    #[test]
    fn falls_back_to_h1_title() {
        let result = extract("<html><body><h1>Heading Title</h1></body></html>");
        assert_eq!(result.title, "Heading Title");
    }

    #[test]
    fn missing_title_uses_sentinel() {
        let result = extract("<html><body><p>Just a paragraph.</p></body></html>");
        assert_eq!(result.title, NO_TITLE);
    }

    #[test]
    fn meta_description_wins_over_og() {
        let html = r#"<html><head>
            <meta name="description" content="Meta description">
            <meta property="og:description" content="OG description">
        </head><body><p>Paragraph text.</p></body></html>"#;
        assert_eq!(extract(html).description, "Meta description");
    }

    #[test]
    fn og_description_when_no_meta() {
        let html = r#"<html><head>
            <meta property="og:description" content="OG description">
        </head><body></body></html>"#;
        assert_eq!(extract(html).description, "OG description");
    }

    #[test]
    fn first_paragraph_description_truncated_to_160() {
        let long = "x".repeat(200);
        let html = format!("<html><body><p>{}</p></body></html>", long);
        let description = extract(&html).description;
        assert_eq!(description.chars().count(), 163);
        assert!(description.ends_with("..."));
    }

    #[test]
    fn short_paragraph_description_not_truncated() {
        let html = "<html><body><p>Short description.</p></body></html>";
        assert_eq!(extract(html).description, "Short description.");
    }

    #[test]
    fn missing_description_uses_sentinel() {
        let result = extract("<html><body><h1>Only a heading</h1></body></html>");
        assert_eq!(result.description, NO_DESCRIPTION);
    }

    #[test]
    fn content_renders_headings_as_markdown() {
        let html = r#"<html><body>
            <h1>Top</h1>
            <p>First paragraph with <b>bold</b> text.</p>
            <h3>Sub</h3>
            <p>Second paragraph.</p>
        </body></html>"#;
        let content = extract(html).content;
        assert_eq!(
            content,
            "# Top\n\nFirst paragraph with bold text.\n\n### Sub\n\nSecond paragraph."
        );
    }

    #[test]
    fn empty_elements_are_skipped() {
        let html = "<html><body><h2>   </h2><p></p><p>Kept.</p></body></html>";
        assert_eq!(extract(html).content, "Kept.");
    }

    #[test]
    fn extraction_is_deterministic() {
        let html = r#"<html><head><title>T</title></head>
            <body><h1>A</h1><p>B</p><h6>C</h6></body></html>"#;
        assert_eq!(extract(html), extract(html));
    }
}
