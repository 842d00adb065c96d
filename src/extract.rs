//! Content extractor: recover readable article body text from arbitrary HTML.
//!
//! Extraction runs a fallback chain of strategies, each attempted only when
//! the previous one produced insufficient content:
//!
//! 1. Hint-guided: paragraph/heading text inside the container matching the
//!    user-supplied CSS selector
//! 2. Semantic: the same collection inside the document's first `<article>`
//! 3. Whole-document paragraphs with sentence-level noise filtering
//!
//! Non-content chrome (`script`, `style`, `nav`, `header`, `footer`,
//! `aside`) is detached from the parsed tree once per document, upstream of
//! every stage, so its text never contaminates the scrape. Failures are
//! typed and never escape this module as panics; one bad article must not
//! abort the batch.

use itertools::Itertools;
use once_cell::sync::Lazy;
use reqwest::Client;
use scraper::{ElementRef, Html, Selector};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, instrument};

use crate::utils::collapse_whitespace;

const ARTICLE_TIMEOUT: Duration = Duration::from_secs(15);

/// A stage result shorter than this is insufficient and triggers the next
/// fallback stage.
const MIN_CONTENT_CHARS: usize = 500;
/// Sentence cap for the whole-document stage.
const MAX_SENTENCES: usize = 50;
/// Sentences at or below this length are discarded in the whole-document stage.
const MIN_SENTENCE_CHARS: usize = 20;

/// Boilerplate markers that disqualify a sentence in the whole-document stage.
const NOISE_MARKERS: [&str; 6] = [
    "subscribe",
    "newsletter",
    "follow us",
    "share this",
    "copyright",
    "privacy policy",
];

static CHROME_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("script, style, nav, header, footer, aside").unwrap());
static BODY_TEXT_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("p, h1, h2, h3, h4, h5, h6").unwrap());
static ARTICLE_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("article").unwrap());
static PARAGRAPH_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("p").unwrap());

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("article fetch failed: {0}")]
    Fetch(#[from] reqwest::Error),
    #[error("no usable body text found")]
    NoContent,
}

/// Source of readable article body text for the pipeline.
///
/// The trait seam lets tests drive the orchestrator with stub sources.
pub trait ContentSource {
    async fn extract(&self, url: &str) -> Result<String, ExtractError>;
}

/// Extractor that fetches pages over HTTP and runs the fallback chain.
#[derive(Debug, Clone)]
pub struct PageExtractor {
    client: Client,
    selector_hint: Option<String>,
}

impl PageExtractor {
    pub fn new(client: Client, selector_hint: Option<String>) -> Self {
        Self {
            client,
            selector_hint,
        }
    }
}

impl ContentSource for PageExtractor {
    #[instrument(level = "info", skip(self), fields(%url))]
    async fn extract(&self, url: &str) -> Result<String, ExtractError> {
        let body = self
            .client
            .get(url)
            .timeout(ARTICLE_TIMEOUT)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        let content = extract_from_html(&body, self.selector_hint.as_deref());
        if content.is_empty() {
            return Err(ExtractError::NoContent);
        }
        debug!(chars = content.chars().count(), "Extracted article body");
        Ok(content)
    }
}

/// Run the fallback chain over an already-fetched document.
pub fn extract_from_html(html: &str, selector_hint: Option<&str>) -> String {
    let mut document = Html::parse_document(html);
    strip_chrome(&mut document);

    let hinted = |doc: &Html| hinted_region_text(doc, selector_hint?);
    let semantic = |doc: &Html| doc.select(&ARTICLE_SELECTOR).next().map(region_text);
    let filtered = |doc: &Html| Some(filtered_paragraph_text(doc));
    let stages: [&dyn Fn(&Html) -> Option<String>; 3] = [&hinted, &semantic, &filtered];

    collapse_whitespace(&run_fallback_chain(&document, &stages))
}

/// Evaluate stages lazily until one leaves enough content behind.
///
/// A stage returning `None` could not locate its region and keeps the
/// previous stage's result; `Some` replaces it.
fn run_fallback_chain(document: &Html, stages: &[&dyn Fn(&Html) -> Option<String>]) -> String {
    let mut content = String::new();
    for stage in stages {
        if content.chars().count() >= MIN_CONTENT_CHARS {
            break;
        }
        if let Some(text) = stage(document) {
            content = text;
        }
    }
    content
}

/// Detach non-content structural elements so no stage ever sees their text.
fn strip_chrome(document: &mut Html) {
    let chrome: Vec<_> = document.select(&CHROME_SELECTOR).map(|el| el.id()).collect();
    for id in chrome {
        if let Some(mut node) = document.tree.get_mut(id) {
            node.detach();
        }
    }
}

fn hinted_region_text(doc: &Html, hint: &str) -> Option<String> {
    let selector = Selector::parse(hint).ok()?;
    doc.select(&selector).next().map(region_text)
}

/// Concatenated text of all paragraph and heading elements within a region,
/// in document order, skipping empties.
fn region_text(region: ElementRef) -> String {
    region
        .select(&BODY_TEXT_SELECTOR)
        .map(|el| el.text().collect::<Vec<_>>().join(" ").trim().to_string())
        .filter(|text| !text.is_empty())
        .join(" ")
}

/// Whole-document paragraph text, filtered sentence by sentence to shed
/// boilerplate, capped at [`MAX_SENTENCES`].
fn filtered_paragraph_text(doc: &Html) -> String {
    let all_text = doc
        .select(&PARAGRAPH_SELECTOR)
        .map(|el| el.text().collect::<Vec<_>>().join(" ").trim().to_string())
        .filter(|text| !text.is_empty())
        .join(" ");

    all_text
        .split('.')
        .map(str::trim)
        .filter(|sentence| sentence.chars().count() > MIN_SENTENCE_CHARS && !is_noise(sentence))
        .take(MAX_SENTENCES)
        .join(". ")
}

fn is_noise(sentence: &str) -> bool {
    let lowered = sentence.to_lowercase();
    NOISE_MARKERS.iter().any(|marker| lowered.contains(marker))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn long_sentence(label: &str) -> String {
        format!("This is a sufficiently long sentence about {label} with plenty of detail")
    }

    fn page_with_hint_region(paragraphs: usize) -> String {
        let body: String = (0..paragraphs)
            .map(|i| format!("<p>{}.</p>", long_sentence(&format!("topic {i}"))))
            .collect();
        format!(
            "<html><body>\
             <div class=\"story\">{body}</div>\
             <article><p>{}.</p></article>\
             <p>{}.</p>\
             </body></html>",
            long_sentence("the article region"),
            long_sentence("a loose paragraph"),
        )
    }

    #[test]
    fn test_hint_stage_wins_when_sufficient() {
        let html = page_with_hint_region(10);
        let content = extract_from_html(&html, Some(".story"));
        assert!(content.chars().count() >= MIN_CONTENT_CHARS);
        assert!(content.contains("topic 0"));
        assert!(!content.contains("article region"));
        assert!(!content.contains("loose paragraph"));
    }

    #[test]
    fn test_insufficient_hint_falls_through_to_article() {
        let html = format!(
            "<html><body>\
             <div class=\"story\"><p>Tiny.</p></div>\
             <article><p>{}.</p></article>\
             </body></html>",
            long_sentence("the semantic region")
        );
        let content = extract_from_html(&html, Some(".story"));
        assert!(content.contains("semantic region"));
    }

    #[test]
    fn test_missing_hint_selector_is_skipped() {
        let html = format!(
            "<html><body><article><p>{}.</p></article></body></html>",
            long_sentence("fallback content")
        );
        // Selector matches nothing; stage yields None and the chain moves on
        let content = extract_from_html(&html, Some("#does-not-exist"));
        assert!(content.contains("fallback content"));
    }

    #[test]
    fn test_invalid_hint_selector_is_skipped() {
        let html = format!(
            "<html><body><article><p>{}.</p></article></body></html>",
            long_sentence("resilient content")
        );
        let content = extract_from_html(&html, Some("[[[not-a-selector"));
        assert!(content.contains("resilient content"));
    }

    #[test]
    fn test_no_hint_uses_article_then_paragraphs() {
        let html = "<html><body><p>This paragraph stands alone and carries enough words to survive filtering.</p></body></html>";
        let content = extract_from_html(html, None);
        assert!(content.contains("stands alone"));
    }

    #[test]
    fn test_chrome_never_contaminates_any_stage() {
        let html = format!(
            "<html><body>\
             <nav><p>Site navigation links</p></nav>\
             <header><h1>Masthead banner</h1></header>\
             <aside><p>Related stories sidebar</p></aside>\
             <footer><p>Footer legal text</p></footer>\
             <script>var x = 1;</script>\
             <style>p {{ color: red; }}</style>\
             <article><p>{}.</p></article>\
             </body></html>",
            long_sentence("genuine reporting")
        );
        let content = extract_from_html(&html, None);
        assert!(content.contains("genuine reporting"));
        assert!(!content.contains("navigation"));
        assert!(!content.contains("Masthead"));
        assert!(!content.contains("sidebar"));
        assert!(!content.contains("Footer"));
        assert!(!content.contains("var x"));
        assert!(!content.contains("color"));
    }

    #[test]
    fn test_sentence_filter_drops_boilerplate_and_short_sentences() {
        let html = "<html><body>\
            <p>Subscribe to our newsletter for the best deals every single week.</p>\
            <p>Short.</p>\
            <p>The committee approved the measure after a long public hearing on Tuesday.</p>\
            <p>Copyright 2025 Example Media, all rights reserved worldwide forever.</p>\
            <p>Please share this story with all of your friends and followers online.</p>\
            </body></html>";
        let content = extract_from_html(html, None);
        assert!(content.contains("committee approved"));
        assert!(!content.to_lowercase().contains("subscribe"));
        assert!(!content.contains("Short"));
        assert!(!content.to_lowercase().contains("copyright"));
        assert!(!content.to_lowercase().contains("share this"));
    }

    #[test]
    fn test_sentence_filter_caps_output() {
        let body: String = (0..80)
            .map(|i| format!("<p>{}.</p>", long_sentence(&format!("number {i}"))))
            .collect();
        let html = format!("<html><body>{body}</body></html>");
        let content = filtered_paragraph_text(&Html::parse_document(&html));
        assert_eq!(content.matches("sufficiently long sentence").count(), MAX_SENTENCES);
        assert!(content.contains("number 0"));
        assert!(!content.contains("number 79"));
    }

    #[test]
    fn test_whitespace_is_collapsed() {
        let html = "<html><body><article>\
            <p>Line one\nwith a break, padded out to pass the length filter easily.</p>\
            <p>Line   two  with   runs of spaces, also padded out well past twenty.</p>\
            </article></body></html>";
        let content = extract_from_html(html, None);
        assert!(!content.contains('\n'));
        assert!(!content.contains("  "));
    }

    #[test]
    fn test_empty_document_yields_empty_string() {
        assert_eq!(extract_from_html("", None), "");
        assert_eq!(extract_from_html("<html><body></body></html>", None), "");
    }

    #[test]
    fn test_later_stages_not_invoked_once_sufficient() {
        let document = Html::parse_document("<html><body></body></html>");
        let sufficient = "a".repeat(MIN_CONTENT_CHARS + 100);
        let calls = Cell::new(0usize);

        let first = |_: &Html| Some(sufficient.clone());
        let second = |_: &Html| {
            calls.set(calls.get() + 1);
            Some("should never run".to_string())
        };
        let stages: [&dyn Fn(&Html) -> Option<String>; 2] = [&first, &second];

        let result = run_fallback_chain(&document, &stages);
        assert_eq!(result, sufficient);
        assert_eq!(calls.get(), 0);
    }

    #[test]
    fn test_insufficient_stage_result_invokes_next() {
        let document = Html::parse_document("<html><body></body></html>");
        let calls = Cell::new(0usize);

        let first = |_: &Html| Some("too short".to_string());
        let second = |_: &Html| {
            calls.set(calls.get() + 1);
            Some("second stage output".to_string())
        };
        let stages: [&dyn Fn(&Html) -> Option<String>; 2] = [&first, &second];

        let result = run_fallback_chain(&document, &stages);
        assert_eq!(result, "second stage output");
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_absent_region_keeps_previous_stage_result() {
        let document = Html::parse_document("<html><body></body></html>");

        let first = |_: &Html| Some("partial but present".to_string());
        let second = |_: &Html| None;
        let stages: [&dyn Fn(&Html) -> Option<String>; 2] = [&first, &second];

        let result = run_fallback_chain(&document, &stages);
        assert_eq!(result, "partial but present");
    }
}
