//! Feed reader: fetch a feed URL and turn it into an ordered list of
//! candidate items.
//!
//! The primary path parses the document as XML with `quick-xml`, recognizing
//! both RSS `<item>` and Atom `<entry>` elements in document order. Feeds in
//! the wild are frequently malformed, so when XML parsing fails the same
//! bytes are reparsed with the lenient HTML parser, which recovers
//! title/link/description positionally (no publish date in that mode).
//!
//! A fetch or parse failure is never fatal here: the reader yields an empty
//! list and leaves the "no articles today" decision to the caller.

use crate::models::FeedItem;
use once_cell::sync::Lazy;
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use regex::Regex;
use reqwest::Client;
use scraper::{ElementRef, Html, Selector};
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

const FEED_TIMEOUT: Duration = Duration::from_secs(10);

static MARKUP_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]+>").unwrap());

/// Strip embedded markup tags from a feed-provided excerpt.
fn strip_markup(s: &str) -> String {
    MARKUP_TAG.replace_all(s, "").trim().to_string()
}

/// Fetch the feed and return at most `limit` items in document order.
///
/// Most feeds are reverse-chronological, so the front of the document holds
/// the most recent articles. Items missing a title or link are dropped.
#[instrument(level = "info", skip(client))]
pub async fn fetch_items(client: &Client, feed_url: &str, limit: usize) -> Vec<FeedItem> {
    let response = match client.get(feed_url).timeout(FEED_TIMEOUT).send().await {
        Ok(resp) => resp,
        Err(e) => {
            warn!(error = %e, "Feed request failed");
            return Vec::new();
        }
    };
    let body = match response.error_for_status() {
        Ok(resp) => match resp.text().await {
            Ok(body) => body,
            Err(e) => {
                warn!(error = %e, "Failed reading feed body");
                return Vec::new();
            }
        },
        Err(e) => {
            warn!(error = %e, "Feed request returned an error status");
            return Vec::new();
        }
    };

    match parse_feed_xml(&body, limit) {
        Ok(items) => {
            info!(count = items.len(), "Parsed feed as XML");
            items
        }
        Err(e) => {
            warn!(error = %e, "XML parse failed; retrying with lenient parser");
            let items = parse_feed_lenient(&body, limit);
            info!(count = items.len(), "Recovered items with lenient parser");
            items
        }
    }
}

#[derive(Clone, Copy, PartialEq)]
enum Field {
    Title,
    Link,
    Excerpt,
    Published,
}

fn href_attr(e: &BytesStart) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|a| a.key.local_name().as_ref() == b"href")
        .and_then(|a| a.unescape_value().ok())
        .map(|v| v.trim().to_string())
}

/// Event-driven parse of an RSS or Atom document.
///
/// Field capture is first-wins per item, so e.g. an Atom entry carrying both
/// `published` and `updated` keeps the former.
fn parse_feed_xml(body: &str, limit: usize) -> Result<Vec<FeedItem>, quick_xml::Error> {
    let mut reader = Reader::from_str(body);
    reader.config_mut().trim_text(true);

    let mut items = Vec::new();
    let mut in_entry = false;
    let mut field: Option<Field> = None;
    let mut title = String::new();
    let mut link = String::new();
    let mut excerpt = String::new();
    let mut published = String::new();

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                let name = e.local_name();
                let name = name.as_ref();
                if !in_entry {
                    if name == b"item" || name == b"entry" {
                        in_entry = true;
                        field = None;
                        title.clear();
                        link.clear();
                        excerpt.clear();
                        published.clear();
                    }
                } else {
                    field = match name {
                        b"title" if title.is_empty() => Some(Field::Title),
                        b"link" => {
                            // Atom carries the URL in an href attribute
                            if link.is_empty() {
                                if let Some(href) = href_attr(&e) {
                                    link = href;
                                }
                            }
                            if link.is_empty() { Some(Field::Link) } else { None }
                        }
                        b"description" | b"summary" if excerpt.is_empty() => Some(Field::Excerpt),
                        b"pubDate" | b"published" | b"updated" if published.is_empty() => {
                            Some(Field::Published)
                        }
                        _ => None,
                    };
                }
            }
            Event::Empty(e) if in_entry => {
                if e.local_name().as_ref() == b"link" && link.is_empty() {
                    if let Some(href) = href_attr(&e) {
                        link = href;
                    }
                }
            }
            Event::Text(t) if in_entry => {
                if let Some(f) = field {
                    buffer_for(f, &mut title, &mut link, &mut excerpt, &mut published)
                        .push_str(&t.unescape()?);
                }
            }
            Event::CData(t) if in_entry => {
                if let Some(f) = field {
                    buffer_for(f, &mut title, &mut link, &mut excerpt, &mut published)
                        .push_str(&String::from_utf8_lossy(&t.into_inner()));
                }
            }
            Event::End(e) => {
                let name = e.local_name();
                let name = name.as_ref();
                if name == b"item" || name == b"entry" {
                    in_entry = false;
                    push_item(
                        &mut items,
                        std::mem::take(&mut title),
                        std::mem::take(&mut link),
                        strip_markup(&std::mem::take(&mut excerpt)),
                        std::mem::take(&mut published),
                    );
                    if items.len() >= limit {
                        break;
                    }
                } else if matches!(
                    name,
                    b"title" | b"link" | b"description" | b"summary" | b"pubDate" | b"published"
                        | b"updated"
                ) {
                    field = None;
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(items)
}

fn buffer_for<'a>(
    field: Field,
    title: &'a mut String,
    link: &'a mut String,
    excerpt: &'a mut String,
    published: &'a mut String,
) -> &'a mut String {
    match field {
        Field::Title => title,
        Field::Link => link,
        Field::Excerpt => excerpt,
        Field::Published => published,
    }
}

/// Lenient reparse for malformed feeds: locate item-like elements with the
/// HTML parser and pull field text positionally.
fn parse_feed_lenient(body: &str, limit: usize) -> Vec<FeedItem> {
    static ITEM_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("item, entry").unwrap());
    static TITLE_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("title").unwrap());
    static LINK_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("link").unwrap());
    static EXCERPT_SELECTOR: Lazy<Selector> =
        Lazy::new(|| Selector::parse("description, summary").unwrap());

    let document = Html::parse_document(body);
    let mut items = Vec::new();

    for entry in document.select(&ITEM_SELECTOR) {
        if items.len() >= limit {
            break;
        }
        let title = entry
            .select(&TITLE_SELECTOR)
            .next()
            .map(element_text)
            .unwrap_or_default();
        let link = entry
            .select(&LINK_SELECTOR)
            .next()
            .and_then(lenient_link)
            .unwrap_or_default();
        let excerpt = entry
            .select(&EXCERPT_SELECTOR)
            .next()
            .map(|el| strip_markup(&element_text(el)))
            .unwrap_or_default();
        // Publish dates are not recovered in this mode
        push_item(&mut items, title, link, excerpt, String::new());
    }

    items
}

fn element_text(el: ElementRef) -> String {
    el.text().collect::<String>().trim().to_string()
}

/// Recover an item's URL from a leniently parsed `<link>` element.
///
/// HTML parsers treat `link` as a void element, so the URL usually lands in
/// the text node following the element rather than inside it.
fn lenient_link(el: ElementRef) -> Option<String> {
    if let Some(href) = el.value().attr("href") {
        let href = href.trim();
        if !href.is_empty() {
            return Some(href.to_string());
        }
    }
    let inner = element_text(el);
    if !inner.is_empty() {
        return Some(inner);
    }
    el.next_siblings()
        .take_while(|node| !node.value().is_element())
        .find_map(|node| {
            node.value().as_text().and_then(|t| {
                let t = t.trim();
                (!t.is_empty()).then(|| t.to_string())
            })
        })
}

fn push_item(
    items: &mut Vec<FeedItem>,
    title: String,
    url: String,
    excerpt: String,
    published_at: String,
) {
    let title = title.trim().to_string();
    let url = url.trim().to_string();
    if title.is_empty() || url.is_empty() {
        debug!(%title, %url, "Dropping feed entry without title or link");
        return;
    }
    items.push(FeedItem {
        title,
        url,
        excerpt,
        published_at,
    });
}
