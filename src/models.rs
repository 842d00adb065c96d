//! Data models for feed items and their narration-ready derivatives.
//!
//! This module defines the core data structures flowing through the pipeline:
//! - [`FeedItem`]: One candidate article pulled from the syndication feed
//! - [`ExtractRecord`]: A successfully processed item with its generated extract
//! - [`NarrationScript`]: The assembled text handed to speech synthesis

/// One entry from the syndication feed, as reported by the feed itself.
///
/// Produced by the feed reader and consumed read-only by the pipeline.
/// Items with an empty title or link never make it into one of these.
#[derive(Debug, Clone)]
pub struct FeedItem {
    /// Article headline.
    pub title: String,
    /// Absolute URL of the full article.
    pub url: String,
    /// Feed-provided excerpt with embedded markup stripped; may be empty.
    pub excerpt: String,
    /// Publish timestamp as the feed reported it; may be empty.
    pub published_at: String,
}

/// A fully processed item: feed metadata plus the generated extract.
///
/// One record exists per item that survived both extraction and generation;
/// failed items are simply absent, never placeholders. The ordered record
/// sequence is what the transcript sink receives.
#[derive(Debug, Clone)]
pub struct ExtractRecord {
    pub title: String,
    pub url: String,
    pub published_at: String,
    pub extract: String,
}

/// The full narration text submitted for speech synthesis.
#[derive(Debug, Clone)]
pub struct NarrationScript {
    pub text: String,
    pub word_count: usize,
}

impl NarrationScript {
    pub fn new(text: String) -> Self {
        let word_count = text.split_whitespace().count();
        Self { text, word_count }
    }

    /// Estimated narration length at a typical 150 words-per-minute pace.
    /// Reporting only; nothing branches on this.
    pub fn estimated_minutes(&self) -> f64 {
        self.word_count as f64 / 150.0
    }
}
