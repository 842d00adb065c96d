//! Command-line interface definitions for RSS Narrator.
//!
//! This module defines the CLI arguments and options using the `clap` crate.
//! Everything configurable about a run arrives here and is handed to the
//! pipeline as plain values.

use clap::Parser;

/// Command-line arguments for the RSS Narrator application.
///
/// # Examples
///
/// ```sh
/// # Minimal: narrate the ten most recent articles of a feed
/// rss_narrator --rss-url https://example.com/rss.xml
///
/// # With a content selector hint and a custom site label
/// rss_narrator --rss-url https://example.com/rss.xml \
///     --site-name "Example News" --content-selector ".article-body"
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// RSS feed URL to pull articles from
    #[arg(long)]
    pub rss_url: String,

    /// Site name for output files and the narration intro; derived from the
    /// feed URL's host when omitted
    #[arg(long)]
    pub site_name: Option<String>,

    /// CSS selector for the main article content (optional)
    #[arg(long)]
    pub content_selector: Option<String>,

    /// Number of articles to process
    #[arg(long, default_value_t = 10)]
    pub max_articles: usize,

    /// Text-generation API endpoint
    #[arg(long, default_value = "http://localhost:11434/api/generate")]
    pub ollama_url: String,

    /// Text-generation model name
    #[arg(long, default_value = "gemma3:12b")]
    pub model_name: String,

    /// Speech-synthesis API endpoint
    #[arg(long, default_value = "http://localhost:8880/v1/audio/speech")]
    pub tts_url: String,

    /// Speech-synthesis voice model
    #[arg(long, default_value = "prince-canuma/Kokoro-82M")]
    pub audio_model: String,

    /// Speech-synthesis voice name
    #[arg(long, default_value = "bf_emma")]
    pub audio_voice: String,

    /// Narration speed multiplier
    #[arg(long, default_value_t = 0.8)]
    pub audio_speed: f32,

    /// Narration language code (e.g. 'b' for British English)
    #[arg(long, default_value = "b")]
    pub audio_lang_code: String,

    /// Audio sample rate in Hz
    #[arg(long, default_value_t = 24_000)]
    pub sample_rate: u32,

    /// Seconds to pause between items, staying inside the generation
    /// service's rate tolerance
    #[arg(long, default_value_t = 3)]
    pub pause_secs: u64,

    /// Directory for the transcript and audio output
    #[arg(short, long, default_value = "./outputs")]
    pub output_dir: String,
}
