//! # RSS Narrator
//!
//! A pipeline that turns an RSS feed into a narrated audio digest: fetch the
//! most recent feed items, scrape each linked article's body text, generate a
//! narration-ready extract per article through a local LLM, write a
//! transcript, and render the combined script to audio through a
//! speech-synthesis service.
//!
//! ## Usage
//!
//! ```sh
//! rss_narrator --rss-url https://example.com/rss.xml --site-name "Example"
//! ```
//!
//! ## Architecture
//!
//! The pipeline is strictly sequential, one item at a time:
//! 1. **Feed**: parse the feed (XML, with a lenient fallback for malformed
//!    documents) into candidate items
//! 2. **Extract**: recover each article's body text through a fallback chain
//!    of scraping heuristics
//! 3. **Generate**: produce a narration-ready extract per article
//! 4. **Output**: write the transcript, then render the assembled script to
//!    a WAV
//!
//! Per-item failures skip the item; only an unreachable generation service
//! or an empty feed aborts the run.

use chrono::Local;
use clap::Parser;
use std::error::Error;
use std::time::Duration;
use tracing::{debug, error, info, warn};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod api;
mod audio;
mod cli;
mod extract;
mod feed;
mod models;
mod pipeline;
mod transcript;
mod utils;

use api::OllamaClient;
use audio::{TtsClient, VoiceSettings};
use cli::Cli;
use extract::PageExtractor;
use utils::{ensure_writable_dir, http_client, site_label};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();

    let args = Cli::parse();
    debug!(?args, "Parsed CLI arguments");

    let site = site_label(&args.rss_url, args.site_name.as_deref());
    let run_date = Local::now().date_naive().to_string();
    info!(%site, %run_date, "rss_narrator starting up");

    // Early check: ensure the output dir is writable before any network work
    if let Err(e) = ensure_writable_dir(&args.output_dir).await {
        error!(
            path = %args.output_dir,
            error = %e,
            "Output directory is not writable (fix perms or choose a different path)"
        );
        return Err(e);
    }
    let output_prefix = format!(
        "{}/{}_extracts_{}",
        args.output_dir.trim_end_matches('/'),
        site.to_lowercase(),
        run_date
    );

    let client = http_client()?;

    // The whole batch depends on the generation service; abort up front
    // rather than failing item by item.
    let generator = OllamaClient::new(
        client.clone(),
        args.ollama_url.clone(),
        args.model_name.clone(),
    );
    if !generator.is_available().await {
        error!(endpoint = %args.ollama_url, "Text-generation service is not reachable");
        return Err("text-generation service unreachable".into());
    }
    info!(endpoint = %args.ollama_url, model = %args.model_name, "Text-generation service is reachable");

    info!(limit = args.max_articles, url = %args.rss_url, "Fetching latest feed items");
    let items = feed::fetch_items(&client, &args.rss_url, args.max_articles).await;
    if items.is_empty() {
        error!(url = %args.rss_url, "Feed yielded no usable items");
        return Err("no feed items found".into());
    }
    info!(count = items.len(), "Feed items found");

    let extractor = PageExtractor::new(client.clone(), args.content_selector.clone());
    let outcome = pipeline::process_items(
        &items,
        &extractor,
        &generator,
        Duration::from_secs(args.pause_secs),
    )
    .await;

    let transcript_path = format!("{output_prefix}.txt");
    if let Err(e) = transcript::write_records(&outcome.records, &transcript_path).await {
        error!(path = %transcript_path, error = %e, "Failed writing transcript");
    }

    match pipeline::build_script(&site, &run_date, &outcome.fragments) {
        Some(script) => {
            info!(
                chars = script.text.chars().count(),
                words = script.word_count,
                estimated_minutes = script.estimated_minutes(),
                "Narration script assembled"
            );
            let tts = TtsClient::new(
                client,
                args.tts_url.clone(),
                VoiceSettings {
                    model: args.audio_model.clone(),
                    voice: args.audio_voice.clone(),
                    speed: args.audio_speed,
                    lang_code: args.audio_lang_code.clone(),
                    sample_rate: args.sample_rate,
                },
            );
            match tts.render(&script.text, &output_prefix).await {
                Ok(path) => info!(path = %path.display(), "Audio generation completed"),
                Err(e) => warn!(
                    error = %e,
                    transcript = %transcript_path,
                    "Audio generation failed; transcript is still available"
                ),
            }
        }
        None => warn!(
            skipped = outcome.skipped,
            "No extracts produced; skipping narration"
        ),
    }

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        successful = outcome.records.len(),
        skipped = outcome.skipped,
        "Run complete"
    );

    Ok(())
}
