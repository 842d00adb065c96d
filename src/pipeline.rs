//! Batch orchestrator: drive feed items through extraction and generation
//! one at a time, accumulating successes and skipping failures.
//!
//! An item that fails either stage is simply absent from the results; the
//! batch never aborts for a single bad article. A fixed pause follows every
//! generator call except the last item's, staying inside the service's rate
//! tolerance. Extraction failures skip the pause along with the generator
//! call.

use crate::api::{ExtractGenerator, GeneratorError};
use crate::extract::{ContentSource, ExtractError};
use crate::models::{ExtractRecord, FeedItem, NarrationScript};
use crate::utils::truncate_for_log;
use itertools::Itertools;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info, warn};

/// What a run produced: records and narration fragments in feed order.
#[derive(Debug, Default)]
pub struct PipelineOutcome {
    pub records: Vec<ExtractRecord>,
    pub fragments: Vec<String>,
    pub skipped: usize,
}

/// Process items strictly sequentially, in feed order.
///
/// Fragment numbering uses the item's 1-based feed position, so a skipped
/// item leaves a gap rather than renumbering the rest.
pub async fn process_items<S, G>(
    items: &[FeedItem],
    source: &S,
    generator: &G,
    pause: Duration,
) -> PipelineOutcome
where
    S: ContentSource,
    G: ExtractGenerator,
{
    let mut outcome = PipelineOutcome::default();
    let total = items.len();

    for (i, item) in items.iter().enumerate() {
        let index = i + 1;
        info!(index, total, title = %item.title, url = %item.url, "Processing feed item");
        if !item.published_at.is_empty() {
            debug!(index, published = %item.published_at, "Publish date");
        }
        if !item.excerpt.is_empty() {
            debug!(index, excerpt = %truncate_for_log(&item.excerpt, 100), "Feed excerpt");
        }

        let body = match source.extract(&item.url).await {
            Ok(text) => {
                info!(index, chars = text.chars().count(), "Content extracted");
                text
            }
            Err(e @ ExtractError::NoContent) => {
                warn!(index, url = %item.url, error = %e, "Skipping item: nothing extractable");
                outcome.skipped += 1;
                continue;
            }
            Err(e) => {
                warn!(index, url = %item.url, error = %e, "Skipping item: article fetch failed");
                outcome.skipped += 1;
                continue;
            }
        };

        match generator.generate(&item.title, &body).await {
            Ok(extract) => {
                info!(index, extract = %truncate_for_log(&extract, 300), "Generated extract");
                outcome
                    .fragments
                    .push(format!("Article {index}: {}. {extract}", item.title));
                outcome.records.push(ExtractRecord {
                    title: item.title.clone(),
                    url: item.url.clone(),
                    published_at: item.published_at.clone(),
                    extract,
                });
            }
            Err(e) => {
                let reason = match e {
                    GeneratorError::Transport(_) => "request failed",
                    GeneratorError::EmptyResponse => "empty response",
                };
                warn!(index, error = %e, reason, "Skipping item: extract generation failed");
                outcome.skipped += 1;
            }
        }

        // The generator was hit either way; charge the pause unless this was
        // the last feed item.
        if index < total && !pause.is_zero() {
            sleep(pause).await;
        }
    }

    info!(
        successful = outcome.records.len(),
        skipped = outcome.skipped,
        "Batch complete"
    );
    outcome
}

/// Assemble the narration script from the run's fragments.
///
/// `None` when the run produced nothing; speech synthesis must then be
/// skipped entirely.
pub fn build_script(site: &str, run_date: &str, fragments: &[String]) -> Option<NarrationScript> {
    if fragments.is_empty() {
        return None;
    }
    let intro = format!(
        "Welcome to {site} comprehensive extracts. Here are {} recent articles from {site}, generated on {run_date}. ",
        fragments.len()
    );
    let text = intro + &fragments.iter().join(" ");
    Some(NarrationScript::new(text))
}
