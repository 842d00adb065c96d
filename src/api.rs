//! Text-generation client for the narration extracts.
//!
//! Talks to an Ollama-compatible endpoint over HTTP. The module exposes a
//! trait seam, [`ExtractGenerator`], so the orchestrator can be driven by
//! stub generators in tests, and a concrete [`OllamaClient`].
//!
//! A failed or empty generation is a typed error; the orchestrator skips the
//! item rather than carrying a placeholder string into the narration.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::{instrument, warn};

const GENERATE_TIMEOUT: Duration = Duration::from_secs(90);
const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

// Decoding pinned for narration output: low temperature for faithfulness,
// high nucleus mass, hard output-length cap.
const TEMPERATURE: f32 = 0.2;
const TOP_P: f32 = 0.9;
const NUM_PREDICT: u32 = 500;

#[derive(Debug, Error)]
pub enum GeneratorError {
    #[error("text-generation request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("text-generation service returned an empty extract")]
    EmptyResponse,
}

/// Producer of narration-ready extracts from article text.
pub trait ExtractGenerator {
    async fn generate(&self, title: &str, body: &str) -> Result<String, GeneratorError>;
}

/// Client for an Ollama-style `/api/generate` endpoint.
#[derive(Debug, Clone)]
pub struct OllamaClient {
    client: Client,
    endpoint: String,
    model: String,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: DecodingOptions,
}

#[derive(Serialize)]
struct DecodingOptions {
    temperature: f32,
    top_p: f32,
    num_predict: u32,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: String,
}

impl OllamaClient {
    pub fn new(client: Client, endpoint: String, model: String) -> Self {
        Self {
            client,
            endpoint,
            model,
        }
    }

    /// Probe the service's status endpoint.
    ///
    /// The batch must not start when this fails: every item would fail
    /// identically, so an unreachable service is fatal up front.
    #[instrument(level = "info", skip(self), fields(endpoint = %self.endpoint))]
    pub async fn is_available(&self) -> bool {
        let probe_url = format!("{}/api/tags", self.base_url());
        match self
            .client
            .get(&probe_url)
            .timeout(PROBE_TIMEOUT)
            .send()
            .await
        {
            Ok(resp) => resp.status().is_success(),
            Err(e) => {
                warn!(error = %e, "Availability probe failed");
                false
            }
        }
    }

    fn base_url(&self) -> &str {
        self.endpoint
            .splitn(2, "/api/")
            .next()
            .unwrap_or(&self.endpoint)
    }
}

/// The fixed narration prompt: at most 30 sentences, audio-friendly tone,
/// no meta-references, concrete details and quotes preserved.
fn build_prompt(title: &str, body: &str) -> String {
    format!(
        "Create a comprehensive and detailed extract of this article in English. \
         This extract will be read aloud, so make it engaging and complete.\n\
         \n\
         Title: {title}\n\
         \n\
         Content: {body}\n\
         \n\
         Instructions:\n\
         - Create a detailed extract of 30 sentences maximum\n\
         - Include all key points, important details, and context\n\
         - Maintain the technical depth and nuance of the original\n\
         - Use clear, professional English suitable for audio narration\n\
         - Structure it as a flowing narrative that's pleasant to listen to\n\
         - Include specific examples, data points, or quotes if mentioned\n\
         - Don't mention that this is an extract, summary or a text made for audio\n\
         - Make it comprehensive enough to understand the full article content\n\
         \n\
         Extract:"
    )
}

impl ExtractGenerator for OllamaClient {
    #[instrument(level = "info", skip_all, fields(model = %self.model, %title))]
    async fn generate(&self, title: &str, body: &str) -> Result<String, GeneratorError> {
        let prompt = build_prompt(title, body);
        let request = GenerateRequest {
            model: &self.model,
            prompt: &prompt,
            stream: false,
            options: DecodingOptions {
                temperature: TEMPERATURE,
                top_p: TOP_P,
                num_predict: NUM_PREDICT,
            },
        };

        let response = self
            .client
            .post(&self.endpoint)
            .timeout(GENERATE_TIMEOUT)
            .json(&request)
            .send()
            .await?
            .error_for_status()?
            .json::<GenerateResponse>()
            .await?;

        let extract = response.response.trim().to_string();
        if extract.is_empty() {
            return Err(GeneratorError::EmptyResponse);
        }
        Ok(extract)
    }
}
