//! Speech-synthesis collaborator.
//!
//! The synthesizer is an opaque HTTP rendering service: it accepts the
//! narration script plus voice parameters and returns a finished WAV, which
//! is written to `{output_prefix}.wav`. All-or-nothing; there is no partial
//! audio. A failure here degrades the run (the transcript survives) but
//! never fails it.

use reqwest::Client;
use serde::Serialize;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use tokio::fs;
use tracing::{info, instrument};

const SYNTH_TIMEOUT: Duration = Duration::from_secs(300);

#[derive(Debug, Error)]
pub enum SynthError {
    #[error("speech synthesis request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("failed writing audio file: {0}")]
    Io(#[from] std::io::Error),
}

/// Voice and rendering parameters, passed through to the service untouched.
#[derive(Debug, Clone)]
pub struct VoiceSettings {
    pub model: String,
    pub voice: String,
    pub speed: f32,
    pub lang_code: String,
    pub sample_rate: u32,
}

#[derive(Serialize)]
struct SpeechRequest<'a> {
    model: &'a str,
    input: &'a str,
    voice: &'a str,
    speed: f32,
    lang_code: &'a str,
    response_format: &'a str,
    sample_rate: u32,
}

/// Client for a Kokoro-style speech endpoint.
pub struct TtsClient {
    client: Client,
    endpoint: String,
    settings: VoiceSettings,
}

impl TtsClient {
    pub fn new(client: Client, endpoint: String, settings: VoiceSettings) -> Self {
        Self {
            client,
            endpoint,
            settings,
        }
    }

    /// Render the narration script to `{output_prefix}.wav`.
    #[instrument(
        level = "info",
        skip(self, script),
        fields(endpoint = %self.endpoint, voice = %self.settings.voice)
    )]
    pub async fn render(&self, script: &str, output_prefix: &str) -> Result<PathBuf, SynthError> {
        let request = SpeechRequest {
            model: &self.settings.model,
            input: script,
            voice: &self.settings.voice,
            speed: self.settings.speed,
            lang_code: &self.settings.lang_code,
            response_format: "wav",
            sample_rate: self.settings.sample_rate,
        };

        let audio = self
            .client
            .post(&self.endpoint)
            .timeout(SYNTH_TIMEOUT)
            .json(&request)
            .send()
            .await?
            .error_for_status()?
            .bytes()
            .await?;

        let path = PathBuf::from(format!("{output_prefix}.wav"));
        fs::write(&path, &audio).await?;
        info!(path = %path.display(), bytes = audio.len(), "Wrote audio artifact");
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_speech_request_wire_shape() {
        let request = SpeechRequest {
            model: "prince-canuma/Kokoro-82M",
            input: "Welcome to the digest.",
            voice: "bf_emma",
            speed: 0.8,
            lang_code: "b",
            response_format: "wav",
            sample_rate: 24_000,
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["model"], "prince-canuma/Kokoro-82M");
        assert_eq!(value["input"], "Welcome to the digest.");
        assert_eq!(value["voice"], "bf_emma");
        assert_eq!(value["response_format"], "wav");
        assert_eq!(value["sample_rate"], 24_000);
        assert!((value["speed"].as_f64().unwrap() - 0.8).abs() < 1e-6);
    }
}
