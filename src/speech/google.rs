use anyhow::{anyhow, Context, Result};
use std::path::PathBuf;
use tracing::debug;

use super::SpeechSynthesizer;
use crate::AdapterFuture;
use crate::text::split_chunks;

const DEFAULT_BASE_URL: &str = "https://translate.google.com";
const MAX_CHUNK_CHARS: usize = 100;

/// Google Translate's text-to-speech endpoint. Produces MP3.
#[derive(Debug, Clone)]
pub struct GoogleSpeech {
    client: reqwest::Client,
    base_url: String,
}

impl GoogleSpeech {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        if !base_url.trim().is_empty() {
            self.base_url = base_url.trim_end_matches('/').to_string();
        }
        self
    }
}

impl Default for GoogleSpeech {
    fn default() -> Self {
        Self::new()
    }
}

impl SpeechSynthesizer for GoogleSpeech {
    fn synthesize(&self, text: String, lang: String, dest: PathBuf) -> AdapterFuture<()> {
        let client = self.client.clone();
        let url = format!("{}/translate_tts", self.base_url);
        Box::pin(async move {
            let chunks = split_chunks(&text, MAX_CHUNK_CHARS);
            if chunks.is_empty() {
                return Err(anyhow!("no text to speak for {}", lang));
            }
            let mut audio = Vec::new();
            for (idx, chunk) in chunks.iter().enumerate() {
                let bytes = fetch_chunk(&client, &url, chunk, &lang, idx, chunks.len()).await?;
                audio.extend_from_slice(&bytes);
            }
            tokio::fs::write(&dest, &audio)
                .await
                .with_context(|| format!("failed to write audio: {}", dest.display()))?;
            debug!(
                "synthesized {} chunk(s) for {} into {}",
                chunks.len(),
                lang,
                dest.display()
            );
            Ok(())
        })
    }

    fn extension(&self) -> &'static str {
        "mp3"
    }
}

async fn fetch_chunk(
    client: &reqwest::Client,
    url: &str,
    chunk: &str,
    lang: &str,
    idx: usize,
    total: usize,
) -> Result<Vec<u8>> {
    let idx = idx.to_string();
    let total = total.to_string();
    let textlen = chunk.chars().count().to_string();
    let response = client
        .get(url)
        .query(&[
            ("ie", "UTF-8"),
            ("client", "tw-ob"),
            ("tl", lang),
            ("q", chunk),
            ("idx", idx.as_str()),
            ("total", total.as_str()),
            ("textlen", textlen.as_str()),
        ])
        .send()
        .await
        .with_context(|| format!("failed to reach speech service for {}", lang))?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(anyhow!("speech API error ({}): {}", status, body.trim()));
    }
    let bytes = response
        .bytes()
        .await
        .with_context(|| format!("failed to read speech audio for {}", lang))?;
    if bytes.is_empty() {
        return Err(anyhow!("speech API returned no audio for {}", lang));
    }
    Ok(bytes.to_vec())
}
