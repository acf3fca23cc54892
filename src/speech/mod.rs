mod espeak;
mod google;

use anyhow::{anyhow, Result};
use std::path::PathBuf;

use crate::AdapterFuture;

pub use espeak::Espeak;
pub use google::GoogleSpeech;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpeechEngineKind {
    Google,
    Espeak,
}

impl SpeechEngineKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SpeechEngineKind::Google => "google",
            SpeechEngineKind::Espeak => "espeak",
        }
    }

    pub fn parse(value: &str) -> Result<Self> {
        match value.trim().to_lowercase().as_str() {
            "google" | "gtts" => Ok(SpeechEngineKind::Google),
            "espeak" | "espeak-ng" => Ok(SpeechEngineKind::Espeak),
            other => Err(anyhow!(
                "unknown speech engine '{}' (expected google or espeak)",
                other
            )),
        }
    }
}

/// Writes spoken audio for `text` to `dest`.
pub trait SpeechSynthesizer: Send + Sync {
    fn synthesize(&self, text: String, lang: String, dest: PathBuf) -> AdapterFuture<()>;

    /// File extension of the audio this engine writes.
    fn extension(&self) -> &'static str;
}
