use anyhow::{anyhow, Context, Result};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use super::SpeechSynthesizer;
use crate::AdapterFuture;
use crate::languages::map_lang_for_espeak;

/// Local `espeak`/`espeak-ng` synthesis. Produces WAV.
#[derive(Debug, Clone)]
pub struct Espeak {
    cmd: String,
}

impl Espeak {
    pub fn new(cmd: impl Into<String>) -> Self {
        Self { cmd: cmd.into() }
    }
}

impl SpeechSynthesizer for Espeak {
    fn synthesize(&self, text: String, lang: String, dest: PathBuf) -> AdapterFuture<()> {
        let cmd = self.cmd.clone();
        Box::pin(async move {
            tokio::task::spawn_blocking(move || run_espeak(&cmd, &text, &lang, &dest))
                .await
                .with_context(|| "espeak worker failed")?
        })
    }

    fn extension(&self) -> &'static str {
        "wav"
    }
}

fn run_espeak(cmd: &str, text: &str, lang: &str, dest: &Path) -> Result<()> {
    let text = text.replace('\n', " ");
    if text.trim().is_empty() {
        return Err(anyhow!("no text to speak for {}", lang));
    }
    let voice = map_lang_for_espeak(lang);
    let output = espeak_command(cmd, &voice, dest, text.trim())
        .output()
        .with_context(|| format!("failed to run {}", cmd))?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(anyhow!(
            "{} failed to synthesize {} audio: {}",
            cmd,
            voice,
            stderr.trim()
        ));
    }
    Ok(())
}

/// `--` ends option parsing so text such as "-5 °C" is spoken, not parsed.
fn espeak_command(cmd: &str, voice: &str, dest: &Path, text: &str) -> Command {
    let mut command = Command::new(cmd);
    command
        .arg("-v")
        .arg(voice)
        .arg("-w")
        .arg(dest)
        .arg("--")
        .arg(text)
        .stdin(Stdio::null())
        .stdout(Stdio::null());
    command
}
