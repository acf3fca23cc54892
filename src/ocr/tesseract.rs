use anyhow::{anyhow, Context, Result};
use image::RgbImage;
use std::path::{Path, PathBuf};
use std::process::Command;

use super::TextRecognizer;

/// Runs the `tesseract` CLI against a temporary PNG.
#[derive(Debug, Clone)]
pub struct Tesseract {
    cmd: String,
    tessdata_dir: PathBuf,
    languages: String,
    psm: u32,
}

impl Tesseract {
    pub fn new(cmd: impl Into<String>, tessdata_dir: impl Into<PathBuf>, languages: &str) -> Self {
        Self {
            cmd: cmd.into(),
            tessdata_dir: tessdata_dir.into(),
            languages: languages.trim().to_string(),
            psm: 3,
        }
    }

    pub fn with_psm(mut self, psm: u32) -> Self {
        self.psm = psm;
        self
    }

    pub fn list_languages(&self) -> Result<Vec<String>> {
        let output = self
            .command()
            .arg("--list-langs")
            .output()
            .with_context(|| format!("failed to run {} --list-langs", self.cmd))?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(anyhow!("tesseract --list-langs failed: {}", stderr.trim()));
        }
        let stdout = String::from_utf8_lossy(&output.stdout);
        let langs = stdout
            .lines()
            .skip(1)
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(str::to_string)
            .collect();
        Ok(langs)
    }

    /// Languages requested but missing from the tessdata directory.
    pub fn missing_languages(&self) -> Result<Vec<String>> {
        let available = self.list_languages()?;
        Ok(self
            .languages
            .split(['+', ','])
            .map(str::trim)
            .filter(|lang| !lang.is_empty() && !available.iter().any(|value| value == lang))
            .map(str::to_string)
            .collect())
    }

    fn command(&self) -> Command {
        let mut command = Command::new(&self.cmd);
        command.env("TESSDATA_PREFIX", &self.tessdata_dir);
        command
    }

    fn run(&self, path: &Path) -> Result<String> {
        let output = self
            .command()
            .arg(path)
            .arg("stdout")
            .arg("-l")
            .arg(&self.languages)
            .arg("--psm")
            .arg(self.psm.to_string())
            .output()
            .with_context(|| format!("failed to run {} (is it installed?)", self.cmd))?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(anyhow!("tesseract failed: {}", stderr.trim()));
        }
        String::from_utf8(output.stdout).with_context(|| "tesseract produced non-UTF-8 output")
    }
}

impl TextRecognizer for Tesseract {
    fn recognize(&self, image: &RgbImage) -> Result<String> {
        let mut tmp = tempfile::Builder::new()
            .prefix("chitravachaka-ocr-")
            .suffix(".png")
            .tempfile()
            .with_context(|| "failed to create temp file for OCR")?;
        image
            .write_to(&mut tmp, image::ImageFormat::Png)
            .with_context(|| "failed to write temp image for OCR")?;
        let text = self.run(tmp.path())?;
        Ok(text.trim().to_string())
    }
}
