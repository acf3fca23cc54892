use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::languages::LanguagePlan;
use crate::speech::SpeechEngineKind;

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub host: String,
    pub port: u16,
    pub max_upload_bytes: usize,
    pub static_dir: PathBuf,
    pub source_lang: String,
    pub target_langs: Vec<String>,
    pub tesseract_cmd: String,
    pub tessdata_dir: PathBuf,
    pub ocr_psm: u32,
    pub translation_base_url: String,
    pub speech_engine: SpeechEngineKind,
    pub speech_base_url: String,
    pub espeak_cmd: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            max_upload_bytes: 20 * 1024 * 1024,
            static_dir: PathBuf::from("static"),
            source_lang: "kn".to_string(),
            target_langs: vec!["en".to_string(), "hi".to_string()],
            tesseract_cmd: "/usr/bin/tesseract".to_string(),
            tessdata_dir: PathBuf::from("./tessdata"),
            ocr_psm: 3,
            translation_base_url: "https://translate.googleapis.com".to_string(),
            speech_engine: SpeechEngineKind::Google,
            speech_base_url: "https://translate.google.com".to_string(),
            espeak_cmd: "espeak-ng".to_string(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct SettingsFile {
    server: Option<ServerSettings>,
    storage: Option<StorageSettings>,
    languages: Option<LanguageSettings>,
    ocr: Option<OcrSettings>,
    translation: Option<TranslationSettings>,
    speech: Option<SpeechSettings>,
}

#[derive(Debug, Default, Deserialize)]
struct ServerSettings {
    host: Option<String>,
    port: Option<u16>,
    max_upload_bytes: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
struct StorageSettings {
    static_dir: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct LanguageSettings {
    source: Option<String>,
    targets: Option<Vec<String>>,
}

#[derive(Debug, Default, Deserialize)]
struct OcrSettings {
    tesseract_cmd: Option<String>,
    tessdata_dir: Option<String>,
    psm: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
struct TranslationSettings {
    base_url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct SpeechSettings {
    engine: Option<String>,
    base_url: Option<String>,
    espeak_cmd: Option<String>,
}

/// Loads defaults, then `settings.toml`, `settings.local.toml` and `extra_path`
/// from the working directory, then the process environment.
pub fn load_settings(extra_path: Option<&Path>) -> Result<Settings> {
    let mut settings = Settings::default();

    let mut ordered_paths = vec![
        PathBuf::from("settings.toml"),
        PathBuf::from("settings.local.toml"),
    ];
    if let Some(extra) = extra_path {
        if !extra.exists() {
            return Err(anyhow!("settings file not found: {}", extra.display()));
        }
        ordered_paths.push(extra.to_path_buf());
    }

    for path in ordered_paths {
        if path.exists() {
            let content = fs::read_to_string(&path)
                .with_context(|| format!("failed to read settings: {}", path.display()))?;
            settings
                .merge_toml(&content)
                .with_context(|| format!("failed to parse settings: {}", path.display()))?;
        }
    }

    settings.apply_env(|key| std::env::var(key).ok())?;
    Ok(settings)
}

impl Settings {
    pub fn merge_toml(&mut self, content: &str) -> Result<()> {
        let parsed: SettingsFile = toml::from_str(content)?;
        self.merge(parsed)
    }

    /// `TESSERACT_CMD`, `TESSDATA_PREFIX` and `PORT` override file settings.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        if let Some(cmd) = get("TESSERACT_CMD") {
            self.tesseract_cmd = cmd;
        }
        if let Some(dir) = get("TESSDATA_PREFIX") {
            self.tessdata_dir = PathBuf::from(dir);
        }
        if let Some(port) = get("PORT") {
            self.port = port
                .trim()
                .parse()
                .with_context(|| format!("PORT is not a valid port number: {}", port))?;
        }
        Ok(())
    }

    pub fn language_plan(&self) -> Result<LanguagePlan> {
        LanguagePlan::new(&self.source_lang, &self.target_langs)
    }

    pub fn validate(&self) -> Result<()> {
        self.language_plan()?;
        if self.max_upload_bytes == 0 {
            return Err(anyhow!("server.max_upload_bytes must be greater than zero"));
        }
        if self.tesseract_cmd.trim().is_empty() {
            return Err(anyhow!("ocr.tesseract_cmd is empty"));
        }
        Ok(())
    }

    fn merge(&mut self, incoming: SettingsFile) -> Result<()> {
        if let Some(server) = incoming.server {
            if let Some(host) = server.host {
                if !host.trim().is_empty() {
                    self.host = host;
                }
            }
            if let Some(port) = server.port {
                self.port = port;
            }
            if let Some(limit) = server.max_upload_bytes {
                if limit > 0 {
                    self.max_upload_bytes = limit;
                }
            }
        }
        if let Some(storage) = incoming.storage {
            if let Some(dir) = storage.static_dir {
                if !dir.trim().is_empty() {
                    self.static_dir = PathBuf::from(dir);
                }
            }
        }
        if let Some(languages) = incoming.languages {
            if let Some(source) = languages.source {
                self.source_lang = source;
            }
            if let Some(targets) = languages.targets {
                self.target_langs = targets;
            }
        }
        if let Some(ocr) = incoming.ocr {
            if let Some(cmd) = ocr.tesseract_cmd {
                if !cmd.trim().is_empty() {
                    self.tesseract_cmd = cmd;
                }
            }
            if let Some(dir) = ocr.tessdata_dir {
                if !dir.trim().is_empty() {
                    self.tessdata_dir = PathBuf::from(dir);
                }
            }
            if let Some(psm) = ocr.psm {
                self.ocr_psm = psm;
            }
        }
        if let Some(translation) = incoming.translation {
            if let Some(url) = translation.base_url {
                if !url.trim().is_empty() {
                    self.translation_base_url = url;
                }
            }
        }
        if let Some(speech) = incoming.speech {
            if let Some(engine) = speech.engine {
                self.speech_engine = SpeechEngineKind::parse(&engine)?;
            }
            if let Some(url) = speech.base_url {
                if !url.trim().is_empty() {
                    self.speech_base_url = url;
                }
            }
            if let Some(cmd) = speech.espeak_cmd {
                if !cmd.trim().is_empty() {
                    self.espeak_cmd = cmd;
                }
            }
        }
        Ok(())
    }
}
