use anyhow::{anyhow, Result};

/// ISO 639-1 code, tesseract traineddata name, espeak voice.
const LANGUAGE_TABLE: &[(&str, &str, &str)] = &[
    ("as", "asm", "as"),
    ("bn", "ben", "bn"),
    ("de", "deu", "de"),
    ("en", "eng", "en"),
    ("es", "spa", "es"),
    ("fr", "fra", "fr"),
    ("gu", "guj", "gu"),
    ("hi", "hin", "hi"),
    ("ja", "jpn", "ja"),
    ("kn", "kan", "kn"),
    ("ml", "mal", "ml"),
    ("mr", "mar", "mr"),
    ("ne", "nep", "ne"),
    ("or", "ori", "or"),
    ("pa", "pan", "pa"),
    ("sa", "san", "hi"),
    ("ta", "tam", "ta"),
    ("te", "tel", "te"),
    ("ur", "urd", "ur"),
    ("zh", "chi_sim", "cmn"),
];

/// Source language plus the two translation targets of every request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguagePlan {
    pub source: String,
    pub targets: [String; 2],
}

impl LanguagePlan {
    pub fn new(source: &str, targets: &[String]) -> Result<Self> {
        let source = normalize_code(source);
        if source.is_empty() {
            return Err(anyhow!("source language is empty"));
        }
        let [first, second] = targets else {
            return Err(anyhow!(
                "exactly two target languages are required (got {})",
                targets.len()
            ));
        };
        let first = normalize_code(first);
        let second = normalize_code(second);
        for target in [&first, &second] {
            if target.is_empty() {
                return Err(anyhow!("target language is empty"));
            }
            if *target == source {
                return Err(anyhow!(
                    "target language '{}' is the same as the source language",
                    target
                ));
            }
        }
        if first == second {
            return Err(anyhow!("target languages must differ (both '{}')", first));
        }
        Ok(Self {
            source,
            targets: [first, second],
        })
    }

    pub fn all(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.source.as_str()).chain(self.targets.iter().map(String::as_str))
    }
}

impl Default for LanguagePlan {
    fn default() -> Self {
        Self {
            source: "kn".to_string(),
            targets: ["en".to_string(), "hi".to_string()],
        }
    }
}

pub fn map_lang_for_tesseract(code: &str) -> String {
    let code = normalize_code(code);
    LANGUAGE_TABLE
        .iter()
        .find(|(iso, _, _)| *iso == code)
        .map(|(_, tesseract, _)| tesseract.to_string())
        .unwrap_or(code)
}

pub fn map_lang_for_espeak(code: &str) -> String {
    let code = normalize_code(code);
    LANGUAGE_TABLE
        .iter()
        .find(|(iso, _, _)| *iso == code)
        .map(|(_, _, voice)| voice.to_string())
        .unwrap_or(code)
}

fn normalize_code(code: &str) -> String {
    code.trim().to_lowercase()
}
