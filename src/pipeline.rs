use anyhow::{Context, Result};
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::fmt;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, info, info_span, Instrument};

use crate::languages::{map_lang_for_tesseract, LanguagePlan};
use crate::ocr::{self, Tesseract, TextRecognizer};
use crate::settings::Settings;
use crate::speech::{Espeak, GoogleSpeech, SpeechEngineKind, SpeechSynthesizer};
use crate::storage::{AudioArtifact, StorageLayout};
use crate::translate::{GoogleTranslate, Translate};
use crate::upload::{self, UploadRejection, UploadedImage};

pub const NO_TEXT_FOUND: &str = "No text found";

/// Text and optional audio for one language of a response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguageOutput {
    pub lang: String,
    pub text: String,
    pub audio: Option<AudioArtifact>,
}

impl LanguageOutput {
    fn empty(lang: &str) -> Self {
        Self {
            lang: lang.to_string(),
            text: String::new(),
            audio: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponsePayload {
    pub image_url: String,
    pub source: LanguageOutput,
    pub targets: [LanguageOutput; 2],
    pub error: Option<String>,
}

impl ResponsePayload {
    fn no_text(image_url: String, plan: &LanguagePlan) -> Self {
        let [first, second] = &plan.targets;
        Self {
            image_url,
            source: LanguageOutput::empty(&plan.source),
            targets: [LanguageOutput::empty(first), LanguageOutput::empty(second)],
            error: Some(NO_TEXT_FOUND.to_string()),
        }
    }

    pub fn outputs(&self) -> impl Iterator<Item = &LanguageOutput> {
        std::iter::once(&self.source).chain(self.targets.iter())
    }
}

/// Flattens to `image_url`, `text_<lang>`/`audio_<lang>` per language, `error`.
impl Serialize for ResponsePayload {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(2 + 2 * (1 + self.targets.len())))?;
        map.serialize_entry("image_url", &self.image_url)?;
        for output in self.outputs() {
            map.serialize_entry(&format!("text_{}", output.lang), &output.text)?;
            map.serialize_entry(
                &format!("audio_{}", output.lang),
                &output.audio.as_ref().map(|audio| audio.url.as_str()),
            )?;
        }
        map.serialize_entry("error", &self.error)?;
        map.end()
    }
}

#[derive(Debug)]
pub enum PipelineError {
    InvalidInput(UploadRejection),
    Fatal(anyhow::Error),
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineError::InvalidInput(rejection) => write!(f, "{}", rejection),
            PipelineError::Fatal(err) => write!(f, "{:#}", err),
        }
    }
}

impl std::error::Error for PipelineError {}

impl From<UploadRejection> for PipelineError {
    fn from(rejection: UploadRejection) -> Self {
        PipelineError::InvalidInput(rejection)
    }
}

impl From<anyhow::Error> for PipelineError {
    fn from(err: anyhow::Error) -> Self {
        PipelineError::Fatal(err)
    }
}

/// Upload -> OCR -> two translation/speech waves -> payload.
#[derive(Clone)]
pub struct Pipeline {
    storage: StorageLayout,
    plan: LanguagePlan,
    recognizer: Arc<dyn TextRecognizer>,
    translator: Arc<dyn Translate>,
    synthesizer: Arc<dyn SpeechSynthesizer>,
}

impl Pipeline {
    pub fn new(
        storage: StorageLayout,
        plan: LanguagePlan,
        recognizer: Arc<dyn TextRecognizer>,
        translator: Arc<dyn Translate>,
        synthesizer: Arc<dyn SpeechSynthesizer>,
    ) -> Self {
        Self {
            storage,
            plan,
            recognizer,
            translator,
            synthesizer,
        }
    }

    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let plan = settings.language_plan()?;
        let recognizer = Tesseract::new(
            settings.tesseract_cmd.clone(),
            settings.tessdata_dir.clone(),
            &map_lang_for_tesseract(&plan.source),
        )
        .with_psm(settings.ocr_psm);
        let translator =
            GoogleTranslate::new().with_base_url(settings.translation_base_url.clone());
        let synthesizer: Arc<dyn SpeechSynthesizer> = match settings.speech_engine {
            SpeechEngineKind::Google => {
                Arc::new(GoogleSpeech::new().with_base_url(settings.speech_base_url.clone()))
            }
            SpeechEngineKind::Espeak => Arc::new(Espeak::new(settings.espeak_cmd.clone())),
        };
        Ok(Self::new(
            StorageLayout::new(&settings.static_dir),
            plan,
            Arc::new(recognizer),
            Arc::new(translator),
            synthesizer,
        ))
    }

    pub fn storage(&self) -> &StorageLayout {
        &self.storage
    }

    pub fn plan(&self) -> &LanguagePlan {
        &self.plan
    }

    pub async fn process(&self, image: UploadedImage) -> Result<ResponsePayload, PipelineError> {
        let client_name = image.file_name.clone().unwrap_or_default();
        let bytes = upload::validate(image)?;
        let upload_name = self
            .storage
            .store_upload(&bytes)
            .await
            .with_context(|| "failed to store upload")?;
        let span = info_span!("process", upload = %upload_name, file = %client_name);
        self.run_stages(upload_name, bytes).instrument(span).await
    }

    async fn run_stages(
        &self,
        upload_name: String,
        bytes: Vec<u8>,
    ) -> Result<ResponsePayload, PipelineError> {
        let image_url = StorageLayout::upload_url(&upload_name);
        let source_text = ocr::recognize_upload(self.recognizer.clone(), bytes).await;
        if source_text.trim().is_empty() {
            info!("no text recognized");
            return Ok(ResponsePayload::no_text(image_url, &self.plan));
        }
        info!("recognized {} chars", source_text.chars().count());

        let ext = self.synthesizer.extension();
        let [first_lang, second_lang] = &self.plan.targets;
        let source_audio = self.storage.allocate_audio(&self.plan.source, ext);
        let first_audio = self.storage.allocate_audio(first_lang, ext);
        let second_audio = self.storage.allocate_audio(second_lang, ext);

        debug!("wave 1: translate {} and {}, speak {}", first_lang, second_lang, self.plan.source);
        let (first_text, second_text, ()) = tokio::try_join!(
            joined(self.spawn_translation(&source_text, first_lang)),
            joined(self.spawn_translation(&source_text, second_lang)),
            joined(self.spawn_speech(&source_text, &source_audio)),
        )?;

        debug!("wave 2: speak {} and {}", first_lang, second_lang);
        tokio::try_join!(
            joined(self.spawn_speech(&first_text, &first_audio)),
            joined(self.spawn_speech(&second_text, &second_audio)),
        )?;
        debug!("all waves complete");

        Ok(ResponsePayload {
            image_url,
            source: LanguageOutput {
                lang: self.plan.source.clone(),
                text: source_text,
                audio: Some(source_audio),
            },
            targets: [
                LanguageOutput {
                    lang: first_lang.clone(),
                    text: first_text,
                    audio: Some(first_audio),
                },
                LanguageOutput {
                    lang: second_lang.clone(),
                    text: second_text,
                    audio: Some(second_audio),
                },
            ],
            error: None,
        })
    }

    fn spawn_translation(&self, text: &str, target: &str) -> JoinHandle<Result<String>> {
        let future = self.translator.translate(
            text.to_string(),
            self.plan.source.clone(),
            target.to_string(),
        );
        let target = target.to_string();
        tokio::spawn(
            async move {
                future
                    .await
                    .with_context(|| format!("translation to {} failed", target))
            }
            .in_current_span(),
        )
    }

    fn spawn_speech(&self, text: &str, audio: &AudioArtifact) -> JoinHandle<Result<()>> {
        let future =
            self.synthesizer
                .synthesize(text.to_string(), audio.lang.clone(), audio.path.clone());
        let lang = audio.lang.clone();
        tokio::spawn(
            async move {
                future
                    .await
                    .with_context(|| format!("speech synthesis for {} failed", lang))
            }
            .in_current_span(),
        )
    }
}

async fn joined<T>(handle: JoinHandle<Result<T>>) -> Result<T> {
    handle.await.with_context(|| "adapter task failed")?
}
