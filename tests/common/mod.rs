#![allow(dead_code)]

use anyhow::anyhow;
use chitravachaka::languages::LanguagePlan;
use chitravachaka::ocr::TextRecognizer;
use chitravachaka::server::{router, ServerState};
use chitravachaka::speech::SpeechSynthesizer;
use chitravachaka::storage::StorageLayout;
use chitravachaka::translate::Translate;
use chitravachaka::{AdapterFuture, Pipeline};
use image::RgbImage;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tempfile::TempDir;

pub const MAX_UPLOAD_BYTES: usize = 1024 * 1024;

#[derive(Default)]
pub struct Calls {
    translations: AtomicUsize,
    syntheses: AtomicUsize,
}

impl Calls {
    pub fn translations(&self) -> usize {
        self.translations.load(Ordering::SeqCst)
    }

    pub fn syntheses(&self) -> usize {
        self.syntheses.load(Ordering::SeqCst)
    }
}

pub struct FixedText(pub &'static str);

impl TextRecognizer for FixedText {
    fn recognize(&self, _image: &RgbImage) -> anyhow::Result<String> {
        Ok(self.0.to_string())
    }
}

pub struct EchoTranslator {
    pub calls: Arc<Calls>,
    pub fail: bool,
}

impl Translate for EchoTranslator {
    fn translate(&self, text: String, _source: String, target: String) -> AdapterFuture<String> {
        self.calls.translations.fetch_add(1, Ordering::SeqCst);
        let fail = self.fail;
        Box::pin(async move {
            if fail {
                return Err(anyhow!("translation backend unavailable"));
            }
            Ok(format!("{}:{}", target, text))
        })
    }
}

/// Writes an ID3-prefixed file so the static handler sniffs it as MP3.
pub struct FakeSpeech {
    pub calls: Arc<Calls>,
}

impl SpeechSynthesizer for FakeSpeech {
    fn synthesize(&self, text: String, lang: String, dest: PathBuf) -> AdapterFuture<()> {
        self.calls.syntheses.fetch_add(1, Ordering::SeqCst);
        Box::pin(async move {
            let mut bytes = b"ID3\x04\x00\x00\x00\x00\x00\x00".to_vec();
            bytes.extend_from_slice(format!("{}|{}", lang, text).as_bytes());
            tokio::fs::write(&dest, bytes).await?;
            Ok(())
        })
    }

    fn extension(&self) -> &'static str {
        "mp3"
    }
}

pub struct TestApp {
    pub base_url: String,
    pub dir: TempDir,
    pub calls: Arc<Calls>,
    pub client: reqwest::Client,
}

impl TestApp {
    pub fn uploads_dir(&self) -> PathBuf {
        self.dir.path().join("uploads")
    }

    pub fn audio_dir(&self) -> PathBuf {
        self.dir.path().join("audio")
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub async fn upload(&self, bytes: Vec<u8>, mime: &str) -> reqwest::Response {
        let part = reqwest::multipart::Part::bytes(bytes)
            .file_name("sign.png")
            .mime_str(mime)
            .expect("mime");
        let form = reqwest::multipart::Form::new().part("file", part);
        self.client
            .post(self.url("/process/"))
            .multipart(form)
            .send()
            .await
            .expect("send upload")
    }
}

pub async fn spawn_app(text: &'static str) -> TestApp {
    spawn_app_with(text, false).await
}

pub async fn spawn_app_with(text: &'static str, failing_translation: bool) -> TestApp {
    let dir = tempfile::tempdir().expect("tempdir");
    let storage = StorageLayout::new(dir.path());
    storage.ensure_layout().await.expect("layout");
    let calls = Arc::new(Calls::default());
    let pipeline = Pipeline::new(
        storage,
        LanguagePlan::default(),
        Arc::new(FixedText(text)),
        Arc::new(EchoTranslator {
            calls: calls.clone(),
            fail: failing_translation,
        }),
        Arc::new(FakeSpeech {
            calls: calls.clone(),
        }),
    );
    let app = router(Arc::new(ServerState::new(pipeline)), MAX_UPLOAD_BYTES);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind");
    let addr = listener.local_addr().expect("addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("serve");
    });

    TestApp {
        base_url: format!("http://{}", addr),
        dir,
        calls,
        client: reqwest::Client::new(),
    }
}

pub fn png_bytes() -> Vec<u8> {
    let mut cursor = Cursor::new(Vec::new());
    RgbImage::from_pixel(16, 16, image::Rgb([255, 255, 255]))
        .write_to(&mut cursor, image::ImageFormat::Png)
        .expect("encode png");
    cursor.into_inner()
}

pub fn file_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .expect("read dir")
        .map(|entry| entry.expect("entry").file_name().to_string_lossy().to_string())
        .collect();
    names.sort();
    names
}
