use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

pub const UPLOADS_URL_PREFIX: &str = "/static/uploads";
pub const AUDIO_URL_PREFIX: &str = "/static/audio";

const FALLBACK_IMAGE_EXTENSION: &str = "jpg";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoredKind {
    Upload,
    Audio,
}

/// An audio file reserved for one language of one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioArtifact {
    pub lang: String,
    pub path: PathBuf,
    pub url: String,
}

/// The two flat directories that hold uploads and synthesized audio.
#[derive(Debug, Clone)]
pub struct StorageLayout {
    uploads_dir: PathBuf,
    audio_dir: PathBuf,
}

impl StorageLayout {
    pub fn new(static_dir: impl AsRef<Path>) -> Self {
        let static_dir = static_dir.as_ref();
        Self {
            uploads_dir: static_dir.join("uploads"),
            audio_dir: static_dir.join("audio"),
        }
    }

    pub fn uploads_dir(&self) -> &Path {
        &self.uploads_dir
    }

    pub fn audio_dir(&self) -> &Path {
        &self.audio_dir
    }

    pub async fn ensure_layout(&self) -> Result<()> {
        for dir in [&self.uploads_dir, &self.audio_dir] {
            tokio::fs::create_dir_all(dir)
                .await
                .with_context(|| format!("failed to create directory: {}", dir.display()))?;
        }
        Ok(())
    }

    /// Writes `bytes` under a fresh name and returns that name.
    pub async fn store_upload(&self, bytes: &[u8]) -> Result<String> {
        let ext = infer::get(bytes)
            .filter(|kind| kind.matcher_type() == infer::MatcherType::Image)
            .map(|kind| kind.extension())
            .unwrap_or(FALLBACK_IMAGE_EXTENSION);
        let name = format!("{}.{}", Uuid::new_v4().simple(), ext);
        let path = self.uploads_dir.join(&name);
        let mut file = tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
            .with_context(|| format!("failed to create upload: {}", path.display()))?;
        file.write_all(bytes)
            .await
            .with_context(|| format!("failed to write upload: {}", path.display()))?;
        file.flush()
            .await
            .with_context(|| format!("failed to flush upload: {}", path.display()))?;
        Ok(name)
    }

    pub fn upload_url(name: &str) -> String {
        format!("{}/{}", UPLOADS_URL_PREFIX, name)
    }

    /// Reserves `<uuid>_<lang>.<ext>` in the audio directory. Nothing is written.
    pub fn allocate_audio(&self, lang: &str, ext: &str) -> AudioArtifact {
        let name = format!("{}_{}.{}", Uuid::new_v4().simple(), lang, ext);
        AudioArtifact {
            lang: lang.to_string(),
            path: self.audio_dir.join(&name),
            url: format!("{}/{}", AUDIO_URL_PREFIX, name),
        }
    }

    /// Maps a served file name to its path, or `None` if the name could
    /// escape the directory.
    pub fn resolve(&self, kind: StoredKind, name: &str) -> Option<PathBuf> {
        if !is_safe_name(name) {
            return None;
        }
        let dir = match kind {
            StoredKind::Upload => &self.uploads_dir,
            StoredKind::Audio => &self.audio_dir,
        };
        Some(dir.join(name))
    }
}

fn is_safe_name(name: &str) -> bool {
    !name.is_empty()
        && !name.starts_with('.')
        && !name.contains(['/', '\\', '\0'])
        && !name.contains("..")
}
