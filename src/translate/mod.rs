mod google;

use crate::AdapterFuture;

pub use google::GoogleTranslate;

/// Translates text between two ISO 639-1 languages.
pub trait Translate: Send + Sync {
    fn translate(&self, text: String, source: String, target: String) -> AdapterFuture<String>;
}
