use anyhow::Result;
use std::future::Future;
use std::pin::Pin;

pub mod languages;
pub mod logging;
pub mod ocr;
pub mod pipeline;
pub mod server;
pub mod settings;
pub mod speech;
pub mod storage;
mod text;
pub mod translate;
pub mod upload;

pub use pipeline::{LanguageOutput, Pipeline, PipelineError, ResponsePayload};
pub use settings::Settings;
pub use upload::UploadedImage;

/// Boxed future returned by the translation and speech adapters.
pub type AdapterFuture<T> = Pin<Box<dyn Future<Output = Result<T>> + Send>>;
