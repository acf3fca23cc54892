mod preprocess;
mod tesseract;

use anyhow::Result;
use image::RgbImage;
use std::sync::Arc;
use tracing::warn;

pub use preprocess::{decode_rgb, flatten_to_rgb};
pub use tesseract::Tesseract;

/// Blocking text extraction from a normalized RGB image.
pub trait TextRecognizer: Send + Sync {
    fn recognize(&self, image: &RgbImage) -> Result<String>;
}

/// Decodes `bytes` and runs `recognizer` on a blocking worker.
///
/// Failures anywhere in decoding or recognition yield an empty string: an image
/// OCR cannot read is reported as having no text, not as a failed request.
pub async fn recognize_upload(recognizer: Arc<dyn TextRecognizer>, bytes: Vec<u8>) -> String {
    let result = tokio::task::spawn_blocking(move || {
        let image = decode_rgb(&bytes)?;
        recognizer.recognize(&image)
    })
    .await;

    match result {
        Ok(Ok(text)) => text.trim().to_string(),
        Ok(Err(err)) => {
            warn!("ocr failed; treating as no text: {:#}", err);
            String::new()
        }
        Err(err) => {
            warn!("ocr worker failed; treating as no text: {}", err);
            String::new()
        }
    }
}
