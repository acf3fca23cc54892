use anyhow::{anyhow, Context, Result};
use serde_json::Value;
use tracing::debug;

use super::Translate;
use crate::AdapterFuture;
use crate::text::split_chunks;

const DEFAULT_BASE_URL: &str = "https://translate.googleapis.com";
const MAX_CHUNK_CHARS: usize = 5000;
/// Upper bound for the percent-encoded `q` parameter of one request.
const MAX_QUERY_BYTES: usize = 8000;

/// Client for the public Google Translate endpoint.
#[derive(Debug, Clone)]
pub struct GoogleTranslate {
    client: reqwest::Client,
    base_url: String,
}

impl GoogleTranslate {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        if !base_url.trim().is_empty() {
            self.base_url = base_url.trim_end_matches('/').to_string();
        }
        self
    }
}

impl Default for GoogleTranslate {
    fn default() -> Self {
        Self::new()
    }
}

impl Translate for GoogleTranslate {
    fn translate(&self, text: String, source: String, target: String) -> AdapterFuture<String> {
        let client = self.client.clone();
        let url = format!("{}/translate_a/single", self.base_url);
        Box::pin(async move {
            let mut parts = Vec::new();
            for chunk in split_chunks(&text, chunk_limit(&text)) {
                parts.push(translate_chunk(&client, &url, &chunk, &source, &target).await?);
            }
            debug!("translated {} chunk(s) {} -> {}", parts.len(), source, target);
            Ok(parts.join(" "))
        })
    }
}

async fn translate_chunk(
    client: &reqwest::Client,
    url: &str,
    text: &str,
    source: &str,
    target: &str,
) -> Result<String> {
    let response = client
        .get(url)
        .query(&[
            ("client", "gtx"),
            ("sl", source),
            ("tl", target),
            ("dt", "t"),
            ("q", text),
        ])
        .send()
        .await
        .with_context(|| format!("failed to reach translation service for {}", target))?;

    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    if !status.is_success() {
        return Err(anyhow!(
            "translation API error ({}): {}",
            status,
            body.trim()
        ));
    }
    extract_translation(&body)
}

/// Characters per chunk such that no chunk encodes past `MAX_QUERY_BYTES`.
pub(crate) fn chunk_limit(text: &str) -> usize {
    let widest = text.chars().map(encoded_width).max().unwrap_or(1);
    (MAX_QUERY_BYTES / widest).clamp(1, MAX_CHUNK_CHARS)
}

fn encoded_width(ch: char) -> usize {
    if ch.is_ascii_alphanumeric() || matches!(ch, '-' | '.' | '_' | '~') {
        1
    } else {
        3 * ch.len_utf8()
    }
}

/// Concatenates the translated segments found in `[[["out", "in", ...], ...], ...]`.
pub(crate) fn extract_translation(body: &str) -> Result<String> {
    let value: Value =
        serde_json::from_str(body).with_context(|| "failed to parse translation response")?;
    let Some(root) = value.as_array() else {
        return Err(anyhow!("unexpected translation response shape"));
    };
    let segments = match root.first() {
        Some(Value::Array(segments)) => segments,
        Some(Value::Null) | None => return Ok(String::new()),
        Some(_) => return Err(anyhow!("unexpected translation response shape")),
    };
    let mut out = String::new();
    for segment in segments {
        if let Some(piece) = segment.get(0).and_then(Value::as_str) {
            out.push_str(piece);
        }
    }
    Ok(out.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::Query;
    use axum::routing::get;
    use axum::{Json, Router};
    use serde_json::json;
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    #[test]
    fn joins_segments_in_order() {
        let body = r#"[[["Kannada ","ಕನ್ನಡ ",null,null,10],["language","ಭಾಷೆ",null,null,10]],null,"kn"]"#;
        assert_eq!(extract_translation(body).expect("parse"), "Kannada language");
    }

    #[test]
    fn null_segments_mean_empty_translation() {
        assert_eq!(extract_translation(r#"[null,null,"kn"]"#).expect("parse"), "");
    }

    #[test]
    fn malformed_bodies_are_errors() {
        assert!(extract_translation("<html>blocked</html>").is_err());
        assert!(extract_translation(r#"{"error": "nope"}"#).is_err());
        assert!(extract_translation(r#"["nope"]"#).is_err());
    }

    fn encoded_len(text: &str) -> usize {
        text.chars().map(encoded_width).sum()
    }

    #[test]
    fn chunk_limit_tracks_encoded_width() {
        assert_eq!(chunk_limit("plain ascii words"), MAX_QUERY_BYTES / 3);
        assert_eq!(chunk_limit("abc"), MAX_CHUNK_CHARS);
        assert_eq!(chunk_limit("ಕನ್ನಡ ಭಾಷೆ"), MAX_QUERY_BYTES / 9);

        let text = "ಕನ್ನಡ ".repeat(2000);
        let chunks = split_chunks(&text, chunk_limit(&text));
        assert!(chunks.len() > 1);
        assert!(chunks.iter().all(|chunk| encoded_len(chunk) <= MAX_QUERY_BYTES));
    }

    async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind");
        let addr = listener.local_addr().expect("addr");
        tokio::spawn(async move {
            axum::serve(listener, router).await.expect("serve");
        });
        format!("http://{}", addr)
    }

    #[tokio::test]
    async fn sends_language_pair_and_text() {
        let router = Router::new().route(
            "/translate_a/single",
            get(|Query(params): Query<HashMap<String, String>>| async move {
                Json(json!([[[
                    format!("{}>{}:{}", params["sl"], params["tl"], params["q"]),
                    params["q"],
                ]]]))
            }),
        );
        let base = serve(router).await;
        let translator = GoogleTranslate::new().with_base_url(format!("{}/", base));
        let text = translator
            .translate("ಕನ್ನಡ".to_string(), "kn".to_string(), "hi".to_string())
            .await
            .expect("translate");
        assert_eq!(text, "kn>hi:ಕನ್ನಡ");
    }

    #[tokio::test]
    async fn error_status_is_reported() {
        let router = Router::new().route(
            "/translate_a/single",
            get(|| async { (axum::http::StatusCode::TOO_MANY_REQUESTS, "slow down") }),
        );
        let base = serve(router).await;
        let translator = GoogleTranslate::new().with_base_url(base);
        let err = translator
            .translate("ಕನ್ನಡ".to_string(), "kn".to_string(), "en".to_string())
            .await
            .expect_err("429");
        assert!(err.to_string().contains("429"));
    }

    #[tokio::test]
    async fn long_kannada_text_is_sent_in_bounded_requests() {
        let seen: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
        let recorded = seen.clone();
        let router = Router::new().route(
            "/translate_a/single",
            get(move |Query(params): Query<HashMap<String, String>>| {
                let recorded = recorded.clone();
                async move {
                    recorded.lock().unwrap().push(params["q"].clone());
                    Json(json!([[[params["q"], params["q"]]]]))
                }
            }),
        );
        let base = serve(router).await;
        let text = "ಕನ್ನಡ ".repeat(400);
        let translated = GoogleTranslate::new()
            .with_base_url(base)
            .translate(text.clone(), "kn".to_string(), "en".to_string())
            .await
            .expect("translate");

        assert_eq!(translated, text.trim());
        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 3);
        assert!(seen.iter().all(|q| encoded_len(q) <= MAX_QUERY_BYTES));
    }
}
