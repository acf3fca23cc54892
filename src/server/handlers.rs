use anyhow::{Context, Result};
use axum::body::Body;
use axum::extract::multipart::MultipartRejection;
use axum::extract::{DefaultBodyLimit, Multipart, Path, State};
use axum::http::{header, HeaderMap, HeaderValue, Method, Request, Response, StatusCode};
use axum::middleware::Next;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use std::sync::Arc;
use tracing::{info, warn};

use super::models::{HealthResponse, RootResponse, SERVICE_NAME};
use super::process::{read_upload, ServerError};
use super::state::ServerState;
use crate::languages::map_lang_for_tesseract;
use crate::ocr::Tesseract;
use crate::pipeline::{Pipeline, ResponsePayload};
use crate::settings::Settings;
use crate::storage::StoredKind;

const OCTET_STREAM_MIME: &str = "application/octet-stream";

pub async fn run_server(settings: Settings) -> Result<()> {
    let pipeline = Pipeline::from_settings(&settings)?;
    pipeline.storage().ensure_layout().await?;
    info!(
        "languages: {}",
        pipeline.plan().all().collect::<Vec<_>>().join(", ")
    );
    warn_on_missing_ocr_data(&settings).await;

    let state = Arc::new(ServerState::new(pipeline));
    let app = router(state, settings.max_upload_bytes);
    let addr = format!("{}:{}", settings.host, settings.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind server address {}", addr))?;
    info!("listening on {}", addr);
    axum::serve(listener, app).await?;
    Ok(())
}

pub fn router(state: Arc<ServerState>, max_upload_bytes: usize) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/process", post(process))
        .route("/process/", post(process))
        .route("/static/uploads/:name", get(uploaded_file))
        .route("/static/audio/:name", get(audio_file))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .with_state(state)
        .layer(axum::middleware::from_fn(cors_middleware))
}

async fn warn_on_missing_ocr_data(settings: &Settings) {
    let tesseract = Tesseract::new(
        settings.tesseract_cmd.clone(),
        settings.tessdata_dir.clone(),
        &map_lang_for_tesseract(&settings.source_lang),
    );
    match tokio::task::spawn_blocking(move || tesseract.missing_languages()).await {
        Ok(Ok(missing)) if missing.is_empty() => {}
        Ok(Ok(missing)) => warn!(
            "tesseract data missing for {}; OCR will report no text",
            missing.join(", ")
        ),
        Ok(Err(err)) => warn!("tesseract is not usable: {:#}", err),
        Err(err) => warn!("tesseract check failed: {}", err),
    }
}

async fn root() -> impl IntoResponse {
    Json(RootResponse {
        message: format!("{} API is running!", SERVICE_NAME),
        status: "healthy",
    })
}

async fn health() -> impl IntoResponse {
    (StatusCode::OK, Json(HealthResponse { status: "healthy" }))
}

async fn process(
    State(state): State<Arc<ServerState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<ResponsePayload>, ServerError> {
    let multipart = multipart.map_err(|err| ServerError::bad_request(err.body_text()))?;
    let upload = read_upload(multipart).await?;
    let payload = state.pipeline.process(upload).await?;
    Ok(Json(payload))
}

async fn uploaded_file(
    State(state): State<Arc<ServerState>>,
    Path(name): Path<String>,
) -> Result<Response<Body>, ServerError> {
    serve_stored(&state, StoredKind::Upload, &name).await
}

async fn audio_file(
    State(state): State<Arc<ServerState>>,
    Path(name): Path<String>,
) -> Result<Response<Body>, ServerError> {
    serve_stored(&state, StoredKind::Audio, &name).await
}

async fn serve_stored(
    state: &ServerState,
    kind: StoredKind,
    name: &str,
) -> Result<Response<Body>, ServerError> {
    let path = state
        .storage()
        .resolve(kind, name)
        .ok_or_else(|| ServerError::bad_request("invalid file name"))?;
    let bytes = match tokio::fs::read(&path).await {
        Ok(bytes) => bytes,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            return Err(ServerError::not_found("file not found"));
        }
        Err(err) => {
            return Err(ServerError::internal(format!(
                "failed to read {}: {}",
                path.display(),
                err
            )));
        }
    };
    let mime = infer::get(&bytes)
        .map(|kind| kind.mime_type())
        .unwrap_or(OCTET_STREAM_MIME);
    Ok(([(header::CONTENT_TYPE, HeaderValue::from_static(mime))], bytes).into_response())
}

async fn cors_middleware(req: Request<Body>, next: Next) -> Result<Response<Body>, StatusCode> {
    if req.method() == Method::OPTIONS {
        let mut response = Response::new(Body::empty());
        *response.status_mut() = StatusCode::NO_CONTENT;
        apply_cors_headers(response.headers_mut());
        return Ok(response);
    }
    let mut response = next.run(req).await;
    apply_cors_headers(response.headers_mut());
    Ok(response)
}

fn apply_cors_headers(headers: &mut HeaderMap) {
    headers.insert("access-control-allow-origin", HeaderValue::from_static("*"));
    headers.insert(
        "access-control-allow-methods",
        HeaderValue::from_static("GET,POST,OPTIONS"),
    );
    headers.insert(
        "access-control-allow-headers",
        HeaderValue::from_static("*"),
    );
}
