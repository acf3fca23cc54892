use axum::extract::Multipart;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use tracing::error;

use super::models::ErrorResponse;
use crate::pipeline::PipelineError;
use crate::upload::UploadedImage;

const FILE_FIELD: &str = "file";

#[derive(Debug)]
pub(crate) struct ServerError {
    pub(crate) status: StatusCode,
    pub(crate) message: String,
}

impl ServerError {
    pub(crate) fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    pub(crate) fn not_found(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: message.into(),
        }
    }

    pub(crate) fn internal(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: message.into(),
        }
    }
}

impl From<anyhow::Error> for ServerError {
    fn from(err: anyhow::Error) -> Self {
        ServerError::internal(format!("{:#}", err))
    }
}

impl From<PipelineError> for ServerError {
    fn from(err: PipelineError) -> Self {
        match err {
            PipelineError::InvalidInput(rejection) => ServerError::bad_request(rejection.message()),
            PipelineError::Fatal(err) => ServerError::from(err),
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            error!("request failed: {}", self.message);
        }
        (self.status, Json(ErrorResponse { detail: self.message })).into_response()
    }
}

/// Pulls the `file` field out of a multipart body. Other fields are ignored.
pub(crate) async fn read_upload(mut multipart: Multipart) -> Result<UploadedImage, ServerError> {
    while let Some(field) = multipart.next_field().await.map_err(|err| ServerError {
        status: err.status(),
        message: err.body_text(),
    })? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        let content_type = field.content_type().map(str::to_string);
        let file_name = field.file_name().map(str::to_string);
        let bytes = field.bytes().await.map_err(|err| ServerError {
            status: err.status(),
            message: err.body_text(),
        })?;
        return Ok(UploadedImage {
            bytes: bytes.to_vec(),
            content_type,
            file_name,
        });
    }
    Err(ServerError::bad_request("file field is required"))
}
