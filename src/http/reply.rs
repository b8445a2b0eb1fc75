use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::error::PlayerError;
use crate::player::PlaybackState;

/// JSON body shared by every transport endpoint.
#[derive(Debug, Serialize)]
pub struct Reply {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<PlaybackState>,
}

impl Reply {
    pub fn success(state: PlaybackState) -> Self {
        Self {
            status: "success",
            message: None,
            state: Some(state),
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: "error",
            message: Some(message.into()),
            state: None,
        }
    }
}

impl IntoResponse for Reply {
    fn into_response(self) -> Response {
        let status = if self.status == "success" {
            StatusCode::OK
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        };
        (status, Json(self)).into_response()
    }
}

pub fn status_for(err: &PlayerError) -> StatusCode {
    match err {
        PlayerError::MediaNotFound(_) => StatusCode::NOT_FOUND,
        PlayerError::NoMediaSelected | PlayerError::NoActiveProcess => StatusCode::CONFLICT,
        PlayerError::NotSupported(_) => StatusCode::NOT_IMPLEMENTED,
        PlayerError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
        PlayerError::Spawn { .. }
        | PlayerError::ProbeFailed(_)
        | PlayerError::ConversionFailed(_)
        | PlayerError::Signal(_)
        | PlayerError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for PlayerError {
    fn into_response(self) -> Response {
        let status = status_for(&self);
        if status.is_server_error() {
            tracing::error!("{}", self);
        } else {
            tracing::debug!("Rejected request: {}", self);
        }
        (status, Json(Reply::error(self.to_string()))).into_response()
    }
}
