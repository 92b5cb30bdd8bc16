use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use scouted_shared::ScoutedError;
use thiserror::Error;
use tracing::{error, warn};

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Scouted(#[from] ScoutedError),

    #[error("no player named '{0}'")]
    PlayerNotFound(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Scouted(ScoutedError::InvalidViewRequest(_)) => StatusCode::BAD_REQUEST,
            Self::Scouted(ScoutedError::MissingSnapshot { .. }) | Self::PlayerNotFound(_) => {
                StatusCode::NOT_FOUND
            }
            Self::Scouted(
                ScoutedError::MalformedRecord { .. }
                | ScoutedError::Io { .. }
                | ScoutedError::Csv { .. },
            )
            | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = self.to_string();
        if status.is_server_error() {
            error!(status = status.as_u16(), error = %message, "request failed");
        } else {
            warn!(status = status.as_u16(), error = %message, "request rejected");
        }
        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}
