use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use ontdek_core::error::CmsError;

// ---------------------------------------------------------------------------
// AppError
// ---------------------------------------------------------------------------

/// Unified error type for HTTP responses.
#[derive(Debug)]
pub struct AppError(pub anyhow::Error);

impl AppError {
    /// Wrap a failed `spawn_blocking` join.
    pub fn join(err: tokio::task::JoinError) -> Self {
        Self(anyhow::anyhow!("task join error: {err}"))
    }
}

fn status_for(err: &CmsError) -> StatusCode {
    match err {
        CmsError::NotInitialized => StatusCode::BAD_REQUEST,
        CmsError::UnknownCollection(_)
        | CmsError::NotFound { .. }
        | CmsError::SlugNotFound { .. }
        | CmsError::UserNotFound(_) => StatusCode::NOT_FOUND,
        CmsError::InvalidRank { .. }
        | CmsError::InvalidSlug(_)
        | CmsError::InvalidField(_)
        | CmsError::InvalidEmail(_)
        | CmsError::InvalidRole(_) => StatusCode::BAD_REQUEST,
        CmsError::SlugExists { .. } | CmsError::UserExists(_) => StatusCode::CONFLICT,
        CmsError::Storage(_) | CmsError::Io(_) | CmsError::Yaml(_) | CmsError::Json(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

/// Malformed request bodies are the caller's fault, whatever axum would say.
fn rejection_status(rejection: &JsonRejection) -> StatusCode {
    match rejection {
        JsonRejection::MissingJsonContentType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
        _ => StatusCode::BAD_REQUEST,
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = if let Some(e) = self.0.downcast_ref::<CmsError>() {
            status_for(e)
        } else if let Some(rejection) = self.0.downcast_ref::<JsonRejection>() {
            rejection_status(rejection)
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        };

        if status.is_server_error() {
            tracing::error!(error = %format!("{:#}", self.0), "request failed");
        }

        let body = serde_json::json!({ "error": self.0.to_string() });
        (status, axum::Json(body)).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}
