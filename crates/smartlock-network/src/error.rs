use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use smartlock_engine::EngineError;
use smartlock_storage::StorageError;
use thiserror::Error;
use tracing::error;

/// Result type alias for admin panel operations.
pub type AdminResult<T> = std::result::Result<T, AdminError>;

/// Errors surfaced by the admin panel.
#[derive(Error, Debug)]
pub enum AdminError {
    /// Login attempt with the wrong password
    #[error("Wrong password")]
    WrongPassword,

    /// A form value failed validation
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Feature not configured on this lock
    #[error("{0} unavailable")]
    Unavailable(&'static str),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),

    /// Binding or serving the listener failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<smartlock_core::Error> for AdminError {
    fn from(err: smartlock_core::Error) -> Self {
        Self::BadRequest(err.to_string())
    }
}

impl AdminError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::WrongPassword => StatusCode::UNAUTHORIZED,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Storage(_) | Self::Engine(_) | Self::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AdminError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(error = %self, "Admin request failed");
        }
        let body = format!(
            "<html><body><center><b>{}</b></center></body></html>",
            self
        );
        (status, Html(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(AdminError::WrongPassword.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            AdminError::BadRequest("x".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AdminError::Unavailable("Access log").status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn test_core_error_is_bad_request() {
        let err: AdminError = smartlock_core::Error::InvalidPin("too long".into()).into();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.to_string(), "Invalid request: Invalid PIN code: too long");
    }
}
