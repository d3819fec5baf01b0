use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use tracing::error;

use presenteio_db::{CancelError, ReserveError};

/// A typed API failure. Business outcomes keep their own error codes so the
/// UI can tell "someone else reserved this first" apart from a bug; storage
/// failures collapse into a logged, generic 500.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    code: &'static str,
    message: String,
}

#[derive(Serialize)]
struct ErrorBody {
    error: &'static str,
    message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
        }
    }

    pub fn bad_request(code: &'static str, message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, code, message)
    }

    pub fn unauthorized(code: &'static str, message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, code, message)
    }

    pub fn not_found(code: &'static str, message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, code, message)
    }

    pub fn conflict(code: &'static str, message: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, code, message)
    }

    pub fn internal(err: anyhow::Error) -> Self {
        error!("internal error: {:#}", err);
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "internal",
            "unexpected server error",
        )
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn code(&self) -> &'static str {
        self.code
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: self.code,
            message: self.message,
        };
        (self.status, Json(body)).into_response()
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        Self::internal(err)
    }
}

impl From<ReserveError> for ApiError {
    fn from(err: ReserveError) -> Self {
        match err {
            // Inactive is indistinguishable from absent on purpose.
            ReserveError::NotFound | ReserveError::Inactive => {
                Self::not_found("gift_not_available", "este presente não está disponível")
            }
            ReserveError::AlreadyReserved => Self::conflict(
                "already_reserved",
                "este presente já está reservado por outra pessoa",
            ),
            ReserveError::Storage(e) => Self::internal(e),
        }
    }
}

impl From<CancelError> for ApiError {
    fn from(err: CancelError) -> Self {
        match err {
            CancelError::NotFound => {
                Self::not_found("gift_not_available", "este presente não está disponível")
            }
            CancelError::NotOwner => Self::not_found(
                "reservation_not_found",
                "você não possui reserva deste presente",
            ),
            CancelError::Storage(e) => Self::internal(e),
        }
    }
}
