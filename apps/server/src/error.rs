use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use ledgerfolio_core::errors::{AnalyticsError, DatabaseError, Error as CoreError};
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    Core(#[from] CoreError),
}

#[derive(Serialize)]
struct ErrorBody {
    code: u16,
    message: String,
}

fn core_status(err: &CoreError) -> StatusCode {
    match err {
        CoreError::Validation(_) | CoreError::Ledger(_) => StatusCode::BAD_REQUEST,
        CoreError::Analytics(AnalyticsError::UnknownBenchmark(_)) => StatusCode::NOT_FOUND,
        CoreError::Analytics(AnalyticsError::InsufficientData { .. })
        | CoreError::Analytics(AnalyticsError::ValueOutOfRange(_))
        | CoreError::PriceUnavailable(_) => StatusCode::UNPROCESSABLE_ENTITY,
        CoreError::Database(DatabaseError::UniqueViolation(_)) => StatusCode::CONFLICT,
        CoreError::Database(DatabaseError::NotFound(_)) => StatusCode::NOT_FOUND,
        CoreError::MarketData(_) => StatusCode::BAD_GATEWAY,
        CoreError::Database(_) | CoreError::Unexpected(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, msg) = match &self {
            ApiError::Core(e) => (core_status(e), e.to_string()),
        };
        if status.is_server_error() {
            tracing::error!("Request failed: {}", msg);
        }
        let body = Json(ErrorBody {
            code: status.as_u16(),
            message: msg,
        });
        (status, body).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
