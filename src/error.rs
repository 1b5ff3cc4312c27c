use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use derive_more::Display;

use crate::engine::punch::PunchError;

/// Errors surfaced by the HTTP layer. Every variant renders as
/// `{"message": "..."}`.
#[derive(Debug, Display)]
pub enum ApiError {
    #[display(fmt = "{}", _0)]
    BadRequest(String),
    #[display(fmt = "{}", _0)]
    NotFound(String),
    #[display(fmt = "{}", _0)]
    Conflict(String),
    #[display(fmt = "Internal Server Error")]
    Internal(anyhow::Error),
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(serde_json::json!({
            "message": self.to_string()
        }))
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(e: anyhow::Error) -> Self {
        tracing::error!(error = ?e, "Request failed");
        ApiError::Internal(e)
    }
}

impl From<PunchError> for ApiError {
    fn from(e: PunchError) -> Self {
        match e {
            PunchError::MissingEmployeeCode
            | PunchError::InvalidLocation
            | PunchError::NoOpenCheckIn { .. } => ApiError::BadRequest(e.to_string()),
            PunchError::UnknownEmployee(_) => ApiError::NotFound(e.to_string()),
            PunchError::CheckOutBeforeCheckIn { .. } => ApiError::Conflict(e.to_string()),
            PunchError::Store(inner) => inner.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;

    #[actix_web::test]
    async fn renders_message_body() {
        let err: ApiError = PunchError::UnknownEmployee("E-404".into()).into();
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);

        let body = to_bytes(err.error_response().into_body()).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["message"], "Unknown employee code E-404");
    }

    #[test]
    fn store_failures_hide_details() {
        let err: ApiError = PunchError::Store(anyhow::anyhow!("connection reset")).into();
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.to_string(), "Internal Server Error");
    }
}
