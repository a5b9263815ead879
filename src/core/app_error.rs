use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use uuid::Uuid;

/// Application-wide error type returned by every fallible operation.
///
/// Business errors (validation, availability, access) surface as 4xx with
/// their real message; infrastructure errors surface as an opaque 5xx carrying
/// only a correlation id, with full detail going to the logs.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("record not found")]
    NotFound,

    #[error("validation error occurred while validating the field={0}")]
    Validation(String),

    #[error("you don't have permissions to access this resource")]
    AccessDenied,

    #[error("request is not authorized")]
    NotAuthorized,

    #[error("unknown domain")]
    UnknownDomain,

    #[error("provided delivery address is wrong")]
    InvalidAddress,

    #[error("some items are currently unavailable, please delete them from the cart and recreate the order")]
    SomeItemsUnavailable,

    #[error("order not found")]
    OrderNotFound,

    #[error("max number of store retries has been exceeded")]
    RetriesExceeded,

    #[error("{0}")]
    BadRequest(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
    exception: &'static str,
    message: String,
    error_id: String,
}

impl AppError {
    /// Stable exception kind names, part of the client error contract.
    fn kind(&self) -> &'static str {
        match self {
            Self::NotFound => "RecordNotFound",
            Self::Validation(_) => "ValidationError",
            Self::AccessDenied => "AccessDenied",
            Self::NotAuthorized => "NotAuthorized",
            Self::UnknownDomain => "UnknownDomain",
            Self::InvalidAddress => "WrongDeliveryAddress",
            Self::SomeItemsUnavailable => "SomeItemsAreNotAvailable",
            Self::OrderNotFound => "OrderNotFound",
            Self::RetriesExceeded => "NumberOfRetriesExceeded",
            Self::BadRequest(_) => "BadRequest",
            Self::Other(_) => "InternalError",
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            Self::NotFound | Self::OrderNotFound => StatusCode::NOT_FOUND,
            Self::Validation(_)
            | Self::UnknownDomain
            | Self::InvalidAddress
            | Self::SomeItemsUnavailable
            | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotAuthorized => StatusCode::UNAUTHORIZED,
            Self::AccessDenied => StatusCode::FORBIDDEN,
            Self::RetriesExceeded => StatusCode::SERVICE_UNAVAILABLE,
            Self::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let error_id = Uuid::new_v4().to_string();
        let status = self.status();

        // Never leak internals: 5xx responses get a generic message, the real
        // cause only reaches the logs together with the correlation id.
        let message = if status.is_server_error() {
            tracing::error!(%error_id, error = ?self, "request failed");
            "internal server error".to_owned()
        } else {
            tracing::warn!(%error_id, error = %self, "request rejected");
            self.to_string()
        };

        let body = ErrorBody {
            error: message.clone(),
            exception: self.kind(),
            message,
            error_id,
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn business_errors_map_to_client_status_codes() {
        assert_eq!(AppError::NotFound.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            AppError::Validation("title".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(AppError::AccessDenied.status(), StatusCode::FORBIDDEN);
        assert_eq!(AppError::NotAuthorized.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            AppError::SomeItemsUnavailable.status(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn infrastructure_errors_map_to_server_status_codes() {
        assert_eq!(
            AppError::RetriesExceeded.status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            AppError::Other(anyhow::anyhow!("boom")).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
