use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use common::payment::ProviderError;
use sea_orm::DbErr;
use serde::Serialize;

/// Structured error response returned by all endpoints on failure.
#[derive(Serialize, utoipa::ToSchema)]
pub struct ErrorBody {
    /// Machine-readable error code. One of: `VALIDATION_ERROR`, `TOKEN_MISSING`,
    /// `TOKEN_INVALID`, `INVALID_CREDENTIALS`, `PERMISSION_DENIED`, `NOT_FOUND`,
    /// `CONFLICT`, `EMAIL_TAKEN`, `ALREADY_REGISTERED`, `EVENT_FULL`,
    /// `DUPLICATE_PENDING`, `WEBHOOK_SIGNATURE`, `PAYMENT_PROVIDER`,
    /// `MAINTENANCE_MODE`, `INTERNAL_ERROR`.
    #[schema(example = "VALIDATION_ERROR")]
    pub code: &'static str,
    /// Human-readable error description.
    #[schema(example = "Title must be 1-256 characters")]
    pub message: String,
}

/// Application-level error type.
#[derive(Debug)]
pub enum AppError {
    Validation(String),
    TokenMissing,
    TokenInvalid,
    InvalidCredentials,
    PermissionDenied,
    NotFound(String),
    Conflict(String),
    EmailTaken,
    /// The event already has a ledger entry for this user.
    AlreadyRegistered,
    /// The event's participant list is at capacity.
    EventFull,
    /// The user already has a pending role request.
    DuplicatePending,
    /// Webhook payload failed signature verification.
    WebhookSignature(String),
    /// The payment provider rejected or failed a request.
    PaymentProvider(String),
    /// The platform is in maintenance mode; participant writes are refused.
    Maintenance,
    Internal(String),
}

impl AppError {
    fn status_and_body(self) -> (StatusCode, ErrorBody) {
        match self {
            AppError::Validation(msg) => (
                StatusCode::BAD_REQUEST,
                ErrorBody {
                    code: "VALIDATION_ERROR",
                    message: msg,
                },
            ),
            AppError::TokenMissing => (
                StatusCode::UNAUTHORIZED,
                ErrorBody {
                    code: "TOKEN_MISSING",
                    message: "Authentication required".into(),
                },
            ),
            AppError::TokenInvalid => (
                StatusCode::UNAUTHORIZED,
                ErrorBody {
                    code: "TOKEN_INVALID",
                    message: "Invalid or expired token".into(),
                },
            ),
            AppError::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                ErrorBody {
                    code: "INVALID_CREDENTIALS",
                    message: "Invalid email or password".into(),
                },
            ),
            AppError::PermissionDenied => (
                StatusCode::FORBIDDEN,
                ErrorBody {
                    code: "PERMISSION_DENIED",
                    message: "Insufficient permissions".into(),
                },
            ),
            AppError::NotFound(msg) => (
                StatusCode::NOT_FOUND,
                ErrorBody {
                    code: "NOT_FOUND",
                    message: msg,
                },
            ),
            AppError::Conflict(msg) => (
                StatusCode::CONFLICT,
                ErrorBody {
                    code: "CONFLICT",
                    message: msg,
                },
            ),
            AppError::EmailTaken => (
                StatusCode::CONFLICT,
                ErrorBody {
                    code: "EMAIL_TAKEN",
                    message: "An account with this email already exists".into(),
                },
            ),
            AppError::AlreadyRegistered => (
                StatusCode::CONFLICT,
                ErrorBody {
                    code: "ALREADY_REGISTERED",
                    message: "Already registered for this event".into(),
                },
            ),
            AppError::EventFull => (
                StatusCode::CONFLICT,
                ErrorBody {
                    code: "EVENT_FULL",
                    message: "Event has reached its capacity".into(),
                },
            ),
            AppError::DuplicatePending => (
                StatusCode::CONFLICT,
                ErrorBody {
                    code: "DUPLICATE_PENDING",
                    message: "A pending role request already exists".into(),
                },
            ),
            AppError::WebhookSignature(detail) => {
                tracing::warn!("Webhook signature rejected: {}", detail);
                (
                    StatusCode::BAD_REQUEST,
                    ErrorBody {
                        code: "WEBHOOK_SIGNATURE",
                        message: "Webhook signature verification failed".into(),
                    },
                )
            }
            AppError::PaymentProvider(msg) => (
                StatusCode::BAD_GATEWAY,
                ErrorBody {
                    code: "PAYMENT_PROVIDER",
                    message: msg,
                },
            ),
            AppError::Maintenance => (
                StatusCode::SERVICE_UNAVAILABLE,
                ErrorBody {
                    code: "MAINTENANCE_MODE",
                    message: "The platform is temporarily down for maintenance".into(),
                },
            ),
            AppError::Internal(detail) => {
                tracing::error!("Internal error: {}", detail);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorBody {
                        code: "INTERNAL_ERROR",
                        message: "An unexpected error occurred".into(),
                    },
                )
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = self.status_and_body();
        (status, Json(body)).into_response()
    }
}

impl From<DbErr> for AppError {
    fn from(err: DbErr) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<ProviderError> for AppError {
    fn from(err: ProviderError) -> Self {
        match err {
            // Safe to surface: the provider's own message about our request.
            ProviderError::Rejected(msg) => AppError::PaymentProvider(msg),
            other => {
                tracing::error!("Payment provider error: {}", other);
                AppError::PaymentProvider("Payment provider request failed".into())
            }
        }
    }
}
