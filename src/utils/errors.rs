//! Sistema de manejo de errores
//!
//! Este módulo define todos los tipos de errores del sistema de ticketing
//! y su conversión a respuestas HTTP apropiadas. Cada variante corresponde
//! a una condición detectada de forma síncrona; ninguna se reintenta
//! automáticamente.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Errores principales de la aplicación
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("Invalid ID provided")]
    InvalidIdentifier,

    #[error("Invalid {0} is provided")]
    UnknownValue(&'static str),

    #[error("Invalid {0} is provided")]
    InvalidValue(&'static str),

    #[error("The {0} is missing")]
    MissingParameter(&'static str),

    #[error("Unexpected parameter {0} is provided")]
    UnexpectedParameter(&'static str),

    #[error("The {0} cannot be set to the provided value")]
    InvalidStateTransition(&'static str),

    #[error("The {0} is not associated with {1}")]
    InvalidAssociation(&'static str, &'static str),

    #[error("The status of {0} is not in an active or useful state")]
    InactiveResource(&'static str),

    #[error("The {0} is currently in use")]
    DataInUse(&'static str),

    #[error("Maximum limit for {0} is exceeded")]
    ExceededMaxLimit(&'static str),

    #[error("The {0} already has an assigned duty for this {1}")]
    DuplicateDuty(&'static str, &'static str),

    #[error("Invalid fare function")]
    InvalidFareFunction,

    #[error("Invalid dynamic fare version")]
    InvalidFareVersion,

    #[error("Ticket type '{0}' cannot be validated using the function")]
    UnknownTicketType(String),

    #[error("JavaScript execution timed out")]
    JsTimeLimitExceeded,

    #[error("JavaScript execution exceeded the allowed memory limit")]
    JsMemoryLimitExceeded,

    #[error("Lock acquisition timed out")]
    LockAcquireTimeout,

    #[error("Malformed digital ticket: {0}")]
    MalformedTicket(&'static str),

    #[error("Internal server error: {0}")]
    Internal(String),
}

/// Respuesta de error para la API
#[derive(Debug, serde::Serialize)]
struct ErrorResponse {
    error: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<serde_json::Value>,
}

impl AppError {
    /// Código de error estable para clientes (cabecera X-Error del sistema original)
    fn error_code(&self) -> &'static str {
        match self {
            AppError::Database(_) => "DatabaseError",
            AppError::Redis(_) => "RedisAPIError",
            AppError::Validation(_) => "ValidationError",
            AppError::InvalidIdentifier => "InvalidIdentifier",
            AppError::UnknownValue(_) => "UnknownValue",
            AppError::InvalidValue(_) => "InvalidValue",
            AppError::MissingParameter(_) => "MissingParameter",
            AppError::UnexpectedParameter(_) => "UnexpectedParameter",
            AppError::InvalidStateTransition(_) => "InvalidStateTransition",
            AppError::InvalidAssociation(_, _) => "InvalidAssociation",
            AppError::InactiveResource(_) => "InactiveResource",
            AppError::DataInUse(_) => "DataInUse",
            AppError::ExceededMaxLimit(_) => "ExceededMaxLimit",
            AppError::DuplicateDuty(_, _) => "DuplicateDuty",
            AppError::InvalidFareFunction => "InvalidFareFunction",
            AppError::InvalidFareVersion => "InvalidFareVersion",
            AppError::UnknownTicketType(_) => "UnknownTicketType",
            AppError::JsTimeLimitExceeded => "JSTimeout",
            AppError::JsMemoryLimitExceeded => "JSMemoryLimitExceeded",
            AppError::LockAcquireTimeout => "LockAcquireTimeout",
            AppError::MalformedTicket(_) => "MalformedTicket",
            AppError::Internal(_) => "InternalError",
        }
    }

    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Redis(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::InvalidIdentifier | AppError::UnknownValue(_) => StatusCode::NOT_FOUND,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            // Las violaciones de reglas de negocio responden 406,
            // igual que el servidor original.
            _ => StatusCode::NOT_ACCEPTABLE,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.error_code();

        let details = match &self {
            AppError::Database(e) => {
                tracing::error!("❌ Database error: {}", e);
                Some(json!({ "sql_error": e.to_string() }))
            }
            AppError::Redis(e) => {
                tracing::error!("❌ Redis error: {}", e);
                Some(json!({ "redis_error": e.to_string() }))
            }
            AppError::Validation(e) => Some(json!(e)),
            AppError::Internal(msg) => {
                tracing::error!("❌ Internal error: {}", msg);
                None
            }
            _ => None,
        };

        let body = ErrorResponse {
            error: code.to_string(),
            message: self.to_string(),
            details,
        };

        (status, Json(body)).into_response()
    }
}

/// Resultado tipado para operaciones que pueden fallar
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn business_rule_errors_are_406() {
        assert_eq!(
            AppError::InvalidFareFunction.status_code(),
            StatusCode::NOT_ACCEPTABLE
        );
        assert_eq!(
            AppError::LockAcquireTimeout.status_code(),
            StatusCode::NOT_ACCEPTABLE
        );
        assert_eq!(
            AppError::InvalidStateTransition("status").status_code(),
            StatusCode::NOT_ACCEPTABLE
        );
    }

    #[test]
    fn unknown_value_is_404() {
        assert_eq!(
            AppError::UnknownValue("service_id").status_code(),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn error_codes_are_stable() {
        assert_eq!(AppError::JsTimeLimitExceeded.error_code(), "JSTimeout");
        assert_eq!(
            AppError::UnknownTicketType("Adult".into()).error_code(),
            "UnknownTicketType"
        );
    }
}
