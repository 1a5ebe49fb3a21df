//! Sistema de manejo de errores
//!
//! Este módulo define todos los tipos de errores del sistema
//! y su conversión a respuestas HTTP apropiadas.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

/// Errores de validación del Route Builder.
///
/// Todos se detectan antes de cualquier llamada de red y dejan la lista de
/// trabajo sin cambios.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BuilderError {
    #[error("A technician must be selected before saving")]
    MissingTechnician,

    #[error("The technician of an existing route cannot be changed")]
    TechnicianLocked,

    #[error("Add at least one stop before saving")]
    EmptyStopList,

    #[error("{name} is already on this route")]
    DuplicateCustomer { customer_id: Uuid, name: String },

    #[error("Stop {0} is not in the working list")]
    StopNotFound(Uuid),

    #[error("Stop {0} appears more than once in the draft")]
    DuplicateStopId(Uuid),

    #[error("Position {index} is out of range for {len} stops")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("At least 2 stops with coordinates are required to optimize ({found} found); add coordinates to the customers first")]
    InsufficientGeocodedStops { found: usize },
}

/// Errores principales de la aplicación
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Save failed: {0}")]
    Persistence(String),

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error(transparent)]
    Builder(#[from] BuilderError),

    #[error("Invalid {entity} status transition: {from} -> {to}")]
    InvalidTransition {
        entity: &'static str,
        from: String,
        to: String,
    },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Optimization failed: {0}")]
    Optimization(String),

    #[error("Cache error: {0}")]
    Cache(#[from] redis::RedisError),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AppError {
    /// Código estable que el cliente usa para distinguir los fallos
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Database(_) | AppError::Persistence(_) => "SAVE_FAILED",
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::Builder(e) => match e {
                BuilderError::MissingTechnician => "MISSING_TECHNICIAN",
                BuilderError::TechnicianLocked => "TECHNICIAN_LOCKED",
                BuilderError::EmptyStopList => "EMPTY_STOP_LIST",
                BuilderError::DuplicateCustomer { .. } => "DUPLICATE_CUSTOMER",
                BuilderError::StopNotFound(_) => "STOP_NOT_FOUND",
                BuilderError::DuplicateStopId(_) => "DUPLICATE_STOP_ID",
                BuilderError::IndexOutOfRange { .. } => "INDEX_OUT_OF_RANGE",
                BuilderError::InsufficientGeocodedStops { .. } => "INSUFFICIENT_GEOCODED_STOPS",
            },
            AppError::InvalidTransition { .. } => "INVALID_TRANSITION",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::Conflict(_) => "CONFLICT",
            AppError::BadRequest(_) => "BAD_REQUEST",
            AppError::Optimization(_) => "OPTIMIZATION_FAILED",
            AppError::Cache(_) => "CACHE_ERROR",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            AppError::Database(_)
            | AppError::Persistence(_)
            | AppError::Cache(_)
            | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Validation(_)
            | AppError::BadRequest(_)
            | AppError::Builder(BuilderError::DuplicateStopId(_)) => StatusCode::BAD_REQUEST,
            AppError::Builder(BuilderError::DuplicateCustomer { .. }) => StatusCode::CONFLICT,
            AppError::Builder(BuilderError::StopNotFound(_)) => StatusCode::NOT_FOUND,
            AppError::Builder(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::InvalidTransition { .. } | AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Optimization(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

/// Respuesta de error para la API
#[derive(Debug, serde::Serialize)]
struct ErrorResponse {
    error: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<serde_json::Value>,
    code: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let code = self.code().to_string();

        let (error, message, details) = match &self {
            AppError::Database(e) => {
                tracing::error!("❌ Database error: {}", e);
                (
                    "Save Failed",
                    "An error occurred while accessing the database".to_string(),
                    Some(json!({ "sql_error": e.to_string() })),
                )
            }
            AppError::Persistence(msg) => {
                tracing::error!("❌ Persistence error: {}", msg);
                ("Save Failed", msg.clone(), None)
            }
            AppError::Validation(e) => {
                tracing::warn!("⚠️ Validation error: {}", e);
                (
                    "Validation Error",
                    "The provided data is invalid".to_string(),
                    Some(json!(e)),
                )
            }
            AppError::Builder(e) => {
                tracing::warn!("⚠️ Route builder rejected request: {}", e);
                ("Validation Error", e.to_string(), None)
            }
            AppError::InvalidTransition { entity, from, to } => {
                tracing::warn!("⚠️ Invalid {} transition {} -> {}", entity, from, to);
                (
                    "Invalid Transition",
                    self.to_string(),
                    Some(json!({ "entity": entity, "from": from, "to": to })),
                )
            }
            AppError::NotFound(msg) => ("Not Found", msg.clone(), None),
            AppError::Conflict(msg) => {
                tracing::warn!("⚠️ Conflict: {}", msg);
                ("Conflict", msg.clone(), None)
            }
            AppError::BadRequest(msg) => ("Bad Request", msg.clone(), None),
            AppError::Optimization(msg) => {
                tracing::error!("❌ Optimization error: {}", msg);
                (
                    "Optimization Failed",
                    "Route optimization failed; the working list is unchanged and can still be saved".to_string(),
                    Some(json!({ "optimizer_error": msg })),
                )
            }
            AppError::Cache(e) => {
                tracing::error!("❌ Cache error: {}", e);
                (
                    "Cache Error",
                    "An error occurred while accessing preferences".to_string(),
                    None,
                )
            }
            AppError::Internal(msg) => {
                tracing::error!("❌ Internal error: {}", msg);
                (
                    "Internal Server Error",
                    "An unexpected error occurred".to_string(),
                    Some(json!({ "internal_error": msg })),
                )
            }
        };

        let body = ErrorResponse {
            error: error.to_string(),
            message,
            details,
            code,
        };

        (status, Json(body)).into_response()
    }
}

/// Resultado tipado para operaciones que pueden fallar
pub type AppResult<T> = Result<T, AppError>;

/// Función helper para crear errores de recurso no encontrado
pub fn not_found_error(resource: &str, id: &Uuid) -> AppError {
    AppError::NotFound(format!("{} with id '{}' not found", resource, id))
}

/// Función helper para crear errores de versión obsoleta
pub fn stale_version_error(route_id: &Uuid, expected: i32) -> AppError {
    AppError::Conflict(format!(
        "Route '{}' was modified by someone else (expected version {}); reload and try again",
        route_id, expected
    ))
}

/// Función helper para crear errores de solicitud incorrecta
pub fn bad_request_error(message: &str) -> AppError {
    AppError::BadRequest(message.to_string())
}
