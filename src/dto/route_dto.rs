//! DTOs de la API de rutas
//!
//! Requests y responses del Route Manager y del Route Builder.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{Appointment, Customer, RouteEstimates, RouteFilters, RouteStatus, StopStatus};
use crate::services::route_builder::{OptimizeOutcome, WorkingStop};
use crate::utils::errors::{AppError, AppResult};
use crate::utils::validation::validate_date;

/// Fecha `YYYY-MM-DD` recibida como texto
pub fn parse_date(value: &str) -> AppResult<NaiveDate> {
    validate_date(value)
        .map_err(|_| AppError::BadRequest(format!("Invalid date '{}', expected YYYY-MM-DD", value)))
}

// GET /api/routes
#[derive(Debug, Deserialize)]
pub struct RouteListQuery {
    pub date: String,
    pub technician_id: Option<Uuid>,
}

impl RouteListQuery {
    pub fn filters(&self) -> AppResult<RouteFilters> {
        Ok(RouteFilters {
            date: parse_date(&self.date)?,
            technician_id: self.technician_id,
        })
    }
}

/// Parada del borrador tal como la envía el cliente, en orden
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DraftStopRequest {
    /// Presente para paradas ya guardadas o generadas en el cliente
    pub id: Option<Uuid>,
    pub customer_id: Uuid,
    pub appointment_id: Option<Uuid>,
    pub estimated_arrival_time: Option<String>,
}

// POST /api/routes
#[derive(Debug, Deserialize, Serialize)]
pub struct SaveRouteRequest {
    /// Con `route_id` y `version` se edita la ruta existente
    pub route_id: Option<Uuid>,
    pub version: Option<i32>,
    pub technician_id: Option<Uuid>,
    pub date: String,
    #[serde(default)]
    pub stops: Vec<DraftStopRequest>,
    pub estimates: Option<RouteEstimates>,
}

// POST /api/routes/optimize
#[derive(Debug, Deserialize, Serialize)]
pub struct OptimizeDraftRequest {
    pub technician_id: Option<Uuid>,
    pub date: String,
    #[serde(default)]
    pub stops: Vec<DraftStopRequest>,
}

/// Borrador resultante de una operación del builder
#[derive(Debug, Serialize, Deserialize)]
pub struct DraftResponse {
    pub stops: Vec<WorkingStop>,
    pub estimates: RouteEstimates,
    pub estimates_stale: bool,
    #[serde(skip_deserializing)]
    pub outcome: Option<OptimizeOutcome>,
}

#[derive(Debug, Deserialize)]
pub struct TransitionRouteRequest {
    pub status: RouteStatus,
}

#[derive(Debug, Deserialize)]
pub struct TransitionStopRequest {
    pub status: StopStatus,
}

// DELETE /api/routes/:id
#[derive(Debug, Default, Deserialize)]
pub struct DeleteQuery {
    pub confirm: Option<bool>,
}

impl DeleteQuery {
    pub fn is_confirmed(&self) -> bool {
        self.confirm.unwrap_or(false)
    }
}

// GET /api/technicians/:id/eligible-customers
#[derive(Debug, Deserialize)]
pub struct EligibleCustomersQuery {
    pub date: String,
    pub search: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct EligibleCustomersResponse {
    pub technician_id: Uuid,
    pub date: NaiveDate,
    pub customers: Vec<Customer>,
    pub appointments: Vec<Appointment>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_list_query_requires_iso_date() {
        let query = RouteListQuery {
            date: "06/02/2025".to_string(),
            technician_id: None,
        };
        assert_matches!(query.filters(), Err(AppError::BadRequest(_)));

        let query = RouteListQuery {
            date: "2025-06-02".to_string(),
            technician_id: None,
        };
        assert_eq!(
            query.filters().unwrap().date,
            NaiveDate::from_ymd_opt(2025, 6, 2).unwrap()
        );
    }

    #[test]
    fn test_save_request_defaults() {
        let request: SaveRouteRequest = serde_json::from_str(r#"{"date": "2025-06-02"}"#).unwrap();
        assert!(request.route_id.is_none());
        assert!(request.technician_id.is_none());
        assert!(request.stops.is_empty());
    }

    #[test]
    fn test_transition_request_uses_snake_case() {
        let request: TransitionRouteRequest =
            serde_json::from_str(r#"{"status": "in_progress"}"#).unwrap();
        assert_eq!(request.status, RouteStatus::InProgress);

        let request: TransitionStopRequest =
            serde_json::from_str(r#"{"status": "en_route"}"#).unwrap();
        assert_eq!(request.status, StopStatus::EnRoute);
    }

    #[test]
    fn test_delete_requires_explicit_confirm() {
        assert!(!DeleteQuery::default().is_confirmed());
        assert!(DeleteQuery { confirm: Some(true) }.is_confirmed());
    }
}
