//! Modelo de Route
//!
//! Este módulo contiene el struct Route y sus variantes para CRUD operations.
//! Mapea exactamente al schema PostgreSQL con primary key 'id'.

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use uuid::Uuid;

use super::stop::{NewStop, StopDetail};
use super::transition::StatusTransition;

/// Estado de la ruta - mapea al ENUM route_status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Type, PartialEq, Eq, Hash)]
#[sqlx(type_name = "route_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum RouteStatus {
    Pending,
    Approved,
    InProgress,
    Completed,
}

impl RouteStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RouteStatus::Pending => "pending",
            RouteStatus::Approved => "approved",
            RouteStatus::InProgress => "in_progress",
            RouteStatus::Completed => "completed",
        }
    }
}

impl fmt::Display for RouteStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl StatusTransition for RouteStatus {
    const ENTITY: &'static str = "route";

    fn allowed_next(&self) -> &'static [Self] {
        match self {
            RouteStatus::Pending => &[RouteStatus::Approved],
            RouteStatus::Approved => &[RouteStatus::InProgress],
            RouteStatus::InProgress => &[RouteStatus::Completed],
            RouteStatus::Completed => &[],
        }
    }
}

/// Route principal - mapea exactamente a la tabla routes
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct Route {
    pub id: Uuid,
    pub technician_id: Uuid,
    pub route_date: NaiveDate,
    pub status: RouteStatus,
    pub total_estimated_duration_minutes: Option<f64>,
    pub total_estimated_distance_miles: Option<f64>,
    /// Contador de concurrencia optimista, se incrementa en cada escritura
    pub version: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Ruta con sus paradas ordenadas por posición
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RouteWithStops {
    pub route: Route,
    pub stops: Vec<StopDetail>,
}

impl RouteWithStops {
    pub fn stop_count(&self) -> usize {
        self.stops.len()
    }
}

/// Totales estimados devueltos por el optimizador
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct RouteEstimates {
    pub total_estimated_duration_minutes: Option<f64>,
    pub total_estimated_distance_miles: Option<f64>,
}

/// Ruta nueva con sus paradas, se inserta en una sola transacción
#[derive(Debug, Clone, PartialEq)]
pub struct NewRoute {
    pub technician_id: Uuid,
    pub route_date: NaiveDate,
    pub estimates: RouteEstimates,
    pub stops: Vec<NewStop>,
}

/// Filtros para búsqueda de rutas
#[derive(Debug, Clone, Deserialize)]
pub struct RouteFilters {
    pub date: NaiveDate,
    pub technician_id: Option<Uuid>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_route_transition_table() {
        assert!(RouteStatus::Pending.can_transition_to(RouteStatus::Approved));
        assert!(RouteStatus::Approved.can_transition_to(RouteStatus::InProgress));
        assert!(RouteStatus::InProgress.can_transition_to(RouteStatus::Completed));

        assert!(!RouteStatus::Approved.can_transition_to(RouteStatus::Approved));
        assert!(!RouteStatus::Approved.can_transition_to(RouteStatus::Pending));
        assert!(!RouteStatus::Pending.can_transition_to(RouteStatus::Completed));
        assert!(RouteStatus::Completed.is_terminal());
    }

    #[test]
    fn test_invalid_route_transition_fails_loudly() {
        let err = RouteStatus::Completed
            .transition_to(RouteStatus::Pending)
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid route status transition: completed -> pending"
        );
    }

    #[test]
    fn test_route_status_serde_uses_snake_case() {
        let json = serde_json::to_string(&RouteStatus::InProgress).unwrap();
        assert_eq!(json, "\"in_progress\"");
    }
}
