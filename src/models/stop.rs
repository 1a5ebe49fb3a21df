//! Modelo de Stop
//!
//! Una parada es una visita a un cliente dentro de una ruta.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use uuid::Uuid;
use validator::Validate;

use super::customer::GeoPoint;
use super::transition::StatusTransition;

/// Estado de la parada - mapea al ENUM stop_status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Type, PartialEq, Eq, Hash)]
#[sqlx(type_name = "stop_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum StopStatus {
    Pending,
    EnRoute,
    Arrived,
    Completed,
    Skipped,
}

impl StopStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            StopStatus::Pending => "pending",
            StopStatus::EnRoute => "en_route",
            StopStatus::Arrived => "arrived",
            StopStatus::Completed => "completed",
            StopStatus::Skipped => "skipped",
        }
    }
}

impl fmt::Display for StopStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl StatusTransition for StopStatus {
    const ENTITY: &'static str = "stop";

    // Nunca se vuelve a pending una vez avanzada
    fn allowed_next(&self) -> &'static [Self] {
        match self {
            StopStatus::Pending => &[
                StopStatus::EnRoute,
                StopStatus::Arrived,
                StopStatus::Completed,
                StopStatus::Skipped,
            ],
            StopStatus::EnRoute => &[StopStatus::Arrived, StopStatus::Completed, StopStatus::Skipped],
            StopStatus::Arrived => &[StopStatus::Completed, StopStatus::Skipped],
            StopStatus::Completed | StopStatus::Skipped => &[],
        }
    }
}

/// Stop - mapea a la tabla route_stops
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct Stop {
    pub id: Uuid,
    pub route_id: Uuid,
    pub customer_id: Uuid,
    pub appointment_id: Option<Uuid>,
    pub sequence_position: i32,
    pub status: StopStatus,
    pub estimated_arrival_time: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Parada con los campos de cliente y cita unidos para mostrar
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct StopDetail {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub stop: Stop,
    pub customer_name: String,
    pub customer_address: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub appointment_time: Option<String>,
}

impl StopDetail {
    pub fn location(&self) -> Option<GeoPoint> {
        match (self.latitude, self.longitude) {
            (Some(latitude), Some(longitude)) => {
                Some(GeoPoint { latitude, longitude }).filter(|p| p.validate().is_ok())
            }
            _ => None,
        }
    }
}

/// Parada nueva a insertar
#[derive(Debug, Clone, PartialEq)]
pub struct NewStop {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub appointment_id: Option<Uuid>,
    pub sequence_position: i32,
    pub estimated_arrival_time: Option<String>,
}

/// Diferencia entre las paradas persistidas y la lista de trabajo
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StopChangeSet {
    pub added: Vec<NewStop>,
    pub removed: Vec<Uuid>,
    /// (stop_id, nueva posición)
    pub repositioned: Vec<(Uuid, i32)>,
}

impl StopChangeSet {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.repositioned.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stop_status_is_monotonic() {
        let advanced = [
            StopStatus::EnRoute,
            StopStatus::Arrived,
            StopStatus::Completed,
            StopStatus::Skipped,
        ];
        for status in advanced {
            assert!(
                !status.can_transition_to(StopStatus::Pending),
                "{} must not return to pending",
                status
            );
        }
    }

    #[test]
    fn test_stop_transition_table() {
        assert!(StopStatus::Pending.can_transition_to(StopStatus::EnRoute));
        assert!(StopStatus::EnRoute.can_transition_to(StopStatus::Arrived));
        assert!(StopStatus::Arrived.can_transition_to(StopStatus::Completed));
        assert!(StopStatus::Arrived.can_transition_to(StopStatus::Skipped));
        assert!(!StopStatus::Arrived.can_transition_to(StopStatus::EnRoute));
        assert!(StopStatus::Completed.is_terminal());
        assert!(StopStatus::Skipped.is_terminal());
    }
}
