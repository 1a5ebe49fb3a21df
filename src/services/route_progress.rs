//! Badges y progreso de rutas
//!
//! Lógica de presentación derivada de las paradas ya cargadas. No realiza
//! transiciones de estado.

use serde::Serialize;

use crate::models::{RouteStatus, StopDetail, StopStatus};

/// Representación visual de un estado
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct Badge {
    pub icon: &'static str,
    pub color: &'static str,
    pub label: &'static str,
}

pub fn route_badge(status: RouteStatus) -> Badge {
    match status {
        RouteStatus::Pending => Badge { icon: "clock", color: "yellow", label: "Pending" },
        RouteStatus::Approved => Badge { icon: "check", color: "blue", label: "Approved" },
        RouteStatus::InProgress => Badge { icon: "truck", color: "orange", label: "In Progress" },
        RouteStatus::Completed => Badge { icon: "check-circle", color: "green", label: "Completed" },
    }
}

pub fn stop_badge(status: StopStatus) -> Badge {
    match status {
        StopStatus::Pending => Badge { icon: "circle", color: "gray", label: "Pending" },
        StopStatus::EnRoute => Badge { icon: "navigation", color: "blue", label: "En Route" },
        StopStatus::Arrived => Badge { icon: "map-pin", color: "orange", label: "Arrived" },
        StopStatus::Completed => Badge { icon: "check-circle", color: "green", label: "Completed" },
        StopStatus::Skipped => Badge { icon: "x-circle", color: "red", label: "Skipped" },
    }
}

/// Progreso de una ruta: paradas completadas / total
#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
pub struct RouteProgress {
    pub completed: usize,
    pub total: usize,
    pub percent: u8,
}

impl RouteProgress {
    pub fn new(completed: usize, total: usize) -> Self {
        let fraction = Self::ratio(completed, total);
        Self {
            completed,
            total,
            percent: (fraction * 100.0).round() as u8,
        }
    }

    pub fn from_stops(stops: &[StopDetail]) -> Self {
        let completed = stops
            .iter()
            .filter(|s| s.stop.status == StopStatus::Completed)
            .count();
        Self::new(completed, stops.len())
    }

    /// 0.0 cuando la ruta no tiene paradas
    pub fn fraction(&self) -> f64 {
        Self::ratio(self.completed, self.total)
    }

    fn ratio(completed: usize, total: usize) -> f64 {
        if total == 0 {
            0.0
        } else {
            (completed.min(total) as f64) / (total as f64)
        }
    }
}
