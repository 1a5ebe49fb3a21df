//! Entidades externas: clientes, técnicos y citas
//!
//! Este módulo solo las lee; su ciclo de vida pertenece a otras partes del
//! sistema.

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::utils::validation::validate_coordinates;

/// Coordenadas GPS
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Validate, PartialEq)]
#[validate(schema(function = "validate_geo_point"))]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

fn validate_geo_point(point: &GeoPoint) -> Result<(), ValidationError> {
    validate_coordinates(point.latitude, point.longitude)
}

/// Cliente - mapea a la tabla customers
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct Customer {
    pub id: Uuid,
    pub name: String,
    pub address: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub assigned_technician_id: Option<Uuid>,
    pub active: bool,
}

impl Customer {
    /// Ubicación si el cliente está geocodificado. Coordenadas fuera de
    /// rango cuentan como no geocodificado.
    pub fn location(&self) -> Option<GeoPoint> {
        match (self.latitude, self.longitude) {
            (Some(latitude), Some(longitude)) => {
                Some(GeoPoint { latitude, longitude }).filter(|p| p.validate().is_ok())
            }
            _ => None,
        }
    }

    /// Búsqueda por nombre o dirección, sin distinguir mayúsculas
    pub fn matches(&self, search: &str) -> bool {
        let needle = search.trim().to_lowercase();
        if needle.is_empty() {
            return true;
        }
        self.name.to_lowercase().contains(&needle)
            || self
                .address
                .as_deref()
                .map(|a| a.to_lowercase().contains(&needle))
                .unwrap_or(false)
    }
}

/// Técnico - usuario con capacidad de técnico
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct Technician {
    pub id: Uuid,
    pub full_name: String,
    pub active: bool,
}

/// Cita programada en el calendario
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct Appointment {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub technician_id: Option<Uuid>,
    pub scheduled_date: NaiveDate,
    pub scheduled_time: Option<NaiveTime>,
    pub status: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn customer(name: &str, address: Option<&str>) -> Customer {
        Customer {
            id: Uuid::new_v4(),
            name: name.to_string(),
            address: address.map(str::to_string),
            latitude: None,
            longitude: None,
            assigned_technician_id: None,
            active: true,
        }
    }

    #[test]
    fn test_customer_search_matches_name_and_address() {
        let c = customer("Maria Lopez", Some("12 Palm Ave, Tampa"));
        assert!(c.matches("maria"));
        assert!(c.matches("PALM"));
        assert!(c.matches("  "));
        assert!(!c.matches("orlando"));
    }

    #[test]
    fn test_location_requires_both_coordinates() {
        let mut c = customer("A", None);
        c.latitude = Some(27.9);
        assert!(c.location().is_none());
        c.longitude = Some(-82.4);
        assert_eq!(
            c.location(),
            Some(GeoPoint {
                latitude: 27.9,
                longitude: -82.4
            })
        );
    }

    #[test]
    fn test_geo_point_validation() {
        let ok = GeoPoint { latitude: 45.0, longitude: 10.0 };
        assert!(ok.validate().is_ok());
        let bad = GeoPoint { latitude: 95.0, longitude: 10.0 };
        assert!(bad.validate().is_err());

        let mut c = customer("B", None);
        c.latitude = Some(95.0);
        c.longitude = Some(10.0);
        assert!(c.location().is_none());
    }
}
