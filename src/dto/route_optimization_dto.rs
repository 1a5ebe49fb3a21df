//! DTOs para la función externa de distancia/optimización de rutas
//!
//! La función recibe una lista ordenada de coordenadas y devuelve las
//! distancias totales y, opcionalmente, una permutación de los índices.

use serde::{Deserialize, Serialize};

use crate::models::GeoPoint;

/// Coordenada tal como la espera la función externa
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct OptimizeCoordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl From<GeoPoint> for OptimizeCoordinate {
    fn from(point: GeoPoint) -> Self {
        Self {
            latitude: point.latitude,
            longitude: point.longitude,
        }
    }
}

/// Request para la función externa
#[derive(Debug, Serialize)]
pub struct ExternalOptimizeRequest {
    pub coordinates: Vec<OptimizeCoordinate>,
    pub optimize: bool,
}

/// Response de la función externa
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExternalOptimizeResponse {
    /// Ausente cuando no hay mejora posible
    #[serde(default)]
    pub optimized_order: Option<Vec<usize>>,
    /// Millas
    pub total_distance: f64,
    /// Minutos
    pub total_duration: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_shape() {
        let request = ExternalOptimizeRequest {
            coordinates: vec![OptimizeCoordinate {
                latitude: 27.95,
                longitude: -82.46,
            }],
            optimize: true,
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["optimize"], true);
        assert_eq!(value["coordinates"][0]["latitude"], 27.95);
    }

    #[test]
    fn test_response_without_order() {
        let response: ExternalOptimizeResponse =
            serde_json::from_str(r#"{"totalDistance": 12.5, "totalDuration": 40}"#).unwrap();
        assert!(response.optimized_order.is_none());
        assert_eq!(response.total_distance, 12.5);
    }

    #[test]
    fn test_response_with_order() {
        let response: ExternalOptimizeResponse = serde_json::from_str(
            r#"{"optimizedOrder": [2, 0, 1], "totalDistance": 3.0, "totalDuration": 9.5}"#,
        )
        .unwrap();
        assert_eq!(response.optimized_order, Some(vec![2, 0, 1]));
    }
}
