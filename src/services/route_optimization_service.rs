//! Servicio para la función externa de optimización de rutas
//!
//! Este módulo maneja la comunicación con la función de distancia/optimización.
//! La función es una caja negra: recibe coordenadas y devuelve totales y un
//! orden sugerido.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;

use crate::dto::route_optimization_dto::{
    ExternalOptimizeRequest, ExternalOptimizeResponse, OptimizeCoordinate,
};
use crate::models::GeoPoint;
use crate::utils::errors::{AppError, AppResult};

/// Resultado de una llamada de optimización
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OptimizationResult {
    /// Permutación de los índices de entrada; `None` si no hay mejora
    pub optimized_order: Option<Vec<usize>>,
    pub total_distance_miles: f64,
    pub total_duration_minutes: f64,
}

#[async_trait]
pub trait RouteOptimizer: Send + Sync {
    async fn optimize(&self, coordinates: &[GeoPoint]) -> AppResult<OptimizationResult>;
}

pub struct HttpRouteOptimizer {
    endpoint: String,
    api_key: Option<String>,
    client: Client,
}

impl HttpRouteOptimizer {
    pub fn new(endpoint: String, api_key: Option<String>, timeout: Duration) -> AppResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            endpoint,
            api_key,
            client,
        })
    }
}

#[async_trait]
impl RouteOptimizer for HttpRouteOptimizer {
    async fn optimize(&self, coordinates: &[GeoPoint]) -> AppResult<OptimizationResult> {
        log::info!("🚀 Enviando {} coordenadas a la función de optimización", coordinates.len());

        let body = ExternalOptimizeRequest {
            coordinates: coordinates.iter().copied().map(OptimizeCoordinate::from).collect(),
            optimize: true,
        };

        let mut request = self
            .client
            .post(&self.endpoint)
            .header("User-Agent", "PoolRoutes/1.0")
            .json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| AppError::Optimization(format!("request failed: {}", e)))?;

        let status = response.status();
        let response_text = response
            .text()
            .await
            .map_err(|e| AppError::Optimization(format!("error reading response: {}", e)))?;

        log::info!("📡 Optimizer response status: {}", status);
        log::debug!("📄 Optimizer response body: {}", response_text);

        if !status.is_success() {
            return Err(AppError::Optimization(format!(
                "optimizer error {}: {}",
                status, response_text
            )));
        }

        let parsed: ExternalOptimizeResponse = serde_json::from_str(&response_text)
            .map_err(|e| AppError::Optimization(format!("malformed optimizer response: {}", e)))?;

        Ok(OptimizationResult {
            optimized_order: parsed.optimized_order,
            total_distance_miles: parsed.total_distance,
            total_duration_minutes: parsed.total_duration,
        })
    }
}

/// Sustituto cuando `OPTIMIZER_URL` no está configurado: toda optimización falla
/// sin tocar la lista de trabajo.
pub struct UnconfiguredOptimizer;

#[async_trait]
impl RouteOptimizer for UnconfiguredOptimizer {
    async fn optimize(&self, _coordinates: &[GeoPoint]) -> AppResult<OptimizationResult> {
        log::error!("❌ OPTIMIZER_URL no configurado");
        Err(AppError::Optimization(
            "route optimizer is not configured".to_string(),
        ))
    }
}

/// Verificar que `order` sea una permutación de `0..len`
pub fn is_permutation(order: &[usize], len: usize) -> bool {
    if order.len() != len {
        return false;
    }
    let mut seen = vec![false; len];
    for &index in order {
        if index >= len || seen[index] {
            return false;
        }
        seen[index] = true;
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_permutation() {
        assert!(is_permutation(&[2, 0, 1], 3));
        assert!(is_permutation(&[], 0));
        assert!(!is_permutation(&[0, 1], 3));
        assert!(!is_permutation(&[0, 0, 1], 3));
        assert!(!is_permutation(&[0, 1, 3], 3));
    }

    #[tokio::test]
    async fn test_unreachable_optimizer_reports_optimization_error() {
        let optimizer = HttpRouteOptimizer::new(
            "http://127.0.0.1:9/optimize".to_string(),
            None,
            Duration::from_secs(2),
        )
        .unwrap();

        let points = [
            GeoPoint { latitude: 27.95, longitude: -82.46 },
            GeoPoint { latitude: 27.96, longitude: -82.45 },
        ];
        let result = optimizer.optimize(&points).await;
        assert!(matches!(result, Err(AppError::Optimization(_))));
    }
}
