//! Route Manager
//!
//! Lista las rutas de una fecha (opcionalmente de un técnico) y despacha las
//! acciones por ruta. No guarda estado: tras cualquier acción el llamador
//! vuelve a consultar para ver lo persistido.

use std::sync::Arc;

use chrono::NaiveDate;
use serde::Serialize;
use uuid::Uuid;

use crate::models::{
    Route, RouteFilters, RouteStatus, RouteWithStops, StatusTransition, Stop, StopDetail,
    StopStatus,
};
use crate::repositories::RouteStore;
use crate::services::route_builder::RouteBuilder;
use crate::services::route_progress::{route_badge, stop_badge, Badge, RouteProgress};
use crate::utils::errors::{not_found_error, AppResult};

/// Acciones que una tarjeta de ruta ofrece
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RouteAction {
    Edit,
    Approve,
    Delete,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct StopCard {
    #[serde(flatten)]
    pub detail: StopDetail,
    pub badge: Badge,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RouteCard {
    pub route: Route,
    pub stops: Vec<StopCard>,
    pub badge: Badge,
    pub progress: RouteProgress,
    pub actions: Vec<RouteAction>,
}

impl RouteCard {
    pub fn from_route(saved: RouteWithStops) -> Self {
        let progress = RouteProgress::from_stops(&saved.stops);
        let badge = route_badge(saved.route.status);

        let mut actions = vec![RouteAction::Edit];
        if saved.route.status == RouteStatus::Pending {
            actions.push(RouteAction::Approve);
        }
        actions.push(RouteAction::Delete);

        Self {
            stops: saved
                .stops
                .into_iter()
                .map(|detail| StopCard {
                    badge: stop_badge(detail.stop.status),
                    detail,
                })
                .collect(),
            route: saved.route,
            badge,
            progress,
            actions,
        }
    }

    pub fn offers(&self, action: RouteAction) -> bool {
        self.actions.contains(&action)
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct EmptyState {
    pub message: String,
    /// Solo con filtro de técnico activo
    pub offer_build: bool,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RouteBoard {
    pub date: NaiveDate,
    pub technician_id: Option<Uuid>,
    pub cards: Vec<RouteCard>,
    pub empty_state: Option<EmptyState>,
}

impl RouteBoard {
    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }
}

/// Borrado solicitado pero aún no confirmado
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingDeletion {
    route_id: Uuid,
}

impl PendingDeletion {
    pub fn route_id(&self) -> Uuid {
        self.route_id
    }

    pub fn confirm(self) -> ConfirmedDeletion {
        ConfirmedDeletion {
            route_id: self.route_id,
        }
    }
}

/// Borrado confirmado explícitamente por el usuario
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfirmedDeletion {
    route_id: Uuid,
}

#[derive(Clone)]
pub struct RouteManager {
    store: Arc<dyn RouteStore>,
}

impl RouteManager {
    pub fn new(store: Arc<dyn RouteStore>) -> Self {
        Self { store }
    }

    /// Rutas de una fecha. Sin rutas no es un error: devuelve el estado vacío.
    pub async fn list(&self, filters: &RouteFilters) -> AppResult<RouteBoard> {
        let routes = self.store.list_routes(filters).await?;
        log::info!("📋 {} rutas para {}", routes.len(), filters.date);

        let empty_state = routes.is_empty().then(|| EmptyState {
            message: format!("No routes for {}", filters.date),
            offer_build: filters.technician_id.is_some(),
        });

        Ok(RouteBoard {
            date: filters.date,
            technician_id: filters.technician_id,
            cards: routes.into_iter().map(RouteCard::from_route).collect(),
            empty_state,
        })
    }

    pub async fn get(&self, route_id: Uuid) -> AppResult<RouteCard> {
        Ok(RouteCard::from_route(self.load(route_id).await?))
    }

    /// pending -> approved. Sin efecto sobre las paradas.
    pub async fn approve(&self, route_id: Uuid) -> AppResult<Route> {
        self.transition_route(route_id, RouteStatus::Approved).await
    }

    /// Transición de ruta validada contra la tabla de estados
    pub async fn transition_route(&self, route_id: Uuid, to: RouteStatus) -> AppResult<Route> {
        let saved = self.load(route_id).await?;
        let next = saved.route.status.transition_to(to)?;

        let route = self
            .store
            .update_route_status(route_id, saved.route.version, next)
            .await?;
        log::info!("✅ Ruta {} -> {}", route_id, route.status);
        Ok(route)
    }

    /// Transición de parada validada contra la tabla de estados
    pub async fn set_stop_status(
        &self,
        route_id: Uuid,
        stop_id: Uuid,
        to: StopStatus,
    ) -> AppResult<Stop> {
        let saved = self.load(route_id).await?;
        let current = saved
            .stops
            .iter()
            .find(|s| s.stop.id == stop_id)
            .ok_or_else(|| not_found_error("Stop", &stop_id))?;
        let next = current.stop.status.transition_to(to)?;

        let stop = self
            .store
            .update_stop_status(route_id, saved.route.version, stop_id, next)
            .await?;
        log::info!("✅ Parada {} -> {}", stop_id, stop.status);
        Ok(stop)
    }

    /// Primer paso del borrado: comprueba que la ruta existe
    pub async fn request_delete(&self, route_id: Uuid) -> AppResult<PendingDeletion> {
        self.load(route_id).await?;
        Ok(PendingDeletion { route_id })
    }

    /// Borrado irreversible; las paradas caen en cascada
    pub async fn delete(&self, confirmed: ConfirmedDeletion) -> AppResult<()> {
        self.store.delete_route(confirmed.route_id).await?;
        log::info!("🗑️ Ruta {} eliminada", confirmed.route_id);
        Ok(())
    }

    /// Abrir el builder en modo edición con las paradas en orden
    pub async fn edit(&self, route_id: Uuid) -> AppResult<RouteBuilder> {
        Ok(RouteBuilder::for_route(self.load(route_id).await?))
    }

    async fn load(&self, route_id: Uuid) -> AppResult<RouteWithStops> {
        self.store
            .find_route(route_id)
            .await?
            .ok_or_else(|| not_found_error("Route", &route_id))
    }
}
