//! Controlador de rutas diarias
//!
//! Traduce los requests HTTP a operaciones del Route Builder y del Route
//! Manager. El builder vive solo durante el request: el cliente envía la
//! lista de trabajo completa en cada llamada.

use std::collections::HashMap;
use std::sync::Arc;

use uuid::Uuid;

use crate::dto::route_dto::{
    parse_date, DraftResponse, DraftStopRequest, EligibleCustomersQuery,
    EligibleCustomersResponse, OptimizeDraftRequest, RouteListQuery, SaveRouteRequest,
};
use crate::models::{Customer, Route, RouteStatus, Stop, StopStatus};
use crate::repositories::{CustomerDirectory, RouteStore};
use crate::services::route_builder::{OptimizeOutcome, RouteBuilder, WorkingStop};
use crate::services::route_manager::{RouteBoard, RouteCard, RouteManager};
use crate::services::route_optimization_service::RouteOptimizer;
use crate::state::AppState;
use crate::utils::errors::{bad_request_error, not_found_error, AppResult, BuilderError};

pub struct RouteController {
    manager: RouteManager,
    routes: Arc<dyn RouteStore>,
    directory: Arc<dyn CustomerDirectory>,
    optimizer: Arc<dyn RouteOptimizer>,
    pool_limit: i64,
}

impl RouteController {
    pub fn new(state: &AppState) -> Self {
        Self {
            manager: state.route_manager(),
            routes: state.routes.clone(),
            directory: state.directory.clone(),
            optimizer: state.optimizer.clone(),
            pool_limit: state.config.eligible_pool_limit,
        }
    }

    pub async fn list(&self, query: RouteListQuery) -> AppResult<RouteBoard> {
        self.manager.list(&query.filters()?).await
    }

    pub async fn get(&self, route_id: Uuid) -> AppResult<RouteCard> {
        self.manager.get(route_id).await
    }

    /// Guardar el borrador: crea la ruta o, con `route_id`, aplica la edición
    pub async fn save(&self, request: SaveRouteRequest) -> AppResult<RouteCard> {
        // Validaciones del borrador antes de cualquier lectura o escritura
        if request.route_id.is_none() && request.technician_id.is_none() {
            return Err(BuilderError::MissingTechnician.into());
        }
        if request.stops.is_empty() {
            return Err(BuilderError::EmptyStopList.into());
        }

        let mut builder = match request.route_id {
            Some(route_id) => self.edit_builder(route_id, &request).await?,
            None => {
                let mut builder =
                    RouteBuilder::new(parse_date(&request.date)?).with_pool_limit(self.pool_limit);
                let technician_id = request
                    .technician_id
                    .ok_or(BuilderError::MissingTechnician)?;
                builder
                    .set_technician(self.directory.as_ref(), technician_id)
                    .await?;
                builder
            }
        };

        let stops = self.resolve_stops(&builder, &request.stops).await?;
        builder.replace_stops(stops)?;
        if let Some(estimates) = request.estimates {
            builder.set_estimates(estimates);
        }

        let saved = builder.save(self.routes.as_ref()).await?;
        log::info!(
            "✅ Ruta {} guardada con {} paradas (versión {})",
            saved.route.id,
            saved.stops.len(),
            saved.route.version
        );
        Ok(RouteCard::from_route(saved))
    }

    /// Optimizar el orden de un borrador sin persistir nada
    pub async fn optimize(&self, request: OptimizeDraftRequest) -> AppResult<DraftResponse> {
        let mut builder =
            RouteBuilder::new(parse_date(&request.date)?).with_pool_limit(self.pool_limit);
        if let Some(technician_id) = request.technician_id {
            builder
                .set_technician(self.directory.as_ref(), technician_id)
                .await?;
        }

        let stops = self.resolve_stops(&builder, &request.stops).await?;
        builder.replace_stops(stops)?;

        let outcome = builder.optimize(self.optimizer.as_ref()).await?;
        Ok(draft_response(&builder, Some(outcome)))
    }

    /// Clientes elegibles y citas del día para un técnico
    pub async fn eligible_customers(
        &self,
        technician_id: Uuid,
        query: EligibleCustomersQuery,
    ) -> AppResult<EligibleCustomersResponse> {
        let mut builder =
            RouteBuilder::new(parse_date(&query.date)?).with_pool_limit(self.pool_limit);
        builder
            .set_technician(self.directory.as_ref(), technician_id)
            .await?;
        builder.set_search(query.search.unwrap_or_default());

        Ok(EligibleCustomersResponse {
            technician_id,
            date: builder.date(),
            customers: builder.eligible_customers().into_iter().cloned().collect(),
            appointments: builder.appointments().to_vec(),
        })
    }

    pub async fn approve(&self, route_id: Uuid) -> AppResult<Route> {
        self.manager.approve(route_id).await
    }

    pub async fn transition_route(&self, route_id: Uuid, status: RouteStatus) -> AppResult<Route> {
        self.manager.transition_route(route_id, status).await
    }

    pub async fn set_stop_status(
        &self,
        route_id: Uuid,
        stop_id: Uuid,
        status: StopStatus,
    ) -> AppResult<Stop> {
        self.manager.set_stop_status(route_id, stop_id, status).await
    }

    /// Borrar una ruta. Sin confirmación explícita no se borra nada.
    pub async fn delete(&self, route_id: Uuid, confirmed: bool) -> AppResult<()> {
        let pending = self.manager.request_delete(route_id).await?;
        if !confirmed {
            return Err(bad_request_error(
                "Deleting a route cannot be undone; repeat the request with confirm=true",
            ));
        }
        self.manager.delete(pending.confirm()).await
    }

    async fn edit_builder(
        &self,
        route_id: Uuid,
        request: &SaveRouteRequest,
    ) -> AppResult<RouteBuilder> {
        let version = request
            .version
            .ok_or_else(|| bad_request_error("version is required when editing a route"))?;

        let mut builder = self
            .manager
            .edit(route_id)
            .await?
            .with_expected_version(version)
            .with_pool_limit(self.pool_limit);

        if let Some(technician_id) = request.technician_id {
            if builder.technician_id() != Some(technician_id) {
                return Err(BuilderError::TechnicianLocked.into());
            }
        }

        builder.load_candidates(self.directory.as_ref()).await?;
        Ok(builder)
    }

    /// Convertir las paradas del borrador en paradas de trabajo
    async fn resolve_stops(
        &self,
        builder: &RouteBuilder,
        drafts: &[DraftStopRequest],
    ) -> AppResult<Vec<WorkingStop>> {
        let ids: Vec<Uuid> = drafts.iter().map(|d| d.customer_id).collect();
        let customers: HashMap<Uuid, Customer> = self
            .directory
            .customers_by_ids(&ids)
            .await?
            .into_iter()
            .map(|c| (c.id, c))
            .collect();

        let existing: HashMap<Uuid, &WorkingStop> =
            builder.stops().iter().map(|s| (s.id, s)).collect();
        // Una ruta tiene como mucho una parada por cliente
        let by_customer: HashMap<Uuid, &WorkingStop> =
            builder.stops().iter().map(|s| (s.customer_id, s)).collect();

        drafts
            .iter()
            .map(|draft| {
                let customer = customers
                    .get(&draft.customer_id)
                    .ok_or_else(|| not_found_error("Customer", &draft.customer_id))?;

                let saved = draft
                    .id
                    .and_then(|id| existing.get(&id))
                    .or_else(|| by_customer.get(&draft.customer_id));
                let stop = match saved {
                    Some(saved) if saved.customer_id != draft.customer_id => {
                        return Err(bad_request_error(
                            "A saved stop cannot be moved to a different customer",
                        ));
                    }
                    // Parada ya guardada: conserva estado y datos persistidos
                    Some(saved) => (*saved).clone(),
                    None => WorkingStop::from_customer(customer)
                        .with_id(draft.id.unwrap_or_else(Uuid::new_v4)),
                };

                let appointment_id = draft.appointment_id.or(stop.appointment_id);
                let arrival = draft
                    .estimated_arrival_time
                    .clone()
                    .or_else(|| stop.estimated_arrival_time.clone());
                Ok(stop
                    .with_appointment(appointment_id)
                    .with_estimated_arrival(arrival))
            })
            .collect()
    }
}

fn draft_response(builder: &RouteBuilder, outcome: Option<OptimizeOutcome>) -> DraftResponse {
    DraftResponse {
        stops: builder.stops().to_vec(),
        estimates: builder.estimates(),
        estimates_stale: builder.estimates_stale(),
        outcome,
    }
}
