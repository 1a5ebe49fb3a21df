//! Implementaciones en memoria de los puertos de persistencia.
//!
//! Se usan en tests y en desarrollo local sin PostgreSQL. Reproducen las
//! garantías del esquema: escrituras todo-o-nada, cascada al borrar una ruta,
//! posiciones únicas por ruta y control de versión.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::customer_repository::CustomerDirectory;
use super::route_repository::RouteStore;
use crate::models::{
    Appointment, Customer, NewRoute, NewStop, Route, RouteEstimates, RouteFilters, RouteStatus,
    RouteWithStops, Stop, StopChangeSet, StopDetail, StopStatus, Technician,
};
use crate::utils::errors::{not_found_error, stale_version_error, AppError, AppResult};
use crate::utils::validation::validate_dense_positions;

#[derive(Default, Clone)]
struct MemoryState {
    technicians: HashMap<Uuid, Technician>,
    customers: HashMap<Uuid, Customer>,
    appointments: HashMap<Uuid, Appointment>,
    routes: HashMap<Uuid, Route>,
    stops: HashMap<Uuid, Stop>,
}

impl MemoryState {
    fn detail(&self, stop: &Stop) -> StopDetail {
        let customer = self.customers.get(&stop.customer_id);
        let appointment_time = stop
            .appointment_id
            .and_then(|id| self.appointments.get(&id))
            .and_then(|a| a.scheduled_time)
            .map(|t| t.format("%H:%M").to_string());

        StopDetail {
            stop: stop.clone(),
            customer_name: customer.map(|c| c.name.clone()).unwrap_or_default(),
            customer_address: customer.and_then(|c| c.address.clone()),
            latitude: customer.and_then(|c| c.latitude),
            longitude: customer.and_then(|c| c.longitude),
            appointment_time,
        }
    }

    fn with_stops(&self, route: &Route) -> RouteWithStops {
        let mut stops: Vec<StopDetail> = self
            .stops
            .values()
            .filter(|s| s.route_id == route.id)
            .map(|s| self.detail(s))
            .collect();
        stops.sort_by_key(|s| s.stop.sequence_position);
        RouteWithStops {
            route: route.clone(),
            stops,
        }
    }

    fn checked_route(&self, route_id: Uuid, expected_version: i32) -> AppResult<&Route> {
        let route = self
            .routes
            .get(&route_id)
            .ok_or_else(|| not_found_error("Route", &route_id))?;
        if route.version != expected_version {
            return Err(stale_version_error(&route_id, expected_version));
        }
        Ok(route)
    }

    fn insert_stop(&mut self, route_id: Uuid, stop: &NewStop) -> AppResult<()> {
        if !self.customers.contains_key(&stop.customer_id) {
            return Err(AppError::Persistence(format!(
                "customer {} does not exist",
                stop.customer_id
            )));
        }
        if self.stops.contains_key(&stop.id) {
            return Err(AppError::Persistence(format!("stop {} already exists", stop.id)));
        }
        self.stops.insert(
            stop.id,
            Stop {
                id: stop.id,
                route_id,
                customer_id: stop.customer_id,
                appointment_id: stop.appointment_id,
                sequence_position: stop.sequence_position,
                status: StopStatus::Pending,
                estimated_arrival_time: stop.estimated_arrival_time.clone(),
                created_at: Utc::now(),
            },
        );
        Ok(())
    }

    /// Restricciones únicas de route_stops, comprobadas al "commit"
    fn check_route_constraints(&self, route_id: Uuid) -> AppResult<()> {
        let mut positions = HashSet::new();
        let mut customers = HashSet::new();
        for stop in self.stops.values().filter(|s| s.route_id == route_id) {
            if stop.sequence_position < 1 || !positions.insert(stop.sequence_position) {
                return Err(AppError::Persistence(format!(
                    "duplicate or invalid sequence position {} on route {}",
                    stop.sequence_position, route_id
                )));
            }
            if !customers.insert(stop.customer_id) {
                return Err(AppError::Persistence(format!(
                    "customer {} appears twice on route {}",
                    stop.customer_id, route_id
                )));
            }
        }

        let positions: Vec<i32> = positions.into_iter().collect();
        validate_dense_positions(&positions).map_err(|_| {
            AppError::Persistence(format!("sequence positions of route {} have gaps", route_id))
        })
    }
}

/// Almacén en memoria que implementa `RouteStore` y `CustomerDirectory`
#[derive(Default)]
pub struct MemoryStore {
    state: RwLock<MemoryState>,
    fail_writes: RwLock<bool>,
    write_attempts: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_technician(&self, technician: Technician) {
        self.state
            .write()
            .await
            .technicians
            .insert(technician.id, technician);
    }

    pub async fn add_customer(&self, customer: Customer) {
        self.state.write().await.customers.insert(customer.id, customer);
    }

    pub async fn add_appointment(&self, appointment: Appointment) {
        self.state
            .write()
            .await
            .appointments
            .insert(appointment.id, appointment);
    }

    /// Simular fallos de escritura (red o base de datos caída)
    pub async fn set_fail_writes(&self, fail: bool) {
        *self.fail_writes.write().await = fail;
    }

    /// Número de escrituras intentadas, incluidas las fallidas
    pub fn write_attempts(&self) -> usize {
        self.write_attempts.load(Ordering::SeqCst)
    }

    pub async fn route_count(&self) -> usize {
        self.state.read().await.routes.len()
    }

    pub async fn stop_count(&self) -> usize {
        self.state.read().await.stops.len()
    }

    async fn begin_write(&self) -> AppResult<()> {
        self.write_attempts.fetch_add(1, Ordering::SeqCst);
        if *self.fail_writes.read().await {
            return Err(AppError::Persistence("simulated write failure".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl RouteStore for MemoryStore {
    async fn list_routes(&self, filters: &RouteFilters) -> AppResult<Vec<RouteWithStops>> {
        let state = self.state.read().await;
        let mut routes: Vec<&Route> = state
            .routes
            .values()
            .filter(|r| r.route_date == filters.date)
            .filter(|r| {
                filters
                    .technician_id
                    .map(|t| r.technician_id == t)
                    .unwrap_or(true)
            })
            .collect();
        routes.sort_by_key(|r| r.created_at);
        Ok(routes.into_iter().map(|r| state.with_stops(r)).collect())
    }

    async fn find_route(&self, route_id: Uuid) -> AppResult<Option<RouteWithStops>> {
        let state = self.state.read().await;
        Ok(state.routes.get(&route_id).map(|r| state.with_stops(r)))
    }

    async fn create_route(&self, new_route: NewRoute) -> AppResult<RouteWithStops> {
        self.begin_write().await?;
        let mut state = self.state.write().await;
        let mut staged = state.clone();

        let now = Utc::now();
        let route = Route {
            id: Uuid::new_v4(),
            technician_id: new_route.technician_id,
            route_date: new_route.route_date,
            status: RouteStatus::Pending,
            total_estimated_duration_minutes: new_route.estimates.total_estimated_duration_minutes,
            total_estimated_distance_miles: new_route.estimates.total_estimated_distance_miles,
            version: 1,
            created_at: now,
            updated_at: now,
        };
        staged.routes.insert(route.id, route.clone());
        for stop in &new_route.stops {
            staged.insert_stop(route.id, stop)?;
        }
        staged.check_route_constraints(route.id)?;

        *state = staged;
        Ok(state.with_stops(&route))
    }

    async fn apply_stop_changes(
        &self,
        route_id: Uuid,
        expected_version: i32,
        changes: &StopChangeSet,
        estimates: RouteEstimates,
    ) -> AppResult<RouteWithStops> {
        self.begin_write().await?;
        let mut state = self.state.write().await;
        state.checked_route(route_id, expected_version)?;
        let mut staged = state.clone();

        for stop_id in &changes.removed {
            if staged.stops.get(stop_id).map(|s| s.route_id) == Some(route_id) {
                staged.stops.remove(stop_id);
            }
        }
        for stop in &changes.added {
            staged.insert_stop(route_id, stop)?;
        }
        for (stop_id, position) in &changes.repositioned {
            match staged.stops.get_mut(stop_id) {
                Some(stop) if stop.route_id == route_id => stop.sequence_position = *position,
                _ => return Err(not_found_error("Stop", stop_id)),
            }
        }
        staged.check_route_constraints(route_id)?;

        let route = staged
            .routes
            .get_mut(&route_id)
            .ok_or_else(|| not_found_error("Route", &route_id))?;
        route.version += 1;
        route.updated_at = Utc::now();
        route.total_estimated_duration_minutes = estimates.total_estimated_duration_minutes;
        route.total_estimated_distance_miles = estimates.total_estimated_distance_miles;
        let route = route.clone();

        *state = staged;
        Ok(state.with_stops(&route))
    }

    async fn update_route_status(
        &self,
        route_id: Uuid,
        expected_version: i32,
        status: RouteStatus,
    ) -> AppResult<Route> {
        self.begin_write().await?;
        let mut state = self.state.write().await;
        state.checked_route(route_id, expected_version)?;

        let route = state
            .routes
            .get_mut(&route_id)
            .ok_or_else(|| not_found_error("Route", &route_id))?;
        route.status = status;
        route.version += 1;
        route.updated_at = Utc::now();
        Ok(route.clone())
    }

    async fn update_stop_status(
        &self,
        route_id: Uuid,
        expected_version: i32,
        stop_id: Uuid,
        status: StopStatus,
    ) -> AppResult<Stop> {
        self.begin_write().await?;
        let mut state = self.state.write().await;
        state.checked_route(route_id, expected_version)?;

        let stop = match state.stops.get_mut(&stop_id) {
            Some(stop) if stop.route_id == route_id => {
                stop.status = status;
                stop.clone()
            }
            _ => return Err(not_found_error("Stop", &stop_id)),
        };

        if let Some(route) = state.routes.get_mut(&route_id) {
            route.version += 1;
            route.updated_at = Utc::now();
        }
        Ok(stop)
    }

    async fn delete_route(&self, route_id: Uuid) -> AppResult<()> {
        self.begin_write().await?;
        let mut state = self.state.write().await;
        if state.routes.remove(&route_id).is_none() {
            return Err(not_found_error("Route", &route_id));
        }
        state.stops.retain(|_, s| s.route_id != route_id);
        Ok(())
    }
}

#[async_trait]
impl CustomerDirectory for MemoryStore {
    async fn find_technician(&self, technician_id: Uuid) -> AppResult<Option<Technician>> {
        Ok(self.state.read().await.technicians.get(&technician_id).cloned())
    }

    async fn customers_assigned_to(&self, technician_id: Uuid) -> AppResult<Vec<Customer>> {
        let state = self.state.read().await;
        let mut customers: Vec<Customer> = state
            .customers
            .values()
            .filter(|c| c.active && c.assigned_technician_id == Some(technician_id))
            .cloned()
            .collect();
        customers.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(customers)
    }

    async fn active_customers(&self, limit: i64) -> AppResult<Vec<Customer>> {
        let state = self.state.read().await;
        let mut customers: Vec<Customer> =
            state.customers.values().filter(|c| c.active).cloned().collect();
        customers.sort_by(|a, b| a.name.cmp(&b.name));
        customers.truncate(limit.max(0) as usize);
        Ok(customers)
    }

    async fn customers_by_ids(&self, ids: &[Uuid]) -> AppResult<Vec<Customer>> {
        let state = self.state.read().await;
        Ok(ids
            .iter()
            .filter_map(|id| state.customers.get(id).cloned())
            .collect())
    }

    async fn appointments_on(
        &self,
        technician_id: Uuid,
        date: NaiveDate,
    ) -> AppResult<Vec<Appointment>> {
        let state = self.state.read().await;
        let mut appointments: Vec<Appointment> = state
            .appointments
            .values()
            .filter(|a| a.scheduled_date == date && a.status != "cancelled")
            .filter(|a| a.technician_id.map(|t| t == technician_id).unwrap_or(true))
            .cloned()
            .collect();
        appointments.sort_by_key(|a| a.scheduled_time);
        Ok(appointments)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn customer(name: &str) -> Customer {
        Customer {
            id: Uuid::new_v4(),
            name: name.to_string(),
            address: None,
            latitude: None,
            longitude: None,
            assigned_technician_id: None,
            active: true,
        }
    }

    fn new_stop(customer_id: Uuid, position: i32) -> NewStop {
        NewStop {
            id: Uuid::new_v4(),
            customer_id,
            appointment_id: None,
            sequence_position: position,
            estimated_arrival_time: None,
        }
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 2).unwrap()
    }

    #[tokio::test]
    async fn test_create_route_is_all_or_nothing() {
        let store = MemoryStore::new();
        let known = customer("Known");
        store.add_customer(known.clone()).await;

        let result = store
            .create_route(NewRoute {
                technician_id: Uuid::new_v4(),
                route_date: date(),
                estimates: RouteEstimates::default(),
                stops: vec![new_stop(known.id, 1), new_stop(Uuid::new_v4(), 2)],
            })
            .await;

        assert_matches!(result, Err(AppError::Persistence(_)));
        assert_eq!(store.route_count().await, 0);
        assert_eq!(store.stop_count().await, 0);
    }

    #[tokio::test]
    async fn test_delete_cascades_to_stops() {
        let store = MemoryStore::new();
        let a = customer("A");
        store.add_customer(a.clone()).await;
        let saved = store
            .create_route(NewRoute {
                technician_id: Uuid::new_v4(),
                route_date: date(),
                estimates: RouteEstimates::default(),
                stops: vec![new_stop(a.id, 1)],
            })
            .await
            .unwrap();
        assert_eq!(store.stop_count().await, 1);

        store.delete_route(saved.route.id).await.unwrap();
        assert_eq!(store.route_count().await, 0);
        assert_eq!(store.stop_count().await, 0);
    }

    #[tokio::test]
    async fn test_stale_version_is_rejected() {
        let store = MemoryStore::new();
        let saved = store
            .create_route(NewRoute {
                technician_id: Uuid::new_v4(),
                route_date: date(),
                estimates: RouteEstimates::default(),
                stops: vec![],
            })
            .await
            .unwrap();

        store
            .update_route_status(saved.route.id, 1, RouteStatus::Approved)
            .await
            .unwrap();
        let second = store
            .update_route_status(saved.route.id, 1, RouteStatus::Approved)
            .await;
        assert_matches!(second, Err(AppError::Conflict(_)));
    }
}
