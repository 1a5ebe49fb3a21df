//! Route Builder
//!
//! Construye o modifica la lista ordenada de paradas de un (técnico, fecha)
//! y la persiste como ruta. La lista de trabajo vive en memoria hasta
//! `save`; después de cada mutación las posiciones son 1..N sin huecos.

use std::collections::{HashMap, HashSet};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{
    Appointment, Customer, GeoPoint, NewRoute, NewStop, RouteEstimates, RouteWithStops, Stop,
    StopChangeSet, StopDetail, StopStatus,
};
use crate::repositories::{CustomerDirectory, RouteStore};
use crate::services::route_optimization_service::{is_permutation, RouteOptimizer};
use crate::utils::errors::{not_found_error, AppError, AppResult, BuilderError};

/// Tamaño por defecto del pool general de clientes
pub const DEFAULT_ELIGIBLE_POOL_LIMIT: i64 = 100;

/// Parada en la lista de trabajo
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WorkingStop {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub customer_name: String,
    pub customer_address: Option<String>,
    pub location: Option<GeoPoint>,
    pub appointment_id: Option<Uuid>,
    pub sequence_position: i32,
    pub status: StopStatus,
    pub estimated_arrival_time: Option<String>,
}

impl WorkingStop {
    /// Parada nueva con id generado en el cliente
    pub fn from_customer(customer: &Customer) -> Self {
        Self {
            id: Uuid::new_v4(),
            customer_id: customer.id,
            customer_name: customer.name.clone(),
            customer_address: customer.address.clone(),
            location: customer.location(),
            appointment_id: None,
            sequence_position: 0,
            status: StopStatus::Pending,
            estimated_arrival_time: None,
        }
    }

    pub fn with_id(mut self, id: Uuid) -> Self {
        self.id = id;
        self
    }

    pub fn with_appointment(mut self, appointment_id: Option<Uuid>) -> Self {
        self.appointment_id = appointment_id;
        self
    }

    pub fn with_estimated_arrival(mut self, estimated_arrival_time: Option<String>) -> Self {
        self.estimated_arrival_time = estimated_arrival_time;
        self
    }

    fn to_new_stop(&self) -> NewStop {
        NewStop {
            id: self.id,
            customer_id: self.customer_id,
            appointment_id: self.appointment_id,
            sequence_position: self.sequence_position,
            estimated_arrival_time: self.estimated_arrival_time.clone(),
        }
    }
}

impl From<&StopDetail> for WorkingStop {
    fn from(detail: &StopDetail) -> Self {
        Self {
            id: detail.stop.id,
            customer_id: detail.stop.customer_id,
            customer_name: detail.customer_name.clone(),
            customer_address: detail.customer_address.clone(),
            location: detail.location(),
            appointment_id: detail.stop.appointment_id,
            sequence_position: detail.stop.sequence_position,
            status: detail.stop.status,
            estimated_arrival_time: detail.stop.estimated_arrival_time.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum BuilderMode {
    Create,
    /// Edición de una ruta persistida; `version` es la leída por el cliente
    Edit {
        route_id: Uuid,
        version: i32,
        persisted: Vec<Stop>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OptimizeOutcome {
    Reordered,
    /// La función no devolvió orden: no hay mejora disponible
    Unchanged,
}

pub struct RouteBuilder {
    mode: BuilderMode,
    technician_id: Option<Uuid>,
    date: NaiveDate,
    search: String,
    eligible: Vec<Customer>,
    appointments: Vec<Appointment>,
    stops: Vec<WorkingStop>,
    estimates: RouteEstimates,
    estimates_stale: bool,
    pool_limit: i64,
}

impl RouteBuilder {
    /// Builder para una ruta nueva
    pub fn new(date: NaiveDate) -> Self {
        Self {
            mode: BuilderMode::Create,
            technician_id: None,
            date,
            search: String::new(),
            eligible: Vec::new(),
            appointments: Vec::new(),
            stops: Vec::new(),
            estimates: RouteEstimates::default(),
            estimates_stale: false,
            pool_limit: DEFAULT_ELIGIBLE_POOL_LIMIT,
        }
    }

    /// Builder precargado con una ruta persistida. El técnico queda fijo.
    pub fn for_route(saved: RouteWithStops) -> Self {
        let mut builder = Self::new(saved.route.route_date);
        builder.technician_id = Some(saved.route.technician_id);
        builder.estimates = RouteEstimates {
            total_estimated_duration_minutes: saved.route.total_estimated_duration_minutes,
            total_estimated_distance_miles: saved.route.total_estimated_distance_miles,
        };
        builder.stops = saved.stops.iter().map(WorkingStop::from).collect();
        builder.renumber();
        builder.mode = BuilderMode::Edit {
            route_id: saved.route.id,
            version: saved.route.version,
            persisted: saved.stops.into_iter().map(|d| d.stop).collect(),
        };
        builder
    }

    /// Usar la versión que leyó el cliente en lugar de la recién cargada
    pub fn with_expected_version(mut self, expected: i32) -> Self {
        if let BuilderMode::Edit { version, .. } = &mut self.mode {
            *version = expected;
        }
        self
    }

    pub fn with_pool_limit(mut self, limit: i64) -> Self {
        self.pool_limit = limit.max(1);
        self
    }

    pub fn mode(&self) -> &BuilderMode {
        &self.mode
    }

    pub fn is_edit(&self) -> bool {
        matches!(self.mode, BuilderMode::Edit { .. })
    }

    pub fn technician_id(&self) -> Option<Uuid> {
        self.technician_id
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn stops(&self) -> &[WorkingStop] {
        &self.stops
    }

    pub fn appointments(&self) -> &[Appointment] {
        &self.appointments
    }

    pub fn estimates(&self) -> RouteEstimates {
        self.estimates
    }

    /// Los totales no se recalculan tras una edición manual
    pub fn estimates_stale(&self) -> bool {
        self.estimates_stale
    }

    pub fn set_estimates(&mut self, estimates: RouteEstimates) {
        self.estimates = estimates;
        self.estimates_stale = false;
    }

    /// Seleccionar técnico (solo rutas nuevas) y cargar sus candidatos
    pub async fn set_technician(
        &mut self,
        directory: &dyn CustomerDirectory,
        technician_id: Uuid,
    ) -> AppResult<()> {
        if self.is_edit() {
            return Err(BuilderError::TechnicianLocked.into());
        }

        let technician = directory
            .find_technician(technician_id)
            .await?
            .ok_or_else(|| not_found_error("Technician", &technician_id))?;

        log::info!("👷 Técnico seleccionado: {} ({})", technician.full_name, technician.id);
        self.technician_id = Some(technician.id);
        self.load_candidates(directory).await
    }

    /// Cargar clientes elegibles y citas del día para el técnico actual
    pub async fn load_candidates(&mut self, directory: &dyn CustomerDirectory) -> AppResult<()> {
        let technician_id = self.technician_id.ok_or(BuilderError::MissingTechnician)?;

        let assigned = directory.customers_assigned_to(technician_id).await?;
        self.eligible = if assigned.is_empty() {
            log::info!(
                "📋 Técnico {} sin clientes asignados, usando pool general (máx {})",
                technician_id,
                self.pool_limit
            );
            directory.active_customers(self.pool_limit).await?
        } else {
            assigned
        };

        self.appointments = directory.appointments_on(technician_id, self.date).await?;

        log::debug!(
            "📋 {} clientes elegibles, {} citas el {}",
            self.eligible.len(),
            self.appointments.len(),
            self.date
        );
        Ok(())
    }

    pub fn set_search(&mut self, search: impl Into<String>) {
        self.search = search.into();
    }

    pub fn search(&self) -> &str {
        &self.search
    }

    /// Clientes que coinciden con la búsqueda y aún no están en la lista
    pub fn eligible_customers(&self) -> Vec<&Customer> {
        self.eligible
            .iter()
            .filter(|c| c.matches(&self.search))
            .filter(|c| !self.contains_customer(c.id))
            .collect()
    }

    pub fn contains_customer(&self, customer_id: Uuid) -> bool {
        self.stops.iter().any(|s| s.customer_id == customer_id)
    }

    /// Añadir un cliente al final. Rechaza duplicados sin tocar la lista.
    pub fn add_stop(&mut self, customer: &Customer) -> Result<Uuid, BuilderError> {
        if self.contains_customer(customer.id) {
            log::warn!("⚠️ {} ya está en la ruta", customer.name);
            return Err(BuilderError::DuplicateCustomer {
                customer_id: customer.id,
                name: customer.name.clone(),
            });
        }

        let stop = WorkingStop::from_customer(customer)
            .with_appointment(self.appointment_for(customer.id));
        let id = stop.id;
        self.stops.push(stop);
        self.after_manual_edit();
        Ok(id)
    }

    pub fn remove_stop(&mut self, stop_id: Uuid) -> Result<WorkingStop, BuilderError> {
        let index = self
            .stops
            .iter()
            .position(|s| s.id == stop_id)
            .ok_or(BuilderError::StopNotFound(stop_id))?;
        let removed = self.stops.remove(index);
        self.after_manual_edit();
        Ok(removed)
    }

    /// Mover una parada de `source` a `destination` (drag and drop)
    pub fn reorder(&mut self, source: usize, destination: usize) -> Result<(), BuilderError> {
        let len = self.stops.len();
        for index in [source, destination] {
            if index >= len {
                return Err(BuilderError::IndexOutOfRange { index, len });
            }
        }
        if source == destination {
            return Ok(());
        }

        let stop = self.stops.remove(source);
        self.stops.insert(destination, stop);
        self.after_manual_edit();
        Ok(())
    }

    /// Reemplazar la lista completa (borrador enviado por el cliente).
    /// Valida todo antes de modificar nada.
    pub fn replace_stops(&mut self, stops: Vec<WorkingStop>) -> Result<(), BuilderError> {
        let mut customers = HashSet::new();
        let mut ids = HashSet::new();
        for stop in &stops {
            if !customers.insert(stop.customer_id) {
                return Err(BuilderError::DuplicateCustomer {
                    customer_id: stop.customer_id,
                    name: stop.customer_name.clone(),
                });
            }
            if !ids.insert(stop.id) {
                return Err(BuilderError::DuplicateStopId(stop.id));
            }
        }

        let linked: Vec<WorkingStop> = stops
            .into_iter()
            .map(|stop| {
                if stop.appointment_id.is_some() {
                    stop
                } else {
                    let appointment_id = self.appointment_for(stop.customer_id);
                    stop.with_appointment(appointment_id)
                }
            })
            .collect();
        self.stops = linked;
        self.after_manual_edit();
        Ok(())
    }

    /// Optimizar el orden con la función externa.
    ///
    /// Las paradas sin coordenadas no se envían y conservan su posición; las
    /// geocodificadas se permutan entre sus propias posiciones.
    pub async fn optimize(&mut self, optimizer: &dyn RouteOptimizer) -> AppResult<OptimizeOutcome> {
        let geocoded: Vec<(usize, GeoPoint)> = self
            .stops
            .iter()
            .enumerate()
            .filter_map(|(index, stop)| stop.location.map(|point| (index, point)))
            .collect();

        if geocoded.len() < 2 {
            return Err(BuilderError::InsufficientGeocodedStops {
                found: geocoded.len(),
            }
            .into());
        }

        let skipped = self.stops.len() - geocoded.len();
        if skipped > 0 {
            log::info!("📍 {} paradas sin coordenadas quedan fuera de la optimización", skipped);
        }

        let coordinates: Vec<GeoPoint> = geocoded.iter().map(|(_, point)| *point).collect();
        let result = optimizer.optimize(&coordinates).await?;

        let outcome = match &result.optimized_order {
            None => OptimizeOutcome::Unchanged,
            Some(order) => {
                if !is_permutation(order, geocoded.len()) {
                    return Err(AppError::Optimization(format!(
                        "optimizer returned an invalid order {:?} for {} stops",
                        order,
                        geocoded.len()
                    )));
                }

                let slots: Vec<usize> = geocoded.iter().map(|(index, _)| *index).collect();
                let mut reordered = self.stops.clone();
                for (slot, &source) in slots.iter().zip(order.iter()) {
                    reordered[*slot] = self.stops[slots[source]].clone();
                }
                self.stops = reordered;
                self.renumber();
                OptimizeOutcome::Reordered
            }
        };

        self.set_estimates(RouteEstimates {
            total_estimated_duration_minutes: Some(result.total_duration_minutes),
            total_estimated_distance_miles: Some(result.total_distance_miles),
        });

        log::info!(
            "✅ Optimización {:?}: {:.1} millas, {:.0} minutos",
            outcome,
            result.total_distance_miles,
            result.total_duration_minutes
        );
        Ok(outcome)
    }

    /// Cambios a aplicar sobre lo persistido
    pub fn changes(&self) -> StopChangeSet {
        match &self.mode {
            BuilderMode::Create => StopChangeSet {
                added: self.stops.iter().map(WorkingStop::to_new_stop).collect(),
                ..StopChangeSet::default()
            },
            BuilderMode::Edit { persisted, .. } => {
                let persisted_by_id: HashMap<Uuid, &Stop> =
                    persisted.iter().map(|s| (s.id, s)).collect();
                let working_ids: HashSet<Uuid> = self.stops.iter().map(|s| s.id).collect();

                let mut changes = StopChangeSet {
                    removed: persisted
                        .iter()
                        .filter(|s| !working_ids.contains(&s.id))
                        .map(|s| s.id)
                        .collect(),
                    ..StopChangeSet::default()
                };

                for stop in &self.stops {
                    match persisted_by_id.get(&stop.id) {
                        Some(saved) if saved.sequence_position != stop.sequence_position => {
                            changes.repositioned.push((stop.id, stop.sequence_position));
                        }
                        Some(_) => {}
                        None => changes.added.push(stop.to_new_stop()),
                    }
                }
                changes
            }
        }
    }

    /// Persistir la ruta.
    ///
    /// Ruta nueva: inserta ruta y paradas en una transacción. Edición: aplica
    /// el diff con control de versión. Tras el éxito el builder queda en modo
    /// edición sobre lo guardado.
    pub async fn save(&mut self, store: &dyn RouteStore) -> AppResult<RouteWithStops> {
        let technician_id = self.technician_id.ok_or(BuilderError::MissingTechnician)?;
        if self.stops.is_empty() {
            return Err(BuilderError::EmptyStopList.into());
        }

        let saved = match &self.mode {
            BuilderMode::Create => {
                log::info!(
                    "💾 Creando ruta para técnico {} el {} con {} paradas",
                    technician_id,
                    self.date,
                    self.stops.len()
                );
                store
                    .create_route(NewRoute {
                        technician_id,
                        route_date: self.date,
                        estimates: self.estimates,
                        stops: self.stops.iter().map(WorkingStop::to_new_stop).collect(),
                    })
                    .await?
            }
            BuilderMode::Edit { route_id, version, .. } => {
                let changes = self.changes();
                log::info!(
                    "💾 Actualizando ruta {} (versión {}): +{} -{} ~{}",
                    route_id,
                    version,
                    changes.added.len(),
                    changes.removed.len(),
                    changes.repositioned.len()
                );
                store
                    .apply_stop_changes(*route_id, *version, &changes, self.estimates)
                    .await?
            }
        };

        self.mode = BuilderMode::Edit {
            route_id: saved.route.id,
            version: saved.route.version,
            persisted: saved.stops.iter().map(|d| d.stop.clone()).collect(),
        };
        Ok(saved)
    }

    fn appointment_for(&self, customer_id: Uuid) -> Option<Uuid> {
        let candidates: Vec<&Appointment> = self
            .appointments
            .iter()
            .filter(|a| a.customer_id == customer_id && a.scheduled_date == self.date)
            .collect();
        candidates
            .iter()
            .find(|a| a.technician_id.is_some() && a.technician_id == self.technician_id)
            .or(candidates.first())
            .map(|a| a.id)
    }

    fn after_manual_edit(&mut self) {
        self.renumber();
        if self.estimates.total_estimated_distance_miles.is_some()
            || self.estimates.total_estimated_duration_minutes.is_some()
        {
            self.estimates_stale = true;
        }
    }

    fn renumber(&mut self) {
        for (index, stop) in self.stops.iter_mut().enumerate() {
            stop.sequence_position = index as i32 + 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Route;
    use crate::models::RouteStatus;
    use chrono::Utc;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 2).unwrap()
    }

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

    fn positions(builder: &RouteBuilder) -> Vec<i32> {
        builder.stops().iter().map(|s| s.sequence_position).collect()
    }

    fn names(builder: &RouteBuilder) -> Vec<String> {
        builder.stops().iter().map(|s| s.customer_name.clone()).collect()
    }

    #[test]
    fn test_positions_stay_dense_after_mixed_edits() {
        let mut builder = RouteBuilder::new(date());
        let customers: Vec<Customer> = ["A", "B", "C", "D", "E"].iter().map(|n| customer(n)).collect();
        let mut ids = Vec::new();
        for c in &customers {
            ids.push(builder.add_stop(c).unwrap());
        }

        builder.reorder(4, 0).unwrap();
        builder.remove_stop(ids[2]).unwrap();
        builder.reorder(1, 3).unwrap();
        builder.add_stop(&customer("F")).unwrap();
        builder.remove_stop(ids[0]).unwrap();

        let n = builder.stops().len() as i32;
        assert_eq!(positions(&builder), (1..=n).collect::<Vec<_>>());
    }

    #[test]
    fn test_reorder_moves_first_to_last() {
        let mut builder = RouteBuilder::new(date());
        for name in ["A", "B", "C"] {
            builder.add_stop(&customer(name)).unwrap();
        }

        builder.reorder(0, 2).unwrap();
        assert_eq!(names(&builder), vec!["B", "C", "A"]);
        assert_eq!(positions(&builder), vec![1, 2, 3]);

        builder.reorder(2, 0).unwrap();
        assert_eq!(names(&builder), vec!["A", "B", "C"]);
    }

    #[test]
    fn test_reorder_out_of_range() {
        let mut builder = RouteBuilder::new(date());
        builder.add_stop(&customer("A")).unwrap();
        assert_eq!(
            builder.reorder(0, 1),
            Err(BuilderError::IndexOutOfRange { index: 1, len: 1 })
        );
    }

    #[test]
    fn test_duplicate_customer_is_rejected() {
        let mut builder = RouteBuilder::new(date());
        let a = customer("A");
        builder.add_stop(&a).unwrap();
        let before = builder.stops().to_vec();

        let err = builder.add_stop(&a).unwrap_err();
        assert!(matches!(err, BuilderError::DuplicateCustomer { .. }));
        assert_eq!(builder.stops(), before.as_slice());
    }

    #[test]
    fn test_replace_stops_rejects_repeated_stop_id() {
        let mut builder = RouteBuilder::new(date());
        builder.add_stop(&customer("A")).unwrap();
        let before = builder.stops().to_vec();

        let shared = Uuid::new_v4();
        let drafts = vec![
            WorkingStop::from_customer(&customer("B")).with_id(shared),
            WorkingStop::from_customer(&customer("C")).with_id(shared),
        ];
        assert_eq!(
            builder.replace_stops(drafts),
            Err(BuilderError::DuplicateStopId(shared))
        );
        assert_eq!(builder.stops(), before.as_slice());
    }

    #[test]
    fn test_manual_edit_marks_estimates_stale() {
        let mut builder = RouteBuilder::new(date());
        builder.add_stop(&customer("A")).unwrap();
        builder.add_stop(&customer("B")).unwrap();
        builder.set_estimates(RouteEstimates {
            total_estimated_duration_minutes: Some(30.0),
            total_estimated_distance_miles: Some(8.0),
        });
        assert!(!builder.estimates_stale());

        builder.reorder(0, 1).unwrap();
        assert!(builder.estimates_stale());
        assert_eq!(builder.estimates().total_estimated_distance_miles, Some(8.0));
    }

    #[test]
    fn test_edit_mode_diff() {
        let route_id = Uuid::new_v4();
        let a = customer("A");
        let b = customer("B");
        let c = customer("C");
        let stop = |c: &Customer, pos: i32| StopDetail {
            stop: Stop {
                id: Uuid::new_v4(),
                route_id,
                customer_id: c.id,
                appointment_id: None,
                sequence_position: pos,
                status: StopStatus::Pending,
                estimated_arrival_time: None,
                created_at: Utc::now(),
            },
            customer_name: c.name.clone(),
            customer_address: None,
            latitude: None,
            longitude: None,
            appointment_time: None,
        };
        let saved = RouteWithStops {
            route: Route {
                id: route_id,
                technician_id: Uuid::new_v4(),
                route_date: date(),
                status: RouteStatus::Pending,
                total_estimated_duration_minutes: None,
                total_estimated_distance_miles: None,
                version: 3,
                created_at: Utc::now(),
                updated_at: Utc::now(),
            },
            stops: vec![stop(&a, 1), stop(&b, 2), stop(&c, 3)],
        };
        let b_id = saved.stops[1].stop.id;
        let c_id = saved.stops[2].stop.id;

        let mut builder = RouteBuilder::for_route(saved);
        assert!(builder.is_edit());
        builder.remove_stop(b_id).unwrap();
        let d_id = builder.add_stop(&customer("D")).unwrap();

        let changes = builder.changes();
        assert_eq!(changes.removed, vec![b_id]);
        assert_eq!(changes.repositioned, vec![(c_id, 2)]);
        assert_eq!(changes.added.len(), 1);
        assert_eq!(changes.added[0].id, d_id);
        assert_eq!(changes.added[0].sequence_position, 3);
    }
}
