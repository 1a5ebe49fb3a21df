use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use tracing::{debug, info};
use uuid::Uuid;

use crate::models::{
    NewRoute, Route, RouteEstimates, RouteFilters, RouteStatus, RouteWithStops, Stop,
    StopChangeSet, StopDetail, StopStatus,
};
use crate::utils::errors::{not_found_error, stale_version_error, AppError, AppResult};

/// Puerto de persistencia de rutas y paradas.
///
/// Toda escritura sobre una ruta existente recibe la versión leída por el
/// llamador y falla con `AppError::Conflict` si la versión ya cambió.
#[async_trait]
pub trait RouteStore: Send + Sync {
    async fn list_routes(&self, filters: &RouteFilters) -> AppResult<Vec<RouteWithStops>>;

    async fn find_route(&self, route_id: Uuid) -> AppResult<Option<RouteWithStops>>;

    /// Inserta la ruta y todas sus paradas o nada
    async fn create_route(&self, route: NewRoute) -> AppResult<RouteWithStops>;

    async fn apply_stop_changes(
        &self,
        route_id: Uuid,
        expected_version: i32,
        changes: &StopChangeSet,
        estimates: RouteEstimates,
    ) -> AppResult<RouteWithStops>;

    async fn update_route_status(
        &self,
        route_id: Uuid,
        expected_version: i32,
        status: RouteStatus,
    ) -> AppResult<Route>;

    async fn update_stop_status(
        &self,
        route_id: Uuid,
        expected_version: i32,
        stop_id: Uuid,
        status: StopStatus,
    ) -> AppResult<Stop>;

    /// Elimina la ruta; las paradas caen en cascada
    async fn delete_route(&self, route_id: Uuid) -> AppResult<()>;
}

const STOP_DETAIL_SELECT: &str = r#"
    SELECT s.id, s.route_id, s.customer_id, s.appointment_id, s.sequence_position,
           s.status, s.estimated_arrival_time, s.created_at,
           c.name AS customer_name, c.address AS customer_address,
           c.latitude, c.longitude,
           to_char(a.scheduled_time, 'HH24:MI') AS appointment_time
    FROM route_stops s
    JOIN customers c ON c.id = s.customer_id
    LEFT JOIN appointments a ON a.id = s.appointment_id
    WHERE s.route_id = ANY($1)
    ORDER BY s.route_id, s.sequence_position
"#;

pub struct PgRouteRepository {
    pool: PgPool,
}

impl PgRouteRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn load_stops(&self, route_ids: &[Uuid]) -> AppResult<HashMap<Uuid, Vec<StopDetail>>> {
        let rows = sqlx::query_as::<_, StopDetail>(STOP_DETAIL_SELECT)
            .bind(route_ids)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::Persistence(format!("Error loading route stops: {}", e)))?;

        let mut by_route: HashMap<Uuid, Vec<StopDetail>> = HashMap::new();
        for row in rows {
            by_route.entry(row.stop.route_id).or_default().push(row);
        }
        Ok(by_route)
    }

    /// Distinguir entre ruta inexistente y versión obsoleta
    async fn missing_or_stale(&self, route_id: Uuid, expected_version: i32) -> AppError {
        let exists: Result<(bool,), sqlx::Error> =
            sqlx::query_as("SELECT EXISTS(SELECT 1 FROM routes WHERE id = $1)")
                .bind(route_id)
                .fetch_one(&self.pool)
                .await;

        match exists {
            Ok((true,)) => stale_version_error(&route_id, expected_version),
            Ok((false,)) => not_found_error("Route", &route_id),
            Err(e) => AppError::Database(e),
        }
    }

    async fn fetch_saved(&self, route_id: Uuid) -> AppResult<RouteWithStops> {
        self.find_route(route_id)
            .await?
            .ok_or_else(|| not_found_error("Route", &route_id))
    }
}

#[async_trait]
impl RouteStore for PgRouteRepository {
    async fn list_routes(&self, filters: &RouteFilters) -> AppResult<Vec<RouteWithStops>> {
        let routes = sqlx::query_as::<_, Route>(
            r#"
            SELECT * FROM routes
            WHERE route_date = $1
              AND ($2::uuid IS NULL OR technician_id = $2)
            ORDER BY created_at ASC
            "#,
        )
        .bind(filters.date)
        .bind(filters.technician_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::Persistence(format!("Error listing routes: {}", e)))?;

        let ids: Vec<Uuid> = routes.iter().map(|r| r.id).collect();
        let mut stops = self.load_stops(&ids).await?;

        debug!("📋 {} rutas para {} ({:?})", routes.len(), filters.date, filters.technician_id);

        Ok(routes
            .into_iter()
            .map(|route| {
                let stops = stops.remove(&route.id).unwrap_or_default();
                RouteWithStops { route, stops }
            })
            .collect())
    }

    async fn find_route(&self, route_id: Uuid) -> AppResult<Option<RouteWithStops>> {
        let route = sqlx::query_as::<_, Route>("SELECT * FROM routes WHERE id = $1")
            .bind(route_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::Persistence(format!("Error finding route: {}", e)))?;

        let Some(route) = route else {
            return Ok(None);
        };

        let stops = self
            .load_stops(&[route.id])
            .await?
            .remove(&route.id)
            .unwrap_or_default();

        Ok(Some(RouteWithStops { route, stops }))
    }

    async fn create_route(&self, new_route: NewRoute) -> AppResult<RouteWithStops> {
        let id = Uuid::new_v4();
        let now = Utc::now();

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO routes (id, technician_id, route_date, status,
                                total_estimated_duration_minutes, total_estimated_distance_miles,
                                version, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, 1, $7, $7)
            "#,
        )
        .bind(id)
        .bind(new_route.technician_id)
        .bind(new_route.route_date)
        .bind(RouteStatus::Pending)
        .bind(new_route.estimates.total_estimated_duration_minutes)
        .bind(new_route.estimates.total_estimated_distance_miles)
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(|e| AppError::Persistence(format!("Error creating route: {}", e)))?;

        for stop in &new_route.stops {
            sqlx::query(
                r#"
                INSERT INTO route_stops (id, route_id, customer_id, appointment_id,
                                         sequence_position, status, estimated_arrival_time, created_at)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                "#,
            )
            .bind(stop.id)
            .bind(id)
            .bind(stop.customer_id)
            .bind(stop.appointment_id)
            .bind(stop.sequence_position)
            .bind(StopStatus::Pending)
            .bind(&stop.estimated_arrival_time)
            .bind(now)
            .execute(&mut *tx)
            .await
            .map_err(|e| AppError::Persistence(format!("Error creating route stop: {}", e)))?;
        }

        tx.commit().await?;

        info!("✅ Ruta {} creada con {} paradas", id, new_route.stops.len());
        self.fetch_saved(id).await
    }

    async fn apply_stop_changes(
        &self,
        route_id: Uuid,
        expected_version: i32,
        changes: &StopChangeSet,
        estimates: RouteEstimates,
    ) -> AppResult<RouteWithStops> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let bumped = sqlx::query(
            r#"
            UPDATE routes
            SET version = version + 1, updated_at = $3,
                total_estimated_duration_minutes = $4, total_estimated_distance_miles = $5
            WHERE id = $1 AND version = $2
            "#,
        )
        .bind(route_id)
        .bind(expected_version)
        .bind(now)
        .bind(estimates.total_estimated_duration_minutes)
        .bind(estimates.total_estimated_distance_miles)
        .execute(&mut *tx)
        .await
        .map_err(|e| AppError::Persistence(format!("Error updating route: {}", e)))?;

        if bumped.rows_affected() == 0 {
            drop(tx);
            return Err(self.missing_or_stale(route_id, expected_version).await);
        }

        if !changes.removed.is_empty() {
            sqlx::query("DELETE FROM route_stops WHERE route_id = $1 AND id = ANY($2)")
                .bind(route_id)
                .bind(&changes.removed)
                .execute(&mut *tx)
                .await
                .map_err(|e| AppError::Persistence(format!("Error removing route stops: {}", e)))?;
        }

        for stop in &changes.added {
            sqlx::query(
                r#"
                INSERT INTO route_stops (id, route_id, customer_id, appointment_id,
                                         sequence_position, status, estimated_arrival_time, created_at)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                "#,
            )
            .bind(stop.id)
            .bind(route_id)
            .bind(stop.customer_id)
            .bind(stop.appointment_id)
            .bind(stop.sequence_position)
            .bind(StopStatus::Pending)
            .bind(&stop.estimated_arrival_time)
            .bind(now)
            .execute(&mut *tx)
            .await
            .map_err(|e| AppError::Persistence(format!("Error adding route stop: {}", e)))?;
        }

        for (stop_id, position) in &changes.repositioned {
            let updated = sqlx::query(
                "UPDATE route_stops SET sequence_position = $3 WHERE route_id = $1 AND id = $2",
            )
            .bind(route_id)
            .bind(stop_id)
            .bind(position)
            .execute(&mut *tx)
            .await
            .map_err(|e| AppError::Persistence(format!("Error reordering route stop: {}", e)))?;

            if updated.rows_affected() == 0 {
                return Err(not_found_error("Stop", stop_id));
            }
        }

        tx.commit().await?;

        info!(
            "✅ Ruta {} actualizada: +{} -{} ~{} paradas",
            route_id,
            changes.added.len(),
            changes.removed.len(),
            changes.repositioned.len()
        );
        self.fetch_saved(route_id).await
    }

    async fn update_route_status(
        &self,
        route_id: Uuid,
        expected_version: i32,
        status: RouteStatus,
    ) -> AppResult<Route> {
        let route = sqlx::query_as::<_, Route>(
            r#"
            UPDATE routes
            SET status = $3, version = version + 1, updated_at = $4
            WHERE id = $1 AND version = $2
            RETURNING *
            "#,
        )
        .bind(route_id)
        .bind(expected_version)
        .bind(status)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::Persistence(format!("Error updating route status: {}", e)))?;

        match route {
            Some(route) => Ok(route),
            None => Err(self.missing_or_stale(route_id, expected_version).await),
        }
    }

    async fn update_stop_status(
        &self,
        route_id: Uuid,
        expected_version: i32,
        stop_id: Uuid,
        status: StopStatus,
    ) -> AppResult<Stop> {
        let mut tx = self.pool.begin().await?;

        let bumped = sqlx::query(
            "UPDATE routes SET version = version + 1, updated_at = $3 WHERE id = $1 AND version = $2",
        )
        .bind(route_id)
        .bind(expected_version)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await
        .map_err(|e| AppError::Persistence(format!("Error updating route: {}", e)))?;

        if bumped.rows_affected() == 0 {
            drop(tx);
            return Err(self.missing_or_stale(route_id, expected_version).await);
        }

        let stop = sqlx::query_as::<_, Stop>(
            r#"
            UPDATE route_stops SET status = $3
            WHERE id = $1 AND route_id = $2
            RETURNING id, route_id, customer_id, appointment_id, sequence_position,
                      status, estimated_arrival_time, created_at
            "#,
        )
        .bind(stop_id)
        .bind(route_id)
        .bind(status)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| AppError::Persistence(format!("Error updating stop status: {}", e)))?
        .ok_or_else(|| not_found_error("Stop", &stop_id))?;

        tx.commit().await?;
        Ok(stop)
    }

    async fn delete_route(&self, route_id: Uuid) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM routes WHERE id = $1")
            .bind(route_id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::Persistence(format!("Error deleting route: {}", e)))?;

        if result.rows_affected() == 0 {
            return Err(not_found_error("Route", &route_id));
        }

        info!("🗑️ Ruta {} eliminada", route_id);
        Ok(())
    }
}
