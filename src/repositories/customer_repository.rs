use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{Appointment, Customer, Technician};
use crate::utils::errors::{AppError, AppResult};

/// Lectura de clientes, técnicos y citas (entidades externas)
#[async_trait]
pub trait CustomerDirectory: Send + Sync {
    async fn find_technician(&self, technician_id: Uuid) -> AppResult<Option<Technician>>;

    async fn customers_assigned_to(&self, technician_id: Uuid) -> AppResult<Vec<Customer>>;

    /// Pool general acotado, usado cuando el técnico no tiene clientes asignados
    async fn active_customers(&self, limit: i64) -> AppResult<Vec<Customer>>;

    async fn customers_by_ids(&self, ids: &[Uuid]) -> AppResult<Vec<Customer>>;

    async fn appointments_on(
        &self,
        technician_id: Uuid,
        date: NaiveDate,
    ) -> AppResult<Vec<Appointment>>;
}

pub struct PgCustomerRepository {
    pool: PgPool,
}

impl PgCustomerRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CustomerDirectory for PgCustomerRepository {
    async fn find_technician(&self, technician_id: Uuid) -> AppResult<Option<Technician>> {
        sqlx::query_as::<_, Technician>("SELECT * FROM technicians WHERE id = $1")
            .bind(technician_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::Persistence(format!("Error finding technician: {}", e)))
    }

    async fn customers_assigned_to(&self, technician_id: Uuid) -> AppResult<Vec<Customer>> {
        sqlx::query_as::<_, Customer>(
            "SELECT * FROM customers WHERE assigned_technician_id = $1 AND active ORDER BY name",
        )
        .bind(technician_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::Persistence(format!("Error listing assigned customers: {}", e)))
    }

    async fn active_customers(&self, limit: i64) -> AppResult<Vec<Customer>> {
        sqlx::query_as::<_, Customer>("SELECT * FROM customers WHERE active ORDER BY name LIMIT $1")
            .bind(limit)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::Persistence(format!("Error listing customers: {}", e)))
    }

    async fn customers_by_ids(&self, ids: &[Uuid]) -> AppResult<Vec<Customer>> {
        sqlx::query_as::<_, Customer>("SELECT * FROM customers WHERE id = ANY($1)")
            .bind(ids)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::Persistence(format!("Error loading customers: {}", e)))
    }

    async fn appointments_on(
        &self,
        technician_id: Uuid,
        date: NaiveDate,
    ) -> AppResult<Vec<Appointment>> {
        sqlx::query_as::<_, Appointment>(
            r#"
            SELECT * FROM appointments
            WHERE scheduled_date = $2
              AND (technician_id = $1 OR technician_id IS NULL)
              AND status <> 'cancelled'
            ORDER BY scheduled_time NULLS LAST
            "#,
        )
        .bind(technician_id)
        .bind(date)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::Persistence(format!("Error listing appointments: {}", e)))
    }
}
