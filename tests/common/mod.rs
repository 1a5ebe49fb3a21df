//! Fixtures compartidos por los tests de integración

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Method, Request};
use axum::response::Response;
use axum::Router;
use chrono::{NaiveDate, NaiveTime};
use tower::ServiceExt;
use uuid::Uuid;

use pool_routes::config::EnvironmentConfig;
use pool_routes::models::{Appointment, Customer, GeoPoint, Technician};
use pool_routes::repositories::MemoryStore;
use pool_routes::services::{OptimizationResult, RouteOptimizer};
use pool_routes::utils::errors::{AppError, AppResult};
use pool_routes::{create_router, AppState};

pub fn route_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 6, 2).unwrap()
}

/// Qué devuelve el optimizador de prueba
#[derive(Debug, Clone)]
pub enum StubBehavior {
    /// Invierte el orden recibido
    Reverse,
    /// Sin `optimizedOrder`: no hay mejora
    NoOrder,
    /// Orden fijo, válido o no
    Fixed(Vec<usize>),
    Fail(String),
}

pub struct StubOptimizer {
    behavior: StubBehavior,
    calls: AtomicUsize,
    last_input: Mutex<Vec<GeoPoint>>,
}

impl StubOptimizer {
    pub fn new(behavior: StubBehavior) -> Arc<Self> {
        Arc::new(Self {
            behavior,
            calls: AtomicUsize::new(0),
            last_input: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_input(&self) -> Vec<GeoPoint> {
        self.last_input.lock().unwrap().clone()
    }
}

#[async_trait]
impl RouteOptimizer for StubOptimizer {
    async fn optimize(&self, coordinates: &[GeoPoint]) -> AppResult<OptimizationResult> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_input.lock().unwrap() = coordinates.to_vec();

        let optimized_order = match &self.behavior {
            StubBehavior::Reverse => Some((0..coordinates.len()).rev().collect()),
            StubBehavior::NoOrder => None,
            StubBehavior::Fixed(order) => Some(order.clone()),
            StubBehavior::Fail(message) => return Err(AppError::Optimization(message.clone())),
        };

        Ok(OptimizationResult {
            optimized_order,
            total_distance_miles: 12.5,
            total_duration_minutes: 48.0,
        })
    }
}

/// Almacén con un técnico, cuatro clientes asignados y una cita
pub struct Fixture {
    pub store: Arc<MemoryStore>,
    pub technician: Technician,
    pub other_technician: Technician,
    pub alice: Customer,
    pub bob: Customer,
    pub carol: Customer,
    /// Sin coordenadas
    pub dan: Customer,
    pub alice_appointment: Appointment,
}

fn customer(name: &str, technician_id: Uuid, location: Option<(f64, f64)>) -> Customer {
    Customer {
        id: Uuid::new_v4(),
        name: name.to_string(),
        address: Some(format!("{} St, Tampa FL", name)),
        latitude: location.map(|l| l.0),
        longitude: location.map(|l| l.1),
        assigned_technician_id: Some(technician_id),
        active: true,
    }
}

impl Fixture {
    pub async fn seeded() -> Self {
        let store = Arc::new(MemoryStore::new());
        let technician = Technician {
            id: Uuid::new_v4(),
            full_name: "Tess Tech".to_string(),
            active: true,
        };
        let other_technician = Technician {
            id: Uuid::new_v4(),
            full_name: "Otto Other".to_string(),
            active: true,
        };

        let alice = customer("Alice Pool", technician.id, Some((27.95, -82.46)));
        let bob = customer("Bob Spa", technician.id, Some((27.97, -82.44)));
        let carol = customer("Carol Lagoon", technician.id, Some((27.99, -82.40)));
        let dan = customer("Dan Ungeocoded", technician.id, None);

        let alice_appointment = Appointment {
            id: Uuid::new_v4(),
            customer_id: alice.id,
            technician_id: Some(technician.id),
            scheduled_date: route_date(),
            scheduled_time: NaiveTime::from_hms_opt(9, 30, 0),
            status: "scheduled".to_string(),
        };

        store.add_technician(technician.clone()).await;
        store.add_technician(other_technician.clone()).await;
        for c in [&alice, &bob, &carol, &dan] {
            store.add_customer(c.clone()).await;
        }
        store.add_appointment(alice_appointment.clone()).await;

        Self {
            store,
            technician,
            other_technician,
            alice,
            bob,
            carol,
            dan,
            alice_appointment,
        }
    }

    pub fn app(&self, optimizer: Arc<StubOptimizer>) -> Router {
        let state = AppState::in_memory(EnvironmentConfig::default(), self.store.clone(), optimizer);
        create_router(state)
    }
}

pub async fn send(app: Router, method: Method, uri: &str, body: Option<serde_json::Value>) -> Response {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    app.oneshot(request).await.unwrap()
}

pub async fn body_json(response: Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
