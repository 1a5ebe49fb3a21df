//! Services module
//!
//! Este módulo contiene la lógica de negocio y servicios de la aplicación.
//! Los servicios encapsulan operaciones complejas que pueden involucrar
//! múltiples modelos o integraciones externas.

pub mod preferences_service;
pub mod route_builder;
pub mod route_manager;
pub mod route_optimization_service;
pub mod route_progress;

pub use preferences_service::{
    MemoryPreferenceStore, PreferenceStore, PreferencesService, RedisPreferenceStore,
};
pub use route_builder::{BuilderMode, OptimizeOutcome, RouteBuilder, WorkingStop};
pub use route_manager::{
    ConfirmedDeletion, EmptyState, PendingDeletion, RouteAction, RouteBoard, RouteCard,
    RouteManager, StopCard,
};
pub use route_optimization_service::{
    HttpRouteOptimizer, OptimizationResult, RouteOptimizer, UnconfiguredOptimizer,
};
pub use route_progress::{route_badge, stop_badge, Badge, RouteProgress};
