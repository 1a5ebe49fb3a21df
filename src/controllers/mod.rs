//! Controladores
//!
//! Lógica de cada endpoint, independiente de axum. Las funciones de
//! `routes` solo extraen parámetros y delegan aquí.

pub mod preferences_controller;
pub mod route_controller;

pub use preferences_controller::PreferencesController;
pub use route_controller::RouteController;
