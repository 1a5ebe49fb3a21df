//! Planificación de rutas diarias para técnicos de mantenimiento de piscinas
//!
//! Route Manager (listado y acciones por ruta), Route Builder (construcción y
//! edición de la lista ordenada de paradas) y la integración con la función
//! externa de optimización.

pub mod cache;
pub mod config;
pub mod controllers;
pub mod database;
pub mod dto;
pub mod middleware;
pub mod models;
pub mod repositories;
pub mod routes;
pub mod services;
pub mod state;
pub mod utils;

pub use routes::create_router;
pub use state::AppState;
