//! Data Transfer Objects
//!
//! Estructuras de request/response de la API y de la función externa de
//! optimización.

pub mod api_response;
pub mod route_dto;
pub mod route_optimization_dto;

pub use api_response::ApiResponse;
pub use route_dto::*;
