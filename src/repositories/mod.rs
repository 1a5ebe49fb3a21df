//! Repositorios
//!
//! Puertos de persistencia y sus implementaciones PostgreSQL y en memoria.

pub mod customer_repository;
pub mod memory_repository;
pub mod route_repository;

pub use customer_repository::{CustomerDirectory, PgCustomerRepository};
pub use memory_repository::MemoryStore;
pub use route_repository::{PgRouteRepository, RouteStore};
