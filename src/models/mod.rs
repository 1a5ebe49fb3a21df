//! Modelos del sistema
//!
//! Este módulo contiene todos los modelos de datos que mapean exactamente
//! al schema PostgreSQL con las convenciones estándar.

pub mod customer;
pub mod preferences;
pub mod route;
pub mod stop;
pub mod transition;

pub use customer::{Appointment, Customer, GeoPoint, Technician};
pub use preferences::DayColors;
pub use route::{NewRoute, Route, RouteEstimates, RouteFilters, RouteStatus, RouteWithStops};
pub use stop::{NewStop, Stop, StopChangeSet, StopDetail, StopStatus};
pub use transition::StatusTransition;
