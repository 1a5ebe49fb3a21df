//! Tabla de transiciones de estado
//!
//! Rutas y paradas validan sus cambios de estado en un único lugar. Una
//! transición que no está en la tabla falla con `AppError::InvalidTransition`
//! antes de tocar la base de datos.

use std::fmt;

use crate::utils::errors::{AppError, AppResult};

pub trait StatusTransition: Copy + PartialEq + fmt::Display + 'static {
    /// Nombre de la entidad para los mensajes de error
    const ENTITY: &'static str;

    /// Estados alcanzables directamente desde `self`
    fn allowed_next(&self) -> &'static [Self];

    fn can_transition_to(&self, next: Self) -> bool {
        self.allowed_next().contains(&next)
    }

    fn is_terminal(&self) -> bool {
        self.allowed_next().is_empty()
    }

    /// Validar y devolver el nuevo estado
    fn transition_to(self, next: Self) -> AppResult<Self> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(AppError::InvalidTransition {
                entity: Self::ENTITY,
                from: self.to_string(),
                to: next.to_string(),
            })
        }
    }
}
