//! Utilidades de validación
//!
//! Este módulo contiene funciones helper para validación de datos
//! y conversión de tipos.

use chrono::NaiveDate;
use lazy_static::lazy_static;
use regex::Regex;
use validator::ValidationError;

lazy_static! {
    static ref HEX_COLOR: Regex = Regex::new(r"^#[0-9a-fA-F]{6}$").expect("valid hex color regex");
}

/// Validar y convertir string a fecha
pub fn validate_date(value: &str) -> Result<NaiveDate, ValidationError> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|_| {
        let mut error = ValidationError::new("date");
        error.add_param("value".into(), &value.to_string());
        error.add_param("format".into(), &"YYYY-MM-DD".to_string());
        error
    })
}

/// Validar formato de coordenadas GPS (simplificado)
pub fn validate_coordinates(lat: f64, lng: f64) -> Result<(), ValidationError> {
    if !(-90.0..=90.0).contains(&lat) {
        let mut error = ValidationError::new("latitude");
        error.add_param("value".into(), &lat);
        error.add_param("range".into(), &"-90.0 to 90.0".to_string());
        return Err(error);
    }

    if !(-180.0..=180.0).contains(&lng) {
        let mut error = ValidationError::new("longitude");
        error.add_param("value".into(), &lng);
        error.add_param("range".into(), &"-180.0 to 180.0".to_string());
        return Err(error);
    }

    Ok(())
}

/// Validar color en formato `#rrggbb`
pub fn validate_hex_color(value: &str) -> Result<(), ValidationError> {
    if !HEX_COLOR.is_match(value) {
        let mut error = ValidationError::new("hex_color");
        error.add_param("value".into(), &value.to_string());
        error.add_param("format".into(), &"#rrggbb".to_string());
        return Err(error);
    }
    Ok(())
}

/// Validar que una lista de posiciones sea 1..N sin huecos ni duplicados
pub fn validate_dense_positions(positions: &[i32]) -> Result<(), ValidationError> {
    let mut sorted = positions.to_vec();
    sorted.sort_unstable();
    let dense = sorted
        .iter()
        .enumerate()
        .all(|(index, position)| *position == index as i32 + 1);

    if !dense {
        let mut error = ValidationError::new("sequence_positions");
        error.add_param("positions".into(), &positions.to_vec());
        return Err(error);
    }
    Ok(())
}
