//! Preferencias locales de color por día de la semana
//!
//! Preferencia de bajo impacto; no se sincroniza entre dispositivos.

use chrono::Weekday;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::utils::validation::validate_hex_color;

#[derive(Debug, Clone, Serialize, Deserialize, Validate, PartialEq)]
pub struct DayColors {
    #[validate(custom = "validate_hex_color")]
    pub monday: String,
    #[validate(custom = "validate_hex_color")]
    pub tuesday: String,
    #[validate(custom = "validate_hex_color")]
    pub wednesday: String,
    #[validate(custom = "validate_hex_color")]
    pub thursday: String,
    #[validate(custom = "validate_hex_color")]
    pub friday: String,
    #[validate(custom = "validate_hex_color")]
    pub saturday: String,
    #[validate(custom = "validate_hex_color")]
    pub sunday: String,
}

impl Default for DayColors {
    fn default() -> Self {
        Self {
            monday: "#3b82f6".to_string(),
            tuesday: "#10b981".to_string(),
            wednesday: "#f59e0b".to_string(),
            thursday: "#8b5cf6".to_string(),
            friday: "#ef4444".to_string(),
            saturday: "#06b6d4".to_string(),
            sunday: "#6b7280".to_string(),
        }
    }
}

impl DayColors {
    pub fn for_weekday(&self, day: Weekday) -> &str {
        match day {
            Weekday::Mon => &self.monday,
            Weekday::Tue => &self.tuesday,
            Weekday::Wed => &self.wednesday,
            Weekday::Thu => &self.thursday,
            Weekday::Fri => &self.friday,
            Weekday::Sat => &self.saturday,
            Weekday::Sun => &self.sunday,
        }
    }
}
