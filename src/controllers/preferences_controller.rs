//! Controlador de preferencias de color por día

use crate::models::DayColors;
use crate::services::PreferencesService;
use crate::state::AppState;
use crate::utils::errors::{bad_request_error, AppResult};

pub struct PreferencesController {
    service: PreferencesService,
}

impl PreferencesController {
    pub fn new(state: &AppState) -> Self {
        Self {
            service: state.preferences_service(),
        }
    }

    pub async fn get_day_colors(&self, owner: &str) -> AppResult<DayColors> {
        self.service.day_colors(checked_owner(owner)?).await
    }

    pub async fn update_day_colors(&self, owner: &str, colors: DayColors) -> AppResult<DayColors> {
        self.service
            .update_day_colors(checked_owner(owner)?, colors)
            .await
    }

    pub async fn reset_day_colors(&self, owner: &str) -> AppResult<DayColors> {
        self.service.reset_day_colors(checked_owner(owner)?).await
    }
}

/// El owner forma parte de la clave de Redis
fn checked_owner(owner: &str) -> AppResult<&str> {
    let owner = owner.trim();
    if owner.is_empty() || owner.len() > 128 || owner.contains(char::is_whitespace) {
        return Err(bad_request_error("Invalid preferences owner"));
    }
    Ok(owner)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checked_owner() {
        assert_eq!(checked_owner(" office ").unwrap(), "office");
        assert!(checked_owner("").is_err());
        assert!(checked_owner("two words").is_err());
    }
}
