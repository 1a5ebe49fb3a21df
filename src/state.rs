//! Shared application state
//!
//! Este módulo define el estado compartido de la aplicación que se pasa
//! a través del router de Axum. Cada puerto es un `Arc<dyn Trait>` para
//! poder inyectar PostgreSQL/Redis en producción y memoria en los tests.

use std::sync::Arc;

use crate::config::environment::EnvironmentConfig;
use crate::repositories::{CustomerDirectory, MemoryStore, RouteStore};
use crate::services::{
    MemoryPreferenceStore, PreferenceStore, PreferencesService, RouteManager, RouteOptimizer,
};

#[derive(Clone)]
pub struct AppState {
    pub config: EnvironmentConfig,
    pub routes: Arc<dyn RouteStore>,
    pub directory: Arc<dyn CustomerDirectory>,
    pub optimizer: Arc<dyn RouteOptimizer>,
    pub preferences: Arc<dyn PreferenceStore>,
}

impl AppState {
    pub fn new(
        config: EnvironmentConfig,
        routes: Arc<dyn RouteStore>,
        directory: Arc<dyn CustomerDirectory>,
        optimizer: Arc<dyn RouteOptimizer>,
        preferences: Arc<dyn PreferenceStore>,
    ) -> Self {
        Self {
            config,
            routes,
            directory,
            optimizer,
            preferences,
        }
    }

    /// Estado completamente en memoria (tests y desarrollo sin servicios)
    pub fn in_memory(
        config: EnvironmentConfig,
        store: Arc<MemoryStore>,
        optimizer: Arc<dyn RouteOptimizer>,
    ) -> Self {
        Self::new(
            config,
            store.clone(),
            store,
            optimizer,
            Arc::new(MemoryPreferenceStore::new()),
        )
    }

    pub fn route_manager(&self) -> RouteManager {
        RouteManager::new(self.routes.clone())
    }

    pub fn preferences_service(&self) -> PreferencesService {
        PreferencesService::new(self.preferences.clone())
    }
}
