//! Preferencias de colores por día
//!
//! Puerto pequeño e inyectable. En producción vive en Redis; los tests usan
//! la implementación en memoria.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use validator::Validate;

use crate::cache::RedisClient;
use crate::models::DayColors;
use crate::utils::errors::AppResult;

#[async_trait]
pub trait PreferenceStore: Send + Sync {
    async fn load_day_colors(&self, owner: &str) -> AppResult<Option<DayColors>>;
    async fn save_day_colors(&self, owner: &str, colors: &DayColors) -> AppResult<()>;
    async fn clear_day_colors(&self, owner: &str) -> AppResult<()>;
}

pub struct RedisPreferenceStore {
    redis: RedisClient,
}

impl RedisPreferenceStore {
    pub fn new(redis: RedisClient) -> Self {
        Self { redis }
    }
}

#[async_trait]
impl PreferenceStore for RedisPreferenceStore {
    async fn load_day_colors(&self, owner: &str) -> AppResult<Option<DayColors>> {
        self.redis.get_json(&self.redis.preferences_key(owner)).await
    }

    async fn save_day_colors(&self, owner: &str, colors: &DayColors) -> AppResult<()> {
        let key = self.redis.preferences_key(owner);
        self.redis.set_json(&key, colors, self.redis.preferences_ttl()).await
    }

    async fn clear_day_colors(&self, owner: &str) -> AppResult<()> {
        self.redis.delete(&self.redis.preferences_key(owner)).await
    }
}

#[derive(Default)]
pub struct MemoryPreferenceStore {
    colors: RwLock<HashMap<String, DayColors>>,
}

impl MemoryPreferenceStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PreferenceStore for MemoryPreferenceStore {
    async fn load_day_colors(&self, owner: &str) -> AppResult<Option<DayColors>> {
        Ok(self.colors.read().await.get(owner).cloned())
    }

    async fn save_day_colors(&self, owner: &str, colors: &DayColors) -> AppResult<()> {
        self.colors
            .write()
            .await
            .insert(owner.to_string(), colors.clone());
        Ok(())
    }

    async fn clear_day_colors(&self, owner: &str) -> AppResult<()> {
        self.colors.write().await.remove(owner);
        Ok(())
    }
}

#[derive(Clone)]
pub struct PreferencesService {
    store: Arc<dyn PreferenceStore>,
}

impl PreferencesService {
    pub fn new(store: Arc<dyn PreferenceStore>) -> Self {
        Self { store }
    }

    /// Colores guardados o los colores por defecto
    pub async fn day_colors(&self, owner: &str) -> AppResult<DayColors> {
        Ok(self
            .store
            .load_day_colors(owner)
            .await?
            .unwrap_or_default())
    }

    pub async fn update_day_colors(&self, owner: &str, colors: DayColors) -> AppResult<DayColors> {
        colors.validate()?;
        self.store.save_day_colors(owner, &colors).await?;
        log::info!("🎨 Colores por día actualizados para {}", owner);
        Ok(colors)
    }

    pub async fn reset_day_colors(&self, owner: &str) -> AppResult<DayColors> {
        self.store.clear_day_colors(owner).await?;
        Ok(DayColors::default())
    }
}
