use anyhow::Result;
use redis::{aio::ConnectionManager, AsyncCommands};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, info, warn};

use super::CacheConfig;
use crate::utils::errors::{AppError, AppResult};

/// Cliente Redis con connection pooling y operaciones async
#[derive(Clone)]
pub struct RedisClient {
    manager: ConnectionManager,
    config: CacheConfig,
}

impl RedisClient {
    /// Crear nuevo cliente Redis
    pub async fn new(config: CacheConfig) -> Result<Self> {
        info!("🔗 Conectando a Redis: {}", config.redis_url);

        let client = redis::Client::open(config.redis_url.clone())?;
        let manager = ConnectionManager::new(client).await?;

        // Test de conexión usando un comando simple
        let mut conn = manager.clone();
        let _: () = redis::cmd("PING").query_async(&mut conn).await?;

        info!("✅ Redis conectado exitosamente");

        Ok(Self { manager, config })
    }

    /// Generar clave de cache con prefijo
    fn make_key(&self, prefix: &str, identifier: &str) -> String {
        format!("{}:{}:{}", self.config.key_prefix, prefix, identifier)
    }

    /// Generar clave de preferencias de un usuario
    pub fn preferences_key(&self, owner: &str) -> String {
        self.make_key("preferences", owner)
    }

    pub fn preferences_ttl(&self) -> Option<u64> {
        self.config.preferences_ttl
    }

    pub async fn get_json<T: DeserializeOwned>(&self, key: &str) -> AppResult<Option<T>> {
        let mut conn = self.manager.clone();

        let value: Option<String> = conn.get(key).await?;
        match value {
            Some(value) => {
                debug!("📥 Cache HIT para clave: {}", key);
                let parsed = serde_json::from_str(&value).map_err(|e| {
                    AppError::Internal(format!("corrupt cached value for {}: {}", key, e))
                })?;
                Ok(Some(parsed))
            }
            None => {
                debug!("❌ Cache MISS para clave: {}", key);
                Ok(None)
            }
        }
    }

    pub async fn set_json<T: Serialize>(&self, key: &str, value: &T, ttl: Option<u64>) -> AppResult<()> {
        let mut conn = self.manager.clone();

        let serialized = serde_json::to_string(value)
            .map_err(|e| AppError::Internal(format!("error serializing {}: {}", key, e)))?;

        let mut cmd = redis::cmd("SET");
        cmd.arg(key).arg(serialized);
        if let Some(ttl) = ttl {
            cmd.arg("EX").arg(ttl);
        }
        cmd.query_async::<_, ()>(&mut conn).await?;

        debug!("💾 Cache SET para clave: {} (TTL: {:?})", key, ttl);
        Ok(())
    }

    pub async fn delete(&self, key: &str) -> AppResult<()> {
        let mut conn = self.manager.clone();

        let count: i64 = conn.del(key).await.map_err(|e| {
            warn!("⚠️ Error eliminando cache para clave {}: {}", key, e);
            AppError::Cache(e)
        })?;
        debug!("🗑️ Cache DELETE para clave: {} (eliminados: {})", key, count);
        Ok(())
    }
}
