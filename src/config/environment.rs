//! Configuración de variables de entorno
//!
//! Este módulo maneja la configuración del entorno y variables de configuración.
//! Los valores mal formados son errores, nunca pánicos.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};

use crate::services::route_builder::DEFAULT_ELIGIBLE_POOL_LIMIT;

/// Configuración del entorno
#[derive(Debug, Clone)]
pub struct EnvironmentConfig {
    pub environment: String,
    pub port: u16,
    pub host: String,
    pub database_url: Option<String>,
    pub redis_url: String,
    pub cors_origins: Vec<String>,
    /// Endpoint de la función externa de distancia/optimización
    pub optimizer_url: Option<String>,
    pub optimizer_api_key: Option<String>,
    pub optimizer_timeout: Duration,
    pub eligible_pool_limit: i64,
    pub preferences_ttl_secs: Option<u64>,
}

impl Default for EnvironmentConfig {
    fn default() -> Self {
        Self {
            environment: "development".to_string(),
            port: 3000,
            host: "0.0.0.0".to_string(),
            database_url: None,
            redis_url: "redis://localhost:6379".to_string(),
            cors_origins: Vec::new(),
            optimizer_url: None,
            optimizer_api_key: None,
            optimizer_timeout: Duration::from_secs(30),
            eligible_pool_limit: DEFAULT_ELIGIBLE_POOL_LIMIT,
            preferences_ttl_secs: None,
        }
    }
}

impl EnvironmentConfig {
    /// Leer la configuración del entorno (tras `dotenvy::dotenv`)
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Igual que `from_env` pero con una fuente de variables inyectable
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let config = Self {
            environment: var("ENVIRONMENT").unwrap_or(defaults.environment),
            port: parse_var(&var, "PORT")?.unwrap_or(defaults.port),
            host: var("HOST").unwrap_or(defaults.host),
            database_url: var("DATABASE_URL"),
            redis_url: var("REDIS_URL").unwrap_or(defaults.redis_url),
            cors_origins: var("CORS_ORIGINS")
                .map(|origins| {
                    origins
                        .split(',')
                        .map(|s| s.trim().to_string())
                        .filter(|s| !s.is_empty())
                        .collect()
                })
                .unwrap_or_default(),
            optimizer_url: var("OPTIMIZER_URL"),
            optimizer_api_key: var("OPTIMIZER_API_KEY"),
            optimizer_timeout: parse_var::<u64, _>(&var, "OPTIMIZER_TIMEOUT_SECS")?
                .map(Duration::from_secs)
                .unwrap_or(defaults.optimizer_timeout),
            eligible_pool_limit: parse_var(&var, "ELIGIBLE_POOL_LIMIT")?
                .unwrap_or(defaults.eligible_pool_limit),
            preferences_ttl_secs: parse_var(&var, "PREFERENCES_TTL_SECS")?,
        };

        if config.eligible_pool_limit < 1 {
            return Err(anyhow!("ELIGIBLE_POOL_LIMIT must be at least 1"));
        }
        Ok(config)
    }

    /// Verificar si estamos en modo desarrollo
    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }

    /// Verificar si estamos en modo producción
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    /// Obtener la URL del servidor
    pub fn server_url(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_var<T, F>(var: &F, key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
    F: Fn(&str) -> Option<String>,
{
    var(key)
        .map(|raw| {
            raw.trim()
                .parse::<T>()
                .with_context(|| format!("{} has an invalid value: {}", key, raw))
        })
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = EnvironmentConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.port, 3000);
        assert_eq!(config.eligible_pool_limit, 100);
        assert!(config.optimizer_url.is_none());
        assert!(config.is_development());
    }

    #[test]
    fn test_reads_values() {
        let config = EnvironmentConfig::from_lookup(lookup(&[
            ("PORT", "8080"),
            ("CORS_ORIGINS", "http://a.test, http://b.test,"),
            ("OPTIMIZER_URL", "https://fn.test/optimize"),
            ("OPTIMIZER_TIMEOUT_SECS", "5"),
            ("PREFERENCES_TTL_SECS", "60"),
        ]))
        .unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.cors_origins, vec!["http://a.test", "http://b.test"]);
        assert_eq!(config.optimizer_timeout, Duration::from_secs(5));
        assert_eq!(config.preferences_ttl_secs, Some(60));
    }

    #[test]
    fn test_malformed_values_are_errors() {
        assert!(EnvironmentConfig::from_lookup(lookup(&[("PORT", "abc")])).is_err());
        assert!(EnvironmentConfig::from_lookup(lookup(&[("ELIGIBLE_POOL_LIMIT", "0")])).is_err());
    }
}
