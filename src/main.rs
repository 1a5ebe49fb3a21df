use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use dotenvy::dotenv;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use pool_routes::cache::{CacheConfig, RedisClient};
use pool_routes::config::EnvironmentConfig;
use pool_routes::database::DatabaseConnection;
use pool_routes::repositories::{PgCustomerRepository, PgRouteRepository};
use pool_routes::services::{
    HttpRouteOptimizer, RedisPreferenceStore, RouteOptimizer, UnconfiguredOptimizer,
};
use pool_routes::{create_router, AppState};

#[tokio::main]
async fn main() -> Result<()> {
    // Cargar variables de entorno
    dotenv().ok();

    // Configurar logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")),
        )
        .init();

    info!("🏊 Pool Routes - Planificación de rutas diarias");
    info!("================================================");

    let config = EnvironmentConfig::from_env().context("invalid configuration")?;
    info!("⚙️ Entorno: {}", config.environment);
    if config.is_production() && config.cors_origins.is_empty() {
        warn!("⚠️ CORS_ORIGINS vacío en producción: se permite cualquier origen");
    }

    // Inicializar base de datos
    let database_url = config
        .database_url
        .clone()
        .context("DATABASE_URL must be set")?;
    let db_connection = match DatabaseConnection::new(&database_url).await {
        Ok(conn) => conn,
        Err(e) => {
            error!("❌ Error conectando a la base de datos: {}", e);
            return Err(e);
        }
    };
    db_connection.run_migrations().await?;
    let pool = db_connection.pool().clone();

    // Inicializar Redis para preferencias
    let cache_config = CacheConfig {
        redis_url: config.redis_url.clone(),
        preferences_ttl: config.preferences_ttl_secs,
        ..CacheConfig::default()
    };
    let redis_client = match RedisClient::new(cache_config).await {
        Ok(client) => client,
        Err(e) => {
            error!("❌ Error conectando a Redis: {}", e);
            return Err(e);
        }
    };

    // Función externa de optimización
    let optimizer: Arc<dyn RouteOptimizer> = match &config.optimizer_url {
        Some(url) => {
            info!("🧭 Función de optimización: {}", url);
            Arc::new(HttpRouteOptimizer::new(
                url.clone(),
                config.optimizer_api_key.clone(),
                config.optimizer_timeout,
            )?)
        }
        None => {
            warn!("⚠️ OPTIMIZER_URL no configurado; la optimización no estará disponible");
            Arc::new(UnconfiguredOptimizer)
        }
    };

    let addr: SocketAddr = config
        .server_url()
        .parse()
        .with_context(|| format!("invalid HOST/PORT: {}", config.server_url()))?;

    let app_state = AppState::new(
        config,
        Arc::new(PgRouteRepository::new(pool.clone())),
        Arc::new(PgCustomerRepository::new(pool)),
        optimizer,
        Arc::new(RedisPreferenceStore::new(redis_client)),
    );
    let app = create_router(app_state);

    info!("🌐 Servidor iniciando en http://{}", addr);
    info!("🔍 Endpoints disponibles:");
    info!("   GET    /health");
    info!("📋 Route Manager:");
    info!("   GET    /api/routes?date=YYYY-MM-DD&technician_id=");
    info!("   GET    /api/routes/:id");
    info!("   POST   /api/routes/:id/approve");
    info!("   POST   /api/routes/:id/status");
    info!("   POST   /api/routes/:id/stops/:stop_id/status");
    info!("   DELETE /api/routes/:id?confirm=true");
    info!("🛠️ Route Builder:");
    info!("   POST   /api/routes");
    info!("   POST   /api/routes/optimize");
    info!("   GET    /api/technicians/:id/eligible-customers?date=&search=");
    info!("🎨 Preferencias:");
    info!("   GET/PUT/DELETE /api/preferences/:owner/day-colors");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        error!("❌ Error del servidor: {}", e);
        return Err(e.into());
    }

    info!("👋 Servidor terminado");
    Ok(())
}

/// Señal de apagado graceful
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("❌ No se pudo instalar el handler de Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!("❌ No se pudo instalar el handler de SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("🛑 Señal Ctrl+C recibida, apagando servidor...");
        },
        _ = terminate => {
            info!("🛑 Señal de terminación recibida, apagando servidor...");
        },
    }
}
