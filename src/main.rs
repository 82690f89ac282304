use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use dotenvy::dotenv;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use fuel_ledger::config::{DatabaseConfig, EnvironmentConfig, StoreKind};
use fuel_ledger::database;
use fuel_ledger::repositories::{MemoryStore, PgStore, SeedData, Store};
use fuel_ledger::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Cargar variables de entorno
    dotenv().ok();

    // Configurar logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("⛽ Fuel Ledger - transacciones de flota, lealtad y turnos");

    let config = EnvironmentConfig::from_env().context("configuración inválida")?;
    let store = build_store(&config).await?;

    let addr: SocketAddr = config
        .server_url()
        .parse()
        .with_context(|| format!("dirección inválida {}", config.server_url()))?;
    let app = fuel_ledger::create_app(AppState::new(store, config));

    info!("🌐 Servidor iniciando en http://{}", addr);
    info!("🔍 Endpoints disponibles:");
    info!("   GET  /health");
    info!("   POST /api/fleet/transactions");
    info!("   PUT  /api/fleet/transactions/cancel");
    info!("   GET  /api/fleet/wallet");
    info!("   POST /api/loyalty/transactions");
    info!("   PUT  /api/loyalty/transactions/cancel");
    info!("   POST /api/loyalty/redemptions");
    info!("   PUT  /api/loyalty/redemptions/cancel");
    info!("   GET  /api/points/:cliente_id");
    info!("   POST /api/shifts");
    info!("   PUT  /api/shifts/close");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        error!("❌ Servidor terminó con error: {}", e);
        return Err(e.into());
    }

    info!("👋 Servidor terminado");
    Ok(())
}

async fn build_store(config: &EnvironmentConfig) -> Result<Arc<dyn Store>> {
    match config.store {
        StoreKind::Postgres => {
            let db_config = DatabaseConfig::from_env()?;
            let pool = database::connect(&db_config).await?;
            if config.run_migrations {
                database::run_migrations(&pool).await?;
            }
            Ok(Arc::new(PgStore::new(pool)))
        }
        StoreKind::Memory => {
            warn!("⚠️ Usando store en memoria: los datos se pierden al reiniciar");
            let seed = match &config.seed_file {
                Some(path) => SeedData::from_json_file(path)?,
                None => SeedData::default(),
            };
            Ok(Arc::new(MemoryStore::with_seed(seed).await?))
        }
    }
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
            Ok(mut stream) => {
                stream.recv().await;
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
