//! Configuración de base de datos
//!
//! Este módulo maneja la configuración del pool de PostgreSQL con SQLx.

use std::env;
use std::time::Duration;

use sqlx::postgres::{PgPool, PgPoolOptions};

use super::environment::ConfigError;

/// Configuración de la base de datos
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout: Duration,
    pub idle_timeout: Duration,
    pub max_lifetime: Duration,
}

impl DatabaseConfig {
    /// `DATABASE_URL` es obligatoria; el tamaño del pool tiene valores por defecto
    pub fn from_env() -> Result<Self, ConfigError> {
        let url = env::var("DATABASE_URL").map_err(|_| ConfigError::Missing { name: "DATABASE_URL" })?;

        Ok(Self {
            url,
            max_connections: env_number("DATABASE_MAX_CONNECTIONS", 20)?,
            min_connections: env_number("DATABASE_MIN_CONNECTIONS", 2)?,
            acquire_timeout: Duration::from_secs(env_number("DATABASE_ACQUIRE_TIMEOUT_SECS", 30)?),
            idle_timeout: Duration::from_secs(env_number("DATABASE_IDLE_TIMEOUT_SECS", 300)?),
            max_lifetime: Duration::from_secs(env_number("DATABASE_MAX_LIFETIME_SECS", 3600)?),
        })
    }

    /// Crear un nuevo pool de conexiones
    pub async fn create_pool(&self) -> Result<PgPool, sqlx::Error> {
        PgPoolOptions::new()
            .max_connections(self.max_connections)
            .min_connections(self.min_connections)
            .acquire_timeout(self.acquire_timeout)
            .idle_timeout(self.idle_timeout)
            .max_lifetime(self.max_lifetime)
            .connect(&self.url)
            .await
    }
}

fn env_number<T: std::str::FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value }),
        Err(_) => Ok(default),
    }
}
