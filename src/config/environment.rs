//! Configuración de variables de entorno
//!
//! Este módulo maneja la configuración del entorno. Toda variable tiene
//! un valor por defecto salvo las que solo aplican a PostgreSQL.

use std::env;
use std::str::FromStr;

use thiserror::Error;

/// Errores al leer la configuración
#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("{name} must be set")]
    Missing { name: &'static str },

    #[error("{name} has an invalid value '{value}'")]
    Invalid { name: &'static str, value: String },
}

/// Dónde vive el libro
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreKind {
    Postgres,
    Memory,
}

impl FromStr for StoreKind {
    type Err = ();

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(StoreKind::Postgres),
            "memory" => Ok(StoreKind::Memory),
            _ => Err(()),
        }
    }
}

/// Configuración del entorno
#[derive(Debug, Clone)]
pub struct EnvironmentConfig {
    pub environment: String,
    pub port: u16,
    pub host: String,
    pub cors_origins: Vec<String>,
    pub request_timeout_secs: u64,
    pub store: StoreKind,
    pub seed_file: Option<String>,
    pub run_migrations: bool,
    /// Política de saldo: con `false` un canje mayor al saldo se rechaza
    pub allow_negative_points: bool,
}

impl Default for EnvironmentConfig {
    fn default() -> Self {
        Self {
            environment: "development".to_string(),
            port: 3000,
            host: "0.0.0.0".to_string(),
            cors_origins: Vec::new(),
            request_timeout_secs: 30,
            store: StoreKind::Postgres,
            seed_file: None,
            run_migrations: true,
            allow_negative_points: true,
        }
    }
}

impl EnvironmentConfig {
    /// Lee la configuración del proceso
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Lee la configuración desde cualquier fuente de variables
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let var = |name: &'static str| lookup(name).filter(|v| !v.trim().is_empty());

        Ok(Self {
            environment: var("ENVIRONMENT").unwrap_or(defaults.environment),
            port: parse_or("PORT", var("PORT"), defaults.port)?,
            host: var("HOST").unwrap_or(defaults.host),
            cors_origins: var("CORS_ORIGINS")
                .map(|raw| {
                    raw.split(',')
                        .map(|s| s.trim().to_string())
                        .filter(|s| !s.is_empty())
                        .collect()
                })
                .unwrap_or_default(),
            request_timeout_secs: parse_or(
                "REQUEST_TIMEOUT_SECS",
                var("REQUEST_TIMEOUT_SECS"),
                defaults.request_timeout_secs,
            )?,
            store: match var("LEDGER_STORE") {
                Some(raw) => raw.parse().map_err(|_| ConfigError::Invalid {
                    name: "LEDGER_STORE",
                    value: raw.clone(),
                })?,
                None => defaults.store,
            },
            seed_file: var("LEDGER_SEED_FILE"),
            run_migrations: parse_bool_or("RUN_MIGRATIONS", var("RUN_MIGRATIONS"), defaults.run_migrations)?,
            allow_negative_points: parse_bool_or(
                "ALLOW_NEGATIVE_POINTS",
                var("ALLOW_NEGATIVE_POINTS"),
                defaults.allow_negative_points,
            )?,
        })
    }

    /// Verificar si estamos en modo desarrollo
    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }

    /// Verificar si estamos en modo producción
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    /// Obtener la dirección del servidor
    pub fn server_url(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_or<T: FromStr>(name: &'static str, raw: Option<String>, default: T) -> Result<T, ConfigError> {
    match raw {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value }),
        None => Ok(default),
    }
}

fn parse_bool_or(name: &'static str, raw: Option<String>, default: bool) -> Result<bool, ConfigError> {
    match raw {
        Some(value) => match value.trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" => Ok(true),
            "false" | "0" | "no" => Ok(false),
            _ => Err(ConfigError::Invalid { name, value }),
        },
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(vars: &[(&str, &str)]) -> Result<EnvironmentConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        EnvironmentConfig::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.port, 3000);
        assert_eq!(config.store, StoreKind::Postgres);
        assert!(config.allow_negative_points);
        assert!(config.is_development());
    }

    #[test]
    fn test_reads_values() {
        let config = config_from(&[
            ("ENVIRONMENT", "production"),
            ("PORT", "8080"),
            ("CORS_ORIGINS", "https://a.example, https://b.example"),
            ("LEDGER_STORE", "memory"),
            ("ALLOW_NEGATIVE_POINTS", "false"),
        ])
        .unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.cors_origins.len(), 2);
        assert_eq!(config.store, StoreKind::Memory);
        assert!(!config.allow_negative_points);
        assert!(config.is_production());
    }

    #[test]
    fn test_invalid_values_are_errors() {
        assert_eq!(
            config_from(&[("PORT", "abc")]).unwrap_err(),
            ConfigError::Invalid { name: "PORT", value: "abc".to_string() }
        );
        assert!(config_from(&[("LEDGER_STORE", "redis")]).is_err());
        assert!(config_from(&[("RUN_MIGRATIONS", "maybe")]).is_err());
    }
}
