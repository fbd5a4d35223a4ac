// Copyright (c) 2026 FishTrail
// SPDX-License-Identifier: AGPL-3.0

//! Core Configuration
//!
//! Loaded from a YAML file (`fishtrail-config.yaml` by convention), with
//! environment variables taking precedence for the values that differ per
//! deployment: `DATABASE_URL` and `GEOSERVER_URL`. Selects the storage
//! backend the repositories are built from at startup.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::domain::repository::{PostgresConfig, StorageBackend};

fn default_max_connections() -> u32 {
    5
}

fn default_geoserver_url() -> String {
    "https://gis.fishtrail.example".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageKind {
    Memory,
    Postgres,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageSettings {
    pub backend: StorageKind,
    #[serde(default)]
    pub connection_string: Option<String>,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeoSettings {
    #[serde(default = "default_geoserver_url")]
    pub server_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoreConfig {
    pub storage: StorageSettings,
    #[serde(default)]
    pub geo: GeoSettings,
}

impl Default for GeoSettings {
    fn default() -> Self {
        Self {
            server_url: default_geoserver_url(),
        }
    }
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            storage: StorageSettings {
                backend: StorageKind::Memory,
                connection_string: None,
                max_connections: default_max_connections(),
            },
            geo: GeoSettings::default(),
        }
    }
}

impl CoreConfig {
    /// Parse a YAML config file, then apply environment overrides.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref()).with_context(|| {
            format!("Failed to read config file {}", path.as_ref().display())
        })?;
        let mut config: CoreConfig =
            serde_yaml::from_str(&raw).context("Invalid config file")?;
        config.apply_env();
        Ok(config)
    }

    /// Defaults plus environment overrides, for deployments with no file.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env();
        config
    }

    fn apply_env(&mut self) {
        if let Ok(url) = std::env::var("DATABASE_URL") {
            self.storage.backend = StorageKind::Postgres;
            self.storage.connection_string = Some(url);
        }
        if let Ok(url) = std::env::var("GEOSERVER_URL") {
            self.geo.server_url = url;
        }
    }

    /// The storage backend the repositories should be built from.
    pub fn storage_backend(&self) -> Result<StorageBackend> {
        match self.storage.backend {
            StorageKind::Memory => Ok(StorageBackend::InMemory),
            StorageKind::Postgres => {
                let connection_string = self
                    .storage
                    .connection_string
                    .clone()
                    .context("Postgres backend selected but no connection string set")?;
                Ok(StorageBackend::Postgres(PostgresConfig {
                    connection_string,
                    max_connections: self.storage.max_connections,
                }))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_select_memory_backend() {
        let config = CoreConfig::default();
        assert!(matches!(
            config.storage_backend().unwrap(),
            StorageBackend::InMemory
        ));
    }

    #[test]
    fn test_load_postgres_config_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "storage:\n  backend: postgres\n  connection_string: postgres://fishtrail@localhost/fishtrail\n  max_connections: 12\ngeo:\n  server_url: https://gis.example.lt"
        )
        .unwrap();

        let config = CoreConfig::load(file.path()).unwrap();
        match config.storage_backend().unwrap() {
            StorageBackend::Postgres(pg) => {
                assert_eq!(
                    pg.connection_string,
                    "postgres://fishtrail@localhost/fishtrail"
                );
                assert_eq!(pg.max_connections, 12);
            }
            other => panic!("Expected postgres backend, got {:?}", other),
        }
        assert_eq!(config.geo.server_url, "https://gis.example.lt");
    }

    #[test]
    fn test_postgres_without_connection_string_is_rejected() {
        let config = CoreConfig {
            storage: StorageSettings {
                backend: StorageKind::Postgres,
                connection_string: None,
                max_connections: 5,
            },
            geo: GeoSettings::default(),
        };
        assert!(config.storage_backend().is_err());
    }
}
