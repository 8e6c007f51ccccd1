//! Settings for the storefront applications.
//!
//! This module provides the [`Settings`] struct, loadable from a TOML file or
//! constructed with defaults. All fields have sensible defaults so a bare
//! `Settings::default()` is enough for development and tests.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{StoreError, StoreResult};

/// Database connection configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseSettings {
    /// The database engine ("sqlite" or "postgres").
    pub engine: String,
    /// The database name (or file path for SQLite; ":memory:" is accepted).
    pub name: String,
    /// The database user.
    pub user: String,
    /// The database password.
    pub password: String,
    /// The database host.
    pub host: String,
    /// The database port.
    pub port: u16,
    /// Additional engine-specific options.
    pub options: HashMap<String, String>,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            engine: "sqlite".to_string(),
            name: "storefront.sqlite3".to_string(),
            user: String::new(),
            password: String::new(),
            host: String::new(),
            port: 0,
            options: HashMap::new(),
        }
    }
}

/// The complete application settings.
///
/// # Examples
///
/// ```
/// use storefront_core::settings::Settings;
///
/// let settings = Settings::default();
/// assert!(settings.debug);
/// assert_eq!(settings.database.engine, "sqlite");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Whether debug mode is enabled. Controls log formatting.
    pub debug: bool,
    /// The tracing filter directive (e.g. "info", "storefront_orm=debug").
    pub log_level: String,
    /// The site name rendered on the landing page.
    pub site_name: String,
    /// The address the HTTP server binds to.
    pub bind_address: String,
    /// Database connection configuration.
    pub database: DatabaseSettings,
    /// Directory searched for template files.
    pub templates_dir: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            debug: true,
            log_level: "info".to_string(),
            site_name: "Storefront".to_string(),
            bind_address: "127.0.0.1:8000".to_string(),
            database: DatabaseSettings::default(),
            templates_dir: PathBuf::from("templates"),
        }
    }
}

impl Settings {
    /// Loads settings from a TOML file.
    ///
    /// Missing keys fall back to their defaults, so a partial file is valid.
    pub fn from_toml_file(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        toml::from_str(&contents).map_err(|e| {
            StoreError::ConfigurationError(format!("failed to parse {}: {e}", path.display()))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert!(settings.debug);
        assert_eq!(settings.log_level, "info");
        assert_eq!(settings.database.engine, "sqlite");
        assert_eq!(settings.bind_address, "127.0.0.1:8000");
    }

    #[test]
    fn test_partial_toml_falls_back_to_defaults() {
        let parsed: Settings = toml::from_str(
            r#"
            debug = false
            site_name = "Shop"

            [database]
            name = ":memory:"
            "#,
        )
        .unwrap();
        assert!(!parsed.debug);
        assert_eq!(parsed.site_name, "Shop");
        assert_eq!(parsed.database.name, ":memory:");
        // Untouched keys keep their defaults.
        assert_eq!(parsed.database.engine, "sqlite");
        assert_eq!(parsed.log_level, "info");
    }

    #[test]
    fn test_postgres_database_settings() {
        let parsed: DatabaseSettings = toml::from_str(
            r#"
            engine = "postgres"
            name = "storefront"
            host = "localhost"
            port = 5432
            user = "store"
            password = "secret"
            "#,
        )
        .unwrap();
        assert_eq!(parsed.engine, "postgres");
        assert_eq!(parsed.port, 5432);
    }

    #[test]
    fn test_from_toml_file_missing() {
        let result = Settings::from_toml_file("/nonexistent/settings.toml");
        assert!(result.is_err());
    }
}
