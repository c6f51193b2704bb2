use std::path::PathBuf;

use common::storage::s3::S3Config;
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct CorsConfig {
    pub allow_origins: Vec<String>,
    pub max_age: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub cors: CorsConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    /// Postgres `sslmode` override (`disable`, `require`, ...). Ignored for SQLite.
    #[serde(default)]
    pub ssl_mode: Option<String>,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_max_connections() -> u32 {
    10
}

impl DatabaseConfig {
    /// Connection URL with the configured SSL mode applied.
    pub fn connection_url(&self) -> String {
        let is_postgres = self.url.starts_with("postgres://") || self.url.starts_with("postgresql://");
        match &self.ssl_mode {
            Some(mode) if is_postgres && !self.url.contains("sslmode=") => {
                let separator = if self.url.contains('?') { '&' } else { '?' };
                format!("{}{separator}sslmode={mode}", self.url)
            }
            _ => self.url.clone(),
        }
    }
}

/// Administrator credentials. Either `password_hash` (Argon2 PHC string)
/// or `password` must be set together with `username`.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct AdminConfig {
    pub username: Option<String>,
    pub password: Option<String>,
    pub password_hash: Option<String>,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Filesystem,
    S3,
    /// File uploads are disabled; URL submissions still work.
    None,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    /// Root directory for the filesystem backend.
    pub path: PathBuf,
    /// Maximum accepted upload size in bytes.
    pub max_blob_size: u64,
    #[serde(default)]
    pub s3: Option<S3Config>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Filesystem,
            path: PathBuf::from("./uploads"),
            max_blob_size: 20 * 1024 * 1024,
            s3: None,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    #[serde(default)]
    pub admin: AdminConfig,
    pub storage: StorageConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let s = Config::builder()
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 3000)?
            .set_default("server.cors.allow_origins", Vec::<String>::new())?
            .set_default("server.cors.max_age", 3600)?
            .set_default("database.url", "sqlite://gallery.db?mode=rwc")?
            .set_default("storage.backend", "filesystem")?
            .set_default("storage.path", "./uploads")?
            .set_default("storage.max_blob_size", 20 * 1024 * 1024)?
            // Load from config/config.toml
            .add_source(File::with_name("config/config").required(false))
            // Override from environment (e.g., GALLERY__ADMIN__PASSWORD)
            .add_source(
                Environment::with_prefix("GALLERY")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("server.cors.allow_origins")
                    .try_parsing(true),
            )
            .build()?;

        s.try_deserialize()
    }
}
