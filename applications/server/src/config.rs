/// Server configuration
use crate::error::{Result, ServerError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_server")]
    pub server: ServerSettings,

    #[serde(default = "default_storage")]
    pub storage: StorageSettings,

    #[serde(default = "default_auth")]
    pub auth: AuthSettings,

    #[serde(default = "default_catalog")]
    pub catalog: CatalogSettings,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageSettings {
    #[serde(default = "default_database_url")]
    pub database_url: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AuthSettings {
    #[serde(default)]
    pub jwt_secret: String,

    #[serde(default = "default_jwt_expiration_hours")]
    pub jwt_expiration_hours: u64,
}

/// Spotify-compatible track metadata API
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CatalogSettings {
    #[serde(default = "default_catalog_url")]
    pub base_url: String,

    /// Without a token every lookup reports the catalog as unavailable
    #[serde(default)]
    pub access_token: Option<String>,

    #[serde(default = "default_catalog_timeout")]
    pub timeout_secs: u64,
}

impl ServerConfig {
    /// Load from `config.toml` (if present) and `NEST_*` environment variables
    pub fn load() -> Result<Self> {
        Self::load_from(Path::new("config.toml"))
    }

    /// Load from an explicit file path, then apply environment overrides
    pub fn load_from(config_path: &Path) -> Result<Self> {
        Self::load_with(config_path, Self::environment())
    }

    /// NEST_AUTH__JWT_SECRET -> auth.jwt_secret
    fn environment() -> config::Environment {
        config::Environment::with_prefix("NEST")
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true)
    }

    fn load_with(config_path: &Path, environment: config::Environment) -> Result<Self> {
        let mut settings = config::Config::builder();

        if config_path.exists() {
            settings = settings.add_source(config::File::from(config_path.to_path_buf()));
        }
        settings = settings.add_source(environment);

        let config = settings
            .build()
            .map_err(|e| ServerError::Config(e.to_string()))?;

        config
            .try_deserialize()
            .map_err(|e| ServerError::Config(e.to_string()))
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.auth.jwt_secret.is_empty() {
            return Err(ServerError::Config(
                "JWT secret is required (set NEST_AUTH__JWT_SECRET)".to_string(),
            ));
        }

        if self.server.port == 0 {
            return Err(ServerError::Config("Port must be non-zero".to_string()));
        }

        if self.catalog.timeout_secs == 0 {
            return Err(ServerError::Config(
                "Catalog timeout must be at least one second".to_string(),
            ));
        }

        Ok(())
    }

    /// Directory that must exist before a file-backed SQLite URL can be opened
    pub fn database_dir(&self) -> Option<PathBuf> {
        let path = self.storage.database_url.strip_prefix("sqlite://")?;
        if path.starts_with(':') {
            return None;
        }
        Path::new(path)
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf)
    }
}

// Default values
fn default_server() -> ServerSettings {
    ServerSettings {
        host: default_host(),
        port: default_port(),
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3001
}

fn default_storage() -> StorageSettings {
    StorageSettings {
        database_url: default_database_url(),
    }
}

fn default_database_url() -> String {
    "sqlite://./data/nest.db".to_string()
}

fn default_auth() -> AuthSettings {
    AuthSettings {
        jwt_secret: String::new(),
        jwt_expiration_hours: default_jwt_expiration_hours(),
    }
}

fn default_jwt_expiration_hours() -> u64 {
    24
}

fn default_catalog() -> CatalogSettings {
    CatalogSettings {
        base_url: default_catalog_url(),
        access_token: None,
        timeout_secs: default_catalog_timeout(),
    }
}

fn default_catalog_url() -> String {
    "https://api.spotify.com".to_string()
}

fn default_catalog_timeout() -> u64 {
    10
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            server: default_server(),
            storage: default_storage(),
            auth: default_auth(),
            catalog: default_catalog(),
        }
    }
}
