use std::env;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;

use tablekeeper_core::AppError;
use tablekeeper_domain::NamespacePrefix;
use tracing_subscriber::EnvFilter;

/// Where catalog, permission and audit data live.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogBackend {
    Postgres,
    Memory,
}

impl FromStr for CatalogBackend {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "postgres" => Ok(Self::Postgres),
            "memory" => Ok(Self::Memory),
            other => Err(AppError::Validation(format!(
                "CATALOG_BACKEND must be either 'postgres' or 'memory', got '{other}'"
            ))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub migrate_only: bool,
    pub catalog_backend: CatalogBackend,
    pub database_url: Option<String>,
    pub frontend_url: String,
    pub bootstrap_token: String,
    pub _session_secret: String,
    pub api_host: String,
    pub api_port: u16,
    pub cookie_secure: bool,
    pub table_prefix: NamespacePrefix,
    pub catalog_schema: String,
    pub core_tables: Vec<String>,
    pub active_extensions: Vec<String>,
    pub must_use_extensions: Vec<String>,
}

impl ApiConfig {
    pub fn load() -> Result<Self, AppError> {
        let migrate_only = env::args().nth(1).as_deref() == Some("migrate");

        let catalog_backend = env::var("CATALOG_BACKEND")
            .unwrap_or_else(|_| "postgres".to_owned())
            .parse::<CatalogBackend>()?;
        let database_url = match catalog_backend {
            CatalogBackend::Postgres => Some(required_non_empty_env("DATABASE_URL")?),
            CatalogBackend::Memory => env::var("DATABASE_URL").ok(),
        };
        if migrate_only && catalog_backend == CatalogBackend::Memory {
            return Err(AppError::Validation(
                "migrate requires CATALOG_BACKEND=postgres".to_owned(),
            ));
        }

        let frontend_url =
            env::var("FRONTEND_URL").unwrap_or_else(|_| "http://localhost:3000".to_owned());
        let bootstrap_token = required_non_empty_env("AUTH_BOOTSTRAP_TOKEN")?;
        let session_secret = required_env("SESSION_SECRET")?;
        if session_secret.len() < 32 {
            return Err(AppError::Validation(
                "SESSION_SECRET must be at least 32 characters".to_owned(),
            ));
        }

        let api_host = env::var("API_HOST").unwrap_or_else(|_| "127.0.0.1".to_owned());
        let api_port = env::var("API_PORT")
            .ok()
            .and_then(|value| value.parse::<u16>().ok())
            .unwrap_or(3001);
        let cookie_secure = env::var("SESSION_COOKIE_SECURE")
            .unwrap_or_else(|_| "false".to_owned())
            .eq_ignore_ascii_case("true");

        let table_prefix = NamespacePrefix::new(
            env::var("TABLE_PREFIX").unwrap_or_else(|_| "wp_".to_owned()),
        )
        .map_err(|error| AppError::Validation(format!("invalid TABLE_PREFIX: {error}")))?;
        let catalog_schema = env::var("CATALOG_SCHEMA")
            .ok()
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(|| "public".to_owned());

        Ok(Self {
            migrate_only,
            catalog_backend,
            database_url,
            frontend_url,
            bootstrap_token,
            _session_secret: session_secret,
            api_host,
            api_port,
            cookie_secure,
            table_prefix,
            catalog_schema,
            core_tables: list_env("CORE_TABLES"),
            active_extensions: list_env("ACTIVE_EXTENSIONS"),
            must_use_extensions: list_env("MUST_USE_EXTENSIONS"),
        })
    }

    pub fn socket_address(&self) -> Result<SocketAddr, AppError> {
        let host = IpAddr::from_str(&self.api_host).map_err(|error| {
            AppError::Internal(format!("invalid API_HOST '{}': {error}", self.api_host))
        })?;
        Ok(SocketAddr::from((host, self.api_port)))
    }
}

pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}

fn required_env(name: &str) -> Result<String, AppError> {
    env::var(name).map_err(|_| AppError::Validation(format!("{name} is required")))
}

fn required_non_empty_env(name: &str) -> Result<String, AppError> {
    let value = required_env(name)?;
    if value.trim().is_empty() {
        return Err(AppError::Validation(format!("{name} must not be empty")));
    }

    Ok(value)
}

fn list_env(name: &str) -> Vec<String> {
    env::var(name)
        .map(|value| split_list(value.as_str()))
        .unwrap_or_default()
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(ToOwned::to_owned)
        .collect()
}
