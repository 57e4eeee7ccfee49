use anyhow::Context;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub database: DatabaseConfig,
    pub public_server: ServerConfig,
    pub admin_server: ServerConfig,
    pub auth: AuthConfig,
    pub cache: CacheConfig,
    pub analytics: AnalyticsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub backend: DatabaseBackend,
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseBackend {
    Sqlite,
    Postgres,
    /// Process-local maps, lost on restart
    Memory,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// When false every admin request is allowed
    pub enabled: bool,
    #[serde(default)]
    pub api_keys: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Maximum number of slug lookups kept in memory
    pub profile_max_entries: u64,
    pub profile_ttl_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyticsConfig {
    /// How often expired view sessions are purged
    pub session_sweep_interval_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            profile_max_entries: 10_000,
            profile_ttl_secs: 60,
        }
    }
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            session_sweep_interval_secs: 3600,
        }
    }
}

fn env_or<T: std::str::FromStr>(name: &str, default: T) -> anyhow::Result<T>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(name) {
        Ok(value) => value
            .parse::<T>()
            .with_context(|| format!("{name} has an invalid value '{value}'")),
        Err(_) => Ok(default),
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let backend_str =
            std::env::var("DATABASE_BACKEND").unwrap_or_else(|_| "sqlite".to_string());

        let backend = match backend_str.to_lowercase().as_str() {
            "postgres" | "postgresql" => DatabaseBackend::Postgres,
            "memory" => DatabaseBackend::Memory,
            "sqlite" => DatabaseBackend::Sqlite,
            other => {
                tracing::warn!(
                    "Unknown DATABASE_BACKEND '{other}', falling back to 'sqlite'. Supported values: sqlite, postgres, memory"
                );
                DatabaseBackend::Sqlite
            }
        };

        let database_url = std::env::var("DATABASE_URL")
            .unwrap_or_else(|_| "sqlite://./invite-analytics.db?mode=rwc".to_string());
        let max_connections = env_or("DATABASE_MAX_CONNECTIONS", 10u32)?;

        let public_host = std::env::var("PUBLIC_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let public_port = env_or("PUBLIC_PORT", 8000u16)?;

        let admin_host = std::env::var("ADMIN_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let admin_port = env_or("ADMIN_PORT", 8001u16)?;

        let auth_disabled = std::env::var("ADMIN_AUTH_DISABLED")
            .map(|v| matches!(v.to_lowercase().as_str(), "true" | "1" | "yes"))
            .unwrap_or(false);

        let api_keys = std::env::var("ADMIN_API_KEYS")
            .map(|v| {
                v.split(',')
                    .map(str::trim)
                    .filter(|k| !k.is_empty())
                    .map(str::to_string)
                    .collect::<Vec<_>>()
            })
            .unwrap_or_default();

        let cache_defaults = CacheConfig::default();
        let analytics_defaults = AnalyticsConfig::default();

        Ok(Config {
            database: DatabaseConfig {
                backend,
                url: database_url,
                max_connections,
            },
            public_server: ServerConfig {
                host: public_host,
                port: public_port,
            },
            admin_server: ServerConfig {
                host: admin_host,
                port: admin_port,
            },
            auth: AuthConfig {
                enabled: !auth_disabled,
                api_keys,
            },
            cache: CacheConfig {
                profile_max_entries: env_or(
                    "PROFILE_CACHE_MAX_ENTRIES",
                    cache_defaults.profile_max_entries,
                )?,
                profile_ttl_secs: env_or("PROFILE_CACHE_TTL_SECS", cache_defaults.profile_ttl_secs)?,
            },
            analytics: AnalyticsConfig {
                session_sweep_interval_secs: env_or(
                    "SESSION_SWEEP_INTERVAL_SECS",
                    analytics_defaults.session_sweep_interval_secs,
                )?,
            },
        })
    }
}
