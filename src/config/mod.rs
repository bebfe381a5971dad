use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{name} has invalid value '{value}'")]
    Invalid { name: &'static str, value: String },
}

// Главная структура конфигурации - контейнер для всех настроек
#[derive(Debug, Clone)]
pub struct Config {
    pub app: AppConfig,
    pub store: StoreConfig,
    pub drafts: DraftConfig,
    pub catalog: CatalogConfig,
    pub users: UserDefaults,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

// Настройки приложения
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub environment: String,
    pub rust_log: String,
    pub log_format: LogFormat,
}

#[derive(Debug, Clone)]
pub enum StoreConfig {
    Postgres(DatabaseConfig),
    Remote(RemoteStoreConfig),
    Memory,
}

// Настройки базы данных
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub pool_size: u32,
}

// Внешний API бронирований + Circuit Breaker
#[derive(Debug, Clone)]
pub struct RemoteStoreConfig {
    pub base_url: String,
    pub timeout_seconds: u64,
    pub failure_threshold: u32,
    pub breaker_timeout_seconds: u64,
}

#[derive(Debug, Clone)]
pub enum DraftBackend {
    Redis { url: String },
    Memory,
}

#[derive(Debug, Clone)]
pub struct DraftConfig {
    pub backend: DraftBackend,
    pub ttl_seconds: u64,
}

#[derive(Debug, Clone)]
pub struct CatalogConfig {
    pub path: Option<PathBuf>,
}

// Пользователь по умолчанию, если запрос не передал X-User-Email
#[derive(Debug, Clone)]
pub struct UserDefaults {
    pub email: String,
    pub name: String,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Сборка конфига из произвольного источника переменных (удобно в тестах).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let vars = Vars { lookup };

        let log_format = match vars.or("LOG_FORMAT", "pretty").as_str() {
            "pretty" => LogFormat::Pretty,
            "json" => LogFormat::Json,
            other => return Err(ConfigError::Invalid { name: "LOG_FORMAT", value: other.to_string() }),
        };

        let store = match vars.or("BOOKING_STORE", "memory").as_str() {
            "postgres" => StoreConfig::Postgres(DatabaseConfig {
                url: vars.required("DATABASE_URL")?,
                pool_size: vars.parse_or("DB_POOL_SIZE", 20)?,
            }),
            "remote" => StoreConfig::Remote(RemoteStoreConfig {
                base_url: vars.or("BOOKING_API_URL", "http://localhost:3001/api"),
                timeout_seconds: vars.parse_or("BOOKING_API_TIMEOUT_SECONDS", 10)?,
                failure_threshold: vars.parse_or("CIRCUIT_BREAKER_FAILURE_THRESHOLD", 5)?,
                breaker_timeout_seconds: vars.parse_or("CIRCUIT_BREAKER_TIMEOUT_SECONDS", 60)?,
            }),
            "memory" => StoreConfig::Memory,
            other => return Err(ConfigError::Invalid { name: "BOOKING_STORE", value: other.to_string() }),
        };

        let backend = match vars.or("DRAFT_CACHE", "memory").as_str() {
            "redis" => DraftBackend::Redis { url: vars.required("REDIS_URL")? },
            "memory" => DraftBackend::Memory,
            other => return Err(ConfigError::Invalid { name: "DRAFT_CACHE", value: other.to_string() }),
        };

        Ok(Config {
            app: AppConfig {
                host: vars.or("HOST", "0.0.0.0"),
                port: vars.parse_or("PORT", 8000)?,
                environment: vars.or("ENVIRONMENT", "development"),
                rust_log: vars.or("RUST_LOG", "seat_booking=debug,tower_http=debug"),
                log_format,
            },
            store,
            drafts: DraftConfig {
                backend,
                ttl_seconds: vars.parse_or("DRAFT_TTL_SECONDS", 1800)?,
            },
            catalog: CatalogConfig {
                path: (vars.lookup)("CATALOG_PATH").map(PathBuf::from),
            },
            users: UserDefaults {
                email: vars.or("DEFAULT_USER_EMAIL", "test@example.com"),
                name: vars.or("DEFAULT_USER_NAME", "Test User"),
            },
        })
    }
}

struct Vars<F> {
    lookup: F,
}

impl<F> Vars<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn or(&self, name: &str, default: &str) -> String {
        (self.lookup)(name).unwrap_or_else(|| default.to_string())
    }

    fn required(&self, name: &'static str) -> Result<String, ConfigError> {
        (self.lookup)(name).ok_or(ConfigError::Missing(name))
    }

    fn parse_or<T: FromStr>(&self, name: &'static str, default: T) -> Result<T, ConfigError> {
        match (self.lookup)(name) {
            Some(value) => value.parse().map_err(|_| ConfigError::Invalid { name, value }),
            None => Ok(default),
        }
    }
}
