//! Configuration layer: typed settings with layered precedence (file → env → CLI).

mod cli;

pub use cli::{
    CliArgs, Command, CreateUserArgs, DatabaseOverride, MigrateArgs, ServeArgs, ServeOverrides,
};

use std::{net::SocketAddr, num::NonZeroU32, str::FromStr, time::Duration};

use clap::Parser;
use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use tracing::level_filters::LevelFilter;

use crate::cache::CacheBackendKind;

const DEFAULT_CONFIG_BASENAME: &str = "config/default";
const LOCAL_CONFIG_BASENAME: &str = "microblog";
const ENV_PREFIX: &str = "MICROBLOG";
const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 8000;
const DEFAULT_GRACEFUL_SHUTDOWN_SECS: u64 = 30;
const DEFAULT_DB_MAX_CONNECTIONS: u32 = 8;
const DEFAULT_DB_ACQUIRE_TIMEOUT_SECS: u64 = 5;
const DEFAULT_CACHE_BACKEND: &str = "memory";
const DEFAULT_REDIS_URL: &str = "redis://127.0.0.1:6379/0";
const DEFAULT_CACHE_KEY_PREFIX: &str = "microblog:";
const DEFAULT_CACHE_CONNECT_TIMEOUT_MS: u64 = 5000;
const DEFAULT_CACHE_RESPONSE_TIMEOUT_MS: u64 = 5000;
const DEFAULT_CACHE_LIST_TTL_SECS: u64 = 60;
const DEFAULT_CACHE_ITEM_TTL_SECS: u64 = 300;
const DEFAULT_CACHE_MEMORY_CAPACITY: u64 = 1024;

/// Fully-resolved deployment settings after precedence resolution and validation.
#[derive(Debug, Clone)]
pub struct Settings {
    pub server: ServerSettings,
    pub logging: LoggingSettings,
    pub database: DatabaseSettings,
    pub cache: CacheSettings,
    pub health: HealthSettings,
}

#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub addr: SocketAddr,
    pub graceful_shutdown: Duration,
}

#[derive(Debug, Clone)]
pub struct LoggingSettings {
    pub level: LevelFilter,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy)]
pub enum LogFormat {
    Json,
    Compact,
}

#[derive(Debug, Clone)]
pub struct DatabaseSettings {
    pub url: Option<String>,
    pub max_connections: NonZeroU32,
    pub acquire_timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct CacheSettings {
    pub backend: CacheBackendKind,
    pub key_prefix: String,
    pub connect_timeout: Duration,
    pub response_timeout: Duration,
    pub list_ttl: Duration,
    pub item_ttl: Duration,
    pub memory_capacity: NonZeroU32,
}

#[derive(Debug, Clone)]
pub struct HealthSettings {
    /// Reported as `version` by the health probe.
    pub version: String,
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to build configuration: {0}")]
    Build(#[from] config::ConfigError),
    #[error("invalid configuration for `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl LoadError {
    fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            reason: reason.into(),
        }
    }
}

/// Load settings using the configured precedence (file → environment → CLI).
pub fn load(cli: &CliArgs) -> Result<Settings, LoadError> {
    let mut builder = Config::builder()
        .add_source(File::with_name(DEFAULT_CONFIG_BASENAME).required(false))
        .add_source(File::with_name(LOCAL_CONFIG_BASENAME).required(false));

    if let Some(path) = cli.config_file.as_ref() {
        builder = builder.add_source(File::from(path.as_path()).required(true));
    }

    builder = builder.add_source(Environment::with_prefix(ENV_PREFIX).separator("__"));

    let mut raw: RawSettings = builder.build()?.try_deserialize()?;

    match cli.command.as_ref() {
        Some(Command::Serve(args)) => raw.apply_serve_overrides(&args.overrides),
        Some(Command::Migrate(args)) => raw.apply_database_override(&args.database),
        Some(Command::CreateUser(args)) => raw.apply_database_override(&args.database),
        None => raw.apply_serve_overrides(&ServeOverrides::default()),
    }

    Settings::from_raw(raw)
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSettings {
    server: RawServerSettings,
    logging: RawLoggingSettings,
    database: RawDatabaseSettings,
    cache: RawCacheSettings,
    health: RawHealthSettings,
}

impl RawSettings {
    fn apply_serve_overrides(&mut self, overrides: &ServeOverrides) {
        if let Some(host) = overrides.server_host.as_ref() {
            self.server.host = Some(host.clone());
        }
        if let Some(port) = overrides.server_port {
            self.server.port = Some(port);
        }
        if let Some(seconds) = overrides.server_graceful_shutdown_seconds {
            self.server.graceful_shutdown_seconds = Some(seconds);
        }
        if let Some(level) = overrides.log_level.as_ref() {
            self.logging.level = Some(level.clone());
        }
        if let Some(json) = overrides.log_json {
            self.logging.json = Some(json);
        }
        if let Some(max) = overrides.database_max_connections {
            self.database.max_connections = Some(max);
        }
        if let Some(backend) = overrides.cache_backend.as_ref() {
            self.cache.backend = Some(backend.clone());
        }
        if let Some(url) = overrides.cache_redis_url.as_ref() {
            self.cache.redis_url = Some(url.clone());
        }

        self.apply_database_override(&overrides.database);
    }

    fn apply_database_override(&mut self, overrides: &DatabaseOverride) {
        if let Some(url) = overrides.database_url.as_ref() {
            self.database.url = Some(url.clone());
        }
    }
}

impl Settings {
    fn from_raw(raw: RawSettings) -> Result<Self, LoadError> {
        let RawSettings {
            server,
            logging,
            database,
            cache,
            health,
        } = raw;

        Ok(Self {
            server: build_server_settings(server)?,
            logging: build_logging_settings(logging)?,
            database: build_database_settings(database)?,
            cache: build_cache_settings(cache)?,
            health: build_health_settings(health),
        })
    }
}

fn build_server_settings(server: RawServerSettings) -> Result<ServerSettings, LoadError> {
    let host = server.host.unwrap_or_else(|| DEFAULT_HOST.to_string());

    let port = server.port.unwrap_or(DEFAULT_PORT);
    if port == 0 {
        return Err(LoadError::invalid(
            "server.port",
            "port must be greater than zero",
        ));
    }

    let addr =
        parse_socket_addr(&host, port).map_err(|reason| LoadError::invalid("server.addr", reason))?;

    let graceful_secs = server
        .graceful_shutdown_seconds
        .unwrap_or(DEFAULT_GRACEFUL_SHUTDOWN_SECS);
    if graceful_secs == 0 {
        return Err(LoadError::invalid(
            "server.graceful_shutdown_seconds",
            "must be greater than zero",
        ));
    }

    Ok(ServerSettings {
        addr,
        graceful_shutdown: Duration::from_secs(graceful_secs),
    })
}

fn build_logging_settings(logging: RawLoggingSettings) -> Result<LoggingSettings, LoadError> {
    let level = match logging.level {
        Some(level) => LevelFilter::from_str(level.as_str()).map_err(|err| {
            LoadError::invalid("logging.level", format!("failed to parse: {err}"))
        })?,
        None => LevelFilter::INFO,
    };

    let format = if logging.json.unwrap_or(false) {
        LogFormat::Json
    } else {
        LogFormat::Compact
    };

    Ok(LoggingSettings { level, format })
}

fn build_database_settings(database: RawDatabaseSettings) -> Result<DatabaseSettings, LoadError> {
    let url = non_blank(database.url);

    let max_connections = non_zero_u32(
        database
            .max_connections
            .unwrap_or(DEFAULT_DB_MAX_CONNECTIONS)
            .into(),
        "database.max_connections",
    )?;
    let acquire_timeout = positive_duration(
        database
            .acquire_timeout_seconds
            .unwrap_or(DEFAULT_DB_ACQUIRE_TIMEOUT_SECS),
        Duration::from_secs,
        "database.acquire_timeout_seconds",
    )?;

    Ok(DatabaseSettings {
        url,
        max_connections,
        acquire_timeout,
    })
}

fn build_cache_settings(cache: RawCacheSettings) -> Result<CacheSettings, LoadError> {
    let backend_name = cache
        .backend
        .unwrap_or_else(|| DEFAULT_CACHE_BACKEND.to_string());
    let backend = match backend_name.trim().to_ascii_lowercase().as_str() {
        "memory" => CacheBackendKind::Memory,
        "redis" => CacheBackendKind::Redis {
            url: non_blank(cache.redis_url).unwrap_or_else(|| DEFAULT_REDIS_URL.to_string()),
        },
        other => {
            return Err(LoadError::invalid(
                "cache.backend",
                format!("unknown backend `{other}`, expected `memory` or `redis`"),
            ));
        }
    };

    let connect_timeout = positive_duration(
        cache
            .connect_timeout_ms
            .unwrap_or(DEFAULT_CACHE_CONNECT_TIMEOUT_MS),
        Duration::from_millis,
        "cache.connect_timeout_ms",
    )?;
    let response_timeout = positive_duration(
        cache
            .response_timeout_ms
            .unwrap_or(DEFAULT_CACHE_RESPONSE_TIMEOUT_MS),
        Duration::from_millis,
        "cache.response_timeout_ms",
    )?;
    let list_ttl = positive_duration(
        cache.list_ttl_seconds.unwrap_or(DEFAULT_CACHE_LIST_TTL_SECS),
        Duration::from_secs,
        "cache.list_ttl_seconds",
    )?;
    let item_ttl = positive_duration(
        cache.item_ttl_seconds.unwrap_or(DEFAULT_CACHE_ITEM_TTL_SECS),
        Duration::from_secs,
        "cache.item_ttl_seconds",
    )?;
    let memory_capacity = non_zero_u32(
        cache
            .memory_capacity
            .unwrap_or(DEFAULT_CACHE_MEMORY_CAPACITY),
        "cache.memory_capacity",
    )?;

    Ok(CacheSettings {
        backend,
        key_prefix: cache
            .key_prefix
            .unwrap_or_else(|| DEFAULT_CACHE_KEY_PREFIX.to_string()),
        connect_timeout,
        response_timeout,
        list_ttl,
        item_ttl,
        memory_capacity,
    })
}

fn build_health_settings(health: RawHealthSettings) -> HealthSettings {
    HealthSettings {
        version: non_blank(health.version)
            .unwrap_or_else(|| env!("CARGO_PKG_VERSION").to_string()),
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawServerSettings {
    host: Option<String>,
    port: Option<u16>,
    graceful_shutdown_seconds: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawLoggingSettings {
    level: Option<String>,
    json: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawDatabaseSettings {
    url: Option<String>,
    max_connections: Option<u32>,
    acquire_timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawCacheSettings {
    backend: Option<String>,
    redis_url: Option<String>,
    key_prefix: Option<String>,
    connect_timeout_ms: Option<u64>,
    response_timeout_ms: Option<u64>,
    list_ttl_seconds: Option<u64>,
    item_ttl_seconds: Option<u64>,
    memory_capacity: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawHealthSettings {
    version: Option<String>,
}

fn parse_socket_addr(host: &str, port: u16) -> Result<SocketAddr, String> {
    let candidate = format!("{host}:{port}");
    candidate
        .parse()
        .map_err(|err| format!("invalid address `{candidate}`: {err}"))
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.and_then(|value| {
        let trimmed = value.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    })
}

fn non_zero_u32(value: u64, key: &'static str) -> Result<NonZeroU32, LoadError> {
    if value == 0 {
        return Err(LoadError::invalid(key, "must be greater than zero"));
    }
    let value_u32: u32 = value
        .try_into()
        .map_err(|_| LoadError::invalid(key, "value exceeds supported range for u32"))?;
    NonZeroU32::new(value_u32).ok_or_else(|| LoadError::invalid(key, "must be greater than zero"))
}

fn positive_duration(
    value: u64,
    unit: fn(u64) -> Duration,
    key: &'static str,
) -> Result<Duration, LoadError> {
    if value == 0 {
        return Err(LoadError::invalid(key, "must be greater than zero"));
    }
    Ok(unit(value))
}

/// Resolve configuration using the supplied CLI arguments, returning both for downstream use.
pub fn load_with_cli() -> Result<(CliArgs, Settings), LoadError> {
    let args = CliArgs::parse();
    let settings = load(&args)?;
    Ok((args, settings))
}
