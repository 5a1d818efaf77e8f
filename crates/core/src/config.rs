use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::allocator::{AllocatorSettings, AnnealingSchedule};
use crate::pricing::PriceSegment;
use crate::tier::TierThresholds;

#[derive(Clone, Debug, PartialEq)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub allocator: AllocatorConfig,
    pub price_segments: PriceSegmentConfig,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
    pub graceful_shutdown_secs: u64,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Debug, PartialEq)]
pub struct AllocatorConfig {
    pub iterations: u32,
    pub initial_temperature: f64,
    pub cooling_rate: f64,
    pub penalty_weight: f64,
    pub deadline_ms: Option<u64>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PriceSegmentConfig {
    pub refresh_interval_secs: u64,
    pub default_low: i64,
    pub default_mid: i64,
    pub default_high: i64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub database_url: Option<String>,
    pub log_level: Option<String>,
    pub server_port: Option<u16>,
    pub allocator_iterations: Option<u32>,
    pub allocator_deadline_ms: Option<u64>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        let schedule = AnnealingSchedule::default();
        let band = PriceSegment::default();
        Self {
            database: DatabaseConfig {
                url: "sqlite://dewy.db".to_string(),
                max_connections: 5,
                timeout_secs: 30,
            },
            server: ServerConfig {
                bind_address: "127.0.0.1".to_string(),
                port: 8080,
                graceful_shutdown_secs: 15,
            },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
            allocator: AllocatorConfig {
                iterations: schedule.iterations,
                initial_temperature: schedule.initial_temperature,
                cooling_rate: schedule.cooling_rate,
                penalty_weight: crate::allocator::DEFAULT_PENALTY_WEIGHT,
                deadline_ms: None,
            },
            price_segments: PriceSegmentConfig {
                refresh_interval_secs: 3_600,
                default_low: band.low,
                default_mid: band.mid,
                default_high: band.high,
            },
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl AllocatorConfig {
    pub fn settings(&self) -> AllocatorSettings {
        AllocatorSettings {
            schedule: AnnealingSchedule {
                iterations: self.iterations,
                initial_temperature: self.initial_temperature,
                cooling_rate: self.cooling_rate,
            },
            penalty_weight: self.penalty_weight,
            deadline: self.deadline_ms.map(Duration::from_millis),
            thresholds: TierThresholds::canonical(),
        }
    }
}

impl PriceSegmentConfig {
    pub fn default_band(&self) -> PriceSegment {
        PriceSegment::new(self.default_low, self.default_mid, self.default_high)
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs)
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected = options.config_path.unwrap_or_else(|| PathBuf::from("dewy.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(database) = patch.database {
            if let Some(url) = database.url {
                self.database.url = url;
            }
            if let Some(max_connections) = database.max_connections {
                self.database.max_connections = max_connections;
            }
            if let Some(timeout_secs) = database.timeout_secs {
                self.database.timeout_secs = timeout_secs;
            }
        }

        if let Some(server) = patch.server {
            if let Some(bind_address) = server.bind_address {
                self.server.bind_address = bind_address;
            }
            if let Some(port) = server.port {
                self.server.port = port;
            }
            if let Some(graceful_shutdown_secs) = server.graceful_shutdown_secs {
                self.server.graceful_shutdown_secs = graceful_shutdown_secs;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }

        if let Some(allocator) = patch.allocator {
            if let Some(iterations) = allocator.iterations {
                self.allocator.iterations = iterations;
            }
            if let Some(initial_temperature) = allocator.initial_temperature {
                self.allocator.initial_temperature = initial_temperature;
            }
            if let Some(cooling_rate) = allocator.cooling_rate {
                self.allocator.cooling_rate = cooling_rate;
            }
            if let Some(penalty_weight) = allocator.penalty_weight {
                self.allocator.penalty_weight = penalty_weight;
            }
            if let Some(deadline_ms) = allocator.deadline_ms {
                self.allocator.deadline_ms = Some(deadline_ms);
            }
        }

        if let Some(segments) = patch.price_segments {
            if let Some(refresh_interval_secs) = segments.refresh_interval_secs {
                self.price_segments.refresh_interval_secs = refresh_interval_secs;
            }
            if let Some(default_low) = segments.default_low {
                self.price_segments.default_low = default_low;
            }
            if let Some(default_mid) = segments.default_mid {
                self.price_segments.default_mid = default_mid;
            }
            if let Some(default_high) = segments.default_high {
                self.price_segments.default_high = default_high;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("DEWY_DATABASE_URL") {
            self.database.url = value;
        }
        if let Some(value) = read_env("DEWY_DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = parse_u32("DEWY_DATABASE_MAX_CONNECTIONS", &value)?;
        }
        if let Some(value) = read_env("DEWY_DATABASE_TIMEOUT_SECS") {
            self.database.timeout_secs = parse_u64("DEWY_DATABASE_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) = read_env("DEWY_SERVER_BIND_ADDRESS") {
            self.server.bind_address = value;
        }
        if let Some(value) = read_env("DEWY_SERVER_PORT") {
            self.server.port = parse_u16("DEWY_SERVER_PORT", &value)?;
        }
        if let Some(value) = read_env("DEWY_SERVER_GRACEFUL_SHUTDOWN_SECS") {
            self.server.graceful_shutdown_secs =
                parse_u64("DEWY_SERVER_GRACEFUL_SHUTDOWN_SECS", &value)?;
        }

        let log_level = read_env("DEWY_LOGGING_LEVEL").or_else(|| read_env("DEWY_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format = read_env("DEWY_LOGGING_FORMAT").or_else(|| read_env("DEWY_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        if let Some(value) = read_env("DEWY_ALLOCATOR_ITERATIONS") {
            self.allocator.iterations = parse_u32("DEWY_ALLOCATOR_ITERATIONS", &value)?;
        }
        if let Some(value) = read_env("DEWY_ALLOCATOR_INITIAL_TEMPERATURE") {
            self.allocator.initial_temperature =
                parse_f64("DEWY_ALLOCATOR_INITIAL_TEMPERATURE", &value)?;
        }
        if let Some(value) = read_env("DEWY_ALLOCATOR_COOLING_RATE") {
            self.allocator.cooling_rate = parse_f64("DEWY_ALLOCATOR_COOLING_RATE", &value)?;
        }
        if let Some(value) = read_env("DEWY_ALLOCATOR_PENALTY_WEIGHT") {
            self.allocator.penalty_weight = parse_f64("DEWY_ALLOCATOR_PENALTY_WEIGHT", &value)?;
        }
        if let Some(value) = read_env("DEWY_ALLOCATOR_DEADLINE_MS") {
            self.allocator.deadline_ms = Some(parse_u64("DEWY_ALLOCATOR_DEADLINE_MS", &value)?);
        }

        if let Some(value) = read_env("DEWY_PRICE_SEGMENTS_REFRESH_INTERVAL_SECS") {
            self.price_segments.refresh_interval_secs =
                parse_u64("DEWY_PRICE_SEGMENTS_REFRESH_INTERVAL_SECS", &value)?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(database_url) = overrides.database_url {
            self.database.url = database_url;
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
        if let Some(port) = overrides.server_port {
            self.server.port = port;
        }
        if let Some(iterations) = overrides.allocator_iterations {
            self.allocator.iterations = iterations;
        }
        if let Some(deadline_ms) = overrides.allocator_deadline_ms {
            self.allocator.deadline_ms = Some(deadline_ms);
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_database(&self.database)?;
        validate_server(&self.server)?;
        validate_logging(&self.logging)?;
        validate_allocator(&self.allocator)?;
        validate_price_segments(&self.price_segments)?;
        Ok(())
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from("dewy.toml"), PathBuf::from("config/dewy.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_database(database: &DatabaseConfig) -> Result<(), ConfigError> {
    let url = database.url.trim();
    let sqlite_url =
        url.starts_with("sqlite://") || url.starts_with("sqlite::") || url == ":memory:";
    if !sqlite_url {
        return Err(ConfigError::Validation(
            "database.url must be a sqlite URL (`sqlite://...`, `sqlite::...`, or `:memory:`)"
                .to_string(),
        ));
    }

    if database.max_connections == 0 {
        return Err(ConfigError::Validation(
            "database.max_connections must be greater than zero".to_string(),
        ));
    }

    if database.timeout_secs == 0 || database.timeout_secs > 300 {
        return Err(ConfigError::Validation(
            "database.timeout_secs must be in range 1..=300".to_string(),
        ));
    }

    Ok(())
}

fn validate_server(server: &ServerConfig) -> Result<(), ConfigError> {
    if server.port == 0 {
        return Err(ConfigError::Validation("server.port must be greater than zero".to_string()));
    }

    if server.graceful_shutdown_secs == 0 {
        return Err(ConfigError::Validation(
            "server.graceful_shutdown_secs must be greater than zero".to_string(),
        ));
    }

    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn validate_allocator(allocator: &AllocatorConfig) -> Result<(), ConfigError> {
    if allocator.iterations == 0 {
        return Err(ConfigError::Validation(
            "allocator.iterations must be greater than zero".to_string(),
        ));
    }

    if !(allocator.initial_temperature.is_finite() && allocator.initial_temperature > 0.0) {
        return Err(ConfigError::Validation(
            "allocator.initial_temperature must be a positive number".to_string(),
        ));
    }

    if !(allocator.cooling_rate > 0.0 && allocator.cooling_rate <= 1.0) {
        return Err(ConfigError::Validation(
            "allocator.cooling_rate must be in range (0, 1]".to_string(),
        ));
    }

    if !(allocator.penalty_weight.is_finite() && allocator.penalty_weight >= 0.0) {
        return Err(ConfigError::Validation(
            "allocator.penalty_weight must be a non-negative number".to_string(),
        ));
    }

    Ok(())
}

fn validate_price_segments(segments: &PriceSegmentConfig) -> Result<(), ConfigError> {
    if segments.refresh_interval_secs == 0 {
        return Err(ConfigError::Validation(
            "price_segments.refresh_interval_secs must be greater than zero".to_string(),
        ));
    }

    let ordered = 0 <= segments.default_low
        && segments.default_low <= segments.default_mid
        && segments.default_mid <= segments.default_high;
    if !ordered {
        return Err(ConfigError::Validation(
            "price_segments default band must satisfy 0 <= low <= mid <= high".to_string(),
        ));
    }

    Ok(())
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_u16(key: &str, value: &str) -> Result<u16, ConfigError> {
    value.parse::<u16>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u32(key: &str, value: &str) -> Result<u32, ConfigError> {
    value.parse::<u32>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.parse::<u64>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_f64(key: &str, value: &str) -> Result<f64, ConfigError> {
    value.parse::<f64>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    database: Option<DatabasePatch>,
    server: Option<ServerPatch>,
    logging: Option<LoggingPatch>,
    allocator: Option<AllocatorPatch>,
    price_segments: Option<PriceSegmentPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct DatabasePatch {
    url: Option<String>,
    max_connections: Option<u32>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct ServerPatch {
    bind_address: Option<String>,
    port: Option<u16>,
    graceful_shutdown_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}

#[derive(Debug, Default, Deserialize)]
struct AllocatorPatch {
    iterations: Option<u32>,
    initial_temperature: Option<f64>,
    cooling_rate: Option<f64>,
    penalty_weight: Option<f64>,
    deadline_ms: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct PriceSegmentPatch {
    refresh_interval_secs: Option<u64>,
    default_low: Option<i64>,
    default_mid: Option<i64>,
    default_high: Option<i64>,
}
