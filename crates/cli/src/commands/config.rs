use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::commands::{load_config, CommandResult};
use toml::Value;

pub fn run() -> CommandResult {
    let config = match load_config("config") {
        Ok(config) => config,
        Err(result) => return result,
    };

    let config_file_path = detect_config_path();
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());

    let deadline = config
        .allocator
        .deadline_ms
        .map(|ms| ms.to_string())
        .unwrap_or_else(|| "<unset>".to_string());

    let doc = config_file_doc.as_ref();
    let path = config_file_path.as_deref();
    let line = |key: &str, value: &str, env_keys: &[&str]| {
        render_line(key, value, field_source(key, env_keys, doc, path))
    };

    let lines = [
        "effective config (source precedence: env > file > default):".to_string(),
        line("database.url", &config.database.url, &["DEWY_DATABASE_URL"]),
        line(
            "database.max_connections",
            &config.database.max_connections.to_string(),
            &["DEWY_DATABASE_MAX_CONNECTIONS"],
        ),
        line(
            "database.timeout_secs",
            &config.database.timeout_secs.to_string(),
            &["DEWY_DATABASE_TIMEOUT_SECS"],
        ),
        line("server.bind_address", &config.server.bind_address, &["DEWY_SERVER_BIND_ADDRESS"]),
        line("server.port", &config.server.port.to_string(), &["DEWY_SERVER_PORT"]),
        line(
            "server.graceful_shutdown_secs",
            &config.server.graceful_shutdown_secs.to_string(),
            &["DEWY_SERVER_GRACEFUL_SHUTDOWN_SECS"],
        ),
        line("logging.level", &config.logging.level, &["DEWY_LOGGING_LEVEL", "DEWY_LOG_LEVEL"]),
        line(
            "logging.format",
            &format!("{:?}", config.logging.format),
            &["DEWY_LOGGING_FORMAT", "DEWY_LOG_FORMAT"],
        ),
        line(
            "allocator.iterations",
            &config.allocator.iterations.to_string(),
            &["DEWY_ALLOCATOR_ITERATIONS"],
        ),
        line(
            "allocator.initial_temperature",
            &config.allocator.initial_temperature.to_string(),
            &["DEWY_ALLOCATOR_INITIAL_TEMPERATURE"],
        ),
        line(
            "allocator.cooling_rate",
            &config.allocator.cooling_rate.to_string(),
            &["DEWY_ALLOCATOR_COOLING_RATE"],
        ),
        line(
            "allocator.penalty_weight",
            &config.allocator.penalty_weight.to_string(),
            &["DEWY_ALLOCATOR_PENALTY_WEIGHT"],
        ),
        line("allocator.deadline_ms", &deadline, &["DEWY_ALLOCATOR_DEADLINE_MS"]),
        line(
            "price_segments.refresh_interval_secs",
            &config.price_segments.refresh_interval_secs.to_string(),
            &["DEWY_PRICE_SEGMENTS_REFRESH_INTERVAL_SECS"],
        ),
        line("price_segments.default_low", &config.price_segments.default_low.to_string(), &[]),
        line("price_segments.default_mid", &config.price_segments.default_mid.to_string(), &[]),
        line("price_segments.default_high", &config.price_segments.default_high.to_string(), &[]),
    ];

    CommandResult::success("config", lines.join("\n"))
}

fn detect_config_path() -> Option<PathBuf> {
    [PathBuf::from("dewy.toml"), PathBuf::from("config/dewy.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_keys: &[&str],
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if let Some(env_key) = env_keys.iter().find(|key| env::var_os(key).is_some()) {
        return format!("env ({env_key})");
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn render_line(key: &str, value: &str, source: String) -> String {
    format!("- {key} = {value} (source: {source})")
}
