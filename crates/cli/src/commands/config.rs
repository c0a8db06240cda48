use std::env;
use std::fs;
use std::path::Path;

use stockroom_core::config::{resolve_config_path, AppConfig, LoadOptions};
use toml::Value;

use crate::commands::CommandResult;

/// One reported setting: dotted key path, rendered value, and the env vars that can set it.
struct Field {
    key_path: &'static str,
    value: String,
    env_keys: &'static [&'static str],
}

pub fn run() -> CommandResult {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(
                "config",
                "config_validation",
                format!("config validation failed: {error}"),
                2,
            )
        }
    };

    let config_file_path = resolve_config_path(None);
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];
    lines.extend(fields(&config).into_iter().map(|field| {
        let source = field_source(&field, config_file_doc.as_ref(), config_file_path.as_deref());
        format!("- {} = {} (source: {source})", field.key_path, field.value)
    }));

    CommandResult { exit_code: 0, output: lines.join("\n") }
}

fn fields(config: &AppConfig) -> Vec<Field> {
    vec![
        Field {
            key_path: "database.url",
            value: config.database.url.clone(),
            env_keys: &["STOCKROOM_DATABASE_URL"],
        },
        Field {
            key_path: "database.max_connections",
            value: config.database.max_connections.to_string(),
            env_keys: &["STOCKROOM_DATABASE_MAX_CONNECTIONS"],
        },
        Field {
            key_path: "database.timeout_secs",
            value: config.database.timeout_secs.to_string(),
            env_keys: &["STOCKROOM_DATABASE_TIMEOUT_SECS"],
        },
        Field {
            key_path: "server.bind_address",
            value: config.server.bind_address.clone(),
            env_keys: &["STOCKROOM_SERVER_BIND_ADDRESS"],
        },
        Field {
            key_path: "server.port",
            value: config.server.port.to_string(),
            env_keys: &["STOCKROOM_SERVER_PORT"],
        },
        Field {
            key_path: "server.graceful_shutdown_secs",
            value: config.server.graceful_shutdown_secs.to_string(),
            env_keys: &["STOCKROOM_SERVER_GRACEFUL_SHUTDOWN_SECS"],
        },
        Field {
            key_path: "server.seed_fixtures",
            value: config.server.seed_fixtures.to_string(),
            env_keys: &["STOCKROOM_SERVER_SEED_FIXTURES"],
        },
        Field {
            key_path: "catalog.name_min_length",
            value: config.catalog.name_min_length.to_string(),
            env_keys: &["STOCKROOM_CATALOG_NAME_MIN_LENGTH"],
        },
        Field {
            key_path: "logging.level",
            value: config.logging.level.clone(),
            env_keys: &["STOCKROOM_LOGGING_LEVEL", "STOCKROOM_LOG_LEVEL"],
        },
        Field {
            key_path: "logging.format",
            value: format!("{:?}", config.logging.format),
            env_keys: &["STOCKROOM_LOGGING_FORMAT", "STOCKROOM_LOG_FORMAT"],
        },
    ]
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    field: &Field,
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    let env_key = field
        .env_keys
        .iter()
        .find(|key| env::var(key).map(|value| !value.trim().is_empty()).unwrap_or(false));
    if let Some(env_key) = env_key {
        return format!("env ({env_key})");
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, field.key_path) {
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

#[cfg(test)]
mod tests {
    use toml::Value;

    use super::contains_path;

    #[test]
    fn dotted_paths_resolve_against_nested_tables() {
        let doc = "[server]\nport = 9000\n".parse::<Value>().expect("toml");

        assert!(contains_path(&doc, "server.port"));
        assert!(!contains_path(&doc, "server.bind_address"));
        assert!(!contains_path(&doc, "database.url"));
    }
}
