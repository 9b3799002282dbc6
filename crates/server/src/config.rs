use std::{collections::HashMap, fs, time::Duration};

use control::{ResolverMode, DEFAULT_COMMAND_PORT};
use telemetry::{DEFAULT_TELEMETRY_BIND, PUBLISH_INTERVAL};
use tracing::warn;

pub const SETTINGS_FILE: &str = "server.toml";
const MIN_PUBLISH_INTERVAL_MS: u64 = 10;

/// Environment variables and the setting key each one overrides. Later
/// entries win.
const ENV_OVERRIDES: [(&str, &str); 10] = [
    ("SERVER_BIND", "server_bind"),
    ("APP__BIND_ADDR", "server_bind"),
    ("ROBOT_HOST", "robot_host"),
    ("APP__ROBOT_HOST", "robot_host"),
    ("COMMAND_PORT", "command_port"),
    ("APP__COMMAND_PORT", "command_port"),
    ("TELEMETRY_BIND", "telemetry_bind"),
    ("APP__TELEMETRY_BIND", "telemetry_bind"),
    ("APP__PUBLISH_INTERVAL_MS", "publish_interval_ms"),
    ("APP__RESOLVER_MODE", "resolver_mode"),
];

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub server_bind: String,
    pub robot_host: String,
    pub command_port: u16,
    pub telemetry_bind: String,
    pub publish_interval_ms: u64,
    pub resolver_mode: ResolverMode,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server_bind: "0.0.0.0:5000".into(),
            robot_host: "192.168.137.226".into(),
            command_port: DEFAULT_COMMAND_PORT,
            telemetry_bind: DEFAULT_TELEMETRY_BIND.into(),
            publish_interval_ms: PUBLISH_INTERVAL.as_millis() as u64,
            resolver_mode: ResolverMode::default(),
        }
    }
}

impl Settings {
    pub fn publish_interval(&self) -> Duration {
        Duration::from_millis(self.publish_interval_ms)
    }
}

pub fn load_settings() -> Settings {
    let mut settings = Settings::default();

    if let Ok(raw) = fs::read_to_string(SETTINGS_FILE) {
        apply_file_overrides(&mut settings, &raw);
    }
    apply_env_overrides(&mut settings, |name| std::env::var(name).ok());

    settings
}

pub(crate) fn apply_file_overrides(settings: &mut Settings, raw: &str) {
    let file_cfg = match toml::from_str::<HashMap<String, toml::Value>>(raw) {
        Ok(file_cfg) => file_cfg,
        Err(error) => {
            warn!(file = SETTINGS_FILE, %error, "ignoring unreadable settings file");
            return;
        }
    };

    for (key, value) in &file_cfg {
        let value = match value {
            toml::Value::String(v) => v.clone(),
            toml::Value::Integer(v) => v.to_string(),
            other => {
                warn!(%key, value = %other, "ignoring non-scalar setting");
                continue;
            }
        };
        apply_override(settings, key, &value);
    }
}

pub(crate) fn apply_env_overrides(
    settings: &mut Settings,
    lookup: impl Fn(&str) -> Option<String>,
) {
    for (name, key) in ENV_OVERRIDES {
        if let Some(value) = lookup(name) {
            apply_override(settings, key, &value);
        }
    }
}

fn apply_override(settings: &mut Settings, key: &str, value: &str) {
    match key {
        "server_bind" | "bind_addr" => settings.server_bind = value.to_string(),
        "robot_host" => settings.robot_host = value.trim().to_string(),
        "telemetry_bind" => settings.telemetry_bind = value.to_string(),
        "command_port" => match value.trim().parse::<u16>() {
            Ok(port) => settings.command_port = port,
            Err(_) => warn!(%key, %value, "ignoring invalid port"),
        },
        "publish_interval_ms" => match value.trim().parse::<u64>() {
            Ok(ms) => settings.publish_interval_ms = ms.max(MIN_PUBLISH_INTERVAL_MS),
            Err(_) => warn!(%key, %value, "ignoring invalid interval"),
        },
        "resolver_mode" => match value.parse::<ResolverMode>() {
            Ok(mode) => settings.resolver_mode = mode,
            Err(error) => warn!(%key, %error, "ignoring invalid resolver mode"),
        },
        _ => warn!(%key, "ignoring unknown setting"),
    }
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
