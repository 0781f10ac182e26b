use std::{collections::HashMap, fs, path::Path, str::FromStr, time::Duration};

use tracing::warn;
use url::Url;

use crate::{
    engine::EngineConfig,
    error::ConfigError,
    visualizer::EffectPolicy,
};

pub const SETTINGS_FILE: &str = "surface.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub endpoint: String,
    pub effect_duration_ms: u64,
    pub effect_policy: EffectPolicy,
    pub log_filter: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            endpoint: "ws://127.0.0.1:8001/ws_gui".into(),
            effect_duration_ms: 700,
            effect_policy: EffectPolicy::Independent,
            log_filter: "info".into(),
        }
    }
}

impl Settings {
    pub fn endpoint_url(&self) -> Result<Url, ConfigError> {
        let url = Url::parse(self.endpoint.trim()).map_err(|_| ConfigError::InvalidValue {
            key: "endpoint",
            value: self.endpoint.clone(),
        })?;
        match url.scheme() {
            "ws" | "wss" => Ok(url),
            _ => Err(ConfigError::UnsupportedScheme(self.endpoint.clone())),
        }
    }

    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            effect_duration: Duration::from_millis(self.effect_duration_ms),
            effect_policy: self.effect_policy,
        }
    }

    fn apply(&mut self, key: &'static str, raw: &str) {
        let applied = match key {
            "endpoint" => {
                self.endpoint = raw.to_string();
                Ok(())
            }
            "log_filter" => {
                self.log_filter = raw.to_string();
                Ok(())
            }
            "effect_duration_ms" => raw
                .parse()
                .map(|ms| self.effect_duration_ms = ms)
                .map_err(|_| invalid(key, raw)),
            "effect_policy" => raw.parse().map(|policy| self.effect_policy = policy),
            _ => Ok(()),
        };
        if let Err(err) = applied {
            warn!(%err, "config: ignoring setting");
        }
    }
}

const KEYS: [&str; 4] = ["endpoint", "effect_duration_ms", "effect_policy", "log_filter"];

pub fn load_settings() -> Settings {
    load_settings_from(Path::new(SETTINGS_FILE), |name| std::env::var(name).ok())
}

/// Defaults, then the optional settings file, then the environment.
/// Unparseable values are logged and skipped.
pub fn load_settings_from(path: &Path, env: impl Fn(&str) -> Option<String>) -> Settings {
    let mut settings = Settings::default();

    if let Ok(raw) = fs::read_to_string(path) {
        match toml::from_str::<HashMap<String, String>>(&raw) {
            Ok(file_cfg) => {
                for key in KEYS {
                    if let Some(v) = file_cfg.get(key) {
                        settings.apply(key, v);
                    }
                }
            }
            Err(err) => warn!(path = %path.display(), %err, "config: unreadable settings file"),
        }
    }

    if let Some(v) = env("SURFACE_ENDPOINT") {
        settings.endpoint = v;
    }
    for key in KEYS {
        if let Some(v) = env(&format!("APP__{}", key.to_ascii_uppercase())) {
            settings.apply(key, &v);
        }
    }

    settings
}

fn invalid(key: &'static str, value: &str) -> ConfigError {
    ConfigError::InvalidValue {
        key,
        value: value.to_string(),
    }
}

impl FromStr for EffectPolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "independent" => Ok(Self::Independent),
            "latest_wins" => Ok(Self::LatestWins),
            _ => Err(invalid("effect_policy", s)),
        }
    }
}
