//! Configuration for the playback backends.
//!
//! Loading follows three layers, each overriding the previous one:
//! - the embedded default document (`pmoplayerkit.yaml`),
//! - an optional user YAML file,
//! - environment variables prefixed with `PMOPLAYERKIT_CONFIG__`, where
//!   `__` separates path segments
//!   (`PMOPLAYERKIT_CONFIG__APPLE_MUSIC__TICK_INTERVAL_MS=500`).
//!
//! ```no_run
//! use pmoplayerkit::PlayerKitConfig;
//!
//! let config = PlayerKitConfig::load(None)?;
//! println!("tick: {:?}", config.apple_music.tick_interval());
//! # Ok::<(), pmoplayerkit::PlayerKitError>(())
//! ```

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;
use std::{env, fs};

use serde::Deserialize;
use serde_yaml::{Mapping, Value};
use tracing::{debug, info};

use crate::errors::PlayerKitError;
use crate::model::PlayerType;

const DEFAULT_CONFIG: &str = include_str!("pmoplayerkit.yaml");
const ENV_PREFIX: &str = "PMOPLAYERKIT_CONFIG__";

#[derive(Clone, Debug, Deserialize)]
pub struct PlayerKitConfig {
    pub enabled_backends: Vec<PlayerType>,
    pub normal: NormalPlayerConfig,
    pub apple_music: AppleMusicPlayerConfig,
    pub youtube: YouTubePlayerConfig,
}

#[derive(Clone, Debug, Deserialize)]
pub struct NormalPlayerConfig {
    pub time_update_interval_ms: u64,
    pub seek_timescale: i32,
}

#[derive(Clone, Debug, Deserialize)]
pub struct AppleMusicPlayerConfig {
    pub tick_interval_ms: u64,
    pub state_sync_delay_ms: u64,
}

#[derive(Clone, Debug, Deserialize)]
pub struct YouTubePlayerConfig {
    pub origin: String,
    pub player_vars: BTreeMap<String, i64>,
}

impl NormalPlayerConfig {
    pub fn time_update_interval(&self) -> Duration {
        Duration::from_millis(self.time_update_interval_ms)
    }
}

impl AppleMusicPlayerConfig {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    pub fn state_sync_delay(&self) -> Duration {
        Duration::from_millis(self.state_sync_delay_ms)
    }
}

impl Default for PlayerKitConfig {
    fn default() -> Self {
        Self::from_yaml_str("").expect("Embedded default configuration is invalid")
    }
}

impl PlayerKitConfig {
    /// Loads the defaults, merges `path` when given, then applies the
    /// process environment.
    pub fn load(path: Option<&Path>) -> Result<Self, PlayerKitError> {
        let user = match path {
            Some(path) => {
                let data = fs::read_to_string(path).map_err(|e| {
                    PlayerKitError::Config(format!("Cannot read {}: {}", path.display(), e))
                })?;
                info!(config_file = %path.display(), "Loaded config file");
                data
            }
            None => String::new(),
        };
        Self::from_sources(&user, env::vars())
    }

    /// Defaults merged with a YAML document, without environment overrides.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, PlayerKitError> {
        Self::from_sources(yaml, std::iter::empty())
    }

    /// Defaults merged with a YAML document, then with `(key, value)`
    /// overrides in the environment-variable format.
    pub fn from_sources<I>(yaml: &str, vars: I) -> Result<Self, PlayerKitError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut value = lower_keys_value(serde_yaml::from_str(DEFAULT_CONFIG)?);

        if !yaml.trim().is_empty() {
            let external: Value = serde_yaml::from_str(yaml)?;
            merge_yaml(&mut value, lower_keys_value(external));
        }

        apply_env_overrides(&mut value, vars)?;

        let config: PlayerKitConfig = serde_yaml::from_value(value)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), PlayerKitError> {
        if self.normal.time_update_interval_ms == 0 {
            return Err(PlayerKitError::Config(
                "normal.time_update_interval_ms must be greater than 0".to_string(),
            ));
        }
        if self.normal.seek_timescale <= 0 {
            return Err(PlayerKitError::Config(
                "normal.seek_timescale must be positive".to_string(),
            ));
        }
        if self.apple_music.tick_interval_ms == 0 {
            return Err(PlayerKitError::Config(
                "apple_music.tick_interval_ms must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }

    pub fn is_enabled(&self, player_type: PlayerType) -> bool {
        self.enabled_backends.contains(&player_type)
    }
}

fn apply_env_overrides<I>(config: &mut Value, vars: I) -> Result<(), PlayerKitError>
where
    I: IntoIterator<Item = (String, String)>,
{
    for (key, value) in vars {
        let Some(path) = key.strip_prefix(ENV_PREFIX) else {
            continue;
        };
        let key_path: Vec<&str> = path.split("__").collect();
        debug!(key = %key, "Applying configuration override");
        set_value_internal(config, &key_path, convert_env_value(&value))?;
    }
    Ok(())
}

fn set_value_internal(data: &mut Value, path: &[&str], value: Value) -> Result<(), PlayerKitError> {
    if path.is_empty() {
        *data = value;
        return Ok(());
    }
    if let Value::Mapping(map) = data {
        let key_value = Value::String(path[0].to_lowercase());
        if path.len() == 1 {
            map.insert(key_value, value);
        } else {
            let entry = map
                .entry(key_value)
                .or_insert(Value::Mapping(Mapping::new()));
            set_value_internal(entry, &path[1..], value)?;
        }
        Ok(())
    } else {
        Err(PlayerKitError::Config(format!(
            "Cannot override {}: parent is not a map",
            path.join(".")
        )))
    }
}

fn convert_env_value(value: &str) -> Value {
    serde_yaml::from_str::<Value>(value).unwrap_or_else(|_| Value::String(value.to_string()))
}

fn lower_keys_value(value: Value) -> Value {
    match value {
        Value::Mapping(map) => {
            let mut new_map = Mapping::new();
            for (k, v) in map {
                let key = match k {
                    Value::String(s) => Value::String(s.to_lowercase()),
                    other => other,
                };
                new_map.insert(key, lower_keys_value(v));
            }
            Value::Mapping(new_map)
        }
        Value::Sequence(seq) => Value::Sequence(seq.into_iter().map(lower_keys_value).collect()),
        _ => value,
    }
}

/// Both sides must already have lower-cased keys, so that `Apple_Music`
/// in a user file lands on the default `apple_music` entry.
fn merge_yaml(default: &mut Value, external: Value) {
    match (default, external) {
        (Value::Mapping(dmap), Value::Mapping(emap)) => {
            for (k, v) in emap {
                match dmap.get_mut(&k) {
                    Some(dv) => merge_yaml(dv, v),
                    None => {
                        dmap.insert(k, v);
                    }
                }
            }
        }
        // Scalars and sequences replace.
        (d, e) => *d = e,
    }
}
