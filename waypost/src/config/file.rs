//! INI configuration file.
//!
//! Translates the on-disk configuration into the typed configs the rest
//! of the library consumes ([`EngineConfig`], [`ProviderConfig`],
//! [`DurationPolicy`]). Keys are optional; anything missing falls back to
//! the library defaults, so an empty file is a valid configuration.
//!
//! # Format
//!
//! ```ini
//! [catalog]
//! path = /home/me/places.json
//!
//! [routing]
//! provider = osrm
//! duration = provider
//! walking_speed = 1.4
//!
//! [engine]
//! movement_threshold_m = 80
//! refresh_interval_secs = 45
//! staleness_secs = 120
//! batch_size = 6
//! batch_delay_ms = 300
//! status_clear_delay_secs = 3
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use ini::Ini;
use thiserror::Error;

use crate::config::{EngineConfig, DEFAULT_WALKING_SPEED_MPS};
use crate::provider::{DurationPolicy, ProviderConfig};

/// Config directory name under the platform config root.
const CONFIG_DIR: &str = "waypost";

/// Config file name.
const CONFIG_FILE: &str = "config.ini";

/// Errors loading or interpreting the configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read or written.
    #[error("config I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The file is not valid INI.
    #[error("config parse error: {0}")]
    Parse(String),

    /// A key holds a value the engine cannot use.
    #[error("invalid config value for {key}: {value}")]
    Invalid { key: String, value: String },
}

/// The loaded configuration file.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    /// Path to the catalog JSON, if configured.
    pub catalog_path: Option<PathBuf>,

    /// Routing provider selection.
    pub provider: ProviderConfig,

    /// Duration strategy.
    pub duration_policy: DurationPolicy,

    /// Engine tunables.
    pub engine: EngineConfig,
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            catalog_path: None,
            provider: ProviderConfig::osrm(),
            duration_policy: DurationPolicy::FromProvider,
            engine: EngineConfig::default(),
        }
    }
}

impl ConfigFile {
    /// The default config file location for this platform.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(CONFIG_DIR).join(CONFIG_FILE))
    }

    /// Load a config file, treating a missing file as defaults.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load and interpret a config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let ini = Ini::load_from_file(path).map_err(|e| match e {
            ini::Error::Io(io) => ConfigError::Io(io),
            ini::Error::Parse(parse) => ConfigError::Parse(parse.to_string()),
        })?;
        Self::from_ini(&ini)
    }

    fn from_ini(ini: &Ini) -> Result<Self, ConfigError> {
        let catalog_path = ini
            .get_from(Some("catalog"), "path")
            .map(PathBuf::from);

        let walking_speed = get_f64(ini, "routing", "walking_speed")?
            .unwrap_or(DEFAULT_WALKING_SPEED_MPS);

        let provider = match ini.get_from(Some("routing"), "provider").unwrap_or("osrm") {
            "osrm" => {
                let mut config = ProviderConfig::osrm();
                if let ProviderConfig::Osrm { base_url, profile } = &mut config {
                    if let Some(url) = ini.get_from(Some("routing"), "base_url") {
                        *base_url = url.to_string();
                    }
                    if let Some(p) = ini.get_from(Some("routing"), "profile") {
                        *profile = p.to_string();
                    }
                }
                config
            }
            "openrouteservice" => {
                let api_key = ini
                    .get_from(Some("routing"), "api_key")
                    .unwrap_or_default()
                    .to_string();
                let mut config = ProviderConfig::openrouteservice(api_key);
                if let ProviderConfig::OpenRouteService {
                    base_url, profile, ..
                } = &mut config
                {
                    if let Some(url) = ini.get_from(Some("routing"), "base_url") {
                        *base_url = url.to_string();
                    }
                    if let Some(p) = ini.get_from(Some("routing"), "profile") {
                        *profile = p.to_string();
                    }
                }
                config
            }
            other => {
                return Err(ConfigError::Invalid {
                    key: "routing.provider".to_string(),
                    value: other.to_string(),
                })
            }
        };

        let duration_policy = match ini.get_from(Some("routing"), "duration").unwrap_or("provider")
        {
            "provider" => DurationPolicy::FromProvider,
            "fixed-pace" => DurationPolicy::FixedPace {
                walking_speed_mps: walking_speed,
            },
            other => {
                return Err(ConfigError::Invalid {
                    key: "routing.duration".to_string(),
                    value: other.to_string(),
                })
            }
        };

        let mut engine = EngineConfig::default();
        if let Some(v) = get_f64(ini, "engine", "movement_threshold_m")? {
            engine.movement_threshold_m = v;
        }
        if let Some(v) = get_u64(ini, "engine", "refresh_interval_secs")? {
            engine.refresh_interval = Duration::from_secs(v);
        }
        if let Some(v) = get_u64(ini, "engine", "staleness_secs")? {
            engine.staleness_window = Duration::from_secs(v);
        }
        if let Some(v) = get_u64(ini, "engine", "batch_size")? {
            engine.batch_size = (v as usize).max(1);
        }
        if let Some(v) = get_u64(ini, "engine", "batch_delay_ms")? {
            engine.batch_delay = Duration::from_millis(v);
        }
        if let Some(v) = get_u64(ini, "engine", "status_clear_delay_secs")? {
            engine.status_clear_delay = Duration::from_secs(v);
        }

        Ok(Self {
            catalog_path,
            provider,
            duration_policy,
            engine,
        })
    }

    /// Write a default config file, creating parent directories.
    pub fn write_default(path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let mut ini = Ini::new();
        ini.with_section(Some("catalog")).set("path", "places.json");
        ini.with_section(Some("routing"))
            .set("provider", "osrm")
            .set("duration", "provider")
            .set("walking_speed", DEFAULT_WALKING_SPEED_MPS.to_string());
        ini.with_section(Some("engine"))
            .set("movement_threshold_m", "80")
            .set("refresh_interval_secs", "45")
            .set("staleness_secs", "120")
            .set("batch_size", "6")
            .set("batch_delay_ms", "300")
            .set("status_clear_delay_secs", "3");
        ini.write_to_file(path)?;
        Ok(())
    }
}

fn get_f64(ini: &Ini, section: &str, key: &str) -> Result<Option<f64>, ConfigError> {
    match ini.get_from(Some(section), key) {
        None => Ok(None),
        Some(raw) => raw.parse::<f64>().map(Some).map_err(|_| ConfigError::Invalid {
            key: format!("{}.{}", section, key),
            value: raw.to_string(),
        }),
    }
}

fn get_u64(ini: &Ini, section: &str, key: &str) -> Result<Option<u64>, ConfigError> {
    match ini.get_from(Some(section), key) {
        None => Ok(None),
        Some(raw) => raw.parse::<u64>().map(Some).map_err(|_| ConfigError::Invalid {
            key: format!("{}.{}", section, key),
            value: raw.to_string(),
        }),
    }
}
