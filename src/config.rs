use crate::gui::ring::model::AvatarId;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use serde_with::DeserializeFromStr;
use std::path::PathBuf;
use strum::{Display as StrumDisplay, EnumString};
use thiserror::Error;

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    DeserializeFromStr,
    EnumString,
    StrumDisplay,
)]
#[strum(ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum Ring {
    Inner,
    Outer,
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    DeserializeFromStr,
    EnumString,
    StrumDisplay,
)]
#[strum(ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum SizeClass {
    Large,
    Small,
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    DeserializeFromStr,
    EnumString,
    StrumDisplay,
)]
#[strum(ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    Pinned,
    #[default]
    Animatable,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AvatarConfig {
    pub id: AvatarId,
    pub source: PathBuf,
    pub ring: Ring,
    pub size: SizeClass,
    #[serde(default)]
    pub visibility: Visibility,
    #[serde(default)]
    pub offset_angle: f64,
}

/// Geometry ratios and animation timings. All radii and diameters are
/// derived from these and the widget's current side length on every draw.
#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
#[serde(default)]
pub struct Tuning {
    pub stroke_width: f64,
    pub large_ratio: f64,
    pub small_ratio: f64,
    pub rotation_period_ms: u64,
    pub scale_duration_ms: u64,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            stroke_width: 4.0,
            large_ratio: 1.0 / 6.0,
            small_ratio: 1.0 / 8.0,
            rotation_period_ms: 40_000,
            scale_duration_ms: 350,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct Config {
    #[serde(default)]
    pub tuning: Tuning,
    #[serde(default)]
    pub owner_avatar: Option<PathBuf>,
    #[serde(default)]
    pub avatars: Vec<AvatarConfig>,
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to determine config directory")]
    ConfigDirNotFound,
    #[error("Config error: {0}")]
    Config(#[from] config::ConfigError),
    #[error("Notify error: {0}")]
    Notify(#[from] notify::Error),
}

pub fn get_config_path() -> Result<PathBuf, ConfigError> {
    let proj_dirs =
        ProjectDirs::from("org", "troia", "orrery").ok_or(ConfigError::ConfigDirNotFound)?;
    Ok(proj_dirs.config_dir().join("config.toml"))
}

pub fn load_config() -> Result<Config, ConfigError> {
    let config_path = get_config_path()?;

    let s = config::Config::builder()
        .add_source(config::File::from(config_path).required(false))
        .add_source(config::Environment::with_prefix("ORRERY"))
        .build()?;

    Ok(s.try_deserialize()?)
}

pub fn load_or_setup() -> Config {
    if let Ok(path) = get_config_path()
        && !path.exists()
    {
        if let Err(e) = write_default_config() {
            log::warn!("Failed to write default config: {}", e);
        }
        return default_config();
    }

    match load_config() {
        Ok(c) => c,
        Err(e) => {
            log::error!("Falling back to the built-in config: {}", e);
            default_config()
        }
    }
}

fn default_config() -> Config {
    config::Config::builder()
        .add_source(config::File::from_str(
            DEFAULT_CONFIG,
            config::FileFormat::Toml,
        ))
        .build()
        .and_then(|s| s.try_deserialize())
        .unwrap_or_default()
}

pub fn write_default_config() -> std::io::Result<PathBuf> {
    let path =
        get_config_path().map_err(|e| std::io::Error::new(std::io::ErrorKind::NotFound, e))?;
    if let Some(parent) = path.parent() {
        fs_err::create_dir_all(parent)?;
    }
    if !path.exists() {
        fs_err::write(&path, DEFAULT_CONFIG)?;
    }
    Ok(path)
}

const DEFAULT_CONFIG: &str = include_str!("default_config.toml");

use crate::events::AppEvent;
use async_channel::Sender;
use notify::{EventKind, RecommendedWatcher, RecursiveMode, Watcher};

pub async fn run_async_watcher(tx: Sender<AppEvent>) {
    let config_path = match get_config_path() {
        Ok(p) => p,
        Err(e) => {
            log::error!("Config watcher error: {}", e);
            return;
        }
    };
    let config_dir = match config_path.parent() {
        Some(p) => p.to_path_buf(),
        None => return,
    };

    if let Err(e) = fs_err::create_dir_all(&config_dir) {
        log::error!("Failed to create config directory for watching: {}", e);
        return;
    }

    let (bridge_tx, bridge_rx) = async_channel::unbounded();

    let mut watcher = match RecommendedWatcher::new(
        move |res| {
            let _ = bridge_tx.send_blocking(res);
        },
        notify::Config::default(),
    ) {
        Ok(w) => w,
        Err(e) => {
            log::error!("Failed to create watcher: {}", e);
            return;
        }
    };

    if let Err(e) = watcher.watch(&config_dir, RecursiveMode::NonRecursive) {
        log::error!("Failed to watch config directory: {}", e);
        return;
    }

    while let Ok(res) = bridge_rx.recv().await {
        match res {
            Ok(event) => {
                let meaningful_event = matches!(
                    event.kind,
                    EventKind::Modify(_) | EventKind::Create(_) | EventKind::Remove(_)
                );

                if meaningful_event
                    && event.paths.iter().any(|p| p == &config_path)
                    && tx.send(AppEvent::ConfigReload).await.is_err()
                {
                    break;
                }
            }
            Err(e) => log::error!("Watch error: {}", e),
        }
    }
}
