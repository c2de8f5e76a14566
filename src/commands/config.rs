use configparser::ini::Ini;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tauri::State;

use crate::bridge::UiConfig;
use crate::error::ConfigError;
use crate::state::AppState;

pub const CONFIG_FILE_NAME: &str = "config.json";
pub const INSTALLER_INI_NAME: &str = "user-config.ini";
const MIN_SAVE_INTERVAL_SECONDS: u64 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WindowDefaults {
    pub width: f64,
    pub height: f64,
    pub title: String,
    pub resizable: bool,
    pub always_on_top: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WindowConfig {
    #[serde(rename = "default")]
    pub defaults: WindowDefaults,
    /// Gap between the window and the bottom-right corner of the screen.
    pub offset: f64,
    pub global_shortcut: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DebugConfig {
    pub client_url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    pub folder_name: String,
    pub save_interval_in_seconds: u64,
    pub is_preview_visible: bool,
    pub window: WindowConfig,
    pub debug: DebugConfig,
    /// Always computed: installer override, else `~/<folder_name>`.
    #[serde(skip)]
    pub save_path: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            folder_name: "JotterNotes".to_string(),
            save_interval_in_seconds: 30,
            is_preview_visible: true,
            window: WindowConfig {
                defaults: WindowDefaults {
                    width: 420.0,
                    height: 520.0,
                    title: "Jotter".to_string(),
                    resizable: true,
                    always_on_top: true,
                },
                offset: 20.0,
                global_shortcut: "CommandOrControl+Shift+N".to_string(),
            },
            debug: DebugConfig {
                client_url: String::new(),
            },
            save_path: PathBuf::new(),
        }
    }
}

impl Config {
    /// Autosave period; zero would spin the editor worker, so it is floored.
    pub fn autosave_interval(&self) -> Duration {
        Duration::from_secs(self.save_interval_in_seconds.max(MIN_SAVE_INTERVAL_SECONDS))
    }

    pub fn ui_config(&self) -> UiConfig {
        UiConfig {
            save_interval_in_seconds: self.save_interval_in_seconds,
            is_preview_visible: self.is_preview_visible,
        }
    }
}

/// Where the layered configuration comes from.
#[derive(Debug, Clone, Default)]
pub struct ConfigSources {
    pub json_override: Option<PathBuf>,
    pub installer_ini: Option<PathBuf>,
    pub home: Option<PathBuf>,
}

/// Defaults → JSON override → installer save path. Never fails; every
/// unusable layer is skipped with a warning.
pub fn resolve_config(defaults: Config, sources: &ConfigSources) -> Config {
    let mut config = match sources.json_override.as_deref() {
        Some(path) => apply_json_override(&defaults, path).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "could not load config override, using defaults");
            defaults.clone()
        }),
        None => defaults,
    };

    let installer_path = sources
        .installer_ini
        .as_deref()
        .and_then(|path| match read_installer_save_path(path) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(error = %e, "ignoring installer settings");
                None
            }
        });

    config.save_path = match installer_path {
        Some(path) => PathBuf::from(path),
        None => home_or_temp(sources.home.as_deref()).join(&config.folder_name),
    };

    ensure_folder(&config.save_path);
    config
}

fn home_or_temp(home: Option<&Path>) -> PathBuf {
    match home {
        Some(home) => home.to_path_buf(),
        None => {
            tracing::warn!("{}, saving notes under the temp directory", ConfigError::NoHome);
            std::env::temp_dir()
        }
    }
}

fn apply_json_override(defaults: &Config, path: &Path) -> Result<Config, ConfigError> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!(path = %path.display(), "no config override present");
            return Ok(defaults.clone());
        }
        Err(source) => {
            return Err(ConfigError::Read {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    let parse_err = |message: String| ConfigError::Parse {
        path: path.to_path_buf(),
        message,
    };

    let overlay: Value = serde_json::from_str(&raw).map_err(|e| parse_err(e.to_string()))?;
    let mut merged = serde_json::to_value(defaults).map_err(|e| parse_err(e.to_string()))?;
    merge_json(&mut merged, overlay);
    serde_json::from_value(merged).map_err(|e| parse_err(e.to_string()))
}

/// Deep-merge `overlay` into `base`; objects merge key by key, anything else replaces.
fn merge_json(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (Value::Object(base_map), Value::Object(overlay_map)) => {
            for (key, value) in overlay_map {
                match base_map.get_mut(&key) {
                    Some(existing) => merge_json(existing, value),
                    None => {
                        base_map.insert(key, value);
                    }
                }
            }
        }
        (base, overlay) => *base = overlay,
    }
}

/// `[Settings] savePath=...` from the installer, if present and non-empty.
fn read_installer_save_path(path: &Path) -> Result<Option<String>, ConfigError> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(ConfigError::Read {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    let mut ini = Ini::new();
    ini.read(raw).map_err(|message| ConfigError::Parse {
        path: path.to_path_buf(),
        message,
    })?;

    Ok(ini
        .get("Settings", "savePath")
        .map(|value| value.trim().trim_matches('"').trim().to_string())
        .filter(|value| !value.is_empty()))
}

fn ensure_folder(path: &Path) {
    if path.is_dir() {
        tracing::info!(path = %path.display(), "save folder already exists");
        return;
    }
    match fs::create_dir_all(path) {
        Ok(()) => tracing::info!(path = %path.display(), "save folder created"),
        Err(e) => tracing::warn!(path = %path.display(), error = %e, "could not create save folder"),
    }
}

#[tauri::command]
pub fn get_config(state: State<'_, AppState>) -> UiConfig {
    state.config.ui_config()
}
