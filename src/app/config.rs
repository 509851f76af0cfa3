use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::app::error::AppError;
use crate::app::screen::calibration::Resolution;
use crate::app::screen::capture::HeaderLayout;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct AdbSettings {
    /// Empty means "look it up" (see `adb::locator`).
    pub command_path: String,
    /// Empty means "the only online device".
    pub serial: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct SessionSettings {
    pub verbose: bool,
    /// Resolution the automation coordinates are written against; 0 disables
    /// scaling.
    pub logical_width: u32,
    pub logical_height: u32,
}

impl SessionSettings {
    pub fn logical_resolution(&self) -> Option<Resolution> {
        Resolution::new(self.logical_width, self.logical_height)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CommandSettings {
    pub command_timeout: i32,
    pub capture_timeout: i32,
}

impl Default for CommandSettings {
    fn default() -> Self {
        Self {
            command_timeout: 30,
            capture_timeout: 60,
        }
    }
}

impl CommandSettings {
    pub fn command_timeout(&self) -> Duration {
        Duration::from_secs(self.command_timeout.max(1) as u64)
    }

    pub fn capture_timeout(&self) -> Duration {
        Duration::from_secs(self.capture_timeout.max(1) as u64)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ScreenshotSettings {
    pub display_id: i32,
    /// Where screenshots land when no directory is given explicitly.
    pub output_dir: String,
    /// The device's `screencap` writes the 16-byte header with a color-space word.
    pub color_space_header: bool,
}

impl Default for ScreenshotSettings {
    fn default() -> Self {
        Self {
            display_id: -1,
            output_dir: String::new(),
            color_space_header: false,
        }
    }
}

impl ScreenshotSettings {
    /// Picks the output directory: an explicit override first, then the
    /// configured `output_dir`, then `fallback`.
    pub fn resolve_output_dir(
        &self,
        explicit: Option<PathBuf>,
        fallback: impl FnOnce() -> PathBuf,
    ) -> PathBuf {
        if let Some(dir) = explicit.filter(|dir| !dir.as_os_str().is_empty()) {
            return dir;
        }
        let configured = self.output_dir.trim();
        if !configured.is_empty() {
            return PathBuf::from(configured);
        }
        fallback()
    }

    pub fn header_layout(&self) -> HeaderLayout {
        if self.color_space_header {
            HeaderLayout::WithColorSpace
        } else {
            HeaderLayout::Standard
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoggingSettings {
    pub log_level: String,
    pub json: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            log_level: "INFO".to_string(),
            json: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AppConfig {
    #[serde(default)]
    pub adb: AdbSettings,
    #[serde(default)]
    pub session: SessionSettings,
    #[serde(default)]
    pub command: CommandSettings,
    #[serde(default)]
    pub screenshot: ScreenshotSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
    #[serde(default)]
    pub version: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            adb: AdbSettings::default(),
            session: SessionSettings::default(),
            command: CommandSettings::default(),
            screenshot: ScreenshotSettings::default(),
            logging: LoggingSettings::default(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

const CONFIG_FILE_NAME: &str = ".adb_monkey_config.json";
const BACKUP_FILE_NAME: &str = ".adb_monkey_config.backup.json";

fn home_dir() -> PathBuf {
    dirs::home_dir().unwrap_or_else(|| PathBuf::from("."))
}

pub fn config_path() -> PathBuf {
    if let Ok(path) = std::env::var("ADB_MONKEY_CONFIG_PATH") {
        return PathBuf::from(path);
    }
    home_dir().join(CONFIG_FILE_NAME)
}

pub fn backup_config_path() -> PathBuf {
    let primary = config_path();
    match primary.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.join(BACKUP_FILE_NAME),
        _ => home_dir().join(BACKUP_FILE_NAME),
    }
}

pub fn load_config(trace_id: &str) -> Result<AppConfig, AppError> {
    load_config_from_path(&config_path(), trace_id)
}

pub fn save_config(config: &AppConfig, trace_id: &str) -> Result<(), AppError> {
    save_config_to_path(config, &config_path(), &backup_config_path(), trace_id)
}

pub fn load_config_from_path(path: &Path, trace_id: &str) -> Result<AppConfig, AppError> {
    if !path.exists() {
        return Ok(AppConfig::default());
    }
    let raw = fs::read_to_string(path)
        .map_err(|err| AppError::system(format!("Failed to read config: {err}"), trace_id))?;
    let config: AppConfig = serde_json::from_str(&raw)
        .map_err(|err| AppError::system(format!("Failed to parse config: {err}"), trace_id))?;
    Ok(validate_config(config))
}

pub fn save_config_to_path(
    config: &AppConfig,
    path: &Path,
    backup_path: &Path,
    trace_id: &str,
) -> Result<(), AppError> {
    if let Some(parent) = path.parent() {
        let _ = fs::create_dir_all(parent);
    }
    if path.exists() {
        let _ = fs::copy(path, backup_path);
    }
    let payload = serde_json::to_string_pretty(config)
        .map_err(|err| AppError::system(format!("Failed to serialize config: {err}"), trace_id))?;
    fs::write(path, payload)
        .map_err(|err| AppError::system(format!("Failed to write config: {err}"), trace_id))?;
    Ok(())
}

fn validate_config(mut config: AppConfig) -> AppConfig {
    let defaults = CommandSettings::default();
    if config.command.command_timeout < 1 {
        config.command.command_timeout = defaults.command_timeout;
    }
    if config.command.capture_timeout < 1 {
        config.command.capture_timeout = defaults.capture_timeout;
    }
    // Half-specified logical resolutions would scale one axis only.
    if config.session.logical_resolution().is_none() {
        config.session.logical_width = 0;
        config.session.logical_height = 0;
    }
    if config.screenshot.display_id < -1 {
        config.screenshot.display_id = -1;
    }
    if config.logging.log_level.trim().is_empty() {
        config.logging.log_level = LoggingSettings::default().log_level;
    }
    config
}
