use anyhow::{Context, Result};
use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{LazyLock, PoisonError, RwLock};

use crate::print::{DEFAULT_NOTE_DATE_FORMAT, DEFAULT_PRINT_QUALITY, DEFAULT_SORT_STRATEGY, WatermarkConfig};

pub const CURRENT_VERSION: u32 = 2;
const SETTINGS_FILENAME: &str = "config.yaml";
const APP_NAME: &str = "printdeck";

const SETTINGS_HEADER: &str = r#"# ============================================================================
# printdeck settings
# ============================================================================
# print_quality:    canvas multiplier used while rendering pages for print
# sort_strategy:    order of notes on notes pages ("position" or "time")
# include_comments: print a notes page after every page that has notes
# date_format:      strftime format of note timestamps
# default_watermark: watermark applied when the document has none

"#;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_version")]
    pub version: u32,

    #[serde(default = "default_print_quality")]
    pub print_quality: f32,

    #[serde(default = "default_sort_strategy")]
    pub sort_strategy: String,

    #[serde(default)]
    pub include_comments: bool,

    #[serde(default = "default_date_format")]
    pub date_format: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_watermark: Option<WatermarkConfig>,
}

fn default_version() -> u32 {
    CURRENT_VERSION
}

fn default_print_quality() -> f32 {
    DEFAULT_PRINT_QUALITY
}

fn default_sort_strategy() -> String {
    DEFAULT_SORT_STRATEGY.to_string()
}

fn default_date_format() -> String {
    DEFAULT_NOTE_DATE_FORMAT.to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: CURRENT_VERSION,
            print_quality: default_print_quality(),
            sort_strategy: default_sort_strategy(),
            include_comments: false,
            date_format: default_date_format(),
            default_watermark: None,
        }
    }
}

static SETTINGS: LazyLock<RwLock<Settings>> = LazyLock::new(|| RwLock::new(Settings::default()));

/// File the settings were last loaded from; saves go back there
static SETTINGS_PATH: LazyLock<RwLock<Option<PathBuf>>> = LazyLock::new(|| RwLock::new(None));

pub fn preferred_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|config| config.join(APP_NAME).join(SETTINGS_FILENAME))
}

/// Path settings are saved to
pub fn settings_path() -> Option<PathBuf> {
    SETTINGS_PATH
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .clone()
        .or_else(preferred_config_path)
}

pub fn load_settings() {
    let Some(path) = preferred_config_path() else {
        warn!("Could not determine config directory, using default settings");
        return;
    };

    if path.exists() {
        if let Err(e) = load_settings_from_path(&path) {
            error!("{e:#}");
        }
    } else {
        info!("Settings file not found, creating with defaults at {path:?}");
        remember_path(&path);
        if let Err(e) = save_settings_to_file(&current_settings(), &path) {
            error!("{e:#}");
        }
    }
}

/// Load settings from `path` into the process-wide settings, migrating files
/// written by older versions
pub fn load_settings_from_path(path: &Path) -> Result<()> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read settings file {path:?}"))?;
    let mut settings = serde_yaml::from_str::<Settings>(&content)
        .with_context(|| format!("Failed to parse settings file {path:?}"))?;
    debug!("Loaded settings from {path:?}");

    remember_path(path);

    if settings.version < CURRENT_VERSION {
        migrate_settings(&mut settings);
        save_settings_to_file(&settings, path)?;
    }
    validate_settings(&mut settings);

    *SETTINGS.write().unwrap_or_else(PoisonError::into_inner) = settings;
    Ok(())
}

fn remember_path(path: &Path) {
    *SETTINGS_PATH.write().unwrap_or_else(PoisonError::into_inner) = Some(path.to_path_buf());
}

fn migrate_settings(settings: &mut Settings) {
    info!(
        "Migrating settings from v{} to v{}",
        settings.version, CURRENT_VERSION
    );

    if settings.version < 2 {
        migrate_v1_to_v2(settings);
    }

    settings.version = CURRENT_VERSION;
}

/// v1 called the time ordering "date" and allowed a zero print quality
fn migrate_v1_to_v2(settings: &mut Settings) {
    if settings.sort_strategy == "date" {
        settings.sort_strategy = "time".to_string();
    }
    if !is_valid_print_quality(settings.print_quality) {
        settings.print_quality = DEFAULT_PRINT_QUALITY;
    }
}

/// Replace values no version accepts, whatever the file claims to be
fn validate_settings(settings: &mut Settings) {
    if !is_valid_print_quality(settings.print_quality) {
        warn!(
            "Invalid print quality {} in settings, using {DEFAULT_PRINT_QUALITY}",
            settings.print_quality
        );
        settings.print_quality = DEFAULT_PRINT_QUALITY;
    }
}

fn is_valid_print_quality(quality: f32) -> bool {
    quality.is_finite() && quality > 0.0
}

pub fn save_settings() {
    let Some(path) = settings_path() else {
        warn!("Could not determine config directory, cannot save settings");
        return;
    };

    if let Err(e) = save_settings_to_file(&current_settings(), &path) {
        error!("{e:#}");
    }
}

pub fn save_settings_to_file(settings: &Settings, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.exists() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory {parent:?}"))?;
        }
    }

    let content = generate_settings_yaml(settings)?;
    fs::write(path, content).with_context(|| format!("Failed to save settings to {path:?}"))?;
    debug!("Saved settings to {path:?}");
    Ok(())
}

fn generate_settings_yaml(settings: &Settings) -> Result<String> {
    let body = serde_yaml::to_string(settings).context("Failed to serialize settings")?;
    Ok(format!("{SETTINGS_HEADER}{body}"))
}

// Public API for accessing/modifying settings

/// Snapshot of the effective settings
pub fn current_settings() -> Settings {
    SETTINGS
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .clone()
}

pub fn get_print_quality() -> f32 {
    SETTINGS
        .read()
        .map(|s| s.print_quality)
        .unwrap_or_else(|_| default_print_quality())
}

pub fn set_print_quality(quality: f32) {
    if !is_valid_print_quality(quality) {
        warn!("Ignoring print quality {quality}");
        return;
    }
    if let Ok(mut settings) = SETTINGS.write() {
        settings.print_quality = quality;
    }
    save_settings();
}

pub fn get_sort_strategy() -> String {
    SETTINGS
        .read()
        .map(|s| s.sort_strategy.clone())
        .unwrap_or_else(|_| default_sort_strategy())
}

pub fn set_sort_strategy(strategy: &str) {
    if let Ok(mut settings) = SETTINGS.write() {
        settings.sort_strategy = strategy.to_string();
    }
    save_settings();
}

pub fn is_include_comments() -> bool {
    SETTINGS.read().map(|s| s.include_comments).unwrap_or(false)
}

pub fn set_include_comments(include: bool) {
    if let Ok(mut settings) = SETTINGS.write() {
        settings.include_comments = include;
    }
    save_settings();
}

pub fn get_note_date_format() -> String {
    SETTINGS
        .read()
        .map(|s| s.date_format.clone())
        .unwrap_or_else(|_| default_date_format())
}

pub fn set_note_date_format(format: &str) {
    if let Ok(mut settings) = SETTINGS.write() {
        settings.date_format = format.to_string();
    }
    save_settings();
}

pub fn get_default_watermark() -> Option<WatermarkConfig> {
    SETTINGS
        .read()
        .ok()
        .and_then(|s| s.default_watermark.clone())
}

pub fn set_default_watermark(watermark: Option<WatermarkConfig>) {
    if let Ok(mut settings) = SETTINGS.write() {
        settings.default_watermark = watermark;
    }
    save_settings();
}
