use crate::error::PatternError;
use crate::DEFAULT_PATTERN;
use anyhow::{Context, Result};
use chrono::format::{Item, StrftimeItems};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_EXTENSIONS: &[&str] = &[
    "png", "jpg", "jpeg", "tiff", "bmp", "gif", "heic", "heif",
];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenameConfig {
    pub timestamp_pattern: String,
    pub accepted_extensions: BTreeSet<String>,
}

impl RenameConfig {
    pub fn new<P, I, S>(timestamp_pattern: P, accepted_extensions: I) -> Result<Self, PatternError>
    where
        P: Into<String>,
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let config = Self {
            timestamp_pattern: timestamp_pattern.into(),
            accepted_extensions: accepted_extensions
                .into_iter()
                .map(|ext| ext.as_ref().trim_start_matches('.').to_lowercase())
                .collect(),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), PatternError> {
        validate_pattern(&self.timestamp_pattern)
    }

    pub fn accepts(&self, path: &Path) -> bool {
        path.extension()
            .map(|ext| {
                self.accepted_extensions
                    .contains(&ext.to_string_lossy().to_lowercase())
            })
            .unwrap_or(false)
    }
}

impl Default for RenameConfig {
    fn default() -> Self {
        Self {
            timestamp_pattern: DEFAULT_PATTERN.to_string(),
            accepted_extensions: DEFAULT_EXTENSIONS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

pub fn validate_pattern(pattern: &str) -> Result<(), PatternError> {
    if pattern.trim().is_empty() {
        return Err(PatternError::Empty);
    }
    if StrftimeItems::new(pattern).any(|item| matches!(item, Item::Error)) {
        return Err(PatternError::Invalid(pattern.to_string()));
    }
    Ok(())
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub timestamp_pattern: String,
    pub accepted_extensions: Vec<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            timestamp_pattern: DEFAULT_PATTERN.to_string(),
            accepted_extensions: DEFAULT_EXTENSIONS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppPaths {
    pub config_dir: PathBuf,
    pub config_path: PathBuf,
}

pub fn app_paths() -> Result<AppPaths> {
    let proj = ProjectDirs::from("com", "shotstamp", "shotstamp")
        .context("OS標準設定ディレクトリを取得できませんでした")?;
    let config_dir = proj.config_dir().to_path_buf();
    Ok(AppPaths {
        config_path: config_dir.join("config.toml"),
        config_dir,
    })
}

pub fn load_config() -> Result<AppConfig> {
    let paths = app_paths()?;
    if !paths.config_path.exists() {
        return Ok(AppConfig::default());
    }

    let raw = fs::read_to_string(&paths.config_path).with_context(|| {
        format!(
            "設定ファイルを読めませんでした: {}",
            paths.config_path.display()
        )
    })?;

    let config = toml::from_str::<AppConfig>(&raw).context("設定ファイルのパースに失敗しました")?;
    Ok(config)
}

pub fn save_config(config: &AppConfig) -> Result<()> {
    let paths = app_paths()?;
    fs::create_dir_all(&paths.config_dir).with_context(|| {
        format!(
            "設定ディレクトリを作成できませんでした: {}",
            paths.config_dir.display()
        )
    })?;
    let body = toml::to_string_pretty(config).context("設定のシリアライズに失敗しました")?;
    fs::write(&paths.config_path, body).with_context(|| {
        format!(
            "設定ファイルを書き込めませんでした: {}",
            paths.config_path.display()
        )
    })?;
    Ok(())
}
