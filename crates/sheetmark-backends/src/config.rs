//! Sheetmark configuration and backend factory.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use sheetmark_core::session::DigitizationSession;
use sheetmark_core::traits::SheetRecognizer;

use crate::json_file::JsonFileStore;
use crate::sidecar::SidecarRecognizer;
use crate::simulated::SimulatedRecognizer;

/// Environment variable that overrides `store_path`.
pub const STORE_PATH_ENV: &str = "SHEETMARK_STORE_PATH";

/// Which recognizer turns scans into marks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum RecognizerConfig {
    Simulated {
        #[serde(default = "default_delay_ms")]
        delay_ms: u64,
        #[serde(default)]
        seed: u64,
    },
    Sidecar,
}

impl Default for RecognizerConfig {
    fn default() -> Self {
        RecognizerConfig::Simulated {
            delay_ms: default_delay_ms(),
            seed: 0,
        }
    }
}

fn default_delay_ms() -> u64 {
    1500
}

/// Top-level sheetmark configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SheetmarkConfig {
    /// JSON record store.
    #[serde(default = "default_store_path")]
    pub store_path: PathBuf,
    /// Question count of the starter pattern written by `sheetmark init`.
    #[serde(default = "default_questions")]
    pub default_questions: u32,
    #[serde(default = "default_series")]
    pub default_series: String,
    #[serde(default)]
    pub recognizer: RecognizerConfig,
}

fn default_store_path() -> PathBuf {
    PathBuf::from("./sheetmark-store.json")
}
fn default_questions() -> u32 {
    15
}
fn default_series() -> String {
    "Series 1".to_string()
}

impl Default for SheetmarkConfig {
    fn default() -> Self {
        Self {
            store_path: default_store_path(),
            default_questions: default_questions(),
            default_series: default_series(),
            recognizer: RecognizerConfig::default(),
        }
    }
}

impl SheetmarkConfig {
    /// Open the configured record store.
    pub fn open_store(&self) -> JsonFileStore {
        JsonFileStore::new(&self.store_path)
    }
}

/// Resolve environment variable references like `${VAR_NAME}` in a string.
///
/// Unset variables resolve to the empty string; an unterminated `${` is left
/// as-is.
fn resolve_env_vars(s: &str) -> String {
    let mut result = s.to_string();
    let mut from = 0;
    while let Some(offset) = result[from..].find("${") {
        let start = from + offset;
        let Some(len) = result[start..].find('}') else {
            break;
        };
        let value = std::env::var(&result[start + 2..start + len]).unwrap_or_default();
        result.replace_range(start..start + len + 1, &value);
        from = start + value.len();
    }
    result
}

fn apply_overrides(config: &mut SheetmarkConfig, store_path: Option<String>) {
    if let Some(path) = store_path.filter(|p| !p.trim().is_empty()) {
        config.store_path = PathBuf::from(path);
    }
    let resolved = resolve_env_vars(&config.store_path.to_string_lossy());
    config.store_path = PathBuf::from(resolved);
    config.default_series = resolve_env_vars(&config.default_series);
}

/// Load configuration from well-known paths.
///
/// Search order:
/// 1. `sheetmark.toml` in the current directory
/// 2. `~/.config/sheetmark/config.toml`
///
/// `SHEETMARK_STORE_PATH` overrides the store location.
pub fn load_config() -> Result<SheetmarkConfig> {
    load_config_from(None)
}

/// Load config from an explicit path, or search the default locations.
pub fn load_config_from(path: Option<&Path>) -> Result<SheetmarkConfig> {
    let config_path = match path {
        Some(p) if p.exists() => Some(p.to_path_buf()),
        Some(p) => anyhow::bail!("config file not found: {}", p.display()),
        None => {
            let local = PathBuf::from("sheetmark.toml");
            if local.exists() {
                Some(local)
            } else {
                dirs_path()
                    .map(|home| home.join("config.toml"))
                    .filter(|global| global.exists())
            }
        }
    };

    let mut config = match config_path {
        Some(path) => {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            let config = toml::from_str::<SheetmarkConfig>(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?;
            tracing::debug!(path = %path.display(), "loaded config");
            config
        }
        None => SheetmarkConfig::default(),
    };

    apply_overrides(&mut config, std::env::var(STORE_PATH_ENV).ok());
    Ok(config)
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("sheetmark"))
}

/// Create the configured recognizer for a session.
///
/// The simulated recognizer is primed with the session's pattern and the
/// roll suffixes of its pending students.
pub fn create_recognizer(
    config: &RecognizerConfig,
    session: &DigitizationSession,
) -> Box<dyn SheetRecognizer> {
    match config {
        RecognizerConfig::Simulated { delay_ms, seed } => Box::new(
            SimulatedRecognizer::for_session(session)
                .with_delay(Duration::from_millis(*delay_ms))
                .with_seed(*seed),
        ),
        RecognizerConfig::Sidecar => Box::new(SidecarRecognizer::new()),
    }
}
