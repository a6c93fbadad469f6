//! Configuration management for the ARTE add-on
//!
//! Handles config file loading/saving and language selection.
//! Config is stored at ~/.config/artetv/config.toml

use anyhow::Result;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::api::{DEFAULT_LANGUAGE, LANGUAGES};

/// Environment variable overriding the configured language
pub const LANGUAGE_ENV: &str = "ARTE_LANGUAGE";

/// Application configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Catalog language, one of the ARTE languages
    pub language: Option<String>,
    /// Directory holding the add-on icons
    pub media_dir: Option<PathBuf>,
}

impl Config {
    /// Get config file path (~/.config/artetv/config.toml)
    pub fn path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("artetv").join("config.toml"))
    }

    /// Load config from the default file, or return default if not found
    pub fn load() -> Self {
        Self::path()
            .map(|p| Self::load_from(&p))
            .unwrap_or_default()
    }

    /// Load config from a file, or return default if missing or invalid
    pub fn load_from(path: &Path) -> Self {
        std::fs::read_to_string(path)
            .ok()
            .and_then(|s| match toml::from_str(&s) {
                Ok(config) => Some(config),
                Err(e) => {
                    warn!("Ignoring invalid config {}: {}", path.display(), e);
                    None
                }
            })
            .unwrap_or_default()
    }

    /// Save config to the default file
    pub fn save(&self) -> Result<()> {
        let path = Self::path().ok_or_else(|| anyhow::anyhow!("Could not determine config path"))?;
        self.save_to(&path)
    }

    /// Save config to a file
    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Create parent directory if needed
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let toml = toml::to_string_pretty(self)?;
        std::fs::write(path, toml)?;
        Ok(())
    }

    /// Resolve the catalog language with fallback chain:
    /// 1. Environment variable ARTE_LANGUAGE
    /// 2. Saved language setting
    /// 3. System language when ARTE serves it (saved as the new setting)
    /// 4. English
    ///
    /// Unsupported values at any step are skipped.
    pub fn resolve_language(&mut self, system_language: Option<&str>) -> String {
        if let Some(language) = std::env::var(LANGUAGE_ENV).ok().and_then(supported) {
            return language;
        }

        if let Some(language) = self.language.clone().and_then(supported) {
            return language;
        }

        let language = system_language
            .map(str::to_string)
            .and_then(supported)
            .unwrap_or_else(|| DEFAULT_LANGUAGE.to_string());

        debug!("Using language {}", language);
        self.language = Some(language.clone());
        language
    }

    /// Media directory, relative to the working directory by default
    pub fn media_dir(&self) -> PathBuf {
        self.media_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from("resources").join("media"))
    }
}

/// Normalize a language code, keeping it only if ARTE serves it
pub fn supported(language: String) -> Option<String> {
    let language = language.trim().to_lowercase();
    LANGUAGES
        .contains(&language.as_str())
        .then_some(language)
}

/// Two-letter system language from the POSIX locale variables
pub fn system_language() -> Option<String> {
    ["LC_ALL", "LC_MESSAGES", "LANG"]
        .iter()
        .filter_map(|var| std::env::var(var).ok())
        .find(|value| !value.is_empty() && value != "C" && value != "POSIX")
        .and_then(|value| value.get(..2).map(str::to_lowercase))
}
