//! Configuration management for stride
//!
//! Stores settings in ~/.config/stride/config.json

use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use stride_core::matcher::{MatchConfig, DEFAULT_MAX_SUGGESTIONS};
use tracing::warn;

/// Environment override for `max_suggestions`
pub const MAX_SUGGESTIONS_ENV: &str = "STRIDE_MAX_SUGGESTIONS";

const MAX_SUGGESTIONS_LIMIT: usize = 500;
const DEFAULT_MAX_FILE_BYTES: u64 = 2 * 1024 * 1024;
const MAX_FILE_BYTES_LIMIT: u64 = 64 * 1024 * 1024;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Cap on suggestions per editing session
    pub max_suggestions: usize,
    /// Only propagate renames to tokens of the exact same role
    pub strict_roles: bool,
    /// Word-bounded text matching for files without a grammar
    pub plain_text_fallback: bool,
    /// Merge edits separated only by identifier characters
    pub merge_within_token: bool,
    /// Larger files are refused by `predict`
    pub max_file_bytes: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_suggestions: DEFAULT_MAX_SUGGESTIONS,
            strict_roles: true,
            plain_text_fallback: true,
            merge_within_token: true,
            max_file_bytes: DEFAULT_MAX_FILE_BYTES,
        }
    }
}

impl Config {
    fn sanitize(&mut self) {
        self.max_suggestions = self.max_suggestions.clamp(1, MAX_SUGGESTIONS_LIMIT);
        if self.max_file_bytes == 0 {
            self.max_file_bytes = DEFAULT_MAX_FILE_BYTES;
        }
        self.max_file_bytes = self.max_file_bytes.min(MAX_FILE_BYTES_LIMIT);
    }

    /// Get the config directory path
    fn config_dir() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("stride"))
    }

    /// Get the config file path
    fn config_path() -> Option<PathBuf> {
        Self::config_dir().map(|p| p.join("config.json"))
    }

    /// Load config from disk, or return default
    pub fn load() -> Self {
        let mut config = match Self::config_path() {
            Some(path) => Self::read_from(&path),
            None => Self::default(),
        };
        config.apply_max_suggestions_override(std::env::var(MAX_SUGGESTIONS_ENV).ok());
        config.sanitize();
        config
    }

    /// Load config from an explicit file, without environment overrides.
    pub fn load_from(path: &Path) -> Self {
        let mut config = Self::read_from(path);
        config.sanitize();
        config
    }

    fn read_from(path: &Path) -> Self {
        let Ok(content) = fs::read_to_string(path) else {
            return Self::default();
        };
        match serde_json::from_str::<Config>(&content) {
            Ok(config) => config,
            Err(err) => {
                preserve_corrupt_config(path, &content);
                warn!(
                    "Config file was corrupted ({}). A backup was saved and defaults were loaded.",
                    err
                );
                Self::default()
            }
        }
    }

    fn apply_max_suggestions_override(&mut self, raw: Option<String>) {
        let Some(raw) = raw else {
            return;
        };
        match raw.trim().parse::<usize>() {
            Ok(value) => self.max_suggestions = value,
            Err(_) => warn!("Ignoring {}={:?}: not a number", MAX_SUGGESTIONS_ENV, raw),
        }
    }

    /// Save config to disk
    pub fn save(&self) -> Result<(), String> {
        let dir =
            Self::config_dir().ok_or_else(|| "Could not determine config directory".to_string())?;
        self.save_to(&dir.join("config.json"))
    }

    /// Save config to an explicit file, creating its directory.
    pub fn save_to(&self, path: &Path) -> Result<(), String> {
        let mut sanitized = self.clone();
        sanitized.sanitize();

        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)
                .map_err(|e| format!("Failed to create config directory: {}", e))?;

            #[cfg(unix)]
            {
                use std::os::unix::fs::PermissionsExt;
                if let Err(e) = fs::set_permissions(dir, fs::Permissions::from_mode(0o700)) {
                    warn!("Failed to set config directory permissions: {}", e);
                }
            }
        }

        let content = serde_json::to_string_pretty(&sanitized)
            .map_err(|e| format!("Failed to serialize config: {}", e))?;

        #[cfg(unix)]
        {
            write_config_atomic(path, &content)
                .map_err(|e| format!("Failed to write config: {}", e))?;
        }

        #[cfg(not(unix))]
        {
            fs::write(path, content).map_err(|e| format!("Failed to write config: {}", e))?;
        }

        Ok(())
    }

    /// Matcher settings derived from this config
    pub fn matcher_config(&self) -> MatchConfig {
        MatchConfig {
            max_suggestions: self.max_suggestions,
            strict_roles: self.strict_roles,
            plain_text_fallback: self.plain_text_fallback,
        }
    }

    /// Get the config file location for display
    pub fn config_location() -> String {
        Self::config_path()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "~/.config/stride/config.json".to_string())
    }
}

fn preserve_corrupt_config(path: &Path, content: &str) {
    let corrupt_path = path.with_extension("json.corrupt");
    if fs::rename(path, &corrupt_path).is_err() {
        let _ = fs::write(&corrupt_path, content);
    }
}

#[cfg(unix)]
fn write_config_atomic(path: &Path, content: &str) -> Result<(), String> {
    use std::fs::OpenOptions;
    use std::os::unix::fs::PermissionsExt;

    let tmp_path = path.with_extension("tmp");
    let mut file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(&tmp_path)
        .map_err(|e| e.to_string())?;

    if let Err(e) = file.set_permissions(fs::Permissions::from_mode(0o600)) {
        warn!("Failed to set temp config file permissions: {}", e);
    }

    file.write_all(content.as_bytes())
        .map_err(|e| e.to_string())?;

    if let Err(err) = fs::rename(&tmp_path, path) {
        let _ = fs::remove_file(&tmp_path);
        return Err(err.to_string());
    }
    Ok(())
}
