// Engine configuration.
//
// Default location: `~/.folio/config.toml`. Every field is optional in the
// file; missing fields fall back to `EngineConfig::default()`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use folio_common::window::DEFAULT_WINDOW_CAPACITY;

/// Root directory for Folio state: `~/.folio/`.
pub fn global_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(".folio"))
}

/// Path to the config file: `~/.folio/config.toml`.
pub fn default_config_path() -> Option<PathBuf> {
    global_dir().map(|d| d.join("config.toml"))
}

/// Path to the page database when none is configured: `~/.folio/folio.db`.
pub fn default_database_path() -> Option<PathBuf> {
    global_dir().map(|d| d.join("folio.db"))
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// SQLite database file. Falls back to `~/.folio/folio.db`.
    pub database_path: Option<PathBuf>,
    /// Version entries kept inline per document before archiving.
    pub window_capacity: usize,
    /// Prepended to the source title when a copy is not given one.
    pub copy_title_prefix: String,
    /// Characters of content shown in listings.
    pub summary_chars: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            database_path: None,
            window_capacity: DEFAULT_WINDOW_CAPACITY,
            copy_title_prefix: "Copy of ".into(),
            summary_chars: 200,
        }
    }
}

impl EngineConfig {
    /// Load from `path`, or from `~/.folio/config.toml` when `path` is `None`.
    /// A missing file yields defaults; a malformed one is an error.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let resolved = match path {
            Some(path) => path.to_path_buf(),
            None => match default_config_path() {
                Some(path) => path,
                None => return Ok(Self::default()),
            },
        };
        if !resolved.exists() {
            if path.is_some() {
                return Err(ConfigError::Io(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("config file `{}` does not exist", resolved.display()),
                )));
            }
            return Ok(Self::default());
        }
        Self::load_from(&resolved)
    }

    /// Load and validate a specific file.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(ConfigError::Io)?;
        let config: Self = toml::from_str(&contents).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    /// Save to a specific path (creates parent directories).
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(ConfigError::Io)?;
        }
        let contents = toml::to_string_pretty(self).map_err(ConfigError::Serialize)?;
        std::fs::write(path, contents).map_err(ConfigError::Io)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.window_capacity == 0 {
            return Err(ConfigError::Invalid("window_capacity must be at least 1".into()));
        }
        Ok(())
    }

    /// Configured database path, else the default under `~/.folio/`.
    pub fn resolved_database_path(&self) -> Option<PathBuf> {
        self.database_path.clone().or_else(default_database_path)
    }
}

// ── Errors ─────────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config I/O error: {0}")]
    Io(std::io::Error),
    #[error("config parse error: {0}")]
    Parse(toml::de::Error),
    #[error("config serialize error: {0}")]
    Serialize(toml::ser::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}
