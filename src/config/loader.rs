//! Reading `smart-edit` settings from TOML.

use crate::config::schema::{EditConfig, ValidationError};
use std::env;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV: &str = "SMART_EDIT_CONFIG";

/// Per-project config file name, looked up in the current directory.
pub const PROJECT_CONFIG: &str = ".smart-edit.toml";

/// Why a settings file could not be turned into an [`EditConfig`].
///
/// `origin` is the file the settings came from; it is `None` for settings
/// parsed straight from a string.
#[derive(Debug)]
pub enum ConfigError {
    Unreadable {
        origin: PathBuf,
        source: std::io::Error,
    },
    Malformed {
        origin: Option<PathBuf>,
        source: toml_edit::de::Error,
    },
    Rejected {
        origin: Option<PathBuf>,
        source: ValidationError,
    },
}

impl ConfigError {
    /// Attach the file the settings were read from, unless one is already set.
    fn located_at(self, file: &Path) -> Self {
        match self {
            ConfigError::Malformed {
                origin: None,
                source,
            } => ConfigError::Malformed {
                origin: Some(file.to_path_buf()),
                source,
            },
            ConfigError::Rejected {
                origin: None,
                source,
            } => ConfigError::Rejected {
                origin: Some(file.to_path_buf()),
                source,
            },
            other => other,
        }
    }

    /// The settings file involved, if the settings came from one.
    pub fn origin(&self) -> Option<&Path> {
        match self {
            ConfigError::Unreadable { origin, .. } => Some(origin),
            ConfigError::Malformed { origin, .. } | ConfigError::Rejected { origin, .. } => {
                origin.as_deref()
            }
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let origin = self
            .origin()
            .map(|file| file.display().to_string())
            .unwrap_or_else(|| "<inline settings>".to_string());
        match self {
            ConfigError::Unreadable { source, .. } => {
                write!(f, "cannot open settings file {origin}: {source}")
            }
            ConfigError::Malformed { source, .. } => {
                write!(f, "{origin} is not valid smart-edit TOML: {source}")
            }
            ConfigError::Rejected { source, .. } => {
                write!(f, "{origin} has unusable settings:\n{source}")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Unreadable { source, .. } => Some(source),
            ConfigError::Malformed { source, .. } => Some(source),
            ConfigError::Rejected { source, .. } => Some(source),
        }
    }
}

/// Parse and check settings held in memory.
pub fn load_from_str(input: &str) -> Result<EditConfig, ConfigError> {
    let config: EditConfig =
        toml_edit::de::from_str(input).map_err(|source| ConfigError::Malformed {
            origin: None,
            source,
        })?;
    config.validate().map_err(|source| ConfigError::Rejected {
        origin: None,
        source,
    })?;
    Ok(config)
}

/// Parse and check one settings file; errors name the file.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<EditConfig, ConfigError> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).map_err(|source| ConfigError::Unreadable {
        origin: path.to_path_buf(),
        source,
    })?;
    load_from_str(&text).map_err(|err| err.located_at(path))
}

/// Candidate config files in priority order.
///
/// 1. `$SMART_EDIT_CONFIG`
/// 2. `./.smart-edit.toml`
/// 3. `~/.config/smart-edit/config.toml`
pub fn candidate_paths() -> Vec<PathBuf> {
    let mut candidates = Vec::new();

    if let Some(explicit) = env::var_os(CONFIG_ENV) {
        candidates.push(PathBuf::from(explicit));
    }
    if let Ok(cwd) = env::current_dir() {
        candidates.push(cwd.join(PROJECT_CONFIG));
    }
    if let Some(home) = home::home_dir() {
        candidates.push(home.join(".config/smart-edit/config.toml"));
    }

    candidates
}

/// Load the first config file that exists, or the built-in defaults.
///
/// An explicit `path` wins and must exist.
pub fn discover(path: Option<&Path>) -> Result<EditConfig, ConfigError> {
    if let Some(path) = path {
        return load_from_path(path);
    }

    for candidate in candidate_paths() {
        if candidate.is_file() {
            tracing::debug!(path = %candidate.display(), "loading config");
            return load_from_path(&candidate);
        }
    }

    tracing::debug!("no config file found, using defaults");
    Ok(EditConfig::default())
}
