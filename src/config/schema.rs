use crate::engine::{AmbiguityPolicy, EngineOptions};
use crate::locator::LocatorOptions;
use serde::Deserialize;
use std::fmt;
use std::path::PathBuf;

/// Top-level `smart-edit` configuration file.
#[derive(Debug, Deserialize, Default, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct EditConfig {
    #[serde(default)]
    pub engine: EngineSection,
    #[serde(default)]
    pub locator: LocatorSection,
    #[serde(default)]
    pub workspace: WorkspaceSection,
}

#[derive(Debug, Deserialize, Default, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct EngineSection {
    #[serde(default)]
    pub ambiguity: AmbiguityPolicy,
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct LocatorSection {
    #[serde(default)]
    pub case_sensitive: bool,
    #[serde(default = "default_max_results")]
    pub max_results: usize,
    #[serde(default)]
    pub include_hidden: bool,
    #[serde(default)]
    pub context: usize,
}

fn default_max_results() -> usize {
    1000
}

impl Default for LocatorSection {
    fn default() -> Self {
        Self {
            case_sensitive: false,
            max_results: default_max_results(),
            include_hidden: false,
            context: 0,
        }
    }
}

#[derive(Debug, Deserialize, Default, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct WorkspaceSection {
    /// Enables the workspace guard for tool invocations when set
    #[serde(default)]
    pub root: Option<PathBuf>,
    /// Directories under `root` tools may never edit (`.git` is implied)
    #[serde(default)]
    pub forbidden: Vec<PathBuf>,
}

impl EditConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut issues = Vec::new();

        if self.locator.max_results == 0 {
            issues.push(ValidationIssue::OutOfRange {
                field: "locator.max_results",
                message: "must be greater than zero".to_string(),
            });
        }

        for entry in &self.workspace.forbidden {
            if entry.as_os_str().is_empty() {
                issues.push(ValidationIssue::OutOfRange {
                    field: "workspace.forbidden",
                    message: "entries must not be empty".to_string(),
                });
            } else if entry.is_absolute() {
                issues.push(ValidationIssue::OutOfRange {
                    field: "workspace.forbidden",
                    message: format!(
                        "'{}' must be relative to the workspace root",
                        entry.display()
                    ),
                });
            }
        }

        if !self.workspace.forbidden.is_empty() && self.workspace.root.is_none() {
            issues.push(ValidationIssue::InvalidCombo {
                message: "workspace.forbidden requires workspace.root".to_string(),
            });
        }

        if issues.is_empty() {
            Ok(())
        } else {
            Err(ValidationError { issues })
        }
    }

    pub fn engine_options(&self) -> EngineOptions {
        EngineOptions {
            ambiguity: self.engine.ambiguity,
        }
    }

    pub fn locator_options(&self) -> LocatorOptions {
        LocatorOptions {
            case_sensitive: self.locator.case_sensitive,
            max_results: self.locator.max_results,
            include_hidden: self.locator.include_hidden,
            context: self.locator.context,
            ..LocatorOptions::default()
        }
    }
}

#[derive(Debug, Clone)]
pub struct ValidationError {
    pub issues: Vec<ValidationIssue>,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, issue) in self.issues.iter().enumerate() {
            if idx > 0 {
                writeln!(f)?;
            }
            write!(f, "{issue}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

#[derive(Debug, Clone)]
pub enum ValidationIssue {
    OutOfRange { field: &'static str, message: String },
    InvalidCombo { message: String },
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationIssue::OutOfRange { field, message } => {
                write!(f, "invalid value for '{field}': {message}")
            }
            ValidationIssue::InvalidCombo { message } => {
                write!(f, "invalid configuration: {message}")
            }
        }
    }
}
