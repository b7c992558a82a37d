//! Patch engine: strategy sequencing plus the read-modify-write cycle.
//!
//! The engine is stateless. Every call reads the target file once, tries
//! [`Strategy::ALL`] in order, and writes at most once. Expected failures are
//! returned as [`PatchOutcome::Failed`] values, never as panics.

use crate::closest::{find_closest, ClosestMatch};
use crate::strategy::{Strategy, StrategyOutcome};
use serde::Deserialize;
use std::fmt;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// One edit attempt: replace `search_excerpt` in `path` with `replacement_excerpt`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchRequest {
    /// Existing file to edit. The engine never creates files.
    pub path: PathBuf,
    pub search_excerpt: String,
    /// Indentation inside the replacement is relative; the flexible and
    /// regex-token strategies re-base it onto the matched location.
    pub replacement_excerpt: String,
}

impl PatchRequest {
    pub fn new(
        path: impl Into<PathBuf>,
        search_excerpt: impl Into<String>,
        replacement_excerpt: impl Into<String>,
    ) -> Self {
        Self {
            path: path.into(),
            search_excerpt: search_excerpt.into(),
            replacement_excerpt: replacement_excerpt.into(),
        }
    }
}

/// What to do when the winning strategy sees the excerpt more than once.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AmbiguityPolicy {
    /// Edit the first occurrence and carry on
    #[default]
    FirstMatch,
    /// Refuse the edit with [`PatchError::AmbiguousMatch`]
    Reject,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EngineOptions {
    pub ambiguity: AmbiguityPolicy,
}

#[derive(Error, Debug)]
pub enum PatchError {
    #[error("File not found or unreadable: {}: {source}", .path.display())]
    NotFound {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Search excerpt is empty")]
    EmptySearch,

    #[error(
        "Could not find string to replace (tried: {}){}",
        strategy_list(.attempted),
        closest_hint(.closest)
    )]
    NoMatch {
        attempted: Vec<Strategy>,
        closest: Option<ClosestMatch>,
    },

    #[error("Search excerpt matched {occurrences} locations using {strategy} strategy (expected 1)")]
    AmbiguousMatch {
        strategy: Strategy,
        occurrences: usize,
    },

    #[error("Failed to write {}: {source}", .path.display())]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

fn strategy_list(strategies: &[Strategy]) -> String {
    strategies
        .iter()
        .map(|s| s.name())
        .collect::<Vec<_>>()
        .join(", ")
}

fn closest_hint(closest: &Option<ClosestMatch>) -> String {
    closest
        .as_ref()
        .map(|c| format!("; {c}"))
        .unwrap_or_default()
}

/// Rewritten content chosen by the first matching strategy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Replacement {
    pub strategy: Strategy,
    pub content: String,
    pub occurrences: usize,
}

/// Result of one [`PatchEngine::apply`] call.
#[derive(Debug)]
#[must_use = "PatchOutcome should be checked for success/failure"]
pub enum PatchOutcome {
    Applied {
        path: PathBuf,
        strategy: Strategy,
        new_content: String,
        /// Occurrences the winning strategy saw; only the first was edited.
        occurrences: usize,
        /// False when the rewrite was byte-identical and nothing was written.
        changed: bool,
    },
    Failed {
        path: PathBuf,
        reason: PatchError,
        /// Computed content when the failure happened while persisting it.
        new_content: Option<String>,
    },
}

impl PatchOutcome {
    pub fn succeeded(&self) -> bool {
        matches!(self, PatchOutcome::Applied { .. })
    }

    pub fn path(&self) -> &Path {
        match self {
            PatchOutcome::Applied { path, .. } | PatchOutcome::Failed { path, .. } => path,
        }
    }

    pub fn strategy_used(&self) -> Option<Strategy> {
        match self {
            PatchOutcome::Applied { strategy, .. } => Some(*strategy),
            PatchOutcome::Failed { .. } => None,
        }
    }

    pub fn new_content(&self) -> Option<&str> {
        match self {
            PatchOutcome::Applied { new_content, .. } => Some(new_content),
            PatchOutcome::Failed { new_content, .. } => new_content.as_deref(),
        }
    }

    pub fn failure_reason(&self) -> Option<&PatchError> {
        match self {
            PatchOutcome::Applied { .. } => None,
            PatchOutcome::Failed { reason, .. } => Some(reason),
        }
    }
}

impl fmt::Display for PatchOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PatchOutcome::Applied { path, strategy, .. } => {
                write!(f, "Edited {} using strategy: {}", path.display(), strategy)
            }
            PatchOutcome::Failed { path, reason, .. } => {
                write!(f, "Failed to edit {}: {}", path.display(), reason)
            }
        }
    }
}

/// Stateless find-and-replace engine with progressive matching fidelity.
#[derive(Debug, Clone, Default)]
pub struct PatchEngine {
    options: EngineOptions,
}

impl PatchEngine {
    pub fn new(options: EngineOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    /// Locate the excerpt and rewrite the file.
    ///
    /// Writes zero or one time; the write is atomic (tempfile + fsync + rename).
    pub fn apply(&self, request: &PatchRequest) -> PatchOutcome {
        self.run(request, true)
    }

    /// Same as [`apply`](Self::apply) without touching the file.
    pub fn preview(&self, request: &PatchRequest) -> PatchOutcome {
        self.run(request, false)
    }

    /// Run the strategies against in-memory content.
    pub fn compute(
        &self,
        content: &str,
        search: &str,
        replacement: &str,
    ) -> Result<Replacement, PatchError> {
        if search.is_empty() {
            return Err(PatchError::EmptySearch);
        }

        for strategy in Strategy::ALL {
            match strategy.run(content, search, replacement) {
                StrategyOutcome::Matched {
                    content: rewritten,
                    occurrences,
                } => {
                    if occurrences > 1 {
                        match self.options.ambiguity {
                            AmbiguityPolicy::Reject => {
                                return Err(PatchError::AmbiguousMatch {
                                    strategy,
                                    occurrences,
                                });
                            }
                            AmbiguityPolicy::FirstMatch => {
                                tracing::warn!(
                                    %strategy,
                                    occurrences,
                                    "excerpt occurs more than once, editing the first occurrence"
                                );
                            }
                        }
                    }
                    return Ok(Replacement {
                        strategy,
                        content: rewritten,
                        occurrences,
                    });
                }
                StrategyOutcome::NoMatch => {
                    tracing::debug!(%strategy, "strategy found no match");
                }
            }
        }

        Err(PatchError::NoMatch {
            attempted: Strategy::ALL.to_vec(),
            closest: find_closest(content, search),
        })
    }

    fn run(&self, request: &PatchRequest, write: bool) -> PatchOutcome {
        let path = request.path.clone();

        if request.search_excerpt.is_empty() {
            return PatchOutcome::Failed {
                path,
                reason: PatchError::EmptySearch,
                new_content: None,
            };
        }

        let original = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(source) => {
                return PatchOutcome::Failed {
                    reason: PatchError::NotFound {
                        path: path.clone(),
                        source,
                    },
                    path,
                    new_content: None,
                };
            }
        };

        let replacement = match self.compute(
            &original,
            &request.search_excerpt,
            &request.replacement_excerpt,
        ) {
            Ok(replacement) => replacement,
            Err(reason) => {
                tracing::debug!(path = %path.display(), %reason, "edit not applied");
                return PatchOutcome::Failed {
                    path,
                    reason,
                    new_content: None,
                };
            }
        };

        let changed = replacement.content != original;
        if write && changed {
            if let Err(source) = atomic_write(&path, replacement.content.as_bytes()) {
                return PatchOutcome::Failed {
                    reason: PatchError::WriteFailed {
                        path: path.clone(),
                        source,
                    },
                    path,
                    new_content: Some(replacement.content),
                };
            }
            tracing::info!(
                path = %path.display(),
                strategy = %replacement.strategy,
                "edit applied"
            );
        }

        PatchOutcome::Applied {
            path,
            strategy: replacement.strategy,
            new_content: replacement.content,
            occurrences: replacement.occurrences,
            changed,
        }
    }
}

/// Atomic file write: tempfile + fsync + rename.
///
/// Symlinks are followed so the link's target is rewritten and the link
/// itself survives. The temp file lives next to that target so the rename
/// never crosses filesystems. The target's permissions are carried over and
/// its mtime is bumped so file watchers notice the change.
fn atomic_write(path: &Path, content: &[u8]) -> io::Result<()> {
    let target = fs::canonicalize(path)?;
    let parent = match target.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    let permissions = fs::metadata(&target)?.permissions();

    let mut temp = tempfile::NamedTempFile::new_in(parent)?;
    temp.write_all(content)?;
    temp.as_file().sync_all()?;
    fs::set_permissions(temp.path(), permissions)?;
    temp.persist(&target).map_err(|e| e.error)?;

    bump_mtime(&target);
    Ok(())
}

/// Runs after the rename, so the edit already landed; failure only warns.
fn bump_mtime(path: &Path) {
    if let Err(err) = filetime::set_file_mtime(path, filetime::FileTime::now()) {
        tracing::warn!(path = %path.display(), error = %err, "could not update mtime");
    }
}
