//! Line-oriented pattern search over a directory tree.
//!
//! The locator is what a caller runs before an edit: it finds which file holds
//! an excerpt and what the line actually looks like, so the excerpt handed to
//! the [`PatchEngine`](crate::PatchEngine) can be copied verbatim.
//!
//! Results are produced lazily. Files are visited in file-name order and read
//! one at a time; unreadable and non-UTF-8 files are skipped. Paths excluded
//! by `.gitignore`, `.ignore` and git exclude files are never searched.

use regex::{Regex, RegexBuilder};
use serde::Serialize;
use ignore::{DirEntry, WalkBuilder};
use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocatorOptions {
    pub case_sensitive: bool,
    /// Treat the pattern as a literal string instead of a regex
    pub fixed_strings: bool,
    /// Only search files whose name or root-relative path matches this glob
    pub glob: Option<String>,
    /// Lines of context captured on each side of a match
    pub context: usize,
    pub include_hidden: bool,
    /// Stop after this many matches
    pub max_results: usize,
}

impl Default for LocatorOptions {
    fn default() -> Self {
        Self {
            case_sensitive: false,
            fixed_strings: false,
            glob: None,
            context: 0,
            include_hidden: false,
            max_results: 1000,
        }
    }
}

#[derive(Error, Debug)]
pub enum LocatorError {
    #[error("Search root does not exist: {}", .0.display())]
    RootNotFound(PathBuf),

    #[error("Invalid search pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    #[error("Invalid glob pattern: {0}")]
    InvalidGlob(#[from] glob::PatternError),
}

/// One matching line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LocatorMatch {
    pub file: PathBuf,
    /// 1-based
    pub line_number: usize,
    /// Matched line without its terminator
    pub line: String,
    pub context_before: Vec<String>,
    pub context_after: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct Locator {
    options: LocatorOptions,
}

impl Locator {
    pub fn new(options: LocatorOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &LocatorOptions {
        &self.options
    }

    /// Start a search for `pattern` under `root` (a directory or a single file).
    pub fn search(&self, pattern: &str, root: impl AsRef<Path>) -> Result<Matches, LocatorError> {
        let root = root.as_ref();
        if !root.exists() {
            return Err(LocatorError::RootNotFound(root.to_path_buf()));
        }

        let source = if self.options.fixed_strings {
            regex::escape(pattern)
        } else {
            pattern.to_string()
        };
        let regex = RegexBuilder::new(&source)
            .case_insensitive(!self.options.case_sensitive)
            .build()?;

        let glob = self
            .options
            .glob
            .as_deref()
            .map(glob::Pattern::new)
            .transpose()?;

        let walker = WalkBuilder::new(root)
            .hidden(!self.options.include_hidden)
            .require_git(false)
            .sort_by_file_name(|a, b| a.cmp(b))
            .filter_entry(|entry| !is_git_dir(entry))
            .build();

        Ok(Matches {
            root: root.to_path_buf(),
            walker,
            regex,
            glob,
            context: self.options.context,
            max_results: self.options.max_results,
            pending: VecDeque::new(),
            yielded: 0,
            truncated: false,
        })
    }
}

/// `.git` stays out of results even when hidden files are searched.
fn is_git_dir(entry: &DirEntry) -> bool {
    entry.depth() > 0
        && entry.file_name() == ".git"
        && entry.file_type().is_some_and(|ft| ft.is_dir())
}

/// Lazy iterator over [`LocatorMatch`]es.
pub struct Matches {
    root: PathBuf,
    walker: ignore::Walk,
    regex: Regex,
    glob: Option<glob::Pattern>,
    context: usize,
    max_results: usize,
    pending: VecDeque<LocatorMatch>,
    yielded: usize,
    truncated: bool,
}

impl Matches {
    /// Whether more matches existed past `max_results`.
    ///
    /// Only meaningful once the iterator has returned `None`.
    pub fn truncated(&self) -> bool {
        self.truncated
    }

    /// Walk forward until the next file with at least one match has been
    /// loaded into `pending`. Returns false when the tree is exhausted.
    fn fill(&mut self) -> bool {
        while self.pending.is_empty() {
            let entry = match self.walker.next() {
                Some(Ok(entry)) => entry,
                Some(Err(err)) => {
                    tracing::debug!(error = %err, "skipping unwalkable entry");
                    continue;
                }
                None => return false,
            };
            let is_file = entry.file_type().is_some_and(|ft| ft.is_file());
            if !is_file || !self.glob_allows(entry.path()) {
                continue;
            }
            self.scan_file(entry.path());
        }
        true
    }

    fn glob_allows(&self, path: &Path) -> bool {
        let Some(glob) = &self.glob else {
            return true;
        };
        let relative = path.strip_prefix(&self.root).unwrap_or(path);
        glob.matches_path(relative)
            || path
                .file_name()
                .map(|name| glob.matches(&name.to_string_lossy()))
                .unwrap_or(false)
    }

    fn scan_file(&mut self, path: &Path) {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(err) => {
                tracing::debug!(path = %path.display(), error = %err, "skipping unreadable file");
                return;
            }
        };

        let lines: Vec<&str> = content.lines().collect();
        for (idx, line) in lines.iter().enumerate() {
            if !self.regex.is_match(line) {
                continue;
            }
            let before_start = idx.saturating_sub(self.context);
            let after_end = (idx + 1 + self.context).min(lines.len());
            self.pending.push_back(LocatorMatch {
                file: path.to_path_buf(),
                line_number: idx + 1,
                line: line.to_string(),
                context_before: lines[before_start..idx].iter().map(|l| l.to_string()).collect(),
                context_after: lines[idx + 1..after_end]
                    .iter()
                    .map(|l| l.to_string())
                    .collect(),
            });
        }
    }
}

impl Iterator for Matches {
    type Item = LocatorMatch;

    fn next(&mut self) -> Option<LocatorMatch> {
        if self.yielded >= self.max_results {
            if !self.truncated && self.fill() {
                self.truncated = true;
            }
            return None;
        }
        if !self.fill() {
            return None;
        }
        self.yielded += 1;
        self.pending.pop_front()
    }
}
