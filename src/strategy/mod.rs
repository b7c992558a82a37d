//! Match strategies, tried from highest to lowest fidelity.
//!
//! Each strategy is a pure function over `(content, search, replacement)` that
//! either produces the complete rewritten file content or reports
//! [`StrategyOutcome::NoMatch`]. Strategies never touch the filesystem and
//! never fail: an excerpt they cannot place is simply not a match.
//!
//! The set is fixed and ordered ([`Strategy::ALL`]), so dispatch is a plain
//! `match` over a tagged enum rather than trait objects.

pub mod exact;
pub mod flexible;
pub mod regex_token;

use crate::text::restore_trailing_newline;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of one matching algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Strategy {
    /// Literal substring swap, no re-indentation
    Exact,
    /// Line-window match ignoring surrounding whitespace of each line
    Flexible,
    /// Token sequence match with arbitrary whitespace between tokens
    RegexToken,
}

/// Result of running a single strategy.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "StrategyOutcome should be checked for a match"]
pub enum StrategyOutcome {
    /// The excerpt was located; `content` is the full rewritten file.
    Matched {
        content: String,
        /// Non-overlapping occurrences this strategy saw. Only the first
        /// one is rewritten.
        occurrences: usize,
    },
    NoMatch,
}

impl StrategyOutcome {
    pub fn is_match(&self) -> bool {
        matches!(self, StrategyOutcome::Matched { .. })
    }
}

impl Strategy {
    /// Strategies in the order the engine tries them.
    pub const ALL: [Strategy; 3] = [Strategy::Exact, Strategy::Flexible, Strategy::RegexToken];

    pub fn name(self) -> &'static str {
        match self {
            Strategy::Exact => "exact",
            Strategy::Flexible => "flexible",
            Strategy::RegexToken => "regex-token",
        }
    }

    /// Run this strategy and normalize the terminal newline of a match to
    /// the original content's convention.
    pub fn run(self, content: &str, search: &str, replacement: &str) -> StrategyOutcome {
        let raw = match self {
            Strategy::Exact => exact::replace(content, search, replacement),
            Strategy::Flexible => flexible::replace(content, search, replacement),
            Strategy::RegexToken => regex_token::replace(content, search, replacement),
        };

        match raw {
            StrategyOutcome::Matched {
                content: modified,
                occurrences,
            } => StrategyOutcome::Matched {
                content: restore_trailing_newline(content, modified),
                occurrences,
            },
            StrategyOutcome::NoMatch => StrategyOutcome::NoMatch,
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
