//! Smart Edit: self-healing find-and-replace for text files
//!
//! Callers (usually automated agents) quote a region of a file from memory and
//! ask for it to be replaced. The quote is often slightly wrong: different
//! indentation, collapsed whitespace, a missing trailing newline. The engine
//! absorbs that drift instead of failing the edit.
//!
//! # Architecture
//!
//! Every edit goes through a fixed ladder of matching [`Strategy`]s, from
//! highest to lowest fidelity:
//!
//! 1. `exact`: literal substring match
//! 2. `flexible`: line-by-line match ignoring leading and trailing whitespace,
//!    replacement re-indented onto the matched block
//! 3. `regex-token`: whitespace-agnostic match on the excerpt's tokens
//!
//! The first strategy to match wins. Only the first occurrence is edited.
//!
//! # Safety
//!
//! - The target file is read once and written at most once
//! - Atomic file writes (tempfile + fsync + rename)
//! - Failed edits leave the file byte-for-byte untouched
//! - Line endings and the trailing newline of the file are preserved
//! - Optional workspace boundary enforcement for tool callers
//!
//! # Example
//!
//! ```no_run
//! use smart_edit::{PatchEngine, PatchRequest};
//!
//! let engine = PatchEngine::default();
//! let outcome = engine.apply(&PatchRequest::new(
//!     "src/app.py",
//!     "if x:\n    print(1)",
//!     "if x:\n    print(2)",
//! ));
//!
//! match outcome.strategy_used() {
//!     Some(strategy) => println!("edited using {strategy}"),
//!     None => eprintln!("{outcome}"),
//! }
//! ```

pub mod closest;
pub mod config;
pub mod engine;
pub mod locator;
pub mod safety;
pub mod strategy;
pub mod text;
pub mod tool;

// Re-exports
pub use closest::ClosestMatch;
pub use config::{discover, load_from_path, load_from_str, ConfigError, EditConfig};
pub use engine::{
    AmbiguityPolicy, EngineOptions, PatchEngine, PatchError, PatchOutcome, PatchRequest,
    Replacement,
};
pub use locator::{Locator, LocatorError, LocatorMatch, LocatorOptions, Matches};
pub use safety::{SafetyError, WorkspaceGuard};
pub use strategy::{Strategy, StrategyOutcome};
pub use text::LineEnding;
pub use tool::{SearchTool, SmartEditTool, Tool, ToolOutput, Toolbox};
