//! Adapters exposing the engine and the locator to agent loops and scripts.
//!
//! A tool takes JSON arguments and answers with one short status string. The
//! adapters do no matching of their own and never retry; deciding what to do
//! with a failure is the caller's job.

use crate::config::EditConfig;
use crate::engine::{PatchEngine, PatchOutcome, PatchRequest};
use crate::locator::{Locator, LocatorOptions};
use crate::safety::{SafetyError, WorkspaceGuard};
use serde::Deserialize;
use serde_json::{json, Value};
use std::fmt;
use std::path::PathBuf;

/// Status string returned by a tool, plus whether the call succeeded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolOutput {
    pub success: bool,
    pub text: String,
}

impl ToolOutput {
    fn ok(text: impl Into<String>) -> Self {
        Self {
            success: true,
            text: text.into(),
        }
    }

    fn err(text: impl Into<String>) -> Self {
        Self {
            success: false,
            text: text.into(),
        }
    }
}

impl fmt::Display for ToolOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// A named operation callable with JSON arguments.
pub trait Tool: Send + Sync {
    fn name(&self) -> &'static str;

    fn description(&self) -> &'static str;

    /// JSON schema of the accepted arguments
    fn parameters(&self) -> Value;

    fn invoke(&self, arguments: Value) -> ToolOutput;
}

fn parse_args<T: for<'de> Deserialize<'de>>(arguments: Value) -> Result<T, ToolOutput> {
    serde_json::from_value(arguments).map_err(|e| ToolOutput::err(format!("Invalid arguments: {e}")))
}

#[derive(Debug, Clone, Deserialize)]
pub struct SmartEditInput {
    #[serde(alias = "path")]
    pub file_path: String,
    pub old_string: String,
    pub new_string: String,
}

/// Edits a file through the [`PatchEngine`], tolerating indentation and
/// whitespace drift in `old_string`.
#[derive(Debug, Clone, Default)]
pub struct SmartEditTool {
    engine: PatchEngine,
    guard: Option<WorkspaceGuard>,
}

impl SmartEditTool {
    pub const NAME: &'static str = "smart_edit";

    pub fn new(engine: PatchEngine, guard: Option<WorkspaceGuard>) -> Self {
        Self { engine, guard }
    }

    /// Apply one edit and describe the result.
    pub fn run(&self, file_path: &str, old_string: &str, new_string: &str) -> String {
        self.execute(file_path, old_string, new_string).text
    }

    pub fn execute(&self, file_path: &str, old_string: &str, new_string: &str) -> ToolOutput {
        let target = match resolve(self.guard.as_ref(), file_path) {
            Ok(target) => target,
            Err(err) => return ToolOutput::err(format!("Failed to edit {file_path}: {err}")),
        };

        match self
            .engine
            .apply(&PatchRequest::new(target, old_string, new_string))
        {
            PatchOutcome::Applied { strategy, .. } => ToolOutput::ok(format!(
                "Successfully edited {file_path} using strategy: {strategy}"
            )),
            PatchOutcome::Failed { reason, .. } => {
                ToolOutput::err(format!("Failed to edit {file_path}: {reason}"))
            }
        }
    }
}

impl Tool for SmartEditTool {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn description(&self) -> &'static str {
        "Edit a file by replacing old_string with new_string. Tolerates indentation and \
         whitespace differences in old_string: exact match is tried first, then an \
         indentation-agnostic line match, then a whitespace-agnostic token match. \
         Only the first occurrence is replaced."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "file_path": {
                    "type": "string",
                    "description": "Path of the file to edit."
                },
                "old_string": {
                    "type": "string",
                    "description": "Text to replace. Should occur exactly once in the file."
                },
                "new_string": {
                    "type": "string",
                    "description": "Replacement text. Indentation is re-based onto the matched location."
                }
            },
            "required": ["file_path", "old_string", "new_string"]
        })
    }

    fn invoke(&self, arguments: Value) -> ToolOutput {
        match parse_args::<SmartEditInput>(arguments) {
            Ok(input) => self.execute(&input.file_path, &input.old_string, &input.new_string),
            Err(output) => output,
        }
    }
}

fn default_search_path() -> String {
    ".".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchInput {
    pub pattern: String,
    #[serde(default = "default_search_path")]
    pub path: String,
    #[serde(default)]
    pub case_sensitive: Option<bool>,
    #[serde(default)]
    pub fixed_strings: bool,
    #[serde(default)]
    pub glob_include: Option<String>,
    #[serde(default)]
    pub context: Option<usize>,
}

/// Finds lines matching a pattern so an edit can quote them verbatim.
#[derive(Debug, Clone, Default)]
pub struct SearchTool {
    defaults: LocatorOptions,
    guard: Option<WorkspaceGuard>,
}

impl SearchTool {
    pub const NAME: &'static str = "search";

    pub fn new(defaults: LocatorOptions, guard: Option<WorkspaceGuard>) -> Self {
        Self { defaults, guard }
    }

    pub fn execute(&self, input: &SearchInput) -> ToolOutput {
        let root = match resolve(self.guard.as_ref(), &input.path) {
            Ok(root) => root,
            Err(err) => return ToolOutput::err(format!("Search Error: {err}")),
        };

        let options = LocatorOptions {
            case_sensitive: input.case_sensitive.unwrap_or(self.defaults.case_sensitive),
            fixed_strings: input.fixed_strings,
            glob: input.glob_include.clone().or_else(|| self.defaults.glob.clone()),
            context: input.context.unwrap_or(self.defaults.context),
            ..self.defaults.clone()
        };

        let mut matches = match Locator::new(options).search(&input.pattern, &root) {
            Ok(matches) => matches,
            Err(err) => return ToolOutput::err(format!("Search Error: {err}")),
        };

        let mut body = Vec::new();
        let mut count = 0;
        for m in matches.by_ref() {
            count += 1;
            let file = m.file.display();
            let first_context = m.line_number - m.context_before.len();
            for (offset, line) in m.context_before.iter().enumerate() {
                body.push(format!("{file}-{}-  {line}", first_context + offset));
            }
            body.push(format!("{file}:{}  {}", m.line_number, m.line));
            for (offset, line) in m.context_after.iter().enumerate() {
                body.push(format!("{file}-{}-  {line}", m.line_number + 1 + offset));
            }
        }

        if count == 0 {
            return ToolOutput::ok("No matches found.");
        }

        let header = if matches.truncated() {
            format!("Showing first {count} matches:")
        } else {
            format!("Found {count} matches:")
        };
        let mut output = vec![header];
        output.extend(body);
        if matches.truncated() {
            output.push("... (results truncated)".to_string());
        }
        ToolOutput::ok(output.join("\n"))
    }
}

impl Tool for SearchTool {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn description(&self) -> &'static str {
        "Search file contents for a regex (or literal) pattern. Use it to find the \
         exact text of a region before editing it."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "pattern": {
                    "type": "string",
                    "description": "Regex pattern, or a literal string when fixed_strings is true."
                },
                "path": {
                    "type": "string",
                    "description": "File or directory to search. Defaults to the current directory."
                },
                "case_sensitive": { "type": "boolean" },
                "fixed_strings": { "type": "boolean" },
                "glob_include": {
                    "type": "string",
                    "description": "Only search files matching this glob, e.g. '*.py'."
                },
                "context": {
                    "type": "integer",
                    "minimum": 0,
                    "description": "Lines of context around each match."
                }
            },
            "required": ["pattern"]
        })
    }

    fn invoke(&self, arguments: Value) -> ToolOutput {
        match parse_args::<SearchInput>(arguments) {
            Ok(input) => self.execute(&input),
            Err(output) => output,
        }
    }
}

/// Resolve a caller-supplied path, enforcing the workspace boundary if any.
fn resolve(guard: Option<&WorkspaceGuard>, raw: &str) -> Result<PathBuf, SafetyError> {
    match guard {
        Some(guard) => guard.validate_path(raw),
        None => Ok(PathBuf::from(raw)),
    }
}

/// The tools available to an automation loop, looked up by name.
pub struct Toolbox {
    tools: Vec<Box<dyn Tool>>,
}

impl Toolbox {
    pub fn new(tools: Vec<Box<dyn Tool>>) -> Self {
        Self { tools }
    }

    /// Build the standard tools from a configuration.
    ///
    /// A configured `workspace.root` puts every tool behind a [`WorkspaceGuard`].
    pub fn from_config(config: &EditConfig) -> Result<Self, SafetyError> {
        let guard = config
            .workspace
            .root
            .as_ref()
            .map(|root| WorkspaceGuard::new(root, &config.workspace.forbidden))
            .transpose()?;

        Ok(Self::new(vec![
            Box::new(SmartEditTool::new(
                PatchEngine::new(config.engine_options()),
                guard.clone(),
            )),
            Box::new(SearchTool::new(config.locator_options(), guard)),
        ]))
    }

    pub fn get(&self, name: &str) -> Option<&dyn Tool> {
        self.tools
            .iter()
            .find(|tool| tool.name() == name)
            .map(|tool| tool.as_ref())
    }

    pub fn tools(&self) -> impl Iterator<Item = &dyn Tool> {
        self.tools.iter().map(|tool| tool.as_ref())
    }

    pub fn invoke(&self, name: &str, arguments: Value) -> ToolOutput {
        match self.get(name) {
            Some(tool) => {
                tracing::debug!(tool = name, "invoking tool");
                tool.invoke(arguments)
            }
            None => ToolOutput::err(format!("Unknown tool: {name}")),
        }
    }
}
