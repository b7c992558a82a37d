//! Line-ending and indentation helpers shared by the match strategies.
//!
//! Strategies splice replacement blocks into file content that may use either
//! LF or CRLF terminators, and may or may not end with a newline. Everything
//! here is pure string manipulation; nothing touches the filesystem.

/// Line terminator convention of a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineEnding {
    Lf,
    CrLf,
}

impl LineEnding {
    /// A file counts as CRLF as soon as it contains a single `\r\n`.
    pub fn detect(content: &str) -> Self {
        if content.contains("\r\n") {
            LineEnding::CrLf
        } else {
            LineEnding::Lf
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            LineEnding::Lf => "\n",
            LineEnding::CrLf => "\r\n",
        }
    }

    /// Rewrite every terminator in `text` to this convention.
    pub fn apply(self, text: &str) -> String {
        let normalized = normalize_newlines(text);
        match self {
            LineEnding::Lf => normalized,
            LineEnding::CrLf => normalized.replace('\n', "\r\n"),
        }
    }
}

/// Collapse CRLF terminators to LF.
pub fn normalize_newlines(text: &str) -> String {
    text.replace("\r\n", "\n")
}

/// Leading horizontal whitespace of a line (spaces and tabs, never terminators).
pub fn leading_indent(line: &str) -> &str {
    let end = line
        .find(|c: char| !(c == ' ' || c == '\t'))
        .unwrap_or(line.len());
    &line[..end]
}

/// Re-base a replacement excerpt onto `indent`.
///
/// The excerpt's own common indentation is treated as relative and removed
/// first, then every line (blank ones included) is prefixed with `indent`.
/// A single trailing terminator on the excerpt is dropped; callers supply
/// the terminator that follows the block. Lines are joined with `ending`.
pub fn reindent(replacement: &str, indent: &str, ending: LineEnding) -> String {
    let normalized = normalize_newlines(replacement);
    let body = normalized.strip_suffix('\n').unwrap_or(&normalized);
    let lines: Vec<&str> = body.split('\n').collect();

    let common = common_indent(&lines);

    lines
        .iter()
        .map(|line| {
            // Blank lines may be shorter than the shared indent.
            let relative = line.get(common..).unwrap_or_else(|| line.trim_start());
            format!("{indent}{relative}")
        })
        .collect::<Vec<_>>()
        .join(ending.as_str())
}

/// Width in bytes of the indentation shared by every non-blank line.
fn common_indent(lines: &[&str]) -> usize {
    let mut shared: Option<&str> = None;
    for line in lines.iter().filter(|l| !l.trim().is_empty()) {
        let indent = leading_indent(line);
        shared = Some(match shared {
            None => indent,
            Some(prev) => {
                let len = prev
                    .bytes()
                    .zip(indent.bytes())
                    .take_while(|(a, b)| a == b)
                    .count();
                &prev[..len]
            }
        });
    }
    shared.map_or(0, str::len)
}

/// Number of line terminators at the very end of `text`.
fn trailing_terminators(text: &str) -> usize {
    let mut count = 0;
    let mut rest = text;
    loop {
        if let Some(stripped) = rest.strip_suffix("\r\n") {
            rest = stripped;
        } else if let Some(stripped) = rest.strip_suffix('\n') {
            rest = stripped;
        } else {
            return count;
        }
        count += 1;
    }
}

fn strip_trailing_terminators(text: &str) -> &str {
    text.trim_end_matches(['\n', '\r'])
}

/// Give `modified` the same terminal-newline shape as `original`.
///
/// - no terminator in `original`: every trailing terminator is stripped
/// - exactly one: the result ends with exactly one
/// - more than one: the result ends with at least one
pub fn restore_trailing_newline(original: &str, modified: String) -> String {
    let ending = LineEnding::detect(original);
    match (
        trailing_terminators(original),
        trailing_terminators(&modified),
    ) {
        (0, 0) => modified,
        (0, _) => strip_trailing_terminators(&modified).to_string(),
        (1, 1) => modified,
        (1, _) => {
            let mut out = strip_trailing_terminators(&modified).to_string();
            out.push_str(ending.as_str());
            out
        }
        (_, 0) => {
            let mut out = modified;
            out.push_str(ending.as_str());
            out
        }
        _ => modified,
    }
}
