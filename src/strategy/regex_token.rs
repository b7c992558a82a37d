//! Whitespace-agnostic matching through tokenization.
//!
//! The search excerpt is split into tokens (delimiter punctuation becomes a
//! token of its own) and the tokens are re-joined with `\s*`, so spaces, tabs
//! and line breaks between them may differ arbitrarily from the file. The
//! match must begin at the start of a line, after optional indentation.

use super::StrategyOutcome;
use crate::text::{normalize_newlines, reindent, LineEnding};
use regex::{Regex, RegexBuilder};

/// Characters split out as standalone tokens.
const DELIMITERS: &[char] = &['(', ')', ':', '[', ']', '{', '}', '>', '<', '='];

pub fn replace(content: &str, search: &str, replacement: &str) -> StrategyOutcome {
    let tokens = tokenize(search);
    if tokens.is_empty() {
        return StrategyOutcome::NoMatch;
    }

    let regex = match build_pattern(&tokens) {
        Ok(regex) => regex,
        Err(err) => {
            tracing::warn!(error = %err, "token pattern failed to compile, skipping strategy");
            return StrategyOutcome::NoMatch;
        }
    };

    let Some(captures) = regex.captures(content) else {
        return StrategyOutcome::NoMatch;
    };
    let Some(whole) = captures.get(0) else {
        return StrategyOutcome::NoMatch;
    };
    let indent = captures.get(1).map_or("", |m| m.as_str());
    let occurrences = regex.find_iter(content).count();

    let block = reindent(replacement, indent, LineEnding::detect(content));

    let mut out = String::with_capacity(content.len() + block.len());
    out.push_str(&content[..whole.start()]);
    out.push_str(&block);
    out.push_str(&content[whole.end()..]);

    StrategyOutcome::Matched {
        content: out,
        occurrences,
    }
}

/// Split an excerpt into whitespace-separated tokens, isolating delimiters.
pub fn tokenize(search: &str) -> Vec<String> {
    let normalized = normalize_newlines(search);
    let mut spaced = String::with_capacity(normalized.len() * 2);
    for ch in normalized.chars() {
        if DELIMITERS.contains(&ch) {
            spaced.push(' ');
            spaced.push(ch);
            spaced.push(' ');
        } else {
            spaced.push(ch);
        }
    }
    spaced.split_whitespace().map(str::to_string).collect()
}

/// Line-anchored pattern capturing indentation, then the escaped tokens
/// joined by optional whitespace.
pub fn build_pattern(tokens: &[String]) -> Result<Regex, regex::Error> {
    let inner = tokens
        .iter()
        .map(|token| regex::escape(token))
        .collect::<Vec<_>>()
        .join(r"\s*");
    RegexBuilder::new(&format!(r"^([ \t]*){inner}"))
        .multi_line(true)
        .build()
}
