//! Indentation-agnostic, line-granular matching.
//!
//! Callers often rebuild an excerpt from memory and get the indentation wrong
//! while every line's content is right. This strategy compares lines with
//! their surrounding whitespace stripped and re-bases the replacement onto the
//! indentation of the first matched source line.

use super::StrategyOutcome;
use crate::text::{leading_indent, normalize_newlines, reindent, LineEnding};

pub fn replace(content: &str, search: &str, replacement: &str) -> StrategyOutcome {
    let normalized_search = normalize_newlines(search);
    let trimmed = normalized_search.trim();
    if trimmed.is_empty() {
        return StrategyOutcome::NoMatch;
    }

    let search_lines: Vec<&str> = trimmed.split('\n').map(str::trim).collect();
    let source_lines: Vec<&str> = content.split_inclusive('\n').collect();

    let mut windows = matching_windows(&source_lines, &search_lines);
    let Some(first) = windows.next() else {
        return StrategyOutcome::NoMatch;
    };
    let occurrences = 1 + windows.count();

    let ending = LineEnding::detect(content);
    let indent = leading_indent(source_lines[first]);
    let block = reindent(replacement, indent, ending);

    let window_end = first + search_lines.len();
    let mut out = String::with_capacity(content.len() + block.len());
    out.push_str(&source_lines[..first].concat());
    out.push_str(&block);
    out.push_str(ending.as_str());
    out.push_str(&source_lines[window_end..].concat());

    StrategyOutcome::Matched {
        content: out,
        occurrences,
    }
}

/// Start indices of non-overlapping windows whose stripped lines equal
/// `search_lines`, in file order.
fn matching_windows<'a>(
    source_lines: &'a [&'a str],
    search_lines: &'a [&'a str],
) -> impl Iterator<Item = usize> + 'a {
    let n = search_lines.len();
    let mut next = 0;
    std::iter::from_fn(move || {
        while next + n <= source_lines.len() {
            let start = next;
            let hit = source_lines[start..start + n]
                .iter()
                .zip(search_lines)
                .all(|(source, wanted)| source.trim() == *wanted);
            if hit {
                next = start + n;
                return Some(start);
            }
            next += 1;
        }
        None
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const HELLO: &str = "def hello():\n    print(\"Hello World\")\n    return True\n";

    fn matched(outcome: StrategyOutcome) -> (String, usize) {
        match outcome {
            StrategyOutcome::Matched {
                content,
                occurrences,
            } => (content, occurrences),
            StrategyOutcome::NoMatch => panic!("expected a match"),
        }
    }

    #[test]
    fn test_flexible_rebases_indentation() {
        let (content, occurrences) = matched(replace(
            HELLO,
            "print(\"Hello World\")\nreturn True",
            "print(\"Hello Universe\")\nreturn False",
        ));
        assert_eq!(
            content,
            "def hello():\n    print(\"Hello Universe\")\n    return False\n"
        );
        assert_eq!(occurrences, 1);
    }

    #[test]
    fn test_flexible_ignores_surrounding_blank_lines_in_search() {
        let (content, _) = matched(replace(HELLO, "\n\n  return True  \n\n", "return None"));
        assert!(content.contains("    return None\n"));
    }

    #[test]
    fn test_flexible_uses_first_line_indent_for_whole_block() {
        let source = "  a\n        b\nc\n";
        let (content, _) = matched(replace(source, "a\nb", "x\ny"));
        assert_eq!(content, "  x\n  y\nc\n");
    }

    #[test]
    fn test_flexible_whitespace_only_search_is_no_match() {
        assert_eq!(replace(HELLO, " \n\t\n", "x"), StrategyOutcome::NoMatch);
    }

    #[test]
    fn test_flexible_no_match_when_line_differs() {
        assert_eq!(
            replace(HELLO, "print(\"Hello\")\nreturn True", "x"),
            StrategyOutcome::NoMatch
        );
    }

    #[test]
    fn test_flexible_search_longer_than_file() {
        assert_eq!(replace("a\n", "a\nb\nc", "x"), StrategyOutcome::NoMatch);
    }

    #[test]
    fn test_flexible_counts_non_overlapping_windows() {
        let source = "}\n}\n}\n";
        let (content, occurrences) = matched(replace(source, "}\n}", "]"));
        assert_eq!(content, "]\n}\n");
        assert_eq!(occurrences, 1);

        let (_, occurrences) = matched(replace("  x\ny\n\tx\n", "x", "z"));
        assert_eq!(occurrences, 2);
    }

    #[test]
    fn test_flexible_preserves_crlf() {
        let source = "fn a() {\r\n    let x = 1;\r\n    x\r\n}\r\n";
        let (content, _) = matched(replace(source, "let x = 1;\nx", "let y = 2;\ny"));
        assert_eq!(content, "fn a() {\r\n    let y = 2;\r\n    y\r\n}\r\n");
    }
}
