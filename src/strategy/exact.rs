use super::StrategyOutcome;
use crate::text::LineEnding;

/// Replace the first literal occurrence of `search`.
///
/// The replacement is inserted verbatim apart from its line terminators,
/// which follow the file's convention.
pub fn replace(content: &str, search: &str, replacement: &str) -> StrategyOutcome {
    if search.is_empty() {
        return StrategyOutcome::NoMatch;
    }

    let mut hits = content.match_indices(search);
    let Some((start, _)) = hits.next() else {
        return StrategyOutcome::NoMatch;
    };
    let occurrences = 1 + hits.count();

    let block = if search == replacement {
        replacement.to_string()
    } else {
        LineEnding::detect(content).apply(replacement)
    };

    let end = start + search.len();
    let mut out = String::with_capacity(content.len() - search.len() + block.len());
    out.push_str(&content[..start]);
    out.push_str(&block);
    out.push_str(&content[end..]);

    StrategyOutcome::Matched {
        content: out,
        occurrences,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_replaces_first_occurrence_only() {
        let outcome = replace("a b a", "a", "z");
        assert_eq!(
            outcome,
            StrategyOutcome::Matched {
                content: "z b a".to_string(),
                occurrences: 2
            }
        );
    }

    #[test]
    fn test_exact_no_match() {
        assert_eq!(replace("hello", "world", "x"), StrategyOutcome::NoMatch);
    }

    #[test]
    fn test_exact_empty_search_is_no_match() {
        assert_eq!(replace("hello", "", "x"), StrategyOutcome::NoMatch);
    }

    #[test]
    fn test_exact_does_not_reindent() {
        let outcome = replace("    return True\n", "return True", "return False\npass");
        assert_eq!(
            outcome,
            StrategyOutcome::Matched {
                content: "    return False\npass\n".to_string(),
                occurrences: 1
            }
        );
    }

    #[test]
    fn test_exact_converts_replacement_to_crlf() {
        let outcome = replace("a\r\nb\r\n", "b", "c\nd");
        assert_eq!(
            outcome,
            StrategyOutcome::Matched {
                content: "a\r\nc\r\nd\r\n".to_string(),
                occurrences: 1
            }
        );
    }

    #[test]
    fn test_exact_identical_excerpts_is_identity() {
        let content = "mixed\nendings\r\nhere";
        let outcome = replace(content, "mixed\nendings", "mixed\nendings");
        assert_eq!(
            outcome,
            StrategyOutcome::Matched {
                content: content.to_string(),
                occurrences: 1
            }
        );
    }
}
