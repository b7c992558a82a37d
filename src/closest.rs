//! "Did you mean?" hints for excerpts no strategy could place.
//!
//! Echoing the caller's own excerpt back is useless; pointing at the region of
//! the file that looks most like it gives an agent something to re-read.

use std::fmt;

/// Best approximate location of an excerpt in a file.
#[derive(Debug, Clone, PartialEq)]
pub struct ClosestMatch {
    /// 1-based line number where the candidate window starts
    pub line_number: usize,
    /// Mean normalized Levenshtein similarity of the window's lines (0.0..=1.0)
    pub similarity: f64,
    pub lines: Vec<String>,
}

/// Windows scoring below this are not worth reporting.
const MIN_SIMILARITY: f64 = 0.5;

/// Full window comparisons per lookup; the rest are ranked by first line only.
const MAX_CANDIDATES: usize = 16;

/// Slide a window the size of the excerpt over the file and keep the most
/// similar one. Lines are compared with surrounding whitespace stripped.
///
/// Windows are shortlisted by how well their first line matches the
/// excerpt's first line, so the cost stays linear in the file length.
pub fn find_closest(content: &str, search: &str) -> Option<ClosestMatch> {
    let search_lines: Vec<&str> = search.trim().lines().map(str::trim).collect();
    let source_lines: Vec<&str> = content.lines().collect();

    if search_lines.is_empty() || search_lines.len() > source_lines.len() {
        return None;
    }

    let n = search_lines.len();
    let mut best: Option<(usize, f64)> = None;

    for start in candidate_starts(&source_lines, &search_lines) {
        let total: f64 = source_lines[start..start + n]
            .iter()
            .zip(&search_lines)
            .map(|(source, wanted)| strsim::normalized_levenshtein(source.trim(), wanted))
            .sum();
        let similarity = total / n as f64;

        if best.map_or(true, |(_, score)| similarity > score) {
            best = Some((start, similarity));
        }
    }

    let (start, similarity) = best?;
    if similarity < MIN_SIMILARITY {
        return None;
    }

    Some(ClosestMatch {
        line_number: start + 1,
        similarity,
        lines: source_lines[start..start + n]
            .iter()
            .map(|line| line.to_string())
            .collect(),
    })
}

/// Window starts worth a full comparison, in file order.
fn candidate_starts(source_lines: &[&str], search_lines: &[&str]) -> Vec<usize> {
    let first = search_lines[0];
    let mut ranked: Vec<(usize, f64)> = (0..=source_lines.len() - search_lines.len())
        .map(|start| {
            (
                start,
                strsim::normalized_levenshtein(source_lines[start].trim(), first),
            )
        })
        .collect();

    // Stable sort keeps earlier windows ahead on ties.
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
    ranked.truncate(MAX_CANDIDATES);

    let mut starts: Vec<usize> = ranked.into_iter().map(|(start, _)| start).collect();
    starts.sort_unstable();
    starts
}

impl fmt::Display for ClosestMatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "closest candidate at line {} ({:.1}% similar)",
            self.line_number,
            self.similarity * 100.0
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_closest_points_at_typo() {
        let content = "fn a() {\n    let total = 1;\n    total\n}\n";
        let closest = find_closest(content, "let totl = 1;").unwrap();
        assert_eq!(closest.line_number, 2);
        assert!(closest.similarity > 0.8 && closest.similarity < 1.0);
        assert_eq!(closest.lines, vec!["    let total = 1;"]);
    }

    #[test]
    fn test_find_closest_rejects_unrelated_text() {
        let content = "alpha\nbeta\ngamma\n";
        assert!(find_closest(content, "completely different sentence").is_none());
    }

    #[test]
    fn test_find_closest_excerpt_longer_than_file() {
        assert!(find_closest("one\n", "one\ntwo\nthree").is_none());
    }

    #[test]
    fn test_candidate_shortlist_is_bounded() {
        let source: Vec<String> = (0..4000).map(|i| format!("let v{i} = {i};")).collect();
        let source_lines: Vec<&str> = source.iter().map(String::as_str).collect();
        let search_lines: Vec<&str> = source_lines[100..250].to_vec();

        let starts = candidate_starts(&source_lines, &search_lines);
        assert!(starts.len() <= MAX_CANDIDATES);
        assert!(starts.contains(&100));
    }

    #[test]
    fn test_find_closest_in_large_file() {
        let mut lines: Vec<String> = (0..4000).map(|i| format!("let v{i} = {i};")).collect();
        let excerpt = lines[2000..2150].join("\n").replace("let v2075 = 2075;", "let v2075 = 275;");
        lines.push(String::new());
        let content = lines.join("\n");

        let closest = find_closest(&content, &excerpt).unwrap();
        assert_eq!(closest.line_number, 2001);
        assert_eq!(closest.lines.len(), 150);
    }

    #[test]
    fn test_display() {
        let closest = ClosestMatch {
            line_number: 7,
            similarity: 0.875,
            lines: vec![],
        };
        assert_eq!(closest.to_string(), "closest candidate at line 7 (87.5% similar)");
    }
}
