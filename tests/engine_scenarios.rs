//! End-to-end edits through the patch engine
//!
//! Each test writes a fixture file, applies one edit and checks both the
//! reported outcome and the bytes left on disk.

use smart_edit::{
    AmbiguityPolicy, EngineOptions, PatchEngine, PatchError, PatchOutcome, PatchRequest, Strategy,
};
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

const HELLO: &str = "def hello():\n    print(\"Hello World\")\n    return True\n";

fn fixture(name: &str, content: &str) -> (TempDir, PathBuf) {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join(name);
    fs::write(&path, content).unwrap();
    (dir, path)
}

fn apply(path: &PathBuf, old: &str, new: &str) -> PatchOutcome {
    PatchEngine::default().apply(&PatchRequest::new(path, old, new))
}

#[test]
fn test_flexible_keeps_block_indentation() {
    let (_dir, path) = fixture("hello.py", HELLO);

    let outcome = apply(
        &path,
        "print(\"Hello World\")\nreturn True",
        "print(\"Hello Universe\")\nreturn False",
    );

    assert_eq!(outcome.strategy_used(), Some(Strategy::Flexible));
    assert_eq!(
        fs::read_to_string(&path).unwrap(),
        "def hello():\n    print(\"Hello Universe\")\n    return False\n"
    );
}

#[test]
fn test_regex_token_absorbs_collapsed_whitespace() {
    let (_dir, path) = fixture("hello.py", HELLO);

    let outcome = apply(&path, "return      True", "return False");

    assert_eq!(outcome.strategy_used(), Some(Strategy::RegexToken));
    assert_eq!(
        fs::read_to_string(&path).unwrap(),
        "def hello():\n    print(\"Hello World\")\n    return False\n"
    );
}

#[test]
fn test_exact_keeps_missing_trailing_newline() {
    let (_dir, path) = fixture("foo.py", "def foo():\n    return True");

    let outcome = apply(&path, "return True", "return False");

    assert_eq!(outcome.strategy_used(), Some(Strategy::Exact));
    assert_eq!(
        fs::read_to_string(&path).unwrap(),
        "def foo():\n    return False"
    );
}

#[test]
fn test_unlocatable_excerpt_names_every_strategy() {
    let (_dir, path) = fixture("hello.py", HELLO);

    let outcome = apply(&path, "def goodbye():\n    pass", "x");

    match outcome.failure_reason() {
        Some(PatchError::NoMatch { attempted, .. }) => {
            assert_eq!(
                attempted,
                &vec![Strategy::Exact, Strategy::Flexible, Strategy::RegexToken]
            );
        }
        other => panic!("expected NoMatch, got {other:?}"),
    }
    let message = outcome.to_string();
    for name in ["exact", "flexible", "regex-token"] {
        assert!(message.contains(name), "{message}");
    }
    assert_eq!(fs::read_to_string(&path).unwrap(), HELLO);
}

#[test]
fn test_missing_file_is_distinct_from_no_match() {
    let dir = TempDir::new().unwrap();
    let outcome = apply(&dir.path().join("nonexistent_xyz.py"), "a", "b");

    assert!(!outcome.succeeded());
    assert!(matches!(
        outcome.failure_reason(),
        Some(PatchError::NotFound { .. })
    ));
    assert!(outcome.to_string().contains("File not found"));
}

#[test]
fn test_crlf_file_keeps_crlf_terminators() {
    let (_dir, path) = fixture("win.py", "if x:\r\n    y = 1\r\nz = 2\r\n");

    let outcome = apply(&path, "if x:\ny = 1", "if x:\n    y = 3");

    assert_eq!(outcome.strategy_used(), Some(Strategy::Flexible));
    assert_eq!(
        fs::read_to_string(&path).unwrap(),
        "if x:\r\n    y = 3\r\nz = 2\r\n"
    );
}

#[test]
fn test_flexible_rebases_relative_replacement() {
    let source = "class A:\n    def run(self):\n        pass\n";
    let (_dir, path) = fixture("a.py", source);

    // Replacement pasted at its original depth is not indented twice.
    let outcome = apply(
        &path,
        "def run(self):\n    pass",
        "    def run(self):\n        return 1",
    );

    assert_eq!(outcome.strategy_used(), Some(Strategy::Flexible));
    assert_eq!(
        fs::read_to_string(&path).unwrap(),
        "class A:\n    def run(self):\n        return 1\n"
    );
}

#[test]
fn test_first_occurrence_wins_by_default() {
    let (_dir, path) = fixture("dup.py", "x = 1\ny = 2\nx = 1\n");

    let outcome = apply(&path, "x = 1", "x = 9");

    match outcome {
        PatchOutcome::Applied { occurrences, .. } => assert_eq!(occurrences, 2),
        other => panic!("unexpected outcome: {other}"),
    }
    assert_eq!(fs::read_to_string(&path).unwrap(), "x = 9\ny = 2\nx = 1\n");
}

#[test]
fn test_reject_policy_leaves_file_untouched() {
    let (_dir, path) = fixture("dup.py", "x = 1\ny = 2\nx = 1\n");
    let engine = PatchEngine::new(EngineOptions {
        ambiguity: AmbiguityPolicy::Reject,
    });

    let outcome = engine.apply(&PatchRequest::new(&path, "x = 1", "x = 9"));

    assert!(matches!(
        outcome.failure_reason(),
        Some(PatchError::AmbiguousMatch {
            strategy: Strategy::Exact,
            occurrences: 2
        })
    ));
    assert_eq!(fs::read_to_string(&path).unwrap(), "x = 1\ny = 2\nx = 1\n");
}

#[test]
fn test_identical_replacement_is_noop() {
    let (_dir, path) = fixture("hello.py", HELLO);
    let before = fs::metadata(&path).unwrap().modified().unwrap();

    let outcome = apply(&path, "return True", "return True");

    assert!(matches!(
        outcome,
        PatchOutcome::Applied {
            strategy: Strategy::Exact,
            changed: false,
            ..
        }
    ));
    assert_eq!(fs::read_to_string(&path).unwrap(), HELLO);
    assert_eq!(fs::metadata(&path).unwrap().modified().unwrap(), before);
}

#[test]
fn test_successive_edits_see_previous_result() {
    let (_dir, path) = fixture("hello.py", HELLO);
    let engine = PatchEngine::default();

    let first = engine.apply(&PatchRequest::new(&path, "Hello World", "Hello Rust"));
    let second = engine.apply(&PatchRequest::new(&path, "Hello World", "Hello Again"));

    assert!(first.succeeded());
    assert!(!second.succeeded());
    assert!(fs::read_to_string(&path).unwrap().contains("Hello Rust"));
}

#[test]
fn test_non_utf8_file_is_reported_unreadable() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("blob.bin");
    fs::write(&path, [0xff, 0xfe, 0x00, 0x41]).unwrap();

    let outcome = apply(&path, "A", "B");

    assert!(matches!(
        outcome.failure_reason(),
        Some(PatchError::NotFound { .. })
    ));
    assert_eq!(fs::read(&path).unwrap(), vec![0xff, 0xfe, 0x00, 0x41]);
}

#[test]
fn test_preview_reports_strategy_without_writing() {
    let (_dir, path) = fixture("hello.py", HELLO);

    let outcome =
        PatchEngine::default().preview(&PatchRequest::new(&path, "return      True", "return 0"));

    assert_eq!(outcome.strategy_used(), Some(Strategy::RegexToken));
    assert_eq!(
        outcome.new_content(),
        Some("def hello():\n    print(\"Hello World\")\n    return 0\n")
    );
    assert_eq!(fs::read_to_string(&path).unwrap(), HELLO);
}
