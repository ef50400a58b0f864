//! Hygiene: coding standards for the library, checked at test time.
//!
//! Each rule scans `src/` (test files and fixtures excluded) and holds a
//! budget. Budgets only go down: adding an occurrence means removing one
//! elsewhere first.
#![allow(clippy::absurd_extreme_comparisons)]

use std::fs;
use std::path::Path;

// Panics crash the CLI mid-poll.
const MAX_UNWRAP: usize = 0;
const MAX_EXPECT: usize = 0;
const MAX_PANIC: usize = 0;
const MAX_UNREACHABLE: usize = 0;
const MAX_TODO: usize = 0;
const MAX_UNIMPLEMENTED: usize = 0;

// Silent loss. `format` reads an unparseable timestamp as "no value".
const MAX_SILENT_DISCARD: usize = 0;
const MAX_DOT_OK: usize = 3;

const MAX_ALLOW_DEAD_CODE: usize = 0;

// The library reports through return values and `tracing`; only the CLI
// writes to the terminal.
const MAX_CONSOLE_OUTPUT: usize = 0;

// Background work goes through `Poller`, which owns the stop handle.
const MAX_TASK_SPAWNS: usize = 1;

/// Words that must never appear inside a `tracing` macro call: the session
/// secrets and the password in any form.
const SECRET_WORDS: &[&str] = &["access_token", "bearer", "private_key", "password", "digest", "pem"];

struct SourceFile {
    path: String,
    content: String,
}

/// Production `.rs` files under `src/`.
fn source_files() -> Vec<SourceFile> {
    let mut files = Vec::new();
    collect_rs_files(Path::new("src"), &mut files);
    files
}

fn collect_rs_files(dir: &Path, out: &mut Vec<SourceFile>) {
    let Ok(entries) = fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            collect_rs_files(&path, out);
            continue;
        }
        let path_str = path.to_string_lossy().to_string();
        let is_rust = path.extension().is_some_and(|e| e == "rs");
        if !is_rust || path_str.ends_with("_test.rs") || path_str.ends_with("test_support.rs") {
            continue;
        }
        if let Ok(content) = fs::read_to_string(&path) {
            out.push(SourceFile { path: path_str, content });
        }
    }
}

/// Per-file count of lines containing any of `patterns`.
fn line_hits(files: &[SourceFile], patterns: &[&str]) -> Vec<(String, usize)> {
    files
        .iter()
        .filter_map(|file| {
            let count = file
                .content
                .lines()
                .filter(|line| patterns.iter().any(|p| line.contains(p)))
                .count();
            (count > 0).then(|| (file.path.clone(), count))
        })
        .collect()
}

/// The text of every `tracing::` macro call, from the path to its matching
/// close paren, so multi-line calls are seen whole.
fn tracing_calls(content: &str) -> Vec<&str> {
    content
        .match_indices("tracing::")
        .filter_map(|(start, _)| {
            let rest = &content[start..];
            let open = rest.find("!(")? + 1;
            if rest[..open].contains(char::is_whitespace) {
                return None;
            }
            let mut depth = 0usize;
            for (i, c) in rest[open..].char_indices() {
                match c {
                    '(' => depth += 1,
                    ')' => {
                        depth -= 1;
                        if depth == 0 {
                            return Some(&rest[..=open + i]);
                        }
                    }
                    _ => {}
                }
            }
            None
        })
        .collect()
}

fn assert_budget(rule: &str, hits: &[(String, usize)], max: usize) {
    let count: usize = hits.iter().map(|(_, c)| c).sum();
    let listing = hits
        .iter()
        .map(|(path, count)| format!("  {path}: {count}"))
        .collect::<Vec<_>>()
        .join("\n");
    assert!(count <= max, "{rule} budget exceeded: found {count}, max {max}.\n{listing}");
}

#[test]
fn unwrap_budget() {
    assert_budget(".unwrap()", &line_hits(&source_files(), &[".unwrap()"]), MAX_UNWRAP);
}

#[test]
fn expect_budget() {
    assert_budget(".expect()", &line_hits(&source_files(), &[".expect("]), MAX_EXPECT);
}

#[test]
fn panic_budget() {
    assert_budget("panic!()", &line_hits(&source_files(), &["panic!("]), MAX_PANIC);
}

#[test]
fn unreachable_budget() {
    assert_budget("unreachable!()", &line_hits(&source_files(), &["unreachable!("]), MAX_UNREACHABLE);
}

#[test]
fn todo_budget() {
    assert_budget("todo!()", &line_hits(&source_files(), &["todo!("]), MAX_TODO);
}

#[test]
fn unimplemented_budget() {
    assert_budget("unimplemented!()", &line_hits(&source_files(), &["unimplemented!("]), MAX_UNIMPLEMENTED);
}

#[test]
fn silent_discard_budget() {
    assert_budget("let _ =", &line_hits(&source_files(), &["let _ ="]), MAX_SILENT_DISCARD);
}

#[test]
fn dot_ok_budget() {
    assert_budget(".ok()", &line_hits(&source_files(), &[".ok()"]), MAX_DOT_OK);
}

#[test]
fn allow_dead_code_budget() {
    assert_budget("#[allow(dead_code)]", &line_hits(&source_files(), &["#[allow(dead_code)]"]), MAX_ALLOW_DEAD_CODE);
}

#[test]
fn library_never_writes_to_the_terminal() {
    let hits = line_hits(&source_files(), &["println!(", "print!(", "dbg!("]);
    assert_budget("console output", &hits, MAX_CONSOLE_OUTPUT);
}

#[test]
fn only_the_poller_spawns_tasks() {
    let files = source_files();
    let hits = line_hits(&files, &["tokio::spawn(", "tokio::task::spawn("]);
    assert_budget("tokio::spawn", &hits, MAX_TASK_SPAWNS);
    assert!(
        hits.iter().all(|(path, _)| path.ends_with("poller.rs")),
        "tasks spawned outside poller.rs: {hits:?}"
    );
}

#[test]
fn tracing_calls_never_carry_secrets() {
    let mut leaks = Vec::new();
    for file in source_files() {
        for call in tracing_calls(&file.content) {
            let lowered = call.to_lowercase();
            if let Some(word) = SECRET_WORDS.iter().find(|w| lowered.contains(*w)) {
                leaks.push(format!("  {}: `{word}` in {}", file.path, call.lines().next().unwrap_or(call)));
            }
        }
    }
    assert!(leaks.is_empty(), "secrets passed to tracing:\n{}", leaks.join("\n"));
}

#[test]
fn tracing_call_scanner_sees_multi_line_calls() {
    let source = "tracing::info!(\n    username,\n    access_token = %token.trim(),\n    \"logged in\"\n);\nlet x = (1);";
    let calls = tracing_calls(source);
    assert_eq!(calls.len(), 1);
    assert!(calls[0].contains("access_token"));
    assert!(!calls[0].contains("let x"));
}
