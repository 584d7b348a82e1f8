// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Round-trip tests for the decorate/restore pipeline.
//!
//! These verify the pipeline's core guarantees on canonically formatted
//! sources:
//!
//! - `print(parse(code))` reproduces the input (printer fidelity),
//! - `print(restore(decorate(parse(code))))` reproduces the input
//!   (lossless decoration with no rewrite applied),
//! - the restored side-table has exactly as many entries as the decorator
//!   consumed (decoration conservation),
//! - decorating the restored output reproduces the same decorated tree
//!   (round-trip idempotence).
//!
//! # Test Organization
//!
//! - Fixture-based tests: one test per fixture file in `tests/fixtures/`
//! - Inline tests: individual cases for specific constructs

use std::path::PathBuf;

use difference::assert_diff;
use graft_cst::{decorate, parse_module, prettify_error, print_module, restore};
use itertools::Itertools;

/// Helper to visualize whitespace differences in test output.
fn visualize(s: &str) -> String {
    s.replace(' ', "▩").lines().join("↩\n")
}

fn assert_text_eq(expected: &str, got: &str, stage: &str, label: &str) {
    if got != expected {
        eprintln!("{stage} mismatch for {label}");
        let got = visualize(got);
        let expected = visualize(expected);
        assert_diff!(expected.as_ref(), got.as_ref(), "", 0);
    }
}

/// Full-pipeline round-trip assertion.
fn assert_roundtrip(input: &str, label: &str) {
    let parsed = match parse_module(input) {
        Ok(parsed) => parsed,
        Err(err) => panic!("{}", prettify_error(input, &err, label)),
    };

    // Printer fidelity straight off the parse.
    let direct = print_module(&parsed);
    assert_text_eq(input, &direct, "print(parse)", label);

    // Lossless decoration: decorate, restore, print.
    let tree = decorate(&parsed).unwrap_or_else(|e| panic!("decorate failed for {label}: {e}"));
    let restored = restore(&tree).unwrap_or_else(|e| panic!("restore failed for {label}: {e}"));
    let generated = print_module(&restored);
    assert_text_eq(input, &generated, "print(restore(decorate(parse)))", label);

    // Decoration conservation: every consumed entry is reproduced.
    assert_eq!(
        parsed.trivia.len(),
        restored.trivia.len(),
        "side-table entry count changed across the round trip for {label}"
    );

    // Idempotence: decorating the restored output gives the same tree.
    let again = decorate(&restored)
        .unwrap_or_else(|e| panic!("re-decorate failed for {label}: {e}"));
    assert_eq!(again, tree, "decorated tree drifted across restore for {label}");
}

fn assert_roundtrip_fixture(fixture_name: &str) {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push(fixture_name);

    let contents = std::fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("failed to read fixture {fixture_name}: {e}"));

    assert_roundtrip(&contents, fixture_name);
}

// =============================================================================
// Fixture-based round-trip tests
// =============================================================================

#[test]
fn roundtrip_fixture_simple() {
    assert_roundtrip_fixture("simple.graft");
}

#[test]
fn roundtrip_fixture_comments() {
    assert_roundtrip_fixture("comments.graft");
}

#[test]
fn roundtrip_fixture_functions() {
    assert_roundtrip_fixture("functions.graft");
}

#[test]
fn roundtrip_fixture_control_flow() {
    assert_roundtrip_fixture("control_flow.graft");
}

#[test]
fn roundtrip_fixture_expressions() {
    assert_roundtrip_fixture("expressions.graft");
}

#[test]
fn roundtrip_fixture_inline() {
    assert_roundtrip_fixture("inline.graft");
}

// =============================================================================
// Inline round-trip tests
// =============================================================================

#[test]
fn roundtrip_empty_module() {
    assert_roundtrip("", "empty");
}

#[test]
fn roundtrip_comment_only_module() {
    assert_roundtrip("// just a comment\n", "comment-only");
}

#[test]
fn roundtrip_blank_then_statement() {
    assert_roundtrip("\nlet x = 1;\n", "leading-blank");
}

#[test]
fn roundtrip_trailing_comment_run() {
    assert_roundtrip("let x = 1;\n// one\n// two\n", "trailing-comments");
}

#[test]
fn roundtrip_blank_between_comments() {
    assert_roundtrip("// a\n\n// b\nlet x = 1;\n", "comment-blank-comment");
}

#[test]
fn roundtrip_comment_between_brace_and_else() {
    assert_roundtrip(
        "if a {\n    return 1;\n}\n// why not\nelse {\n    return 2;\n}\n",
        "comment-before-else",
    );
}

#[test]
fn roundtrip_nested_control_flow() {
    assert_roundtrip(
        "fn f(n) {\n    while n > 0 {\n        if n == 1 {\n            return n;\n        }\n    }\n    return 0;\n}\n",
        "nested",
    );
}

#[test]
fn roundtrip_deep_block_footer() {
    assert_roundtrip(
        "fn f() {\n    if a {\n        go();\n        // last word\n    }\n}\n",
        "nested-footer",
    );
}

// =============================================================================
// Error surfaces
// =============================================================================

#[test]
fn parse_failure_is_fatal_and_produces_no_tree() {
    let err = parse_module("let = ;\n").unwrap_err();
    let rendered = prettify_error("let = ;\n", &err, "<bad>");
    assert!(rendered.contains("parse error"));
}
