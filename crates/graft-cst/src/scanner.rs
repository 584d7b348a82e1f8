// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Lexical trivia scan.
//!
//! The parser treats comments and blank lines as whitespace; this pass
//! recovers them into the offset-ordered side-table the decorator consumes.
//! It runs over the raw source independently of the grammar: per line, find
//! a `//` that is not inside a string literal, or recognize the line as
//! blank. Runs of consecutive blank lines collapse into a single marker —
//! canonical form allows at most one empty line between statements.

use graft_core::{LineIndex, Placement, TriviaEntry};

/// Scan `source`, producing its trivia side-table and line table.
pub fn scan(source: &str) -> (Vec<TriviaEntry>, LineIndex) {
    let mut entries = Vec::new();
    let mut line_start = 0usize;
    let mut in_blank_run = false;

    for line in source.split_inclusive('\n') {
        let content = line.strip_suffix('\n').unwrap_or(line);
        if content.trim().is_empty() {
            if !content.is_empty() || line.ends_with('\n') {
                if !in_blank_run {
                    entries.push(TriviaEntry::blank(line_start));
                    in_blank_run = true;
                }
            }
        } else {
            in_blank_run = false;
            if let Some(rel) = comment_start(content) {
                let placement = if content[..rel].trim().is_empty() {
                    Placement::OwnLine
                } else {
                    Placement::Trailing
                };
                entries.push(TriviaEntry::comment(
                    line_start + rel,
                    content[rel..].to_string(),
                    placement,
                ));
            }
        }
        line_start += line.len();
    }

    (entries, LineIndex::new(source))
}

/// Byte offset of the first `//` on the line that is outside any string
/// literal, if there is one. String literals cannot span lines, so the
/// scan is line-local.
fn comment_start(line: &str) -> Option<usize> {
    let bytes = line.as_bytes();
    if memchr::memchr(b'"', bytes).is_none() {
        return memchr::memmem::find(bytes, b"//");
    }
    let mut in_string = false;
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' if in_string => i += 1,
            b'"' => in_string = !in_string,
            b'/' if !in_string && bytes.get(i + 1) == Some(&b'/') => return Some(i),
            _ => {}
        }
        i += 1;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use graft_core::TriviaKind;

    #[test]
    fn test_own_line_comment() {
        let (entries, _) = scan("// hello\nlet x = 1;\n");
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].offset, 0);
        assert_eq!(entries[0].placement, Placement::OwnLine);
        assert_eq!(entries[0].comment_text(), Some("// hello"));
    }

    #[test]
    fn test_trailing_comment() {
        let (entries, _) = scan("let x = 1; // note\n");
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].offset, 11);
        assert_eq!(entries[0].placement, Placement::Trailing);
    }

    #[test]
    fn test_blank_run_collapses() {
        let (entries, _) = scan("let x = 1;\n\n\n\nlet y = 2;\n");
        let blanks: Vec<_> = entries.iter().filter(|e| e.is_blank()).collect();
        assert_eq!(blanks.len(), 1);
        assert_eq!(blanks[0].offset, 11);
    }

    #[test]
    fn test_slashes_inside_string_ignored() {
        let (entries, _) = scan("let url = \"http://x\"; // real\n");
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].comment_text(), Some("// real"));
        assert_eq!(entries[0].offset, 22);
    }

    #[test]
    fn test_escaped_quote_keeps_string_open() {
        let (entries, _) = scan("let s = \"a\\\"b // not\";\n");
        assert!(entries.is_empty());
    }

    #[test]
    fn test_indented_comment_is_own_line() {
        let (entries, _) = scan("fn f() {\n    // inner\n}\n");
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].placement, Placement::OwnLine);
        assert_eq!(entries[0].offset, 13);
    }

    #[test]
    fn test_entries_are_offset_ordered() {
        let (entries, _) = scan("// a\nlet x = 1; // b\n\n// c\nlet y = 2;\n");
        let offsets: Vec<_> = entries.iter().map(|e| e.offset).collect();
        let mut sorted = offsets.clone();
        sorted.sort_unstable();
        assert_eq!(offsets, sorted);
        assert_eq!(
            entries
                .iter()
                .filter(|e| matches!(e.kind, TriviaKind::Comment(_)))
                .count(),
            3
        );
    }
}
