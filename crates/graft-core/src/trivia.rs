// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! The trivia side-table: free-floating comments and blank lines.
//!
//! A positioned syntax tree carries only semantic structure; everything the
//! grammar treats as whitespace but a human cares about — comments, blank
//! lines — lives in an offset-ordered side-table of [`TriviaEntry`] values.
//! The decorator consumes this table and the restorer produces a fresh one.

use serde::{Deserialize, Serialize};

/// How a trivia entry sits relative to the code around it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Placement {
    /// The entry occupies its own line (only whitespace precedes it).
    OwnLine,
    /// The entry trails code on the same line.
    Trailing,
}

/// The payload of one side-table entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TriviaKind {
    /// A line comment, text including the leading `//`.
    Comment(String),
    /// One or more consecutive blank lines, collapsed to a single marker.
    Blank,
}

/// One free-floating comment or blank-line marker, keyed by byte offset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriviaEntry {
    /// Byte offset of the entry in its source text.
    pub offset: usize,
    /// Comment text or blank-line marker.
    pub kind: TriviaKind,
    /// Attaches-before/after hint relative to surrounding code.
    pub placement: Placement,
}

impl TriviaEntry {
    /// A comment entry.
    pub fn comment(offset: usize, text: impl Into<String>, placement: Placement) -> Self {
        TriviaEntry {
            offset,
            kind: TriviaKind::Comment(text.into()),
            placement,
        }
    }

    /// A blank-line marker. Blank lines always occupy their own line.
    pub fn blank(offset: usize) -> Self {
        TriviaEntry {
            offset,
            kind: TriviaKind::Blank,
            placement: Placement::OwnLine,
        }
    }

    /// True for blank-line markers.
    pub fn is_blank(&self) -> bool {
        matches!(self.kind, TriviaKind::Blank)
    }

    /// The comment text, if this entry is a comment.
    pub fn comment_text(&self) -> Option<&str> {
        match &self.kind {
            TriviaKind::Comment(text) => Some(text),
            TriviaKind::Blank => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_constructors() {
        let c = TriviaEntry::comment(10, "// note", Placement::Trailing);
        assert_eq!(c.offset, 10);
        assert_eq!(c.comment_text(), Some("// note"));
        assert!(!c.is_blank());

        let b = TriviaEntry::blank(4);
        assert!(b.is_blank());
        assert_eq!(b.placement, Placement::OwnLine);
        assert_eq!(b.comment_text(), None);
    }
}
