// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Error taxonomy for the pipeline boundaries.
//!
//! Each stage has its own error enum; [`Error`] bridges them into the single
//! type the top-level entry points return. No stage retries internally, and
//! a failed stage leaves no guarantee about its input — callers discard and
//! start over from source text.

use annotate_snippets::{Level, Renderer, Snippet};
use thiserror::Error;

use crate::nodes::NodeKind;

/// Malformed source text. Fatal; no partial tree is produced.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("parse error at line {}, column {}: expected {}", .0.location.line, .0.location.column, .0.expected)]
    Syntax(#[from] peg::error::ParseError<peg::str::LineCol>),
}

impl ParseError {
    /// Byte offset of the failure.
    pub fn offset(&self) -> usize {
        match self {
            ParseError::Syntax(err) => err.location.offset,
        }
    }
}

/// A side-table entry could not be attached during decoration. Indicates an
/// inconsistency between the tree and its side-table — with a conforming
/// parser this does not occur.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecorateError {
    #[error("unresolved decoration at byte {offset}: {detail}")]
    UnresolvedDecoration { offset: usize, detail: String },
}

/// A decorated node violates the grammar's structural invariants. Always
/// attributable to a caller's mutation; surfaces at restoration time,
/// before any output for the offending node is synthesized.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RestoreError {
    #[error("invalid shape in {kind}: {reason}")]
    InvalidShape { kind: NodeKind, reason: String },
}

/// A mutation request the cursor protocol cannot honor: a sequence
/// operation on a singular field, or a node of the wrong category for the
/// slot. Fails fast and poisons the rewrite pass.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RewriteError {
    #[error("invalid cursor operation: {op}: {detail}")]
    InvalidCursorOperation { op: &'static str, detail: String },
}

/// Umbrella error for the one-call pipeline entry points.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Decorate(#[from] DecorateError),
    #[error(transparent)]
    Restore(#[from] RestoreError),
    #[error(transparent)]
    Rewrite(#[from] RewriteError),
}

/// Render a parse error as an annotated snippet of the offending source.
pub fn prettify_error(source: &str, err: &ParseError, origin: &str) -> String {
    let ParseError::Syntax(inner) = err;
    let offset = inner.location.offset.min(source.len());
    // The annotation needs a non-empty range inside the source; point at
    // the offending byte, or the last byte for errors at end of input.
    let (start, end) = if source.is_empty() {
        (0, 0)
    } else if offset >= source.len() {
        (source.len() - 1, source.len())
    } else {
        (offset, offset + 1)
    };
    let title = format!("expected {}", inner.expected);
    let message = Level::Error.title("parse error").snippet(
        Snippet::source(source)
            .origin(origin)
            .fold(true)
            .annotation(Level::Error.span(start..end).label(&title)),
    );
    Renderer::plain().render(message).to_string()
}
