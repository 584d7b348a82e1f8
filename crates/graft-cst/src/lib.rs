// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! A lossless source rewriting library built on decorated syntax trees.
//!
//! The pipeline has two tree representations and converters between them:
//!
//! - [`parse_module`] produces a **positioned plain tree** plus a trivia
//!   side-table — comments and blank lines keyed by byte offset, the way a
//!   parser naturally leaves them.
//! - [`decorate`] folds the side-table into a **decorated tree** where
//!   every node owns its adjacent comments and spacing directly. The
//!   decorated tree is self-contained: no offsets, no external tables, so
//!   structural edits never invalidate position bookkeeping.
//! - [`rewrite::apply`] walks the decorated tree with a cursor-based
//!   visit/mutate protocol: replace the current node, insert siblings
//!   around it, or delete it, mid-traversal, with well-defined ordering.
//! - [`restore`] converts the (possibly mutated) decorated tree back into
//!   a plain tree and fresh side-table with synthesized offsets, and
//!   [`print_module`] emits canonical source text.
//!
//! Formatting the edit did not touch survives the round trip; canonically
//! formatted input with no edits reproduces byte-for-byte.
//!
//! # Quick Start
//!
//! ```
//! use graft_cst::{decorate, parse_module, print_module, restore};
//!
//! let source = "// doubles its input\nfn double(x) {\n    return x * 2;\n}\n";
//! let parsed = parse_module(source).expect("parse error");
//! let tree = decorate(&parsed).expect("decorate error");
//! let restored = restore(&tree).expect("restore error");
//! assert_eq!(print_module(&restored), source);
//! ```
//!
//! # Rewriting
//!
//! [`transform`] runs the whole pipeline around a rewrite pass:
//!
//! ```
//! use graft_cst::nodes::decorated::Expr;
//! use graft_cst::rewrite::{Node, NodeRef};
//! use graft_cst::transform;
//!
//! // Rename every identifier `old` to `new`, keeping comments in place.
//! let source = "// keep me\nlet old = 1;\nlet y = old + 2;\n";
//! let output = transform(
//!     source,
//!     |cursor| {
//!         let rename = match cursor.node() {
//!             NodeRef::Ident(i) if i.name == "old" => true,
//!             NodeRef::Expr(Expr::Ident(i)) if i.name == "old" => true,
//!             _ => false,
//!         };
//!         if rename {
//!             let node = match cursor.node() {
//!                 NodeRef::Ident(_) => Node::Ident(graft_cst::nodes::decorated::Ident::new("new")),
//!                 _ => Node::Expr(Expr::ident("new")),
//!             };
//!             cursor.replace(node).expect("replace failed");
//!         }
//!         true
//!     },
//!     |_| true,
//! )
//! .expect("transform failed");
//! assert_eq!(output, "// keep me\nlet new = 1;\nlet y = new + 2;\n");
//! ```

use tracing::debug;

pub mod errors;
pub use errors::{DecorateError, Error, ParseError, RestoreError, RewriteError, prettify_error};

pub mod nodes;
pub use nodes::decorations::{Decorations, Space};
pub use nodes::{BinOp, NodeKind, UnOp};

mod codegen;
mod parser;
mod scanner;

pub mod decorate;
pub use decorate::decorate;

pub mod restore;
pub use restore::restore;

pub mod rewrite;

pub mod visitor;
pub use visitor::{VisitResult, Visitor};

pub use graft_core::{LineIndex, Placement, Span, TriviaEntry, TriviaKind};

/// A parse result: the positioned plain tree plus the non-semantic
/// material the grammar discards — the trivia side-table and the line
/// table both the decorator and printer consult.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedModule {
    /// The positioned syntax tree.
    pub module: nodes::plain::Module,
    /// Offset-ordered comments and blank-line markers.
    pub trivia: Vec<TriviaEntry>,
    /// Newline table for the (real or synthesized) source text.
    pub lines: LineIndex,
}

/// Parse source text into a positioned plain tree and its side-table.
pub fn parse_module(source: &str) -> Result<ParsedModule, ParseError> {
    let module = parser::parse(source)?;
    let (trivia, lines) = scanner::scan(source);
    debug!(
        len = source.len(),
        stmts = module.body.len(),
        trivia = trivia.len(),
        "parsed module"
    );
    Ok(ParsedModule {
        module,
        trivia,
        lines,
    })
}

/// Print a plain tree plus side-table back to source text.
pub fn print_module(parsed: &ParsedModule) -> String {
    codegen::print(&parsed.module, &parsed.trivia, &parsed.lines)
}

/// Parse, decorate, apply one rewrite pass, restore, and print.
pub fn transform<Pre, Post>(source: &str, pre: Pre, post: Post) -> Result<String, Error>
where
    Pre: FnMut(&mut rewrite::Cursor<'_>) -> bool,
    Post: FnMut(&mut rewrite::Cursor<'_>) -> bool,
{
    let parsed = parse_module(source)?;
    let mut tree = decorate(&parsed)?;
    rewrite::apply_module(&mut tree, pre, post)?;
    let restored = restore(&tree)?;
    Ok(print_module(&restored))
}
