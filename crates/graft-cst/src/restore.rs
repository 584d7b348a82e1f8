// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! The restorer: decorated tree → positioned plain tree + fresh side-table.
//!
//! The walk virtually emits the canonical text the printer will produce,
//! advancing a byte position and recording line breaks, and assembles plain
//! nodes whose spans match that emission. Spacing directives become literal
//! newlines and blank-line entries; `start`/`end` fragments become own-line
//! and trailing comment entries. The emission sequence here mirrors
//! `codegen.rs` token for token — printing the restored output reproduces
//! the virtual text.
//!
//! Structural validation happens here: this is where a rewrite pass that
//! left the tree in a shape the grammar cannot express gets its
//! [`RestoreError::InvalidShape`].

use std::sync::LazyLock;

use graft_core::{LineIndex, Placement, TriviaEntry};
use regex::Regex;
use tracing::debug;

use crate::codegen::{INDENT, escape_string, needs_parens};
use crate::errors::RestoreError;
use crate::nodes::decorations::{BLANK_FRAGMENT, Decorations, Space, fragment_is_valid};
use crate::nodes::{NodeKind, decorated, plain};
use crate::parser::KEYWORDS;
use crate::ParsedModule;

static IDENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("^[A-Za-z_][A-Za-z0-9_]*$").expect("static pattern"));

/// Convert a decorated tree back into a positioned plain tree plus a fresh
/// side-table, synthesizing byte offsets consistent with line-oriented
/// canonical output.
pub fn restore(module: &decorated::Module) -> Result<ParsedModule, RestoreError> {
    let mut ctx = RestoreCtx {
        pos: 0,
        newlines: Vec::new(),
        trivia: Vec::new(),
        indent: 0,
    };
    check_fragments(NodeKind::Module, &module.decs)?;
    let body = restore_stmt_seq(&module.body, &mut ctx, true)?;
    // End-of-module material. `open_line` tracks whether the current line
    // still needs its terminator.
    let mut open_line = ctx.pos > 0;
    for frag in &module.decs.end {
        if open_line {
            ctx.newline();
        }
        if frag == BLANK_FRAGMENT {
            ctx.blank();
            ctx.newline();
            open_line = false;
        } else {
            ctx.comment(frag, Placement::OwnLine);
            open_line = true;
        }
    }
    if open_line {
        ctx.newline();
    }
    let module = plain::Module {
        body,
        span: graft_core::Span::new(0, ctx.pos),
    };
    debug!(len = ctx.pos, entries = ctx.trivia.len(), "restored module");
    Ok(ParsedModule {
        module,
        lines: LineIndex::from_newlines(ctx.newlines, ctx.pos),
        trivia: ctx.trivia,
    })
}

struct RestoreCtx {
    pos: usize,
    newlines: Vec<usize>,
    trivia: Vec<TriviaEntry>,
    indent: usize,
}

impl RestoreCtx {
    /// Account for `len` bytes of emitted content.
    fn word(&mut self, len: usize) {
        self.pos += len;
    }

    fn newline(&mut self) {
        self.newlines.push(self.pos);
        self.pos += 1;
    }

    fn push_indent(&mut self) {
        self.pos += INDENT.len() * self.indent;
    }

    fn comment(&mut self, text: &str, placement: Placement) {
        self.trivia
            .push(TriviaEntry::comment(self.pos, text, placement));
        self.pos += text.len();
    }

    /// A blank-line marker at the current position; the line itself is
    /// closed by the following `newline` call.
    fn blank(&mut self) {
        self.trivia.push(TriviaEntry::blank(self.pos));
    }
}

fn invalid(kind: NodeKind, reason: impl Into<String>) -> RestoreError {
    RestoreError::InvalidShape {
        kind,
        reason: reason.into(),
    }
}

fn check_ident(ident: &decorated::Ident) -> Result<(), RestoreError> {
    if !IDENT_RE.is_match(&ident.name) || KEYWORDS.contains(&ident.name.as_str()) {
        return Err(invalid(
            NodeKind::Ident,
            format!("`{}` is not a valid identifier", ident.name),
        ));
    }
    Ok(())
}

fn check_fragments(kind: NodeKind, decs: &Decorations) -> Result<(), RestoreError> {
    let all = decs
        .start
        .iter()
        .chain(decs.end.iter())
        .chain(decs.fields().flat_map(|(_, frags)| frags.iter()));
    for frag in all {
        if !fragment_is_valid(frag) {
            return Err(invalid(
                kind,
                format!("decoration fragment {frag:?} is not a line comment or blank marker"),
            ));
        }
    }
    Ok(())
}

/// Binding strength of a decorated expression; mirrors
/// `codegen::plain_expr_precedence`.
fn expr_precedence(expr: &decorated::Expr) -> u8 {
    match expr {
        decorated::Expr::Ident(_)
        | decorated::Expr::Int(_)
        | decorated::Expr::Str(_)
        | decorated::Expr::Paren(_) => 8,
        decorated::Expr::Call(_) => 7,
        decorated::Expr::Unary(_) => 6,
        decorated::Expr::Binary(b) => b.op.precedence(),
    }
}

/// Fragments attached below statement level are hoisted to the statement
/// boundary: comment placement granularity is the statement line.
fn hoisted_fragments(stmt: &decorated::Stmt) -> Vec<String> {
    fn from_decs(decs: &Decorations, out: &mut Vec<String>) {
        out.extend(decs.start.iter().cloned());
        for (_, frags) in decs.fields() {
            out.extend(frags.iter().cloned());
        }
        out.extend(decs.end.iter().cloned());
    }
    fn from_expr(expr: &decorated::Expr, out: &mut Vec<String>) {
        from_decs(expr.decorations(), out);
        match expr {
            decorated::Expr::Unary(u) => from_expr(&u.operand, out),
            decorated::Expr::Binary(b) => {
                from_expr(&b.left, out);
                from_expr(&b.right, out);
            }
            decorated::Expr::Call(c) => {
                from_expr(&c.callee, out);
                for arg in &c.args {
                    from_expr(arg, out);
                }
            }
            decorated::Expr::Paren(p) => from_expr(&p.inner, out),
            _ => {}
        }
    }
    let mut out = Vec::new();
    match stmt {
        decorated::Stmt::Let(l) => {
            from_decs(&l.name.decs, &mut out);
            from_expr(&l.value, &mut out);
        }
        decorated::Stmt::Return(r) => {
            if let Some(value) = &r.value {
                from_expr(value, &mut out);
            }
        }
        decorated::Stmt::Expr(e) => from_expr(&e.expr, &mut out),
        decorated::Stmt::If(i) => from_expr(&i.cond, &mut out),
        decorated::Stmt::While(w) => from_expr(&w.cond, &mut out),
        decorated::Stmt::Fn(f) => {
            from_decs(&f.name.decs, &mut out);
            for param in &f.params {
                from_decs(&param.decs, &mut out);
                from_decs(&param.name.decs, &mut out);
            }
        }
        decorated::Stmt::Block(_) => {}
    }
    out
}

/// Emit the separation and leading fragments for one statement position.
fn open_stmt(
    ctx: &mut RestoreCtx,
    space: Space,
    frags: &[String],
    first: bool,
    module_level: bool,
) {
    // Freshly built nodes carry no directive; statements default to a new
    // line so inserted code is visually separated without author effort.
    let mut space = match space {
        Space::None if !(first && module_level) => Space::NewLine,
        Space::SameLine if !frags.is_empty() => Space::NewLine,
        s => s,
    };
    if first && module_level && space == Space::NewLine {
        space = Space::None;
    }
    match space {
        Space::SameLine => {
            ctx.word(1);
            return;
        }
        Space::None => {}
        Space::NewLine => ctx.newline(),
        Space::EmptyLine => {
            if !(first && module_level) {
                ctx.newline();
            }
            ctx.blank();
            ctx.newline();
        }
    }
    for frag in frags {
        if frag == BLANK_FRAGMENT {
            ctx.blank();
            ctx.newline();
        } else {
            ctx.push_indent();
            ctx.comment(frag, Placement::OwnLine);
            ctx.newline();
        }
    }
    ctx.push_indent();
}

fn restore_stmt_seq(
    stmts: &[decorated::Stmt],
    ctx: &mut RestoreCtx,
    module_level: bool,
) -> Result<Vec<plain::Stmt>, RestoreError> {
    let mut out = Vec::with_capacity(stmts.len());
    for (i, stmt) in stmts.iter().enumerate() {
        let decs = stmt.decorations();
        check_fragments(stmt.kind(), decs)?;
        let mut frags = decs.start.clone();
        frags.extend(hoisted_fragments(stmt));
        for frag in &frags {
            if !fragment_is_valid(frag) {
                return Err(invalid(
                    stmt.kind(),
                    format!("decoration fragment {frag:?} is not a line comment or blank marker"),
                ));
            }
        }
        open_stmt(ctx, decs.before, &frags, i == 0, module_level);
        let plain_stmt = restore_stmt(stmt, ctx)?;
        for frag in &decs.end {
            if frag != BLANK_FRAGMENT {
                ctx.word(1);
                ctx.comment(frag, Placement::Trailing);
            }
        }
        out.push(plain_stmt);
    }
    Ok(out)
}

/// Emit the gap between a statement header and its block: a single space,
/// or the slot's comments each on their own line.
fn open_block_gap(ctx: &mut RestoreCtx, frags: &[String]) {
    let comments: Vec<_> = frags.iter().filter(|f| *f != BLANK_FRAGMENT).collect();
    if comments.is_empty() {
        ctx.word(1);
        return;
    }
    for frag in comments {
        ctx.newline();
        ctx.push_indent();
        ctx.comment(frag, Placement::OwnLine);
    }
    ctx.newline();
    ctx.push_indent();
}

fn restore_block(block: &decorated::Block, ctx: &mut RestoreCtx) -> Result<plain::Block, RestoreError> {
    check_fragments(NodeKind::Block, &block.decs)?;
    let start = ctx.pos;
    ctx.word(1); // "{"
    ctx.indent += 1;
    let newlines_before = ctx.newlines.len();
    let body = restore_stmt_seq(&block.body, ctx, false)?;
    let tail = block.decs.field("body");
    for frag in tail {
        if frag == BLANK_FRAGMENT {
            ctx.newline();
            ctx.blank();
        } else {
            ctx.newline();
            ctx.push_indent();
            ctx.comment(frag, Placement::OwnLine);
        }
    }
    ctx.indent -= 1;
    if ctx.newlines.len() > newlines_before {
        ctx.newline();
        ctx.push_indent();
        ctx.word(1); // "}"
    } else if block.body.is_empty() {
        ctx.word(1); // "}"
    } else {
        ctx.word(2); // " }"
    }
    Ok(plain::Block {
        body,
        span: graft_core::Span::new(start, ctx.pos),
    })
}

fn restore_ident(ident: &decorated::Ident, ctx: &mut RestoreCtx) -> Result<plain::Ident, RestoreError> {
    check_ident(ident)?;
    let start = ctx.pos;
    ctx.word(ident.name.len());
    Ok(plain::Ident {
        name: ident.name.clone(),
        span: graft_core::Span::new(start, ctx.pos),
    })
}

fn restore_if(stmt: &decorated::IfStmt, ctx: &mut RestoreCtx) -> Result<plain::IfStmt, RestoreError> {
    let start = ctx.pos;
    ctx.word(3); // "if "
    let cond = restore_expr(&stmt.cond, ctx)?;
    open_block_gap(ctx, stmt.decs.field("body"));
    let then_block = restore_block(&stmt.then_block, ctx)?;
    let else_branch = match &stmt.else_branch {
        None => None,
        Some(tail) => {
            if !matches!(**tail, decorated::Stmt::Block(_) | decorated::Stmt::If(_)) {
                return Err(invalid(
                    NodeKind::IfStmt,
                    format!("else branch must be a block or if statement, found {}", tail.kind()),
                ));
            }
            let gap: Vec<_> = stmt
                .decs
                .field("else")
                .iter()
                .filter(|f| *f != BLANK_FRAGMENT)
                .collect();
            if gap.is_empty() {
                ctx.word(6); // " else "
            } else {
                for frag in gap {
                    ctx.newline();
                    ctx.push_indent();
                    ctx.comment(frag, Placement::OwnLine);
                }
                ctx.newline();
                ctx.push_indent();
                ctx.word(5); // "else "
            }
            Some(Box::new(restore_stmt(tail, ctx)?))
        }
    };
    let end = ctx.pos;
    Ok(plain::IfStmt {
        cond,
        then_block,
        else_branch,
        span: graft_core::Span::new(start, end),
    })
}

fn restore_stmt(stmt: &decorated::Stmt, ctx: &mut RestoreCtx) -> Result<plain::Stmt, RestoreError> {
    Ok(match stmt {
        decorated::Stmt::Let(l) => {
            let start = ctx.pos;
            ctx.word(4); // "let "
            let name = restore_ident(&l.name, ctx)?;
            ctx.word(3); // " = "
            let value = restore_expr(&l.value, ctx)?;
            ctx.word(1); // ";"
            plain::Stmt::Let(plain::LetStmt {
                name,
                value,
                span: graft_core::Span::new(start, ctx.pos),
            })
        }
        decorated::Stmt::Return(r) => {
            let start = ctx.pos;
            ctx.word(6); // "return"
            let value = match &r.value {
                Some(v) => {
                    ctx.word(1); // " "
                    Some(restore_expr(v, ctx)?)
                }
                None => None,
            };
            ctx.word(1); // ";"
            plain::Stmt::Return(plain::ReturnStmt {
                value,
                span: graft_core::Span::new(start, ctx.pos),
            })
        }
        decorated::Stmt::Expr(e) => {
            let start = ctx.pos;
            let expr = restore_expr(&e.expr, ctx)?;
            ctx.word(1); // ";"
            plain::Stmt::Expr(plain::ExprStmt {
                expr,
                span: graft_core::Span::new(start, ctx.pos),
            })
        }
        decorated::Stmt::If(i) => plain::Stmt::If(restore_if(i, ctx)?),
        decorated::Stmt::While(w) => {
            let start = ctx.pos;
            ctx.word(6); // "while "
            let cond = restore_expr(&w.cond, ctx)?;
            open_block_gap(ctx, w.decs.field("body"));
            let body = restore_block(&w.body, ctx)?;
            plain::Stmt::While(plain::WhileStmt {
                cond,
                body,
                span: graft_core::Span::new(start, ctx.pos),
            })
        }
        decorated::Stmt::Fn(f) => {
            let start = ctx.pos;
            ctx.word(3); // "fn "
            let name = restore_ident(&f.name, ctx)?;
            ctx.word(1); // "("
            let mut params = Vec::with_capacity(f.params.len());
            for (i, param) in f.params.iter().enumerate() {
                if i > 0 {
                    ctx.word(2); // ", "
                }
                let name = restore_ident(&param.name, ctx)?;
                params.push(plain::Param {
                    span: name.span,
                    name,
                });
            }
            ctx.word(1); // ")"
            open_block_gap(ctx, f.decs.field("body"));
            let body = restore_block(&f.body, ctx)?;
            plain::Stmt::Fn(plain::FnDecl {
                name,
                params,
                body,
                span: graft_core::Span::new(start, ctx.pos),
            })
        }
        decorated::Stmt::Block(b) => plain::Stmt::Block(restore_block(b, ctx)?),
    })
}

fn restore_expr_child(
    child: &decorated::Expr,
    parent_prec: u8,
    is_right: bool,
    ctx: &mut RestoreCtx,
) -> Result<plain::Expr, RestoreError> {
    if needs_parens(expr_precedence(child), parent_prec, is_right) {
        ctx.word(1); // "("
        let expr = restore_expr(child, ctx)?;
        ctx.word(1); // ")"
        Ok(expr)
    } else {
        restore_expr(child, ctx)
    }
}

fn restore_expr(expr: &decorated::Expr, ctx: &mut RestoreCtx) -> Result<plain::Expr, RestoreError> {
    Ok(match expr {
        decorated::Expr::Ident(i) => plain::Expr::Ident(restore_ident(i, ctx)?),
        decorated::Expr::Int(i) => {
            let start = ctx.pos;
            ctx.word(i.value.to_string().len());
            plain::Expr::Int(plain::IntLit {
                value: i.value,
                span: graft_core::Span::new(start, ctx.pos),
            })
        }
        decorated::Expr::Str(s) => {
            let start = ctx.pos;
            ctx.word(escape_string(&s.value).len());
            plain::Expr::Str(plain::StrLit {
                value: s.value.clone(),
                span: graft_core::Span::new(start, ctx.pos),
            })
        }
        decorated::Expr::Paren(p) => {
            let start = ctx.pos;
            ctx.word(1); // "("
            let inner = restore_expr(&p.inner, ctx)?;
            ctx.word(1); // ")"
            plain::Expr::Paren(plain::ParenExpr {
                inner: Box::new(inner),
                span: graft_core::Span::new(start, ctx.pos),
            })
        }
        decorated::Expr::Unary(u) => {
            let start = ctx.pos;
            ctx.word(u.op.as_str().len());
            let operand = restore_expr_child(&u.operand, 6, false, ctx)?;
            plain::Expr::Unary(plain::UnaryExpr {
                op: u.op,
                operand: Box::new(operand),
                span: graft_core::Span::new(start, ctx.pos),
            })
        }
        decorated::Expr::Binary(b) => {
            let prec = b.op.precedence();
            let start = ctx.pos;
            let left = restore_expr_child(&b.left, prec, false, ctx)?;
            ctx.word(b.op.as_str().len() + 2); // " op "
            let right = restore_expr_child(&b.right, prec, true, ctx)?;
            plain::Expr::Binary(plain::BinaryExpr {
                left: Box::new(left),
                op: b.op,
                right: Box::new(right),
                span: graft_core::Span::new(start, ctx.pos),
            })
        }
        decorated::Expr::Call(c) => {
            let start = ctx.pos;
            let callee = restore_expr_child(&c.callee, 7, false, ctx)?;
            ctx.word(1); // "("
            let mut args = Vec::with_capacity(c.args.len());
            for (i, arg) in c.args.iter().enumerate() {
                if i > 0 {
                    ctx.word(2); // ", "
                }
                args.push(restore_expr(arg, ctx)?);
            }
            ctx.word(1); // ")"
            plain::Expr::Call(plain::CallExpr {
                callee: Box::new(callee),
                args,
                span: graft_core::Span::new(start, ctx.pos),
            })
        }
    })
}
