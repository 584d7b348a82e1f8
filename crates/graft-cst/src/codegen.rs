// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Canonical printer for the positioned plain tree.
//!
//! The print boundary of the pipeline: it consumes a plain tree plus its
//! trivia side-table and emits canonical source text. Offsets are used
//! ordinally — an entry prints before the first node whose span starts
//! after it — and the line table decides same-line versus new-line
//! placement. Canonically formatted input reproduces byte-for-byte; other
//! input normalizes to canonical form.
//!
//! The restorer in `restore.rs` performs the same emission virtually to
//! synthesize offsets; the two walks must stay textually parallel.

use graft_core::{LineIndex, Placement, TriviaEntry, TriviaKind};

use crate::nodes::plain::{Block, Expr, IfStmt, Module, Stmt};

pub(crate) const INDENT: &str = "    ";

/// Binding strength of a whole expression, for minimal-parenthesis
/// printing. Atoms bind tightest; calls bind tighter than unary prefixes.
pub(crate) fn plain_expr_precedence(expr: &Expr) -> u8 {
    match expr {
        Expr::Ident(_) | Expr::Int(_) | Expr::Str(_) | Expr::Paren(_) => 8,
        Expr::Call(_) => 7,
        Expr::Unary(_) => 6,
        Expr::Binary(b) => b.op.precedence(),
    }
}

/// True when a child expression must be parenthesized under a parent of
/// the given precedence. Right operands of equal precedence need parens
/// (operators are left-associative).
pub(crate) fn needs_parens(child_prec: u8, parent_prec: u8, is_right: bool) -> bool {
    child_prec < parent_prec || (child_prec == parent_prec && is_right)
}

/// Escape a string value into its canonical quoted literal form.
pub(crate) fn escape_string(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        match c {
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            _ => out.push(c),
        }
    }
    out.push('"');
    out
}

struct CodegenState<'a> {
    out: String,
    indent: usize,
    entries: &'a [TriviaEntry],
    next: usize,
    lines: &'a LineIndex,
}

impl<'a> CodegenState<'a> {
    fn push(&mut self, s: &str) {
        self.out.push_str(s);
    }

    fn push_indent(&mut self) {
        for _ in 0..self.indent {
            self.out.push_str(INDENT);
        }
    }

    fn peek(&self) -> Option<&'a TriviaEntry> {
        self.entries.get(self.next)
    }

    /// Emit the vertical separation between two source positions:
    /// same line → one space, next line → newline + indent, further →
    /// newline, blank line, indent. The first item of the module gets no
    /// separator unless the file opens with a blank line.
    fn sep(&mut self, from: usize, to: usize, module_first: bool) {
        let n = self.lines.newlines_between(from, to);
        if module_first {
            if n >= 1 {
                self.push("\n");
            }
            return;
        }
        match n {
            0 => self.push(" "),
            1 => {
                self.push("\n");
                self.push_indent();
            }
            _ => {
                self.push("\n\n");
                self.push_indent();
            }
        }
    }

    /// Emit every comment entry positioned before `target`, each on its
    /// own (separated) line. Blank entries are skipped: the line table
    /// already encodes them and `sep` re-derives the empty lines.
    fn leading(&mut self, mut anchor: usize, target: usize, mut first: bool) -> (usize, bool) {
        while let Some(entry) = self.peek() {
            if entry.offset >= target {
                break;
            }
            match &entry.kind {
                TriviaKind::Blank => {}
                TriviaKind::Comment(text) => {
                    self.sep(anchor, entry.offset, first);
                    self.push(text);
                    anchor = entry.offset + text.len();
                    first = false;
                }
            }
            self.next += 1;
        }
        (anchor, first)
    }

    /// Emit trailing comments sharing the line that ends at `content_end`,
    /// stopping at `limit` so a comment trailing a later statement on the
    /// same line stays with that statement.
    fn trailing(&mut self, content_end: usize, limit: usize) -> usize {
        let mut anchor = content_end;
        let line = self.lines.line_of(content_end.saturating_sub(1));
        while let Some(entry) = self.peek() {
            let same_line = self.lines.line_of(entry.offset) == line;
            match &entry.kind {
                TriviaKind::Comment(text)
                    if entry.placement == Placement::Trailing
                        && entry.offset < limit
                        && same_line =>
                {
                    self.push(" ");
                    self.push(text);
                    anchor = entry.offset + text.len();
                    self.next += 1;
                }
                _ => break,
            }
        }
        anchor
    }

    fn emit_stmt_region(&mut self, stmts: &[Stmt], open_end: usize, region_end: usize) {
        let mut anchor = open_end;
        for (i, stmt) in stmts.iter().enumerate() {
            let limit = stmts
                .get(i + 1)
                .map(|next| next.span().start)
                .unwrap_or(region_end);
            (anchor, _) = self.leading(anchor, stmt.span().start, false);
            self.sep(anchor, stmt.span().start, false);
            self.emit_stmt(stmt);
            anchor = self.trailing(stmt.span().end, limit);
        }
        self.leading(anchor, region_end, false);
    }

    fn emit_block(&mut self, block: &Block) {
        self.push("{");
        self.indent += 1;
        let open_len = self.out.len();
        // The closing brace sits at span.end - 1; everything before it
        // belongs inside the block.
        self.emit_stmt_region(&block.body, block.span.start + 1, block.span.end - 1);
        self.indent -= 1;
        if self.out.len() == open_len {
            self.push("}");
        } else if self.out[open_len..].contains('\n') {
            self.push("\n");
            self.push_indent();
            self.push("}");
        } else {
            self.push(" }");
        }
    }

    /// Emit comments sitting in a statement-header gap (between an `if`'s
    /// then-block and `else`, or between a loop/function header and its
    /// body). Returns true if any were emitted, in which case the caller
    /// continues on a fresh line instead of the same one.
    fn gap_comments(&mut self, target: usize) -> bool {
        let mut emitted = false;
        while let Some(entry) = self.peek() {
            if entry.offset >= target {
                break;
            }
            match &entry.kind {
                TriviaKind::Blank => {}
                TriviaKind::Comment(text) => {
                    self.push("\n");
                    self.push_indent();
                    self.push(text);
                    emitted = true;
                }
            }
            self.next += 1;
        }
        emitted
    }

    fn emit_if(&mut self, stmt: &IfStmt) {
        self.push("if ");
        self.emit_expr(&stmt.cond);
        self.gap_to_block(stmt.then_block.span.start);
        self.emit_block(&stmt.then_block);
        if let Some(tail) = &stmt.else_branch {
            if self.gap_comments(tail.span().start) {
                self.push("\n");
                self.push_indent();
                self.push("else ");
            } else {
                self.push(" else ");
            }
            match &**tail {
                Stmt::If(nested) => self.emit_if(nested),
                other => self.emit_stmt(other),
            }
        }
    }

    fn gap_to_block(&mut self, block_start: usize) {
        if self.gap_comments(block_start) {
            self.push("\n");
            self.push_indent();
        } else {
            self.push(" ");
        }
    }

    fn emit_stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Let(l) => {
                self.push("let ");
                self.push(&l.name.name);
                self.push(" = ");
                self.emit_expr(&l.value);
                self.push(";");
            }
            Stmt::Return(r) => {
                self.push("return");
                if let Some(value) = &r.value {
                    self.push(" ");
                    self.emit_expr(value);
                }
                self.push(";");
            }
            Stmt::Expr(e) => {
                self.emit_expr(&e.expr);
                self.push(";");
            }
            Stmt::If(i) => self.emit_if(i),
            Stmt::While(w) => {
                self.push("while ");
                self.emit_expr(&w.cond);
                self.gap_to_block(w.body.span.start);
                self.emit_block(&w.body);
            }
            Stmt::Fn(f) => {
                self.push("fn ");
                self.push(&f.name.name);
                self.push("(");
                for (i, param) in f.params.iter().enumerate() {
                    if i > 0 {
                        self.push(", ");
                    }
                    self.push(&param.name.name);
                }
                self.push(")");
                self.gap_to_block(f.body.span.start);
                self.emit_block(&f.body);
            }
            Stmt::Block(b) => self.emit_block(b),
        }
    }

    fn emit_expr_child(&mut self, child: &Expr, parent_prec: u8, is_right: bool) {
        if needs_parens(plain_expr_precedence(child), parent_prec, is_right) {
            self.push("(");
            self.emit_expr(child);
            self.push(")");
        } else {
            self.emit_expr(child);
        }
    }

    fn emit_expr(&mut self, expr: &Expr) {
        match expr {
            Expr::Ident(i) => self.push(&i.name),
            Expr::Int(i) => self.push(&i.value.to_string()),
            Expr::Str(s) => self.push(&escape_string(&s.value)),
            Expr::Paren(p) => {
                self.push("(");
                self.emit_expr(&p.inner);
                self.push(")");
            }
            Expr::Unary(u) => {
                self.push(u.op.as_str());
                self.emit_expr_child(&u.operand, 6, false);
            }
            Expr::Binary(b) => {
                let prec = b.op.precedence();
                self.emit_expr_child(&b.left, prec, false);
                self.push(" ");
                self.push(b.op.as_str());
                self.push(" ");
                self.emit_expr_child(&b.right, prec, true);
            }
            Expr::Call(c) => {
                self.emit_expr_child(&c.callee, 7, false);
                self.push("(");
                for (i, arg) in c.args.iter().enumerate() {
                    if i > 0 {
                        self.push(", ");
                    }
                    self.emit_expr(arg);
                }
                self.push(")");
            }
        }
    }
}

/// Print a plain tree plus side-table to canonical source text.
pub(crate) fn print(module: &Module, entries: &[TriviaEntry], lines: &LineIndex) -> String {
    let mut state = CodegenState {
        out: String::new(),
        indent: 0,
        entries,
        next: 0,
        lines,
    };
    let mut anchor = module.span.start;
    let mut first = true;
    for (i, stmt) in module.body.iter().enumerate() {
        let limit = module
            .body
            .get(i + 1)
            .map(|next| next.span().start)
            .unwrap_or(usize::MAX);
        (anchor, first) = state.leading(anchor, stmt.span().start, first);
        state.sep(anchor, stmt.span().start, first);
        state.emit_stmt(stmt);
        first = false;
        anchor = state.trailing(stmt.span().end, limit);
    }
    let (_, _) = state.leading(anchor, usize::MAX, first);
    if !state.out.is_empty() {
        state.push("\n");
    }
    state.out
}
