// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! The decorator: positioned plain tree + trivia side-table → decorated tree.
//!
//! The walk advances two cursors in lockstep: the structural recursion over
//! the plain tree, and [`DecorateCtx`]'s index into the offset-ordered
//! side-table. At each statement boundary the context consumes every entry
//! whose offset falls in the gap and folds it into decoration slots:
//!
//! - own-line comments and blank lines before a statement become `start`
//!   fragments and the `before` spacing directive;
//! - a trailing comment on the statement's end line becomes an `end`
//!   fragment with `after = SameLine`;
//! - material between a header and its block (or between a then-block and
//!   `else`) lands in the owning node's per-field slot;
//! - entries left at a region's end become the region owner's tail slot.
//!
//! Every entry must be consumed; leftovers mean the side-table disagrees
//! with the tree and the conversion fails rather than dropping data.

use graft_core::{LineIndex, Placement, TriviaEntry, TriviaKind};
use tracing::debug;

use crate::errors::DecorateError;
use crate::nodes::decorations::{BLANK_FRAGMENT, Space};
use crate::nodes::{decorated, plain};
use crate::ParsedModule;

/// Convert a parse result into a self-contained decorated tree.
///
/// Fails with [`DecorateError::UnresolvedDecoration`] if any side-table
/// entry cannot be attached to a node boundary.
pub fn decorate(parsed: &ParsedModule) -> Result<decorated::Module, DecorateError> {
    let mut ctx = DecorateCtx {
        entries: &parsed.trivia,
        next: 0,
        lines: &parsed.lines,
    };
    let module = parsed.module.decorate(&mut ctx)?;
    ctx.finish()?;
    debug!(entries = parsed.trivia.len(), "decorated module");
    Ok(module)
}

/// Threads the side-table cursor and line table through the walk.
pub(crate) struct DecorateCtx<'a> {
    entries: &'a [TriviaEntry],
    next: usize,
    lines: &'a LineIndex,
}

impl DecorateCtx<'_> {
    fn peek(&self) -> Option<&TriviaEntry> {
        self.entries.get(self.next)
    }

    /// Consume entries before `target` into a leading-position slot:
    /// the spacing directive for the gap plus the `start` fragment list.
    /// Blank entries ahead of the first comment fold into the directive;
    /// later ones become `"\n"` fragments separating comments.
    fn take_leading(
        &mut self,
        anchor: usize,
        target: usize,
        at_module_start: bool,
    ) -> (Space, Vec<String>) {
        let mut frags = Vec::new();
        let mut leading_blank = false;
        let mut first_offset = None;
        while let Some(entry) = self.peek() {
            if entry.offset >= target {
                break;
            }
            first_offset.get_or_insert(entry.offset);
            match &entry.kind {
                TriviaKind::Blank => {
                    if frags.is_empty() {
                        leading_blank = true;
                    } else {
                        frags.push(BLANK_FRAGMENT.to_string());
                    }
                }
                TriviaKind::Comment(text) => frags.push(text.clone()),
            }
            self.next += 1;
        }
        let first = first_offset.unwrap_or(target);
        let space = if leading_blank {
            Space::EmptyLine
        } else {
            match self.lines.newlines_between(anchor, first) {
                0 if at_module_start => Space::None,
                0 => Space::SameLine,
                1 => Space::NewLine,
                _ => Space::EmptyLine,
            }
        };
        (space, frags)
    }

    /// Consume a trailing comment sharing the line that ends at
    /// `content_end`, bounded by `limit` so comments trailing a later
    /// same-line statement stay with that statement.
    fn take_trailing(&mut self, content_end: usize, limit: usize) -> (Space, Vec<String>) {
        let mut frags = Vec::new();
        let line = self.lines.line_of(content_end.saturating_sub(1));
        while let Some(entry) = self.peek() {
            let attaches = entry.placement == Placement::Trailing
                && entry.offset < limit
                && self.lines.line_of(entry.offset) == line;
            match &entry.kind {
                TriviaKind::Comment(text) if attaches => {
                    frags.push(text.clone());
                    self.next += 1;
                }
                _ => break,
            }
        }
        let space = if frags.is_empty() {
            Space::None
        } else {
            Space::SameLine
        };
        (space, frags)
    }

    /// Consume entries before `target` into a bare fragment list, for
    /// field slots and region tails. Blanks become `"\n"` fragments.
    fn take_fragments(&mut self, target: usize) -> Vec<String> {
        let mut frags = Vec::new();
        while let Some(entry) = self.peek() {
            if entry.offset >= target {
                break;
            }
            match &entry.kind {
                TriviaKind::Blank => frags.push(BLANK_FRAGMENT.to_string()),
                TriviaKind::Comment(text) => frags.push(text.clone()),
            }
            self.next += 1;
        }
        frags
    }

    fn finish(&self) -> Result<(), DecorateError> {
        match self.peek() {
            Some(entry) => Err(DecorateError::UnresolvedDecoration {
                offset: entry.offset,
                detail: "side-table entry lies outside every node boundary".to_string(),
            }),
            None => Ok(()),
        }
    }
}

/// Per-node conversion into the decorated family, consuming side-table
/// entries as the walk crosses their offsets.
pub(crate) trait Decorate {
    type Decorated;
    fn decorate(&self, ctx: &mut DecorateCtx<'_>) -> Result<Self::Decorated, DecorateError>;
}

impl<T: Decorate> Decorate for Option<T> {
    type Decorated = Option<T::Decorated>;
    fn decorate(&self, ctx: &mut DecorateCtx<'_>) -> Result<Self::Decorated, DecorateError> {
        self.as_ref().map(|x| x.decorate(ctx)).transpose()
    }
}

impl<T: Decorate> Decorate for Box<T> {
    type Decorated = Box<T::Decorated>;
    fn decorate(&self, ctx: &mut DecorateCtx<'_>) -> Result<Self::Decorated, DecorateError> {
        Ok(Box::new((**self).decorate(ctx)?))
    }
}

impl<T: Decorate> Decorate for Vec<T> {
    type Decorated = Vec<T::Decorated>;
    fn decorate(&self, ctx: &mut DecorateCtx<'_>) -> Result<Self::Decorated, DecorateError> {
        self.iter().map(|item| item.decorate(ctx)).collect()
    }
}

/// Decorate the statements of one region (module body or block body),
/// attaching boundary trivia to each statement's slots.
fn decorate_stmt_seq(
    stmts: &[plain::Stmt],
    ctx: &mut DecorateCtx<'_>,
    open_end: usize,
    region_end: usize,
    module_level: bool,
) -> Result<Vec<decorated::Stmt>, DecorateError> {
    let mut out = Vec::with_capacity(stmts.len());
    let mut anchor = open_end;
    for (i, stmt) in stmts.iter().enumerate() {
        let limit = stmts
            .get(i + 1)
            .map(|next| next.span().start)
            .unwrap_or(region_end);
        let (before, start) =
            ctx.take_leading(anchor, stmt.span().start, module_level && i == 0);
        let mut dec = stmt.decorate(ctx)?;
        let (after, end) = ctx.take_trailing(stmt.span().end, limit);
        let decs = dec.decorations_mut();
        decs.before = before;
        decs.start = start;
        decs.after = after;
        decs.end = end;
        anchor = stmt.span().end;
        out.push(dec);
    }
    Ok(out)
}

impl Decorate for plain::Module {
    type Decorated = decorated::Module;
    fn decorate(&self, ctx: &mut DecorateCtx<'_>) -> Result<Self::Decorated, DecorateError> {
        let body = decorate_stmt_seq(&self.body, ctx, self.span.start, self.span.end, true)?;
        let mut module = decorated::Module {
            body,
            decs: Default::default(),
        };
        module.decs.end = ctx.take_fragments(self.span.end);
        Ok(module)
    }
}

impl Decorate for plain::Block {
    type Decorated = decorated::Block;
    fn decorate(&self, ctx: &mut DecorateCtx<'_>) -> Result<Self::Decorated, DecorateError> {
        let body = decorate_stmt_seq(
            &self.body,
            ctx,
            self.span.start + 1,
            self.span.end - 1,
            false,
        )?;
        let mut block = decorated::Block {
            body,
            decs: Default::default(),
        };
        let tail = ctx.take_fragments(self.span.end - 1);
        if !tail.is_empty() {
            *block.decs.field_mut("body") = tail;
        }
        Ok(block)
    }
}

impl Decorate for plain::Stmt {
    type Decorated = decorated::Stmt;
    fn decorate(&self, ctx: &mut DecorateCtx<'_>) -> Result<Self::Decorated, DecorateError> {
        Ok(match self {
            plain::Stmt::Let(l) => decorated::Stmt::Let(l.decorate(ctx)?),
            plain::Stmt::Return(r) => decorated::Stmt::Return(r.decorate(ctx)?),
            plain::Stmt::Expr(e) => decorated::Stmt::Expr(e.decorate(ctx)?),
            plain::Stmt::If(i) => decorated::Stmt::If(i.decorate(ctx)?),
            plain::Stmt::While(w) => decorated::Stmt::While(w.decorate(ctx)?),
            plain::Stmt::Fn(f) => decorated::Stmt::Fn(f.decorate(ctx)?),
            plain::Stmt::Block(b) => decorated::Stmt::Block(b.decorate(ctx)?),
        })
    }
}

impl Decorate for plain::LetStmt {
    type Decorated = decorated::LetStmt;
    fn decorate(&self, ctx: &mut DecorateCtx<'_>) -> Result<Self::Decorated, DecorateError> {
        Ok(decorated::LetStmt {
            name: self.name.decorate(ctx)?,
            value: self.value.decorate(ctx)?,
            decs: Default::default(),
        })
    }
}

impl Decorate for plain::ReturnStmt {
    type Decorated = decorated::ReturnStmt;
    fn decorate(&self, ctx: &mut DecorateCtx<'_>) -> Result<Self::Decorated, DecorateError> {
        Ok(decorated::ReturnStmt {
            value: self.value.decorate(ctx)?,
            decs: Default::default(),
        })
    }
}

impl Decorate for plain::ExprStmt {
    type Decorated = decorated::ExprStmt;
    fn decorate(&self, ctx: &mut DecorateCtx<'_>) -> Result<Self::Decorated, DecorateError> {
        Ok(decorated::ExprStmt {
            expr: self.expr.decorate(ctx)?,
            decs: Default::default(),
        })
    }
}

impl Decorate for plain::IfStmt {
    type Decorated = decorated::IfStmt;
    fn decorate(&self, ctx: &mut DecorateCtx<'_>) -> Result<Self::Decorated, DecorateError> {
        let cond = self.cond.decorate(ctx)?;
        let mut decs = crate::nodes::decorations::Decorations::default();
        let header_gap = ctx.take_fragments(self.then_block.span.start);
        if !header_gap.is_empty() {
            *decs.field_mut("body") = header_gap;
        }
        let then_block = self.then_block.decorate(ctx)?;
        if let Some(tail) = &self.else_branch {
            let gap = ctx.take_fragments(tail.span().start);
            if !gap.is_empty() {
                *decs.field_mut("else") = gap;
            }
        }
        Ok(decorated::IfStmt {
            cond,
            then_block,
            else_branch: self.else_branch.decorate(ctx)?,
            decs,
        })
    }
}

impl Decorate for plain::WhileStmt {
    type Decorated = decorated::WhileStmt;
    fn decorate(&self, ctx: &mut DecorateCtx<'_>) -> Result<Self::Decorated, DecorateError> {
        let cond = self.cond.decorate(ctx)?;
        let mut decs = crate::nodes::decorations::Decorations::default();
        let gap = ctx.take_fragments(self.body.span.start);
        if !gap.is_empty() {
            *decs.field_mut("body") = gap;
        }
        Ok(decorated::WhileStmt {
            cond,
            body: self.body.decorate(ctx)?,
            decs,
        })
    }
}

impl Decorate for plain::FnDecl {
    type Decorated = decorated::FnDecl;
    fn decorate(&self, ctx: &mut DecorateCtx<'_>) -> Result<Self::Decorated, DecorateError> {
        let name = self.name.decorate(ctx)?;
        let params = self.params.decorate(ctx)?;
        let mut decs = crate::nodes::decorations::Decorations::default();
        let gap = ctx.take_fragments(self.body.span.start);
        if !gap.is_empty() {
            *decs.field_mut("body") = gap;
        }
        Ok(decorated::FnDecl {
            name,
            params,
            body: self.body.decorate(ctx)?,
            decs,
        })
    }
}

impl Decorate for plain::Param {
    type Decorated = decorated::Param;
    fn decorate(&self, ctx: &mut DecorateCtx<'_>) -> Result<Self::Decorated, DecorateError> {
        Ok(decorated::Param {
            name: self.name.decorate(ctx)?,
            decs: Default::default(),
        })
    }
}

impl Decorate for plain::Ident {
    type Decorated = decorated::Ident;
    fn decorate(&self, _ctx: &mut DecorateCtx<'_>) -> Result<Self::Decorated, DecorateError> {
        Ok(decorated::Ident {
            name: self.name.clone(),
            decs: Default::default(),
        })
    }
}

impl Decorate for plain::Expr {
    type Decorated = decorated::Expr;
    fn decorate(&self, ctx: &mut DecorateCtx<'_>) -> Result<Self::Decorated, DecorateError> {
        Ok(match self {
            plain::Expr::Ident(i) => decorated::Expr::Ident(i.decorate(ctx)?),
            plain::Expr::Int(i) => decorated::Expr::Int(decorated::IntLit {
                value: i.value,
                decs: Default::default(),
            }),
            plain::Expr::Str(s) => decorated::Expr::Str(decorated::StrLit {
                value: s.value.clone(),
                decs: Default::default(),
            }),
            plain::Expr::Unary(u) => decorated::Expr::Unary(decorated::UnaryExpr {
                op: u.op,
                operand: u.operand.decorate(ctx)?,
                decs: Default::default(),
            }),
            plain::Expr::Binary(b) => decorated::Expr::Binary(decorated::BinaryExpr {
                left: b.left.decorate(ctx)?,
                op: b.op,
                right: b.right.decorate(ctx)?,
                decs: Default::default(),
            }),
            plain::Expr::Call(c) => decorated::Expr::Call(decorated::CallExpr {
                callee: c.callee.decorate(ctx)?,
                args: c.args.decorate(ctx)?,
                decs: Default::default(),
            }),
            plain::Expr::Paren(p) => decorated::Expr::Paren(decorated::ParenExpr {
                inner: p.inner.decorate(ctx)?,
                decs: Default::default(),
            }),
        })
    }
}
