// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Read-only traversal over the decorated tree.
//!
//! Consumers that only inspect the tree — analyzers, collectors — implement
//! [`Visitor`] instead of driving the rewrite engine. Each node kind has a
//! `visit_*` / `leave_*` method pair with do-nothing defaults:
//!
//! - `visit_*` runs in pre-order and controls descent via [`VisitResult`],
//! - `leave_*` runs in post-order, and still fires after `SkipChildren`,
//! - `Stop` halts the walk immediately with no further callbacks.
//!
//! Children are visited in source order. The free `walk_*` functions drive
//! the traversal and can be called on any subtree.

use crate::nodes::decorated::{
    BinaryExpr, Block, CallExpr, Expr, ExprStmt, FnDecl, Ident, IfStmt, IntLit, LetStmt, Module,
    Param, ParenExpr, ReturnStmt, Stmt, StrLit, UnaryExpr, WhileStmt,
};

/// Result of visiting a node; controls how the walk proceeds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum VisitResult {
    /// Continue into the node's children.
    #[default]
    Continue,
    /// Skip the children; `leave_*` still fires for this node.
    SkipChildren,
    /// Halt the walk immediately; no further callbacks fire.
    Stop,
}

macro_rules! visitor_methods {
    (
        $(
            $(#[$meta:meta])*
            $base:ident : $node:ty
        ),* $(,)?
    ) => {
        paste::paste! {
            $(
                $(#[$meta])*
                #[doc = concat!("Visit a [`", stringify!($node), "`] node, before its children.")]
                #[allow(unused_variables)]
                fn [<visit_ $base>](&mut self, node: &$node) -> VisitResult {
                    VisitResult::Continue
                }

                $(#[$meta])*
                #[doc = concat!("Leave a [`", stringify!($node), "`] node, after its children.")]
                #[allow(unused_variables)]
                fn [<leave_ $base>](&mut self, node: &$node) {}
            )*
        }
    };
}

/// Immutable visitor over the decorated tree.
pub trait Visitor {
    visitor_methods! {
        module: Module,
        stmt: Stmt,
        let_stmt: LetStmt,
        return_stmt: ReturnStmt,
        expr_stmt: ExprStmt,
        if_stmt: IfStmt,
        while_stmt: WhileStmt,
        fn_decl: FnDecl,
        block: Block,
        param: Param,
        ident: Ident,
        expr: Expr,
        int_lit: IntLit,
        str_lit: StrLit,
        unary_expr: UnaryExpr,
        binary_expr: BinaryExpr,
        call_expr: CallExpr,
        paren_expr: ParenExpr,
    }
}

macro_rules! try_walk {
    ($result:expr) => {
        if $result == VisitResult::Stop {
            return VisitResult::Stop;
        }
    };
}

/// Walk a whole module.
pub fn walk_module<V: Visitor + ?Sized>(v: &mut V, node: &Module) -> VisitResult {
    match v.visit_module(node) {
        VisitResult::Stop => return VisitResult::Stop,
        VisitResult::SkipChildren => {}
        VisitResult::Continue => {
            for stmt in &node.body {
                try_walk!(walk_stmt(v, stmt));
            }
        }
    }
    v.leave_module(node);
    VisitResult::Continue
}

/// Walk a statement of any kind.
pub fn walk_stmt<V: Visitor + ?Sized>(v: &mut V, node: &Stmt) -> VisitResult {
    match v.visit_stmt(node) {
        VisitResult::Stop => return VisitResult::Stop,
        VisitResult::SkipChildren => {}
        VisitResult::Continue => {
            let result = match node {
                Stmt::Let(l) => walk_let_stmt(v, l),
                Stmt::Return(r) => walk_return_stmt(v, r),
                Stmt::Expr(e) => walk_expr_stmt(v, e),
                Stmt::If(i) => walk_if_stmt(v, i),
                Stmt::While(w) => walk_while_stmt(v, w),
                Stmt::Fn(f) => walk_fn_decl(v, f),
                Stmt::Block(b) => walk_block(v, b),
            };
            try_walk!(result);
        }
    }
    v.leave_stmt(node);
    VisitResult::Continue
}

pub fn walk_let_stmt<V: Visitor + ?Sized>(v: &mut V, node: &LetStmt) -> VisitResult {
    match v.visit_let_stmt(node) {
        VisitResult::Stop => return VisitResult::Stop,
        VisitResult::SkipChildren => {}
        VisitResult::Continue => {
            try_walk!(walk_ident(v, &node.name));
            try_walk!(walk_expr(v, &node.value));
        }
    }
    v.leave_let_stmt(node);
    VisitResult::Continue
}

pub fn walk_return_stmt<V: Visitor + ?Sized>(v: &mut V, node: &ReturnStmt) -> VisitResult {
    match v.visit_return_stmt(node) {
        VisitResult::Stop => return VisitResult::Stop,
        VisitResult::SkipChildren => {}
        VisitResult::Continue => {
            if let Some(value) = &node.value {
                try_walk!(walk_expr(v, value));
            }
        }
    }
    v.leave_return_stmt(node);
    VisitResult::Continue
}

pub fn walk_expr_stmt<V: Visitor + ?Sized>(v: &mut V, node: &ExprStmt) -> VisitResult {
    match v.visit_expr_stmt(node) {
        VisitResult::Stop => return VisitResult::Stop,
        VisitResult::SkipChildren => {}
        VisitResult::Continue => {
            try_walk!(walk_expr(v, &node.expr));
        }
    }
    v.leave_expr_stmt(node);
    VisitResult::Continue
}

pub fn walk_if_stmt<V: Visitor + ?Sized>(v: &mut V, node: &IfStmt) -> VisitResult {
    match v.visit_if_stmt(node) {
        VisitResult::Stop => return VisitResult::Stop,
        VisitResult::SkipChildren => {}
        VisitResult::Continue => {
            try_walk!(walk_expr(v, &node.cond));
            try_walk!(walk_block(v, &node.then_block));
            if let Some(tail) = &node.else_branch {
                try_walk!(walk_stmt(v, tail));
            }
        }
    }
    v.leave_if_stmt(node);
    VisitResult::Continue
}

pub fn walk_while_stmt<V: Visitor + ?Sized>(v: &mut V, node: &WhileStmt) -> VisitResult {
    match v.visit_while_stmt(node) {
        VisitResult::Stop => return VisitResult::Stop,
        VisitResult::SkipChildren => {}
        VisitResult::Continue => {
            try_walk!(walk_expr(v, &node.cond));
            try_walk!(walk_block(v, &node.body));
        }
    }
    v.leave_while_stmt(node);
    VisitResult::Continue
}

pub fn walk_fn_decl<V: Visitor + ?Sized>(v: &mut V, node: &FnDecl) -> VisitResult {
    match v.visit_fn_decl(node) {
        VisitResult::Stop => return VisitResult::Stop,
        VisitResult::SkipChildren => {}
        VisitResult::Continue => {
            try_walk!(walk_ident(v, &node.name));
            for param in &node.params {
                try_walk!(walk_param(v, param));
            }
            try_walk!(walk_block(v, &node.body));
        }
    }
    v.leave_fn_decl(node);
    VisitResult::Continue
}

pub fn walk_block<V: Visitor + ?Sized>(v: &mut V, node: &Block) -> VisitResult {
    match v.visit_block(node) {
        VisitResult::Stop => return VisitResult::Stop,
        VisitResult::SkipChildren => {}
        VisitResult::Continue => {
            for stmt in &node.body {
                try_walk!(walk_stmt(v, stmt));
            }
        }
    }
    v.leave_block(node);
    VisitResult::Continue
}

pub fn walk_param<V: Visitor + ?Sized>(v: &mut V, node: &Param) -> VisitResult {
    match v.visit_param(node) {
        VisitResult::Stop => return VisitResult::Stop,
        VisitResult::SkipChildren => {}
        VisitResult::Continue => {
            try_walk!(walk_ident(v, &node.name));
        }
    }
    v.leave_param(node);
    VisitResult::Continue
}

pub fn walk_ident<V: Visitor + ?Sized>(v: &mut V, node: &Ident) -> VisitResult {
    if v.visit_ident(node) == VisitResult::Stop {
        return VisitResult::Stop;
    }
    v.leave_ident(node);
    VisitResult::Continue
}

/// Walk an expression of any kind.
pub fn walk_expr<V: Visitor + ?Sized>(v: &mut V, node: &Expr) -> VisitResult {
    match v.visit_expr(node) {
        VisitResult::Stop => return VisitResult::Stop,
        VisitResult::SkipChildren => {}
        VisitResult::Continue => {
            let result = match node {
                Expr::Ident(i) => walk_ident(v, i),
                Expr::Int(i) => {
                    if v.visit_int_lit(i) == VisitResult::Stop {
                        VisitResult::Stop
                    } else {
                        v.leave_int_lit(i);
                        VisitResult::Continue
                    }
                }
                Expr::Str(s) => {
                    if v.visit_str_lit(s) == VisitResult::Stop {
                        VisitResult::Stop
                    } else {
                        v.leave_str_lit(s);
                        VisitResult::Continue
                    }
                }
                Expr::Unary(u) => walk_unary_expr(v, u),
                Expr::Binary(b) => walk_binary_expr(v, b),
                Expr::Call(c) => walk_call_expr(v, c),
                Expr::Paren(p) => walk_paren_expr(v, p),
            };
            try_walk!(result);
        }
    }
    v.leave_expr(node);
    VisitResult::Continue
}

pub fn walk_unary_expr<V: Visitor + ?Sized>(v: &mut V, node: &UnaryExpr) -> VisitResult {
    match v.visit_unary_expr(node) {
        VisitResult::Stop => return VisitResult::Stop,
        VisitResult::SkipChildren => {}
        VisitResult::Continue => {
            try_walk!(walk_expr(v, &node.operand));
        }
    }
    v.leave_unary_expr(node);
    VisitResult::Continue
}

pub fn walk_binary_expr<V: Visitor + ?Sized>(v: &mut V, node: &BinaryExpr) -> VisitResult {
    match v.visit_binary_expr(node) {
        VisitResult::Stop => return VisitResult::Stop,
        VisitResult::SkipChildren => {}
        VisitResult::Continue => {
            try_walk!(walk_expr(v, &node.left));
            try_walk!(walk_expr(v, &node.right));
        }
    }
    v.leave_binary_expr(node);
    VisitResult::Continue
}

pub fn walk_call_expr<V: Visitor + ?Sized>(v: &mut V, node: &CallExpr) -> VisitResult {
    match v.visit_call_expr(node) {
        VisitResult::Stop => return VisitResult::Stop,
        VisitResult::SkipChildren => {}
        VisitResult::Continue => {
            try_walk!(walk_expr(v, &node.callee));
            for arg in &node.args {
                try_walk!(walk_expr(v, arg));
            }
        }
    }
    v.leave_call_expr(node);
    VisitResult::Continue
}

pub fn walk_paren_expr<V: Visitor + ?Sized>(v: &mut V, node: &ParenExpr) -> VisitResult {
    match v.visit_paren_expr(node) {
        VisitResult::Stop => return VisitResult::Stop,
        VisitResult::SkipChildren => {}
        VisitResult::Continue => {
            try_walk!(walk_expr(v, &node.inner));
        }
    }
    v.leave_paren_expr(node);
    VisitResult::Continue
}
