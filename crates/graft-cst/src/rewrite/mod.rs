// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! The cursor-based rewrite engine.
//!
//! [`apply`] walks every node reachable from the root exactly once, in
//! grammar reading order, calling the caller's pre callback on entry and
//! post callback on leave. Both receive a [`Cursor`] and may mutate the
//! tree through it; pre's boolean return gates descent into children
//! (post still fires when children are skipped).
//!
//! Sequence traversal drains the owned elements and rebuilds the vector,
//! committing each position's pending edits as it goes — no live index
//! into a vector being resized ever exists. Consequences of that model:
//!
//! - only original elements are visited; nodes inserted during the pass
//!   are not,
//! - `insert_before` queues commit in call order ahead of the current
//!   node; `insert_after` queues commit so each later call sits adjacent
//!   to it,
//! - after `delete`, the position logically shifts to the next surviving
//!   sibling: its pending after-inserts ride along and land after that
//!   sibling (at the sequence end if none survives), and the deleted
//!   node's children and post callback are skipped.
//!
//! A pass is single-threaded and cooperative; a reentrant pass from
//! inside a callback must target a detached subtree, which the borrow
//! checker enforces. There is no cancellation primitive — return `false`
//! from pre to skip subtrees, or discard the tree afterwards.

mod cursor;

pub use cursor::{Category, Cursor, MutationOp, Node, NodeRef, TraceEvent};
pub(crate) use cursor::{PendingEdits, Slot};

use tracing::trace;

use crate::errors::RewriteError;
use crate::nodes::NodeKind;
use crate::nodes::decorated::{Block, Expr, Ident, Module, Param, Stmt};

/// Apply a rewrite pass to a tree root of any category, in place.
///
/// If the root is replaced, `root` holds the replacement afterwards. On
/// error the tree's state is unspecified and should be discarded.
pub fn apply<Pre, Post>(root: &mut Node, mut pre: Pre, mut post: Post) -> Result<(), RewriteError>
where
    Pre: FnMut(&mut Cursor<'_>) -> bool,
    Post: FnMut(&mut Cursor<'_>) -> bool,
{
    Rewriter {
        pre: Some(&mut pre),
        post: Some(&mut post),
        tracer: None,
        poison: None,
    }
    .visit_root(root)
}

/// [`apply`] with only a pre callback.
pub fn apply_pre<Pre>(root: &mut Node, mut pre: Pre) -> Result<(), RewriteError>
where
    Pre: FnMut(&mut Cursor<'_>) -> bool,
{
    Rewriter {
        pre: Some(&mut pre),
        post: None,
        tracer: None,
        poison: None,
    }
    .visit_root(root)
}

/// [`apply`] with only a post callback.
pub fn apply_post<Post>(root: &mut Node, mut post: Post) -> Result<(), RewriteError>
where
    Post: FnMut(&mut Cursor<'_>) -> bool,
{
    Rewriter {
        pre: None,
        post: Some(&mut post),
        tracer: None,
        poison: None,
    }
    .visit_root(root)
}

/// [`apply`] with an explicit trace sink receiving every traversal and
/// mutation step. Diagnostics flow through the sink (and `tracing` at
/// trace level), not through any process-wide flag.
pub fn apply_traced<Pre, Post, Sink>(
    root: &mut Node,
    mut pre: Pre,
    mut post: Post,
    mut sink: Sink,
) -> Result<(), RewriteError>
where
    Pre: FnMut(&mut Cursor<'_>) -> bool,
    Post: FnMut(&mut Cursor<'_>) -> bool,
    Sink: FnMut(TraceEvent),
{
    Rewriter {
        pre: Some(&mut pre),
        post: Some(&mut post),
        tracer: Some(&mut sink),
        poison: None,
    }
    .visit_root(root)
}

/// Apply a rewrite pass to a module root, in place. Replacing the root
/// with anything but a module fails the pass.
pub fn apply_module<Pre, Post>(
    module: &mut Module,
    pre: Pre,
    post: Post,
) -> Result<(), RewriteError>
where
    Pre: FnMut(&mut Cursor<'_>) -> bool,
    Post: FnMut(&mut Cursor<'_>) -> bool,
{
    let placeholder = Module::with_body(Vec::new());
    let mut node = Node::Module(std::mem::replace(module, placeholder));
    let result = apply(&mut node, pre, post);
    match node {
        Node::Module(m) => {
            *module = m;
            result
        }
        other => Err(RewriteError::InvalidCursorOperation {
            op: "replace",
            detail: format!(
                "the root of a module pass must remain a Module, got {}",
                other.category()
            ),
        }),
    }
}

enum Phase {
    Pre,
    Post,
}

struct Rewriter<'f> {
    pre: Option<&'f mut dyn FnMut(&mut Cursor<'_>) -> bool>,
    post: Option<&'f mut dyn FnMut(&mut Cursor<'_>) -> bool>,
    tracer: Option<&'f mut dyn FnMut(TraceEvent)>,
    poison: Option<RewriteError>,
}

impl Rewriter<'_> {
    fn emit(&mut self, event: TraceEvent) {
        if let TraceEvent::Mutate { node, op } = event {
            trace!(?node, ?op, "rewrite mutation");
        }
        if let Some(sink) = self.tracer.as_mut() {
            sink(event);
        }
    }

    fn check(&self) -> Result<(), RewriteError> {
        match &self.poison {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    /// Run one callback with a fresh cursor over `slot`. Any invalid
    /// cursor operation recorded during the callback poisons the pass.
    #[allow(clippy::too_many_arguments)]
    fn run(
        &mut self,
        phase: Phase,
        slot: Slot<'_>,
        parent: Option<NodeKind>,
        field: Option<&'static str>,
        index: Option<usize>,
        in_seq: bool,
        edits: &mut PendingEdits,
    ) -> Result<bool, RewriteError> {
        self.check()?;
        let mut local: Option<RewriteError> = None;
        let mut cursor = Cursor::new(slot, parent, field, index, in_seq, edits, &mut local);
        let callback = match phase {
            Phase::Pre => self.pre.as_mut(),
            Phase::Post => self.post.as_mut(),
        };
        let descend = match callback {
            Some(f) => f(&mut cursor),
            None => true,
        };
        drop(cursor);
        if let Some(err) = local {
            self.poison.get_or_insert(err);
        }
        self.check()?;
        Ok(descend)
    }

    fn visit_root(mut self, root: &mut Node) -> Result<(), RewriteError> {
        let mut edits = PendingEdits::default();
        self.emit(TraceEvent::Enter {
            node: root.kind(),
            field: None,
            index: None,
        });
        let descend = self.run(
            Phase::Pre,
            Slot::Root(&mut *root),
            None,
            None,
            None,
            false,
            &mut edits,
        )?;
        if edits.replaced {
            self.emit(TraceEvent::Mutate {
                node: root.kind(),
                op: MutationOp::Replace,
            });
        }
        if descend {
            match root {
                Node::Module(n) => n.walk_children(&mut self)?,
                Node::Stmt(n) => n.walk_children(&mut self)?,
                Node::Block(n) => n.walk_children(&mut self)?,
                Node::Param(n) => n.walk_children(&mut self)?,
                Node::Ident(n) => n.walk_children(&mut self)?,
                Node::Expr(n) => n.walk_children(&mut self)?,
            }
        }
        self.run(
            Phase::Post,
            Slot::Root(&mut *root),
            None,
            None,
            None,
            false,
            &mut edits,
        )?;
        self.emit(TraceEvent::Leave { node: root.kind() });
        Ok(())
    }

    fn visit_singular<T: Rewritable>(
        &mut self,
        parent: NodeKind,
        field: &'static str,
        slot: &mut T,
    ) -> Result<(), RewriteError> {
        let mut edits = PendingEdits::default();
        self.emit(TraceEvent::Enter {
            node: slot.kind_ref(),
            field: Some(field),
            index: None,
        });
        let descend = self.run(
            Phase::Pre,
            slot.slot_mut(),
            Some(parent),
            Some(field),
            None,
            false,
            &mut edits,
        )?;
        if edits.replaced {
            self.emit(TraceEvent::Mutate {
                node: slot.kind_ref(),
                op: MutationOp::Replace,
            });
            edits.replaced = false;
        }
        if descend {
            slot.walk_children(self)?;
        }
        self.run(
            Phase::Post,
            slot.slot_mut(),
            Some(parent),
            Some(field),
            None,
            false,
            &mut edits,
        )?;
        if edits.replaced {
            self.emit(TraceEvent::Mutate {
                node: slot.kind_ref(),
                op: MutationOp::Replace,
            });
        }
        self.emit(TraceEvent::Leave {
            node: slot.kind_ref(),
        });
        Ok(())
    }

    fn visit_seq<T: Rewritable>(
        &mut self,
        parent: NodeKind,
        field: &'static str,
        seq: &mut Vec<T>,
    ) -> Result<(), RewriteError> {
        let old = std::mem::take(seq);
        let mut out: Vec<T> = Vec::with_capacity(old.len());
        let mut deferred: Vec<T> = Vec::new();
        let mut result: Result<(), RewriteError> = Ok(());
        for (index, mut elem) in old.into_iter().enumerate() {
            if result.is_err() {
                out.push(elem);
                continue;
            }
            let mut edits = PendingEdits::default();
            result = self.visit_seq_elem(parent, field, index, &mut elem, &mut edits);
            if result.is_ok() {
                result = self.commit(&mut out, &mut deferred, elem, &mut edits);
            } else {
                out.push(elem);
            }
        }
        out.append(&mut deferred);
        *seq = out;
        result
    }

    fn visit_seq_elem<T: Rewritable>(
        &mut self,
        parent: NodeKind,
        field: &'static str,
        index: usize,
        elem: &mut T,
        edits: &mut PendingEdits,
    ) -> Result<(), RewriteError> {
        self.emit(TraceEvent::Enter {
            node: elem.kind_ref(),
            field: Some(field),
            index: Some(index),
        });
        let descend = self.run(
            Phase::Pre,
            elem.slot_mut(),
            Some(parent),
            Some(field),
            Some(index),
            true,
            edits,
        )?;
        if edits.replaced {
            self.emit(TraceEvent::Mutate {
                node: elem.kind_ref(),
                op: MutationOp::Replace,
            });
            edits.replaced = false;
        }
        // A deleted node has left the tree: children and post are skipped.
        if !edits.delete {
            if descend {
                elem.walk_children(self)?;
            }
            self.run(
                Phase::Post,
                elem.slot_mut(),
                Some(parent),
                Some(field),
                Some(index),
                true,
                edits,
            )?;
            if edits.replaced {
                self.emit(TraceEvent::Mutate {
                    node: elem.kind_ref(),
                    op: MutationOp::Replace,
                });
            }
        }
        self.emit(TraceEvent::Leave {
            node: elem.kind_ref(),
        });
        Ok(())
    }

    /// Commit one position's pending edits while rebuilding the sequence.
    fn commit<T: Rewritable>(
        &mut self,
        out: &mut Vec<T>,
        deferred: &mut Vec<T>,
        elem: T,
        edits: &mut PendingEdits,
    ) -> Result<(), RewriteError> {
        for node in edits.before.drain(..) {
            self.emit(TraceEvent::Mutate {
                node: node.kind(),
                op: MutationOp::InsertBefore,
            });
            out.push(convert::<T>(node)?);
        }
        if edits.delete {
            self.emit(TraceEvent::Mutate {
                node: elem.kind_ref(),
                op: MutationOp::Delete,
            });
            // After-inserts ride past the deleted slot and land behind the
            // next surviving sibling; reversed so the most recent call
            // stays closest to the shifted position.
            let mut riding: Vec<T> = Vec::with_capacity(edits.after.len());
            for node in edits.after.drain(..) {
                self.emit(TraceEvent::Mutate {
                    node: node.kind(),
                    op: MutationOp::InsertAfter,
                });
                riding.push(convert::<T>(node)?);
            }
            riding.reverse();
            riding.append(deferred);
            *deferred = riding;
            drop(elem);
        } else {
            out.push(elem);
            let mut after: Vec<T> = Vec::with_capacity(edits.after.len());
            for node in edits.after.drain(..) {
                self.emit(TraceEvent::Mutate {
                    node: node.kind(),
                    op: MutationOp::InsertAfter,
                });
                after.push(convert::<T>(node)?);
            }
            after.reverse();
            out.append(&mut after);
            out.append(deferred);
        }
        Ok(())
    }
}

fn convert<T: Rewritable>(node: Node) -> Result<T, RewriteError> {
    T::from_node(node).map_err(|node| RewriteError::InvalidCursorOperation {
        op: "insert",
        detail: format!(
            "queued a {} node into a {} sequence",
            node.category(),
            T::CATEGORY
        ),
    })
}

/// Per-category plumbing for the traversal engine: slot construction,
/// conversion from the type-erased [`Node`], and the fixed child walk.
trait Rewritable: Sized {
    const CATEGORY: Category;
    fn kind_ref(&self) -> NodeKind;
    fn slot_mut(&mut self) -> Slot<'_>;
    fn from_node(node: Node) -> Result<Self, Node>;
    fn walk_children(&mut self, rw: &mut Rewriter<'_>) -> Result<(), RewriteError>;
}

impl Rewritable for Module {
    const CATEGORY: Category = Category::Module;

    fn kind_ref(&self) -> NodeKind {
        self.kind()
    }

    fn slot_mut(&mut self) -> Slot<'_> {
        // A module never occupies a field; it is only ever the root, where
        // Slot::Root is used instead.
        unreachable!("modules are visited only at the root")
    }

    fn from_node(node: Node) -> Result<Self, Node> {
        match node {
            Node::Module(m) => Ok(m),
            other => Err(other),
        }
    }

    fn walk_children(&mut self, rw: &mut Rewriter<'_>) -> Result<(), RewriteError> {
        rw.visit_seq(NodeKind::Module, "body", &mut self.body)
    }
}

impl Rewritable for Stmt {
    const CATEGORY: Category = Category::Stmt;

    fn kind_ref(&self) -> NodeKind {
        self.kind()
    }

    fn slot_mut(&mut self) -> Slot<'_> {
        Slot::Stmt(self)
    }

    fn from_node(node: Node) -> Result<Self, Node> {
        match node {
            Node::Stmt(s) => Ok(s),
            other => Err(other),
        }
    }

    fn walk_children(&mut self, rw: &mut Rewriter<'_>) -> Result<(), RewriteError> {
        match self {
            Stmt::Let(l) => {
                rw.visit_singular(NodeKind::LetStmt, "name", &mut l.name)?;
                rw.visit_singular(NodeKind::LetStmt, "value", &mut l.value)
            }
            Stmt::Return(r) => match &mut r.value {
                Some(value) => rw.visit_singular(NodeKind::ReturnStmt, "value", value),
                None => Ok(()),
            },
            Stmt::Expr(e) => rw.visit_singular(NodeKind::ExprStmt, "expr", &mut e.expr),
            Stmt::If(i) => {
                rw.visit_singular(NodeKind::IfStmt, "cond", &mut i.cond)?;
                rw.visit_singular(NodeKind::IfStmt, "body", &mut i.then_block)?;
                match &mut i.else_branch {
                    Some(tail) => rw.visit_singular(NodeKind::IfStmt, "else", tail.as_mut()),
                    None => Ok(()),
                }
            }
            Stmt::While(w) => {
                rw.visit_singular(NodeKind::WhileStmt, "cond", &mut w.cond)?;
                rw.visit_singular(NodeKind::WhileStmt, "body", &mut w.body)
            }
            Stmt::Fn(f) => {
                rw.visit_singular(NodeKind::FnDecl, "name", &mut f.name)?;
                rw.visit_seq(NodeKind::FnDecl, "params", &mut f.params)?;
                rw.visit_singular(NodeKind::FnDecl, "body", &mut f.body)
            }
            Stmt::Block(b) => rw.visit_seq(NodeKind::Block, "body", &mut b.body),
        }
    }
}

impl Rewritable for Block {
    const CATEGORY: Category = Category::Block;

    fn kind_ref(&self) -> NodeKind {
        self.kind()
    }

    fn slot_mut(&mut self) -> Slot<'_> {
        Slot::Block(self)
    }

    fn from_node(node: Node) -> Result<Self, Node> {
        match node {
            Node::Block(b) => Ok(b),
            other => Err(other),
        }
    }

    fn walk_children(&mut self, rw: &mut Rewriter<'_>) -> Result<(), RewriteError> {
        rw.visit_seq(NodeKind::Block, "body", &mut self.body)
    }
}

impl Rewritable for Param {
    const CATEGORY: Category = Category::Param;

    fn kind_ref(&self) -> NodeKind {
        self.kind()
    }

    fn slot_mut(&mut self) -> Slot<'_> {
        Slot::Param(self)
    }

    fn from_node(node: Node) -> Result<Self, Node> {
        match node {
            Node::Param(p) => Ok(p),
            other => Err(other),
        }
    }

    fn walk_children(&mut self, rw: &mut Rewriter<'_>) -> Result<(), RewriteError> {
        rw.visit_singular(NodeKind::Param, "name", &mut self.name)
    }
}

impl Rewritable for Ident {
    const CATEGORY: Category = Category::Ident;

    fn kind_ref(&self) -> NodeKind {
        self.kind()
    }

    fn slot_mut(&mut self) -> Slot<'_> {
        Slot::Ident(self)
    }

    fn from_node(node: Node) -> Result<Self, Node> {
        match node {
            Node::Ident(i) => Ok(i),
            other => Err(other),
        }
    }

    fn walk_children(&mut self, _rw: &mut Rewriter<'_>) -> Result<(), RewriteError> {
        Ok(())
    }
}

impl Rewritable for Expr {
    const CATEGORY: Category = Category::Expr;

    fn kind_ref(&self) -> NodeKind {
        self.kind()
    }

    fn slot_mut(&mut self) -> Slot<'_> {
        Slot::Expr(self)
    }

    fn from_node(node: Node) -> Result<Self, Node> {
        match node {
            Node::Expr(e) => Ok(e),
            other => Err(other),
        }
    }

    fn walk_children(&mut self, rw: &mut Rewriter<'_>) -> Result<(), RewriteError> {
        match self {
            Expr::Ident(_) | Expr::Int(_) | Expr::Str(_) => Ok(()),
            Expr::Unary(u) => rw.visit_singular(NodeKind::UnaryExpr, "operand", u.operand.as_mut()),
            Expr::Binary(b) => {
                rw.visit_singular(NodeKind::BinaryExpr, "left", b.left.as_mut())?;
                rw.visit_singular(NodeKind::BinaryExpr, "right", b.right.as_mut())
            }
            Expr::Call(c) => {
                rw.visit_singular(NodeKind::CallExpr, "callee", c.callee.as_mut())?;
                rw.visit_seq(NodeKind::CallExpr, "args", &mut c.args)
            }
            Expr::Paren(p) => rw.visit_singular(NodeKind::ParenExpr, "inner", p.inner.as_mut()),
        }
    }
}
