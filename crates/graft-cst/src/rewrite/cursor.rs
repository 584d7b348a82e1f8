// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! The cursor handle passed to rewrite callbacks.
//!
//! A cursor references exactly one tree position: the current node, its
//! parent's kind, the field name, and — when the field is a sequence — the
//! index within it. Mutations issued through the cursor either take effect
//! immediately (`replace`, which swaps the slot in place so traversal
//! descends into the replacement) or are queued as pending edits the
//! traversal engine commits when it leaves the position (`insert_before`,
//! `insert_after`, `delete`).
//!
//! The handle borrows the traversal engine's state for the duration of one
//! callback, so a mutation outside an active visit is unrepresentable. An
//! invalid operation returns [`RewriteError::InvalidCursorOperation`] to
//! the callback, performs nothing, and poisons the pass: the enclosing
//! `apply` fails with the same error.

use std::fmt;

use crate::errors::RewriteError;
use crate::nodes::NodeKind;
use crate::nodes::decorated::{Block, Expr, Ident, Module, Param, Stmt};

/// An owned decorated node of any category, as accepted by the mutation
/// protocol.
#[allow(clippy::large_enum_variant)]
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Module(Module),
    Stmt(Stmt),
    Block(Block),
    Param(Param),
    Ident(Ident),
    Expr(Expr),
}

impl Node {
    /// The wrapped node's kind tag.
    pub fn kind(&self) -> NodeKind {
        match self {
            Node::Module(n) => n.kind(),
            Node::Stmt(n) => n.kind(),
            Node::Block(n) => n.kind(),
            Node::Param(n) => n.kind(),
            Node::Ident(n) => n.kind(),
            Node::Expr(n) => n.kind(),
        }
    }

    /// The slot category this node can occupy.
    pub fn category(&self) -> Category {
        match self {
            Node::Module(_) => Category::Module,
            Node::Stmt(_) => Category::Stmt,
            Node::Block(_) => Category::Block,
            Node::Param(_) => Category::Param,
            Node::Ident(_) => Category::Ident,
            Node::Expr(_) => Category::Expr,
        }
    }
}

/// A borrowed view of the node under the cursor.
#[derive(Debug, Clone, Copy)]
pub enum NodeRef<'a> {
    Module(&'a Module),
    Stmt(&'a Stmt),
    Block(&'a Block),
    Param(&'a Param),
    Ident(&'a Ident),
    Expr(&'a Expr),
}

impl NodeRef<'_> {
    /// The viewed node's kind tag.
    pub fn kind(&self) -> NodeKind {
        match self {
            NodeRef::Module(n) => n.kind(),
            NodeRef::Stmt(n) => n.kind(),
            NodeRef::Block(n) => n.kind(),
            NodeRef::Param(n) => n.kind(),
            NodeRef::Ident(n) => n.kind(),
            NodeRef::Expr(n) => n.kind(),
        }
    }
}

/// Slot categories a field position can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Module,
    Stmt,
    Block,
    Param,
    Ident,
    Expr,
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

/// The mutable slot the cursor writes through. `Root` holds the whole
/// tree root and accepts replacements of any category.
pub(crate) enum Slot<'a> {
    Root(&'a mut Node),
    Stmt(&'a mut Stmt),
    Block(&'a mut Block),
    Param(&'a mut Param),
    Ident(&'a mut Ident),
    Expr(&'a mut Expr),
}

impl Slot<'_> {
    fn category(&self) -> Option<Category> {
        match self {
            Slot::Root(_) => None,
            Slot::Stmt(_) => Some(Category::Stmt),
            Slot::Block(_) => Some(Category::Block),
            Slot::Param(_) => Some(Category::Param),
            Slot::Ident(_) => Some(Category::Ident),
            Slot::Expr(_) => Some(Category::Expr),
        }
    }
}

/// Mutations queued during one visit, committed when the traversal engine
/// leaves the position.
#[derive(Default)]
pub(crate) struct PendingEdits {
    pub(crate) before: Vec<Node>,
    pub(crate) after: Vec<Node>,
    pub(crate) delete: bool,
    pub(crate) replaced: bool,
}

/// One step of a traced rewrite pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraceEvent {
    /// Entering a node, before its pre callback runs.
    Enter {
        node: NodeKind,
        field: Option<&'static str>,
        index: Option<usize>,
    },
    /// Leaving a node, after its post callback ran. Reports the
    /// replacement's kind if the node was replaced.
    Leave { node: NodeKind },
    /// A mutation was applied or committed at the current position.
    Mutate { node: NodeKind, op: MutationOp },
}

/// The mutation protocol's operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationOp {
    Replace,
    InsertBefore,
    InsertAfter,
    Delete,
}

/// Traversal handle over the node currently under visitation.
pub struct Cursor<'c> {
    slot: Slot<'c>,
    parent: Option<NodeKind>,
    field: Option<&'static str>,
    index: Option<usize>,
    in_seq: bool,
    edits: &'c mut PendingEdits,
    poison: &'c mut Option<RewriteError>,
}

impl<'c> Cursor<'c> {
    pub(crate) fn new(
        slot: Slot<'c>,
        parent: Option<NodeKind>,
        field: Option<&'static str>,
        index: Option<usize>,
        in_seq: bool,
        edits: &'c mut PendingEdits,
        poison: &'c mut Option<RewriteError>,
    ) -> Self {
        Cursor {
            slot,
            parent,
            field,
            index,
            in_seq,
            edits,
            poison,
        }
    }

    /// The node under the cursor.
    pub fn node(&self) -> NodeRef<'_> {
        match &self.slot {
            Slot::Root(node) => match &**node {
                Node::Module(n) => NodeRef::Module(n),
                Node::Stmt(n) => NodeRef::Stmt(n),
                Node::Block(n) => NodeRef::Block(n),
                Node::Param(n) => NodeRef::Param(n),
                Node::Ident(n) => NodeRef::Ident(n),
                Node::Expr(n) => NodeRef::Expr(n),
            },
            Slot::Stmt(n) => NodeRef::Stmt(n),
            Slot::Block(n) => NodeRef::Block(n),
            Slot::Param(n) => NodeRef::Param(n),
            Slot::Ident(n) => NodeRef::Ident(n),
            Slot::Expr(n) => NodeRef::Expr(n),
        }
    }

    /// Kind of the parent node, or `None` at the root.
    pub fn parent(&self) -> Option<NodeKind> {
        self.parent
    }

    /// Name of the field the current node occupies, or `None` at the root.
    pub fn field(&self) -> Option<&'static str> {
        self.field
    }

    /// Index within the sequence field, or `None` in a singular field.
    pub fn index(&self) -> Option<usize> {
        self.index
    }

    /// True when the current node occupies a sequence field, i.e. the
    /// insert/delete operations are available.
    pub fn in_sequence(&self) -> bool {
        self.in_seq
    }

    /// Substitute the current node. Takes effect immediately: traversal
    /// proceeds into the replacement's children, and the post callback
    /// reports the replacement.
    pub fn replace(&mut self, node: Node) -> Result<(), RewriteError> {
        let compatible = match self.slot.category() {
            None => true,
            Some(expected) => node.category() == expected,
        };
        if !compatible {
            let expected = self.slot.category().expect("root accepts any category");
            let got = node.category();
            let detail = format!("expected a {expected} node for {}, got {got}", self.location());
            return self.fail("replace", detail);
        }
        match (&mut self.slot, node) {
            (Slot::Root(slot), node) => **slot = node,
            (Slot::Stmt(slot), Node::Stmt(n)) => **slot = n,
            (Slot::Block(slot), Node::Block(n)) => **slot = n,
            (Slot::Param(slot), Node::Param(n)) => **slot = n,
            (Slot::Ident(slot), Node::Ident(n)) => **slot = n,
            (Slot::Expr(slot), Node::Expr(n)) => **slot = n,
            _ => unreachable!("slot compatibility checked above"),
        }
        self.edits.replaced = true;
        Ok(())
    }

    /// Queue a sibling immediately before the current position. Sequence
    /// fields only.
    pub fn insert_before(&mut self, node: Node) -> Result<(), RewriteError> {
        self.queue_insert("insert_before", node, true)
    }

    /// Queue a sibling immediately after the current position. Sequence
    /// fields only. Each later call lands adjacent to the current node,
    /// pushing earlier insertions further away.
    pub fn insert_after(&mut self, node: Node) -> Result<(), RewriteError> {
        self.queue_insert("insert_after", node, false)
    }

    /// Remove the current node from its parent's sequence. The cursor's
    /// logical position shifts to the slot formerly occupied by the next
    /// sibling, so a subsequent insert applies relative to that sibling.
    pub fn delete(&mut self) -> Result<(), RewriteError> {
        if !self.in_seq {
            let location = self.location();
            return self.fail("delete", format!("{location} is not a sequence field"));
        }
        self.edits.delete = true;
        Ok(())
    }

    fn queue_insert(
        &mut self,
        op: &'static str,
        node: Node,
        before: bool,
    ) -> Result<(), RewriteError> {
        if !self.in_seq {
            let location = self.location();
            return self.fail(op, format!("{location} is not a sequence field"));
        }
        let expected = self.slot.category().expect("sequence slots have a category");
        if node.category() != expected {
            let got = node.category();
            let detail = format!("expected a {expected} node for {}, got {got}", self.location());
            return self.fail(op, detail);
        }
        if before {
            self.edits.before.push(node);
        } else {
            self.edits.after.push(node);
        }
        Ok(())
    }

    fn location(&self) -> String {
        match (self.parent, self.field) {
            (Some(parent), Some(field)) => format!("field `{field}` of {parent}"),
            _ => "the root position".to_string(),
        }
    }

    fn fail(&mut self, op: &'static str, detail: String) -> Result<(), RewriteError> {
        let err = RewriteError::InvalidCursorOperation { op, detail };
        self.poison.get_or_insert(err.clone());
        Err(err)
    }
}
