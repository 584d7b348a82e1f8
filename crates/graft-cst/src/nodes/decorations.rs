// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! The decoration store embedded in every decorated node.
//!
//! A decorated node owns all the non-semantic material adjacent to it:
//! spacing directives for the printer and ordered lists of text fragments.
//! A fragment is either a line comment (text starting with `//`) or the
//! literal `"\n"`, which marks a blank line separating two comments in the
//! same list.

/// Vertical spacing the printer should use adjacent to a node.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Space {
    /// No opinion; the printer uses its canonical default for the position.
    #[default]
    None,
    /// The node continues the previous line.
    SameLine,
    /// The node starts a fresh line.
    NewLine,
    /// One empty line, then a fresh line.
    EmptyLine,
}

/// The blank-line marker fragment.
pub const BLANK_FRAGMENT: &str = "\n";

/// True for fragments the restorer accepts: the blank-line marker, or a
/// single-line `//` comment.
pub fn fragment_is_valid(fragment: &str) -> bool {
    fragment == BLANK_FRAGMENT || (fragment.starts_with("//") && !fragment.contains('\n'))
}

/// Per-node attachable metadata: spacing directives, leading/trailing
/// fragment lists, and named per-field slots for material that sits between
/// a node's syntactic sub-positions (e.g. between an `if` statement's
/// then-block and its `else` keyword).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Decorations {
    /// Spacing before the node (and any `start` fragments).
    pub before: Space,
    /// Spacing after the node (and any `end` fragments).
    pub after: Space,
    /// Fragments emitted immediately before the node's own content.
    pub start: Vec<String>,
    /// Fragments emitted immediately after the node's own content.
    pub end: Vec<String>,
    /// Fragment lists keyed by field name. Kept as a small ordered vec;
    /// nodes have at most a handful of fields.
    fields: Vec<(&'static str, Vec<String>)>,
}

impl Decorations {
    /// A store with no directives and no fragments.
    pub fn new() -> Self {
        Self::default()
    }

    /// True if nothing is attached and both directives are `Space::None`.
    pub fn is_empty(&self) -> bool {
        self.before == Space::None
            && self.after == Space::None
            && self.start.is_empty()
            && self.end.is_empty()
            && self.fields.iter().all(|(_, frags)| frags.is_empty())
    }

    /// Fragments attached to the named field slot. Empty for unknown names.
    pub fn field(&self, name: &str) -> &[String] {
        self.fields
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, frags)| frags.as_slice())
            .unwrap_or(&[])
    }

    /// Mutable access to the named field slot, creating it on first use.
    pub fn field_mut(&mut self, name: &'static str) -> &mut Vec<String> {
        if let Some(pos) = self.fields.iter().position(|(n, _)| *n == name) {
            &mut self.fields[pos].1
        } else {
            self.fields.push((name, Vec::new()));
            &mut self.fields.last_mut().expect("just pushed").1
        }
    }

    /// Iterate over the populated field slots in insertion order.
    pub fn fields(&self) -> impl Iterator<Item = (&'static str, &[String])> {
        self.fields
            .iter()
            .map(|(name, frags)| (*name, frags.as_slice()))
    }
}
