// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Behavior tests for the cursor rewrite engine: mutation ordering,
//! delete/insert interaction, skip-children, fail-fast misuse, and the
//! locality of edits with respect to untouched decorations.

use std::cell::RefCell;

use graft_cst::nodes::decorated::{Expr, Module, Stmt};
use graft_cst::rewrite::{
    MutationOp, Node, NodeRef, TraceEvent, apply, apply_module, apply_post, apply_traced,
};
use graft_cst::{RewriteError, decorate, parse_module, print_module, restore};

fn tree_of(source: &str) -> Module {
    decorate(&parse_module(source).expect("parse error")).expect("decorate error")
}

fn render(tree: &Module) -> String {
    print_module(&restore(tree).expect("restore error"))
}

fn let_stmt(name: &str, value: i64) -> Node {
    Node::Stmt(Stmt::let_(name, Expr::int(value)))
}

/// Name of the `let` statement under the cursor, if it is one.
fn let_name(node: NodeRef<'_>) -> Option<String> {
    match node {
        NodeRef::Stmt(Stmt::Let(l)) => Some(l.name.name.clone()),
        _ => None,
    }
}

// =============================================================================
// Replace
// =============================================================================

#[test]
fn replace_is_local_to_the_node_span() {
    let source = "// keep\nlet a = 1; // trailing\n\nlet target = old_value;\nlet b = 2;\n";
    let mut tree = tree_of(source);
    apply_module(
        &mut tree,
        |c| {
            if let NodeRef::Expr(Expr::Ident(i)) = c.node() {
                if i.name == "old_value" {
                    c.replace(Node::Expr(Expr::int(42))).expect("replace");
                }
            }
            true
        },
        |_| true,
    )
    .expect("apply");
    assert_eq!(
        render(&tree),
        "// keep\nlet a = 1; // trailing\n\nlet target = 42;\nlet b = 2;\n"
    );
}

#[test]
fn replace_descends_into_replacement_and_post_reports_it() {
    use graft_cst::BinOp;
    let mut tree = tree_of("let a = old;\n");
    let visited = RefCell::new(Vec::new());
    let post_saw_binary = RefCell::new(false);
    apply_module(
        &mut tree,
        |c| {
            match c.node() {
                NodeRef::Expr(Expr::Ident(i)) if i.name == "old" => {
                    let sum = Expr::binary(Expr::ident("p"), BinOp::Add, Expr::ident("q"));
                    c.replace(Node::Expr(sum)).expect("replace");
                }
                NodeRef::Expr(Expr::Ident(i)) => {
                    visited.borrow_mut().push(i.name.clone());
                }
                _ => {}
            }
            true
        },
        |c| {
            if c.field() == Some("value") && matches!(c.node(), NodeRef::Expr(Expr::Binary(_))) {
                *post_saw_binary.borrow_mut() = true;
            }
            true
        },
    )
    .expect("apply");
    assert_eq!(*visited.borrow(), ["p".to_string(), "q".to_string()]);
    assert!(*post_saw_binary.borrow());
    assert_eq!(render(&tree), "let a = p + q;\n");
}

#[test]
fn root_replacement_yields_the_replacement() {
    let mut node = Node::Expr(Expr::int(1));
    apply(
        &mut node,
        |c| {
            if c.parent().is_none() {
                c.replace(Node::Stmt(Stmt::return_(None))).expect("replace");
            }
            true
        },
        |_| true,
    )
    .expect("apply");
    assert!(matches!(node, Node::Stmt(Stmt::Return(_))));
}

#[test]
fn module_pass_rejects_non_module_root_replacement() {
    let mut tree = tree_of("let x = 1;\n");
    let result = apply_module(
        &mut tree,
        |c| {
            if c.parent().is_none() {
                c.replace(Node::Expr(Expr::int(7))).expect("replace");
            }
            true
        },
        |_| true,
    );
    assert!(matches!(
        result,
        Err(RewriteError::InvalidCursorOperation { .. })
    ));
}

// =============================================================================
// Insert ordering
// =============================================================================

#[test]
fn insert_ordering_around_one_position() {
    let mut tree = tree_of("let x = 1;\nlet y = 2;\nlet z = 3;\n");
    let seen = RefCell::new(Vec::new());
    apply_module(
        &mut tree,
        |c| {
            if let Some(name) = let_name(c.node()) {
                seen.borrow_mut().push(name.clone());
                if name == "x" {
                    c.insert_before(let_stmt("b1", 0)).expect("insert");
                    c.insert_before(let_stmt("b2", 0)).expect("insert");
                    c.insert_after(let_stmt("a1", 0)).expect("insert");
                    c.insert_after(let_stmt("a2", 0)).expect("insert");
                }
            }
            true
        },
        |_| true,
    )
    .expect("apply");
    assert_eq!(
        render(&tree),
        "let b1 = 0;\nlet b2 = 0;\nlet x = 1;\nlet a2 = 0;\nlet a1 = 0;\nlet y = 2;\nlet z = 3;\n"
    );
    // Nodes inserted during the pass are not visited by it.
    assert_eq!(*seen.borrow(), ["x", "y", "z"]);
}

#[test]
fn insert_into_nested_sequence() {
    let mut tree = tree_of("fn f() {\n    a();\n    b();\n}\n");
    apply_module(
        &mut tree,
        |c| {
            if let NodeRef::Stmt(Stmt::Expr(e)) = c.node() {
                if let Expr::Call(call) = &e.expr {
                    if let Expr::Ident(i) = &*call.callee {
                        if i.name == "b" {
                            c.insert_before(Node::Stmt(Stmt::expr(Expr::call(
                                Expr::ident("between"),
                                vec![],
                            ))))
                            .expect("insert");
                        }
                    }
                }
            }
            true
        },
        |_| true,
    )
    .expect("apply");
    assert_eq!(
        render(&tree),
        "fn f() {\n    a();\n    between();\n    b();\n}\n"
    );
}

// =============================================================================
// Delete
// =============================================================================

#[test]
fn delete_then_insert_after_lands_past_next_sibling() {
    let mut tree = tree_of("let x = 1;\nlet y = 2;\nlet z = 3;\n");
    apply_module(
        &mut tree,
        |c| {
            if let_name(c.node()).as_deref() == Some("x") {
                c.delete().expect("delete");
                c.insert_after(let_stmt("x1", 0)).expect("insert");
            }
            true
        },
        |_| true,
    )
    .expect("apply");
    assert_eq!(render(&tree), "let y = 2;\nlet x1 = 0;\nlet z = 3;\n");
}

#[test]
fn delete_then_insert_before_lands_at_the_vacated_slot() {
    let mut tree = tree_of("let x = 1;\nlet y = 2;\nlet z = 3;\n");
    apply_module(
        &mut tree,
        |c| {
            if let_name(c.node()).as_deref() == Some("x") {
                c.delete().expect("delete");
                c.insert_before(let_stmt("n", 0)).expect("insert");
            }
            true
        },
        |_| true,
    )
    .expect("apply");
    assert_eq!(render(&tree), "let n = 0;\nlet y = 2;\nlet z = 3;\n");
}

#[test]
fn delete_last_element_appends_inserts_at_end() {
    let mut tree = tree_of("let x = 1;\nlet z = 3;\n");
    apply_module(
        &mut tree,
        |c| {
            if let_name(c.node()).as_deref() == Some("z") {
                c.delete().expect("delete");
                c.insert_after(let_stmt("tail", 0)).expect("insert");
            }
            true
        },
        |_| true,
    )
    .expect("apply");
    assert_eq!(render(&tree), "let x = 1;\nlet tail = 0;\n");
}

#[test]
fn deleted_node_takes_its_decorations_with_it() {
    let mut tree = tree_of("// keep a\nlet a = 1;\n// keep b\nlet b = 2;\n");
    apply_module(
        &mut tree,
        |c| {
            if let_name(c.node()).as_deref() == Some("a") {
                c.delete().expect("delete");
            }
            true
        },
        |_| true,
    )
    .expect("apply");
    assert_eq!(render(&tree), "// keep b\nlet b = 2;\n");
}

#[test]
fn deleted_node_children_and_post_are_skipped() {
    let mut tree = tree_of("fn gone(p) {\n    return p;\n}\nlet q = 1;\n");
    let ident_visits = RefCell::new(0usize);
    let posts = RefCell::new(Vec::new());
    apply_module(
        &mut tree,
        |c| {
            if matches!(c.node(), NodeRef::Stmt(Stmt::Fn(_))) {
                c.delete().expect("delete");
            }
            if matches!(c.node(), NodeRef::Ident(_)) {
                *ident_visits.borrow_mut() += 1;
            }
            true
        },
        |c| {
            if let NodeRef::Stmt(s) = c.node() {
                posts.borrow_mut().push(s.kind());
            }
            true
        },
    )
    .expect("apply");
    // Only `q`'s name ident is visited; the deleted fn subtree is not.
    assert_eq!(*ident_visits.borrow(), 1);
    // Post fired for the surviving statement only.
    assert_eq!(posts.borrow().len(), 1);
    assert_eq!(render(&tree), "let q = 1;\n");
}

#[test]
fn delete_in_post_removes_the_node() {
    let mut tree = tree_of("let x = 1;\nlet y = 2;\n");
    apply_module(
        &mut tree,
        |_| true,
        |c| {
            if let_name(c.node()).as_deref() == Some("y") {
                c.delete().expect("delete");
            }
            true
        },
    )
    .expect("apply");
    assert_eq!(render(&tree), "let x = 1;\n");
}

// =============================================================================
// Skip-children contract
// =============================================================================

#[test]
fn skip_children_suppresses_descendant_visits_but_not_post() {
    let mut tree = tree_of("fn f(p) {\n    return p;\n}\nlet q = 1;\n");
    let ident_visits = RefCell::new(0usize);
    let fn_posts = RefCell::new(0usize);
    apply_module(
        &mut tree,
        |c| {
            if matches!(c.node(), NodeRef::Stmt(Stmt::Fn(_))) {
                return false;
            }
            if matches!(c.node(), NodeRef::Ident(_)) {
                *ident_visits.borrow_mut() += 1;
            }
            true
        },
        |c| {
            if matches!(c.node(), NodeRef::Stmt(Stmt::Fn(_))) {
                *fn_posts.borrow_mut() += 1;
            }
            true
        },
    )
    .expect("apply");
    assert_eq!(*ident_visits.borrow(), 1);
    assert_eq!(*fn_posts.borrow(), 1);
}

// =============================================================================
// Fail-fast misuse
// =============================================================================

#[test]
fn delete_on_singular_field_fails_fast_and_leaves_tree_unchanged() {
    let source = "let x = 1;\n";
    let mut tree = tree_of(source);
    let result = apply_module(
        &mut tree,
        |c| {
            if matches!(c.node(), NodeRef::Ident(_)) {
                let err = c.delete();
                assert!(matches!(
                    err,
                    Err(RewriteError::InvalidCursorOperation { .. })
                ));
            }
            true
        },
        |_| true,
    );
    assert!(matches!(
        result,
        Err(RewriteError::InvalidCursorOperation { .. })
    ));
    assert_eq!(render(&tree), source);
}

#[test]
fn insert_on_singular_field_fails_fast() {
    let mut tree = tree_of("let x = 1;\n");
    let result = apply_module(
        &mut tree,
        |c| {
            if c.field() == Some("value") {
                let err = c.insert_before(Node::Expr(Expr::int(0)));
                assert!(err.is_err());
            }
            true
        },
        |_| true,
    );
    assert!(result.is_err());
}

#[test]
fn category_mismatch_insert_fails_fast() {
    let mut tree = tree_of("let x = 1;\nlet y = 2;\n");
    let result = apply_module(
        &mut tree,
        |c| {
            if let_name(c.node()).as_deref() == Some("x") {
                let err = c.insert_after(Node::Expr(Expr::int(1)));
                assert!(matches!(
                    err,
                    Err(RewriteError::InvalidCursorOperation { .. })
                ));
            }
            true
        },
        |_| true,
    );
    assert!(result.is_err());
}

#[test]
fn category_mismatch_replace_fails_fast() {
    let mut tree = tree_of("let x = 1;\n");
    let result = apply_module(
        &mut tree,
        |c| {
            if matches!(c.node(), NodeRef::Ident(_)) {
                let err = c.replace(Node::Expr(Expr::int(2)));
                assert!(err.is_err());
            }
            true
        },
        |_| true,
    );
    assert!(result.is_err());
}

// =============================================================================
// Cursor introspection and tracing
// =============================================================================

#[test]
fn cursor_reports_parent_field_and_index() {
    let mut tree = tree_of("f(10, 20);\n");
    let arg_positions = RefCell::new(Vec::new());
    apply_module(
        &mut tree,
        |c| {
            if let NodeRef::Expr(Expr::Int(i)) = c.node() {
                arg_positions.borrow_mut().push(format!(
                    "{} in {:?}.{:?}[{:?}] seq={}",
                    i.value,
                    c.parent(),
                    c.field(),
                    c.index(),
                    c.in_sequence(),
                ));
            }
            true
        },
        |_| true,
    )
    .expect("apply");
    assert_eq!(
        *arg_positions.borrow(),
        [
            "10 in Some(CallExpr).Some(\"args\")[Some(0)] seq=true",
            "20 in Some(CallExpr).Some(\"args\")[Some(1)] seq=true",
        ]
    );
}

#[test]
fn traced_pass_reports_mutations_to_the_sink() {
    let mut node = Node::Module(tree_of("let x = 1;\nlet y = 2;\n"));
    let mut events = Vec::new();
    apply_traced(
        &mut node,
        |c| {
            if let_name(c.node()).as_deref() == Some("y") {
                c.delete().expect("delete");
            }
            true
        },
        |_| true,
        |event| events.push(event),
    )
    .expect("apply");
    assert!(events
        .iter()
        .any(|e| matches!(e, TraceEvent::Enter { node, .. } if *node == graft_cst::NodeKind::Module)));
    assert!(events
        .iter()
        .any(|e| matches!(e, TraceEvent::Mutate { op: MutationOp::Delete, .. })));
}

#[test]
fn post_only_pass_visits_every_node_once() {
    let mut node = Node::Module(tree_of("let x = 1;\n"));
    let mut posts = 0usize;
    apply_post(&mut node, |_| {
        posts += 1;
        true
    })
    .expect("apply");
    // Module, let statement, name ident, value expression.
    assert_eq!(posts, 4);
}
