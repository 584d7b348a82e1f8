// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! The host-grammar parser, producing positioned plain nodes.
//!
//! The parse boundary of the pipeline: a `peg` grammar over the raw source
//! with `position!()` span capture. Comments are consumed as whitespace —
//! `//` always begins a comment, so division must be written with spacing —
//! and recovered separately by the trivia scan in [`crate::scanner`].

use graft_core::Span;

use crate::errors::ParseError;
use crate::nodes::plain::{
    BinaryExpr, Block, CallExpr, Expr, ExprStmt, FnDecl, Ident, IfStmt, IntLit, LetStmt, Module,
    Param, ParenExpr, ReturnStmt, Stmt, StrLit, UnaryExpr, WhileStmt,
};
use crate::nodes::{BinOp, UnOp};

pub(crate) const KEYWORDS: &[&str] = &["let", "return", "if", "else", "while", "fn"];

fn binary(left: Expr, op: BinOp, right: Expr) -> Expr {
    let span = left.span().join(right.span());
    Expr::Binary(BinaryExpr {
        left: Box::new(left),
        op,
        right: Box::new(right),
        span,
    })
}

fn unary(start: usize, op: UnOp, operand: Expr) -> Expr {
    let span = Span::new(start, operand.span().end);
    Expr::Unary(UnaryExpr {
        op,
        operand: Box::new(operand),
        span,
    })
}

peg::parser! {
    grammar script() for str {
        rule ws() = quiet!{ ([' ' | '\t' | '\r' | '\n'] / "//" (!['\n'] [_])*)* }

        rule word_break() = !['a'..='z' | 'A'..='Z' | '0'..='9' | '_']

        rule kw_let() = "let" word_break()
        rule kw_return() = "return" word_break()
        rule kw_if() = "if" word_break()
        rule kw_else() = "else" word_break()
        rule kw_while() = "while" word_break()
        rule kw_fn() = "fn" word_break()

        rule ident_text() -> &'input str
            = $(['a'..='z' | 'A'..='Z' | '_'] ['a'..='z' | 'A'..='Z' | '0'..='9' | '_']*)

        rule ident() -> Ident
            = quiet!{ s:position!() name:ident_text() e:position!() {?
                if KEYWORDS.contains(&name) {
                    Err("identifier")
                } else {
                    Ok(Ident { name: name.to_string(), span: Span::new(s, e) })
                }
            } }
            / expected!("identifier")

        rule int_lit() -> IntLit
            = quiet!{ s:position!() digits:$(['0'..='9']+) e:position!() {?
                digits
                    .parse::<i64>()
                    .map(|value| IntLit { value, span: Span::new(s, e) })
                    .map_err(|_| "integer")
            } }
            / expected!("integer")

        rule escape() -> char
            = "\\n" { '\n' }
            / "\\t" { '\t' }
            / "\\\"" { '"' }
            / "\\\\" { '\\' }

        rule str_char() -> char
            = escape()
            / c:[^ '"' | '\\' | '\n'] { c }

        rule str_lit() -> StrLit
            = quiet!{ s:position!() "\"" chars:str_char()* "\"" e:position!() {
                StrLit { value: chars.into_iter().collect(), span: Span::new(s, e) }
            } }
            / expected!("string literal")

        rule expr() -> Expr = precedence! {
            l:(@) ws() "||" ws() r:@ { binary(l, BinOp::Or, r) }
            --
            l:(@) ws() "&&" ws() r:@ { binary(l, BinOp::And, r) }
            --
            l:(@) ws() "==" ws() r:@ { binary(l, BinOp::Eq, r) }
            l:(@) ws() "!=" ws() r:@ { binary(l, BinOp::Ne, r) }
            l:(@) ws() "<=" ws() r:@ { binary(l, BinOp::Le, r) }
            l:(@) ws() ">=" ws() r:@ { binary(l, BinOp::Ge, r) }
            l:(@) ws() "<" ws() r:@ { binary(l, BinOp::Lt, r) }
            l:(@) ws() ">" ws() r:@ { binary(l, BinOp::Gt, r) }
            --
            l:(@) ws() "+" ws() r:@ { binary(l, BinOp::Add, r) }
            l:(@) ws() "-" ws() r:@ { binary(l, BinOp::Sub, r) }
            --
            l:(@) ws() "*" ws() r:@ { binary(l, BinOp::Mul, r) }
            l:(@) ws() "/" ws() r:@ { binary(l, BinOp::Div, r) }
            l:(@) ws() "%" ws() r:@ { binary(l, BinOp::Rem, r) }
            --
            s:position!() "!" ws() operand:@ { unary(s, UnOp::Not, operand) }
            s:position!() "-" ws() operand:@ { unary(s, UnOp::Neg, operand) }
            --
            callee:(@) ws() "(" ws() args:(expr() ** (ws() "," ws())) ws() ")" e:position!() {
                let span = Span::new(callee.span().start, e);
                Expr::Call(CallExpr { callee: Box::new(callee), args, span })
            }
            --
            s:position!() "(" ws() inner:expr() ws() ")" e:position!() {
                Expr::Paren(ParenExpr { inner: Box::new(inner), span: Span::new(s, e) })
            }
            i:int_lit() { Expr::Int(i) }
            st:str_lit() { Expr::Str(st) }
            id:ident() { Expr::Ident(id) }
        }

        rule let_stmt() -> LetStmt
            = s:position!() kw_let() ws() name:ident() ws() "=" ws() value:expr() ws() ";" e:position!()
              { LetStmt { name, value, span: Span::new(s, e) } }

        rule return_stmt() -> ReturnStmt
            = s:position!() kw_return() value:(ws() v:expr() { v })? ws() ";" e:position!()
              { ReturnStmt { value, span: Span::new(s, e) } }

        rule expr_stmt() -> ExprStmt
            = e:expr() ws() ";" p:position!()
              { ExprStmt { span: Span::new(e.span().start, p), expr: e } }

        rule block() -> Block
            = s:position!() "{" body:(ws() st:stmt() { st })* ws() "}" e:position!()
              { Block { body, span: Span::new(s, e) } }

        rule if_stmt() -> IfStmt
            = s:position!() kw_if() ws() cond:expr() ws() then_block:block()
              else_branch:(ws() kw_else() ws() t:else_tail() { Box::new(t) })?
              {
                  let end = else_branch
                      .as_ref()
                      .map(|t| t.span().end)
                      .unwrap_or(then_block.span.end);
                  IfStmt { cond, then_block, else_branch, span: Span::new(s, end) }
              }

        rule else_tail() -> Stmt
            = b:block() { Stmt::Block(b) }
            / i:if_stmt() { Stmt::If(i) }

        rule while_stmt() -> WhileStmt
            = s:position!() kw_while() ws() cond:expr() ws() body:block()
              { WhileStmt { span: Span::new(s, body.span.end), cond, body } }

        rule param() -> Param
            = name:ident() { Param { span: name.span, name } }

        rule fn_decl() -> FnDecl
            = s:position!() kw_fn() ws() name:ident() ws()
              "(" ws() params:(param() ** (ws() "," ws())) ws() ")" ws() body:block()
              { FnDecl { span: Span::new(s, body.span.end), name, params, body } }

        rule stmt() -> Stmt
            = l:let_stmt() { Stmt::Let(l) }
            / r:return_stmt() { Stmt::Return(r) }
            / i:if_stmt() { Stmt::If(i) }
            / w:while_stmt() { Stmt::While(w) }
            / f:fn_decl() { Stmt::Fn(f) }
            / b:block() { Stmt::Block(b) }
            / e:expr_stmt() { Stmt::Expr(e) }

        pub rule module() -> Module
            = body:(ws() st:stmt() { st })* ws() e:position!() ![_]
              { Module { body, span: Span::new(0, e) } }
    }
}

/// Parse `source` into a positioned plain tree.
pub(crate) fn parse(source: &str) -> Result<Module, ParseError> {
    script::module(source).map_err(ParseError::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_let() {
        let module = parse("let x = 1;\n").unwrap();
        assert_eq!(module.body.len(), 1);
        let Stmt::Let(l) = &module.body[0] else {
            panic!("expected let");
        };
        assert_eq!(l.name.name, "x");
        assert_eq!(l.span, Span::new(0, 10));
        assert_eq!(l.name.span, Span::new(4, 5));
        assert_eq!(module.span, Span::new(0, 11));
    }

    #[test]
    fn test_parse_precedence() {
        let module = parse("let v = a + b * c;\n").unwrap();
        let Stmt::Let(l) = &module.body[0] else {
            panic!("expected let");
        };
        let Expr::Binary(add) = &l.value else {
            panic!("expected binary");
        };
        assert_eq!(add.op, BinOp::Add);
        assert!(matches!(*add.right, Expr::Binary(ref m) if m.op == BinOp::Mul));
    }

    #[test]
    fn test_parse_parens_are_explicit_nodes() {
        let module = parse("let v = (a + b) * c;\n").unwrap();
        let Stmt::Let(l) = &module.body[0] else {
            panic!("expected let");
        };
        let Expr::Binary(mul) = &l.value else {
            panic!("expected binary");
        };
        assert!(matches!(*mul.left, Expr::Paren(_)));
    }

    #[test]
    fn test_parse_call_and_args() {
        let module = parse("f(1, g(2), \"s\");\n").unwrap();
        let Stmt::Expr(e) = &module.body[0] else {
            panic!("expected expr stmt");
        };
        let Expr::Call(c) = &e.expr else {
            panic!("expected call");
        };
        assert_eq!(c.args.len(), 3);
    }

    #[test]
    fn test_parse_else_if_chain() {
        let module = parse("if a { return 1; } else if b { return 2; } else { return 3; }\n").unwrap();
        let Stmt::If(i) = &module.body[0] else {
            panic!("expected if");
        };
        let Some(tail) = &i.else_branch else {
            panic!("expected else");
        };
        assert!(matches!(**tail, Stmt::If(_)));
    }

    #[test]
    fn test_parse_fn_and_params() {
        let module = parse("fn add(a, b) {\n    return a + b;\n}\n").unwrap();
        let Stmt::Fn(f) = &module.body[0] else {
            panic!("expected fn");
        };
        assert_eq!(f.params.len(), 2);
        assert_eq!(f.body.body.len(), 1);
    }

    #[test]
    fn test_comments_skipped_as_whitespace() {
        let module = parse("// leading\nlet x = 1; // trailing\n").unwrap();
        assert_eq!(module.body.len(), 1);
    }

    #[test]
    fn test_keyword_not_an_ident() {
        assert!(parse("let let = 1;\n").is_err());
        // A keyword prefix is still a valid identifier.
        assert!(parse("let letter = 1;\n").is_ok());
    }

    #[test]
    fn test_parse_error_has_offset() {
        let err = parse("let x 1;\n").unwrap_err();
        assert!(err.offset() > 0);
    }

    #[test]
    fn test_string_escapes() {
        let module = parse("let s = \"a\\n\\\"b\\\\\";\n").unwrap();
        let Stmt::Let(l) = &module.body[0] else {
            panic!("expected let");
        };
        let Expr::Str(s) = &l.value else {
            panic!("expected string");
        };
        assert_eq!(s.value, "a\n\"b\\");
    }

    #[test]
    fn test_standalone_block_statement() {
        let module = parse("{\n    let x = 1;\n}\n").unwrap();
        assert!(matches!(module.body[0], Stmt::Block(_)));
    }

    #[test]
    fn test_empty_source() {
        let module = parse("").unwrap();
        assert!(module.body.is_empty());
        assert_eq!(module.span, Span::new(0, 0));
    }
}
