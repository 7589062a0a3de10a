#![allow(dead_code)]
//! Shared helpers for `loglens-syntax` integration tests.

use loglens_syntax::*;

/// Parses input that must not produce any errors.
pub fn parse_ok(input: &str) -> Expr {
    let query = parse_query(input);
    assert!(
        query.errors.is_empty(),
        "unexpected errors for {input:?}: {:?}",
        query.errors
    );
    query.expr
}

pub fn error_kinds(input: &str) -> Vec<ParseErrorKind> {
    parse_query(input).errors.iter().map(|e| e.kind).collect()
}

pub fn as_and(expr: &Expr) -> &Vec<Expr> {
    match expr {
        Expr::And(parts) => parts,
        other => panic!("expected And, got: {other:?}"),
    }
}

pub fn as_or(expr: &Expr) -> &Vec<Expr> {
    match expr {
        Expr::Or(parts) => parts,
        other => panic!("expected Or, got: {other:?}"),
    }
}

pub fn as_not(expr: &Expr) -> &Expr {
    match expr {
        Expr::Not(inner) => inner,
        other => panic!("expected Not, got: {other:?}"),
    }
}

pub fn as_group(expr: &Expr) -> &Expr {
    match expr {
        Expr::Group(inner) => inner,
        other => panic!("expected Group, got: {other:?}"),
    }
}

pub fn as_term(expr: &Expr) -> &Term {
    match expr {
        Expr::Term(t) => t,
        other => panic!("expected Term, got: {other:?}"),
    }
}

pub fn word_is(expr: &Expr, expected: &str) {
    let term = as_term(expr);
    assert!(term.is_free_text(), "expected free text, got: {term:?}");
    assert!(!term.quoted, "expected bare word, got phrase: {term:?}");
    assert_eq!(term.value, expected);
}

pub fn phrase_is(expr: &Expr, expected: &str) {
    let term = as_term(expr);
    assert!(term.quoted, "expected phrase, got: {term:?}");
    assert_eq!(term.value, expected);
}

pub fn keyed_is(expr: &Expr, key: &str, op: Operator, value: &str) {
    let term = as_term(expr);
    assert_eq!(term.key.as_deref(), Some(key), "{term:?}");
    assert_eq!(term.op, op, "{term:?}");
    assert_eq!(term.value, value, "{term:?}");
}

/// Serializes and parses again; both trees must agree.
pub fn assert_round_trip(input: &str) {
    let first = parse_ok(input);
    let canonical = serialize(&first);
    let second = parse_query(&canonical);
    assert!(
        second.errors.is_empty(),
        "canonical form {canonical:?} of {input:?} has errors: {:?}",
        second.errors
    );
    assert_eq!(second.expr, first, "round trip of {input:?} via {canonical:?}");
}
