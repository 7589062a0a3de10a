#![allow(dead_code)]
//! Shared helpers for `attr-match` integration tests.

use attr_match::*;
use loglens_syntax::parse_query;

pub fn record(pairs: &[(&str, AttrValue)]) -> Attributes {
    pairs.iter().cloned().collect()
}

pub fn highlight(
    query: &str,
    attrs: &Attributes,
    default_fields: &[&str],
) -> Vec<MatchedAttribute> {
    let parsed = parse_query(query);
    assert!(parsed.errors.is_empty(), "{query}: {:?}", parsed.errors);
    match_attributes(&parsed.expr, attrs, default_fields)
}

pub fn passes(query: &str, attrs: &Attributes) -> bool {
    Matcher::new(&parse_query(query).expr, ["message"]).matches(attrs)
}

pub fn entry<'m>(matched: &'m [MatchedAttribute], key: &str) -> &'m MatchedAttribute {
    matched
        .iter()
        .find(|attr| attr.key == key)
        .unwrap_or_else(|| panic!("no entry for {key}: {matched:?}"))
}

/// The substring a span points at.
pub fn spanned(attr: &MatchedAttribute) -> Option<String> {
    let text = attr.value.to_string();
    attr.matched_span
        .map(|span| text[span.start..span.start + span.len].to_string())
}
