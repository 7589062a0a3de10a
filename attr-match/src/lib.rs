//! Matches parsed log queries against a record's attributes.
//!
//! A [`Matcher`] is built once per query and then applied to each record on
//! screen. It answers two questions: which attributes should be highlighted
//! (and where), and whether the record as a whole passes the query.

mod filter;
mod highlight;
mod plan;
mod term;
mod value;

pub use term::Span;
pub use value::{AttrValue, Attributes};

use loglens_syntax::{Expr, Operator};
use plan::Node;
use serde::Serialize;
use std::fmt;
use tracing::debug;

/// Per-attribute highlight result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchedAttribute {
    pub key: String,
    pub value: AttrValue,
    pub matched: bool,
    /// Byte range into `value.to_string()`.
    pub matched_span: Option<Span>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum MatchError {
    /// An ordering or range comparison hit a boolean or null attribute.
    InvalidComparatorTarget {
        key: String,
        op: Operator,
        found: &'static str,
    },
}

impl fmt::Display for MatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchError::InvalidComparatorTarget { key, op, found } => write!(
                f,
                "cannot apply `{}` to {found} attribute `{key}`",
                op.comparator()
            ),
        }
    }
}

impl std::error::Error for MatchError {}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MatchReport {
    pub attributes: Vec<MatchedAttribute>,
    pub errors: Vec<MatchError>,
}

/// A query prepared for matching.
///
/// ```
/// use attr_match::{Attributes, Matcher, AttrValue};
/// use loglens_syntax::parse_query;
///
/// let query = parse_query("timeout");
/// let matcher = Matcher::new(&query.expr, ["message"]);
/// let attrs: Attributes = [("level", "info"), ("message", "connection timeout")]
///     .into_iter()
///     .collect();
///
/// let report = matcher.evaluate(&attrs);
/// assert_eq!(report.attributes[0].key, "message");
/// assert!(report.attributes[0].matched);
/// assert!(!report.attributes[1].matched);
/// assert!(matcher.matches(&attrs));
/// ```
#[derive(Debug, Clone)]
pub struct Matcher {
    root: Node,
    default_fields: Vec<String>,
}

impl Matcher {
    pub fn new<I, S>(expr: &Expr, default_fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let default_fields: Vec<String> = default_fields.into_iter().map(Into::into).collect();
        debug!(terms = expr.terms().len(), ?default_fields, "matcher prepared");
        Self {
            root: Node::compile(expr),
            default_fields,
        }
    }

    pub fn default_fields(&self) -> &[String] {
        &self.default_fields
    }

    /// One entry per attribute: default fields first, in their configured
    /// order, then the rest in insertion order.
    pub fn evaluate(&self, attrs: &Attributes) -> MatchReport {
        let mut report = MatchReport::default();
        for (key, value) in self.ordered(attrs) {
            let hit = highlight::verdict(
                &self.root,
                &key.to_lowercase(),
                key,
                value,
                &mut report.errors,
            );
            report.attributes.push(MatchedAttribute {
                key: key.to_string(),
                value: value.clone(),
                matched: hit.is_some_and(|hit| hit.matched),
                matched_span: hit.and_then(|hit| hit.span),
            });
        }
        report
    }

    /// Whole-record verdict.
    pub fn matches(&self, attrs: &Attributes) -> bool {
        filter::eval(&self.root, attrs, &self.default_fields)
    }

    fn ordered<'r>(&self, attrs: &'r Attributes) -> Vec<(&'r str, &'r AttrValue)> {
        let mut seen = hashbrown::HashSet::new();
        let defaults = self
            .default_fields
            .iter()
            .filter_map(|field| attrs.get_entry(field));
        defaults
            .chain(attrs.iter())
            .filter(|(key, _)| seen.insert(key.to_lowercase()))
            .collect()
    }
}

/// One-shot helper for callers that match a single record.
pub fn match_attributes<S: AsRef<str>>(
    expr: &Expr,
    attrs: &Attributes,
    default_fields: &[S],
) -> Vec<MatchedAttribute> {
    Matcher::new(expr, default_fields.iter().map(|field| field.as_ref().to_string()))
        .evaluate(attrs)
        .attributes
}

#[cfg(test)]
mod tests {
    use super::*;
    use loglens_syntax::parse_query;

    fn attrs(pairs: &[(&str, AttrValue)]) -> Attributes {
        pairs.iter().cloned().collect()
    }

    #[test]
    fn default_fields_come_first() {
        let attrs = attrs(&[
            ("level", "info".into()),
            ("service_name", "api".into()),
            ("message", "hello".into()),
        ]);
        let matcher = Matcher::new(&parse_query("hello").expr, ["Message", "missing"]);
        let keys: Vec<_> = matcher
            .evaluate(&attrs)
            .attributes
            .into_iter()
            .map(|a| a.key)
            .collect();
        assert_eq!(keys, ["message", "level", "service_name"]);
    }

    #[test]
    fn invalid_comparator_targets_are_reported() {
        let attrs = attrs(&[("cached", true.into()), ("latency", 12.0.into())]);
        let report = Matcher::new(&parse_query("cached>1 latency>10").expr, ["message"])
            .evaluate(&attrs);
        assert_eq!(
            report.errors,
            [MatchError::InvalidComparatorTarget {
                key: "cached".to_string(),
                op: Operator::Gt,
                found: "boolean",
            }]
        );
        assert!(!report.attributes[0].matched);
        assert!(report.attributes[1].matched);
        assert_eq!(
            report.errors[0].to_string(),
            "cannot apply `:>` to boolean attribute `cached`"
        );
    }

    #[test]
    fn one_shot_helper_matches_matcher() {
        let attrs = attrs(&[("message", "disk full".into())]);
        let expr = parse_query("disk").expr;
        let via_helper = match_attributes(&expr, &attrs, &["message"]);
        let via_matcher = Matcher::new(&expr, ["message"]).evaluate(&attrs).attributes;
        assert_eq!(via_helper, via_matcher);
    }
}
