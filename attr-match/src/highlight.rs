//! Second evaluation pass: per-attribute verdicts for result highlighting.

use crate::{
    MatchError,
    plan::{Node, NodeKind},
    term::Span,
    value::AttrValue,
};
use tracing::debug;

/// What a subtree says about one attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Verdict {
    pub matched: bool,
    pub span: Option<Span>,
}

/// Evaluates `node` for a single attribute. `None` means no part of the
/// subtree is about this attribute, so it is left unhighlighted.
///
/// `key` is the lowercased attribute name.
pub(crate) fn verdict(
    node: &Node,
    key: &str,
    display_key: &str,
    value: &AttrValue,
    errors: &mut Vec<MatchError>,
) -> Option<Verdict> {
    if !node.scope.covers(key) {
        return None;
    }
    match &node.kind {
        NodeKind::Empty => None,
        NodeKind::Term(term) => {
            let outcome = term.test(value);
            if outcome.invalid_target {
                debug!(
                    key = display_key,
                    op = ?term.op,
                    value_type = value.type_name(),
                    "ordering comparison on non-comparable value"
                );
                let error = MatchError::InvalidComparatorTarget {
                    key: display_key.to_string(),
                    op: term.op,
                    found: value.type_name(),
                };
                if !errors.contains(&error) {
                    errors.push(error);
                }
            }
            Some(Verdict {
                matched: outcome.matched,
                span: outcome.span,
            })
        }
        NodeKind::Not(inner) => {
            verdict(inner, key, display_key, value, errors).map(|inner| Verdict {
                matched: !inner.matched,
                span: None,
            })
        }
        NodeKind::Group(inner) => verdict(inner, key, display_key, value, errors),
        NodeKind::And(parts) => combine(parts, key, display_key, value, errors, |hits| {
            hits.iter().all(|hit| hit.matched)
        }),
        NodeKind::Or(parts) => combine(parts, key, display_key, value, errors, |hits| {
            hits.iter().any(|hit| hit.matched)
        }),
    }
}

// Only children that produce a verdict take part. The reported span is the
// first one among the matching children.
fn combine(
    parts: &[Node],
    key: &str,
    display_key: &str,
    value: &AttrValue,
    errors: &mut Vec<MatchError>,
    decide: fn(&[Verdict]) -> bool,
) -> Option<Verdict> {
    let hits: Vec<Verdict> = parts
        .iter()
        .filter_map(|part| verdict(part, key, display_key, value, errors))
        .collect();
    if hits.is_empty() {
        return None;
    }
    let matched = decide(&hits);
    let span = hits
        .iter()
        .filter(|hit| hit.matched)
        .find_map(|hit| hit.span)
        .filter(|_| matched);
    Some(Verdict { matched, span })
}

#[cfg(test)]
mod tests {
    use super::*;
    use loglens_syntax::parse_query;

    fn judge(query: &str, key: &str, value: impl Into<AttrValue>) -> Option<Verdict> {
        let node = Node::compile(&parse_query(query).expr);
        let mut errors = Vec::new();
        verdict(&node, &key.to_lowercase(), key, &value.into(), &mut errors)
    }

    #[test]
    fn unrelated_keys_get_no_verdict() {
        assert_eq!(judge("level:error", "message", "error"), None);
        assert_eq!(judge("", "message", "error"), None);
    }

    #[test]
    fn and_only_counts_relevant_children() {
        let hit = judge("level:error AND service:api", "level", "ERROR").unwrap();
        assert!(hit.matched);
        assert_eq!(hit.span, Some(Span { start: 0, len: 5 }));

        let hit = judge("level:error AND level:warn", "level", "error").unwrap();
        assert!(!hit.matched);
        assert_eq!(hit.span, None);
    }

    #[test]
    fn or_matches_when_any_relevant_child_does() {
        let hit = judge("level:warn OR timeout", "level", "timeout-ish").unwrap();
        assert!(hit.matched);
        assert_eq!(hit.span, Some(Span { start: 0, len: 7 }));
    }

    #[test]
    fn not_inverts_and_drops_the_span() {
        let hit = judge("NOT level:debug", "level", "info").unwrap();
        assert!(hit.matched);
        assert_eq!(hit.span, None);
        assert!(!judge("NOT level:debug", "level", "debug").unwrap().matched);
        assert_eq!(judge("NOT level:debug", "service", "api"), None);
    }

    #[test]
    fn invalid_comparisons_are_reported_once() {
        let node = Node::compile(&parse_query("flag>1 OR flag<2").expr);
        let mut errors = Vec::new();
        let hit = verdict(&node, "flag", "Flag", &AttrValue::Boolean(true), &mut errors);
        assert_eq!(hit.map(|h| h.matched), Some(false));
        assert_eq!(errors.len(), 2);
        verdict(&node, "flag", "Flag", &AttrValue::Boolean(true), &mut errors);
        assert_eq!(errors.len(), 2);
    }
}
