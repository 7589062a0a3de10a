//! Plain boolean evaluation of a whole record, used for client-side
//! filtering.

use crate::{
    plan::{Node, NodeKind},
    term::CompiledTerm,
    value::Attributes,
};

pub(crate) fn eval(node: &Node, attrs: &Attributes, default_fields: &[String]) -> bool {
    match &node.kind {
        NodeKind::Empty => true,
        NodeKind::Term(term) => eval_term(term, attrs, default_fields),
        NodeKind::Not(inner) => !eval(inner, attrs, default_fields),
        NodeKind::Group(inner) => eval(inner, attrs, default_fields),
        NodeKind::And(parts) => parts.iter().all(|part| eval(part, attrs, default_fields)),
        NodeKind::Or(parts) => parts.iter().any(|part| eval(part, attrs, default_fields)),
    }
}

// A missing key fails every operator, `!=` included.
fn eval_term(term: &CompiledTerm, attrs: &Attributes, default_fields: &[String]) -> bool {
    match &term.key {
        Some(key) => attrs
            .get(key)
            .is_some_and(|value| term.test(value).matched),
        None => default_fields
            .iter()
            .filter_map(|field| attrs.get(field))
            .chain(attrs.iter().map(|(_, value)| value))
            .any(|value| term.test(value).matched),
    }
}
