//! First evaluation pass: compile the expression and record, per node, which
//! attribute keys it can constrain.

use crate::term::CompiledTerm;
use hashbrown::HashSet;
use loglens_syntax::Expr;

/// Keys a subtree can say anything about. Free text reaches every key.
#[derive(Debug, Clone, Default)]
pub(crate) struct Scope {
    keys: HashSet<String>,
    free_text: bool,
}

impl Scope {
    /// `key` must already be lowercased.
    pub fn covers(&self, key: &str) -> bool {
        self.free_text || self.keys.contains(key)
    }

    fn merge(&mut self, other: &Scope) {
        self.free_text |= other.free_text;
        self.keys.extend(other.keys.iter().cloned());
    }
}

#[derive(Debug, Clone)]
pub(crate) enum NodeKind {
    Empty,
    Term(CompiledTerm),
    Not(Box<Node>),
    Group(Box<Node>),
    And(Vec<Node>),
    Or(Vec<Node>),
}

#[derive(Debug, Clone)]
pub(crate) struct Node {
    pub kind: NodeKind,
    pub scope: Scope,
}

impl Node {
    pub fn compile(expr: &Expr) -> Self {
        let kind = match expr {
            Expr::Empty => NodeKind::Empty,
            Expr::Term(term) => NodeKind::Term(CompiledTerm::new(term)),
            Expr::Not(inner) => NodeKind::Not(Box::new(Node::compile(inner))),
            Expr::Group(inner) => NodeKind::Group(Box::new(Node::compile(inner))),
            Expr::And(parts) => NodeKind::And(parts.iter().map(Node::compile).collect()),
            Expr::Or(parts) => NodeKind::Or(parts.iter().map(Node::compile).collect()),
        };
        let scope = scope_of(&kind);
        Self { kind, scope }
    }
}

fn scope_of(kind: &NodeKind) -> Scope {
    let mut scope = Scope::default();
    match kind {
        NodeKind::Empty => {}
        NodeKind::Term(term) => match &term.key {
            Some(key) => {
                scope.keys.insert(key.clone());
            }
            None => scope.free_text = true,
        },
        NodeKind::Not(inner) | NodeKind::Group(inner) => scope.merge(&inner.scope),
        NodeKind::And(parts) | NodeKind::Or(parts) => {
            for part in parts {
                scope.merge(&part.scope);
            }
        }
    }
    scope
}
