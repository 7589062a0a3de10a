//! # Search syntax for log records
//!
//! `loglens-syntax` turns the free-form text typed into the log search box into
//! tokens (for live highlighting of the input), token groups, and a structured
//! expression tree that the attribute matcher and remote query translators
//! consume. Parsing never fails: malformed input still yields a usable tree
//! together with a list of [`ParseError`]s, because the parser runs on every
//! keystroke.
//!
//! ## Example
//! ```
//! use loglens_syntax::{parse_query, Expr, Operator};
//!
//! let query = parse_query("level:error AND duration>100");
//! assert!(query.errors.is_empty());
//! let Expr::And(parts) = &query.expr else { panic!("expected conjunction") };
//! assert!(matches!(&parts[0], Expr::Term(t) if t.key.as_deref() == Some("level")));
//! assert!(matches!(&parts[1], Expr::Term(t) if t.op == Operator::Gt && t.value == "100"));
//!
//! // canonical form, e.g. for the `query` URL parameter
//! assert_eq!(query.expr.to_string(), "level:error AND duration:>100");
//! ```

mod group;
mod parser;
mod serialize;
mod token;

pub use group::{GroupKind, TokenGroup, group_tokens};
pub use parser::{MAX_DEPTH, parse};
pub use serialize::serialize;
pub use token::{Token, TokenKind, tokenize};

use serde::Serialize;
use std::fmt;

/// Tokenizes and parses a raw query string.
pub fn parse_query(input: &str) -> Query {
    parse(&tokenize(input))
}

/// Result of a parse: the best-effort expression plus everything that had to
/// be repaired to produce it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Query {
    pub expr: Expr,
    pub errors: Vec<ParseError>,
}

impl Query {
    pub fn is_empty(&self) -> bool {
        matches!(self.expr, Expr::Empty)
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

/// Logical structure of a search.
///
/// `And`/`Or` hold flat operand lists (always two or more) so left-associative
/// chains don't nest. `Group` keeps explicit parentheses so the serializer can
/// reproduce them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Expr {
    /// Matches every record. Produced for empty or whitespace-only input.
    ///
    /// ```
    /// use loglens_syntax::{parse_query, Expr};
    /// assert!(matches!(parse_query("   ").expr, Expr::Empty));
    /// ```
    Empty,
    /// A single predicate.
    Term(Term),
    /// ```
    /// use loglens_syntax::{parse_query, Expr};
    /// let Expr::Not(inner) = parse_query("NOT level:debug").expr else { panic!() };
    /// assert!(matches!(*inner, Expr::Term(_)));
    /// ```
    Not(Box<Expr>),
    /// Explicit parenthesized sub-expression.
    ///
    /// ```
    /// use loglens_syntax::{parse_query, Expr};
    /// assert!(matches!(parse_query("(a OR b)").expr, Expr::Group(_)));
    /// ```
    Group(Box<Expr>),
    /// Conjunction, explicit (`AND`) or implicit (adjacency).
    ///
    /// ```
    /// use loglens_syntax::{parse_query, Expr};
    /// let Expr::And(parts) = parse_query("a b AND c").expr else { panic!() };
    /// assert_eq!(parts.len(), 3);
    /// ```
    And(Vec<Expr>),
    /// Disjunction. Binds looser than `AND`.
    ///
    /// ```
    /// use loglens_syntax::{parse_query, Expr};
    /// let Expr::Or(parts) = parse_query("a b OR c").expr else { panic!() };
    /// assert!(matches!(&parts[0], Expr::And(_)));
    /// ```
    Or(Vec<Expr>),
}

impl Expr {
    /// Every term in the tree, left to right.
    pub fn terms(&self) -> Vec<&Term> {
        let mut terms = Vec::new();
        self.collect_terms(&mut terms);
        terms
    }

    fn collect_terms<'e>(&'e self, terms: &mut Vec<&'e Term>) {
        match self {
            Expr::Empty => {}
            Expr::Term(term) => terms.push(term),
            Expr::Not(inner) | Expr::Group(inner) => inner.collect_terms(terms),
            Expr::And(parts) | Expr::Or(parts) => {
                for part in parts {
                    part.collect_terms(terms);
                }
            }
        }
    }
}

/// One `key<op>value` predicate, or a free-text word/phrase when `key` is
/// `None`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Term {
    pub key: Option<String>,
    pub op: Operator,
    /// Lower bound for [`Operator::Range`].
    pub value: String,
    /// Inclusive upper bound, only set for [`Operator::Range`].
    pub range_end: Option<String>,
    /// The value was written as a `"quoted phrase"`.
    pub quoted: bool,
}

impl Term {
    /// Free-text search term (no key). Matched as a substring.
    pub fn free_text(value: impl Into<String>) -> Self {
        Self {
            key: None,
            op: Operator::Contains,
            value: value.into(),
            range_end: None,
            quoted: false,
        }
    }

    pub fn keyed(key: impl Into<String>, op: Operator, value: impl Into<String>) -> Self {
        Self {
            key: Some(key.into()),
            op,
            value: value.into(),
            range_end: None,
            quoted: false,
        }
    }

    pub fn range(key: impl Into<String>, low: impl Into<String>, high: impl Into<String>) -> Self {
        Self {
            key: Some(key.into()),
            op: Operator::Range,
            value: low.into(),
            range_end: Some(high.into()),
            quoted: false,
        }
    }

    /// Marks the value as a quoted phrase.
    pub fn phrase(mut self) -> Self {
        self.quoted = true;
        self
    }

    pub fn is_free_text(&self) -> bool {
        self.key.is_none()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Operator {
    Eq,
    Neq,
    Gt,
    Gte,
    Lt,
    Lte,
    Contains,
    Range,
}

impl Operator {
    /// Maps comparator text (`:`, `:>=`, `!=`, `~`, ...) to an operator.
    /// The range joiner has no operator of its own.
    pub fn from_comparator(text: &str) -> Option<Self> {
        let text = text.strip_prefix(':').unwrap_or(text);
        let op = match text {
            "" | "=" => Operator::Eq,
            "!=" => Operator::Neq,
            ">" => Operator::Gt,
            ">=" => Operator::Gte,
            "<" => Operator::Lt,
            "<=" => Operator::Lte,
            "~" => Operator::Contains,
            _ => return None,
        };
        Some(op)
    }

    /// Canonical comparator spelling, colon included. The serializer falls
    /// back to `=` for equality when the colon would run into the value.
    pub fn comparator(self) -> &'static str {
        match self {
            Operator::Eq | Operator::Range => ":",
            Operator::Neq => ":!=",
            Operator::Gt => ":>",
            Operator::Gte => ":>=",
            Operator::Lt => ":<",
            Operator::Lte => ":<=",
            Operator::Contains => ":~",
        }
    }

    /// Ordering comparisons only make sense for numbers and strings.
    pub fn is_ordering(self) -> bool {
        matches!(
            self,
            Operator::Gt | Operator::Gte | Operator::Lt | Operator::Lte | Operator::Range
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ParseErrorKind {
    UnbalancedParen,
    IncompleteRange,
    DanglingOperator,
    UnterminatedQuote,
    MissingValue,
    /// Groups or negations nested past the supported depth; the extra `(`
    /// or `NOT` is dropped.
    TooDeep,
}

impl ParseErrorKind {
    fn message(self) -> &'static str {
        match self {
            ParseErrorKind::UnbalancedParen => "unbalanced parenthesis",
            ParseErrorKind::IncompleteRange => "range is missing its upper bound",
            ParseErrorKind::DanglingOperator => "operator is missing an operand",
            ParseErrorKind::UnterminatedQuote => "missing closing quote",
            ParseErrorKind::MissingValue => "comparison is missing a value",
            ParseErrorKind::TooDeep => "query is nested too deeply",
        }
    }
}

/// A repaired problem in the input. `position` is a byte offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub position: usize,
}

impl ParseError {
    pub fn new(kind: ParseErrorKind, position: usize) -> Self {
        Self { kind, position }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (at byte {})", self.kind.message(), self.position)
    }
}

impl std::error::Error for ParseError {}
