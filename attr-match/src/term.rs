use crate::value::{AttrValue, parse_number};
use loglens_syntax::{Operator, Term};
use regex::{Regex, RegexBuilder};
use serde::Serialize;
use std::cmp::Ordering;
use tracing::warn;

/// Byte range of the matched text inside the displayed attribute value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Span {
    pub start: usize,
    pub len: usize,
}

/// Result of testing one term against one value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) struct Outcome {
    pub matched: bool,
    pub span: Option<Span>,
    /// Ordering comparison against a boolean or null.
    pub invalid_target: bool,
}

impl Outcome {
    fn hit(matched: bool, span: Option<Span>) -> Self {
        Self {
            matched,
            span: span.filter(|_| matched),
            invalid_target: false,
        }
    }

    fn invalid() -> Self {
        Self {
            invalid_target: true,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone)]
struct Bound {
    text: String,
    number: Option<f64>,
}

impl Bound {
    fn new(text: &str) -> Self {
        Self {
            text: text.to_lowercase(),
            number: parse_number(text),
        }
    }
}

#[derive(Debug, Clone)]
enum Test {
    /// Anchored glob over the displayed value. Numbers compare numerically
    /// when the pattern spells a number.
    Equals {
        glob: Regex,
        number: Option<f64>,
        negate: bool,
    },
    /// Unanchored search; the first hit becomes the span.
    Find { regex: Regex, negate: bool },
    Order { op: Operator, bound: Bound },
    Range { low: Bound, high: Bound },
    /// Empty phrase, or a pattern that could not be compiled.
    Never,
}

/// A term with its patterns compiled, ready to run against many values.
#[derive(Debug, Clone)]
pub(crate) struct CompiledTerm {
    /// Lowercased attribute name, `None` for free text.
    pub key: Option<String>,
    pub op: Operator,
    test: Test,
}

impl CompiledTerm {
    pub fn new(term: &Term) -> Self {
        let test = build_test(term).unwrap_or_else(|err| {
            warn!(value = %term.value, ?err, "term pattern rejected, it will never match");
            Test::Never
        });
        Self {
            key: term.key.as_deref().map(str::to_lowercase),
            op: term.op,
            test,
        }
    }

    pub fn test(&self, value: &AttrValue) -> Outcome {
        match &self.test {
            Test::Equals {
                glob,
                number,
                negate,
            } => {
                let text = value.to_string();
                let equal = match (value, number) {
                    (AttrValue::Number(actual), Some(expected)) => actual == expected,
                    _ => glob.is_match(&text),
                };
                let span = Span {
                    start: 0,
                    len: text.len(),
                };
                Outcome::hit(equal != *negate, Some(span).filter(|_| !*negate))
            }
            Test::Find { regex, negate } => {
                let text = value.to_string();
                let found = regex.find(&text);
                let span = found.filter(|m| !m.is_empty() && !*negate).map(|m| Span {
                    start: m.start(),
                    len: m.len(),
                });
                Outcome::hit(found.is_some() != *negate, span)
            }
            Test::Order { op, bound } => {
                if !value.is_comparable() {
                    return Outcome::invalid();
                }
                let matched = compare(value, bound).is_some_and(|ord| match op {
                    Operator::Gt => ord == Ordering::Greater,
                    Operator::Gte => ord != Ordering::Less,
                    Operator::Lt => ord == Ordering::Less,
                    Operator::Lte => ord != Ordering::Greater,
                    _ => false,
                });
                Outcome::hit(matched, None)
            }
            Test::Range { low, high } => {
                if !value.is_comparable() {
                    return Outcome::invalid();
                }
                let matched = match (value.as_number(), low.number, high.number) {
                    (Some(n), Some(lo), Some(hi)) => lo <= n && n <= hi,
                    _ => {
                        let text = value.to_string().to_lowercase();
                        low.text <= text && text <= high.text
                    }
                };
                Outcome::hit(matched, None)
            }
            Test::Never => Outcome::default(),
        }
    }
}

fn build_test(term: &Term) -> Result<Test, regex::Error> {
    let value = term.value.as_str();
    let has_wildcard = value.contains('*');
    let test = match term.op {
        Operator::Eq | Operator::Neq => {
            let negate = term.op == Operator::Neq;
            // `key:""` asks for an empty value, which the anchored glob does.
            if term.quoted && !has_wildcard && !value.is_empty() {
                Test::Find {
                    regex: build_regex(value, false)?,
                    negate,
                }
            } else {
                Test::Equals {
                    glob: build_regex(value, true)?,
                    number: parse_number(value).filter(|_| !has_wildcard),
                    negate,
                }
            }
        }
        Operator::Contains if value.is_empty() => Test::Never,
        Operator::Contains => Test::Find {
            regex: build_regex(value, false)?,
            negate: false,
        },
        Operator::Gt | Operator::Gte | Operator::Lt | Operator::Lte => Test::Order {
            op: term.op,
            bound: Bound::new(value),
        },
        Operator::Range => Test::Range {
            low: Bound::new(value),
            high: Bound::new(term.range_end.as_deref().unwrap_or(value)),
        },
    };
    Ok(test)
}

fn compare(value: &AttrValue, bound: &Bound) -> Option<Ordering> {
    match (value.as_number(), bound.number) {
        (Some(actual), Some(expected)) => actual.partial_cmp(&expected),
        _ => Some(value.to_string().to_lowercase().cmp(&bound.text)),
    }
}

/// `*` never crosses this inside an anchored glob.
const SEGMENT_SEPARATOR: char = '/';

/// Case-insensitive pattern. Anchored patterns are globs where `*` stays
/// within one `/`-separated segment; unanchored ones are searches where `*`
/// matches any run of characters.
fn build_regex(value: &str, anchored: bool) -> Result<Regex, regex::Error> {
    let pattern = wildcard_to_regex(value, anchored);
    RegexBuilder::new(&pattern)
        .case_insensitive(true)
        .dot_matches_new_line(true)
        .build()
}

fn wildcard_to_regex(value: &str, anchored: bool) -> String {
    let (value, wildcard) = if anchored {
        (value, format!("[^{}]*", regex::escape(&SEGMENT_SEPARATOR.to_string())))
    } else {
        // Outer wildcards add nothing to a search and would widen the span.
        (value.trim_matches('*'), ".*".to_string())
    };
    let mut regex = String::with_capacity(value.len() + 4);
    if anchored {
        regex.push('^');
    }
    for (idx, chunk) in value.split('*').enumerate() {
        if idx > 0 {
            regex.push_str(&wildcard);
        }
        regex.push_str(&regex::escape(chunk));
    }
    if anchored {
        regex.push('$');
    }
    regex
}
