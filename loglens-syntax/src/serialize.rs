use crate::{
    Expr, Operator, Term,
    token::{
        RANGE_JOINER, comparator_len, is_key_char, is_word_breaker, keyword_kind, range_split,
        split_key,
    },
};
use std::fmt::{self, Write};

/// Renders an expression in canonical query syntax.
///
/// Connectives are spelled out, comparators carry the colon (equality falls
/// back to `=` when the value starts with comparator characters), and
/// parentheses appear for explicit groups or where `AND`/`OR` nesting would
/// otherwise be lost.
///
/// ```
/// use loglens_syntax::{parse_query, serialize};
///
/// let query = parse_query("a b or (c:>=1 d)");
/// assert_eq!(serialize(&query.expr), "a AND b OR (c:>=1 AND d)");
/// ```
pub fn serialize(expr: &Expr) -> String {
    expr.to_string()
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Empty => Ok(()),
            Expr::Term(term) => fmt::Display::fmt(term, f),
            Expr::Group(inner) => write!(f, "({inner})"),
            Expr::Not(inner) => {
                f.write_str("NOT ")?;
                write_operand(f, inner, |e| matches!(e, Expr::And(_) | Expr::Or(_)))
            }
            Expr::And(parts) => write_joined(f, parts, " AND ", |e| matches!(e, Expr::Or(_))),
            Expr::Or(parts) => write_joined(f, parts, " OR ", |_| false),
        }
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Some(key) = &self.key else {
            return write_value(f, &self.value, self.quoted || needs_quotes_free(&self.value));
        };

        if !key.is_empty() && key.chars().all(is_key_char) {
            f.write_str(key)?;
        } else {
            write_quoted(f, key)?;
        }
        let mut comparator = self.op.comparator();
        // `key:<5` reads as `key:<` + `5`, while `key=<5` keeps the value.
        if !self.quoted && comparator == ":" && extends_comparator(comparator, &self.value) {
            comparator = "=";
        }
        f.write_str(comparator)?;
        let quote = self.quoted || needs_quotes_keyed(self.op, comparator, &self.value);
        write_value(f, &self.value, quote)?;
        if let (Operator::Range, Some(high)) = (self.op, &self.range_end) {
            f.write_str(RANGE_JOINER)?;
            f.write_str(high)?;
        }
        Ok(())
    }
}

fn write_joined(
    f: &mut fmt::Formatter<'_>,
    parts: &[Expr],
    sep: &str,
    wrap: fn(&Expr) -> bool,
) -> fmt::Result {
    for (idx, part) in parts.iter().enumerate() {
        if idx > 0 {
            f.write_str(sep)?;
        }
        write_operand(f, part, wrap)?;
    }
    Ok(())
}

fn write_operand(f: &mut fmt::Formatter<'_>, expr: &Expr, wrap: fn(&Expr) -> bool) -> fmt::Result {
    if wrap(expr) {
        write!(f, "({expr})")
    } else {
        fmt::Display::fmt(expr, f)
    }
}

fn write_value(f: &mut fmt::Formatter<'_>, value: &str, quote: bool) -> fmt::Result {
    if quote {
        write_quoted(f, value)
    } else {
        f.write_str(value)
    }
}

fn write_quoted(f: &mut fmt::Formatter<'_>, text: &str) -> fmt::Result {
    f.write_char('"')?;
    for ch in text.chars() {
        if matches!(ch, '"' | '\\') {
            f.write_char('\\')?;
        }
        f.write_char(ch)?;
    }
    f.write_char('"')
}

fn breaks_word(value: &str) -> bool {
    value.is_empty() || value.chars().any(is_word_breaker)
}

// A bare word must not read back as a connective or as `key<op>...`.
fn needs_quotes_free(value: &str) -> bool {
    breaks_word(value) || keyword_kind(value).is_some() || split_key(value).is_some()
}

fn extends_comparator(comparator: &str, value: &str) -> bool {
    let joined = format!("{comparator}{value}");
    comparator_len(&joined) != Some(comparator.len())
}

// The value must not extend the comparator (`:>` + `=5` reads as `:>=`) or,
// for equality, turn into a range.
fn needs_quotes_keyed(op: Operator, comparator: &str, value: &str) -> bool {
    breaks_word(value)
        || extends_comparator(comparator, value)
        || (op == Operator::Eq && range_split(value).is_some())
}
