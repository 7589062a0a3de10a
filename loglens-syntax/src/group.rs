use crate::token::{Token, TokenKind};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum GroupKind {
    /// `key<op>value`, including range bounds.
    KeyValue,
    FreeText,
    /// `AND`, `OR`, `NOT`.
    Operator,
    /// A single parenthesis.
    Grouping,
}

/// Adjacent tokens that render as one highlighted span in the search box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TokenGroup<'t, 'a> {
    pub kind: GroupKind,
    pub tokens: &'t [Token<'a>],
}

impl<'a> TokenGroup<'_, 'a> {
    pub fn start(&self) -> usize {
        self.tokens.first().map_or(0, |token| token.start)
    }

    pub fn end(&self) -> usize {
        self.tokens.last().map_or(0, |token| token.end)
    }

    /// The slice of the original query covered by this group.
    pub fn text(&self, input: &'a str) -> &'a str {
        &input[self.start()..self.end()]
    }
}

/// Groups tokens for input highlighting.
///
/// Works on any token sequence, including ones the parser has to repair.
/// Whitespace is left out; every other token lands in exactly one group.
///
/// ```
/// use loglens_syntax::{group_tokens, tokenize, GroupKind};
///
/// let tokens = tokenize("level:error OR timeout");
/// let kinds: Vec<_> = group_tokens(&tokens).iter().map(|g| g.kind).collect();
/// assert_eq!(kinds, [GroupKind::KeyValue, GroupKind::Operator, GroupKind::FreeText]);
/// ```
pub fn group_tokens<'t, 'a>(tokens: &'t [Token<'a>]) -> Vec<TokenGroup<'t, 'a>> {
    let mut groups = Vec::new();
    let mut idx = 0;
    while let Some(token) = tokens.get(idx) {
        let (kind, len) = match token.kind {
            TokenKind::Whitespace => {
                idx += 1;
                continue;
            }
            TokenKind::Key => (GroupKind::KeyValue, key_value_len(&tokens[idx..])),
            TokenKind::Value | TokenKind::QuotedValue => (GroupKind::FreeText, 1),
            TokenKind::And | TokenKind::Or | TokenKind::Not | TokenKind::Operator => {
                (GroupKind::Operator, 1)
            }
            TokenKind::LParen | TokenKind::RParen => (GroupKind::Grouping, 1),
        };
        groups.push(TokenGroup {
            kind,
            tokens: &tokens[idx..idx + len],
        });
        idx += len;
    }
    groups
}

type Accept = fn(&Token<'_>) -> bool;

// Shape of a key/value run after the key itself. Each step must touch the
// previous token.
const KEY_VALUE_SHAPE: [Accept; 4] = [is_comparator, is_value, is_range_joiner, is_bare_value];

fn key_value_len(run: &[Token<'_>]) -> usize {
    let mut len = 1;
    for accept in KEY_VALUE_SHAPE {
        let (Some(prev), Some(next)) = (run.get(len - 1), run.get(len)) else {
            break;
        };
        if next.start != prev.end || !accept(next) {
            break;
        }
        len += 1;
    }
    len
}

fn is_comparator(token: &Token<'_>) -> bool {
    token.comparator().is_some()
}

fn is_range_joiner(token: &Token<'_>) -> bool {
    token.is_range_joiner()
}

fn is_value(token: &Token<'_>) -> bool {
    matches!(token.kind, TokenKind::Value | TokenKind::QuotedValue)
}

fn is_bare_value(token: &Token<'_>) -> bool {
    token.kind == TokenKind::Value
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokenize;

    fn shape(input: &str) -> Vec<(GroupKind, String)> {
        let tokens = tokenize(input);
        group_tokens(&tokens)
            .iter()
            .map(|group| (group.kind, group.text(input).to_string()))
            .collect()
    }

    #[test]
    fn key_operator_value_collapse() {
        assert_eq!(
            shape("level:error duration:>=100"),
            [
                (GroupKind::KeyValue, "level:error".to_string()),
                (GroupKind::KeyValue, "duration:>=100".to_string()),
            ]
        );
    }

    #[test]
    fn range_bounds_join_the_key_group() {
        let tokens = tokenize("status:200..299");
        let groups = group_tokens(&tokens);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].kind, GroupKind::KeyValue);
        assert_eq!(groups[0].tokens.len(), 5);
    }

    #[test]
    fn parens_and_connectives_are_separate_groups() {
        assert_eq!(
            shape("(a:b OR \"c d\") NOT e"),
            [
                (GroupKind::Grouping, "(".to_string()),
                (GroupKind::KeyValue, "a:b".to_string()),
                (GroupKind::Operator, "OR".to_string()),
                (GroupKind::FreeText, "\"c d\"".to_string()),
                (GroupKind::Grouping, ")".to_string()),
                (GroupKind::Operator, "NOT".to_string()),
                (GroupKind::FreeText, "e".to_string()),
            ]
        );
    }

    #[test]
    fn malformed_input_still_groups() {
        assert_eq!(
            shape("level: ))(  status:5.. \"open"),
            [
                (GroupKind::KeyValue, "level:".to_string()),
                (GroupKind::Grouping, ")".to_string()),
                (GroupKind::Grouping, ")".to_string()),
                (GroupKind::Grouping, "(".to_string()),
                (GroupKind::KeyValue, "status:5..".to_string()),
                (GroupKind::FreeText, "\"open".to_string()),
            ]
        );
    }

    #[test]
    fn groups_partition_non_whitespace_tokens() {
        let input = " a:b  (c OR d:\"e f\")) NOT g:1..2 ";
        let tokens = tokenize(input);
        let groups = group_tokens(&tokens);
        let grouped: usize = groups.iter().map(|g| g.tokens.len()).sum();
        let significant = tokens.iter().filter(|t| !t.is_whitespace()).count();
        assert_eq!(grouped, significant);
        assert!(
            groups
                .iter()
                .all(|g| g.tokens.iter().all(|t| !t.is_whitespace()))
        );
    }

    #[test]
    fn empty_input_has_no_groups() {
        assert!(group_tokens(&tokenize("   ")).is_empty());
    }
}
