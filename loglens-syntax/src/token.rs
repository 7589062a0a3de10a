//! Lexer for the log search language.
//!
//! The lexer never fails. Every byte of the input ends up in exactly one
//! token, so concatenating the token texts reproduces the input.

use crate::Operator;
use serde::Serialize;

/// Separator between the bounds of `key:low..high`.
pub(crate) const RANGE_JOINER: &str = "..";

// Longest first so `>=` wins over `>`.
const COLON_COMPARATORS: [&str; 6] = [">=", "<=", "!=", ">", "<", "~"];
const BARE_COMPARATORS: [&str; 7] = [">=", "<=", "!=", ">", "<", "=", "~"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TokenKind {
    /// Attribute name on the left of a comparator (`level` in `level:error`).
    Key,
    /// Comparator (`:`, `:>=`, `!=`, ...) or the `..` range joiner.
    Operator,
    /// Bare word.
    Value,
    /// Double-quoted text, quotes included.
    QuotedValue,
    LParen,
    RParen,
    And,
    Or,
    Not,
    Whitespace,
}

/// A lexical token borrowing its text from the query string.
///
/// `start..end` is a byte range into the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Token<'a> {
    pub kind: TokenKind,
    pub text: &'a str,
    pub start: usize,
    pub end: usize,
}

impl Token<'_> {
    /// The comparison this token spells, if it is a comparator.
    pub fn comparator(&self) -> Option<Operator> {
        if self.kind != TokenKind::Operator {
            return None;
        }
        Operator::from_comparator(self.text)
    }

    pub fn is_range_joiner(&self) -> bool {
        self.kind == TokenKind::Operator && self.text == RANGE_JOINER
    }

    pub fn is_whitespace(&self) -> bool {
        self.kind == TokenKind::Whitespace
    }
}

/// Splits a raw query string into tokens.
///
/// ```
/// use loglens_syntax::{tokenize, TokenKind};
///
/// let kinds: Vec<_> = tokenize("level:error").iter().map(|t| t.kind).collect();
/// assert_eq!(kinds, [TokenKind::Key, TokenKind::Operator, TokenKind::Value]);
/// ```
pub fn tokenize(input: &str) -> Vec<Token<'_>> {
    Lexer::new(input).run()
}

struct Lexer<'a> {
    input: &'a str,
    pos: usize,
    tokens: Vec<Token<'a>>,
}

impl<'a> Lexer<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            input,
            pos: 0,
            tokens: Vec::new(),
        }
    }

    fn run(mut self) -> Vec<Token<'a>> {
        while let Some(ch) = self.peek_char() {
            match ch {
                '(' => self.push_until(TokenKind::LParen, self.pos + 1),
                ')' => self.push_until(TokenKind::RParen, self.pos + 1),
                '"' => self.lex_quoted(),
                ch if ch.is_whitespace() => {
                    let end = self.scan_while(self.pos, char::is_whitespace);
                    self.push_until(TokenKind::Whitespace, end);
                }
                _ => self.lex_word(),
            }
        }
        self.tokens
    }

    // A quoted span directly followed by a comparator names an attribute
    // (`"service name":api`); otherwise it is a phrase value.
    fn lex_quoted(&mut self) {
        let end = quoted_end(self.input, self.pos);
        match comparator_len(&self.input[end..]) {
            Some(op_len) => {
                self.push_until(TokenKind::Key, end);
                self.lex_comparison(op_len);
            }
            None => self.push_until(TokenKind::QuotedValue, end),
        }
    }

    fn lex_word(&mut self) {
        if let Some((key_end, op_len)) = split_key(&self.input[self.pos..]) {
            self.push_until(TokenKind::Key, self.pos + key_end);
            self.lex_comparison(op_len);
            return;
        }

        let end = self.scan_while(self.pos, |ch| !is_word_breaker(ch));
        let kind = keyword_kind(&self.input[self.pos..end]).unwrap_or(TokenKind::Value);
        self.push_until(kind, end);
    }

    // Cursor sits on the comparator. Emits it, then the value (if any) that
    // touches it. Equality values may be split into a `low..high` range.
    fn lex_comparison(&mut self, op_len: usize) {
        let input = self.input;
        let op_start = self.pos;
        self.push_until(TokenKind::Operator, op_start + op_len);
        let allows_range = matches!(&input[op_start..self.pos], ":" | "=");

        match self.peek_char() {
            Some('"') => {
                let end = quoted_end(input, self.pos);
                self.push_until(TokenKind::QuotedValue, end);
            }
            Some(ch) if !is_word_breaker(ch) => {
                let end = self.scan_while(self.pos, |ch| !is_word_breaker(ch));
                let split = range_split(&input[self.pos..end]).filter(|_| allows_range);
                match split {
                    Some(offset) => {
                        let joiner = self.pos + offset;
                        self.push_until(TokenKind::Value, joiner);
                        self.push_until(TokenKind::Operator, joiner + RANGE_JOINER.len());
                        if self.pos < end {
                            self.push_until(TokenKind::Value, end);
                        }
                    }
                    None => self.push_until(TokenKind::Value, end),
                }
            }
            _ => {}
        }
    }

    fn push_until(&mut self, kind: TokenKind, end: usize) {
        self.tokens.push(Token {
            kind,
            text: &self.input[self.pos..end],
            start: self.pos,
            end,
        });
        self.pos = end;
    }

    fn scan_while(&self, from: usize, pred: impl Fn(char) -> bool) -> usize {
        self.input[from..]
            .char_indices()
            .find(|&(_, ch)| !pred(ch))
            .map_or(self.input.len(), |(idx, _)| from + idx)
    }

    fn peek_char(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }
}

/// End (exclusive) of the quoted span opening at `start`. Runs to the end of
/// input when the closing quote is missing.
fn quoted_end(input: &str, start: usize) -> usize {
    let body = start + 1;
    let mut escaped = false;
    for (idx, ch) in input[body..].char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match ch {
            '\\' => escaped = true,
            '"' => return body + idx + 1,
            _ => {}
        }
    }
    input.len()
}

/// Length of the comparator at the start of `rest`.
pub(crate) fn comparator_len(rest: &str) -> Option<usize> {
    if let Some(after) = rest.strip_prefix(':') {
        let suffix = COLON_COMPARATORS
            .into_iter()
            .find(|op| after.starts_with(*op))
            .map_or(0, str::len);
        return Some(1 + suffix);
    }
    BARE_COMPARATORS
        .into_iter()
        .find(|op| rest.starts_with(*op))
        .map(str::len)
}

/// Detects a leading `key<comparator>` and returns `(key_len, comparator_len)`.
pub(crate) fn split_key(word: &str) -> Option<(usize, usize)> {
    let key_len = word
        .char_indices()
        .find(|&(_, ch)| !is_key_char(ch))
        .map_or(word.len(), |(idx, _)| idx);
    if key_len == 0 {
        return None;
    }
    comparator_len(&word[key_len..]).map(|op_len| (key_len, op_len))
}

/// Byte offset of the range joiner inside an equality value. A leading `..`
/// is not a range.
pub(crate) fn range_split(value: &str) -> Option<usize> {
    value.find(RANGE_JOINER).filter(|&idx| idx > 0)
}

pub(crate) fn is_key_char(ch: char) -> bool {
    ch.is_alphanumeric() || matches!(ch, '_' | '.' | '-' | '@' | '/')
}

pub(crate) fn is_word_breaker(ch: char) -> bool {
    ch.is_whitespace() || matches!(ch, '(' | ')' | '"')
}

pub(crate) fn keyword_kind(word: &str) -> Option<TokenKind> {
    if word.eq_ignore_ascii_case("AND") {
        Some(TokenKind::And)
    } else if word.eq_ignore_ascii_case("OR") {
        Some(TokenKind::Or)
    } else if word.eq_ignore_ascii_case("NOT") {
        Some(TokenKind::Not)
    } else {
        None
    }
}

/// Strips the surrounding quotes and backslash escapes. The flag reports
/// whether the closing quote was present.
pub(crate) fn unquote(text: &str) -> (String, bool) {
    let inner = text.strip_prefix('"').unwrap_or(text);
    let mut value = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(ch) = chars.next() {
        match ch {
            '\\' => value.push(chars.next().unwrap_or('\\')),
            '"' => return (value, true),
            _ => value.push(ch),
        }
    }
    (value, false)
}
