use crate::{
    Expr, Operator, ParseError, ParseErrorKind, Query, Term,
    token::{Token, TokenKind, unquote},
};

/// Deepest nesting of groups and negations the parser builds. Every later
/// pass walks the tree recursively.
pub const MAX_DEPTH: usize = 256;

/// Builds an expression tree from a token sequence.
///
/// Always returns a tree. Problems are repaired and reported in
/// [`Query::errors`], sorted by position.
pub fn parse(tokens: &[Token<'_>]) -> Query {
    Parser::new(tokens).parse()
}

/// Recursive descent over the non-whitespace tokens. Precedence from loosest
/// to tightest: `OR`, `AND`/adjacency, `NOT`, parentheses.
struct Parser<'t, 'a> {
    tokens: Vec<&'t Token<'a>>,
    pos: usize,
    errors: Vec<ParseError>,
    /// Groups and negations enclosing the cursor.
    depth: usize,
    /// `(` dropped at the depth limit whose `)` is still ahead.
    dropped_groups: usize,
}

impl<'t, 'a> Parser<'t, 'a> {
    // Stray closing parens are dropped up front so every `)` the parser sees
    // closes a group it opened or dropped.
    fn new(tokens: &'t [Token<'a>]) -> Self {
        let mut errors = Vec::new();
        let mut depth = 0usize;
        let mut significant = Vec::with_capacity(tokens.len());
        for token in tokens {
            match token.kind {
                TokenKind::Whitespace => continue,
                TokenKind::LParen => depth += 1,
                TokenKind::RParen if depth == 0 => {
                    errors.push(ParseError::new(ParseErrorKind::UnbalancedParen, token.start));
                    continue;
                }
                TokenKind::RParen => depth -= 1,
                _ => {}
            }
            significant.push(token);
        }
        Self {
            tokens: significant,
            pos: 0,
            errors,
            depth: 0,
            dropped_groups: 0,
        }
    }

    fn parse(mut self) -> Query {
        let expr = self.parse_or().unwrap_or(Expr::Empty);
        self.errors.sort_by_key(|err| err.position);
        Query {
            expr,
            errors: self.errors,
        }
    }

    fn parse_or(&mut self) -> Option<Expr> {
        let mut parts = Vec::new();
        loop {
            if let Some(expr) = self.parse_and() {
                parts.push(expr);
            }
            let Some(or) = self.eat(TokenKind::Or) else {
                break;
            };
            if parts.is_empty() || !self.starts_operand() {
                self.error(ParseErrorKind::DanglingOperator, or.start);
            }
        }
        fold(parts, Expr::Or)
    }

    // Adjacency is an implicit AND, so this keeps going until something that
    // ends a conjunction shows up.
    fn parse_and(&mut self) -> Option<Expr> {
        let mut parts = Vec::new();
        loop {
            match self.peek().map(|token| token.kind) {
                Some(TokenKind::RParen) if self.dropped_groups > 0 => {
                    self.advance();
                    self.dropped_groups -= 1;
                }
                None | Some(TokenKind::Or) | Some(TokenKind::RParen) => break,
                Some(TokenKind::And) => {
                    let and = self.advance();
                    if parts.is_empty() || !self.starts_operand() {
                        self.error(ParseErrorKind::DanglingOperator, and.start);
                    }
                }
                Some(_) => {
                    if let Some(expr) = self.parse_not() {
                        parts.push(expr);
                    }
                }
            }
        }
        fold(parts, Expr::And)
    }

    // Negation chains are collected in a loop so a long `NOT NOT ...` run
    // costs no stack.
    fn parse_not(&mut self) -> Option<Expr> {
        let mut negations = 0;
        while let Some(not) = self.eat(TokenKind::Not) {
            if !self.starts_operand() {
                self.error(ParseErrorKind::DanglingOperator, not.start);
                return None;
            }
            if self.depth + negations >= MAX_DEPTH {
                self.error(ParseErrorKind::TooDeep, not.start);
            } else {
                negations += 1;
            }
        }

        self.depth += negations;
        let atom = self.parse_atom();
        self.depth -= negations;
        let mut expr = atom?;
        for _ in 0..negations {
            expr = Expr::Not(Box::new(expr));
        }
        Some(expr)
    }

    // Always consumes at least one token.
    fn parse_atom(&mut self) -> Option<Expr> {
        let token = self.advance();
        match token.kind {
            TokenKind::LParen if self.depth >= MAX_DEPTH => {
                self.error(ParseErrorKind::TooDeep, token.start);
                self.dropped_groups += 1;
                None
            }
            TokenKind::LParen => {
                self.depth += 1;
                let inner = self.parse_or().unwrap_or(Expr::Empty);
                self.depth -= 1;
                if self.eat(TokenKind::RParen).is_none() {
                    self.error(ParseErrorKind::UnbalancedParen, token.start);
                }
                Some(Expr::Group(Box::new(inner)))
            }
            TokenKind::Key => Some(Expr::Term(self.parse_keyed_term(token))),
            TokenKind::Value => Some(Expr::Term(Term::free_text(token.text))),
            TokenKind::QuotedValue => {
                let value = self.quoted_text(token);
                Some(Expr::Term(Term::free_text(value).phrase()))
            }
            TokenKind::Operator | TokenKind::And | TokenKind::Or | TokenKind::Not => {
                self.error(ParseErrorKind::DanglingOperator, token.start);
                None
            }
            TokenKind::RParen | TokenKind::Whitespace => None,
        }
    }

    // The lexer only emits a key when a comparator touches it, but the value
    // and range parts may be missing while the user is still typing.
    fn parse_keyed_term(&mut self, key_token: &Token<'a>) -> Term {
        let key = if key_token.text.starts_with('"') {
            self.quoted_text(key_token)
        } else {
            key_token.text.to_string()
        };

        let Some(op_token) = self.eat_adjacent(key_token, |t| t.comparator().is_some()) else {
            return Term::free_text(key);
        };
        let op = op_token.comparator().unwrap_or(Operator::Eq);

        let Some(value_token) = self.eat_adjacent(op_token, |t| {
            matches!(t.kind, TokenKind::Value | TokenKind::QuotedValue)
        }) else {
            self.error(ParseErrorKind::MissingValue, op_token.end);
            return Term::keyed(key, op, "");
        };

        if value_token.kind == TokenKind::QuotedValue {
            let value = self.quoted_text(value_token);
            return Term::keyed(key, op, value).phrase();
        }

        let low = value_token.text;
        let Some(joiner) = self.eat_adjacent(value_token, Token::is_range_joiner) else {
            return Term::keyed(key, op, low);
        };
        match self.eat_adjacent(joiner, |t| t.kind == TokenKind::Value) {
            Some(high) => Term::range(key, low, high.text),
            None => {
                self.error(ParseErrorKind::IncompleteRange, joiner.start);
                Term::keyed(key, Operator::Eq, low)
            }
        }
    }

    fn quoted_text(&mut self, token: &Token<'_>) -> String {
        let (text, terminated) = unquote(token.text);
        if !terminated {
            self.error(ParseErrorKind::UnterminatedQuote, token.start);
        }
        text
    }

    fn starts_operand(&self) -> bool {
        matches!(
            self.peek().map(|token| token.kind),
            Some(
                TokenKind::Key
                    | TokenKind::Value
                    | TokenKind::QuotedValue
                    | TokenKind::LParen
                    | TokenKind::Not
            )
        )
    }

    fn peek(&self) -> Option<&'t Token<'a>> {
        self.tokens.get(self.pos).copied()
    }

    // Callers only advance after a successful peek.
    fn advance(&mut self) -> &'t Token<'a> {
        let token = self.tokens[self.pos];
        self.pos += 1;
        token
    }

    fn eat(&mut self, kind: TokenKind) -> Option<&'t Token<'a>> {
        let token = self.peek().filter(|token| token.kind == kind)?;
        self.pos += 1;
        Some(token)
    }

    /// Consumes the next token when it touches `prev` and satisfies `accept`.
    fn eat_adjacent(
        &mut self,
        prev: &Token<'_>,
        accept: impl Fn(&Token<'a>) -> bool,
    ) -> Option<&'t Token<'a>> {
        let token = self
            .peek()
            .filter(|token| token.start == prev.end && accept(*token))?;
        self.pos += 1;
        Some(token)
    }

    fn error(&mut self, kind: ParseErrorKind, position: usize) {
        self.errors.push(ParseError::new(kind, position));
    }
}

fn fold(mut parts: Vec<Expr>, combine: fn(Vec<Expr>) -> Expr) -> Option<Expr> {
    match parts.len() {
        0 => None,
        1 => parts.pop(),
        _ => Some(combine(parts)),
    }
}
