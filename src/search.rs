use crate::record::LogRecord;
use attr_match::{MatchReport, Matcher};
use loglens_syntax::{
    Expr, ParseError, Query, Token, TokenGroup, group_tokens, parse, serialize, tokenize,
};
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchOptions {
    /// Fields searched by free-text terms, listed first in match results.
    pub default_fields: Vec<String>,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            default_fields: vec!["message".to_string()],
        }
    }
}

/// Everything derived from one query string: parsed once, matched against
/// any number of records.
#[derive(Debug, Clone)]
pub struct SearchState<'q> {
    query: &'q str,
    tokens: Vec<Token<'q>>,
    parsed: Query,
    canonical: String,
    matcher: Matcher,
}

impl<'q> SearchState<'q> {
    pub fn new(query: &'q str, options: &SearchOptions) -> Self {
        let tokens = tokenize(query);
        let parsed = parse(&tokens);
        let canonical = serialize(&parsed.expr);
        let matcher = Matcher::new(&parsed.expr, options.default_fields.iter().cloned());
        debug!(
            query,
            canonical = %canonical,
            errors = parsed.errors.len(),
            "search state built"
        );
        Self {
            query,
            tokens,
            parsed,
            canonical,
            matcher,
        }
    }

    pub fn query(&self) -> &'q str {
        self.query
    }

    pub fn tokens(&self) -> &[Token<'q>] {
        &self.tokens
    }

    /// Token groups for highlighting the search input.
    pub fn groups(&self) -> Vec<TokenGroup<'_, 'q>> {
        group_tokens(&self.tokens)
    }

    pub fn expr(&self) -> &Expr {
        &self.parsed.expr
    }

    pub fn errors(&self) -> &[ParseError] {
        &self.parsed.errors
    }

    /// Canonical query text, suitable for a URL parameter.
    pub fn canonical(&self) -> &str {
        &self.canonical
    }

    pub fn is_empty(&self) -> bool {
        self.parsed.is_empty()
    }

    pub fn matched_attributes(&self, record: &LogRecord) -> MatchReport {
        self.matcher.evaluate(&record.attributes())
    }

    pub fn matches(&self, record: &LogRecord) -> bool {
        self.matcher.matches(&record.attributes())
    }

    /// Records that pass the query, in their original order.
    pub fn filter<'r>(&self, records: &'r [LogRecord]) -> Vec<&'r LogRecord> {
        let kept: Vec<_> = records.iter().filter(|record| self.matches(record)).collect();
        debug!(total = records.len(), kept = kept.len(), "records filtered");
        kept
    }
}
