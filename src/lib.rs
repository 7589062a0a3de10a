//! Log search for the terminal: query syntax, attribute matching and the
//! record model that feeds them.
//!
//! ```
//! use loglens::{LogRecord, SearchOptions, SearchState};
//!
//! let state = SearchState::new("level:error timeout", &SearchOptions::default());
//! let record: LogRecord =
//!     serde_json::from_str(r#"{"level":"error","message":"upstream timeout"}"#).unwrap();
//! assert!(state.matches(&record));
//! assert_eq!(state.canonical(), "level:error AND timeout");
//! ```

mod record;
mod search;

pub use record::{load_records, read_records, LogRecord};
pub use search::{SearchOptions, SearchState};

pub use attr_match::{
    match_attributes, AttrValue, Attributes, MatchError, MatchReport, MatchedAttribute, Matcher,
    Span,
};
pub use loglens_syntax::{
    group_tokens, parse, parse_query, serialize, tokenize, Expr, GroupKind, Operator, ParseError,
    ParseErrorKind, Query, Term, Token, TokenGroup, TokenKind,
};
