//! Error types for TabCode scanning and parsing.
//!
//! Two kinds of failure can come out of the core: a lexical error (no
//! token pattern matches at the current offset) and a grammar error
//! (the token stream violates tab-word structure). Both abort the
//! parse; there is no partial recovery inside the library. Callers
//! that process batches decide whether to halt or tally failures.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum TabError {
    /// No token pattern matched and the offending character does not
    /// open a comment.
    #[error("Unexpected symbol '{symbol}' at position {index}")]
    Scan { symbol: char, index: usize },

    /// A comment's braces never rebalanced before end of input. The
    /// index is the position of the unmatched opening brace.
    #[error("Unbalanced comment brace at position {index}")]
    UnbalancedComment { index: usize },

    /// The token stream broke a grammar rule: a misplaced rhythm flag,
    /// a duplicate or dangling course reference, an orphaned
    /// decoration, an unexpected token kind, or malformed ruleset
    /// markup. Carries the offending token text when one is available.
    #[error("Grammar error: {message}")]
    Grammar {
        message: String,
        token: Option<String>,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl TabError {
    pub(crate) fn grammar(message: &str, token: Option<&str>) -> Self {
        match token {
            Some(code) => TabError::Grammar {
                message: format!("{message}: {code}"),
                token: Some(code.to_string()),
            },
            None => TabError::Grammar {
                message: message.to_string(),
                token: None,
            },
        }
    }
}
