//! Parsing expression grammar engine.
//!
//! Grammars are rule graphs assembled with a [`GrammarBuilder`], or written
//! in PEG notation and compiled with the [`notation`] module. A finished
//! [`Grammar`] is immutable and can be shared between threads; every call to
//! [`Grammar::parse`] builds its own [`ParseNode`] tree.
//!
//! # Example
//!
//! ```
//! # use peg_calc::grammar::{GrammarBuilder, Error};
//! # fn main() -> Result<(), Error> {
//! // Word <- [a-z]+
//! let mut builder = GrammarBuilder::default();
//! let word = builder.non_terminal("Word");
//! let letter = builder.range('a', 'z');
//! let letters = builder.one_or_more(letter);
//! builder.bind(word, letters)?;
//! let grammar = builder.finish(word)?;
//!
//! let tree = grammar.parse("hello world").unwrap();
//! assert_eq!(tree.text(), "hello");
//! # Ok(())
//! # }
//! ```

mod matcher;
#[cfg_attr(docsrs, doc(cfg(feature = "notation")))]
#[cfg(feature = "notation")]
pub mod notation;
mod rule;
mod tree;

pub use self::{
    rule::{
        Grammar,
        GrammarBuilder,
        Label,
        Rule,
        RuleId,
    },
    tree::{
        ParseNode,
        Position,
    },
};

/// Errors in the construction of a grammar.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("rule '{0}' is undefined")]
    Undefined(String),

    #[error("non-terminal '{0}' is bound more than once")]
    AlreadyBound(String),

    #[error("non-terminal '{0}' was never bound")]
    Unbound(String),

    #[error("rule {0} is not a non-terminal")]
    NotANonTerminal(RuleId),

    #[error("rule {0} does not belong to this grammar")]
    InvalidRule(RuleId),

    #[error("invalid character range: {start:?} > {end:?}")]
    InvalidRange { start: char, end: char },

    #[error("non-terminal '{0}' is left-recursive")]
    LeftRecursion(String),

    #[error("'{0}' is not a valid label for this grammar")]
    UnknownLabel(String),

    #[error("unsupported: {0}")]
    Unsupported(&'static str),

    #[error("parse error:\n{0}")]
    Parse(String),
}

/// Input that doesn't match a grammar.
#[derive(Copy, Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum SyntaxError {
    #[error("unexpected input at position {position}")]
    NoMatch { position: Position },

    #[error("trailing input at position {position}")]
    TrailingInput { position: Position },
}

impl SyntaxError {
    pub fn position(&self) -> Position {
        match self {
            Self::NoMatch { position } | Self::TrailingInput { position } => *position,
        }
    }
}
