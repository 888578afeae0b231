#![cfg_attr(docsrs, feature(doc_cfg))]

//! A small parsing expression grammar (PEG) engine, and an arithmetic
//! evaluator built on top of it.
//!
//! The engine lives in the [`grammar`] module: grammars are assembled from
//! terminals, sequences, ordered choices, repetitions and labelled
//! non-terminals, and matching a grammar against text yields a
//! [`ParseNode`](grammar::ParseNode) tree. With the `notation` feature
//! (enabled by default) grammars can also be written in classic PEG notation.
//!
//! The [`expression`] module defines the grammar for `+ - * /` expressions
//! with parentheses, and reduces its trees to numbers. [`Evaluator`] ties both
//! together.
//!
//! # Example
//!
//! ```
//! # use peg_calc::{Evaluator, Error};
//! # fn main() -> Result<(), Error> {
//! let evaluator = Evaluator::new(Default::default())?;
//!
//! assert_eq!(evaluator.evaluate("2 + 3 * 4")?, 14.0);
//! assert!(evaluator.evaluate("1 / 0").unwrap_err().is_indeterminate());
//! # Ok(())
//! # }
//! ```

pub mod evaluator;
pub mod expression;
pub mod grammar;
mod utils;

pub use self::evaluator::{
    Evaluator,
    EvaluatorParameters,
};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("io error")]
    Io(#[from] std::io::Error),

    #[error("grammar error")]
    Grammar(#[from] crate::grammar::Error),

    #[error("syntax error")]
    Syntax(#[from] crate::grammar::SyntaxError),

    #[error("evaluation error")]
    Evaluation(#[from] crate::expression::EvalError),

    #[error("input is too long: {length} characters, at most {max} allowed")]
    InputTooLong { length: usize, max: usize },
}

impl Error {
    /// The input parsed, but has no value, e.g. because of a division by
    /// zero.
    pub fn is_indeterminate(&self) -> bool {
        matches!(self, Self::Evaluation(_))
    }
}
