//! Caller-facing entry point: text in, number out.

use derivative::Derivative;

use crate::{
    expression::{
        self,
        Precedence,
        Symbol,
    },
    grammar::{
        Grammar,
        ParseNode,
    },
    Error,
};

pub const DEFAULT_MAX_INPUT_LENGTH: usize = 1024;

/// Parameters for an [`Evaluator`].
#[derive(Clone, Debug)]
pub struct EvaluatorParameters {
    /// Maximum number of characters, after whitespace is stripped. Nesting
    /// depth of the parse grows with the input, so this also bounds the
    /// recursion depth. `None` for no limit.
    pub max_input_length: Option<usize>,

    /// Remove all whitespace before parsing. The grammar itself has no notion
    /// of whitespace.
    pub strip_whitespace: bool,

    /// Fail with [`SyntaxError::TrailingInput`](crate::grammar::SyntaxError)
    /// if the grammar matches only a prefix of the input. Otherwise the
    /// prefix is evaluated and the rest is ignored.
    pub require_complete: bool,

    pub precedence: Precedence,
}

impl Default for EvaluatorParameters {
    fn default() -> Self {
        Self {
            max_input_length: Some(DEFAULT_MAX_INPUT_LENGTH),
            strip_whitespace: true,
            require_complete: false,
            precedence: Precedence::default(),
        }
    }
}

/// Parses and evaluates arithmetic expressions.
///
/// The grammar is built once in [`Evaluator::new`]. An evaluator holds no
/// per-call state, so a shared reference can be used from many threads.
#[derive(Derivative)]
#[derivative(Debug)]
pub struct Evaluator {
    parameters: EvaluatorParameters,

    #[derivative(Debug = "ignore")]
    grammar: Grammar<Symbol>,
}

impl Evaluator {
    pub fn new(parameters: EvaluatorParameters) -> Result<Self, Error> {
        let grammar = expression::grammar()?;
        tracing::debug!(?parameters, "evaluator ready");

        Ok(Self {
            parameters,
            grammar,
        })
    }

    pub fn parameters(&self) -> &EvaluatorParameters {
        &self.parameters
    }

    pub fn grammar(&self) -> &Grammar<Symbol> {
        &self.grammar
    }

    /// Parses `text` into an expression tree.
    ///
    /// Positions in the tree and in syntax errors refer to the text after
    /// whitespace was stripped.
    pub fn parse(&self, text: &str) -> Result<ParseNode<Symbol>, Error> {
        let text = if self.parameters.strip_whitespace {
            text.split_whitespace().collect::<String>()
        }
        else {
            text.to_owned()
        };

        if let Some(max) = self.parameters.max_input_length {
            let length = text.chars().count();
            if length > max {
                return Err(Error::InputTooLong { length, max });
            }
        }

        let tree = if self.parameters.require_complete {
            self.grammar.parse_complete(&text)?
        }
        else {
            self.grammar.parse_prefix(&text)?
        };

        Ok(tree)
    }

    /// Parses and evaluates `text`.
    pub fn evaluate(&self, text: &str) -> Result<f64, Error> {
        let tree = self.parse(text)?;
        let value = expression::reduce_with(&tree, self.parameters.precedence)?;
        tracing::trace!(value, "evaluated");
        Ok(value)
    }
}
