//! Arithmetic expressions: `+ - * /` over decimal numbers, with parentheses.
//!
//! The grammar is right-recursive. An expression is an operand, optionally
//! followed by an operator and another expression. There is no whitespace
//! handling; callers strip whitespace first.
//!
//! Evaluation is done by the [`reduce`] function, see the [`reducer`] module
//! for how operator precedence is applied.

pub mod reducer;

use std::str::FromStr;

pub use self::reducer::{
    reduce,
    reduce_with,
    EvalError,
    Operator,
    Precedence,
};
use crate::grammar::{
    self,
    Grammar,
    GrammarBuilder,
};

/// The expression grammar in PEG notation. Compiles to the same grammar as
/// [`grammar`].
pub const NOTATION: &str = r#"
Start       <- Expression
Expression  <- (Parentheses / Number) ([-+*/] Expression)?
Parentheses <- '(' Expression ')'
Number      <- [0-9]+ '.'? [0-9]*
"#;

/// Labels of the expression grammar's non-terminals.
#[derive(Copy, Clone, Debug, Hash, PartialEq, Eq, derive_more::Display)]
pub enum Symbol {
    Start,
    Expression,
    Parentheses,
    Number,
}

impl FromStr for Symbol {
    type Err = grammar::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Start" => Ok(Self::Start),
            "Expression" => Ok(Self::Expression),
            "Parentheses" => Ok(Self::Parentheses),
            "Number" => Ok(Self::Number),
            _ => Err(grammar::Error::UnknownLabel(s.to_owned())),
        }
    }
}

/// Builds the expression grammar.
pub fn grammar() -> Result<Grammar<Symbol>, grammar::Error> {
    let mut builder = GrammarBuilder::default();

    let start = builder.non_terminal(Symbol::Start);
    let expression = builder.non_terminal(Symbol::Expression);
    let parentheses = builder.non_terminal(Symbol::Parentheses);
    let number = builder.non_terminal(Symbol::Number);

    builder.bind(start, expression)?;

    // (Parentheses / Number) ([-+*/] Expression)?
    let operand = builder.ordered_choice([parentheses, number]);
    let operators = Operator::ALL
        .iter()
        .map(|operator| builder.terminal(operator.symbol()))
        .collect::<Vec<_>>();
    let operator = builder.ordered_choice(operators);
    let rest = builder.sequence([operator, expression]);
    let rest = builder.optional(rest);
    let body = builder.sequence([operand, rest]);
    builder.bind(expression, body)?;

    // '(' Expression ')'
    let open = builder.terminal('(');
    let close = builder.terminal(')');
    let body = builder.sequence([open, expression, close]);
    builder.bind(parentheses, body)?;

    // [0-9]+ '.'? [0-9]*
    let digit = builder.range('0', '9');
    let integer = builder.one_or_more(digit);
    let dot = builder.terminal('.');
    let dot = builder.optional(dot);
    let fraction = builder.zero_or_more(digit);
    let body = builder.sequence([integer, dot, fraction]);
    builder.bind(number, body)?;

    builder.finish(start)
}
