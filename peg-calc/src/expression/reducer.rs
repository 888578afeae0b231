//! Reduces an expression parse tree to a number.
//!
//! The right-recursive tree is first flattened into a chain of links, each
//! holding a value and the operator combining it with the next link. The
//! chain is then folded in passes, one per precedence class. Every pass scans
//! the chain left to right and collapses each link whose operator belongs to
//! that class with its successor.
//!
//! Addition and subtraction are folded in two separate passes, additions
//! first. This is not left-to-right arithmetic: `10-3+2` evaluates to
//! `10-(3+2) = 5`. See [`Precedence`] for the pass tables.

use std::fmt;

use itertools::Itertools;

use super::Symbol;
use crate::grammar::ParseNode;

#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum EvalError {
    #[error("division by zero")]
    DivisionByZero,

    #[error("invalid number: {0}")]
    InvalidNumber(String),

    #[error("unknown operator: {0:?}")]
    UnknownOperator(char),

    #[error("expected an operator")]
    MissingOperator,

    #[error("expression is empty")]
    Empty,
}

#[derive(Copy, Clone, Debug, Hash, PartialEq, Eq, derive_more::Display)]
pub enum Operator {
    #[display(fmt = "*")]
    Multiply,
    #[display(fmt = "/")]
    Divide,
    #[display(fmt = "+")]
    Add,
    #[display(fmt = "-")]
    Subtract,
}

impl Operator {
    /// All operators, in the order the grammar tries them.
    pub const ALL: [Operator; 4] = [
        Operator::Subtract,
        Operator::Add,
        Operator::Multiply,
        Operator::Divide,
    ];

    pub fn from_char(c: char) -> Option<Self> {
        match c {
            '*' => Some(Self::Multiply),
            '/' => Some(Self::Divide),
            '+' => Some(Self::Add),
            '-' => Some(Self::Subtract),
            _ => None,
        }
    }

    pub fn symbol(&self) -> char {
        match self {
            Self::Multiply => '*',
            Self::Divide => '/',
            Self::Add => '+',
            Self::Subtract => '-',
        }
    }

    pub fn apply(&self, lhs: f64, rhs: f64) -> Result<f64, EvalError> {
        match self {
            Self::Multiply => Ok(lhs * rhs),
            Self::Divide if rhs == 0.0 => Err(EvalError::DivisionByZero),
            Self::Divide => Ok(lhs / rhs),
            Self::Add => Ok(lhs + rhs),
            Self::Subtract => Ok(lhs - rhs),
        }
    }
}

impl TryFrom<char> for Operator {
    type Error = EvalError;

    fn try_from(c: char) -> Result<Self, Self::Error> {
        Self::from_char(c).ok_or(EvalError::UnknownOperator(c))
    }
}

/// Order in which operators are folded.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Precedence {
    /// `*` and `/` together, then `+`, then `-`.
    Grouped,

    /// `*`, then `/`, then `+`, then `-`, one pass each. `8/2*2` evaluates to
    /// `8/(2*2)`.
    PerOperator,
}

impl Precedence {
    pub fn passes(&self) -> &'static [&'static [Operator]] {
        use Operator::*;

        match self {
            Self::Grouped => &[&[Multiply, Divide], &[Add], &[Subtract]],
            Self::PerOperator => &[&[Multiply], &[Divide], &[Add], &[Subtract]],
        }
    }
}

impl Default for Precedence {
    fn default() -> Self {
        Self::Grouped
    }
}

#[derive(Copy, Clone, Debug, PartialEq)]
struct Link {
    value: f64,
    /// Combines this link with the next one. `None` on the last link.
    operator: Option<Operator>,
}

impl fmt::Display for Link {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.operator {
            Some(operator) => write!(f, "({} {})", self.value, operator),
            None => write!(f, "({})", self.value),
        }
    }
}

#[derive(Clone, Debug, Default)]
struct Chain(Vec<Link>);

impl Chain {
    /// Walks down the right spine of an expression, pushing one link per
    /// operand.
    fn flatten(&mut self, mut node: &ParseNode<Symbol>, precedence: Precedence) -> Result<(), EvalError> {
        loop {
            match (node.label, node.children.as_slice()) {
                (Some(Symbol::Expression), [operand, operator, rest, ..]) => {
                    let value = reduce_with(operand, precedence)?;
                    let operator = operator.value.ok_or(EvalError::MissingOperator)?;
                    self.0.push(Link {
                        value,
                        operator: Some(operator.try_into()?),
                    });
                    node = rest;
                }
                (Some(Symbol::Parentheses), [_, inner, ..]) => {
                    let value = reduce_with(inner, precedence)?;
                    self.0.push(Link {
                        value,
                        operator: None,
                    });
                    return Ok(());
                }
                (_, [operand, ..]) => {
                    let value = reduce_with(operand, precedence)?;
                    self.0.push(Link {
                        value,
                        operator: None,
                    });
                    return Ok(());
                }
                (_, []) => return Ok(()),
            }
        }
    }

    fn fold(mut self, precedence: Precedence) -> Result<f64, EvalError> {
        tracing::trace!(chain = %self, "fold");

        for pass in precedence.passes() {
            let mut i = 0;
            while i + 1 < self.0.len() {
                match self.0[i].operator {
                    Some(operator) if pass.contains(&operator) => {
                        let next = self.0.remove(i + 1);
                        let link = &mut self.0[i];
                        link.value = operator.apply(link.value, next.value)?;
                        link.operator = next.operator;
                    }
                    _ => i += 1,
                }
            }
        }

        self.0.first().map(|link| link.value).ok_or(EvalError::Empty)
    }
}

impl fmt::Display for Chain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.iter().format(" "))
    }
}

/// Evaluates a tree produced by the expression grammar, with the default
/// [`Precedence`].
pub fn reduce(node: &ParseNode<Symbol>) -> Result<f64, EvalError> {
    reduce_with(node, Precedence::default())
}

pub fn reduce_with(node: &ParseNode<Symbol>, precedence: Precedence) -> Result<f64, EvalError> {
    if node.label == Some(Symbol::Number) {
        let text = node.text();
        return text
            .parse::<f64>()
            .map_err(|_| EvalError::InvalidNumber(text));
    }

    let mut chain = Chain::default();
    chain.flatten(node, precedence)?;
    chain.fold(precedence)
}
