use std::{
    collections::HashMap,
    str::FromStr,
};

use super::ast::{
    Choice,
    Class,
    ClassRange,
    Grammar,
    Item,
    Name,
    Primary,
    Repetition,
    Sequence,
};
use crate::grammar::{
    Error,
    Grammar as RuleGraph,
    GrammarBuilder,
    Label,
    RuleId,
};

pub(super) struct Compiler<'source, L> {
    names: HashMap<&'source str, RuleId>,
    builder: GrammarBuilder<L>,
}

impl<'source, L: Label + FromStr> Compiler<'source, L> {
    pub fn new() -> Self {
        Self {
            names: HashMap::new(),
            builder: GrammarBuilder::default(),
        }
    }

    pub fn push_ast(&mut self, grammar: &Grammar<'source>) -> Result<(), Error> {
        // declare everything first, so definitions can refer to each other in any
        // order.
        for definition in &grammar.0 {
            if self.names.contains_key(definition.name.as_str()) {
                return Err(Error::AlreadyBound(definition.name.to_string()));
            }
            let label = definition
                .name
                .as_str()
                .parse::<L>()
                .map_err(|_| Error::UnknownLabel(definition.name.to_string()))?;
            let id = self.builder.non_terminal(label);
            self.names.insert(definition.name.as_str(), id);
        }

        for definition in &grammar.0 {
            let body = definition.body.lower(self)?;
            let id = self.get_rule_id(definition.name)?;
            self.builder.bind(id, body)?;
        }

        Ok(())
    }

    pub fn finish(self, start: &str) -> Result<RuleGraph<L>, Error> {
        let start = self
            .names
            .get(start)
            .copied()
            .ok_or_else(|| Error::Undefined(start.to_owned()))?;
        self.builder.finish(start)
    }

    fn get_rule_id(&self, name: Name<'source>) -> Result<RuleId, Error> {
        self.names
            .get(name.as_str())
            .copied()
            .ok_or_else(|| Error::Undefined(name.to_string()))
    }
}

trait Lower<'source> {
    fn lower<L: Label + FromStr>(&self, compiler: &mut Compiler<'source, L>) -> Result<RuleId, Error>;
}

impl<'source> Lower<'source> for Choice<'source> {
    fn lower<L: Label + FromStr>(&self, compiler: &mut Compiler<'source, L>) -> Result<RuleId, Error> {
        let mut alternatives = self
            .0
            .iter()
            .map(|sequence| sequence.lower(compiler))
            .collect::<Result<Vec<_>, _>>()?;

        if alternatives.len() == 1 {
            Ok(alternatives.remove(0))
        }
        else {
            Ok(compiler.builder.ordered_choice(alternatives))
        }
    }
}

impl<'source> Lower<'source> for Sequence<'source> {
    fn lower<L: Label + FromStr>(&self, compiler: &mut Compiler<'source, L>) -> Result<RuleId, Error> {
        let mut items = self
            .0
            .iter()
            .map(|item| item.lower(compiler))
            .collect::<Result<Vec<_>, _>>()?;

        if items.len() == 1 {
            Ok(items.remove(0))
        }
        else {
            Ok(compiler.builder.sequence(items))
        }
    }
}

impl<'source> Lower<'source> for Item<'source> {
    fn lower<L: Label + FromStr>(&self, compiler: &mut Compiler<'source, L>) -> Result<RuleId, Error> {
        let rule = self.primary.lower(compiler)?;

        let rule = match self.repetition {
            None => rule,
            Some(Repetition::Optional) => compiler.builder.optional(rule),
            Some(Repetition::ZeroOrMore) => compiler.builder.zero_or_more(rule),
            Some(Repetition::OneOrMore) => compiler.builder.one_or_more(rule),
        };

        Ok(rule)
    }
}

impl<'source> Lower<'source> for Primary<'source> {
    fn lower<L: Label + FromStr>(&self, compiler: &mut Compiler<'source, L>) -> Result<RuleId, Error> {
        match self {
            Primary::Literal(literal) => {
                let mut chars = literal.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Ok(compiler.builder.terminal(c)),
                    _ => Ok(compiler.builder.literal(literal)),
                }
            }
            Primary::Class(class) => class.lower(compiler),
            Primary::Group(choice) => choice.lower(compiler),
            Primary::Reference(name) => compiler.get_rule_id(*name),
        }
    }
}

impl<'source> Lower<'source> for Class {
    fn lower<L: Label + FromStr>(&self, compiler: &mut Compiler<'source, L>) -> Result<RuleId, Error> {
        if self.negated {
            return Err(Error::Unsupported("negated character class"));
        }

        let mut ranges = self
            .ranges
            .iter()
            .map(|range| {
                match *range {
                    ClassRange::Single(c) => compiler.builder.terminal(c),
                    ClassRange::Range { start, end } => compiler.builder.range(start, end),
                }
            })
            .collect::<Vec<_>>();

        match ranges.len() {
            0 => Err(Error::Unsupported("empty character class")),
            1 => Ok(ranges.remove(0)),
            _ => Ok(compiler.builder.ordered_choice(ranges)),
        }
    }
}
