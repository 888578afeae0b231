//! Rule graphs and the builder that assembles them.
//!
//! Rules are stored in an arena and refer to each other through [`RuleId`]s.
//! Recursive grammars are declared by creating a [`Rule::NonTerminal`]
//! placeholder first and binding its body later, once everything it refers to
//! exists.

use std::{
    collections::HashMap,
    fmt,
};

use super::Error;

/// Bound for the labels carried by non-terminals and their parse nodes.
pub trait Label: Clone + fmt::Debug + fmt::Display + PartialEq {}

impl<T: Clone + fmt::Debug + fmt::Display + PartialEq> Label for T {}

/// Index of a rule in its grammar.
#[derive(Copy, Clone, Debug, Hash, PartialEq, Eq, PartialOrd, Ord, derive_more::Display)]
#[display(fmt = "#{}", _0)]
pub struct RuleId(pub(super) usize);

impl RuleId {
    pub fn index(&self) -> usize {
        self.0
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Rule<L> {
    /// Matches exactly this character.
    Terminal(char),

    /// Matches one character in `start..=end`.
    Range { start: char, end: char },

    Sequence(Vec<RuleId>),

    /// Tries the alternatives in order and commits to the first match.
    OrderedChoice(Vec<RuleId>),

    Optional(RuleId),
    ZeroOrMore(RuleId),
    OneOrMore(RuleId),

    /// Named rule. Its matches are wrapped in a node carrying `label`.
    NonTerminal { label: L, body: RuleId },
}

impl<L> Rule<L> {
    /// Rules this rule refers to directly.
    pub fn children(&self) -> &[RuleId] {
        match self {
            Rule::Terminal(_) | Rule::Range { .. } => &[],
            Rule::Sequence(rules) | Rule::OrderedChoice(rules) => rules,
            Rule::Optional(rule)
            | Rule::ZeroOrMore(rule)
            | Rule::OneOrMore(rule)
            | Rule::NonTerminal { body: rule, .. } => std::slice::from_ref(rule),
        }
    }
}

/// A validated, immutable rule graph with a start rule.
///
/// Build one with [`GrammarBuilder`].
#[derive(Clone, Debug)]
pub struct Grammar<L> {
    pub(super) rules: Vec<Rule<L>>,
    pub(super) start: RuleId,
}

impl<L: Label> Grammar<L> {
    pub fn start(&self) -> RuleId {
        self.start
    }

    pub fn rule(&self, id: RuleId) -> Option<&Rule<L>> {
        self.rules.get(id.0)
    }

    pub fn rules(&self) -> impl Iterator<Item = (RuleId, &Rule<L>)> {
        self.rules
            .iter()
            .enumerate()
            .map(|(index, rule)| (RuleId(index), rule))
    }

    /// Looks up the non-terminal with the given label.
    pub fn find(&self, label: &L) -> Option<RuleId> {
        self.rules().find_map(|(id, rule)| {
            match rule {
                Rule::NonTerminal { label: other, .. } if other == label => Some(id),
                _ => None,
            }
        })
    }

    fn name(&self, id: RuleId) -> String {
        match &self.rules[id.0] {
            Rule::NonTerminal { label, .. } => label.to_string(),
            _ => id.to_string(),
        }
    }

    /// Which rules can match without consuming any input.
    fn nullable(&self) -> Vec<bool> {
        let mut nullable = vec![false; self.rules.len()];
        let mut changed = true;

        while changed {
            changed = false;

            for (index, rule) in self.rules.iter().enumerate() {
                if nullable[index] {
                    continue;
                }

                let is_nullable = match rule {
                    Rule::Terminal(_) | Rule::Range { .. } => false,
                    Rule::Sequence(rules) => rules.iter().all(|id| nullable[id.0]),
                    Rule::OrderedChoice(rules) => rules.iter().any(|id| nullable[id.0]),
                    Rule::Optional(_) | Rule::ZeroOrMore(_) => true,
                    Rule::OneOrMore(rule) | Rule::NonTerminal { body: rule, .. } => {
                        nullable[rule.0]
                    }
                };

                if is_nullable {
                    nullable[index] = true;
                    changed = true;
                }
            }
        }

        nullable
    }

    /// Collects the non-terminals `id` may call before it consumed anything.
    fn leading_calls(&self, id: RuleId, nullable: &[bool], calls: &mut Vec<RuleId>) {
        match &self.rules[id.0] {
            Rule::Terminal(_) | Rule::Range { .. } => {}
            Rule::Sequence(rules) => {
                for &rule in rules {
                    self.leading_calls(rule, nullable, calls);
                    if !nullable[rule.0] {
                        break;
                    }
                }
            }
            Rule::OrderedChoice(rules) => {
                for &rule in rules {
                    self.leading_calls(rule, nullable, calls);
                }
            }
            Rule::Optional(rule) | Rule::ZeroOrMore(rule) | Rule::OneOrMore(rule) => {
                self.leading_calls(*rule, nullable, calls);
            }
            Rule::NonTerminal { .. } => calls.push(id),
        }
    }

    fn check_left_recursion(&self) -> Result<(), Error> {
        let nullable = self.nullable();

        let mut calls = HashMap::new();
        for (id, rule) in self.rules() {
            if let Rule::NonTerminal { body, .. } = rule {
                let mut leading = vec![];
                self.leading_calls(*body, &nullable, &mut leading);
                calls.insert(id, leading);
            }
        }

        let mut visits = vec![Visit::New; self.rules.len()];
        for &id in calls.keys() {
            self.find_cycle(id, &calls, &mut visits)?;
        }

        Ok(())
    }

    fn find_cycle(
        &self,
        id: RuleId,
        calls: &HashMap<RuleId, Vec<RuleId>>,
        visits: &mut [Visit],
    ) -> Result<(), Error> {
        match visits[id.0] {
            Visit::Done => return Ok(()),
            Visit::Active => return Err(Error::LeftRecursion(self.name(id))),
            Visit::New => {}
        }

        visits[id.0] = Visit::Active;
        for &callee in calls.get(&id).into_iter().flatten() {
            self.find_cycle(callee, calls, visits)?;
        }
        visits[id.0] = Visit::Done;

        Ok(())
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Visit {
    New,
    Active,
    Done,
}

enum Slot<L> {
    Placeholder(L),
    Ready(Rule<L>),
}

/// Assembles a [`Grammar`] rule by rule.
///
/// Combinator methods return the id of the new rule, so larger rules are
/// built from the ids of smaller ones. Non-terminals are declared with
/// [`non_terminal`](Self::non_terminal) and bound with [`bind`](Self::bind),
/// which allows them to be referenced before their body exists.
pub struct GrammarBuilder<L> {
    rules: Vec<Slot<L>>,
}

impl<L> Default for GrammarBuilder<L> {
    fn default() -> Self {
        Self { rules: vec![] }
    }
}

impl<L: Label> GrammarBuilder<L> {
    fn push(&mut self, rule: Rule<L>) -> RuleId {
        let id = RuleId(self.rules.len());
        self.rules.push(Slot::Ready(rule));
        id
    }

    pub fn terminal(&mut self, c: char) -> RuleId {
        self.push(Rule::Terminal(c))
    }

    pub fn range(&mut self, start: char, end: char) -> RuleId {
        self.push(Rule::Range { start, end })
    }

    /// Sequence of one terminal per character of `s`.
    pub fn literal(&mut self, s: &str) -> RuleId {
        let rules = s.chars().map(|c| self.terminal(c)).collect();
        self.push(Rule::Sequence(rules))
    }

    pub fn sequence(&mut self, rules: impl IntoIterator<Item = RuleId>) -> RuleId {
        let rules = rules.into_iter().collect();
        self.push(Rule::Sequence(rules))
    }

    pub fn ordered_choice(&mut self, rules: impl IntoIterator<Item = RuleId>) -> RuleId {
        let rules = rules.into_iter().collect();
        self.push(Rule::OrderedChoice(rules))
    }

    pub fn optional(&mut self, rule: RuleId) -> RuleId {
        self.push(Rule::Optional(rule))
    }

    pub fn zero_or_more(&mut self, rule: RuleId) -> RuleId {
        self.push(Rule::ZeroOrMore(rule))
    }

    pub fn one_or_more(&mut self, rule: RuleId) -> RuleId {
        self.push(Rule::OneOrMore(rule))
    }

    /// Declares a non-terminal whose body is bound later.
    pub fn non_terminal(&mut self, label: L) -> RuleId {
        let id = RuleId(self.rules.len());
        self.rules.push(Slot::Placeholder(label));
        id
    }

    /// Binds the body of a non-terminal. Every non-terminal must be bound
    /// exactly once.
    pub fn bind(&mut self, id: RuleId, body: RuleId) -> Result<(), Error> {
        let slot = self.rules.get_mut(id.0).ok_or(Error::InvalidRule(id))?;

        match slot {
            Slot::Placeholder(label) => {
                let label = label.clone();
                *slot = Slot::Ready(Rule::NonTerminal { label, body });
                Ok(())
            }
            Slot::Ready(Rule::NonTerminal { label, .. }) => {
                Err(Error::AlreadyBound(label.to_string()))
            }
            Slot::Ready(_) => Err(Error::NotANonTerminal(id)),
        }
    }

    /// Validates the rule graph and freezes it into a [`Grammar`].
    pub fn finish(self, start: RuleId) -> Result<Grammar<L>, Error> {
        let n_rules = self.rules.len();
        let check_id = |id: RuleId| {
            if id.0 < n_rules {
                Ok(())
            }
            else {
                Err(Error::InvalidRule(id))
            }
        };

        check_id(start)?;

        let rules = self
            .rules
            .into_iter()
            .map(|slot| {
                let rule = match slot {
                    Slot::Placeholder(label) => return Err(Error::Unbound(label.to_string())),
                    Slot::Ready(rule) => rule,
                };

                if let Rule::Range { start, end } = rule {
                    if start > end {
                        return Err(Error::InvalidRange { start, end });
                    }
                }

                for &id in rule.children() {
                    check_id(id)?;
                }

                Ok(rule)
            })
            .collect::<Result<Vec<_>, _>>()?;

        let grammar = Grammar { rules, start };
        grammar.check_left_recursion()?;

        tracing::debug!(n_rules, start = %start, "grammar built");

        Ok(grammar)
    }
}
