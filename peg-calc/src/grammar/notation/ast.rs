//! Syntax tree of a grammar written in PEG notation.

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Grammar<'source>(pub Vec<Definition<'source>>);

/// `name <- choice`
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Definition<'source> {
    pub name: Name<'source>,
    pub body: Choice<'source>,
}

#[derive(
    Copy,
    Clone,
    Debug,
    Hash,
    PartialEq,
    Eq,
    derive_more::Display,
    derive_more::From,
    derive_more::AsRef,
)]
pub struct Name<'source>(pub(super) &'source str);

impl<'source> Name<'source> {
    pub fn as_str(&self) -> &'source str {
        self.0
    }
}

/// Alternatives separated by `/`, tried in order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Choice<'source>(pub Vec<Sequence<'source>>);

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Sequence<'source>(pub Vec<Item<'source>>);

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Item<'source> {
    pub primary: Primary<'source>,
    pub repetition: Option<Repetition>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Repetition {
    /// `?`
    Optional,
    /// `*`
    ZeroOrMore,
    /// `+`
    OneOrMore,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Primary<'source> {
    Literal(String),
    Class(Class),
    Group(Box<Choice<'source>>),
    Reference(Name<'source>),
}

/// `[a-z_]`
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Class {
    pub ranges: Vec<ClassRange>,
    pub negated: bool,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ClassRange {
    Single(char),
    Range { start: char, end: char },
}
