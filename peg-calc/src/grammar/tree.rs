use std::fmt;

use crate::utils::IsLast;

/// Byte offset into the parsed input.
#[derive(
    Copy,
    Clone,
    Debug,
    Default,
    Hash,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    derive_more::Display,
    derive_more::From,
    derive_more::Into,
)]
pub struct Position(usize);

impl Position {
    pub fn offset(&self) -> usize {
        self.0
    }

    pub(super) fn advance(self, c: char) -> Self {
        Self(self.0 + c.len_utf8())
    }
}

/// A node of the tree produced by a successful match.
///
/// Terminals produce leaves carrying the matched character. Non-terminals
/// produce nodes carrying their label. Anonymous combinators don't produce
/// nodes of their own: their children are attached to the closest enclosing
/// non-terminal, in input order.
#[derive(Clone, Debug, PartialEq)]
pub struct ParseNode<L> {
    pub label: Option<L>,
    pub value: Option<char>,
    pub children: Vec<ParseNode<L>>,
    pub start: Position,
    pub end: Position,
}

impl<L> ParseNode<L> {
    pub(super) fn leaf(value: char, start: Position, end: Position) -> Self {
        Self {
            label: None,
            value: Some(value),
            children: vec![],
            start,
            end,
        }
    }

    pub(super) fn branch(
        label: Option<L>,
        children: Vec<ParseNode<L>>,
        start: Position,
        end: Position,
    ) -> Self {
        Self {
            label,
            value: None,
            children,
            start,
            end,
        }
    }

    pub fn label(&self) -> Option<&L> {
        self.label.as_ref()
    }

    pub fn is_leaf(&self) -> bool {
        self.value.is_some()
    }

    /// Number of input bytes this node spans.
    pub fn len(&self) -> usize {
        self.end.offset() - self.start.offset()
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Concatenation of all leaf characters below this node.
    pub fn text(&self) -> String {
        let mut text = String::with_capacity(self.len());
        self.push_text(&mut text);
        text
    }

    fn push_text(&self, text: &mut String) {
        if let Some(c) = self.value {
            text.push(c);
        }
        for child in &self.children {
            child.push_text(text);
        }
    }
}

impl<L: fmt::Display> ParseNode<L> {
    fn write_tree(&self, f: &mut fmt::Formatter<'_>, lead: &str, indent: &str) -> fmt::Result {
        match (&self.label, self.value) {
            (_, Some(c)) => writeln!(f, "{lead}{c:?} @{}", self.start)?,
            (Some(label), None) => writeln!(f, "{lead}{label} {}..{}", self.start, self.end)?,
            (None, None) => writeln!(f, "{lead}* {}..{}", self.start, self.end)?,
        }

        for (child, is_last) in IsLast::new(self.children.iter()) {
            let (branch, rest) = if is_last {
                ("└─ ", "   ")
            }
            else {
                ("├─ ", "│  ")
            };
            child.write_tree(f, &format!("{indent}{branch}"), &format!("{indent}{rest}"))?;
        }

        Ok(())
    }
}

impl<L: fmt::Display> fmt::Display for ParseNode<L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_tree(f, "", "")
    }
}
