//! Recursive PEG matcher.
//!
//! Every rule either matches, producing nodes and a new position, or fails
//! without leaving anything behind: the nodes it pushed are truncated and the
//! caller keeps using the position it started from.

use super::{
    rule::{
        Grammar,
        Label,
        Rule,
        RuleId,
    },
    tree::{
        ParseNode,
        Position,
    },
    SyntaxError,
};

struct Matcher<'g, 'i, L> {
    grammar: &'g Grammar<L>,
    input: &'i str,
    /// Farthest position at which a character was tested and rejected.
    farthest: Position,
}

impl<'g, 'i, L: Label> Matcher<'g, 'i, L> {
    fn new(grammar: &'g Grammar<L>, input: &'i str) -> Self {
        Self {
            grammar,
            input,
            farthest: Position::default(),
        }
    }

    fn match_rule(
        &mut self,
        id: RuleId,
        position: Position,
        out: &mut Vec<ParseNode<L>>,
    ) -> Option<Position> {
        let mark = out.len();
        let result = self.match_inner(id, position, out);
        if result.is_none() {
            out.truncate(mark);
        }
        result
    }

    fn match_inner(
        &mut self,
        id: RuleId,
        position: Position,
        out: &mut Vec<ParseNode<L>>,
    ) -> Option<Position> {
        let grammar = self.grammar;

        match &grammar.rules[id.index()] {
            Rule::Terminal(expected) => self.match_char(position, out, |c| c == *expected),
            Rule::Range { start, end } => {
                self.match_char(position, out, |c| (*start..=*end).contains(&c))
            }
            Rule::Sequence(rules) => {
                let mut position = position;
                for &rule in rules {
                    position = self.match_rule(rule, position, out)?;
                }
                Some(position)
            }
            Rule::OrderedChoice(rules) => {
                rules
                    .iter()
                    .find_map(|&rule| self.match_rule(rule, position, out))
            }
            Rule::Optional(rule) => Some(self.match_rule(*rule, position, out).unwrap_or(position)),
            Rule::ZeroOrMore(rule) => Some(self.repeat(*rule, position, out)),
            Rule::OneOrMore(rule) => {
                let position = self.match_rule(*rule, position, out)?;
                Some(self.repeat(*rule, position, out))
            }
            Rule::NonTerminal { label, body } => {
                let mut children = vec![];
                let end = self.match_rule(*body, position, &mut children)?;
                out.push(ParseNode::branch(
                    Some(label.clone()),
                    children,
                    position,
                    end,
                ));
                Some(end)
            }
        }
    }

    fn match_char(
        &mut self,
        position: Position,
        out: &mut Vec<ParseNode<L>>,
        accept: impl FnOnce(char) -> bool,
    ) -> Option<Position> {
        let next = self
            .input
            .get(position.offset()..)
            .and_then(|rest| rest.chars().next());

        match next {
            Some(c) if accept(c) => {
                let end = position.advance(c);
                out.push(ParseNode::leaf(c, position, end));
                Some(end)
            }
            _ => {
                self.farthest = self.farthest.max(position);
                None
            }
        }
    }

    /// Greedy repetition. Stops at the first failure, or after a repetition
    /// that didn't consume anything.
    fn repeat(
        &mut self,
        rule: RuleId,
        mut position: Position,
        out: &mut Vec<ParseNode<L>>,
    ) -> Position {
        while let Some(next) = self.match_rule(rule, position, out) {
            if next == position {
                break;
            }
            position = next;
        }
        position
    }
}

impl<L: Label> Grammar<L> {
    /// Matches the start rule against a prefix of `input`.
    ///
    /// Input following the matched prefix is not part of the tree; compare
    /// [`ParseNode::end`] with the input length to detect it. Returns `None`
    /// if the start rule doesn't match at all.
    pub fn parse(&self, input: &str) -> Option<ParseNode<L>> {
        self.parse_prefix(input).ok()
    }

    /// Like [`parse`](Self::parse), but the whole input must be matched.
    pub fn parse_complete(&self, input: &str) -> Result<ParseNode<L>, SyntaxError> {
        let tree = self.parse_prefix(input)?;

        if tree.end.offset() < input.len() {
            tracing::trace!(end = %tree.end, len = input.len(), "trailing input");
            return Err(SyntaxError::TrailingInput { position: tree.end });
        }

        Ok(tree)
    }

    /// Like [`parse`](Self::parse), but reports the farthest position reached
    /// when nothing matches.
    pub fn parse_prefix(&self, input: &str) -> Result<ParseNode<L>, SyntaxError> {
        tracing::trace!(input, "parse");

        let mut matcher = Matcher::new(self, input);
        let mut nodes = vec![];
        let start = Position::default();

        let Some(end) = matcher.match_rule(self.start, start, &mut nodes)
        else {
            tracing::trace!(farthest = %matcher.farthest, "no match");
            return Err(SyntaxError::NoMatch {
                position: matcher.farthest,
            });
        };

        let tree = if nodes.len() == 1 {
            nodes.remove(0)
        }
        else {
            ParseNode::branch(None, nodes, start, end)
        };

        tracing::trace!(end = %end, "matched");

        Ok(tree)
    }
}

#[cfg(test)]
mod tests {
    use crate::grammar::{
        GrammarBuilder,
        Position,
        SyntaxError,
    };

    #[test]
    fn it_matches_terminals_and_ranges() {
        let mut builder = GrammarBuilder::default();
        let start = builder.non_terminal("Digit");
        let digit = builder.range('0', '9');
        builder.bind(start, digit).unwrap();
        let grammar = builder.finish(start).unwrap();

        let tree = grammar.parse("7x").unwrap();
        assert_eq!(tree.label(), Some(&"Digit"));
        assert_eq!(tree.text(), "7");
        assert_eq!(tree.end, Position::from(1));
        assert!(grammar.parse("x7").is_none());
        assert!(grammar.parse("").is_none());
    }

    #[test]
    fn it_backtracks_failed_sequences() {
        // S <- 'a' 'b' / 'a' 'c'
        let mut builder = GrammarBuilder::default();
        let s = builder.non_terminal("S");
        let ab = builder.literal("ab");
        let ac = builder.literal("ac");
        let body = builder.ordered_choice([ab, ac]);
        builder.bind(s, body).unwrap();
        let grammar = builder.finish(s).unwrap();

        let tree = grammar.parse("ac").unwrap();
        assert_eq!(tree.text(), "ac");
        assert_eq!(tree.children.len(), 2);
        assert!(tree.children.iter().all(|child| child.is_leaf()));
    }

    #[test]
    fn it_commits_to_the_first_matching_alternative() {
        // S <- 'a' / 'a' 'b'
        let mut builder = GrammarBuilder::default();
        let s = builder.non_terminal("S");
        let a = builder.terminal('a');
        let ab = builder.literal("ab");
        let body = builder.ordered_choice([a, ab]);
        builder.bind(s, body).unwrap();
        let grammar = builder.finish(s).unwrap();

        let tree = grammar.parse("ab").unwrap();
        assert_eq!(tree.text(), "a");
        assert_eq!(
            grammar.parse_complete("ab"),
            Err(SyntaxError::TrailingInput {
                position: Position::from(1)
            })
        );
    }

    #[test]
    fn it_repeats_greedily() {
        // S <- 'x'? [a-c]* 'z'+
        let mut builder = GrammarBuilder::default();
        let s = builder.non_terminal("S");
        let x = builder.terminal('x');
        let maybe_x = builder.optional(x);
        let abc = builder.range('a', 'c');
        let many_abc = builder.zero_or_more(abc);
        let z = builder.terminal('z');
        let some_z = builder.one_or_more(z);
        let body = builder.sequence([maybe_x, many_abc, some_z]);
        builder.bind(s, body).unwrap();
        let grammar = builder.finish(s).unwrap();

        assert_eq!(grammar.parse("z").unwrap().text(), "z");
        assert_eq!(grammar.parse("xabcazz!").unwrap().text(), "xabcazz");
        assert_eq!(grammar.parse("cbzzz").unwrap().children.len(), 5);
        assert!(grammar.parse("xab").is_none());
    }

    #[test]
    fn it_stops_repeating_empty_matches() {
        // S <- ('a'?)*
        let mut builder = GrammarBuilder::default();
        let s = builder.non_terminal("S");
        let a = builder.terminal('a');
        let maybe_a = builder.optional(a);
        let body = builder.zero_or_more(maybe_a);
        builder.bind(s, body).unwrap();
        let grammar = builder.finish(s).unwrap();

        let tree = grammar.parse("b").unwrap();
        assert!(tree.is_empty());
        assert_eq!(grammar.parse("aab").unwrap().text(), "aa");
    }

    #[test]
    fn it_nests_non_terminals() {
        // List <- Item (',' List)?
        // Item <- [a-z]
        let mut builder = GrammarBuilder::default();
        let list = builder.non_terminal("List");
        let item = builder.non_terminal("Item");
        let letter = builder.range('a', 'z');
        builder.bind(item, letter).unwrap();
        let comma = builder.terminal(',');
        let rest = builder.sequence([comma, list]);
        let maybe_rest = builder.optional(rest);
        let body = builder.sequence([item, maybe_rest]);
        builder.bind(list, body).unwrap();
        let grammar = builder.finish(list).unwrap();

        let tree = grammar.parse_complete("a,b").unwrap();
        let labels = tree
            .children
            .iter()
            .map(|child| child.label().copied())
            .collect::<Vec<_>>();
        assert_eq!(labels, vec![Some("Item"), None, Some("List")]);
        assert_eq!(tree.children[2].start, Position::from(2));
    }

    #[test]
    fn it_wraps_anonymous_start_rules() {
        let mut builder = GrammarBuilder::<&str>::default();
        let ab = builder.literal("ab");
        let grammar = builder.finish(ab).unwrap();

        let tree = grammar.parse("ab").unwrap();
        assert_eq!(tree.label(), None);
        assert_eq!(tree.children.len(), 2);
        assert_eq!(tree.text(), "ab");
    }

    #[test]
    fn it_reports_the_farthest_failure() {
        let mut builder = GrammarBuilder::<&str>::default();
        let abc = builder.literal("abc");
        let grammar = builder.finish(abc).unwrap();

        assert_eq!(
            grammar.parse_complete("abx"),
            Err(SyntaxError::NoMatch {
                position: Position::from(2)
            })
        );
    }

    #[test]
    fn it_advances_over_multibyte_characters() {
        let mut builder = GrammarBuilder::<&str>::default();
        let greek = builder.range('α', 'ω');
        let word = builder.one_or_more(greek);
        let grammar = builder.finish(word).unwrap();

        let tree = grammar.parse("βγx").unwrap();
        assert_eq!(tree.text(), "βγ");
        assert_eq!(tree.end, Position::from(4));
    }

    #[test]
    fn it_renders_trees() {
        // Pair <- Digit Digit
        let mut builder = GrammarBuilder::default();
        let pair = builder.non_terminal("Pair");
        let digit = builder.non_terminal("Digit");
        let range = builder.range('0', '9');
        builder.bind(digit, range).unwrap();
        let body = builder.sequence([digit, digit]);
        builder.bind(pair, body).unwrap();
        let grammar = builder.finish(pair).unwrap();

        let rendered = grammar.parse("42").unwrap().to_string();
        assert_eq!(
            rendered,
            "Pair 0..2\n├─ Digit 0..1\n│  └─ '4' @0\n└─ Digit 1..2\n   └─ '2' @1\n"
        );
    }
}
