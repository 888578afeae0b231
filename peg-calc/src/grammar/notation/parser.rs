use nom::{
    branch::alt,
    bytes::complete::{
        escaped_transform,
        is_not,
        tag,
        take,
        take_while1,
    },
    character::complete::{
        char,
        multispace0,
        none_of,
    },
    combinator::{
        all_consuming,
        cut,
        map,
        not,
        opt,
        peek,
        value,
    },
    error::{
        context,
        ErrorKind,
        FromExternalError,
        ParseError,
        VerboseError,
    },
    multi::{
        many0,
        many0_count,
        many1,
        separated_list1,
    },
    sequence::{
        delimited,
        pair,
        preceded,
        terminated,
        tuple,
    },
    IResult,
    Parser,
};

use super::ast::{
    Choice,
    Class,
    ClassRange,
    Definition,
    Grammar,
    Item,
    Name,
    Primary,
    Repetition,
    Sequence,
};

type Res<'a, U> = IResult<&'a str, U, VerboseError<&'a str>>;

/// consumes a single comment
fn consume_comment(input: &str) -> Res<()> {
    value((), pair(char('#'), opt(is_not("\r\n"))))(input)
}

/// consumes whitespace and comments
fn consume_wsc(input: &str) -> Res<()> {
    value(
        (),
        terminated(
            many0_count(preceded(multispace0, consume_comment)),
            multispace0,
        ),
    )(input)
}

/// consumes all whitespace and comments before calling the parser `f`
fn wsc<'a, U>(f: impl FnMut(&'a str) -> Res<'a, U>) -> impl FnMut(&'a str) -> Res<'a, U> {
    preceded(consume_wsc, f)
}

pub(super) fn parse_grammar_complete(input: &str) -> Res<Grammar> {
    all_consuming(terminated(parse_grammar, consume_wsc))(input)
}

fn parse_grammar(input: &str) -> Res<Grammar> {
    context("grammar", map(many0(parse_definition), Grammar))(input)
}

fn parse_definition(input: &str) -> Res<Definition> {
    context(
        "definition",
        map(
            tuple((parse_name, wsc(tag("<-")), cut(parse_choice))),
            |(name, _, body)| Definition { name, body },
        ),
    )(input)
}

fn parse_name(input: &str) -> Res<Name> {
    context(
        "name",
        map(
            wsc(take_while1(|c: char| c.is_alphanumeric() || c == '_')),
            Name,
        ),
    )(input)
}

fn parse_choice(input: &str) -> Res<Choice> {
    context(
        "choice",
        map(separated_list1(wsc(char('/')), parse_sequence), Choice),
    )(input)
}

fn parse_sequence(input: &str) -> Res<Sequence> {
    context("sequence", map(many1(parse_item), Sequence))(input)
}

fn parse_item(input: &str) -> Res<Item> {
    context(
        "item",
        map(
            tuple((parse_primary, opt(parse_repetition))),
            |(primary, repetition)| Item {
                primary,
                repetition,
            },
        ),
    )(input)
}

fn parse_repetition(input: &str) -> Res<Repetition> {
    context(
        "repetition",
        wsc(alt((
            value(Repetition::Optional, char('?')),
            value(Repetition::ZeroOrMore, char('*')),
            value(Repetition::OneOrMore, char('+')),
        ))),
    )(input)
}

fn parse_primary(input: &str) -> Res<Primary> {
    context(
        "primary",
        alt((
            map(parse_literal, Primary::Literal),
            map(parse_class, Primary::Class),
            map(parse_group, |choice| Primary::Group(Box::new(choice))),
            map(parse_reference, Primary::Reference),
        )),
    )(input)
}

/// a name that doesn't start the next definition
fn parse_reference(input: &str) -> Res<Name> {
    terminated(parse_name, peek(not(wsc(tag("<-")))))(input)
}

fn parse_group(input: &str) -> Res<Choice> {
    delimited(wsc(char('(')), cut(parse_choice), cut(wsc(char(')'))))(input)
}

fn parse_literal(input: &str) -> Res<String> {
    context(
        "literal",
        wsc(alt((
            delimited(
                char('\''),
                parse_quoted_content("'\r\n\\"),
                cut(char('\'')),
            ),
            delimited(
                char('"'),
                parse_quoted_content("\"\r\n\\"),
                cut(char('"')),
            ),
        ))),
    )(input)
}

fn parse_quoted_content<'a>(forbidden: &'static str) -> impl FnMut(&'a str) -> Res<'a, String> {
    map(
        opt(escaped_transform(none_of(forbidden), '\\', parse_escape)),
        Option::unwrap_or_default,
    )
}

fn parse_escape(input: &str) -> Res<char> {
    context(
        "escape",
        alt((
            char('\\'),
            char('\''),
            char('"'),
            value('\n', char('n')),
            value('\r', char('r')),
            value('\t', char('t')),
            parse_escaped_unicode,
        )),
    )(input)
}

fn parse_escaped_unicode(input: &str) -> Res<char> {
    let (input, code_point) = alt((
        preceded(char('x'), take(2usize).and_then(hex_u32)),
        preceded(char('u'), take(4usize).and_then(hex_u32)),
    ))(input)?;
    let c = char::from_u32(code_point).ok_or_else(|| {
        nom::Err::Error(VerboseError::from_error_kind(
            input,
            ErrorKind::EscapedTransform,
        ))
    })?;
    Ok((input, c))
}

fn hex_u32(input: &str) -> Res<u32> {
    let x = u32::from_str_radix(input, 16).map_err(|e| {
        nom::Err::Error(VerboseError::from_external_error(
            input,
            ErrorKind::HexDigit,
            e,
        ))
    })?;
    Ok((input, x))
}

fn parse_class(input: &str) -> Res<Class> {
    context(
        "character class",
        wsc(delimited(char('['), cut(parse_class_body), cut(char(']')))),
    )(input)
}

fn parse_class_body(input: &str) -> Res<Class> {
    let (input, caret) = opt(char('^'))(input)?;
    // a dash is literal as the first or last character
    let (input, leading_dash) = opt(char('-'))(input)?;
    let (input, mut ranges) = many0(parse_class_range)(input)?;
    let (input, trailing_dash) = opt(char('-'))(input)?;

    if leading_dash.is_some() {
        ranges.insert(0, ClassRange::Single('-'));
    }
    if trailing_dash.is_some() {
        ranges.push(ClassRange::Single('-'));
    }

    Ok((
        input,
        Class {
            ranges,
            negated: caret.is_some(),
        },
    ))
}

fn parse_class_range(input: &str) -> Res<ClassRange> {
    let (input, first) = parse_class_char(input)?;
    let (input, second) = opt(preceded(char('-'), parse_class_char))(input)?;

    let range = match second {
        Some(end) => ClassRange::Range { start: first, end },
        None => ClassRange::Single(first),
    };

    Ok((input, range))
}

fn parse_class_char(input: &str) -> Res<char> {
    alt((
        preceded(char('\\'), parse_class_escape),
        none_of("]-\\\r\n"),
    ))(input)
}

fn parse_class_escape(input: &str) -> Res<char> {
    context(
        "class escape",
        alt((parse_escape, char('-'), char(']'), char('['), char('^'))),
    )(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(primary: Primary, repetition: Option<Repetition>) -> Item {
        Item {
            primary,
            repetition,
        }
    }

    #[test]
    fn it_parses_class_ranges() {
        assert_eq!(
            parse_class_range("a-z").unwrap().1,
            ClassRange::Range {
                start: 'a',
                end: 'z'
            }
        );
        assert_eq!(
            parse_class_range("a-\\-").unwrap().1,
            ClassRange::Range {
                start: 'a',
                end: '-'
            }
        );
        assert_eq!(parse_class_range("a").unwrap().1, ClassRange::Single('a'));
    }

    #[test]
    fn it_parses_classes() {
        assert_eq!(
            parse_class("[0-9a-f]").unwrap().1,
            Class {
                ranges: vec![
                    ClassRange::Range {
                        start: '0',
                        end: '9'
                    },
                    ClassRange::Range {
                        start: 'a',
                        end: 'f'
                    },
                ],
                negated: false,
            }
        );

        assert_eq!(
            parse_class("[^\\]]").unwrap().1,
            Class {
                ranges: vec![ClassRange::Single(']')],
                negated: true,
            }
        );
    }

    #[test]
    fn it_keeps_dashes_at_the_edges_of_classes() {
        assert_eq!(
            parse_class("[-+*/]").unwrap().1.ranges,
            vec![
                ClassRange::Single('-'),
                ClassRange::Single('+'),
                ClassRange::Single('*'),
                ClassRange::Single('/'),
            ]
        );
        assert_eq!(
            parse_class("[+-]").unwrap().1.ranges,
            vec![ClassRange::Single('+'), ClassRange::Single('-')]
        );
    }

    #[test]
    fn it_fails_for_unterminated_classes() {
        assert!(parse_class("[a-z").is_err());
    }

    #[test]
    fn it_parses_literals() {
        assert_eq!(parse_literal("'hello'").unwrap().1, "hello");
        assert_eq!(parse_literal("\"it's\"").unwrap().1, "it's");
        assert_eq!(parse_literal("''").unwrap().1, "");
        assert_eq!(
            parse_literal("'\\'\\n\\t\\\\'").unwrap().1,
            "'\n\t\\"
        );
        assert_eq!(parse_literal("'\\x41\\u00e9'").unwrap().1, "Aé");

        assert!(parse_literal("'\\x4'").is_err());
        assert!(parse_literal("'\\q'").is_err());
        assert!(parse_literal("'line\nbreak'").is_err());
    }

    #[test]
    fn it_parses_sequences() {
        assert_eq!(
            parse_sequence("'(' Expression ')'").unwrap().1,
            Sequence(vec![
                item(Primary::Literal("(".to_owned()), None),
                item(Primary::Reference("Expression".into()), None),
                item(Primary::Literal(")".to_owned()), None),
            ])
        );

        assert_eq!(
            parse_sequence("[0-9]+ '.'? x*").unwrap().1,
            Sequence(vec![
                item(
                    Primary::Class(Class {
                        ranges: vec![ClassRange::Range {
                            start: '0',
                            end: '9'
                        }],
                        negated: false,
                    }),
                    Some(Repetition::OneOrMore)
                ),
                item(
                    Primary::Literal(".".to_owned()),
                    Some(Repetition::Optional)
                ),
                item(
                    Primary::Reference("x".into()),
                    Some(Repetition::ZeroOrMore)
                ),
            ])
        );
    }

    #[test]
    fn it_parses_choices_and_groups() {
        assert_eq!(
            parse_choice("(a / b) c / d").unwrap().1,
            Choice(vec![
                Sequence(vec![
                    item(
                        Primary::Group(Box::new(Choice(vec![
                            Sequence(vec![item(Primary::Reference("a".into()), None)]),
                            Sequence(vec![item(Primary::Reference("b".into()), None)]),
                        ]))),
                        None
                    ),
                    item(Primary::Reference("c".into()), None),
                ]),
                Sequence(vec![item(Primary::Reference("d".into()), None)]),
            ])
        );
    }

    #[test]
    fn it_stops_sequences_before_the_next_definition() {
        let grammar = parse_grammar_complete(
            r#"
# two definitions, no separator needed
A <- 'a' B
B <- 'b'
            "#,
        )
        .unwrap()
        .1;

        assert_eq!(
            grammar,
            Grammar(vec![
                Definition {
                    name: "A".into(),
                    body: Choice(vec![Sequence(vec![
                        item(Primary::Literal("a".to_owned()), None),
                        item(Primary::Reference("B".into()), None),
                    ])]),
                },
                Definition {
                    name: "B".into(),
                    body: Choice(vec![Sequence(vec![item(
                        Primary::Literal("b".to_owned()),
                        None
                    )])]),
                },
            ])
        );
    }

    #[test]
    fn it_parses_multiline_definitions() {
        let s = r#"
Value <- (
    # a number, or a list of values
    Number
    / '[' Value (',' Value)* ']'
)
Number <- [0-9]+   # no sign
        "#;

        let grammar = parse_grammar_complete(s).unwrap().1;
        assert_eq!(grammar.0.len(), 2);
    }

    #[test]
    fn it_ends_names_at_dashes() {
        let (rest, name) = parse_name("Digit_2-Rest").unwrap();
        assert_eq!(name.as_str(), "Digit_2");
        assert_eq!(rest, "-Rest");

        assert!(parse_grammar_complete("A <- B-C").is_err());
    }

    #[test]
    fn it_rejects_incomplete_definitions() {
        assert!(parse_grammar_complete("A <-").is_err());
        assert!(parse_grammar_complete("A <- 'a' )").is_err());
        assert!(parse_grammar_complete("A 'a'").is_err());
    }
}
