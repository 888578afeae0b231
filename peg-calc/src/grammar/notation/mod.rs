//! Grammars written in PEG notation.
//!
//! ```text
//! # comments run to the end of the line
//! Start       <- Expression
//! Expression  <- (Parentheses / Number) ([-+*/] Expression)?
//! Parentheses <- '(' Expression ')'
//! Number      <- [0-9]+ '.'? [0-9]*
//! ```
//!
//! Each definition `Name <- …` becomes a non-terminal labelled with
//! `Name.parse::<L>()`. `/` separates ordered alternatives, `?`, `*` and `+`
//! repeat the preceding item, and parentheses group. Literals are quoted with
//! `'` or `"`. Character classes compile to an ordered choice of their
//! characters and ranges, in the order they are written; negated classes are
//! not supported.

pub mod ast;
mod compiler;
mod parser;

use std::{
    path::Path,
    str::FromStr,
};

use self::compiler::Compiler;
use super::{
    Error,
    Grammar,
    Label,
};

pub fn parse(source: &str) -> Result<ast::Grammar<'_>, Error> {
    match parser::parse_grammar_complete(source) {
        Ok((_, ast)) => Ok(ast),
        Err(nom::Err::Error(e)) | Err(nom::Err::Failure(e)) => {
            Err(Error::Parse(nom::error::convert_error(source, e)))
        }
        Err(nom::Err::Incomplete(_)) => Err(Error::Parse("incomplete input".to_owned())),
    }
}

/// Compiles a parsed grammar. `start` names the definition parsing starts with.
pub fn compile<L: Label + FromStr>(ast: &ast::Grammar<'_>, start: &str) -> Result<Grammar<L>, Error> {
    let mut compiler = Compiler::new();
    compiler.push_ast(ast)?;
    compiler.finish(start)
}

pub fn compile_str<L: Label + FromStr>(source: &str, start: &str) -> Result<Grammar<L>, Error> {
    let ast = parse(source)?;
    compile(&ast, start)
}

pub fn compile_from_source<L: Label + FromStr>(
    path: impl AsRef<Path>,
    start: &str,
) -> Result<Grammar<L>, crate::Error> {
    let path = path.as_ref();
    tracing::debug!("compiling grammar: {}", path.display());

    let source = std::fs::read_to_string(path)?;
    let grammar = compile_str(&source, start)?;
    Ok(grammar)
}
