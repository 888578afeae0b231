use std::path::PathBuf;

use color_eyre::eyre::Error;
use inquire::InquireError;
use peg_calc::{
    expression::Precedence,
    grammar::notation,
    Evaluator,
    EvaluatorParameters,
};
use structopt::StructOpt;

#[derive(Debug, Default, StructOpt)]
struct Settings {
    /// Maximum expression length, whitespace not counted. Defaults to the
    /// library's limit.
    #[structopt(long, env = "PEG_CALC_MAX_LENGTH")]
    max_length: Option<usize>,

    /// Fail if only a prefix of the input is an expression.
    #[structopt(long)]
    strict: bool,

    /// Fold `*` and `/` in separate passes.
    #[structopt(long)]
    per_operator: bool,

    /// Don't strip whitespace before parsing.
    #[structopt(long)]
    keep_whitespace: bool,
}

impl Settings {
    fn evaluator(&self) -> Result<Evaluator, Error> {
        let precedence = if self.per_operator {
            Precedence::PerOperator
        }
        else {
            Precedence::Grouped
        };

        let defaults = EvaluatorParameters::default();
        let evaluator = Evaluator::new(EvaluatorParameters {
            max_input_length: self.max_length.or(defaults.max_input_length),
            strip_whitespace: !self.keep_whitespace,
            require_complete: self.strict,
            precedence,
        })?;

        Ok(evaluator)
    }
}

#[derive(Debug, StructOpt)]
enum Args {
    /// Evaluate an expression. Words are joined with spaces.
    Eval {
        #[structopt(flatten)]
        settings: Settings,

        #[structopt(required = true)]
        words: Vec<String>,
    },
    /// Print the parse tree of an expression.
    Tree {
        #[structopt(flatten)]
        settings: Settings,

        #[structopt(required = true)]
        words: Vec<String>,
    },
    /// Evaluate expressions interactively.
    Repl {
        #[structopt(flatten)]
        settings: Settings,
    },
    /// Match input against a grammar written in PEG notation.
    Match {
        #[structopt(short, long)]
        grammar: PathBuf,

        #[structopt(short, long, default_value = "Start")]
        start: String,

        /// Fail if only a prefix of the input matches.
        #[structopt(long)]
        complete: bool,

        input: String,
    },
}

impl Args {
    pub fn run(self) -> Result<(), Error> {
        match self {
            Self::Eval { settings, words } => {
                let evaluator = settings.evaluator()?;
                println!("{}", evaluate(&evaluator, &words.join(" "))?);
            }
            Self::Tree { settings, words } => {
                let evaluator = settings.evaluator()?;
                let tree = evaluator.parse(&words.join(" "))?;
                print!("{tree}");
            }
            Self::Repl { settings } => {
                let evaluator = settings.evaluator()?;
                repl(&evaluator)?;
            }
            Self::Match {
                grammar,
                start,
                complete,
                input,
            } => {
                let grammar = notation::compile_from_source::<String>(&grammar, &start)?;

                let tree = if complete {
                    grammar.parse_complete(&input)?
                }
                else {
                    grammar.parse_prefix(&input)?
                };

                print!("{tree}");
                if tree.end.offset() < input.len() {
                    println!("unmatched: {:?}", &input[tree.end.offset()..]);
                }
            }
        }

        Ok(())
    }
}

/// Formats the value of an expression, or `indeterminate result` if it has
/// none.
fn evaluate(evaluator: &Evaluator, text: &str) -> Result<String, peg_calc::Error> {
    match evaluator.evaluate(text) {
        Ok(value) => Ok(value.to_string()),
        Err(e) if e.is_indeterminate() => {
            tracing::debug!("{e}");
            Ok("indeterminate result".to_owned())
        }
        Err(e) => Err(e),
    }
}

fn repl(evaluator: &Evaluator) -> Result<(), Error> {
    loop {
        let line = match inquire::Text::new("calc>").prompt() {
            Ok(line) => line,
            Err(InquireError::OperationCanceled | InquireError::OperationInterrupted) => break,
            Err(e) => return Err(e.into()),
        };

        match line.trim() {
            "" => continue,
            "exit" | "quit" => break,
            text => {
                match evaluate(evaluator, text) {
                    Ok(output) => println!("{output}"),
                    Err(e) => eprintln!("error: {e}"),
                }
            }
        }
    }

    Ok(())
}

fn main() -> Result<(), Error> {
    dotenvy::dotenv().ok();
    color_eyre::install()?;
    tracing_subscriber::fmt::init();

    let args = Args::from_args();
    args.run()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn it_formats_results() {
        let evaluator = Settings::default().evaluator().unwrap();

        assert_eq!(evaluate(&evaluator, "2 + 3 * 4").unwrap(), "14");
        assert_eq!(evaluate(&evaluator, "1.5*2").unwrap(), "3");
        assert_eq!(evaluate(&evaluator, "5/0").unwrap(), "indeterminate result");
        assert!(evaluate(&evaluator, "abc").is_err());
    }

    #[test]
    fn it_applies_settings() {
        let settings = Settings {
            strict: true,
            per_operator: true,
            ..Default::default()
        };
        let evaluator = settings.evaluator().unwrap();

        assert_eq!(evaluate(&evaluator, "8/2*2").unwrap(), "2");
        assert!(evaluate(&evaluator, "2+").is_err());
    }

    #[test]
    fn it_falls_back_to_the_library_length_limit() {
        let evaluator = Settings::default().evaluator().unwrap();
        assert_eq!(
            evaluator.parameters().max_input_length,
            Some(peg_calc::evaluator::DEFAULT_MAX_INPUT_LENGTH)
        );

        let settings = Settings {
            max_length: Some(3),
            ..Default::default()
        };
        let evaluator = settings.evaluator().unwrap();
        assert_eq!(evaluator.parameters().max_input_length, Some(3));
        assert!(evaluate(&evaluator, "1+2+3").is_err());
    }

    #[test]
    fn it_parses_arguments() {
        let args = Args::from_iter(["peg-calc", "eval", "--strict", "1", "+", "2"]);
        let Args::Eval { settings, words } = args
        else {
            panic!("expected eval");
        };
        assert!(settings.strict);
        assert_eq!(words, vec!["1", "+", "2"]);
    }
}
