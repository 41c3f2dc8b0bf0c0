//! The line-oriented command language of the terminal front end.
//!
//! Operands are kept as text: whether an empty first operand means "continue
//! from the previous result" is decided by the session, not here.

use crate::error::CalcError;
use crate::modes::{MatrixOperation, Operation, ScientificFunction};

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Add {
        num1: String,
        num2: String,
    },
    Simple {
        num1: String,
        operation: Operation,
        num2: String,
    },
    Complex(String),
    Scientific {
        function: ScientificFunction,
        value: String,
    },
    Matrix {
        operation: MatrixOperation,
        matrix_a: String,
        matrix_b: Option<String>,
    },
    History,
    /// 1-based, as listed by `history`
    Recall(usize),
    Clear,
    ClearHistory,
    Save(String),
    Load(String),
    Help,
    Quit,
}

pub const HELP: &str = "\
Commands:
  add [a] b                 integer addition (GET /api/add)
  calc [a] <op> b           arithmetic, op is one of + - * / ^ %
  expr <expression>         evaluate an expression
  sci <function> [value]    sin cos tan asin acos atan sinh cosh tanh
                            sqrt cbrt log ln exp abs factorial
  matrix <op> <A> [| <B>]   op is add subtract multiply transpose det inverse, rows split by ';'
  history                   list previous results, newest first
  recall <n>                continue from history entry n
  clear                     forget the running result
  clear_history             forget the running result and the history
  save <file> / load <file> store or restore the history
  q                         quit
Leave out the first operand to continue from the previous result.";

fn split_head(line: &str) -> (&str, &str) {
    match line.split_once(char::is_whitespace) {
        Some((head, rest)) => (head, rest.trim()),
        None => (line, ""),
    }
}

fn require<'a>(text: &'a str, what: &str) -> Result<&'a str, CalcError> {
    if text.is_empty() {
        Err(CalcError::InvalidCommand(format!("missing {}", what)))
    } else {
        Ok(text)
    }
}

pub fn parse_command(line: &str) -> Result<Command, CalcError> {
    let line = line.trim();
    let (head, rest) = split_head(line);

    match head {
        "q" | "quit" => Ok(Command::Quit),
        "help" => Ok(Command::Help),
        "history" => Ok(Command::History),
        "clear" => Ok(Command::Clear),
        "clear_history" => Ok(Command::ClearHistory),
        "save" => Ok(Command::Save(require(rest, "file name")?.to_string())),
        "load" => Ok(Command::Load(require(rest, "file name")?.to_string())),
        "recall" => {
            let n: usize = require(rest, "entry number")?.parse().map_err(|_| {
                CalcError::InvalidCommand(format!("'{}' is not an entry number", rest))
            })?;
            if n == 0 {
                return Err(CalcError::InvalidCommand(
                    "entries are numbered from 1".to_string(),
                ));
            }
            Ok(Command::Recall(n))
        }
        "add" => {
            let args: Vec<&str> = rest.split_whitespace().collect();
            match args.as_slice() {
                [b] => Ok(Command::Add {
                    num1: String::new(),
                    num2: b.to_string(),
                }),
                [a, b] => Ok(Command::Add {
                    num1: a.to_string(),
                    num2: b.to_string(),
                }),
                _ => Err(CalcError::InvalidCommand("usage: add [a] b".to_string())),
            }
        }
        "calc" => parse_simple(rest),
        "expr" => Ok(Command::Complex(require(rest, "expression")?.to_string())),
        "sci" => {
            let (name, value) = split_head(require(rest, "function")?);
            let function = ScientificFunction::from_name(name).ok_or_else(|| {
                CalcError::InvalidCommand(format!("unknown function '{}'", name))
            })?;
            Ok(Command::Scientific {
                function,
                value: value.to_string(),
            })
        }
        "matrix" => {
            let (name, operands) = split_head(require(rest, "operation")?);
            let operation = MatrixOperation::from_name(name).ok_or_else(|| {
                CalcError::InvalidCommand(format!("unknown matrix operation '{}'", name))
            })?;
            let (a, b) = match operands.split_once('|') {
                Some((a, b)) => (a.trim(), Some(b.trim().to_string())),
                None => (operands, None),
            };
            Ok(Command::Matrix {
                operation,
                matrix_a: require(a, "matrix")?.to_string(),
                matrix_b: b,
            })
        }
        "" => Err(CalcError::InvalidCommand("empty command".to_string())),
        other => Err(CalcError::InvalidCommand(format!("unknown command '{}'", other))),
    }
}

fn parse_simple(rest: &str) -> Result<Command, CalcError> {
    let args: Vec<&str> = rest.split_whitespace().collect();
    let usage = || CalcError::InvalidCommand("usage: calc [a] <op> b".to_string());

    let (num1, symbol, num2) = match args.as_slice() {
        [op, b] => ("", *op, *b),
        [a, op, b] => (*a, *op, *b),
        _ => return Err(usage()),
    };
    let operation = Operation::from_symbol(symbol).ok_or_else(usage)?;

    Ok(Command::Simple {
        num1: num1.to_string(),
        operation,
        num2: num2.to_string(),
    })
}
