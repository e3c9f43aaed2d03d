pub mod ast;
pub mod callable;
pub mod class;
pub mod environment;
pub mod error;
pub mod expr;
pub mod interpreter;
pub mod parser;
pub mod resolver;
pub mod scanner;
pub mod stmt;
pub mod token;
pub mod value;

use std::io::Write;

use log::info;

use crate::error::LoxError;
use crate::interpreter::Interpreter;
use crate::parser::Parser;
use crate::stmt::Stmt;

/// Scan and parse `source`.  Lex and parse errors are reported together.
pub fn parse_source(source: &str) -> Result<Vec<Stmt>, Vec<LoxError>> {
    let (tokens, mut errors) = scanner::scan(source.as_bytes());

    match Parser::new(tokens).parse() {
        Ok(statements) if errors.is_empty() => Ok(statements),
        Ok(_) => Err(errors),
        Err(parse_errors) => {
            errors.extend(parse_errors);
            Err(errors)
        }
    }
}

/// Full pipeline: parse, resolve, then execute on `interpreter`.
///
/// Nothing runs if any static error was found.  On a runtime error the
/// single error is returned; output produced before it stays written.
pub fn run<W: Write>(interpreter: &mut Interpreter<W>, source: &str) -> Result<(), Vec<LoxError>> {
    let statements = parse_source(source)?;

    let (locals, errors) =
        resolver::Resolver::with_globals(interpreter.global_names()).resolve(&statements);
    if !errors.is_empty() {
        info!("Refusing to run: {} static error(s)", errors.len());
        return Err(errors);
    }

    interpreter.resolve(locals);
    interpreter.interpret(&statements).map_err(|e| vec![e])
}
