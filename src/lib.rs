//! A lexer, macro expander, parser, and tree-walking evaluator for Wenyan,
//! the Classical-Chinese programming language.

pub mod ast;
pub mod error;
pub mod eval;
pub mod macro_expand;
pub mod numeral;
pub mod parser;
pub mod roman;
pub mod span;
pub mod token;
pub mod value;

use error::{RuntimeError, WenyanError};
use value::Value;

/// The two ways a Wenyan program can fail, kept distinct so a caller can
/// pick the right exit code (1 for `文法之禍`, 2 for `執行之禍`).
#[derive(Debug)]
pub enum Error {
    Grammar(WenyanError),
    Runtime(RuntimeError),
}

impl From<WenyanError> for Error {
    fn from(e: WenyanError) -> Self {
        Error::Grammar(e)
    }
}

impl From<RuntimeError> for Error {
    fn from(e: RuntimeError) -> Self {
        Error::Runtime(e)
    }
}

/// Lex, expand macros, and parse a complete source file into an AST,
/// without evaluating it.
pub fn compile(source: &str) -> Result<ast::Program, WenyanError> {
    parser::parse_program(source)
}

/// Compile and evaluate a complete Wenyan source file, returning the final
/// value of the implicit `其` register.
pub fn run(source: &str) -> Result<Value, Error> {
    let program = compile(source)?;
    eval::eval_program(&program).map_err(Error::from)
}
