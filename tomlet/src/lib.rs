#[macro_use]
extern crate lazy_static;

mod ast;
mod builtins;
mod parsing;
mod traits;
mod wrappers;

pub mod error;
pub mod eval;
pub mod object;
pub mod serialize;
pub mod types;

#[cfg(test)]
mod tests;

use std::fs::read_to_string;
use std::path::Path;

pub use ast::{Expr, Number, Program};
pub use error::{Error, ErrorKind};
pub use eval::{eval, Namespace};
pub use object::Object;
pub use parsing::parse;
pub use serialize::{from_toml, to_json, to_toml, Format};
pub use wrappers::OrderedMap;


/// Parse and evaluate a source text.
pub fn eval_raw(input: &str) -> Result<Object, Error> {
    parse(input).and_then(|program| eval(&program))
}


/// Parse, evaluate and serialize a source text.
///
/// Errors come back rendered against the source, ready to be shown to the
/// user.
pub fn run(input: &str, format: Format) -> Result<String, Error> {
    eval_raw(input)
        .and_then(|value| format.serialize(&value))
        .map_err(|err| err.render(Some(input)))
}


/// Read a file and run its contents.
pub fn run_file(path: &Path, format: Format) -> Result<String, Error> {
    let contents = read_to_string(path).map_err(|err| Error::from(err).render(None))?;
    run(&contents, format)
}
