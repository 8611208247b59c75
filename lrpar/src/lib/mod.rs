//! `lrpar` drives a state table built by `lrtable` over a stream of tokens, producing an owned
//! syntax tree.
//!
//! Any type which implements [Lexer] can feed the parser: it is pulled one [Token] at a time
//! until the parser accepts or finds a syntax error. Parsing does not attempt error recovery: the
//! first syntax error aborts the parse and is returned as a [ParseError].

pub mod lex_api;
pub mod parser;
#[cfg(test)]
mod test_utils;

pub use crate::{
    lex_api::{Lexer, Token},
    parser::{Node, ParseError, RTParser},
};
