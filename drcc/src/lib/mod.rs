//! A front end for a small subset of C: integer variables and arrays, `if`/`else`, `while`,
//! `do`/`while`, `scanf`/`printf`, and C's integer expression operators.
//!
//! ```text
//! let fe = drcc::FrontendBuilder::new().build()?;
//! let tree = fe.parse("int x; x = 1;")?;
//! print!("{}", tree.pp(fe.grammar()));
//! ```
//!
//! Source text is split into tokens by the maximal-munch lexer from `lrlex` and parsed by a
//! canonical LR(1) parser whose tables `lrtable` builds from [C_GRAMMAR].

mod frontend;
mod lexdef;

pub use crate::{
    frontend::{Frontend, FrontendBuilder, FrontendError},
    lexdef::c_lexerdef,
};

/// The grammar of simplified C.
pub const C_GRAMMAR: &str = include_str!("c.y");
