//! `lrlex` turns byte-level regular patterns into deterministic automata and uses them to split
//! input into tokens for `lrpar`.
//!
//! Patterns are built with the combinators on [Pattern] and compiled into a [Dfa]. A
//! [LexerDef] is an ordered list of compiled [Rule]s; its [Scanner]s pick the longest match at
//! each position, preferring earlier rules on ties.

mod dfa;
mod lexer;
mod nfa;
mod pattern;

pub use crate::{
    dfa::Dfa,
    lexer::{LexerDef, Rule, Scanner},
    nfa::{Nfa, EPSILON},
    pattern::Pattern,
};
