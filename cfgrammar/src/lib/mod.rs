//! A library for manipulating Context Free Grammars (CFG), and the first stage of the drcc
//! front end.
//!
//! We use some basic terminology guidelines for major concepts:
//!
//!   * A *grammar* is an ordered sequence of *productions*.
//!   * A *production* is an ordered sequence of *symbols*.
//!   * A *rule* (or *nonterminal*) maps a name to one or more productions.
//!   * A *token* (or *terminal*) is the name of a syntactic element.
//!
//! For example, in the following grammar:
//!
//!   R1: "a" "b" | R2;
//!   R2: "c";
//!
//! the following statements are true:
//!
//!   * There are 3 user productions. 1: ["a", "b"] 2: ["R2"] 3: ["c"]
//!   * There are two user rules: R1 and R2. The mapping to productions is {R1: {1, 2}, R2: {3}}
//!   * There are three user tokens: a, b, and c.
//!
//! cfgrammar makes the following guarantees about grammars:
//!
//!   * Productions are numbered from `0` to `prods_len() - 1` (inclusive). Production 0 is the
//!     augmented start production `^: S` where `S` is the user's start rule.
//!   * Rules are numbered from `0` to `rules_len() - 1` (inclusive). Rule 0 is `^`.
//!   * Tokens are numbered from `0` to `tokens_len() - 1` (inclusive). The last token is the
//!     end-of-input token.
//!   * The StorageT type used to store productions, rules, and token indices can be infallibly
//!     converted into usize (see [`TIdx`](struct.TIdx.html) and friends for more details).
//!
//! The main function to investigate is [`Grammar::new()`](grammar/struct.Grammar.html#method.new)
//! and/or [`Grammar::new_with_storaget()`](grammar/struct.Grammar.html#method.new_with_storaget).

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

pub mod ast;
pub mod firsts;
pub mod grammar;
mod idxnewtype;
pub mod newlinecache;
pub mod parser;
pub mod span;

pub use crate::{
    firsts::Firsts,
    grammar::Grammar,
    idxnewtype::{PIdx, RIdx, SIdx, TIdx},
    newlinecache::NewlineCache,
    parser::{GrammarError, GrammarErrorKind},
    span::{Span, Spanned},
};

/// A grammar symbol. The derived ordering places every rule before every token, and orders
/// symbols of the same kind by index.
#[derive(Clone, Copy, Debug, Hash, Eq, Ord, PartialEq, PartialOrd)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Symbol<StorageT> {
    Rule(RIdx<StorageT>),
    Token(TIdx<StorageT>),
}

#[cfg(test)]
mod test {
    use super::{RIdx, Symbol, TIdx};

    #[test]
    fn symbol_order() {
        let mut syms = vec![
            Symbol::Token(TIdx(0u32)),
            Symbol::Rule(RIdx(2u32)),
            Symbol::Token(TIdx(1u32)),
            Symbol::Rule(RIdx(0u32)),
        ];
        syms.sort();
        assert_eq!(
            syms,
            vec![
                Symbol::Rule(RIdx(0)),
                Symbol::Rule(RIdx(2)),
                Symbol::Token(TIdx(0)),
                Symbol::Token(TIdx(1)),
            ]
        );
    }
}
