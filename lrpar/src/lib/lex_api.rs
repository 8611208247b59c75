use std::{fmt, hash::Hash};

use cfgrammar::Span;
use num_traits::{PrimInt, Unsigned};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// The trait which all lexers which want to interact with `lrpar` must implement. Lexers are
/// pulled one token at a time; once the input is exhausted a lexer must return its end-of-input
/// token on every subsequent call.
pub trait Lexer<StorageT: Hash + PrimInt + Unsigned> {
    /// Return the next token of the input.
    fn next_token(&mut self) -> Token<StorageT>;
}

/// A token is a segment of the user's input that conforms to a known type, together with a copy
/// of the text it matched.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Token<StorageT> {
    tok_id: StorageT,
    span: Span,
    text: String,
}

impl<StorageT: Copy> Token<StorageT> {
    pub fn new(tok_id: StorageT, span: Span, text: String) -> Self {
        Token { tok_id, span, text }
    }

    /// The token ID, which is the index of a token in the grammar the parser was built from.
    pub fn tok_id(&self) -> StorageT {
        self.tok_id
    }

    /// Byte offsets of this token in the input.
    pub fn span(&self) -> Span {
        self.span
    }

    /// The text this token matched. End-of-input tokens have empty text.
    pub fn text(&self) -> &str {
        &self.text
    }
}

impl<StorageT: fmt::Debug> fmt::Display for Token<StorageT> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "Token(tok_id: {:?}, start: {}, end: {}, text: {:?})",
            self.tok_id,
            self.span.start(),
            self.span.end(),
            self.text
        )
    }
}
