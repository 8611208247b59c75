use cfgrammar::{Grammar, Span};

use crate::lex_api::{Lexer, Token};

/// A lexer for tests which splits its input on whitespace and looks each word up as a token
/// name of the grammar.
pub(crate) struct WordLexer {
    toks: Vec<Token<u32>>,
    eof: Token<u32>,
}

impl WordLexer {
    pub(crate) fn new(grm: &Grammar<u32>, input: &str) -> Self {
        let tokens = grm.tokens_map();
        let mut toks = Vec::new();
        let mut i = 0;
        for w in input.split(' ') {
            if !w.is_empty() {
                let tidx = tokens[w];
                toks.push(Token::new(u32::from(tidx), Span::new(i, i + w.len()), w.to_owned()));
            }
            i += w.len() + 1;
        }
        toks.reverse();
        let eof = Token::new(
            u32::from(grm.eof_token_idx()),
            Span::new(input.len(), input.len()),
            String::new(),
        );
        WordLexer { toks, eof }
    }
}

impl Lexer<u32> for WordLexer {
    fn next_token(&mut self) -> Token<u32> {
        self.toks.pop().unwrap_or_else(|| self.eof.clone())
    }
}
