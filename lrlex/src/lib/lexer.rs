use std::{
    collections::{HashMap, HashSet},
    fmt::Debug,
    hash::Hash,
    slice::Iter,
};

use cfgrammar::Span;
use lrpar::{Lexer, Token};
use num_traits::{PrimInt, Unsigned};

use crate::{dfa::Dfa, pattern::Pattern};

/// A lexing rule: a named, compiled pattern.
#[derive(Clone, Debug)]
pub struct Rule<StorageT> {
    /// If `Some`, the ID that tokens created against this rule will be given. If `None`, text
    /// which this rule matches is consumed without producing a token.
    pub tok_id: Option<StorageT>,
    /// This rule's name, which is matched against the token names of a grammar by
    /// [LexerDef::set_rule_ids].
    pub name: String,
    dfa: Dfa,
}

impl<StorageT> Rule<StorageT> {
    /// Create a new `Rule`, compiling `pattern`.
    pub fn new(tok_id: Option<StorageT>, name: &str, pattern: &Pattern) -> Self {
        Rule {
            tok_id,
            name: name.to_owned(),
            dfa: pattern.compile(),
        }
    }

    pub fn dfa(&self) -> &Dfa {
        &self.dfa
    }
}

/// An ordered list of lexing rules. Earlier rules take priority over later rules when more than
/// one rule matches the longest possible text.
#[derive(Clone, Debug)]
pub struct LexerDef<StorageT> {
    rules: Vec<Rule<StorageT>>,
    end_tok_id: StorageT,
}

impl<StorageT: Copy + Eq + Hash + PrimInt + Unsigned> LexerDef<StorageT> {
    /// Create a lexer definition from `rules`. Lexers created from this definition produce a
    /// token with ID `end_tok_id` once their input is exhausted.
    pub fn new(end_tok_id: StorageT, rules: Vec<Rule<StorageT>>) -> Self {
        LexerDef { rules, end_tok_id }
    }

    /// Get the rule at position `idx`, or `None` if there are not that many rules.
    pub fn get_rule(&self, idx: usize) -> Option<&Rule<StorageT>> {
        self.rules.get(idx)
    }

    /// Get the `Rule` instance named `n`, or `None` if no such rule exists.
    pub fn get_rule_by_name(&self, n: &str) -> Option<&Rule<StorageT>> {
        self.rules.iter().find(|r| r.name == n)
    }

    /// The token ID given to the end-of-input token.
    pub fn end_tok_id(&self) -> StorageT {
        self.end_tok_id
    }

    /// Set the IDs of the rules in this definition from `rule_ids_map`, which maps rule (token)
    /// names to IDs. Returns a pair `(missing from lexer, missing from parser)`:
    ///
    ///   1. The names in `rule_ids_map` which no rule defines.
    ///   2. The names of rules which do not appear in `rule_ids_map`. Such rules are given a
    ///      `tok_id` of `None`, so the text they match is consumed silently.
    ///
    /// Each set is `None` if it would be empty. Lexing and parsing can proceed either way: a
    /// non-empty second set is usually benign, but a non-empty first set means parts of the
    /// grammar can never be reached.
    pub fn set_rule_ids<'a>(
        &'a mut self,
        rule_ids_map: &HashMap<&'a str, StorageT>,
    ) -> (Option<HashSet<&'a str>>, Option<HashSet<&'a str>>) {
        for r in self.rules.iter_mut() {
            r.tok_id = rule_ids_map.get(r.name.as_str()).copied();
        }

        let defined = self
            .rules
            .iter()
            .map(|r| r.name.as_str())
            .collect::<HashSet<_>>();
        let missing_from_lexer = rule_ids_map
            .keys()
            .copied()
            .filter(|n| !defined.contains(n))
            .collect::<HashSet<_>>();
        let missing_from_parser = self
            .rules
            .iter()
            .filter(|r| r.tok_id.is_none())
            .map(|r| r.name.as_str())
            .collect::<HashSet<_>>();

        (
            Some(missing_from_lexer).filter(|x| !x.is_empty()),
            Some(missing_from_parser).filter(|x| !x.is_empty()),
        )
    }

    /// Returns an iterator over all rules in this definition, in priority order.
    pub fn iter_rules(&self) -> Iter<Rule<StorageT>> {
        self.rules.iter()
    }

    pub fn rules_len(&self) -> usize {
        self.rules.len()
    }

    /// Return a lexer for the input `s`.
    pub fn lexer<'lexer, 'input>(&'lexer self, s: &'input str) -> Scanner<'lexer, 'input, StorageT> {
        Scanner {
            lexerdef: self,
            s,
            i: 0,
        }
    }
}

/// A maximal-munch lexer over a `&str`. At each position every rule is tried; the rule matching
/// the most bytes wins, the earliest rule winning ties. Bytes which no rule matches are skipped
/// one at a time without producing a token.
pub struct Scanner<'lexer, 'input, StorageT> {
    lexerdef: &'lexer LexerDef<StorageT>,
    s: &'input str,
    i: usize,
}

impl<StorageT: Copy + Debug + Eq + Hash + PrimInt + Unsigned> Scanner<'_, '_, StorageT> {
    /// Return all remaining tokens, up to and including the end-of-input token.
    pub fn tokens(&mut self) -> Vec<Token<StorageT>> {
        let mut toks = Vec::new();
        loop {
            let t = self.next_token();
            let end = t.tok_id() == self.lexerdef.end_tok_id;
            toks.push(t);
            if end {
                return toks;
            }
        }
    }
}

impl<StorageT: Copy + Debug + Eq + Hash + PrimInt + Unsigned> Lexer<StorageT>
    for Scanner<'_, '_, StorageT>
{
    fn next_token(&mut self) -> Token<StorageT> {
        let bytes = self.s.as_bytes();
        while self.i < bytes.len() {
            let rest = &bytes[self.i..];
            let mut longest = 0;
            let mut longest_rule = None;
            for r in &self.lexerdef.rules {
                let l = r.dfa.max_accepting_prefix_len(rest);
                if l > longest {
                    longest = l;
                    longest_rule = Some(r);
                }
            }
            match longest_rule {
                Some(r) => {
                    let start = self.i;
                    self.i += longest;
                    if let Some(tok_id) = r.tok_id {
                        // Patterns work on bytes, so a match need not end on a char boundary.
                        let text = String::from_utf8_lossy(&bytes[start..self.i]).into_owned();
                        return Token::new(tok_id, Span::new(start, self.i), text);
                    }
                }
                None => self.i += 1,
            }
        }
        Token::new(
            self.lexerdef.end_tok_id,
            Span::new(bytes.len(), bytes.len()),
            String::new(),
        )
    }
}
