use std::{error::Error, fmt};

use cfgrammar::{Grammar, GrammarError};
use lrlex::LexerDef;
use lrpar::{Node, ParseError, RTParser, Token};
use lrtable::{from_grammar, Conflicts, StateGraph, StateTable, StateTableError};

use crate::{lexdef::c_lexerdef, C_GRAMMAR};

/// The ways in which building a [Frontend] can fail.
#[derive(Debug)]
pub enum FrontendError {
    /// The grammar text could not be parsed. The error's span refers to [C_GRAMMAR].
    Grammar(GrammarError),
    StateTable(StateTableError),
    /// The grammar has conflicts and the builder was told to reject them. `pp` is the
    /// pretty-printed list of conflicts.
    Conflicts { sr: usize, rr: usize, pp: String },
    /// The grammar uses tokens for which the lexer has no rule.
    MissingFromLexer(Vec<String>),
}

impl Error for FrontendError {}

impl fmt::Display for FrontendError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            FrontendError::Grammar(e) => write!(f, "{}", e.pp(C_GRAMMAR)),
            FrontendError::StateTable(e) => write!(f, "{}", e),
            FrontendError::Conflicts { sr, rr, pp } => write!(
                f,
                "{} Shift/Reduce, {} Reduce/Reduce conflicts:\n{}",
                sr, rr, pp
            ),
            FrontendError::MissingFromLexer(names) => write!(
                f,
                "these tokens are used in the grammar but not defined in the lexer: {}",
                names.join(", ")
            ),
        }
    }
}

impl From<GrammarError> for FrontendError {
    fn from(err: GrammarError) -> Self {
        FrontendError::Grammar(err)
    }
}

impl From<StateTableError> for FrontendError {
    fn from(err: StateTableError) -> Self {
        FrontendError::StateTable(err)
    }
}

/// Build a [Frontend]. Grammar conflicts are resolved and kept as diagnostics unless
/// [FrontendBuilder::error_on_conflicts] is set.
#[derive(Default)]
pub struct FrontendBuilder {
    error_on_conflicts: bool,
}

impl FrontendBuilder {
    pub fn new() -> Self {
        FrontendBuilder::default()
    }

    /// If set to true, [FrontendBuilder::build] will fail if the grammar has any conflicts.
    /// Defaults to `false`.
    pub fn error_on_conflicts(mut self, b: bool) -> Self {
        self.error_on_conflicts = b;
        self
    }

    /// Build the grammar, parse table and lexer for simplified C.
    pub fn build(self) -> Result<Frontend, FrontendError> {
        let grm = Grammar::new(C_GRAMMAR)?;
        let (sgraph, stable) = from_grammar(&grm)?;
        if self.error_on_conflicts {
            if let Some(c) = stable.conflicts() {
                return Err(FrontendError::Conflicts {
                    sr: c.sr_len(),
                    rr: c.rr_len(),
                    pp: c.pp(&grm),
                });
            }
        }

        let mut lexerdef = c_lexerdef(u32::from(grm.eof_token_idx()));
        {
            let tokens_map = grm
                .tokens_map()
                .into_iter()
                .map(|(n, tidx)| (n, u32::from(tidx)))
                .collect();
            if let (Some(missing), _) = lexerdef.set_rule_ids(&tokens_map) {
                let mut names = missing.into_iter().map(|n| n.to_owned()).collect::<Vec<_>>();
                names.sort();
                return Err(FrontendError::MissingFromLexer(names));
            }
        }

        Ok(Frontend {
            grm,
            sgraph,
            stable,
            lexerdef,
        })
    }
}

/// A ready-to-use simplified C front end. Everything is built once; lexing and parsing only
/// read it, so one `Frontend` can serve any number of inputs.
pub struct Frontend {
    grm: Grammar<u32>,
    sgraph: StateGraph<u32>,
    stable: StateTable<u32>,
    lexerdef: LexerDef<u32>,
}

impl Frontend {
    /// Lex `src`, returning all its tokens up to and including the end-of-input token.
    pub fn tokens(&self, src: &str) -> Vec<Token<u32>> {
        self.lexerdef.lexer(src).tokens()
    }

    /// Lex and parse `src`. The root of the returned tree is the grammar's start production.
    pub fn parse(&self, src: &str) -> Result<Node<u32>, ParseError<u32>> {
        let mut lexer = self.lexerdef.lexer(src);
        RTParser::new(&self.grm, &self.stable).parse(&mut lexer)
    }

    /// The conflicts found in the grammar, if any.
    pub fn conflicts(&self) -> Option<&Conflicts<u32>> {
        self.stable.conflicts()
    }

    pub fn grammar(&self) -> &Grammar<u32> {
        &self.grm
    }

    pub fn state_graph(&self) -> &StateGraph<u32> {
        &self.sgraph
    }

    pub fn state_table(&self) -> &StateTable<u32> {
        &self.stable
    }

    pub fn lexerdef(&self) -> &LexerDef<u32> {
        &self.lexerdef
    }
}
