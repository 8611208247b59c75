use std::{error::Error, fmt, hash::Hash, mem};

use cfgrammar::{Grammar, PIdx, RIdx, Symbol, TIdx};
use lrtable::{Action, StIdx, StateTable};
use num_traits::{AsPrimitive, PrimInt, Unsigned};

use crate::lex_api::{Lexer, Token};

/// A node in a syntax tree. Every node exclusively owns its children.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Node<StorageT> {
    /// A leaf created by shifting `token`.
    Term { token: Token<StorageT> },
    /// An interior node created by reducing production `pidx` (whose left-hand side is `ridx`).
    /// `nodes` are the subtrees of the production's symbols, left to right.
    Nonterm {
        ridx: RIdx<StorageT>,
        pidx: PIdx<StorageT>,
        nodes: Vec<Node<StorageT>>,
    },
}

impl<StorageT: 'static + Hash + PrimInt + Unsigned> Node<StorageT>
where
    usize: AsPrimitive<StorageT>,
{
    /// The grammar symbol this node was built from.
    pub fn symbol(&self) -> Symbol<StorageT> {
        match self {
            Node::Term { token } => Symbol::Token(TIdx(token.tok_id())),
            Node::Nonterm { ridx, .. } => Symbol::Rule(*ridx),
        }
    }

    /// The production this node was reduced by, or `None` for leaves.
    pub fn pidx(&self) -> Option<PIdx<StorageT>> {
        match self {
            Node::Term { .. } => None,
            Node::Nonterm { pidx, .. } => Some(*pidx),
        }
    }

    /// This node's children in left-to-right order. Leaves have no children.
    pub fn children(&self) -> &[Node<StorageT>] {
        match self {
            Node::Term { .. } => &[],
            Node::Nonterm { nodes, .. } => nodes,
        }
    }

    /// Return a pretty-printed version of this node: one line per node, each child indented
    /// one space more than its parent. Leaves are printed as their token name followed by the
    /// text they matched.
    pub fn pp(&self, grm: &Grammar<StorageT>) -> String {
        let mut st = vec![(0, self)]; // Stack of (indent level, node) pairs
        let mut s = String::new();
        while let Some((indent, e)) = st.pop() {
            s.push_str(&" ".repeat(indent));
            match e {
                Node::Term { token } => {
                    let tn = grm.token_name(TIdx(token.tok_id())).unwrap_or("$");
                    s.push_str(&format!("{} {}\n", tn, token.text()));
                }
                Node::Nonterm { ridx, nodes, .. } => {
                    s.push_str(&format!("{}\n", grm.rule_name_str(*ridx)));
                    for x in nodes.iter().rev() {
                        st.push((indent + 1, x));
                    }
                }
            }
        }
        s
    }
}

/// A syntax error: no action exists in state `stidx` for `token`. The parse is abandoned; no
/// partial tree is kept.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ParseError<StorageT> {
    stidx: StIdx,
    token: Token<StorageT>,
    expected: Vec<TIdx<StorageT>>,
}

impl<StorageT: 'static + Hash + PrimInt + Unsigned> ParseError<StorageT>
where
    usize: AsPrimitive<StorageT>,
{
    /// Return the state table index where this error was detected.
    pub fn stidx(&self) -> StIdx {
        self.stidx
    }

    /// Return the token which caused the error.
    pub fn token(&self) -> &Token<StorageT> {
        &self.token
    }

    /// The tokens which would have been valid at this point, in token index order.
    pub fn expected(&self) -> &[TIdx<StorageT>] {
        &self.expected
    }

    /// Render this error using the token names of `grm`.
    pub fn pp(&self, grm: &Grammar<StorageT>) -> String {
        let tok_name = |tidx| grm.symbol_name(Symbol::Token(tidx));
        let mut s = format!(
            "Parsing error at byte {}: unexpected {}",
            self.token.span().start(),
            tok_name(TIdx(self.token.tok_id()))
        );
        if !self.expected.is_empty() {
            s.push_str(", expected one of: ");
            s.push_str(
                &self
                    .expected
                    .iter()
                    .map(|tidx| tok_name(*tidx))
                    .collect::<Vec<_>>()
                    .join(", "),
            );
        }
        s
    }
}

impl<StorageT: Copy + fmt::Debug> fmt::Display for ParseError<StorageT> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "Parsing error at byte {} in state {}",
            self.token.span().start(),
            self.stidx
        )
    }
}

impl<StorageT: Copy + fmt::Debug> Error for ParseError<StorageT> {}

/// A shift-reduce parser driven by a state table built from `grm`.
pub struct RTParser<'a, StorageT> {
    grm: &'a Grammar<StorageT>,
    stable: &'a StateTable<StorageT>,
}

impl<'a, StorageT: 'static + Hash + PrimInt + Unsigned> RTParser<'a, StorageT>
where
    usize: AsPrimitive<StorageT>,
{
    pub fn new(grm: &'a Grammar<StorageT>, stable: &'a StateTable<StorageT>) -> Self {
        RTParser { grm, stable }
    }

    /// Parse the tokens produced by `lexer`. On success the root of the returned tree is the
    /// interior node of the grammar's start production, whose single child is the tree of the
    /// user's start rule.
    pub fn parse(
        &self,
        lexer: &mut dyn Lexer<StorageT>,
    ) -> Result<Node<StorageT>, ParseError<StorageT>> {
        // The parse stack always holds one more entry than the tree stack: the start state has
        // no subtree.
        let mut pstack = vec![self.stable.start_state()];
        let mut tstack: Vec<Node<StorageT>> = Vec::new();
        let mut la = lexer.next_token();
        loop {
            let stidx = pstack[pstack.len() - 1];
            match self.stable.action(stidx, TIdx(la.tok_id())) {
                Action::Shift(state_id) => {
                    let next = lexer.next_token();
                    let token = mem::replace(&mut la, next);
                    tstack.push(Node::Term { token });
                    pstack.push(state_id);
                }
                Action::Reduce(pidx) => {
                    let ridx = self.grm.prod_to_rule(pidx);
                    let pop_idx = pstack.len() - usize::from(self.grm.prod_len(pidx));
                    let nodes = tstack.drain(pop_idx - 1..).collect::<Vec<_>>();
                    tstack.push(Node::Nonterm { ridx, pidx, nodes });

                    pstack.truncate(pop_idx);
                    let prior = pstack[pstack.len() - 1];
                    match self.stable.goto(prior, ridx) {
                        Some(s) => pstack.push(s),
                        None => panic!(
                            "No goto from state {} on rule {}",
                            prior,
                            self.grm.rule_name_str(ridx)
                        ),
                    }
                }
                Action::Accept => {
                    debug_assert_eq!(tstack.len(), 1);
                    return Ok(Node::Nonterm {
                        ridx: self.grm.start_rule_idx(),
                        pidx: self.grm.start_prod(),
                        nodes: tstack,
                    });
                }
                Action::Error => {
                    return Err(ParseError {
                        stidx,
                        expected: self.stable.state_actions(stidx).collect(),
                        token: la,
                    });
                }
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::test_utils::WordLexer;
    use lrtable::from_grammar;

    fn check_parse_output(grms: &str, input: &str, expected: &str) {
        let grm = Grammar::new(grms).unwrap();
        let (_, stable) = from_grammar(&grm).unwrap();
        let mut lexer = WordLexer::new(&grm, input);
        let pt = RTParser::new(&grm, &stable).parse(&mut lexer).unwrap();
        assert_eq!(expected, pt.pp(&grm));
    }

    fn parse_err(grms: &str, input: &str) -> (Grammar, ParseError<u32>) {
        let grm = Grammar::new(grms).unwrap();
        let (_, stable) = from_grammar(&grm).unwrap();
        let mut lexer = WordLexer::new(&grm, input);
        let e = RTParser::new(&grm, &stable).parse(&mut lexer).unwrap_err();
        (grm, e)
    }

    const EXPR: &str = "
        %start Expr
        %%
        Expr: Term '+' Expr | Term;
        Term: Factor '*' Term | Factor;
        Factor: '(' Expr ')' | 'id';
    ";

    #[test]
    fn simple_parse() {
        check_parse_output(
            "%start E %% E: 'a';",
            "a",
            "^
 E
  a a
",
        );
    }

    #[test]
    fn expr_grammar() {
        check_parse_output(
            EXPR,
            "id + id * id",
            "^
 Expr
  Term
   Factor
    id id
  + +
  Expr
   Term
    Factor
     id id
    * *
    Term
     Factor
      id id
",
        );

        check_parse_output(
            EXPR,
            "( id + id ) * id",
            "^
 Expr
  Term
   Factor
    ( (
    Expr
     Term
      Factor
       id id
     + +
     Expr
      Term
       Factor
        id id
    ) )
   * *
   Term
    Factor
     id id
",
        );
    }

    #[test]
    fn empty_production() {
        let grms = "
            %start S
            %%
            S: 'a' S | ;
        ";
        check_parse_output(grms, "", "^\n S\n");
        check_parse_output(grms, "a a", "^\n S\n  a a\n  S\n   a a\n   S\n");
    }

    #[test]
    fn tree_accessors() {
        let grm = Grammar::new(EXPR).unwrap();
        let (_, stable) = from_grammar(&grm).unwrap();
        let mut lexer = WordLexer::new(&grm, "id * id");
        let pt = RTParser::new(&grm, &stable).parse(&mut lexer).unwrap();
        assert_eq!(pt.pidx(), Some(grm.start_prod()));
        assert_eq!(pt.symbol(), Symbol::Rule(grm.start_rule_idx()));
        assert_eq!(pt.children().len(), 1);
        let expr = &pt.children()[0];
        assert_eq!(expr.symbol(), Symbol::Rule(grm.rule_idx("Expr").unwrap()));
        assert_eq!(
            expr.pidx(),
            Some(grm.rule_to_prods(grm.rule_idx("Expr").unwrap())[1])
        );
        let term = &expr.children()[0];
        assert_eq!(term.children().len(), 3);
        match &term.children()[1] {
            Node::Term { token } => {
                assert_eq!(token.text(), "*");
                assert_eq!(usize::from(token.span().start()), 3);
                assert!(term.children()[1].children().is_empty());
                assert_eq!(term.children()[1].pidx(), None);
            }
            _ => panic!(),
        }
    }

    #[test]
    fn syntax_error() {
        let (grm, e) = parse_err(EXPR, "( id");
        assert_eq!(e.token().tok_id(), u32::from(grm.eof_token_idx()));
        assert_eq!(e.token().text(), "");
        let mut expected = e
            .expected()
            .iter()
            .map(|tidx| grm.token_name(*tidx).unwrap())
            .collect::<Vec<_>>();
        expected.sort_unstable();
        assert_eq!(expected, vec![")", "*", "+"]);
        assert_eq!(
            e.pp(&grm),
            "Parsing error at byte 4: unexpected $, expected one of: '+', '*', ')'"
        );
    }

    #[test]
    fn syntax_error_mid_input() {
        let (grm, e) = parse_err(EXPR, "id id");
        assert_eq!(e.token().tok_id(), u32::from(grm.token_idx("id").unwrap()));
        assert_eq!(e.token().span().start(), 3);
        assert!(e.to_string().starts_with("Parsing error at byte 3 in state "));
    }

    #[test]
    fn empty_input_needs_nullable_start() {
        let (grm, e) = parse_err(EXPR, "");
        assert_eq!(e.token().tok_id(), u32::from(grm.eof_token_idx()));
        assert_eq!(e.stidx(), StIdx::from(0usize));
    }
}
