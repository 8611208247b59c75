use std::collections::HashMap;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use num_traits::{AsPrimitive, PrimInt, Unsigned};

use crate::{
    ast,
    firsts::Firsts,
    parser::{GrammarError, GrammarErrorKind, GrammarParser},
    PIdx, RIdx, SIdx, Span, Symbol, TIdx,
};

const START_RULE: &str = "^";

/// Representation of a context-free grammar. See the [top-level documentation](crate) for the
/// guarantees this struct makes about rules, tokens, productions, and symbols.
///
/// Every grammar is *augmented*: rule 0 is a fresh goal rule `^` whose sole production (always
/// production 0) references the user's start rule, and the last token is a fresh end-of-input
/// token.
#[derive(Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Grammar<StorageT = u32> {
    /// A mapping from `RIdx` -> `(String, Span)`.
    rule_names: Vec<(String, Span)>,
    /// A mapping from `TIdx` -> `Option<(Span, String)>`. Every user-specified token has a name,
    /// but the end-of-input token doesn't.
    token_names: Vec<Option<(Span, String)>>,
    eof_token_idx: TIdx<StorageT>,
    start_prod: PIdx<StorageT>,
    /// A list of all productions.
    prods: Vec<Vec<Symbol<StorageT>>>,
    /// A mapping from rules to their productions, in textual order. Every rule has at least one
    /// production.
    rules_prods: Vec<Vec<PIdx<StorageT>>>,
    /// A mapping from productions to their corresponding rule indexes.
    prods_rules: Vec<RIdx<StorageT>>,
}

impl Grammar<u32> {
    pub fn new(s: &str) -> Result<Self, GrammarError> {
        Grammar::new_with_storaget(s)
    }
}

impl<StorageT: 'static + PrimInt + Unsigned> Grammar<StorageT>
where
    usize: AsPrimitive<StorageT>,
{
    /// Takes as input a grammar in the textual format accepted by this crate and returns a
    /// `Grammar` (or a `GrammarError` on error).
    ///
    /// As we're compiling the `Grammar`, we add a new start rule (which we'll refer to as `^`,
    /// though the actual name is a fresh name that is guaranteed to be unique) that references the
    /// user defined start rule.
    pub fn new_with_storaget(s: &str) -> Result<Self, GrammarError> {
        let mut gp = GrammarParser::new(s.to_string());
        gp.parse()?;
        let ast = gp.ast();
        ast.complete_and_validate()?;
        Self::from_ast(ast)
    }

    fn from_ast(ast: ast::GrammarAST) -> Result<Self, GrammarError> {
        // Check that StorageT is big enough to hold RIdx/PIdx/SIdx/TIdx values (including the
        // start rule, start production, and end-of-input token we add); after these checks we
        // can guarantee that things like RIdx(ast.rules.len().as_()) are safe.
        let max = num_traits::cast::<StorageT, usize>(StorageT::max_value()).unwrap_or(usize::MAX);
        if ast.rules.len() >= max
            || ast.tokens.len() >= max
            || ast.prods.len() >= max
            || ast.prods.iter().any(|p| p.symbols.len() > max)
        {
            return Err(GrammarError {
                kind: GrammarErrorKind::StorageTooSmall,
                span: Span::new(0, 0),
            });
        }

        // Generate a guaranteed unique start rule name by making it longer until nothing clashes.
        let mut start_rule = START_RULE.to_string();
        while ast.rules.contains_key(&start_rule) {
            start_rule += START_RULE;
        }
        let mut rule_names = Vec::with_capacity(ast.rules.len() + 1);
        rule_names.push((start_rule, Span::new(0, 0)));
        for (k, rule) in &ast.rules {
            rule_names.push((k.clone(), rule.name.1));
        }
        let rule_map = rule_names
            .iter()
            .enumerate()
            .map(|(i, (n, _))| (n.clone(), RIdx(i.as_())))
            .collect::<HashMap<_, _>>();

        let mut token_names = Vec::with_capacity(ast.tokens.len() + 1);
        for (i, k) in ast.tokens.iter().enumerate() {
            token_names.push(Some((ast.spans[i], k.clone())));
        }
        let eof_token_idx = TIdx(token_names.len().as_());
        token_names.push(None);
        let token_map = ast
            .tokens
            .iter()
            .enumerate()
            .map(|(i, n)| (n.clone(), TIdx(i.as_())))
            .collect::<HashMap<_, _>>();

        // The start production is production 0; the AST's productions follow it in order.
        let start_prod = PIdx(0usize.as_());
        let start_ridx = RIdx(0usize.as_());
        let mut prods = Vec::with_capacity(ast.prods.len() + 1);
        let mut prods_rules = Vec::with_capacity(ast.prods.len() + 1);
        let mut rules_prods = vec![Vec::new(); rule_names.len()];
        let (user_start, _) = ast
            .start
            .as_ref()
            .ok_or(GrammarError {
                kind: GrammarErrorKind::NoStartRule,
                span: Span::new(0, 0),
            })?;
        prods.push(vec![Symbol::Rule(rule_map[user_start])]);
        prods_rules.push(start_ridx);
        rules_prods[usize::from(start_ridx)].push(start_prod);

        let mut ast_prods_rules = vec![start_ridx; ast.prods.len()];
        for (name, rule) in &ast.rules {
            let ridx = rule_map[name];
            for &ast_pidx in &rule.pidxs {
                ast_prods_rules[ast_pidx] = ridx;
                rules_prods[usize::from(ridx)].push(PIdx((ast_pidx + 1).as_()));
            }
        }
        for (astprod, ridx) in ast.prods.iter().zip(ast_prods_rules) {
            let prod = astprod
                .symbols
                .iter()
                .map(|astsym| match astsym {
                    ast::Symbol::Rule(n, _) => Symbol::Rule(rule_map[n]),
                    ast::Symbol::Token(n, _) => Symbol::Token(token_map[n]),
                })
                .collect();
            prods.push(prod);
            prods_rules.push(ridx);
        }

        Ok(Grammar {
            rule_names,
            token_names,
            eof_token_idx,
            start_prod,
            prods,
            rules_prods,
            prods_rules,
        })
    }

    /// How many productions does this grammar have?
    pub fn prods_len(&self) -> PIdx<StorageT> {
        // The constructor checked that the number of productions fits into StorageT.
        PIdx(self.prods.len().as_())
    }

    /// Return an iterator which produces (in order from `0..self.prods_len()`) all this
    /// grammar's valid `PIdx`s.
    pub fn iter_pidxs(&self) -> impl Iterator<Item = PIdx<StorageT>> {
        (0..self.prods.len()).map(|x| PIdx(x.as_()))
    }

    /// Get the sequence of symbols for production `pidx`. Panics if `pidx` doesn't exist.
    pub fn prod(&self, pidx: PIdx<StorageT>) -> &[Symbol<StorageT>] {
        &self.prods[usize::from(pidx)]
    }

    /// How many symbols does production `pidx` have? Panics if `pidx` doesn't exist.
    pub fn prod_len(&self, pidx: PIdx<StorageT>) -> SIdx<StorageT> {
        SIdx(self.prods[usize::from(pidx)].len().as_())
    }

    /// Return the rule index of the production `pidx`. Panics if `pidx` doesn't exist.
    pub fn prod_to_rule(&self, pidx: PIdx<StorageT>) -> RIdx<StorageT> {
        self.prods_rules[usize::from(pidx)]
    }

    /// Return the production index of the start rule's sole production. This is always
    /// production 0.
    pub fn start_prod(&self) -> PIdx<StorageT> {
        self.start_prod
    }

    /// How many rules does this grammar have?
    pub fn rules_len(&self) -> RIdx<StorageT> {
        RIdx(self.rule_names.len().as_())
    }

    /// Return an iterator which produces (in order from `0..self.rules_len()`) all this
    /// grammar's valid `RIdx`s.
    pub fn iter_rules(&self) -> impl Iterator<Item = RIdx<StorageT>> {
        (0..self.rule_names.len()).map(|x| RIdx(x.as_()))
    }

    /// Return the productions for rule `ridx`. Panics if `ridx` doesn't exist.
    pub fn rule_to_prods(&self, ridx: RIdx<StorageT>) -> &[PIdx<StorageT>] {
        &self.rules_prods[usize::from(ridx)]
    }

    /// Return the name of rule `ridx`. Panics if `ridx` doesn't exist.
    pub fn rule_name_str(&self, ridx: RIdx<StorageT>) -> &str {
        self.rule_names[usize::from(ridx)].0.as_str()
    }

    /// Return the span of rule `ridx`. Panics if `ridx` doesn't exist.
    pub fn rule_name_span(&self, ridx: RIdx<StorageT>) -> Span {
        self.rule_names[usize::from(ridx)].1
    }

    /// Return the index of the rule named `n` or `None` if it doesn't exist.
    pub fn rule_idx(&self, n: &str) -> Option<RIdx<StorageT>> {
        self.rule_names
            .iter()
            .position(|(x, _)| x == n)
            .map(|x| RIdx(x.as_()))
    }

    /// What is the index of the augmented start rule `^`?
    pub fn start_rule_idx(&self) -> RIdx<StorageT> {
        self.prod_to_rule(self.start_prod)
    }

    /// How many tokens does this grammar have (including the end-of-input token)?
    pub fn tokens_len(&self) -> TIdx<StorageT> {
        TIdx(self.token_names.len().as_())
    }

    /// Return an iterator which produces (in order from `0..self.tokens_len()`) all this
    /// grammar's valid `TIdx`s.
    pub fn iter_tidxs(&self) -> impl Iterator<Item = TIdx<StorageT>> {
        (0..self.token_names.len()).map(|x| TIdx(x.as_()))
    }

    /// Return the index of the end-of-input token.
    pub fn eof_token_idx(&self) -> TIdx<StorageT> {
        self.eof_token_idx
    }

    /// Return the name of token `tidx` (where `None` indicates "the token has no name", which is
    /// only the case for the end-of-input token). Panics if `tidx` doesn't exist.
    pub fn token_name(&self, tidx: TIdx<StorageT>) -> Option<&str> {
        self.token_names[usize::from(tidx)]
            .as_ref()
            .map(|x| x.1.as_str())
    }

    /// Return the span of token `tidx` if it has one.
    pub fn token_span(&self, tidx: TIdx<StorageT>) -> Option<Span> {
        self.token_names[usize::from(tidx)]
            .as_ref()
            .map(|(span, _)| *span)
    }

    /// Returns a map from names to `TIdx`s of all tokens that a lexer will need to generate valid
    /// inputs from this grammar.
    pub fn tokens_map(&self) -> HashMap<&str, TIdx<StorageT>> {
        let mut m = HashMap::with_capacity(self.token_names.len() - 1);
        for tidx in self.iter_tidxs() {
            if let Some((_, n)) = self.token_names[usize::from(tidx)].as_ref() {
                m.insert(&**n, tidx);
            }
        }
        m
    }

    /// Return the index of the token named `n` or `None` if it doesn't exist.
    pub fn token_idx(&self, n: &str) -> Option<TIdx<StorageT>> {
        self.token_names
            .iter()
            .position(|x| x.as_ref().is_some_and(|(_, x)| x == n))
            .map(|x| TIdx(x.as_()))
    }

    /// Return a printable name for `sym`: the rule name, the token name in quotes, or `$` for
    /// the end-of-input token.
    pub fn symbol_name(&self, sym: Symbol<StorageT>) -> String {
        match sym {
            Symbol::Rule(ridx) => self.rule_name_str(ridx).to_string(),
            Symbol::Token(tidx) => match self.token_name(tidx) {
                Some(n) => format!("'{}'", n),
                None => "$".to_string(),
            },
        }
    }

    /// Returns the string representation of a given production `pidx`, e.g. `E -> T '+' E`.
    pub fn pp_prod(&self, pidx: PIdx<StorageT>) -> String {
        let mut sprod = String::new();
        sprod.push_str(self.rule_name_str(self.prod_to_rule(pidx)));
        sprod.push_str(" ->");
        for &sym in self.prod(pidx) {
            sprod.push(' ');
            sprod.push_str(&self.symbol_name(sym));
        }
        sprod
    }

    /// Return the FIRST sets of this grammar.
    pub fn firsts(&self) -> Firsts<StorageT> {
        Firsts::new(self)
    }
}

#[cfg(test)]
mod test {
    use super::Grammar;
    use crate::{parser::GrammarErrorKind, PIdx, RIdx, Span, Symbol, TIdx};

    #[test]
    fn test_minimal() {
        let grm = Grammar::new("%start R %token T %% R: 'T';").unwrap();

        assert_eq!(grm.start_prod(), PIdx(0));
        assert_eq!(grm.prods_len(), PIdx(2));
        assert_eq!(grm.rules_len(), RIdx(2));
        assert_eq!(grm.tokens_len(), TIdx(2));
        assert_eq!(grm.start_rule_idx(), RIdx(0));
        assert_eq!(grm.rule_name_str(RIdx(0)), "^");
        assert_eq!(grm.rule_idx("R"), Some(RIdx(1)));
        assert_eq!(grm.prod(PIdx(0)), &[Symbol::Rule(RIdx(1))]);
        assert_eq!(grm.prod(PIdx(1)), &[Symbol::Token(TIdx(0))]);
        assert_eq!(grm.prod_to_rule(PIdx(1)), RIdx(1));
        assert_eq!(grm.token_idx("T"), Some(TIdx(0)));
        assert_eq!(grm.eof_token_idx(), TIdx(1));
        assert_eq!(grm.token_name(grm.eof_token_idx()), None);
        assert_eq!(grm.token_span(TIdx(0)), Some(Span::new(16, 17)));
    }

    #[test]
    fn test_rule_ref_and_order() {
        let grm = Grammar::new(
            "%start R
             %%
             R : 'T' S | S;
             S : 'U' ;
             R : 'V';",
        )
        .unwrap();

        let r = grm.rule_idx("R").unwrap();
        let s = grm.rule_idx("S").unwrap();
        assert_eq!((r, s), (RIdx(1), RIdx(2)));
        // Productions keep their textual order, even when a rule is split.
        assert_eq!(grm.rule_to_prods(r), &[PIdx(1), PIdx(2), PIdx(4)]);
        assert_eq!(grm.rule_to_prods(s), &[PIdx(3)]);
        assert_eq!(grm.prod_len(PIdx(1)).as_storaget(), 2);
        assert_eq!(
            grm.prod(PIdx(1)),
            &[Symbol::Token(grm.token_idx("T").unwrap()), Symbol::Rule(s)]
        );
        assert_eq!(
            grm.iter_tidxs().collect::<Vec<_>>(),
            vec![TIdx(0), TIdx(1), TIdx(2), TIdx(3)]
        );
        assert_eq!(grm.tokens_map().len(), 3);
    }

    #[test]
    fn test_start_rule_name_is_fresh() {
        let grm = Grammar::new("%%\nA: '^';").unwrap();
        assert_eq!(grm.rule_name_str(grm.start_rule_idx()), "^");
        assert_eq!(grm.token_idx("^"), Some(TIdx(0)));
    }

    #[test]
    fn test_pp_prod() {
        let grm = Grammar::new("%token id %% E: E '+' id | ;").unwrap();
        assert_eq!(grm.pp_prod(PIdx(0)), "^ -> E");
        assert_eq!(grm.pp_prod(PIdx(1)), "E -> E '+' 'id'");
        assert_eq!(grm.pp_prod(PIdx(2)), "E ->");
        assert_eq!(
            grm.symbol_name(Symbol::Token(grm.eof_token_idx())),
            "$"
        );
    }

    #[test]
    fn test_unknown_rule_ref() {
        let e = Grammar::new("%%\nA: B 'x';").unwrap_err();
        assert_eq!(e.kind, GrammarErrorKind::UnknownRuleRef("B".to_string()));
        assert_eq!(e.span, Span::new(6, 7));
    }

    #[test]
    fn test_invalid_start_rule() {
        let e = Grammar::new("%start B\n%%\nA: 'x';").unwrap_err();
        assert_eq!(e.kind, GrammarErrorKind::InvalidStartRule("B".to_string()));
    }

    #[test]
    fn test_storage_too_small() {
        let mut src = String::from("%%\nA:");
        for i in 0..300 {
            src.push_str(&format!(" 't{}'", i));
        }
        src.push(';');
        let e = Grammar::<u8>::new_with_storaget(&src).unwrap_err();
        assert_eq!(e.kind, GrammarErrorKind::StorageTooSmall);
        assert!(Grammar::<u16>::new_with_storaget(&src).is_ok());
    }
}
