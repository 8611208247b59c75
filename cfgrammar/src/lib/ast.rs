use indexmap::{IndexMap, IndexSet};

use crate::{
    parser::{GrammarError, GrammarErrorKind},
    Span,
};

/// An AST representing a grammar. This is built up gradually by the grammar parser: when it is
/// finished, `complete_and_validate` must be called exactly once before the AST is turned into a
/// [`Grammar`](crate::Grammar).
#[derive(Debug)]
pub struct GrammarAST {
    pub start: Option<(String, Span)>,
    /// Rules in the order they were first defined in the input.
    pub rules: IndexMap<String, Rule>,
    pub prods: Vec<Production>,
    /// Tokens in the order they were declared (explicitly via `%token` or implicitly by being
    /// quoted in a production).
    pub tokens: IndexSet<String>,
    /// The span of each entry in `tokens`.
    pub spans: Vec<Span>,
}

#[derive(Debug)]
pub struct Rule {
    pub name: (String, Span),
    /// Indexes into `GrammarAST::prods`.
    pub pidxs: Vec<usize>,
}

#[derive(Debug, Eq, PartialEq)]
pub struct Production {
    pub symbols: Vec<Symbol>,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Symbol {
    Rule(String, Span),
    Token(String, Span),
}

impl GrammarAST {
    pub fn new() -> GrammarAST {
        GrammarAST {
            start: None,
            rules: IndexMap::new(),
            prods: Vec::new(),
            tokens: IndexSet::new(),
            spans: Vec::new(),
        }
    }

    /// Add a rule named `name` if it doesn't already exist.
    pub fn add_rule(&mut self, (name, span): (String, Span)) {
        if !self.rules.contains_key(&name) {
            self.rules.insert(
                name.clone(),
                Rule {
                    name: (name, span),
                    pidxs: Vec::new(),
                },
            );
        }
    }

    /// Append a production to rule `rule_name`, which must already have been added.
    pub fn add_prod(&mut self, rule_name: &str, symbols: Vec<Symbol>) {
        self.rules[rule_name].pidxs.push(self.prods.len());
        self.prods.push(Production { symbols });
    }

    /// Declare token `name`. Returns `true` if the token had not been seen before.
    pub fn add_token(&mut self, name: String, span: Span) -> bool {
        if self.tokens.insert(name) {
            self.spans.push(span);
            true
        } else {
            false
        }
    }

    pub fn get_rule(&self, name: &str) -> Option<&Rule> {
        self.rules.get(name)
    }

    pub fn has_token(&self, name: &str) -> bool {
        self.tokens.contains(name)
    }

    /// Check that:
    ///   1) a start rule was specified (or implied) and that it is defined,
    ///   2) every rule referenced in a production is defined (and thus has at least one
    ///      production).
    pub(crate) fn complete_and_validate(&self) -> Result<(), GrammarError> {
        match self.start {
            None => {
                return Err(GrammarError {
                    kind: GrammarErrorKind::NoStartRule,
                    span: Span::new(0, 0),
                });
            }
            Some((ref s, span)) => {
                if !self.rules.contains_key(s) {
                    return Err(GrammarError {
                        kind: GrammarErrorKind::InvalidStartRule(s.clone()),
                        span,
                    });
                }
            }
        }
        for rule in self.rules.values() {
            for &pidx in &rule.pidxs {
                for sym in &self.prods[pidx].symbols {
                    if let Symbol::Rule(ref name, span) = *sym {
                        if !self.rules.contains_key(name) {
                            return Err(GrammarError {
                                kind: GrammarErrorKind::UnknownRuleRef(name.clone()),
                                span,
                            });
                        }
                    }
                }
            }
        }
        Ok(())
    }
}
