use std::marker::PhantomData;

use num_traits::{AsPrimitive, PrimInt, Unsigned};
use vob::Vob;

use crate::{Grammar, RIdx, Symbol, TIdx};

/// `Firsts` stores all the first sets for a given grammar. For example, given this code and
/// grammar:
/// ```text
///   let grm = Grammar::new("
///     S: A 'b';
///     A: 'a'
///      | ;").unwrap();
///   let firsts = Firsts::new(&grm);
/// ```
/// then the following assertions (and only the following assertions) about the firsts set are
/// correct:
/// ```text
///   assert!(firsts.is_set(grm.rule_idx("S").unwrap(), grm.token_idx("a").unwrap()));
///   assert!(firsts.is_set(grm.rule_idx("S").unwrap(), grm.token_idx("b").unwrap()));
///   assert!(firsts.is_set(grm.rule_idx("A").unwrap(), grm.token_idx("a").unwrap()));
///   assert!(firsts.is_epsilon_set(grm.rule_idx("A").unwrap()));
/// ```
#[derive(Debug)]
pub struct Firsts<StorageT> {
    firsts: Vec<Vob>,
    /// The nullable marker of each rule.
    epsilons: Vob,
    phantom: PhantomData<StorageT>,
}

impl<StorageT: 'static + PrimInt + Unsigned> Firsts<StorageT>
where
    usize: AsPrimitive<StorageT>,
{
    /// Generates and returns the firsts set for the given grammar.
    pub fn new(grm: &Grammar<StorageT>) -> Self {
        let mut firsts = Firsts::empty(grm);
        while firsts.pass(grm) {}
        firsts
    }

    /// Create a firsts table where every set is empty and no rule is nullable.
    pub fn empty(grm: &Grammar<StorageT>) -> Self {
        let mut proto = Vob::new();
        proto.resize(usize::from(grm.tokens_len()), false);
        let mut epsilons = Vob::new();
        epsilons.resize(usize::from(grm.rules_len()), false);
        Firsts {
            firsts: vec![proto; usize::from(grm.rules_len())],
            epsilons,
            phantom: PhantomData,
        }
    }

    /// Perform a single pass over every production of `grm`, returning `true` if any first set
    /// (or nullable marker) changed. A table is complete when a pass returns `false`.
    ///
    /// For a production `A: X1 ... Xn` the firsts of each `Xi` are folded into those of `A`, from
    /// left to right, stopping after the first `Xi` which is not nullable. If every `Xi` is
    /// nullable (trivially so for an empty production), `A` is nullable.
    pub fn pass(&mut self, grm: &Grammar<StorageT>) -> bool {
        let mut changed = false;
        for pidx in grm.iter_pidxs() {
            let ridx = grm.prod_to_rule(pidx);
            let mut nullable = true;
            for sym in grm.prod(pidx) {
                match *sym {
                    Symbol::Token(s_tidx) => {
                        if !self.set(ridx, s_tidx) {
                            changed = true;
                        }
                        nullable = false;
                        break;
                    }
                    Symbol::Rule(s_ridx) => {
                        // Unioning a rule's firsts with themselves is a no-op.
                        if s_ridx != ridx {
                            let s_firsts = self.firsts[usize::from(s_ridx)].clone();
                            if self.firsts[usize::from(ridx)].or(&s_firsts) {
                                changed = true;
                            }
                        }
                        if !self.is_epsilon_set(s_ridx) {
                            nullable = false;
                            break;
                        }
                    }
                }
            }
            if nullable && !self.is_epsilon_set(ridx) {
                self.epsilons.set(usize::from(ridx), true);
                changed = true;
            }
        }
        changed
    }

    /// Return all the firsts for rule `ridx`.
    pub fn firsts(&self, ridx: RIdx<StorageT>) -> &Vob {
        &self.firsts[usize::from(ridx)]
    }

    /// Returns true if the token `tidx` is in the first set for rule `ridx`.
    pub fn is_set(&self, ridx: RIdx<StorageT>, tidx: TIdx<StorageT>) -> bool {
        self.firsts[usize::from(ridx)][usize::from(tidx)]
    }

    /// Returns true if the rule `ridx` has epsilon in its first set.
    pub fn is_epsilon_set(&self, ridx: RIdx<StorageT>) -> bool {
        self.epsilons[usize::from(ridx)]
    }

    /// Ensures that the firsts bit for token `tidx` rule `ridx` is set. Returns true if
    /// it was already set, or false otherwise.
    pub fn set(&mut self, ridx: RIdx<StorageT>, tidx: TIdx<StorageT>) -> bool {
        let r = &mut self.firsts[usize::from(ridx)];
        if r[usize::from(tidx)] {
            true
        } else {
            r.set(usize::from(tidx), true);
            false
        }
    }
}
