use crate::{
    dfa::Dfa,
    nfa::{Nfa, EPSILON},
};

/// A regular pattern over bytes, represented by its NFA. Every combinator leaves its operands
/// untouched and returns a new pattern.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Pattern {
    nfa: Nfa,
}

impl Pattern {
    /// Match exactly `text`. The text stops at its first NUL byte, if any. `literal("")` matches
    /// only the empty string.
    pub fn literal(text: &str) -> Self {
        let bytes = text
            .as_bytes()
            .iter()
            .copied()
            .take_while(|b| *b != EPSILON)
            .collect::<Vec<_>>();
        let mut nfa = Nfa::new(bytes.len() + 1, 0);
        for (i, &b) in bytes.iter().enumerate() {
            nfa.add_transition(i, b, i + 1);
        }
        nfa.add_accept(bytes.len());
        Pattern { nfa }
    }

    /// Match any single byte in `bytes`. NUL bytes are ignored.
    pub fn set(bytes: &[u8]) -> Self {
        let mut nfa = Nfa::new(2, 0);
        for &b in bytes {
            if b != EPSILON {
                nfa.add_transition(0, b, 1);
            }
        }
        nfa.add_accept(1);
        Pattern { nfa }
    }

    /// Match any single byte between `lo` and `hi` inclusive. The bounds are swapped if `lo >
    /// hi`.
    pub fn range(lo: u8, hi: u8) -> Self {
        let (lo, hi) = if lo <= hi { (lo, hi) } else { (hi, lo) };
        Pattern::set(&(lo..=hi).collect::<Vec<_>>())
    }

    /// Match `self` followed by `other`.
    pub fn concat(&self, other: &Pattern) -> Self {
        let (a, b) = (&self.nfa, &other.nfa);
        let off = a.states_len();
        let mut nfa = Nfa::new(off + b.states_len(), a.start_state());
        nfa.embed(a, 0);
        nfa.embed(b, off);
        for &s in a.accept_states() {
            nfa.add_transition(s, EPSILON, b.start_state() + off);
        }
        for &s in b.accept_states() {
            nfa.add_accept(s + off);
        }
        Pattern { nfa }
    }

    /// Match either `self` or `other`.
    pub fn union(&self, other: &Pattern) -> Self {
        let (a, b) = (&self.nfa, &other.nfa);
        let off = a.states_len();
        let start = off + b.states_len();
        let accept = start + 1;
        let mut nfa = Nfa::new(accept + 1, start);
        nfa.embed(a, 0);
        nfa.embed(b, off);
        nfa.add_transition(start, EPSILON, a.start_state());
        nfa.add_transition(start, EPSILON, b.start_state() + off);
        for &s in a.accept_states() {
            nfa.add_transition(s, EPSILON, accept);
        }
        for &s in b.accept_states() {
            nfa.add_transition(s + off, EPSILON, accept);
        }
        nfa.add_accept(accept);
        Pattern { nfa }
    }

    /// Match exactly `n` consecutive copies of `self`. `repeat(0)` matches only the empty
    /// string.
    pub fn repeat(&self, n: usize) -> Self {
        let mut p = Pattern::literal("");
        for _ in 0..n {
            p = p.concat(self);
        }
        p
    }

    /// Match at least `min` consecutive copies of `self`.
    pub fn iterate(&self, min: usize) -> Self {
        let mut nfa = self.nfa.clone();
        let start = nfa.start_state();
        for s in self.nfa.accept_states() {
            nfa.add_transition(*s, EPSILON, start);
        }
        nfa.add_accept(start);
        self.repeat(min).concat(&Pattern { nfa })
    }

    /// Wrap a hand-built NFA.
    pub fn from_nfa(nfa: Nfa) -> Self {
        Pattern { nfa }
    }

    /// This pattern's NFA.
    pub fn nfa(&self) -> &Nfa {
        &self.nfa
    }

    /// Convert this pattern into an equivalent [Dfa].
    pub fn compile(&self) -> Dfa {
        Dfa::from_nfa(&self.nfa)
    }
}
