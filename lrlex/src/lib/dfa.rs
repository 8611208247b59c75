use std::collections::BTreeSet;

use fnv::FnvBuildHasher;
use indexmap::IndexSet;
use vob::Vob;

use crate::nfa::{Nfa, EPSILON};

const NO_STATE: usize = usize::MAX;
const ALPHABET_LEN: usize = 256;

/// A deterministic finite automaton over bytes, built from an [Nfa] by subset construction.
/// State 0 is the start state.
#[derive(Clone, Debug)]
pub struct Dfa {
    // A dense `states x 256` table; `NO_STATE` marks a missing transition.
    transitions: Vec<usize>,
    accepts: Vob,
}

impl Dfa {
    /// Build a DFA equivalent to `nfa`. Each DFA state stands for a distinct set of NFA states;
    /// sets are explored breadth first and numbered in the order they are first seen.
    pub(crate) fn from_nfa(nfa: &Nfa) -> Self {
        let closures = nfa.epsilon_closures();
        let mut sets = IndexSet::<BTreeSet<usize>, FnvBuildHasher>::default();
        sets.insert(closures[nfa.start_state()].clone());
        let mut transitions = Vec::new();
        let mut todo = 0;
        while todo < sets.len() {
            let mut row = vec![NO_STATE; ALPHABET_LEN];
            for byte in 1..=u8::MAX {
                debug_assert_ne!(byte, EPSILON);
                let mut next = BTreeSet::new();
                for &s in &sets[todo] {
                    if let Some(tos) = nfa.targets(s, byte) {
                        for &to in tos {
                            next.extend(closures[to].iter().copied());
                        }
                    }
                }
                if !next.is_empty() {
                    let (idx, _) = sets.insert_full(next);
                    row[usize::from(byte)] = idx;
                }
            }
            transitions.extend(row);
            todo += 1;
        }

        let mut accepts = Vob::new();
        accepts.resize(sets.len(), false);
        for (i, set) in sets.iter().enumerate() {
            if set.iter().any(|s| nfa.is_accept(*s)) {
                accepts.set(i, true);
            }
        }
        Dfa {
            transitions,
            accepts,
        }
    }

    pub fn states_len(&self) -> usize {
        self.accepts.len()
    }

    pub fn is_accept(&self, state: usize) -> bool {
        self.accepts.get(state).unwrap_or(false)
    }

    /// The state reached from `state` on `byte`, if any.
    pub fn transition(&self, state: usize, byte: u8) -> Option<usize> {
        match self.transitions.get(state * ALPHABET_LEN + usize::from(byte)) {
            Some(&s) if s != NO_STATE => Some(s),
            _ => None,
        }
    }

    /// Return the length of the longest prefix of `input` this DFA accepts, or 0 if there is
    /// none. Matching stops at the first byte with no transition.
    pub fn max_accepting_prefix_len(&self, input: &[u8]) -> usize {
        let mut state = 0;
        let mut best = 0;
        for (i, &b) in input.iter().enumerate() {
            match self.transition(state, b) {
                Some(s) => state = s,
                None => break,
            }
            if self.is_accept(state) {
                best = i + 1;
            }
        }
        best
    }
}

#[cfg(test)]
mod test {
    use crate::nfa::{Nfa, EPSILON};
    use crate::Pattern;

    #[test]
    fn subset_construction_numbering() {
        // (a|b)c
        let p = Pattern::set(b"ab").concat(&Pattern::literal("c"));
        let dfa = p.compile();
        assert_eq!(dfa.states_len(), 3);
        assert_eq!(dfa.transition(0, b'a'), Some(1));
        assert_eq!(dfa.transition(0, b'b'), Some(1));
        assert_eq!(dfa.transition(0, b'c'), None);
        assert_eq!(dfa.transition(1, b'c'), Some(2));
        assert!(!dfa.is_accept(0));
        assert!(!dfa.is_accept(1));
        assert!(dfa.is_accept(2));
        assert!(!dfa.is_accept(3));
    }

    #[test]
    fn equal_state_sets_are_merged() {
        // Two NFA paths which reach the same set of states must give one DFA state.
        let mut nfa = Nfa::new(3, 0);
        nfa.add_transition(0, b'a', 1);
        nfa.add_transition(0, b'b', 1);
        nfa.add_transition(1, EPSILON, 2);
        nfa.add_transition(2, b'a', 1);
        nfa.add_accept(2);
        let dfa = crate::dfa::Dfa::from_nfa(&nfa);
        assert_eq!(dfa.states_len(), 2);
        assert_eq!(dfa.transition(1, b'a'), Some(1));
        assert_eq!(dfa.max_accepting_prefix_len(b"baaab"), 4);
    }

    #[test]
    fn nul_is_never_matched() {
        let mut nfa = Nfa::new(2, 0);
        nfa.add_transition(0, EPSILON, 1);
        nfa.add_accept(1);
        let dfa = crate::dfa::Dfa::from_nfa(&nfa);
        assert_eq!(dfa.transition(0, 0), None);
        assert_eq!(dfa.max_accepting_prefix_len(b"\0"), 0);
    }

    #[test]
    fn longest_prefix_remembers_last_accept() {
        // "ab" | "abcd": on "abcx" the answer is the earlier accept.
        let p = Pattern::literal("ab").union(&Pattern::literal("abcd"));
        let dfa = p.compile();
        assert_eq!(dfa.max_accepting_prefix_len(b"abcx"), 2);
        assert_eq!(dfa.max_accepting_prefix_len(b"abcd"), 4);
        assert_eq!(dfa.max_accepting_prefix_len(b""), 0);
    }
}
