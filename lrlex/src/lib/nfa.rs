use std::collections::{BTreeMap, BTreeSet};

/// The transition label reserved for epsilon moves. Input bytes with this value can never be
/// matched.
pub const EPSILON: u8 = 0;

/// A nondeterministic finite automaton over bytes. States are numbered `0..states_len()`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Nfa {
    transitions: Vec<BTreeMap<u8, BTreeSet<usize>>>,
    start: usize,
    accepts: BTreeSet<usize>,
}

impl Nfa {
    /// Create an NFA with `states_len` states, no transitions and no accept states. Panics if
    /// `start` is not one of those states.
    pub fn new(states_len: usize, start: usize) -> Self {
        assert!(start < states_len);
        Nfa {
            transitions: vec![BTreeMap::new(); states_len],
            start,
            accepts: BTreeSet::new(),
        }
    }

    pub fn states_len(&self) -> usize {
        self.transitions.len()
    }

    pub fn start_state(&self) -> usize {
        self.start
    }

    pub fn accept_states(&self) -> &BTreeSet<usize> {
        &self.accepts
    }

    pub fn is_accept(&self, state: usize) -> bool {
        self.accepts.contains(&state)
    }

    /// Add a transition from `from` to `to` on `byte` (or on epsilon if `byte` is [EPSILON]).
    pub fn add_transition(&mut self, from: usize, byte: u8, to: usize) {
        assert!(to < self.states_len());
        self.transitions[from].entry(byte).or_default().insert(to);
    }

    pub fn add_accept(&mut self, state: usize) {
        assert!(state < self.states_len());
        self.accepts.insert(state);
    }

    /// The states reachable from `state` by consuming `byte`.
    pub fn targets(&self, state: usize, byte: u8) -> Option<&BTreeSet<usize>> {
        self.transitions[state].get(&byte)
    }

    /// Return a copy of `other`'s transitions with every state renumbered by `off`, placed into
    /// `self` at states `off..off + other.states_len()`.
    pub(crate) fn embed(&mut self, other: &Nfa, off: usize) {
        for (s, trans) in other.transitions.iter().enumerate() {
            for (&byte, tos) in trans {
                for &to in tos {
                    self.add_transition(s + off, byte, to + off);
                }
            }
        }
    }

    /// Compute the epsilon closure of every state: the states reachable from it by epsilon moves
    /// alone, itself included.
    ///
    /// A state is inserted into a closure before its epsilon successors are explored, so epsilon
    /// cycles terminate. Closures are computed in state order and a finished closure is reused
    /// wholesale whenever a later computation reaches its state.
    pub fn epsilon_closures(&self) -> Vec<BTreeSet<usize>> {
        let mut closures: Vec<Option<BTreeSet<usize>>> = vec![None; self.states_len()];
        for s in 0..self.states_len() {
            let mut closure = BTreeSet::new();
            let mut todo = vec![s];
            while let Some(t) = todo.pop() {
                if !closure.insert(t) {
                    continue;
                }
                if let Some(done) = &closures[t] {
                    closure.extend(done.iter().copied());
                    continue;
                }
                if let Some(tos) = self.targets(t, EPSILON) {
                    todo.extend(tos.iter().copied());
                }
            }
            closures[s] = Some(closure);
        }
        closures.into_iter().flatten().collect()
    }

    /// Simulate this NFA directly over `input` and return the length of the longest prefix of
    /// `input` it accepts (0 if none does). Matching stops at the first byte from which no
    /// state has a transition.
    pub fn max_accepting_prefix_len(&self, input: &[u8]) -> usize {
        let closures = self.epsilon_closures();
        let mut cur = closures[self.start].clone();
        let mut best = 0;
        for (i, &b) in input.iter().enumerate() {
            if b == EPSILON {
                break;
            }
            let mut next = BTreeSet::new();
            for &s in &cur {
                if let Some(tos) = self.targets(s, b) {
                    for &to in tos {
                        next.extend(closures[to].iter().copied());
                    }
                }
            }
            if next.is_empty() {
                break;
            }
            if next.iter().any(|s| self.is_accept(*s)) {
                best = i + 1;
            }
            cur = next;
        }
        best
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn set(xs: &[usize]) -> BTreeSet<usize> {
        xs.iter().copied().collect()
    }

    #[test]
    fn closure_without_epsilons() {
        let mut nfa = Nfa::new(2, 0);
        nfa.add_transition(0, b'a', 1);
        assert_eq!(nfa.epsilon_closures(), vec![set(&[0]), set(&[1])]);
    }

    #[test]
    fn closure_self_loop() {
        let mut nfa = Nfa::new(2, 0);
        nfa.add_transition(0, EPSILON, 0);
        nfa.add_transition(0, EPSILON, 1);
        assert_eq!(nfa.epsilon_closures(), vec![set(&[0, 1]), set(&[1])]);
    }

    #[test]
    fn closure_mutual_cycle() {
        // 0 -> 1 -> 2 -> 0, 2 -> 3
        let mut nfa = Nfa::new(4, 0);
        nfa.add_transition(0, EPSILON, 1);
        nfa.add_transition(1, EPSILON, 2);
        nfa.add_transition(2, EPSILON, 0);
        nfa.add_transition(2, EPSILON, 3);
        let cls = nfa.epsilon_closures();
        assert_eq!(cls[0], set(&[0, 1, 2, 3]));
        assert_eq!(cls[1], set(&[0, 1, 2, 3]));
        assert_eq!(cls[2], set(&[0, 1, 2, 3]));
        assert_eq!(cls[3], set(&[3]));
    }

    #[test]
    fn closure_reuses_finished_closure() {
        // State 2's closure is finished before 3 reaches it through a cycle with 4.
        let mut nfa = Nfa::new(5, 0);
        nfa.add_transition(2, EPSILON, 1);
        nfa.add_transition(3, EPSILON, 4);
        nfa.add_transition(4, EPSILON, 3);
        nfa.add_transition(4, EPSILON, 2);
        let cls = nfa.epsilon_closures();
        assert_eq!(cls[2], set(&[1, 2]));
        assert_eq!(cls[3], set(&[1, 2, 3, 4]));
        assert_eq!(cls[4], set(&[1, 2, 3, 4]));
    }

    #[test]
    fn simulate() {
        // a(b)* with an epsilon into the loop
        let mut nfa = Nfa::new(3, 0);
        nfa.add_transition(0, b'a', 1);
        nfa.add_transition(1, EPSILON, 2);
        nfa.add_transition(2, b'b', 2);
        nfa.add_accept(2);
        assert_eq!(nfa.max_accepting_prefix_len(b""), 0);
        assert_eq!(nfa.max_accepting_prefix_len(b"a"), 1);
        assert_eq!(nfa.max_accepting_prefix_len(b"abbbc"), 4);
        assert_eq!(nfa.max_accepting_prefix_len(b"ba"), 0);
        assert_eq!(nfa.max_accepting_prefix_len(b"ab\0b"), 2);
    }
}
