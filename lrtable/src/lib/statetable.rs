use std::{cmp::min, error::Error, fmt, hash::Hash, marker::PhantomData};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use cfgrammar::{Grammar, PIdx, RIdx, Symbol, TIdx};
use num_traits::{AsPrimitive, PrimInt, Unsigned};
use packedvec::PackedVec;
use vob::{IterSetBits, Vob};

use crate::{stategraph::StateGraph, StIdx, StIdxStorageT};

/// The various different possible state table errors.
#[derive(Debug, PartialEq, Eq)]
pub enum StateTableErrorKind {
    /// The state graph has more states, or the grammar more productions, than the packed
    /// action table can encode.
    TooManyStates,
}

/// Any error from building a state table returns an instance of this struct.
#[derive(Debug)]
pub struct StateTableError {
    pub kind: StateTableErrorKind,
}

impl Error for StateTableError {}

impl fmt::Display for StateTableError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let s = match self.kind {
            StateTableErrorKind::TooManyStates => "Too many states to encode in a state table",
        };
        write!(f, "{}", s)
    }
}

/// The conflicts found while building a state table. Conflicts are resolved automatically:
/// shift/reduce conflicts in favour of the shift, and reduce/reduce conflicts in favour of
/// whichever action was placed in the table first.
#[derive(Debug)]
pub struct Conflicts<StorageT> {
    /// `(kept, discarded, state)` triples. The kept production is the start production if the
    /// discarded reduce clashed with an accept.
    reduce_reduce: Vec<(PIdx<StorageT>, PIdx<StorageT>, StIdx)>,
    /// `(shifted token, discarded reduce, state)` triples.
    shift_reduce: Vec<(TIdx<StorageT>, PIdx<StorageT>, StIdx)>,
}

impl<StorageT: 'static + Hash + PrimInt + Unsigned> Conflicts<StorageT>
where
    usize: AsPrimitive<StorageT>,
{
    /// Return an iterator over all shift/reduce conflicts.
    pub fn sr_conflicts(&self) -> impl Iterator<Item = &(TIdx<StorageT>, PIdx<StorageT>, StIdx)> {
        self.shift_reduce.iter()
    }

    /// Return an iterator over all reduce/reduce conflicts.
    pub fn rr_conflicts(&self) -> impl Iterator<Item = &(PIdx<StorageT>, PIdx<StorageT>, StIdx)> {
        self.reduce_reduce.iter()
    }

    /// How many shift/reduce conflicts are there?
    pub fn sr_len(&self) -> usize {
        self.shift_reduce.len()
    }

    /// How many reduce/reduce conflicts are there?
    pub fn rr_len(&self) -> usize {
        self.reduce_reduce.len()
    }

    /// Returns a pretty-printed version of the conflicts.
    pub fn pp(&self, grm: &Grammar<StorageT>) -> String {
        let mut s = String::new();
        if self.sr_len() > 0 {
            s.push_str("Shift/Reduce conflicts:\n");
            for (tidx, pidx, stidx) in self.sr_conflicts() {
                s.push_str(&format!(
                    "   State {}: Shift({}) / Reduce({})\n",
                    usize::from(*stidx),
                    grm.symbol_name(Symbol::Token(*tidx)),
                    grm.pp_prod(*pidx)
                ));
            }
        }
        if self.rr_len() > 0 {
            s.push_str("Reduce/Reduce conflicts:\n");
            for (kept, discarded, stidx) in self.rr_conflicts() {
                s.push_str(&format!(
                    "   State {}: Reduce({}) / Reduce({})\n",
                    usize::from(*stidx),
                    grm.pp_prod(*kept),
                    grm.pp_prod(*discarded)
                ));
            }
        }
        s
    }
}

/// A representation of a `StateTable` for a grammar. `actions` and `gotos` are split into two
/// separate tables due to the different types of their values.
#[derive(Debug)]
pub struct StateTable<StorageT> {
    // The ACTION table has one row per state and one column per token; each cell is an
    // encoded `Action`.
    actions: PackedVec<usize>,
    /// One bit per ACTION cell, set when the cell is not `Action::Error`.
    state_actions: Vob,
    // The GOTO table has one row per state and one column per rule. Missing gotos are
    // `StIdx::max_value()`.
    gotos: Vec<StIdx>,
    start_state: StIdx,
    accept_state: StIdx,
    rules_len: RIdx<StorageT>,
    tokens_len: TIdx<StorageT>,
    conflicts: Option<Conflicts<StorageT>>,
}

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Action<StorageT> {
    /// Shift to state X in the statetable.
    Shift(StIdx),
    /// Reduce production X in the grammar.
    Reduce(PIdx<StorageT>),
    /// Accept this input.
    Accept,
    /// No valid action.
    Error,
}

const SHIFT: usize = 1;
const REDUCE: usize = 2;
const ACCEPT: usize = 3;
const ERROR: usize = 0;

impl<StorageT: 'static + Hash + PrimInt + Unsigned> StateTable<StorageT>
where
    usize: AsPrimitive<StorageT>,
{
    pub fn new(
        grm: &Grammar<StorageT>,
        sg: &StateGraph<StorageT>,
    ) -> Result<Self, StateTableError> {
        let states_len = usize::from(sg.all_states_len());
        // We only have usize-2 bits to store state IDs and production indexes
        if states_len > usize::MAX >> 2 || usize::from(grm.prods_len()) > usize::MAX >> 2 {
            return Err(StateTableError {
                kind: StateTableErrorKind::TooManyStates,
            });
        }
        let (maxa, maxg) = match (
            states_len.checked_mul(usize::from(grm.tokens_len())),
            states_len.checked_mul(usize::from(grm.rules_len())),
        ) {
            (Some(maxa), Some(maxg)) => (maxa, maxg),
            _ => {
                return Err(StateTableError {
                    kind: StateTableErrorKind::TooManyStates,
                })
            }
        };
        let mut actions: Vec<usize> = vec![ERROR; maxa];
        let mut state_actions = Vob::new();
        state_actions.resize(maxa, false);
        let mut gotos: Vec<StIdx> = vec![StIdx::max_value(); maxg];

        let mut reduce_reduce = Vec::new();
        let mut shift_reduce = Vec::new();
        let mut accept_state = None;
        let start_prod = grm.start_prod();
        let eof = grm.eof_token_idx();

        for (stidx, state) in sg.iter_stidxs().zip(sg.iter_closed_states()) {
            // Populate shifts and gotos
            for (sym, ref_stidx) in sg.sorted_edges(stidx) {
                match sym {
                    Symbol::Rule(s_ridx) => {
                        let off = gotos_offset(grm.rules_len(), stidx, s_ridx);
                        debug_assert!(gotos[off] == StIdx::max_value());
                        gotos[off] = ref_stidx;
                    }
                    Symbol::Token(s_tidx) => {
                        let off = actions_offset(grm.tokens_len(), stidx, s_tidx);
                        actions[off] = StateTable::encode(Action::Shift(ref_stidx));
                        state_actions.set(off, true);
                    }
                }
            }

            // Populate the accept. The end-of-input token never appears in a production, so it
            // can't already have been given a shift.
            for item in state.iter() {
                if item.pidx == start_prod
                    && item.lookahead == eof
                    && item.dot == grm.prod_len(start_prod)
                {
                    let off = actions_offset(grm.tokens_len(), stidx, eof);
                    actions[off] = StateTable::encode(Action::Accept);
                    state_actions.set(off, true);
                    accept_state = Some(stidx);
                }
            }

            // Populate reduces
            for item in state.iter() {
                if item.pidx == start_prod || item.dot < grm.prod_len(item.pidx) {
                    continue;
                }
                let off = actions_offset(grm.tokens_len(), stidx, item.lookahead);
                match StateTable::decode(actions[off]) {
                    Action::Error => {
                        actions[off] = StateTable::encode(Action::Reduce(item.pidx));
                        state_actions.set(off, true);
                    }
                    Action::Shift(_) => {
                        shift_reduce.push((item.lookahead, item.pidx, stidx));
                    }
                    Action::Reduce(r_pidx) => {
                        if r_pidx != item.pidx {
                            reduce_reduce.push((r_pidx, item.pidx, stidx));
                        }
                    }
                    Action::Accept => {
                        reduce_reduce.push((start_prod, item.pidx, stidx));
                    }
                }
            }
        }

        let conflicts = if reduce_reduce.is_empty() && shift_reduce.is_empty() {
            None
        } else {
            Some(Conflicts {
                reduce_reduce,
                shift_reduce,
            })
        };

        Ok(StateTable {
            actions: PackedVec::<usize, usize>::new_with_storaget(actions),
            state_actions,
            gotos,
            start_state: sg.start_state(),
            // The goto of the start state on the user's start rule always holds the accept
            // item.
            accept_state: accept_state.unwrap_or_else(|| sg.start_state()),
            rules_len: grm.rules_len(),
            tokens_len: grm.tokens_len(),
            conflicts,
        })
    }

    fn decode(bits: usize) -> Action<StorageT> {
        let action = bits & 0b11;
        let val = bits >> 2;

        match action {
            SHIFT => {
                // Since val was originally stored in an StIdxStorageT, we know that it's safe to
                // cast it back to an StIdxStorageT here.
                Action::Shift(StIdx(val as StIdxStorageT))
            }
            REDUCE => Action::Reduce(PIdx(val.as_())),
            ACCEPT => Action::Accept,
            _ => Action::Error,
        }
    }

    fn encode(action: Action<StorageT>) -> usize {
        match action {
            Action::Shift(stidx) => SHIFT | (usize::from(stidx) << 2),
            Action::Reduce(pidx) => REDUCE | (usize::from(pidx) << 2),
            Action::Accept => ACCEPT,
            Action::Error => ERROR,
        }
    }

    /// Return the action for `stidx` and `tidx`.
    pub fn action(&self, stidx: StIdx, tidx: TIdx<StorageT>) -> Action<StorageT> {
        if tidx >= self.tokens_len {
            return Action::Error;
        }
        let off = actions_offset(self.tokens_len, stidx, tidx);
        match self.actions.get(off) {
            Some(bits) => StateTable::decode(bits),
            None => Action::Error,
        }
    }

    /// Return an iterator over the indexes of all non-empty actions of `stidx`. A state not in
    /// this table has none.
    pub fn state_actions(&self, stidx: StIdx) -> StateActionsIterator<StorageT> {
        let len = self.state_actions.len();
        let start = min(usize::from(stidx) * usize::from(self.tokens_len), len);
        let end = min(start + usize::from(self.tokens_len), len);
        StateActionsIterator {
            iter: self.state_actions.iter_set_bits(start..end),
            start,
            phantom: PhantomData,
        }
    }

    /// Return the goto state for `stidx` and `ridx`, or `None` if there isn't any.
    pub fn goto(&self, stidx: StIdx, ridx: RIdx<StorageT>) -> Option<StIdx> {
        if ridx >= self.rules_len {
            return None;
        }
        let off = gotos_offset(self.rules_len, stidx, ridx);
        match self.gotos.get(off) {
            Some(&s) if s != StIdx::max_value() => Some(s),
            _ => None,
        }
    }

    /// Return this table's start state.
    pub fn start_state(&self) -> StIdx {
        self.start_state
    }

    /// Return the state which accepts on the end-of-input token.
    pub fn accept_state(&self) -> StIdx {
        self.accept_state
    }

    /// Return the conflicts found while building this table, or `None` if there were none.
    pub fn conflicts(&self) -> Option<&Conflicts<StorageT>> {
        self.conflicts.as_ref()
    }
}

fn actions_offset<StorageT: PrimInt + Unsigned>(
    tokens_len: TIdx<StorageT>,
    stidx: StIdx,
    tidx: TIdx<StorageT>,
) -> usize {
    usize::from(stidx) * usize::from(tokens_len) + usize::from(tidx)
}

fn gotos_offset<StorageT: PrimInt + Unsigned>(
    rules_len: RIdx<StorageT>,
    stidx: StIdx,
    ridx: RIdx<StorageT>,
) -> usize {
    usize::from(stidx) * usize::from(rules_len) + usize::from(ridx)
}

pub struct StateActionsIterator<'a, StorageT> {
    iter: IterSetBits<'a, usize>,
    start: usize,
    phantom: PhantomData<StorageT>,
}

impl<StorageT: 'static + PrimInt + Unsigned> Iterator for StateActionsIterator<'_, StorageT>
where
    usize: AsPrimitive<StorageT>,
{
    type Item = TIdx<StorageT>;

    fn next(&mut self) -> Option<TIdx<StorageT>> {
        // Since self.iter's IterSetBits range as exactly tokens_len long, by definition `i -
        // self.start` fits into StorageT and thus the as_ call here is safe.
        self.iter.next().map(|i| TIdx((i - self.start).as_()))
    }
}

#[cfg(test)]
mod test {
    use super::{Action, StateTable};
    use crate::{from_grammar, StIdx};
    use cfgrammar::{Grammar, PIdx, Symbol, TIdx};

    #[test]
    fn test_statetable() {
        // Taken from p19 of www.cs.umd.edu/~mvz/cmsc430-s07/M10lr.pdf
        let grm = Grammar::new(
            "
            %start Expr
            %%
            Expr : Term '-' Expr | Term;
            Term : Factor '*' Term | Factor;
            Factor : 'id';
          ",
        )
        .unwrap();
        let (sg, st) = from_grammar(&grm).unwrap();
        assert_eq!(sg.all_states_len(), StIdx::from(9usize));
        assert!(st.conflicts().is_none());

        let s0 = st.start_state();
        assert_eq!(s0, StIdx::from(0usize));
        let s1 = sg.edge(s0, Symbol::Rule(grm.rule_idx("Expr").unwrap())).unwrap();
        let s2 = sg.edge(s0, Symbol::Rule(grm.rule_idx("Term").unwrap())).unwrap();
        let s3 = sg.edge(s0, Symbol::Rule(grm.rule_idx("Factor").unwrap())).unwrap();
        let s4 = sg.edge(s0, Symbol::Token(grm.token_idx("id").unwrap())).unwrap();
        let s5 = sg.edge(s2, Symbol::Token(grm.token_idx("-").unwrap())).unwrap();
        let s6 = sg.edge(s3, Symbol::Token(grm.token_idx("*").unwrap())).unwrap();
        let s7 = sg.edge(s5, Symbol::Rule(grm.rule_idx("Expr").unwrap())).unwrap();
        let s8 = sg.edge(s6, Symbol::Rule(grm.rule_idx("Term").unwrap())).unwrap();

        let id = grm.token_idx("id").unwrap();
        let minus = grm.token_idx("-").unwrap();
        let times = grm.token_idx("*").unwrap();
        let eof = grm.eof_token_idx();
        let state_actions = |stidx| st.state_actions(stidx).collect::<Vec<_>>();

        assert_eq!(st.action(s0, id), Action::Shift(s4));
        assert_eq!(st.action(s0, minus), Action::Error);
        assert_eq!(state_actions(s0), vec![id]);

        assert_eq!(st.action(s1, eof), Action::Accept);
        assert_eq!(st.accept_state(), s1);
        assert_eq!(state_actions(s1), vec![eof]);

        assert_eq!(st.action(s2, minus), Action::Shift(s5));
        assert_eq!(st.action(s2, eof), Action::Reduce(PIdx(2)));
        assert_eq!(st.action(s2, times), Action::Error);

        assert_eq!(st.action(s3, times), Action::Shift(s6));
        assert_eq!(st.action(s3, minus), Action::Reduce(PIdx(4)));
        assert_eq!(st.action(s3, eof), Action::Reduce(PIdx(4)));

        assert_eq!(st.action(s4, times), Action::Reduce(PIdx(5)));
        assert_eq!(st.action(s4, minus), Action::Reduce(PIdx(5)));
        assert_eq!(st.action(s4, eof), Action::Reduce(PIdx(5)));
        assert_eq!(state_actions(s4), vec![minus, times, eof]);

        assert_eq!(st.action(s7, eof), Action::Reduce(PIdx(1)));
        assert_eq!(st.action(s8, minus), Action::Reduce(PIdx(3)));
        assert_eq!(st.action(s8, eof), Action::Reduce(PIdx(3)));

        // Gotos
        assert_eq!(st.goto(s0, grm.rule_idx("Expr").unwrap()), Some(s1));
        assert_eq!(st.goto(s0, grm.rule_idx("Term").unwrap()), Some(s2));
        assert_eq!(st.goto(s0, grm.rule_idx("Factor").unwrap()), Some(s3));
        assert_eq!(st.goto(s5, grm.rule_idx("Expr").unwrap()), Some(s7));
        assert_eq!(st.goto(s6, grm.rule_idx("Term").unwrap()), Some(s8));
        assert_eq!(st.goto(s6, grm.rule_idx("Expr").unwrap()), None);
        assert_eq!(st.goto(s1, grm.rule_idx("Expr").unwrap()), None);
    }

    #[test]
    fn test_encode_decode() {
        for a in [
            Action::Shift(StIdx::from(12usize)),
            Action::Reduce(PIdx(7u32)),
            Action::Accept,
            Action::Error,
        ] {
            assert_eq!(StateTable::<u32>::decode(StateTable::<u32>::encode(a)), a);
        }
    }

    #[test]
    fn test_shift_reduce_resolved_as_shift() {
        let grm = Grammar::new(
            "
            %start S
            %%
            S: 'if' 'e' S | 'if' 'e' S 'else' S | 'x';
          ",
        )
        .unwrap();
        let (_, st) = from_grammar(&grm).unwrap();
        let conflicts = st.conflicts().unwrap();
        assert!(conflicts.sr_len() > 0);
        assert_eq!(conflicts.rr_len(), 0);
        let else_tidx = grm.token_idx("else").unwrap();
        for &(tidx, pidx, stidx) in conflicts.sr_conflicts() {
            assert_eq!(tidx, else_tidx);
            assert_eq!(grm.pp_prod(pidx), "S -> 'if' 'e' S");
            assert!(matches!(st.action(stidx, tidx), Action::Shift(_)));
        }
        assert!(conflicts
            .pp(&grm)
            .starts_with("Shift/Reduce conflicts:\n   State "));
    }

    #[test]
    fn test_reduce_reduce_keeps_first() {
        let grm = Grammar::new(
            "
            %start S
            %%
            S: A | B;
            A: 'x';
            B: 'x';
          ",
        )
        .unwrap();
        let (sg, st) = from_grammar(&grm).unwrap();
        let conflicts = st.conflicts().unwrap();
        assert_eq!(conflicts.sr_len(), 0);
        let sx = sg
            .edge(st.start_state(), Symbol::Token(grm.token_idx("x").unwrap()))
            .unwrap();
        assert_eq!(
            conflicts.rr_conflicts().collect::<Vec<_>>(),
            vec![&(PIdx(3), PIdx(4), sx)]
        );
        assert_eq!(st.action(sx, grm.eof_token_idx()), Action::Reduce(PIdx(3)));
        assert_eq!(
            conflicts.pp(&grm),
            format!(
                "Reduce/Reduce conflicts:\n   State {}: Reduce(A -> 'x') / Reduce(B -> 'x')\n",
                usize::from(sx)
            )
        );
    }

    #[test]
    fn test_accept_wins_over_reduce() {
        let grm = Grammar::new(
            "
            %start S
            %%
            S: T;
            T: S | 'x';
          ",
        )
        .unwrap();
        let (_, st) = from_grammar(&grm).unwrap();
        let eof = grm.eof_token_idx();
        let accept = st.accept_state();
        assert_eq!(st.action(accept, eof), Action::Accept);
        let t_s = grm.rule_to_prods(grm.rule_idx("T").unwrap())[0];
        assert!(st
            .conflicts()
            .unwrap()
            .rr_conflicts()
            .any(|&(kept, discarded, stidx)| kept == grm.start_prod()
                && discarded == t_s
                && stidx == accept));
    }

    #[test]
    fn test_out_of_range_lookups() {
        let grm = Grammar::new("%start S %% S: 'x';").unwrap();
        let (_, st) = from_grammar(&grm).unwrap();
        assert_eq!(st.action(StIdx::from(1000usize), TIdx(0)), Action::Error);
        assert_eq!(st.goto(StIdx::from(1000usize), grm.rule_idx("S").unwrap()), None);
        // A token index beyond the grammar's tokens must not read into the next state's row.
        assert_eq!(st.action(st.start_state(), TIdx(2)), Action::Error);
        assert_eq!(st.state_actions(StIdx::from(1000usize)).count(), 0);
        assert_eq!(st.state_actions(st.start_state()).collect::<Vec<_>>(), vec![TIdx(0)]);
    }
}
