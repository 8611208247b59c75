use std::{collections::BTreeMap, hash::Hash};

use cfgrammar::{Grammar, PIdx, SIdx, Symbol, TIdx};
use fnv::FnvHashMap;
use num_traits::{AsPrimitive, PrimInt, Unsigned};

use crate::{itemset::Itemset, StIdx, StIdxStorageT};

/// The canonical collection of LR(1) item sets and the goto edges between them.
#[derive(Debug)]
pub struct StateGraph<StorageT> {
    /// The closed itemset of each state, indexed by `StIdx`.
    states: Vec<Itemset<StorageT>>,
    start_state: StIdx,
    /// For each state in `states`, edges is a hashmap from symbols to state offsets.
    edges: Vec<FnvHashMap<Symbol<StorageT>, StIdx>>,
}

impl<StorageT: 'static + Hash + PrimInt + Unsigned> StateGraph<StorageT>
where
    usize: AsPrimitive<StorageT>,
{
    pub(crate) fn new(
        states: Vec<Itemset<StorageT>>,
        start_state: StIdx,
        edges: Vec<FnvHashMap<Symbol<StorageT>, StIdx>>,
    ) -> Self {
        // states.len() needs to fit into StIdxStorageT; however we don't need to worry about
        // edges.len() (which merely needs to fit in a usize)
        assert!(StIdxStorageT::try_from(states.len()).is_ok());
        assert_eq!(states.len(), edges.len());
        StateGraph {
            states,
            start_state,
            edges,
        }
    }

    /// Return this state graph's start state.
    pub fn start_state(&self) -> StIdx {
        self.start_state
    }

    /// Return an iterator which produces (in order from `0..self.all_states_len()`) all this
    /// graph's valid `StIdx`s.
    pub fn iter_stidxs(&self) -> impl Iterator<Item = StIdx> {
        // We checked in the constructor that every index fits into StIdxStorageT.
        (0..self.states.len()).map(|x| StIdx(x as StIdxStorageT))
    }

    /// Return the itemset for closed state `stidx`. Panics if `stidx` doesn't exist.
    pub fn closed_state(&self, stidx: StIdx) -> &Itemset<StorageT> {
        &self.states[usize::from(stidx)]
    }

    /// Return an iterator over all closed states in this `StateGraph`.
    pub fn iter_closed_states(&self) -> impl Iterator<Item = &Itemset<StorageT>> {
        self.states.iter()
    }

    /// How many states does this `StateGraph` contain?
    pub fn all_states_len(&self) -> StIdx {
        StIdx(self.states.len() as StIdxStorageT)
    }

    /// Return the state pointed to by `sym` from `stidx` or `None` otherwise.
    pub fn edge(&self, stidx: StIdx, sym: Symbol<StorageT>) -> Option<StIdx> {
        self.edges
            .get(usize::from(stidx))
            .and_then(|x| x.get(&sym))
            .cloned()
    }

    /// Return the edges for state `stidx`. Panics if `stidx` doesn't exist.
    pub fn edges(&self, stidx: StIdx) -> &FnvHashMap<Symbol<StorageT>, StIdx> {
        &self.edges[usize::from(stidx)]
    }

    /// Return the edges for state `stidx` ordered by symbol. Panics if `stidx` doesn't exist.
    pub fn sorted_edges(&self, stidx: StIdx) -> Vec<(Symbol<StorageT>, StIdx)> {
        let mut edges = self.edges[usize::from(stidx)]
            .iter()
            .map(|(&sym, &e_stidx)| (sym, e_stidx))
            .collect::<Vec<_>>();
        edges.sort();
        edges
    }

    /// How many edges does this `StateGraph` contain?
    pub fn all_edges_len(&self) -> usize {
        self.edges.iter().fold(0, |a, x| a + x.len())
    }

    /// Pretty print this stategraph as a `String`. Items which differ only in their lookahead
    /// are printed together. The output is deterministic.
    pub fn pp(&self, grm: &Grammar<StorageT>) -> String {
        fn num_digits(i: usize) -> usize {
            i.to_string().len()
        }

        let width = num_digits(usize::from(self.all_states_len()));
        let mut o = String::new();
        for stidx in self.iter_stidxs() {
            if stidx != self.start_state {
                o.push('\n');
            }
            o.push_str(&format!("{:<w$}", format!("{}:", usize::from(stidx)), w = width + 1));

            let mut cores: BTreeMap<(PIdx<StorageT>, SIdx<StorageT>), Vec<TIdx<StorageT>>> =
                BTreeMap::new();
            for item in self.closed_state(stidx).iter() {
                cores
                    .entry((item.pidx, item.dot))
                    .or_default()
                    .push(item.lookahead);
            }
            for (i, ((pidx, dot), las)) in cores.into_iter().enumerate() {
                if i > 0 {
                    o.push('\n');
                    o.push_str(&" ".repeat(width + 1));
                }
                o.push_str(&format!(
                    " [{} ->",
                    grm.rule_name_str(grm.prod_to_rule(pidx))
                ));
                for (i_sidx, &i_ssym) in grm.prod(pidx).iter().enumerate() {
                    if i_sidx == usize::from(dot) {
                        o.push_str(" .");
                    }
                    o.push_str(&format!(" {}", grm.symbol_name(i_ssym)));
                }
                if usize::from(dot) == grm.prod(pidx).len() {
                    o.push_str(" .");
                }
                let las = las
                    .into_iter()
                    .map(|tidx| grm.symbol_name(Symbol::Token(tidx)))
                    .collect::<Vec<_>>();
                o.push_str(&format!(", {{{}}}]", las.join(", ")));
            }
            for (esym, e_stidx) in self.sorted_edges(stidx) {
                o.push_str(&format!(
                    "\n{}{} -> {}",
                    " ".repeat(width + 2),
                    grm.symbol_name(esym),
                    usize::from(e_stidx)
                ));
            }
        }
        o
    }
}

#[cfg(test)]
mod test {
    use crate::{canonical::canonical_stategraph, StIdx};
    use cfgrammar::{Grammar, Symbol};

    #[test]
    fn test_pp() {
        let grm = Grammar::new("%start A %% A: 'a' | ;").unwrap();
        let sg = canonical_stategraph(&grm);
        assert_eq!(
            sg.pp(&grm),
            "0: [^ -> . A, {$}]
   [A -> . 'a', {$}]
   [A -> ., {$}]
   A -> 1
   'a' -> 2
1: [^ -> A ., {$}]
2: [A -> 'a' ., {$}]"
        );
        assert_eq!(
            sg.sorted_edges(StIdx(0)),
            vec![
                (Symbol::Rule(grm.rule_idx("A").unwrap()), StIdx(1)),
                (Symbol::Token(grm.token_idx("a").unwrap()), StIdx(2)),
            ]
        );
    }
}
