use std::hash::Hash;

use cfgrammar::{Grammar, SIdx};
use fnv::{FnvBuildHasher, FnvHashMap};
use indexmap::IndexSet;
use num_traits::{AsPrimitive, PrimInt, Unsigned};

use crate::{itemset::Itemset, stategraph::StateGraph, StIdx};

/// Build the canonical collection of LR(1) itemsets for `grm`.
///
/// State 0 is the closure of `[^ -> . S, $]`. States are then explored in the order they were
/// created: each state's transitions are visited in symbol order, and every itemset not seen
/// before is given the next state index. Itemsets are compared by value, so identical states
/// are never duplicated (but, unlike LALR or Pager's algorithm, states with equal cores and
/// different lookaheads are never merged).
pub(crate) fn canonical_stategraph<StorageT: 'static + Hash + PrimInt + Unsigned>(
    grm: &Grammar<StorageT>,
) -> StateGraph<StorageT>
where
    usize: AsPrimitive<StorageT>,
{
    let firsts = grm.firsts();

    let mut start_is = Itemset::new();
    start_is.add(grm.start_prod(), SIdx(0usize.as_()), grm.eof_token_idx());

    let mut states = IndexSet::<Itemset<StorageT>, FnvBuildHasher>::default();
    states.insert(start_is.close(grm, &firsts));
    let mut edges = Vec::new();

    let mut todo = 0;
    while todo < states.len() {
        let mut st_edges = FnvHashMap::default();
        let trans = states[todo].transitions(grm);
        for (sym, kernel) in trans {
            let (e_stidx, _) = states.insert_full(kernel.close(grm, &firsts));
            st_edges.insert(sym, StIdx::from(e_stidx));
        }
        edges.push(st_edges);
        todo += 1;
    }

    StateGraph::new(states.into_iter().collect(), StIdx::from(0usize), edges)
}
