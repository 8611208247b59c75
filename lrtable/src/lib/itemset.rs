use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::hash::Hash;

use cfgrammar::{Firsts, Grammar, PIdx, SIdx, Symbol, TIdx};
use num_traits::{AsPrimitive, PrimInt, Unsigned};
use vob::Vob;

/// An LR(1) item `[A -> a . b, lookahead]`: production `pidx` with `dot` symbols already
/// recognised, valid when followed by the token `lookahead`.
///
/// Items are ordered by lookahead, then dot, then production.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Item<StorageT> {
    pub lookahead: TIdx<StorageT>,
    pub dot: SIdx<StorageT>,
    pub pidx: PIdx<StorageT>,
}

/// A set of LR(1) items. Two itemsets are equal if, and only if, they contain the same items.
#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Itemset<StorageT> {
    items: BTreeSet<Item<StorageT>>,
}

impl<StorageT: 'static + Hash + PrimInt + Unsigned> Itemset<StorageT>
where
    usize: AsPrimitive<StorageT>,
{
    /// Create a blank Itemset.
    pub fn new() -> Self {
        Itemset {
            items: BTreeSet::new(),
        }
    }

    /// Add the item `(pidx, dot, lookahead)` to this itemset. Returns true if the item was not
    /// already present.
    pub fn add(&mut self, pidx: PIdx<StorageT>, dot: SIdx<StorageT>, la: TIdx<StorageT>) -> bool {
        self.items.insert(Item {
            lookahead: la,
            dot,
            pidx,
        })
    }

    pub fn contains(&self, item: &Item<StorageT>) -> bool {
        self.items.contains(item)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Iterate over this itemset's items in their canonical order.
    pub fn iter(&self) -> impl Iterator<Item = &Item<StorageT>> {
        self.items.iter()
    }

    /// Return the symbol after the dot of `item`, or `None` if the item is complete.
    fn next_sym(grm: &Grammar<StorageT>, item: &Item<StorageT>) -> Option<Symbol<StorageT>> {
        grm.prod(item.pidx).get(usize::from(item.dot)).copied()
    }

    /// Create a new itemset which is a closed version of `self`.
    ///
    /// For every item `[A -> a . B b, l]` we add `[B -> . g, t]` for every production `B -> g`
    /// and every token `t` in FIRST(`b l`), repeating until nothing new is added.
    pub fn close(&self, grm: &Grammar<StorageT>, firsts: &Firsts<StorageT>) -> Self {
        let mut new_is = self.clone();
        let mut todo = self.items.iter().copied().collect::<VecDeque<_>>();
        let mut las = Vob::new();
        las.resize(usize::from(grm.tokens_len()), false);
        while let Some(item) = todo.pop_front() {
            let prod = grm.prod(item.pidx);
            let dot = usize::from(item.dot);
            let ridx = match prod.get(dot) {
                Some(Symbol::Rule(ridx)) => *ridx,
                _ => continue,
            };
            las.set_all(false);
            let mut nullable = true;
            for sym in &prod[dot + 1..] {
                match *sym {
                    Symbol::Token(tidx) => {
                        las.set(usize::from(tidx), true);
                        nullable = false;
                        break;
                    }
                    Symbol::Rule(s_ridx) => {
                        las.or(firsts.firsts(s_ridx));
                        if !firsts.is_epsilon_set(s_ridx) {
                            nullable = false;
                            break;
                        }
                    }
                }
            }
            if nullable {
                las.set(usize::from(item.lookahead), true);
            }
            for &pidx in grm.rule_to_prods(ridx) {
                for tidx in las.iter_set_bits(..) {
                    let new_item = Item {
                        // Since las is exactly tokens_len bits long, the call to as_ is safe.
                        lookahead: TIdx(tidx.as_()),
                        dot: SIdx(0usize.as_()),
                        pidx,
                    };
                    if new_is.items.insert(new_item) {
                        todo.push_back(new_item);
                    }
                }
            }
        }
        new_is
    }

    /// Return the unclosed itemsets reached from `self` by every symbol which appears after a
    /// dot, ordered by symbol. Closing each value gives the same result as calling
    /// [`goto`](#method.goto) with its key, but this visits every item only once.
    pub fn transitions(&self, grm: &Grammar<StorageT>) -> BTreeMap<Symbol<StorageT>, Self> {
        let mut trans = BTreeMap::new();
        for item in &self.items {
            if let Some(sym) = Self::next_sym(grm, item) {
                trans
                    .entry(sym)
                    .or_insert_with(Itemset::new)
                    .add(item.pidx, SIdx((usize::from(item.dot) + 1).as_()), item.lookahead);
            }
        }
        trans
    }

    /// Create a new closed Itemset based on calculating the goto of `sym` on the current
    /// Itemset. An empty result means that there is no transition on `sym`.
    pub fn goto(
        &self,
        grm: &Grammar<StorageT>,
        firsts: &Firsts<StorageT>,
        sym: Symbol<StorageT>,
    ) -> Self {
        let mut newis = Itemset::new();
        for item in &self.items {
            if Self::next_sym(grm, item) == Some(sym) {
                newis.add(item.pidx, SIdx((usize::from(item.dot) + 1).as_()), item.lookahead);
            }
        }
        newis.close(grm, firsts)
    }
}
