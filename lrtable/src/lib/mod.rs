//! Build canonical LR(1) state graphs and parse tables from a [cfgrammar::Grammar].
//!
//! ```text
//! let grm = Grammar::new(src)?;
//! let (sg, st) = lrtable::from_grammar(&grm)?;
//! ```
//!
//! The state graph is the collection of closed LR(1) itemsets with the goto edges between them;
//! the state table is the ACTION/GOTO table derived from it, with any conflicts it contains
//! resolved and recorded.

use std::{fmt, hash::Hash};

use cfgrammar::Grammar;
use num_traits::{AsPrimitive, PrimInt, Unsigned};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

mod canonical;
pub mod itemset;
mod stategraph;
pub mod statetable;
#[cfg(test)]
mod test_utils;

pub use crate::{
    stategraph::StateGraph,
    statetable::{Action, Conflicts, StateTable, StateTableError, StateTableErrorKind},
};

type StIdxStorageT = u32;

/// StIdx is a wrapper for a state index. Its internal type is private so that we can change it
/// later without breaking users.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct StIdx(StIdxStorageT);

impl StIdx {
    /// A value no real state can have; used to mark empty GOTO entries.
    pub(crate) fn max_value() -> StIdx {
        StIdx(StIdxStorageT::MAX)
    }
}

impl fmt::Display for StIdx {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<StIdxStorageT> for StIdx {
    fn from(v: StIdxStorageT) -> Self {
        StIdx(v)
    }
}

impl From<usize> for StIdx {
    fn from(v: usize) -> Self {
        match StIdxStorageT::try_from(v) {
            Ok(v) => StIdx(v),
            Err(_) => panic!("Overflow"),
        }
    }
}

impl From<StIdx> for usize {
    fn from(st: StIdx) -> Self {
        st.0 as usize
    }
}

impl From<StIdx> for u32 {
    fn from(st: StIdx) -> Self {
        st.0
    }
}

/// Build the canonical LR(1) state graph for `grm` and the state table derived from it.
///
/// Conflicts do not cause an error: they are resolved and can be inspected with
/// [StateTable::conflicts].
pub fn from_grammar<StorageT: 'static + Hash + PrimInt + Unsigned>(
    grm: &Grammar<StorageT>,
) -> Result<(StateGraph<StorageT>, StateTable<StorageT>), StateTableError>
where
    usize: AsPrimitive<StorageT>,
{
    let sg = canonical::canonical_stategraph(grm);
    let st = StateTable::new(grm, &sg)?;
    Ok((sg, st))
}
