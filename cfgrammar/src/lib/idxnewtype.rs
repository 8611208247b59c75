// Each index type exposes a `usize`/`u32` API, while internally storing a (possibly smaller)
// `StorageT`.

use std::mem::size_of;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use num_traits::{self, PrimInt, Unsigned};

macro_rules! IdxNewtype {
    ($(#[$attr:meta])* $n: ident) => {
        $(#[$attr])*
        #[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
        #[cfg_attr(feature="serde", derive(Serialize, Deserialize))]
        pub struct $n<T>(pub T);

        impl<T: PrimInt + Unsigned> From<$n<T>> for usize {
            fn from(st: $n<T>) -> Self {
                debug_assert!(size_of::<usize>() >= size_of::<T>());
                num_traits::cast(st.0).unwrap()
            }
        }

        impl<T: PrimInt + Unsigned> From<$n<T>> for u32 {
            fn from(st: $n<T>) -> Self {
                debug_assert!(size_of::<u32>() >= size_of::<T>());
                num_traits::cast(st.0).unwrap()
            }
        }

        impl<T: PrimInt + Unsigned> $n<T> {
            pub fn as_storaget(&self) -> T {
                self.0
            }
        }
    }
}

IdxNewtype!(
    /// A rule (i.e. nonterminal) index.
    ///
    /// An `RIdx` converts losslessly into a `usize` with `usize::from(ridx)`.
    RIdx
);
IdxNewtype!(
    /// A production index. A rule `E: A | B;` has two productions, each with its own `PIdx`.
    ///
    /// A `PIdx` converts losslessly into a `usize` with `usize::from(pidx)`.
    PIdx
);
IdxNewtype!(
    /// A symbol position within a production (the "dot" of an LR item is an `SIdx`).
    SIdx
);
IdxNewtype!(
    /// A token (i.e. terminal) index.
    ///
    /// A `TIdx` converts losslessly into a `usize` with `usize::from(tidx)`.
    TIdx
);
