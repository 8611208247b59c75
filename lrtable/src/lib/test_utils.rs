use std::collections::BTreeSet;

use cfgrammar::{Grammar, SIdx};

use crate::itemset::Itemset;

/// Check that the items of production `prod_off` (an index into the productions of rule
/// `rn`) with the dot at `dot` have exactly the lookaheads `las` in `is`. `$` denotes the
/// end-of-input token.
pub(crate) fn item_exists(
    grm: &Grammar,
    is: &Itemset<u32>,
    rn: &str,
    prod_off: usize,
    dot: usize,
    las: Vec<&str>,
) {
    let pidx = grm.rule_to_prods(grm.rule_idx(rn).unwrap())[prod_off];
    let found = is
        .iter()
        .filter(|item| item.pidx == pidx && item.dot == SIdx(dot as u32))
        .map(|item| grm.token_name(item.lookahead).unwrap_or("$"))
        .collect::<BTreeSet<_>>();
    if found.is_empty() {
        panic!("Can't find item {} {} {}", rn, prod_off, dot);
    }
    assert_eq!(
        found,
        las.into_iter().collect::<BTreeSet<_>>(),
        "lookaheads of {} {} {}",
        rn,
        prod_off,
        dot
    );
}
