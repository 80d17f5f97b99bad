//! Ordered metadata merging
//!
//! Precedence is positional: given layers in order, the first layer that
//! defines a key supplies its entry and later layers are ignored for it.

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

use super::MetaDatum;

/// Merge layers of entries, first-seen key wins
///
/// The result is keyed (and therefore ordered) by entry key.
pub fn merge_first_wins<I, L>(layers: I) -> BTreeMap<String, MetaDatum>
where
    I: IntoIterator<Item = L>,
    L: IntoIterator<Item = MetaDatum>,
{
    let mut merged = BTreeMap::new();
    for layer in layers {
        for datum in layer {
            if let Entry::Vacant(slot) = merged.entry(datum.key.clone()) {
                slot.insert(datum);
            }
        }
    }
    merged
}

/// Effective entries of an item: its local entries over the inherited ones
///
/// Local entries are stamped `inherited = false`, inherited entries
/// `inherited = true`, whatever they carried before.
pub fn effective_entries(
    local: impl IntoIterator<Item = MetaDatum>,
    inherited: impl IntoIterator<Item = MetaDatum>,
) -> Vec<MetaDatum> {
    merge_first_wins([stamp_inherited(local, false), stamp_inherited(inherited, true)])
        .into_values()
        .collect()
}

/// Set the `inherited` flag on every entry
pub fn stamp_inherited(
    entries: impl IntoIterator<Item = MetaDatum>,
    inherited: bool,
) -> Vec<MetaDatum> {
    entries
        .into_iter()
        .map(|datum| MetaDatum { inherited, ..datum })
        .collect()
}
