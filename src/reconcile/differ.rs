use std::collections::HashMap;
use std::hash::Hash;

use smallvec::SmallVec;

/// Matching key of one node within its sibling list.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum DiffKey {
    Id(String),
    Name(String),
    Index(usize),
}

/// One matching decision between the old and the new sibling lists.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DiffOp {
    Add { new: usize },
    Update { old: usize, new: usize },
    Remove { old: usize },
}

/// Key-based list differ.
///
/// Duplicate keys pair up in order of appearance; surplus duplicates on the new side are
/// adds and on the old side removes. `None` entries on the new side never match.
pub struct KeyedDiffer;

impl KeyedDiffer {
    /// Adds and updates come in new-list order, followed by removes in old-list order.
    pub fn diff<K: Eq + Hash>(old: &[K], new: &[Option<K>]) -> Vec<DiffOp> {
        let mut pending: HashMap<&K, SmallVec<[usize; 2]>> = HashMap::with_capacity(old.len());
        for (i, k) in old.iter().enumerate() {
            pending.entry(k).or_default().push(i);
        }

        let mut matched = vec![false; old.len()];
        let mut ops = Vec::with_capacity(new.len() + old.len());
        for (new_idx, key) in new.iter().enumerate() {
            let Some(key) = key else {
                continue;
            };
            let old_idx = pending
                .get_mut(key)
                .filter(|q| !q.is_empty())
                .map(|q| q.remove(0));
            match old_idx {
                Some(old_idx) => {
                    matched[old_idx] = true;
                    ops.push(DiffOp::Update {
                        old: old_idx,
                        new: new_idx,
                    });
                }
                None => ops.push(DiffOp::Add { new: new_idx }),
            }
        }
        ops.extend(
            matched
                .iter()
                .enumerate()
                .filter(|(_, m)| !**m)
                .map(|(old, _)| DiffOp::Remove { old }),
        );
        ops
    }
}

#[cfg(test)]
#[path = "../../tests/unit/reconcile/differ.rs"]
mod tests;
