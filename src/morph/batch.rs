/// One morph unit: a single path on the "one" side paired with the many-side paths it
/// exchanges geometry with.
#[derive(Clone, Debug, PartialEq)]
pub struct MorphBatch<P> {
    pub one: P,
    pub many: Vec<P>,
}

/// Distribute the many-side paths over the one-side paths.
///
/// The k-th path of every many-side element goes to batch `k % one.len()`. Batches left
/// empty then take the back half of a donor batch holding more than one path, scanning
/// donors from the front; distribution stops once no donor has anything to spare.
pub fn prepare_morph_batches<P: Clone>(one: &[P], many: &[Vec<P>]) -> Vec<MorphBatch<P>> {
    let mut batches: Vec<MorphBatch<P>> = one
        .iter()
        .map(|p| MorphBatch {
            one: p.clone(),
            many: Vec::new(),
        })
        .collect();
    let count = batches.len();
    if count == 0 {
        return batches;
    }

    for paths in many {
        for (k, path) in paths.iter().enumerate() {
            batches[k % count].many.push(path.clone());
        }
    }

    let mut off = 0;
    for i in (0..count).rev() {
        if !batches[i].many.is_empty() {
            continue;
        }
        if off >= count || off == i || batches[off].many.len() <= 1 {
            off = 0;
            if off == i || batches[off].many.len() <= 1 {
                break;
            }
        }
        let donor = &mut batches[off].many;
        let mid = donor.len().div_ceil(2);
        let moved = donor.split_off(mid);
        batches[i].many = moved;
        off += 1;
    }
    batches
}

#[cfg(test)]
#[path = "../../tests/unit/morph/batch.rs"]
mod tests;
