use crate::common::*;

/// The default frame offsets between reference and search frames.
pub const DEFAULT_DIFF_LIST: &[isize] = &[-1, 1];

/// Pick `(base, base + diff)` frame index pairs for each offset in `diff_list`.
///
/// For every offset, the valid base indices are shuffled and at most
/// `sample_per_diff` of them are kept, or all of them if it is `None`. Pairs
/// of different offsets are independent, so the result may contain repeated
/// pairs.
pub fn pick_pairs<R>(
    sequence_length: usize,
    diff_list: &[isize],
    sample_per_diff: Option<usize>,
    rng: &mut R,
) -> Vec<(usize, usize)>
where
    R: Rng + ?Sized,
{
    let mut pairs = vec![];

    for &diff in diff_list {
        let offset = diff.unsigned_abs();
        if offset >= sequence_length {
            continue;
        }

        let mut bases: Vec<usize> = if diff < 0 {
            (offset..sequence_length).collect()
        } else {
            (0..(sequence_length - offset)).collect()
        };
        bases.shuffle(rng);
        if let Some(limit) = sample_per_diff {
            bases.truncate(limit);
        }

        pairs.extend(bases.into_iter().map(|base| {
            let other = if diff < 0 { base - offset } else { base + offset };
            (base, other)
        }));
    }

    pairs
}

/// The number of pairs [pick_pairs] yields for a sequence of `sequence_length` frames.
pub fn pair_count(
    sequence_length: usize,
    diff_list: &[isize],
    sample_per_diff: Option<usize>,
) -> usize {
    diff_list
        .iter()
        .map(|diff| {
            let valid = sequence_length.saturating_sub(diff.unsigned_abs());
            sample_per_diff.map_or(valid, |limit| limit.min(valid))
        })
        .sum()
}
