//! Overlap enumeration for critical pairs.

use std::ops::Range;

/// Two strings placed over a common word so that they share at least one
/// position and agree wherever they overlap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Overlap<T> {
    /// The smallest word covering both strings
    pub word: Vec<T>,
    /// Where the left string sits inside `word`
    pub left: Range<usize>,
    /// Where the right string sits inside `word`
    pub right: Range<usize>,
}

impl<T: Clone> Overlap<T> {
    /// `word` with `range` replaced by `replacement`.
    pub fn rewrite(&self, range: &Range<usize>, replacement: &[T]) -> Vec<T> {
        splice(&self.word, range.clone(), replacement)
    }
}

/// Returns `s` with `range` replaced by `replacement`.
pub(crate) fn splice<T: Clone>(s: &[T], range: Range<usize>, replacement: &[T]) -> Vec<T> {
    let mut out = Vec::with_capacity(s.len() - range.len() + replacement.len());
    out.extend_from_slice(&s[..range.start]);
    out.extend_from_slice(replacement);
    out.extend_from_slice(&s[range.end..]);
    out
}

/// Enumerates every placement of `right` relative to `left` with a non-empty
/// intersection on which both agree.
///
/// This covers a suffix of `left` matching a prefix of `right`, the mirrored
/// case, and either string containing the other. Placing a string exactly on
/// top of itself is skipped when `left` and `right` are the same string.
pub(crate) fn overlaps<T: PartialEq + Clone>(left: &[T], right: &[T]) -> Vec<Overlap<T>> {
    let mut out = Vec::new();
    if left.is_empty() || right.is_empty() {
        return out;
    }

    let same = left == right;
    let left_len = left.len() as isize;
    let right_len = right.len() as isize;

    // `offset` is where right starts, measured from the start of left.
    for offset in (1 - right_len)..left_len {
        if same && offset == 0 {
            continue;
        }

        let shared_start = offset.max(0);
        let shared_end = (offset + right_len).min(left_len);
        let agrees = (shared_start..shared_end).all(|i| left[i as usize] == right[(i - offset) as usize]);
        if !agrees {
            continue;
        }

        // Shift everything so the word starts at index 0.
        let base = (-offset).max(0);
        let mut word = Vec::with_capacity(((offset + right_len).max(left_len) + base) as usize);
        if offset < 0 {
            word.extend_from_slice(&right[..(-offset) as usize]);
        }
        word.extend_from_slice(left);
        if offset + right_len > left_len {
            word.extend_from_slice(&right[(left_len - offset) as usize..]);
        }

        let left_range = base as usize..(base + left_len) as usize;
        let right_start = (base + offset) as usize;
        out.push(Overlap {
            word,
            left: left_range,
            right: right_start..right_start + right.len(),
        });
    }

    out
}
