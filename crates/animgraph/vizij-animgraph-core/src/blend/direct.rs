//! Each child is driven by its own parameter.

use super::normalize;

/// `values[i]` feeds child `i`; negatives count as 0 and the result sums to 1
/// (or is all zeros when nothing is positive).
pub(crate) fn weights(values: &[f32], weights: &mut [f32]) {
    for (w, v) in weights.iter_mut().zip(values.iter().copied()) {
        *w = v.max(0.0);
    }
    normalize(weights);
}
