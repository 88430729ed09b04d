//! Gradient-band interpolation over freely placed 2D points.

use super::{dot, normalize, sub};

/// For each child, the influence is the smallest projection-based falloff
/// towards any other child; results are normalised to sum to 1.
pub(crate) fn weights(points: &[[f32; 2]], p: [f32; 2], weights: &mut [f32]) {
    for (i, pi) in points.iter().enumerate() {
        let pip = sub(p, *pi);
        let mut min_j = f32::MAX;
        for (j, pj) in points.iter().enumerate() {
            if i == j {
                continue;
            }
            let pipj = sub(*pj, *pi);
            let len_sq = dot(pipj, pipj);
            if len_sq == 0.0 {
                continue;
            }
            let result = (1.0 - dot(pip, pipj) / len_sq).clamp(0.0, 1.0);
            min_j = min_j.min(result);
        }
        weights[i] = if min_j == f32::MAX { 1.0 } else { min_j };
    }
    normalize(weights);
}
