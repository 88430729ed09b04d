//! Polar gradient-band interpolation for direction + magnitude blends.
//!
//! Works like the cartesian kernel but measures points in
//! (relative magnitude, doubled angle) space so that e.g. strafe-left and
//! strafe-right at the same speed are treated as equally far from forward.

use super::{dot, normalize};

/// Signed angle from `a` to `b` in radians.
#[inline]
fn angle_rad(a: [f32; 2], b: [f32; 2]) -> f32 {
    (a[0] * b[1] - a[1] * b[0]).atan2(a[0] * b[0] + a[1] * b[1])
}

#[inline]
fn length(p: [f32; 2]) -> f32 {
    (p[0] * p[0] + p[1] * p[1]).sqrt()
}

#[inline]
fn relative(len: f32, from: f32, mean: f32) -> f32 {
    if mean == 0.0 {
        0.0
    } else {
        (len - from) / mean
    }
}

pub(crate) fn weights(points: &[[f32; 2]], p: [f32; 2], weights: &mut [f32]) {
    let p_len = length(p);
    for (i, pi) in points.iter().enumerate() {
        let pi_len = length(*pi);
        let mut min_j = f32::MAX;
        for (j, pj) in points.iter().enumerate() {
            if i == j {
                continue;
            }
            let pj_len = length(*pj);
            let mean = (pj_len + pi_len) / 2.0;
            let pipj = [relative(pj_len, pi_len, mean), angle_rad(*pi, *pj) * 2.0];
            let len_sq = dot(pipj, pipj);
            if len_sq == 0.0 {
                continue;
            }
            let pip = [relative(p_len, pi_len, mean), angle_rad(*pi, p) * 2.0];
            let result = (1.0 - (dot(pip, pipj) / len_sq).abs()).clamp(0.0, 1.0);
            min_j = min_j.min(result);
        }
        weights[i] = if min_j == f32::MAX { 1.0 } else { min_j };
    }
    normalize(weights);
}
