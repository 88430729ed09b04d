//! Linear interpolation between the two distinct points bracketing the parameter.

/// Give `share` to every child sitting on `point`, split evenly between them.
fn spread(points: &[f32], point: f32, share: f32, weights: &mut [f32]) {
    let count = points.iter().filter(|p| **p == point).count();
    if count == 0 {
        return;
    }
    let each = share / count as f32;
    for (w, p) in weights.iter_mut().zip(points) {
        if *p == point {
            *w += each;
        }
    }
}

/// Compute weights for children whose `points` are sorted ascending.
///
/// The two distinct points bracketing `value` receive complementary weights,
/// and children on the same point split their side evenly. A value outside
/// `[points[0], points[n-1]]` leaves every weight at 0; it is not clamped to
/// the nearest end.
pub(crate) fn weights(points: &[f32], value: f32, weights: &mut [f32]) {
    weights.fill(0.0);
    if points.len() <= 1 {
        weights.fill(1.0);
        return;
    }

    let (Some(&first), Some(&last)) = (points.first(), points.last()) else {
        return;
    };
    if !(value >= first && value <= last) {
        return;
    }

    let low = points.iter().copied().filter(|p| *p <= value).fold(first, f32::max);
    let high = points.iter().copied().filter(|p| *p >= value).fold(last, f32::min);
    if low == high {
        spread(points, low, 1.0, weights);
        return;
    }

    let t = (value - low) / (high - low);
    spread(points, low, 1.0 - t, weights);
    spread(points, high, t, weights);
}
