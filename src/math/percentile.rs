//! Interpolated percentiles and contrast windows

use num_traits::Float;

/// Percentile with linear interpolation between closest ranks
///
/// `percent` is clamped to `[0, 100]`. NaN samples are ignored; returns `None`
/// when no finite-ordered samples remain.
pub fn percentile<T: Float>(values: &[T], percent: T) -> Option<T> {
    let mut sorted: Vec<T> = values.iter().copied().filter(|v| !v.is_nan()).collect();
    if sorted.is_empty() {
        return None;
    }
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let hundred = T::from(100.0)?;
    let fraction = percent.max(T::zero()).min(hundred) / hundred;
    let rank = fraction * T::from(sorted.len() - 1)?;
    let lower = rank.floor().to_usize()?;
    let upper = rank.ceil().to_usize()?;
    let weight = rank - rank.floor();

    let low = *sorted.get(lower)?;
    let high = *sorted.get(upper)?;
    Some((high - low).mul_add(weight, low))
}

/// Clip to the `[low, high]` percentile window and rescale into `[0, 1]`
///
/// A flat window maps every sample to zero.
pub fn auto_contrast<T: Float>(values: &[T], low_percent: T, high_percent: T) -> Vec<T> {
    let (Some(vmin), Some(vmax)) = (
        percentile(values, low_percent),
        percentile(values, high_percent),
    ) else {
        return vec![T::zero(); values.len()];
    };

    let span = vmax - vmin;
    values
        .iter()
        .map(|&v| {
            if span <= T::zero() || v.is_nan() {
                T::zero()
            } else {
                (v.max(vmin).min(vmax) - vmin) / span
            }
        })
        .collect()
}
