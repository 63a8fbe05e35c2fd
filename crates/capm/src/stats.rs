//! Sample statistics over paired return observations.
//!
//! All estimators use the sample (n - 1) convention.

/// Variances at or below this are treated as zero.
pub const VARIANCE_TOLERANCE: f64 = 1e-20;

/// Keep rows where both values are defined and finite.
pub fn paired(x: &[Option<f64>], y: &[Option<f64>]) -> (Vec<f64>, Vec<f64>) {
    x.iter()
        .zip(y)
        .filter_map(|pair| match pair {
            (Some(a), Some(b)) if a.is_finite() && b.is_finite() => Some((*a, *b)),
            _ => None,
        })
        .unzip()
}

/// Defined, finite values of a column.
pub fn defined(values: &[Option<f64>]) -> Vec<f64> {
    values
        .iter()
        .filter_map(|v| v.filter(|x| x.is_finite()))
        .collect()
}

/// Arithmetic mean; `None` for an empty slice.
pub fn mean(data: &[f64]) -> Option<f64> {
    if data.is_empty() {
        return None;
    }
    Some(data.iter().sum::<f64>() / data.len() as f64)
}

/// Sample covariance; `None` with fewer than two pairs.
pub fn sample_covariance(x: &[f64], y: &[f64]) -> Option<f64> {
    let n = x.len().min(y.len());
    if n < 2 {
        return None;
    }
    let (x, y) = (&x[..n], &y[..n]);
    let mx = mean(x)?;
    let my = mean(y)?;
    let sum: f64 = x.iter().zip(y).map(|(a, b)| (a - mx) * (b - my)).sum();
    Some(sum / (n - 1) as f64)
}

/// Sample variance; `None` with fewer than two values.
pub fn sample_variance(data: &[f64]) -> Option<f64> {
    sample_covariance(data, data)
}

/// Pearson correlation clamped to `[-1, 1]`.
///
/// `None` when either side has zero variance or there are fewer than two pairs.
pub fn pearson(x: &[f64], y: &[f64]) -> Option<f64> {
    let vx = sample_variance(x)?;
    let vy = sample_variance(y)?;
    if is_degenerate(vx) || is_degenerate(vy) {
        return None;
    }
    let r = sample_covariance(x, y)? / (vx.sqrt() * vy.sqrt());
    Some(r.clamp(-1.0, 1.0))
}

/// Whether a variance is indistinguishable from zero.
pub fn is_degenerate(variance: f64) -> bool {
    variance.abs() <= VARIANCE_TOLERANCE
}
