// ─────────────────────────────────────────────────────────────────────
// FPS Simulator — Series Statistics
// ─────────────────────────────────────────────────────────────────────
//! Descriptive statistics over f64 series, shared by the Kuramoto
//! baseline and the validation engine.
//!
//! Variances are population variances (ddof = 0). Empty inputs return
//! neutral values rather than NaN; callers decide on sentinels.

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

pub fn variance(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let m = mean(values);
    values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64
}

pub fn std_dev(values: &[f64]) -> f64 {
    variance(values).sqrt()
}

/// Median (mean of the two middle values for even lengths).
pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    Some(if sorted.len() % 2 == 0 {
        0.5 * (sorted[mid - 1] + sorted[mid])
    } else {
        sorted[mid]
    })
}

pub fn max(values: &[f64]) -> Option<f64> {
    values.iter().copied().reduce(f64::max)
}

/// Unit-spacing numerical gradient: central differences in the interior,
/// one-sided differences at both ends. Fewer than two samples yield an
/// empty vector.
pub fn gradient(values: &[f64]) -> Vec<f64> {
    let n = values.len();
    if n < 2 {
        return Vec::new();
    }
    let mut out = vec![0.0; n];
    out[0] = values[1] - values[0];
    out[n - 1] = values[n - 1] - values[n - 2];
    for i in 1..n - 1 {
        out[i] = 0.5 * (values[i + 1] - values[i - 1]);
    }
    out
}

/// Index of the sample closest to `target` (first one on ties).
pub fn nearest_index(axis: &[f64], target: f64) -> Option<usize> {
    axis.iter()
        .enumerate()
        .fold(None, |best: Option<(usize, f64)>, (i, &v)| {
            let d = (v - target).abs();
            match best {
                Some((_, bd)) if bd <= d => best,
                _ => Some((i, d)),
            }
        })
        .map(|(i, _)| i)
}

/// Equal-width histogram over [min, max] of `values`, as probability
/// densities. A degenerate range is widened to [v - 0.5, v + 0.5]; the
/// maximum falls in the last bin.
pub fn histogram_density(values: &[f64], bins: usize) -> Vec<f64> {
    let mut density = vec![0.0; bins];
    if values.is_empty() || bins == 0 {
        return density;
    }
    let (mut lo, mut hi) = values
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        });
    if lo == hi {
        lo -= 0.5;
        hi += 0.5;
    }
    let step = (hi - lo) / bins as f64;
    let edge = |i: usize| if i == bins { hi } else { lo + i as f64 * step };

    let mut counts = vec![0usize; bins];
    for &v in values {
        let mut idx = (((v - lo) / (hi - lo)) * bins as f64) as usize;
        if idx >= bins {
            idx = bins - 1;
        }
        // Float error can land a value one bin off its edges.
        if idx > 0 && v < edge(idx) {
            idx -= 1;
        } else if idx + 1 < bins && v >= edge(idx + 1) {
            idx += 1;
        }
        counts[idx] += 1;
    }

    let total = values.len() as f64;
    for (i, (d, &c)) in density.iter_mut().zip(&counts).enumerate() {
        let width = edge(i + 1) - edge(i);
        *d = c as f64 / (total * width);
    }
    density
}

/// Shannon entropy (nats) of a `bins`-bin histogram of `values`,
/// each density smoothed by `smoothing` then renormalised.
pub fn histogram_entropy(values: &[f64], bins: usize, smoothing: f64) -> f64 {
    let smoothed: Vec<f64> = histogram_density(values, bins)
        .into_iter()
        .map(|d| d + smoothing)
        .collect();
    let total: f64 = smoothed.iter().sum();
    if !(total.is_finite() && total > 0.0) {
        return 0.0;
    }
    smoothed
        .iter()
        .map(|&d| {
            let p = d / total;
            if p > 0.0 {
                -p * p.ln()
            } else {
                0.0
            }
        })
        .sum()
}
