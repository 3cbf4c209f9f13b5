//! Weighted descriptive statistics over microdata columns
//!
//! Every function takes parallel `values` / `weights` slices. Records with a
//! non-finite value are skipped where noted.

/// Indices of `values` sorted ascending in IEEE total order
fn sorted_indices(values: &[f64]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|&a, &b| values[a].total_cmp(&values[b]));
    order
}

/// Sum of `value * weight`
pub fn weighted_sum(values: &[f64], weights: &[f64]) -> f64 {
    values.iter().zip(weights).map(|(v, w)| v * w).sum()
}

/// Weighted mean, skipping non-finite values. None when no weight remains.
pub fn weighted_mean(values: &[f64], weights: &[f64]) -> Option<f64> {
    let mut total = 0.0;
    let mut weight = 0.0;
    for (&v, &w) in values.iter().zip(weights) {
        if v.is_finite() {
            total += v * w;
            weight += w;
        }
    }
    if weight > 0.0 {
        Some(total / weight)
    } else {
        None
    }
}

/// Weighted Gini coefficient.
///
/// Sorted by value with running totals `cumw` and `cumxw`:
/// `sum(cumxw[i] * cumw[i-1] - cumxw[i-1] * cumw[i]) / (cumxw[n] * cumw[n])`.
/// Returns 0 for empty input or when either total is zero.
pub fn gini(values: &[f64], weights: &[f64]) -> f64 {
    let order = sorted_indices(values);

    let mut cumw = 0.0;
    let mut cumxw = 0.0;
    let mut numerator = 0.0;

    for &i in &order {
        let w = weights[i];
        let prev_cumw = cumw;
        let prev_cumxw = cumxw;
        cumw += w;
        cumxw += values[i] * w;
        numerator += cumxw * prev_cumw - prev_cumxw * cumw;
    }

    let denominator = cumxw * cumw;
    if denominator == 0.0 || !denominator.is_finite() {
        return 0.0;
    }
    numerator / denominator
}

/// Weighted quantile by linear interpolation between weighted midpoints.
///
/// Each record sits at `(cumulative weight - weight / 2) / total weight`;
/// quantiles outside the first and last midpoints clamp to the extremes.
pub fn weighted_quantile(values: &[f64], weights: &[f64], quantile: f64) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let order = sorted_indices(values);
    let total: f64 = weights.iter().sum();
    if total <= 0.0 {
        return None;
    }

    let mut points = Vec::with_capacity(order.len());
    let mut cumulative = 0.0;
    for &i in &order {
        cumulative += weights[i];
        points.push(((cumulative - 0.5 * weights[i]) / total, values[i]));
    }

    let (first_q, first_v) = points[0];
    if quantile <= first_q {
        return Some(first_v);
    }
    for pair in points.windows(2) {
        let (q0, v0) = pair[0];
        let (q1, v1) = pair[1];
        if quantile <= q1 {
            if q1 == q0 {
                return Some(v1);
            }
            return Some(v0 + (v1 - v0) * (quantile - q0) / (q1 - q0));
        }
    }
    points.last().map(|&(_, v)| v)
}

/// Share of the weighted total held by the top `fraction` of the distribution.
///
/// e.g. `top_share(incomes, weights, 0.1)` is the top 10% share.
pub fn top_share(values: &[f64], weights: &[f64], fraction: f64) -> Option<f64> {
    let threshold = weighted_quantile(values, weights, 1.0 - fraction)?;
    let total = weighted_sum(values, weights);
    if total == 0.0 {
        return None;
    }
    let top: f64 = values
        .iter()
        .zip(weights)
        .filter(|(&v, _)| v >= threshold)
        .map(|(v, w)| v * w)
        .sum();
    Some(top / total)
}

/// Percentile rank of each record in (0, 1]: cumulative weight up to and
/// including the record (in ascending order) over total weight.
pub fn weighted_percentile_rank(values: &[f64], weights: &[f64]) -> Vec<f64> {
    let order = sorted_indices(values);
    let total: f64 = weights.iter().sum();
    let mut ranks = vec![0.0; values.len()];
    if total <= 0.0 {
        return ranks;
    }

    let mut cumulative = 0.0;
    for &i in &order {
        cumulative += weights[i];
        ranks[i] = cumulative / total;
    }
    ranks
}

/// Decile (1-10) from a percentile rank.
///
/// Ranks landing on a boundary (0.1, 0.2, ...) belong to the lower decile;
/// the tolerance absorbs rounding in `cumulative / total`.
pub fn decile_of(rank: f64) -> u8 {
    ((rank * 10.0 - 1e-9).ceil() as i64).clamp(1, 10) as u8
}

/// Deciles of each record ranked by value with the given weights
pub fn weighted_deciles(values: &[f64], weights: &[f64]) -> Vec<u8> {
    weighted_percentile_rank(values, weights)
        .into_iter()
        .map(decile_of)
        .collect()
}

/// Relative change from `base` to `new`
pub fn pct_change(base: f64, new: f64) -> f64 {
    (new - base) / base
}
