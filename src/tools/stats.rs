//! Small numeric helpers shared by the data capabilities.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::hash::Hash;

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Sample standard deviation (n - 1 denominator).
pub fn std_dev(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let m = mean(values)?;
    let var = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    Some(var.sqrt())
}

/// Quantile with linear interpolation between closest ranks.
pub fn quantile(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let pos = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * frac)
}

pub fn median(values: &[f64]) -> Option<f64> {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    quantile(&sorted, 0.5)
}

/// Most frequent value; ties go to the smallest.
pub fn mode_by<T, F>(values: &[T], cmp: F) -> Option<T>
where
    T: Clone,
    F: Fn(&T, &T) -> Ordering,
{
    let mut sorted = values.to_vec();
    sorted.sort_by(&cmp);

    let mut best: Option<(T, usize)> = None;
    let mut idx = 0;
    while idx < sorted.len() {
        let mut end = idx + 1;
        while end < sorted.len() && cmp(&sorted[idx], &sorted[end]) == Ordering::Equal {
            end += 1;
        }
        let run = end - idx;
        if best.as_ref().map_or(true, |(_, count)| run > *count) {
            best = Some((sorted[idx].clone(), run));
        }
        idx = end;
    }
    best.map(|(value, _)| value)
}

/// Value counts, most frequent first; ties keep first-appearance order.
pub fn value_counts<T: Eq + Hash + Clone>(values: &[T]) -> Vec<(T, usize)> {
    let mut counts: HashMap<&T, usize> = HashMap::new();
    let mut order: Vec<&T> = Vec::new();
    for value in values {
        let entry = counts.entry(value).or_insert(0);
        if *entry == 0 {
            order.push(value);
        }
        *entry += 1;
    }
    let mut out: Vec<(T, usize)> = order
        .into_iter()
        .map(|v| (v.clone(), counts.get(v).copied().unwrap_or(0)))
        .collect();
    out.sort_by(|a, b| b.1.cmp(&a.1));
    out
}

/// Pearson correlation over rows where both sides are present.
///
/// `None` when fewer than two complete rows remain or either side is constant.
pub fn pearson(x: &[Option<f64>], y: &[Option<f64>]) -> Option<f64> {
    let pairs: Vec<(f64, f64)> = x
        .iter()
        .zip(y)
        .filter_map(|(a, b)| Some(((*a)?, (*b)?)))
        .collect();
    if pairs.len() < 2 {
        return None;
    }
    let n = pairs.len() as f64;
    let mx = pairs.iter().map(|p| p.0).sum::<f64>() / n;
    let my = pairs.iter().map(|p| p.1).sum::<f64>() / n;

    let (mut sxy, mut sxx, mut syy) = (0.0, 0.0, 0.0);
    for (a, b) in &pairs {
        sxy += (a - mx) * (b - my);
        sxx += (a - mx).powi(2);
        syy += (b - my).powi(2);
    }
    if sxx == 0.0 || syy == 0.0 {
        return None;
    }
    Some((sxy / (sxx.sqrt() * syy.sqrt())).clamp(-1.0, 1.0))
}
