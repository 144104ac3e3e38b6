use serde::{Deserialize, Serialize};

/// Descriptive statistics for one numeric column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnSummary {
    pub column: String,
    pub count: usize,
    pub mean: f64,
    /// Sample standard deviation; `None` with fewer than two values.
    pub std: Option<f64>,
    pub min: f64,
    pub q25: f64,
    pub median: f64,
    pub q75: f64,
    pub max: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistogramBin {
    pub start: f64,
    pub end: f64,
    pub count: usize,
}

/// Summarize a set of values. Returns `None` for an empty input.
pub fn describe(column: &str, values: &[f64]) -> Option<ColumnSummary> {
    if values.is_empty() {
        return None;
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let count = sorted.len();
    let mean = sorted.iter().sum::<f64>() / count as f64;
    let std = if count > 1 {
        let variance = sorted.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (count - 1) as f64;
        Some(variance.sqrt())
    } else {
        None
    };

    Some(ColumnSummary {
        column: column.to_string(),
        count,
        mean,
        std,
        min: sorted[0],
        q25: quantile(&sorted, 0.25),
        median: quantile(&sorted, 0.5),
        q75: quantile(&sorted, 0.75),
        max: sorted[count - 1],
    })
}

/// Linear-interpolated quantile of already sorted values.
pub fn quantile(sorted: &[f64], q: f64) -> f64 {
    if sorted.is_empty() {
        return f64::NAN;
    }
    let pos = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lower = pos.floor() as usize;
    let upper = pos.ceil() as usize;
    let frac = pos - lower as f64;
    sorted[lower] + (sorted[upper] - sorted[lower]) * frac
}

/// Equal-width histogram over the value range. The last bin is closed on the right.
pub fn histogram(values: &[f64], bins: usize) -> Vec<HistogramBin> {
    if values.is_empty() || bins == 0 {
        return Vec::new();
    }

    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    if min == max {
        return vec![HistogramBin { start: min, end: max, count: values.len() }];
    }

    let width = (max - min) / bins as f64;
    let mut result: Vec<HistogramBin> = (0..bins)
        .map(|i| HistogramBin {
            start: min + width * i as f64,
            end: min + width * (i + 1) as f64,
            count: 0,
        })
        .collect();

    for value in values {
        let idx = (((value - min) / width) as usize).min(bins - 1);
        result[idx].count += 1;
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_describe_matches_sample_statistics() {
        let summary = describe("x", &[4.0, 1.0, 3.0, 2.0]).unwrap();
        assert_eq!(summary.count, 4);
        assert_eq!(summary.mean, 2.5);
        assert!((summary.std.unwrap() - 1.2909944487358056).abs() < 1e-12);
        assert_eq!(summary.min, 1.0);
        assert_eq!(summary.q25, 1.75);
        assert_eq!(summary.median, 2.5);
        assert_eq!(summary.q75, 3.25);
        assert_eq!(summary.max, 4.0);
    }

    #[test]
    fn test_describe_single_value_has_no_std() {
        let summary = describe("x", &[7.0]).unwrap();
        assert_eq!(summary.std, None);
        assert_eq!(summary.median, 7.0);
    }

    #[test]
    fn test_describe_empty() {
        assert!(describe("x", &[]).is_none());
    }

    #[test]
    fn test_histogram_counts_every_value() {
        let values = [0.0, 1.0, 2.0, 3.0, 4.0, 10.0];
        let bins = histogram(&values, 5);
        assert_eq!(bins.len(), 5);
        assert_eq!(bins.iter().map(|b| b.count).sum::<usize>(), values.len());
        assert_eq!(bins[0].count, 2);
        assert_eq!(bins[4].count, 1);
    }

    #[test]
    fn test_histogram_constant_values() {
        let bins = histogram(&[3.0, 3.0], 50);
        assert_eq!(bins.len(), 1);
        assert_eq!(bins[0].count, 2);
    }
}
