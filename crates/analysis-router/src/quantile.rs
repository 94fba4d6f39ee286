//! Quantile break computation and bucket assignment for choropleth legends.

use serde::{Deserialize, Serialize};

/// Quantile probabilities for the five break points.
const QUANTILES: [f64; 5] = [0.0, 0.25, 0.5, 0.75, 1.0];

/// Number of buckets five breaks describe.
pub const DEFAULT_BUCKET_COUNT: usize = 4;

/// Ordered break points `[min, q1, q2, q3, max]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClassificationBreaks(pub [f64; 5]);

impl Default for ClassificationBreaks {
    fn default() -> Self {
        Self([0.0; 5])
    }
}

impl ClassificationBreaks {
    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    pub fn min(&self) -> f64 {
        self.0[0]
    }

    pub fn max(&self) -> f64 {
        self.0[4]
    }

    /// True when every break is the same value.
    pub fn is_degenerate(&self) -> bool {
        self.0.iter().all(|b| *b == self.0[0])
    }
}

/// One row of a choropleth legend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegendEntry {
    pub bucket: usize,
    pub lower: f64,
    pub upper: f64,
    pub label: String,
    pub count: usize,
}

/// Compute floor-indexed quartile breaks over a sample.
///
/// Break `i` is the sorted element at `floor((n - 1) * p_i)`; there is no
/// interpolation between ranks. Empty input yields `[0, 0, 0, 0, 0]`.
pub fn compute_breaks(values: &[f64]) -> ClassificationBreaks {
    if values.is_empty() {
        return ClassificationBreaks::default();
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    let last = (sorted.len() - 1) as f64;
    let mut breaks = [0.0; 5];
    for (slot, p) in breaks.iter_mut().zip(QUANTILES) {
        let idx = (last * p).floor() as usize;
        *slot = sorted[idx.min(sorted.len() - 1)];
    }
    ClassificationBreaks(breaks)
}

/// Assign a bucket index in `[0, bucket_count)`.
///
/// Walks lower bounds from the highest bucket down and returns the first
/// bucket whose lower bound the value strictly exceeds. A value equal to a
/// boundary stays in the lower bucket; values `<= breaks[1]` are bucket 0.
pub fn classify(value: f64, breaks: &ClassificationBreaks, bucket_count: usize) -> usize {
    let buckets = effective_bucket_count(bucket_count);
    for bucket in (1..buckets).rev() {
        if value > breaks.0[bucket] {
            return bucket;
        }
    }
    0
}

/// Clamp a requested bucket count to what five breaks can describe.
pub fn effective_bucket_count(bucket_count: usize) -> usize {
    bucket_count.clamp(1, QUANTILES.len() - 1)
}

/// Build legend rows for the given breaks, counting how many values land in each bucket.
pub fn legend(
    breaks: &ClassificationBreaks,
    values: &[f64],
    bucket_count: usize,
) -> Vec<LegendEntry> {
    let buckets = effective_bucket_count(bucket_count);
    let mut counts = vec![0usize; buckets];
    for v in values {
        counts[classify(*v, breaks, buckets)] += 1;
    }

    (0..buckets)
        .map(|bucket| {
            let lower = breaks.0[bucket];
            let upper = if bucket + 1 == buckets {
                breaks.max()
            } else {
                breaks.0[bucket + 1]
            };
            LegendEntry {
                bucket,
                lower,
                upper,
                label: format!("{} to {}", format_bound(lower), format_bound(upper)),
                count: counts[bucket],
            }
        })
        .collect()
}

fn format_bound(v: f64) -> String {
    if v.fract() == 0.0 && v.abs() < 1e15 {
        format!("{}", v as i64)
    } else {
        format!("{v:.2}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_floor_quartiles() {
        let breaks = compute_breaks(&[10.0, 20.0, 30.0, 40.0]);
        assert_eq!(breaks.0, [10.0, 10.0, 20.0, 30.0, 40.0]);
    }

    #[test]
    fn test_unsorted_input() {
        let breaks = compute_breaks(&[40.0, 10.0, 30.0, 20.0]);
        assert_eq!(breaks.0, [10.0, 10.0, 20.0, 30.0, 40.0]);
    }

    #[test]
    fn test_empty_default() {
        assert_eq!(compute_breaks(&[]), ClassificationBreaks([0.0; 5]));
    }

    #[test]
    fn test_all_equal() {
        let breaks = compute_breaks(&[5.0, 5.0, 5.0]);
        assert_eq!(breaks.0, [5.0; 5]);
        assert!(breaks.is_degenerate());
        assert_eq!(classify(5.0, &breaks, 4), 0);
    }

    #[test]
    fn test_single_value() {
        let breaks = compute_breaks(&[7.5]);
        assert_eq!(breaks.0, [7.5; 5]);
    }

    #[test]
    fn test_boundary_goes_to_lower_bucket() {
        let breaks = compute_breaks(&[10.0, 20.0, 30.0, 40.0, 50.0]);
        assert_eq!(breaks.0, [10.0, 20.0, 30.0, 40.0, 50.0]);
        // Equal to breaks[2]: below the bucket that starts at breaks[2].
        assert_eq!(classify(30.0, &breaks, 4), 1);
        assert_eq!(classify(30.5, &breaks, 4), 2);
        assert_eq!(classify(20.0, &breaks, 4), 0);
        assert_eq!(classify(50.0, &breaks, 4), 3);
        assert_eq!(classify(-100.0, &breaks, 4), 0);
    }

    #[test]
    fn test_bucket_count_clamped() {
        let breaks = compute_breaks(&[10.0, 20.0, 30.0, 40.0, 50.0]);
        assert_eq!(classify(50.0, &breaks, 0), 0);
        assert_eq!(classify(50.0, &breaks, 2), 1);
        assert_eq!(classify(50.0, &breaks, 99), 3);
    }

    #[test]
    fn test_legend_counts() {
        let values = [10.0, 20.0, 30.0, 40.0, 50.0];
        let breaks = compute_breaks(&values);
        let rows = legend(&breaks, &values, DEFAULT_BUCKET_COUNT);
        assert_eq!(rows.len(), 4);
        assert_eq!(rows.iter().map(|r| r.count).sum::<usize>(), values.len());
        assert_eq!(rows[0].count, 2);
        assert_eq!(rows[3].label, "40 to 50");
    }
}
