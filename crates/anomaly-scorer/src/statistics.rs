//! Summary Statistics

/// Summary statistics for one feature
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FeatureStats {
    /// Mean value
    pub mean: f64,
    /// Sample variance (n - 1)
    pub variance: f64,
    /// Standard deviation
    pub std_dev: f64,
    /// Minimum value
    pub min: f64,
    /// Maximum value
    pub max: f64,
}

impl FeatureStats {
    /// Compute statistics from a slice of values
    pub fn compute(values: &[f64]) -> Self {
        if values.is_empty() {
            return Self::default();
        }

        let n = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;
        let min = values.iter().cloned().fold(f64::MAX, f64::min);
        let max = values.iter().cloned().fold(f64::MIN, f64::max);

        let variance = if values.len() > 1 {
            values.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / (n - 1.0)
        } else {
            0.0
        };

        Self {
            mean,
            variance,
            std_dev: variance.sqrt(),
            min,
            max,
        }
    }

    /// Whether the feature carries no information
    pub fn is_constant(&self) -> bool {
        self.variance <= f64::EPSILON * self.mean.abs().max(1.0)
    }
}

/// Sample covariance of two equally long series
pub fn covariance(a: &[f64], b: &[f64]) -> f64 {
    let n = a.len().min(b.len());
    if n < 2 {
        return 0.0;
    }
    let mean_a = a[..n].iter().sum::<f64>() / n as f64;
    let mean_b = b[..n].iter().sum::<f64>() / n as f64;
    a[..n]
        .iter()
        .zip(&b[..n])
        .map(|(x, y)| (x - mean_a) * (y - mean_b))
        .sum::<f64>()
        / (n - 1) as f64
}

/// Pearson correlation, 0.0 when either series is constant
pub fn correlation(a: &[f64], b: &[f64]) -> f64 {
    let var_a = covariance(a, a);
    let var_b = covariance(b, b);
    if var_a <= 0.0 || var_b <= 0.0 {
        return 0.0;
    }
    (covariance(a, b) / (var_a.sqrt() * var_b.sqrt())).clamp(-1.0, 1.0)
}

/// Linearly interpolated percentile of `values`, `p` in [0, 1]
pub fn percentile(values: &[f64], p: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let rank = p.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    let weight = rank - lower as f64;
    sorted[lower] + (sorted[upper] - sorted[lower]) * weight
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean_and_variance() {
        let stats = FeatureStats::compute(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]);
        assert!((stats.mean - 5.0).abs() < 1e-9);
        // Sample variance of this set is 32 / 7
        assert!((stats.variance - 32.0 / 7.0).abs() < 1e-9);
        assert_eq!(stats.min, 2.0);
        assert_eq!(stats.max, 9.0);
    }

    #[test]
    fn test_constant_feature() {
        let stats = FeatureStats::compute(&[50.0; 20]);
        assert!(stats.is_constant());
        assert!(!FeatureStats::compute(&[50.0, 50.1]).is_constant());
    }

    #[test]
    fn test_empty_values() {
        let stats = FeatureStats::compute(&[]);
        assert_eq!(stats.mean, 0.0);
    }

    #[test]
    fn test_correlation() {
        let a = [1.0, 2.0, 3.0, 4.0];
        let b = [2.0, 4.0, 6.0, 8.0];
        let c = [8.0, 6.0, 4.0, 2.0];
        assert!((correlation(&a, &b) - 1.0).abs() < 1e-9);
        assert!((correlation(&a, &c) + 1.0).abs() < 1e-9);
        assert_eq!(correlation(&a, &[5.0; 4]), 0.0);
    }

    #[test]
    fn test_percentile_interpolates() {
        let values = [4.0, 1.0, 3.0, 2.0, 5.0];
        assert_eq!(percentile(&values, 0.0), 1.0);
        assert_eq!(percentile(&values, 0.5), 3.0);
        assert_eq!(percentile(&values, 1.0), 5.0);
        assert!((percentile(&values, 0.875) - 4.5).abs() < 1e-9);
    }
}
