//! Isolation Forest
//!
//! Ensemble of random partitioning trees (Liu et al., 2008). Outliers are
//! isolated in fewer random splits than inliers, so a short average path
//! length means a high anomaly score. All randomness comes from a seeded
//! generator, so a given calibration set always yields the same forest.
//!
//! Split thresholds are drawn from the node's range widened by
//! `split_padding` on each side. Without the padding a point beyond the
//! calibration range follows the extreme calibration point down every tree
//! and scores no higher than it, however far away it lies.

use crate::error::ScorerError;
use crate::relation::{Residuals, RESIDUAL_COUNT};
use rand::rngs::StdRng;
use rand::seq::index;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Euler-Mascheroni constant
const EULER_GAMMA: f64 = 0.577_215_664_901_532_9;

/// Isolation forest configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ForestConfig {
    /// Number of trees in the ensemble
    pub num_trees: usize,
    /// Sub-sample drawn for each tree
    pub sample_size: usize,
    /// Depth limit; defaults to ceil(log2(sample_size))
    pub max_depth: Option<usize>,
    /// Seed for the tree generator
    pub seed: u64,
    /// Widening of each split range, as a fraction of the node's range
    pub split_padding: f64,
}

impl Default for ForestConfig {
    fn default() -> Self {
        Self {
            num_trees: 100,
            sample_size: 256,
            max_depth: None,
            seed: 42,
            split_padding: 0.5,
        }
    }
}

#[derive(Debug, Clone)]
enum Node {
    Leaf {
        size: usize,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: Box<Node>,
        right: Box<Node>,
    },
}

/// Fitted isolation forest
#[derive(Debug, Clone)]
pub struct IsolationForest {
    trees: Vec<Node>,
    /// Average path length of an unsuccessful BST search over the sub-sample
    normalizer: f64,
}

impl IsolationForest {
    /// Grow the forest from calibration residual rows
    pub fn fit(data: &[Residuals], config: &ForestConfig) -> Result<Self, ScorerError> {
        if data.len() < 2 {
            return Err(ScorerError::InsufficientData(format!(
                "{} samples cannot grow an isolation tree",
                data.len()
            )));
        }
        if config.num_trees == 0 || config.sample_size < 2 {
            return Err(ScorerError::InvalidConfig(
                "isolation forest needs at least one tree and a sub-sample of two".to_string(),
            ));
        }
        if !(config.split_padding.is_finite() && config.split_padding >= 0.0) {
            return Err(ScorerError::InvalidConfig(format!(
                "split_padding {} must be a non-negative number",
                config.split_padding
            )));
        }

        let psi = config.sample_size.min(data.len());
        let depth_limit = config
            .max_depth
            .unwrap_or_else(|| (psi as f64).log2().ceil() as usize);
        let mut rng = StdRng::seed_from_u64(config.seed);

        let trees = (0..config.num_trees)
            .map(|_| {
                let rows: Vec<Residuals> = index::sample(&mut rng, data.len(), psi)
                    .into_iter()
                    .map(|i| data[i])
                    .collect();
                grow(rows, 0, depth_limit, config.split_padding, &mut rng)
            })
            .collect();

        debug!(
            "Isolation forest grown: {} trees, sub-sample {}, depth limit {}",
            config.num_trees, psi, depth_limit
        );

        Ok(Self {
            trees,
            normalizer: average_path_length(psi),
        })
    }

    /// Anomaly score in (0, 1]; values near 1 are isolated quickly
    pub fn score(&self, x: &Residuals) -> f64 {
        let total: f64 = self.trees.iter().map(|tree| path_length(tree, x, 0)).sum();
        let mean_path = total / self.trees.len() as f64;
        2f64.powf(-mean_path / self.normalizer)
    }

    /// Number of trees
    pub fn len(&self) -> usize {
        self.trees.len()
    }

    /// Check if forest has no trees
    pub fn is_empty(&self) -> bool {
        self.trees.is_empty()
    }
}

fn grow(rows: Vec<Residuals>, depth: usize, limit: usize, padding: f64, rng: &mut StdRng) -> Node {
    if depth >= limit || rows.len() <= 1 {
        return Node::Leaf { size: rows.len() };
    }

    // Only features that still vary can split
    let mut candidates = Vec::with_capacity(RESIDUAL_COUNT);
    for feature in 0..RESIDUAL_COUNT {
        let (min, max) = rows.iter().fold((f64::MAX, f64::MIN), |(lo, hi), row| {
            (lo.min(row[feature]), hi.max(row[feature]))
        });
        if max > min {
            candidates.push((feature, min, max));
        }
    }
    if candidates.is_empty() {
        return Node::Leaf { size: rows.len() };
    }

    let (feature, min, max) = candidates[rng.gen_range(0..candidates.len())];
    let pad = (max - min) * padding;
    let threshold = rng.gen_range(min - pad..max + pad);
    let (left, right): (Vec<_>, Vec<_>) = rows.into_iter().partition(|row| row[feature] < threshold);

    Node::Split {
        feature,
        threshold,
        left: Box::new(grow(left, depth + 1, limit, padding, rng)),
        right: Box::new(grow(right, depth + 1, limit, padding, rng)),
    }
}

fn path_length(node: &Node, x: &Residuals, depth: usize) -> f64 {
    match node {
        Node::Leaf { size } => depth as f64 + average_path_length(*size),
        Node::Split {
            feature,
            threshold,
            left,
            right,
        } => {
            if x[*feature] < *threshold {
                path_length(left, x, depth + 1)
            } else {
                path_length(right, x, depth + 1)
            }
        }
    }
}

fn average_path_length(n: usize) -> f64 {
    match n {
        0 | 1 => 0.0,
        2 => 1.0,
        _ => {
            let n = n as f64;
            2.0 * ((n - 1.0).ln() + EULER_GAMMA) - 2.0 * (n - 1.0) / n
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cruise_residuals() -> Vec<Residuals> {
        (0..100)
            .map(|i| [-0.5 * (i as f64 * 1.3).cos(), 0.3 * (i as f64 * 0.53).sin()])
            .collect()
    }

    fn percentile_score(forest: &IsolationForest, data: &[Residuals], p: f64) -> f64 {
        let scores: Vec<f64> = data.iter().map(|row| forest.score(row)).collect();
        crate::statistics::percentile(&scores, p)
    }

    #[test]
    fn test_average_path_length() {
        assert_eq!(average_path_length(1), 0.0);
        assert_eq!(average_path_length(2), 1.0);
        // c(256) is roughly 10.24
        assert!((average_path_length(256) - 10.24).abs() < 0.05);
    }

    #[test]
    fn test_outlier_scores_above_inlier() {
        let forest = IsolationForest::fit(&cruise_residuals(), &ForestConfig::default()).unwrap();
        let inlier = forest.score(&[0.0, 0.0]);
        let outlier = forest.score(&[25.0, -40.0]);
        assert!(outlier > inlier);
        assert!(outlier > 0.5);
    }

    #[test]
    fn test_distance_beyond_range_raises_score() {
        let data = cruise_residuals();
        let forest = IsolationForest::fit(&data, &ForestConfig::default()).unwrap();
        let edge = forest.score(&[0.5, 0.0]);
        let far = forest.score(&[5.0, 0.0]);
        assert!(far > edge);
        assert!(far > percentile_score(&forest, &data, 1.0));
    }

    #[test]
    fn test_unpadded_forest_saturates_at_range_edge() {
        let data = cruise_residuals();
        let config = ForestConfig {
            split_padding: 0.0,
            ..Default::default()
        };
        let forest = IsolationForest::fit(&data, &config).unwrap();
        assert_eq!(forest.score(&[5.0, 0.0]), forest.score(&[500.0, 0.0]));
    }

    #[test]
    fn test_same_seed_same_scores() {
        let data = cruise_residuals();
        let a = IsolationForest::fit(&data, &ForestConfig::default()).unwrap();
        let b = IsolationForest::fit(&data, &ForestConfig::default()).unwrap();
        let point = [1.2, -0.4];
        assert_eq!(a.score(&point), b.score(&point));
        assert_eq!(a.len(), 100);
    }

    #[test]
    fn test_constant_data_gives_leaves() {
        let data = vec![[0.0, 0.0]; 20];
        let forest = IsolationForest::fit(&data, &ForestConfig::default()).unwrap();
        let score = forest.score(&[0.0, 0.0]);
        assert!(score.is_finite());
    }

    #[test]
    fn test_invalid_config() {
        let config = ForestConfig {
            num_trees: 0,
            ..Default::default()
        };
        assert!(matches!(
            IsolationForest::fit(&cruise_residuals(), &config),
            Err(ScorerError::InvalidConfig(_))
        ));

        let config = ForestConfig {
            split_padding: -1.0,
            ..Default::default()
        };
        assert!(matches!(
            IsolationForest::fit(&cruise_residuals(), &config),
            Err(ScorerError::InvalidConfig(_))
        ));
    }
}
