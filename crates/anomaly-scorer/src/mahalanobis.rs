//! Mahalanobis Distance Model

use crate::error::ScorerError;
use crate::relation::{Residuals, RESIDUAL_COUNT};
use crate::statistics::covariance;

type Matrix = [[f64; RESIDUAL_COUNT]; RESIDUAL_COUNT];

/// Smallest standard deviation assumed for any component
const ABSOLUTE_STD_FLOOR: f64 = 1e-6;

/// Distance of a residual row from the calibration mean, scaled by the calibration covariance
///
/// A ridge is added to the covariance diagonal so that a constant or
/// perfectly collinear component still gives an invertible matrix, and so
/// that a very quiet calibration does not turn sensor jitter into an anomaly.
#[derive(Debug, Clone)]
pub struct MahalanobisModel {
    mean: Residuals,
    inverse: Matrix,
}

impl MahalanobisModel {
    /// Fit the model; `std_floor` is the ridge standard deviation added to every component
    pub fn fit(data: &[Residuals], std_floor: f64) -> Result<Self, ScorerError> {
        if data.len() < 2 {
            return Err(ScorerError::InsufficientData(format!(
                "{} samples cannot define a covariance",
                data.len()
            )));
        }

        let columns: Vec<Vec<f64>> = (0..RESIDUAL_COUNT)
            .map(|j| data.iter().map(|row| row[j]).collect())
            .collect();

        let mut mean = [0.0; RESIDUAL_COUNT];
        for (j, column) in columns.iter().enumerate() {
            mean[j] = column.iter().sum::<f64>() / column.len() as f64;
        }

        let mut cov: Matrix = [[0.0; RESIDUAL_COUNT]; RESIDUAL_COUNT];
        for i in 0..RESIDUAL_COUNT {
            for j in i..RESIDUAL_COUNT {
                let c = covariance(&columns[i], &columns[j]);
                cov[i][j] = c;
                cov[j][i] = c;
            }
        }

        let floor = std_floor.max(ABSOLUTE_STD_FLOOR);
        for (i, row) in cov.iter_mut().enumerate() {
            row[i] += floor * floor;
        }

        let inverse = invert(&cov).ok_or_else(|| {
            ScorerError::InsufficientData("calibration covariance is singular".to_string())
        })?;

        Ok(Self { mean, inverse })
    }

    /// Mahalanobis distance of `x` from the calibration mean
    pub fn score(&self, x: &Residuals) -> f64 {
        let mut delta = [0.0; RESIDUAL_COUNT];
        for (d, (value, mean)) in delta.iter_mut().zip(x.iter().zip(&self.mean)) {
            *d = value - mean;
        }

        let mut quad = 0.0;
        for i in 0..RESIDUAL_COUNT {
            for j in 0..RESIDUAL_COUNT {
                quad += delta[i] * self.inverse[i][j] * delta[j];
            }
        }
        quad.max(0.0).sqrt()
    }

    /// Calibration mean
    pub fn mean(&self) -> &Residuals {
        &self.mean
    }
}

fn invert(m: &Matrix) -> Option<Matrix> {
    let det = m[0][0] * m[1][1] - m[0][1] * m[1][0];
    if !det.is_finite() || det.abs() < f64::MIN_POSITIVE {
        return None;
    }
    let inv_det = 1.0 / det;
    Some([
        [m[1][1] * inv_det, -m[0][1] * inv_det],
        [-m[1][0] * inv_det, m[0][0] * inv_det],
    ])
}
