use nalgebra::DMatrix;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Clone)]
pub enum BoxError {
    #[error("Box bounds have inconsistent dimensions: low={low}, high={high}, periodic={periodic}")]
    InconsistentDimensions {
        low: usize,
        high: usize,
        periodic: usize,
    },
    #[error("Upper bound {high} is below lower bound {low} in dimension {dim}")]
    InvertedBounds { dim: usize, low: f64, high: f64 },
    #[error("Periodic dimension {0} must have finite bounds")]
    UnboundedPeriodic(usize),
}

/// A rectangular simulation box.
///
/// The number of entries in `periodic` determines the dimensionality reported by the
/// system the box is attached to.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationBox {
    low: Vec<f64>,
    high: Vec<f64>,
    periodic: Vec<bool>,
}

impl SimulationBox {
    pub fn new(low: Vec<f64>, high: Vec<f64>, periodic: Vec<bool>) -> Result<Self, BoxError> {
        if low.len() != high.len() || low.len() != periodic.len() {
            return Err(BoxError::InconsistentDimensions {
                low: low.len(),
                high: high.len(),
                periodic: periodic.len(),
            });
        }
        for dim in 0..low.len() {
            if high[dim] < low[dim] {
                return Err(BoxError::InvertedBounds {
                    dim,
                    low: low[dim],
                    high: high[dim],
                });
            }
            if periodic[dim] && !(high[dim] - low[dim]).is_finite() {
                return Err(BoxError::UnboundedPeriodic(dim));
            }
        }
        Ok(Self {
            low,
            high,
            periodic,
        })
    }

    /// Creates a box spanning `[0, length]` in every dimension.
    pub fn from_lengths(lengths: &[f64], periodic: Vec<bool>) -> Result<Self, BoxError> {
        Self::new(vec![0.0; lengths.len()], lengths.to_vec(), periodic)
    }

    /// Creates a box without bounds. Such a box cannot be periodic in any dimension.
    pub fn unbounded(periodic: Vec<bool>) -> Result<Self, BoxError> {
        let dim = periodic.len();
        Self::new(
            vec![f64::NEG_INFINITY; dim],
            vec![f64::INFINITY; dim],
            periodic,
        )
    }

    pub fn dim(&self) -> usize {
        self.periodic.len()
    }

    pub fn periodic(&self) -> &[bool] {
        &self.periodic
    }

    pub fn low(&self) -> &[f64] {
        &self.low
    }

    pub fn high(&self) -> &[f64] {
        &self.high
    }

    pub fn length(&self) -> Vec<f64> {
        self.low
            .iter()
            .zip(&self.high)
            .map(|(low, high)| high - low)
            .collect()
    }

    /// Volume of the box; infinite when any dimension is unbounded.
    pub fn volume(&self) -> f64 {
        self.length().iter().product()
    }

    /// Wraps positions back into the box along periodic dimensions.
    pub fn pbc_wrap(&self, pos: &mut DMatrix<f64>) {
        let length = self.length();
        for dim in 0..self.dim().min(pos.ncols()) {
            if !self.periodic[dim] {
                continue;
            }
            for i in 0..pos.nrows() {
                let shifted = pos[(i, dim)] - self.low[dim];
                pos[(i, dim)] = self.low[dim] + shifted.rem_euclid(length[dim]);
            }
        }
    }

    /// Applies the minimum image convention to a displacement vector.
    pub fn pbc_dist_coordinate(&self, dist: &mut [f64]) {
        let length = self.length();
        for (dim, component) in dist.iter_mut().enumerate().take(self.dim()) {
            if self.periodic[dim] {
                *component -= length[dim] * (*component / length[dim]).round();
            }
        }
    }
}
