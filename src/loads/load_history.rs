//! Load history - the sequence of load factors a nonlinear analysis steps through

use serde::{Deserialize, Serialize};

use crate::error::{FEAError, FEAResult};

/// Cumulative load factors, one per load step.
///
/// Under force control each factor scales the total applied force vector.
/// Under displacement control each factor scales `target_displacement` at the
/// monitored DoF instead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadHistory {
    /// Strictly increasing cumulative factors
    pub factors: Vec<f64>,
    /// Total displacement of the monitored DoF for displacement control (m)
    pub target_displacement: Option<f64>,
}

impl LoadHistory {
    /// A single step to the full load
    pub fn single() -> Self {
        Self::uniform(1)
    }

    /// `steps` equal increments ending at factor 1.0; zero steps gives an
    /// empty history, which `validate` rejects
    pub fn uniform(steps: usize) -> Self {
        Self {
            factors: (1..=steps).map(|i| i as f64 / steps as f64).collect(),
            target_displacement: None,
        }
    }

    /// Explicit cumulative factors
    pub fn from_factors(factors: Vec<f64>) -> Self {
        Self {
            factors,
            target_displacement: None,
        }
    }

    /// Set the total monitored displacement for displacement control
    pub fn with_target_displacement(mut self, target: f64) -> Self {
        self.target_displacement = Some(target);
        self
    }

    /// Number of load steps
    pub fn len(&self) -> usize {
        self.factors.len()
    }

    /// True if the history has no steps
    pub fn is_empty(&self) -> bool {
        self.factors.is_empty()
    }

    /// Factor at the end of step `index` (0-based)
    pub fn factor(&self, index: usize) -> Option<f64> {
        self.factors.get(index).copied()
    }

    /// Check the history is non-empty, finite and strictly increasing
    pub fn validate(&self) -> FEAResult<()> {
        if self.factors.is_empty() {
            return Err(FEAError::InvalidParameters(
                "Load history has no steps".to_string(),
            ));
        }
        let mut previous = 0.0;
        for (i, &f) in self.factors.iter().enumerate() {
            if !f.is_finite() || f <= previous {
                return Err(FEAError::InvalidParameters(format!(
                    "Load factor {} at step {} must be finite and greater than {}",
                    f,
                    i + 1,
                    previous
                )));
            }
            previous = f;
        }
        if let Some(target) = self.target_displacement {
            if !target.is_finite() || target == 0.0 {
                return Err(FEAError::InvalidParameters(
                    "Target displacement must be finite and non-zero".to_string(),
                ));
            }
        }
        Ok(())
    }
}

impl Default for LoadHistory {
    fn default() -> Self {
        Self::single()
    }
}
