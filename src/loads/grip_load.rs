//! Grip loads - forces applied directly to grips

use serde::{Deserialize, Serialize};

/// A force applied directly to a grip
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct GripLoad {
    /// Force in X direction (N)
    pub fx: f64,
    /// Force in Y direction (N)
    pub fy: f64,
}

impl GripLoad {
    /// Create a grip load with both components
    pub fn force(fx: f64, fy: f64) -> Self {
        Self { fx, fy }
    }

    /// Create a load in X direction
    pub fn fx(value: f64) -> Self {
        Self::force(value, 0.0)
    }

    /// Create a load in Y direction
    pub fn fy(value: f64) -> Self {
        Self::force(0.0, value)
    }

    /// Get the load as an array [FX, FY]
    pub fn as_array(&self) -> [f64; 2] {
        [self.fx, self.fy]
    }

    /// Scale the load by a factor
    pub fn scaled(&self, factor: f64) -> Self {
        Self::force(self.fx * factor, self.fy * factor)
    }
}
