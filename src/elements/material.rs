//! Material and cross-section properties for bar elements

use serde::{Deserialize, Serialize};

/// Linear elastic bar properties
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Material {
    /// Modulus of elasticity (Young's modulus) in Pa
    pub e: f64,
    /// Cross-sectional area in m²
    pub area: f64,
}

impl Material {
    /// Create a new material with given properties
    pub fn new(e: f64, area: f64) -> Self {
        Self { e, area }
    }

    /// Axial rigidity EA (N)
    pub fn axial_rigidity(&self) -> f64 {
        self.e * self.area
    }

    /// Standard structural steel with the given area
    pub fn steel(area: f64) -> Self {
        Self::new(200e9, area)
    }

    /// Aluminum (6061-T6) with the given area
    pub fn aluminum(area: f64) -> Self {
        Self::new(68.9e9, area)
    }
}

impl Default for Material {
    fn default() -> Self {
        Self::steel(1e-3)
    }
}
