//! Grip constraint conditions

use serde::{Deserialize, Serialize};

use super::Axis;

/// Translational restraints at a grip
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Constraint {
    /// Restrained in X translation
    pub dx: bool,
    /// Restrained in Y translation
    pub dy: bool,
}

impl Constraint {
    /// No restraints
    pub fn free() -> Self {
        Self::default()
    }

    /// Both translations restrained
    pub fn fixed() -> Self {
        Self { dx: true, dy: true }
    }

    /// Roller support (Y translation restrained only)
    pub fn roller_y() -> Self {
        Self { dx: false, dy: true }
    }

    /// Roller support (X translation restrained only)
    pub fn roller_x() -> Self {
        Self { dx: true, dy: false }
    }

    /// Restraint flags as [DX, DY]
    pub fn as_array(&self) -> [bool; 2] {
        [self.dx, self.dy]
    }

    /// Check whether one axis is restrained
    pub fn is_restrained(&self, axis: Axis) -> bool {
        self.as_array()[axis.offset()]
    }

    /// Check if any DOF is restrained
    pub fn is_supported(&self) -> bool {
        self.dx || self.dy
    }

    /// Count number of restrained DOFs
    pub fn num_restrained(&self) -> usize {
        self.as_array().iter().filter(|&&r| r).count()
    }
}
