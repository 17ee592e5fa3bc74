//! Grip - a structural node where elements connect

use serde::{Deserialize, Serialize};

use super::Constraint;

/// Translational axis of a grip
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Axis {
    X,
    Y,
}

impl Axis {
    /// Offset of this axis within a grip's DoF pair
    pub fn offset(self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
        }
    }
}

/// A 2D grip in the finite element model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Grip {
    /// X coordinate (m)
    pub x: f64,
    /// Y coordinate (m)
    pub y: f64,
    /// Support condition
    pub constraint: Constraint,
    /// Applied force [FX, FY] (N)
    pub force: [f64; 2],

    /// Grip number, assigned when added to a model (1-based)
    #[serde(skip)]
    pub(crate) number: usize,

    /// Global DoF indices [X, Y]
    #[serde(skip)]
    pub(crate) dofs: [usize; 2],

    /// Current displacement [DX, DY] (m)
    #[serde(skip)]
    pub(crate) displacement: [f64; 2],

    /// Reaction force [FX, FY] (N), zero on free axes
    #[serde(skip)]
    pub(crate) reaction: [f64; 2],
}

impl Grip {
    /// Create a new unconstrained, unloaded grip at the given coordinates
    pub fn new(x: f64, y: f64) -> Self {
        Self {
            x,
            y,
            constraint: Constraint::free(),
            force: [0.0; 2],
            number: 0,
            dofs: [0; 2],
            displacement: [0.0; 2],
            reaction: [0.0; 2],
        }
    }

    /// Set the support condition
    pub fn with_constraint(mut self, constraint: Constraint) -> Self {
        self.constraint = constraint;
        self
    }

    /// Set the applied force
    pub fn with_force(mut self, fx: f64, fy: f64) -> Self {
        self.force = [fx, fy];
        self
    }

    /// Grip number (1-based), 0 before the grip is added to a model
    pub fn number(&self) -> usize {
        self.number
    }

    /// Global DoF indices [X, Y]
    pub fn dofs(&self) -> [usize; 2] {
        self.dofs
    }

    /// Global DoF index for one axis
    pub fn dof(&self, axis: Axis) -> usize {
        self.dofs[axis.offset()]
    }

    /// Get the coordinates as an array
    pub fn coords(&self) -> [f64; 2] {
        [self.x, self.y]
    }

    /// Calculate undeformed distance to another grip
    pub fn distance_to(&self, other: &Grip) -> f64 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        (dx * dx + dy * dy).sqrt()
    }

    /// Current displacement [DX, DY]
    pub fn displacement(&self) -> [f64; 2] {
        self.displacement
    }

    /// Reaction force [FX, FY]; only constrained axes carry a value
    pub fn reaction(&self) -> [f64; 2] {
        self.reaction
    }

    /// Set the displacement, e.g. when pushing a solved global vector down
    pub(crate) fn set_displacement(&mut self, dx: f64, dy: f64) {
        self.displacement = [dx, dy];
    }

    /// Store reactions, masking out free axes
    pub(crate) fn set_reaction(&mut self, rx: f64, ry: f64) {
        let mask = self.constraint.as_array();
        self.reaction = [
            if mask[0] { rx } else { 0.0 },
            if mask[1] { ry } else { 0.0 },
        ];
    }

    /// Assign number and DoF pair from the grip's arena position
    pub(crate) fn assign(&mut self, number: usize) {
        self.number = number;
        self.dofs = [2 * (number - 1), 2 * (number - 1) + 1];
    }
}

impl Default for Grip {
    fn default() -> Self {
        Self::new(0.0, 0.0)
    }
}
