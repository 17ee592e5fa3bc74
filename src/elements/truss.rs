//! Truss element - 2D two-grip bar
//!
//! The default formulation is Total Lagrangian with Green-Lagrange strain,
//! which captures large rotations of the bar (geometric nonlinearity):
//!
//! ```text
//! d   = (X2 - X1) + (u2 - u1)          current bar vector
//! eps = (d.d - L0^2) / (2 L0^2)        Green-Lagrange strain
//! N   = EA eps                         axial force
//! f   = N / L0 [-d; d]                 internal forces
//! K   = EA / L0^3 B B^T + N / L0 G     tangent, B = [-d; d]
//! ```
//!
//! where `G = [[I, -I], [-I, I]]`. The linear formulation uses the
//! undeformed direction cosines only.

use serde::{Deserialize, Serialize};

use super::element::{gather_displacements, grip_by_number};
use super::{FiniteElement, Grip, Material};
use crate::error::{FEAError, FEAResult};
use crate::math::{Mat, Vec as FEVec};

/// Kinematic formulation of a truss
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TrussFormulation {
    /// Small displacements, constant stiffness
    Linear,
    /// Large displacements (Green-Lagrange strain)
    #[default]
    TotalLagrangian,
}

/// A 2D truss (bar) element between two grips
#[derive(Debug, Clone)]
pub struct Truss {
    number: usize,
    grips: [usize; 2],
    material: Material,
    formulation: TrussFormulation,
    stiffness: Mat,
    forces: FEVec,
    displacements: FEVec,
    axial_force: f64,
}

impl Truss {
    /// Create a geometrically nonlinear truss between grips `i` and `j`
    pub fn new(i_grip: usize, j_grip: usize, material: Material) -> Self {
        Self {
            number: 0,
            grips: [i_grip, j_grip],
            material,
            formulation: TrussFormulation::TotalLagrangian,
            stiffness: Mat::zeros(4, 4),
            forces: FEVec::zeros(4),
            displacements: FEVec::zeros(4),
            axial_force: 0.0,
        }
    }

    /// Create a small-displacement truss between grips `i` and `j`
    pub fn linear(i_grip: usize, j_grip: usize, material: Material) -> Self {
        Self::new(i_grip, j_grip, material).with_formulation(TrussFormulation::Linear)
    }

    /// Set the kinematic formulation
    pub fn with_formulation(mut self, formulation: TrussFormulation) -> Self {
        self.formulation = formulation;
        self
    }

    /// Axial force from the last `calculate_forces` (positive = tension)
    pub fn axial_force(&self) -> f64 {
        self.axial_force
    }

    /// Undeformed length
    pub fn length(&self, grips: &[Grip]) -> FEAResult<f64> {
        self.initial_geometry(grips).map(|(_, l0)| l0)
    }

    /// Undeformed bar vector and length
    fn initial_geometry(&self, grips: &[Grip]) -> FEAResult<([f64; 2], f64)> {
        let gi = grip_by_number(grips, self.grips[0])?;
        let gj = grip_by_number(grips, self.grips[1])?;
        let l0 = gi.distance_to(gj);
        if l0 < 1e-10 {
            return Err(FEAError::InvalidInput(format!(
                "Truss {} has zero length: grips {} and {}",
                self.number, self.grips[0], self.grips[1]
            )));
        }
        Ok(([gj.x - gi.x, gj.y - gi.y], l0))
    }

    /// Bar vector used by the formulation: undeformed for linear, current otherwise
    fn bar_vector(&self, x: [f64; 2]) -> [f64; 2] {
        match self.formulation {
            TrussFormulation::Linear => x,
            TrussFormulation::TotalLagrangian => {
                let u = &self.displacements;
                [x[0] + u[2] - u[0], x[1] + u[3] - u[1]]
            }
        }
    }

    /// Axial force for the stored displacements
    fn axial(&self, x: [f64; 2], l0: f64) -> f64 {
        let ea = self.material.axial_rigidity();
        let u = &self.displacements;
        match self.formulation {
            TrussFormulation::Linear => {
                let du = [u[2] - u[0], u[3] - u[1]];
                ea / l0 * (x[0] * du[0] + x[1] * du[1]) / l0
            }
            TrussFormulation::TotalLagrangian => {
                let d = self.bar_vector(x);
                let strain = (d[0] * d[0] + d[1] * d[1] - l0 * l0) / (2.0 * l0 * l0);
                ea * strain
            }
        }
    }
}

impl FiniteElement for Truss {
    fn number(&self) -> usize {
        self.number
    }

    fn set_number(&mut self, number: usize) {
        self.number = number;
    }

    fn grips(&self) -> &[usize] {
        &self.grips
    }

    fn stiffness(&self) -> &Mat {
        &self.stiffness
    }

    fn forces(&self) -> &FEVec {
        &self.forces
    }

    fn displacements(&self) -> &FEVec {
        &self.displacements
    }

    fn update_displacements(&mut self, grips: &[Grip]) -> FEAResult<()> {
        self.displacements = gather_displacements(grips, &self.grips)?;
        Ok(())
    }

    fn update_stiffness(&mut self, grips: &[Grip]) -> FEAResult<()> {
        let (x, l0) = self.initial_geometry(grips)?;
        let ea = self.material.axial_rigidity();
        let d = self.bar_vector(x);
        let b = [-d[0], -d[1], d[0], d[1]];

        let material_factor = ea / (l0 * l0 * l0);
        let geometric_factor = match self.formulation {
            TrussFormulation::Linear => 0.0,
            TrussFormulation::TotalLagrangian => self.axial(x, l0) / l0,
        };

        let mut k = Mat::zeros(4, 4);
        for r in 0..4 {
            for c in 0..4 {
                k[(r, c)] = material_factor * b[r] * b[c];
                // G = [[I, -I], [-I, I]]
                if r % 2 == c % 2 {
                    let sign = if (r < 2) == (c < 2) { 1.0 } else { -1.0 };
                    k[(r, c)] += geometric_factor * sign;
                }
            }
        }
        self.stiffness = k;
        Ok(())
    }

    fn calculate_forces(&mut self, grips: &[Grip]) -> FEAResult<()> {
        let (x, l0) = self.initial_geometry(grips)?;
        let n = self.axial(x, l0);
        let d = self.bar_vector(x);
        let scale = n / l0;
        self.forces = FEVec::from_vec(vec![
            -scale * d[0],
            -scale * d[1],
            scale * d[0],
            scale * d[1],
        ]);
        self.axial_force = n;
        Ok(())
    }
}
