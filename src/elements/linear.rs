//! Linear element with a constant, user-supplied global stiffness

use super::element::gather_displacements;
use super::{FiniteElement, Grip};
use crate::error::{FEAError, FEAResult};
use crate::math::{Mat, Vec as FEVec};

/// An element whose internal force is `K u` for a fixed global matrix `K`.
///
/// Useful for springs, condensed substructures and for checking assembly.
#[derive(Debug, Clone)]
pub struct LinearElement {
    number: usize,
    grips: Vec<usize>,
    stiffness: Mat,
    forces: FEVec,
    displacements: FEVec,
}

impl LinearElement {
    /// Create an element over `grips` with the given global stiffness.
    ///
    /// The matrix must be square with two rows per grip.
    pub fn new(grips: Vec<usize>, stiffness: Mat) -> FEAResult<Self> {
        let n = 2 * grips.len();
        if grips.is_empty() || stiffness.nrows() != n || stiffness.ncols() != n {
            return Err(FEAError::InvalidInput(format!(
                "Linear element over {} grips needs a {n}x{n} stiffness, got {}x{}",
                grips.len(),
                stiffness.nrows(),
                stiffness.ncols()
            )));
        }
        Ok(Self {
            number: 0,
            grips,
            stiffness,
            forces: FEVec::zeros(n),
            displacements: FEVec::zeros(n),
        })
    }

    /// Two-grip axial spring of stiffness `k` along the direction `(cx, cy)`
    pub fn spring(i_grip: usize, j_grip: usize, k: f64, direction: [f64; 2]) -> FEAResult<Self> {
        let len = (direction[0].powi(2) + direction[1].powi(2)).sqrt();
        if len < 1e-12 {
            return Err(FEAError::InvalidInput("Spring direction must be non-zero".to_string()));
        }
        let c = [direction[0] / len, direction[1] / len];
        let mut m = Mat::zeros(4, 4);
        for r in 0..2 {
            for s in 0..2 {
                let v = k * c[r] * c[s];
                m[(r, s)] = v;
                m[(r + 2, s + 2)] = v;
                m[(r, s + 2)] = -v;
                m[(r + 2, s)] = -v;
            }
        }
        Self::new(vec![i_grip, j_grip], m)
    }
}

impl FiniteElement for LinearElement {
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

    fn update_stiffness(&mut self, _grips: &[Grip]) -> FEAResult<()> {
        Ok(())
    }

    fn calculate_forces(&mut self, _grips: &[Grip]) -> FEAResult<()> {
        self.forces = &self.stiffness * &self.displacements;
        Ok(())
    }
}
