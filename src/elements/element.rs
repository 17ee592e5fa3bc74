//! The finite element contract used by the assembler and load-step controller

use std::fmt::Debug;

use super::Grip;
use crate::error::{FEAError, FEAResult};
use crate::math::{Mat, Vec as FEVec};

/// Behaviour every finite element exposes to the solver.
///
/// Elements reference grips by number; the grips themselves live in the
/// model's arena and are handed to the recalculation hooks. Stiffness, force
/// and displacement are expressed in global axes and ordered grip by grip,
/// two DoFs per grip, so their size is `2 * grips().len()`.
pub trait FiniteElement: Debug {
    /// Element number (1-based), assigned by the model
    fn number(&self) -> usize;

    /// Set the element number
    fn set_number(&mut self, number: usize);

    /// Numbers of the grips this element connects, in local order
    fn grips(&self) -> &[usize];

    /// Global-oriented stiffness matrix from the last `update_stiffness`
    fn stiffness(&self) -> &Mat;

    /// Global-oriented internal force vector from the last `calculate_forces`
    fn forces(&self) -> &FEVec;

    /// Global displacement vector from the last `update_displacements`
    fn displacements(&self) -> &FEVec;

    /// Pull the current displacements of the referenced grips
    fn update_displacements(&mut self, grips: &[Grip]) -> FEAResult<()>;

    /// Recompute the stiffness matrix from the current state
    fn update_stiffness(&mut self, grips: &[Grip]) -> FEAResult<()>;

    /// Recompute internal forces from the current displacements
    fn calculate_forces(&mut self, grips: &[Grip]) -> FEAResult<()>;

    /// Number of element DoFs
    fn dof_count(&self) -> usize {
        2 * self.grips().len()
    }
}

/// Look up a grip in the arena by its 1-based number
pub(crate) fn grip_by_number(grips: &[Grip], number: usize) -> FEAResult<&Grip> {
    number
        .checked_sub(1)
        .and_then(|idx| grips.get(idx))
        .ok_or(FEAError::GripNotFound(number))
}

/// Gather the displacements of the given grips into an element vector
pub(crate) fn gather_displacements(grips: &[Grip], numbers: &[usize]) -> FEAResult<FEVec> {
    let mut u = FEVec::zeros(2 * numbers.len());
    for (k, &number) in numbers.iter().enumerate() {
        let d = grip_by_number(grips, number)?.displacement();
        u[2 * k] = d[0];
        u[2 * k + 1] = d[1];
    }
    Ok(u)
}
