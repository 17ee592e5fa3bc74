//! Stiffness selection for the Newton-Raphson family

use super::{IterationResult, SolverKind};
use crate::error::FEAResult;
use crate::math::{Mat, Vec as FEVec};

/// How the iteration matrix is produced from one iteration to the next.
///
/// All variants work on the unsimplified matrix; constraint simplification is
/// applied to a copy just before the solve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StiffnessPolicy {
    /// Fresh tangent every iteration (full Newton-Raphson)
    Tangent,
    /// Tangent from the start of the step, reused (modified Newton-Raphson)
    Initial,
    /// Broyden rank-one update of the previous matrix
    Secant,
}

impl From<SolverKind> for StiffnessPolicy {
    fn from(kind: SolverKind) -> Self {
        match kind {
            SolverKind::NewtonRaphson => Self::Tangent,
            SolverKind::ModifiedNewtonRaphson => Self::Initial,
            SolverKind::Secant => Self::Secant,
        }
    }
}

impl StiffnessPolicy {
    /// Whether element tangents must be refreshed after every displacement update
    pub fn needs_tangent(&self) -> bool {
        matches!(self, Self::Tangent)
    }

    /// Matrix for the solve of `current`.
    ///
    /// `previous` is the start state of the iteration before `current` and is
    /// only read by the secant update. `tangent` assembles the element
    /// tangents at the current state.
    pub fn next_stiffness<F>(
        &self,
        previous: Option<&IterationResult>,
        current: &IterationResult,
        tangent: F,
    ) -> FEAResult<Mat>
    where
        F: FnOnce() -> FEAResult<Mat>,
    {
        if current.number == 0 {
            return tangent();
        }
        match self {
            Self::Tangent => tangent(),
            Self::Initial => Ok(current.stiffness.clone()),
            Self::Secant => match previous {
                Some(prev) => Ok(broyden_update(
                    &current.stiffness,
                    &(&current.displacements - &prev.displacements),
                    &(&current.internal_forces - &prev.internal_forces),
                )),
                None => Ok(current.stiffness.clone()),
            },
        }
    }
}

/// `K + (y - K s) sᵀ / (sᵀ s)`; `K` is returned unchanged when `s` is zero
fn broyden_update(k: &Mat, s: &FEVec, y: &FEVec) -> Mat {
    let ss = s.dot(s);
    if ss == 0.0 {
        return k.clone();
    }
    let correction = (y - k * s) / ss;
    k + correction * s.transpose()
}
