//! Iteration state machine for one equilibrium iteration within a load step

use super::{AnalysisParameters, DivergenceReason};
use crate::math::{mat_has_nan, norm, safe_ratio, vec_has_nan, Mat, Vec as FEVec};

/// Progress of a single iteration.
///
/// `Created -> Updated -> ConvergenceEvaluated -> {Converged | Continuing | Diverged}`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IterationState {
    /// Seeded from the previous state, nothing solved yet
    Created,
    /// Displacements, residual and stiffness refreshed
    Updated,
    /// Convergence ratios calculated
    ConvergenceEvaluated,
    /// Both checks passed
    Converged,
    /// Neither converged nor stopped
    Continuing,
    /// Stop condition hit before convergence
    Diverged(DivergenceReason),
}

/// State of one equilibrium iteration
#[derive(Debug, Clone)]
pub struct IterationResult {
    /// Iteration number within the step (0-based)
    pub number: usize,
    /// Running total displacements
    pub displacements: FEVec,
    /// Increment solved in this iteration
    pub increment: FEVec,
    /// Applied minus internal forces, zero on constrained DoFs
    pub residual: FEVec,
    /// Assembled internal forces at `displacements`
    pub internal_forces: FEVec,
    /// Unsimplified stiffness used for the solve
    pub stiffness: Mat,
    /// ‖residual‖ / ‖applied forces‖
    pub force_convergence: f64,
    /// ‖increment‖ / ‖first increment of the step‖
    pub displacement_convergence: f64,
    pub state: IterationState,
}

impl IterationResult {
    /// Iteration 0 of a step, starting from a converged state
    pub fn seeded(displacements: FEVec, internal_forces: FEVec, stiffness: Mat) -> Self {
        let n = displacements.len();
        Self {
            number: 0,
            displacements,
            increment: FEVec::zeros(n),
            residual: FEVec::zeros(n),
            internal_forces,
            stiffness,
            force_convergence: f64::INFINITY,
            displacement_convergence: f64::INFINITY,
            state: IterationState::Created,
        }
    }

    /// Iteration 0 of the first step: everything at rest
    pub fn at_rest(n_dofs: usize) -> Self {
        Self::seeded(
            FEVec::zeros(n_dofs),
            FEVec::zeros(n_dofs),
            Mat::zeros(n_dofs, n_dofs),
        )
    }

    /// Add a solved increment to the running displacements
    pub fn increment_displacements(&mut self, increment: FEVec) {
        self.displacements += &increment;
        self.increment = increment;
    }

    /// Store internal forces and the residual `applied - internal`.
    ///
    /// Callers zero the constrained entries of the residual afterwards.
    pub fn update_forces(&mut self, applied_forces: &FEVec, internal_forces: FEVec) {
        self.residual = applied_forces - &internal_forces;
        self.internal_forces = internal_forces;
        self.state = IterationState::Updated;
    }

    /// Compute both convergence ratios. A zero reference yields 0.
    pub fn calculate_convergence(&mut self, applied_forces: &FEVec, initial_increment: &FEVec) {
        self.force_convergence = safe_ratio(norm(&self.residual), norm(applied_forces));
        self.displacement_convergence = safe_ratio(norm(&self.increment), norm(initial_increment));
        self.state = IterationState::ConvergenceEvaluated;
    }

    /// Minimum iterations reached and either ratio within its tolerance
    pub fn check_convergence(&self, params: &AnalysisParameters) -> bool {
        self.number >= params.min_iterations
            && (self.force_convergence <= params.force_tolerance
                || self.displacement_convergence <= params.displacement_tolerance)
    }

    /// Iteration budget used up, or a NaN anywhere in the solution state
    pub fn check_stop_condition(&self, params: &AnalysisParameters) -> bool {
        self.number >= params.max_iterations || self.has_nan()
    }

    /// Decide and record the outcome of this iteration
    pub fn evaluate(&mut self, params: &AnalysisParameters) -> IterationState {
        self.state = if self.has_nan() {
            IterationState::Diverged(DivergenceReason::NotANumber)
        } else if self.check_convergence(params) {
            IterationState::Converged
        } else if self.check_stop_condition(params) {
            IterationState::Diverged(DivergenceReason::IterationLimit)
        } else {
            IterationState::Continuing
        };
        self.state
    }

    /// Start the following iteration from this one's state
    pub fn next(&self) -> Self {
        let n = self.displacements.len();
        Self {
            number: self.number + 1,
            displacements: self.displacements.clone(),
            increment: FEVec::zeros(n),
            residual: self.residual.clone(),
            internal_forces: self.internal_forces.clone(),
            stiffness: self.stiffness.clone(),
            force_convergence: self.force_convergence,
            displacement_convergence: self.displacement_convergence,
            state: IterationState::Created,
        }
    }

    fn has_nan(&self) -> bool {
        vec_has_nan(&self.displacements) || vec_has_nan(&self.residual) || mat_has_nan(&self.stiffness)
    }
}
