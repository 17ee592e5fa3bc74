//! Analysis types, parameters and options

mod driver;
mod iteration;
mod load_step;
mod stiffness;

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::elements::Axis;
use crate::error::{FEAError, FEAResult};
use crate::loads::LoadHistory;

pub use driver::Driver;
pub use iteration::{IterationResult, IterationState};
pub use load_step::{LoadStepController, StepOutcome, StepTarget};
pub use stiffness::StiffnessPolicy;

/// Type of structural analysis to perform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AnalysisType {
    /// Single assembly and solve
    #[default]
    Linear,
    /// Incremental-iterative solution over a load history
    Nonlinear,
}

/// Newton-Raphson family method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SolverKind {
    /// Tangent stiffness re-assembled every iteration
    #[default]
    NewtonRaphson,
    /// Tangent from the start of each step reused for the whole step
    ModifiedNewtonRaphson,
    /// Broyden secant update from the last two iterations
    Secant,
}

/// What the load steps prescribe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ControlKind {
    /// Each step prescribes a fraction of the total applied force.
    ///
    /// Cannot follow a load-deflection curve past a limit point.
    #[default]
    Force,
    /// Each step prescribes the displacement of the monitored DoF; the load
    /// factor is solved for
    Displacement,
}

/// Why a load step failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DivergenceReason {
    /// Iteration budget exhausted without convergence
    IterationLimit,
    /// A displacement, residual or stiffness entry became NaN
    NotANumber,
    /// The simplified stiffness could not be factorised
    SingularStiffness,
}

impl fmt::Display for DivergenceReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::IterationLimit => write!(f, "iteration limit reached without convergence"),
            Self::NotANumber => write!(f, "not-a-number in solution state"),
            Self::SingularStiffness => write!(f, "singular stiffness matrix"),
        }
    }
}

/// A monitored grip axis, sampled after every converged step and driven
/// under displacement control
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Monitor {
    /// Grip number
    pub grip: usize,
    /// Monitored axis
    pub axis: Axis,
}

impl Monitor {
    pub fn new(grip: usize, axis: Axis) -> Self {
        Self { grip, axis }
    }
}

/// Convergence and iteration settings for one analysis run
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnalysisParameters {
    /// Limit on ‖residual‖ / ‖applied force‖
    pub force_tolerance: f64,
    /// Limit on ‖increment‖ / ‖first increment of the step‖
    pub displacement_tolerance: f64,
    /// Iterations that must run before convergence is accepted
    pub min_iterations: usize,
    /// Iteration number at which a step is abandoned
    pub max_iterations: usize,
    /// Newton-Raphson variant
    pub solver: SolverKind,
    /// Force or displacement control
    pub control: ControlKind,
}

impl Default for AnalysisParameters {
    fn default() -> Self {
        Self {
            force_tolerance: 1e-6,
            displacement_tolerance: 1e-6,
            min_iterations: 0,
            max_iterations: 30,
            solver: SolverKind::NewtonRaphson,
            control: ControlKind::Force,
        }
    }
}

impl AnalysisParameters {
    /// Reject non-positive tolerances and inverted iteration bounds
    pub fn validate(&self) -> FEAResult<()> {
        for (name, tol) in [
            ("force tolerance", self.force_tolerance),
            ("displacement tolerance", self.displacement_tolerance),
        ] {
            if !(tol.is_finite() && tol > 0.0) {
                return Err(FEAError::InvalidParameters(format!(
                    "{name} must be positive, got {tol}"
                )));
            }
        }
        if self.min_iterations > self.max_iterations {
            return Err(FEAError::InvalidParameters(format!(
                "min iterations ({}) exceeds max iterations ({})",
                self.min_iterations, self.max_iterations
            )));
        }
        Ok(())
    }

    /// Parse parameters from JSON and validate them
    pub fn from_json(json: &str) -> FEAResult<Self> {
        let params: Self = serde_json::from_str(json)?;
        params.validate()?;
        Ok(params)
    }
}

/// Options for structural analysis
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisOptions {
    /// Type of analysis
    pub analysis_type: AnalysisType,
    /// Convergence and solver settings
    #[serde(default)]
    pub parameters: AnalysisParameters,
    /// Load factors stepped through by a nonlinear analysis
    #[serde(default)]
    pub load_history: LoadHistory,
    /// Factorise symmetric systems with sparse Cholesky instead of dense LU.
    /// Assembly stays dense; only the solve changes.
    #[serde(default)]
    pub sparse: bool,
    /// Number of times a diverged step is retried with half the increment
    #[serde(default)]
    pub max_cutbacks: usize,
    /// Log per-iteration progress at info level
    #[serde(default)]
    pub log: bool,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            analysis_type: AnalysisType::Linear,
            parameters: AnalysisParameters::default(),
            load_history: LoadHistory::single(),
            sparse: false,
            max_cutbacks: 0,
            log: false,
        }
    }
}

impl AnalysisOptions {
    /// Create options for linear analysis
    pub fn linear() -> Self {
        Self::default()
    }

    /// Create options for a force-controlled nonlinear analysis in equal steps
    pub fn nonlinear(steps: usize) -> Self {
        Self {
            analysis_type: AnalysisType::Nonlinear,
            load_history: LoadHistory::uniform(steps),
            ..Self::default()
        }
    }

    /// Create options for a displacement-controlled nonlinear analysis that
    /// drives the monitored DoF to `target` in equal steps
    pub fn displacement_controlled(steps: usize, target: f64) -> Self {
        let mut options = Self::nonlinear(steps);
        options.parameters.control = ControlKind::Displacement;
        options.load_history = options.load_history.with_target_displacement(target);
        options
    }

    /// Read options from a JSON file
    pub fn from_json_file(path: impl AsRef<Path>) -> FEAResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    /// Parse options from JSON
    pub fn from_json(json: &str) -> FEAResult<Self> {
        let options: Self = serde_json::from_str(json)?;
        options.parameters.validate()?;
        Ok(options)
    }

    /// Set the Newton-Raphson variant
    pub fn with_solver(mut self, solver: SolverKind) -> Self {
        self.parameters.solver = solver;
        self
    }

    /// Set force and displacement tolerances
    pub fn with_tolerances(mut self, force: f64, displacement: f64) -> Self {
        self.parameters.force_tolerance = force;
        self.parameters.displacement_tolerance = displacement;
        self
    }

    /// Set minimum iterations per step
    pub fn with_min_iter(mut self, min_iter: usize) -> Self {
        self.parameters.min_iterations = min_iter;
        self
    }

    /// Set maximum iterations per step
    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.parameters.max_iterations = max_iter;
        self
    }

    /// Replace the load history
    pub fn with_load_history(mut self, history: LoadHistory) -> Self {
        self.load_history = history;
        self
    }

    /// Use the sparse Cholesky backend
    pub fn with_sparse(mut self) -> Self {
        self.sparse = true;
        self
    }

    /// Allow diverged steps to be retried with smaller increments
    pub fn with_cutbacks(mut self, max_cutbacks: usize) -> Self {
        self.max_cutbacks = max_cutbacks;
        self
    }

    /// Enable logging
    pub fn with_logging(mut self) -> Self {
        self.log = true;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_parameters_valid() {
        assert!(AnalysisParameters::default().validate().is_ok());
    }

    #[test]
    fn test_rejects_non_positive_tolerance() {
        let params = AnalysisParameters {
            force_tolerance: 0.0,
            ..AnalysisParameters::default()
        };
        assert!(matches!(params.validate(), Err(FEAError::InvalidParameters(_))));

        let params = AnalysisParameters {
            displacement_tolerance: -1e-3,
            ..AnalysisParameters::default()
        };
        assert!(params.validate().is_err());
    }

    #[test]
    fn test_rejects_inverted_iteration_bounds() {
        let params = AnalysisParameters {
            min_iterations: 5,
            max_iterations: 2,
            ..AnalysisParameters::default()
        };
        assert!(params.validate().is_err());
    }

    #[test]
    fn test_parameters_from_json() {
        let json = r#"{
            "force_tolerance": 1e-5,
            "displacement_tolerance": 1e-4,
            "min_iterations": 1,
            "max_iterations": 20,
            "solver": "Secant",
            "control": "Displacement"
        }"#;
        let params = AnalysisParameters::from_json(json).unwrap();
        assert_eq!(params.solver, SolverKind::Secant);
        assert_eq!(params.control, ControlKind::Displacement);
        assert_eq!(params.max_iterations, 20);
    }

    #[test]
    fn test_options_builder() {
        let options = AnalysisOptions::displacement_controlled(10, -0.2)
            .with_solver(SolverKind::ModifiedNewtonRaphson)
            .with_max_iter(50);
        assert_eq!(options.analysis_type, AnalysisType::Nonlinear);
        assert_eq!(options.parameters.control, ControlKind::Displacement);
        assert_eq!(options.load_history.len(), 10);
        assert_eq!(options.load_history.target_displacement, Some(-0.2));
        assert_eq!(options.parameters.max_iterations, 50);
    }
}
