//! Result types for nonlinear FEA analysis

use serde::{Deserialize, Serialize};

use crate::analysis::{AnalysisType, DivergenceReason, Monitor};
use crate::error::{FEAError, FEAResult};
use crate::math::{Mat, Vec as FEVec};

/// Displacement results at a grip
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GripDisplacement {
    /// Displacement in X direction
    pub dx: f64,
    /// Displacement in Y direction
    pub dy: f64,
}

impl GripDisplacement {
    /// Create from array [DX, DY]
    pub fn from_array(arr: [f64; 2]) -> Self {
        Self {
            dx: arr[0],
            dy: arr[1],
        }
    }

    /// Get translation magnitude
    pub fn magnitude(&self) -> f64 {
        self.dx.hypot(self.dy)
    }
}

/// Reaction forces at a supported grip
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Reactions {
    /// Reaction force in X direction
    pub fx: f64,
    /// Reaction force in Y direction
    pub fy: f64,
}

impl Reactions {
    /// Create from array [FX, FY]
    pub fn from_array(arr: [f64; 2]) -> Self {
        Self {
            fx: arr[0],
            fy: arr[1],
        }
    }

    /// Get total force magnitude
    pub fn magnitude(&self) -> f64 {
        self.fx.hypot(self.fy)
    }
}

/// Convergence ratios of one iteration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConvergenceRecord {
    pub iteration: usize,
    pub force: f64,
    pub displacement: f64,
}

/// Monitored grip displacement at the end of a converged step
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MonitorSample {
    /// Step number (1-based)
    pub step: usize,
    /// Load factor reached
    pub load_factor: f64,
    /// Displacement of the monitored DoF (m)
    pub displacement: f64,
}

/// Archived state of one load step. Owns deep copies of every array.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadStepResult {
    /// Step number (1-based)
    pub number: usize,
    /// Load factor at the end of the step
    pub load_factor: f64,
    /// Applied force vector `load_factor * F`
    pub applied_forces: FEVec,
    /// Total displacements
    pub displacements: FEVec,
    /// Unsimplified stiffness of the last iteration
    pub stiffness: Mat,
    /// False when the step diverged
    pub converged: bool,
    /// Iterations performed
    pub iterations: usize,
    /// Convergence history, one record per iteration
    pub convergence: Vec<ConvergenceRecord>,
    /// `f_int - f_applied` on constrained DoFs, zero elsewhere
    pub reactions: FEVec,
    /// Monitored grip sample, if a monitor is set and the step converged
    pub monitor: Option<MonitorSample>,
}

impl LoadStepResult {
    /// Displacement of a grip at the end of this step
    pub fn grip_displacement(&self, grip: usize) -> FEAResult<GripDisplacement> {
        pair(&self.displacements, grip).map(GripDisplacement::from_array)
    }

    /// Reactions of a grip at the end of this step
    pub fn grip_reactions(&self, grip: usize) -> FEAResult<Reactions> {
        pair(&self.reactions, grip).map(Reactions::from_array)
    }
}

fn pair(v: &FEVec, grip: usize) -> FEAResult<[f64; 2]> {
    let base = grip
        .checked_sub(1)
        .map(|idx| 2 * idx)
        .filter(|&base| base + 1 < v.len())
        .ok_or(FEAError::GripNotFound(grip))?;
    Ok([v[base], v[base + 1]])
}

/// How an analysis run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AnalysisStatus {
    /// Every load step converged
    Completed,
    /// Load step `step` failed and the analysis halted
    Diverged {
        step: usize,
        reason: DivergenceReason,
    },
}

/// Load-step history of one analysis run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResults {
    pub analysis_type: AnalysisType,
    /// Recorded steps in order; a diverged step is last
    pub steps: Vec<LoadStepResult>,
    pub status: AnalysisStatus,
    /// Monitored grip axis, if any
    pub monitor: Option<Monitor>,
}

impl AnalysisResults {
    /// True if every load step converged
    pub fn is_complete(&self) -> bool {
        self.status == AnalysisStatus::Completed
    }

    /// The last step that converged
    pub fn last_converged(&self) -> Option<&LoadStepResult> {
        self.steps.iter().rev().find(|s| s.converged)
    }

    /// Monitor samples of all converged steps
    pub fn monitor_samples(&self) -> Vec<MonitorSample> {
        self.steps.iter().filter_map(|s| s.monitor).collect()
    }

    /// Iterations summed over all recorded steps
    pub fn total_iterations(&self) -> usize {
        self.steps.iter().map(|s| s.iterations).sum()
    }

    /// Convert divergence into an error
    pub fn into_result(self) -> FEAResult<Self> {
        match self.status {
            AnalysisStatus::Completed => Ok(self),
            AnalysisStatus::Diverged { step, reason } => Err(FEAError::Diverged { step, reason }),
        }
    }

    /// Serialize the whole history to JSON
    pub fn to_json(&self) -> FEAResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Summary of analysis results
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalysisSummary {
    /// Maximum displacement magnitude
    pub max_displacement: f64,
    /// Grip with maximum displacement
    pub max_disp_grip: usize,
    /// Maximum reaction magnitude
    pub max_reaction: f64,
    /// Grip with maximum reaction
    pub max_reaction_grip: usize,
    /// Total number of grips
    pub num_grips: usize,
    /// Total number of elements
    pub num_elements: usize,
    /// Total DOFs
    pub total_dofs: usize,
    /// Free DOFs (unknown)
    pub free_dofs: usize,
    /// Recorded load steps
    pub load_steps: usize,
    /// Iterations over all steps
    pub total_iterations: usize,
    /// False if the run halted on a diverged step
    pub completed: bool,
}
