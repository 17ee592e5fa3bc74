//! Analysis driver: a single linear solve, or a walk through the load history

use log::{info, warn};

use super::{
    AnalysisOptions, AnalysisType, ControlKind, LoadStepController, Monitor, StepOutcome,
    StepTarget,
};
use crate::elements::{grip_by_number, FiniteElement, Grip};
use crate::error::{FEAError, FEAResult};
use crate::results::{AnalysisResults, AnalysisStatus, LoadStepResult};

/// Runs one analysis over a borrowed model.
///
/// All configuration is checked in [`Driver::new`], before any step runs.
pub struct Driver<'a> {
    controller: LoadStepController<'a>,
    options: &'a AnalysisOptions,
    monitor: Option<Monitor>,
}

impl<'a> Driver<'a> {
    pub fn new(
        grips: &'a mut [Grip],
        elements: &'a mut [Box<dyn FiniteElement>],
        monitor: Option<Monitor>,
        options: &'a AnalysisOptions,
    ) -> FEAResult<Self> {
        options.parameters.validate()?;
        let nonlinear = options.analysis_type == AnalysisType::Nonlinear;
        let displacement_control =
            nonlinear && options.parameters.control == ControlKind::Displacement;

        if nonlinear {
            options.load_history.validate()?;
        }

        if let Some(m) = monitor {
            if grip_by_number(grips, m.grip)?.constraint.is_restrained(m.axis) {
                return Err(FEAError::InvalidParameters(format!(
                    "Monitored grip {} is constrained along {:?}",
                    m.grip, m.axis
                )));
            }
        }

        if displacement_control {
            if monitor.is_none() {
                return Err(FEAError::InvalidParameters(
                    "Displacement control requires a monitored grip".to_string(),
                ));
            }
            if options.load_history.target_displacement.is_none() {
                return Err(FEAError::InvalidParameters(
                    "Displacement control requires a target displacement".to_string(),
                ));
            }
        }

        let controller = LoadStepController::new(grips, elements, options.parameters, monitor)?
            .with_sparse(options.sparse)
            .with_logging(options.log);

        if displacement_control {
            let dofs = controller.dof_map();
            let loaded = dofs
                .free_dofs()
                .into_iter()
                .any(|dof| controller.reference_forces()[dof] != 0.0);
            if !loaded {
                return Err(FEAError::InvalidParameters(
                    "Displacement control needs a non-zero reference load on a free DoF"
                        .to_string(),
                ));
            }
        }

        Ok(Self {
            controller,
            options,
            monitor,
        })
    }

    /// Run the analysis to completion or to the first unrecoverable step
    pub fn run(mut self) -> FEAResult<AnalysisResults> {
        let dofs = self.controller.dof_map();
        info!(
            "{:?} analysis: {} DoFs ({} constrained), {:?} solver",
            self.options.analysis_type,
            dofs.n_dofs(),
            dofs.constrained().len(),
            self.options.parameters.solver
        );

        let results = match self.options.analysis_type {
            AnalysisType::Linear => self.run_linear()?,
            AnalysisType::Nonlinear => self.run_nonlinear()?,
        };

        match results.status {
            AnalysisStatus::Completed => info!(
                "analysis completed: {} steps, {} iterations",
                results.steps.len(),
                results.total_iterations()
            ),
            AnalysisStatus::Diverged { step, reason } => {
                warn!("analysis halted at load step {}: {}", step, reason)
            }
        }
        Ok(results)
    }

    fn run_linear(&mut self) -> FEAResult<AnalysisResults> {
        let (result, status) = match self.controller.solve_linear()? {
            StepOutcome::Converged { result, .. } => (result, AnalysisStatus::Completed),
            StepOutcome::Diverged { result, reason } => {
                (result, AnalysisStatus::Diverged { step: 1, reason })
            }
        };
        Ok(self.results(vec![result], status))
    }

    fn run_nonlinear(&mut self) -> FEAResult<AnalysisResults> {
        let options = self.options;
        let mut steps = Vec::with_capacity(options.load_history.len());
        let mut state = self.controller.initial_state()?;
        let mut load_factor = 0.0;
        let mut reached = 0.0;

        for &factor in &options.load_history.factors {
            let mut cutbacks = 0;
            let mut to = factor;

            while reached < factor {
                let number = steps.len() + 1;
                let target = self.target(to);
                match self.controller.run_step(number, target, &state, load_factor)? {
                    StepOutcome::Converged { result, state: next } => {
                        load_factor = result.load_factor;
                        steps.push(result);
                        state = next;
                        reached = to;
                        to = factor;
                    }
                    StepOutcome::Diverged { result, reason } => {
                        if cutbacks < options.max_cutbacks {
                            cutbacks += 1;
                            to = reached + 0.5 * (to - reached);
                            warn!(
                                "load step {} diverged ({}), cutting back to factor {:.6} ({}/{})",
                                number, reason, to, cutbacks, options.max_cutbacks
                            );
                            continue;
                        }

                        if options.parameters.control == ControlKind::Force {
                            warn!(
                                "force control cannot pass a limit point of the load-deflection \
                                 curve; consider displacement control"
                            );
                        }
                        steps.push(result);
                        self.controller.restore(&state)?;
                        let status = AnalysisStatus::Diverged {
                            step: number,
                            reason,
                        };
                        return Ok(self.results(steps, status));
                    }
                }
            }
        }

        Ok(self.results(steps, AnalysisStatus::Completed))
    }

    /// Step target for a history factor
    fn target(&self, factor: f64) -> StepTarget {
        match (
            self.options.parameters.control,
            self.options.load_history.target_displacement,
        ) {
            (ControlKind::Displacement, Some(target)) => StepTarget::Displacement(factor * target),
            _ => StepTarget::LoadFactor(factor),
        }
    }

    fn results(&self, steps: Vec<LoadStepResult>, status: AnalysisStatus) -> AnalysisResults {
        AnalysisResults {
            analysis_type: self.options.analysis_type,
            steps,
            status,
            monitor: self.monitor,
        }
    }
}
