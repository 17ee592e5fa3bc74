//! Load-step controller: drives one load increment to equilibrium

use log::{debug, info, log, warn, Level};

use super::{
    AnalysisParameters, DivergenceReason, IterationResult, IterationState, Monitor,
    StiffnessPolicy,
};
use crate::assembly::{Assembler, DofMap};
use crate::elements::{grip_by_number, FiniteElement, Grip};
use crate::error::{FEAError, FEAResult};
use crate::math::{
    is_symmetric, solve_linear_system, solve_sparse_cholesky, Mat, Vec as FEVec,
};
use crate::results::{ConvergenceRecord, LoadStepResult, MonitorSample};

/// Smallest `|δu_f[c]|` accepted when solving for the load factor correction
const MIN_LOAD_SENSITIVITY: f64 = 1e-300;

/// What a load step prescribes
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StepTarget {
    /// Load factor applied to the total grip forces
    LoadFactor(f64),
    /// Total displacement the monitored DoF must reach; the load factor is unknown
    Displacement(f64),
}

/// Result of running one load step
#[derive(Debug, Clone)]
pub enum StepOutcome {
    /// Equilibrium found; `state` seeds the next step
    Converged {
        result: LoadStepResult,
        state: IterationResult,
    },
    /// Stop condition hit or the solve failed
    Diverged {
        result: LoadStepResult,
        reason: DivergenceReason,
    },
}

impl StepOutcome {
    pub fn result(&self) -> &LoadStepResult {
        match self {
            Self::Converged { result, .. } | Self::Diverged { result, .. } => result,
        }
    }

    pub fn is_converged(&self) -> bool {
        matches!(self, Self::Converged { .. })
    }
}

/// Runs load steps on a borrowed grip arena and element set.
///
/// Under force control the applied force is `load_factor * F` with `F` the sum
/// of grip forces. Force control cannot pass a limit point of the
/// load-deflection curve; use displacement control for snap-through
/// problems.
pub struct LoadStepController<'a> {
    grips: &'a mut [Grip],
    elements: &'a mut [Box<dyn FiniteElement>],
    dofs: DofMap,
    params: AnalysisParameters,
    policy: StiffnessPolicy,
    reference_forces: FEVec,
    monitor_dof: Option<usize>,
    sparse: bool,
    verbose: bool,
}

impl<'a> LoadStepController<'a> {
    pub fn new(
        grips: &'a mut [Grip],
        elements: &'a mut [Box<dyn FiniteElement>],
        params: AnalysisParameters,
        monitor: Option<Monitor>,
    ) -> FEAResult<Self> {
        let dofs = DofMap::from_grips(grips)?;
        let reference_forces = dofs.force_vector(grips);
        let monitor_dof = match monitor {
            Some(m) => Some(grip_by_number(grips, m.grip)?.dof(m.axis)),
            None => None,
        };

        Ok(Self {
            grips,
            elements,
            dofs,
            params,
            policy: params.solver.into(),
            reference_forces,
            monitor_dof,
            sparse: false,
            verbose: false,
        })
    }

    /// Route symmetric solves through sparse Cholesky
    pub fn with_sparse(mut self, sparse: bool) -> Self {
        self.sparse = sparse;
        self
    }

    /// Log iteration progress at info instead of debug level
    pub fn with_logging(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn dof_map(&self) -> &DofMap {
        &self.dofs
    }

    /// Total grip forces, the force pattern scaled by the load factor
    pub fn reference_forces(&self) -> &FEVec {
        &self.reference_forces
    }

    /// Global index of the monitored DoF
    pub fn monitor_dof(&self) -> Option<usize> {
        self.monitor_dof
    }

    /// Reset grips and elements to the undeformed configuration and return
    /// the converged state a first load step starts from
    pub fn initial_state(&mut self) -> FEAResult<IterationResult> {
        let u = FEVec::zeros(self.dofs.n_dofs());
        self.push_displacements(&u, true)?;
        Ok(IterationResult::seeded(
            u,
            self.assemble_internal_forces()?,
            self.assemble_tangent()?,
        ))
    }

    /// Put grips and elements back into a converged state
    pub fn restore(&mut self, state: &IterationResult) -> FEAResult<()> {
        self.push_displacements(&state.displacements, true)
    }

    /// Single assembly and solve at the full applied force
    pub fn solve_linear(&mut self) -> FEAResult<StepOutcome> {
        let mut state = self.initial_state()?;
        let applied = self.reference_forces.clone();

        let mut k = state.stiffness.clone();
        let mut rhs = applied.clone();
        self.assembler().simplify(&mut k, &mut rhs);

        let Some(u) = self.solve(&k, &rhs) else {
            warn!("linear solve failed: {}", DivergenceReason::SingularStiffness);
            return Ok(self.diverged(
                1,
                1.0,
                &applied,
                &state,
                Vec::new(),
                DivergenceReason::SingularStiffness,
            ));
        };

        state.increment_displacements(u);
        self.push_displacements(&state.displacements, false)?;
        let internal = &state.stiffness * &state.displacements;
        state.update_forces(&applied, internal);
        self.assembler().simplify_vector(&mut state.residual);
        state.calculate_convergence(&rhs, &FEVec::zeros(self.dofs.n_dofs()));

        if state.evaluate(&self.params) == IterationState::Diverged(DivergenceReason::NotANumber) {
            warn!("linear solve produced NaN displacements");
            let records = vec![record(&state)];
            return Ok(self.diverged(
                1,
                1.0,
                &applied,
                &state,
                records,
                DivergenceReason::NotANumber,
            ));
        }
        state.state = IterationState::Converged;

        let records = vec![record(&state)];
        Ok(self.converged(1, 1.0, &applied, state, records))
    }

    /// Iterate one load step to equilibrium.
    ///
    /// `start` is the converged state of the previous step (or
    /// [`initial_state`](Self::initial_state)) and `start_factor` its load
    /// factor. Grips and elements are first restored to `start`, so a
    /// diverged step can be retried from the same point.
    pub fn run_step(
        &mut self,
        number: usize,
        target: StepTarget,
        start: &IterationResult,
        start_factor: f64,
    ) -> FEAResult<StepOutcome> {
        let n = self.dofs.n_dofs();
        let policy = self.policy;
        let level = if self.verbose { Level::Info } else { Level::Debug };

        self.push_displacements(&start.displacements, true)?;
        let mut current = IterationResult::seeded(
            start.displacements.clone(),
            self.assemble_internal_forces()?,
            start.stiffness.clone(),
        );

        let mut factor = match target {
            StepTarget::LoadFactor(f) => f,
            StepTarget::Displacement(_) => start_factor,
        };
        let mut reference = self.reference_forces.clone();
        self.assembler().simplify_vector(&mut reference);

        let mut applied = &self.reference_forces * factor;
        current.residual = &applied - &current.internal_forces;
        self.assembler().simplify_vector(&mut current.residual);

        let mut previous: Option<IterationResult> = None;
        let mut initial_increment = FEVec::zeros(n);
        let mut records = Vec::new();

        loop {
            let stiffness = policy.next_stiffness(previous.as_ref(), &current, || {
                self.assemble_tangent()
            })?;
            current.stiffness = stiffness;
            let snapshot = (policy == StiffnessPolicy::Secant).then(|| current.clone());

            let mut k = current.stiffness.clone();
            let mut rhs = current.residual.clone();
            self.assembler().simplify(&mut k, &mut rhs);

            let increment = match target {
                StepTarget::LoadFactor(_) => self.solve(&k, &rhs),
                StepTarget::Displacement(value) => {
                    let dof = self.monitor_dof.ok_or_else(|| {
                        FEAError::InvalidParameters(
                            "Displacement control requires a monitored grip".to_string(),
                        )
                    })?;
                    self.solve(&k, &rhs)
                        .zip(self.solve(&k, &reference))
                        .and_then(|(du_r, du_f)| {
                            if du_f[dof].abs() < MIN_LOAD_SENSITIVITY {
                                return None;
                            }
                            let d_lambda =
                                (value - current.displacements[dof] - du_r[dof]) / du_f[dof];
                            factor += d_lambda;
                            Some(du_r + du_f * d_lambda)
                        })
                }
            };

            let Some(increment) = increment else {
                warn!(
                    "load step {} iteration {}: {}",
                    number,
                    current.number,
                    DivergenceReason::SingularStiffness
                );
                return Ok(self.diverged(
                    number,
                    factor,
                    &applied,
                    &current,
                    records,
                    DivergenceReason::SingularStiffness,
                ));
            };

            current.increment_displacements(increment);
            self.push_displacements(&current.displacements, policy.needs_tangent())?;

            applied = &self.reference_forces * factor;
            current.update_forces(&applied, self.assemble_internal_forces()?);
            self.assembler().simplify_vector(&mut current.residual);

            if current.number == 0 {
                initial_increment = current.increment.clone();
            }
            let mut applied_free = applied.clone();
            self.assembler().simplify_vector(&mut applied_free);
            current.calculate_convergence(&applied_free, &initial_increment);
            let state = current.evaluate(&self.params);
            records.push(record(&current));

            log!(
                level,
                "step {} iteration {}: force ratio {:.3e}, displacement ratio {:.3e}",
                number,
                current.number,
                current.force_convergence,
                current.displacement_convergence
            );

            match state {
                IterationState::Converged => {
                    info!(
                        "load step {} converged in {} iterations at load factor {:.6}",
                        number,
                        current.number + 1,
                        factor
                    );
                    return Ok(self.converged(number, factor, &applied, current, records));
                }
                IterationState::Diverged(reason) => {
                    warn!("load step {} diverged at iteration {}: {}", number, current.number, reason);
                    return Ok(self.diverged(number, factor, &applied, &current, records, reason));
                }
                _ => {
                    previous = snapshot;
                    current = current.next();
                }
            }
        }
    }

    fn assembler(&self) -> Assembler<'_> {
        Assembler::new(&self.dofs)
    }

    fn assemble_tangent(&self) -> FEAResult<Mat> {
        self.assembler().assemble_stiffness(&*self.grips, &*self.elements)
    }

    fn assemble_internal_forces(&self) -> FEAResult<FEVec> {
        self.assembler()
            .assemble_internal_forces(&*self.grips, &*self.elements)
    }

    /// Write a global displacement vector into the grips and refresh elements
    fn push_displacements(&mut self, u: &FEVec, refresh_stiffness: bool) -> FEAResult<()> {
        for grip in self.grips.iter_mut() {
            let [dx, dy] = grip.dofs();
            grip.set_displacement(u[dx], u[dy]);
        }

        let grips: &[Grip] = &*self.grips;
        for element in self.elements.iter_mut() {
            element.update_displacements(grips)?;
            if refresh_stiffness {
                element.update_stiffness(grips)?;
            }
            element.calculate_forces(grips)?;
        }
        Ok(())
    }

    /// Solve the simplified system, preferring sparse Cholesky when enabled
    fn solve(&self, k: &Mat, rhs: &FEVec) -> Option<FEVec> {
        if self.sparse && is_symmetric(k, 1e-10) {
            if let Some(x) = solve_sparse_cholesky(k, rhs) {
                return Some(x);
            }
            debug!("sparse Cholesky factorisation failed, falling back to LU");
        }
        solve_linear_system(k, rhs)
    }

    fn converged(
        &mut self,
        number: usize,
        factor: f64,
        applied: &FEVec,
        state: IterationResult,
        records: Vec<ConvergenceRecord>,
    ) -> StepOutcome {
        let mut reactions = FEVec::zeros(self.dofs.n_dofs());
        for &dof in self.dofs.constrained() {
            reactions[dof] = state.internal_forces[dof] - applied[dof];
        }
        for grip in self.grips.iter_mut() {
            let [dx, dy] = grip.dofs();
            grip.set_reaction(reactions[dx], reactions[dy]);
        }

        let monitor = self.monitor_dof.map(|dof| MonitorSample {
            step: number,
            load_factor: factor,
            displacement: state.displacements[dof],
        });

        let result = LoadStepResult {
            number,
            load_factor: factor,
            applied_forces: applied.clone(),
            displacements: state.displacements.clone(),
            stiffness: state.stiffness.clone(),
            converged: true,
            iterations: records.len(),
            convergence: records,
            reactions,
            monitor,
        };
        StepOutcome::Converged { result, state }
    }

    fn diverged(
        &self,
        number: usize,
        factor: f64,
        applied: &FEVec,
        state: &IterationResult,
        records: Vec<ConvergenceRecord>,
        reason: DivergenceReason,
    ) -> StepOutcome {
        let result = LoadStepResult {
            number,
            load_factor: factor,
            applied_forces: applied.clone(),
            displacements: state.displacements.clone(),
            stiffness: state.stiffness.clone(),
            converged: false,
            iterations: records.len(),
            convergence: records,
            reactions: FEVec::zeros(self.dofs.n_dofs()),
            monitor: None,
        };
        StepOutcome::Diverged { result, reason }
    }
}

fn record(it: &IterationResult) -> ConvergenceRecord {
    ConvergenceRecord {
        iteration: it.number,
        force: it.force_convergence,
        displacement: it.displacement_convergence,
    }
}
