//! FE Model - grip arena, elements and analysis entry points

use crate::analysis::{AnalysisOptions, Driver, Monitor};
use crate::elements::{grip_by_number, Axis, Constraint, FiniteElement, Grip};
use crate::error::{FEAError, FEAResult};
use crate::loads::GripLoad;
use crate::results::{AnalysisResults, AnalysisSummary, GripDisplacement, Reactions};

/// The 2D nonlinear finite element model.
///
/// Grips live in an arena indexed by `number - 1`; elements refer to them by
/// number. `analyze` borrows the model mutably, so one model runs one
/// analysis at a time.
#[derive(Debug, Default)]
pub struct FEModel {
    grips: Vec<Grip>,
    elements: Vec<Box<dyn FiniteElement>>,
    monitor: Option<Monitor>,
    results: Option<AnalysisResults>,
}

impl FEModel {
    /// Create a new empty model
    pub fn new() -> Self {
        Self::default()
    }

    // ========================
    // Model Building Methods
    // ========================

    /// Add a grip and return its number
    pub fn add_grip(&mut self, mut grip: Grip) -> FEAResult<usize> {
        if grip.number() != 0 {
            return Err(FEAError::DuplicateNumber(grip.number()));
        }
        let number = self.grips.len() + 1;
        grip.assign(number);
        self.grips.push(grip);
        self.results = None;
        Ok(number)
    }

    /// Add a load to a grip; loads on the same grip accumulate
    pub fn add_grip_load(&mut self, grip: usize, load: GripLoad) -> FEAResult<()> {
        let g = self.grip_mut(grip)?;
        g.force[0] += load.fx;
        g.force[1] += load.fy;
        self.results = None;
        Ok(())
    }

    /// Replace the support condition of a grip
    pub fn set_constraint(&mut self, grip: usize, constraint: Constraint) -> FEAResult<()> {
        self.grip_mut(grip)?.constraint = constraint;
        self.results = None;
        Ok(())
    }

    /// Add an element and return its number
    pub fn add_element<E: FiniteElement + 'static>(&mut self, mut element: E) -> FEAResult<usize> {
        let grips = element.grips();
        for (k, &number) in grips.iter().enumerate() {
            grip_by_number(&self.grips, number)?;
            if grips[..k].contains(&number) {
                return Err(FEAError::InvalidInput(format!(
                    "Element references grip {} more than once",
                    number
                )));
            }
        }

        let number = self.elements.len() + 1;
        element.set_number(number);
        self.elements.push(Box::new(element));
        self.results = None;
        Ok(number)
    }

    /// Monitor one grip axis; required for displacement control
    pub fn set_monitor(&mut self, grip: usize, axis: Axis) -> FEAResult<()> {
        grip_by_number(&self.grips, grip)?;
        self.monitor = Some(Monitor::new(grip, axis));
        Ok(())
    }

    pub fn monitor(&self) -> Option<Monitor> {
        self.monitor
    }

    /// Get a grip by number
    pub fn grip(&self, number: usize) -> FEAResult<&Grip> {
        grip_by_number(&self.grips, number)
    }

    fn grip_mut(&mut self, number: usize) -> FEAResult<&mut Grip> {
        number
            .checked_sub(1)
            .and_then(|idx| self.grips.get_mut(idx))
            .ok_or(FEAError::GripNotFound(number))
    }

    /// Get an element by number
    pub fn element(&self, number: usize) -> FEAResult<&dyn FiniteElement> {
        number
            .checked_sub(1)
            .and_then(|idx| self.elements.get(idx))
            .map(|e| e.as_ref())
            .ok_or(FEAError::ElementNotFound(number))
    }

    pub fn grips(&self) -> &[Grip] {
        &self.grips
    }

    pub fn num_grips(&self) -> usize {
        self.grips.len()
    }

    pub fn num_elements(&self) -> usize {
        self.elements.len()
    }

    // ========================
    // Analysis Methods
    // ========================

    /// Run linear static analysis
    pub fn analyze_linear(&mut self) -> FEAResult<&AnalysisResults> {
        self.analyze(AnalysisOptions::linear())
    }

    /// Run analysis with custom options.
    ///
    /// A diverged load step is not an error: the returned results carry
    /// `AnalysisStatus::Diverged`. Use [`AnalysisResults::into_result`] to
    /// turn it into one.
    pub fn analyze(&mut self, options: AnalysisOptions) -> FEAResult<&AnalysisResults> {
        self.results = None;
        let results =
            Driver::new(&mut self.grips, &mut self.elements, self.monitor, &options)?.run()?;
        Ok(&*self.results.insert(results))
    }

    /// Results of the last analysis
    pub fn results(&self) -> FEAResult<&AnalysisResults> {
        self.results.as_ref().ok_or(FEAError::NotAnalyzed)
    }

    /// Check if model has been analyzed
    pub fn is_analyzed(&self) -> bool {
        self.results.is_some()
    }

    // ========================
    // Result Access Methods
    // ========================

    /// Displacement of a grip at the last converged state
    pub fn grip_displacement(&self, number: usize) -> FEAResult<GripDisplacement> {
        self.results()?;
        Ok(GripDisplacement::from_array(self.grip(number)?.displacement()))
    }

    /// Reactions of a grip at the last converged state
    pub fn grip_reactions(&self, number: usize) -> FEAResult<Reactions> {
        self.results()?;
        Ok(Reactions::from_array(self.grip(number)?.reaction()))
    }

    /// Get analysis summary
    pub fn summary(&self) -> FEAResult<AnalysisSummary> {
        let results = self.results()?;

        let total_dofs = 2 * self.grips.len();
        let restrained: usize = self.grips.iter().map(|g| g.constraint.num_restrained()).sum();
        let mut summary = AnalysisSummary {
            num_grips: self.grips.len(),
            num_elements: self.elements.len(),
            total_dofs,
            free_dofs: total_dofs - restrained,
            load_steps: results.steps.len(),
            total_iterations: results.total_iterations(),
            completed: results.is_complete(),
            ..Default::default()
        };

        for grip in &self.grips {
            let disp = GripDisplacement::from_array(grip.displacement()).magnitude();
            if disp > summary.max_displacement {
                summary.max_displacement = disp;
                summary.max_disp_grip = grip.number();
            }
            let rxn = Reactions::from_array(grip.reaction()).magnitude();
            if rxn > summary.max_reaction {
                summary.max_reaction = rxn;
                summary.max_reaction_grip = grip.number();
            }
        }

        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::elements::{Material, Truss};
    use approx::assert_relative_eq;

    #[test]
    fn test_simple_bar() {
        let mut model = FEModel::new();
        let g1 = model
            .add_grip(Grip::new(0.0, 0.0).with_constraint(Constraint::fixed()))
            .unwrap();
        let g2 = model
            .add_grip(Grip::new(2.0, 0.0).with_constraint(Constraint::roller_y()))
            .unwrap();
        model
            .add_element(Truss::linear(g1, g2, Material::new(200e9, 1e-3)))
            .unwrap();
        model.add_grip_load(g2, GripLoad::fx(10_000.0)).unwrap();

        model.analyze_linear().unwrap();

        // PL / EA
        let disp = model.grip_displacement(g2).unwrap();
        assert_relative_eq!(disp.dx, 10_000.0 * 2.0 / (200e9 * 1e-3), max_relative = 1e-10);
        assert_eq!(disp.dy, 0.0);

        let rxn = model.grip_reactions(g1).unwrap();
        assert_relative_eq!(rxn.fx, -10_000.0, epsilon = 1e-6);

        let summary = model.summary().unwrap();
        assert_eq!(summary.num_grips, 2);
        assert_eq!(summary.free_dofs, 1);
        assert_eq!(summary.max_disp_grip, g2);
        assert_eq!(summary.max_reaction_grip, g1);
        assert!(summary.completed);
    }

    #[test]
    fn test_add_element_validates_grips() {
        let mut model = FEModel::new();
        let g1 = model.add_grip(Grip::new(0.0, 0.0)).unwrap();
        assert!(matches!(
            model.add_element(Truss::new(g1, 7, Material::default())),
            Err(FEAError::GripNotFound(7))
        ));
        assert!(model.add_element(Truss::new(g1, g1, Material::default())).is_err());
        assert_eq!(model.num_elements(), 0);
    }

    #[test]
    fn test_results_before_analysis() {
        let mut model = FEModel::new();
        let g = model.add_grip(Grip::new(0.0, 0.0)).unwrap();
        assert!(matches!(model.grip_displacement(g), Err(FEAError::NotAnalyzed)));
        assert!(matches!(model.summary(), Err(FEAError::NotAnalyzed)));
    }

    #[test]
    fn test_grip_cannot_be_added_twice() {
        let mut model = FEModel::new();
        let g = model.add_grip(Grip::new(1.0, 1.0)).unwrap();
        let copy = model.grip(g).unwrap().clone();
        assert!(matches!(model.add_grip(copy), Err(FEAError::DuplicateNumber(1))));
    }

    #[test]
    fn test_grip_loads_accumulate() {
        let mut model = FEModel::new();
        let g = model.add_grip(Grip::new(0.0, 0.0)).unwrap();
        model.add_grip_load(g, GripLoad::fy(-5.0)).unwrap();
        model.add_grip_load(g, GripLoad::force(1.0, -5.0)).unwrap();
        assert_eq!(model.grip(g).unwrap().force, [1.0, -10.0]);
        assert!(model.add_grip_load(9, GripLoad::fx(1.0)).is_err());
    }
}
