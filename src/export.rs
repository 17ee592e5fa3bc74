//! Delimited text export of load-step histories

use std::fs;
use std::path::{Path, PathBuf};

use log::info;

use crate::error::{FEAError, FEAResult};
use crate::results::{AnalysisResults, MonitorSample};
use crate::units::{ForceUnit, LengthUnit};

/// Writes analysis results as CSV tables
#[derive(Debug, Clone)]
pub struct CsvExporter {
    path: PathBuf,
    delimiter: char,
    length: LengthUnit,
    force: ForceUnit,
    grip: Option<usize>,
}

impl CsvExporter {
    /// Export to `path` with comma delimiters and SI units
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            delimiter: ',',
            length: LengthUnit::Meter,
            force: ForceUnit::Newton,
            grip: None,
        }
    }

    pub fn with_delimiter(mut self, delimiter: char) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Output units for displacements and forces
    pub fn with_units(mut self, length: LengthUnit, force: ForceUnit) -> Self {
        self.length = length;
        self.force = force;
        self
    }

    /// Report this grip instead of the monitored one
    pub fn with_grip(mut self, grip: usize) -> Self {
        self.grip = Some(grip);
        self
    }

    /// One row per recorded step: step, load factor, grip displacement and
    /// applied grip load
    pub fn write_steps(&self, results: &AnalysisResults) -> FEAResult<()> {
        let csv = self.steps_table(results)?;
        fs::write(&self.path, csv)?;
        info!("wrote {} load steps to {}", results.steps.len(), self.path.display());
        Ok(())
    }

    /// One row per monitor sample
    pub fn write_monitor(&self, samples: &[MonitorSample]) -> FEAResult<()> {
        fs::write(&self.path, self.monitor_table(samples))?;
        info!("wrote {} monitor samples to {}", samples.len(), self.path.display());
        Ok(())
    }

    /// Format the step table without writing it
    pub fn steps_table(&self, results: &AnalysisResults) -> FEAResult<String> {
        let grip = self
            .grip
            .or(results.monitor.map(|m| m.grip))
            .ok_or_else(|| {
                FEAError::InvalidInput("No grip selected for step export".to_string())
            })?;

        let (len, force) = (self.length.symbol(), self.force.symbol());
        let mut csv = self.row(&[
            "step".to_string(),
            "load_factor".to_string(),
            format!("ux [{len}]"),
            format!("uy [{len}]"),
            format!("fx [{force}]"),
            format!("fy [{force}]"),
            "converged".to_string(),
        ]);

        for step in &results.steps {
            let u = step.grip_displacement(grip)?;
            let base = 2 * (grip - 1);
            csv.push('\n');
            csv.push_str(&self.row(&[
                step.number.to_string(),
                format!("{:.6}", step.load_factor),
                format!("{:.6e}", self.length.from_base(u.dx)),
                format!("{:.6e}", self.length.from_base(u.dy)),
                format!("{:.6e}", self.force.from_base(step.applied_forces[base])),
                format!("{:.6e}", self.force.from_base(step.applied_forces[base + 1])),
                step.converged.to_string(),
            ]));
        }
        Ok(csv)
    }

    /// Format the monitor table without writing it
    pub fn monitor_table(&self, samples: &[MonitorSample]) -> String {
        let mut csv = self.row(&[
            "step".to_string(),
            "load_factor".to_string(),
            format!("displacement [{}]", self.length.symbol()),
        ]);
        for s in samples {
            csv.push('\n');
            csv.push_str(&self.row(&[
                s.step.to_string(),
                format!("{:.6}", s.load_factor),
                format!("{:.6e}", self.length.from_base(s.displacement)),
            ]));
        }
        csv
    }

    fn row(&self, fields: &[String]) -> String {
        fields.join(&self.delimiter.to_string())
    }
}
