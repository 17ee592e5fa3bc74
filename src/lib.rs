//! FEA Nonlinear - a native Rust nonlinear static Finite Element library
//!
//! This library solves 2D structures of grips and elements with geometric
//! nonlinearity, supporting:
//! - Truss elements (Total Lagrangian and small-displacement) and constant
//!   stiffness elements
//! - Linear static analysis
//! - Incremental-iterative analysis with Newton-Raphson, modified
//!   Newton-Raphson and Secant (Broyden) iterations
//! - Force control and displacement control of load steps
//!
//! ## Example
//! ```rust
//! use fea_nonlinear::prelude::*;
//!
//! let mut model = FEModel::new();
//!
//! // Shallow two-bar arch, symmetric half: apex slides vertically
//! let base = model
//!     .add_grip(Grip::new(0.0, 0.0).with_constraint(Constraint::fixed()))
//!     .unwrap();
//! let apex = model
//!     .add_grip(Grip::new(2.0, 0.5).with_constraint(Constraint::roller_x()))
//!     .unwrap();
//! model
//!     .add_element(Truss::new(base, apex, Material::new(1e8, 1e-2)))
//!     .unwrap();
//! model.add_grip_load(apex, GripLoad::fy(-1000.0)).unwrap();
//!
//! // Drive the apex down by 0.4 in 20 steps
//! model.set_monitor(apex, Axis::Y).unwrap();
//! let results = model
//!     .analyze(AnalysisOptions::displacement_controlled(20, -0.4))
//!     .unwrap();
//! assert!(results.is_complete());
//! ```

pub mod analysis;
pub mod assembly;
pub mod elements;
pub mod error;
pub mod export;
pub mod loads;
pub mod math;
pub mod model;
pub mod results;
pub mod units;

// Re-export common types
pub mod prelude {
    pub use crate::analysis::{
        AnalysisOptions, AnalysisParameters, AnalysisType, ControlKind, DivergenceReason,
        SolverKind,
    };
    pub use crate::elements::{
        Axis, Constraint, FiniteElement, Grip, LinearElement, Material, Truss, TrussFormulation,
    };
    pub use crate::error::{FEAError, FEAResult};
    pub use crate::export::CsvExporter;
    pub use crate::loads::{GripLoad, LoadHistory};
    pub use crate::model::FEModel;
    pub use crate::results::{
        AnalysisResults, AnalysisStatus, AnalysisSummary, GripDisplacement, LoadStepResult,
        MonitorSample, Reactions,
    };
    pub use crate::units::{ForceUnit, LengthUnit};
}
