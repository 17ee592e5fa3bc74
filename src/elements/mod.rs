//! Grips and finite elements

mod constraint;
mod element;
mod grip;
mod linear;
mod material;
mod truss;

pub use constraint::Constraint;
pub use element::FiniteElement;
pub(crate) use element::grip_by_number;
pub use grip::{Axis, Grip};
pub use linear::LinearElement;
pub use material::Material;
pub use truss::{Truss, TrussFormulation};
