//! DoF numbering, constraint map and global system assembly

use log::trace;

use crate::elements::{grip_by_number, FiniteElement, Grip};
use crate::error::{FEAError, FEAResult};
use crate::math::{Mat, Vec as FEVec};

/// Global DoF numbering and the constrained DoF set, derived from the grips.
///
/// Grip `n` (1-based) owns DoFs `2(n-1)` and `2(n-1)+1`. The map is built
/// once per analysis run; the grip collection does not change while solving.
#[derive(Debug, Clone, PartialEq)]
pub struct DofMap {
    n_dofs: usize,
    constrained: Vec<usize>,
}

impl DofMap {
    /// Build the DoF map, checking that every grip holds the DoF pair of its
    /// arena position
    pub fn from_grips(grips: &[Grip]) -> FEAResult<Self> {
        let n_dofs = 2 * grips.len();
        let mut constrained = Vec::new();

        for (idx, grip) in grips.iter().enumerate() {
            let expected = [2 * idx, 2 * idx + 1];
            if grip.number() != idx + 1 || grip.dofs() != expected {
                return Err(FEAError::DuplicateDof(grip.number()));
            }
            for (offset, restrained) in grip.constraint.as_array().iter().enumerate() {
                if *restrained {
                    constrained.push(expected[offset]);
                }
            }
        }

        Ok(Self {
            n_dofs,
            constrained,
        })
    }

    /// Total number of DoFs (2 per grip)
    pub fn n_dofs(&self) -> usize {
        self.n_dofs
    }

    /// Constrained global DoF indices in increasing order
    pub fn constrained(&self) -> &[usize] {
        &self.constrained
    }

    /// Free global DoF indices in increasing order
    pub fn free_dofs(&self) -> Vec<usize> {
        (0..self.n_dofs)
            .filter(|dof| self.constrained.binary_search(dof).is_err())
            .collect()
    }

    /// Check whether a DoF is constrained
    pub fn is_constrained(&self, dof: usize) -> bool {
        self.constrained.binary_search(&dof).is_ok()
    }

    /// Scatter each grip's applied force into its two DoF slots
    pub fn force_vector(&self, grips: &[Grip]) -> FEVec {
        let mut f = FEVec::zeros(self.n_dofs);
        for grip in grips {
            let [dx, dy] = grip.dofs();
            f[dx] = grip.force[0];
            f[dy] = grip.force[1];
        }
        f
    }

    /// Gather the current grip displacements into a global vector
    pub fn displacement_vector(&self, grips: &[Grip]) -> FEVec {
        let mut u = FEVec::zeros(self.n_dofs);
        for grip in grips {
            let [dx, dy] = grip.dofs();
            let d = grip.displacement();
            u[dx] = d[0];
            u[dy] = d[1];
        }
        u
    }
}

/// Builds global stiffness and force arrays from element contributions
pub struct Assembler<'a> {
    dofs: &'a DofMap,
}

impl<'a> Assembler<'a> {
    pub fn new(dofs: &'a DofMap) -> Self {
        Self { dofs }
    }

    /// The DoF map this assembler scatters into
    pub fn dof_map(&self) -> &DofMap {
        self.dofs
    }

    /// Global DoF indices of an element, grip by grip
    fn element_dofs(&self, grips: &[Grip], element: &dyn FiniteElement) -> FEAResult<Vec<usize>> {
        let mut indices = Vec::with_capacity(element.dof_count());
        for &number in element.grips() {
            let grip = grip_by_number(grips, number)?;
            indices.extend_from_slice(&grip.dofs());
        }
        Ok(indices)
    }

    /// Sum element stiffness blocks into a fresh global matrix
    pub fn assemble_stiffness(
        &self,
        grips: &[Grip],
        elements: &[Box<dyn FiniteElement>],
    ) -> FEAResult<Mat> {
        let n = self.dofs.n_dofs();
        let mut k_global = Mat::zeros(n, n);

        for element in elements {
            let indices = self.element_dofs(grips, element.as_ref())?;
            let k_elem = element.stiffness();
            if k_elem.nrows() != indices.len() || k_elem.ncols() != indices.len() {
                return Err(FEAError::InvalidInput(format!(
                    "Element {} stiffness is {}x{}, expected {}x{}",
                    element.number(),
                    k_elem.nrows(),
                    k_elem.ncols(),
                    indices.len(),
                    indices.len()
                )));
            }

            for (a, &ga) in indices.iter().enumerate() {
                for (b, &gb) in indices.iter().enumerate() {
                    k_global[(ga, gb)] += k_elem[(a, b)];
                }
            }
        }

        trace!("assembled {}x{} stiffness from {} elements", n, n, elements.len());
        Ok(k_global)
    }

    /// Sum element internal force vectors into a fresh global vector
    pub fn assemble_internal_forces(
        &self,
        grips: &[Grip],
        elements: &[Box<dyn FiniteElement>],
    ) -> FEAResult<FEVec> {
        let mut f_global = FEVec::zeros(self.dofs.n_dofs());

        for element in elements {
            let indices = self.element_dofs(grips, element.as_ref())?;
            let f_elem = element.forces();
            if f_elem.len() != indices.len() {
                return Err(FEAError::InvalidInput(format!(
                    "Element {} force vector has {} entries, expected {}",
                    element.number(),
                    f_elem.len(),
                    indices.len()
                )));
            }

            for (a, &ga) in indices.iter().enumerate() {
                f_global[ga] += f_elem[a];
            }
        }

        Ok(f_global)
    }

    /// Pin every constrained DoF: zero its row and column, put 1 on the
    /// diagonal and zero the matching force entry.
    pub fn simplify(&self, k: &mut Mat, f: &mut FEVec) {
        for &dof in self.dofs.constrained() {
            k.row_mut(dof).fill(0.0);
            k.column_mut(dof).fill(0.0);
            k[(dof, dof)] = 1.0;
            f[dof] = 0.0;
        }
    }

    /// Zero the constrained entries of a global vector
    pub fn simplify_vector(&self, v: &mut FEVec) {
        for &dof in self.dofs.constrained() {
            v[dof] = 0.0;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::elements::{Constraint, LinearElement};
    use approx::assert_relative_eq;

    fn grips() -> Vec<Grip> {
        let layout = [
            (0.0, 0.0, Constraint::fixed(), [0.0, 0.0]),
            (1.0, 0.0, Constraint::free(), [100.0, -50.0]),
            (2.0, 0.0, Constraint::roller_y(), [7.0, 3.0]),
        ];
        layout
            .iter()
            .enumerate()
            .map(|(i, &(x, y, c, f))| {
                let mut g = Grip::new(x, y).with_constraint(c).with_force(f[0], f[1]);
                g.assign(i + 1);
                g
            })
            .collect()
    }

    #[test]
    fn test_force_vector_scatter() {
        let grips = grips();
        let map = DofMap::from_grips(&grips).unwrap();
        let f = map.force_vector(&grips);
        for grip in &grips {
            let [dx, dy] = grip.dofs();
            assert_eq!(f[dx], grip.force[0]);
            assert_eq!(f[dy], grip.force[1]);
        }
    }

    #[test]
    fn test_constrained_dofs() {
        let grips = grips();
        let map = DofMap::from_grips(&grips).unwrap();
        assert_eq!(map.n_dofs(), 6);
        assert_eq!(map.constrained(), &[0, 1, 5]);
        assert_eq!(map.free_dofs(), vec![2, 3, 4]);
        assert!(map.is_constrained(5));
        assert!(map.constrained().iter().all(|&d| d < map.n_dofs()));
    }

    #[test]
    fn test_misnumbered_grip_rejected() {
        let mut grips = grips();
        grips[2].assign(2);
        assert!(matches!(
            DofMap::from_grips(&grips),
            Err(FEAError::DuplicateDof(2))
        ));
    }

    #[test]
    fn test_shared_grip_superposition() {
        let mut grips = grips();
        for g in grips.iter_mut() {
            g.set_displacement(0.01, 0.02);
        }
        let map = DofMap::from_grips(&grips).unwrap();

        let ka = Mat::from_fn(4, 4, |r, c| 1.0 + (r * 4 + c) as f64);
        let kb = Mat::from_fn(4, 4, |r, c| 10.0 * (1 + r + c) as f64);
        let elements: Vec<Box<dyn FiniteElement>> = vec![
            Box::new(LinearElement::new(vec![1, 2], ka.clone()).unwrap()),
            Box::new(LinearElement::new(vec![2, 3], kb.clone()).unwrap()),
        ];

        let k = Assembler::new(&map).assemble_stiffness(&grips, &elements).unwrap();

        // Grip 2 is local grip 1 of element A and local grip 0 of element B
        for a in 0..2 {
            for b in 0..2 {
                assert_relative_eq!(k[(2 + a, 2 + b)], ka[(2 + a, 2 + b)] + kb[(a, b)]);
            }
        }
        // Grips 1 and 3 are not coupled
        assert_eq!(k[(0, 4)], 0.0);
    }

    #[test]
    fn test_internal_force_assembly() {
        let mut grips = grips();
        grips[1].set_displacement(0.5, 0.0);
        let map = DofMap::from_grips(&grips).unwrap();
        let mut e1 = LinearElement::spring(1, 2, 10.0, [1.0, 0.0]).unwrap();
        let mut e2 = LinearElement::spring(2, 3, 20.0, [1.0, 0.0]).unwrap();
        e1.update_displacements(&grips).unwrap();
        e1.calculate_forces(&grips).unwrap();
        e2.update_displacements(&grips).unwrap();
        e2.calculate_forces(&grips).unwrap();
        let elements: Vec<Box<dyn FiniteElement>> = vec![Box::new(e1), Box::new(e2)];

        let f = Assembler::new(&map).assemble_internal_forces(&grips, &elements).unwrap();
        assert_relative_eq!(f[0], -5.0);
        assert_relative_eq!(f[2], 5.0 + 10.0);
        assert_relative_eq!(f[4], -10.0);
    }

    #[test]
    fn test_unknown_grip_is_fatal() {
        let grips = grips();
        let map = DofMap::from_grips(&grips).unwrap();
        let elements: Vec<Box<dyn FiniteElement>> =
            vec![Box::new(LinearElement::new(vec![1, 9], Mat::identity(4, 4)).unwrap())];
        assert!(matches!(
            Assembler::new(&map).assemble_stiffness(&grips, &elements),
            Err(FEAError::GripNotFound(9))
        ));
    }

    #[test]
    fn test_constraint_simplification() {
        let grips = grips();
        let map = DofMap::from_grips(&grips).unwrap();
        let mut k = Mat::from_fn(6, 6, |r, c| 3.0 + r as f64 - 0.5 * c as f64);
        let mut f = FEVec::from_element(6, 42.0);

        Assembler::new(&map).simplify(&mut k, &mut f);

        for &dof in map.constrained() {
            for j in 0..6 {
                let expected = if j == dof { 1.0 } else { 0.0 };
                assert_eq!(k[(dof, j)], expected);
                assert_eq!(k[(j, dof)], expected);
            }
            assert_eq!(f[dof], 0.0);
        }
        assert_eq!(k.nrows(), 6);
        assert_eq!(f[2], 42.0);
    }
}
