//! Sparse Cholesky solve for simplified stiffness systems
//!
//! Stiffness is assembled densely (iterations keep it for modified and
//! secant updates and every load step records it). Only the factorisation
//! runs on the compressed column form, which pays off once the DoF count
//! makes a dense LU the dominant cost.

use nalgebra::{DMatrix, DVector};
use nalgebra_sparse::factorization::CscCholesky;
use nalgebra_sparse::CscMatrix;

/// Solve `A x = b` with a sparse Cholesky factorisation.
///
/// Returns `None` when `A` is not symmetric positive definite; callers fall
/// back to a dense LU solve in that case.
pub fn solve_sparse_cholesky(a: &DMatrix<f64>, b: &DVector<f64>) -> Option<DVector<f64>> {
    // Explicit zeros are dropped in the conversion
    let csc = CscMatrix::from(a);
    let chol = CscCholesky::factor(&csc).ok()?;

    let rhs = DMatrix::from_column_slice(b.len(), 1, b.as_slice());
    let x = chol.solve(&rhs);
    Some(DVector::from_column_slice(x.as_slice()))
}
