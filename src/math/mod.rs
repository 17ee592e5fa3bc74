//! Mathematical utilities for FEA calculations

pub mod sparse;

use nalgebra::{DMatrix, DVector};

pub use sparse::solve_sparse_cholesky;

pub type Mat = DMatrix<f64>;
pub type Vec = DVector<f64>;

/// Solve a linear system using LU decomposition
pub fn solve_linear_system(a: &Mat, b: &Vec) -> Option<Vec> {
    a.clone().lu().solve(b)
}

/// Euclidean norm that treats an empty vector as zero
pub fn norm(v: &Vec) -> f64 {
    if v.is_empty() {
        0.0
    } else {
        v.norm()
    }
}

/// Ratio `num / den`, or zero when the denominator vanishes
pub fn safe_ratio(num: f64, den: f64) -> f64 {
    if den.abs() < f64::MIN_POSITIVE {
        0.0
    } else {
        num / den
    }
}

/// True if any entry of the vector is NaN
pub fn vec_has_nan(v: &Vec) -> bool {
    v.iter().any(|x| x.is_nan())
}

/// True if any entry of the matrix is NaN
pub fn mat_has_nan(m: &Mat) -> bool {
    m.iter().any(|x| x.is_nan())
}

/// Check whether a matrix is symmetric within a relative tolerance
pub fn is_symmetric(m: &Mat, tol: f64) -> bool {
    if m.nrows() != m.ncols() {
        return false;
    }
    let scale = m.amax().max(1.0);
    for i in 0..m.nrows() {
        for j in (i + 1)..m.ncols() {
            if (m[(i, j)] - m[(j, i)]).abs() > tol * scale {
                return false;
            }
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_solve_linear_system() {
        let a = Mat::from_row_slice(2, 2, &[4.0, 1.0, 1.0, 3.0]);
        let b = Vec::from_vec(vec![1.0, 2.0]);
        let x = solve_linear_system(&a, &b).unwrap();
        assert_relative_eq!(x[0], 1.0 / 11.0, epsilon = 1e-12);
        assert_relative_eq!(x[1], 7.0 / 11.0, epsilon = 1e-12);
    }

    #[test]
    fn test_singular_system() {
        let a = Mat::zeros(2, 2);
        let b = Vec::from_vec(vec![1.0, 2.0]);
        assert!(solve_linear_system(&a, &b).is_none());
    }

    #[test]
    fn test_safe_ratio() {
        assert_eq!(safe_ratio(3.0, 0.0), 0.0);
        assert_relative_eq!(safe_ratio(3.0, 2.0), 1.5);
    }

    #[test]
    fn test_nan_detection() {
        let mut v = Vec::zeros(3);
        assert!(!vec_has_nan(&v));
        v[1] = f64::NAN;
        assert!(vec_has_nan(&v));

        let mut m = Mat::identity(2, 2);
        assert!(!mat_has_nan(&m));
        m[(0, 1)] = f64::NAN;
        assert!(mat_has_nan(&m));
    }

    #[test]
    fn test_symmetry_check() {
        let a = Mat::from_row_slice(2, 2, &[2.0, -1.0, -1.0, 2.0]);
        assert!(is_symmetric(&a, 1e-12));
        let b = Mat::from_row_slice(2, 2, &[2.0, -1.0, 0.5, 2.0]);
        assert!(!is_symmetric(&b, 1e-12));
    }
}
