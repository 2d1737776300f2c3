//! One-shot finite difference Jacobians for closures.

use crate::error::DiffResult;
use crate::estimator::{EstimatorConfig, JacobianEstimator};
use crate::function::from_fn;
use crate::method::DifferentiationMethod;
use nalgebra::{DMatrix, DVector};
use nx_core::Scalar;

/// Compute the Jacobian of `f` at `x` without keeping an estimator around.
///
/// The output dimension is learned from one evaluation of `f(x)`, which the
/// forward quotient then reuses as its base point. The other methods do not
/// need `f(x)`, so they spend one call more than a retained estimator would.
/// Each coordinate is perturbed by `sqrt(eps) * max(1, |x_j|)`.
pub fn finite_difference_jacobian<T, F>(
    x: &DVector<T>,
    f: F,
    method: DifferentiationMethod,
) -> DiffResult<DMatrix<T>>
where
    T: Scalar,
    F: Fn(&DVector<T>) -> DiffResult<DVector<T>>,
{
    let f_x = f(x)?;
    let m = f_x.len();
    let config = EstimatorConfig {
        method,
        ..EstimatorConfig::default()
    };
    let mut estimator = JacobianEstimator::with_config(from_fn(x.len(), m, f), config);
    estimator.scale_step_sizes_to(x)?;
    estimator.evaluate_from(x, Some(f_x))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DiffError;
    use std::cell::Cell;

    #[test]
    fn jacobian_linear() {
        // f(x) = 2*x, J = 2
        let f = |x: &DVector<f64>| -> DiffResult<DVector<f64>> {
            Ok(DVector::from_element(1, 2.0 * x[0]))
        };

        let x = DVector::from_element(1, 3.0);
        let jac = finite_difference_jacobian(&x, f, DifferentiationMethod::NewtonQuotient).unwrap();

        assert!((jac[(0, 0)] - 2.0).abs() < 1e-5);
    }

    #[test]
    fn jacobian_quadratic() {
        // f(x) = x^2, J = 2*x
        let f = |x: &DVector<f64>| -> DiffResult<DVector<f64>> {
            Ok(DVector::from_element(1, x[0] * x[0]))
        };

        let x = DVector::from_element(1, 3.0);
        for method in DifferentiationMethod::ALL {
            let jac = finite_difference_jacobian(&x, f, method).unwrap();
            assert!((jac[(0, 0)] - 6.0).abs() < 1e-5, "{method}");
        }
    }

    #[test]
    fn call_count_per_method() {
        let calls = Cell::new(0usize);
        let f = |x: &DVector<f64>| -> DiffResult<DVector<f64>> {
            calls.set(calls.get() + 1);
            Ok(DVector::from_vec(vec![x[0] * x[1], x[2]]))
        };
        let x = DVector::from_vec(vec![1.0, 2.0, 3.0]);

        for (method, expected) in [
            (DifferentiationMethod::NewtonQuotient, 4),
            (DifferentiationMethod::SymmetricQuotient, 7),
            (DifferentiationMethod::SecondOrderQuotient, 13),
        ] {
            calls.set(0);
            finite_difference_jacobian(&x, f, method).unwrap();
            assert_eq!(calls.get(), expected, "{method}");
        }
    }

    #[test]
    fn non_finite_point_is_rejected() {
        let f = |x: &DVector<f64>| -> DiffResult<DVector<f64>> { Ok(x.map(|v| v.min(1.0))) };
        let x = DVector::from_vec(vec![f64::INFINITY, 0.5]);
        let err =
            finite_difference_jacobian(&x, f, DifferentiationMethod::NewtonQuotient).unwrap_err();
        assert!(matches!(
            err,
            DiffError::Core(nx_core::CoreError::NonFinite {
                what: "scaling point",
                ..
            })
        ));
    }

    #[test]
    fn jacobian_rectangular() {
        // f(x, y, z) = [x*y, y + z], J = [[y, x, 0], [0, 1, 1]]
        let f = |x: &DVector<f64>| -> DiffResult<DVector<f64>> {
            Ok(DVector::from_vec(vec![x[0] * x[1], x[1] + x[2]]))
        };

        let x = DVector::from_vec(vec![2.0, -3.0, 250.0]);
        let jac =
            finite_difference_jacobian(&x, f, DifferentiationMethod::SymmetricQuotient).unwrap();

        let expected = DMatrix::from_row_slice(2, 3, &[-3.0, 2.0, 0.0, 0.0, 1.0, 1.0]);
        assert_eq!(jac.shape(), (2, 3));
        assert!((jac - expected).abs().max() < 1e-6);
    }
}
