//! The estimator as the derivative source of a Newton iteration.

use nalgebra::DVector;
use nx_core::{Tolerances, nearly_equal};
use nx_diff::{DiffError, DiffResult, DifferentiationMethod, JacobianEstimator, from_fn};

fn circle_line(x: &DVector<f64>) -> DiffResult<DVector<f64>> {
    // x0^2 + x1^2 = 4 intersected with x0 = x1
    Ok(DVector::from_vec(vec![x[0] * x[0] + x[1] * x[1] - 4.0, x[0] - x[1]]))
}

fn solve(method: DifferentiationMethod) -> DiffResult<(DVector<f64>, usize)> {
    let mut est = JacobianEstimator::new(from_fn(2, 2, circle_line));
    est.set_differentiation_method(method);

    let mut x = DVector::from_vec(vec![1.0, 0.5]);
    for iter in 0..50 {
        let r = circle_line(&x)?;
        if r.norm() < 1e-12 {
            return Ok((x, iter));
        }
        let jac = est.evaluate(&x)?;
        let dx = jac
            .lu()
            .solve(&(-r))
            .ok_or_else(|| DiffError::evaluation("singular jacobian"))?;
        x += dx;
    }
    Err(DiffError::evaluation("newton did not converge"))
}

#[test]
fn newton_converges_with_every_method() {
    let root = 2.0_f64.sqrt();
    for method in DifferentiationMethod::ALL {
        let (x, iterations) = solve(method).unwrap();
        let tol = Tolerances {
            abs: 1e-9,
            rel: 1e-9,
        };
        assert!(nearly_equal(x[0], root, tol), "{method}: {x}");
        assert!(nearly_equal(x[1], root, tol), "{method}: {x}");
        assert!(iterations < 20, "{method}: {iterations} iterations");
    }
}
