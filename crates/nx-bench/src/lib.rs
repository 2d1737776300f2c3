//! Accuracy sweeps for the finite difference Jacobian estimator.
//!
//! Each [`AccuracyCase`] pairs a function with its analytic Jacobian. A sweep
//! evaluates the estimator for every requested method and step size and
//! records the worst element-wise error against the analytic result.

use nalgebra::{DMatrix, DVector};
use nx_core::max_abs_diff;
use nx_diff::{DiffError, DiffResult, DifferentiationMethod, JacobianEstimator, from_fn};
use serde::Serialize;
use std::time::Instant;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum BenchError {
    #[error("Unknown case: {name}")]
    UnknownCase { name: String },

    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },

    #[error("Estimator error: {0}")]
    Diff(#[from] DiffError),
}

pub type BenchResult<T> = Result<T, BenchError>;

type VectorFn = fn(&DVector<f64>) -> DiffResult<DVector<f64>>;
type JacobianFn = fn(&DVector<f64>) -> DMatrix<f64>;

/// A function with a known analytic Jacobian, probed at a fixed point.
#[derive(Clone)]
pub struct AccuracyCase {
    pub name: &'static str,
    pub description: &'static str,
    pub input_dim: usize,
    pub output_dim: usize,
    pub point: Vec<f64>,
    function: VectorFn,
    jacobian: JacobianFn,
}

impl AccuracyCase {
    pub fn analytic_jacobian(&self) -> DMatrix<f64> {
        (self.jacobian)(&DVector::from_row_slice(&self.point))
    }
}

/// One (case, method, step) measurement.
#[derive(Debug, Clone, Serialize)]
pub struct SweepRecord {
    pub case: String,
    pub method: DifferentiationMethod,
    pub step: f64,
    pub max_abs_error: f64,
    pub evaluations: usize,
    /// Median wall time of one Jacobian evaluation
    pub elapsed_s: f64,
}

fn quadratic(x: &DVector<f64>) -> DiffResult<DVector<f64>> {
    Ok(DVector::from_vec(vec![x[0] * x[0], x[0] * x[1]]))
}

fn quadratic_jacobian(x: &DVector<f64>) -> DMatrix<f64> {
    DMatrix::from_row_slice(2, 2, &[2.0 * x[0], 0.0, x[1], x[0]])
}

fn trig(x: &DVector<f64>) -> DiffResult<DVector<f64>> {
    Ok(DVector::from_vec(vec![
        x[0].sin() * x[1].exp(),
        x[0].powi(3) + x[1].cos(),
    ]))
}

fn trig_jacobian(x: &DVector<f64>) -> DMatrix<f64> {
    DMatrix::from_row_slice(
        2,
        2,
        &[
            x[0].cos() * x[1].exp(),
            x[0].sin() * x[1].exp(),
            3.0 * x[0] * x[0],
            -x[1].sin(),
        ],
    )
}

const LINEAR_MAP: [f64; 9] = [2.0, -1.0, 0.0, 0.5, 3.0, -4.0, 1.0, 0.0, 1.5];

fn linear(x: &DVector<f64>) -> DiffResult<DVector<f64>> {
    Ok(DMatrix::from_row_slice(3, 3, &LINEAR_MAP) * x)
}

fn linear_jacobian(_: &DVector<f64>) -> DMatrix<f64> {
    DMatrix::from_row_slice(3, 3, &LINEAR_MAP)
}

/// Built-in cases.
pub fn default_cases() -> Vec<AccuracyCase> {
    vec![
        AccuracyCase {
            name: "quadratic",
            description: "[x0^2, x0*x1]",
            input_dim: 2,
            output_dim: 2,
            point: vec![1.5, -0.5],
            function: quadratic,
            jacobian: quadratic_jacobian,
        },
        AccuracyCase {
            name: "trig",
            description: "[sin(x0)*exp(x1), x0^3 + cos(x1)]",
            input_dim: 2,
            output_dim: 2,
            point: vec![0.7, 0.3],
            function: trig,
            jacobian: trig_jacobian,
        },
        AccuracyCase {
            name: "linear",
            description: "fixed 3x3 linear map",
            input_dim: 3,
            output_dim: 3,
            point: vec![1.0, -2.0, 4.0],
            function: linear,
            jacobian: linear_jacobian,
        },
    ]
}

pub fn find_case(name: &str) -> BenchResult<AccuracyCase> {
    default_cases()
        .into_iter()
        .find(|c| c.name == name)
        .ok_or_else(|| BenchError::UnknownCase {
            name: name.to_string(),
        })
}

/// Steps `10^min_exp ..= 10^max_exp`, one per decade.
pub fn decade_steps(min_exp: i32, max_exp: i32) -> BenchResult<Vec<f64>> {
    if min_exp > max_exp {
        return Err(BenchError::InvalidArg {
            what: "min exponent above max exponent",
        });
    }
    Ok((min_exp..=max_exp).map(|e| 10f64.powi(e)).collect())
}

/// Evaluate `case` for every method and step, timing `repeats` runs each.
pub fn sweep(
    case: &AccuracyCase,
    methods: &[DifferentiationMethod],
    steps: &[f64],
    repeats: usize,
) -> BenchResult<Vec<SweepRecord>> {
    if repeats == 0 {
        return Err(BenchError::InvalidArg {
            what: "repeats must be at least 1",
        });
    }

    let exact = case.analytic_jacobian();
    let x = DVector::from_row_slice(&case.point);
    let mut estimator =
        JacobianEstimator::new(from_fn(case.input_dim, case.output_dim, case.function));
    let mut records = Vec::with_capacity(methods.len() * steps.len());

    for &method in methods {
        estimator.set_differentiation_method(method);
        for &step in steps {
            estimator.set_step_sizes(DVector::from_element(case.input_dim, step))?;

            let mut times = Vec::with_capacity(repeats);
            let mut jac = DMatrix::zeros(case.output_dim, case.input_dim);
            for _ in 0..repeats {
                let start = Instant::now();
                jac = estimator.evaluate(&x)?;
                times.push(start.elapsed().as_secs_f64());
            }

            let max_abs_error = max_abs_diff(&jac, &exact).unwrap_or(f64::NAN);
            debug!(case = case.name, %method, step, max_abs_error, "sweep point");
            records.push(SweepRecord {
                case: case.name.to_string(),
                method,
                step,
                max_abs_error,
                evaluations: estimator.last_evaluation_count(),
                elapsed_s: median(&mut times),
            });
        }
    }

    Ok(records)
}

/// The lowest-error record for each method, in first-seen method order.
pub fn best_per_method(records: &[SweepRecord]) -> Vec<&SweepRecord> {
    let mut best: Vec<&SweepRecord> = Vec::new();
    for record in records {
        match best.iter_mut().find(|b| b.method == record.method) {
            Some(slot) => {
                if record.max_abs_error < slot.max_abs_error {
                    *slot = record;
                }
            }
            None => best.push(record),
        }
    }
    best
}

fn median(values: &mut [f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.sort_by(|a, b| a.total_cmp(b));
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        (values[mid - 1] + values[mid]) / 2.0
    } else {
        values[mid]
    }
}
