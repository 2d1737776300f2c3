//! Reusable finite difference Jacobian estimator.

use crate::error::{DiffError, DiffResult};
use crate::function::VectorFunction;
use crate::method::DifferentiationMethod;
use nalgebra::{DMatrix, DVector};
use nx_core::error::check_index;
use nx_core::{Scalar, default_step, ensure_finite, is_valid_step, lit, scaled_step};
use std::fmt;
use tracing::{debug, trace};

/// Estimator configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EstimatorConfig {
    /// Difference quotient applied to every column
    pub method: DifferentiationMethod,
    /// Fail on NaN/Inf function outputs instead of passing them through
    pub reject_non_finite: bool,
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        Self {
            method: DifferentiationMethod::SymmetricQuotient,
            reject_non_finite: true,
        }
    }
}

/// Approximates the Jacobian of a [`VectorFunction`] by finite differences.
///
/// The estimator owns the function, one step size per input coordinate and
/// the buffer holding the last computed Jacobian. Step sizes default to
/// `sqrt(eps)`; coordinates far from unit scale should get their own step
/// through [`set_step_sizes`](Self::set_step_sizes) or
/// [`scale_step_sizes_to`](Self::scale_step_sizes_to).
///
/// Column j of the result approximates `dF/dx_j` and is computed by
/// perturbing only coordinate j, so columns are independent of each other.
#[derive(Clone)]
pub struct JacobianEstimator<F, T: Scalar = f64> {
    function: Option<F>,
    input_dim: usize,
    output_dim: usize,
    step_sizes: DVector<T>,
    config: EstimatorConfig,
    jacobian: DMatrix<T>,
    // Columns land here first and are swapped in only when all succeed
    pending: DMatrix<T>,
    evaluations: usize,
}

impl<F, T: Scalar> Default for JacobianEstimator<F, T> {
    fn default() -> Self {
        Self {
            function: None,
            input_dim: 0,
            output_dim: 0,
            step_sizes: DVector::zeros(0),
            config: EstimatorConfig::default(),
            jacobian: DMatrix::zeros(0, 0),
            pending: DMatrix::zeros(0, 0),
            evaluations: 0,
        }
    }
}

impl<F, T: Scalar> fmt::Debug for JacobianEstimator<F, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JacobianEstimator")
            .field("bound", &self.function.is_some())
            .field("input_dim", &self.input_dim)
            .field("output_dim", &self.output_dim)
            .field("step_sizes", &self.step_sizes.as_slice())
            .field("config", &self.config)
            .finish()
    }
}

impl<F, T> JacobianEstimator<F, T>
where
    T: Scalar,
    F: VectorFunction<T>,
{
    /// Estimator with no function; [`evaluate`](Self::evaluate) fails until
    /// one is bound.
    pub fn unbound() -> Self {
        Self::default()
    }

    /// Wrap `function` with the default configuration.
    pub fn new(function: F) -> Self {
        Self::with_config(function, EstimatorConfig::default())
    }

    pub fn with_config(function: F, config: EstimatorConfig) -> Self {
        let mut estimator = Self {
            config,
            ..Self::default()
        };
        estimator.bind(function);
        estimator
    }

    /// Bind or replace the wrapped function.
    ///
    /// Dimensions are taken from the function; step sizes are reset to the
    /// default and the Jacobian buffer is resized. The configuration is kept.
    pub fn bind(&mut self, function: F) {
        self.input_dim = function.input_dim();
        self.output_dim = function.output_dim();
        self.step_sizes = DVector::from_element(self.input_dim, default_step::<T>());
        self.jacobian = DMatrix::zeros(self.output_dim, self.input_dim);
        self.pending = DMatrix::zeros(self.output_dim, self.input_dim);
        self.evaluations = 0;
        self.function = Some(function);
        debug!(
            input_dim = self.input_dim,
            output_dim = self.output_dim,
            "bound function"
        );
    }

    pub fn set_differentiation_method(&mut self, method: DifferentiationMethod) {
        self.config.method = method;
    }

    pub fn set_config(&mut self, config: EstimatorConfig) {
        self.config = config;
    }

    /// Replace every step size at once.
    ///
    /// Nothing is applied unless the whole vector is valid.
    pub fn set_step_sizes(&mut self, steps: DVector<T>) -> DiffResult<()> {
        if steps.len() != self.input_dim {
            return Err(DiffError::DimensionMismatch {
                what: "step sizes",
                expected: self.input_dim,
                actual: steps.len(),
            });
        }
        for (index, &h) in steps.iter().enumerate() {
            validate_step(index, h)?;
        }
        debug!(len = steps.len(), "step sizes replaced");
        self.step_sizes = steps;
        Ok(())
    }

    pub fn set_step_size(&mut self, index: usize, h: T) -> DiffResult<()> {
        check_index("step sizes", index, self.input_dim)?;
        validate_step(index, h)?;
        self.step_sizes[index] = h;
        Ok(())
    }

    /// Set `h_i = sqrt(eps) * max(1, |x_i|)` for a representative point `x`.
    ///
    /// Steps stay fixed afterwards; calling this again is the only way they
    /// follow the point. A non-finite coordinate is rejected and nothing is
    /// applied.
    pub fn scale_step_sizes_to(&mut self, x: &DVector<T>) -> DiffResult<()> {
        if self.function.is_none() {
            return Err(DiffError::UnboundFunction);
        }
        if x.len() != self.input_dim {
            return Err(DiffError::DimensionMismatch {
                what: "scaling point",
                expected: self.input_dim,
                actual: x.len(),
            });
        }
        for &xi in x.iter() {
            ensure_finite(xi, "scaling point")?;
        }
        let steps = x.map(scaled_step);
        for (index, &h) in steps.iter().enumerate() {
            validate_step(index, h)?;
        }
        self.step_sizes = steps;
        debug!(len = x.len(), "step sizes scaled to point");
        Ok(())
    }

    pub fn is_bound(&self) -> bool {
        self.function.is_some()
    }

    pub fn function(&self) -> Option<&F> {
        self.function.as_ref()
    }

    pub fn input_dim(&self) -> usize {
        self.input_dim
    }

    pub fn output_dim(&self) -> usize {
        self.output_dim
    }

    pub fn method(&self) -> DifferentiationMethod {
        self.config.method
    }

    pub fn config(&self) -> &EstimatorConfig {
        &self.config
    }

    pub fn step_sizes(&self) -> &DVector<T> {
        &self.step_sizes
    }

    /// Jacobian computed by the last successful evaluation.
    ///
    /// A failed evaluation leaves it untouched.
    pub fn jacobian(&self) -> &DMatrix<T> {
        &self.jacobian
    }

    /// Number of calls made to the function by the last evaluation, whether
    /// it succeeded or not.
    pub fn last_evaluation_count(&self) -> usize {
        self.evaluations
    }

    /// Approximate the Jacobian of the wrapped function at `x`.
    ///
    /// Returns an `output_dim x input_dim` matrix. The internal buffer is
    /// overwritten and a copy is returned. Function failures are propagated
    /// as-is; no default is substituted.
    pub fn evaluate(&mut self, x: &DVector<T>) -> DiffResult<DMatrix<T>> {
        self.evaluate_from(x, None)
    }

    /// Like [`evaluate`](Self::evaluate), reusing an already known `F(x)`
    /// for the forward quotient instead of calling the function again.
    pub(crate) fn evaluate_from(
        &mut self,
        x: &DVector<T>,
        f_x: Option<DVector<T>>,
    ) -> DiffResult<DMatrix<T>> {
        self.evaluations = 0;
        let function = self.function.as_ref().ok_or(DiffError::UnboundFunction)?;
        if x.len() != self.input_dim {
            return Err(DiffError::DimensionMismatch {
                what: "evaluation point",
                expected: self.input_dim,
                actual: x.len(),
            });
        }

        let n = self.input_dim;
        let m = self.output_dim;
        let method = self.config.method;
        debug!(%method, input_dim = n, output_dim = m, "estimating jacobian");

        if self.jacobian.shape() != (m, n) {
            self.jacobian = DMatrix::zeros(m, n);
        }
        if self.pending.shape() != (m, n) {
            self.pending = DMatrix::zeros(m, n);
        }

        let mut probe = Probe {
            function,
            x,
            scratch: x.clone(),
            output_dim: m,
            reject_non_finite: self.config.reject_non_finite,
            evaluations: 0,
        };
        let filled = probe.fill(method, &self.step_sizes, f_x, &mut self.pending);
        self.evaluations = probe.evaluations;
        filled?;

        std::mem::swap(&mut self.jacobian, &mut self.pending);
        debug!(evaluations = self.evaluations, "jacobian estimated");
        Ok(self.jacobian.clone())
    }
}

fn validate_step<T: Scalar>(index: usize, h: T) -> DiffResult<()> {
    if is_valid_step(h) {
        Ok(())
    } else {
        Err(DiffError::InvalidStepSize {
            index,
            value: format!("{h:?}"),
        })
    }
}

/// Evaluates the function at coordinate-wise perturbations of one point.
struct Probe<'a, F, T: Scalar> {
    function: &'a F,
    x: &'a DVector<T>,
    scratch: DVector<T>,
    output_dim: usize,
    reject_non_finite: bool,
    evaluations: usize,
}

impl<F, T> Probe<'_, F, T>
where
    T: Scalar,
    F: VectorFunction<T>,
{
    /// Write every column of the Jacobian into `out`.
    fn fill(
        &mut self,
        method: DifferentiationMethod,
        steps: &DVector<T>,
        f_x: Option<DVector<T>>,
        out: &mut DMatrix<T>,
    ) -> DiffResult<()> {
        let two: T = lit(2.0);
        let eight: T = lit(8.0);
        let twelve: T = lit(12.0);

        // Only the forward quotient shares a base evaluation across columns
        let f_x = match (method, f_x) {
            (DifferentiationMethod::NewtonQuotient, Some(known)) => {
                self.check(known, || "base point".to_string())?
            }
            (DifferentiationMethod::NewtonQuotient, None) => self.base()?,
            _ => DVector::zeros(0),
        };

        for j in 0..self.x.len() {
            let h = steps[j];
            let column = match method {
                DifferentiationMethod::NewtonQuotient => {
                    let f_plus = self.shifted(j, h, "+ h")?;
                    (f_plus - &f_x) / h
                }
                DifferentiationMethod::SymmetricQuotient => {
                    let f_plus = self.shifted(j, h, "+ h")?;
                    let f_minus = self.shifted(j, -h, "- h")?;
                    (f_plus - f_minus) / (two * h)
                }
                DifferentiationMethod::SecondOrderQuotient => {
                    let f_plus2 = self.shifted(j, two * h, "+ 2h")?;
                    let f_plus = self.shifted(j, h, "+ h")?;
                    let f_minus = self.shifted(j, -h, "- h")?;
                    let f_minus2 = self.shifted(j, -(two * h), "- 2h")?;
                    ((f_plus - f_minus) * eight - (f_plus2 - f_minus2)) / (twelve * h)
                }
            };
            trace!(column = j, step = ?h, "column assembled");
            out.set_column(j, &column);
        }
        Ok(())
    }

    fn base(&mut self) -> DiffResult<DVector<T>> {
        self.call(|| "base point".to_string())
    }

    /// Evaluate at `x` with `offset` added to coordinate `j`.
    fn shifted(&mut self, j: usize, offset: T, label: &'static str) -> DiffResult<DVector<T>> {
        self.scratch[j] = self.x[j] + offset;
        let result = self.call(|| format!("x[{j}] {label}"));
        self.scratch[j] = self.x[j];
        result
    }

    fn call(&mut self, describe: impl Fn() -> String) -> DiffResult<DVector<T>> {
        self.evaluations += 1;
        let y = self.function.eval(&self.scratch)?;
        self.check(y, describe)
    }

    /// Validate one function output against the expected length and,
    /// when configured, finiteness.
    fn check(&self, y: DVector<T>, describe: impl Fn() -> String) -> DiffResult<DVector<T>> {
        if y.len() != self.output_dim {
            return Err(DiffError::DimensionMismatch {
                what: "function output",
                expected: self.output_dim,
                actual: y.len(),
            });
        }
        if self.reject_non_finite {
            if let Some(row) = y.iter().position(|v| !v.is_finite()) {
                return Err(DiffError::NonFiniteOutput {
                    row,
                    probe: describe(),
                });
            }
        }
        Ok(y)
    }
}
