//! Functions that can be differentiated.

use crate::error::DiffResult;
use nalgebra::DVector;
use nx_core::Scalar;
use std::fmt;

/// A vector-valued function F: R^n -> R^m with known dimensions.
///
/// Implementations must be deterministic: the same input must always produce
/// the same output, otherwise difference quotients are meaningless.
pub trait VectorFunction<T: Scalar> {
    /// Length n of the input vector.
    fn input_dim(&self) -> usize;

    /// Length m of the output vector.
    fn output_dim(&self) -> usize;

    /// Evaluate F at `x`.
    ///
    /// Failures are returned to the caller of the estimator untouched.
    fn eval(&self, x: &DVector<T>) -> DiffResult<DVector<T>>;
}

impl<T: Scalar, V: VectorFunction<T> + ?Sized> VectorFunction<T> for &V {
    fn input_dim(&self) -> usize {
        (**self).input_dim()
    }

    fn output_dim(&self) -> usize {
        (**self).output_dim()
    }

    fn eval(&self, x: &DVector<T>) -> DiffResult<DVector<T>> {
        (**self).eval(x)
    }
}

/// Closure wrapper carrying explicit dimensions.
#[derive(Clone)]
pub struct ClosureFunction<C> {
    closure: C,
    input_dim: usize,
    output_dim: usize,
}

impl<C> ClosureFunction<C> {
    pub fn new(input_dim: usize, output_dim: usize, closure: C) -> Self {
        Self {
            closure,
            input_dim,
            output_dim,
        }
    }
}

impl<C> fmt::Debug for ClosureFunction<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClosureFunction")
            .field("input_dim", &self.input_dim)
            .field("output_dim", &self.output_dim)
            .finish_non_exhaustive()
    }
}

impl<T, C> VectorFunction<T> for ClosureFunction<C>
where
    T: Scalar,
    C: Fn(&DVector<T>) -> DiffResult<DVector<T>>,
{
    fn input_dim(&self) -> usize {
        self.input_dim
    }

    fn output_dim(&self) -> usize {
        self.output_dim
    }

    fn eval(&self, x: &DVector<T>) -> DiffResult<DVector<T>> {
        (self.closure)(x)
    }
}

/// Wrap a closure as a [`VectorFunction`] with `input_dim` inputs and
/// `output_dim` outputs.
pub fn from_fn<T, C>(input_dim: usize, output_dim: usize, closure: C) -> ClosureFunction<C>
where
    T: Scalar,
    C: Fn(&DVector<T>) -> DiffResult<DVector<T>>,
{
    ClosureFunction::new(input_dim, output_dim, closure)
}
