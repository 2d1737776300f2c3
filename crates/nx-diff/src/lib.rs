//! Finite difference Jacobian estimation.
//!
//! This crate approximates the Jacobian of a vector-valued function
//! F: R^n -> R^m from function values alone. It is meant to feed Newton-type
//! solvers that have no analytic derivative available.
//!
//! The main entry point is [`JacobianEstimator`], which owns the function,
//! one step size per input coordinate and a reusable output buffer. Three
//! difference quotients are available through [`DifferentiationMethod`].

pub mod error;
pub mod estimator;
pub mod function;
pub mod jacobian;
pub mod method;

pub use error::{DiffError, DiffResult};
pub use estimator::{EstimatorConfig, JacobianEstimator};
pub use function::{ClosureFunction, VectorFunction, from_fn};
pub use jacobian::finite_difference_jacobian;
pub use method::DifferentiationMethod;
