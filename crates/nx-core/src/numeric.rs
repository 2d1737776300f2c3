use crate::{CoreError, CoreResult};
use nalgebra::{DMatrix, RealField};

/// Real scalar accepted by the differentiation routines.
///
/// Blanket-implemented for every `Copy` nalgebra real field (`f32`, `f64`).
pub trait Scalar: RealField + Copy {}

impl<T: RealField + Copy> Scalar for T {}

/// Lift an `f64` literal into the scalar type.
pub fn lit<T: Scalar>(v: f64) -> T {
    nalgebra::convert(v)
}

/// Machine epsilon of the scalar type.
pub fn machine_epsilon<T: Scalar>() -> T {
    T::default_epsilon()
}

/// Unit-scale finite difference step, `sqrt(eps)`.
pub fn default_step<T: Scalar>() -> T {
    machine_epsilon::<T>().sqrt()
}

/// Step scaled to the magnitude of a coordinate: `sqrt(eps) * max(1, |x|)`.
pub fn scaled_step<T: Scalar>(x: T) -> T {
    default_step::<T>() * x.abs().max(T::one())
}

/// A step is usable only if it is strictly positive and finite.
pub fn is_valid_step<T: Scalar>(h: T) -> bool {
    h.is_finite() && h > T::zero()
}

/// Largest absolute element-wise difference, or `None` when shapes differ.
pub fn max_abs_diff<T: Scalar>(a: &DMatrix<T>, b: &DMatrix<T>) -> Option<T> {
    if a.shape() != b.shape() {
        return None;
    }
    let worst = a.iter().zip(b.iter()).fold(T::zero(), |acc, (x, y)| {
        let d = (*x - *y).abs();
        // NaN never compares greater, so propagate it explicitly
        if d > acc || !d.is_finite() { d } else { acc }
    });
    Some(worst)
}

pub fn ensure_finite<T: Scalar>(v: T, what: &'static str) -> CoreResult<T> {
    if v.is_finite() {
        Ok(v)
    } else {
        Err(CoreError::NonFinite {
            what,
            value: nalgebra::try_convert(v).unwrap_or(f64::NAN),
        })
    }
}

/// Absolute/relative tolerance pair
#[derive(Clone, Copy, Debug)]
pub struct Tolerances {
    pub abs: f64,
    pub rel: f64,
}

impl Default for Tolerances {
    fn default() -> Self {
        Self {
            abs: 1e-12,
            rel: 1e-9,
        }
    }
}

pub fn nearly_equal(a: f64, b: f64, tol: Tolerances) -> bool {
    let diff = (a - b).abs();
    if diff <= tol.abs {
        return true;
    }
    diff <= tol.rel * a.abs().max(b.abs())
}
