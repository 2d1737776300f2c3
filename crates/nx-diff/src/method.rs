//! Finite difference formulas.

use crate::error::DiffError;
use std::fmt;
use std::str::FromStr;

/// Difference quotient used to approximate each Jacobian column.
///
/// Higher order formulas reduce truncation error at the cost of more
/// function evaluations per column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DifferentiationMethod {
    /// Forward quotient `(F(x+h) - F(x)) / h`, error O(h).
    NewtonQuotient,
    /// Centred quotient `(F(x+h) - F(x-h)) / 2h`, error O(h²).
    #[default]
    SymmetricQuotient,
    /// Five-point centred stencil
    /// `(-F(x+2h) + 8F(x+h) - 8F(x-h) + F(x-2h)) / 12h`, error O(h⁴).
    SecondOrderQuotient,
}

impl DifferentiationMethod {
    pub const ALL: [DifferentiationMethod; 3] = [
        DifferentiationMethod::NewtonQuotient,
        DifferentiationMethod::SymmetricQuotient,
        DifferentiationMethod::SecondOrderQuotient,
    ];

    /// Order of the truncation error in h.
    pub fn order(self) -> u32 {
        match self {
            DifferentiationMethod::NewtonQuotient => 1,
            DifferentiationMethod::SymmetricQuotient => 2,
            DifferentiationMethod::SecondOrderQuotient => 4,
        }
    }

    /// Function evaluations spent on each column.
    ///
    /// The Newton quotient additionally evaluates the base point once per
    /// Jacobian.
    pub fn evaluations_per_column(self) -> usize {
        match self {
            DifferentiationMethod::NewtonQuotient => 1,
            DifferentiationMethod::SymmetricQuotient => 2,
            DifferentiationMethod::SecondOrderQuotient => 4,
        }
    }

    /// Total function evaluations for a Jacobian with `input_dim` columns.
    pub fn evaluations(self, input_dim: usize) -> usize {
        let shared = match self {
            DifferentiationMethod::NewtonQuotient => 1,
            _ => 0,
        };
        shared + self.evaluations_per_column() * input_dim
    }

    pub fn name(self) -> &'static str {
        match self {
            DifferentiationMethod::NewtonQuotient => "newton",
            DifferentiationMethod::SymmetricQuotient => "symmetric",
            DifferentiationMethod::SecondOrderQuotient => "second-order",
        }
    }
}

impl fmt::Display for DifferentiationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DifferentiationMethod {
    type Err = DiffError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "newton" | "newtonquotient" | "forward" => Ok(DifferentiationMethod::NewtonQuotient),
            "symmetric" | "symmetricquotient" | "central" => {
                Ok(DifferentiationMethod::SymmetricQuotient)
            }
            "second-order" | "second_order" | "secondorderquotient" => {
                Ok(DifferentiationMethod::SecondOrderQuotient)
            }
            _ => Err(DiffError::InvalidMethod {
                name: s.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_symmetric() {
        assert_eq!(
            DifferentiationMethod::default(),
            DifferentiationMethod::SymmetricQuotient
        );
    }

    #[test]
    fn evaluations_per_method() {
        assert_eq!(DifferentiationMethod::NewtonQuotient.evaluations(3), 4);
        assert_eq!(DifferentiationMethod::SymmetricQuotient.evaluations(3), 6);
        assert_eq!(DifferentiationMethod::SecondOrderQuotient.evaluations(3), 12);
    }

    #[test]
    fn parse_names() {
        for method in DifferentiationMethod::ALL {
            assert_eq!(method.name().parse::<DifferentiationMethod>(), Ok(method));
        }
        assert_eq!(
            "SymmetricQuotient".parse::<DifferentiationMethod>(),
            Ok(DifferentiationMethod::SymmetricQuotient)
        );
        assert!(matches!(
            "spline".parse::<DifferentiationMethod>(),
            Err(DiffError::InvalidMethod { .. })
        ));
    }
}
