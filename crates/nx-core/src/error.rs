use thiserror::Error;

pub type CoreResult<T> = Result<T, CoreError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoreError {
    #[error("Non-finite numeric value for {what}: {value}")]
    NonFinite { what: &'static str, value: f64 },

    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },

    #[error("Index out of bounds: {what} (index={index}, len={len})")]
    IndexOob {
        what: &'static str,
        index: usize,
        len: usize,
    },
}

/// Check that `index` addresses an element of a sequence of length `len`.
pub fn check_index(what: &'static str, index: usize, len: usize) -> CoreResult<()> {
    if index < len {
        Ok(())
    } else {
        Err(CoreError::IndexOob { what, index, len })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_in_range() {
        assert!(check_index("steps", 2, 3).is_ok());
    }

    #[test]
    fn index_out_of_range_reports_len() {
        let err = check_index("steps", 3, 3).unwrap_err();
        assert_eq!(
            err,
            CoreError::IndexOob {
                what: "steps",
                index: 3,
                len: 3
            }
        );
        assert!(err.to_string().contains("len=3"));
    }
}
