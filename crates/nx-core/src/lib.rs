//! nx-core: numeric foundation for the nyx workspace.
//!
//! Contains:
//! - numeric (scalar trait, machine epsilon, step helpers, tolerances)
//! - error (shared error types)

pub mod error;
pub mod numeric;

pub use error::{CoreError, CoreResult};
pub use numeric::*;
