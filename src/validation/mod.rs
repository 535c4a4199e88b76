//! Input validation and error types

pub mod data;
pub mod error;

pub use data::{validate_input, DataValidator, Severity, ValidationError, ValidationReport};
pub use error::{AttemptFailure, ResolutionError, ResolutionResult};
