//! Core types and constants for tree multilateration

pub mod types;
pub mod constants;

pub use types::*;
pub use constants::*;
