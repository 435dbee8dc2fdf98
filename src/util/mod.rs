//! Utility types shared across the crate.
//!
//! - [`Error`] / [`Result`] - Error handling
//! - [`Attributes`] and math re-exports from glam
//! - Name and directory sanitizers

mod error;
mod math;
mod sanitize;

pub use error::*;
pub use math::*;
pub use sanitize::*;
