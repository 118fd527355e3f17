//! Utility types shared by every stage of the decoder.
//!
//! - [`Error`] / [`Result`] - Error handling
//! - Math type re-exports from glam and [`BBox3d`]

mod error;
mod math;

pub use error::*;
pub use math::*;
