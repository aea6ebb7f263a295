//! Compute devices used by GPU-accelerated ray tracing.

pub mod open_cl;
pub use open_cl::*;
