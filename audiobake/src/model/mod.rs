pub mod air_absorption;
pub use air_absorption::*;

pub mod directivity;
pub use directivity::*;
