//! Baking of reflections.
//!
//! Simulating reflections in real-time is very compute-intensive.
//! Bakers allow you to precompute these simulations beforehand.
//!
//! Baked data is stored in a [`ProbeBatch`], one layer per [`BakedDataIdentifier`].
//!
//! ## Available bakers
//!
//! - [`ReflectionsBaker`]: Precomputes how sound propagates from sources to listeners via reflections,
//!   as impulse responses for convolution and/or as parametric reverb.
//!
//! A bake drives a [`ReflectionSimulator`] one batch of probes at a time, runs the jobs it creates on a thread pool,
//! and writes the results back into the probe batch. Progress is reported between batches,
//! which is also where a cancellation requested through [`BakeCanceller`] takes effect.

#[cfg(doc)]
use crate::probe::ProbeBatch;
#[cfg(doc)]
use crate::simulator::ReflectionSimulator;

pub mod reflections;
pub use reflections::*;

pub mod baked_data;
pub use baked_data::*;

mod batch;
pub use batch::{Endpoints, probe_endpoints};

mod dump;
pub use dump::ImpulseResponseDump;

mod error;
pub use error::BakeError;
