//! Offline baking of acoustic reflections.
//!
//! `audiobake` precomputes how sound reflects between fixed points of a scene, so that an
//! interactive audio engine can play it back without simulating reflections in real time.
//!
//! Baking works on a [`ProbeBatch`]: a list of probes, each a point with a radius of influence.
//! A [`ReflectionsBaker`] groups the probes into batches suited to the ray tracer backend,
//! asks a [`ReflectionSimulator`] for the jobs that fill one [`EnergyField`] per probe, runs them on a
//! worker pool, and stores parametric [`Reverb`] and/or the energy fields themselves at each probe.
//!
//! ```
//! use audiobake::*;
//!
//! let mut probe_batch = ProbeBatch::new();
//! probe_batch.add_probe(Sphere::new(Point::new(2.0, 1.5, 2.0), 1.0));
//!
//! let params = ReflectionsBakeParams {
//!     bake_flags: ReflectionsBakeFlags::BAKE_PARAMETRIC,
//!     simulated_duration: 0.5,
//!     saved_duration: 0.5,
//!     num_threads: 1,
//!     ..Default::default()
//! };
//!
//! let baker = ReflectionsBaker::<DefaultRayTracer>::new();
//! baker
//!     .bake(&mut probe_batch, &ShoeboxScene::default(), &StatisticalSimulator, &params)
//!     .unwrap();
//!
//! let reverb = probe_batch
//!     .reflections_data(&params.identifier)
//!     .and_then(|data| data.reverb(0));
//! assert!(reverb.is_some());
//! ```

pub mod baking;
pub use baking::*;

pub mod callback;
pub use callback::*;

pub mod device;
pub use device::*;

pub mod energy_field;
pub use energy_field::*;

pub mod geometry;
pub use geometry::*;

pub mod job_graph;
pub use job_graph::*;

pub mod model;
pub use model::*;

pub mod probe;
pub use probe::*;

pub mod ray_tracing;
pub use ray_tracing::*;

pub mod reverb;
pub use reverb::*;

pub mod simulator;
pub use simulator::*;

/// Number of frequency bands simulated: low (up to 800 Hz), mid (800 Hz to 8 kHz) and high (above 8 kHz).
pub const NUM_BANDS: usize = 3;

/// Speed of sound (in meters per second) used to relate distances and arrival times.
pub const SPEED_OF_SOUND: f32 = 343.0;

mod sealed {
    pub trait Sealed {}
}
pub(crate) use sealed::Sealed;
