//! The reflection simulator interface driven by bakers.
//!
//! A simulator does not run anything itself: it fills a [`JobGraph`] with the work needed to
//! populate one energy field per query, and the baker runs that graph on its thread pool.

use crate::energy_field::SimulationEnergyField;
use crate::geometry::CoordinateSystem;
use crate::job_graph::JobGraph;
use crate::model::Directivity;

mod statistical;
pub use statistical::*;

/// Simulates reflections between batches of sources and listeners.
pub trait ReflectionSimulator: Sync {
    /// The scene representation the simulator traces rays against.
    type Scene: ?Sized + Sync;

    /// Populates `job_graph` with the work needed to fill `energy_fields`.
    ///
    /// `energy_fields[i]` receives the energy for the endpoint pair returned by
    /// [`ReflectionSimulationInputs::endpoints`] for index `i`. Simulators must write through
    /// [`SimulationEnergyField::target_mut`] so that device-resident fields are filled on the device.
    ///
    /// Must not block: the work happens when the graph is processed.
    fn simulate<'a>(
        &'a self,
        scene: &'a Self::Scene,
        inputs: ReflectionSimulationInputs<'a>,
        energy_fields: &'a mut [SimulationEnergyField],
        job_graph: &mut JobGraph<'a>,
    );
}

/// Endpoints and quality settings for one simulator call.
///
/// With one source and `n` listeners (or `n` sources and one listener) the call is a one-to-many query.
/// With `n` sources and `n` listeners it is `n` paired one-to-one queries, not a cross product.
#[derive(Copy, Clone, Debug)]
pub struct ReflectionSimulationInputs<'a> {
    /// Source coordinate systems.
    pub sources: &'a [CoordinateSystem],

    /// Listener coordinate systems.
    pub listeners: &'a [CoordinateSystem],

    /// One directivity pattern per source.
    pub directivities: &'a [Directivity],

    /// The number of rays to trace from each listener position.
    pub num_rays: u32,

    /// The number of times each ray is reflected off of solid geometry.
    pub num_bounces: u32,

    /// The length (in seconds) of the impulse responses to simulate.
    pub duration: f32,

    /// Ambisonic order of the simulated energy fields.
    pub order: u32,

    /// Sources closer than this (in meters) to a surface are treated as being this far away for energy calculations.
    pub irradiance_min_distance: f32,
}

/// One source-listener pair of a simulator call.
#[derive(Copy, Clone, Debug)]
pub struct EndpointPair<'a> {
    pub source: CoordinateSystem,
    pub directivity: &'a Directivity,
    pub listener: CoordinateSystem,
}

impl<'a> ReflectionSimulationInputs<'a> {
    pub fn num_sources(&self) -> usize {
        self.sources.len()
    }

    pub fn num_listeners(&self) -> usize {
        self.listeners.len()
    }

    /// Number of energy fields the call fills.
    pub fn num_queries(&self) -> usize {
        if self.sources.is_empty() || self.listeners.is_empty() {
            0
        } else {
            self.sources.len().max(self.listeners.len())
        }
    }

    /// The endpoints whose energy lands in energy field `index`.
    ///
    /// A side with a single endpoint is shared by every query.
    ///
    /// # Panics
    ///
    /// Panics if `index` is not less than [`Self::num_queries`].
    pub fn endpoints(&self, index: usize) -> EndpointPair<'a> {
        assert!(index < self.num_queries(), "query index out of bounds");

        let source_index = index.min(self.sources.len() - 1);
        let listener_index = index.min(self.listeners.len() - 1);
        let directivities: &'a [Directivity] = self.directivities;

        EndpointPair {
            source: self.sources[source_index],
            directivity: &directivities[source_index],
            listener: self.listeners[listener_index],
        }
    }
}
